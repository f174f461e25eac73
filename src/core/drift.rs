//! Compares live payload keys against the mapping table.
//!
//! A raw key is accounted for when it is a mapped actual path, the parent of
//! one, or a deliberately omitted field. Anything else is drift: the API grew
//! or renamed a field the table does not know about. Mapped paths that no
//! record carries point the other way: the table reads a field the API no
//! longer sends.

use crate::core::mapping::{resolve_path, FieldMapping, MappingTable, CONTENT_FIELD};
use crate::domain::model::RawRecord;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub records_inspected: usize,
    pub unmapped_record_fields: BTreeSet<String>,
    pub missing_record_fields: BTreeSet<String>,
    pub unmapped_envelope_fields: BTreeSet<String>,
    pub missing_envelope_fields: BTreeSet<String>,
    pub omitted_fields_seen: BTreeSet<String>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.unmapped_record_fields.is_empty()
            || !self.missing_record_fields.is_empty()
            || !self.unmapped_envelope_fields.is_empty()
            || !self.missing_envelope_fields.is_empty()
    }
}

enum KeyClass {
    Mapped,
    /// Nested on both sides; its children are checked too.
    Container,
    /// Flattened source object; only the mapped child matters.
    Opaque,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct DriftDetector {
    table: &'static MappingTable,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self::new(MappingTable::connectors())
    }
}

impl DriftDetector {
    pub fn new(table: &'static MappingTable) -> Self {
        Self { table }
    }

    /// Drift in a single raw connector.
    pub fn inspect_record(&self, raw: &RawRecord) -> DriftReport {
        let mappings = self.table.record_mappings();
        let mut report = DriftReport {
            records_inspected: 1,
            ..DriftReport::default()
        };
        self.collect_unmapped(
            raw,
            "",
            mappings,
            &mut report.unmapped_record_fields,
            &mut report.omitted_fields_seen,
        );
        report.missing_record_fields = missing_paths(raw, mappings);
        report
    }

    /// Drift across a raw page. A mapped record field is reported missing
    /// only when no record on the page carries it.
    pub fn inspect_page(&self, raw_page: &Value) -> Result<DriftReport> {
        let envelope = raw_page
            .as_object()
            .ok_or_else(|| EtlError::malformed("page", "expected a JSON object"))?;
        let items = envelope
            .get(CONTENT_FIELD)
            .ok_or_else(|| EtlError::malformed(CONTENT_FIELD, "key is missing from the page"))?
            .as_array()
            .ok_or_else(|| EtlError::malformed(CONTENT_FIELD, "expected an array"))?;

        let mut report = DriftReport::default();
        let mut missing: Option<BTreeSet<String>> = None;

        for (index, item) in items.iter().enumerate() {
            let record = item.as_object().ok_or_else(|| {
                EtlError::malformed(format!("{}[{}]", CONTENT_FIELD, index), "expected an object")
            })?;
            let record_report = self.inspect_record(record);
            report.records_inspected += 1;
            report
                .unmapped_record_fields
                .extend(record_report.unmapped_record_fields);
            report
                .omitted_fields_seen
                .extend(record_report.omitted_fields_seen);
            missing = Some(match missing {
                None => record_report.missing_record_fields,
                Some(so_far) => so_far
                    .intersection(&record_report.missing_record_fields)
                    .cloned()
                    .collect(),
            });
        }
        report.missing_record_fields = missing.unwrap_or_default();

        let pagination = self.table.pagination_mappings();
        let mut envelope_keys = envelope.clone();
        envelope_keys.remove(CONTENT_FIELD);
        self.collect_unmapped(
            &envelope_keys,
            "",
            pagination,
            &mut report.unmapped_envelope_fields,
            &mut report.omitted_fields_seen,
        );
        report.missing_envelope_fields = missing_paths(envelope, pagination);

        if report.has_drift() {
            tracing::warn!(
                unmapped = report.unmapped_record_fields.len() + report.unmapped_envelope_fields.len(),
                missing = report.missing_record_fields.len() + report.missing_envelope_fields.len(),
                "Schema drift detected against the mapping table"
            );
        }
        Ok(report)
    }

    fn collect_unmapped(
        &self,
        object: &RawRecord,
        prefix: &str,
        mappings: &[FieldMapping],
        unmapped: &mut BTreeSet<String>,
        omitted_seen: &mut BTreeSet<String>,
    ) {
        for (key, value) in object {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            if prefix.is_empty() && self.table.is_omitted(key) {
                omitted_seen.insert(path);
                continue;
            }
            match classify(&path, mappings) {
                KeyClass::Mapped | KeyClass::Opaque => {}
                KeyClass::Container => {
                    if let Value::Object(nested) = value {
                        self.collect_unmapped(nested, &path, mappings, unmapped, omitted_seen);
                    }
                }
                KeyClass::Unknown => {
                    unmapped.insert(path);
                }
            }
        }
    }
}

fn classify(path: &str, mappings: &[FieldMapping]) -> KeyClass {
    let nested_prefix = format!("{}.", path);
    let mut class = KeyClass::Unknown;
    for mapping in mappings {
        if mapping.actual == path {
            return KeyClass::Mapped;
        }
        if mapping.actual.starts_with(&nested_prefix) {
            class = if mapping.is_flattened() {
                KeyClass::Opaque
            } else {
                KeyClass::Container
            };
        }
    }
    class
}

fn missing_paths(raw: &RawRecord, mappings: &[FieldMapping]) -> BTreeSet<String> {
    mappings
        .iter()
        .filter(|m| resolve_path(raw, m.actual).is_none())
        .map(|m| m.actual.to_string())
        .collect()
}
