//! Raw CloudView page → baseline page.
//!
//! Pure and synchronous. Every output key comes from the mapping table; raw
//! keys are never passed through.

use crate::core::mapping::{insert_path, resolve_path, FieldMapping, MappingTable, CONTENT_FIELD};
use crate::core::schema::{pagination_from_value, record_from_value};
use crate::domain::model::{BaselinePage, BaselinePagination, BaselineRecord, RawRecord};
use crate::utils::error::{EtlError, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct SchemaTransformer {
    table: &'static MappingTable,
}

impl Default for SchemaTransformer {
    fn default() -> Self {
        Self::new(MappingTable::connectors())
    }
}

impl SchemaTransformer {
    pub fn new(table: &'static MappingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static MappingTable {
        self.table
    }

    /// Maps one raw connector. Absent or wrong-typed fields take the table's
    /// fallback; the only error is a table that no longer produces the
    /// baseline field set.
    pub fn transform_record(&self, raw: &RawRecord) -> Result<BaselineRecord> {
        let projected = project(self.table, raw, self.table.record_mappings());
        record_from_value(Value::Object(projected))
    }

    /// Maps the pagination fields of a raw envelope. `pageable` and both
    /// `sort` objects may be absent.
    pub fn transform_pagination(&self, envelope: &RawRecord) -> Result<BaselinePagination> {
        let projected = project(self.table, envelope, self.table.pagination_mappings());
        pagination_from_value(Value::Object(projected))
    }

    /// Maps a raw page, keeping record order.
    pub fn transform_page(&self, raw: &Value) -> Result<(Vec<BaselineRecord>, BaselinePagination)> {
        let envelope = raw.as_object().ok_or_else(|| {
            EtlError::malformed("page", format!("expected a JSON object, got {}", json_kind(raw)))
        })?;

        let content = envelope
            .get(CONTENT_FIELD)
            .ok_or_else(|| EtlError::malformed(CONTENT_FIELD, "key is missing from the page"))?;
        let items = content.as_array().ok_or_else(|| {
            EtlError::malformed(
                CONTENT_FIELD,
                format!("expected an array, got {}", json_kind(content)),
            )
        })?;

        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let raw_record = item.as_object().ok_or_else(|| {
                    EtlError::malformed(
                        format!("{}[{}]", CONTENT_FIELD, index),
                        format!("expected an object, got {}", json_kind(item)),
                    )
                })?;
                self.transform_record(raw_record)
            })
            .collect::<Result<Vec<_>>>()?;

        let pagination = self.transform_pagination(envelope)?;
        Ok((records, pagination))
    }

    pub fn transform_page_value(&self, raw: &Value) -> Result<BaselinePage> {
        let (content, pagination) = self.transform_page(raw)?;
        Ok(BaselinePage::new(content, pagination))
    }
}

/// Omitted actual fields are never read, even when a mapping points at one;
/// such a field always takes its fallback.
fn project(table: &MappingTable, raw: &RawRecord, mappings: &[FieldMapping]) -> Map<String, Value> {
    let mut out = Map::new();
    for mapping in mappings {
        let source = if table.is_omitted(mapping.actual_root()) {
            None
        } else {
            resolve_path(raw, mapping.actual)
        };
        insert_path(&mut out, mapping.baseline, mapping.fallback.coerce(source));
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
