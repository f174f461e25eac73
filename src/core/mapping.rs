//! Declarative correspondence between baseline and actual field names.
//!
//! Every rename, flatten and omission the transformer applies is listed here.
//! Paths are dotted: `pollingFrequency.hours` addresses the `hours` key of
//! the nested `pollingFrequency` object. A baseline path with fewer segments
//! than its actual path is a flattening.

use serde_json::{Map, Value};

/// Key holding the record array in both the raw and the baseline page.
pub const CONTENT_FIELD: &str = "content";

/// Value used when the actual field is absent, `null` or of the wrong type.
/// The variant also fixes the baseline field's JSON type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
    TextList,
}

impl Fallback {
    pub fn value(&self) -> Value {
        match self {
            Fallback::Text(s) => Value::String((*s).to_string()),
            Fallback::Integer(n) => Value::from(*n),
            Fallback::Flag(b) => Value::Bool(*b),
            Fallback::TextList => Value::Array(Vec::new()),
        }
    }

    /// Keeps `raw` when it already has this fallback's type, otherwise
    /// returns the fallback. Never fails.
    pub fn coerce(&self, raw: Option<&Value>) -> Value {
        match (self, raw) {
            (Fallback::Text(_), Some(Value::String(s))) => Value::String(s.clone()),
            (Fallback::Integer(_), Some(Value::Number(n))) => {
                whole_number(n).map_or_else(|| self.value(), Value::from)
            }
            (Fallback::Flag(_), Some(Value::Bool(b))) => Value::Bool(*b),
            (Fallback::TextList, Some(Value::Array(items))) => Value::Array(
                items
                    .iter()
                    .filter(|item| item.is_string())
                    .cloned()
                    .collect(),
            ),
            _ => self.value(),
        }
    }
}

/// An `i64`, or a float with no fractional part inside the `i64` range.
fn whole_number(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub baseline: &'static str,
    pub actual: &'static str,
    pub fallback: Fallback,
}

impl FieldMapping {
    pub const fn new(baseline: &'static str, actual: &'static str, fallback: Fallback) -> Self {
        Self {
            baseline,
            actual,
            fallback,
        }
    }

    pub fn is_flattened(&self) -> bool {
        depth(self.actual) > depth(self.baseline)
    }

    /// First segment of the actual path, i.e. the key seen at the top of a raw object.
    pub fn actual_root(&self) -> &'static str {
        root(self.actual)
    }
}

#[derive(Debug)]
pub struct MappingTable {
    records: &'static [FieldMapping],
    pagination: &'static [FieldMapping],
    omitted: &'static [&'static str],
}

impl MappingTable {
    pub const fn new(
        records: &'static [FieldMapping],
        pagination: &'static [FieldMapping],
        omitted: &'static [&'static str],
    ) -> Self {
        Self {
            records,
            pagination,
            omitted,
        }
    }

    /// The CloudView AWS connector mapping.
    pub fn connectors() -> &'static MappingTable {
        &CONNECTOR_MAPPING
    }

    pub fn record_mappings(&self) -> &'static [FieldMapping] {
        self.records
    }

    pub fn pagination_mappings(&self) -> &'static [FieldMapping] {
        self.pagination
    }

    pub fn baseline_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.records.iter().map(|m| m.baseline)
    }

    fn find(&self, baseline_field: &str) -> Option<&'static FieldMapping> {
        self.records
            .iter()
            .chain(self.pagination.iter())
            .find(|m| m.baseline == baseline_field)
    }

    /// Actual path for a baseline field, record or pagination.
    pub fn rename(&self, baseline_field: &str) -> Option<&'static str> {
        self.find(baseline_field).map(|m| m.actual)
    }

    /// Nested actual path when `baseline_field` is a scalar projection of a
    /// nested actual object.
    pub fn is_flattened(&self, baseline_field: &str) -> Option<&'static str> {
        self.find(baseline_field)
            .filter(|m| m.is_flattened())
            .map(|m| m.actual)
    }

    pub fn fallback(&self, baseline_field: &str) -> Option<Fallback> {
        self.find(baseline_field).map(|m| m.fallback)
    }

    pub fn omitted_actual_fields(&self) -> &'static [&'static str] {
        self.omitted
    }

    pub fn is_omitted(&self, actual_field: &str) -> bool {
        self.omitted.contains(&actual_field)
    }
}

/// Walks a dotted path through nested objects. Any missing key or
/// non-object intermediate yields `None`.
pub fn resolve_path<'a>(raw: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => raw.get(path),
        Some((head, rest)) => raw
            .get(head)
            .and_then(Value::as_object)
            .and_then(|nested| resolve_path(nested, rest)),
    }
}

/// Inserts `value` at a dotted path, creating intermediate objects.
pub fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(nested) = child {
                insert_path(nested, rest, value);
            }
        }
    }
}

fn depth(path: &str) -> usize {
    path.split('.').count()
}

fn root(path: &str) -> &str {
    path.split_once('.').map_or(path, |(head, _)| head)
}

static CONNECTOR_FIELDS: [FieldMapping; 17] = [
    FieldMapping::new("name", "name", Fallback::Text("")),
    FieldMapping::new("connector_id", "connectorId", Fallback::Text("")),
    FieldMapping::new("description", "description", Fallback::Text("")),
    FieldMapping::new("provider", "provider", Fallback::Text("")),
    FieldMapping::new("state", "state", Fallback::Text("")),
    FieldMapping::new("asset_count", "totalAssets", Fallback::Integer(0)),
    FieldMapping::new("last_sync_time", "lastSyncedOn", Fallback::Text("")),
    FieldMapping::new("next_sync_time", "nextSyncedOn", Fallback::Text("")),
    FieldMapping::new("aws_account", "awsAccountId", Fallback::Text("")),
    FieldMapping::new("arn", "arn", Fallback::Text("")),
    FieldMapping::new("gov_cloud", "isGovCloud", Fallback::Flag(false)),
    FieldMapping::new("china_region", "isChinaRegion", Fallback::Flag(false)),
    FieldMapping::new("disabled", "isDisabled", Fallback::Flag(false)),
    FieldMapping::new("remediation_active", "remediationEnabled", Fallback::Flag(false)),
    FieldMapping::new("polling_interval_hours", "pollingFrequency.hours", Fallback::Integer(24)),
    FieldMapping::new("portal_connector", "isPortalConnector", Fallback::Flag(false)),
    FieldMapping::new("tags", "qualysTags", Fallback::TextList),
];

static CONNECTOR_PAGINATION: [FieldMapping; 19] = [
    FieldMapping::new("pageable.page", "pageable.pageNumber", Fallback::Integer(0)),
    FieldMapping::new("pageable.per_page", "pageable.pageSize", Fallback::Integer(50)),
    FieldMapping::new("pageable.sort.sorted", "pageable.sort.sorted", Fallback::Flag(false)),
    FieldMapping::new("pageable.sort.empty", "pageable.sort.empty", Fallback::Flag(true)),
    FieldMapping::new("pageable.sort.unsorted", "pageable.sort.unsorted", Fallback::Flag(true)),
    FieldMapping::new("pageable.offset", "pageable.offset", Fallback::Integer(0)),
    FieldMapping::new("pageable.paged", "pageable.paged", Fallback::Flag(true)),
    FieldMapping::new("pageable.unpaged", "pageable.unpaged", Fallback::Flag(false)),
    FieldMapping::new("total_pages", "totalPages", Fallback::Integer(0)),
    FieldMapping::new("total_count", "totalElements", Fallback::Integer(0)),
    FieldMapping::new("count", "numberOfElements", Fallback::Integer(0)),
    FieldMapping::new("last", "last", Fallback::Flag(true)),
    FieldMapping::new("number", "number", Fallback::Integer(0)),
    FieldMapping::new("size", "size", Fallback::Integer(50)),
    FieldMapping::new("sort.sorted", "sort.sorted", Fallback::Flag(false)),
    FieldMapping::new("sort.empty", "sort.empty", Fallback::Flag(true)),
    FieldMapping::new("sort.unsorted", "sort.unsorted", Fallback::Flag(true)),
    FieldMapping::new("first", "first", Fallback::Flag(true)),
    FieldMapping::new("empty", "empty", Fallback::Flag(false)),
];

static CONNECTOR_OMITTED: [&str; 4] = ["portalConnectorUuid", "baseAccountId", "externalId", "error"];

static CONNECTOR_MAPPING: MappingTable =
    MappingTable::new(&CONNECTOR_FIELDS, &CONNECTOR_PAGINATION, &CONNECTOR_OMITTED);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rename_covers_documented_pairs() {
        let table = MappingTable::connectors();
        let expected = [
            ("connector_id", "connectorId"),
            ("asset_count", "totalAssets"),
            ("last_sync_time", "lastSyncedOn"),
            ("next_sync_time", "nextSyncedOn"),
            ("aws_account", "awsAccountId"),
            ("gov_cloud", "isGovCloud"),
            ("china_region", "isChinaRegion"),
            ("disabled", "isDisabled"),
            ("remediation_active", "remediationEnabled"),
            ("polling_interval_hours", "pollingFrequency.hours"),
            ("portal_connector", "isPortalConnector"),
            ("tags", "qualysTags"),
            ("pageable.page", "pageable.pageNumber"),
            ("pageable.per_page", "pageable.pageSize"),
            ("total_pages", "totalPages"),
            ("total_count", "totalElements"),
            ("count", "numberOfElements"),
        ];
        for (baseline, actual) in expected {
            assert_eq!(table.rename(baseline), Some(actual), "{}", baseline);
        }
        assert_eq!(table.rename("status"), None);
    }

    #[test]
    fn test_only_polling_interval_is_flattened() {
        let table = MappingTable::connectors();
        let flattened: Vec<_> = table
            .record_mappings()
            .iter()
            .chain(table.pagination_mappings())
            .filter(|m| m.is_flattened())
            .map(|m| m.baseline)
            .collect();
        assert_eq!(flattened, vec!["polling_interval_hours"]);
        assert_eq!(
            table.is_flattened("polling_interval_hours"),
            Some("pollingFrequency.hours")
        );
        assert_eq!(table.fallback("polling_interval_hours"), Some(Fallback::Integer(24)));
        // Nested on both sides is a rename, not a flattening.
        assert_eq!(table.is_flattened("pageable.page"), None);
    }

    #[test]
    fn test_no_mapping_reads_an_omitted_field() {
        let table = MappingTable::connectors();
        assert_eq!(table.omitted_actual_fields().len(), 4);
        for mapping in table.record_mappings().iter().chain(table.pagination_mappings()) {
            assert!(!table.is_omitted(mapping.actual_root()), "{}", mapping.actual);
        }
    }

    #[test]
    fn test_baseline_names_are_unique() {
        let table = MappingTable::connectors();
        let mut names: Vec<_> = table
            .record_mappings()
            .iter()
            .chain(table.pagination_mappings())
            .map(|m| m.baseline)
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_coerce_defaults_wrong_types() {
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!("5"))), json!(0));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(1.5))), json!(0));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(7))), json!(7));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(496.0))), json!(496));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(-3.0))), json!(-3));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(u64::MAX))), json!(0));
        assert_eq!(Fallback::Integer(0).coerce(Some(&json!(1e300))), json!(0));
        assert_eq!(Fallback::Text("").coerce(Some(&Value::Null)), json!(""));
        assert_eq!(Fallback::Flag(true).coerce(None), json!(true));
        assert_eq!(
            Fallback::TextList.coerce(Some(&json!(["prod", 3, "eu"]))),
            json!(["prod", "eu"])
        );
        assert_eq!(Fallback::TextList.coerce(Some(&json!("prod"))), json!([]));
    }

    #[test]
    fn test_resolve_and_insert_path() {
        let raw = json!({"pollingFrequency": {"hours": 12}, "flat": 1});
        let raw = raw.as_object().unwrap();
        assert_eq!(resolve_path(raw, "pollingFrequency.hours"), Some(&json!(12)));
        assert_eq!(resolve_path(raw, "flat.hours"), None);
        assert_eq!(resolve_path(raw, "missing.hours"), None);

        let mut out = Map::new();
        insert_path(&mut out, "pageable.sort.sorted", json!(true));
        insert_path(&mut out, "pageable.page", json!(2));
        assert_eq!(
            Value::Object(out),
            json!({"pageable": {"sort": {"sorted": true}, "page": 2}})
        );
    }
}
