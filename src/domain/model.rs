use serde::{Deserialize, Serialize};

/// One element of the upstream connector list, untouched.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A connector in the baseline schema.
///
/// Deserialisation is strict: every field is required and unknown keys are
/// rejected, so a baseline JSON object that drifted in either direction fails
/// to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineRecord {
    pub name: String,
    pub connector_id: String,
    pub description: String,
    pub provider: String,
    pub state: String,
    pub asset_count: i64,
    pub last_sync_time: String,
    pub next_sync_time: String,
    pub aws_account: String,
    pub arn: String,
    pub gov_cloud: bool,
    pub china_region: bool,
    pub disabled: bool,
    pub remediation_active: bool,
    pub polling_interval_hours: i64,
    pub portal_connector: bool,
    pub tags: Vec<String>,
}

impl BaselineRecord {
    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sort {
    pub sorted: bool,
    pub empty: bool,
    pub unsorted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pageable {
    pub page: i64,
    pub per_page: i64,
    pub sort: Sort,
    pub offset: i64,
    pub paged: bool,
    pub unpaged: bool,
}

/// Baseline pagination envelope for one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselinePagination {
    pub pageable: Pageable,
    pub total_pages: i64,
    pub total_count: i64,
    pub count: i64,
    pub last: bool,
    pub number: i64,
    pub size: i64,
    pub sort: Sort,
    pub first: bool,
    pub empty: bool,
}

/// A full baseline page: records followed by the pagination fields at the
/// same level, which is the shape downstream consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselinePage {
    pub content: Vec<BaselineRecord>,
    #[serde(flatten)]
    pub pagination: BaselinePagination,
}

impl BaselinePage {
    pub fn new(content: Vec<BaselineRecord>, pagination: BaselinePagination) -> Self {
        Self {
            content,
            pagination,
        }
    }

    pub fn is_last(&self) -> bool {
        self.pagination.last
    }
}

/// What a traversal produced, for the caller to report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub records: usize,
    pub total_count: i64,
    pub output_path: String,
}
