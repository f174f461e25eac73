use crate::domain::model::BaselineRecord;
use std::collections::{BTreeSet, HashSet};

/// All baseline connectors gathered from a full traversal, in fetch order.
///
/// Duplicate connector ids across pages are kept; lookups return the first
/// occurrence and [`Inventory::duplicate_ids`] lists the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    records: Vec<BaselineRecord>,
}

impl Inventory {
    pub fn new(records: Vec<BaselineRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BaselineRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BaselineRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_id(&self, connector_id: &str) -> Option<&BaselineRecord> {
        self.records.iter().find(|r| r.connector_id == connector_id)
    }

    pub fn by_account(&self, aws_account: &str) -> Vec<&BaselineRecord> {
        self.records
            .iter()
            .filter(|r| r.aws_account == aws_account)
            .collect()
    }

    pub fn active(&self) -> Vec<&BaselineRecord> {
        self.records.iter().filter(|r| r.is_active()).collect()
    }

    pub fn duplicate_ids(&self) -> BTreeSet<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| !seen.insert(r.connector_id.as_str()))
            .map(|r| r.connector_id.clone())
            .collect()
    }
}

impl From<Vec<BaselineRecord>> for Inventory {
    fn from(records: Vec<BaselineRecord>) -> Self {
        Self::new(records)
    }
}
