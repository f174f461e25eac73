//! Strict validation against the baseline schema.
//!
//! The typed baseline structs reject unknown keys and require every field,
//! so parsing a JSON object into them is the validation.

use crate::core::mapping::CONTENT_FIELD;
use crate::domain::model::{BaselinePage, BaselinePagination, BaselineRecord};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// Key present in the object but not part of the baseline record.
    Unexpected(String),
    /// Baseline field absent from the object.
    Missing(String),
}

pub fn record_from_value(value: Value) -> Result<BaselineRecord> {
    serde_json::from_value(value).map_err(|e| EtlError::SchemaValidation {
        message: format!("record: {}", e),
    })
}

pub fn pagination_from_value(value: Value) -> Result<BaselinePagination> {
    serde_json::from_value(value).map_err(|e| EtlError::SchemaValidation {
        message: format!("pagination: {}", e),
    })
}

pub fn validate_record(value: &Value) -> Result<BaselineRecord> {
    record_from_value(value.clone())
}

/// Validates a whole baseline page: every record and the pagination
/// fields that sit next to `content`.
pub fn validate_page(value: &Value) -> Result<BaselinePage> {
    let object = value.as_object().ok_or_else(|| EtlError::SchemaValidation {
        message: "page: expected a JSON object".to_string(),
    })?;

    let mut envelope = object.clone();
    let content = envelope
        .remove(CONTENT_FIELD)
        .ok_or_else(|| EtlError::SchemaValidation {
            message: format!("page: missing field `{}`", CONTENT_FIELD),
        })?;
    let items = content.as_array().ok_or_else(|| EtlError::SchemaValidation {
        message: format!("page: `{}` must be an array", CONTENT_FIELD),
    })?;

    let records = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            validate_record(item).map_err(|e| EtlError::SchemaValidation {
                message: format!("{}[{}]: {}", CONTENT_FIELD, index, e),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let pagination = pagination_from_value(Value::Object(envelope))?;

    Ok(BaselinePage::new(records, pagination))
}

/// The baseline record key set, taken from the struct itself.
pub fn record_field_names() -> BTreeSet<String> {
    match serde_json::to_value(BaselineRecord::default()) {
        Ok(Value::Object(fields)) => fields.keys().cloned().collect(),
        _ => BTreeSet::new(),
    }
}

/// Every way `value` differs from the baseline record key set. Unlike
/// [`validate_record`], which stops at the first problem, this lists all of
/// them for drift reports.
pub fn record_violations(value: &Value) -> Vec<SchemaViolation> {
    let expected = record_field_names();
    let Some(object) = value.as_object() else {
        return expected.into_iter().map(SchemaViolation::Missing).collect();
    };
    let present: BTreeSet<String> = object.keys().cloned().collect();

    present
        .difference(&expected)
        .cloned()
        .map(SchemaViolation::Unexpected)
        .chain(expected.difference(&present).cloned().map(SchemaViolation::Missing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_record() -> Value {
        json!({
            "name": "AWS-102716399460",
            "connector_id": "22eb46aa",
            "description": "",
            "provider": "AWS",
            "state": "Completed successfully",
            "asset_count": 496,
            "last_sync_time": "Fri Jan 30 06:29:04 GMT 2026",
            "next_sync_time": "",
            "aws_account": "102716399460",
            "arn": "arn:aws:iam::102716399460:role/QualysCSMPReadOnly",
            "gov_cloud": false,
            "china_region": false,
            "disabled": false,
            "remediation_active": false,
            "polling_interval_hours": 24,
            "portal_connector": true,
            "tags": []
        })
    }

    #[test]
    fn test_complete_record_validates() {
        let record = validate_record(&complete_record()).unwrap();
        assert_eq!(record.connector_id, "22eb46aa");
        assert!(record_violations(&complete_record()).is_empty());
    }

    #[test]
    fn test_extra_field_is_rejected() {
        let mut value = complete_record();
        value["externalId"] = json!("EU2-2792719");
        let err = validate_record(&value).unwrap_err();
        assert!(err.to_string().contains("unknown field `externalId`"));
        assert_eq!(
            record_violations(&value),
            vec![SchemaViolation::Unexpected("externalId".to_string())]
        );
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value = complete_record();
        value.as_object_mut().unwrap().remove("tags");
        let err = validate_record(&value).unwrap_err();
        assert!(err.to_string().contains("missing field `tags`"));
        assert_eq!(
            record_violations(&value),
            vec![SchemaViolation::Missing("tags".to_string())]
        );
    }

    #[test]
    fn test_record_field_names() {
        let names = record_field_names();
        assert_eq!(names.len(), 17);
        assert!(names.contains("polling_interval_hours"));
        assert!(!names.contains("connectorId"));
    }

    #[test]
    fn test_validate_page_reports_record_index() {
        let mut bad = complete_record();
        bad["status"] = json!("ok");
        let page = json!({
            "content": [complete_record(), bad],
            "pageable": {
                "page": 0, "per_page": 50,
                "sort": {"sorted": true, "empty": false, "unsorted": false},
                "offset": 0, "paged": true, "unpaged": false
            },
            "total_pages": 1, "total_count": 2, "count": 2,
            "last": true, "number": 0, "size": 50,
            "sort": {"sorted": true, "empty": false, "unsorted": false},
            "first": true, "empty": false
        });
        let err = validate_page(&page).unwrap_err();
        assert!(err.to_string().contains("content[1]"));
    }
}
