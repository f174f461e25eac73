use crate::core::mapping::MappingTable;
use crate::core::{BaselinePage, RecordSink, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::io::Write;
use tokio::sync::Mutex;
use zip::write::{FileOptions, ZipWriter};

pub const BUNDLE_FILE_NAME: &str = "baseline_output.zip";

/// Buffers every baseline page and writes them as one zip bundle on finish.
///
/// The bundle holds `connectors.json` (all records), `connectors.csv` (one
/// row per record, tags joined by `;`), `pages.json` (the pages as emitted)
/// and `metadata.json`.
pub struct BundleSink<S: Storage> {
    storage: S,
    output_path: String,
    pages: Mutex<Vec<BaselinePage>>,
}

impl<S: Storage> BundleSink<S> {
    pub fn new(storage: S, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            output_path: output_path.into(),
            pages: Mutex::new(Vec::new()),
        }
    }

    fn build_bundle(pages: &[BaselinePage]) -> Result<Vec<u8>> {
        let records: Vec<_> = pages.iter().flat_map(|p| p.content.iter()).collect();
        let total_count = pages.last().map(|p| p.pagination.total_count).unwrap_or(0);

        let metadata = json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "pages": pages.len(),
            "records": records.len(),
            "total_count": total_count,
        });

        tracing::debug!("Creating ZIP bundle with {} records", records.len());

        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("connectors.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&records)?.as_bytes())?;

        zip.start_file::<_, ()>("connectors.csv", FileOptions::default())?;
        zip.write_all(&records_to_csv(pages)?)?;

        zip.start_file::<_, ()>("pages.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(pages)?.as_bytes())?;

        zip.start_file::<_, ()>("metadata.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl<S: Storage> RecordSink for BundleSink<S> {
    async fn emit(&self, page: &BaselinePage) -> Result<()> {
        self.pages.lock().await.push(page.clone());
        Ok(())
    }

    async fn finish(&self) -> Result<String> {
        let pages = self.pages.lock().await.clone();
        let zip_data = Self::build_bundle(&pages)?;

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(BUNDLE_FILE_NAME, &zip_data).await?;

        Ok(format!("{}/{}", self.output_path, BUNDLE_FILE_NAME))
    }
}

/// Prints baseline pages to stdout as JSON Lines, one page per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStdoutSink;

impl JsonStdoutSink {
    pub fn render(page: &BaselinePage) -> Result<String> {
        Ok(serde_json::to_string(page)?)
    }
}

#[async_trait]
impl RecordSink for JsonStdoutSink {
    async fn emit(&self, page: &BaselinePage) -> Result<()> {
        println!("{}", Self::render(page)?);
        Ok(())
    }

    async fn finish(&self) -> Result<String> {
        Ok("stdout".to_string())
    }
}

/// Columns follow the mapping table's declaration order.
pub fn records_to_csv(pages: &[BaselinePage]) -> Result<Vec<u8>> {
    let columns: Vec<&str> = MappingTable::connectors().baseline_fields().collect();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for record in pages.iter().flat_map(|p| p.content.iter()) {
        let value = serde_json::to_value(record)?;
        let row: Vec<String> = columns
            .iter()
            .map(|column| csv_cell(value.get(*column)))
            .collect();
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|e| EtlError::OutputError {
        message: format!("Failed to flush CSV output: {}", e),
    })
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(";"),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transformer::SchemaTransformer;
    use crate::domain::model::{BaselinePagination, BaselineRecord};
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn page(records: Vec<BaselineRecord>, total_count: i64) -> BaselinePage {
        let mut pagination: BaselinePagination = SchemaTransformer::default()
            .transform_pagination(&serde_json::Map::new())
            .unwrap();
        pagination.total_count = total_count;
        BaselinePage::new(records, pagination)
    }

    fn record(id: &str, tags: &[&str]) -> BaselineRecord {
        BaselineRecord {
            name: format!("AWS-{}", id),
            connector_id: id.to_string(),
            asset_count: 7,
            polling_interval_hours: 24,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..BaselineRecord::default()
        }
    }

    #[test]
    fn test_csv_columns_and_tags() {
        let csv = records_to_csv(&[page(vec![record("a", &["prod", "eu"])], 1)]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,connector_id,description,provider,state,asset_count,last_sync_time,\
             next_sync_time,aws_account,arn,gov_cloud,china_region,disabled,\
             remediation_active,polling_interval_hours,portal_connector,tags"
        );
        assert_eq!(
            lines.next().unwrap(),
            "AWS-a,a,,,,7,,,,,false,false,false,false,24,false,prod;eu"
        );
    }

    #[tokio::test]
    async fn test_bundle_contents() {
        let storage = MockStorage::default();
        let sink = BundleSink::new(storage.clone(), "./output");

        sink.emit(&page(vec![record("a", &[]), record("b", &[])], 3))
            .await
            .unwrap();
        sink.emit(&page(vec![record("c", &[])], 3)).await.unwrap();
        let path = sink.finish().await.unwrap();
        assert_eq!(path, "./output/baseline_output.zip");

        let data = storage.read_file(BUNDLE_FILE_NAME).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut connectors = String::new();
        archive
            .by_name("connectors.json")
            .unwrap()
            .read_to_string(&mut connectors)
            .unwrap();
        let connectors: Vec<BaselineRecord> = serde_json::from_str(&connectors).unwrap();
        assert_eq!(connectors.len(), 3);
        assert_eq!(connectors[2].connector_id, "c");

        let mut metadata = String::new();
        archive
            .by_name("metadata.json")
            .unwrap()
            .read_to_string(&mut metadata)
            .unwrap();
        let metadata: Value = serde_json::from_str(&metadata).unwrap();
        assert_eq!(metadata["pages"], 2);
        assert_eq!(metadata["records"], 3);
        assert_eq!(metadata["total_count"], 3);
    }

    #[test]
    fn test_stdout_pages_are_one_json_value_per_line() {
        let pages = [
            page(vec![record("a", &["prod"])], 2),
            page(vec![record("b", &[])], 2),
        ];
        let output: String = pages
            .iter()
            .map(|p| JsonStdoutSink::render(p).unwrap() + "\n")
            .collect();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        for (line, expected) in lines.iter().zip(pages.iter()) {
            let value: Value = serde_json::from_str(line).unwrap();
            let parsed = crate::core::schema::validate_page(&value).unwrap();
            assert_eq!(&parsed, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_bundle_is_still_written() {
        let storage = MockStorage::default();
        let sink = BundleSink::new(storage.clone(), "out");
        sink.finish().await.unwrap();
        assert!(storage.read_file(BUNDLE_FILE_NAME).await.is_ok());
    }
}
