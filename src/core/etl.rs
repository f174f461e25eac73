use crate::core::inventory::Inventory;
use crate::core::transformer::SchemaTransformer;
use crate::core::{BaselinePage, PageSource, RecordSink, RunSummary};
use crate::domain::model::BaselineRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Walks the connector listing one page at a time.
///
/// The next page is only requested after the current one has been mapped and
/// its `last` flag read, so pages reach the sink in fetch order.
pub struct EtlEngine<P: PageSource> {
    source: P,
    transformer: SchemaTransformer,
    page_size: u32,
    start_page: u32,
    max_pages: Option<u32>,
}

impl<P: PageSource> EtlEngine<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            transformer: SchemaTransformer::default(),
            page_size: DEFAULT_PAGE_SIZE,
            start_page: 0,
            max_pages: None,
        }
    }

    pub fn with_transformer(mut self, transformer: SchemaTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetches and maps a single page.
    pub async fn fetch_page(&self, page: u32) -> Result<BaselinePage> {
        let raw = self.source.fetch_page(page, self.page_size).await?;
        self.transformer.transform_page_value(&raw)
    }

    pub async fn run<K: RecordSink + ?Sized>(&self, sink: &K) -> Result<RunSummary> {
        tracing::info!(
            start_page = self.start_page,
            page_size = self.page_size,
            "Starting connector traversal"
        );

        let mut summary = self.traverse(sink).await?;
        summary.output_path = sink.finish().await?;

        tracing::info!(
            pages = summary.pages,
            records = summary.records,
            total_count = summary.total_count,
            "Traversal complete"
        );
        Ok(summary)
    }

    /// Traverses every page and keeps the records in memory.
    pub async fn collect_all(&self) -> Result<Inventory> {
        let collector = CollectingSink::default();
        self.traverse(&collector).await?;
        Ok(Inventory::new(collector.records.into_inner()))
    }

    async fn traverse<K: RecordSink + ?Sized>(&self, sink: &K) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut page = self.start_page;

        loop {
            if let Some(max_pages) = self.max_pages {
                if summary.pages >= max_pages as usize {
                    tracing::info!(max_pages, "Stopping at the configured page limit");
                    break;
                }
            }

            let baseline = self.fetch_page(page).await?;
            let last = baseline.is_last();
            let empty = baseline.content.is_empty();
            tracing::debug!(page, records = baseline.content.len(), last, "Mapped page");

            summary.pages += 1;
            summary.records += baseline.content.len();
            summary.total_count = baseline.pagination.total_count;
            sink.emit(&baseline).await?;

            if last {
                break;
            }
            if empty {
                tracing::warn!(page, "Empty page not flagged as last; stopping traversal");
                break;
            }
            page += 1;
        }

        Ok(summary)
    }
}

#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<BaselineRecord>>,
}

#[async_trait]
impl RecordSink for CollectingSink {
    async fn emit(&self, page: &BaselinePage) -> Result<()> {
        self.records.lock().await.extend(page.content.iter().cloned());
        Ok(())
    }

    async fn finish(&self) -> Result<String> {
        Ok(String::new())
    }
}
