use crate::domain::model::BaselinePage;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn endpoint(&self) -> &str;
    fn page_size(&self) -> u32;
    fn max_pages(&self) -> Option<u32>;
    fn output_path(&self) -> &str;
}

/// Transport side: hands back one raw listing page as untyped JSON.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<serde_json::Value>;
}

/// Downstream side: receives baseline pages in fetch order.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, page: &BaselinePage) -> Result<()>;

    /// Flushes whatever was buffered and returns where it went.
    async fn finish(&self) -> Result<String>;
}
