use crate::core::PageSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use serde_json::Value;

const DEMO_PAGE: &str = include_str!("../../data/sample_connectors.json");

/// Serves canned listing pages, for runs without credentials.
#[derive(Debug, Clone, Default)]
pub struct SamplePageSource {
    pages: Vec<Value>,
}

impl SamplePageSource {
    pub fn from_pages(pages: Vec<Value>) -> Self {
        Self { pages }
    }

    /// A single page holding one fully populated AWS connector.
    pub fn demo() -> Result<Self> {
        let page: Value = serde_json::from_str(DEMO_PAGE)?;
        Ok(Self::from_pages(vec![page]))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageSource for SamplePageSource {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Value> {
        tracing::debug!(page, per_page, "Serving sample page");
        self.pages
            .get(page as usize)
            .cloned()
            .ok_or_else(|| EtlError::HttpStatus {
                status: 404,
                url: format!("sample://page/{}", page),
            })
    }
}
