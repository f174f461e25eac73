pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::CloudViewClient;
pub use adapters::sample::SamplePageSource;
pub use adapters::sink::{BundleSink, JsonStdoutSink};
pub use adapters::storage::LocalStorage;
pub use config::AppConfig;
pub use core::drift::{DriftDetector, DriftReport};
pub use core::etl::EtlEngine;
pub use core::inventory::Inventory;
pub use core::transformer::SchemaTransformer;
pub use domain::model::{BaselinePage, BaselinePagination, BaselineRecord};
pub use utils::error::{EtlError, Result};
