pub mod drift;
pub mod etl;
pub mod inventory;
pub mod mapping;
pub mod schema;
pub mod transformer;

pub use crate::domain::model::{BaselinePage, BaselineRecord, RawRecord, RunSummary};
pub use crate::domain::ports::{ConfigProvider, PageSource, RecordSink, Storage};
pub use crate::utils::error::Result;
