use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MovieRow, RawRecord};

/// Outbound page access for enrichment sources. `fetch` retrieves an
/// addressed URL; `search` runs a free-form web query, leaving the engine
/// and endpoint choice to the adapter. Either way the body comes back as
/// text; transport problems and non-success statuses collapse to a message.
#[async_trait]
pub trait PageFetcherPort: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, String>;
    async fn search(&self, query: &str) -> std::result::Result<String, String>;
}

/// Tabular input and output. The pipeline reads raw showtime records and
/// reads or writes finished tables without knowing the on-disk format.
/// Loading raw data is where missing required columns surface, before any
/// processing starts.
#[async_trait]
pub trait TabularStorePort: Send + Sync {
    async fn load_raw(&self, path: &Path) -> Result<Vec<RawRecord>>;
    async fn load_finished(&self, path: &Path) -> Result<Vec<MovieRow>>;
    async fn save_finished(&self, path: &Path, rows: &[MovieRow]) -> Result<()>;
}
