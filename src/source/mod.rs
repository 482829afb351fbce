//! Data source protocol, snapshot cache and synchronization.

pub mod cache;
pub mod sheets;
pub mod sync;
pub mod tabular;

use crate::error::PipelineError;
use crate::models::Dataset;

pub use cache::CacheStore;
pub use sheets::SheetSource;
pub use sync::{load_cached_snapshot, synchronize, SourceStatus};

/// A remote source serving whole tables by name.
///
/// A fetch returns the full table or `SourceUnavailable`; there is no
/// partial or incremental fetch.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    async fn fetch(&self, name: &str) -> Result<Dataset, PipelineError>;
}
