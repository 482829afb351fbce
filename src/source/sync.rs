//! Snapshot loading and synchronization.
//!
//! A sync fetches every source, persists successful non-empty fetches, falls
//! back to the cache for failed ones, and only then hands back a complete
//! snapshot for the caller to swap in.

use super::cache::CacheStore;
use super::DataSource;
use crate::config::SourceConfig;
use crate::models::{Dataset, SourceKind};
use crate::state::Snapshot;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a source's data came from in the latest load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Fetched { rows: usize },
    Cached { rows: usize },
    Absent,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOrigin::Fetched { rows } => write!(f, "fetched {} rows", rows),
            SourceOrigin::Cached { rows } => write!(f, "{} rows from cache", rows),
            SourceOrigin::Absent => write!(f, "no data"),
        }
    }
}

/// Per-source result of a load or sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStatus {
    pub kind: SourceKind,
    pub origin: SourceOrigin,
}

/// Build a snapshot from the cache alone.
pub fn load_cached_snapshot(cache: Option<&CacheStore>) -> (Snapshot, Vec<SourceStatus>) {
    let mut statuses = Vec::with_capacity(SourceKind::ALL.len());
    let mut datasets = Vec::new();

    for kind in SourceKind::ALL {
        match read_cache(cache, kind) {
            Some(dataset) => {
                statuses.push(SourceStatus {
                    kind,
                    origin: SourceOrigin::Cached {
                        rows: dataset.len(),
                    },
                });
                datasets.push((kind, dataset));
            }
            None => statuses.push(SourceStatus {
                kind,
                origin: SourceOrigin::Absent,
            }),
        }
    }

    (datasets.into_iter().collect(), statuses)
}

/// Fetch every source and build a fresh snapshot.
///
/// Never fails: a source that cannot be fetched falls back to its cached
/// snapshot, and to absence when there is none.
pub async fn synchronize<S: DataSource>(
    source: &S,
    sheets: &SourceConfig,
    cache: Option<&CacheStore>,
    show_progress: bool,
) -> (Snapshot, Vec<SourceStatus>) {
    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Synchronizing sources...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let fetches = SourceKind::ALL
        .iter()
        .map(|&kind| async move { (kind, source.fetch(sheets.sheet_name(kind)).await) });
    let results = join_all(fetches).await;

    let mut statuses = Vec::with_capacity(results.len());
    let mut snapshot = Snapshot::new();

    for (kind, result) in results {
        let loaded = match result {
            Ok(dataset) => {
                if let Some(cache) = cache {
                    if let Err(e) = cache.write(kind, &dataset) {
                        warn!("Failed to cache {}: {}", kind, e);
                    }
                }
                let rows = dataset.len();
                Some((dataset, SourceOrigin::Fetched { rows }))
            }
            Err(e) => {
                warn!("{}", e);
                read_cache(cache, kind).map(|dataset| {
                    let rows = dataset.len();
                    (dataset, SourceOrigin::Cached { rows })
                })
            }
        };

        match loaded {
            Some((dataset, origin)) => {
                statuses.push(SourceStatus { kind, origin });
                snapshot = snapshot.with(kind, dataset);
            }
            None => statuses.push(SourceStatus {
                kind,
                origin: SourceOrigin::Absent,
            }),
        }
    }

    if let Some(pb) = spinner {
        pb.finish_with_message("Synchronization complete");
    }

    (snapshot, statuses)
}

fn read_cache(cache: Option<&CacheStore>, kind: SourceKind) -> Option<Dataset> {
    let cache = cache?;
    let dataset = match cache.read(kind) {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!("Ignoring unreadable cache for {}: {}", kind, e);
            None
        }
    };
    dataset.inspect(|d| debug!("Loaded {} cached rows for {}", d.len(), kind))
}
