//! On-disk snapshot cache.
//!
//! One CSV file per source holds the last successfully fetched snapshot.
//! Writes go through a temporary file in the same directory and are
//! renamed into place, so a reader never sees a half-written file.

use super::tabular::{read_dataset, write_dataset};
use crate::error::PipelineError;
use crate::models::{Dataset, SourceKind};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Cache directory holding one snapshot per source.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a source.
    pub fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(format!("{}.csv", kind.cache_key()))
    }

    /// Last persisted snapshot, or `None` if never written.
    pub fn read(&self, kind: SourceKind) -> Result<Option<Dataset>, PipelineError> {
        let path = self.path_for(kind);
        if !path.exists() {
            debug!("No cached snapshot for {}", kind);
            return Ok(None);
        }

        let file = fs::File::open(&path)?;
        let dataset = read_dataset(BufReader::new(file)).map_err(|e| PipelineError::Cache {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Read {} cached rows for {}", dataset.len(), kind);
        Ok(Some(dataset))
    }

    /// Persist a snapshot. Empty snapshots are skipped; returns whether a
    /// file was written.
    pub fn write(&self, kind: SourceKind, dataset: &Dataset) -> Result<bool, PipelineError> {
        if dataset.is_empty() {
            debug!("Skipping cache write for empty {}", kind);
            return Ok(false);
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(kind);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        write_dataset(&mut tmp, dataset)?;
        tmp.persist(&path).map_err(|e| PipelineError::Cache {
            path: path.clone(),
            reason: e.error.to_string(),
        })?;

        info!("Cached {} rows for {} at {}", dataset.len(), kind, path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut ds = Dataset::new(
            ["USUARIO", "FECHA_FACTURA", "VALOR"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        ds.push(Record::from_pairs([
            ("USUARIO", "Ana"),
            ("FECHA_FACTURA", "2024-01-10 08:15:00"),
            ("VALOR", "12000"),
        ]));
        ds.push(Record::from_pairs([
            ("USUARIO", "Beto, J."),
            ("FECHA_FACTURA", ""),
            ("VALOR", "0.5"),
        ]));
        ds
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        assert!(cache.read(SourceKind::Rips).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path().join("persisted"));
        let original = sample();

        assert!(cache.write(SourceKind::Facturacion, &original).unwrap());
        let restored = cache.read(SourceKind::Facturacion).unwrap().unwrap();

        assert_eq!(restored.columns, original.columns);
        assert_eq!(restored.len(), original.len());
        for (a, b) in original.records.iter().zip(&restored.records) {
            for column in &original.columns {
                assert_eq!(a.text(column), b.text(column));
            }
        }
    }

    #[test]
    fn test_empty_snapshot_not_written() {
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());
        let empty = Dataset::new(vec!["USUARIO".to_string()]);

        assert!(!cache.write(SourceKind::Ppl, &empty).unwrap());
        assert!(!cache.path_for(SourceKind::Ppl).exists());
    }

    #[test]
    fn test_write_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let cache = CacheStore::new(dir.path());

        cache.write(SourceKind::Ppl, &sample()).unwrap();
        let mut smaller = sample();
        smaller.records.truncate(1);
        cache.write(SourceKind::Ppl, &smaller).unwrap();

        assert_eq!(cache.read(SourceKind::Ppl).unwrap().unwrap().len(), 1);
    }
}
