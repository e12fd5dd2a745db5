//! Snapshot Exporter
//!
//! Copies every record of a point-in-time snapshot into a brand-new store,
//! committing in chunks of [`CHUNK_SIZE`] records. A failed export leaves
//! nothing behind at the destination.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::Engine;
use super::Record;
use crate::error::{KvError, Result};
use crate::snapshot::ReadOptions;
use crate::write_batch::WriteBatch;

/// Records per destination commit
pub const CHUNK_SIZE: usize = 1000;

/// Summary of a finished export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportStats {
    pub records: usize,
    pub chunks: usize,
}

/// Destination store that is destroyed on drop unless finished
struct Destination {
    engine: Option<Engine>,
    path: PathBuf,
    finished: bool,
}

impl Destination {
    fn create(source: &Config, path: &Path) -> Result<Self> {
        let config = Config {
            data_dir: path.to_path_buf(),
            error_if_exists: true,
            ..source.clone()
        };
        let engine = Engine::open(config)?;

        Ok(Self {
            engine: Some(engine),
            path: path.to_path_buf(),
            finished: false,
        })
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        match &self.engine {
            Some(engine) => engine.write(batch),
            None => Ok(()),
        }
    }

    fn finish(mut self) -> Result<()> {
        if let Some(engine) = self.engine.take() {
            engine.close()?;
        }
        self.finished = true;
        Ok(())
    }
}

impl Drop for Destination {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Release file handles before removing the files
        self.engine.take();
        match Engine::destroy(&self.path) {
            Ok(()) => tracing::warn!("Removed partial export at {}", self.path.display()),
            Err(e) => tracing::warn!(
                "Failed to remove partial export at {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Copy the whole store into a new store at `destination`
///
/// Fails with [`KvError::DestinationExists`] without touching either store if one is already there.
pub fn export(engine: &Engine, destination: &Path) -> Result<ExportStats> {
    if destination.as_os_str().is_empty() {
        return Err(KvError::Storage("empty export destination".to_string()));
    }

    let target = Destination::create(engine.config(), destination)?;

    let snapshot = engine.snapshot();
    let mut cursor = engine.iter(ReadOptions::new().fill_cache(false).snapshot(&snapshot));
    let mut positioned = false;
    let records = std::iter::from_fn(move || {
        let step = if positioned {
            cursor.next()
        } else {
            positioned = true;
            cursor.seek_to_first()
        };
        match step {
            Ok(()) => cursor.record().map(Ok),
            Err(e) => Some(Err(e)),
        }
    });

    let stats = copy_records(target, records)?;

    tracing::info!(
        "Exported {} records in {} chunks to {}",
        stats.records,
        stats.chunks,
        destination.display()
    );
    Ok(stats)
}

/// Commit `records` to `target` in chunks, removing it on any failure
fn copy_records<I>(target: Destination, records: I) -> Result<ExportStats>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut stats = ExportStats::default();
    let mut batch = WriteBatch::new();

    for record in records {
        let (key, value) = record?;
        batch.put(key, value);
        stats.records += 1;

        if stats.records % CHUNK_SIZE == 0 {
            target.write(std::mem::take(&mut batch))?;
            stats.chunks += 1;
        }
    }

    if stats.records % CHUNK_SIZE != 0 {
        target.write(batch)?;
        stats.chunks += 1;
    }

    target.finish()?;
    Ok(stats)
}
