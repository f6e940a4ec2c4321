//! Snapshot persistence.
//!
//! Each run writes one JSON document per mode to
//! `{root}/{run_id}/{mode}.json`. Downstream analysis loads snapshots back by
//! the same mode name and run id.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PipelineError;
use crate::measure::MeasurementMode;

/// Reads and writes mode snapshots under a results directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
    pretty: bool,
}

impl ResultStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            root: root.into(),
            pretty,
        }
    }

    /// Root results directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot path for a run and mode.
    pub fn path(&self, run_id: &str, mode: MeasurementMode) -> PathBuf {
        self.root
            .join(run_id)
            .join(format!("{}.json", mode.name()))
    }

    /// Whether a snapshot exists for a run and mode.
    pub fn exists(&self, run_id: &str, mode: MeasurementMode) -> bool {
        self.path(run_id, mode).exists()
    }

    /// Write a snapshot, creating the run directory if needed.
    pub fn save<T: Serialize>(
        &self,
        run_id: &str,
        mode: MeasurementMode,
        snapshot: &T,
    ) -> Result<PathBuf, PipelineError> {
        let path = self.path(run_id, mode);
        let snapshot_error = |message: String| PipelineError::Snapshot {
            path: path.clone(),
            message,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| snapshot_error(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(&path)
            .map_err(|e| snapshot_error(format!("Failed to create file: {e}")))?;
        let mut writer = BufWriter::new(file);
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, snapshot)
        } else {
            serde_json::to_writer(&mut writer, snapshot)
        };
        written.map_err(|e| snapshot_error(format!("Failed to serialize: {e}")))?;
        writeln!(writer)
            .and_then(|_| writer.flush())
            .map_err(|e| snapshot_error(format!("Failed to write: {e}")))?;

        tracing::info!("Saved {} snapshot to {:?}", mode.name(), path);
        Ok(path)
    }

    /// Read a snapshot back.
    pub fn load<T: DeserializeOwned>(
        &self,
        run_id: &str,
        mode: MeasurementMode,
    ) -> Result<T, PipelineError> {
        let path = self.path(run_id, mode);
        let file = File::open(&path).map_err(|e| PipelineError::Snapshot {
            path: path.clone(),
            message: format!("Failed to open: {e}"),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::Snapshot {
            path: path.clone(),
            message: format!("Failed to parse: {e}"),
        })
    }
}
