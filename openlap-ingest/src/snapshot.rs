//! Snapshot sink implementations
//!
//! The fetch loop persists a session buffer exactly once, at natural
//! termination. The encoding and destination are the sink's concern, not the
//! loop's.

use anyhow::Result;
use openlap_core::SessionBuffer;
use std::path::{Path, PathBuf};

/// Trait for snapshot destinations
pub trait SnapshotSink: Send + Sync {
    fn write(&self, key: &str, buffer: &SessionBuffer) -> Result<()>;
}

/// JSON document sink, one file per session key.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, falling back to the temp dir when the
    /// platform offers none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("openlap")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Session keys are opaque; keep the filename filesystem-safe
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Default for JsonFileSink {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

impl SnapshotSink for JsonFileSink {
    fn write(&self, key: &str, buffer: &SessionBuffer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let json = serde_json::to_string(buffer)?;
        std::fs::write(&path, json)?;
        tracing::info!(key, path = %path.display(), records = buffer.total_len(), "snapshot written");
        Ok(())
    }
}

/// Sink that drops snapshots. For tests and callers that own persistence
/// elsewhere.
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&self, _key: &str, _buffer: &SessionBuffer) -> Result<()> {
        Ok(())
    }
}

/// The file a snapshot for `key` lands at under `dir`.
pub fn snapshot_path(dir: &Path, key: &str) -> PathBuf {
    JsonFileSink::new(dir).path_for(key)
}
