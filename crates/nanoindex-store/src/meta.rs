use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const LAYOUT_VERSION: u32 = 1;

/// Small JSON sidecar carrying the fields that can't be derived from file
/// size alone: `dim` (needed to validate re-opens) and `capacity` (the
/// mmap'd files are sized to capacity, not to `count`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub dim: usize,
    pub count: usize,
    pub capacity: usize,
    pub layout_version: u32,
}

impl Meta {
    pub fn new(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            count: 0,
            capacity,
            layout_version: LAYOUT_VERSION,
        }
    }

    pub fn path(data_dir: &Path) -> std::path::PathBuf {
        data_dir.join("meta.json")
    }

    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = fs::read_to_string(Self::path(data_dir))?;
        let meta: Self = serde_json::from_str(&raw)
            .map_err(|e| StoreError::CorruptMeta(format!("meta.json parse error: {e}")))?;
        if meta.layout_version != LAYOUT_VERSION {
            return Err(StoreError::CorruptMeta(format!(
                "unsupported layout_version {} (expected {LAYOUT_VERSION})",
                meta.layout_version
            )));
        }
        Ok(meta)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::CorruptMeta(format!("meta.json serialize error: {e}")))?;
        fs::write(Self::path(data_dir), raw)?;
        Ok(())
    }
}
