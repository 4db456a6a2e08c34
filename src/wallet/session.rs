//! Persisted wallet session
//!
//! Remembers the last connected address and active chain between runs so the
//! wallet can reconnect on startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub address: Option<Address>,
    pub connected: bool,
    pub chain_id: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            address: None,
            connected: false,
            chain_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// JSON-file backed session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record, or a fresh disconnected one if none exists yet
    pub fn load(&self) -> Result<SessionRecord> {
        if !self.path.exists() {
            return Ok(SessionRecord::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        serde_json::from_str(&content).context("Failed to parse session file")
    }

    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        // Write to a temp file first, then rename over the old record
        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(record).context("Failed to serialize session")?;
        std::fs::write(&temp_path, content).context("Failed to write session file")?;

        std::fs::rename(&temp_path, &self.path)
            .or_else(|_| {
                // If rename fails (e.g., cross-device), try copy + remove
                std::fs::copy(&temp_path, &self.path)?;
                std::fs::remove_file(&temp_path)?;
                Ok::<(), std::io::Error>(())
            })
            .context("Failed to finalize session file")?;

        Ok(())
    }

    pub fn record_connected(&self, address: Address, chain_id: Option<u64>) -> Result<()> {
        self.save(&SessionRecord {
            address: Some(address),
            connected: true,
            chain_id,
            updated_at: Utc::now(),
        })
    }

    pub fn record_chain(&self, chain_id: u64) -> Result<()> {
        let mut record = self.load()?;
        record.chain_id = Some(chain_id);
        record.updated_at = Utc::now();
        self.save(&record)
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&SessionRecord::default())
    }
}
