use std::path::PathBuf;

use anyhow::{bail, Result};
use eventdesk_misc::config::{CommonConfig, PathSet};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::SqliteConnection;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SqliteConfig {
    /// Keep everything in memory, the data is lost when the server stops.
    #[serde(default)]
    pub memory: bool,

    /// Database file name under the data directory.
    #[serde(default = "SqliteConfig::default_name")]
    pub name: String,

    #[serde(skip)]
    path: PathBuf,
}

impl CommonConfig for SqliteConfig {
    fn default() -> Self {
        Self {
            memory: false,
            name: Self::default_name(),
            path: PathBuf::new(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.memory {
            return Ok(());
        }
        if self.name.is_empty() {
            bail!("name is required");
        }
        if self.name.contains('/') {
            bail!("name must be a file name, not a path");
        }

        self.path = ps.data_dir.join(&self.name);
        Ok(())
    }
}

impl SqliteConfig {
    pub fn build(&self) -> Result<SqliteConnection> {
        if self.memory {
            warn!("Using in-memory sqlite database, the data will be lost when the server stops");
            return SqliteConnection::memory();
        }

        info!("Using sqlite database: {}", self.path.display());
        SqliteConnection::open(&self.path)
    }

    fn default_name() -> String {
        String::from("eventdesk.db")
    }
}
