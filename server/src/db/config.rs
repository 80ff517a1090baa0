use anyhow::{Context, Result};
use eventdesk_misc::config::{CommonConfig, PathSet};
use serde::{Deserialize, Serialize};

use super::sqlite::config::SqliteConfig;
use super::{Database, UnionConnection};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DbConfig {
    #[serde(default = "DbConfig::default_name")]
    pub name: DbType,

    /// Only used when `name` is sqlite.
    #[serde(default = "SqliteConfig::default")]
    pub sqlite: SqliteConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl CommonConfig for DbConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            sqlite: SqliteConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        match self.name {
            DbType::Sqlite => self.sqlite.complete(ps).context("sqlite"),
        }
    }
}

impl DbConfig {
    pub fn build(&self) -> Result<Database> {
        let conn = match self.name {
            DbType::Sqlite => UnionConnection::Sqlite(self.sqlite.build()?),
        };
        Ok(Database::new(conn))
    }

    fn default_name() -> DbType {
        DbType::Sqlite
    }
}
