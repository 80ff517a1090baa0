use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs;

/// Command line flags shared by every binary that loads a config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// The config directory, default is `~/.config/eventdesk`.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// The data directory, default is `~/.local/share/eventdesk`.
    #[arg(long)]
    pub data_path: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn build_path_set(&self) -> Result<PathSet> {
        PathSet::new(self.config_path.clone(), self.data_path.clone())
    }

    pub fn load<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let ps = self.build_path_set()?;
        ps.load_config(name, T::default)
    }
}

pub struct PathSet {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl PathSet {
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => match env::var("EVENTDESK_CONFIG") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => dirs::config_dir()?,
            },
        };

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => match env::var("EVENTDESK_DATA") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => dirs::data_dir()?,
            },
        };

        dirs::ensure_dir_exists(&config_dir)
            .with_context(|| format!("ensure config directory: {}", config_dir.display()))?;
        dirs::ensure_dir_exists(&data_dir)
            .with_context(|| format!("ensure data directory: {}", data_dir.display()))?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn load_config<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_dir.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s).context("parse config toml")?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                default_func()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }
}

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        name: String,

        #[serde(skip)]
        completed: bool,
    }

    impl CommonConfig for TestConfig {
        fn default() -> Self {
            Self {
                name: String::from("default"),
                completed: false,
            }
        }

        fn complete(&mut self, _ps: &PathSet) -> Result<()> {
            if self.name.is_empty() {
                anyhow::bail!("name is required");
            }
            self.completed = true;
            Ok(())
        }
    }

    #[test]
    fn test_load_config() {
        let base = env::temp_dir().join("_eventdesk_test_load_config");
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        let ps = PathSet::new(Some(config_dir.clone()), Some(data_dir.clone())).unwrap();
        assert!(config_dir.is_dir());
        assert!(data_dir.is_dir());

        let cfg: TestConfig = ps.load_config("missing", TestConfig::default).unwrap();
        assert_eq!(cfg.name, "default");
        assert!(cfg.completed);

        fs::write(config_dir.join("present.toml"), "name = \"from file\"\n").unwrap();
        let cfg: TestConfig = ps.load_config("present", TestConfig::default).unwrap();
        assert_eq!(cfg.name, "from file");

        fs::write(config_dir.join("empty.toml"), "name = \"\"\n").unwrap();
        let result: Result<TestConfig> = ps.load_config("empty", TestConfig::default);
        assert!(result.is_err());

        fs::remove_dir_all(base).unwrap();
    }
}
