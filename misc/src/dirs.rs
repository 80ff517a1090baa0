use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

const APP_NAME: &str = "eventdesk";

/// Creates `path` (and its parents) if it does not exist yet. Fails when
/// `path` exists but is not a directory.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        bail!("{} exists but is not a directory", path.display());
    }
    fs::create_dir_all(path).with_context(|| format!("create dir {}", path.display()))
}

/// `/etc/eventdesk` for root, `~/.config/eventdesk` otherwise.
pub fn config_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/etc").join(APP_NAME));
    }
    Ok(home_dir()?.join(".config").join(APP_NAME))
}

/// `/var/lib/eventdesk` for root, `~/.local/share/eventdesk` otherwise.
pub fn data_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/var/lib").join(APP_NAME));
    }
    Ok(home_dir()?.join(".local").join("share").join(APP_NAME))
}

fn home_dir() -> Result<PathBuf> {
    match std::env::var_os("HOME") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => bail!("could not determine home directory, please specify paths manually"),
    }
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_exists() {
        let base = std::env::temp_dir().join("_eventdesk_test_ensure_dir");
        let nested = base.join("parent/child");

        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        // Idempotent on an existing directory.
        ensure_dir_exists(&nested).unwrap();

        let file = base.join("file");
        fs::write(&file, "x").unwrap();
        assert!(ensure_dir_exists(&file).is_err());

        fs::remove_dir_all(&base).unwrap();
    }
}
