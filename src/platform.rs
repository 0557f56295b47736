use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};

fn dirs_home() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// Get the data directory for solodex (database, backups).
pub fn data_dir() -> Result<PathBuf> {
    let dir = if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("solodex")
    } else if let Some(home) = dirs_home() {
        if cfg!(target_os = "macos") {
            home.join("Library").join("Application Support").join("solodex")
        } else {
            // Linux (including WSL)
            home.join(".local").join("share").join("solodex")
        }
    } else {
        bail!("Cannot determine data directory");
    };

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_ends_with_app_name() {
        let dir = data_dir().unwrap();
        assert!(dir.ends_with("solodex"));
    }
}
