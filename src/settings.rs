use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EtbError, Result};
use crate::rollup::StatementLabels;

/// User configuration, stored as JSON under `~/.config/etb/`. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// How long an upload waits for another upload's commit before giving up.
    pub lock_timeout_ms: u64,
    pub labels: StatementLabels,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join("etb"),
            lock_timeout_ms: 5000,
            labels: StatementLabels::default(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    home().join(".config").join("etb").join("settings.json")
}

impl Settings {
    /// Settings from the user's config file, or defaults when there is none yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EtbError::Settings(format!("{} is not valid settings JSON: {e}", path.display())))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| EtbError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("etb.db")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

/// Expand a leading `~` and make relative paths absolute against the working directory.
pub fn expand_home(path: &str) -> PathBuf {
    let expanded = match path.strip_prefix('~') {
        Some(rest) => home().join(rest.trim_start_matches(&['/', '\\'][..])),
        None => PathBuf::from(path),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().map_or(expanded.clone(), |cwd| cwd.join(&expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.lock_timeout_ms, 5000);
        assert_eq!(s.labels.assets, "Assets");
        assert!(s.labels.revenue.contains(&"Income".to_string()));
        assert!(s.data_dir.ends_with("Documents/etb"));
        assert_eq!(s.db_path(), s.data_dir.join("etb.db"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"data_dir": "/tmp/test", "labels": {"revenue": ["Turnover"]}}"#).unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.data_dir, PathBuf::from("/tmp/test"));
        assert_eq!(s.lock_timeout_ms, 5000);
        assert_eq!(s.labels.revenue, vec!["Turnover".to_string()]);
        assert_eq!(s.labels.equity, "Equity");
        assert_eq!(s.exports_dir(), PathBuf::from("/tmp/test/exports"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(EtbError::Settings(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("etb").join("settings.json");
        let settings = Settings {
            data_dir: PathBuf::from("/srv/etb"),
            lock_timeout_ms: 250,
            labels: StatementLabels::default(),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/books"), home.join("books"));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert!(expand_home("rel").is_absolute());
    }
}
