use crate::constants::{APP_DIR, CONFIG_FILE, DEFAULT_EXECUTION_TIMEOUT_SECS};
use crate::planner::OverlapPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listing entries to skip: exact names or name prefixes.
    pub ignore: Vec<String>,
    pub show_hidden: bool,
    pub overlap_policy: OverlapPolicy,
    pub execution_timeout_secs: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            show_hidden: false,
            overlap_policy: OverlapPolicy::default(),
            execution_timeout_secs: DEFAULT_EXECUTION_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads settings from `path`, or the default location when `None`.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).unwrap_or_else(|e| {
                warn!("Ignoring malformed config {}: {e}", path.display());
                Self::default()
            }),
            Err(e) => {
                warn!("Cannot read config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Whether a listing entry should be skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        if !self.show_hidden && name.starts_with('.') {
            return true;
        }
        self.ignore
            .iter()
            .any(|rule| name == rule || name.starts_with(rule.as_str()))
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_is_ignored() {
        let settings = Settings {
            ignore: vec!["desktop.ini".to_string(), "~$".to_string()],
            ..Settings::default()
        };

        assert!(settings.is_ignored("desktop.ini"));
        assert!(settings.is_ignored("~$report.docx"));
        assert!(settings.is_ignored(".DS_Store"));

        assert!(!settings.is_ignored("report.docx"));
        assert!(!settings.is_ignored("Desktop.ini"));
    }

    #[test]
    fn hidden_files_kept_when_enabled() {
        let settings = Settings {
            show_hidden: true,
            ..Settings::default()
        };
        assert!(!settings.is_ignored(".env"));
    }

    #[test]
    fn parse_partial_file_fills_defaults() -> Result<()> {
        let settings = Settings::parse(
            r#"
            overlap_policy = "first-group-wins"
            ignore = ["Thumbs.db"]
            "#,
        )?;
        assert_eq!(settings.overlap_policy, OverlapPolicy::FirstGroupWins);
        assert_eq!(settings.ignore, vec!["Thumbs.db".to_string()]);
        assert_eq!(
            settings.execution_timeout_secs,
            DEFAULT_EXECUTION_TIMEOUT_SECS
        );
        assert!(!settings.show_hidden);
        Ok(())
    }

    #[test]
    fn load_falls_back_on_bad_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "overlap_policy = 12")?;

        let settings = Settings::load(Some(&path));
        assert_eq!(settings.overlap_policy, OverlapPolicy::Preserve);
        Ok(())
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/sortra/config.toml")));
        assert!(settings.ignore.is_empty());
    }
}
