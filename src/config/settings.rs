//! Configuration settings for the CFF search

use crate::cff::search::SearchCursor;
use crate::cff::verifier::{DEFAULT_MAX_BLOCKS, MAX_BLOCKS_LIMIT};
use crate::store::UpsertPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub search: SearchConfig,
    pub solver: SolverConfig,
    pub store: StoreConfig,
    pub verifier: VerifierConfig,
}

/// Starting point of the exploration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub d: usize,
    pub t: usize,
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub timeout_seconds: u64,
    pub max_clauses: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub cursor_path: Option<PathBuf>,
    #[serde(default)]
    pub upsert_policy: UpsertPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub verify_solutions: bool,
    pub max_blocks: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchConfig { d: 2, t: 1, n: 1 },
            solver: SolverConfig {
                timeout_seconds: 10,
                max_clauses: 50_000_000,
            },
            store: StoreConfig {
                path: PathBuf::from("data.json"),
                cursor_path: None,
                upsert_policy: UpsertPolicy::Refresh,
            },
            verifier: VerifierConfig {
                verify_solutions: false,
                max_blocks: DEFAULT_MAX_BLOCKS,
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.search.d == 0 {
            anyhow::bail!("d must be positive");
        }
        if self.search.t == 0 || self.search.n == 0 {
            anyhow::bail!("t and n must be positive");
        }
        if self.solver.timeout_seconds == 0 {
            anyhow::bail!("Solver timeout must be positive");
        }
        if self.solver.max_clauses == 0 {
            anyhow::bail!("Clause limit must be positive");
        }
        if self.verifier.max_blocks > MAX_BLOCKS_LIMIT {
            anyhow::bail!(
                "Verifier block ceiling {} exceeds the supported maximum of {}",
                self.verifier.max_blocks,
                MAX_BLOCKS_LIMIT
            );
        }
        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(d) = cli_overrides.d {
            self.search.d = d;
        }
        if let Some(t) = cli_overrides.t {
            self.search.t = t;
        }
        if let Some(n) = cli_overrides.n {
            self.search.n = n;
        }
        if let Some(timeout) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = timeout;
        }
        if let Some(ref store) = cli_overrides.store_path {
            self.store.path = store.clone();
        }
        if cli_overrides.verify {
            self.verifier.verify_solutions = true;
        }
    }

    /// The configured starting point as a search cursor
    pub fn start_cursor(&self) -> SearchCursor {
        SearchCursor::new(self.search.d, self.search.t, self.search.n)
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub d: Option<usize>,
    pub t: Option<usize>,
    pub n: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub store_path: Option<PathBuf>,
    pub verify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.solver.timeout_seconds, 10);
        assert_eq!(settings.store.upsert_policy, UpsertPolicy::Refresh);
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config/default.yaml");

        let mut settings = Settings::default();
        settings.store.upsert_policy = UpsertPolicy::Legacy;
        settings.store.cursor_path = Some(PathBuf::from("cursor.json"));
        settings.to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.store.upsert_policy, UpsertPolicy::Legacy);
        assert_eq!(loaded.store.cursor_path, Some(PathBuf::from("cursor.json")));
        assert_eq!(loaded.search.d, 2);
    }

    #[test]
    fn test_store_policy_defaults_when_omitted() {
        let yaml = r#"
search: { d: 1, t: 3, n: 3 }
solver: { timeout_seconds: 5, max_clauses: 1000 }
store: { path: results.json }
verifier: { verify_solutions: true, max_blocks: 12 }
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.store.upsert_policy, UpsertPolicy::Refresh);
        assert_eq!(settings.store.cursor_path, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.search.d = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.solver.timeout_seconds = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.verifier.max_blocks = 40;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings = Settings::default();
        settings.merge_with_cli(&CliOverrides {
            d: Some(1),
            n: Some(6),
            store_path: Some(PathBuf::from("other.json")),
            verify: true,
            ..Default::default()
        });

        assert_eq!(settings.start_cursor(), SearchCursor::new(1, 1, 6));
        assert_eq!(settings.store.path, PathBuf::from("other.json"));
        assert!(settings.verifier.verify_solutions);
    }
}
