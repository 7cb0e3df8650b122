//! Runtime configuration sourced from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SYMPTOMRANK_DB_PATH` | `symptomrank.db` |
//! | `SYMPTOMRANK_TOP_N` | `3` |
//! | `SYMPTOMRANK_PRIMARY_BOOST` | `1.5` |
//! | `SYMPTOMRANK_LOG_MODE` | `stderr` (`stderr` or `file`) |
//! | `SYMPTOMRANK_LOG_FILE` | `symptomrank.log` |

use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::ScoringConfig;
use crate::{Result, SymptomRankError};

pub const DB_PATH_ENV: &str = "SYMPTOMRANK_DB_PATH";
pub const TOP_N_ENV: &str = "SYMPTOMRANK_TOP_N";
pub const PRIMARY_BOOST_ENV: &str = "SYMPTOMRANK_PRIMARY_BOOST";
pub const LOG_MODE_ENV: &str = "SYMPTOMRANK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "SYMPTOMRANK_LOG_FILE";

const DEFAULT_DB_PATH: &str = "symptomrank.db";
const DEFAULT_LOG_FILE: &str = "symptomrank.log";

/// Where log output goes. Stdout is reserved for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

impl FromStr for LogMode {
    type Err = SymptomRankError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            other => Err(SymptomRankError::Config(format!(
                "{LOG_MODE_ENV} must be \"stderr\" or \"file\", got {other:?}"
            ))),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub scoring: ScoringConfig,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            scoring: ScoringConfig::default(),
            log_mode: LogMode::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Config` if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset keys fall back to defaults.
    ///
    /// # Errors
    /// Returns `Config` if a value is malformed or the scoring settings are invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(value) = lookup(TOP_N_ENV) {
            config.scoring.top_n = parse(TOP_N_ENV, &value)?;
        }
        if let Some(value) = lookup(PRIMARY_BOOST_ENV) {
            config.scoring.primary_boost = parse(PRIMARY_BOOST_ENV, &value)?;
        }
        if let Some(value) = lookup(LOG_MODE_ENV) {
            config.log_mode = value.parse()?;
        }
        if let Some(path) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_file = PathBuf::from(path.trim());
        }

        config
            .scoring
            .validate()
            .map_err(|errors| SymptomRankError::Config(errors.join("; ")))?;

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SymptomRankError::Config(format!("{key} has invalid value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("Should load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scoring.top_n, 3);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/tmp/kb.db"),
            (TOP_N_ENV, " 5 "),
            (PRIMARY_BOOST_ENV, "2.0"),
            (LOG_MODE_ENV, "FILE"),
        ]))
        .expect("Should load");

        assert_eq!(config.db_path, PathBuf::from("/tmp/kb.db"));
        assert_eq!(config.scoring.top_n, 5);
        assert!((config.scoring.primary_boost - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.log_mode, LogMode::File);
    }

    #[test]
    fn test_malformed_values_rejected() {
        for pairs in [
            vec![(TOP_N_ENV, "three")],
            vec![(TOP_N_ENV, "0")],
            vec![(PRIMARY_BOOST_ENV, "0.5")],
            vec![(PRIMARY_BOOST_ENV, "NaN")],
            vec![(LOG_MODE_ENV, "syslog")],
        ] {
            let result = AppConfig::from_lookup(lookup(&pairs));
            assert!(
                matches!(result, Err(SymptomRankError::Config(_))),
                "Expected config error for {pairs:?}"
            );
        }
    }
}
