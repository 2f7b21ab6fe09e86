//! Engine configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```toml
//! term_weeks = 18
//! max_attempts = 50
//! seed = 7
//!
//! [[periods]]
//! slot = 1
//! days = [1, 2, 3, 4, 5]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::models::PeriodTable;
use crate::validation::{validate_periods, ValidationError, ValidationErrorKind, ValidationResult};

/// Default number of teaching weeks in a term.
pub const DEFAULT_TERM_WEEKS: u32 = 20;
/// Default draw budget per binding during auto-assign.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Tunables for conflict checking and auto-assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Auto-assigned placements span weeks `1..=term_weeks`.
    pub term_weeks: u32,
    /// Random draws per binding before giving up on its remaining hours.
    pub max_attempts: u32,
    /// Fixed RNG seed for reproducible auto-assign runs.
    pub seed: Option<u64>,
    /// Candidate slots and their allowed days.
    pub periods: PeriodTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            term_weeks: DEFAULT_TERM_WEEKS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
            periods: PeriodTable::standard(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Sets the term length in weeks.
    pub fn with_term_weeks(mut self, weeks: u32) -> Self {
        self.term_weeks = weeks;
        self
    }

    /// Sets the per-binding draw budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the period table.
    pub fn with_periods(mut self, periods: PeriodTable) -> Self {
        self.periods = periods;
        self
    }

    /// Checks settings and the period table, reporting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(ConfigError::Invalid)
    }

    /// Collects every out-of-range setting.
    pub(crate) fn check(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.term_weeks == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSetting,
                "term_weeks must be at least 1",
            ));
        }
        if self.max_attempts == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSetting,
                "max_attempts must be at least 1",
            ));
        }
        if let Err(mut period_errors) = validate_periods(&self.periods) {
            errors.append(&mut period_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.periods.candidate_count(), 28);
    }

    #[test]
    fn test_parse_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            term_weeks = 18
            max_attempts = 10
            seed = 42

            [[periods]]
            slot = 1
            days = [1, 3]

            [[periods]]
            slot = 2
            days = [2]
            "#,
        )
        .unwrap();
        assert_eq!(config.term_weeks, 18);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.periods.allowed_days(1), Some(&[1u8, 3][..]));
        assert!(!config.periods.contains_slot(3));
    }

    #[test]
    fn test_invalid_settings_collected() {
        let err = EngineConfig::from_toml_str(
            r#"
            term_weeks = 0
            max_attempts = 0
            periods = []
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidSetting);
                assert_eq!(errors[2].kind, ValidationErrorKind::InvalidPeriodTable);
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("term_week = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_attempts = 5").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.term_weeks, DEFAULT_TERM_WEEKS);

        assert!(matches!(
            EngineConfig::from_file(file.path().with_extension("missing")),
            Err(ConfigError::Read(_))
        ));
    }
}
