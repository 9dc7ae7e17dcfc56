//! Engine configuration: biweekly parity epoch and academic term bounds.
//!
//! Loaded from TOML:
//!
//! ```toml
//! parity_epoch = "2024-09-02"
//!
//! [term]
//! start = "2024-09-02"
//! end = "2025-01-31"
//! ```

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ConflictError, Result};

/// Anchor Monday for biweekly parity when none is configured. Week 0 (the
/// week starting on this date) is an even week.
pub const DEFAULT_PARITY_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default parity epoch"),
};

/// Inclusive calendar bounds of an academic term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AcademicTerm {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ConflictError::Validation(format!(
                "term start {start} is after term end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_epoch")]
    pub parity_epoch: NaiveDate,
    #[serde(default)]
    pub term: Option<AcademicTerm>,
}

fn default_epoch() -> NaiveDate {
    DEFAULT_PARITY_EPOCH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parity_epoch: DEFAULT_PARITY_EPOCH,
            term: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)
            .map_err(|e| ConflictError::Validation(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_parity_epoch(mut self, epoch: NaiveDate) -> Result<Self> {
        self.parity_epoch = epoch;
        self.validate()?;
        Ok(self)
    }

    pub fn with_term(mut self, term: AcademicTerm) -> Self {
        self.term = Some(term);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.parity_epoch.weekday() != Weekday::Mon {
            return Err(ConflictError::Validation(format!(
                "parity epoch {} is a {:?}, expected a Monday",
                self.parity_epoch,
                self.parity_epoch.weekday()
            )));
        }
        if let Some(term) = self.term {
            AcademicTerm::new(term.start, term.end)?;
        }
        Ok(())
    }
}
