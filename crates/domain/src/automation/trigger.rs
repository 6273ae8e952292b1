//! Trigger: what starts an automation run.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Describes when an automation should run.
///
/// Definitions are written by other clients and may carry trigger kinds this
/// build does not know about; those decode as [`TriggerSpec::Unsupported`]
/// and are rejected when the automation is validated or registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Fires on a cron time pattern (e.g. `"0 8 * * *"`).
    Cron { expression: String },
    #[serde(other)]
    Unsupported,
}

impl TriggerSpec {
    #[must_use]
    pub fn cron(expression: impl Into<String>) -> Self {
        Self::Cron {
            expression: expression.into(),
        }
    }

    /// Check that the trigger is of a known kind and well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedTrigger`] for unknown kinds and
    /// [`ValidationError::InvalidCron`] for unparsable cron expressions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Cron { expression } => CronExpression::parse(expression).map(drop),
            Self::Unsupported => Err(ValidationError::UnsupportedTrigger),
        }
    }
}

impl std::fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cron { expression } => write!(f, "cron({expression})"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// A parsed cron expression.
///
/// Accepts the classic 5-field form (`minute hour day month weekday`, where
/// both `0` and `7` mean Sunday) and a 6-field form with a leading seconds
/// field.
#[derive(Debug, Clone)]
pub struct CronExpression {
    source: String,
    cron: croner::Cron,
}

impl CronExpression {
    /// Parse a cron expression.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCron`] when the expression is empty,
    /// has the wrong number of fields, or does not parse.
    pub fn parse(expression: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidCron {
            expression: expression.to_string(),
            reason,
        };

        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }
        let fields = trimmed.split_whitespace().count();
        if !(5..=6).contains(&fields) {
            return Err(invalid(format!("expected 5 or 6 fields, found {fields}")));
        }

        let cron = croner::Cron::new(trimmed)
            .with_seconds_optional()
            .parse()
            .map_err(|err| invalid(err.to_string()))?;

        Ok(Self {
            source: trimmed.to_string(),
            cron,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First occurrence strictly after `after`, if the pattern has one.
    #[must_use]
    pub fn next_after(&self, after: &Timestamp) -> Option<Timestamp> {
        self.cron.find_next_occurrence(after, false).ok()
    }
}

impl std::fmt::Display for CronExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
