//! Error types for roster compliance.
//!
//! Two families live here:
//!
//! - [`StructuralError`] / [`Error`]: malformed input detected while building
//!   canonical days or assembling a [`WindowContext`](crate::compliance::WindowContext).
//!   These abort evaluation for the agent before any rule runs.
//! - [`RuleError`]: a rule that cannot complete its check. The engine turns
//!   these into Error-severity violations so the rest of the catalog still runs.
//!
//! Policy findings are neither: they are [`Violation`](crate::models::Violation)s.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Result type for fallible roster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed input at the canonical-day boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// External day-type code missing from the mapping table.
    #[error("unknown day type '{code}' for agent {agent_id} on {date}")]
    UnknownDayType {
        agent_id: String,
        date: NaiveDate,
        code: String,
    },

    /// Two records for the same agent and date.
    #[error("duplicate day {date} for agent {agent_id}")]
    DuplicateDay { agent_id: String, date: NaiveDate },

    /// A day of another agent slipped into a per-agent sequence.
    #[error("day {date} belongs to agent {found}, expected {expected}")]
    AgentMismatch {
        expected: String,
        found: String,
        date: NaiveDate,
    },

    /// Two intervals of the same day overlap.
    #[error("overlapping intervals on {date} for agent {agent_id}: {first_end} > {second_start}")]
    OverlappingIntervals {
        agent_id: String,
        date: NaiveDate,
        first_end: NaiveDateTime,
        second_start: NaiveDateTime,
    },

    /// An interval whose end is not after its start.
    #[error("interval on {date} for agent {agent_id} ends at {end}, not after {start}")]
    InvalidInterval {
        agent_id: String,
        date: NaiveDate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// A single structural problem.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Several structural problems collected in one pass.
    #[error("{} structural error(s) in roster input", .0.len())]
    Invalid(Vec<StructuralError>),

    /// Thresholds or regime values that cannot be used together.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// All structural errors carried by this error, if any.
    pub fn structural_errors(&self) -> Vec<&StructuralError> {
        match self {
            Error::Structural(e) => vec![e],
            Error::Invalid(errors) => errors.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Vec<StructuralError>> for Error {
    fn from(mut errors: Vec<StructuralError>) -> Self {
        if errors.len() == 1 {
            Error::Structural(errors.remove(0))
        } else {
            Error::Invalid(errors)
        }
    }
}

/// Failure of a single rule invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Evaluation bounds cannot be determined for a non-empty day sequence.
    #[error("evaluation window cannot be determined (start {start:?}, end {end:?})")]
    WindowUndetermined {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },

    /// Data the rule depends on is absent.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Anything else that stopped the rule.
    #[error("rule failure: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_structural_message() {
        let err = StructuralError::UnknownDayType {
            agent_id: "A1".into(),
            date: date(),
            code: "XYZ".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown day type 'XYZ' for agent A1 on 2024-03-01"
        );
    }

    #[test]
    fn test_from_vec_single() {
        let err: Error = vec![StructuralError::DuplicateDay {
            agent_id: "A1".into(),
            date: date(),
        }]
        .into();
        assert!(matches!(err, Error::Structural(_)));
        assert_eq!(err.structural_errors().len(), 1);
    }

    #[test]
    fn test_from_vec_many() {
        let dup = StructuralError::DuplicateDay {
            agent_id: "A1".into(),
            date: date(),
        };
        let err: Error = vec![dup.clone(), dup].into();
        assert!(matches!(err, Error::Invalid(_)));
        assert!(err.to_string().starts_with("2 structural error(s)"));
    }

    #[test]
    fn test_rule_error_message() {
        let err = RuleError::WindowUndetermined {
            start: Some(date()),
            end: None,
        };
        assert!(err.to_string().contains("cannot be determined"));
    }
}
