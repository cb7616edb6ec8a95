//! Structural validation of canonical day sequences.
//!
//! Checks the integrity of a per-agent day sequence before any rule runs.
//! Detects:
//! - Days belonging to another agent
//! - Duplicate (agent, date) records
//! - Inverted intervals (end not after start)
//! - Overlapping intervals within a day
//!
//! All problems are collected in one pass so the caller can report them
//! together.

use std::collections::HashSet;

use crate::error::StructuralError;
use crate::models::CanonicalDay;

/// Validation result.
pub type ValidationResult = Result<(), Vec<StructuralError>>;

/// Validates a per-agent day sequence.
///
/// Checks:
/// 1. Every day belongs to `agent_id`
/// 2. At most one day per date
/// 3. Every interval ends after it starts
/// 4. No two intervals of the same day overlap
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_days(agent_id: &str, days: &[CanonicalDay]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for day in days {
        if day.agent_id != agent_id {
            errors.push(StructuralError::AgentMismatch {
                expected: agent_id.to_string(),
                found: day.agent_id.clone(),
                date: day.date,
            });
        }

        if !seen.insert(day.date) {
            errors.push(StructuralError::DuplicateDay {
                agent_id: day.agent_id.clone(),
                date: day.date,
            });
        }

        for interval in &day.intervals {
            if interval.end <= interval.start {
                errors.push(StructuralError::InvalidInterval {
                    agent_id: day.agent_id.clone(),
                    date: day.date,
                    start: interval.start,
                    end: interval.end,
                });
            }
        }

        let mut sorted: Vec<_> = day.intervals.iter().collect();
        sorted.sort_by_key(|i| i.start);
        for pair in sorted.windows(2) {
            if pair[0].end > pair[1].start {
                errors.push(StructuralError::OverlappingIntervals {
                    agent_id: day.agent_id.clone(),
                    date: day.date,
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayType, TimeInterval};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn sample_days() -> Vec<CanonicalDay> {
        vec![
            CanonicalDay::working("A1", d(1), t(8), t(16)),
            CanonicalDay::rest("A1", d(2)),
            CanonicalDay::new("A1", d(3), DayType::Zcot).with_forfait(480),
        ]
    }

    #[test]
    fn test_valid_sequence() {
        assert!(validate_days("A1", &sample_days()).is_ok());
    }

    #[test]
    fn test_empty_sequence() {
        assert!(validate_days("A1", &[]).is_ok());
    }

    #[test]
    fn test_duplicate_date() {
        let mut days = sample_days();
        days.push(CanonicalDay::rest("A1", d(1)));
        let errors = validate_days("A1", &days).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DuplicateDay { .. })));
    }

    #[test]
    fn test_agent_mismatch() {
        let mut days = sample_days();
        days.push(CanonicalDay::rest("B7", d(4)));
        let errors = validate_days("A1", &days).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::AgentMismatch { found, .. } if found == "B7")));
    }

    #[test]
    fn test_inverted_interval() {
        let bad = TimeInterval {
            start: d(5).and_time(t(10)),
            end: d(5).and_time(t(9)),
        };
        let mut day = CanonicalDay::new("A1", d(5), DayType::Working);
        day.intervals.push(bad);
        let errors = validate_days("A1", &[day]).unwrap_err();
        assert!(matches!(errors[0], StructuralError::InvalidInterval { .. }));
    }

    #[test]
    fn test_overlapping_intervals() {
        let day = CanonicalDay::new("A1", d(5), DayType::Working)
            .with_shift(t(6), t(12))
            .with_shift(t(11), t(15));
        let errors = validate_days("A1", &[day]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::OverlappingIntervals { .. })));
    }

    #[test]
    fn test_multiple_errors() {
        let days = vec![
            CanonicalDay::rest("A1", d(1)),
            CanonicalDay::rest("A1", d(1)),
            CanonicalDay::rest("ZZ", d(2)),
        ];
        let errors = validate_days("A1", &days).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
