//! Calendar windowing for period-scoped rules.
//!
//! Partitions an evaluation window into calendar sub-periods (day, month,
//! semester, year) and runs a rule callback once per sub-period with the
//! days falling in it.
//!
//! # Coverage
//! A sub-period is *full* when the window contains it entirely:
//! `window_start <= period_start && window_end >= period_end`. Quota rules
//! only enforce hard limits on full sub-periods.
//!
//! # Failure model
//! Nothing here returns an error to the caller. An undeterminable window
//! and every [`RuleError`] raised by a callback become one Error-severity
//! violation, so sibling rules still run.

use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

use crate::compliance::WindowContext;
use crate::error::RuleError;
use crate::models::{codes, CanonicalDay, RuleResult, Violation};

/// Granularity a rule is evaluated at.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Once per day, driven by the engine's day loop.
    Day,
    /// Once per calendar month.
    Month,
    /// Once per half-year (Jan–Jun, Jul–Dec).
    Semester,
    /// Once per calendar year.
    Year,
    /// Once over the whole window.
    Window,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Day => "day",
            Scope::Month => "month",
            Scope::Semester => "semester",
            Scope::Year => "year",
            Scope::Window => "window",
        }
    }
}

/// Identity of a sub-period.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    /// `half` is 1 (Jan–Jun) or 2 (Jul–Dec).
    Semester { year: i32, half: u8 },
    Year(i32),
    Window,
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{date}"),
            PeriodKey::Month { year, month } => write!(f, "{year}-{month:02}"),
            PeriodKey::Semester { year, half } => write!(f, "{year}-S{half}"),
            PeriodKey::Year(year) => write!(f, "{year}"),
            PeriodKey::Window => write!(f, "window"),
        }
    }
}

/// A calendar sub-period intersected with the evaluation window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SubPeriod {
    pub key: PeriodKey,
    /// Calendar start of the period.
    pub period_start: NaiveDate,
    /// Calendar end of the period (inclusive).
    pub period_end: NaiveDate,
    /// Start of the overlap with the window.
    pub start: NaiveDate,
    /// End of the overlap with the window (inclusive).
    pub end: NaiveDate,
    /// The window covers the whole period.
    pub is_full: bool,
}

impl SubPeriod {
    fn clip(
        key: PeriodKey,
        period_start: NaiveDate,
        period_end: NaiveDate,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Option<Self> {
        let start = period_start.max(window_start);
        let end = period_end.min(window_end);
        if start > end {
            return None;
        }
        Some(Self {
            key,
            period_start,
            period_end,
            start,
            end,
            is_full: window_start <= period_start && window_end >= period_end,
        })
    }

    /// Number of calendar days in the overlap.
    pub fn covered_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

fn semester_bounds(year: i32, half: u8) -> Option<(NaiveDate, NaiveDate)> {
    if half == 1 {
        Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 6, 30)?,
        ))
    } else {
        Some((
            NaiveDate::from_ymd_opt(year, 7, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }
}

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Enumerates the sub-periods of `scope` overlapping `[window_start, window_end]`.
///
/// Returns them in calendar order. Empty when the window is inverted.
pub fn sub_periods(scope: Scope, window_start: NaiveDate, window_end: NaiveDate) -> Vec<SubPeriod> {
    if window_start > window_end {
        return Vec::new();
    }
    let clip = |key, bounds: Option<(NaiveDate, NaiveDate)>| {
        bounds.and_then(|(ps, pe)| SubPeriod::clip(key, ps, pe, window_start, window_end))
    };

    let mut periods = Vec::new();
    match scope {
        Scope::Day => {
            let mut date = window_start;
            while date <= window_end {
                periods.extend(clip(PeriodKey::Day(date), Some((date, date))));
                date += Duration::days(1);
            }
        }
        Scope::Month => {
            let (mut year, mut month) = (window_start.year(), window_start.month());
            while (year, month) <= (window_end.year(), window_end.month()) {
                periods.extend(clip(
                    PeriodKey::Month { year, month },
                    month_bounds(year, month),
                ));
                if month == 12 {
                    year += 1;
                    month = 1;
                } else {
                    month += 1;
                }
            }
        }
        Scope::Semester => {
            for year in window_start.year()..=window_end.year() {
                for half in [1u8, 2] {
                    periods.extend(clip(
                        PeriodKey::Semester { year, half },
                        semester_bounds(year, half),
                    ));
                }
            }
        }
        Scope::Year => {
            for year in window_start.year()..=window_end.year() {
                periods.extend(clip(PeriodKey::Year(year), year_bounds(year)));
            }
        }
        Scope::Window => {
            periods.extend(clip(PeriodKey::Window, Some((window_start, window_end))));
        }
    }
    periods
}

/// Outcome of running one rule over its sub-periods.
#[derive(Debug, Clone, Default)]
pub struct ScopedOutcome {
    pub result: RuleResult,
    /// Number of callback invocations.
    pub dispatched: usize,
}

/// Runs `check` once per sub-period of `scope` over the context's window.
///
/// 1. Empty context: vacuously valid, nothing dispatched.
/// 2. Undeterminable bounds: one `WINDOW_UNDETERMINED` Error.
/// 3. Otherwise each overlapping sub-period is passed with its days; a
///    callback error becomes one `RULE_FAILED` Error for that sub-period.
pub fn run_scoped<F>(
    window: &WindowContext,
    scope: Scope,
    rule_name: &str,
    mut check: F,
) -> ScopedOutcome
where
    F: FnMut(&SubPeriod, &[CanonicalDay]) -> Result<Vec<Violation>, RuleError>,
{
    let mut outcome = ScopedOutcome::default();
    if window.is_empty() {
        return outcome;
    }

    let Some((start, end)) = window.bounds() else {
        let err = RuleError::WindowUndetermined {
            start: window.start(),
            end: window.end(),
        };
        warn!("rule {rule_name} for agent {}: {err}", window.agent_id());
        outcome.result.push(window_violation(rule_name, &err));
        return outcome;
    };

    for period in sub_periods(scope, start, end) {
        let days = window.days_between(period.start, period.end);
        debug!(
            "rule {rule_name}: {} {} (full={}, days={})",
            scope.as_str(),
            period.key,
            period.is_full,
            days.len()
        );
        outcome.dispatched += 1;
        match check(&period, days) {
            Ok(violations) => outcome.result.extend(violations),
            Err(err) => {
                warn!(
                    "rule {rule_name} failed on {} for agent {}: {err}",
                    period.key,
                    window.agent_id()
                );
                outcome.result.push(failure_violation(rule_name, &err).with_meta(
                    "period",
                    period.key.to_string(),
                ));
            }
        }
    }
    outcome
}

/// Error violation for an undeterminable window.
pub(crate) fn window_violation(rule_name: &str, err: &RuleError) -> Violation {
    Violation::error(codes::WINDOW_UNDETERMINED, rule_name, err.to_string())
}

/// Error violation for a failed rule invocation.
pub(crate) fn failure_violation(rule_name: &str, err: &RuleError) -> Violation {
    match err {
        RuleError::WindowUndetermined { .. } => window_violation(rule_name, err),
        _ => Violation::error(codes::RULE_FAILED, rule_name, err.to_string()),
    }
}
