//! Violation and rule result models.
//!
//! A [`Violation`] is one graded finding produced by a rule. Once built it
//! cannot be changed: fields are private and only readable through accessors.
//! A [`RuleResult`] collects violations; it is valid iff no violation has
//! [`Severity::Error`]. Warnings and infos never affect validity.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Violation codes emitted by the built-in rules.
pub mod codes {
    pub const DAILY_REST_TOO_SHORT: &str = "DAILY_REST_TOO_SHORT";
    pub const DAILY_DURATION_BELOW_MIN: &str = "DAILY_DURATION_BELOW_MIN";
    pub const DAILY_DURATION_ABOVE_MAX: &str = "DAILY_DURATION_ABOVE_MAX";
    pub const DAILY_AMPLITUDE_EXCEEDED: &str = "DAILY_AMPLITUDE_EXCEEDED";
    pub const GPT_SUMMARY: &str = "GPT_SUMMARY";
    pub const GPT_TOO_SHORT: &str = "GPT_TOO_SHORT";
    pub const GPT_TOO_LONG: &str = "GPT_TOO_LONG";
    pub const GPT_WORKLOAD_EXCEEDED: &str = "GPT_WORKLOAD_EXCEEDED";
    pub const GPT_DOUBLE_REST_REQUIRED: &str = "GPT_DOUBLE_REST_REQUIRED";
    pub const DOUBLE_REST_MISSING: &str = "DOUBLE_REST_MISSING";
    pub const REST_DAYS_BELOW_MIN: &str = "REST_DAYS_BELOW_MIN";
    pub const REST_SUNDAYS_BELOW_MIN: &str = "REST_SUNDAYS_BELOW_MIN";
    pub const WEEKEND_PAIRS_BELOW_MIN: &str = "WEEKEND_PAIRS_BELOW_MIN";
    pub const REST_QUOTA_SUMMARY: &str = "REST_QUOTA_SUMMARY";
    pub const SERVICE_AVERAGE_OUT_OF_RANGE: &str = "SERVICE_AVERAGE_OUT_OF_RANGE";
    pub const SERVICE_AVERAGE_SUMMARY: &str = "SERVICE_AVERAGE_SUMMARY";
    pub const LEAVE_DAYS_BELOW_MIN: &str = "LEAVE_DAYS_BELOW_MIN";
    pub const LEAVE_MAIN_BLOCK_MISSING: &str = "LEAVE_MAIN_BLOCK_MISSING";
    pub const LEAVE_SUMMARY: &str = "LEAVE_SUMMARY";
    pub const WINDOW_UNDETERMINED: &str = "WINDOW_UNDETERMINED";
    pub const RULE_FAILED: &str = "RULE_FAILED";
}

/// Severity of a violation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, no impact on validity.
    Info,
    /// Suspicious but tolerated.
    Warning,
    /// Regulation breached: the roster is invalid.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A graded finding produced by a rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation {
    code: String,
    rule: String,
    severity: Severity,
    message: String,
    dates: Vec<NaiveDate>,
    datetimes: Vec<NaiveDateTime>,
    metadata: BTreeMap<String, Value>,
}

impl Violation {
    /// Creates a violation with no anchors.
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            message: message.into(),
            dates: Vec::new(),
            datetimes: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Creates an Error-severity violation.
    pub fn error(
        code: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, rule, Severity::Error, message)
    }

    /// Creates a Warning-severity violation.
    pub fn warning(
        code: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, rule, Severity::Warning, message)
    }

    /// Creates an Info-severity violation.
    pub fn info(
        code: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, rule, Severity::Info, message)
    }

    /// Adds a date anchor.
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.dates.push(date);
        self
    }

    /// Adds an inclusive date range anchor (first and last dates).
    pub fn on_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.dates.push(start);
        if end != start {
            self.dates.push(end);
        }
        self
    }

    /// Adds a precise datetime anchor.
    pub fn at(mut self, datetime: NaiveDateTime) -> Self {
        self.datetimes.push(datetime);
        self
    }

    /// Adds a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn datetimes(&self) -> &[NaiveDateTime] {
        &self.datetimes
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Metadata value by key.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// First date anchor.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ordered violations produced by one or more rule invocations.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RuleResult {
    violations: Vec<Violation>,
}

impl RuleResult {
    /// Creates an empty (valid) result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing list.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Appends a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Appends many violations.
    pub fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
    }

    /// Appends another result.
    pub fn merge(&mut self, other: RuleResult) {
        self.violations.extend(other.violations);
    }

    /// Valid iff no Error-severity violation exists.
    pub fn is_valid(&self) -> bool {
        !self.violations.iter().any(Violation::is_error)
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    /// Violations with the given code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.code == code)
    }

    /// Error-severity violations.
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }
}

impl FromIterator<Violation> for RuleResult {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}
