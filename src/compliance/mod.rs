//! Compliance rules and the evaluation engine.
//!
//! Provides the rule catalog (daily rest, duration, amplitude, work periods,
//! double rest, rest/leave quotas, service-day average) and an engine that
//! runs them over one agent's window.
//!
//! # Usage
//!
//! ```
//! use u_roster::compliance::{ComplianceEngine, WindowContext};
//! use u_roster::models::CanonicalDay;
//! use chrono::{NaiveDate, NaiveTime};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let shift = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
//! let days = vec![CanonicalDay::working("A1", date, shift(8), shift(16))];
//! let window = WindowContext::new("A1", days).unwrap();
//!
//! let report = ComplianceEngine::standard().evaluate(&window, None);
//! assert!(report.is_valid());
//! ```
//!
//! # Scopes
//!
//! Each rule declares a [`Scope`]. Day-scoped rules are called once per day
//! by the engine's day loop; the others are run through
//! [`run_scoped`](crate::windowing::run_scoped), once per calendar
//! sub-period overlapping the window.

mod context;
mod engine;
pub mod rules;

pub use context::{RuleContext, WindowContext};
pub use engine::{ComplianceEngine, ComplianceReport};
pub use crate::windowing::Scope;

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::RuleError;
use crate::models::{CanonicalDay, Violation};
use crate::windowing::SubPeriod;

/// Outcome of one rule invocation.
pub type RuleOutcome = Result<Vec<Violation>, RuleError>;

/// What a quota rule does on a sub-period the window only partly covers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PartialPeriodPolicy {
    /// Emit nothing.
    #[default]
    Skip,
    /// Emit one Info summarising the observed values.
    Summarize,
}

/// A compliance rule.
///
/// Rules are pure: they read the context and return violations, never
/// mutate anything. The engine calls [`check_day`](Self::check_day) for
/// [`Scope::Day`] rules and [`check_period`](Self::check_period) for every
/// other scope.
pub trait ComplianceRule: Send + Sync + Debug {
    /// Rule name (e.g. `"daily_rest"`).
    fn name(&self) -> &'static str;

    /// Evaluation granularity.
    fn scope(&self) -> Scope;

    /// Checks one day. Only called for [`Scope::Day`].
    fn check_day(&self, _day: &CanonicalDay, _ctx: &RuleContext<'_>) -> RuleOutcome {
        Ok(Vec::new())
    }

    /// Checks one sub-period with the days falling in it.
    fn check_period(
        &self,
        _period: &SubPeriod,
        _days: &[CanonicalDay],
        _ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        Ok(Vec::new())
    }

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
