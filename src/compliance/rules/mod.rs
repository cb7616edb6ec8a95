//! Built-in compliance rules.
//!
//! # Catalog
//!
//! | Rule | Scope | Checks |
//! |------|-------|--------|
//! | [`DailyRest`] | Day | Gap since the previous working day (740 / 840 min) |
//! | [`DailyDuration`] | Day | Worked minutes within 330–600 (510 at night) |
//! | [`DailyAmplitude`] | Day | First start to last end ≤ 660 min |
//! | [`GptDuration`] | Window | Work period length 3–6 days, ≤ 2880 min |
//! | [`DoubleRest`] | Window | Two rest days after a 6-day work period |
//! | [`RestQuotaRule`] | Year / Semester / Month | Regime rest quotas |
//! | [`ServiceAverage`] | Semester | Mean service day within target ± tolerance |
//! | [`AnnualLeaveQuota`] | Year | 28 leave days with a 15-day main block |
//!
//! Numeric limits are read from [`RuleThresholds`](crate::config::RuleThresholds)
//! and the agent's [`Regime`](crate::models::Regime); the values above are
//! the defaults.
//!
//! # References
//! - Décret n° 99-1161 du 29 décembre 1999, durée du travail des agents SNCF
//! - RH0077, réglementation du travail

mod daily;
mod gpt;
mod quotas;

pub use daily::{DailyAmplitude, DailyDuration, DailyRest};
pub use gpt::{DoubleRest, GptDuration};
pub use quotas::{AnnualLeaveQuota, QuotaKind, RestQuotaRule, ServiceAverage};

use super::{ComplianceRule, PartialPeriodPolicy, RuleContext, RuleOutcome, Scope};
