//! Calendar quota rules: rest quotas, service-day average, annual leave.
//!
//! All of them enforce hard limits only on sub-periods the window covers
//! entirely. On partial sub-periods each rule follows its
//! [`PartialPeriodPolicy`].
//!
//! | Rule | Scope | Thresholds |
//! |------|-------|-----------|
//! | `rest_quota_annual` | Year | annual rest days, rest Sundays, WERP pairs |
//! | `rest_quota_semester` | Semester | semester rest days |
//! | `rest_quota_monthly` | Month | monthly rest days |
//! | `service_average` | Semester | target ± tolerance |
//! | `annual_leave` | Year | leave days, main leave block |

use serde::{Deserialize, Serialize};

use super::{ComplianceRule, PartialPeriodPolicy, RuleContext, RuleOutcome, Scope};
use crate::models::{codes, CanonicalDay, DayType, EffectiveRegime, Violation};
use crate::periods::{detect_blocks, BlockKind, PeriodBlock, RestStats};
use crate::windowing::SubPeriod;

/// Calendar granularity of a rest quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    Annual,
    Semester,
    Monthly,
}

impl QuotaKind {
    fn scope(&self) -> Scope {
        match self {
            QuotaKind::Annual => Scope::Year,
            QuotaKind::Semester => Scope::Semester,
            QuotaKind::Monthly => Scope::Month,
        }
    }
}

/// Minimum rest over a calendar period.
///
/// Thresholds come from the agent's regime, falling back to system defaults
/// per field. The generic variant ignores the regime entirely.
#[derive(Debug, Clone, Copy)]
pub struct RestQuotaRule {
    kind: QuotaKind,
    policy: PartialPeriodPolicy,
    use_regime: bool,
}

impl RestQuotaRule {
    fn regime_specific(kind: QuotaKind) -> Self {
        Self {
            kind,
            policy: PartialPeriodPolicy::Skip,
            use_regime: true,
        }
    }

    /// Yearly rest days, rest Sundays and weekend pairs.
    pub fn annual() -> Self {
        Self::regime_specific(QuotaKind::Annual)
    }

    /// Rest days per half-year.
    pub fn semester() -> Self {
        Self::regime_specific(QuotaKind::Semester)
    }

    /// Rest days per month.
    pub fn monthly() -> Self {
        Self::regime_specific(QuotaKind::Monthly)
    }

    /// Yearly quota against system defaults, summarising partial years.
    pub fn generic_annual() -> Self {
        Self {
            kind: QuotaKind::Annual,
            policy: PartialPeriodPolicy::Summarize,
            use_regime: false,
        }
    }

    pub fn with_partial_policy(mut self, policy: PartialPeriodPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn kind(&self) -> QuotaKind {
        self.kind
    }

    pub fn partial_policy(&self) -> PartialPeriodPolicy {
        self.policy
    }

    fn limits(&self, ctx: &RuleContext<'_>) -> EffectiveRegime {
        if self.use_regime {
            ctx.effective
        } else {
            EffectiveRegime::default()
        }
    }

    fn summary(&self, period: &SubPeriod, stats: &RestStats) -> Violation {
        Violation::info(
            codes::REST_QUOTA_SUMMARY,
            self.name(),
            format!(
                "Partial period {}: {} rest day(s), {} rest Sunday(s), {} weekend pair(s) observed",
                period.key, stats.rest_days, stats.rest_sundays, stats.werp_count
            ),
        )
        .on_range(period.start, period.end)
        .with_meta("period", period.key.to_string())
        .with_meta("rest_days", stats.rest_days)
        .with_meta("rest_sundays", stats.rest_sundays)
        .with_meta("werp_count", stats.werp_count)
        .with_meta("rpsd_count", stats.rpsd_count)
        .with_meta("covered_days", period.covered_days())
    }

    fn below(
        &self,
        code: &str,
        what: &str,
        period: &SubPeriod,
        observed: usize,
        required: u32,
    ) -> Option<Violation> {
        if observed >= required as usize {
            return None;
        }
        Some(
            Violation::error(
                code,
                self.name(),
                format!("{}: {observed} {what}, below the required {required}", period.key),
            )
            .on_range(period.start, period.end)
            .with_meta("period", period.key.to_string())
            .with_meta("observed", observed)
            .with_meta("required", required),
        )
    }
}

impl ComplianceRule for RestQuotaRule {
    fn name(&self) -> &'static str {
        match (self.kind, self.use_regime) {
            (QuotaKind::Annual, true) => "rest_quota_annual",
            (QuotaKind::Annual, false) => "rest_quota_generic",
            (QuotaKind::Semester, _) => "rest_quota_semester",
            (QuotaKind::Monthly, _) => "rest_quota_monthly",
        }
    }

    fn scope(&self) -> Scope {
        self.kind.scope()
    }

    fn check_period(
        &self,
        period: &SubPeriod,
        days: &[CanonicalDay],
        ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        let stats = RestStats::calculate(days, period.start, period.end);
        if !period.is_full {
            return Ok(match self.policy {
                PartialPeriodPolicy::Skip => Vec::new(),
                PartialPeriodPolicy::Summarize => vec![self.summary(period, &stats)],
            });
        }

        let limits = self.limits(ctx);
        let violations = match self.kind {
            QuotaKind::Annual => vec![
                self.below(
                    codes::REST_DAYS_BELOW_MIN,
                    "rest day(s)",
                    period,
                    stats.rest_days,
                    limits.min_annual_rest_days,
                ),
                self.below(
                    codes::REST_SUNDAYS_BELOW_MIN,
                    "rest Sunday(s)",
                    period,
                    stats.rest_sundays,
                    limits.min_rest_sundays,
                ),
                self.below(
                    codes::WEEKEND_PAIRS_BELOW_MIN,
                    "weekend rest pair(s)",
                    period,
                    stats.werp_count,
                    limits.min_weekend_rest_pairs,
                ),
            ],
            QuotaKind::Semester => vec![self.below(
                codes::REST_DAYS_BELOW_MIN,
                "rest day(s)",
                period,
                stats.rest_days,
                limits.min_semester_rest_days,
            )],
            QuotaKind::Monthly => vec![self.below(
                codes::REST_DAYS_BELOW_MIN,
                "rest day(s)",
                period,
                stats.rest_days,
                limits.min_monthly_rest_days,
            )],
        };
        Ok(violations.into_iter().flatten().collect())
    }

    fn description(&self) -> &'static str {
        match self.kind {
            QuotaKind::Annual => "Minimum rest per calendar year",
            QuotaKind::Semester => "Minimum rest per half-year",
            QuotaKind::Monthly => "Minimum rest per month",
        }
    }
}

/// Mean worked minutes per service day over a full semester.
///
/// Only agents with a regime are checked. Service days are work days with
/// a positive worked duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceAverage {
    policy: PartialPeriodPolicy,
}

impl ServiceAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partial_policy(mut self, policy: PartialPeriodPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn service_average(days: &[CanonicalDay]) -> Option<(usize, f64)> {
    let worked: Vec<i64> = days
        .iter()
        .filter(|d| d.is_work())
        .map(CanonicalDay::worked_minutes)
        .filter(|&m| m > 0)
        .collect();
    if worked.is_empty() {
        return None;
    }
    let mean = worked.iter().sum::<i64>() as f64 / worked.len() as f64;
    Some((worked.len(), mean))
}

impl ComplianceRule for ServiceAverage {
    fn name(&self) -> &'static str {
        "service_average"
    }

    fn scope(&self) -> Scope {
        Scope::Semester
    }

    fn check_period(
        &self,
        period: &SubPeriod,
        days: &[CanonicalDay],
        ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        if !ctx.has_regime() {
            return Ok(Vec::new());
        }
        let Some((service_days, mean)) = service_average(days) else {
            return Ok(Vec::new());
        };

        if !period.is_full {
            if self.policy == PartialPeriodPolicy::Skip {
                return Ok(Vec::new());
            }
            return Ok(vec![Violation::info(
                codes::SERVICE_AVERAGE_SUMMARY,
                self.name(),
                format!(
                    "Partial semester {}: average {mean:.0} min over {service_days} service day(s)",
                    period.key
                ),
            )
            .on_range(period.start, period.end)
            .with_meta("period", period.key.to_string())
            .with_meta("average_minutes", mean)
            .with_meta("service_days", service_days)]);
        }

        let target = ctx.effective.target_service_minutes as f64;
        let tolerance = ctx.effective.service_tolerance_minutes as f64;
        let (low, high) = (target - tolerance, target + tolerance);
        if mean >= low && mean <= high {
            return Ok(Vec::new());
        }

        Ok(vec![Violation::error(
            codes::SERVICE_AVERAGE_OUT_OF_RANGE,
            self.name(),
            format!(
                "Semester {}: average service day {mean:.0} min outside {low:.0}–{high:.0}",
                period.key
            ),
        )
        .on_range(period.start, period.end)
        .with_meta("period", period.key.to_string())
        .with_meta("average_minutes", mean)
        .with_meta("service_days", service_days)
        .with_meta("target_minutes", ctx.effective.target_service_minutes)
        .with_meta("tolerance_minutes", ctx.effective.service_tolerance_minutes)])
    }

    fn description(&self) -> &'static str {
        "Average service-day duration per semester"
    }
}

/// Annual leave: total leave days and one main leave block.
///
/// A full year needs `annual_leave_min_days` Leave days and at least one
/// leave block of `main_leave_block_min_days` days. Rest days inside a leave
/// block count toward its length.
#[derive(Debug, Clone, Copy)]
pub struct AnnualLeaveQuota {
    policy: PartialPeriodPolicy,
}

impl Default for AnnualLeaveQuota {
    fn default() -> Self {
        Self {
            policy: PartialPeriodPolicy::Summarize,
        }
    }
}

impl AnnualLeaveQuota {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partial_policy(mut self, policy: PartialPeriodPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl ComplianceRule for AnnualLeaveQuota {
    fn name(&self) -> &'static str {
        "annual_leave"
    }

    fn scope(&self) -> Scope {
        Scope::Year
    }

    fn check_period(
        &self,
        period: &SubPeriod,
        days: &[CanonicalDay],
        ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        let t = ctx.thresholds;
        let leave_days = days.iter().filter(|d| d.day_type == DayType::Leave).count();
        let blocks = detect_blocks(BlockKind::Leave, days, period.start, period.end);
        let longest = blocks.iter().map(PeriodBlock::day_count).max().unwrap_or(0);

        if !period.is_full {
            if self.policy == PartialPeriodPolicy::Skip {
                return Ok(Vec::new());
            }
            return Ok(vec![Violation::info(
                codes::LEAVE_SUMMARY,
                self.name(),
                format!(
                    "Partial year {}: {leave_days} leave day(s), longest leave block {longest} day(s)",
                    period.key
                ),
            )
            .on_range(period.start, period.end)
            .with_meta("period", period.key.to_string())
            .with_meta("leave_days", leave_days)
            .with_meta("leave_blocks", blocks.len())
            .with_meta("longest_block", longest)]);
        }

        let mut violations = Vec::new();
        if leave_days < t.annual_leave_min_days {
            violations.push(
                Violation::error(
                    codes::LEAVE_DAYS_BELOW_MIN,
                    self.name(),
                    format!(
                        "{}: {leave_days} leave day(s), below the required {}",
                        period.key, t.annual_leave_min_days
                    ),
                )
                .on_range(period.start, period.end)
                .with_meta("period", period.key.to_string())
                .with_meta("observed", leave_days)
                .with_meta("required", t.annual_leave_min_days),
            );
        }
        if longest < t.main_leave_block_min_days {
            violations.push(
                Violation::error(
                    codes::LEAVE_MAIN_BLOCK_MISSING,
                    self.name(),
                    format!(
                        "{}: no leave block of {} days (longest {longest})",
                        period.key, t.main_leave_block_min_days
                    ),
                )
                .on_range(period.start, period.end)
                .with_meta("period", period.key.to_string())
                .with_meta("longest_block", longest)
                .with_meta("required", t.main_leave_block_min_days),
            );
        }
        Ok(violations)
    }

    fn description(&self) -> &'static str {
        "Annual leave days and main leave block"
    }
}
