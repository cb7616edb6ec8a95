//! Compliance engine: runs a rule catalog over one agent's window.
//!
//! Evaluation is stateless per call:
//! 1. every day of the context, in date order, goes through every
//!    [`Scope::Day`] rule,
//! 2. every other rule is then run once per calendar sub-period of its
//!    scope through [`run_scoped`].
//!
//! A rule failure never stops the catalog. It becomes one Error violation
//! and the remaining rules still run.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::rules::{
    AnnualLeaveQuota, DailyAmplitude, DailyDuration, DailyRest, DoubleRest, GptDuration,
    RestQuotaRule, ServiceAverage,
};
use super::{ComplianceRule, RuleContext, Scope, WindowContext};
use crate::config::RuleThresholds;
use crate::error::Result;
use crate::models::{Regime, RuleResult, Severity, Violation};
use crate::normalize::{Normalizer, RawDay};
use crate::windowing::{failure_violation, run_scoped};

/// Outcome of evaluating one agent.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub agent_id: String,
    /// Resolved window start, if determinable.
    pub window_start: Option<NaiveDate>,
    /// Resolved window end, if determinable.
    pub window_end: Option<NaiveDate>,
    pub result: RuleResult,
    /// Days that went through the day loop.
    pub day_dispatches: usize,
    /// Sub-period invocations across all period rules.
    pub period_dispatches: usize,
}

impl ComplianceReport {
    /// Valid iff no Error-severity violation exists.
    pub fn is_valid(&self) -> bool {
        self.result.is_valid()
    }

    pub fn violations(&self) -> &[Violation] {
        self.result.violations()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.result.count(severity)
    }

    /// Violations grouped by rule name.
    pub fn by_rule(&self) -> BTreeMap<&str, Vec<&Violation>> {
        let mut groups: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for v in self.violations() {
            groups.entry(v.rule()).or_default().push(v);
        }
        groups
    }

    /// Violations grouped by their first date. Undated violations are left out.
    pub fn by_date(&self) -> BTreeMap<NaiveDate, Vec<&Violation>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&Violation>> = BTreeMap::new();
        for v in self.violations() {
            if let Some(date) = v.anchor_date() {
                groups.entry(date).or_default().push(v);
            }
        }
        groups
    }
}

/// A configurable catalog of compliance rules.
///
/// # Example
/// ```
/// use u_roster::compliance::ComplianceEngine;
/// use u_roster::compliance::rules::{DailyRest, GptDuration};
/// use u_roster::config::RuleThresholds;
///
/// let engine = ComplianceEngine::new()
///     .with_thresholds(RuleThresholds::default())
///     .with_rule(DailyRest)
///     .with_rule(GptDuration);
/// assert_eq!(engine.rules().len(), 2);
/// ```
#[derive(Clone)]
pub struct ComplianceEngine {
    rules: Vec<Arc<dyn ComplianceRule>>,
    thresholds: RuleThresholds,
}

impl ComplianceEngine {
    /// Creates an empty engine with default thresholds.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            thresholds: RuleThresholds::default(),
        }
    }

    /// Engine with the full built-in catalog.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(DailyRest)
            .with_rule(DailyDuration)
            .with_rule(DailyAmplitude)
            .with_rule(GptDuration)
            .with_rule(DoubleRest)
            .with_rule(RestQuotaRule::annual())
            .with_rule(RestQuotaRule::semester())
            .with_rule(RestQuotaRule::monthly())
            .with_rule(ServiceAverage::new())
            .with_rule(AnnualLeaveQuota::new())
    }

    /// Replaces the thresholds.
    pub fn with_thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Adds a rule.
    pub fn with_rule<R: ComplianceRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rules(&self) -> &[Arc<dyn ComplianceRule>] {
        &self.rules
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Evaluates every rule over `window`.
    pub fn evaluate(&self, window: &WindowContext, regime: Option<&Regime>) -> ComplianceReport {
        let ctx = RuleContext::new(window, regime, &self.thresholds);
        let (day_rules, period_rules): (Vec<_>, Vec<_>) = self
            .rules
            .iter()
            .partition(|r| r.scope() == Scope::Day);

        let mut result = RuleResult::new();
        let mut day_dispatches = 0;

        for day in window.days() {
            day_dispatches += 1;
            for rule in &day_rules {
                match rule.check_day(day, &ctx) {
                    Ok(violations) => result.extend(violations),
                    Err(err) => {
                        warn!(
                            "rule {} failed on {} for agent {}: {err}",
                            rule.name(),
                            day.date,
                            window.agent_id()
                        );
                        result.push(failure_violation(rule.name(), &err).on_date(day.date));
                    }
                }
            }
        }

        let mut period_dispatches = 0;
        for rule in &period_rules {
            debug!("dispatching {} ({})", rule.name(), rule.scope().as_str());
            let outcome = run_scoped(window, rule.scope(), rule.name(), |period, days| {
                rule.check_period(period, days, &ctx)
            });
            period_dispatches += outcome.dispatched;
            result.merge(outcome.result);
        }

        info!(
            "agent {}: {} day(s), {} error(s), {} warning(s), {} info(s)",
            window.agent_id(),
            window.len(),
            result.count(Severity::Error),
            result.count(Severity::Warning),
            result.count(Severity::Info)
        );

        ComplianceReport {
            agent_id: window.agent_id().to_string(),
            window_start: window.bounds().map(|(start, _)| start),
            window_end: window.bounds().map(|(_, end)| end),
            result,
            day_dispatches,
            period_dispatches,
        }
    }

    /// Canonicalizes raw days, then evaluates.
    ///
    /// Structural errors abort before any rule runs.
    pub fn evaluate_raw(
        &self,
        agent_id: &str,
        raw: &[RawDay],
        bounds: Option<(NaiveDate, NaiveDate)>,
        regime: Option<&Regime>,
    ) -> Result<ComplianceReport> {
        let days = Normalizer::new(&self.thresholds).canonicalize_all(raw)?;
        let mut window = WindowContext::new(agent_id, days)?;
        if let Some((start, end)) = bounds {
            window = window.with_bounds(start, end);
        }
        Ok(self.evaluate(&window, regime))
    }

    /// Evaluates many agents. Reports keep the input order.
    pub fn evaluate_batch(
        &self,
        agents: &[(WindowContext, Option<Regime>)],
    ) -> Vec<ComplianceReport> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            agents
                .par_iter()
                .map(|(window, regime)| self.evaluate(window, regime.as_ref()))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            agents
                .iter()
                .map(|(window, regime)| self.evaluate(window, regime.as_ref()))
                .collect()
        }
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::RuleOutcome;
    use crate::error::RuleError;
    use crate::models::{codes, CanonicalDay};
    use crate::windowing::SubPeriod;
    use chrono::{Datelike, Duration, NaiveTime};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn span(start: NaiveDate, end: NaiveDate) -> Vec<CanonicalDay> {
        start
            .iter_days()
            .take_while(|x| *x <= end)
            .map(|x| CanonicalDay::rest("A1", x))
            .collect()
    }

    #[derive(Debug, Default)]
    struct CountingDayRule {
        calls: Arc<AtomicUsize>,
    }

    impl ComplianceRule for CountingDayRule {
        fn name(&self) -> &'static str {
            "counting_day"
        }
        fn scope(&self) -> Scope {
            Scope::Day
        }
        fn check_day(&self, _day: &CanonicalDay, _ctx: &RuleContext<'_>) -> RuleOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[derive(Debug)]
    struct RecordingYearRule {
        seen: Arc<Mutex<Vec<SubPeriod>>>,
    }

    impl ComplianceRule for RecordingYearRule {
        fn name(&self) -> &'static str {
            "recording_year"
        }
        fn scope(&self) -> Scope {
            Scope::Year
        }
        fn check_period(
            &self,
            period: &SubPeriod,
            _days: &[CanonicalDay],
            _ctx: &RuleContext<'_>,
        ) -> RuleOutcome {
            self.seen.lock().unwrap().push(*period);
            Ok(Vec::new())
        }
    }

    #[derive(Debug)]
    struct FailingRule(Scope);

    impl ComplianceRule for FailingRule {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn scope(&self) -> Scope {
            self.0
        }
        fn check_day(&self, _day: &CanonicalDay, _ctx: &RuleContext<'_>) -> RuleOutcome {
            Err(RuleError::Internal("boom".into()))
        }
        fn check_period(
            &self,
            _period: &SubPeriod,
            _days: &[CanonicalDay],
            _ctx: &RuleContext<'_>,
        ) -> RuleOutcome {
            Err(RuleError::MissingData("no regime".into()))
        }
    }

    #[test]
    fn test_day_dispatch_count() {
        let calls = Arc::new(AtomicUsize::new(0));
        let days = span(d(2024, 1, 1), d(2024, 1, 20));
        let window = WindowContext::new("A1", days).unwrap();
        let engine = ComplianceEngine::new().with_rule(CountingDayRule {
            calls: calls.clone(),
        });
        let report = engine.evaluate(&window, None);
        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert_eq!(report.day_dispatches, 20);
        assert_eq!(report.period_dispatches, 0);
    }

    #[test]
    fn test_year_dispatch_full_year() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = ComplianceEngine::new().with_rule(RecordingYearRule { seen: seen.clone() });
        let window = WindowContext::new("A1", span(d(2024, 1, 1), d(2024, 12, 31))).unwrap();
        let report = engine.evaluate(&window, None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_full);
        assert_eq!(report.period_dispatches, 1);
    }

    #[test]
    fn test_year_dispatch_straddling() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = ComplianceEngine::new().with_rule(RecordingYearRule { seen: seen.clone() });
        let window = WindowContext::new("A1", span(d(2024, 6, 1), d(2025, 5, 31))).unwrap();
        engine.evaluate(&window, None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|p| !p.is_full));
        assert_eq!(seen[0].period_start.year(), 2024);
        assert_eq!(seen[1].period_start.year(), 2025);
    }

    #[test]
    fn test_failures_isolated() {
        let days = vec![
            CanonicalDay::working("A1", d(2024, 1, 1), t(8), t(16)),
            CanonicalDay::working("A1", d(2024, 1, 2), t(8), t(10)),
        ];
        let window = WindowContext::new("A1", days).unwrap();
        let engine = ComplianceEngine::new()
            .with_rule(FailingRule(Scope::Day))
            .with_rule(FailingRule(Scope::Month))
            .with_rule(DailyDuration);
        let report = engine.evaluate(&window, None);

        assert!(!report.is_valid());
        assert_eq!(report.result.with_code(codes::RULE_FAILED).count(), 3);
        // The sibling rule still ran.
        assert_eq!(
            report.result.with_code(codes::DAILY_DURATION_BELOW_MIN).count(),
            1
        );
    }

    #[test]
    fn test_undetermined_window_reported_per_period_rule() {
        let window = WindowContext::new("A1", span(d(2024, 1, 1), d(2024, 1, 5)))
            .unwrap()
            .with_bounds(d(2024, 1, 5), d(2024, 1, 1));
        let report = ComplianceEngine::standard().evaluate(&window, None);

        let period_rules = ComplianceEngine::standard()
            .rules()
            .iter()
            .filter(|r| r.scope() != Scope::Day)
            .count();
        assert_eq!(
            report.result.with_code(codes::WINDOW_UNDETERMINED).count(),
            period_rules
        );
        assert!(report.window_start.is_none());
        assert_eq!(report.day_dispatches, 5);
    }

    #[test]
    fn test_empty_window_valid() {
        let window = WindowContext::new("A1", Vec::new()).unwrap();
        let report = ComplianceEngine::standard().evaluate(&window, None);
        assert!(report.is_valid());
        assert!(report.violations().is_empty());
    }

    #[test]
    fn test_report_grouping() {
        let days = vec![
            CanonicalDay::working("A1", d(2024, 3, 1), t(8), t(12)),
            CanonicalDay::working("A1", d(2024, 3, 2), t(8), t(12)),
        ];
        let window = WindowContext::new("A1", days).unwrap();
        let report = ComplianceEngine::new()
            .with_rule(DailyDuration)
            .with_rule(GptDuration)
            .evaluate(&window, None);

        let by_rule = report.by_rule();
        assert_eq!(by_rule["daily_duration"].len(), 2);
        assert_eq!(by_rule["gpt_duration"].len(), 1);

        let by_date = report.by_date();
        assert_eq!(by_date[&d(2024, 3, 2)].len(), 1);
        assert_eq!(by_date[&d(2024, 3, 1)].len(), 2);
    }

    #[test]
    fn test_evaluate_raw_structural_failure() {
        let raw = vec![RawDay::new("A1", d(2024, 1, 1), "XYZ")];
        let err = ComplianceEngine::standard()
            .evaluate_raw("A1", &raw, None, None)
            .unwrap_err();
        assert_eq!(err.structural_errors().len(), 1);
    }

    #[test]
    fn test_evaluate_batch_keeps_order() {
        let a = WindowContext::new("A1", span(d(2024, 1, 1), d(2024, 1, 3))).unwrap();
        let b = WindowContext::new(
            "B2",
            vec![CanonicalDay::rest("B2", d(2024, 1, 1) + Duration::days(3))],
        )
        .unwrap();
        let reports = ComplianceEngine::standard().evaluate_batch(&[(a, None), (b, None)]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].agent_id, "A1");
        assert_eq!(reports[1].agent_id, "B2");
    }

    #[test]
    fn test_standard_catalog() {
        let engine = ComplianceEngine::standard();
        let names: Vec<_> = engine.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), 10);
        assert!(names.contains(&"daily_rest"));
        assert!(names.contains(&"rest_quota_monthly"));
        assert!(format!("{engine:?}").contains("annual_leave"));
    }
}
