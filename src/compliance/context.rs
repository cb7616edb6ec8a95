//! Evaluation context for compliance rules.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::config::RuleThresholds;
use crate::error::{Error, Result};
use crate::models::{CanonicalDay, EffectiveRegime, Regime};
use crate::periods::{detect_blocks, BlockKind, PeriodBlock};
use crate::validation::validate_days;

/// One agent's day sequence over an evaluation window.
///
/// Days are sorted by date and unique per date. Bounds default to the first
/// and last day when not set explicitly. The context is read-only once built.
#[derive(Debug, Clone)]
pub struct WindowContext {
    agent_id: String,
    days: Vec<CanonicalDay>,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
    index: HashMap<NaiveDate, usize>,
}

impl WindowContext {
    /// Builds a context, validating the sequence.
    ///
    /// Fails with structural errors on foreign-agent days, duplicate dates,
    /// or malformed intervals.
    pub fn new(agent_id: impl Into<String>, mut days: Vec<CanonicalDay>) -> Result<Self> {
        let agent_id = agent_id.into();
        validate_days(&agent_id, &days).map_err(Error::from)?;
        days.sort_by_key(|d| d.date);
        let index = days
            .iter()
            .enumerate()
            .map(|(i, d)| (d.date, i))
            .collect();
        Ok(Self {
            agent_id,
            days,
            explicit_start: None,
            explicit_end: None,
            index,
        })
    }

    /// Sets both explicit bounds.
    pub fn with_bounds(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.explicit_start = Some(start);
        self.explicit_end = Some(end);
        self
    }

    /// Sets the explicit window start.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.explicit_start = Some(start);
        self
    }

    /// Sets the explicit window end.
    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.explicit_end = Some(end);
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Days in date order.
    pub fn days(&self) -> &[CanonicalDay] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Window start: explicit, else the first day.
    pub fn start(&self) -> Option<NaiveDate> {
        self.explicit_start
            .or_else(|| self.days.first().map(|d| d.date))
    }

    /// Window end: explicit, else the last day.
    pub fn end(&self) -> Option<NaiveDate> {
        self.explicit_end.or_else(|| self.days.last().map(|d| d.date))
    }

    /// Both bounds, or `None` when undeterminable (missing or inverted).
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    /// Day on `date`, if present.
    pub fn day_at(&self, date: NaiveDate) -> Option<&CanonicalDay> {
        self.index.get(&date).map(|&i| &self.days[i])
    }

    /// Position of the day on `date` in [`days`](Self::days).
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.get(&date).copied()
    }

    /// Nearest earlier work day carrying intervals.
    ///
    /// Rest, leave and absence days in between are skipped.
    pub fn previous_timed_work_day(&self, date: NaiveDate) -> Option<&CanonicalDay> {
        let end = match self.position(date) {
            Some(pos) => pos,
            None => self.days.partition_point(|d| d.date < date),
        };
        self.days[..end]
            .iter()
            .rev()
            .find(|d| d.is_work() && d.has_intervals())
    }

    /// Days whose date falls in `[start, end]`.
    pub fn days_between(&self, start: NaiveDate, end: NaiveDate) -> &[CanonicalDay] {
        let lo = self.days.partition_point(|d| d.date < start);
        let hi = self.days.partition_point(|d| d.date <= end);
        if lo >= hi {
            &[]
        } else {
            &self.days[lo..hi]
        }
    }

    /// Blocks of `kind` over the whole window.
    ///
    /// Empty when the window is undeterminable.
    pub fn blocks(&self, kind: BlockKind) -> Vec<PeriodBlock<'_>> {
        match self.bounds() {
            Some((start, end)) => detect_blocks(kind, self.days_between(start, end), start, end),
            None => Vec::new(),
        }
    }
}

/// Everything a rule may read during one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub window: &'a WindowContext,
    /// The agent's regime, if any.
    pub regime: Option<&'a Regime>,
    /// Regime thresholds resolved against system defaults.
    pub effective: EffectiveRegime,
    pub thresholds: &'a RuleThresholds,
}

impl<'a> RuleContext<'a> {
    /// Creates a rule context, resolving the regime.
    pub fn new(
        window: &'a WindowContext,
        regime: Option<&'a Regime>,
        thresholds: &'a RuleThresholds,
    ) -> Self {
        Self {
            window,
            regime,
            effective: Regime::resolve(regime),
            thresholds,
        }
    }

    /// Whether the agent has an explicit regime.
    #[inline]
    pub fn has_regime(&self) -> bool {
        self.regime.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use chrono::NaiveTime;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn sample() -> WindowContext {
        WindowContext::new(
            "A1",
            vec![
                CanonicalDay::rest("A1", d(3)),
                CanonicalDay::working("A1", d(1), t(8), t(16)),
                CanonicalDay::working("A1", d(2), t(8), t(16)),
                CanonicalDay::leave("A1", d(4)),
                CanonicalDay::working("A1", d(5), t(8), t(16)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sorted_and_indexed() {
        let ctx = sample();
        assert_eq!(ctx.days()[0].date, d(1));
        assert_eq!(ctx.position(d(3)), Some(2));
        assert!(ctx.day_at(d(9)).is_none());
        assert_eq!(ctx.len(), 5);
    }

    #[test]
    fn test_derived_bounds() {
        let ctx = sample();
        assert_eq!(ctx.bounds(), Some((d(1), d(5))));
    }

    #[test]
    fn test_explicit_bounds() {
        let ctx = sample().with_bounds(d(1), d(31));
        assert_eq!(ctx.end(), Some(d(31)));
        let partial = sample().with_start(d(2));
        assert_eq!(partial.bounds(), Some((d(2), d(5))));
    }

    #[test]
    fn test_inverted_bounds_undetermined() {
        let ctx = sample().with_bounds(d(10), d(1));
        assert!(ctx.bounds().is_none());
        assert!(ctx.blocks(BlockKind::Work).is_empty());
    }

    #[test]
    fn test_empty_context() {
        let ctx = WindowContext::new("A1", Vec::new()).unwrap();
        assert!(ctx.is_empty());
        assert!(ctx.bounds().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = WindowContext::new(
            "A1",
            vec![CanonicalDay::rest("A1", d(1)), CanonicalDay::rest("A1", d(1))],
        )
        .unwrap_err();
        assert!(matches!(
            err.structural_errors()[0],
            StructuralError::DuplicateDay { .. }
        ));
    }

    #[test]
    fn test_previous_timed_work_day_skips_rest_and_leave() {
        let ctx = sample();
        let prev = ctx.previous_timed_work_day(d(5)).unwrap();
        assert_eq!(prev.date, d(2));
        assert!(ctx.previous_timed_work_day(d(1)).is_none());
    }

    #[test]
    fn test_days_between() {
        let ctx = sample();
        assert_eq!(ctx.days_between(d(2), d(4)).len(), 3);
        assert!(ctx.days_between(d(6), d(9)).is_empty());
    }

    #[test]
    fn test_blocks() {
        let ctx = sample();
        let work = ctx.blocks(BlockKind::Work);
        assert_eq!(work.len(), 2);
        assert!(work[0].left_truncated);
        assert!(work[1].right_truncated);
        assert_eq!(ctx.blocks(BlockKind::Leave).len(), 1);
    }

    #[test]
    fn test_rule_context_resolves_defaults() {
        let ctx = sample();
        let thresholds = RuleThresholds::default();
        let rc = RuleContext::new(&ctx, None, &thresholds);
        assert!(!rc.has_regime());
        assert_eq!(rc.effective, EffectiveRegime::default());
    }
}
