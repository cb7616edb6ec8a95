//! Work period (GPT) rules: length, load, and the mandated double rest.

use chrono::Duration;

use super::{ComplianceRule, RuleContext, RuleOutcome, Scope};
use crate::models::{codes, CanonicalDay, DayType, Violation};
use crate::periods::{detect_blocks, BlockKind, PeriodBlock};
use crate::windowing::SubPeriod;

/// Length and load of every work period in the window.
///
/// Emits, in order:
/// 1. one Info synthesis with aggregate counts,
/// 2. per block: Warning when shorter than `gpt_min_days` and not truncated,
///    Error when longer than `gpt_max_days`, Error when worked minutes exceed
///    `gpt_max_minutes`, Info when exactly `gpt_max_days` long (double rest
///    required).
#[derive(Debug, Clone, Copy, Default)]
pub struct GptDuration;

impl GptDuration {
    fn check_block(&self, block: &PeriodBlock<'_>, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let t = ctx.thresholds;
        let len = block.day_count();
        let worked = block.total_worked_minutes();
        let (start, end) = (block.start(), block.end());
        let mut violations = Vec::new();

        if len < t.gpt_min_days && !block.is_truncated() {
            violations.push(
                Violation::warning(
                    codes::GPT_TOO_SHORT,
                    self.name(),
                    format!(
                        "Work period {start} → {end} lasts {len} day(s), below {}",
                        t.gpt_min_days
                    ),
                )
                .on_range(start, end)
                .with_meta("days", len),
            );
        }
        if len > t.gpt_max_days {
            violations.push(
                Violation::error(
                    codes::GPT_TOO_LONG,
                    self.name(),
                    format!(
                        "Work period {start} → {end} lasts {len} days, above {}",
                        t.gpt_max_days
                    ),
                )
                .on_range(start, end)
                .with_meta("days", len)
                .with_meta("max_days", t.gpt_max_days)
                .with_meta("left_truncated", block.left_truncated)
                .with_meta("right_truncated", block.right_truncated),
            );
        }
        if worked > t.gpt_max_minutes {
            violations.push(
                Violation::error(
                    codes::GPT_WORKLOAD_EXCEEDED,
                    self.name(),
                    format!(
                        "Work period {start} → {end} totals {worked} min, above {}",
                        t.gpt_max_minutes
                    ),
                )
                .on_range(start, end)
                .with_meta("worked_minutes", worked)
                .with_meta("max_minutes", t.gpt_max_minutes),
            );
        }
        if len == t.gpt_max_days {
            violations.push(
                Violation::info(
                    codes::GPT_DOUBLE_REST_REQUIRED,
                    self.name(),
                    format!(
                        "Work period {start} → {end} reaches {len} days: {} rest days required after it",
                        t.double_rest_days
                    ),
                )
                .on_range(start, end)
                .with_meta("days", len),
            );
        }
        violations
    }
}

impl ComplianceRule for GptDuration {
    fn name(&self) -> &'static str {
        "gpt_duration"
    }

    fn scope(&self) -> Scope {
        Scope::Window
    }

    fn check_period(
        &self,
        period: &SubPeriod,
        days: &[CanonicalDay],
        ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        let blocks = detect_blocks(BlockKind::Work, days, period.start, period.end);

        let longest = blocks.iter().map(PeriodBlock::day_count).max().unwrap_or(0);
        let truncated = blocks.iter().filter(|b| b.is_truncated()).count();
        let at_max = blocks
            .iter()
            .filter(|b| b.day_count() == ctx.thresholds.gpt_max_days)
            .count();
        let mut violations = vec![Violation::info(
            codes::GPT_SUMMARY,
            self.name(),
            format!(
                "{} work period(s) between {} and {}, longest {} day(s)",
                blocks.len(),
                period.start,
                period.end,
                longest
            ),
        )
        .on_range(period.start, period.end)
        .with_meta("block_count", blocks.len())
        .with_meta("longest_days", longest)
        .with_meta("truncated_count", truncated)
        .with_meta("max_length_count", at_max)
        .with_meta(
            "worked_minutes",
            blocks.iter().map(PeriodBlock::total_worked_minutes).sum::<i64>(),
        )];

        for block in &blocks {
            violations.extend(self.check_block(block, ctx));
        }
        Ok(violations)
    }

    fn description(&self) -> &'static str {
        "Work period length and load"
    }
}

/// Two rest days right after every maximal-length work period.
///
/// Applies to blocks of exactly `gpt_max_days` days that are not
/// left-truncated and leave at least `double_rest_days` window days after
/// them. Each following day must be Rest; a missing day counts as not rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleRest;

impl ComplianceRule for DoubleRest {
    fn name(&self) -> &'static str {
        "double_rest"
    }

    fn scope(&self) -> Scope {
        Scope::Window
    }

    fn check_period(
        &self,
        period: &SubPeriod,
        days: &[CanonicalDay],
        ctx: &RuleContext<'_>,
    ) -> RuleOutcome {
        let t = ctx.thresholds;
        let required = t.double_rest_days;
        let mut violations = Vec::new();

        for block in detect_blocks(BlockKind::Work, days, period.start, period.end) {
            if block.day_count() != t.gpt_max_days || block.left_truncated {
                continue;
            }
            let remaining = (period.end - block.end()).num_days();
            if remaining < required as i64 {
                continue;
            }

            let observed = (1..)
                .map(|offset| block.end() + Duration::days(offset))
                .take_while(|date| *date <= period.end)
                .take_while(|date| {
                    ctx.window
                        .day_at(*date)
                        .is_some_and(|d| d.day_type == DayType::Rest)
                })
                .count();
            if observed >= required {
                continue;
            }

            let first = block.end() + Duration::days(1);
            let last = block.end() + Duration::days(required as i64);
            violations.push(
                Violation::error(
                    codes::DOUBLE_REST_MISSING,
                    self.name(),
                    format!(
                        "Work period {} → {} must be followed by {required} rest days, found {observed}",
                        block.start(),
                        block.end()
                    ),
                )
                .on_range(first, last)
                .with_meta("required_days", required)
                .with_meta("observed_days", observed)
                .with_meta("block_start", block.start().to_string())
                .with_meta("block_end", block.end().to_string()),
            );
        }
        Ok(violations)
    }

    fn description(&self) -> &'static str {
        "Double rest after a maximal work period"
    }
}
