//! Rest statistics over a period.
//!
//! Aggregates the rest blocks of a day subset into the indicators used by
//! the regime quota rules.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Rest days | Unique dates typed Rest |
//! | Rest Sundays | Rest days falling on a Sunday |
//! | Histogram | Rest block length → number of blocks |
//! | RPSD | Rest blocks covering Saturday then Sunday |
//! | WERP | Rest blocks covering Sat→Sun or Sun→Mon |
//! | Longest block | Length of the longest rest block |

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{detect_blocks, BlockKind};
use crate::models::{CanonicalDay, DayType};

/// Rest indicators over a day subset.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RestStats {
    /// Unique rest dates.
    pub rest_days: usize,
    /// Rest dates that are Sundays.
    pub rest_sundays: usize,
    /// Rest block length → count.
    pub block_histogram: BTreeMap<usize, usize>,
    /// Blocks containing Saturday immediately followed by Sunday.
    pub rpsd_count: usize,
    /// Blocks containing Sat→Sun or Sun→Mon.
    pub werp_count: usize,
    /// Longest rest block, in days.
    pub longest_block: usize,
}

impl RestStats {
    /// Computes rest indicators from `days`, bounded by `[start, end]`.
    ///
    /// Days outside the bounds are ignored, so a block crossing a bound is
    /// counted only for its inner part.
    pub fn calculate<'a, I>(days: I, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a CanonicalDay>,
    {
        let inside: Vec<&CanonicalDay> = days
            .into_iter()
            .filter(|d| d.date >= start && d.date <= end)
            .collect();

        let rest_dates: BTreeSet<NaiveDate> = inside
            .iter()
            .filter(|d| d.day_type == DayType::Rest)
            .map(|d| d.date)
            .collect();

        let mut stats = RestStats {
            rest_days: rest_dates.len(),
            rest_sundays: rest_dates
                .iter()
                .filter(|d| d.weekday() == Weekday::Sun)
                .count(),
            ..Default::default()
        };

        for block in detect_blocks(BlockKind::Rest, inside, start, end) {
            let len = block.day_count();
            *stats.block_histogram.entry(len).or_insert(0) += 1;
            stats.longest_block = stats.longest_block.max(len);

            let sat_sun = block.contains_pair(Weekday::Sat, Weekday::Sun);
            if sat_sun {
                stats.rpsd_count += 1;
            }
            if sat_sun || block.contains_pair(Weekday::Sun, Weekday::Mon) {
                stats.werp_count += 1;
            }
        }

        stats
    }

    /// Number of rest blocks.
    pub fn block_count(&self) -> usize {
        self.block_histogram.values().sum()
    }

    /// Number of rest blocks of at least `days` days.
    pub fn blocks_at_least(&self, days: usize) -> usize {
        self.block_histogram
            .range(days..)
            .map(|(_, count)| count)
            .sum()
    }
}
