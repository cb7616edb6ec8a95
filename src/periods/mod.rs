//! Period detection over canonical day sequences.
//!
//! Scans a day sequence for maximal runs of consecutive calendar days that
//! satisfy a block predicate:
//!
//! | Kind | Predicate | Extra condition |
//! |------|-----------|-----------------|
//! | [`BlockKind::Work`] (GPT) | Working or ZCOT | none |
//! | [`BlockKind::Rest`] | Rest | none |
//! | [`BlockKind::Leave`] | Leave or Rest | at least one Leave day |
//!
//! # Algorithm
//! Sort by date, then one linear scan keeping an open block. A predicate-true
//! day extends the open block when it is exactly one day after the block's
//! last date, otherwise it closes the block and opens a new one. A
//! predicate-false day closes the open block. O(n log n) for the sort, O(n)
//! for the scan.
//!
//! # Truncation
//! A block is left-truncated iff its first date equals the window start and
//! right-truncated iff its last date equals the window end. The input never
//! contains days outside the window, so equality is the exact test.

mod stats;

pub use stats::RestStats;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{CanonicalDay, DayType};

/// Block family.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Consecutive working days (GPT).
    Work,
    /// Consecutive rest days.
    Rest,
    /// Consecutive leave/rest days containing leave.
    Leave,
}

impl BlockKind {
    /// Whether a day may belong to a block of this kind.
    #[inline]
    pub fn accepts(&self, day_type: DayType) -> bool {
        match self {
            BlockKind::Work => day_type.is_work(),
            BlockKind::Rest => day_type == DayType::Rest,
            BlockKind::Leave => matches!(day_type, DayType::Leave | DayType::Rest),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Work => "work",
            BlockKind::Rest => "rest",
            BlockKind::Leave => "leave",
        }
    }
}

/// A maximal run of consecutive days of one kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodBlock<'a> {
    pub kind: BlockKind,
    /// Days in date order, consecutive.
    pub days: Vec<&'a CanonicalDay>,
    /// First day is the window start.
    pub left_truncated: bool,
    /// Last day is the window end.
    pub right_truncated: bool,
}

impl<'a> PeriodBlock<'a> {
    #[inline]
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// First date. Blocks are never empty.
    pub fn start(&self) -> NaiveDate {
        self.days.first().map(|d| d.date).unwrap_or_default()
    }

    /// Last date.
    pub fn end(&self) -> NaiveDate {
        self.days.last().map(|d| d.date).unwrap_or_default()
    }

    /// Truncated on either side.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.left_truncated || self.right_truncated
    }

    /// Sum of worked minutes over the block.
    pub fn total_worked_minutes(&self) -> i64 {
        self.days.iter().map(|d| d.worked_minutes()).sum()
    }

    /// Days of the given type.
    pub fn count_type(&self, day_type: DayType) -> usize {
        self.days.iter().filter(|d| d.day_type == day_type).count()
    }

    /// Days per weekday, Monday first.
    pub fn weekday_counts(&self) -> [usize; 7] {
        let mut counts = [0usize; 7];
        for day in &self.days {
            counts[day.date.weekday().num_days_from_monday() as usize] += 1;
        }
        counts
    }

    /// Whether the block contains `first` immediately followed by `second`.
    pub fn contains_pair(&self, first: Weekday, second: Weekday) -> bool {
        self.days
            .windows(2)
            .any(|w| w[0].date.weekday() == first && w[1].date.weekday() == second)
    }
}

/// Truncation flags for a block spanning `[first, last]` within `[window_start, window_end]`.
#[inline]
pub fn truncation(
    first: NaiveDate,
    last: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> (bool, bool) {
    (first == window_start, last == window_end)
}

/// Detects maximal blocks of `kind` among `days`.
///
/// `days` need not be sorted; they are sorted by date first. Empty input or
/// input without any matching day yields no blocks.
pub fn detect_blocks<'a, I>(
    kind: BlockKind,
    days: I,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<PeriodBlock<'a>>
where
    I: IntoIterator<Item = &'a CanonicalDay>,
{
    let mut sorted: Vec<&'a CanonicalDay> = days.into_iter().collect();
    sorted.sort_by_key(|d| d.date);

    let mut blocks = Vec::new();
    let mut open: Vec<&'a CanonicalDay> = Vec::new();

    for day in sorted {
        if !kind.accepts(day.day_type) {
            close_block(kind, &mut open, window_start, window_end, &mut blocks);
            continue;
        }
        let contiguous = open
            .last()
            .is_some_and(|last| day.date - last.date == Duration::days(1));
        if !open.is_empty() && !contiguous {
            close_block(kind, &mut open, window_start, window_end, &mut blocks);
        }
        open.push(day);
    }
    close_block(kind, &mut open, window_start, window_end, &mut blocks);

    blocks
}

fn close_block<'a>(
    kind: BlockKind,
    open: &mut Vec<&'a CanonicalDay>,
    window_start: NaiveDate,
    window_end: NaiveDate,
    blocks: &mut Vec<PeriodBlock<'a>>,
) {
    if open.is_empty() {
        return;
    }
    let days = std::mem::take(open);
    if kind == BlockKind::Leave && !days.iter().any(|d| d.day_type == DayType::Leave) {
        return;
    }
    let (left_truncated, right_truncated) = truncation(
        days[0].date,
        days[days.len() - 1].date,
        window_start,
        window_end,
    );
    blocks.push(PeriodBlock {
        kind,
        days,
        left_truncated,
        right_truncated,
    });
}
