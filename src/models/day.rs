//! Canonical day and time interval models.
//!
//! A [`CanonicalDay`] is the engine's source-independent view of one
//! agent-day: a day type plus the worked intervals of that day.
//!
//! # Time Model
//! Intervals are half-open `[start, end)` in local wall-clock time
//! ([`NaiveDateTime`]). An interval belongs to the day it starts on; its end
//! may roll past midnight onto the next calendar date.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Canonical day type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayType {
    /// Shift-based working day.
    Working,
    /// Fixed-duration presence day without intervals.
    Zcot,
    /// Periodic rest day.
    Rest,
    /// Paid leave.
    Leave,
    /// Absence (sickness, training away, ...).
    Absent,
    /// Explicitly unknown state.
    Unknown,
}

impl DayType {
    /// Whether the day counts toward a work period (GPT).
    #[inline]
    pub fn is_work(&self) -> bool {
        matches!(self, DayType::Working | DayType::Zcot)
    }

    /// Short label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Working => "working",
            DayType::Zcot => "zcot",
            DayType::Rest => "rest",
            DayType::Leave => "leave",
            DayType::Absent => "absent",
            DayType::Unknown => "unknown",
        }
    }
}

/// A worked interval `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
}

impl TimeInterval {
    /// Creates an interval, or `None` when `end` is not after `start`.
    pub fn try_new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Builds an interval from wall-clock times on `date`.
    ///
    /// When `end <= start` the end rolls over to the next day, so
    /// `22:00 → 06:00` is an eight-hour night shift.
    pub fn on_day(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        let start_dt = date.and_time(start);
        let mut end_dt = date.and_time(end);
        if end_dt <= start_dt {
            end_dt += Duration::days(1);
        }
        Self {
            start: start_dt,
            end: end_dt,
        }
    }

    /// Duration in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether a timestamp falls within this interval.
    #[inline]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two intervals overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Minutes shared with another interval (0 when disjoint).
    pub fn overlap_minutes(&self, other: &Self) -> i64 {
        overlap_duration(self, other).unwrap_or(0)
    }
}

/// Computes overlap duration between two intervals, in minutes.
fn overlap_duration(a: &TimeInterval, b: &TimeInterval) -> Option<i64> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if end > start {
        Some((end - start).num_minutes())
    } else {
        None
    }
}

/// Daily night window, e.g. 21:30 → 06:30.
///
/// The window opens on one calendar day and closes on the next.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NightWindow {
    /// Opening wall-clock time.
    pub start: NaiveTime,
    /// Closing wall-clock time (next day when `<= start`).
    pub end: NaiveTime,
}

impl NightWindow {
    /// Creates a night window.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// The night window opening on `date`.
    pub fn opening_on(&self, date: NaiveDate) -> TimeInterval {
        TimeInterval::on_day(date, self.start, self.end)
    }

    /// Whether an interval intersects any occurrence of the window.
    pub fn intersects(&self, interval: &TimeInterval) -> bool {
        // The window opening the day before can still be open at the interval start.
        let mut date = interval.start.date() - Duration::days(1);
        let last = interval.end.date();
        while date <= last {
            if self.opening_on(date).overlaps(interval) {
                return true;
            }
            date += Duration::days(1);
        }
        false
    }
}

/// One agent-day in canonical form.
///
/// Intervals are kept sorted by start and never overlap
/// (enforced by [`canonicalize`](crate::normalize::canonicalize)).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalDay {
    /// Agent identifier.
    pub agent_id: String,
    /// Calendar date.
    pub date: NaiveDate,
    /// Canonical day type.
    pub day_type: DayType,
    /// Worked intervals, sorted by start. May be empty.
    pub intervals: Vec<TimeInterval>,
    /// Fixed worked minutes for interval-less working days.
    pub forfait_minutes: Option<i64>,
}

impl CanonicalDay {
    /// Creates a day without intervals.
    pub fn new(agent_id: impl Into<String>, date: NaiveDate, day_type: DayType) -> Self {
        Self {
            agent_id: agent_id.into(),
            date,
            day_type,
            intervals: Vec::new(),
            forfait_minutes: None,
        }
    }

    /// Shorthand for a working day with one shift.
    pub fn working(
        agent_id: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self::new(agent_id, date, DayType::Working).with_shift(start, end)
    }

    /// Shorthand for a rest day.
    pub fn rest(agent_id: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(agent_id, date, DayType::Rest)
    }

    /// Shorthand for a leave day.
    pub fn leave(agent_id: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(agent_id, date, DayType::Leave)
    }

    /// Adds a shift from wall-clock times (midnight rollover applied).
    pub fn with_shift(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.intervals
            .push(TimeInterval::on_day(self.date, start, end));
        self.intervals.sort_by_key(|i| i.start);
        self
    }

    /// Adds an explicit interval.
    pub fn with_interval(mut self, interval: TimeInterval) -> Self {
        self.intervals.push(interval);
        self.intervals.sort_by_key(|i| i.start);
        self
    }

    /// Sets the fixed forfait minutes.
    pub fn with_forfait(mut self, minutes: i64) -> Self {
        self.forfait_minutes = Some(minutes);
        self
    }

    /// Whether the day counts toward a work period.
    #[inline]
    pub fn is_work(&self) -> bool {
        self.day_type.is_work()
    }

    /// Whether the day carries timed intervals.
    #[inline]
    pub fn has_intervals(&self) -> bool {
        !self.intervals.is_empty()
    }

    /// Start of the first interval.
    pub fn first_start(&self) -> Option<NaiveDateTime> {
        self.intervals.first().map(|i| i.start)
    }

    /// End of the last-ending interval.
    pub fn last_end(&self) -> Option<NaiveDateTime> {
        self.intervals.iter().map(|i| i.end).max()
    }

    /// Worked minutes: the forfait when set, else the sum of intervals.
    ///
    /// Non-work days always report 0.
    pub fn worked_minutes(&self) -> i64 {
        if !self.is_work() {
            return 0;
        }
        match self.forfait_minutes {
            Some(minutes) => minutes,
            None => self.intervals.iter().map(TimeInterval::duration_minutes).sum(),
        }
    }

    /// Span from first start to last end, in minutes.
    pub fn amplitude_minutes(&self) -> Option<i64> {
        match (self.first_start(), self.last_end()) {
            (Some(start), Some(end)) => Some((end - start).num_minutes()),
            _ => None,
        }
    }

    /// Whether any interval touches the night window.
    pub fn is_nocturnal(&self, night: &NightWindow) -> bool {
        self.intervals.iter().any(|i| night.intersects(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn night() -> NightWindow {
        NightWindow::new(t(21, 30), t(6, 30))
    }

    #[test]
    fn test_interval_rollover() {
        let i = TimeInterval::on_day(d(2024, 1, 1), t(22, 0), t(6, 0));
        assert_eq!(i.end.date(), d(2024, 1, 2));
        assert_eq!(i.duration_minutes(), 480);
    }

    #[test]
    fn test_interval_same_day() {
        let i = TimeInterval::on_day(d(2024, 1, 1), t(8, 0), t(16, 0));
        assert_eq!(i.end.date(), d(2024, 1, 1));
        assert_eq!(i.duration_minutes(), 480);
        assert!(i.contains(d(2024, 1, 1).and_time(t(8, 0))));
        assert!(!i.contains(d(2024, 1, 1).and_time(t(16, 0)))); // exclusive end
    }

    #[test]
    fn test_interval_equal_times_is_full_day() {
        let i = TimeInterval::on_day(d(2024, 1, 1), t(8, 0), t(8, 0));
        assert_eq!(i.duration_minutes(), 24 * 60);
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        let a = d(2024, 1, 1).and_time(t(10, 0));
        let b = d(2024, 1, 1).and_time(t(9, 0));
        assert!(TimeInterval::try_new(a, b).is_none());
        assert!(TimeInterval::try_new(b, a).is_some());
    }

    #[test]
    fn test_overlap() {
        let a = TimeInterval::on_day(d(2024, 1, 1), t(8, 0), t(12, 0));
        let b = TimeInterval::on_day(d(2024, 1, 1), t(11, 0), t(14, 0));
        let c = TimeInterval::on_day(d(2024, 1, 1), t(12, 0), t(14, 0));
        assert!(a.overlaps(&b));
        assert_eq!(a.overlap_minutes(&b), 60);
        assert!(!a.overlaps(&c)); // touching
        assert_eq!(a.overlap_minutes(&c), 0);
    }

    #[test]
    fn test_night_detection() {
        let n = night();
        let day_shift = TimeInterval::on_day(d(2024, 1, 1), t(8, 0), t(16, 0));
        let late_shift = TimeInterval::on_day(d(2024, 1, 1), t(14, 0), t(22, 0));
        let early_shift = TimeInterval::on_day(d(2024, 1, 1), t(5, 0), t(13, 0));
        let boundary = TimeInterval::on_day(d(2024, 1, 1), t(6, 30), t(21, 30));
        assert!(!n.intersects(&day_shift));
        assert!(n.intersects(&late_shift));
        assert!(n.intersects(&early_shift));
        assert!(!n.intersects(&boundary));
    }

    #[test]
    fn test_worked_minutes() {
        let day = CanonicalDay::new("A", d(2024, 1, 1), DayType::Working)
            .with_shift(t(13, 0), t(17, 0))
            .with_shift(t(6, 0), t(10, 0));
        assert_eq!(day.worked_minutes(), 480);
        assert_eq!(day.first_start(), Some(d(2024, 1, 1).and_time(t(6, 0))));
        assert_eq!(day.amplitude_minutes(), Some(660));
    }

    #[test]
    fn test_forfait_day() {
        let day = CanonicalDay::new("A", d(2024, 1, 1), DayType::Zcot).with_forfait(480);
        assert!(day.is_work());
        assert!(!day.has_intervals());
        assert_eq!(day.worked_minutes(), 480);
        assert_eq!(day.amplitude_minutes(), None);
    }

    #[test]
    fn test_rest_day_has_no_work() {
        let day = CanonicalDay::rest("A", d(2024, 1, 1));
        assert!(!day.is_work());
        assert_eq!(day.worked_minutes(), 0);
        assert!(!day.is_nocturnal(&night()));
    }
}
