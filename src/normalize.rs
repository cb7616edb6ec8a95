//! Raw day normalization.
//!
//! Converts externally sourced day records into [`CanonicalDay`]s:
//! - maps the external day-type vocabulary through an explicit table,
//! - builds intervals from shift begin/end with midnight rollover,
//! - credits fixed forfait minutes to duration-fixed day types.
//!
//! Unknown day-type codes and overlapping shifts are structural errors: they
//! stop evaluation for the agent before any rule runs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::RuleThresholds;
use crate::error::{Error, Result, StructuralError};
use crate::models::{CanonicalDay, DayType, TimeInterval};

/// A shift as recorded by the planning source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawShift {
    /// Wall-clock begin.
    pub start: NaiveTime,
    /// Wall-clock end; on or before `start` means the next day.
    pub end: NaiveTime,
}

impl RawShift {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

/// One agent-day as delivered by the planning source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawDay {
    pub agent_id: String,
    pub date: NaiveDate,
    /// External day-type code (e.g. `"RP"`, `"ZCOT"`).
    pub day_type: String,
    #[serde(default)]
    pub shifts: Vec<RawShift>,
    /// Explicit forfait minutes, overriding the table default.
    #[serde(default)]
    pub forfait_minutes: Option<i64>,
}

impl RawDay {
    /// Creates a raw day without shifts.
    pub fn new(agent_id: impl Into<String>, date: NaiveDate, day_type: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            date,
            day_type: day_type.into(),
            shifts: Vec::new(),
            forfait_minutes: None,
        }
    }

    /// Adds a shift.
    pub fn with_shift(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.shifts.push(RawShift::new(start, end));
        self
    }

    /// Sets explicit forfait minutes.
    pub fn with_forfait(mut self, minutes: i64) -> Self {
        self.forfait_minutes = Some(minutes);
        self
    }
}

/// External → canonical day-type mapping.
///
/// Lookups are case-insensitive and ignore surrounding whitespace.
#[derive(Debug, Clone)]
pub struct DayTypeTable {
    entries: HashMap<String, DayType>,
}

impl DayTypeTable {
    /// Creates an empty table.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a code.
    pub fn with_code(mut self, code: &str, day_type: DayType) -> Self {
        self.insert(code, day_type);
        self
    }

    /// Registers a code in place.
    pub fn insert(&mut self, code: &str, day_type: DayType) {
        self.entries.insert(normalize_code(code), day_type);
    }

    /// Maps an external code.
    pub fn lookup(&self, code: &str) -> Option<DayType> {
        self.entries.get(&normalize_code(code)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DayTypeTable {
    fn default() -> Self {
        const TABLE: &[(&str, DayType)] = &[
            ("SERVICE", DayType::Working),
            ("POSTE", DayType::Working),
            ("TRAVAIL", DayType::Working),
            ("ZCOT", DayType::Zcot),
            ("RP", DayType::Rest),
            ("REPOS", DayType::Rest),
            ("CA", DayType::Leave),
            ("CONGE", DayType::Leave),
            ("MA", DayType::Absent),
            ("ABS", DayType::Absent),
            ("ABSENCE", DayType::Absent),
            ("NR", DayType::Unknown),
            ("INCONNU", DayType::Unknown),
        ];
        let mut table = Self::empty();
        for (code, day_type) in TABLE {
            table.insert(code, *day_type);
        }
        table
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Raw → canonical converter.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: DayTypeTable,
    forfaits: HashMap<DayType, i64>,
}

impl Normalizer {
    /// Creates a normalizer with the default table and the configured ZCOT forfait.
    pub fn new(thresholds: &RuleThresholds) -> Self {
        let mut forfaits = HashMap::new();
        forfaits.insert(DayType::Zcot, thresholds.zcot_forfait_minutes);
        Self {
            table: DayTypeTable::default(),
            forfaits,
        }
    }

    /// Replaces the day-type table.
    pub fn with_table(mut self, table: DayTypeTable) -> Self {
        self.table = table;
        self
    }

    /// Sets the forfait credited to a day type.
    pub fn with_forfait(mut self, day_type: DayType, minutes: i64) -> Self {
        self.forfaits.insert(day_type, minutes);
        self
    }

    /// Converts one raw day.
    pub fn canonicalize(&self, raw: &RawDay) -> std::result::Result<CanonicalDay, StructuralError> {
        let day_type =
            self.table
                .lookup(&raw.day_type)
                .ok_or_else(|| StructuralError::UnknownDayType {
                    agent_id: raw.agent_id.clone(),
                    date: raw.date,
                    code: raw.day_type.clone(),
                })?;

        let mut intervals: Vec<TimeInterval> = raw
            .shifts
            .iter()
            .map(|s| TimeInterval::on_day(raw.date, s.start, s.end))
            .collect();
        intervals.sort_by_key(|i| i.start);

        for pair in intervals.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(StructuralError::OverlappingIntervals {
                    agent_id: raw.agent_id.clone(),
                    date: raw.date,
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                });
            }
        }

        let forfait_minutes = raw
            .forfait_minutes
            .or_else(|| self.forfaits.get(&day_type).copied());

        Ok(CanonicalDay {
            agent_id: raw.agent_id.clone(),
            date: raw.date,
            day_type,
            intervals,
            forfait_minutes,
        })
    }

    /// Converts a batch, collecting every structural error.
    pub fn canonicalize_all(&self, raws: &[RawDay]) -> Result<Vec<CanonicalDay>> {
        let mut days = Vec::with_capacity(raws.len());
        let mut errors = Vec::new();
        for raw in raws {
            match self.canonicalize(raw) {
                Ok(day) => days.push(day),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(days)
        } else {
            Err(Error::from(errors))
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&RuleThresholds::default())
    }
}

/// Converts one raw day with the default table and thresholds.
pub fn canonicalize(raw: &RawDay) -> std::result::Result<CanonicalDay, StructuralError> {
    Normalizer::default().canonicalize(raw)
}
