//! Named rule thresholds.
//!
//! Every numeric limit used by the rule catalog lives here so that regimes
//! and deployments can reuse the same rule shapes with different numbers.
//! Thresholds deserialize with per-field defaults, so a JSON document only
//! needs the values it overrides.
//!
//! ```
//! use u_roster::config::RuleThresholds;
//!
//! let t = RuleThresholds::from_json(r#"{"gpt_max_days": 5}"#).unwrap();
//! assert_eq!(t.gpt_max_days, 5);
//! assert_eq!(t.daily_rest_min_minutes, 740);
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::NightWindow;

/// Limits applied by the built-in rules.
///
/// All durations are in minutes, all day counts in calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Minimum rest between two working days.
    pub daily_rest_min_minutes: i64,
    /// Minimum rest when either day touches the night window.
    pub daily_rest_night_min_minutes: i64,
    /// Night window opening time.
    pub night_start: NaiveTime,
    /// Night window closing time (next day).
    pub night_end: NaiveTime,
    pub daily_duration_min_minutes: i64,
    pub daily_duration_max_minutes: i64,
    /// Maximum worked minutes on a nocturnal day.
    pub daily_duration_night_max_minutes: i64,
    /// Maximum span from first start to last end of a day.
    pub daily_amplitude_max_minutes: i64,
    /// Untruncated work periods shorter than this are flagged.
    pub gpt_min_days: usize,
    pub gpt_max_days: usize,
    /// Maximum worked minutes over one work period.
    pub gpt_max_minutes: i64,
    /// Rest days required right after a maximal work period.
    pub double_rest_days: usize,
    /// Leave days required in a full year.
    pub annual_leave_min_days: usize,
    /// Length of the main leave block required in a full year.
    pub main_leave_block_min_days: usize,
    /// Fixed minutes credited to a ZCOT day.
    pub zcot_forfait_minutes: i64,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            daily_rest_min_minutes: 740,
            daily_rest_night_min_minutes: 840,
            night_start: hm(21, 30),
            night_end: hm(6, 30),
            daily_duration_min_minutes: 330,
            daily_duration_max_minutes: 600,
            daily_duration_night_max_minutes: 510,
            daily_amplitude_max_minutes: 660,
            gpt_min_days: 3,
            gpt_max_days: 6,
            gpt_max_minutes: 2880,
            double_rest_days: 2,
            annual_leave_min_days: 28,
            main_leave_block_min_days: 15,
            zcot_forfait_minutes: 480,
        }
    }
}

impl RuleThresholds {
    /// Loads thresholds from JSON and validates them.
    pub fn from_json(json: &str) -> Result<Self> {
        let thresholds: Self = serde_json::from_str(json)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// The configured night window.
    pub fn night_window(&self) -> NightWindow {
        NightWindow::new(self.night_start, self.night_end)
    }

    /// Rejects inconsistent combinations.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.daily_rest_night_min_minutes < self.daily_rest_min_minutes {
            problems.push(format!(
                "daily_rest_night_min_minutes ({}) < daily_rest_min_minutes ({})",
                self.daily_rest_night_min_minutes, self.daily_rest_min_minutes
            ));
        }
        if self.daily_duration_min_minutes > self.daily_duration_max_minutes {
            problems.push(format!(
                "daily_duration_min_minutes ({}) > daily_duration_max_minutes ({})",
                self.daily_duration_min_minutes, self.daily_duration_max_minutes
            ));
        }
        if self.daily_duration_night_max_minutes > self.daily_duration_max_minutes {
            problems.push(format!(
                "daily_duration_night_max_minutes ({}) > daily_duration_max_minutes ({})",
                self.daily_duration_night_max_minutes, self.daily_duration_max_minutes
            ));
        }
        if self.gpt_max_days == 0 || self.gpt_min_days > self.gpt_max_days {
            problems.push(format!(
                "invalid work period bounds: min {} / max {}",
                self.gpt_min_days, self.gpt_max_days
            ));
        }
        if self.main_leave_block_min_days > self.annual_leave_min_days {
            problems.push(format!(
                "main_leave_block_min_days ({}) > annual_leave_min_days ({})",
                self.main_leave_block_min_days, self.annual_leave_min_days
            ));
        }
        if self.night_start == self.night_end {
            problems.push("night window has zero length".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(problems.join("; ")))
        }
    }
}
