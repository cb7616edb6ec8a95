//! Day-scoped rules: daily rest, daily duration, daily amplitude.

use super::{ComplianceRule, RuleContext, RuleOutcome, Scope};
use crate::models::{codes, CanonicalDay, Violation};

fn hm(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.abs();
    format!("{sign}{}h{:02}", abs / 60, abs % 60)
}

/// Minimum rest between two consecutive working days.
///
/// The gap runs from the last interval end of the nearest earlier timed
/// working day (rest, leave and absence days skipped) to the first interval
/// start of the current day. The requirement rises from
/// `daily_rest_min_minutes` to `daily_rest_night_min_minutes` when either
/// day touches the night window.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyRest;

impl ComplianceRule for DailyRest {
    fn name(&self) -> &'static str {
        "daily_rest"
    }

    fn scope(&self) -> Scope {
        Scope::Day
    }

    fn check_day(&self, day: &CanonicalDay, ctx: &RuleContext<'_>) -> RuleOutcome {
        if !day.is_work() {
            return Ok(Vec::new());
        }
        let Some(start) = day.first_start() else {
            return Ok(Vec::new());
        };
        let Some(previous) = ctx.window.previous_timed_work_day(day.date) else {
            return Ok(Vec::new());
        };
        let Some(previous_end) = previous.last_end() else {
            return Ok(Vec::new());
        };

        let t = ctx.thresholds;
        let night = t.night_window();
        let nocturnal = previous.is_nocturnal(&night) || day.is_nocturnal(&night);
        let required = if nocturnal {
            t.daily_rest_night_min_minutes
        } else {
            t.daily_rest_min_minutes
        };
        let observed = (start - previous_end).num_minutes();
        if observed >= required {
            return Ok(Vec::new());
        }

        Ok(vec![Violation::error(
            codes::DAILY_REST_TOO_SHORT,
            self.name(),
            format!(
                "Rest of {} between {} and {} is below the required {}",
                hm(observed),
                previous_end.format("%Y-%m-%d %H:%M"),
                start.format("%Y-%m-%d %H:%M"),
                hm(required)
            ),
        )
        .on_date(day.date)
        .on_date(previous.date)
        .at(previous_end)
        .at(start)
        .with_meta("observed_minutes", observed)
        .with_meta("required_minutes", required)
        .with_meta("nocturnal", nocturnal)])
    }

    fn description(&self) -> &'static str {
        "Minimum daily rest between working days"
    }
}

/// Worked minutes of a working day must stay within bounds.
///
/// Below-minimum and above-maximum are reported under distinct codes. The
/// maximum drops to `daily_duration_night_max_minutes` on nocturnal days.
/// Working days without intervals or forfait carry no duration and are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyDuration;

impl ComplianceRule for DailyDuration {
    fn name(&self) -> &'static str {
        "daily_duration"
    }

    fn scope(&self) -> Scope {
        Scope::Day
    }

    fn check_day(&self, day: &CanonicalDay, ctx: &RuleContext<'_>) -> RuleOutcome {
        if !day.is_work() || (!day.has_intervals() && day.forfait_minutes.is_none()) {
            return Ok(Vec::new());
        }

        let t = ctx.thresholds;
        let worked = day.worked_minutes();
        let nocturnal = day.is_nocturnal(&t.night_window());
        let max = if nocturnal {
            t.daily_duration_night_max_minutes
        } else {
            t.daily_duration_max_minutes
        };

        let mut violations = Vec::new();
        if worked < t.daily_duration_min_minutes {
            violations.push(
                Violation::error(
                    codes::DAILY_DURATION_BELOW_MIN,
                    self.name(),
                    format!(
                        "Worked {} on {}, below the minimum {}",
                        hm(worked),
                        day.date,
                        hm(t.daily_duration_min_minutes)
                    ),
                )
                .on_date(day.date)
                .with_meta("worked_minutes", worked)
                .with_meta("min_minutes", t.daily_duration_min_minutes),
            );
        }
        if worked > max {
            violations.push(
                Violation::error(
                    codes::DAILY_DURATION_ABOVE_MAX,
                    self.name(),
                    format!(
                        "Worked {} on {}, above the {}maximum {}",
                        hm(worked),
                        day.date,
                        if nocturnal { "nocturnal " } else { "" },
                        hm(max)
                    ),
                )
                .on_date(day.date)
                .with_meta("worked_minutes", worked)
                .with_meta("max_minutes", max)
                .with_meta("nocturnal", nocturnal),
            );
        }
        Ok(violations)
    }

    fn description(&self) -> &'static str {
        "Daily worked duration bounds"
    }
}

/// Span from first start to last end of a day must not exceed the maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyAmplitude;

impl ComplianceRule for DailyAmplitude {
    fn name(&self) -> &'static str {
        "daily_amplitude"
    }

    fn scope(&self) -> Scope {
        Scope::Day
    }

    fn check_day(&self, day: &CanonicalDay, ctx: &RuleContext<'_>) -> RuleOutcome {
        if !day.is_work() {
            return Ok(Vec::new());
        }
        let Some(amplitude) = day.amplitude_minutes() else {
            return Ok(Vec::new());
        };
        let max = ctx.thresholds.daily_amplitude_max_minutes;
        if amplitude <= max {
            return Ok(Vec::new());
        }

        let mut violation = Violation::error(
            codes::DAILY_AMPLITUDE_EXCEEDED,
            self.name(),
            format!(
                "Amplitude of {} on {} exceeds {}",
                hm(amplitude),
                day.date,
                hm(max)
            ),
        )
        .on_date(day.date)
        .with_meta("amplitude_minutes", amplitude)
        .with_meta("max_minutes", max);
        if let (Some(start), Some(end)) = (day.first_start(), day.last_end()) {
            violation = violation.at(start).at(end);
        }
        Ok(vec![violation])
    }

    fn description(&self) -> &'static str {
        "Maximum daily amplitude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::WindowContext;
    use crate::config::RuleThresholds;
    use crate::models::{DayType, Severity};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn run_day<R: ComplianceRule>(
        rule: &R,
        days: Vec<CanonicalDay>,
        date: NaiveDate,
    ) -> Vec<Violation> {
        let window = WindowContext::new("A1", days).unwrap();
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(&window, None, &thresholds);
        let day = window.day_at(date).unwrap().clone();
        rule.check_day(&day, &ctx).unwrap()
    }

    #[test]
    fn test_rest_nocturnal_too_short() {
        // Ends 22:00, next starts 06:20: 500 min, night requirement 840.
        let days = vec![
            CanonicalDay::working("A1", d(1), t(14, 0), t(22, 0)),
            CanonicalDay::working("A1", d(2), t(6, 20), t(13, 0)),
        ];
        let v = run_day(&DailyRest, days, d(2));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code(), codes::DAILY_REST_TOO_SHORT);
        assert_eq!(v[0].severity(), Severity::Error);
        assert_eq!(v[0].meta("observed_minutes"), Some(&500.into()));
        assert_eq!(v[0].meta("required_minutes"), Some(&840.into()));
    }

    #[test]
    fn test_rest_day_shift_sufficient() {
        let days = vec![
            CanonicalDay::working("A1", d(1), t(8, 0), t(16, 0)),
            CanonicalDay::working("A1", d(2), t(8, 0), t(16, 0)),
        ];
        assert!(run_day(&DailyRest, days, d(2)).is_empty());
    }

    #[test]
    fn test_rest_standard_requirement() {
        // 18:00 → 07:00 is 780 min, no night touch, above 740.
        let ok = vec![
            CanonicalDay::working("A1", d(1), t(10, 0), t(18, 0)),
            CanonicalDay::working("A1", d(2), t(7, 0), t(15, 0)),
        ];
        assert!(run_day(&DailyRest, ok, d(2)).is_empty());

        // 19:00 → 07:00 is 720 min < 740.
        let short = vec![
            CanonicalDay::working("A1", d(1), t(11, 0), t(19, 0)),
            CanonicalDay::working("A1", d(2), t(7, 0), t(15, 0)),
        ];
        let v = run_day(&DailyRest, short, d(2));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].meta("required_minutes"), Some(&740.into()));
    }

    #[test]
    fn test_rest_skips_rest_days() {
        let days = vec![
            CanonicalDay::working("A1", d(1), t(8, 0), t(23, 0)),
            CanonicalDay::rest("A1", d(2)),
            CanonicalDay::working("A1", d(3), t(6, 0), t(12, 0)),
        ];
        // 23:00 on the 1st to 06:00 on the 3rd: 31 hours.
        assert!(run_day(&DailyRest, days, d(3)).is_empty());
    }

    #[test]
    fn test_rest_no_previous_day() {
        let days = vec![CanonicalDay::working("A1", d(1), t(8, 0), t(16, 0))];
        assert!(run_day(&DailyRest, days, d(1)).is_empty());
    }

    #[test]
    fn test_duration_below_min_only() {
        let days = vec![CanonicalDay::working("A1", d(1), t(8, 0), t(12, 0))];
        let v = run_day(&DailyDuration, days, d(1));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code(), codes::DAILY_DURATION_BELOW_MIN);
    }

    #[test]
    fn test_duration_above_max() {
        let days = vec![CanonicalDay::working("A1", d(1), t(7, 0), t(18, 0))];
        let v = run_day(&DailyDuration, days, d(1));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code(), codes::DAILY_DURATION_ABOVE_MAX);
    }

    #[test]
    fn test_duration_nocturnal_max() {
        // 9h night shift: fine by day standards, above the 8h30 night cap.
        let days = vec![CanonicalDay::working("A1", d(1), t(21, 0), t(6, 0))];
        let v = run_day(&DailyDuration, days, d(1));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code(), codes::DAILY_DURATION_ABOVE_MAX);
        assert_eq!(v[0].meta("max_minutes"), Some(&510.into()));
    }

    #[test]
    fn test_duration_skips_non_work_and_untimed() {
        let days = vec![
            CanonicalDay::rest("A1", d(1)),
            CanonicalDay::new("A1", d(2), DayType::Working),
            CanonicalDay::new("A1", d(3), DayType::Zcot).with_forfait(480),
        ];
        assert!(run_day(&DailyDuration, days.clone(), d(1)).is_empty());
        assert!(run_day(&DailyDuration, days.clone(), d(2)).is_empty());
        assert!(run_day(&DailyDuration, days, d(3)).is_empty());
    }

    #[test]
    fn test_amplitude() {
        let split = CanonicalDay::new("A1", d(1), DayType::Working)
            .with_shift(t(6, 0), t(10, 0))
            .with_shift(t(14, 0), t(18, 0));
        let v = run_day(&DailyAmplitude, vec![split], d(1));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code(), codes::DAILY_AMPLITUDE_EXCEEDED);
        assert_eq!(v[0].datetimes().len(), 2);

        let at_limit = CanonicalDay::new("A1", d(2), DayType::Working)
            .with_shift(t(6, 0), t(10, 0))
            .with_shift(t(13, 0), t(17, 0));
        assert!(run_day(&DailyAmplitude, vec![at_limit], d(2)).is_empty());
    }

    #[test]
    fn test_hm_keeps_sign() {
        assert_eq!(hm(500), "8h20");
        assert_eq!(hm(-30), "-0h30");
        assert_eq!(hm(-90), "-1h30");
    }

    #[test]
    fn test_rest_overrun_reports_negative_gap() {
        let days = vec![
            CanonicalDay::working("A1", d(1), t(22, 0), t(6, 30)),
            CanonicalDay::working("A1", d(2), t(6, 0), t(12, 0)),
        ];
        let v = run_day(&DailyRest, days, d(2));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].meta("observed_minutes"), Some(&(-30).into()));
        assert!(v[0].message().starts_with("Rest of -0h30 "));
    }
}
