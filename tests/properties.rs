use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use std::collections::HashMap;
use u_roster::periods::{detect_blocks, BlockKind};
use u_roster::{CanonicalDay, ComplianceEngine, DayType, Severity, WindowContext};

const TYPES: [DayType; 6] = [
    DayType::Working,
    DayType::Zcot,
    DayType::Rest,
    DayType::Leave,
    DayType::Absent,
    DayType::Unknown,
];

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Builds a roster from (type index, present) pairs; absent entries leave a date gap.
fn roster(spec: &[(usize, bool)]) -> Vec<CanonicalDay> {
    spec.iter()
        .enumerate()
        .filter(|(_, (_, present))| *present)
        .map(|(i, (ty, _))| {
            let date = origin() + Duration::days(i as i64);
            match TYPES[*ty] {
                DayType::Working => CanonicalDay::working(
                    "A1",
                    date,
                    NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                ),
                DayType::Zcot => CanonicalDay::new("A1", date, DayType::Zcot).with_forfait(480),
                other => CanonicalDay::new("A1", date, other),
            }
        })
        .collect()
}

fn roster_strategy() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0usize..TYPES.len(), prop::bool::weighted(0.9)), 0..80)
}

proptest! {
    #[test]
    fn blocks_partition_matching_days(spec in roster_strategy()) {
        let days = roster(&spec);
        let by_date: HashMap<NaiveDate, &CanonicalDay> = days.iter().map(|d| (d.date, d)).collect();
        let (start, end) = match (days.first(), days.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => (origin(), origin()),
        };

        for kind in [BlockKind::Work, BlockKind::Rest] {
            let blocks = detect_blocks(kind, &days, start, end);

            let covered: usize = blocks.iter().map(|b| b.day_count()).sum();
            let matching = days.iter().filter(|d| kind.accepts(d.day_type)).count();
            prop_assert_eq!(covered, matching);

            for block in &blocks {
                for pair in block.days.windows(2) {
                    prop_assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
                }
                let before = block.start() - Duration::days(1);
                let after = block.end() + Duration::days(1);
                prop_assert!(!by_date.get(&before).is_some_and(|d| kind.accepts(d.day_type)));
                prop_assert!(!by_date.get(&after).is_some_and(|d| kind.accepts(d.day_type)));
            }
        }
    }

    #[test]
    fn leave_blocks_contain_leave(spec in roster_strategy()) {
        let days = roster(&spec);
        let end = origin() + Duration::days(spec.len() as i64);
        let blocks = detect_blocks(BlockKind::Leave, &days, origin(), end);

        for block in &blocks {
            prop_assert!(block.count_type(DayType::Leave) >= 1);
        }
        let in_blocks: usize = blocks.iter().map(|b| b.count_type(DayType::Leave)).sum();
        let leave_days = days.iter().filter(|d| d.day_type == DayType::Leave).count();
        prop_assert_eq!(in_blocks, leave_days);
    }

    #[test]
    fn rest_only_never_yields_leave(len in 1i64..60) {
        let days: Vec<_> = (0..len)
            .map(|i| CanonicalDay::rest("A1", origin() + Duration::days(i)))
            .collect();
        let end = origin() + Duration::days(len - 1);
        prop_assert!(detect_blocks(BlockKind::Leave, &days, origin(), end).is_empty());
    }

    #[test]
    fn truncation_is_boundary_exact(lead in 0i64..5, len in 1i64..10) {
        // `lead` rest days, then a work run; the window starts at the run.
        let mut days: Vec<_> = (0..lead)
            .map(|i| CanonicalDay::rest("A1", origin() + Duration::days(i)))
            .collect();
        let run_start = origin() + Duration::days(lead);
        days.extend((0..len).map(|i| {
            CanonicalDay::new("A1", run_start + Duration::days(i), DayType::Zcot).with_forfait(480)
        }));
        let end = run_start + Duration::days(len + 3);

        let at_edge = detect_blocks(BlockKind::Work, &days, run_start, end);
        prop_assert_eq!(at_edge.len(), 1);
        prop_assert!(at_edge[0].left_truncated);
        prop_assert!(!at_edge[0].right_truncated);

        let earlier = detect_blocks(BlockKind::Work, &days, run_start - Duration::days(1), end);
        prop_assert!(!earlier[0].left_truncated);
    }

    #[test]
    fn validity_iff_no_error(spec in roster_strategy()) {
        let days = roster(&spec);
        let window = WindowContext::new("A1", days).unwrap();
        let report = ComplianceEngine::standard().evaluate(&window, None);
        prop_assert_eq!(report.is_valid(), report.count(Severity::Error) == 0);
        prop_assert_eq!(report.day_dispatches, window.len());
    }
}
