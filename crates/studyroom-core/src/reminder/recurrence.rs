//! Pure recurrence math: next-occurrence and bounded expansion.
//!
//! All instants are wall-clock `NaiveDateTime`s interpreted in device-local
//! time; callers supply "now" as `Local::now().naive_local()`. Results are
//! strictly after the reference instant: an occurrence equal to `after`
//! counts as already passed and is never returned, so evaluation can never
//! re-fire the instant that triggered it.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use super::{ClockTime, Recurrence, ReminderRule};

/// Bound on how far a rule is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// At most this many occurrences.
    Count(usize),
    /// Every occurrence up to and including this instant.
    Until(NaiveDateTime),
}

/// One concrete trigger instant of a rule.
///
/// `index` is a deterministic function of the occurrence's position in the
/// recurrence pattern, so repeated expansion of an unchanged rule derives
/// the same trigger ids. Weekly rules use `week_offset * 7 + weekday`: each
/// selected weekday is an independent lineage repeating every 7 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub fires_at: NaiveDateTime,
    pub index: u32,
}

/// Next instant strictly after `after` at which the rule should fire.
///
/// Returns `None` only for a weekly rule with no selected weekdays (rejected
/// at creation, but the resolver stays total).
pub fn next_occurrence(rule: &ReminderRule, after: NaiveDateTime) -> Option<NaiveDateTime> {
    match &rule.recurrence {
        Recurrence::Once | Recurrence::Daily => Some(next_daily(rule.time, after)),
        Recurrence::Weekly { days } => days
            .iter()
            .map(|&d| next_on_weekday(d, rule.time, after))
            .min(),
        Recurrence::Monthly { day_of_month } => Some(next_monthly(*day_of_month, rule.time, after)),
    }
}

/// Expand a rule into its ordered occurrences up to `horizon`.
///
/// Pure and restartable: the same `(rule, after, horizon)` always yields the
/// same sequence.
pub fn expand(rule: &ReminderRule, after: NaiveDateTime, horizon: Horizon) -> Vec<Occurrence> {
    let mut out = Vec::new();
    match &rule.recurrence {
        Recurrence::Once => {
            let occ = Occurrence {
                fires_at: next_daily(rule.time, after),
                index: 0,
            };
            push_within(&mut out, occ, horizon);
        }
        Recurrence::Daily => {
            let first = next_daily(rule.time, after);
            let mut step: u32 = 0;
            loop {
                let occ = Occurrence {
                    fires_at: first + Duration::days(i64::from(step)),
                    index: step,
                };
                if !push_within(&mut out, occ, horizon) {
                    break;
                }
                step += 1;
            }
        }
        Recurrence::Weekly { days } => {
            // One lineage per selected weekday, merged chronologically.
            let mut heads: Vec<(u8, u32, NaiveDateTime)> = days
                .iter()
                .map(|&d| (d, 0, next_on_weekday(d, rule.time, after)))
                .collect();
            if heads.is_empty() {
                return out;
            }
            loop {
                let pos = (0..heads.len())
                    .min_by_key(|&i| heads[i].2)
                    .unwrap_or(0);
                let (day, week, fires_at) = heads[pos];
                let occ = Occurrence {
                    fires_at,
                    index: week * 7 + u32::from(day),
                };
                if !push_within(&mut out, occ, horizon) {
                    break;
                }
                heads[pos] = (day, week + 1, fires_at + Duration::days(7));
            }
        }
        Recurrence::Monthly { day_of_month } => {
            let first = next_monthly(*day_of_month, rule.time, after);
            let mut year = first.date().year();
            let mut month = first.date().month();
            let mut step: u32 = 0;
            loop {
                let occ = Occurrence {
                    fires_at: monthly_date(year, month, *day_of_month).and_time(rule.time.to_naive()),
                    index: step,
                };
                if !push_within(&mut out, occ, horizon) {
                    break;
                }
                let (y, m) = next_month(year, month);
                year = y;
                month = m;
                step += 1;
            }
        }
    }
    out
}

/// Append if the horizon allows it; returns whether expansion may continue.
fn push_within(out: &mut Vec<Occurrence>, occ: Occurrence, horizon: Horizon) -> bool {
    match horizon {
        Horizon::Count(n) => {
            if out.len() >= n {
                return false;
            }
            out.push(occ);
            out.len() < n
        }
        Horizon::Until(limit) => {
            if occ.fires_at > limit {
                return false;
            }
            out.push(occ);
            true
        }
    }
}

/// Today at `time`, or tomorrow if that instant is not strictly in the
/// future. Also the `Once` rule: "the next upcoming instant of this time".
fn next_daily(time: ClockTime, after: NaiveDateTime) -> NaiveDateTime {
    let today = after.date().and_time(time.to_naive());
    if today > after {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Next instant on the given weekday (0 = Sunday) strictly after `after`.
/// Same-day resolves only while `time` is still in the future; otherwise
/// the occurrence wraps a full week.
fn next_on_weekday(day: u8, time: ClockTime, after: NaiveDateTime) -> NaiveDateTime {
    let current = i64::from(after.date().weekday().num_days_from_sunday());
    let delta = (i64::from(day) - current).rem_euclid(7);
    let mut candidate = (after.date() + Duration::days(delta)).and_time(time.to_naive());
    if candidate <= after {
        candidate += Duration::days(7);
    }
    candidate
}

/// Next monthly instant strictly after `after`, clamping `day` into the
/// target month.
fn next_monthly(day: u8, time: ClockTime, after: NaiveDateTime) -> NaiveDateTime {
    let candidate =
        monthly_date(after.date().year(), after.date().month(), day).and_time(time.to_naive());
    if candidate > after {
        candidate
    } else {
        let (year, month) = next_month(after.date().year(), after.date().month());
        monthly_date(year, month, day).and_time(time.to_naive())
    }
}

/// Date at `day` in the given month, clamped to the month's last day.
fn monthly_date(year: i32, month: u32, day: u8) -> NaiveDate {
    let day = u32::from(day).clamp(1, last_day_of_month(year, month));
    // day is clamped into range
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{Importance, ReminderCategory};
    use chrono::{Utc, Weekday};
    use proptest::prelude::*;

    fn rule(recurrence: Recurrence, time: ClockTime) -> ReminderRule {
        ReminderRule {
            id: "r-test".to_string(),
            title: "Study".to_string(),
            message: "Time to study".to_string(),
            time,
            recurrence,
            enabled: true,
            category: ReminderCategory::Study,
            sound: None,
            vibration: true,
            priority: Importance::Default,
            created_at: Utc::now(),
            last_triggered: None,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn clock(hour: u8, minute: u8) -> ClockTime {
        ClockTime::new(hour, minute).unwrap()
    }

    #[test]
    fn daily_before_todays_time_fires_today() {
        let r = rule(Recurrence::Daily, clock(9, 0));
        let after = at(2026, 8, 5, 8, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2026, 8, 5, 9, 0)));
    }

    #[test]
    fn daily_at_exact_time_is_already_passed() {
        let r = rule(Recurrence::Daily, clock(9, 0));
        let after = at(2026, 8, 5, 9, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2026, 8, 6, 9, 0)));
    }

    #[test]
    fn once_after_todays_time_fires_tomorrow() {
        let r = rule(Recurrence::Once, clock(9, 0));
        let after = at(2026, 8, 5, 10, 30);
        assert_eq!(next_occurrence(&r, after), Some(at(2026, 8, 6, 9, 0)));
        assert_eq!(expand(&r, after, Horizon::Count(5)).len(), 1);
    }

    #[test]
    fn weekly_sunday_evening_from_wednesday_morning() {
        let after = at(2026, 8, 5, 10, 0);
        assert_eq!(after.date().weekday(), Weekday::Wed);

        let r = rule(Recurrence::Weekly { days: vec![0] }, clock(19, 0));
        let next = next_occurrence(&r, after).unwrap();
        assert_eq!(next, at(2026, 8, 9, 19, 0));
        assert_eq!(next.date().weekday(), Weekday::Sun);
    }

    #[test]
    fn weekly_same_day_fires_only_while_time_is_still_future() {
        // 2026-08-05 is a Wednesday (weekday 3).
        let r = rule(Recurrence::Weekly { days: vec![3] }, clock(19, 0));
        assert_eq!(
            next_occurrence(&r, at(2026, 8, 5, 10, 0)),
            Some(at(2026, 8, 5, 19, 0))
        );
        // At 19:00 exactly, the instant has passed: wrap a full week.
        assert_eq!(
            next_occurrence(&r, at(2026, 8, 5, 19, 0)),
            Some(at(2026, 8, 12, 19, 0))
        );
    }

    #[test]
    fn weekly_empty_days_has_no_occurrence() {
        let r = rule(Recurrence::Weekly { days: vec![] }, clock(9, 0));
        assert_eq!(next_occurrence(&r, at(2026, 8, 5, 10, 0)), None);
        assert!(expand(&r, at(2026, 8, 5, 10, 0), Horizon::Count(5)).is_empty());
    }

    #[test]
    fn weekly_lineages_are_seven_days_apart_and_union_is_sorted() {
        // Monday and Thursday from a Wednesday morning.
        let after = at(2026, 8, 5, 10, 0);
        let r = rule(Recurrence::Weekly { days: vec![1, 4] }, clock(7, 30));
        let occurrences = expand(&r, after, Horizon::Count(6));
        assert_eq!(occurrences.len(), 6);

        // Chronological: Thu 6th, Mon 10th, Thu 13th, Mon 17th, ...
        let instants: Vec<NaiveDateTime> = occurrences.iter().map(|o| o.fires_at).collect();
        let mut sorted = instants.clone();
        sorted.sort();
        assert_eq!(instants, sorted);
        assert_eq!(instants[0], at(2026, 8, 6, 7, 30));
        assert_eq!(instants[1], at(2026, 8, 10, 7, 30));

        // Each weekday lineage repeats exactly every 7 days.
        for day in [1u8, 4] {
            let lineage: Vec<NaiveDateTime> = occurrences
                .iter()
                .filter(|o| o.fires_at.date().weekday().num_days_from_sunday() == u32::from(day))
                .map(|o| o.fires_at)
                .collect();
            for pair in lineage.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::days(7));
            }
        }
    }

    #[test]
    fn weekly_indices_are_stable_per_lineage() {
        let after = at(2026, 8, 5, 10, 0);
        let r = rule(Recurrence::Weekly { days: vec![1, 4] }, clock(7, 30));
        let occurrences = expand(&r, after, Horizon::Count(4));
        // Thu week 0, Mon week 0, Thu week 1, Mon week 1.
        let indices: Vec<u32> = occurrences.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![4, 1, 11, 8]);
    }

    #[test]
    fn monthly_day_31_clamps_to_end_of_february() {
        let r = rule(Recurrence::Monthly { day_of_month: 31 }, clock(9, 0));
        let after = at(2026, 2, 15, 10, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2026, 2, 28, 9, 0)));

        // Leap year February has 29 days.
        let after = at(2028, 2, 15, 10, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2028, 2, 29, 9, 0)));
    }

    #[test]
    fn monthly_passed_occurrence_advances_a_month() {
        let r = rule(Recurrence::Monthly { day_of_month: 15 }, clock(9, 0));
        let after = at(2026, 8, 15, 9, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2026, 9, 15, 9, 0)));
    }

    #[test]
    fn monthly_expansion_clamps_each_month_independently() {
        let r = rule(Recurrence::Monthly { day_of_month: 31 }, clock(9, 0));
        let occurrences = expand(&r, at(2026, 1, 15, 0, 0), Horizon::Count(4));
        let instants: Vec<NaiveDateTime> = occurrences.iter().map(|o| o.fires_at).collect();
        assert_eq!(
            instants,
            vec![
                at(2026, 1, 31, 9, 0),
                at(2026, 2, 28, 9, 0),
                at(2026, 3, 31, 9, 0),
                at(2026, 4, 30, 9, 0),
            ]
        );
    }

    #[test]
    fn monthly_december_rolls_into_next_year() {
        let r = rule(Recurrence::Monthly { day_of_month: 5 }, clock(9, 0));
        let after = at(2026, 12, 10, 0, 0);
        assert_eq!(next_occurrence(&r, after), Some(at(2027, 1, 5, 9, 0)));
    }

    #[test]
    fn daily_expansion_has_no_skipped_days() {
        let r = rule(Recurrence::Daily, clock(22, 0));
        let occurrences = expand(&r, at(2026, 8, 5, 23, 0), Horizon::Count(30));
        assert_eq!(occurrences.len(), 30);
        assert_eq!(occurrences[0].fires_at, at(2026, 8, 6, 22, 0));
        for pair in occurrences.windows(2) {
            assert_eq!(pair[1].fires_at - pair[0].fires_at, Duration::days(1));
        }
        let indices: Vec<u32> = occurrences.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..30).collect::<Vec<u32>>());
    }

    #[test]
    fn until_horizon_is_inclusive() {
        let r = rule(Recurrence::Daily, clock(9, 0));
        let after = at(2026, 8, 5, 10, 0);
        let occurrences = expand(&r, after, Horizon::Until(at(2026, 8, 8, 9, 0)));
        let instants: Vec<NaiveDateTime> = occurrences.iter().map(|o| o.fires_at).collect();
        assert_eq!(
            instants,
            vec![at(2026, 8, 6, 9, 0), at(2026, 8, 7, 9, 0), at(2026, 8, 8, 9, 0)]
        );
    }

    #[test]
    fn count_zero_yields_nothing() {
        let r = rule(Recurrence::Daily, clock(9, 0));
        assert!(expand(&r, at(2026, 8, 5, 10, 0), Horizon::Count(0)).is_empty());
    }

    fn arb_recurrence() -> impl Strategy<Value = Recurrence> {
        prop_oneof![
            Just(Recurrence::Once),
            Just(Recurrence::Daily),
            proptest::collection::vec(0u8..7, 1..=7)
                .prop_map(|days| Recurrence::Weekly { days }),
            (1u8..=31).prop_map(|day_of_month| Recurrence::Monthly { day_of_month }),
        ]
    }

    proptest! {
        #[test]
        fn next_occurrence_is_strictly_future(
            recurrence in arb_recurrence(),
            hour in 0u8..24,
            minute in 0u8..60,
            secs in 1_500_000_000i64..1_900_000_000,
        ) {
            let after = chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            let r = rule(recurrence, ClockTime { hour, minute });
            if let Some(next) = next_occurrence(&r, after) {
                prop_assert!(next > after);
            }
        }

        #[test]
        fn expansion_is_sorted_and_strictly_future(
            recurrence in arb_recurrence(),
            hour in 0u8..24,
            minute in 0u8..60,
            secs in 1_500_000_000i64..1_900_000_000,
        ) {
            let after = chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            let r = rule(recurrence, ClockTime { hour, minute });
            let occurrences = expand(&r, after, Horizon::Count(8));
            for pair in occurrences.windows(2) {
                prop_assert!(pair[0].fires_at < pair[1].fires_at);
            }
            if let Some(first) = occurrences.first() {
                prop_assert!(first.fires_at > after);
                prop_assert_eq!(Some(first.fires_at), next_occurrence(&r, after));
            }
        }
    }
}
