//! Recurrence intersection: can two recurrence patterns land on the same
//! calendar day?
//!
//! Weeks are numbered from a fixed parity epoch (a Monday, see
//! [`crate::config::DEFAULT_PARITY_EPOCH`]). Week 0 is even. A biweekly
//! session meets on the weeks matching its [`WeekParity`]; a weekly session
//! meets every week; a catchup session meets once, on its date.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::DEFAULT_PARITY_EPOCH;
use crate::model::{Recurrence, WeekParity};

/// Decides whether two recurrence patterns produce a shared occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceEvaluator {
    epoch: NaiveDate,
}

impl Default for RecurrenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_PARITY_EPOCH)
    }
}

impl RecurrenceEvaluator {
    /// Create an evaluator anchored on `epoch`. The epoch should be a Monday
    /// ([`crate::config::EngineConfig::validate`] enforces this).
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Index of the week containing `date`, counted from the epoch week.
    /// Negative before the epoch.
    pub fn week_index(&self, date: NaiveDate) -> i64 {
        (date - self.epoch).num_days().div_euclid(7)
    }

    /// Parity of the week containing `date`.
    pub fn week_parity(&self, date: NaiveDate) -> WeekParity {
        WeekParity::from_week_index(self.week_index(date))
    }

    /// Whether a session on `day_a` with `rec_a` and a session on `day_b`
    /// with `rec_b` meet on at least one common calendar date.
    ///
    /// For catchup patterns the date's own weekday is authoritative and the
    /// paired day argument is ignored.
    pub fn intersects(
        &self,
        day_a: Weekday,
        rec_a: Recurrence,
        day_b: Weekday,
        rec_b: Recurrence,
    ) -> bool {
        use Recurrence::*;

        match (rec_a, rec_b) {
            (Catchup { date: d1 }, Catchup { date: d2 }) => d1 == d2,
            (Catchup { date }, other) => self.date_matches(date, day_b, other),
            (other, Catchup { date }) => self.date_matches(date, day_a, other),
            _ if day_a != day_b => false,
            (Weekly, _) | (_, Weekly) => true,
            (Biweekly { parity: p1 }, Biweekly { parity: p2 }) => p1 == p2,
        }
    }

    /// Whether a single `date` is one of the occurrences of a recurring
    /// session meeting on `day` with `recurrence`.
    pub fn date_matches(&self, date: NaiveDate, day: Weekday, recurrence: Recurrence) -> bool {
        match recurrence {
            Recurrence::Catchup { date: other } => date == other,
            _ if date.weekday() != day => false,
            Recurrence::Weekly => true,
            Recurrence::Biweekly { parity } => self.week_parity(date) == parity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn even() -> Recurrence {
        Recurrence::Biweekly {
            parity: WeekParity::Even,
        }
    }

    fn odd() -> Recurrence {
        Recurrence::Biweekly {
            parity: WeekParity::Odd,
        }
    }

    fn catchup(y: i32, m: u32, d: u32) -> Recurrence {
        Recurrence::Catchup { date: date(y, m, d) }
    }

    #[test]
    fn test_week_index_from_epoch() {
        let ev = RecurrenceEvaluator::default();
        assert_eq!(ev.week_index(date(2024, 1, 1)), 0);
        assert_eq!(ev.week_index(date(2024, 1, 7)), 0);
        assert_eq!(ev.week_index(date(2024, 1, 8)), 1);
        assert_eq!(ev.week_index(date(2023, 12, 31)), -1);
    }

    #[test]
    fn test_week_parity_alternates() {
        let ev = RecurrenceEvaluator::default();
        assert_eq!(ev.week_parity(date(2024, 1, 3)), WeekParity::Even);
        assert_eq!(ev.week_parity(date(2024, 1, 10)), WeekParity::Odd);
        assert_eq!(ev.week_parity(date(2024, 1, 17)), WeekParity::Even);
        // Week before the epoch is odd, not "negative even".
        assert_eq!(ev.week_parity(date(2023, 12, 28)), WeekParity::Odd);
    }

    #[test]
    fn test_custom_epoch_shifts_parity() {
        let ev = RecurrenceEvaluator::new(date(2024, 1, 8));
        assert_eq!(ev.week_parity(date(2024, 1, 10)), WeekParity::Even);
        assert_eq!(ev.epoch(), date(2024, 1, 8));
    }

    #[test]
    fn test_different_days_never_intersect() {
        let ev = RecurrenceEvaluator::default();
        assert!(!ev.intersects(Weekday::Mon, Recurrence::Weekly, Weekday::Tue, Recurrence::Weekly));
        assert!(!ev.intersects(Weekday::Mon, even(), Weekday::Tue, even()));
        assert!(!ev.intersects(Weekday::Mon, Recurrence::Weekly, Weekday::Tue, odd()));
    }

    #[test]
    fn test_weekly_vs_weekly_same_day() {
        let ev = RecurrenceEvaluator::default();
        assert!(ev.intersects(Weekday::Wed, Recurrence::Weekly, Weekday::Wed, Recurrence::Weekly));
    }

    #[test]
    fn test_weekly_vs_biweekly_same_day() {
        let ev = RecurrenceEvaluator::default();
        assert!(ev.intersects(Weekday::Wed, Recurrence::Weekly, Weekday::Wed, odd()));
        assert!(ev.intersects(Weekday::Wed, even(), Weekday::Wed, Recurrence::Weekly));
    }

    #[test]
    fn test_biweekly_parity() {
        let ev = RecurrenceEvaluator::default();
        assert!(ev.intersects(Weekday::Fri, even(), Weekday::Fri, even()));
        assert!(ev.intersects(Weekday::Fri, odd(), Weekday::Fri, odd()));
        assert!(!ev.intersects(Weekday::Fri, even(), Weekday::Fri, odd()));
    }

    #[test]
    fn test_catchup_vs_weekly_weekday_alignment() {
        let ev = RecurrenceEvaluator::default();
        // 2025-03-10 is a Monday, 2025-03-11 a Tuesday.
        assert!(ev.intersects(Weekday::Mon, catchup(2025, 3, 10), Weekday::Mon, Recurrence::Weekly));
        assert!(!ev.intersects(Weekday::Mon, catchup(2025, 3, 11), Weekday::Mon, Recurrence::Weekly));
        // The catchup's declared day is ignored in favour of its date.
        assert!(ev.intersects(Weekday::Fri, catchup(2025, 3, 11), Weekday::Tue, Recurrence::Weekly));
    }

    #[test]
    fn test_catchup_vs_biweekly_parity() {
        let ev = RecurrenceEvaluator::default();
        // 2025-03-10: 434 days after the epoch, week 62, even.
        assert_eq!(ev.week_parity(date(2025, 3, 10)), WeekParity::Even);
        assert!(ev.intersects(Weekday::Mon, catchup(2025, 3, 10), Weekday::Mon, even()));
        assert!(!ev.intersects(Weekday::Mon, catchup(2025, 3, 10), Weekday::Mon, odd()));
        assert!(ev.intersects(Weekday::Mon, odd(), Weekday::Mon, catchup(2025, 3, 17)));
    }

    #[test]
    fn test_catchup_vs_catchup() {
        let ev = RecurrenceEvaluator::default();
        assert!(ev.intersects(Weekday::Mon, catchup(2025, 3, 10), Weekday::Mon, catchup(2025, 3, 10)));
        assert!(!ev.intersects(Weekday::Mon, catchup(2025, 3, 10), Weekday::Mon, catchup(2025, 3, 17)));
    }

    #[test]
    fn test_intersects_is_symmetric() {
        let ev = RecurrenceEvaluator::default();
        let patterns = [Recurrence::Weekly, even(), odd(), catchup(2025, 3, 10), catchup(2025, 3, 11)];
        let days = [Weekday::Mon, Weekday::Tue];
        for &a in &patterns {
            for &b in &patterns {
                for &da in &days {
                    for &db in &days {
                        assert_eq!(ev.intersects(da, a, db, b), ev.intersects(db, b, da, a));
                    }
                }
            }
        }
    }
}
