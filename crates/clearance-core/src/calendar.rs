//! Business-day arithmetic for target dates and demurrage deadlines.
//!
//! The clearance process runs on a Sunday-to-Thursday work week (Friday
//! and Saturday are the weekend), adjustable through [`WorkWeek`] plus a
//! holiday set. All calculations take `today` as an explicit argument so
//! callers control the clock.

use std::collections::BTreeSet;

use jiff::civil::{Date, Weekday};
use jiff::Span;

use crate::models::DemurrageRisk;

/// Number of free business days at the port before demurrage accrues.
pub const DEMURRAGE_FREE_DAYS: i16 = 8;

/// Which weekdays count as working days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWeek {
    // indexed by Weekday::to_monday_zero_offset
    working: [bool; 7],
}

impl Default for WorkWeek {
    /// Sunday through Thursday.
    fn default() -> Self {
        let mut working = [true; 7];
        working[Weekday::Friday.to_monday_zero_offset() as usize] = false;
        working[Weekday::Saturday.to_monday_zero_offset() as usize] = false;
        Self { working }
    }
}

impl WorkWeek {
    /// Builds a work week from the listed working days.
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut working = [false; 7];
        for day in days {
            working[day.to_monday_zero_offset() as usize] = true;
        }
        Self { working }
    }

    pub fn is_working(&self, day: Weekday) -> bool {
        self.working[day.to_monday_zero_offset() as usize]
    }
}

/// Work week plus holiday exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessCalendar {
    work_week: WorkWeek,
    holidays: BTreeSet<Date>,
}

impl BusinessCalendar {
    pub fn new(work_week: WorkWeek) -> Self {
        Self {
            work_week,
            holidays: BTreeSet::new(),
        }
    }

    pub fn with_holidays<I: IntoIterator<Item = Date>>(mut self, holidays: I) -> Self {
        self.holidays.extend(holidays);
        self
    }

    pub fn add_holiday(&mut self, date: Date) {
        self.holidays.insert(date);
    }

    pub fn is_business_day(&self, date: Date) -> bool {
        self.work_week.is_working(date.weekday()) && !self.holidays.contains(&date)
    }

    /// A step's target date: `offset` business days from the ETA.
    /// Offset zero is the ETA day itself, even when it falls on a
    /// weekend; the vessel does not wait for office hours.
    pub fn target_date(&self, eta: Date, offset: i16) -> Date {
        if offset == 0 {
            return eta;
        }
        let step = if offset > 0 { 1 } else { -1 };
        let mut remaining = offset.abs();
        let mut current = eta;
        while remaining > 0 {
            current = current.saturating_add(Span::new().days(step));
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    /// Signed count of business days in the half-open range `(from, to]`.
    /// Inverse of [`Self::target_date`]: for any offset `n`,
    /// `business_days_between(eta, target_date(eta, n)) == n` when the
    /// endpoint lands on a business day.
    pub fn business_days_between(&self, from: Date, to: Date) -> i16 {
        if from == to {
            return 0;
        }
        let (start, end, sign) = if from < to {
            (from, to, 1)
        } else {
            (to, from, -1)
        };
        let mut count = 0;
        let mut current = start;
        while current < end {
            current = current.saturating_add(Span::new().days(1));
            if self.is_business_day(current) {
                count += 1;
            }
        }
        count * sign
    }

    /// Whether a deadline has been missed: the reference date (actual
    /// completion, or today for open steps) is strictly after the target.
    pub fn is_overdue(&self, target: Date, actual: Option<Date>, today: Date) -> bool {
        actual.unwrap_or(today) > target
    }

    /// Whether a deadline is at most one business day away.
    pub fn is_due_soon(&self, target: Date, today: Date) -> bool {
        if today > target {
            return false;
        }
        self.business_days_between(today, target) <= 1
    }

    /// Last day of the free storage period at the port.
    pub fn demurrage_deadline(&self, eta: Date) -> Date {
        self.target_date(eta, DEMURRAGE_FREE_DAYS)
    }

    /// Demurrage exposure for a shipment. Once goods are collected the
    /// question is settled: either the free period was blown or it
    /// was not.
    pub fn demurrage_risk(&self, eta: Date, collected: Option<Date>, today: Date) -> DemurrageRisk {
        if let Some(collected) = collected {
            return if self.business_days_between(eta, collected) >= DEMURRAGE_FREE_DAYS {
                DemurrageRisk::Critical
            } else {
                DemurrageRisk::None
            };
        }
        let deadline = self.demurrage_deadline(eta);
        if today > deadline {
            return DemurrageRisk::Critical;
        }
        match self.business_days_between(today, deadline) {
            0 => DemurrageRisk::High,
            1 => DemurrageRisk::Medium,
            2 => DemurrageRisk::Low,
            _ => DemurrageRisk::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    // 2026-03-01 is a Sunday.

    #[test]
    fn friday_and_saturday_are_weekend_by_default() {
        let cal = BusinessCalendar::default();
        assert!(cal.is_business_day(date(2026, 3, 1))); // Sun
        assert!(cal.is_business_day(date(2026, 3, 5))); // Thu
        assert!(!cal.is_business_day(date(2026, 3, 6))); // Fri
        assert!(!cal.is_business_day(date(2026, 3, 7))); // Sat
    }

    #[test]
    fn target_date_skips_the_weekend() {
        let cal = BusinessCalendar::default();
        // Thursday + 1 business day lands on Sunday
        assert_eq!(cal.target_date(date(2026, 3, 5), 1), date(2026, 3, 8));
        // Sunday - 1 business day lands on Thursday
        assert_eq!(cal.target_date(date(2026, 3, 8), -1), date(2026, 3, 5));
    }

    #[test]
    fn offset_zero_is_the_eta_day_even_on_a_weekend() {
        let cal = BusinessCalendar::default();
        let friday = date(2026, 3, 6);
        assert_eq!(cal.target_date(friday, 0), friday);
    }

    #[test]
    fn holidays_push_target_dates_out() {
        let cal = BusinessCalendar::default().with_holidays([date(2026, 3, 8)]);
        assert_eq!(cal.target_date(date(2026, 3, 5), 1), date(2026, 3, 9));
    }

    #[test]
    fn long_negative_offsets_count_only_work_days() {
        let cal = BusinessCalendar::default();
        // 19 business days before Monday 2025-01-20, crossing year end
        assert_eq!(cal.target_date(date(2025, 1, 20), -19), date(2024, 12, 24));
        assert_eq!(
            cal.business_days_between(date(2024, 12, 24), date(2025, 1, 20)),
            19
        );
    }

    #[test]
    fn business_days_between_inverts_target_date() {
        let cal = BusinessCalendar::default().with_holidays([date(2026, 3, 10)]);
        let eta = date(2026, 3, 1);
        for offset in [-10, -3, -1, 1, 3, 8, 10] {
            let target = cal.target_date(eta, offset);
            assert_eq!(cal.business_days_between(eta, target), offset, "offset {offset}");
        }
        assert_eq!(cal.business_days_between(eta, eta), 0);
    }

    #[test]
    fn overdue_uses_completion_date_when_present() {
        let cal = BusinessCalendar::default();
        let target = date(2026, 3, 5);
        assert!(cal.is_overdue(target, None, date(2026, 3, 6)));
        assert!(!cal.is_overdue(target, None, date(2026, 3, 5)));
        // completed on time, checked later
        assert!(!cal.is_overdue(target, Some(date(2026, 3, 4)), date(2026, 3, 20)));
        assert!(cal.is_overdue(target, Some(date(2026, 3, 9)), date(2026, 3, 20)));
    }

    #[test]
    fn due_soon_spans_at_most_one_business_day() {
        let cal = BusinessCalendar::default();
        let target = date(2026, 3, 8); // Sunday
        assert!(cal.is_due_soon(target, date(2026, 3, 8)));
        // Thursday before: weekend in between, still one business day
        assert!(cal.is_due_soon(target, date(2026, 3, 5)));
        assert!(!cal.is_due_soon(target, date(2026, 3, 4)));
        assert!(!cal.is_due_soon(target, date(2026, 3, 9)));
    }

    #[test]
    fn demurrage_risk_escalates_toward_the_deadline() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 3, 1); // Sunday
        let deadline = cal.demurrage_deadline(eta);
        assert_eq!(deadline, date(2026, 3, 11));
        assert_eq!(cal.demurrage_risk(eta, None, date(2026, 3, 4)), DemurrageRisk::None);
        assert_eq!(cal.demurrage_risk(eta, None, date(2026, 3, 9)), DemurrageRisk::Low);
        assert_eq!(cal.demurrage_risk(eta, None, date(2026, 3, 10)), DemurrageRisk::Medium);
        assert_eq!(cal.demurrage_risk(eta, None, date(2026, 3, 11)), DemurrageRisk::High);
        assert_eq!(cal.demurrage_risk(eta, None, date(2026, 3, 12)), DemurrageRisk::Critical);
    }

    #[test]
    fn collected_goods_settle_demurrage_risk() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 3, 1);
        let today = date(2026, 4, 1);
        assert_eq!(
            cal.demurrage_risk(eta, Some(date(2026, 3, 10)), today),
            DemurrageRisk::None
        );
        // Collection on the deadline day itself burns the whole free period.
        let deadline = cal.demurrage_deadline(eta);
        assert_eq!(
            cal.demurrage_risk(eta, Some(deadline), today),
            DemurrageRisk::Critical
        );
        assert_eq!(
            cal.demurrage_risk(eta, Some(date(2026, 3, 15)), today),
            DemurrageRisk::Critical
        );
    }

    #[test]
    fn custom_work_week_respects_listed_days() {
        let week = WorkWeek::from_days(&[
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ]);
        let cal = BusinessCalendar::new(week);
        assert!(cal.is_business_day(date(2026, 3, 6))); // Fri
        assert!(!cal.is_business_day(date(2026, 3, 8))); // Sun
    }
}
