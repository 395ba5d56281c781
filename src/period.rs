use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvariantViolation;

/// A calendar month for which payouts are computed.
///
/// Month and year are derived explicitly at construction time rather than by
/// a storage hook, so the derivation is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPayPeriod")]
pub struct PayPeriod {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPayPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPayPeriod> for PayPeriod {
    type Error = InvariantViolation;

    fn try_from(raw: RawPayPeriod) -> Result<Self, Self::Error> {
        PayPeriod::new(raw.year, raw.month)
    }
}

impl PayPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, InvariantViolation> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(InvariantViolation::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// The period a given date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("period validated at construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    pub fn num_days(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every calendar day of the month, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        (0..self.num_days()).map(move |offset| first + Duration::days(offset as i64))
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_invalid_month() {
        assert_eq!(
            PayPeriod::new(2025, 13),
            Err(InvariantViolation::InvalidPeriod {
                year: 2025,
                month: 13
            })
        );
        assert!(PayPeriod::new(2025, 0).is_err());
    }

    #[test]
    fn month_lengths_follow_calendar() {
        assert_eq!(PayPeriod::new(2024, 2).unwrap().num_days(), 29);
        assert_eq!(PayPeriod::new(2025, 2).unwrap().num_days(), 28);
        assert_eq!(PayPeriod::new(2025, 4).unwrap().num_days(), 30);
        assert_eq!(PayPeriod::new(2025, 12).unwrap().num_days(), 31);
        assert_eq!(PayPeriod::new(2025, 12).unwrap().last_day(), d(2025, 12, 31));
    }

    #[test]
    fn containing_derives_month_and_year() {
        let period = PayPeriod::containing(d(2025, 3, 17));
        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 3);
        assert!(period.contains(d(2025, 3, 1)));
        assert!(!period.contains(d(2025, 4, 1)));
    }

    #[test]
    fn days_cover_whole_month() {
        let days: Vec<_> = PayPeriod::new(2025, 6).unwrap().days().collect();
        assert_eq!(days.len(), 30);
        assert_eq!(days.first().copied(), Some(d(2025, 6, 1)));
        assert_eq!(days.last().copied(), Some(d(2025, 6, 30)));
    }

    #[test]
    fn deserialization_validates_month() {
        let ok: PayPeriod = serde_json::from_str(r#"{"year":2025,"month":3}"#).unwrap();
        assert_eq!(ok.to_string(), "2025-03");
        assert!(serde_json::from_str::<PayPeriod>(r#"{"year":2025,"month":14}"#).is_err());
    }
}
