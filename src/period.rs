use crate::error::{Result, ShrinkageError};
use crate::utils::last_day_of_month;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month used as the reporting period.
///
/// Ordering is chronological: year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Fails unless the month is 1..=12 and its first day is a representable date.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ShrinkageError::InvalidPeriod(format!(
                "month {} out of range for year {}",
                month, year
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ShrinkageError::InvalidPeriod(format!(
                "year {} is outside the supported calendar range",
                year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
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
        // year/month are validated at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date, which is truncated to its month.
impl FromStr for Period {
    type Err = ShrinkageError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::of(date));
        }

        let (year, month) = s.split_once('-').ok_or_else(|| {
            ShrinkageError::InvalidPeriod(format!("'{}': expected YYYY-MM or YYYY-MM-DD", s))
        })?;
        let year: i32 = year
            .parse()
            .map_err(|_| ShrinkageError::InvalidPeriod(format!("'{}': bad year", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ShrinkageError::InvalidPeriod(format!("'{}': bad month", s)))?;
        Self::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_and_day_forms() {
        let month: Period = "2011-12".parse().unwrap();
        let day: Period = "2011-12-25".parse().unwrap();
        assert_eq!(month, day);
        assert_eq!(month.year(), 2011);
        assert_eq!(month.month(), 12);
        assert_eq!(month.to_string(), "2011-12");
    }

    #[test]
    fn test_single_digit_month_is_padded() {
        let period: Period = "2006-1".parse().unwrap();
        assert_eq!(period.to_string(), "2006-01");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("2011".parse::<Period>().is_err());
        assert!("2011-13".parse::<Period>().is_err());
        assert!("abcd-01".parse::<Period>().is_err());
    }

    #[test]
    fn test_ordering_crosses_year_boundary() {
        let dec = Period::new(2011, 12).unwrap();
        let jan = Period::new(2012, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_rejects_years_outside_calendar_range() {
        assert!(matches!(
            Period::new(300_000, 1),
            Err(ShrinkageError::InvalidPeriod(_))
        ));
        assert!("300000-01".parse::<Period>().is_err());
        assert!(Period::new(-300_000, 6).is_err());
    }

    #[test]
    fn test_bounds() {
        let feb = Period::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(Period::of(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()), feb);
    }

    #[test]
    fn test_serde_as_string() {
        let period = Period::new(2015, 7).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2015-07\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }
}
