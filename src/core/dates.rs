use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accepted textual date layouts, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Day-count convention used to turn a date interval into a year fraction.
///
/// Defaults to Actual/365 Fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DayCount {
    #[default]
    Actual365Fixed,
    Actual360,
}

impl DayCount {
    /// Days in the year denominator.
    pub fn basis(self) -> f64 {
        match self {
            DayCount::Actual365Fixed => 365.0,
            DayCount::Actual360 => 360.0,
        }
    }

    /// Calendar days between `start` and `end`, over the basis.
    ///
    /// Negative when `end` is before `start`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pricing_risk_engine::core::dates::DayCount;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    /// assert_eq!(DayCount::Actual365Fixed.year_fraction(start, end), 100.0 / 365.0);
    /// ```
    pub fn year_fraction(self, start: NaiveDate, end: NaiveDate) -> f64 {
        (end - start).num_days() as f64 / self.basis()
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayCount::Actual365Fixed => write!(f, "ACT/365F"),
            DayCount::Actual360 => write!(f, "ACT/360"),
        }
    }
}

impl FromStr for DayCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "act365" | "act/365" | "act/365f" | "actual365fixed" => Ok(DayCount::Actual365Fixed),
            "act360" | "act/360" | "actual360" => Ok(DayCount::Actual360),
            other => Err(format!("unknown day count '{other}', expected act365 or act360")),
        }
    }
}

/// Parse a date written as `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_fraction_act365() {
        let yf = DayCount::Actual365Fixed.year_fraction(date(2023, 1, 1), date(2024, 1, 1));
        assert!((yf - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_year_fraction_act360() {
        let yf = DayCount::Actual360.year_fraction(date(2023, 1, 1), date(2023, 3, 2));
        assert!((yf - 60.0 / 360.0).abs() < 1e-12);
    }

    #[test]
    fn test_year_fraction_negative_when_reversed() {
        assert!(DayCount::default().year_fraction(date(2024, 2, 1), date(2024, 1, 1)) < 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("15/03/2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date(" 2024-03-15 "), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("March 15"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_day_count_from_str() {
        assert_eq!("act365".parse::<DayCount>(), Ok(DayCount::Actual365Fixed));
        assert_eq!("ACT/360".parse::<DayCount>(), Ok(DayCount::Actual360));
        assert!("30/360".parse::<DayCount>().is_err());
    }
}
