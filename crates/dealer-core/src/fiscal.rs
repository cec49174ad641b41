//! # Financial Year
//!
//! Document numbers restart every financial year, so every numbered document
//! needs the financial year its date falls in.
//!
//! ```text
//! start month = April (default)
//!
//!   2024-04-01 ─────────────── 2025-03-31   → "2024-25"
//!   2025-04-01 ─────────────── 2026-03-31   → "2025-26"
//!
//! start month = January
//!
//!   2025-01-01 ─────────────── 2025-12-31   → "2025"
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A financial year, identified by the calendar year it starts in and the
/// month it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinancialYear {
    start_year: i32,
    start_month: u32,
}

impl FinancialYear {
    /// Returns the financial year that contains `date`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use dealer_core::fiscal::FinancialYear;
    ///
    /// let march = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    /// let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    /// assert_eq!(FinancialYear::containing(march, 4).unwrap().label(), "2024-25");
    /// assert_eq!(FinancialYear::containing(april, 4).unwrap().label(), "2025-26");
    /// ```
    pub fn containing(date: NaiveDate, start_month: u32) -> Result<Self, ValidationError> {
        validate_start_month(start_month)?;

        let start_year = if date.month() >= start_month {
            date.year()
        } else {
            date.year() - 1
        };

        Ok(FinancialYear {
            start_year,
            start_month,
        })
    }

    /// Parses a label produced by [`FinancialYear::label`].
    ///
    /// Accepts `"2024-25"` for split years and `"2024"` for calendar years.
    pub fn parse(label: &str, start_month: u32) -> Result<Self, ValidationError> {
        validate_start_month(start_month)?;

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "financial_year".to_string(),
            reason: reason.to_string(),
        };

        let label = label.trim();
        let (first, second) = match label.split_once('-') {
            Some((a, b)) => (a, Some(b)),
            None => (label, None),
        };

        let start_year: i32 = first
            .parse()
            .map_err(|_| invalid("expected a four digit start year"))?;
        if first.len() != 4 {
            return Err(invalid("expected a four digit start year"));
        }

        let fy = FinancialYear {
            start_year,
            start_month,
        };

        match (start_month, second) {
            (1, None) => Ok(fy),
            (1, Some(_)) => Err(invalid("calendar financial years have no suffix")),
            (_, None) => Err(invalid("expected a label like 2024-25")),
            (_, Some(suffix)) => {
                let expected = format!("{:02}", (start_year + 1).rem_euclid(100));
                if suffix == expected {
                    Ok(fy)
                } else {
                    Err(invalid("end year must follow the start year"))
                }
            }
        }
    }

    /// Calendar year the financial year starts in.
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// First day of the financial year.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the financial year.
    pub fn end_date(&self) -> NaiveDate {
        self.next()
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// The following financial year.
    pub fn next(&self) -> Self {
        FinancialYear {
            start_year: self.start_year + 1,
            start_month: self.start_month,
        }
    }

    /// Whether `date` falls inside this financial year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Label used in document numbers and counters.
    pub fn label(&self) -> String {
        if self.start_month == 1 {
            self.start_year.to_string()
        } else {
            format!(
                "{}-{:02}",
                self.start_year,
                (self.start_year + 1).rem_euclid(100)
            )
        }
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn validate_start_month(start_month: u32) -> Result<(), ValidationError> {
    if !(1..=12).contains(&start_month) {
        return Err(ValidationError::OutOfRange {
            field: "financial year start month".to_string(),
            min: 1,
            max: 12,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_april_boundary() {
        let fy = FinancialYear::containing(date(2025, 3, 31), 4).unwrap();
        assert_eq!(fy.label(), "2024-25");
        assert_eq!(fy.start_date(), date(2024, 4, 1));
        assert_eq!(fy.end_date(), date(2025, 3, 31));

        let fy = FinancialYear::containing(date(2025, 4, 1), 4).unwrap();
        assert_eq!(fy.label(), "2025-26");
    }

    #[test]
    fn test_century_rollover_label() {
        let fy = FinancialYear::containing(date(2099, 12, 1), 4).unwrap();
        assert_eq!(fy.label(), "2099-00");
    }

    #[test]
    fn test_calendar_year() {
        let fy = FinancialYear::containing(date(2025, 1, 1), 1).unwrap();
        assert_eq!(fy.label(), "2025");
        assert_eq!(fy.end_date(), date(2025, 12, 31));
    }

    #[test]
    fn test_contains() {
        let fy = FinancialYear::containing(date(2024, 10, 10), 4).unwrap();
        assert!(fy.contains(date(2024, 4, 1)));
        assert!(fy.contains(date(2025, 3, 31)));
        assert!(!fy.contains(date(2025, 4, 1)));
        assert!(!fy.contains(date(2024, 3, 31)));
    }

    #[test]
    fn test_parse_round_trips_label() {
        let fy = FinancialYear::parse("2024-25", 4).unwrap();
        assert_eq!(fy.start_date(), date(2024, 4, 1));
        assert_eq!(FinancialYear::parse("2025", 1).unwrap().label(), "2025");
    }

    #[test]
    fn test_parse_rejects_bad_labels() {
        assert!(FinancialYear::parse("2024-26", 4).is_err());
        assert!(FinancialYear::parse("24-25", 4).is_err());
        assert!(FinancialYear::parse("2024", 4).is_err());
        assert!(FinancialYear::parse("2024-25", 1).is_err());
        assert!(FinancialYear::parse("abcd-ef", 4).is_err());
    }

    #[test]
    fn test_invalid_start_month() {
        assert!(FinancialYear::containing(date(2024, 1, 1), 0).is_err());
        assert!(FinancialYear::containing(date(2024, 1, 1), 13).is_err());
    }
}
