/*
 * Everything about which dates the calendar
 * accepts. Months are zero-based (0 is January)
 * everywhere outside of this module, that's what
 * the URLs and the stored comment dates use.
 */

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::num::IntErrorKind;
pub mod grid;

pub const DEFAULT_MIN_YEAR: i32 = 1990;
pub const DEFAULT_MAX_YEAR: i32 = 2020;

pub const MONTHS: [&'static str; 12] = [
  "January", "February", "March", "April", "May", "June", "July",
  "August", "September", "October", "November", "December"
];
pub const DAYS: [&'static str; 7] = [
  "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
  "Sunday"
];

#[derive(Debug, PartialEq, Eq)]
pub enum DateError {
  // Missing or not a number at all:
  Malformed,
  // A number, but not a date we serve:
  OutOfRange
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
  pub min: i32,
  pub max: i32
}

impl YearRange {
  pub fn new(min: i32, max: i32) -> Self {
    Self { min, max }
  }

  pub fn contains(&self, year: i32) -> bool {
    year >= self.min && year <= self.max
  }
}

impl Default for YearRange {
  fn default() -> Self {
    Self::new(DEFAULT_MIN_YEAR, DEFAULT_MAX_YEAR)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
  pub year: i32,
  // Zero-based.
  pub month: u32
}

impl YearMonth {

  pub fn name(&self) -> &'static str {
    MONTHS[self.month as usize]
  }

  pub fn days(&self) -> u32 {
    days_in_month(self.year, self.month + 1)
  }

  // Wraps around the year boundary. The caller
  // checks the year range.
  pub fn previous(&self) -> YearMonth {
    if self.month == 0 {
      YearMonth { year: self.year - 1, month: 11 }
    } else {
      YearMonth { year: self.year, month: self.month - 1 }
    }
  }

  pub fn next(&self) -> YearMonth {
    if self.month == 11 {
      YearMonth { year: self.year + 1, month: 0 }
    } else {
      YearMonth { year: self.year, month: self.month + 1 }
    }
  }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
  pub year: i32,
  // Zero-based.
  pub month: u32,
  pub day: u32
}

impl CalendarDate {

  pub fn year_month(&self) -> YearMonth {
    YearMonth { year: self.year, month: self.month }
  }

  /// Key used in the `date` column of the comments
  /// table. The month stays zero-based, old rows
  /// were written that way.
  pub fn storage_key(&self) -> String {
    format!("{}.{}.{}", self.day, self.month, self.year)
  }

  /// Monday is 0.
  pub fn weekday(&self) -> usize {
    // Validated dates always exist, the fallback
    // is never used.
    NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)
      .map(|d| d.weekday().num_days_from_monday() as usize)
      .unwrap_or(0)
  }

  pub fn weekday_name(&self) -> &'static str {
    DAYS[self.weekday()]
  }

}

impl fmt::Display for CalendarDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} {}", self.day, MONTHS[self.month as usize], self.year)
  }
}

pub fn is_leap_year(year: i32) -> bool {
  (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Month is one-based here. Returns 0 for a month
/// that doesn't exist.
pub fn days_in_month(year: i32, month: u32) -> u32 {
  match month {
    1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
    4 | 6 | 9 | 11 => 30,
    2 => if is_leap_year(year) { 29 } else { 28 },
    _ => 0
  }
}

// Numbers too big for an i64 are still numbers,
// they just never fall in range.
enum Number {
  Value(i64),
  Huge
}

impl Number {
  fn within(&self, min: i64, max: i64) -> Option<i64> {
    match *self {
      Number::Value(n) if n >= min && n <= max => Some(n),
      _ => None
    }
  }
}

fn parse_number(value: Option<&str>) -> Result<Number, DateError> {
  let value = value.map(str::trim).ok_or(DateError::Malformed)?;
  match value.parse::<i64>() {
    Ok(n) => Ok(Number::Value(n)),
    Err(e) => match e.kind() {
      IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Ok(Number::Huge),
      _ => Err(DateError::Malformed)
    }
  }
}

pub fn parse_year_month(
  range: &YearRange,
  year: Option<&str>,
  month: Option<&str>
) -> Result<YearMonth, DateError> {
  let year = parse_number(year)?;
  let month = parse_number(month)?;
  match (
    year.within(i64::from(range.min), i64::from(range.max)),
    month.within(0, 11)
  ) {
    (Some(year), Some(month)) => Ok(YearMonth {
      year: year as i32,
      month: month as u32
    }),
    _ => Err(DateError::OutOfRange)
  }
}

pub fn parse_date(
  range: &YearRange,
  year: Option<&str>,
  month: Option<&str>,
  day: Option<&str>
) -> Result<CalendarDate, DateError> {
  // All three have to be numbers before any range
  // check happens:
  let day = parse_number(day)?;
  let ym = parse_year_month(range, year, month)?;
  let day = day.within(1, i64::from(ym.days()))
    .ok_or(DateError::OutOfRange)?;
  Ok(CalendarDate {
    year: ym.year,
    month: ym.month,
    day: day as u32
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn s(v: &str) -> Option<&str> {
    Some(v)
  }

  #[test]
  fn days_in_month_matches_chrono_for_whole_range() {
    for year in DEFAULT_MIN_YEAR..=DEFAULT_MAX_YEAR {
      for month in 1..=12u32 {
        let first = NaiveDate::from_ymd(year, month, 1);
        let next = if month == 12 {
          NaiveDate::from_ymd(year + 1, 1, 1)
        } else {
          NaiveDate::from_ymd(year, month + 1, 1)
        };
        let expected = next.signed_duration_since(first).num_days() as u32;
        assert_eq!(days_in_month(year, month), expected, "{}-{}", year, month);
      }
    }
  }

  #[test]
  fn leap_februaries() {
    assert_eq!(days_in_month(2000, 2), 29);
    assert_eq!(days_in_month(2016, 2), 29);
    assert_eq!(days_in_month(2019, 2), 28);
    assert_eq!(days_in_month(1900, 2), 28);
  }

  #[test]
  fn years_outside_range_are_out_of_range() {
    let range = YearRange::default();
    assert_eq!(parse_date(&range, s("1989"), s("0"), s("1")), Err(DateError::OutOfRange));
    assert_eq!(parse_date(&range, s("2021"), s("5"), s("10")), Err(DateError::OutOfRange));
    // Even nonsense months don't matter there:
    assert_eq!(parse_year_month(&range, s("3000"), s("40")), Err(DateError::OutOfRange));
  }

  #[test]
  fn missing_or_non_numeric_is_malformed() {
    let range = YearRange::default();
    assert_eq!(parse_year_month(&range, None, s("1")), Err(DateError::Malformed));
    assert_eq!(parse_year_month(&range, s("2010"), s("march")), Err(DateError::Malformed));
    assert_eq!(parse_date(&range, s("2010"), s("1"), None), Err(DateError::Malformed));
    // Malformed wins over out of range:
    assert_eq!(parse_date(&range, s("1800"), s("1"), s("x")), Err(DateError::Malformed));
  }

  #[test]
  fn huge_numbers_are_out_of_range() {
    let range = YearRange::default();
    assert_eq!(parse_year_month(&range, s("99999999999"), s("0")), Err(DateError::OutOfRange));
    assert_eq!(parse_year_month(&range, s("2147483648"), s("0")), Err(DateError::OutOfRange));
    assert_eq!(
      parse_date(&range, s("2010"), s("99999999999999999999"), s("1")),
      Err(DateError::OutOfRange)
    );
    assert_eq!(
      parse_date(&range, s("2010"), s("0"), s("-99999999999999999999")),
      Err(DateError::OutOfRange)
    );
    // Still a number, so a broken year is what counts:
    assert_eq!(
      parse_date(&range, s("abc"), s("0"), s("99999999999999999999")),
      Err(DateError::Malformed)
    );
  }

  #[test]
  fn day_bound_uses_one_based_month() {
    let range = YearRange::default();
    // Month 1 is February.
    assert!(parse_date(&range, s("2016"), s("1"), s("29")).is_ok());
    assert_eq!(parse_date(&range, s("2015"), s("1"), s("29")), Err(DateError::OutOfRange));
    assert!(parse_date(&range, s("2015"), s("0"), s("31")).is_ok());
    assert_eq!(parse_date(&range, s("2015"), s("10"), s("31")), Err(DateError::OutOfRange));
    assert_eq!(parse_date(&range, s("2015"), s("12"), s("1")), Err(DateError::OutOfRange));
    assert_eq!(parse_date(&range, s("2015"), s("-1"), s("1")), Err(DateError::OutOfRange));
    assert_eq!(parse_date(&range, s("2015"), s("3"), s("0")), Err(DateError::OutOfRange));
  }

  #[test]
  fn values_are_trimmed() {
    let range = YearRange::default();
    let date = parse_date(&range, s(" 2012 "), s("4"), s("17\n")).unwrap();
    assert_eq!(date, CalendarDate { year: 2012, month: 4, day: 17 });
  }

  #[test]
  fn configured_range_is_honored() {
    let range = YearRange::new(2020, 2030);
    assert!(parse_year_month(&range, s("2026"), s("9")).is_ok());
    assert_eq!(parse_year_month(&range, s("2019"), s("9")), Err(DateError::OutOfRange));
  }

  #[test]
  fn storage_key_keeps_zero_based_month() {
    let date = CalendarDate { year: 2016, month: 1, day: 29 };
    assert_eq!(date.storage_key(), "29.1.2016");
  }

  #[test]
  fn weekday_of_requested_date() {
    // 1 March 2020 was a Sunday.
    let date = CalendarDate { year: 2020, month: 2, day: 1 };
    assert_eq!(date.weekday(), 6);
    assert_eq!(date.weekday_name(), "Sunday");
    assert_eq!(date.to_string(), "1 March 2020");
  }

  #[test]
  fn month_navigation_wraps_years() {
    let january = YearMonth { year: 2000, month: 0 };
    assert_eq!(january.previous(), YearMonth { year: 1999, month: 11 });
    assert_eq!(january.previous().next(), january);
    assert_eq!(YearMonth { year: 2000, month: 7 }.name(), "August");
    assert_eq!(YearMonth { year: 2000, month: 8 }.name(), "September");
  }
}
