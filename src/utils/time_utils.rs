use chrono::{Datelike, Local};
use crate::calendar::CalendarDate;

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

// Today according to the server clock, with the
// zero-based month the rest of the app uses.
// Not range checked, today might well be outside
// of the years the calendar serves.
pub fn today() -> CalendarDate {
  let now = Local::now().naive_local().date();
  CalendarDate {
    year: now.year(),
    month: now.month0(),
    day: now.day()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn today_uses_zero_based_month() {
    let date = today();
    let now = Local::now().naive_local().date();
    // Could flip at midnight but that's very unlikely.
    assert_eq!(date.month + 1, now.month());
    assert!(date.day >= 1 && date.day <= 31);
  }
}
