use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use super::YearMonth;

// One cell of the month page. Padding cells
// belong to the previous or next month and have
// no day number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridDay {
  pub day: Option<u32>,
  pub weekday: u32
}

pub type Week = [GridDay; 7];

/**
 * Weeks of the month, Monday first. The first and
 * last weeks are padded so every week has seven
 * cells.
 */
pub fn month_grid(ym: YearMonth) -> Vec<Week> {
  let offset = NaiveDate::from_ymd_opt(ym.year, ym.month + 1, 1)
    .map(|d| d.weekday().num_days_from_monday())
    .unwrap_or(0);
  let days = ym.days();

  let mut weeks: Vec<Week> = Vec::with_capacity(6);
  let mut cell: u32 = 0;
  // Day number shown in that cell, if it's inside the month:
  let day_at = |cell: u32| -> Option<u32> {
    if cell < offset || cell - offset >= days {
      None
    } else {
      Some(cell - offset + 1)
    }
  };
  while cell < offset + days {
    let mut week = [GridDay { day: None, weekday: 0 }; 7];
    for (weekday, slot) in week.iter_mut().enumerate() {
      *slot = GridDay {
        day: day_at(cell),
        weekday: weekday as u32
      };
      cell += 1;
    }
    weeks.push(week);
  }
  weeks
}

#[cfg(test)]
mod tests {
  use super::*;

  fn days_of(week: &Week) -> Vec<Option<u32>> {
    week.iter().map(|d| d.day).collect()
  }

  #[test]
  fn march_2020_starts_on_sunday() {
    let weeks = month_grid(YearMonth { year: 2020, month: 2 });
    assert_eq!(weeks.len(), 6);
    assert_eq!(
      days_of(&weeks[0]),
      vec![None, None, None, None, None, None, Some(1)]
    );
    assert_eq!(
      days_of(&weeks[5]),
      vec![Some(30), Some(31), None, None, None, None, None]
    );
    let count = weeks.iter()
      .flat_map(|w| w.iter())
      .filter(|d| d.day.is_some())
      .count();
    assert_eq!(count, 31);
  }

  #[test]
  fn february_2010_fits_four_weeks() {
    // 1 February 2010 was a Monday and the month
    // has 28 days.
    let weeks = month_grid(YearMonth { year: 2010, month: 1 });
    assert_eq!(weeks.len(), 4);
    assert_eq!(weeks[0][0].day, Some(1));
    assert_eq!(weeks[3][6].day, Some(28));
  }

  #[test]
  fn weekday_indices_are_monday_first() {
    let weeks = month_grid(YearMonth { year: 2016, month: 1 });
    for week in &weeks {
      let indices: Vec<u32> = week.iter().map(|d| d.weekday).collect();
      assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
    }
    // 29 February 2016 was a Monday.
    let last = weeks.last().unwrap();
    assert_eq!(last[0].day, Some(29));
  }
}
