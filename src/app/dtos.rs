use serde::Serialize;
use crate::calendar::{self, CalendarDate, YearMonth, YearRange};
use crate::calendar::grid::Week;
use crate::db::entities::Comment;
use super::helpers;

// Everything the templates get to see. URLs are
// built here so the templates don't have to reach
// into parent contexts.

// Shared by every page, the layout uses it.
#[derive(Debug, Serialize)]
pub struct PageContext {
  pub auth_enabled: bool,
  pub logged_in: bool,
  pub username: String
}

#[derive(Debug, Serialize)]
pub struct MonthLink {
  pub year: i32,
  pub month: u32,
  pub name: &'static str,
  pub url: String,
  pub current: bool
}

impl MonthLink {
  pub fn new(ym: YearMonth, current: bool) -> Self {
    Self {
      year: ym.year,
      month: ym.month,
      name: ym.name(),
      url: helpers::month_url(&ym),
      current
    }
  }

  // None when the month isn't served.
  pub fn within(ym: YearMonth, range: &YearRange) -> Option<Self> {
    if range.contains(ym.year) {
      Some(Self::new(ym, false))
    } else {
      None
    }
  }
}

#[derive(Debug, Serialize)]
pub struct IndexView {
  pub context: PageContext,
  pub year: i32,
  pub month_name: &'static str,
  // False when the server date is outside of the
  // calendar years.
  pub in_range: bool,
  pub months: Vec<MonthLink>
}

impl IndexView {
  pub fn new(context: PageContext, today: &CalendarDate, range: &YearRange) -> Self {
    let months = (0..12u32)
      .map(|month| MonthLink::new(
        YearMonth { year: today.year, month },
        month == today.month
      ))
      .collect();
    Self {
      context,
      year: today.year,
      month_name: today.year_month().name(),
      in_range: range.contains(today.year),
      months
    }
  }
}

#[derive(Debug, Serialize)]
pub struct DayCell {
  pub day: Option<u32>,
  pub weekday: u32,
  pub today: bool,
  pub url: Option<String>
}

#[derive(Debug, Serialize)]
pub struct YmView {
  pub context: PageContext,
  pub year: i32,
  pub month: u32,
  pub month_name: &'static str,
  pub day_names: Vec<&'static str>,
  pub weeks: Vec<Vec<DayCell>>,
  pub previous: Option<MonthLink>,
  pub next: Option<MonthLink>
}

impl YmView {
  pub fn new(
    context: PageContext,
    ym: YearMonth,
    weeks: Vec<Week>,
    today: &CalendarDate,
    range: &YearRange
  ) -> Self {
    let weeks = weeks.iter()
      .map(|week| week.iter()
        .map(|cell| {
          let date = cell.day.map(|day| CalendarDate {
            year: ym.year,
            month: ym.month,
            day
          });
          DayCell {
            day: cell.day,
            weekday: cell.weekday,
            today: date.as_ref() == Some(today),
            url: date.as_ref().map(helpers::day_url)
          }
        })
        .collect()
      )
      .collect();
    Self {
      context,
      year: ym.year,
      month: ym.month,
      month_name: ym.name(),
      day_names: calendar::DAYS.to_vec(),
      weeks,
      previous: MonthLink::within(ym.previous(), range),
      next: MonthLink::within(ym.next(), range)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CommentView {
  pub id: i64,
  pub text: String,
  pub created_at: String,
  pub author: Option<String>,
  // Needed by the delete form:
  pub year: i32,
  pub month: u32,
  pub day: u32
}

#[derive(Debug, Serialize)]
pub struct DayView {
  pub context: PageContext,
  pub year: i32,
  pub month: u32,
  pub day: u32,
  pub month_name: &'static str,
  pub weekday_name: &'static str,
  pub month_url: String,
  pub comments: Vec<CommentView>
}

impl DayView {
  pub fn new(
    context: PageContext,
    date: &CalendarDate,
    comments: Vec<Comment>,
    show_authors: bool
  ) -> Self {
    let comments = comments.into_iter()
      .map(|c| CommentView {
        id: c.id,
        text: c.text,
        created_at: c.created_at.unwrap_or_default(),
        author: if show_authors { c.author } else { None },
        year: date.year,
        month: date.month,
        day: date.day
      })
      .collect();
    Self {
      context,
      year: date.year,
      month: date.month,
      day: date.day,
      month_name: date.year_month().name(),
      weekday_name: date.weekday_name(),
      month_url: helpers::month_url(&date.year_month()),
      comments
    }
  }
}

#[derive(Debug, Serialize)]
pub struct LoginView {
  pub context: PageContext,
  pub message: Option<&'static str>,
  pub username: String,
  pub username_missing: bool,
  pub password_missing: bool
}

#[derive(Debug, Default, Serialize)]
pub struct MissingPasswords {
  pub old: bool,
  pub new: bool,
  pub confirm: bool
}

impl MissingPasswords {
  pub fn any(&self) -> bool {
    self.old || self.new || self.confirm
  }
}

#[derive(Debug, Serialize)]
pub struct ChangePassView {
  pub context: PageContext,
  pub message: Option<&'static str>,
  pub missing: MissingPasswords
}

#[derive(Debug, Serialize)]
pub struct NotFoundView {
  pub context: PageContext
}
