use serde::{Deserialize, Serialize};

// Plain rows, the handlers convert them
// into view objects for the templates.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  // SQLite rowid.
  pub id: i64,
  pub text: String,
  // Formatted as "day.month.year", see
  // CalendarDate::storage_key.
  pub date: String,
  // Filled in by the insert trigger, could
  // be missing on very old rows.
  pub created_at: Option<String>,
  pub author_id: Option<i64>,
  // Joined from the users table:
  pub author: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub password_hash: String,
  pub created_at: Option<String>
}
