use rusqlite::{params, OptionalExtension, Row, ToSql, Transaction};
pub mod entities;
mod mappers;
use eyre::{WrapErr, eyre};
use color_eyre::Result;
use log::{debug, error};
use entities::*;
use mappers::{map_comment, map_user};

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

// Table names are the ones the calendar has always
// used, old databases have to keep working.
const SCHEMA: &'static str = "
  CREATE TABLE IF NOT EXISTS vaktplan (
    comment TEXT,
    date TEXT,
    cdate DATE,
    user INTEGER
  );
  CREATE TRIGGER IF NOT EXISTS insert_date_created AFTER INSERT ON vaktplan
  BEGIN
    UPDATE vaktplan SET cdate = datetime('now') WHERE rowid = new.rowid;
  END;
  CREATE TABLE IF NOT EXISTS users (user TEXT, password TEXT, cdate DATE);
  CREATE TRIGGER IF NOT EXISTS insert_date_user_created AFTER INSERT ON users
  BEGIN
    UPDATE users SET cdate = datetime('now') WHERE rowid = new.rowid;
  END;
";

const SELECT_COMMENTS: &'static str = "
  SELECT vaktplan.rowid, vaktplan.comment, vaktplan.date, vaktplan.cdate,
  vaktplan.user, users.user
  FROM vaktplan LEFT JOIN users ON users.rowid = vaktplan.user";

pub fn init_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)
    .context("Creating the database schema")
}

fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: IntoIterator,
    P::Item: ToSql,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

// Every write goes through here: one statement per
// transaction, committed when the closure succeeds and
// rolled back otherwise. The error is passed on to the
// caller, nothing is retried.
fn with_transaction<T, F>(
  pool: &Pool,
  description: &'static str,
  operation: F
) -> Result<T>
  where
    F: FnOnce(&Transaction) -> Result<T, rusqlite::Error>
{
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  match operation(&tx) {
    Ok(value) => {
      tx.commit().context(description)?;
      Ok(value)
    },
    Err(e) => {
      error!("{} failed, rolling back - {}", description, e);
      if let Err(rollback_error) = tx.rollback() {
        error!("Rollback failed too - {}", rollback_error);
      }
      Err(e).context(description)
    }
  }
}

pub fn comments_by_date(
  pool: &Pool,
  date_key: &str
) -> Result<Vec<Comment>> {
  // Ordering by rowid is insertion order.
  select_many(
    pool,
    &format!("{} WHERE vaktplan.date = ? ORDER BY vaktplan.rowid ASC", SELECT_COMMENTS),
    params![date_key],
    map_comment
  )
}

#[cfg(test)]
pub fn comment_by_id(
  pool: &Pool,
  id: i64
) -> Result<Option<Comment>> {
  let conn = pool.get()?;
  let mut stmt = conn.prepare(
    &format!("{} WHERE vaktplan.rowid = ?", SELECT_COMMENTS)
  )?;
  stmt.query_row(params![id], map_comment)
    .optional()
    .context("Fetching comment by id")
}

/// Returns the rowid of the new comment. The creation
/// date is set by the database trigger.
pub fn insert_comment(
  pool: &Pool,
  date_key: &str,
  text: &str,
  author_id: Option<i64>
) -> Result<i64> {
  if text.is_empty() {
    return Err(eyre!("Refusing to store an empty comment"));
  }
  debug!("Inserting comment for {}", date_key);
  with_transaction(pool, "Inserting comment", |tx| {
    tx.execute(
      "INSERT INTO vaktplan (comment, date, user) VALUES (?, ?, ?)",
      params![text, date_key, author_id]
    )?;
    Ok(tx.last_insert_rowid())
  })
}

/// Deleting an id that doesn't exist is not an error.
/// When an owner is given, comments of other users are
/// left alone. Comments without an owner can always be
/// deleted.
pub fn delete_comment(
  pool: &Pool,
  id: i64,
  owner: Option<i64>
) -> Result<()> {
  let deleted = with_transaction(pool, "Deleting comment", |tx| {
    match owner {
      Some(user_id) => tx.execute(
        "DELETE FROM vaktplan WHERE rowid = ? AND (user = ? OR user IS NULL)",
        params![id, user_id]
      ),
      None => tx.execute(
        "DELETE FROM vaktplan WHERE rowid = ?",
        params![id]
      )
    }
  })?;
  debug!("Deleted {} comment(s) with id {}", deleted, id);
  Ok(())
}

pub fn user_by_name(
  pool: &Pool,
  username: &str
) -> Result<Option<User>> {
  let conn = pool.get()?;
  let mut stmt = conn.prepare(
    "SELECT rowid, user, password, cdate FROM users WHERE user = ?"
  )?;
  stmt.query_row(params![username], map_user)
    .optional()
    .context("Fetching user by name")
}

pub fn update_user_password(
  pool: &Pool,
  username: &str,
  password_hash: &str
) -> Result<()> {
  with_transaction(pool, "Updating user password", |tx| {
    tx.execute(
      "UPDATE users SET password = ? WHERE user = ?",
      params![password_hash, username]
    )
  })?;
  Ok(())
}

// Only used by the user administration binary, there
// is no signup page.
pub fn insert_user(
  pool: &Pool,
  username: &str,
  password_hash: &str
) -> Result<i64> {
  let inserted = with_transaction(pool, "Inserting user", |tx| {
    let existing: i64 = tx.query_row(
      "SELECT count(*) FROM users WHERE user = ?",
      params![username],
      |row| row.get(0)
    )?;
    if existing > 0 {
      return Ok(None);
    }
    tx.execute(
      "INSERT INTO users (user, password) VALUES (?, ?)",
      params![username, password_hash]
    )?;
    Ok(Some(tx.last_insert_rowid()))
  })?;
  inserted.ok_or_else(|| eyre!("User {} already exists", username))
}

#[cfg(test)]
pub fn test_pool() -> Pool {
  // A single connection, every in-memory connection
  // would be a different database otherwise.
  let pool = r2d2::Pool::builder()
    .max_size(1)
    .build(r2d2_sqlite::SqliteConnectionManager::memory())
    .expect("In-memory pool");
  init_schema(&pool).expect("Schema creation");
  pool
}

#[cfg(test)]
mod tests {
  use super::*;
  use rusqlite::NO_PARAMS;

  fn comment_count(pool: &Pool) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row("SELECT count(*) FROM vaktplan", NO_PARAMS, |row| row.get(0))
      .unwrap()
  }

  #[test]
  fn schema_can_be_created_twice() {
    let pool = test_pool();
    assert!(init_schema(&pool).is_ok());
  }

  #[test]
  fn inserted_comment_is_listed_once() {
    let pool = test_pool();
    let id = insert_comment(&pool, "29.1.2016", "Dentist at 10", None).unwrap();
    insert_comment(&pool, "1.2.2016", "Someone else's day", None).unwrap();

    let comments = comments_by_date(&pool, "29.1.2016").unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, id);
    assert_eq!(comments[0].text, "Dentist at 10");
    assert!(comments[0].created_at.is_some());
    assert!(comments[0].author.is_none());
  }

  #[test]
  fn comments_come_back_in_insertion_order() {
    let pool = test_pool();
    for text in &["first", "second", "third"] {
      insert_comment(&pool, "3.3.2003", text, None).unwrap();
    }
    let comments = comments_by_date(&pool, "3.3.2003").unwrap();
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    // The trigger only has second precision:
    let dates: Vec<String> = comments.into_iter()
      .map(|c| c.created_at.unwrap())
      .collect();
    assert!(dates.windows(2).all(|w| w[0] <= w[1]));
  }

  #[test]
  fn empty_comment_is_never_stored() {
    let pool = test_pool();
    assert!(insert_comment(&pool, "1.0.2000", "", None).is_err());
    assert_eq!(comment_count(&pool), 0);
  }

  #[test]
  fn deleting_missing_comment_succeeds() {
    let pool = test_pool();
    insert_comment(&pool, "1.0.2000", "keep me", None).unwrap();
    assert!(delete_comment(&pool, 4242, None).is_ok());
    assert_eq!(comment_count(&pool), 1);
  }

  #[test]
  fn delete_removes_only_that_comment() {
    let pool = test_pool();
    let a = insert_comment(&pool, "1.0.2000", "a", None).unwrap();
    let b = insert_comment(&pool, "1.0.2000", "b", None).unwrap();
    delete_comment(&pool, a, None).unwrap();
    assert!(comment_by_id(&pool, a).unwrap().is_none());
    assert!(comment_by_id(&pool, b).unwrap().is_some());
  }

  #[test]
  fn owned_comments_are_only_deleted_by_their_owner() {
    let pool = test_pool();
    let alice = insert_user(&pool, "alice", "hash-a").unwrap();
    let bob = insert_user(&pool, "bob", "hash-b").unwrap();
    let id = insert_comment(&pool, "5.5.2005", "alice's", Some(alice)).unwrap();

    delete_comment(&pool, id, Some(bob)).unwrap();
    let comment = comment_by_id(&pool, id).unwrap().unwrap();
    assert_eq!(comment.author.as_deref(), Some("alice"));
    assert_eq!(comment.author_id, Some(alice));

    delete_comment(&pool, id, Some(alice)).unwrap();
    assert!(comment_by_id(&pool, id).unwrap().is_none());
  }

  #[test]
  fn comments_without_owner_can_be_deleted_by_anyone() {
    let pool = test_pool();
    let bob = insert_user(&pool, "bob", "hash-b").unwrap();
    let id = insert_comment(&pool, "5.5.2005", "from before logins", None).unwrap();
    delete_comment(&pool, id, Some(bob)).unwrap();
    assert!(comment_by_id(&pool, id).unwrap().is_none());
  }

  #[test]
  fn failed_write_is_rolled_back() {
    let pool = test_pool();
    let result: Result<()> = with_transaction(&pool, "Writing twice", |tx| {
      tx.execute(
        "INSERT INTO vaktplan (comment, date) VALUES (?, ?)",
        params!["half done", "1.0.2000"]
      )?;
      tx.execute("INSERT INTO no_such_table VALUES (1)", NO_PARAMS)?;
      Ok(())
    });
    assert!(result.is_err());
    assert_eq!(comment_count(&pool), 0);
    // The connection is usable again afterwards:
    assert!(insert_comment(&pool, "1.0.2000", "fine", None).is_ok());
  }

  #[test]
  fn writes_fail_when_the_table_is_gone() {
    let pool = test_pool();
    pool.get().unwrap().execute_batch("DROP TABLE vaktplan").unwrap();
    assert!(insert_comment(&pool, "1.0.2000", "lost", None).is_err());
    assert!(delete_comment(&pool, 1, None).is_err());
  }

  #[test]
  fn users_are_looked_up_by_exact_name() {
    let pool = test_pool();
    insert_user(&pool, "Alice", "digest").unwrap();
    let user = user_by_name(&pool, "Alice").unwrap().unwrap();
    assert_eq!(user.password_hash, "digest");
    assert!(user.created_at.is_some());
    assert!(user_by_name(&pool, "alice").unwrap().is_none());
  }

  #[test]
  fn duplicate_users_are_refused() {
    let pool = test_pool();
    insert_user(&pool, "alice", "one").unwrap();
    assert!(insert_user(&pool, "alice", "two").is_err());
    assert_eq!(user_by_name(&pool, "alice").unwrap().unwrap().password_hash, "one");
  }

  #[test]
  fn password_update_replaces_digest() {
    let pool = test_pool();
    insert_user(&pool, "alice", "old").unwrap();
    update_user_password(&pool, "alice", "new").unwrap();
    assert_eq!(user_by_name(&pool, "alice").unwrap().unwrap().password_hash, "new");
  }
}
