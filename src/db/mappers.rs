use super::entities::*;
use rusqlite::{Row, Error};

// Column order has to match the SELECT statements
// in the parent module.

pub fn map_comment(row: &Row) -> Result<Comment, Error> {
  Ok(Comment {
    id: row.get(0)?,
    text: row.get(1)?,
    date: row.get(2)?,
    created_at: row.get(3)?,
    author_id: row.get(4)?,
    author: row.get(5)?
  })
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    username: row.get(1)?,
    password_hash: row.get(2)?,
    created_at: row.get(3)?
  })
}
