/*
 * Logins, password changes and the session store.
 * Passwords are only ever handled as SHA-256 hex
 * digests, which is what the users table has always
 * contained.
 */

use sha2::{Digest, Sha256};
use color_eyre::Result;
use log::{info, warn};
use crate::db::{self, Pool};
use crate::db::entities::User;
pub mod session;

// Same message for an unknown user and a wrong
// password so usernames can't be guessed from it.
pub const WRONG_CREDENTIALS: &'static str = "USERNAME OR PASSWORD IS WRONG";
pub const PASSWORDS_DIDNT_MATCH: &'static str = "PASSWORDS DIDN'T MATCH.";
pub const SAME_PASSWORD: &'static str = "THE NEW PASSWORD CAN NOT BE THE SAME AS THE OLD ONE";
pub const WRONG_OLD_PASSWORD: &'static str = "PASSWORD ENTERED WRONG";

pub fn digest(password: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(password.as_bytes());
  format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
  digest(password).as_bytes() == password_hash.as_bytes()
}

#[derive(Debug, PartialEq)]
pub enum LoginResult {
  Accepted { user_id: i64, username: String },
  Rejected
}

/// Storage errors are still errors, a missing
/// user is just a rejected login.
pub fn login(
  pool: &Pool,
  username: &str,
  password: &str
) -> Result<LoginResult> {
  let user: Option<User> = db::user_by_name(pool, username)?;
  match user {
    Some(user) if verify_password(password, &user.password_hash) => {
      info!("User {} logged in", user.username);
      Ok(LoginResult::Accepted {
        user_id: user.id,
        username: user.username
      })
    },
    _ => {
      warn!("Failed login attempt for username {}", username);
      Ok(LoginResult::Rejected)
    }
  }
}

/// Form level checks of the password change. Gives
/// back the old and new digests when they pass, or the
/// message to show on the form.
pub fn validate_password_change(
  old: &str,
  new: &str,
  confirm: &str
) -> std::result::Result<(String, String), &'static str> {
  if new != confirm {
    return Err(PASSWORDS_DIDNT_MATCH);
  }
  let old_hash = digest(old);
  let new_hash = digest(new);
  if old_hash == new_hash {
    return Err(SAME_PASSWORD);
  }
  Ok((old_hash, new_hash))
}

#[derive(Debug, PartialEq)]
pub enum PasswordChange {
  Changed,
  WrongOldPassword,
  // The session points to a user that's gone.
  UnknownUser
}

pub fn change_password(
  pool: &Pool,
  username: &str,
  old_hash: &str,
  new_hash: &str
) -> Result<PasswordChange> {
  let user = match db::user_by_name(pool, username)? {
    Some(user) => user,
    None => return Ok(PasswordChange::UnknownUser)
  };
  if user.password_hash != old_hash {
    return Ok(PasswordChange::WrongOldPassword);
  }
  db::update_user_password(pool, username, new_hash)?;
  info!("User {} changed their password", username);
  Ok(PasswordChange::Changed)
}
