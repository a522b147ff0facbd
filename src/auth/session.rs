use std::collections::HashMap;
use std::sync::RwLock;
use log::{debug, error};
use uuid::Uuid;
use crate::utils::time_utils::current_timestamp;

pub const ANONYMOUS: &'static str = "anonymous";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
  pub logged_in: bool,
  pub username: String,
  pub user_id: Option<i64>,
  last_seen: i64
}

impl Default for Session {
  fn default() -> Self {
    Self {
      logged_in: false,
      username: String::from(ANONYMOUS),
      user_id: None,
      last_seen: current_timestamp()
    }
  }
}

impl Session {

  pub fn is_authenticated(&self) -> bool {
    self.logged_in && self.username != ANONYMOUS
  }

  pub fn authenticate(&mut self, username: String, user_id: i64) {
    // The sentinel name can't be used to log in,
    // it would break the invariant above.
    if username == ANONYMOUS {
      return;
    }
    self.logged_in = true;
    self.username = username;
    self.user_id = Some(user_id);
  }

  /// Back to the initial state, works on an
  /// anonymous session too.
  pub fn kill(&mut self) {
    *self = Session::default();
  }

}

// What a request works with. "fresh" means the
// token isn't known to the client yet, the response
// has to set the cookie if the session gets saved.
#[derive(Debug)]
pub struct SessionHandle {
  pub token: String,
  pub session: Session,
  pub fresh: bool
}

impl SessionHandle {

  // Never stored until saved.
  pub fn anonymous() -> Self {
    Self {
      token: Uuid::new_v4().to_string(),
      session: Session::default(),
      fresh: true
    }
  }

}

/**
 * Process-local sessions keyed by the cookie value.
 * Nothing is shared between processes and everything
 * is lost on restart, which means being logged out.
 * Only saved sessions are kept, visitors who never
 * log in don't take any room.
 */
pub struct SessionStore {
  sessions: RwLock<HashMap<String, Session>>,
  // Seconds:
  timeout: i64
}

impl SessionStore {

  pub fn new(timeout: i64) -> Self {
    Self {
      sessions: RwLock::new(HashMap::new()),
      timeout
    }
  }

  fn is_expired(&self, session: &Session, now: i64) -> bool {
    now - session.last_seen > self.timeout
  }

  pub fn open(&self, token: Option<String>) -> SessionHandle {
    let token = match token {
      Some(token) => token,
      None => return SessionHandle::anonymous()
    };
    let now = current_timestamp();
    let mut sessions = match self.sessions.write() {
      Ok(sessions) => sessions,
      Err(e) => {
        error!("Session store lock is poisoned, SHOULD NEVER HAPPEN - {}", e);
        return SessionHandle::anonymous();
      }
    };
    // Forget about expired sessions while we hold the lock.
    sessions.retain(|_, s| !self.is_expired(s, now));

    match sessions.get_mut(&token) {
      Some(session) => {
        session.last_seen = now;
        SessionHandle {
          token,
          session: session.clone(),
          fresh: false
        }
      },
      None => SessionHandle::anonymous()
    }
  }

  pub fn save(&self, handle: &SessionHandle) {
    match self.sessions.write() {
      Ok(mut sessions) => {
        let mut session = handle.session.clone();
        session.last_seen = current_timestamp();
        sessions.insert(handle.token.clone(), session);
        debug!("Saved session, {} open", sessions.len());
      },
      Err(e) => error!("Could not save session, lock is poisoned - {}", e)
    }
  }

  /// Forgets the stored session and resets the handle,
  /// the old token is worth nothing afterwards.
  pub fn discard(&self, handle: &mut SessionHandle) {
    match self.sessions.write() {
      Ok(mut sessions) => {
        sessions.remove(&handle.token);
      },
      Err(e) => error!("Could not discard session, lock is poisoned - {}", e)
    }
    handle.session.kill();
  }

  /// Moves the session to a brand new token, used when
  /// someone logs in so a token handed out before the
  /// login can't be reused.
  pub fn renew(&self, handle: &mut SessionHandle) {
    if !handle.fresh {
      match self.sessions.write() {
        Ok(mut sessions) => {
          sessions.remove(&handle.token);
        },
        Err(e) => error!("Could not renew session, lock is poisoned - {}", e)
      }
    }
    handle.token = Uuid::new_v4().to_string();
    handle.fresh = true;
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.sessions.read().map(|s| s.len()).unwrap_or(0)
  }

}
