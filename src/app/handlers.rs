use actix_web::{
  web,
  HttpResponse,
  HttpRequest
};
use serde::Deserialize;
use log::{error, info};
use handlebars::Handlebars;
use crate::auth::{self, LoginResult, PasswordChange, WRONG_CREDENTIALS};
use crate::auth::session::SessionHandle;
use crate::calendar::{self, grid, DateError};
use crate::db;
use crate::utils::time_utils;
use super::dtos::*;
use super::error::{Error, map_db_error};
use super::{respond, AppState, Outcome};
use super::helpers;

// Module with all the page handler functions.
// Each one opens the session, works out an Outcome
// and lets `respond` turn it into a response.

/* --- Request body or query or form objects --- */
// Everything is a string at first, bad numbers have
// to send people home instead of being a 400.
#[derive(Deserialize)]
pub struct DateQuery {
  pub year: Option<String>,
  pub month: Option<String>,
  pub day: Option<String>
}

#[derive(Deserialize)]
pub struct CommentForm {
  pub year: Option<String>,
  pub month: Option<String>,
  pub day: Option<String>,
  pub comment: Option<String>
}

#[derive(Deserialize)]
pub struct DeleteForm {
  pub year: Option<String>,
  pub month: Option<String>,
  pub day: Option<String>,
  pub id: Option<String>
}

#[derive(Deserialize)]
pub struct LoginForm {
  pub username: Option<String>,
  pub password: Option<String>
}

#[derive(Deserialize)]
pub struct ChangePassForm {
  pub oldpassword: Option<String>,
  pub newpassword: Option<String>,
  pub newpassword2: Option<String>
}
/* --- End request body or query or form objects --- */

const HOME: &'static str = "/";
const LOGIN: &'static str = "/login";

// Without logins there is nothing to remember.
fn open_session(app_state: &AppState, req: &HttpRequest) -> SessionHandle {
  if app_state.auth_enabled {
    app_state.sessions.open(helpers::session_token(req))
  } else {
    SessionHandle::anonymous()
  }
}

// Unparseable dates go home, dates we don't serve
// get the not found page.
fn rejected_date(e: DateError) -> Outcome {
  match e {
    DateError::Malformed => Outcome::redirect(HOME),
    DateError::OutOfRange => Outcome::NotFound
  }
}

fn to_login() -> Outcome {
  Outcome::redirect(LOGIN)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

pub async fn index(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = if app_state.is_authorized(&handle) {
    let view = IndexView::new(
      app_state.page_context(&handle),
      &time_utils::today(),
      &app_state.years
    );
    Outcome::Page(helpers::render(&hb, "index", &view)?)
  } else {
    to_login()
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn ym(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<DateQuery>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = match calendar::parse_year_month(
    &app_state.years,
    query.year.as_deref(),
    query.month.as_deref()
  ) {
    Err(e) => rejected_date(e),
    Ok(_) if !app_state.is_authorized(&handle) => to_login(),
    Ok(ym) => {
      let view = YmView::new(
        app_state.page_context(&handle),
        ym,
        grid::month_grid(ym),
        &time_utils::today(),
        &app_state.years
      );
      Outcome::Page(helpers::render(&hb, "ym", &view)?)
    }
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn day(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<DateQuery>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = match calendar::parse_date(
    &app_state.years,
    query.year.as_deref(),
    query.month.as_deref(),
    query.day.as_deref()
  ) {
    Err(e) => rejected_date(e),
    Ok(_) if !app_state.is_authorized(&handle) => to_login(),
    Ok(date) => {
      let comments = db::comments_by_date(&app_state.pool, &date.storage_key())
        .map_err(map_db_error)?;
      let view = DayView::new(
        app_state.page_context(&handle),
        &date,
        comments,
        app_state.comments_have_owner
      );
      Outcome::Page(helpers::render(&hb, "day", &view)?)
    }
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn add_comment(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<CommentForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let date = calendar::parse_date(
    &app_state.years,
    form.year.as_deref(),
    form.month.as_deref(),
    form.day.as_deref()
  );
  let outcome = match (date, &form.comment) {
    (Err(e), _) => rejected_date(e),
    // No comment field at all is a broken form:
    (Ok(_), None) => Outcome::redirect(HOME),
    // An empty one just sends you back:
    (Ok(date), Some(text)) if text.is_empty() =>
      Outcome::redirect(helpers::day_url(&date)),
    (Ok(_), Some(_)) if !app_state.is_authorized(&handle) => to_login(),
    (Ok(date), Some(text)) => {
      db::insert_comment(
        &app_state.pool,
        &date.storage_key(),
        text,
        app_state.comment_owner(&handle)
      ).map_err(|e| {
        error!("Could not insert a comment - {}", e);
        Error::DatabaseError(format!("Failed to insert comment - {}", e))
      })?;
      Outcome::redirect(helpers::day_url(&date))
    }
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn delete_comment(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<DeleteForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let id = form.id.as_deref().and_then(|id| id.trim().parse::<i64>().ok());
  let date = calendar::parse_date(
    &app_state.years,
    form.year.as_deref(),
    form.month.as_deref(),
    form.day.as_deref()
  );
  let outcome = match (id, date) {
    (None, _) => Outcome::redirect(HOME),
    (Some(_), Err(e)) => rejected_date(e),
    (Some(_), Ok(_)) if !app_state.is_authorized(&handle) => to_login(),
    (Some(id), Ok(date)) => {
      // Going back to the day page no matter what, a
      // failed delete only shows up in the logs.
      if let Err(e) = db::delete_comment(
        &app_state.pool,
        id,
        app_state.comment_owner(&handle)
      ) {
        error!("Could not delete comment {} - {:?}", id, e);
      }
      Outcome::redirect(helpers::day_url(&date))
    }
  };
  respond(&app_state, &hb, &handle, outcome)
}

// For the methods a page doesn't handle.
pub async fn see_other(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = if app_state.is_authorized(&handle) {
    Outcome::redirect(HOME)
  } else {
    to_login()
  };
  respond(&app_state, &hb, &handle, outcome)
}

fn login_page(
  app_state: &AppState,
  hb: &Handlebars<'_>,
  handle: &SessionHandle,
  view: LoginViewState
) -> Result<Outcome, Error> {
  let view = LoginView {
    context: app_state.page_context(handle),
    message: view.message,
    username: view.username,
    username_missing: view.username_missing,
    password_missing: view.password_missing
  };
  Ok(Outcome::Page(helpers::render(hb, "login", &view)?))
}

#[derive(Default)]
struct LoginViewState {
  message: Option<&'static str>,
  username: String,
  username_missing: bool,
  password_missing: bool
}

pub async fn login_form(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = login_page(&app_state, &hb, &handle, LoginViewState::default())?;
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn login(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<LoginForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let mut handle = open_session(&app_state, &req);
  let username = non_empty(&form.username);
  let password = non_empty(&form.password);

  let outcome = match (username, password) {
    (Some(username), Some(password)) => {
      match auth::login(&app_state.pool, username, password)
        .map_err(map_db_error)? {
        LoginResult::Accepted { user_id, username } => {
          app_state.sessions.renew(&mut handle);
          handle.session.authenticate(username, user_id);
          app_state.sessions.save(&handle);
          Outcome::redirect(HOME)
        },
        LoginResult::Rejected => login_page(&app_state, &hb, &handle, LoginViewState {
          message: Some(WRONG_CREDENTIALS),
          username: username.to_string(),
          ..Default::default()
        })?
      }
    },
    _ => login_page(&app_state, &hb, &handle, LoginViewState {
      message: None,
      username: username.unwrap_or_default().to_string(),
      username_missing: username.is_none(),
      password_missing: password.is_none()
    })?
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn logout(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let mut handle = open_session(&app_state, &req);
  if handle.session.is_authenticated() {
    info!("User {} logged out", handle.session.username);
  }
  app_state.sessions.discard(&mut handle);
  respond(&app_state, &hb, &handle, to_login())
}

fn change_password_page(
  app_state: &AppState,
  hb: &Handlebars<'_>,
  handle: &SessionHandle,
  message: Option<&'static str>,
  missing: MissingPasswords
) -> Result<Outcome, Error> {
  let view = ChangePassView {
    context: app_state.page_context(handle),
    message,
    missing
  };
  Ok(Outcome::Page(helpers::render(hb, "changepass", &view)?))
}

pub async fn change_password_form(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  let outcome = if app_state.is_authorized(&handle) {
    change_password_page(&app_state, &hb, &handle, None, MissingPasswords::default())?
  } else {
    to_login()
  };
  respond(&app_state, &hb, &handle, outcome)
}

pub async fn change_password(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<ChangePassForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let mut handle = open_session(&app_state, &req);
  if !app_state.is_authorized(&handle) {
    return respond(&app_state, &hb, &handle, to_login());
  }

  let old = non_empty(&form.oldpassword);
  let new = non_empty(&form.newpassword);
  let confirm = non_empty(&form.newpassword2);
  let missing = MissingPasswords {
    old: old.is_none(),
    new: new.is_none(),
    confirm: confirm.is_none()
  };
  if missing.any() {
    let outcome = change_password_page(&app_state, &hb, &handle, None, missing)?;
    return respond(&app_state, &hb, &handle, outcome);
  }

  let (old_hash, new_hash) = match auth::validate_password_change(
    old.unwrap_or_default(),
    new.unwrap_or_default(),
    confirm.unwrap_or_default()
  ) {
    Ok(digests) => digests,
    Err(message) => {
      let outcome = change_password_page(
        &app_state, &hb, &handle, Some(message), MissingPasswords::default()
      )?;
      return respond(&app_state, &hb, &handle, outcome);
    }
  };

  let username = handle.session.username.clone();
  let outcome = match auth::change_password(
    &app_state.pool,
    &username,
    &old_hash,
    &new_hash
  ).map_err(map_db_error)? {
    // Still logged in afterwards.
    PasswordChange::Changed => Outcome::redirect(HOME),
    PasswordChange::WrongOldPassword => change_password_page(
      &app_state, &hb, &handle, Some(auth::WRONG_OLD_PASSWORD), MissingPasswords::default()
    )?,
    PasswordChange::UnknownUser => {
      error!("Session user {} does not exist anymore", username);
      app_state.sessions.discard(&mut handle);
      return Err(Error::InternalServerError(
        String::from("Session user does not exist")
      ));
    }
  };
  respond(&app_state, &hb, &handle, outcome)
}

// Default response when no route matched the request:
pub async fn not_found(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let handle = open_session(&app_state, &req);
  respond(&app_state, &hb, &handle, Outcome::NotFound)
}
