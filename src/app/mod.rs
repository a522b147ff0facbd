use actix_web::{middleware, web, App, HttpServer, HttpResponse};
use r2d2_sqlite::{self, SqliteConnectionManager};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, error, info};
use handlebars::Handlebars;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::Config;
use crate::auth::session::{SessionHandle, SessionStore};
use crate::calendar::YearRange;
use crate::db::{self, Pool};
use dtos::{NotFoundView, PageContext};
use error::Error;
mod handlers;
mod dtos;
mod error;
mod helpers;

// Declare app state struct:
pub struct AppState {
  pub pool: Pool,
  pub sessions: SessionStore,
  pub years: YearRange,
  pub auth_enabled: bool,
  pub comments_have_owner: bool
}

impl AppState {

  // Everything is open when logins are disabled.
  pub fn is_authorized(&self, handle: &SessionHandle) -> bool {
    !self.auth_enabled || handle.session.is_authenticated()
  }

  pub fn page_context(&self, handle: &SessionHandle) -> PageContext {
    PageContext {
      auth_enabled: self.auth_enabled,
      logged_in: handle.session.is_authenticated(),
      username: handle.session.username.clone()
    }
  }

  // The user id comments get saved with, if any.
  pub fn comment_owner(&self, handle: &SessionHandle) -> Option<i64> {
    if self.comments_have_owner && self.auth_enabled {
      handle.session.user_id
    } else {
      None
    }
  }

}

/// What a handler decided to do. Turned into an
/// actual response by `respond`.
#[derive(Debug)]
pub enum Outcome {
  // Rendered HTML.
  Page(String),
  Redirect(String),
  NotFound
}

impl Outcome {
  pub fn redirect<S: Into<String>>(location: S) -> Self {
    Outcome::Redirect(location.into())
  }
}

pub fn respond(
  app_state: &AppState,
  hb: &Handlebars<'_>,
  handle: &SessionHandle,
  outcome: Outcome
) -> Result<HttpResponse, Error> {
  let mut response = match outcome {
    Outcome::Page(body) => helpers::html(body),
    Outcome::Redirect(location) => helpers::redirect(&location),
    Outcome::NotFound => {
      let body = helpers::render(
        hb,
        "notfound",
        &NotFoundView { context: app_state.page_context(handle) }
      )?;
      HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(body)
    }
  };
  // Only a login saves a session under a new token.
  if handle.fresh && handle.session.is_authenticated() {
    response.add_cookie(&helpers::session_cookie(&handle.token))
      .map_err(|e| {
        error!("Could not set session cookie - {}", e);
        Error::InternalServerError("Session cookie".to_string())
      })?;
  }
  Ok(response)
}

pub fn register_templates(template_dir: &str) -> Result<Handlebars<'static>> {
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(".html", template_dir)
    .context("Templates directory might be missing or not accessible")?;
  Ok(handlebars)
}

// Function to start the server.
// Has to be async because there should be a .await at the end.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);
  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager)
    .context("Database connection failed")?;
  db::init_schema(&pool)?;

  // Delcare the template system, currently using
  // handlebars:
  let handlebars = register_templates(&config.template_dir)?;
  let handlebars_ref = web::Data::new(handlebars);

  let bind_address = config.bind_address.clone();
  let auth_enabled = config.auth_enabled;
  info!(
    "Starting calendar on {} (logins {}, comment owners {})",
    bind_address,
    if config.auth_enabled { "enabled" } else { "disabled" },
    if config.comments_have_owner { "enabled" } else { "disabled" }
  );

  let app_state = web::Data::new(
    AppState {
      pool,
      sessions: SessionStore::new(config.session_timeout),
      years: config.year_range(),
      auth_enabled: config.auth_enabled,
      comments_have_owner: config.comments_have_owner
    }
  );

  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .app_data(handlebars_ref.clone())
      .wrap(middleware::Logger::default())
      .configure(|cfg| base_endpoints_config(cfg, auth_enabled))
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")

}

// Every path answers with and without the
// trailing slash.
fn both_slashes(path: &str) -> Vec<String> {
  if path == "/" {
    vec![path.to_string()]
  } else {
    vec![path.to_string(), format!("{}/", path)]
  }
}

// Route configuration. Wrong methods on the calendar
// pages are sent back home instead of a 405.
fn base_endpoints_config(cfg: &mut web::ServiceConfig, auth_enabled: bool) {
  for path in both_slashes("/") {
    cfg.service(web::resource(path.as_str())
      .route(web::get().to(handlers::index))
      .route(web::post().to(handlers::see_other)));
  }
  for path in both_slashes("/ym") {
    cfg.service(web::resource(path.as_str())
      .route(web::get().to(handlers::ym))
      .route(web::post().to(handlers::see_other)));
  }
  for path in both_slashes("/ym/d") {
    cfg.service(web::resource(path.as_str())
      .route(web::get().to(handlers::day))
      .route(web::post().to(handlers::see_other)));
  }
  for path in both_slashes("/ym/d/add") {
    cfg.service(web::resource(path.as_str())
      .route(web::post().to(handlers::add_comment))
      .route(web::get().to(handlers::see_other)));
  }
  for path in both_slashes("/ym/d/del") {
    cfg.service(web::resource(path.as_str())
      .route(web::post().to(handlers::delete_comment))
      .route(web::get().to(handlers::see_other)));
  }
  // The last version of the calendar had no logins
  // at all, these pages just don't exist then.
  if auth_enabled {
    for path in both_slashes("/login") {
      cfg.service(web::resource(path.as_str())
        .route(web::get().to(handlers::login_form))
        .route(web::post().to(handlers::login)));
    }
    for path in both_slashes("/logout") {
      cfg.service(web::resource(path.as_str())
        .route(web::get().to(handlers::logout))
        .route(web::post().to(handlers::logout)));
    }
    for path in both_slashes("/changepass") {
      cfg.service(web::resource(path.as_str())
        .route(web::get().to(handlers::change_password_form))
        .route(web::post().to(handlers::change_password)));
    }
  }
}
