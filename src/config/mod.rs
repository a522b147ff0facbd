// Adding the context method to errors:
use eyre::{WrapErr, eyre};
use color_eyre::Result;
use serde::Deserialize;
use crate::calendar::YearRange;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  pub template_dir: String,
  // Feature toggles covering the different ways
  // the calendar has been deployed: with or without
  // logins, with or without comment owners.
  pub auth_enabled: bool,
  pub comments_have_owner: bool,
  // Idle time in seconds after which a session
  // goes back to anonymous:
  pub session_timeout: i64,
  pub min_year: i32,
  pub max_year: i32
}

impl Config {

  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // You have to use lowercase when compared to
    // what's in the .env file.
    c.set_default("db_path", "./vaktplan.db")?;
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("template_dir", "./templates")?;
    c.set_default("auth_enabled", true)?;
    c.set_default("comments_have_owner", true)?;
    c.set_default("session_timeout", 86400i64)?;
    // The calendar has always been limited to these
    // years. Probably stale, but existing links rely on it.
    c.set_default("min_year", 1990i64)?;
    c.set_default("max_year", 2020i64)?;

    c.merge(config::Environment::default())?;
    // The error has to be given a context for
    // color_eyre to work here:
    let config: Config = c.try_into()
      .context("Loading configuration from env")?;
    if config.min_year > config.max_year {
      return Err(eyre!(
        "min_year ({}) cannot be greater than max_year ({})",
        config.min_year,
        config.max_year
      ));
    }
    Ok(config)
  }

  pub fn year_range(&self) -> YearRange {
    YearRange::new(self.min_year, self.max_year)
  }

}
