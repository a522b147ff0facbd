#![allow(dead_code)]
mod auth;
mod calendar;
mod config;
mod db;
mod utils;

use std::env;
use std::io::{self, BufRead};
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use dotenv::dotenv;
use log::info;
use r2d2_sqlite::{self, SqliteConnectionManager};
use getopts::Options;
use crate::auth::session::ANONYMOUS;
use crate::config::Config;
use crate::db::Pool;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options] USERNAME < PASSWORD_FILE", program);
  print!("{}", opts.usage(&brief));
}

// The password comes in on the first line of stdin,
// as a command line argument it would show up in the
// process list and the shell history.
fn read_password<R: BufRead>(mut input: R) -> Result<String> {
  let mut line = String::new();
  input.read_line(&mut line)
    .context("Reading the password from stdin")?;
  let password = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
  if password.is_empty() {
    return Err(eyre!("Password cannot be empty"));
  }
  Ok(password.to_string())
}

/**
 * Binary creating calendar users, there is no
 * signup page. Also creates the tables when the
 * database is new.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();

  let mut opts = Options::new();
  opts.optopt("d", "db", "database file, defaults to DB_PATH from the environment", "FILE");
  opts.optflag("h", "help", "print this help menu");
  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(f) => return Err(eyre!("Invalid arguments - {}", f))
  };

  if matches.opt_present("h") {
    print_usage(&program, opts);
    return Ok(());
  }
  if matches.free.len() != 1 {
    print_usage(&program, opts);
    return Err(eyre!("Expected a username, the password is read from stdin"));
  }
  let username = &matches.free[0];
  if username.is_empty() {
    return Err(eyre!("Username cannot be empty"));
  }
  // That name means "not logged in" to the sessions.
  if username == ANONYMOUS {
    return Err(eyre!("{} is reserved", ANONYMOUS));
  }

  let db_path = match matches.opt_str("d") {
    Some(path) => path,
    None => Config::from_env()?.db_path
  };
  info!("Using database {}", db_path);
  let manager = SqliteConnectionManager::file(&db_path);
  let pool = Pool::new(manager)
    .context("Database connection failed")?;
  db::init_schema(&pool)?;

  let password = read_password(io::stdin().lock())?;
  let id = db::insert_user(&pool, username, &auth::digest(&password))?;
  println!("Created user {} with id {}", username, id);
  Ok(())
}
