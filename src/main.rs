mod app;
mod auth;
mod calendar;
mod config;
mod db;
mod utils;

use color_eyre::Result;
use dotenv::dotenv;
use std::env;

#[actix_web::main]
async fn main() -> Result<()> {
  dotenv().ok();
  // Log at info level unless told otherwise:
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();

  app::run().await
}
