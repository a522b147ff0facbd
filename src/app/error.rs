use actix_web::{
  error::ResponseError,
  HttpResponse
};
use derive_more::Display;
use log::error;

// Only for things going wrong on our side. Routine
// navigation (redirects, not found pages) goes through
// Outcome instead.
// The full error message is never shown to the client,
// it only ends up in the logs.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String)
}

impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        HttpResponse::InternalServerError().body(self.to_string())
    }
  }
}

// Used with map_err on everything coming out of the
// db module.
pub fn map_db_error(e: color_eyre::Report) -> Error {
  error!("Database error - {:?}", e);
  Error::DatabaseError(e.to_string())
}
