use actix_web::{
  cookie::Cookie,
  http::header,
  HttpMessage,
  HttpRequest,
  HttpResponse
};
use handlebars::Handlebars;
use log::error;
use serde::Serialize;
use crate::calendar::{CalendarDate, YearMonth};
use super::error::Error;

pub const SESSION_COOKIE: &'static str = "session_id";

pub fn session_token(req: &HttpRequest) -> Option<String> {
  req.cookie(SESSION_COOKIE)
    .map(|c| c.value().to_string())
    .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: &str) -> Cookie<'static> {
  Cookie::build(SESSION_COOKIE, token.to_string())
    .path("/")
    .http_only(true)
    .finish()
}

pub fn redirect(location: &str) -> HttpResponse {
  HttpResponse::Found()
    .header(header::LOCATION, location)
    .finish()
}

pub fn html(body: String) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/html; charset=utf-8")
    .body(body)
}

// The trailing slash is how the links have always
// looked, both forms are routed anyway.
pub fn day_url(date: &CalendarDate) -> String {
  format!(
    "/ym/d/?year={}&month={}&day={}",
    date.year, date.month, date.day
  )
}

pub fn month_url(ym: &YearMonth) -> String {
  format!("/ym/?year={}&month={}", ym.year, ym.month)
}

pub fn render<T: Serialize>(
  hb: &Handlebars<'_>,
  template: &str,
  data: &T
) -> Result<String, Error> {
  hb.render(template, data)
    .map_err(|e| {
      error!("A template engine error occured when rendering {}: {}", template, e);
      Error::InternalServerError("Template engine error".to_string())
    })
}
