//! HTTP route handlers
//!
//! - `GET /` and `GET /addPerson`: static pages, defined here
//! - `people`: listing and saving people

pub mod people;

use crate::error::NormalizedError;
use axum::response::Html;

const MAIN_PAGE: &str = include_str!("../../html/main.html");
const ADD_PERSON_PAGE: &str = include_str!("../../html/addPerson.html");

/// Landing page (GET /)
pub async fn home() -> Html<&'static str> {
    Html(MAIN_PAGE)
}

/// Form for adding a person (GET /addPerson)
pub async fn add_person_form() -> Html<&'static str> {
    Html(ADD_PERSON_PAGE)
}

/// 404 Not Found handler
pub async fn not_found() -> NormalizedError {
    NormalizedError::not_found()
}
