use crate::error::{ErrorBody, NormalizedError, INTERNAL_ERROR_MESSAGE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Finalize the response for a request.
///
/// A result without an error is written as `200` with the result as JSON.
/// Every other combination becomes a `{code, message}` body, falling back to
/// `500` and a generic message when no error was supplied.
///
/// Inputs are consumed and exactly one [`Response`] comes back, so a request
/// cannot be answered twice.
pub fn process_response<T: Serialize>(
    error: Option<NormalizedError>,
    result: Option<T>,
) -> Response {
    match (error, result) {
        (None, Some(result)) => (StatusCode::OK, Json(result)).into_response(),
        (error, _) => {
            let (status, message) = match error {
                Some(err) => (err.status, err.message),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                ),
            };
            let body = ErrorBody {
                code: status.as_u16(),
                message,
            };
            (status, Json(body)).into_response()
        }
    }
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        process_response::<()>(Some(self), None)
    }
}
