use crate::error::{normalize, NormalizedError, RawError};
use crate::response::process_response;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use axum::Form;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use store::FieldMap;

/// Person fields from either a JSON or a url-encoded form body.
///
/// An empty body yields an empty mapping. Form values arrive as text and are
/// cast by the store's schema like any other input.
#[derive(Debug)]
pub struct PersonPayload(pub FieldMap);

impl<S> FromRequest<S> for PersonPayload
where
    S: Send + Sync,
{
    type Rejection = NormalizedError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    NormalizedError::new(rejection.status(), rejection.body_text())
                })?;
            return Ok(PersonPayload(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| NormalizedError::new(rejection.status(), rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PersonPayload(FieldMap::new()));
        }
        serde_json::from_slice::<FieldMap>(&bytes)
            .map(PersonPayload)
            .map_err(|err| NormalizedError::bad_request(format!("Invalid JSON body: {err}")))
    }
}

fn split<T>(outcome: Result<T, RawError>) -> (Option<RawError>, Option<T>) {
    match outcome {
        Ok(result) => (None, Some(result)),
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), error = %err, "request failed");
            (Some(err), None)
        }
    }
}

/// List every person (GET /getAllPeople)
pub async fn get_all_people(State(state): State<Arc<ServerState>>) -> Response {
    let outcome = state.within_deadline(state.store.get_all_people()).await;
    let (err, people) = split(outcome);
    process_response(normalize(err), people)
}

/// Save a new person (POST /savePerson)
///
/// # Response
///
/// ```json
/// { "_id": "5d41402abc4b2a76b9719d911017c592", "message": "New Person created! with _id : 5d41402abc4b2a76b9719d911017c592" }
/// ```
pub async fn save_person(
    State(state): State<Arc<ServerState>>,
    payload: Result<PersonPayload, NormalizedError>,
) -> Response {
    let outcome = match payload {
        Ok(PersonPayload(fields)) => {
            let body = Value::Object(fields.clone());
            tracing::debug!(%body, "savePerson request");
            state.create_person(fields).await
        }
        Err(rejection) => Err(RawError::Normalized(rejection)),
    };
    let (err, created) = split(outcome);
    process_response(normalize(err), created)
}
