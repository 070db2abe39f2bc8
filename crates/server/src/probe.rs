//! Startup self-test.
//!
//! Once the listener is bound the server clears the people collection and
//! then saves one synthetic person through its own `POST /savePerson`
//! endpoint over loopback. This exercises the whole request pipeline end to
//! end. It is best-effort: the outcome is only logged, and the server keeps
//! serving whatever happens here.

use reqwest::StatusCode;
use serde_json::{json, Value};
use store::{RecordStore, StoreError};
use tokio::task::JoinHandle;

/// Errors that stop the probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Clearing the collection failed; nothing was posted.
    #[error("failed to reset people collection: {0}")]
    Reset(#[source] StoreError),

    /// The loopback request could not be sent or its body read.
    #[error("loopback request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("loopback request rejected with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// What a successful probe observed.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// People removed by the reset step.
    pub removed: u64,
    /// Response body of the synthetic save.
    pub body: Value,
}

/// The synthetic person posted by the probe.
pub fn probe_payload() -> Value {
    json!({
        "firstName": "jimmy",
        "lastName": "smith",
        "address": "123 Any Road, Omaha NE 12345",
        "age": 34
    })
}

/// Clear the collection, then save the synthetic person via `base_url`.
///
/// Stops after the first step if it fails, so no record is created against a
/// store in an unknown state.
pub async fn run_startup_probe(
    store: &RecordStore,
    client: &reqwest::Client,
    base_url: &str,
) -> Result<ProbeOutcome, ProbeError> {
    tracing::debug!("startup probe: deleting all people");
    let removed = store.delete_all_people().await.map_err(ProbeError::Reset)?;

    let url = format!("{base_url}/savePerson");
    tracing::debug!(%url, "startup probe: posting synthetic person");
    let response = client.post(&url).json(&probe_payload()).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        return Err(ProbeError::Rejected { status, body });
    }
    let body = response.json::<Value>().await?;
    Ok(ProbeOutcome { removed, body })
}

/// Run the probe on a detached task and log how it went.
pub fn spawn_startup_probe(store: RecordStore, base_url: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        match run_startup_probe(&store, &client, &base_url).await {
            Ok(outcome) => tracing::info!(
                removed = outcome.removed,
                body = %outcome.body,
                "startup probe succeeded"
            ),
            Err(err @ ProbeError::Reset(_)) => {
                tracing::error!(error = %err, "startup probe aborted")
            }
            Err(err) => tracing::warn!(error = %err, "startup probe failed"),
        }
    })
}
