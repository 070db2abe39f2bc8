//! Startup probe against a real listener.

use people::probe::{ProbeError, run_startup_probe};
use people::{
    DocumentBackend, InMemoryBackend, RecordStore, ServerConfig, ServerState, StoreError, serve,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// In-memory backend whose `clear` always fails, counting inserts.
struct ResetFails {
    inner: InMemoryBackend,
    inserts: AtomicUsize,
}

impl ResetFails {
    fn new() -> Self {
        Self {
            inner: InMemoryBackend::new(),
            inserts: AtomicUsize::new(0),
        }
    }
}

impl DocumentBackend for ResetFails {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(collection, id, document)
    }

    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.inner.scan(collection, visitor)
    }

    fn clear(&self, _: &str) -> Result<u64, StoreError> {
        Err(StoreError::backend("store unreachable"))
    }
}

struct Running {
    base_url: String,
    _shutdown: oneshot::Sender<()>,
}

async fn start(store: RecordStore, startup_probe: bool) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{port}");
    let config = ServerConfig {
        api_uri: Some(base_url.clone()),
        startup_probe,
        ..Default::default()
    };
    let state = Arc::new(ServerState::with_store(config, store));
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        serve(listener, state, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });
    Running {
        base_url,
        _shutdown: tx,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_clears_then_saves_synthetic_person() {
    let store = RecordStore::in_memory();
    for name in ["old-1", "old-2"] {
        store
            .create_person(json!({"firstName": name}).as_object().cloned().unwrap())
            .await
            .unwrap();
    }
    let server = start(store.clone(), false).await;

    let client = reqwest::Client::new();
    let outcome = run_startup_probe(&store, &client, &server.base_url)
        .await
        .expect("probe should succeed");

    assert_eq!(outcome.removed, 2);
    let id = outcome.body["_id"].as_str().unwrap().to_string();
    assert_eq!(
        outcome.body["message"],
        json!(format!("New Person created! with _id : {id}"))
    );

    let people = store.get_all_people().await.unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].first_name.as_deref(), Some("jimmy"));
    assert_eq!(people[0].age, Some(34));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_runs_on_its_own_when_server_starts() {
    let store = RecordStore::in_memory();
    let _server = start(store.clone(), true).await;

    let mut people = Vec::new();
    for _ in 0..50 {
        people = store.get_all_people().await.unwrap();
        if !people.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].last_name.as_deref(), Some("smith"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_reset_skips_the_loopback_save() {
    let backend = Arc::new(ResetFails::new());
    let store = RecordStore::new(backend.clone());
    let server = start(store.clone(), false).await;

    let client = reqwest::Client::new();
    let err = run_startup_probe(&store, &client, &server.base_url)
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::Reset(_)));
    assert_eq!(backend.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_keeps_serving_when_probe_fails() {
    let backend = Arc::new(ResetFails::new());
    let server = start(RecordStore::new(backend.clone()), true).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .post(format!("{}/savePerson", server.base_url))
        .json(&json!({"firstName": "after-probe"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // give a misbehaving probe time to post if it were going to
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.inserts.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_reports_unreachable_service() {
    let store = RecordStore::in_memory();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = run_startup_probe(&store, &client, &format!("http://127.0.0.1:{port}"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Request(_)));
}
