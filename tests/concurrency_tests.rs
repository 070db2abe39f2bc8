//! Concurrent creates through the store and through the HTTP layer.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use people::{FieldMap, RecordStore, ServerConfig, ServerState, build_router};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

fn fields(v: Value) -> FieldMap {
    v.as_object().cloned().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_concurrent_creates_get_distinct_ids() {
    let store = RecordStore::in_memory();

    let a = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_person(fields(json!({"firstName": "ann", "age": 30})))
                .await
        })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_person(fields(json!({"firstName": "bob", "age": 40})))
                .await
        })
    };

    let a = a.await.unwrap().expect("first create should succeed");
    let b = b.await.unwrap().expect("second create should succeed");
    assert_ne!(a.id, b.id);

    let people = store.get_all_people().await.unwrap();
    assert_eq!(people.len(), 2);
    let names: HashSet<_> = people.iter().filter_map(|p| p.first_name.clone()).collect();
    assert_eq!(names, HashSet::from(["ann".to_string(), "bob".to_string()]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_http_creates_lose_nothing() {
    let store = RecordStore::in_memory();
    let config = ServerConfig {
        startup_probe: false,
        ..Default::default()
    };
    let app = build_router(Arc::new(ServerState::with_store(config, store.clone())));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = json!({"firstName": format!("person-{i}"), "age": i});
                let resp = app
                    .oneshot(
                        Request::builder()
                            .method("POST")
                            .uri("/savePerson")
                            .header("content-type", "application/json")
                            .body(Body::from(body.to_string()))
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                assert_eq!(resp.status(), StatusCode::OK);
                let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                    .await
                    .unwrap();
                let created: Value = serde_json::from_slice(&bytes).unwrap();
                created["_id"].as_str().unwrap().to_string()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()), "duplicate id issued");
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(store.get_all_people().await.unwrap().len(), 32);
}
