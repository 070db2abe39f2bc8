//! Workspace umbrella crate for the people service.
//!
//! Re-exports the record store and the HTTP server so callers and the
//! integration tests can depend on a single crate.

pub use server::{
    build_router, normalize, process_response, serve, start_server, ErrorKind, NormalizedError,
    RawError, ServerConfig, ServerState,
};
pub use store::{
    BackendConfig, CreatedRecord, DocumentBackend, Entity, FieldKind, FieldMap, FieldSpec,
    InMemoryBackend, Model, Person, RecordId, RecordStore, Schema, StoreError,
};

pub mod probe {
    //! Startup self-test, re-exported for integration tests and embedders.

    pub use server::probe::{
        probe_payload, run_startup_probe, spawn_startup_probe, ProbeError, ProbeOutcome,
    };
}
