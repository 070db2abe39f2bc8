//! People Server - HTTP API for storing and listing people
//!
//! This crate exposes the record store over HTTP and owns everything between
//! an incoming request and the response that goes back:
//!
//! - **Routes**: static pages plus the list/save people endpoints
//! - **Error Normalization**: every failure becomes a `{code, message}` body
//!   through [`error::normalize`] and [`response::process_response`]
//! - **Startup Probe**: a one-shot self-test posted over loopback at startup
//! - **Configuration**: `.env`, an optional `server.*` file and
//!   `PEOPLE_SERVER__*` environment variables
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - Landing page
//! - `GET /getAllPeople` - JSON array of every stored person
//! - `GET /addPerson` - Form for adding a person
//! - `POST /savePerson` - Save a person from a JSON or form body

pub mod config;
pub mod error;
pub mod middleware;
pub mod probe;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{normalize, ErrorKind, NormalizedError, RawError};
pub use response::process_response;
pub use server::{build_router, serve, start_server};
pub use state::ServerState;
