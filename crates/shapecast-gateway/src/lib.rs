//! HTTP gateway for shapecast.
//!
//! Three operations, each a single best-effort call to an upstream service:
//! narration text, shape descriptors, and streamed speech. Handlers share
//! nothing mutable; the state is built once and only read.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{build_router, start_server};
pub use state::AppState;
