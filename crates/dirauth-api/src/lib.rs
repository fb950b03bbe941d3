//! HTTP API for Dirauth

pub mod metrics;
pub mod routes;
pub mod server;

pub use metrics::MetricsRecorder;
pub use server::{create_router, AppState, DirAuthServer};
