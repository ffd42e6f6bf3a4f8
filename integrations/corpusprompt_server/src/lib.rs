//! HTTP adapter over the corpusprompt document store and query pipeline.
//!
//! Routes keep the paths and JSON bodies of the original service so existing
//! front ends keep working.

pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
