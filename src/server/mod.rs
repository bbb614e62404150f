//! HTTP server
//!
//! - `http` - connection handling, routing, request deadline and access log
//! - `cors` - cross-origin policy and preflight responses

pub mod cors;
pub mod http;

pub use cors::CorsPolicy;
pub use http::{handle_request, run, serve, shutdown_signal, AppState, API_PREFIX};
