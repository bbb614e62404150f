//! Naradai - dashboard content API
//!
//! REST backend for an insights dashboard: eight content resources stored in
//! MongoDB, each exposed through the same CRUD surface under `/api/v1`.
//!
//! ## Resources
//!
//! - **Priority actions**: recommended actions with a workflow status
//! - **Dashboard stats**: headline figures
//! - **Risks** and **Opportunities**: detected signals with supporting data
//! - **Sentiment trends**: sentiment split and chart series
//! - **Discussion topics**, **Competitive analyses**, **Conversation clusters**
//!
//! Every resource goes through one generic pipeline: a [`resource::Resource`]
//! implementation, a [`store::ResourceStore`] backend (MongoDB or in-memory),
//! a [`services::ResourceService`] and the shared route handlers.

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod resource;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
