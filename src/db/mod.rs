//! Database layer
//!
//! MongoDB connection handling shared by every resource store.

pub mod mongo;

pub use mongo::{redact_uri, IntoIndexes, MongoClient, MongoCollection};
