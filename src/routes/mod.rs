//! HTTP route handlers
//!
//! - `health` - liveness probe
//! - `resource` - generic CRUD endpoints for every dashboard entity
//! - `envelope` - `{success, data, message, error, total}` response helpers

pub mod envelope;
pub mod health;
pub mod resource;

pub use envelope::{error_response, json_response, Envelope};
pub use health::health_check;
pub use resource::{
    handle_priority_actions_request, handle_resource_request, method_not_allowed,
    route_not_found, BoxError, MAX_BODY_BYTES,
};
