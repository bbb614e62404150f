//! Services layer
//!
//! Business rules shared by every dashboard resource: validation before any
//! write, not-found detection and timestamp bookkeeping.

pub mod resource;

pub use resource::ResourceService;
