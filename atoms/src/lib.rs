//! Domain atoms for the property listings API.
//!
//! Each atom owns its model, its storage logic and its HTTP handlers. Clients
//! (DynamoDB, S3) are always passed in; nothing here reads global state.

pub mod error;
pub mod media;
pub mod properties;
pub mod response;

pub use error::{PropertyError, PropertyResult};
