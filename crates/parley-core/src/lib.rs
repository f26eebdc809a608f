//! Parley core crate - configuration, shared error type, and the wire types
//! exchanged between the chat controller and the completion endpoint.

pub mod config;
pub mod error;
pub mod types;

pub use config::ParleyConfig;
pub use error::{ParleyError, Result};
pub use types::*;
