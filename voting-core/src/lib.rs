//! Core voting data types
//!
//! This crate provides the primitives shared by the engine and its clients:
//! - Participant identities (`Address`)
//! - Proposal indices and vote counters
//! - Parse/serialization errors

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::*;
pub use types::*;
