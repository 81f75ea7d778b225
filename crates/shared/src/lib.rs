//! # Kuwetex Shared
//!
//! Common types used across all Kuwetex crates.

pub mod cat;
pub mod config;
pub mod error;
pub mod protocol;
pub mod random;

// Re-exports
pub use cat::*;
pub use config::*;
pub use error::*;
pub use protocol::*;
pub use random::*;
