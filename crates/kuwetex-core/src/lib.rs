//! # Kuwetex Core
//!
//! Builds every component from a [`shared::KuwetexConfig`] and starts them
//! as one running server.

mod kuwetex_core;

pub use kuwetex_core::{KuwetexCore, RunningKuwetex};
