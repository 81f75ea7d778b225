//! # Kuwetex Gateway
//!
//! Network face of the simulation. The [`KuwetexServer`] accepts TCP
//! clients and hands each one to a [`SessionDispatcher`], which answers
//! requests against the shared litter box and data bank. Logged-in
//! sessions are tracked in the [`ConnectionRegistry`].
//!
//! Frames are newline-delimited JSON, see [`codec`].

pub mod codec;
mod client;
mod registry;
mod server;
mod session;

pub use client::Connection;
pub use registry::{ConnectionRegistry, SessionHandle};
pub use server::KuwetexServer;
pub use session::{
    SessionContext, SessionDispatcher, SessionState, CLEANING_DONE, CLEANING_FAILED, CONNECTED,
    LOGGED_OUT,
};
