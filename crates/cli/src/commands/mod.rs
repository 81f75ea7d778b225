//! CLI Commands

pub mod request;
pub mod serve;

pub use request::{Request, RequestCommand};
pub use serve::ServeCommand;
