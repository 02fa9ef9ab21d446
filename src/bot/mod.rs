//! Bot module - Core bot functionality.

pub mod dispatcher;
#[cfg(test)]
pub mod mock_api;
mod runtime;
mod webhook;

pub use dispatcher::{AppState, build_dispatcher};
pub use runtime::run;
