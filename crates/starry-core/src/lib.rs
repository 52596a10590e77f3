pub mod api;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod filter;
pub mod models;
pub mod notifications;
pub mod preferences;
pub mod runtime;
pub mod secure_storage;
pub mod session;
pub mod state;
pub mod store;
pub mod streaming;
pub mod tracing_setup;

#[cfg(test)]
mod test_support;

pub use commands::Action;
pub use config::{ConsoleConfig, Credential};
pub use error::ConsoleError;
pub use runtime::{ConsoleRuntime, Handled};
pub use state::{BlobKind, ConsoleState};
