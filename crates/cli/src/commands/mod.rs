//! Command implementations.

use shopdesk_admin::config::ConfigError;
use shopdesk_admin::services::{ListError, SyncError};
use shopdesk_admin::shopify::AdminShopifyError;
use shopdesk_core::GidError;
use thiserror::Error;

pub mod browse;
pub mod products;
pub mod render;
pub mod webhooks;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shopify(#[from] AdminShopifyError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    InvalidId(#[from] GidError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(output: &str) {
    println!("{output}");
}
