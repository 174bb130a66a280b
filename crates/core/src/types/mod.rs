//! Core types for shopdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod sort;
pub mod status;

pub use id::*;
pub use price::{Price, PriceError, format_usd};
pub use sort::{SortConfig, SortDirection, SortKey, SortParseError};
pub use status::ProductStatus;
