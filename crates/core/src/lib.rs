//! shopdesk core - shared domain primitives.
//!
//! This crate provides the types used by every shopdesk component:
//! - `admin` - embedded admin backend (GraphQL gateway, routes, sync controller)
//! - `cli` - operator command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no HTTP
//! clients. Anything that talks to Shopify lives in `shopdesk-admin`.
//!
//! # Modules
//!
//! - [`types`] - Shopify global IDs, prices, sort configuration and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
