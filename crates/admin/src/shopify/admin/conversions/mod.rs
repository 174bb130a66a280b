//! Type conversions from GraphQL response types to domain types.
//!
//! These functions convert the hand-written response shapes in `queries`
//! into our clean domain types.

mod products;

pub use products::{convert_metafields, convert_product, convert_product_page};
