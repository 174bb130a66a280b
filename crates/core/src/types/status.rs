//! Product status.

use serde::{Deserialize, Serialize};

/// Product publication status.
///
/// Maps to Shopify's `ProductStatus` values. Statuses added upstream after
/// this list was written deserialize as `Unknown` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
    Archived,
    Unlisted,
    #[serde(other)]
    Unknown,
}

impl ProductStatus {
    /// Whether the product is live on the storefront.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_known_and_unknown() {
        let status: ProductStatus = serde_json::from_str("\"DRAFT\"").unwrap();
        assert_eq!(status, ProductStatus::Draft);

        let status: ProductStatus = serde_json::from_str("\"SCHEDULED\"").unwrap();
        assert_eq!(status, ProductStatus::Unknown);
    }

    #[test]
    fn test_is_active() {
        assert!(ProductStatus::Active.is_active());
        assert!(!ProductStatus::Archived.is_active());
    }
}
