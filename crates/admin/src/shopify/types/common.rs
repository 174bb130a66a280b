//! Common domain types shared across Shopify Admin API.

use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or media image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

// =============================================================================
// Metafield Types
// =============================================================================

/// A metafield for storing custom data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metafield {
    /// Metafield ID.
    pub id: Option<String>,
    /// Namespace for grouping metafields.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// The metafield value.
    pub value: String,
    /// The metafield type (e.g., `single_line_text_field`).
    #[serde(rename = "type")]
    pub kind: String,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Relay-style page information.
///
/// Cursors are opaque tokens only meaningful to Shopify. A `has*Page` flag
/// without its cursor is inconsistent and is read as "no further page".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
    /// Cursor of the first item in this page.
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page.
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// Cursor to request the following page, if one is available.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if !self.has_next_page {
            return None;
        }
        self.end_cursor.as_deref().filter(|c| !c.is_empty())
    }

    /// Cursor to request the preceding page, if one is available.
    #[must_use]
    pub fn previous_cursor(&self) -> Option<&str> {
        if !self.has_previous_page {
            return None;
        }
        self.start_cursor.as_deref().filter(|c| !c.is_empty())
    }
}
