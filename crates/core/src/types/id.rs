//! Shopify global identifiers.
//!
//! Shopify names every entity with a global ID of the form
//! `gid://shopify/<Type>/<numeric-id>`. Use the `define_gid!` macro to create
//! type-safe wrappers that prevent accidentally mixing IDs from different
//! resource types.

use thiserror::Error;

/// Prefix shared by every Shopify global ID.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Error returned when a global ID has no numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {resource} identifier: {value:?}")]
pub struct GidError {
    /// Resource type the identifier was parsed as.
    pub resource: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Extract the numeric suffix of a global ID.
///
/// Accepts a full GID (`gid://shopify/ProductVariant/42`), any other
/// slash-separated path, or a bare number. Only the text after the last `/`
/// is inspected.
#[must_use]
pub fn numeric_suffix(value: &str) -> Option<u64> {
    let tail = value.trim().rsplit('/').next()?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Macro to define a type-safe Shopify global ID wrapper.
///
/// Creates a newtype wrapper around the numeric suffix with:
/// - `Serialize`/`Deserialize` as the canonical GID string
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_u64()`, `parse()` and `to_gid()`
/// - `Display` rendering the canonical GID
///
/// # Example
///
/// ```rust
/// # use shopdesk_core::define_gid;
/// define_gid!(MetaobjectGid, "Metaobject");
///
/// let id = MetaobjectGid::parse("gid://shopify/Metaobject/7").unwrap();
/// assert_eq!(id.as_u64(), 7);
/// assert_eq!(id.to_string(), "gid://shopify/Metaobject/7");
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Shopify resource type name embedded in the GID.
            pub const RESOURCE: &'static str = $resource;

            /// Create an ID from its numeric suffix.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the numeric suffix.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Parse a full GID or a bare numeric ID.
            ///
            /// # Errors
            ///
            /// Returns `GidError` if the text after the last `/` is not an
            /// unsigned integer.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::types::id::GidError> {
                $crate::types::id::numeric_suffix(value)
                    .map(Self)
                    .ok_or_else(|| $crate::types::id::GidError {
                        resource: $resource,
                        value: value.to_string(),
                    })
            }

            /// Render the canonical `gid://shopify/<Type>/<id>` form.
            #[must_use]
            pub fn to_gid(&self) -> String {
                format!("{}{}/{}", $crate::types::id::GID_PREFIX, $resource, self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}{}/{}", $crate::types::id::GID_PREFIX, $resource, self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::GidError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&raw).map_err(::serde::de::Error::custom)
            }
        }
    };
}

define_gid!(ProductGid, "Product");
define_gid!(VariantGid, "ProductVariant");
define_gid!(InventoryItemGid, "InventoryItem");
define_gid!(LocationGid, "Location");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_suffix_accepts_gid_and_bare_number() {
        assert_eq!(numeric_suffix("gid://shopify/ProductVariant/42"), Some(42));
        assert_eq!(numeric_suffix("42"), Some(42));
        assert_eq!(numeric_suffix(" 7 "), Some(7));
    }

    #[test]
    fn test_numeric_suffix_rejects_non_numeric_tail() {
        assert_eq!(numeric_suffix("gid://shopify/ProductVariant/abc"), None);
        assert_eq!(numeric_suffix("gid://shopify/ProductVariant/"), None);
        assert_eq!(numeric_suffix("gid://shopify/Location/1.5"), None);
        assert_eq!(numeric_suffix("-3"), None);
        assert_eq!(numeric_suffix(""), None);
    }

    #[test]
    fn test_canonical_gid_uses_resource_type() {
        let variant = VariantGid::parse("gid://shopify/Whatever/99").unwrap();
        assert_eq!(variant.to_gid(), "gid://shopify/ProductVariant/99");

        let location = LocationGid::parse("12").unwrap();
        assert_eq!(location.to_string(), "gid://shopify/Location/12");
    }

    #[test]
    fn test_parse_error_names_resource() {
        let err = InventoryItemGid::parse("gid://shopify/InventoryItem/x").unwrap_err();
        assert_eq!(err.resource, "InventoryItem");
        assert!(err.to_string().contains("InventoryItem"));
    }

    #[test]
    fn test_gid_serde_uses_string_form() {
        let id = ProductGid::new(5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/Product/5\"");

        let back: ProductGid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
