//! Product list sort configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sort keys supported by the product list.
///
/// Maps to Shopify's `ProductSortKeys` enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortKey {
    #[default]
    Title,
    CreatedAt,
}

impl SortKey {
    /// The GraphQL enum literal.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::CreatedAt => "CREATED_AT",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognised sort key or direction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported sort option: {0}")]
pub struct SortParseError(pub String);

impl FromStr for SortKey {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TITLE" => Ok(Self::Title),
            "CREATED_AT" => Ok(Self::CreatedAt),
            other => Err(SortParseError(other.to_string())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Shopify expresses direction as a `reverse` flag on the sort key.
    #[must_use]
    pub const fn is_reverse(&self) -> bool {
        matches!(self, Self::Desc)
    }

    /// Inverse of [`Self::is_reverse`].
    #[must_use]
    pub const fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::Desc } else { Self::Asc }
    }
}

/// One-dimensional sort order over the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Parse the `<KEY>-<DIRECTION>` value used by the sort selector
    /// (e.g. `CREATED_AT-DESC`).
    ///
    /// # Errors
    ///
    /// Returns `SortParseError` for unknown keys or directions.
    pub fn parse_option(value: &str) -> Result<Self, SortParseError> {
        let (key, direction) = value
            .rsplit_once('-')
            .ok_or_else(|| SortParseError(value.to_string()))?;
        let direction = match direction {
            "ASC" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            _ => return Err(SortParseError(value.to_string())),
        };
        Ok(Self::new(key.parse()?, direction))
    }
}
