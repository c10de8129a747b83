//! Identifiers and ordering enumerations shared across the catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store-assigned product identifier. Valid identifiers are strictly positive.
pub type ProductId = i64;

/// Identifier of the acting user, resolved by the auth collaborator.
pub type UserId = i64;

/// Minimal user identity used for `liked_by` membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
}

impl UserRef {
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(UnknownName(value.to_string())),
        }
    }
}

/// Product fields a search may be ordered by.
///
/// This is the whitelist: caller-provided `sortBy` values are parsed into this
/// enum and never forwarded to a store verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Name,
    Description,
    Price,
    Category,
    Subcategory,
    Stock,
    LikesCount,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Id,
        SortField::Name,
        SortField::Description,
        SortField::Price,
        SortField::Category,
        SortField::Subcategory,
        SortField::Stock,
        SortField::LikesCount,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Description => "description",
            SortField::Price => "price",
            SortField::Category => "category",
            SortField::Subcategory => "subcategory",
            SortField::Stock => "stock",
            SortField::LikesCount => "likesCount",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = UnknownName;

    /// Accepts the camelCase field name or its snake_case column spelling.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        SortField::ALL
            .into_iter()
            .find(|field| field.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownName(value.to_string()))
    }
}

/// Returned when a name does not map onto a known enumeration variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name `{}`", self.0)
    }
}

impl std::error::Error for UnknownName {}
