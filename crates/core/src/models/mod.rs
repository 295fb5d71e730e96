//! Shared domain models.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CatalogError;

/// Opaque identity of a generated place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(Uuid);

impl PlaceId {
    /// Allocate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of place categories offered by the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Fortresses, old towns, monuments.
    #[default]
    Historic,
    /// Theatres, concert halls, galleries.
    Cultural,
    /// Notable buildings and ensembles.
    Architecture,
    /// Museums and exhibitions.
    Museums,
}

impl Category {
    /// Every category, in form order.
    pub const ALL: [Category; 4] = [
        Category::Historic,
        Category::Cultural,
        Category::Architecture,
        Category::Museums,
    ];

    /// Stable lowercase key used in storage.
    pub fn key(self) -> &'static str {
        match self {
            Category::Historic => "historic",
            Category::Cultural => "cultural",
            Category::Architecture => "architecture",
            Category::Museums => "museums",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Historic => "Historic sites",
            Category::Cultural => "Culture",
            Category::Architecture => "Architecture",
            Category::Museums => "Museums",
        }
    }

    /// Following category, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Preceding category, wrapping around.
    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.key() == needle)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_string()))
    }
}

/// A generated point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Identity, unique per catalog load.
    pub id: PlaceId,
    /// Display name; embeds the searched city.
    pub name: String,
    /// Short description from the template table.
    pub description: String,
    /// Category the place was generated for.
    pub category: Category,
    /// Rating in `[4.0, 5.0)` with one decimal.
    pub rating: f32,
    /// Suggested visit duration in whole hours.
    pub hours: u32,
    /// Street address.
    pub address: String,
}

/// Search form state, persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// City text as typed; may be empty.
    pub city: String,
    /// Selected category.
    pub category: Category,
}

impl SearchQuery {
    /// Build a query from a city and category.
    pub fn new(city: impl Into<String>, category: Category) -> Self {
        Self {
            city: city.into(),
            category,
        }
    }

    /// City with surrounding whitespace removed, or `fallback` when blank.
    pub fn city_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        let trimmed = self.city.trim();
        if trimmed.is_empty() {
            fallback
        } else {
            trimmed
        }
    }
}
