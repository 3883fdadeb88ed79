//! Enumeration types shared by the registration service.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of activity an event offers.
///
/// The wire and database names are the ones the browser client filters on
/// (`akademik`, `sosyal`, `kariyer`, `spor`, `diger`). The English names
/// are accepted on input as well. Events created without a category fall
/// into [`Category::Other`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Category {
    /// Lectures, seminars and workshops.
    #[serde(rename = "akademik")]
    #[serde(alias = "academic")]
    Academic,
    /// Club meetings, parties and festivals.
    #[serde(rename = "sosyal")]
    #[serde(alias = "social")]
    Social,
    /// Job fairs and company talks.
    #[serde(rename = "kariyer")]
    #[serde(alias = "career")]
    Career,
    /// Tournaments and fitness sessions.
    #[serde(rename = "spor")]
    #[serde(alias = "sports")]
    Sports,
    /// Anything that does not fit the categories above.
    #[default]
    #[serde(rename = "diger")]
    #[serde(alias = "other")]
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::Academic,
        Self::Social,
        Self::Career,
        Self::Sports,
        Self::Other,
    ];

    /// The lowercase wire and database name of this category.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "akademik",
            Self::Social => "sosyal",
            Self::Career => "kariyer",
            Self::Sports => "spor",
            Self::Other => "diger",
        }
    }

    const fn english_name(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Social => "social",
            Self::Career => "career",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }

    /// Parse a category from its wire name or its English name. Returns
    /// `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name || c.english_name() == name)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role of a user account.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// A student who browses events and registers for them.
    #[default]
    Student,
    /// An administrator who creates events and accounts.
    Admin,
}

impl Role {
    /// The lowercase wire and database name of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its wire name. Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}
