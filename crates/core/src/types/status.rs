//! Order status filtering.
//!
//! Upstream status values are free text (`Created`, `ESIM_Generated`, ...) and
//! are always compared case-insensitively. The console's status tabs include a
//! synthetic `All` entry that disables status filtering.

use serde::{Deserialize, Serialize};

/// Status tabs shown by the order console, in display order.
pub const STATUS_TABS: &[&str] = &[
    "All",
    "Created",
    "Processed",
    "Email_Sent",
    "ESIM_Generated",
    "Cancelled",
];

/// Sales platforms the console offers as filter choices.
pub const KNOWN_PLATFORMS: &[&str] = &["Shopee", "Lazada"];

/// Product types the console offers as filter choices.
pub const KNOWN_PRODUCT_TYPES: &[&str] = &["eSIM"];

/// Status criterion for the order view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// No status filtering.
    #[default]
    All,
    /// Keep only orders whose status equals this value, ignoring case.
    Is(String),
}

impl StatusFilter {
    /// Whether `status` passes this filter.
    #[must_use]
    pub fn matches(&self, status: &str) -> bool {
        match self {
            Self::All => true,
            Self::Is(wanted) => wanted.eq_ignore_ascii_case(status),
        }
    }

    /// Whether this filter lets every status through.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Is(status) => write!(f, "{status}"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Is(s.to_owned()))
        }
    }
}

impl From<&str> for StatusFilter {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }
}
