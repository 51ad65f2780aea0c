use serde::{Deserialize, Serialize};
use std::fmt;

// NewType pattern: the identity key of a product within a source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductLink(pub String);

impl ProductLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductLink {
    fn from(link: &str) -> Self {
        ProductLink(link.to_string())
    }
}

impl From<String> for ProductLink {
    fn from(link: String) -> Self {
        ProductLink(link)
    }
}

/// One product entry observed during one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub link: ProductLink,
    pub title: String,
    pub in_stock: bool,
}

impl AvailabilityRecord {
    pub fn new(link: impl Into<ProductLink>, title: impl Into<String>, in_stock: bool) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            in_stock,
        }
    }
}
