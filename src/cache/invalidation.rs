//! Invalidation Rules
//!
//! What each kind of write must drop from the response cache.

use std::fmt;

use crate::cache::keys::{
    admin_key, cart_key_prefix, CacheKey, ADMIN_NAMESPACE, PRODUCT_LIST_NAMESPACE,
};

// == Invalidation ==
/// A set of cache keys to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Every entry
    All,
    /// Exactly one key
    Key(String),
    /// Every key starting with the prefix (ordered range scan)
    Prefix(String),
    /// Every key containing the pattern anywhere (full scan)
    Substring(String),
}

impl Invalidation {
    /// A single product's detail entry.
    pub fn product(id: &str) -> Self {
        Self::Key(CacheKey::product(id).to_string())
    }

    /// Every product listing variant.
    pub fn product_lists() -> Self {
        Self::Prefix(format!("{PRODUCT_LIST_NAMESPACE}:"))
    }

    /// Every content variant of one cart.
    pub fn cart(cart_id: &str) -> Self {
        Self::Prefix(cart_key_prefix(cart_id))
    }

    /// One admin resource, or the whole admin namespace when `endpoint` is
    /// `None`.
    pub fn admin(endpoint: Option<&str>) -> Self {
        match endpoint {
            Some(endpoint) => Self::Key(admin_key(endpoint)),
            None => Self::Prefix(format!("{ADMIN_NAMESPACE}:")),
        }
    }

    /// Free-form pattern; `None` means everything.
    pub fn pattern(pattern: Option<&str>) -> Self {
        match pattern {
            Some(pattern) => Self::Substring(pattern.to_string()),
            None => Self::All,
        }
    }

    /// Whether `key` is covered by this invalidation.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Key(exact) => key == exact,
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Substring(pattern) => key.contains(pattern.as_str()),
        }
    }
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Key(key) => write!(f, "{key}"),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Substring(pattern) => write!(f, "*{pattern}*"),
        }
    }
}

/// Invalidations a product write triggers.
///
/// With `include_lists` off, listings keep serving the old product until their
/// TTL runs out.
pub fn for_product_write(product_id: &str, include_lists: bool) -> Vec<Invalidation> {
    let mut out = vec![Invalidation::product(product_id)];
    if include_lists {
        out.push(Invalidation::product_lists());
    }
    out
}
