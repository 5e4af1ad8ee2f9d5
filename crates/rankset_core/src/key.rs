//! Tenant paths and physical key composition.
//!
//! ## Key Format
//!
//! ```text
//! single-key set:  {base}:{tenant}
//! segment i:       {base}:{i}:{tenant}
//! ```
//!
//! The tenant part is a `:`-joined path. When the path is empty the tenant
//! part and its separator are left out.

use std::fmt;

/// Identifies which tenant's copy of a logical set an operation touches.
///
/// A family of sets (one base name) holds one logical set per tenant path,
/// e.g. one leaderboard per `(game, season)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TenantPath {
    parts: Vec<String>,
}

impl TenantPath {
    /// The empty path: the family has a single, shared logical set.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from its components.
    pub fn new<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        Self {
            parts: parts.into_iter().map(|part| part.to_string()).collect(),
        }
    }

    /// Builds a path from numeric ids.
    #[must_use]
    pub fn from_ids(ids: &[u64]) -> Self {
        Self::new(ids)
    }

    /// Returns this path extended by one component.
    #[must_use]
    pub fn child(mut self, part: impl fmt::Display) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// Returns true for the empty path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the path components.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for TenantPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join(":"))
    }
}

impl From<u64> for TenantPath {
    fn from(id: u64) -> Self {
        Self::from_ids(&[id])
    }
}

impl From<&str> for TenantPath {
    fn from(part: &str) -> Self {
        Self::new([part])
    }
}

/// Key of a single-key set, also the identity of a logical set.
pub(crate) fn set_key(base: &str, tenant: &TenantPath) -> String {
    if tenant.is_root() {
        base.to_string()
    } else {
        format!("{base}:{tenant}")
    }
}

/// Key of one segment of a partitioned set.
pub(crate) fn segment_key(base: &str, index: usize, tenant: &TenantPath) -> String {
    if tenant.is_root() {
        format!("{base}:{index}")
    } else {
        format!("{base}:{index}:{tenant}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_display_joins_parts() {
        let tenant = TenantPath::from_ids(&[42, 7]);
        assert_eq!(tenant.to_string(), "42:7");
        assert_eq!(TenantPath::root().to_string(), "");
        assert_eq!(TenantPath::from("eu").child(3).to_string(), "eu:3");
    }

    #[test]
    fn single_keys() {
        assert_eq!(set_key("board", &TenantPath::root()), "board");
        assert_eq!(set_key("board", &TenantPath::from(9u64)), "board:9");
    }

    #[test]
    fn segment_keys() {
        assert_eq!(segment_key("board", 0, &TenantPath::root()), "board:0");
        assert_eq!(
            segment_key("board", 2, &TenantPath::from_ids(&[1, 5])),
            "board:2:1:5"
        );
    }
}
