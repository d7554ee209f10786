//! Field paths for addressing values within a structure
//!
//! Provides [`FieldPath`], used both as the validator's error location and as
//! the breadcrumb shown while the wizard descends into nested values.

use std::fmt::{self, Display, Formatter};

/// Path from a structure root to a (possibly nested) value
///
/// # Examples
/// - `["scores", "0", "value"]` → `scores.0.value`
/// - breadcrumb form: `scores > 0 > value`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path with a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (structure root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level field name
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Segments joined with ` > `
    #[inline]
    #[must_use]
    pub fn breadcrumb(&self) -> String {
        self.0.join(" > ")
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for FieldPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_does_not_mutate_parent() {
        let root = FieldPath::root();
        let inner = root.child("inner");
        let value = inner.child("value");
        assert!(root.is_empty());
        assert_eq!(inner.len(), 1);
        assert_eq!(value.to_string(), "inner.value");
        assert_eq!(value.breadcrumb(), "inner > value");
        assert_eq!(value.first(), Some("inner"));
        assert_eq!(value.last(), Some("value"));
    }

    #[test]
    fn from_str_slice() {
        let path = FieldPath::from(&["scores", "0", "value"][..]);
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.breadcrumb(), "scores > 0 > value");
    }
}
