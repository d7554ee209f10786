//! Engine configuration

use crate::resolver::ResolverMode;

/// Default ceiling for nested structure recursion
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Tunables for one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fallback policy for unrecognized annotations
    pub mode: ResolverMode,
    /// Maximum nesting of structures inside structures
    pub max_depth: usize,
    /// Repair rounds before giving up; `None` asks indefinitely
    pub max_repair_rounds: Option<usize>,
}

impl EngineOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With resolver mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    /// With maximum structure depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// With repair round cap
    #[inline]
    #[must_use]
    pub fn with_max_repair_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_repair_rounds = rounds;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode: ResolverMode::Open,
            max_depth: DEFAULT_MAX_DEPTH,
            max_repair_rounds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = EngineOptions::new()
            .with_mode(ResolverMode::Closed)
            .with_max_depth(4)
            .with_max_repair_rounds(Some(2));
        assert_eq!(opts.mode, ResolverMode::Closed);
        assert_eq!(opts.max_depth, 4);
        assert_eq!(opts.max_repair_rounds, Some(2));
        assert_eq!(EngineOptions::default().max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(EngineOptions::default().max_repair_rounds, None);
    }
}
