//! Ordered strategy dispatch
//!
//! Selection is first-match over the sequence. The default seed ends with
//! the string strategy, which applies to everything, so every descriptor
//! selects something.

use crate::descriptor::{FieldDescriptor, TemporalKind};
use crate::error::WizardError;
use crate::strategies::{
    BoolStrategy, DecimalStrategy, EnumStrategy, FloatStrategy, IntStrategy, ListStrategy,
    LiteralStrategy, MapStrategy, NestedStrategy, OptionalStrategy, SetStrategy, StrStrategy,
    TemporalStrategy, UnionStrategy,
};
use crate::strategy::Strategy;
use std::fmt;

/// Where a newly registered strategy goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    /// Highest priority, ahead of built-ins
    #[default]
    Front,
    /// Lowest priority
    Append,
}

/// Ordered sequence of strategies
pub struct HandlerRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl HandlerRegistry {
    /// Registry with no strategies
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Registry seeded with the built-in strategies
    #[must_use]
    pub fn with_defaults() -> Self {
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(OptionalStrategy),
            Box::new(UnionStrategy),
            Box::new(ListStrategy),
            Box::new(SetStrategy),
            Box::new(MapStrategy),
            Box::new(BoolStrategy),
            Box::new(EnumStrategy),
            Box::new(LiteralStrategy),
            Box::new(DecimalStrategy),
            Box::new(IntStrategy),
            Box::new(FloatStrategy),
            Box::new(TemporalStrategy::new(TemporalKind::DateTime)),
            Box::new(TemporalStrategy::new(TemporalKind::Time)),
            Box::new(TemporalStrategy::new(TemporalKind::Duration)),
            Box::new(NestedStrategy),
            Box::new(StrStrategy),
        ];
        Self { strategies }
    }

    /// Register ahead of every existing strategy
    pub fn register<S: Strategy + 'static>(&mut self, strategy: S) {
        self.register_with(strategy, Placement::Front);
    }

    /// Register at the given end of the sequence
    pub fn register_with<S: Strategy + 'static>(&mut self, strategy: S, placement: Placement) {
        tracing::debug!(strategy = strategy.name(), ?placement, "registering strategy");
        match placement {
            Placement::Front => self.strategies.insert(0, Box::new(strategy)),
            Placement::Append => self.strategies.push(Box::new(strategy)),
        }
    }

    /// First applicable strategy, if any
    #[must_use]
    pub fn find(&self, field: &FieldDescriptor) -> Option<&dyn Strategy> {
        self.strategies
            .iter()
            .find(|s| s.applies(field))
            .map(|s| &**s)
    }

    /// First applicable strategy
    ///
    /// # Errors
    /// [`WizardError::NoStrategy`] when nothing applies, which only happens
    /// for registries built without the default seed.
    pub fn select(&self, field: &FieldDescriptor) -> Result<&dyn Strategy, WizardError> {
        self.find(field).ok_or_else(|| WizardError::NoStrategy {
            field: field.name().to_string(),
            shape: field.shape().to_string(),
        })
    }

    /// Strategy names in priority order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Number of strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
