//! Registry of known structures and enumerations
//!
//! Provides [`Catalog`], the lookup table that turns the names appearing in
//! annotations (`InnerModel`, `demo.SampleEnum`) into definitions.

use crate::error::ResolveClassError;
use crate::structure::{EnumDef, StructureDef};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named structure and enumeration definitions
///
/// Entries are keyed by qualified name. Lookups accept either the qualified
/// name or a short name that is unique across the catalog.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    structures: BTreeMap<String, Arc<StructureDef>>,
    enums: BTreeMap<String, Arc<EnumDef>>,
}

impl Catalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structure, replacing any previous one with the same name
    pub fn insert_structure(&mut self, structure: StructureDef) -> Arc<StructureDef> {
        let structure = Arc::new(structure);
        self.structures
            .insert(structure.qualified_name().to_string(), Arc::clone(&structure));
        structure
    }

    /// Register an enumeration, replacing any previous one with the same name
    pub fn insert_enum(&mut self, enumeration: EnumDef) -> Arc<EnumDef> {
        let enumeration = Arc::new(enumeration);
        self.enums
            .insert(enumeration.qualified_name().to_string(), Arc::clone(&enumeration));
        enumeration
    }

    /// Builder form of [`Catalog::insert_structure`]
    #[must_use]
    pub fn with_structure(mut self, structure: StructureDef) -> Self {
        self.insert_structure(structure);
        self
    }

    /// Builder form of [`Catalog::insert_enum`]
    #[must_use]
    pub fn with_enum(mut self, enumeration: EnumDef) -> Self {
        self.insert_enum(enumeration);
        self
    }

    /// Look up a structure by qualified or unique short name
    ///
    /// # Errors
    /// Returns [`ResolveClassError`] if the name is unknown or ambiguous.
    pub fn resolve_structure(&self, name: &str) -> Result<Arc<StructureDef>, ResolveClassError> {
        lookup(&self.structures, name, |s| s.name())
    }

    /// Structure by name, `None` when unknown or ambiguous
    #[must_use]
    pub fn structure(&self, name: &str) -> Option<Arc<StructureDef>> {
        self.resolve_structure(name).ok()
    }

    /// Enumeration by qualified or unique short name
    #[must_use]
    pub fn enumeration(&self, name: &str) -> Option<Arc<EnumDef>> {
        lookup(&self.enums, name, |e| e.name()).ok()
    }

    /// All structures, ordered by qualified name
    pub fn structures(&self) -> impl Iterator<Item = &Arc<StructureDef>> {
        self.structures.values()
    }

    /// All enumerations, ordered by qualified name
    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumDef>> {
        self.enums.values()
    }

    /// Number of registered structures
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Check if no structure is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

fn lookup<T>(
    map: &BTreeMap<String, Arc<T>>,
    name: &str,
    short: impl Fn(&T) -> &str,
) -> Result<Arc<T>, ResolveClassError> {
    if let Some(found) = map.get(name) {
        return Ok(Arc::clone(found));
    }
    let mut matches = map.iter().filter(|(_, def)| short(def.as_ref()) == name);
    match (matches.next(), matches.next()) {
        (Some((_, def)), None) => Ok(Arc::clone(def)),
        (None, _) => Err(ResolveClassError::unknown(name)),
        (Some((first, _)), Some((second, _))) => {
            let mut candidates = vec![first.clone(), second.clone()];
            candidates.extend(matches.map(|(qualified, _)| qualified.clone()));
            Err(ResolveClassError::Ambiguous {
                name: name.to_string(),
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_structure(StructureDef::new("app.db.DatabaseConfig"))
            .with_structure(StructureDef::new("app.a.Shared"))
            .with_structure(StructureDef::new("app.b.Shared"))
            .with_enum(EnumDef::new("app.Mode", [("FAST", Scalar::from("fast"))]).unwrap())
    }

    #[test]
    fn resolves_qualified_and_short_names() {
        let c = catalog();
        assert_eq!(
            c.resolve_structure("app.db.DatabaseConfig").unwrap().name(),
            "DatabaseConfig"
        );
        assert_eq!(
            c.resolve_structure("DatabaseConfig").unwrap().qualified_name(),
            "app.db.DatabaseConfig"
        );
        assert!(c.enumeration("Mode").is_some());
        assert!(c.enumeration("DatabaseConfig").is_none());
    }

    #[test]
    fn unknown_and_ambiguous_names() {
        let c = catalog();
        assert_eq!(
            c.resolve_structure("Missing").unwrap_err(),
            ResolveClassError::unknown("Missing")
        );
        match c.resolve_structure("Shared").unwrap_err() {
            ResolveClassError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["app.a.Shared", "app.b.Shared"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(c.structure("app.b.Shared").is_some());
    }

    #[test]
    fn listing_is_sorted() {
        let names: Vec<_> = catalog()
            .structures()
            .map(|s| s.qualified_name().to_string())
            .collect();
        assert_eq!(names, vec!["app.a.Shared", "app.b.Shared", "app.db.DatabaseConfig"]);
        assert_eq!(catalog().len(), 3);
    }
}
