//! Annotation to shape resolution
//!
//! [`TypeResolver::resolve`] is pure: the same annotation against the same
//! catalog always produces an equal [`FieldShape`]. Rules are tried in a
//! fixed order (union, list, set, map, literal, enumeration, structure,
//! built-in) and the first match wins.

use crate::descriptor::{FieldDescriptor, FieldShape, PrimitiveKind, TemporalKind};
use crate::error::ResolutionError;
use confwiz_schema::{BuiltinType, Catalog, FieldDef, StructureDef, TypeExpr, Value};

/// What happens to annotations no rule recognizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverMode {
    /// Fall back to a string shape
    #[default]
    Open,
    /// Raise [`ResolutionError::Unrecognized`]
    Closed,
}

/// Reduces annotations to shapes, looking user names up in a [`Catalog`]
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'c> {
    catalog: &'c Catalog,
    mode: ResolverMode,
}

impl<'c> TypeResolver<'c> {
    /// Open-world resolver over `catalog`
    #[inline]
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            mode: ResolverMode::Open,
        }
    }

    /// With mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    /// Catalog names are resolved against
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Resolve an annotation to its shape
    ///
    /// # Errors
    /// Only in [`ResolverMode::Closed`], for unrecognized names.
    pub fn resolve(&self, annotation: &TypeExpr) -> Result<FieldShape, ResolutionError> {
        match annotation {
            TypeExpr::Union(alternatives) => self.resolve_union(alternatives),
            TypeExpr::List(elem) => Ok(FieldShape::List(Box::new(self.resolve_element(elem)?))),
            TypeExpr::Set(elem) => Ok(FieldShape::Set(Box::new(self.resolve_element(elem)?))),
            TypeExpr::Dict(kv) => match kv {
                Some(kv) => Ok(FieldShape::Map {
                    key: kv.0.clone(),
                    value: Box::new(self.resolve(&kv.1)?),
                }),
                None => Ok(FieldShape::Map {
                    key: TypeExpr::named("str"),
                    value: Box::new(FieldShape::any()),
                }),
            },
            TypeExpr::Literal(choices) => Ok(FieldShape::Literal(choices.clone())),
            TypeExpr::Named(name) => self.resolve_named(name, annotation),
            TypeExpr::Any => Ok(FieldShape::any()),
            TypeExpr::NoneType => self.fallback(annotation),
        }
    }

    fn resolve_element(&self, elem: &Option<Box<TypeExpr>>) -> Result<FieldShape, ResolutionError> {
        match elem {
            Some(elem) => self.resolve(elem),
            None => Ok(FieldShape::any()),
        }
    }

    fn resolve_union(&self, alternatives: &[TypeExpr]) -> Result<FieldShape, ResolutionError> {
        let mut flat = Vec::new();
        flatten(alternatives, &mut flat);
        let had_none = flat.iter().any(|alt| matches!(alt, TypeExpr::NoneType));
        let mut present: Vec<&TypeExpr> = Vec::new();
        for alt in flat.into_iter().filter(|alt| !matches!(alt, TypeExpr::NoneType)) {
            if !present.contains(&alt) {
                present.push(alt);
            }
        }

        let shape = match present.as_slice() {
            [] => return self.fallback(&TypeExpr::Union(alternatives.to_vec())),
            [single] => self.resolve(single)?,
            many => FieldShape::TaggedUnion(
                many.iter()
                    .map(|alt| self.resolve(alt))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(if had_none {
            FieldShape::Optional(Box::new(shape))
        } else {
            shape
        })
    }

    fn resolve_named(&self, name: &str, annotation: &TypeExpr) -> Result<FieldShape, ResolutionError> {
        if let Some(def) = self.catalog.enumeration(name) {
            return Ok(FieldShape::Enumeration(def));
        }
        if let Some(def) = self.catalog.structure(name) {
            return Ok(FieldShape::Nested(def));
        }
        match BuiltinType::from_name(name) {
            Some(builtin) => Ok(builtin_shape(builtin)),
            None => self.fallback(annotation),
        }
    }

    fn fallback(&self, annotation: &TypeExpr) -> Result<FieldShape, ResolutionError> {
        match self.mode {
            ResolverMode::Open => {
                tracing::debug!(%annotation, "unrecognized annotation, using str");
                Ok(FieldShape::Primitive(PrimitiveKind::Str))
            }
            ResolverMode::Closed => Err(ResolutionError::Unrecognized {
                annotation: annotation.to_string(),
            }),
        }
    }

    /// Build the descriptor for one field
    ///
    /// A field without default whose shape is optional is not required and
    /// defaults to absence.
    ///
    /// # Errors
    /// Propagates [`TypeResolver::resolve`] failures.
    pub fn describe(&self, field: &FieldDef) -> Result<FieldDescriptor, ResolutionError> {
        let shape = self.resolve(&field.annotation)?;
        let mut default = field.default.clone();
        let mut required = !field.has_default();
        if required && shape.is_optional() {
            required = false;
            default = Some(Value::Null);
        }
        Ok(FieldDescriptor::new(field.name.clone(), shape)
            .required(required)
            .with_default(default)
            .with_factory(field.default_factory.clone())
            .with_constraints(field.constraints.clone())
            .with_description(field.description.clone())
            .mutable(field.mutable))
    }

    /// Descriptors for every field of `structure`, in declaration order
    ///
    /// # Errors
    /// Propagates [`TypeResolver::resolve`] failures.
    pub fn introspect(&self, structure: &StructureDef) -> Result<Vec<FieldDescriptor>, ResolutionError> {
        structure.fields().iter().map(|f| self.describe(f)).collect()
    }
}

fn flatten<'t>(alternatives: &'t [TypeExpr], out: &mut Vec<&'t TypeExpr>) {
    for alt in alternatives {
        match alt {
            TypeExpr::Union(inner) => flatten(inner, out),
            other => out.push(other),
        }
    }
}

fn builtin_shape(builtin: BuiltinType) -> FieldShape {
    match builtin {
        BuiltinType::Str => FieldShape::Primitive(PrimitiveKind::Str),
        BuiltinType::Int => FieldShape::Primitive(PrimitiveKind::Int),
        BuiltinType::Float => FieldShape::Primitive(PrimitiveKind::Float),
        BuiltinType::Bool => FieldShape::Primitive(PrimitiveKind::Bool),
        BuiltinType::Decimal => FieldShape::Primitive(PrimitiveKind::Decimal),
        BuiltinType::DateTime => FieldShape::Temporal(TemporalKind::DateTime),
        BuiltinType::Time => FieldShape::Temporal(TemporalKind::Time),
        BuiltinType::Duration => FieldShape::Temporal(TemporalKind::Duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confwiz_test_utils::{complex_config, fixture_catalog, ty};
    use pretty_assertions::assert_eq;

    fn shape(text: &str) -> FieldShape {
        let catalog = fixture_catalog();
        TypeResolver::new(&catalog).resolve(&ty(text)).unwrap()
    }

    #[test]
    fn single_alternative_with_none_is_optional() {
        assert_eq!(
            shape("Optional[int]"),
            FieldShape::Optional(Box::new(FieldShape::Primitive(PrimitiveKind::Int)))
        );
        assert_eq!(shape("int | None").to_string(), "int | None");
    }

    #[test]
    fn several_alternatives_form_tagged_union() {
        let s = shape("InnerModel | SimpleConfig");
        assert!(matches!(&s, FieldShape::TaggedUnion(alts) if alts.len() == 2));
        assert!(!s.is_optional());

        let s = shape("Union[InnerModel, Union[SimpleConfig, None]]");
        match s {
            FieldShape::Optional(inner) => {
                assert_eq!(inner.to_string(), "InnerModel | SimpleConfig");
            }
            other => panic!("expected optional, got {other:?}"),
        }
    }

    #[test]
    fn collections_default_missing_elements_to_any() {
        assert_eq!(shape("list"), FieldShape::List(Box::new(FieldShape::any())));
        assert_eq!(shape("set").to_string(), "set[Any]");
        assert_eq!(shape("dict").to_string(), "dict[str, Any]");
        assert_eq!(shape("dict[int, list[Decimal]]").to_string(), "dict[int, list[Decimal]]");
    }

    #[test]
    fn names_resolve_catalog_before_builtins() {
        assert!(matches!(shape("SampleEnum"), FieldShape::Enumeration(_)));
        assert!(matches!(shape("demo.InnerModel"), FieldShape::Nested(_)));
        assert_eq!(shape("timedelta"), FieldShape::Temporal(TemporalKind::Duration));
        assert_eq!(shape("Any"), FieldShape::any());
    }

    #[test]
    fn unknown_names_fall_back_to_str_in_open_mode() {
        assert_eq!(shape("pathlib.Path"), FieldShape::Primitive(PrimitiveKind::Str));
        assert_eq!(shape("tuple[int, str]"), FieldShape::Primitive(PrimitiveKind::Str));
    }

    #[test]
    fn closed_mode_rejects_unknown_names() {
        let catalog = fixture_catalog();
        let resolver = TypeResolver::new(&catalog).with_mode(ResolverMode::Closed);
        let err = resolver.resolve(&ty("list[pathlib.Path]")).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::Unrecognized {
                annotation: "pathlib.Path".into()
            }
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        for text in ["InnerModel | SimpleConfig | None", "dict[str, set[SampleEnum]]", "Literal['a', 1]"] {
            assert_eq!(shape(text), shape(text));
        }
    }

    #[test]
    fn implicit_optional_defaults_to_absent() {
        let catalog = fixture_catalog();
        let resolver = TypeResolver::new(&catalog);
        let field = FieldDef::new("maybe", ty("int | None"));
        let desc = resolver.describe(&field).unwrap();
        assert!(!desc.is_required());
        assert_eq!(desc.default(), Some(&Value::Null));

        let field = FieldDef::new("needed", ty("int"));
        assert!(resolver.describe(&field).unwrap().is_required());
    }

    #[test]
    fn introspect_keeps_declaration_order() {
        let catalog = fixture_catalog();
        let names: Vec<String> = TypeResolver::new(&catalog)
            .introspect(&complex_config())
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(
            names,
            ["name", "mode", "strategy", "inner", "optional_inner", "tags", "scores", "modifiers", "metadata", "alt"]
        );
    }
}
