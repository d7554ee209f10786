//! YAML schema-definition files
//!
//! ```yaml
//! enums:
//!   demo.Level:
//!     LOW: low
//!     HIGH: high
//! structures:
//!   demo.Server:
//!     description: A server
//!     fields:
//!       host: { type: str }
//!       port: { type: int, default: 8080, ge: 1, le: 65535 }
//!       level: { type: Level, default: low }
//! ```
//!
//! Loading is two-phase. Definitions are built first with their defaults
//! kept as untyped values; once every name is known, each default is
//! decoded through the strategy for its field, so a default may refer to
//! enums and structures declared further down the file.

use crate::error::{PersistError, Result};
use confwiz_core::{HandlerRegistry, ResolverMode, Transport, TypeResolver};
use confwiz_schema::{
    parse_decimal, Catalog, Constraints, Decimal, DefaultFactory, EnumDef, FieldDef, Scalar, SchemaError, StructureDef,
    TypeExpr, Value,
};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    enums: IndexMap<String, IndexMap<String, RawScalar>>,
    #[serde(default)]
    structures: IndexMap<String, RawStructure>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStructure {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: IndexMap<String, RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    #[serde(rename = "type")]
    annotation: String,
    #[serde(default, deserialize_with = "present")]
    default: Option<JsonValue>,
    default_factory: Option<String>,
    description: Option<String>,
    ge: Option<RawScalar>,
    le: Option<RawScalar>,
    gt: Option<RawScalar>,
    lt: Option<RawScalar>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    #[serde(default)]
    frozen: bool,
    #[serde(default = "yes")]
    init: bool,
}

/// An explicit `default: null` is a default, not a missing key
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error> {
    JsonValue::deserialize(deserializer).map(Some)
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl RawScalar {
    fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Bool(b) => Some(Scalar::Bool(*b)),
            Self::Int(i) => Some(Scalar::Int(*i)),
            Self::Str(s) => Some(Scalar::Str(s.clone())),
            Self::Float(_) => None,
        }
    }

    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Float(x) => parse_decimal(&x.to_string()),
            Self::Str(s) => parse_decimal(s),
            Self::Bool(_) => None,
        }
    }
}

/// Parses schema files into a [`Catalog`]
#[derive(Debug, Clone, Copy)]
pub struct SchemaLoader<'r> {
    registry: &'r HandlerRegistry,
    mode: ResolverMode,
}

impl<'r> SchemaLoader<'r> {
    /// Loader decoding defaults through `registry`
    #[inline]
    #[must_use]
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self {
            registry,
            mode: ResolverMode::Open,
        }
    }

    /// Resolver mode used for default decoding
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    /// Read and parse the schema file at `path`
    ///
    /// # Errors
    /// [`PersistError`] for I/O, YAML, definition or default failures.
    pub fn load(&self, path: &Path) -> Result<Catalog> {
        let text = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        self.parse(&text, path)
    }

    /// Parse schema text; `origin` labels errors
    ///
    /// # Errors
    /// [`PersistError`] for YAML, definition or default failures.
    pub fn parse(&self, text: &str, origin: &Path) -> Result<Catalog> {
        let raw: Option<RawSchema> = serde_yaml::from_str(text).map_err(|e| PersistError::yaml(origin, e))?;
        let raw = raw.unwrap_or_default();

        let enums = raw
            .enums
            .iter()
            .map(|(name, members)| build_enum(name, members, origin))
            .collect::<Result<Vec<_>>>()?;
        let mut structures = raw
            .structures
            .iter()
            .map(|(name, def)| build_structure(name, def, origin))
            .collect::<Result<Vec<_>>>()?;

        let draft = build_catalog(&enums, &structures);
        let resolver = TypeResolver::new(&draft).with_mode(self.mode);
        let tx = Transport::new(self.registry, resolver);
        for (structure, raw_structure) in structures.iter_mut().zip(raw.structures.values()) {
            for (name, raw_field) in &raw_structure.fields {
                let Some(raw_default) = &raw_field.default else {
                    continue;
                };
                let typed = decode_default(structure, name, raw_default, &tx, origin)?;
                structure.set_default(name, typed);
            }
        }

        let catalog = build_catalog(&enums, &structures);
        tracing::debug!(
            origin = %origin.display(),
            structures = structures.len(),
            enums = enums.len(),
            "loaded schema"
        );
        Ok(catalog)
    }
}

/// Load a schema file with the default strategies
///
/// # Errors
/// [`PersistError`] for I/O, YAML, definition or default failures.
pub fn load_schema(path: &Path) -> Result<Catalog> {
    SchemaLoader::new(&HandlerRegistry::with_defaults()).load(path)
}

fn build_catalog(enums: &[EnumDef], structures: &[StructureDef]) -> Catalog {
    let mut catalog = Catalog::new();
    for enumeration in enums {
        catalog.insert_enum(enumeration.clone());
    }
    for structure in structures {
        catalog.insert_structure(structure.clone());
    }
    catalog
}

fn build_enum(name: &str, members: &IndexMap<String, RawScalar>, origin: &Path) -> Result<EnumDef> {
    let members = members
        .iter()
        .map(|(member, raw)| {
            raw.to_scalar().map(|value| (member.clone(), value)).ok_or_else(|| {
                PersistError::invalid(origin, format!("enum {name}.{member} must be a string, integer or boolean"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    EnumDef::new(name, members).map_err(|source| PersistError::Schema {
        path: origin.to_path_buf(),
        source,
    })
}

fn build_structure(name: &str, raw: &RawStructure, origin: &Path) -> Result<StructureDef> {
    let schema_err = |source: SchemaError| PersistError::Schema {
        path: origin.to_path_buf(),
        source,
    };
    let mut structure = StructureDef::new(name);
    if let Some(description) = &raw.description {
        structure = structure.with_description(description.clone());
    }
    for (field_name, raw_field) in &raw.fields {
        let field = build_field(name, field_name, raw_field, origin)?;
        structure.add_field(field).map_err(schema_err)?;
    }
    Ok(structure)
}

fn build_field(structure: &str, name: &str, raw: &RawField, origin: &Path) -> Result<FieldDef> {
    let schema_err = |source: SchemaError| PersistError::Schema {
        path: origin.to_path_buf(),
        source,
    };
    let annotation: TypeExpr = raw
        .annotation
        .parse()
        .map_err(|e| schema_err(SchemaError::Annotation(e)))?;

    let bound = |key: &str, value: &Option<RawScalar>| -> Result<Option<Decimal>> {
        value
            .as_ref()
            .map(|v| {
                v.to_decimal().ok_or_else(|| {
                    PersistError::invalid(origin, format!("{structure}.{name}: '{key}' must be a number"))
                })
            })
            .transpose()
    };
    if let Some(pattern) = &raw.pattern {
        regex::Regex::new(pattern).map_err(|e| {
            schema_err(SchemaError::InvalidPattern {
                field: format!("{structure}.{name}"),
                message: e.to_string(),
            })
        })?;
    }
    let constraints = Constraints {
        ge: bound("ge", &raw.ge)?,
        le: bound("le", &raw.le)?,
        gt: bound("gt", &raw.gt)?,
        lt: bound("lt", &raw.lt)?,
        min_length: raw.min_length,
        max_length: raw.max_length,
        pattern: raw.pattern.clone(),
    };

    let mut field = FieldDef::new(name, annotation).with_constraints(constraints);
    if let Some(description) = &raw.description {
        field = field.describe(description.clone());
    }
    if let Some(factory) = &raw.default_factory {
        field = field.with_factory(DefaultFactory::builtin(factory).map_err(schema_err)?);
    }
    if let Some(default) = &raw.default {
        field = field.with_default(Value::from_json(default));
    }
    if raw.frozen || !raw.init {
        field = field.immutable();
    }
    Ok(field)
}

fn decode_default(
    structure: &StructureDef,
    name: &str,
    raw: &JsonValue,
    tx: &Transport<'_>,
    origin: &Path,
) -> Result<Value> {
    let Some(field) = structure.field_named(name) else {
        return Err(PersistError::invalid(origin, format!("{}.{name} vanished", structure.name())));
    };
    let descriptor = tx.resolver().describe(field).map_err(|source| PersistError::Resolution {
        path: origin.to_path_buf(),
        source,
    })?;
    tx.deserialize(raw, &descriptor).map_err(|source| PersistError::Default {
        path: origin.to_path_buf(),
        structure: structure.qualified_name().to_string(),
        field: name.to_string(),
        source,
    })
}
