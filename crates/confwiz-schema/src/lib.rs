//! confwiz Schema - structure definitions and dynamic values
//!
//! The schema side of the configuration wizard:
//! - [`TypeExpr`]: raw field annotations, parsed from their usual spelling
//! - [`StructureDef`] / [`FieldDef`] / [`EnumDef`]: the definitions the wizard introspects
//! - [`Value`] / [`ValueMap`]: what acquisition produces
//! - [`Catalog`]: name lookup for structures and enumerations
//! - [`Validator`] / [`SchemaValidator`]: authoritative validation with field paths
//!
//! # Example
//!
//! ```rust
//! use confwiz_schema::{Catalog, FieldDef, SchemaValidator, StructureDef, Validator, Value, ValueMap};
//!
//! let structure = StructureDef::new("demo.Server")
//!     .field(FieldDef::new("host", "str".parse().unwrap()))
//!     .field(FieldDef::new("port", "int".parse().unwrap()).with_default(8080));
//! let catalog = Catalog::new().with_structure(structure.clone());
//!
//! let mut values = ValueMap::new();
//! values.insert("host".into(), Value::str("localhost"));
//! let instance = SchemaValidator::new(&catalog).validate(&structure, &values).unwrap();
//! assert_eq!(instance.values()["port"], Value::Int(8080));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod annotation;
pub mod catalog;
pub mod error;
pub mod path;
pub mod structure;
pub mod validate;
pub mod value;

pub use annotation::{BuiltinType, TypeExpr};
pub use catalog::Catalog;
pub use error::{FactoryError, ParseAnnotationError, ResolveClassError, SchemaError, TemporalParseError};
pub use path::FieldPath;
pub use structure::{Constraints, DefaultFactory, EnumDef, FieldDef, StructureDef};
pub use validate::{parse_decimal, FieldError, Instance, SchemaValidator, Validator};
pub use value::{format_seconds, format_time, parse_time, EnumMember, Scalar, Timestamp, Value, ValueMap};

/// Re-exported so downstream crates agree on the decimal type
pub use rust_decimal::Decimal;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
