//! confwiz Core - interactive acquisition of typed configuration
//!
//! Turns a [`StructureDef`](confwiz_schema::StructureDef) into a sequence of
//! prompts and back:
//! - [`TypeResolver`] classifies each field annotation into a [`FieldShape`]
//! - [`HandlerRegistry`] picks the first [`Strategy`] that applies to a shape
//! - [`RecursiveEngine`] walks a structure, recursing into nested ones
//! - [`ValidationRepairLoop`] validates the result and offers repair
//!
//! Strategies also own the transport form of their values, so the same
//! registry writes and reloads saved configurations.
//!
//! # Example
//!
//! ```rust
//! use confwiz_core::{HandlerRegistry, RecursiveEngine, ScriptedPrompter};
//! use confwiz_schema::{Catalog, FieldDef, StructureDef, Value};
//!
//! let structure = StructureDef::new("demo.Server")
//!     .field(FieldDef::new("host", "str".parse().unwrap()))
//!     .field(FieldDef::new("port", "int".parse().unwrap()).with_default(8080));
//! let catalog = Catalog::new().with_structure(structure.clone());
//! let registry = HandlerRegistry::with_defaults();
//!
//! let mut prompter = ScriptedPrompter::new(["localhost", ""]);
//! let values = RecursiveEngine::new(&registry, &catalog)
//!     .acquire_structure(&structure, None, "Server", &mut prompter)
//!     .unwrap();
//! assert_eq!(values["port"], Value::Int(8080));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod options;
pub mod prompt;
pub mod registry;
pub mod repair;
pub mod resolver;
pub mod strategies;
pub mod strategy;

pub use descriptor::{FieldDescriptor, FieldShape, PrimitiveKind, TemporalKind};
pub use engine::{AcquireContext, RecursiveEngine};
pub use error::{Aborted, InputError, ResolutionError, TransportError, WizardError};
pub use options::{EngineOptions, DEFAULT_MAX_DEPTH};
pub use prompt::{InputCheck, Prompter, ScriptedPrompter, ABORT_ANSWER};
pub use registry::{HandlerRegistry, Placement};
pub use repair::{RepairOutcome, RepairState, ValidationRepairLoop};
pub use resolver::{ResolverMode, TypeResolver};
pub use strategy::{Strategy, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
