//! confwiz Persist - saved configurations and schema files
//!
//! - [`ConfigDocument`]: the `_metadata` / `configuration` YAML document
//!   written after a successful wizard run and read back by `edit` and
//!   `validate`
//! - [`SchemaLoader`]: builds a [`Catalog`](confwiz_schema::Catalog) from a
//!   YAML schema-definition file

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod schema_file;

pub use document::{ConfigDocument, Metadata, CONFIGURATION_KEY, METADATA_KEY};
pub use error::{PersistError, Result};
pub use schema_file::{load_schema, SchemaLoader};

/// Version of this crate, written into every saved document
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
