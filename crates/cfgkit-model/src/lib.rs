//! cfgkit config models
//!
//! Typed configuration objects built on `serde`, with the bookkeeping `serde`
//! does not do on its own.
//!
//! # Core Concepts
//!
//! - [`ConfigSchema`]: field table of a config type (defaults, sub-configs,
//!   deprecations)
//! - [`ConfigModel<T>`]: validated instance that remembers which fields the
//!   caller supplied
//! - [`Deprecation`]: marks a field as deprecated and optionally forwards its
//!   value to a replacement, possibly inside a sub-config
//! - [`parse_json_strict`]: JSON loading that refuses repeated keys
//!
//! # Example
//!
//! ```rust
//! use cfgkit_model::{ConfigModel, ConfigSchema, Deprecation, FieldSpec};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! #[serde(deny_unknown_fields)]
//! struct Training {
//!     micro_batch: u32,
//!     batch: Option<u32>,
//! }
//!
//! impl ConfigSchema for Training {
//!     const MODEL: &'static str = "Training";
//!
//!     fn fields() -> Vec<FieldSpec> {
//!         vec![
//!             FieldSpec::optional("micro_batch", json!(1)),
//!             FieldSpec::optional("batch", json!(null))
//!                 .deprecated(Deprecation::new().replaced_by("micro_batch")),
//!         ]
//!     }
//! }
//!
//! let model = ConfigModel::<Training>::from_json_str(r#"{"batch": 8}"#, false).unwrap();
//! assert_eq!(model.micro_batch, 8);
//! assert_eq!(model.batch, None);
//! assert_eq!(model.warnings().len(), 1);
//! ```

#![warn(unreachable_pub)]

mod duplicate;
mod dtype;
mod error;
mod model;
mod params;
mod path;
mod schema;

pub use duplicate::{parse_json_strict, reject_duplicate_keys, DuplicateKeyError};
pub use dtype::{DType, DTypeError};
pub use error::{ConfigError, Result, SchemaError, ValidationError};
pub use model::{ConfigModel, AUTO, AUTO_EXEMPT_FIELD};
pub use params::{get_dict_param, get_list_param, get_scalar_param};
pub use path::{FieldPath, PathError};
pub use schema::{
    get_config_default, ConfigSchema, Deprecation, DeprecationWarning, FieldSpec, FieldsSet,
    ForwardFn, Schema,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
