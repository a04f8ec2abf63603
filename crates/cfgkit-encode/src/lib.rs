//! cfgkit encoders
//!
//! Human-oriented text forms for configuration values.
//!
//! # Core Concepts
//!
//! - [`ScientificEncoder`]: renders a JSON value tree with large numbers in
//!   exponential form, mappings indented and sequences flat
//! - [`PrettyInt`]: integer that prints with thousands separators or a label
//!
//! # Example
//!
//! ```rust
//! use cfgkit_encode::{encode_scientific, PrettyInt};
//! use serde_json::json;
//!
//! let dump = encode_scientific(&json!({"train_batch_size": 4096}));
//! assert_eq!(dump, "{\n    \"train_batch_size\": 4.096000e+03\n}");
//! assert_eq!(PrettyInt::new(4096).to_string(), "4,096");
//! ```

#![warn(unreachable_pub)]

mod pretty;
mod scientific;

pub use pretty::{group_thousands, PrettyInt};
pub use scientific::{
    encode_scientific, format_number, to_pretty_string, ScientificEncoder, DEFAULT_INDENT,
    FALLBACK_SEPARATOR, SCIENTIFIC_THRESHOLD,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
