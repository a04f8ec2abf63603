//! Field tables for config models
//!
//! `serde` checks types but cannot tell which fields a struct declares, which
//! ones have defaults, or which ones are deprecated. Each config type therefore
//! implements [`ConfigSchema`] and lists its fields as [`FieldSpec`]s. The list
//! is checked once, when the [`Schema`] is built, so that a bad replacement path
//! is a schema error and never a surprise at load time.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, SchemaError, ValidationError};
use crate::path::FieldPath;

/// Conversion applied to a deprecated value before it lands in its replacement
pub type ForwardFn = fn(&Value) -> Result<Value, String>;

type SchemaFn = fn() -> Result<Schema, SchemaError>;
type Validator = fn(&Value) -> Result<(), serde_json::Error>;

/// A config type with a declared field table
///
/// # Example
/// ```
/// use cfgkit_model::{ConfigSchema, Deprecation, FieldSpec};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// #[serde(deny_unknown_fields)]
/// struct Scheduler {
///     warmup_steps: u64,
///     warmup_num_steps: Option<u64>,
/// }
///
/// impl ConfigSchema for Scheduler {
///     const MODEL: &'static str = "Scheduler";
///
///     fn fields() -> Vec<FieldSpec> {
///         vec![
///             FieldSpec::optional("warmup_steps", json!(1000)),
///             FieldSpec::optional("warmup_num_steps", json!(null))
///                 .deprecated(Deprecation::new().replaced_by("warmup_steps")),
///         ]
///     }
/// }
/// ```
pub trait ConfigSchema: Serialize + DeserializeOwned {
    /// Model name used in messages
    const MODEL: &'static str;

    /// Declared fields, in order
    fn fields() -> Vec<FieldSpec>;
}

/// Deprecation options of a field
#[derive(Debug, Clone)]
pub struct Deprecation {
    message: Option<String>,
    new_param: Option<String>,
    set_new_param: bool,
    new_param_fn: Option<ForwardFn>,
}

impl Deprecation {
    /// Deprecated with no replacement and no message
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: None,
            new_param: None,
            set_new_param: true,
            new_param_fn: None,
        }
    }

    /// Extra text appended to the warning
    #[inline]
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Dotted path of the field replacing this one, relative to the declaring model
    #[inline]
    #[must_use]
    pub fn replaced_by(mut self, path: impl Into<String>) -> Self {
        self.new_param = Some(path.into());
        self
    }

    /// Whether the deprecated value is copied into the replacement (default `true`)
    #[inline]
    #[must_use]
    pub fn set_new_param(mut self, enabled: bool) -> Self {
        self.set_new_param = enabled;
        self
    }

    /// Convert the deprecated value before copying it
    #[inline]
    #[must_use]
    pub fn convert_with(mut self, convert: ForwardFn) -> Self {
        self.new_param_fn = Some(convert);
        self
    }

    /// Extra warning text, if any
    #[inline]
    #[must_use]
    pub fn deprecated_msg(&self) -> Option<&str> {
        self.message.as_deref().filter(|msg| !msg.is_empty())
    }

    /// Replacement path as declared, if any
    #[inline]
    #[must_use]
    pub fn new_param(&self) -> Option<&str> {
        self.new_param.as_deref().filter(|path| !path.is_empty())
    }

    /// Whether the replacement receives the deprecated value
    #[inline]
    #[must_use]
    pub fn forwards(&self) -> bool {
        self.set_new_param && self.new_param().is_some()
    }

    /// Apply the conversion function, identity if none was given
    ///
    /// # Errors
    /// Returns the conversion function's message
    pub fn forward(&self, value: &Value) -> Result<Value, String> {
        match self.new_param_fn {
            Some(convert) => convert(value),
            None => Ok(value.clone()),
        }
    }
}

impl Default for Deprecation {
    fn default() -> Self {
        Self::new()
    }
}

/// Declared field of a config model
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    alias: Option<&'static str>,
    default: Option<Value>,
    nested: Option<SchemaFn>,
    deprecation: Option<Deprecation>,
}

impl FieldSpec {
    /// Field without a default
    #[inline]
    #[must_use]
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            alias: None,
            default: None,
            nested: None,
            deprecation: None,
        }
    }

    /// Field with a default value
    #[inline]
    #[must_use]
    pub fn optional(name: &'static str, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::required(name)
        }
    }

    /// Sub-config field, defaulting to a sub-config with all defaults
    #[inline]
    #[must_use]
    pub fn nested<S: ConfigSchema>(name: &'static str) -> Self {
        Self {
            default: Some(Value::Object(serde_json::Map::new())),
            nested: Some(Schema::of::<S>),
            ..Self::required(name)
        }
    }

    /// Replace the default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Make the field required
    #[inline]
    #[must_use]
    pub fn without_default(mut self) -> Self {
        self.default = None;
        self
    }

    /// Also accept the field under another input key
    #[inline]
    #[must_use]
    pub fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Mark the field deprecated
    #[inline]
    #[must_use]
    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecation = Some(deprecation);
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Alternative input key, if any
    #[inline]
    #[must_use]
    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    /// Whether an input key names this field, by name or by alias
    #[inline]
    #[must_use]
    pub fn accepts_key(&self, key: &str) -> bool {
        self.name == key || self.alias == Some(key)
    }

    /// Default value, if any
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the field has no default
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Whether the field holds a sub-config
    #[inline]
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Deprecation options, if deprecated
    #[inline]
    #[must_use]
    pub fn deprecation(&self) -> Option<&Deprecation> {
        self.deprecation.as_ref()
    }
}

/// Checked field table of a config type
#[derive(Debug, Clone)]
pub struct Schema {
    model: &'static str,
    fields: Vec<FieldSpec>,
    nested: HashMap<&'static str, Schema>,
    replacements: HashMap<&'static str, FieldPath>,
    validator: Validator,
}

impl Schema {
    /// Build and check the schema of `T`
    ///
    /// # Errors
    /// Returns error if a field is declared twice or a replacement path does
    /// not resolve to a declared field
    pub fn of<T: ConfigSchema>() -> Result<Self, SchemaError> {
        let model = T::MODEL;
        let fields = T::fields();

        let mut seen = HashSet::new();
        let mut nested = HashMap::new();
        for field in &fields {
            for key in std::iter::once(field.name).chain(field.alias) {
                if !seen.insert(key) {
                    return Err(SchemaError::DuplicateField {
                        model,
                        field: key.to_string(),
                    });
                }
            }
            if let Some(build) = field.nested {
                nested.insert(field.name, build()?);
            }
        }

        let mut schema = Self {
            model,
            fields,
            nested,
            replacements: HashMap::new(),
            validator: validate_as::<T>,
        };

        let mut replacements = HashMap::new();
        for field in &schema.fields {
            let Some(path) = field.deprecation.as_ref().and_then(Deprecation::new_param) else {
                continue;
            };
            let target: FieldPath = path.parse().map_err(|source| SchemaError::InvalidPath {
                model,
                field: field.name.to_string(),
                source,
            })?;
            if !target.is_nested() && target.leaf() == field.name {
                return Err(SchemaError::SelfReplacement {
                    model,
                    field: field.name.to_string(),
                });
            }
            if schema.resolve(&target).is_none() {
                return Err(SchemaError::UnresolvedPath {
                    model,
                    field: field.name.to_string(),
                    path: path.to_string(),
                });
            }
            replacements.insert(field.name, target);
        }
        schema.replacements = replacements;

        Ok(schema)
    }

    /// Model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Declared fields, in order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up the field an input key refers to, by name or by alias
    #[must_use]
    pub fn field_for_key(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.accepts_key(key))
    }

    /// Schema of a sub-config field
    #[inline]
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<&Schema> {
        self.nested.get(name)
    }

    /// Parsed replacement path of a deprecated field
    #[inline]
    #[must_use]
    pub fn replacement(&self, name: &str) -> Option<&FieldPath> {
        self.replacements.get(name)
    }

    /// Schema owning the last segment of `path`
    #[must_use]
    pub fn owner_of(&self, path: &FieldPath) -> Option<&Schema> {
        path.owner()
            .iter()
            .try_fold(self, |schema, segment| schema.nested(segment))
    }

    /// Field addressed by a dotted path
    #[must_use]
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldSpec> {
        self.owner_of(path)?.field(path.leaf())
    }

    /// Default value of a declared, optional field
    ///
    /// # Errors
    /// - [`ConfigError::UnknownField`] if the field is not declared
    /// - [`ConfigError::NoDefault`] if the field is required
    pub fn default_of(&self, name: &str) -> Result<Value, ConfigError> {
        let field = self.field(name).ok_or_else(|| ConfigError::UnknownField {
            model: self.model,
            field: name.to_string(),
        })?;
        field.default().cloned().ok_or_else(|| ConfigError::NoDefault {
            model: self.model,
            field: name.to_string(),
        })
    }

    /// Run type validation of the whole model
    ///
    /// # Errors
    /// Returns [`ValidationError::Type`] if the value does not deserialize
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        (self.validator)(value).map_err(|source| ValidationError::Type {
            model: self.model,
            source,
        })
    }
}

fn validate_as<T: DeserializeOwned>(value: &Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

/// Default of a field of `T`
///
/// # Errors
/// - [`ConfigError::UnknownField`] if `field` is not declared on `T`
/// - [`ConfigError::NoDefault`] if `field` is required
/// - [`ConfigError::Schema`] if the field table of `T` is inconsistent
pub fn get_config_default<T: ConfigSchema>(field: &str) -> Result<Value, ConfigError> {
    Schema::of::<T>()?.default_of(field)
}

/// Fields explicitly supplied by the caller, per sub-config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsSet {
    set: BTreeSet<String>,
    nested: BTreeMap<String, FieldsSet>,
}

impl FieldsSet {
    /// Whether `name` was supplied at this level
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    /// Whether the field at `path` was supplied
    #[must_use]
    pub fn contains_path(&self, path: &FieldPath) -> bool {
        self.owner(path.owner())
            .is_some_and(|owner| owner.contains(path.leaf()))
    }

    /// Record sub-config of a field
    #[inline]
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<&FieldsSet> {
        self.nested.get(name)
    }

    /// Names supplied at this level
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(String::as_str)
    }

    /// Number of fields supplied at this level
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether nothing was supplied at this level
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str) {
        self.set.insert(name.to_string());
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.set.remove(name);
        self.nested.remove(name);
    }

    pub(crate) fn set_nested(&mut self, name: &str, nested: FieldsSet) {
        self.nested.insert(name.to_string(), nested);
    }

    pub(crate) fn nested_mut(&mut self, name: &str) -> &mut FieldsSet {
        self.nested.entry(name.to_string()).or_default()
    }

    fn owner(&self, segments: &[String]) -> Option<&FieldsSet> {
        segments
            .iter()
            .try_fold(self, |set, segment| set.nested(segment))
    }
}

/// Deprecated field found in the caller's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationWarning {
    /// Dotted path of the deprecated field
    pub field: String,
    /// Replacement, as declared on the deprecated field
    pub replacement: Option<String>,
    /// Extra text from the declaration
    pub message: Option<String>,
}

impl DeprecationWarning {
    pub(crate) fn new(field: String, deprecation: &Deprecation) -> Self {
        Self {
            field,
            replacement: deprecation.new_param().map(str::to_string),
            message: deprecation.deprecated_msg().map(str::to_string),
        }
    }
}

impl Display for DeprecationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Config parameter {} is deprecated", self.field)?;
        if let Some(replacement) = &self.replacement {
            write!(f, " use {replacement} instead")?;
        }
        if let Some(message) = &self.message {
            write!(f, ". {message}")?;
        }
        Ok(())
    }
}
