//! Validated config models
//!
//! [`ConfigModel::construct`] runs, in order:
//! 1. the `"auto"` placeholder filter, at every level (skipped in strict mode)
//! 2. schema normalization: unknown keys rejected, defaults filled in,
//!    sub-configs normalized with their own schema
//! 3. type validation of the whole model
//! 4. the deprecated-field pass, which warns about every deprecated field the
//!    caller supplied and forwards its value to the replacement field
//! 5. deserialization into `T`

use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

use cfgkit_encode::encode_scientific;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::duplicate::parse_json_strict;
use crate::error::{ConfigError, Result, ValidationError};
use crate::path::{join, FieldPath};
use crate::schema::{ConfigSchema, DeprecationWarning, FieldSpec, FieldsSet, Schema};

/// Placeholder meaning "let the framework decide"
pub const AUTO: &str = "auto";

/// Field that keeps the placeholder even in non-strict mode
pub const AUTO_EXEMPT_FIELD: &str = "replace_method";

/// Config value of type `T` that passed validation and migration
#[derive(Debug, Clone)]
pub struct ConfigModel<T> {
    value: T,
    data: Value,
    fields_set: FieldsSet,
    warnings: Vec<DeprecationWarning>,
    schema: Schema,
    strict: bool,
}

impl<T: ConfigSchema> ConfigModel<T> {
    /// Build a model from a raw mapping
    ///
    /// Unless `strict` is set, entries whose value is the string `"auto"` are
    /// dropped first (except `replace_method`), in the top-level mapping and in
    /// every sub-config, so those fields fall back to their defaults.
    ///
    /// # Errors
    /// - [`ConfigError::Validation`] for unknown, missing or mistyped fields
    /// - [`ConfigError::Conflict`] if a deprecated field and its replacement
    ///   were both supplied
    /// - [`ConfigError::Forward`], [`ConfigError::Removal`] or
    ///   [`ConfigError::Assignment`] if forwarding a deprecated value fails
    /// - [`ConfigError::Schema`] if the field table of `T` is inconsistent
    pub fn construct(raw: Map<String, Value>, strict: bool) -> Result<Self> {
        let schema = Schema::of::<T>()?;
        let (normalized, mut fields_set) = normalize(&schema, raw, None, strict)?;
        let mut data = Value::Object(normalized);
        schema.validate(&data)?;

        let mut pass = Pass::new(strict);
        migrate_deprecated(&schema, &mut data, &mut fields_set, None, &mut pass)?;
        let warnings = pass.warnings;

        let value = deserialize::<T>(&schema, &data)?;
        tracing::debug!(
            "Built {} with {} explicit fields, {} deprecation warnings",
            T::MODEL,
            fields_set.len(),
            warnings.len()
        );

        Ok(Self {
            value,
            data,
            fields_set,
            warnings,
            schema,
            strict,
        })
    }

    /// Build a model from a JSON value, which must be an object
    ///
    /// # Errors
    /// Same as [`ConfigModel::construct`], plus [`ValidationError::ExpectedObject`]
    /// if `value` is not an object
    pub fn from_value(value: Value, strict: bool) -> Result<Self> {
        match value {
            Value::Object(raw) => Self::construct(raw, strict),
            _ => Err(ValidationError::ExpectedObject {
                model: T::MODEL,
                path: String::new(),
            }
            .into()),
        }
    }

    /// Parse JSON text, rejecting duplicate keys, and build a model
    ///
    /// # Errors
    /// [`ConfigError::InvalidJson`] or [`ConfigError::DuplicateKeys`] for bad
    /// text, otherwise same as [`ConfigModel::from_value`]
    pub fn from_json_str(text: &str, strict: bool) -> Result<Self> {
        Self::from_value(parse_json_strict(text)?, strict)
    }

    /// Parse YAML text and build a model
    ///
    /// # Errors
    /// [`ConfigError::InvalidYaml`] for bad text, otherwise same as
    /// [`ConfigModel::from_value`]
    pub fn from_yaml_str(text: &str, strict: bool) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value, strict)
    }

    /// Assign a field by dotted path and validate the result
    ///
    /// A mapping assigned to a sub-config is normalized with the mode the
    /// model was built in and its deprecated fields are forwarded; their
    /// warnings are appended to [`ConfigModel::warnings`]. The model is
    /// unchanged if anything fails. On success the field counts as explicitly
    /// set.
    ///
    /// # Errors
    /// - [`ConfigError::Path`] if `path` is malformed
    /// - [`ConfigError::Validation`] if the field is unknown or the value is rejected
    /// - [`ConfigError::Conflict`], [`ConfigError::Forward`],
    ///   [`ConfigError::Removal`] or [`ConfigError::Assignment`] if forwarding a
    ///   deprecated field of an assigned mapping fails
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let target: FieldPath = path.parse()?;
        let mut data = self.data.clone();
        let mut fields_set = self.fields_set.clone();

        let mut pass = Pass::new(self.strict);
        assign(&self.schema, &mut data, &mut fields_set, &target, value, None, &mut pass)?;
        self.schema.validate(&data)?;
        let typed = deserialize::<T>(&self.schema, &data)?;

        self.value = typed;
        self.data = data;
        self.fields_set = fields_set;
        self.warnings.extend(pass.warnings);
        Ok(())
    }

    /// Default of a declared field of this model
    ///
    /// # Errors
    /// [`ConfigError::UnknownField`] or [`ConfigError::NoDefault`]
    pub fn default_of(&self, field: &str) -> Result<Value> {
        self.schema.default_of(field)
    }
}

impl<T> ConfigModel<T> {
    /// Typed value
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Take the typed value
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Normalized data, fields in declaration order
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Fields the caller supplied
    #[inline]
    #[must_use]
    pub fn fields_set(&self) -> &FieldsSet {
        &self.fields_set
    }

    /// Whether the field at a dotted path was explicitly supplied
    #[must_use]
    pub fn is_set(&self, path: &str) -> bool {
        path.parse::<FieldPath>()
            .is_ok_and(|path| self.fields_set.contains_path(&path))
    }

    /// Deprecated fields found while building
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[DeprecationWarning] {
        &self.warnings
    }

    /// Checked field table
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Human-readable dump, large numbers in scientific notation
    #[must_use]
    pub fn repr(&self) -> String {
        encode_scientific(&self.data)
    }
}

impl<T> Deref for ConfigModel<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Display for ConfigModel<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Settings and output of one build or mutation
struct Pass {
    strict: bool,
    warnings: Vec<DeprecationWarning>,
}

impl Pass {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }
}

/// Drop `"auto"` placeholders from one mapping level
fn drop_auto(raw: Map<String, Value>, prefix: Option<&str>) -> Map<String, Value> {
    raw.into_iter()
        .filter(|(key, value)| {
            let keep = key == AUTO_EXEMPT_FIELD || value.as_str() != Some(AUTO);
            if !keep {
                tracing::debug!("Dropping placeholder value for '{}'", join(prefix, key));
            }
            keep
        })
        .collect()
}

fn deserialize<T: ConfigSchema>(schema: &Schema, data: &Value) -> Result<T> {
    T::deserialize(data).map_err(|source| {
        ValidationError::Type {
            model: schema.model(),
            source,
        }
        .into()
    })
}

/// Check keys, fill defaults and record which fields were supplied
///
/// Unless `strict` is set, `"auto"` placeholders are dropped first at this
/// level and in every sub-config.
fn normalize(
    schema: &Schema,
    raw: Map<String, Value>,
    prefix: Option<&str>,
    strict: bool,
) -> std::result::Result<(Map<String, Value>, FieldsSet), ValidationError> {
    let mut raw = if strict { raw } else { drop_auto(raw, prefix) };
    if let Some(unknown) = raw.keys().find(|key| schema.field_for_key(key).is_none()) {
        return Err(ValidationError::UnknownField {
            model: schema.model(),
            path: join(prefix, unknown),
        });
    }

    let mut out = Map::with_capacity(schema.fields().len());
    let mut fields_set = FieldsSet::default();
    for field in schema.fields() {
        let name = field.name();
        let path = join(prefix, name);
        let by_name = raw.remove(name);
        // Alias wins when both keys are present
        let supplied = field.alias().and_then(|alias| raw.remove(alias)).or(by_name);
        match supplied {
            Some(value) => {
                let (value, nested) = normalize_field(schema, field, value, &path, strict)?;
                fields_set.insert(name);
                if let Some(nested) = nested {
                    fields_set.set_nested(name, nested);
                }
                out.insert(name.to_string(), value);
            }
            None => {
                let Some(default) = field.default() else {
                    return Err(ValidationError::MissingField {
                        model: schema.model(),
                        path,
                    });
                };
                let (value, _) = normalize_field(schema, field, default.clone(), &path, strict)?;
                out.insert(name.to_string(), value);
            }
        }
    }

    Ok((out, fields_set))
}

/// Normalize a single value; sub-configs go through their own schema
fn normalize_field(
    schema: &Schema,
    field: &FieldSpec,
    value: Value,
    path: &str,
    strict: bool,
) -> std::result::Result<(Value, Option<FieldsSet>), ValidationError> {
    let Some(nested) = schema.nested(field.name()) else {
        return Ok((value, None));
    };
    match value {
        Value::Object(raw) => {
            let (normalized, fields_set) = normalize(nested, raw, Some(path), strict)?;
            Ok((Value::Object(normalized), Some(fields_set)))
        }
        Value::Null => Ok((Value::Null, None)),
        _ => Err(ValidationError::ExpectedObject {
            model: nested.model(),
            path: path.to_string(),
        }),
    }
}

/// Put `value` at `target`, normalize and migrate it, mark it set and
/// validate its owner
///
/// `target` is relative to `schema`; `prefix` is the label of `schema` itself.
fn assign(
    schema: &Schema,
    data: &mut Value,
    fields_set: &mut FieldsSet,
    target: &FieldPath,
    value: Value,
    prefix: Option<&str>,
    pass: &mut Pass,
) -> Result<()> {
    let mut owner_schema = schema;
    let mut owner = data;
    let mut owner_set = fields_set;
    let mut walked: Option<String> = prefix.map(str::to_string);

    for segment in target.owner() {
        let path = join(walked.as_deref(), segment);
        let nested = owner_schema
            .nested(segment)
            .ok_or_else(|| ValidationError::UnknownField {
                model: owner_schema.model(),
                path: path.clone(),
            })?;
        owner = match owner.get_mut(segment.as_str()) {
            Some(child) if child.is_object() => child,
            _ => {
                return Err(ValidationError::ExpectedObject {
                    model: nested.model(),
                    path,
                }
                .into())
            }
        };
        owner_set = owner_set.nested_mut(segment);
        owner_schema = nested;
        walked = Some(path);
    }

    let leaf = target.leaf();
    let path = join(walked.as_deref(), leaf);
    let field = owner_schema
        .field(leaf)
        .ok_or_else(|| ValidationError::UnknownField {
            model: owner_schema.model(),
            path: path.clone(),
        })?;
    let (mut value, mut nested_set) =
        normalize_field(owner_schema, field, value, &path, pass.strict)?;
    if let (Some(nested), Some(set)) = (owner_schema.nested(leaf), nested_set.as_mut()) {
        migrate_deprecated(nested, &mut value, set, Some(&path), pass)?;
    }

    let Value::Object(map) = owner else {
        return Err(ValidationError::ExpectedObject {
            model: owner_schema.model(),
            path,
        }
        .into());
    };
    map.insert(leaf.to_string(), value);
    owner_set.insert(leaf);
    if let Some(nested_set) = nested_set {
        owner_set.set_nested(leaf, nested_set);
    }

    owner_schema.validate(owner)?;
    Ok(())
}

/// Warn about supplied deprecated fields and forward their values
///
/// Sub-configs are migrated before the fields of the model that owns them.
fn migrate_deprecated(
    schema: &Schema,
    data: &mut Value,
    fields_set: &mut FieldsSet,
    prefix: Option<&str>,
    pass: &mut Pass,
) -> Result<()> {
    for field in schema.fields() {
        let name = field.name();
        let Some(nested) = schema.nested(name) else {
            continue;
        };
        if let Some(child) = data.get_mut(name).filter(|child| child.is_object()) {
            let path = join(prefix, name);
            migrate_deprecated(nested, child, fields_set.nested_mut(name), Some(&path), pass)?;
        }
    }

    for field in schema.fields() {
        if field.deprecation().is_some() && fields_set.contains(field.name()) {
            process_deprecated(schema, field, data, fields_set, prefix, pass)?;
        }
    }
    Ok(())
}

fn process_deprecated(
    schema: &Schema,
    field: &FieldSpec,
    data: &mut Value,
    fields_set: &mut FieldsSet,
    prefix: Option<&str>,
    pass: &mut Pass,
) -> Result<()> {
    let Some(deprecation) = field.deprecation() else {
        return Ok(());
    };
    let name = field.name();
    let label = join(prefix, name);

    let warning = DeprecationWarning::new(label.clone(), deprecation);
    tracing::warn!("{}", warning);
    pass.warnings.push(warning);

    if !deprecation.forwards() {
        return Ok(());
    }
    let Some(target) = schema.replacement(name) else {
        return Ok(());
    };
    let replacement = target.to_string();

    let current = data.get(name).cloned().unwrap_or(Value::Null);
    let forwarded = deprecation.forward(&current).map_err(|message| {
        tracing::error!(
            "Tried converting deprecated '{}' for '{}': {}",
            label,
            replacement,
            message
        );
        ConfigError::Forward {
            field: label.clone(),
            replacement: replacement.clone(),
            message,
        }
    })?;

    if fields_set.contains_path(target) {
        return Err(ConfigError::Conflict {
            deprecated: label,
            replacement,
        });
    }

    reset_to_default(schema, field, data, fields_set, &label, pass.strict).map_err(|source| {
        tracing::error!("Tried removing deprecated '{}' from config", label);
        ConfigError::Removal {
            field: label.clone(),
            source,
        }
    })?;

    // Errors raised by the replacement's own deprecated fields pass through
    assign(schema, data, fields_set, target, forwarded, prefix, pass).map_err(|err| match err {
        ConfigError::Validation(source) => {
            tracing::error!(
                "Tried setting value for '{}' with value from deprecated '{}'",
                replacement,
                label
            );
            ConfigError::Assignment {
                field: label.clone(),
                replacement: replacement.clone(),
                source,
            }
        }
        other => other,
    })
}

fn reset_to_default(
    schema: &Schema,
    field: &FieldSpec,
    data: &mut Value,
    fields_set: &mut FieldsSet,
    label: &str,
    strict: bool,
) -> std::result::Result<(), ValidationError> {
    let default = field
        .default()
        .cloned()
        .ok_or_else(|| ValidationError::MissingField {
            model: schema.model(),
            path: label.to_string(),
        })?;
    let (default, _) = normalize_field(schema, field, default, label, strict)?;
    let Value::Object(map) = data else {
        return Err(ValidationError::ExpectedObject {
            model: schema.model(),
            path: label.to_string(),
        });
    };
    map.insert(field.name().to_string(), default);
    fields_set.remove(field.name());
    Ok(())
}
