//! Value type catalog.
//!
//! A [`ValueType`] names a value shape (scalar kind + array flag) together
//! with a validator and a default-value factory. Types live in a
//! [`ValueTypeRegistry`]; stages hold the registry behind `Arc`, so it is
//! read-only for as long as any stage uses it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{ScalarType, Value};
use crate::util::{Error, Result};

/// Extra check run on values after the shape check.
pub type Validator = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// Produces the fallback value of a type.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// A registered attribute value type.
#[derive(Clone)]
pub struct ValueType {
    name: String,
    alias: Option<String>,
    scalar: ScalarType,
    array: bool,
    validator: Option<Validator>,
    default_factory: Option<DefaultFactory>,
}

impl ValueType {
    /// Create a type with no extra validation and a zero default.
    pub fn new(name: impl Into<String>, scalar: ScalarType, array: bool) -> Self {
        Self {
            name: name.into(),
            alias: None,
            scalar,
            array,
            validator: None,
            default_factory: None,
        }
    }

    /// Set an alternative name that resolves to this type.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the validator.
    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Set the default value factory.
    pub fn with_default<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(f));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Check that `value` has this type's shape and passes its validator.
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.scalar_type() != self.scalar || value.is_array() != self.array {
            return Err(Error::invalid_value(
                &self.name,
                format!(
                    "expected {}{}, got {}{}",
                    self.scalar,
                    if self.array { "[]" } else { "" },
                    value.scalar_type(),
                    if value.is_array() { "[]" } else { "" },
                ),
            ));
        }
        if let Some(validator) = &self.validator {
            validator(value).map_err(|reason| Error::invalid_value(&self.name, reason))?;
        }
        Ok(())
    }

    /// The fallback value of this type.
    pub fn default_value(&self) -> Value {
        match &self.default_factory {
            Some(factory) => factory(),
            None => self.scalar.zero_value(self.array),
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueType")
            .field("name", &self.name)
            .field("scalar", &self.scalar)
            .field("array", &self.array)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Catalog of value types, keyed by name and alias.
#[derive(Default)]
pub struct ValueTypeRegistry {
    types: Vec<Arc<ValueType>>,
    by_name: HashMap<String, usize>,
}

impl ValueTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog: every [`ScalarType`]
    /// as `Name` (alias `name`) and its array as `NameArray` (alias `name[]`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for scalar in ScalarType::ALL {
            registry.insert(
                ValueType::new(scalar.name(), scalar, false).with_alias(scalar.scene_name()),
            );
            registry.insert(
                ValueType::new(format!("{}Array", scalar.name()), scalar, true)
                    .with_alias(format!("{}[]", scalar.scene_name())),
            );
        }
        registry
    }

    /// The shared built-in registry.
    pub fn builtin() -> Arc<ValueTypeRegistry> {
        static BUILTIN: OnceLock<Arc<ValueTypeRegistry>> = OnceLock::new();
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(Self::with_builtins())))
    }

    /// Register a new value type.
    ///
    /// Fails with [`Error::DuplicateTypeName`] if its name or alias is taken,
    /// and with [`Error::InvalidValue`] if its own default value does not
    /// pass its validator.
    pub fn register(&mut self, value_type: ValueType) -> Result<Arc<ValueType>> {
        if self.by_name.contains_key(value_type.name()) {
            return Err(Error::DuplicateTypeName(value_type.name().to_string()));
        }
        if let Some(alias) = value_type.alias() {
            if alias == value_type.name() || self.by_name.contains_key(alias) {
                return Err(Error::DuplicateTypeName(alias.to_string()));
            }
        }
        value_type.validate(&value_type.default_value())?;

        tracing::trace!(name = value_type.name(), "registered value type");
        Ok(self.insert(value_type))
    }

    /// Register a type from its parts.
    pub fn register_with<V, D>(
        &mut self,
        name: &str,
        scalar: ScalarType,
        array: bool,
        validator: V,
        default_factory: D,
    ) -> Result<Arc<ValueType>>
    where
        V: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
        D: Fn() -> Value + Send + Sync + 'static,
    {
        self.register(
            ValueType::new(name, scalar, array)
                .with_validator(validator)
                .with_default(default_factory),
        )
    }

    /// Look up a type by name or alias.
    pub fn resolve(&self, name: &str) -> Result<Arc<ValueType>> {
        self.by_name
            .get(name)
            .map(|&idx| Arc::clone(&self.types[idx]))
            .ok_or_else(|| Error::UnknownValueType(name.to_string()))
    }

    /// Returns true if `name` resolves to a type.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ValueType>> {
        self.types.iter()
    }

    fn insert(&mut self, value_type: ValueType) -> Arc<ValueType> {
        let idx = self.types.len();
        self.by_name.insert(value_type.name().to_string(), idx);
        if let Some(alias) = value_type.alias() {
            self.by_name.insert(alias.to_string(), idx);
        }
        let value_type = Arc::new(value_type);
        self.types.push(Arc::clone(&value_type));
        value_type
    }
}

impl fmt::Debug for ValueTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.types.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let registry = ValueTypeRegistry::with_builtins();
        assert_eq!(registry.len(), ScalarType::ALL.len() * 2);

        let int = registry.resolve("Int").unwrap();
        assert_eq!(int.name(), "Int");
        assert_eq!(int.scalar_type(), ScalarType::Int);
        assert!(!int.is_array());

        let by_alias = registry.resolve("int").unwrap();
        assert_eq!(by_alias, int);

        let arr = registry.resolve("float3[]").unwrap();
        assert_eq!(arr.name(), "Float3Array");
        assert!(arr.is_array());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ValueTypeRegistry::with_builtins();
        assert!(matches!(
            registry.resolve("Quaternion"),
            Err(Error::UnknownValueType(name)) if name == "Quaternion"
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let mut registry = ValueTypeRegistry::with_builtins();
        let err = registry
            .register(ValueType::new("Int", ScalarType::Int, false))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTypeName(_)));

        let err = registry
            .register(ValueType::new("Integer", ScalarType::Int, false).with_alias("int"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTypeName(name) if name == "int"));
    }

    #[test]
    fn test_validation() {
        let mut registry = ValueTypeRegistry::new();
        let opacity = registry
            .register_with(
                "Opacity",
                ScalarType::Float,
                false,
                |v| match v {
                    Value::Float(f) if (0.0..=1.0).contains(f) => Ok(()),
                    _ => Err("opacity must be within [0, 1]".to_string()),
                },
                || Value::Float(1.0),
            )
            .unwrap();

        assert!(opacity.validate(&Value::Float(0.5)).is_ok());
        assert!(matches!(
            opacity.validate(&Value::Float(2.0)),
            Err(Error::InvalidValue { .. })
        ));
        // Wrong shape is rejected before the validator runs
        assert!(opacity.validate(&Value::Double(0.5)).is_err());
        assert!(opacity.validate(&Value::from(vec![0.5f32])).is_err());
        assert_eq!(opacity.default_value(), Value::Float(1.0));
    }

    #[test]
    fn test_default_must_validate() {
        let mut registry = ValueTypeRegistry::new();
        let err = registry
            .register_with(
                "Positive",
                ScalarType::Int,
                false,
                |v| match v {
                    Value::Int(i) if *i > 0 => Ok(()),
                    _ => Err("must be positive".to_string()),
                },
                || Value::Int(0),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(!registry.contains("Positive"));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = ValueTypeRegistry::builtin();
        let b = ValueTypeRegistry::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
