// properties.rs: Typed property store for stage configuration.
//
// Stages declare their properties up front (name, type, description,
// optional default). Values are held as JSON so that a stage can be
// configured from a file or in code through the same path, and every write
// is checked against the declared type immediately. A mistyped value is a
// configuration error and never reaches `compute`.

use std::any::type_name;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PropertyError;

type TypeCheck = fn(&Value) -> Result<(), serde_json::Error>;

fn check_as<T: DeserializeOwned>(value: &Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

#[derive(Debug, Clone)]
struct Property {
    description: String,
    type_name: &'static str,
    check: TypeCheck,
    default: Option<Value>,
    value: Option<Value>,
}

impl Property {
    fn current(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default.as_ref())
    }
}

/// A set of declared, typed properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    properties: BTreeMap<String, Property>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property of type `T` without a default.
    pub fn declare<T: DeserializeOwned>(&mut self, name: &str, description: &str) -> &mut Self {
        self.insert::<T>(name, description, None)
    }

    /// Declare a property of type `T` with a default value.
    ///
    /// The default is written as JSON so declarations stay infallible.
    pub fn declare_with_default<T: DeserializeOwned>(
        &mut self,
        name: &str,
        default: Value,
        description: &str,
    ) -> &mut Self {
        self.insert::<T>(name, description, Some(default))
    }

    fn insert<T: DeserializeOwned>(
        &mut self,
        name: &str,
        description: &str,
        default: Option<Value>,
    ) -> &mut Self {
        self.properties.insert(
            name.to_string(),
            Property {
                description: description.to_string(),
                type_name: type_name::<T>(),
                check: check_as::<T>,
                default,
                value: None,
            },
        );
        self
    }

    /// Set a property from a typed value.
    pub fn set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), PropertyError> {
        let json = serde_json::to_value(value).map_err(|source| PropertyError::Serialization {
            name: name.to_string(),
            source,
        })?;
        self.set_value(name, json)
    }

    /// Set a property from a raw JSON value, checking the declared type.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let property = self
            .properties
            .get_mut(name)
            .ok_or_else(|| PropertyError::Undeclared(name.to_string()))?;
        (property.check)(&value).map_err(|source| PropertyError::TypeMismatch {
            name: name.to_string(),
            expected: property.type_name,
            source,
        })?;
        property.value = Some(value);
        Ok(())
    }

    /// Remove an explicitly set value; the default (if any) applies again.
    pub fn reset(&mut self, name: &str) -> Result<(), PropertyError> {
        let property = self
            .properties
            .get_mut(name)
            .ok_or_else(|| PropertyError::Undeclared(name.to_string()))?;
        property.value = None;
        Ok(())
    }

    /// The value (or default) of a property.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, PropertyError> {
        self.get_opt(name)?
            .ok_or_else(|| PropertyError::Undefined(name.to_string()))
    }

    /// The value (or default) of a property, or `None` if it has neither.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, PropertyError> {
        let property = self
            .properties
            .get(name)
            .ok_or_else(|| PropertyError::Undeclared(name.to_string()))?;
        property
            .current()
            .map(|value| {
                T::deserialize(value).map_err(|source| PropertyError::TypeMismatch {
                    name: name.to_string(),
                    expected: type_name::<T>(),
                    source,
                })
            })
            .transpose()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .is_some_and(|p| p.current().is_some())
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.description.as_str())
    }

    /// Summary of every property for display.
    pub fn summary(&self) -> Vec<PropertySummary> {
        self.properties
            .iter()
            .map(|(name, p)| PropertySummary {
                name: name.clone(),
                description: p.description.clone(),
                type_name: p.type_name.to_string(),
                value: p.current().cloned(),
            })
            .collect()
    }
}

/// A property as shown to users (e.g. by `mtk run --json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySummary {
    pub name: String,
    pub description: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
