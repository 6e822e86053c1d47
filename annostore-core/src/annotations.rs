//! Per-entity annotation maps and the per-dataset schema registry.
//!
//! An [`Annotations`] map only stores values. Type discipline is enforced by
//! the [`AnnotationSchema`] owned by the dataset: the first write of a key
//! fixes its type, later writes and reads must agree.

use crate::error::{Error, Result};
use crate::value::{AnnotationValue, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value annotations attached to one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    values: BTreeMap<String, AnnotationValue>,
}

impl Annotations {
    /// Create an empty annotation map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for a key, without any schema check.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Annotation keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnnotationValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(
        &mut self,
        key: impl Into<String>,
        value: AnnotationValue,
    ) -> Option<AnnotationValue> {
        self.values.insert(key.into(), value)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<AnnotationValue> {
        self.values.remove(key)
    }
}

/// Registry binding every annotation key to one [`ValueType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSchema {
    types: BTreeMap<String, ValueType>,
}

impl AnnotationSchema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered type for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ValueType> {
        self.types.get(key).copied()
    }

    /// Whether the key has been registered.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Bind `key` to `value_type`, or verify an existing binding.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] when the key is already bound to another type.
    pub fn register(&mut self, key: &str, value_type: ValueType) -> Result<()> {
        match self.types.get(key) {
            Some(&registered) if registered != value_type => {
                Err(Error::type_mismatch(key, registered, value_type))
            }
            Some(_) => Ok(()),
            None => {
                self.types.insert(key.to_string(), value_type);
                Ok(())
            }
        }
    }

    /// Verify a value against the registered type without registering it.
    ///
    /// Unregistered keys pass.
    pub fn check(&self, key: &str, value: &AnnotationValue) -> Result<()> {
        match self.get(key) {
            Some(registered) if registered != value.value_type() => {
                Err(Error::type_mismatch(key, registered, value.value_type()))
            }
            _ => Ok(()),
        }
    }

    /// First key registered in both schemas with different types.
    #[must_use]
    pub fn conflict_with(&self, other: &AnnotationSchema) -> Option<(&str, ValueType, ValueType)> {
        self.types.iter().find_map(|(key, &ours)| match other.get(key) {
            Some(theirs) if theirs != ours => Some((key.as_str(), ours, theirs)),
            _ => None,
        })
    }

    /// Register every key of `other` that is unknown here.
    ///
    /// Callers check [`conflict_with`](Self::conflict_with) first.
    pub(crate) fn absorb(&mut self, other: &AnnotationSchema) {
        for (key, &ty) in &other.types {
            self.types.entry(key.clone()).or_insert(ty);
        }
    }

    /// Key/type pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueType)> {
        self.types.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
