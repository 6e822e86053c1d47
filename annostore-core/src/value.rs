//! Annotation values and their runtime types.
//!
//! Every annotation key in a dataset is bound to exactly one [`ValueType`]
//! the first time it is written. [`AnnotationValue`] is the closed set of
//! values an annotation can hold.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Runtime type of an annotation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    /// UTF-8 text
    Text,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean flag
    Boolean,
    /// Ordered list of values
    List,
    /// Ordered, deduplicated set of values
    Set,
}

impl ValueType {
    /// Fully-qualified type name used in persisted corpora.
    #[must_use]
    pub const fn qualified_name(&self) -> &'static str {
        match self {
            ValueType::Text => "java.lang.String",
            ValueType::Integer => "java.lang.Integer",
            ValueType::Float => "java.lang.Double",
            ValueType::Boolean => "java.lang.Boolean",
            ValueType::List => "java.util.ArrayList",
            ValueType::Set => "java.util.HashSet",
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::List => "list",
            ValueType::Set => "set",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "java.lang.String" | "text" => Ok(ValueType::Text),
            "java.lang.Integer" | "java.lang.Long" | "integer" => Ok(ValueType::Integer),
            "java.lang.Double" | "java.lang.Float" | "float" => Ok(ValueType::Float),
            "java.lang.Boolean" | "boolean" => Ok(ValueType::Boolean),
            "java.util.ArrayList" | "java.util.LinkedList" | "list" => Ok(ValueType::List),
            "java.util.HashSet" | "java.util.TreeSet" | "set" => Ok(ValueType::Set),
            other => Err(Error::invalid_input(format!(
                "unsupported annotation type name: {other}"
            ))),
        }
    }
}

/// A dynamically-typed annotation value.
///
/// Equality and ordering are total: floats compare with [`f64::total_cmp`],
/// so values can live inside a [`AnnotationValue::Set`].
#[derive(Debug, Clone)]
pub enum AnnotationValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Ordered list
    List(Vec<AnnotationValue>),
    /// Deduplicated set
    Set(BTreeSet<AnnotationValue>),
}

impl AnnotationValue {
    /// Build a list value.
    #[must_use]
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AnnotationValue>,
    {
        AnnotationValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a set value.
    #[must_use]
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AnnotationValue>,
    {
        AnnotationValue::Set(items.into_iter().map(Into::into).collect())
    }

    /// Runtime type of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            AnnotationValue::Text(_) => ValueType::Text,
            AnnotationValue::Integer(_) => ValueType::Integer,
            AnnotationValue::Float(_) => ValueType::Float,
            AnnotationValue::Boolean(_) => ValueType::Boolean,
            AnnotationValue::List(_) => ValueType::List,
            AnnotationValue::Set(_) => ValueType::Set,
        }
    }

    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AnnotationValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float content, if this is a float value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AnnotationValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean value.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AnnotationValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// List content, if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[AnnotationValue]> {
        match self {
            AnnotationValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Set content, if this is a set value.
    #[must_use]
    pub fn as_set(&self) -> Option<&BTreeSet<AnnotationValue>> {
        match self {
            AnnotationValue::Set(items) => Some(items),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AnnotationValue::Text(_) => 0,
            AnnotationValue::Integer(_) => 1,
            AnnotationValue::Float(_) => 2,
            AnnotationValue::Boolean(_) => 3,
            AnnotationValue::List(_) => 4,
            AnnotationValue::Set(_) => 5,
        }
    }
}

impl PartialEq for AnnotationValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AnnotationValue {}

impl PartialOrd for AnnotationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnnotationValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use AnnotationValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (List(a), List(b)) => a.cmp(b),
            (Set(a), Set(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join<'a>(
            f: &mut std::fmt::Formatter<'_>,
            items: impl Iterator<Item = &'a AnnotationValue>,
        ) -> std::fmt::Result {
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            AnnotationValue::Text(s) => f.write_str(s),
            AnnotationValue::Integer(i) => write!(f, "{i}"),
            AnnotationValue::Float(x) => write!(f, "{x}"),
            AnnotationValue::Boolean(b) => write!(f, "{b}"),
            AnnotationValue::List(items) => {
                f.write_str("[")?;
                join(f, items.iter())?;
                f.write_str("]")
            }
            AnnotationValue::Set(items) => {
                f.write_str("{")?;
                join(f, items.iter())?;
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::Text(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::Text(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Integer(value)
    }
}

impl From<i32> for AnnotationValue {
    fn from(value: i32) -> Self {
        AnnotationValue::Integer(i64::from(value))
    }
}

impl From<u32> for AnnotationValue {
    fn from(value: u32) -> Self {
        AnnotationValue::Integer(i64::from(value))
    }
}

impl From<f64> for AnnotationValue {
    fn from(value: f64) -> Self {
        AnnotationValue::Float(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Boolean(value)
    }
}

impl From<Vec<AnnotationValue>> for AnnotationValue {
    fn from(value: Vec<AnnotationValue>) -> Self {
        AnnotationValue::List(value)
    }
}

impl From<BTreeSet<AnnotationValue>> for AnnotationValue {
    fn from(value: BTreeSet<AnnotationValue>) -> Self {
        AnnotationValue::Set(value)
    }
}
