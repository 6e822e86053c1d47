//! Error types for annostore-core.

use crate::entity::EntityId;
use crate::task::NlpTask;
use crate::value::ValueType;
use thiserror::Error;

/// Result type for annostore-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The part of two datasets that disagreed during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeDimension {
    /// The sets of performed processing tasks differ.
    PerformedTasks,
    /// The textual unit span types differ.
    TextualUnitSpanType,
    /// A shared annotation key is registered with different value types.
    AnnotationTypes,
}

impl std::fmt::Display for MergeDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MergeDimension::PerformedTasks => "performed tasks",
            MergeDimension::TextualUnitSpanType => "textual unit span type",
            MergeDimension::AnnotationTypes => "annotation types",
        };
        f.write_str(name)
    }
}

/// Error type for annostore-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A span mutation would break contiguity or cross textual units.
    #[error("Illegal span: {0}")]
    IllegalSpan(String),

    /// An annotation was written or read with a type other than the registered one.
    #[error("Type mismatch for annotation '{key}': registered as {expected}, got {found}")]
    TypeMismatch {
        /// Annotation key
        key: String,
        /// Type registered for the key (or requested by the caller)
        expected: ValueType,
        /// Type actually encountered
        found: ValueType,
    },

    /// No entity with this id lives in the dataset.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// The entity exists but is not of the required kind.
    #[error("Entity {id} is not a {expected}")]
    WrongKind {
        /// Entity id
        id: EntityId,
        /// Kind the caller needed
        expected: &'static str,
    },

    /// Two datasets cannot be merged.
    #[error("Datasets are not compatible: different {dimension} ({detail})")]
    MergeIncompatible {
        /// What differs
        dimension: MergeDimension,
        /// Human-readable description of both sides
        detail: String,
    },

    /// A processing task ran before the tasks it depends on.
    #[error("Cannot perform {task}: missing tasks {missing:?}")]
    MissingPrerequisite {
        /// Task that was refused
        task: NlpTask,
        /// Prerequisites that have not been performed
        missing: Vec<NlpTask>,
    },

    /// A processing task that does not allow re-runs was already performed.
    #[error("Task already performed: {0}")]
    AlreadyPerformed(NlpTask),

    /// A reference to an id that was not (yet) defined.
    #[error("Unresolvable id {id} in {context}")]
    UnresolvableId {
        /// The dangling id
        id: EntityId,
        /// Where the reference was found
        context: &'static str,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an illegal span error.
    #[must_use]
    pub fn illegal_span(msg: impl Into<String>) -> Self {
        Self::IllegalSpan(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a merge incompatibility error.
    #[must_use]
    pub fn merge_incompatible(dimension: MergeDimension, detail: impl Into<String>) -> Self {
        Self::MergeIncompatible {
            dimension,
            detail: detail.into(),
        }
    }

    /// Create an unresolvable id error.
    #[must_use]
    pub fn unresolvable_id(id: EntityId, context: &'static str) -> Self {
        Self::UnresolvableId { id, context }
    }

    pub(crate) fn type_mismatch(key: &str, expected: ValueType, found: ValueType) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }
}
