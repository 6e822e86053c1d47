//! # annostore-core
//!
//! Core types for annostore: an in-memory, typed annotation store for
//! linguistic corpora.
//!
//! This crate provides:
//! - **Entities**: `Token`, `Span`, `Relation`, addressed by `EntityId`
//! - **Container**: `Dataset`, which owns every entity and its indexes
//! - **Annotations**: typed key/value data with a per-dataset schema
//! - **Processing stages**: `NlpTask` and prerequisite bookkeeping
//!
//! Serialization and the processing pipeline live in the `annostore` crate.

pub mod annotations;
pub mod dataset;
pub mod entity;
pub mod error;
pub mod relations;
pub mod task;
pub mod value;

// Re-exports for convenience
pub use annotations::{AnnotationSchema, Annotations};
pub use dataset::{create_subsets, Dataset, SubsetConfig};
pub use entity::{Entity, EntityId, EntityKind, Relation, Span, Token};
pub use error::{Error, MergeDimension, Result};
pub use relations::Relations;
pub use task::NlpTask;
pub use value::{AnnotationValue, ValueType};
