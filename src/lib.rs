//! # annostore
//!
//! In-memory, typed annotation store for linguistic corpora.
//!
//! - **Model**: tokens, spans and relations owned by a [`Dataset`]
//!   (re-exported from `annostore-core`)
//! - **Persistence**: one JSON document per dataset ([`io::json`])
//! - **Processing**: components with prerequisite checking ([`pipeline`])
//!
//! ## Quick Start
//!
//! ```rust
//! use annostore::{Dataset, DatasetJsonReader, DatasetJsonWriter, JsonConfig};
//!
//! let mut ds = Dataset::new("sentence");
//! let unit = ds.add_textual_unit();
//! let the = ds.add_first_token(unit, "The", 0)?;
//! let food = ds.add_token_after(the, "food", 4)?;
//! let np = ds.add_span("np", the, food)?;
//! ds.put_annotation(np, "head", "food")?;
//!
//! let json = DatasetJsonWriter::new(JsonConfig::default()).to_string(&ds)?;
//! let back = DatasetJsonReader::new().from_str(&json)?;
//! assert_eq!(back.spans_of_type("np").len(), 1);
//! # Ok::<(), annostore::Error>(())
//! ```
//!
//! ## Design
//!
//! - **Arena**: entities are addressed by [`EntityId`]; every reference
//!   (token links, span members, relation endpoints) is an id
//! - **One schema per dataset**: the first write of an annotation key fixes
//!   its [`ValueType`]
//! - **Fail loudly**: illegal span edits, type drift and incompatible merges
//!   are errors, never silently skipped

pub mod components;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;

pub use annostore_core::{
    create_subsets, AnnotationSchema, AnnotationValue, Annotations, Dataset, Entity, EntityId,
    EntityKind, MergeDimension, NlpTask, Relation, Relations, Span, SubsetConfig, Token, ValueType,
};

/// The dataset-model error type, re-exported under a distinct name.
pub use annostore_core::Error as CoreError;

pub use components::{Lowercaser, WhitespaceTokenizer};
pub use config::JsonConfig;
pub use error::{Error, Result};
pub use io::json::{DatasetJsonReader, DatasetJsonWriter};
pub use pipeline::{process, NlpComponent, Pipeline};
