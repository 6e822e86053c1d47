//! Persistence of datasets.
//!
//! One format is supported: a single JSON document per dataset, see
//! [`json`].

pub mod json;

pub use json::{DatasetJsonReader, DatasetJsonWriter};
