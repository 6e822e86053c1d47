//! Merging one dataset into another.

use super::Dataset;
use crate::entity::{EntityId, EntityKind};
use crate::error::{Error, MergeDimension, Result};
use std::collections::HashMap;

impl Dataset {
    /// Check that `other` can be merged into this dataset.
    ///
    /// Datasets are compatible when they performed the same tasks, use the
    /// same textual unit span type (compared case-insensitively) and agree on
    /// the type of every annotation key they share.
    pub fn check_merge_compatible(&self, other: &Dataset) -> Result<()> {
        if self.performed_tasks != other.performed_tasks {
            return Err(Error::merge_incompatible(
                MergeDimension::PerformedTasks,
                format!("{:?} vs {:?}", self.performed_tasks, other.performed_tasks),
            ));
        }
        if !self
            .textual_unit_span_type
            .eq_ignore_ascii_case(&other.textual_unit_span_type)
        {
            return Err(Error::merge_incompatible(
                MergeDimension::TextualUnitSpanType,
                format!(
                    "'{}' vs '{}'",
                    self.textual_unit_span_type, other.textual_unit_span_type
                ),
            ));
        }
        if let Some((key, ours, theirs)) = self.schema.conflict_with(&other.schema) {
            return Err(Error::merge_incompatible(
                MergeDimension::AnnotationTypes,
                format!("'{key}' is {ours} vs {theirs}"),
            ));
        }
        Ok(())
    }

    /// Move every entity of `donor` into this dataset.
    ///
    /// Donor entities are re-issued fresh ids in their original id order, and
    /// every stored reference (token links, span members, relation endpoints,
    /// adjacency records, textual units) is rewritten through the same
    /// mapping. Either everything moves or, on error, this dataset is left
    /// untouched.
    pub fn merge(&mut self, donor: Dataset) -> Result<()> {
        self.check_merge_compatible(&donor)?;
        log::info!(
            "Merging {} entities into dataset of {} entities",
            donor.entity_count(),
            self.entity_count()
        );

        let mut next_id = self.next_id;
        let remap: HashMap<EntityId, EntityId> = donor
            .entities
            .keys()
            .map(|&old| {
                next_id += 1;
                (old, next_id)
            })
            .collect();
        let moved = donor
            .entities
            .into_values()
            .map(|mut entity| {
                // units keep the spelling of this dataset's unit type
                if entity.is_textual_unit() {
                    if let EntityKind::Span(span) = &mut entity.kind {
                        span.span_type.clone_from(&self.textual_unit_span_type);
                    }
                }
                entity.remapped(&remap)
            })
            .collect::<Result<Vec<_>>>()?;

        self.next_id = next_id;
        self.schema.absorb(&donor.schema);
        for entity in moved {
            self.register(entity);
        }
        log::info!("Merging datasets... done ({} entities)", self.entity_count());
        Ok(())
    }
}
