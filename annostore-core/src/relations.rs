//! Relation adjacency records.
//!
//! Each entity keeps the ids of the relations it takes part in, split by
//! direction and keyed by relation type. Records are only populated by
//! [`Dataset::add_relation`](crate::Dataset::add_relation).

use crate::entity::EntityId;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Relations touching one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    /// relation type -> relations where this entity is the child
    to_parents: BTreeMap<String, BTreeSet<EntityId>>,
    /// relation type -> relations where this entity is the parent
    to_children: BTreeMap<String, BTreeSet<EntityId>>,
}

impl Relations {
    /// Relations to children of any of the given types, ordered by id.
    #[must_use]
    pub fn to_children(&self, relation_types: &[&str]) -> BTreeSet<EntityId> {
        collect(&self.to_children, relation_types)
    }

    /// Relations to parents of any of the given types, ordered by id.
    #[must_use]
    pub fn to_parents(&self, relation_types: &[&str]) -> BTreeSet<EntityId> {
        collect(&self.to_parents, relation_types)
    }

    /// All relations to children, ordered by id.
    #[must_use]
    pub fn all_to_children(&self) -> BTreeSet<EntityId> {
        self.to_children.values().flatten().copied().collect()
    }

    /// All relations to parents, ordered by id.
    #[must_use]
    pub fn all_to_parents(&self) -> BTreeSet<EntityId> {
        self.to_parents.values().flatten().copied().collect()
    }

    /// Every relation in either direction.
    #[must_use]
    pub fn all(&self) -> BTreeSet<EntityId> {
        let mut all = self.all_to_children();
        all.extend(self.all_to_parents());
        all
    }

    /// Whether the entity takes part in no relation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_children.is_empty() && self.to_parents.is_empty()
    }

    pub(crate) fn add_to_child(&mut self, relation_type: &str, relation: EntityId) {
        self.to_children
            .entry(relation_type.to_string())
            .or_default()
            .insert(relation);
    }

    pub(crate) fn add_to_parent(&mut self, relation_type: &str, relation: EntityId) {
        self.to_parents
            .entry(relation_type.to_string())
            .or_default()
            .insert(relation);
    }

    pub(crate) fn remove(&mut self, relation: EntityId) {
        for map in [&mut self.to_children, &mut self.to_parents] {
            map.retain(|_, ids| {
                ids.remove(&relation);
                !ids.is_empty()
            });
        }
    }

    pub(crate) fn remapped(&self, remap: &HashMap<EntityId, EntityId>) -> Result<Self> {
        let map_side = |side: &BTreeMap<String, BTreeSet<EntityId>>| {
            side.iter()
                .map(|(ty, ids)| {
                    let ids = ids
                        .iter()
                        .map(|id| {
                            remap
                                .get(id)
                                .copied()
                                .ok_or_else(|| Error::unresolvable_id(*id, "relation adjacency"))
                        })
                        .collect::<Result<BTreeSet<_>>>()?;
                    Ok((ty.clone(), ids))
                })
                .collect::<Result<BTreeMap<_, _>>>()
        };
        Ok(Self {
            to_parents: map_side(&self.to_parents)?,
            to_children: map_side(&self.to_children)?,
        })
    }
}

fn collect(side: &BTreeMap<String, BTreeSet<EntityId>>, types: &[&str]) -> BTreeSet<EntityId> {
    types
        .iter()
        .filter_map(|ty| side.get(*ty))
        .flatten()
        .copied()
        .collect()
}
