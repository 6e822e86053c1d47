//! The annotation container.
//!
//! A [`Dataset`] owns every token, span and relation of a corpus in one
//! id-addressed arena, plus the secondary indexes used to query them:
//!
//! | Index | Key | Maintained by |
//! |-------|-----|---------------|
//! | entities | id | every constructor, every removal |
//! | spans by type | span type | span constructors, removal, merge |
//! | spans by textual unit | textual unit id | span constructors, removal, merge |
//! | relations by type | relation type | [`Dataset::add_relation`], removal, merge |
//!
//! Entities are only created through the dataset's constructors, which issue
//! the id and update every index in the same call. Removal cascades through
//! all indexes, member lists and attached relations.
//!
//! # Example
//!
//! ```rust
//! use annostore_core::Dataset;
//!
//! let mut ds = Dataset::new("sentence");
//! let unit = ds.add_textual_unit();
//! let the = ds.add_first_token(unit, "The", 0).unwrap();
//! let food = ds.add_token_after(the, "food", 4).unwrap();
//! let aspect = ds.add_span("aspect", food, food).unwrap();
//! ds.put_annotation(aspect, "polarity", "positive").unwrap();
//!
//! assert_eq!(ds.get_text(aspect, "polarity").unwrap(), Some("positive"));
//! assert!(ds.spans_of_type_containing("aspect", food).unwrap().contains(&aspect));
//! ```

mod merge;
mod partition;
mod spans;
mod tokens;

pub use partition::{create_subsets, SubsetConfig};

use crate::annotations::{AnnotationSchema, Annotations};
use crate::entity::{Entity, EntityId, EntityKind, Relation, Span, Token};
use crate::error::{Error, Result};
use crate::task::NlpTask;
use crate::value::{AnnotationValue, ValueType};
use std::collections::{BTreeMap, BTreeSet, HashMap};

static NO_IDS: BTreeSet<EntityId> = BTreeSet::new();

/// Container for all entities that are processed together.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Span type denoting top-level units (document, review, sentence)
    textual_unit_span_type: String,
    /// Last issued id; ids start at 1
    next_id: EntityId,
    entities: BTreeMap<EntityId, Entity>,
    spans: BTreeSet<EntityId>,
    spans_by_type: HashMap<String, BTreeSet<EntityId>>,
    spans_by_textual_unit: HashMap<EntityId, BTreeSet<EntityId>>,
    relations_by_type: HashMap<String, BTreeSet<EntityId>>,
    schema: AnnotationSchema,
    performed_tasks: BTreeSet<NlpTask>,
}

impl Dataset {
    /// Create an empty dataset whose textual units are spans of the given type.
    #[must_use]
    pub fn new(textual_unit_span_type: impl Into<String>) -> Self {
        Self {
            textual_unit_span_type: textual_unit_span_type.into(),
            next_id: 0,
            entities: BTreeMap::new(),
            spans: BTreeSet::new(),
            spans_by_type: HashMap::new(),
            spans_by_textual_unit: HashMap::new(),
            relations_by_type: HashMap::new(),
            schema: AnnotationSchema::new(),
            performed_tasks: BTreeSet::new(),
        }
    }

    /// Span type of the textual units.
    #[must_use]
    pub fn textual_unit_span_type(&self) -> &str {
        &self.textual_unit_span_type
    }

    /// The most recently issued id (0 when nothing was created yet).
    #[must_use]
    pub fn current_id(&self) -> EntityId {
        self.next_id
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Whether an entity with this id is alive.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Look up any entity.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(Error::UnknownEntity(id))
    }

    /// Look up a token.
    pub fn token(&self, id: EntityId) -> Result<&Token> {
        self.entity(id)?.as_token().ok_or(Error::WrongKind {
            id,
            expected: "token",
        })
    }

    /// Look up a span.
    pub fn span(&self, id: EntityId) -> Result<&Span> {
        self.entity(id)?.as_span().ok_or(Error::WrongKind {
            id,
            expected: "span",
        })
    }

    /// Look up a relation.
    pub fn relation(&self, id: EntityId) -> Result<&Relation> {
        self.entity(id)?.as_relation().ok_or(Error::WrongKind {
            id,
            expected: "relation",
        })
    }

    /// Textual unit of an entity.
    ///
    /// # Errors
    ///
    /// Unknown id, or a relation whose parent chain has no textual unit.
    pub fn textual_unit_of(&self, id: EntityId) -> Result<EntityId> {
        self.entity(id)?.textual_unit.ok_or_else(|| {
            Error::invalid_input(format!("entity {id} does not belong to a textual unit"))
        })
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(&id).ok_or(Error::UnknownEntity(id))
    }

    fn token_mut(&mut self, id: EntityId) -> Result<&mut Token> {
        match &mut self.entity_mut(id)?.kind {
            EntityKind::Token(token) => Ok(token),
            _ => Err(Error::WrongKind {
                id,
                expected: "token",
            }),
        }
    }

    fn span_mut(&mut self, id: EntityId) -> Result<&mut Span> {
        match &mut self.entity_mut(id)?.kind {
            EntityKind::Span(span) => Ok(span),
            _ => Err(Error::WrongKind {
                id,
                expected: "span",
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Id issuance and registration
    // -------------------------------------------------------------------------

    fn issue_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    /// Insert an entity and update every secondary index.
    fn register(&mut self, entity: Entity) {
        let id = entity.id;
        match &entity.kind {
            EntityKind::Span(span) => {
                self.spans.insert(id);
                self.spans_by_type
                    .entry(span.span_type.clone())
                    .or_default()
                    .insert(id);
                if let Some(unit) = entity.textual_unit {
                    self.spans_by_textual_unit.entry(unit).or_default().insert(id);
                }
            }
            EntityKind::Relation(relation) => {
                self.relations_by_type
                    .entry(relation.relation_type.clone())
                    .or_default()
                    .insert(id);
            }
            EntityKind::Token(_) => {}
        }
        self.entities.insert(id, entity);
    }

    // -------------------------------------------------------------------------
    // Span indexes
    // -------------------------------------------------------------------------

    /// Every span, textual units included.
    #[must_use]
    pub fn spans(&self) -> &BTreeSet<EntityId> {
        &self.spans
    }

    /// Spans of one type. Empty for unknown types.
    #[must_use]
    pub fn spans_of_type(&self, span_type: &str) -> &BTreeSet<EntityId> {
        self.spans_by_type.get(span_type).unwrap_or(&NO_IDS)
    }

    /// Span types present in the dataset.
    pub fn span_types(&self) -> impl Iterator<Item = &str> {
        self.spans_by_type.keys().map(String::as_str)
    }

    /// Spans belonging to a textual unit, the unit itself included.
    #[must_use]
    pub fn spans_in_unit(&self, textual_unit: EntityId) -> &BTreeSet<EntityId> {
        self.spans_by_textual_unit
            .get(&textual_unit)
            .unwrap_or(&NO_IDS)
    }

    /// Spans of one type within a textual unit.
    #[must_use]
    pub fn spans_in_unit_of_type(&self, textual_unit: EntityId, span_type: &str) -> BTreeSet<EntityId> {
        self.spans_in_unit(textual_unit)
            .intersection(self.spans_of_type(span_type))
            .copied()
            .collect()
    }

    /// Spans of one type that contain the token.
    pub fn spans_of_type_containing(
        &self,
        span_type: &str,
        token: EntityId,
    ) -> Result<BTreeSet<EntityId>> {
        let unit = self.textual_unit_of(token)?;
        self.filter_containing(self.spans_in_unit_of_type(unit, span_type), token)
    }

    /// All spans that contain the token.
    pub fn spans_containing(&self, token: EntityId) -> Result<BTreeSet<EntityId>> {
        let unit = self.textual_unit_of(token)?;
        self.filter_containing(self.spans_in_unit(unit).iter().copied(), token)
    }

    fn filter_containing(
        &self,
        candidates: impl IntoIterator<Item = EntityId>,
        token: EntityId,
    ) -> Result<BTreeSet<EntityId>> {
        let order = self.token(token)?.order;
        let mut containing = BTreeSet::new();
        for span_id in candidates {
            if self.span(span_id)?.contains(token, order) {
                containing.insert(span_id);
            }
        }
        Ok(containing)
    }

    /// Ids of all textual units, in id order.
    pub fn textual_units(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.spans_of_type(&self.textual_unit_span_type)
            .iter()
            .copied()
            .filter(|id| self.entities.get(id).is_some_and(Entity::is_textual_unit))
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    /// Create a directed relation and register it at both endpoints.
    pub fn add_relation(
        &mut self,
        relation_type: impl Into<String>,
        parent: EntityId,
        child: EntityId,
    ) -> Result<EntityId> {
        let textual_unit = self.entity(parent)?.textual_unit;
        self.entity(child)?;
        let relation_type = relation_type.into();

        let id = self.issue_id();
        self.entity_mut(parent)?
            .relations
            .add_to_child(&relation_type, id);
        self.entity_mut(child)?
            .relations
            .add_to_parent(&relation_type, id);
        self.register(Entity::new(
            id,
            textual_unit,
            EntityKind::Relation(Relation {
                relation_type,
                parent,
                child,
            }),
        ));
        Ok(id)
    }

    /// Relations of one type. Empty for unknown types.
    #[must_use]
    pub fn relations_of_type(&self, relation_type: &str) -> &BTreeSet<EntityId> {
        self.relations_by_type
            .get(relation_type)
            .unwrap_or(&NO_IDS)
    }

    /// Relation types present in the dataset.
    pub fn relation_types(&self) -> impl Iterator<Item = &str> {
        self.relations_by_type.keys().map(String::as_str)
    }

    /// Relations of the given types where `id` is the parent.
    pub fn relations_to_children(&self, id: EntityId, relation_types: &[&str]) -> Result<BTreeSet<EntityId>> {
        Ok(self.entity(id)?.relations.to_children(relation_types))
    }

    /// Relations of the given types where `id` is the child.
    pub fn relations_to_parents(&self, id: EntityId, relation_types: &[&str]) -> Result<BTreeSet<EntityId>> {
        Ok(self.entity(id)?.relations.to_parents(relation_types))
    }

    /// All relations where `id` is the parent.
    pub fn all_relations_to_children(&self, id: EntityId) -> Result<BTreeSet<EntityId>> {
        Ok(self.entity(id)?.relations.all_to_children())
    }

    /// All relations where `id` is the child.
    pub fn all_relations_to_parents(&self, id: EntityId) -> Result<BTreeSet<EntityId>> {
        Ok(self.entity(id)?.relations.all_to_parents())
    }

    /// Keep the relations whose `key` annotation equals one of `allowed`.
    pub fn filter_relations_on_annotation(
        &self,
        relations: impl IntoIterator<Item = EntityId>,
        key: &str,
        allowed: &[AnnotationValue],
    ) -> Result<BTreeSet<EntityId>> {
        let mut kept = BTreeSet::new();
        for relation in relations {
            if let Some(value) = self.get_annotation(relation, key)? {
                if allowed.contains(value) {
                    kept.insert(relation);
                }
            }
        }
        Ok(kept)
    }

    // -------------------------------------------------------------------------
    // Annotations
    // -------------------------------------------------------------------------

    /// The annotation type registry.
    #[must_use]
    pub fn schema(&self) -> &AnnotationSchema {
        &self.schema
    }

    /// Bind a key to a type ahead of the first write.
    pub fn register_annotation_type(&mut self, key: &str, value_type: ValueType) -> Result<()> {
        self.schema.register(key, value_type)
    }

    /// Attach an annotation, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if `key` is registered with another type;
    /// nothing is written in that case.
    pub fn put_annotation(
        &mut self,
        id: EntityId,
        key: &str,
        value: impl Into<AnnotationValue>,
    ) -> Result<Option<AnnotationValue>> {
        let value = value.into();
        self.entity(id)?;
        self.schema.register(key, value.value_type())?;
        Ok(self.entity_mut(id)?.annotations.insert(key, value))
    }

    /// Read an annotation, verifying it against the registry.
    pub fn get_annotation(&self, id: EntityId, key: &str) -> Result<Option<&AnnotationValue>> {
        let Some(value) = self.entity(id)?.annotations.get(key) else {
            return Ok(None);
        };
        match self.schema.get(key) {
            Some(expected) if expected == value.value_type() => Ok(Some(value)),
            Some(expected) => Err(Error::type_mismatch(key, expected, value.value_type())),
            None => Err(Error::invalid_input(format!(
                "annotation '{key}' is not registered in this dataset"
            ))),
        }
    }

    fn typed<'a, T>(
        &'a self,
        id: EntityId,
        key: &str,
        wanted: ValueType,
        extract: impl FnOnce(&'a AnnotationValue) -> Option<T>,
    ) -> Result<Option<T>> {
        if let Some(registered) = self.schema.get(key) {
            if registered != wanted {
                return Err(Error::type_mismatch(key, registered, wanted));
            }
        }
        Ok(self.get_annotation(id, key)?.and_then(extract))
    }

    /// Read a text annotation.
    pub fn get_text(&self, id: EntityId, key: &str) -> Result<Option<&str>> {
        self.typed(id, key, ValueType::Text, AnnotationValue::as_text)
    }

    /// Read an integer annotation.
    pub fn get_integer(&self, id: EntityId, key: &str) -> Result<Option<i64>> {
        self.typed(id, key, ValueType::Integer, AnnotationValue::as_integer)
    }

    /// Read a float annotation.
    pub fn get_float(&self, id: EntityId, key: &str) -> Result<Option<f64>> {
        self.typed(id, key, ValueType::Float, AnnotationValue::as_float)
    }

    /// Read a boolean annotation.
    pub fn get_boolean(&self, id: EntityId, key: &str) -> Result<Option<bool>> {
        self.typed(id, key, ValueType::Boolean, AnnotationValue::as_boolean)
    }

    /// Read a list annotation.
    pub fn get_list(&self, id: EntityId, key: &str) -> Result<Option<&[AnnotationValue]>> {
        self.typed(id, key, ValueType::List, AnnotationValue::as_list)
    }

    /// Read a set annotation.
    pub fn get_set(&self, id: EntityId, key: &str) -> Result<Option<&BTreeSet<AnnotationValue>>> {
        self.typed(id, key, ValueType::Set, AnnotationValue::as_set)
    }

    /// Presence check only. False for unknown entities.
    #[must_use]
    pub fn has_annotation(&self, id: EntityId, key: &str) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|e| e.annotations.contains(key))
    }

    /// Remove an annotation. The key stays registered.
    pub fn remove_annotation(&mut self, id: EntityId, key: &str) -> Result<Option<AnnotationValue>> {
        Ok(self.entity_mut(id)?.annotations.remove(key))
    }

    /// Annotation keys of an entity, in key order.
    pub fn annotation_keys(&self, id: EntityId) -> Result<Vec<&str>> {
        Ok(self.entity(id)?.annotations.keys().collect())
    }

    /// All annotations of an entity.
    pub fn annotations(&self, id: EntityId) -> Result<&Annotations> {
        Ok(&self.entity(id)?.annotations)
    }

    /// The `lemma` annotation of a token.
    pub fn lemma(&self, token: EntityId) -> Result<Option<&str>> {
        self.token(token)?;
        self.get_text(token, "lemma")
    }

    /// The `pos` annotation of a token.
    pub fn pos(&self, token: EntityId) -> Result<Option<&str>> {
        self.token(token)?;
        self.get_text(token, "pos")
    }

    // -------------------------------------------------------------------------
    // Processing stages
    // -------------------------------------------------------------------------

    /// Tasks performed on this dataset.
    #[must_use]
    pub fn performed_tasks(&self) -> &BTreeSet<NlpTask> {
        &self.performed_tasks
    }

    /// Whether a task has been performed.
    #[must_use]
    pub fn has_performed(&self, task: &NlpTask) -> bool {
        self.performed_tasks.contains(task)
    }

    /// Record a task as performed. Returns false if it already was.
    pub fn mark_performed(&mut self, task: NlpTask) -> bool {
        self.performed_tasks.insert(task)
    }

    /// Fail with [`Error::MissingPrerequisite`] unless every prerequisite was performed.
    pub fn check_prerequisites(&self, task: &NlpTask, prerequisites: &BTreeSet<NlpTask>) -> Result<()> {
        let missing: Vec<NlpTask> = prerequisites
            .difference(&self.performed_tasks)
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingPrerequisite {
                task: task.clone(),
                missing,
            })
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Remove an entity and everything that depends on it.
    ///
    /// - token: unlinked, dropped from every span, following tokens renumbered
    /// - span: dropped from every index; a textual unit takes its tokens and
    ///   sub-spans with it
    /// - any entity: relations attached to it are removed too
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entity(id)?;
        match entity.kind {
            EntityKind::Token(_) => self.remove_token(id),
            EntityKind::Relation(_) => {
                self.remove_relation(id);
                Ok(())
            }
            EntityKind::Span(_) if entity.is_textual_unit() => self.remove_textual_unit(id),
            EntityKind::Span(_) => {
                self.remove_span(id);
                Ok(())
            }
        }
    }

    fn remove_textual_unit(&mut self, unit: EntityId) -> Result<()> {
        let tokens: Vec<EntityId> = self.span(unit)?.tokens().collect();
        let sub_spans: Vec<EntityId> = self
            .spans_in_unit(unit)
            .iter()
            .copied()
            .filter(|&s| s != unit)
            .collect();
        for span in sub_spans {
            self.remove_span(span);
        }
        for token in tokens {
            self.detach_relations(token);
            self.entities.remove(&token);
        }
        self.remove_span(unit);
        self.spans_by_textual_unit.remove(&unit);
        Ok(())
    }

    fn remove_span(&mut self, id: EntityId) {
        self.detach_relations(id);
        let Some(entity) = self.entities.remove(&id) else {
            return;
        };
        if let EntityKind::Span(span) = &entity.kind {
            self.spans.remove(&id);
            if let Some(ids) = self.spans_by_type.get_mut(&span.span_type) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.spans_by_type.remove(&span.span_type);
                }
            }
            if let Some(unit) = entity.textual_unit {
                if let Some(ids) = self.spans_by_textual_unit.get_mut(&unit) {
                    ids.remove(&id);
                }
            }
        }
    }

    fn remove_relation(&mut self, id: EntityId) {
        let Some(entity) = self.entities.remove(&id) else {
            return;
        };
        if let EntityKind::Relation(relation) = &entity.kind {
            if let Some(ids) = self.relations_by_type.get_mut(&relation.relation_type) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.relations_by_type.remove(&relation.relation_type);
                }
            }
            for endpoint in [relation.parent, relation.child] {
                if let Some(e) = self.entities.get_mut(&endpoint) {
                    e.relations.remove(id);
                }
            }
        }
        // relations on this relation
        for attached in entity.relations.all() {
            self.remove_relation(attached);
        }
    }

    fn detach_relations(&mut self, id: EntityId) {
        let attached = match self.entities.get(&id) {
            Some(entity) => entity.relations.all(),
            None => return,
        };
        for relation in attached {
            self.remove_relation(relation);
        }
    }
}
