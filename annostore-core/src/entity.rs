//! Addressable entities: tokens, spans and relations.
//!
//! # Arena Model
//!
//! Entities never point at each other directly. Every cross-reference
//! (token neighbours, span members, relation endpoints, textual unit) is an
//! [`EntityId`] resolved through the owning [`Dataset`](crate::Dataset).
//!
//! ```text
//! Dataset
//! ├── Entity { id, textual_unit, annotations, relations, kind }
//! │   ├── Token    text, offsets, order, previous/next
//! │   ├── Span     span type, contiguous token ids
//! │   └── Relation relation type, parent id, child id
//! ```
//!
//! Equality, ordering and hashing of an [`Entity`] use its id only: two
//! structurally identical entities with different ids are distinct.

use crate::annotations::Annotations;
use crate::error::{Error, Result};
use crate::relations::Relations;
use std::collections::{HashMap, VecDeque};

/// Identifier of an entity, unique within one dataset.
pub type EntityId = u64;

// ============================================================================
// Token
// ============================================================================

/// The atomic unit of a textual unit.
///
/// Offsets are informational (useful to write results back to the source
/// format); `order` is the key used for all internal matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub(crate) text: String,
    pub(crate) start_offset: usize,
    pub(crate) end_offset: usize,
    pub(crate) order: usize,
    pub(crate) previous: Option<EntityId>,
    pub(crate) next: Option<EntityId>,
}

impl Token {
    pub(crate) fn new(text: impl Into<String>, start_offset: usize, order: usize) -> Self {
        let text = text.into();
        let end_offset = start_offset + text.chars().count();
        Self {
            text,
            start_offset,
            end_offset,
            order,
            previous: None,
            next: None,
        }
    }

    /// Current token text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character offset of the first character within the textual unit.
    #[must_use]
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Character offset one past the last character.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// Zero-based position within the textual unit.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Preceding token, if any.
    #[must_use]
    pub fn previous(&self) -> Option<EntityId> {
        self.previous
    }

    /// Following token, if any.
    #[must_use]
    pub fn next(&self) -> Option<EntityId> {
        self.next
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.end_offset = self.start_offset + self.text.chars().count();
    }
}

// ============================================================================
// Span
// ============================================================================

/// A contiguous run of tokens from one textual unit.
///
/// Tokens are kept in text order. `by_order` maps each member's current
/// `order` to its id; it is refreshed whenever tokens are renumbered, and is
/// what membership tests use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub(crate) span_type: String,
    pub(crate) tokens: VecDeque<EntityId>,
    pub(crate) by_order: HashMap<usize, EntityId>,
}

impl Span {
    pub(crate) fn empty(span_type: impl Into<String>) -> Self {
        Self {
            span_type: span_type.into(),
            tokens: VecDeque::new(),
            by_order: HashMap::new(),
        }
    }

    /// Label of this span ("sentence", "opinion", ...).
    #[must_use]
    pub fn span_type(&self) -> &str {
        &self.span_type
    }

    /// First token.
    #[must_use]
    pub fn first(&self) -> Option<EntityId> {
        self.tokens.front().copied()
    }

    /// Last token.
    #[must_use]
    pub fn last(&self) -> Option<EntityId> {
        self.tokens.back().copied()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the span holds no tokens yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token ids in text order.
    pub fn tokens(&self) -> impl DoubleEndedIterator<Item = EntityId> + ExactSizeIterator + '_ {
        self.tokens.iter().copied()
    }

    /// Member token with the given order, if any.
    #[must_use]
    pub fn token_by_order(&self, order: usize) -> Option<EntityId> {
        self.by_order.get(&order).copied()
    }

    pub(crate) fn contains(&self, token: EntityId, order: usize) -> bool {
        self.by_order.get(&order) == Some(&token)
    }

    pub(crate) fn push_back(&mut self, token: EntityId, order: usize) {
        self.tokens.push_back(token);
        self.by_order.insert(order, token);
    }

    pub(crate) fn push_front(&mut self, token: EntityId, order: usize) {
        self.tokens.push_front(token);
        self.by_order.insert(order, token);
    }
}

// ============================================================================
// Relation
// ============================================================================

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub(crate) relation_type: String,
    pub(crate) parent: EntityId,
    pub(crate) child: EntityId,
}

impl Relation {
    /// Relation label ("nsubj", "coref", ...).
    #[must_use]
    pub fn relation_type(&self) -> &str {
        &self.relation_type
    }

    /// Source of the edge.
    #[must_use]
    pub fn parent(&self) -> EntityId {
        self.parent
    }

    /// Target of the edge.
    #[must_use]
    pub fn child(&self) -> EntityId {
        self.child
    }
}

// ============================================================================
// Entity
// ============================================================================

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A token
    Token(Token),
    /// A span of tokens (textual units included)
    Span(Span),
    /// A relation between two entities
    Relation(Relation),
}

impl EntityKind {
    /// Lowercase kind name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            EntityKind::Token(_) => "token",
            EntityKind::Span(_) => "span",
            EntityKind::Relation(_) => "relation",
        }
    }
}

/// An addressable entity stored in a dataset.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) textual_unit: Option<EntityId>,
    pub(crate) annotations: Annotations,
    pub(crate) relations: Relations,
    pub(crate) kind: EntityKind,
}

impl Entity {
    pub(crate) fn new(id: EntityId, textual_unit: Option<EntityId>, kind: EntityKind) -> Self {
        Self {
            id,
            textual_unit,
            annotations: Annotations::new(),
            relations: Relations::default(),
            kind,
        }
    }

    /// Identifier within the owning dataset.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Textual unit this entity belongs to.
    ///
    /// A textual unit references itself. A relation belongs to its parent's
    /// textual unit, which is `None` when the parent is itself a relation
    /// without one.
    #[must_use]
    pub fn textual_unit(&self) -> Option<EntityId> {
        self.textual_unit
    }

    /// Stored annotations (not schema-checked; see `Dataset::get_annotation`).
    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Relation adjacency record.
    #[must_use]
    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// Kind-specific payload.
    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Token payload, if this is a token.
    #[must_use]
    pub fn as_token(&self) -> Option<&Token> {
        match &self.kind {
            EntityKind::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Span payload, if this is a span.
    #[must_use]
    pub fn as_span(&self) -> Option<&Span> {
        match &self.kind {
            EntityKind::Span(s) => Some(s),
            _ => None,
        }
    }

    /// Relation payload, if this is a relation.
    #[must_use]
    pub fn as_relation(&self) -> Option<&Relation> {
        match &self.kind {
            EntityKind::Relation(r) => Some(r),
            _ => None,
        }
    }

    /// Whether this is a span that is its own textual unit.
    #[must_use]
    pub fn is_textual_unit(&self) -> bool {
        matches!(self.kind, EntityKind::Span(_)) && self.textual_unit == Some(self.id)
    }

    /// Re-identify this entity and every id it references.
    pub(crate) fn remapped(self, remap: &HashMap<EntityId, EntityId>) -> Result<Self> {
        let lookup = |old: EntityId, context: &'static str| {
            remap
                .get(&old)
                .copied()
                .ok_or_else(|| Error::unresolvable_id(old, context))
        };

        let kind = match self.kind {
            EntityKind::Token(mut token) => {
                token.previous = token.previous.map(|p| lookup(p, "token previous")).transpose()?;
                token.next = token.next.map(|n| lookup(n, "token next")).transpose()?;
                EntityKind::Token(token)
            }
            EntityKind::Span(mut span) => {
                span.tokens = span
                    .tokens
                    .iter()
                    .map(|&t| lookup(t, "span token"))
                    .collect::<Result<_>>()?;
                span.by_order = span
                    .by_order
                    .iter()
                    .map(|(&order, &t)| Ok((order, lookup(t, "span token")?)))
                    .collect::<Result<_>>()?;
                EntityKind::Span(span)
            }
            EntityKind::Relation(mut relation) => {
                relation.parent = lookup(relation.parent, "relation parent")?;
                relation.child = lookup(relation.child, "relation child")?;
                EntityKind::Relation(relation)
            }
        };

        Ok(Self {
            id: lookup(self.id, "entity id")?,
            textual_unit: self
                .textual_unit
                .map(|u| lookup(u, "textual unit"))
                .transpose()?,
            annotations: self.annotations,
            relations: self.relations.remapped(remap)?,
            kind,
        })
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
