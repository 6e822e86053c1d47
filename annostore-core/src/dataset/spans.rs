//! Span construction, mutation and positional queries.
//!
//! # Span algebra
//!
//! Positional queries compare spans by the `order` of their first and last
//! tokens and only ever match spans of the same textual unit. Empty spans
//! have no position and never match.
//!
//! ```text
//!   this:            [-----]
//!   covered:          [--]          this.first <= s.first && s.last <= this.last
//!   covering:      [----------]     s.first <= this.first && this.last <= s.last
//!   touching:     [----]            s.first <= this.last && this.first <= s.last
//!   strictly left: [-]              s.last < this.first
//!   strictly right:          [--]   s.first > this.last
//! ```

use super::Dataset;
use crate::entity::{Entity, EntityId, EntityKind, Span};
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Position of a non-empty span.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    unit: EntityId,
    first: usize,
    last: usize,
}

impl Dataset {
    /// Create a new, empty textual unit.
    pub fn add_textual_unit(&mut self) -> EntityId {
        let id = self.issue_id();
        let span = Span::empty(self.textual_unit_span_type.clone());
        self.register(Entity::new(id, Some(id), EntityKind::Span(span)));
        id
    }

    /// Create an empty span inside a textual unit, to be filled with
    /// [`span_add_token`](Self::span_add_token).
    pub fn add_empty_span(&mut self, span_type: impl Into<String>, textual_unit: EntityId) -> Result<EntityId> {
        if !self.entity(textual_unit)?.is_textual_unit() {
            return Err(Error::invalid_input(format!(
                "entity {textual_unit} is not a textual unit"
            )));
        }
        let id = self.issue_id();
        self.register(Entity::new(
            id,
            Some(textual_unit),
            EntityKind::Span(Span::empty(span_type)),
        ));
        Ok(id)
    }

    /// Create a span holding every token from `first` to `last`.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalSpan`] when the tokens are in different textual units
    /// or `last` cannot be reached from `first`.
    pub fn add_span(&mut self, span_type: impl Into<String>, first: EntityId, last: EntityId) -> Result<EntityId> {
        self.token(first)?;
        self.token(last)?;
        let unit = self.textual_unit_of(first)?;
        if self.textual_unit_of(last)? != unit {
            return Err(Error::illegal_span(format!(
                "tokens {first} and {last} belong to different textual units"
            )));
        }

        let mut span = Span::empty(span_type);
        let mut current = first;
        loop {
            let token = self.token(current)?;
            span.push_back(current, token.order);
            if current == last {
                break;
            }
            current = token.next.ok_or_else(|| {
                Error::illegal_span(format!("token {last} does not follow token {first}"))
            })?;
        }

        let id = self.issue_id();
        self.register(Entity::new(id, Some(unit), EntityKind::Span(span)));
        Ok(id)
    }

    /// Extend a span by one token at either end.
    ///
    /// An empty span accepts any token of its textual unit. Otherwise the
    /// token must directly follow the last token or directly precede the
    /// first one.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalSpan`]; the span is unchanged.
    pub fn span_add_token(&mut self, span: EntityId, token: EntityId) -> Result<()> {
        let order = self.token(token)?.order;
        let token_unit = self.textual_unit_of(token)?;
        let span_unit = self.textual_unit_of(span)?;
        let target = self.span(span)?;

        let prepend = match (target.first(), target.last()) {
            (Some(first), Some(last)) => {
                if self.token(last)?.next == Some(token) {
                    false
                } else if self.token(first)?.previous == Some(token) {
                    true
                } else {
                    return Err(Error::illegal_span(format!(
                        "token {token} is not adjacent to span {span}"
                    )));
                }
            }
            _ => {
                if token_unit != span_unit {
                    return Err(Error::illegal_span(format!(
                        "token {token} belongs to another textual unit than span {span}"
                    )));
                }
                false
            }
        };

        let target = self.span_mut(span)?;
        if prepend {
            target.push_front(token, order);
        } else {
            target.push_back(token, order);
        }
        Ok(())
    }

    /// Extend a span by every token of `other`.
    ///
    /// Returns false when `other` is empty. `other` must directly follow or
    /// directly precede the span.
    pub fn span_add_all(&mut self, span: EntityId, other: EntityId) -> Result<bool> {
        let incoming: Vec<(EntityId, usize)> = self
            .span(other)?
            .tokens()
            .map(|t| self.token(t).map(|token| (t, token.order)))
            .collect::<Result<_>>()?;
        let (Some(&(incoming_first, _)), Some(&(incoming_last, _))) = (incoming.first(), incoming.last()) else {
            return Ok(false);
        };
        let target = self.span(span)?;

        let prepend = match (target.first(), target.last()) {
            (Some(first), Some(last)) => {
                if self.token(last)?.next == Some(incoming_first) {
                    false
                } else if self.token(first)?.previous == Some(incoming_last) {
                    true
                } else {
                    return Err(Error::illegal_span(format!(
                        "span {other} is not adjacent to span {span}"
                    )));
                }
            }
            _ => {
                if self.textual_unit_of(other)? != self.textual_unit_of(span)? {
                    return Err(Error::illegal_span(format!(
                        "span {other} belongs to another textual unit than span {span}"
                    )));
                }
                false
            }
        };

        let target = self.span_mut(span)?;
        if prepend {
            for (t, order) in incoming.into_iter().rev() {
                target.push_front(t, order);
            }
        } else {
            for (t, order) in incoming {
                target.push_back(t, order);
            }
        }
        Ok(true)
    }

    /// Remove the first or last token of a span.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalSpan`] for interior tokens and non-members.
    pub fn span_remove_token(&mut self, span: EntityId, token: EntityId) -> Result<()> {
        let order = self.token(token)?.order;
        let target = self.span_mut(span)?;
        if target.first() == Some(token) {
            target.tokens.pop_front();
        } else if target.last() == Some(token) {
            target.tokens.pop_back();
        } else if target.contains(token, order) {
            return Err(Error::illegal_span(format!(
                "only the first or last token can be removed from span {span}"
            )));
        } else {
            return Err(Error::illegal_span(format!(
                "token {token} is not part of span {span}"
            )));
        }
        target.by_order.remove(&order);
        Ok(())
    }

    /// Whether a span holds the token.
    pub fn span_contains(&self, span: EntityId, token: EntityId) -> Result<bool> {
        let order = self.token(token)?.order;
        Ok(self.span(span)?.contains(token, order))
    }

    /// Token texts of a span joined by single spaces.
    pub fn span_text(&self, span: EntityId) -> Result<String> {
        let texts = self
            .span(span)?
            .tokens()
            .map(|t| self.token(t).map(|token| token.text.as_str()))
            .collect::<Result<Vec<_>>>()?;
        Ok(texts.join(" "))
    }

    // -------------------------------------------------------------------------
    // Span algebra
    // -------------------------------------------------------------------------

    fn bounds(&self, span: EntityId) -> Result<Option<Bounds>> {
        let target = self.span(span)?;
        match (target.first(), target.last()) {
            (Some(first), Some(last)) => Ok(Some(Bounds {
                unit: self.textual_unit_of(span)?,
                first: self.token(first)?.order,
                last: self.token(last)?.order,
            })),
            _ => Ok(None),
        }
    }

    fn select(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
        keep: impl Fn(Bounds, Bounds) -> bool,
    ) -> Result<BTreeSet<EntityId>> {
        let Some(this) = self.bounds(span)? else {
            return Ok(BTreeSet::new());
        };
        let mut selected = BTreeSet::new();
        for candidate in candidates {
            if let Some(other) = self.bounds(candidate)? {
                if other.unit == this.unit && keep(this, other) {
                    selected.insert(candidate);
                }
            }
        }
        Ok(selected)
    }

    /// Candidates lying entirely inside `span`.
    pub fn covered_spans(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
    ) -> Result<BTreeSet<EntityId>> {
        self.select(span, candidates, |this, s| this.first <= s.first && s.last <= this.last)
    }

    /// Candidates that contain all of `span`.
    pub fn covering_spans(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
    ) -> Result<BTreeSet<EntityId>> {
        self.select(span, candidates, |this, s| s.first <= this.first && this.last <= s.last)
    }

    /// Candidates sharing at least one position with `span`.
    pub fn touching_spans(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
    ) -> Result<BTreeSet<EntityId>> {
        self.select(span, candidates, |this, s| s.first <= this.last && this.first <= s.last)
    }

    /// Candidates ending before `span` starts.
    pub fn strictly_left_spans(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
    ) -> Result<BTreeSet<EntityId>> {
        self.select(span, candidates, |this, s| s.last < this.first)
    }

    /// Candidates starting after `span` ends.
    pub fn strictly_right_spans(
        &self,
        span: EntityId,
        candidates: impl IntoIterator<Item = EntityId>,
    ) -> Result<BTreeSet<EntityId>> {
        self.select(span, candidates, |this, s| s.first > this.last)
    }

    /// Spans of `sub_span_type` covered by any of `spans`.
    pub fn sub_spans(
        &self,
        spans: impl IntoIterator<Item = EntityId>,
        sub_span_type: &str,
    ) -> Result<BTreeSet<EntityId>> {
        let mut found = BTreeSet::new();
        for span in spans {
            let unit = self.textual_unit_of(span)?;
            let candidates = self.spans_in_unit_of_type(unit, sub_span_type);
            found.extend(self.covered_spans(span, candidates)?);
        }
        Ok(found)
    }
}
