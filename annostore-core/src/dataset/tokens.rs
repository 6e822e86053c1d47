//! Token creation and the operations that rewrite token order.
//!
//! Tokens of one textual unit form a doubly linked list through their
//! `previous`/`next` ids, and `order` is always the 0-based position in that
//! list. Every operation here that changes the list renumbers the tokens
//! after the change and refreshes the order index of the unit's spans.

use super::Dataset;
use crate::entity::{Entity, EntityId, EntityKind, Token};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

impl Dataset {
    /// Create the first token of an empty textual unit.
    ///
    /// # Errors
    ///
    /// The id is not a textual unit, or the unit already has tokens.
    pub fn add_first_token(
        &mut self,
        textual_unit: EntityId,
        text: impl Into<String>,
        start_offset: usize,
    ) -> Result<EntityId> {
        if !self.entity(textual_unit)?.is_textual_unit() {
            return Err(Error::invalid_input(format!(
                "entity {textual_unit} is not a textual unit"
            )));
        }
        if !self.span(textual_unit)?.is_empty() {
            return Err(Error::illegal_span(format!(
                "textual unit {textual_unit} already has tokens"
            )));
        }

        let id = self.issue_id();
        let token = Token::new(text, start_offset, 0);
        self.register(Entity::new(id, Some(textual_unit), EntityKind::Token(token)));
        self.span_mut(textual_unit)?.push_back(id, 0);
        Ok(id)
    }

    /// Create a token directly after `previous`.
    ///
    /// Appending at the end of a unit is the common case. When `previous`
    /// already has a successor, the new token is spliced in between: every
    /// span holding both neighbours also receives it, and the following
    /// tokens are renumbered.
    pub fn add_token_after(
        &mut self,
        previous: EntityId,
        text: impl Into<String>,
        start_offset: usize,
    ) -> Result<EntityId> {
        let (previous_order, old_next) = {
            let token = self.token(previous)?;
            (token.order, token.next)
        };
        let unit = self.textual_unit_of(previous)?;

        let receiving: Vec<EntityId> = match old_next {
            Some(next) => {
                let next_order = self.token(next)?.order;
                let mut spans = Vec::new();
                for &span_id in self.spans_in_unit(unit) {
                    let span = self.span(span_id)?;
                    if span.contains(previous, previous_order) && span.contains(next, next_order) {
                        spans.push(span_id);
                    }
                }
                spans
            }
            None => Vec::new(),
        };

        let id = self.issue_id();
        let order = previous_order + 1;
        let mut token = Token::new(text, start_offset, order);
        token.previous = Some(previous);
        token.next = old_next;
        self.register(Entity::new(id, Some(unit), EntityKind::Token(token)));
        self.token_mut(previous)?.next = Some(id);

        match old_next {
            None => {
                self.span_mut(unit)?.push_back(id, order);
                Ok(id)
            }
            Some(next) => {
                self.token_mut(next)?.previous = Some(id);
                for span_id in receiving {
                    let span = self.span_mut(span_id)?;
                    let at = span
                        .tokens
                        .iter()
                        .position(|&t| t == previous)
                        .map_or(span.tokens.len(), |p| p + 1);
                    span.tokens.insert(at, id);
                }
                self.renumber_from(id)?;
                Ok(id)
            }
        }
    }

    /// Replace a token's text. The end offset follows the new length.
    pub fn set_token_text(&mut self, token: EntityId, text: impl Into<String>) -> Result<()> {
        self.token_mut(token)?.set_text(text);
        Ok(())
    }

    /// Following token in the textual unit.
    pub fn next_token(&self, token: EntityId) -> Result<Option<EntityId>> {
        Ok(self.token(token)?.next)
    }

    /// Preceding token in the textual unit.
    pub fn previous_token(&self, token: EntityId) -> Result<Option<EntityId>> {
        Ok(self.token(token)?.previous)
    }

    /// Member token of a span (usually a textual unit) by position.
    pub fn token_by_order(&self, span: EntityId, order: usize) -> Result<Option<EntityId>> {
        Ok(self.span(span)?.token_by_order(order))
    }

    /// Tokens of a span in text order.
    pub fn tokens_of(&self, span: EntityId) -> Result<Vec<EntityId>> {
        Ok(self.span(span)?.tokens().collect())
    }

    /// Recompute `order` from `token` to the end of its unit.
    ///
    /// The operations in this module keep orders current on their own; this is
    /// for callers that need to re-establish the invariant after bulk edits.
    pub fn reset_order(&mut self, token: EntityId) -> Result<()> {
        self.token(token)?;
        self.renumber_from(token)
    }

    /// Merge the run of tokens `first..=last` into `first`.
    ///
    /// `first` takes the merged text and the end offset of `last`; the other
    /// tokens are removed along with their relations. A span that held any of
    /// the removed tokens holds `first` afterwards, so multi-word expressions
    /// never split a span.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalSpan`] if `last` does not follow `first` in the same unit.
    pub fn merge_tokens(
        &mut self,
        first: EntityId,
        last: EntityId,
        text: impl Into<String>,
    ) -> Result<()> {
        if first == last {
            return self.set_token_text(first, text);
        }
        let unit = self.textual_unit_of(first)?;
        self.token(last)?;

        let mut removed = Vec::new();
        let mut current = self.token(first)?.next;
        loop {
            let Some(id) = current else {
                return Err(Error::illegal_span(format!(
                    "token {last} does not follow token {first}"
                )));
            };
            removed.push(id);
            if id == last {
                break;
            }
            current = self.token(id)?.next;
        }
        let (end_offset, after) = {
            let token = self.token(last)?;
            (token.end_offset, token.next)
        };
        let removed_set: HashSet<EntityId> = removed.iter().copied().collect();

        let span_ids: Vec<EntityId> = self.spans_in_unit(unit).iter().copied().collect();
        for span_id in span_ids {
            let span = self.span_mut(span_id)?;
            let before = span.tokens.len();
            span.tokens.retain(|t| !removed_set.contains(t));
            if span.tokens.len() != before && !span.tokens.contains(&first) {
                span.tokens.push_front(first);
            }
        }

        for id in &removed {
            self.detach_relations(*id);
            self.entities.remove(id);
        }

        let token = self.token_mut(first)?;
        token.set_text(text);
        token.end_offset = end_offset;
        token.next = after;
        if let Some(next) = after {
            self.token_mut(next)?.previous = Some(first);
        }
        log::debug!("Merged {} tokens into token {}", removed.len() + 1, first);
        self.renumber_from(first)
    }

    /// Remove a token from its unit and from every span.
    pub(crate) fn remove_token(&mut self, token: EntityId) -> Result<()> {
        let (previous, next) = {
            let t = self.token(token)?;
            (t.previous, t.next)
        };
        let unit = self.textual_unit_of(token)?;

        let span_ids: Vec<EntityId> = self.spans_in_unit(unit).iter().copied().collect();
        for span_id in span_ids {
            self.span_mut(span_id)?.tokens.retain(|&t| t != token);
        }
        self.detach_relations(token);
        self.entities.remove(&token);

        if let Some(p) = previous {
            self.token_mut(p)?.next = next;
        }
        match next {
            Some(n) => {
                self.token_mut(n)?.previous = previous;
                self.renumber_from(n)
            }
            None => self.refresh_order_index(unit),
        }
    }

    fn renumber_from(&mut self, start: EntityId) -> Result<()> {
        let unit = self.textual_unit_of(start)?;
        let mut current = Some(start);
        while let Some(id) = current {
            let order = match self.token(id)?.previous {
                Some(prev) => self.token(prev)?.order + 1,
                None => 0,
            };
            let token = self.token_mut(id)?;
            token.order = order;
            current = token.next;
        }
        self.refresh_order_index(unit)
    }

    fn refresh_order_index(&mut self, unit: EntityId) -> Result<()> {
        let span_ids: Vec<EntityId> = self.spans_in_unit(unit).iter().copied().collect();
        for span_id in span_ids {
            let by_order = self
                .span(span_id)?
                .tokens()
                .map(|t| self.token(t).map(|token| (token.order, t)))
                .collect::<Result<HashMap<_, _>>>()?;
            self.span_mut(span_id)?.by_order = by_order;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sentence;
    use super::*;

    fn texts(ds: &Dataset, span: EntityId) -> Vec<String> {
        ds.span(span)
            .unwrap()
            .tokens()
            .map(|t| ds.token(t).unwrap().text().to_string())
            .collect()
    }

    fn orders(ds: &Dataset, unit: EntityId) -> Vec<usize> {
        ds.span(unit)
            .unwrap()
            .tokens()
            .map(|t| ds.token(t).unwrap().order())
            .collect()
    }

    #[test]
    fn reset_order_cascades_forward_after_bulk_edit() {
        let (mut ds, unit, tokens) = sentence();
        let food = ds.add_span("aspect", tokens[1], tokens[1]).unwrap();
        for (i, &t) in tokens.iter().enumerate().skip(1) {
            ds.token_mut(t).unwrap().order = 10 + i;
        }
        ds.span_mut(unit).unwrap().by_order.clear();
        ds.span_mut(food).unwrap().by_order.clear();

        ds.reset_order(tokens[1]).unwrap();

        assert_eq!(orders(&ds, unit), vec![0, 1, 2, 3]);
        assert_eq!(ds.token_by_order(unit, 3).unwrap(), Some(tokens[3]));
        assert_eq!(ds.token_by_order(food, 1).unwrap(), Some(tokens[1]));
        assert_eq!(ds.token_by_order(unit, 13).unwrap(), None);
    }

    #[test]
    fn appended_tokens_are_linked_and_numbered() {
        let (ds, unit, tokens) = sentence();
        assert_eq!(orders(&ds, unit), vec![0, 1, 2, 3]);
        assert_eq!(ds.next_token(tokens[0]).unwrap(), Some(tokens[1]));
        assert_eq!(ds.previous_token(tokens[0]).unwrap(), None);
        assert_eq!(ds.token_by_order(unit, 2).unwrap(), Some(tokens[2]));
        assert_eq!(ds.token(tokens[3]).unwrap().end_offset(), 18);
    }

    #[test]
    fn first_token_requires_empty_unit() {
        let (mut ds, unit, tokens) = sentence();
        assert!(matches!(
            ds.add_first_token(unit, "Again", 0),
            Err(Error::IllegalSpan(_))
        ));
        assert!(ds.add_first_token(tokens[0], "x", 0).is_err());
    }

    #[test]
    fn splicing_extends_spans_holding_both_neighbours() {
        let (mut ds, unit, tokens) = sentence();
        let np = ds.add_span("np", tokens[0], tokens[1]).unwrap();
        let head = ds.add_span("head", tokens[1], tokens[1]).unwrap();

        let tasty = ds.add_token_after(tokens[0], "tasty", 4).unwrap();

        assert_eq!(texts(&ds, unit), vec!["The", "tasty", "food", "was", "great"]);
        assert_eq!(texts(&ds, np), vec!["The", "tasty", "food"]);
        assert_eq!(texts(&ds, head), vec!["food"]);
        assert_eq!(orders(&ds, unit), vec![0, 1, 2, 3, 4]);
        assert!(ds.spans_containing(tokens[1]).unwrap().contains(&head));
        assert_eq!(ds.token_by_order(unit, 1).unwrap(), Some(tasty));
    }

    #[test]
    fn merge_tokens_keeps_spans_whole() {
        let (mut ds, unit, tokens) = sentence();
        let tail = ds.add_span("tail", tokens[2], tokens[3]).unwrap();
        let rel = ds.add_relation("dep", tokens[3], tokens[0]).unwrap();

        ds.merge_tokens(tokens[1], tokens[2], "food was").unwrap();

        assert_eq!(texts(&ds, unit), vec!["The", "food was", "great"]);
        assert_eq!(texts(&ds, tail), vec!["food was", "great"]);
        assert_eq!(orders(&ds, unit), vec![0, 1, 2]);
        assert!(!ds.contains(tokens[2]));
        assert!(ds.contains(rel));
        assert_eq!(ds.token(tokens[1]).unwrap().end_offset(), 12);
        assert_eq!(ds.next_token(tokens[1]).unwrap(), Some(tokens[3]));
        assert_eq!(ds.previous_token(tokens[3]).unwrap(), Some(tokens[1]));
    }

    #[test]
    fn merge_tokens_rejects_reversed_range() {
        let (mut ds, unit, tokens) = sentence();
        let err = ds.merge_tokens(tokens[2], tokens[1], "x").unwrap_err();
        assert!(matches!(err, Error::IllegalSpan(_)));
        assert_eq!(texts(&ds, unit), vec!["The", "food", "was", "great"]);
    }

    #[test]
    fn removing_a_token_relinks_and_renumbers() {
        let (mut ds, unit, tokens) = sentence();
        let span = ds.add_span("x", tokens[0], tokens[2]).unwrap();
        ds.add_relation("dep", tokens[1], tokens[3]).unwrap();

        ds.remove(tokens[1]).unwrap();

        assert_eq!(texts(&ds, unit), vec!["The", "was", "great"]);
        assert_eq!(texts(&ds, span), vec!["The", "was"]);
        assert_eq!(orders(&ds, unit), vec![0, 1, 2]);
        assert_eq!(ds.next_token(tokens[0]).unwrap(), Some(tokens[2]));
        assert!(ds.relations_of_type("dep").is_empty());
        assert!(ds.spans_containing(tokens[2]).unwrap().contains(&span));
    }
}
