//! Reference processing components.
//!
//! Two small stages that exercise the mutation interface end to end:
//! [`WhitespaceTokenizer`] creates tokens from raw text and [`Lowercaser`]
//! normalizes them in place.

use crate::error::Result;
use crate::pipeline::NlpComponent;
use annostore_core::{Dataset, EntityId, NlpTask};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Annotation holding the raw text of a span.
pub const TEXT_ANNOTATION: &str = "text";

/// Tokens carrying this annotation are ontology concepts and keep their case.
pub const URI_ANNOTATION: &str = "URI";

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("token pattern is valid"));

/// Splits the `text` annotation of each span on whitespace.
///
/// Tokens are appended to the span's textual unit and added to the span.
/// Offsets are character offsets within the textual unit: a sub-span's text
/// is taken to follow the unit's last token after a single separator. Spans
/// without a `text` annotation are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    /// Create a tokenizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn tokenize_span(&self, dataset: &mut Dataset, span: EntityId) -> Result<usize> {
        let Some(text) = dataset.get_text(span, TEXT_ANNOTATION)?.map(str::to_string) else {
            log::debug!("Span {span} has no '{TEXT_ANNOTATION}' annotation, skipping");
            return Ok(0);
        };
        let unit = dataset.textual_unit_of(span)?;
        let mut last = dataset.span(unit)?.last();

        // a sub-span's text continues the unit after one separator
        let base = match last {
            Some(previous) if span != unit => dataset.token(previous)?.end_offset() + 1,
            _ => 0,
        };

        let mut count = 0;
        let (mut byte_pos, mut char_pos) = (0, base);
        for m in TOKEN.find_iter(&text) {
            char_pos += text[byte_pos..m.start()].chars().count();
            byte_pos = m.start();

            let token = match last {
                Some(previous) => dataset.add_token_after(previous, m.as_str(), char_pos)?,
                None => dataset.add_first_token(unit, m.as_str(), char_pos)?,
            };
            if span != unit {
                dataset.span_add_token(span, token)?;
            }
            last = Some(token);
            count += 1;
        }
        Ok(count)
    }
}

impl NlpComponent for WhitespaceTokenizer {
    fn task(&self) -> NlpTask {
        NlpTask::Tokenization
    }

    fn name(&self) -> &'static str {
        "whitespace-tokenizer"
    }

    fn validated_process(&self, dataset: &mut Dataset, span_type: &str) -> Result<()> {
        let spans: Vec<EntityId> = dataset.spans_of_type(span_type).iter().copied().collect();
        let mut tokens = 0;
        for span in &spans {
            tokens += self.tokenize_span(dataset, *span)?;
        }
        log::debug!("Created {} tokens in {} '{}' spans", tokens, spans.len(), span_type);
        Ok(())
    }
}

/// Lowercases token text, except for tokens that carry a `URI` annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercaser;

impl Lowercaser {
    /// Create a lowercaser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NlpComponent for Lowercaser {
    fn task(&self) -> NlpTask {
        NlpTask::Lowercasing
    }

    fn prerequisites(&self) -> BTreeSet<NlpTask> {
        BTreeSet::from([NlpTask::Tokenization])
    }

    fn name(&self) -> &'static str {
        "lowercaser"
    }

    fn validated_process(&self, dataset: &mut Dataset, span_type: &str) -> Result<()> {
        let spans: Vec<EntityId> = dataset.spans_of_type(span_type).iter().copied().collect();
        for span in spans {
            for token in dataset.tokens_of(span)? {
                if dataset.has_annotation(token, URI_ANNOTATION) {
                    continue;
                }
                let lowered = dataset.token(token)?.text().to_lowercase();
                if lowered != dataset.token(token)?.text() {
                    dataset.set_token_text(token, lowered)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process;

    #[test]
    fn tokenizer_uses_character_offsets() {
        let mut ds = Dataset::new("review");
        let unit = ds.add_textual_unit();
        ds.put_annotation(unit, TEXT_ANNOTATION, "Café  au lait").unwrap();
        process(&WhitespaceTokenizer, &mut ds, "review").unwrap();

        let tokens = ds.tokens_of(unit).unwrap();
        let offsets: Vec<_> = tokens
            .iter()
            .map(|&t| {
                let token = ds.token(t).unwrap();
                (token.start_offset(), token.end_offset())
            })
            .collect();
        assert_eq!(offsets, vec![(0, 4), (6, 8), (9, 13)]);
        assert!(ds.has_performed(&NlpTask::Tokenization));
    }

    #[test]
    fn tokenizer_fills_sub_spans() {
        let mut ds = Dataset::new("review");
        let unit = ds.add_textual_unit();
        let first = ds.add_empty_span("sentence", unit).unwrap();
        let second = ds.add_empty_span("sentence", unit).unwrap();
        ds.put_annotation(first, TEXT_ANNOTATION, "Nice place.").unwrap();
        ds.put_annotation(second, TEXT_ANNOTATION, "Slow service.").unwrap();

        process(&WhitespaceTokenizer, &mut ds, "sentence").unwrap();

        assert_eq!(ds.span_text(unit).unwrap(), "Nice place. Slow service.");
        assert_eq!(ds.span_text(second).unwrap(), "Slow service.");
        assert_eq!(ds.covered_spans(unit, [first, second]).unwrap().len(), 2);

        let offsets: Vec<_> = ds
            .tokens_of(unit)
            .unwrap()
            .iter()
            .map(|&t| ds.token(t).unwrap().start_offset())
            .collect();
        assert_eq!(offsets, vec![0, 5, 12, 17]);
    }

    #[test]
    fn lowercaser_requires_tokens_and_skips_concepts() {
        let mut ds = Dataset::new("review");
        let unit = ds.add_textual_unit();
        ds.put_annotation(unit, TEXT_ANNOTATION, "Visited NEW_YORK Today").unwrap();
        assert!(process(&Lowercaser, &mut ds, "review").is_err());

        process(&WhitespaceTokenizer, &mut ds, "review").unwrap();
        let city = ds.token_by_order(unit, 1).unwrap().unwrap();
        ds.put_annotation(city, URI_ANNOTATION, "http://example.org/NewYork").unwrap();
        process(&Lowercaser, &mut ds, "review").unwrap();

        assert_eq!(ds.span_text(unit).unwrap(), "visited NEW_YORK today");
    }
}
