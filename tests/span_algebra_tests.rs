//! Span algebra over one textual unit.
//!
//! Sentence: "The food was great" (orders 0-3).

use annostore::{Dataset, EntityId, Error};
use std::collections::BTreeSet;

struct Fixture {
    ds: Dataset,
    unit: EntityId,
    tokens: Vec<EntityId>,
}

fn fixture() -> Fixture {
    let mut ds = Dataset::new("sentence");
    let unit = ds.add_textual_unit();
    let mut tokens = vec![ds.add_first_token(unit, "The", 0).unwrap()];
    for (word, offset) in [("food", 4), ("was", 9), ("great", 13)] {
        let previous = *tokens.last().unwrap();
        tokens.push(ds.add_token_after(previous, word, offset).unwrap());
    }
    Fixture { ds, unit, tokens }
}

fn set(ids: &[EntityId]) -> BTreeSet<EntityId> {
    ids.iter().copied().collect()
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn sentence_covers_the_opinion() {
    let Fixture { mut ds, unit, tokens } = fixture();
    let opinion = ds.add_span("opinion", tokens[1], tokens[3]).unwrap();
    assert_eq!(ds.span_text(opinion).unwrap(), "food was great");

    let covered = ds.covered_spans(unit, ds.spans_of_type("opinion").clone()).unwrap();
    assert_eq!(covered, set(&[opinion]));
    let covering = ds.covering_spans(opinion, ds.spans().clone()).unwrap();
    assert_eq!(covering, set(&[unit, opinion]));
}

#[test]
fn strictly_left_of_last_token() {
    let Fixture { mut ds, tokens, .. } = fixture();
    let great = ds.add_span("word", tokens[3], tokens[3]).unwrap();
    let the_food = ds.add_span("np", tokens[0], tokens[1]).unwrap();
    let food_was = ds.add_span("x", tokens[1], tokens[2]).unwrap();
    let was_great = ds.add_span("vp", tokens[2], tokens[3]).unwrap();

    let candidates = set(&[the_food, food_was, was_great]);
    assert_eq!(
        ds.strictly_left_spans(great, candidates.clone()).unwrap(),
        set(&[the_food, food_was])
    );
    assert!(ds.strictly_right_spans(great, candidates.clone()).unwrap().is_empty());
    assert_eq!(
        ds.strictly_right_spans(the_food, candidates).unwrap(),
        set(&[was_great])
    );
}

#[test]
fn touching_needs_a_shared_position() {
    let Fixture { mut ds, tokens, .. } = fixture();
    let the_food = ds.add_span("np", tokens[0], tokens[1]).unwrap();
    let food_was = ds.add_span("x", tokens[1], tokens[2]).unwrap();
    let great = ds.add_span("word", tokens[3], tokens[3]).unwrap();
    assert_eq!(
        ds.touching_spans(the_food, [food_was, great]).unwrap(),
        set(&[food_was])
    );
}

#[test]
fn covering_then_covered_is_not_an_inverse() {
    let Fixture { mut ds, unit, tokens } = fixture();
    let food = ds.add_span("word", tokens[1], tokens[1]).unwrap();
    let was = ds.add_span("word", tokens[2], tokens[2]).unwrap();

    let covering = ds.covering_spans(food, [unit]).unwrap();
    assert_eq!(covering, set(&[unit]));
    let back = ds.covered_spans(unit, [food, was]).unwrap();
    assert_eq!(back, set(&[food, was]));
}

#[test]
fn spans_of_other_units_never_match() {
    let Fixture { mut ds, unit, .. } = fixture();
    let other = ds.add_textual_unit();
    let hi = ds.add_first_token(other, "Hi", 0).unwrap();
    let greeting = ds.add_span("word", hi, hi).unwrap();
    assert!(ds.covered_spans(unit, [greeting]).unwrap().is_empty());
    assert!(ds.touching_spans(unit, [greeting]).unwrap().is_empty());
    assert!(ds.strictly_left_spans(unit, [greeting]).unwrap().is_empty());
}

#[test]
fn index_views_by_type_and_unit() {
    let Fixture { mut ds, unit, tokens } = fixture();
    let aspect = ds.add_span("aspect", tokens[1], tokens[1]).unwrap();
    let other = ds.add_textual_unit();
    let hi = ds.add_first_token(other, "Hi", 0).unwrap();
    let elsewhere = ds.add_span("aspect", hi, hi).unwrap();

    assert_eq!(ds.spans_of_type("aspect"), &set(&[aspect, elsewhere]));
    assert_eq!(ds.spans_in_unit_of_type(unit, "aspect"), set(&[aspect]));
    assert_eq!(
        ds.spans_of_type_containing("aspect", tokens[1]).unwrap(),
        set(&[aspect])
    );
    assert!(ds.spans_of_type_containing("aspect", tokens[2]).unwrap().is_empty());
    assert!(ds.spans_of_type("missing").is_empty());
}

// =============================================================================
// Mutation invariants
// =============================================================================

#[test]
fn add_succeeds_iff_adjacent() {
    let Fixture { mut ds, tokens, .. } = fixture();
    for (start, candidate) in [(1, 0), (1, 2), (1, 3), (0, 2), (3, 1)] {
        let span = ds.add_span("probe", tokens[start], tokens[start]).unwrap();
        let adjacent = start.abs_diff(candidate) == 1;
        let result = ds.span_add_token(span, tokens[candidate]);
        assert_eq!(result.is_ok(), adjacent, "start {start}, candidate {candidate}");
        if !adjacent {
            assert!(matches!(
                result.map_err(Error::from),
                Err(Error::Core(annostore::CoreError::IllegalSpan(_)))
            ));
            assert_eq!(ds.span(span).unwrap().len(), 1);
        }
    }
}
