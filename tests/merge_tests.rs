//! Merging datasets.

use annostore::{AnnotationValue, CoreError, Dataset, EntityId, MergeDimension, NlpTask};

fn review(words: &[&str], unit_type: &str) -> (Dataset, EntityId) {
    let mut ds = Dataset::new(unit_type);
    ds.mark_performed(NlpTask::Tokenization);
    let unit = ds.add_textual_unit();
    let mut previous = None;
    let mut offset = 0;
    for word in words {
        let token = match previous {
            Some(p) => ds.add_token_after(p, *word, offset).unwrap(),
            None => ds.add_first_token(unit, *word, offset).unwrap(),
        };
        ds.put_annotation(token, "lemma", word.to_lowercase()).unwrap();
        offset += word.chars().count() + 1;
        previous = Some(token);
    }
    ds.put_annotation(unit, "polarity", "positive").unwrap();
    (ds, unit)
}

#[test]
fn merge_preserves_every_donor_annotation() {
    let (mut a, _) = review(&["Nice", "staff"], "review");
    let (mut b, b_unit) = review(&["Great", "Pasta", "tonight"], "review");
    let tokens = b.tokens_of(b_unit).unwrap();
    let span = b.add_span("aspect", tokens[1], tokens[1]).unwrap();
    b.put_annotation(span, "aspects", AnnotationValue::list(["FOOD", "QUALITY"]))
        .unwrap();
    b.add_relation("amod", tokens[1], tokens[0]).unwrap();

    let expected_count = a.entity_count() + b.entity_count();
    let donor_lemmas: Vec<String> = tokens
        .iter()
        .map(|&t| b.lemma(t).unwrap().unwrap().to_string())
        .collect();

    a.merge(b).unwrap();

    assert_eq!(a.entity_count(), expected_count);
    let units: Vec<_> = a.textual_units().collect();
    assert_eq!(units.len(), 2);
    let merged_tokens = a.tokens_of(units[1]).unwrap();
    let lemmas: Vec<String> = merged_tokens
        .iter()
        .map(|&t| a.lemma(t).unwrap().unwrap().to_string())
        .collect();
    assert_eq!(lemmas, donor_lemmas);
    assert_eq!(a.get_text(units[1], "polarity").unwrap(), Some("positive"));

    let aspect = *a.spans_of_type("aspect").iter().next().unwrap();
    assert_eq!(a.span_text(aspect).unwrap(), "Pasta");
    assert_eq!(a.get_list(aspect, "aspects").unwrap().map(<[_]>::len), Some(2));
    assert!(a.spans_of_type_containing("aspect", merged_tokens[1]).unwrap().contains(&aspect));

    let amod = *a.relations_of_type("amod").iter().next().unwrap();
    assert_eq!(a.relation(amod).unwrap().parent(), merged_tokens[1]);
    assert!(a.all_relations_to_children(merged_tokens[1]).unwrap().contains(&amod));
}

#[test]
fn review_and_sentence_datasets_do_not_merge() {
    let (mut a, _) = review(&["Fine"], "review");
    let (b, _) = review(&["Fine"], "sentence");
    let before = a.entity_count();

    let err = a.merge(b).unwrap_err();
    assert!(matches!(
        err,
        CoreError::MergeIncompatible {
            dimension: MergeDimension::TextualUnitSpanType,
            ..
        }
    ));
    assert_eq!(a.entity_count(), before);
}

#[test]
fn conflicting_annotation_type_leaves_target_unchanged() {
    let (mut a, a_unit) = review(&["Fine"], "review");
    let (mut b, b_unit) = review(&["Fine"], "review");
    a.put_annotation(a_unit, "stars", 4i64).unwrap();
    b.put_annotation(b_unit, "stars", 4.5).unwrap();
    let schema = a.schema().clone();
    let current = a.current_id();

    assert!(matches!(
        a.merge(b),
        Err(CoreError::MergeIncompatible {
            dimension: MergeDimension::AnnotationTypes,
            ..
        })
    ));
    assert_eq!(a.schema(), &schema);
    assert_eq!(a.current_id(), current);
    assert_eq!(a.textual_units().count(), 1);
}

#[test]
fn donor_only_keys_join_the_schema() {
    let (mut a, _) = review(&["Fine"], "review");
    let (mut b, b_unit) = review(&["Fine"], "review");
    b.put_annotation(b_unit, "helpful_votes", 12i64).unwrap();
    a.merge(b).unwrap();
    let donor_unit = a.textual_units().last().unwrap();
    assert_eq!(a.get_integer(donor_unit, "helpful_votes").unwrap(), Some(12));
}
