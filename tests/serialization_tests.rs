//! JSON round-trips through files and strings.

use annostore::{
    AnnotationValue, CoreError, Dataset, DatasetJsonReader, DatasetJsonWriter, EntityId, EntityKind,
    Error, JsonConfig, NlpTask, ValueType,
};
use std::collections::BTreeSet;

/// Two reviews with tokens, sub-spans, relations (one on a relation) and
/// every kind of annotation value.
fn corpus() -> Dataset {
    let mut ds = Dataset::new("review");
    ds.mark_performed(NlpTask::Tokenization);
    ds.mark_performed(NlpTask::PosTagging);

    for (r, words) in [["The", "food", "was", "great"], ["Slow", "service", "though", "!"]]
        .iter()
        .enumerate()
    {
        let unit = ds.add_textual_unit();
        ds.put_annotation(unit, "rating", (r as i64) + 4).unwrap();
        ds.put_annotation(unit, "categories", AnnotationValue::set(["FOOD", "SERVICE"]))
            .unwrap();

        let mut tokens: Vec<EntityId> = Vec::new();
        let mut offset = 0;
        for word in words {
            let id = match tokens.last() {
                Some(&previous) => ds.add_token_after(previous, *word, offset).unwrap(),
                None => ds.add_first_token(unit, *word, offset).unwrap(),
            };
            ds.put_annotation(id, "pos", "X").unwrap();
            offset += word.len() + 1;
            tokens.push(id);
        }

        let aspect = ds.add_span("aspect", tokens[1], tokens[1]).unwrap();
        ds.put_annotation(aspect, "score", 0.0).unwrap();
        ds.put_annotation(aspect, "explicit", true).unwrap();
        ds.put_annotation(aspect, "window", AnnotationValue::list([1.5, 2.0])).unwrap();
        ds.add_empty_span("placeholder", unit).unwrap();

        let dep = ds.add_relation("nsubj", tokens[3], tokens[1]).unwrap();
        ds.put_annotation(dep, "weight", 0.25).unwrap();
        ds.add_relation("evidence", dep, aspect).unwrap();
    }
    ds
}

/// Content of a dataset with ids replaced by positions, for comparison.
fn fingerprint(ds: &Dataset) -> Vec<String> {
    let mut lines = Vec::new();
    for unit in ds.textual_units() {
        lines.push(format!("unit {:?}", annotations(ds, unit)));
        for token in ds.tokens_of(unit).unwrap() {
            let t = ds.token(token).unwrap();
            lines.push(format!(
                "  token {} {} {}-{} {:?}",
                t.order(),
                t.text(),
                t.start_offset(),
                t.end_offset(),
                annotations(ds, token)
            ));
        }
    }
    for entity in ds.entities() {
        match entity.kind() {
            EntityKind::Span(span) if !entity.is_textual_unit() => {
                lines.push(format!(
                    "span {} [{}] {:?}",
                    span.span_type(),
                    ds.span_text(entity.id()).unwrap(),
                    annotations(ds, entity.id())
                ));
            }
            EntityKind::Relation(rel) => {
                lines.push(format!(
                    "relation {} {} -> {} {:?}",
                    rel.relation_type(),
                    describe(ds, rel.parent()),
                    describe(ds, rel.child()),
                    annotations(ds, entity.id())
                ));
            }
            _ => {}
        }
    }
    lines.sort();
    lines
}

fn describe(ds: &Dataset, id: EntityId) -> String {
    match ds.entity(id).unwrap().kind() {
        EntityKind::Token(t) => format!("token:{}", t.text()),
        EntityKind::Span(s) => format!("{}:{}", s.span_type(), ds.span_text(id).unwrap()),
        EntityKind::Relation(r) => format!("relation:{}", r.relation_type()),
    }
}

fn annotations(ds: &Dataset, id: EntityId) -> Vec<(String, AnnotationValue)> {
    ds.annotations(id)
        .unwrap()
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn file_round_trip_preserves_content() {
    let original = corpus();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.json");

    DatasetJsonWriter::new(JsonConfig::default().with_pretty(true))
        .write(&original, &path)
        .unwrap();
    let loaded = DatasetJsonReader::new().read(&path).unwrap();

    assert_eq!(loaded.textual_unit_span_type(), "review");
    assert_eq!(loaded.performed_tasks(), original.performed_tasks());
    assert_eq!(loaded.schema(), original.schema());
    assert_eq!(loaded.entity_count(), original.entity_count());
    assert_eq!(fingerprint(&loaded), fingerprint(&original));
}

#[test]
fn value_types_survive_the_round_trip() {
    let original = corpus();
    let json = DatasetJsonWriter::default().to_string(&original).unwrap();
    let loaded = DatasetJsonReader::new().from_str(&json).unwrap();

    let aspect = *loaded.spans_of_type("aspect").iter().next().unwrap();
    assert_eq!(loaded.get_float(aspect, "score").unwrap(), Some(0.0));
    assert_eq!(loaded.get_boolean(aspect, "explicit").unwrap(), Some(true));
    assert_eq!(
        loaded.get_list(aspect, "window").unwrap(),
        Some(&[AnnotationValue::Float(1.5), AnnotationValue::Float(2.0)][..])
    );
    let unit = loaded.textual_units().next().unwrap();
    assert_eq!(
        loaded.get_set(unit, "categories").unwrap(),
        Some(&BTreeSet::from([
            AnnotationValue::from("FOOD"),
            AnnotationValue::from("SERVICE")
        ]))
    );
    assert_eq!(loaded.schema().get("rating"), Some(ValueType::Integer));
}

#[test]
fn loaded_dataset_issues_fresh_ids() {
    let original = corpus();
    let json = DatasetJsonWriter::default().to_string(&original).unwrap();
    let mut loaded = DatasetJsonReader::new().from_str(&json).unwrap();
    let before = loaded.current_id();
    let unit = loaded.add_textual_unit();
    assert_eq!(unit, before + 1);
}

#[test]
fn empty_spans_and_units_round_trip() {
    let mut ds = Dataset::new("document");
    let unit = ds.add_textual_unit();
    ds.add_empty_span("heading", unit).unwrap();
    let json = DatasetJsonWriter::default().to_string(&ds).unwrap();
    assert!(json.contains(r#""firstWordId":null"#));

    let loaded = DatasetJsonReader::new().from_str(&json).unwrap();
    let heading = *loaded.spans_of_type("heading").iter().next().unwrap();
    assert!(loaded.span(heading).unwrap().is_empty());
    assert_eq!(loaded.textual_units().count(), 1);
}

#[test]
fn relations_on_relations_need_file_order() {
    let json = r#"{
        "textualUnitSpanType": "sentence",
        "textualUnits": [ { "id": 1 } ],
        "words": [ { "id": 2, "word": "Hi", "startOffset": 0, "order": 0, "textualUnitId": 1 } ],
        "relations": [
            { "id": 4, "type": "meta", "parentId": 3, "childId": 2 },
            { "id": 3, "type": "self", "parentId": 2, "childId": 2 }
        ]
    }"#;
    let err = DatasetJsonReader::new().from_str(json).unwrap_err();
    assert!(matches!(
        err,
        Error::Core(CoreError::UnresolvableId { id: 3, .. })
    ));
}

#[test]
fn wrong_value_for_registered_type_is_rejected() {
    let json = r#"{
        "textualUnitSpanType": "sentence",
        "annotationDataTypes": { "rating": "java.lang.Integer" },
        "textualUnits": [ { "id": 1, "annotations": { "rating": "five" } } ]
    }"#;
    assert!(matches!(
        DatasetJsonReader::new().from_str(json),
        Err(Error::Parse(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        DatasetJsonReader::new().read(dir.path().join("absent.json")),
        Err(Error::Io(_))
    ));
}
