//! JSON persistence of a [`Dataset`].
//!
//! # Format
//!
//! ```json
//! {
//!   "textualUnitSpanType": "review",
//!   "performedNLPTasks": ["TOKENIZATION"],
//!   "annotationDataTypes": { "pos": "java.lang.String" },
//!   "textualUnits": [ { "id": 1, "spanType": "review", "annotations": {} } ],
//!   "words": [ { "id": 2, "word": "Good", "startOffset": 0, "order": 0,
//!                "textualUnitId": 1, "annotations": { "pos": "JJ" } } ],
//!   "spans": [ { "id": 3, "spanType": "aspect", "firstWordId": 2,
//!                "lastWordId": 2, "textualUnitId": 1, "annotations": {} } ],
//!   "relations": [ { "id": 4, "type": "about", "parentId": 3, "childId": 1,
//!                    "annotations": {} } ]
//! }
//! ```
//!
//! Collections are read in the order textual units, words, spans,
//! relations, so every reference points at something already rebuilt.
//! Ids in the file are only used to resolve those references; the loaded
//! dataset issues fresh ids.
//!
//! JSON cannot tell `0` from `0.0` or a list from a set, so annotation
//! values are decoded using the type recorded in `annotationDataTypes`.

use crate::config::JsonConfig;
use crate::error::{Error, Result};
use annostore_core::{AnnotationValue, Annotations, Dataset, EntityId, EntityKind, NlpTask, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

// =============================================================================
// File records
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetRecord {
    textual_unit_span_type: String,
    #[serde(rename = "performedNLPTasks", default)]
    performed_nlp_tasks: Vec<NlpTask>,
    #[serde(default)]
    annotation_data_types: BTreeMap<String, String>,
    #[serde(default)]
    textual_units: Vec<SpanRecord>,
    #[serde(default)]
    words: Vec<WordRecord>,
    #[serde(default)]
    spans: Vec<SpanRecord>,
    #[serde(default)]
    relations: Vec<RelationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WordRecord {
    id: EntityId,
    word: String,
    start_offset: usize,
    order: usize,
    textual_unit_id: EntityId,
    #[serde(default)]
    annotations: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpanRecord {
    id: EntityId,
    #[serde(default)]
    span_type: Option<String>,
    #[serde(default)]
    first_word_id: Option<EntityId>,
    #[serde(default)]
    last_word_id: Option<EntityId>,
    #[serde(default)]
    textual_unit_id: Option<EntityId>,
    #[serde(default)]
    annotations: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationRecord {
    id: EntityId,
    #[serde(rename = "type")]
    relation_type: String,
    parent_id: EntityId,
    child_id: EntityId,
    #[serde(default)]
    annotations: Map<String, Value>,
}

// =============================================================================
// Writer
// =============================================================================

/// Writes a [`Dataset`] as one JSON document.
#[derive(Debug, Clone, Default)]
pub struct DatasetJsonWriter {
    config: JsonConfig,
}

impl DatasetJsonWriter {
    /// Create a writer.
    #[must_use]
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Write `dataset` to a file, replacing it if it exists.
    pub fn write(&self, dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("Start writing {}...", path.display());
        let mut out = BufWriter::new(File::create(path)?);
        self.to_writer(dataset, &mut out)?;
        out.flush()?;
        log::debug!("Wrote {} entities to {}", dataset.entity_count(), path.display());
        Ok(())
    }

    /// Write `dataset` to any sink.
    pub fn to_writer<W: Write>(&self, dataset: &Dataset, writer: W) -> Result<()> {
        let record = encode_dataset(dataset)?;
        if self.config.pretty {
            serde_json::to_writer_pretty(writer, &record)?;
        } else {
            serde_json::to_writer(writer, &record)?;
        }
        Ok(())
    }

    /// Render `dataset` as a JSON string.
    pub fn to_string(&self, dataset: &Dataset) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(dataset, &mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::parse(e.to_string()))
    }
}

fn encode_dataset(dataset: &Dataset) -> Result<DatasetRecord> {
    let mut record = DatasetRecord {
        textual_unit_span_type: dataset.textual_unit_span_type().to_string(),
        performed_nlp_tasks: dataset.performed_tasks().iter().cloned().collect(),
        annotation_data_types: dataset
            .schema()
            .iter()
            .map(|(key, ty)| (key.to_string(), ty.qualified_name().to_string()))
            .collect(),
        textual_units: Vec::new(),
        words: Vec::new(),
        spans: Vec::new(),
        relations: Vec::new(),
    };

    for entity in dataset.entities() {
        let annotations = encode_annotations(entity.annotations())?;
        match entity.kind() {
            EntityKind::Token(token) => record.words.push(WordRecord {
                id: entity.id(),
                word: token.text().to_string(),
                start_offset: token.start_offset(),
                order: token.order(),
                textual_unit_id: entity.textual_unit().ok_or_else(|| {
                    Error::parse(format!("token {} has no textual unit", entity.id()))
                })?,
                annotations,
            }),
            EntityKind::Span(span) => {
                let span_record = SpanRecord {
                    id: entity.id(),
                    span_type: Some(span.span_type().to_string()),
                    first_word_id: span.first(),
                    last_word_id: span.last(),
                    textual_unit_id: entity.textual_unit(),
                    annotations,
                };
                if entity.is_textual_unit() {
                    record.textual_units.push(span_record);
                } else {
                    record.spans.push(span_record);
                }
            }
            EntityKind::Relation(relation) => record.relations.push(RelationRecord {
                id: entity.id(),
                relation_type: relation.relation_type().to_string(),
                parent_id: relation.parent(),
                child_id: relation.child(),
                annotations,
            }),
        }
    }
    Ok(record)
}

fn encode_annotations(annotations: &Annotations) -> Result<Map<String, Value>> {
    annotations
        .iter()
        .map(|(key, value)| Ok((key.to_string(), encode_value(key, value, false)?)))
        .collect()
}

/// Sets are only representable at the top level: the file records the type
/// of the outer value only, so a nested set would read back as a list.
fn encode_value(key: &str, value: &AnnotationValue, nested: bool) -> Result<Value> {
    Ok(match value {
        AnnotationValue::Text(s) => Value::String(s.clone()),
        AnnotationValue::Integer(i) => Value::from(*i),
        AnnotationValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            Error::parse(format!("annotation '{key}' holds {f}, which JSON cannot represent"))
        })?,
        AnnotationValue::Boolean(b) => Value::Bool(*b),
        AnnotationValue::List(items) => Value::Array(
            items
                .iter()
                .map(|v| encode_value(key, v, true))
                .collect::<Result<_>>()?,
        ),
        AnnotationValue::Set(_) if nested => {
            return Err(Error::parse(format!(
                "annotation '{key}' nests a set inside a collection, which cannot be written"
            )))
        }
        AnnotationValue::Set(items) => Value::Array(
            items
                .iter()
                .map(|v| encode_value(key, v, true))
                .collect::<Result<_>>()?,
        ),
    })
}

// =============================================================================
// Reader
// =============================================================================

/// Rebuilds a [`Dataset`] from its JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetJsonReader;

impl DatasetJsonReader {
    /// Create a reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read a dataset from a file.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        log::debug!("Start reading {}...", path.display());
        let dataset = self.from_reader(BufReader::new(File::open(path)?))?;
        log::debug!("Read {} entities from {}", dataset.entity_count(), path.display());
        Ok(dataset)
    }

    /// Read a dataset from any source.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let record: DatasetRecord = serde_json::from_reader(reader)?;
        decode_dataset(record)
    }

    /// Read a dataset from a JSON string.
    pub fn from_str(&self, json: &str) -> Result<Dataset> {
        let record: DatasetRecord = serde_json::from_str(json)?;
        decode_dataset(record)
    }
}

/// File id -> id in the dataset being rebuilt.
struct IdMap(HashMap<EntityId, EntityId>);

impl IdMap {
    fn insert(&mut self, old: EntityId, new: EntityId) -> Result<()> {
        if self.0.insert(old, new).is_some() {
            return Err(Error::parse(format!("id {old} is used by more than one record")));
        }
        Ok(())
    }

    fn resolve(&self, old: EntityId, context: &'static str) -> Result<EntityId> {
        self.0
            .get(&old)
            .copied()
            .ok_or_else(|| annostore_core::Error::unresolvable_id(old, context).into())
    }
}

fn decode_dataset(record: DatasetRecord) -> Result<Dataset> {
    let mut dataset = Dataset::new(record.textual_unit_span_type);
    for task in record.performed_nlp_tasks {
        dataset.mark_performed(task);
    }
    for (key, name) in &record.annotation_data_types {
        let ty: ValueType = name
            .parse()
            .map_err(|_| Error::parse(format!("unknown type '{name}' for annotation '{key}'")))?;
        dataset.register_annotation_type(key, ty)?;
    }

    let mut ids = IdMap(HashMap::new());

    // 1. textual units, empty for now
    for unit in &record.textual_units {
        let id = dataset.add_textual_unit();
        ids.insert(unit.id, id)?;
        put_annotations(&mut dataset, id, &unit.annotations)?;
    }

    // 2. words, linked per unit in ascending order
    let mut words: Vec<&WordRecord> = record.words.iter().collect();
    words.sort_by_key(|w| (w.textual_unit_id, w.order));
    let mut last_in_unit: HashMap<EntityId, EntityId> = HashMap::new();
    for word in words {
        let unit = ids.resolve(word.textual_unit_id, "word textualUnitId")?;
        let id = match last_in_unit.get(&unit) {
            Some(&previous) => dataset.add_token_after(previous, word.word.as_str(), word.start_offset)?,
            None => dataset.add_first_token(unit, word.word.as_str(), word.start_offset)?,
        };
        last_in_unit.insert(unit, id);
        ids.insert(word.id, id)?;
        put_annotations(&mut dataset, id, &word.annotations)?;
    }

    // 3. spans over those words
    for span in &record.spans {
        let span_type = span
            .span_type
            .as_deref()
            .ok_or_else(|| Error::parse(format!("span {} has no spanType", span.id)))?;
        let id = match (span.first_word_id, span.last_word_id) {
            (Some(first), Some(last)) => dataset.add_span(
                span_type,
                ids.resolve(first, "span firstWordId")?,
                ids.resolve(last, "span lastWordId")?,
            )?,
            (None, None) => {
                let unit = span.textual_unit_id.ok_or_else(|| {
                    Error::parse(format!("empty span {} has no textualUnitId", span.id))
                })?;
                dataset.add_empty_span(span_type, ids.resolve(unit, "span textualUnitId")?)?
            }
            _ => {
                return Err(Error::parse(format!(
                    "span {} has only one of firstWordId and lastWordId",
                    span.id
                )))
            }
        };
        ids.insert(span.id, id)?;
        put_annotations(&mut dataset, id, &span.annotations)?;
    }

    // 4. relations, in file order so relations on relations resolve
    for relation in &record.relations {
        let id = dataset.add_relation(
            relation.relation_type.as_str(),
            ids.resolve(relation.parent_id, "relation parentId")?,
            ids.resolve(relation.child_id, "relation childId")?,
        )?;
        ids.insert(relation.id, id)?;
        put_annotations(&mut dataset, id, &relation.annotations)?;
    }

    Ok(dataset)
}

fn put_annotations(dataset: &mut Dataset, id: EntityId, annotations: &Map<String, Value>) -> Result<()> {
    for (key, json) in annotations {
        let ty = dataset.schema().get(key).ok_or_else(|| {
            Error::parse(format!("annotation '{key}' is missing from annotationDataTypes"))
        })?;
        let value = decode_value(key, ty, json)?;
        dataset.put_annotation(id, key, value)?;
    }
    Ok(())
}

/// Decode a value as the registered type.
fn decode_value(key: &str, ty: ValueType, json: &Value) -> Result<AnnotationValue> {
    let mismatch = || Error::parse(format!("annotation '{key}': expected {ty}, found {json}"));
    match ty {
        ValueType::Text => json.as_str().map(AnnotationValue::from).ok_or_else(mismatch),
        ValueType::Integer => json.as_i64().map(AnnotationValue::Integer).ok_or_else(mismatch),
        // integers are accepted: 0.0 is commonly written as 0
        ValueType::Float => json.as_f64().map(AnnotationValue::Float).ok_or_else(mismatch),
        ValueType::Boolean => json.as_bool().map(AnnotationValue::Boolean).ok_or_else(mismatch),
        ValueType::List => {
            let items = json.as_array().ok_or_else(mismatch)?;
            Ok(AnnotationValue::List(
                items.iter().map(|v| infer_element(key, v)).collect::<Result<Vec<_>>>()?,
            ))
        }
        ValueType::Set => {
            let items = json.as_array().ok_or_else(mismatch)?;
            Ok(AnnotationValue::Set(
                items.iter().map(|v| infer_element(key, v)).collect::<Result<BTreeSet<_>>>()?,
            ))
        }
    }
}

/// Decode a collection element, whose type is not recorded.
fn infer_element(key: &str, json: &Value) -> Result<AnnotationValue> {
    match json {
        Value::String(s) => Ok(AnnotationValue::Text(s.clone())),
        Value::Bool(b) => Ok(AnnotationValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(AnnotationValue::Integer)
            .or_else(|| n.as_f64().map(AnnotationValue::Float))
            .ok_or_else(|| Error::parse(format!("annotation '{key}': unsupported number {n}"))),
        Value::Array(items) => Ok(AnnotationValue::List(
            items.iter().map(|v| infer_element(key, v)).collect::<Result<Vec<_>>>()?,
        )),
        Value::Null | Value::Object(_) => Err(Error::parse(format!(
            "annotation '{key}': unsupported collection element {json}"
        ))),
    }
}
