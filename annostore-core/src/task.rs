//! Identifiers of processing stages run over a dataset.

use serde::{Deserialize, Serialize};

/// A processing stage performed on a dataset.
///
/// Serialized as its upper-case name (`"POS_TAGGING"`); unknown names
/// round-trip through [`NlpTask::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NlpTask {
    /// Splitting text into tokens
    Tokenization,
    /// Splitting text into sentences
    SentenceSplitting,
    /// Part-of-speech tagging
    PosTagging,
    /// Lemmatization
    Lemmatization,
    /// Constituency parsing
    Parsing,
    /// Dependency parsing
    DepParsing,
    /// Named entity recognition
    Ner,
    /// Coreference resolution
    CorefResolution,
    /// Sentence-level sentiment annotation
    SentimentAnnotating,
    /// Ontology concept lookup (may merge multi-word tokens)
    OntologyLookup,
    /// Lowercasing token text
    Lowercasing,
    /// Rhetorical structure (discourse) parsing
    RstParsing,
    /// Any other stage
    Custom(String),
}

impl NlpTask {
    /// Canonical upper-case name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NlpTask::Tokenization => "TOKENIZATION",
            NlpTask::SentenceSplitting => "SENTENCE_SPLITTING",
            NlpTask::PosTagging => "POS_TAGGING",
            NlpTask::Lemmatization => "LEMMATIZATION",
            NlpTask::Parsing => "PARSING",
            NlpTask::DepParsing => "DEP_PARSING",
            NlpTask::Ner => "NER",
            NlpTask::CorefResolution => "COREF_RESOLUTION",
            NlpTask::SentimentAnnotating => "SENTIMENT_ANNOTATING",
            NlpTask::OntologyLookup => "ONTOLOGY_LOOKUP",
            NlpTask::Lowercasing => "LOWERCASING",
            NlpTask::RstParsing => "RST_PARSING",
            NlpTask::Custom(name) => name,
        }
    }

    /// Parse a task name. Never fails: unknown names become [`NlpTask::Custom`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "TOKENIZATION" => NlpTask::Tokenization,
            "SENTENCE_SPLITTING" => NlpTask::SentenceSplitting,
            "POS_TAGGING" => NlpTask::PosTagging,
            "LEMMATIZATION" => NlpTask::Lemmatization,
            "PARSING" => NlpTask::Parsing,
            "DEP_PARSING" => NlpTask::DepParsing,
            "NER" => NlpTask::Ner,
            "COREF_RESOLUTION" => NlpTask::CorefResolution,
            "SENTIMENT_ANNOTATING" | "STANFORD_SENTIMENT_ANNOTATING" => {
                NlpTask::SentimentAnnotating
            }
            "ONTOLOGY_LOOKUP" => NlpTask::OntologyLookup,
            "LOWERCASING" => NlpTask::Lowercasing,
            "RST_PARSING" => NlpTask::RstParsing,
            other => NlpTask::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for NlpTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NlpTask {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NlpTask::from_name(s))
    }
}

impl From<String> for NlpTask {
    fn from(value: String) -> Self {
        NlpTask::from_name(&value)
    }
}

impl From<NlpTask> for String {
    fn from(value: NlpTask) -> Self {
        value.as_str().to_string()
    }
}
