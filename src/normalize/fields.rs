//! Fallback-chain field lookup over loosely-shaped backend JSON
//!
//! Backends disagree about where a value lives (`text` vs `results.0.text`
//! vs `extracted_text`). Each semantic field has a named candidate list;
//! the first candidate holding a present value wins.

use serde_json::Value;

/// Candidate paths for one semantic field
pub type Chain = &'static [&'static str];

// Evidence documents
/// Storage path of an item's original file
pub const STORAGE_PATH: Chain = &["paths.minioPath", "forensic.minioPath"];
/// Display name of a communication participant
pub const PARTICIPANT_NAME: Chain = &["bestDisplayName", "name", "identifier"];
/// Best available body text of an item
pub const ITEM_TEXT: Chain = &[
    "semanticText",
    "bestTextContent",
    "content.body",
    "content.plainText",
    "content.text",
];
/// Item subject or title
pub const ITEM_SUBJECT: Chain = &["content.subject", "document.title"];
/// Item date
pub const ITEM_DATE: Chain = &["date", "timestamp"];
/// Search hit total, plain or `{value, relation}`
pub const HITS_TOTAL: Chain = &["hits.total.value", "hits.total"];

// Created records
/// Id of a created record
pub const RECORD_ID: Chain = &["_id", "id"];
/// Id of a started pipeline job
pub const JOB_ID: Chain = &["jobId", "pipelineId", "_id", "id"];
/// Id of a generated report
pub const REPORT_ID: Chain = &["_id", "id", "reportId"];
/// Download address of a generated report
pub const DOWNLOAD_URL: Chain = &["downloadUrl", "url"];
/// Storage location of an export
pub const EXPORT_PATH: Chain = &["path", "storagePath", "url"];

// ML text analysis
/// NER entity list
pub const NER_ENTITIES: Chain = &["entities", "results.0.entities"];
/// Entity type
pub const ENTITY_TYPE: Chain = &["type", "label"];
/// Entity surface text
pub const ENTITY_TEXT: Chain = &["text", "word", "value"];
/// Entity confidence
pub const ENTITY_SCORE: Chain = &["score", "confidence"];
/// Sentiment label
pub const SENTIMENT_LABEL: Chain = &["sentiment", "results.0.sentiment", "label"];
/// Sentiment confidence
pub const SENTIMENT_SCORE: Chain = &["score", "results.0.score", "confidence"];
/// Classification scores, array or label→score map
pub const CLASSIFY_SCORES: Chain = &["scores", "results.0.scores", "labels"];
/// Classification entry label
pub const CLASSIFY_LABEL: Chain = &["label", "category"];
/// Classification entry score
pub const CLASSIFY_SCORE: Chain = &["score", "confidence"];
/// Translated text
pub const TRANSLATED_TEXT: Chain = &[
    "translated_text",
    "translation",
    "results.0.translated_text",
    "text",
];
/// Source language of a translation
pub const SOURCE_LANGUAGE: Chain = &["detected_language", "source_language"];
/// Detected language
pub const LANGUAGE: Chain = &["language", "detected_language", "lang"];
/// Language detection confidence
pub const LANGUAGE_CONFIDENCE: Chain = &["confidence", "score"];

// ML image analysis
/// OCR text
pub const OCR_TEXT: Chain = &["text", "results.0.text", "extracted_text", "content"];
/// Detected objects
pub const OBJECTS: Chain = &["objects", "results.0.objects", "detections"];
/// Object label
pub const OBJECT_LABEL: Chain = &["label", "class", "name"];
/// Detection confidence
pub const DETECTION_SCORE: Chain = &["confidence", "score"];
/// Detected faces
pub const FACES: Chain = &["faces", "results.0.faces", "detections"];

/// Resolve a dotted path (`results.0.text`); numeric segments index arrays
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// A value counts as present unless null, blank, or an empty container
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// First present value along the chain
#[must_use]
pub fn lookup<'a>(value: &'a Value, chain: Chain) -> Option<&'a Value> {
    chain
        .iter()
        .filter_map(|path| get_path(value, path))
        .find(|v| is_present(v))
}

/// First candidate renderable as text (strings, numbers, booleans)
#[must_use]
pub fn lookup_text(value: &Value, chain: Chain) -> Option<String> {
    chain
        .iter()
        .filter_map(|path| get_path(value, path))
        .filter(|v| is_present(v))
        .find_map(scalar_text)
}

/// First candidate holding a number (numeric strings accepted)
#[must_use]
pub fn lookup_f64(value: &Value, chain: Chain) -> Option<f64> {
    chain
        .iter()
        .filter_map(|path| get_path(value, path))
        .find_map(as_number)
}

/// First candidate holding a non-empty array
#[must_use]
pub fn lookup_array<'a>(value: &'a Value, chain: Chain) -> Option<&'a [Value]> {
    chain
        .iter()
        .filter_map(|path| get_path(value, path))
        .find_map(|v| v.as_array().filter(|items| !items.is_empty()))
        .map(Vec::as_slice)
}

/// Render a scalar as display text; containers and null yield `None`
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric value of a number or numeric string
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integers render without a fractional part, other floats as-is
#[must_use]
pub fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        #[allow(clippy::cast_possible_truncation)]
        Some(f) if !(n.is_i64() || n.is_u64()) && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
