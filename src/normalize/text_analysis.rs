//! ML text-analysis results

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::{
    CLASSIFY_LABEL, CLASSIFY_SCORE, CLASSIFY_SCORES, ENTITY_SCORE, ENTITY_TEXT, ENTITY_TYPE,
    LANGUAGE, LANGUAGE_CONFIDENCE, NER_ENTITIES, SENTIMENT_LABEL, SENTIMENT_SCORE,
    SOURCE_LANGUAGE, TRANSLATED_TEXT, as_number, lookup, lookup_array, lookup_f64, lookup_text,
};
use super::{sort_by_score_desc, whole_percent};

/// Kind of text analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnalysisKind {
    /// Named entity recognition
    Ner,
    /// Sentiment
    Sentiment,
    /// Zero-shot classification
    Classify,
    /// Translation
    Translate,
    /// Language identification
    DetectLanguage,
}

/// Render an `/analyze/text` response
#[must_use]
pub fn render(kind: TextAnalysisKind, result: &Value, target_language: Option<&str>) -> String {
    match kind {
        TextAnalysisKind::Ner => render_entities(result),
        TextAnalysisKind::Sentiment => render_sentiment(result),
        TextAnalysisKind::Classify => render_classification(result),
        TextAnalysisKind::Translate => render_translation(result, target_language),
        TextAnalysisKind::DetectLanguage => render_language(result),
    }
}

/// Entities grouped by type, groups in first-appearance order
#[must_use]
pub fn render_entities(result: &Value) -> String {
    let Some(entities) = lookup_array(result, NER_ENTITIES) else {
        return "No named entities found in the text.".to_string();
    };

    let mut groups: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    for entity in entities {
        let kind = lookup_text(entity, ENTITY_TYPE).unwrap_or_else(|| "unknown".to_string());
        let text = lookup_text(entity, ENTITY_TEXT).unwrap_or_default();
        let score = lookup_f64(entity, ENTITY_SCORE).unwrap_or(0.0);

        match groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, spans)) => spans.push((text, score)),
            None => groups.push((kind, vec![(text, score)])),
        }
    }

    let mut out = String::from("**Named entities found:**\n");
    for (kind, mut spans) in groups {
        sort_by_score_desc(&mut spans, |(_, score)| *score);
        let listed: Vec<String> = spans
            .iter()
            .map(|(text, score)| format!("{text} ({}%)", whole_percent(*score)))
            .collect();
        let _ = writeln!(out, "**{kind}:** {}", listed.join(", "));
    }
    out
}

fn render_sentiment(result: &Value) -> String {
    let Some(label) = lookup_text(result, SENTIMENT_LABEL) else {
        return "Could not determine sentiment.".to_string();
    };
    let score = lookup_f64(result, SENTIMENT_SCORE)
        .filter(|s| *s != 0.0)
        .map_or_else(|| "N/A".to_string(), |s| format!("{:.1}%", s * 100.0));
    format!("**Sentiment:** {label} ({score})")
}

fn render_classification(result: &Value) -> String {
    let mut entries: Vec<(String, f64)> = match lookup(result, CLASSIFY_SCORES) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|entry| match entry {
                Value::String(label) => (label.clone(), 0.0),
                _ => (
                    lookup_text(entry, CLASSIFY_LABEL).unwrap_or_default(),
                    lookup_f64(entry, CLASSIFY_SCORE).unwrap_or(0.0),
                ),
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(label, score)| (label.clone(), as_number(score).unwrap_or(0.0)))
            .collect(),
        _ => Vec::new(),
    };

    if entries.is_empty() {
        return "Could not classify the text.".to_string();
    }

    sort_by_score_desc(&mut entries, |(_, score)| *score);
    let mut out = String::from("**Classification results:**\n");
    for (label, score) in entries {
        let _ = writeln!(out, "  {label}: {:.1}%", score * 100.0);
    }
    out
}

fn render_translation(result: &Value, target_language: Option<&str>) -> String {
    let Some(translated) = lookup_text(result, TRANSLATED_TEXT) else {
        return "Translation failed: no result returned.".to_string();
    };
    let source = lookup_text(result, SOURCE_LANGUAGE).unwrap_or_else(|| "auto".to_string());
    let target = target_language.unwrap_or("target");
    format!("**Translation ({source} → {target}):**\n{translated}")
}

fn render_language(result: &Value) -> String {
    let Some(language) = lookup_text(result, LANGUAGE) else {
        return "Could not detect language.".to_string();
    };
    let mut out = format!("**Detected language:** {language}");
    if let Some(confidence) = lookup_f64(result, LANGUAGE_CONFIDENCE).filter(|c| *c != 0.0) {
        let _ = write!(out, " ({:.1}% confidence)", confidence * 100.0);
    }
    out
}
