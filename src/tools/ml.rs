//! ML analysis tools (service `ml`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{ToolHandler, ToolOutput, definition, parse_args};
use crate::Result;
use crate::client::search::SearchRequest;
use crate::client::{GatewayApi, GatewayRequest, ML_TIMEOUT, Service};
use crate::normalize::evidence::hit_items;
use crate::normalize::fields::{STORAGE_PATH, lookup_text};
use crate::normalize::image_analysis::{self, ImageAnalysisKind};
use crate::normalize::text_analysis::{self, TextAnalysisKind};
use crate::normalize::{ML_INPUT_LIMIT, clip};
use crate::protocol::{Tool, ToolAnnotations};

pub(super) fn tools() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(AnalyzeText), Box::new(AnalyzeImage)]
}

// ── analyze_text ─────────────────────────────────────────────────────────────

struct AnalyzeText;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextParams {
    text: String,
    analysis_type: TextAnalysisKind,
    entity_types: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    target_language: Option<String>,
}

/// `/analyze/text` body; type-specific options only for their analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalysisBody<'a> {
    text: &'a str,
    analysis_type: TextAnalysisKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_types: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_language: Option<&'a str>,
}

impl<'a> TextAnalysisBody<'a> {
    fn from_params(params: &'a AnalyzeTextParams) -> Self {
        let kind = params.analysis_type;
        Self {
            text: clip(&params.text, ML_INPUT_LIMIT),
            analysis_type: kind,
            entity_types: params
                .entity_types
                .as_deref()
                .filter(|_| kind == TextAnalysisKind::Ner),
            categories: params
                .categories
                .as_deref()
                .filter(|_| kind == TextAnalysisKind::Classify),
            target_language: params
                .target_language
                .as_deref()
                .filter(|_| kind == TextAnalysisKind::Translate),
        }
    }
}

#[async_trait]
impl ToolHandler for AnalyzeText {
    fn definition(&self) -> Tool {
        definition(
            "analyze_text",
            "Analyze Text",
            "Run ML analysis on text: NER (entity extraction), sentiment analysis, \
             text classification, translation, or language detection. \
             Text is truncated at 5000 characters.",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "minLength": 1, "description": "Text to analyze (max 5000 chars)" },
                    "analysisType": { "type": "string", "enum": ["ner", "sentiment", "classify", "translate", "detect_language"], "description": "Type of analysis" },
                    "entityTypes": { "type": "array", "items": { "type": "string" }, "description": "For NER: entity types to extract (e.g. person, phone, email, ssn)" },
                    "categories": { "type": "array", "items": { "type": "string" }, "description": "For classify: categories to classify into" },
                    "targetLanguage": { "type": "string", "description": "For translate: target ISO language code (e.g. \"en\", \"he\")" }
                },
                "required": ["text", "analysisType"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "ML analysis failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: AnalyzeTextParams = parse_args(args)?;
        let request = GatewayRequest::post(Service::Ml, "/analyze/text")
            .with_json(&TextAnalysisBody::from_params(&params))?
            .with_timeout(ML_TIMEOUT);
        let result = gateway.call(request).await?;

        Ok(ToolOutput::text(text_analysis::render(
            params.analysis_type,
            &result,
            params.target_language.as_deref(),
        )))
    }
}

// ── analyze_image ────────────────────────────────────────────────────────────

struct AnalyzeImage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeImageParams {
    case_id: String,
    item_id: String,
    analysis_type: ImageAnalysisKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnalysisBody<'a> {
    file_path: &'a str,
    analysis_type: ImageAnalysisKind,
}

#[async_trait]
impl ToolHandler for AnalyzeImage {
    fn definition(&self) -> Tool {
        definition(
            "analyze_image",
            "Analyze Image",
            "Run ML analysis on an image: OCR (text extraction), object detection, or face detection. \
             First fetches the item from investigation to get the file path, then runs analysis.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "itemId": { "type": "string", "minLength": 1, "description": "Evidence item ID containing the image" },
                    "analysisType": { "type": "string", "enum": ["ocr", "detect_objects", "detect_faces"], "description": "Type of image analysis" }
                },
                "required": ["caseId", "itemId", "analysisType"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Image analysis failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: AnalyzeImageParams = parse_args(args)?;

        // Resolve the stored file before touching the ML service.
        let lookup = SearchRequest::by_ids(&params.case_id, std::slice::from_ref(&params.item_id));
        let request = GatewayRequest::post(Service::Investigation, "/search").with_json(&lookup)?;
        let found = match gateway.call(request).await {
            Ok(found) => found,
            Err(e) => {
                return Ok(ToolOutput::error(format!(
                    "Error: Could not look up item \"{}\": {e}",
                    params.item_id
                )));
            }
        };

        let Some(item) = hit_items(&found).first() else {
            return Ok(ToolOutput::text(format!(
                "Item \"{}\" not found in case {}.",
                params.item_id, params.case_id
            )));
        };
        let data = item.get("data").unwrap_or(&Value::Null);
        let Some(file_path) = lookup_text(data, STORAGE_PATH) else {
            return Ok(ToolOutput::text(format!(
                "Item \"{}\" does not have a stored file to analyze.",
                params.item_id
            )));
        };
        debug!(item = %params.item_id, "Resolved stored file for image analysis");

        let body = ImageAnalysisBody {
            file_path: &file_path,
            analysis_type: params.analysis_type,
        };
        let request = GatewayRequest::post(Service::Ml, "/analyze/image")
            .with_json(&body)?
            .with_timeout(ML_TIMEOUT);
        let result = gateway.call(request).await?;

        Ok(ToolOutput::text(image_analysis::render(
            params.analysis_type,
            &result,
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(kind: &str) -> AnalyzeTextParams {
        parse_args(json!({
            "text": "x".repeat(ML_INPUT_LIMIT + 50),
            "analysisType": kind,
            "entityTypes": ["person"],
            "categories": ["legal"],
            "targetLanguage": "en"
        }))
        .unwrap()
    }

    #[test]
    fn text_is_cut_without_marker() {
        let params = params("sentiment");
        let body = TextAnalysisBody::from_params(&params);
        assert_eq!(body.text.len(), ML_INPUT_LIMIT);
        assert!(!body.text.ends_with("..."));
    }

    #[test]
    fn only_relevant_options_are_sent() {
        let ner = params("ner");
        let body = serde_json::to_value(TextAnalysisBody::from_params(&ner)).unwrap();
        assert_eq!(body["analysisType"], "ner");
        assert_eq!(body["entityTypes"], json!(["person"]));
        assert!(body.get("categories").is_none());
        assert!(body.get("targetLanguage").is_none());

        let translate = params("translate");
        let body = serde_json::to_value(TextAnalysisBody::from_params(&translate)).unwrap();
        assert_eq!(body["targetLanguage"], "en");
        assert!(body.get("entityTypes").is_none());

        let detect = params("detect_language");
        let body = serde_json::to_value(TextAnalysisBody::from_params(&detect)).unwrap();
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[test]
    fn image_body_uses_wire_names() {
        let body = ImageAnalysisBody {
            file_path: "evidence/c1/img.png",
            analysis_type: ImageAnalysisKind::DetectObjects,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "filePath": "evidence/c1/img.png", "analysisType": "detect_objects" })
        );
    }
}
