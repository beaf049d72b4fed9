//! ML image-analysis results

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::{
    DETECTION_SCORE, FACES, OBJECT_LABEL, OBJECTS, OCR_TEXT, lookup_array, lookup_f64, lookup_text,
};
use super::{OCR_LIMIT, sort_by_score_desc, truncate, whole_percent};

/// Kind of image analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAnalysisKind {
    /// Text extraction
    Ocr,
    /// Object detection
    DetectObjects,
    /// Face detection
    DetectFaces,
}

/// Render an `/analyze/image` response
#[must_use]
pub fn render(kind: ImageAnalysisKind, result: &Value) -> String {
    match kind {
        ImageAnalysisKind::Ocr => match lookup_text(result, OCR_TEXT) {
            Some(text) => format!("**OCR extracted text:**\n{}", truncate(&text, OCR_LIMIT)),
            None => "No text could be extracted from this image.".to_string(),
        },
        ImageAnalysisKind::DetectObjects => render_objects(result),
        ImageAnalysisKind::DetectFaces => match lookup_array(result, FACES) {
            Some(faces) => {
                let plural = if faces.len() == 1 { "" } else { "s" };
                format!("**Faces detected:** {} face{plural} found in the image", faces.len())
            }
            None => "No faces detected in the image.".to_string(),
        },
    }
}

fn render_objects(result: &Value) -> String {
    let Some(objects) = lookup_array(result, OBJECTS) else {
        return "No objects detected in the image.".to_string();
    };

    let mut detections: Vec<(String, f64)> = objects
        .iter()
        .map(|o| {
            (
                lookup_text(o, OBJECT_LABEL).unwrap_or_else(|| "unknown".to_string()),
                lookup_f64(o, DETECTION_SCORE).unwrap_or(0.0),
            )
        })
        .collect();
    sort_by_score_desc(&mut detections, |(_, score)| *score);

    let listed: Vec<String> = detections
        .iter()
        .map(|(label, score)| format!("{label} ({}%)", whole_percent(*score)))
        .collect();
    format!("**Objects detected:** {}", listed.join(", "))
}
