//! Request and response bodies exchanged with the backend.
//!
//! Every JSON endpoint may answer `200 OK` with `{"success": false, "error": ...}`.
//! [`BackendReply`] turns that into a tagged value so callers never inspect the
//! body shape themselves.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::emotion::Emotion;
use super::script::{ParsedScript, ParsedScriptSet, ScriptLine};
use crate::error::GatewayError;

/// A 2xx body, classified as accepted or rejected by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply<T> {
    Accepted(T),
    Rejected(String),
}

impl<T: DeserializeOwned> BackendReply<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .or_else(|| value.get("message").and_then(Value::as_str))
                .unwrap_or("Unknown backend error");
            return Ok(BackendReply::Rejected(message.to_string()));
        }
        serde_json::from_value(value).map(BackendReply::Accepted)
    }

    pub fn into_result(self) -> Result<T, GatewayError> {
        match self {
            BackendReply::Accepted(body) => Ok(body),
            BackendReply::Rejected(message) => Err(GatewayError::Rejected(message)),
        }
    }
}

// ---------------------------------------------------------------------------
// upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub parsed_data: ParsedData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedData {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub total_scripts: Option<usize>,
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub a3_compliance: Option<ComplianceReport>,
}

/// Parsed scripts arrive either as bare strings or as objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptEntry {
    Text(String),
    Detailed(DetailedScript),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedScript {
    #[serde(alias = "english_script")]
    pub text: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceReport {
    #[serde(default)]
    pub compliance_score: Option<f64>,
    #[serde(default)]
    pub emotion_distribution: BTreeMap<String, u64>,
}

impl UploadResponse {
    /// Validate the backend's extraction and build the domain script set.
    ///
    /// The error string is the reason the parse is unusable; callers report it as
    /// a backend rejection.
    pub fn into_parsed_set(
        self,
        default_voice: &str,
        default_emotion: Emotion,
    ) -> Result<ParsedScriptSet, String> {
        let data = self.parsed_data;
        if data.success == Some(false) {
            return Err(data
                .error
                .unwrap_or_else(|| "File parsing failed".to_string()));
        }

        let product_name = data
            .product_name
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "Parsed data has no product name".to_string())?;

        let scripts = data
            .scripts
            .into_iter()
            .map(ScriptEntry::into_parsed_script)
            .collect::<Result<Vec<_>, _>>()?;
        if scripts.is_empty() {
            return Err("Parsed data contains no scripts".to_string());
        }
        if let Some(reported) = data.total_scripts {
            if reported != scripts.len() {
                return Err(format!(
                    "Script count mismatch: backend reported {} but returned {}",
                    reported,
                    scripts.len()
                ));
            }
        }

        let recommended_emotion = match data.emotion.as_deref() {
            Some(raw) => parse_emotion(raw)?,
            None => default_emotion,
        };
        let recommended_voice = data
            .voice
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_voice.to_string());

        let compliance = data.a3_compliance.unwrap_or_default();
        let compliance_score = compliance
            .compliance_score
            .unwrap_or(100.0)
            .round()
            .clamp(0.0, 100.0) as u8;

        Ok(ParsedScriptSet {
            filename: self.filename,
            product_name,
            scripts,
            recommended_voice,
            recommended_emotion,
            compliance_score,
            reported_distribution: compliance.emotion_distribution,
        })
    }
}

impl ScriptEntry {
    fn into_parsed_script(self) -> Result<ParsedScript, String> {
        match self {
            ScriptEntry::Text(text) => Ok(ParsedScript::plain(text)),
            ScriptEntry::Detailed(detail) => Ok(ParsedScript {
                text: detail.text,
                emotion: detail.emotion.as_deref().map(parse_emotion).transpose()?,
                voice: detail.voice.filter(|v| !v.trim().is_empty()),
            }),
        }
    }
}

fn parse_emotion(raw: &str) -> Result<Emotion, String> {
    raw.parse()
        .map_err(|_| format!("Unsupported emotion '{}'", raw))
}

// ---------------------------------------------------------------------------
// generate-from-file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateFromFileRequest {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    #[serde(default)]
    pub successful: usize,
    #[serde(default)]
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileGenerationResponse {
    #[serde(default)]
    pub generated_files: Vec<Value>,
    #[serde(default)]
    pub summary: Option<SummaryCounts>,
    #[serde(default)]
    pub audio_directory: Option<String>,
    #[serde(default)]
    pub output_excel: Option<String>,
    /// Some dashboards nest the whole result one level down.
    #[serde(default)]
    pub generation_result: Option<Box<FileGenerationResponse>>,
}

impl FileGenerationResponse {
    /// Unwrap a nested `generation_result` if present.
    pub fn normalized(self) -> FileGenerationResponse {
        match self.generation_result {
            Some(inner) => inner.normalized(),
            None => self,
        }
    }

    /// Counts from the summary, or the number of generated files when the backend
    /// reports no summary.
    pub fn counts(&self) -> SummaryCounts {
        self.summary.unwrap_or(SummaryCounts {
            successful: self.generated_files.len(),
            failed: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// batch generation and exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchGenerateRequest {
    pub product_name: String,
    pub batch_id: u32,
    pub batch_size: usize,
    pub scripts: Vec<ScriptLine>,
    pub rate: i32,
    pub pitch: i32,
    pub volume: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchGenerateResponse {
    #[serde(default)]
    pub statistics: Option<BatchStatistics>,
    /// Generated script records, forwarded untouched to the export calls.
    #[serde(default)]
    pub scripts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchStatistics {
    #[serde(default)]
    pub total_scripts: usize,
    #[serde(default)]
    pub emotion_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchExportRequest {
    pub scripts: Vec<Value>,
    pub product_name: String,
    pub batch_id: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioExportResponse {
    #[serde(default)]
    pub total_generated: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadsheetExportResponse {
    #[serde(default)]
    pub excel_path: Option<String>,
}
