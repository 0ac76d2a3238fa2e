//! Script sets and generation parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use super::emotion::{Emotion, EmotionChoice};

/// One line of spoken text, as extracted by the backend.
///
/// The backend may attach its own emotion or voice to a line; those win over the
/// set's recommendation unless the run parameters fix a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScript {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl ParsedScript {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emotion: None,
            voice: None,
        }
    }
}

/// Structured extraction of an uploaded file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScriptSet {
    /// Name under which the backend stored the upload.
    pub filename: String,
    pub product_name: String,
    pub scripts: Vec<ParsedScript>,
    pub recommended_voice: String,
    pub recommended_emotion: Emotion,
    /// 0..=100
    pub compliance_score: u8,
    /// Backend's own emotion breakdown of the file, when it reports one.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reported_distribution: BTreeMap<String, u64>,
}

/// Scripts typed in by the user rather than parsed from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualScripts {
    pub product_name: String,
    pub scripts: Vec<String>,
}

impl ManualScripts {
    /// One script per non-blank line of `text`, trimmed.
    pub fn from_text(product_name: impl Into<String>, text: &str) -> Self {
        Self {
            product_name: product_name.into().trim().to_string(),
            scripts: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Input to a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Parsed(ParsedScriptSet),
    Manual(ManualScripts),
}

impl ScriptSource {
    pub fn product_name(&self) -> &str {
        match self {
            ScriptSource::Parsed(set) => &set.product_name,
            ScriptSource::Manual(manual) => &manual.product_name,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScriptSource::Parsed(set) => set.scripts.len(),
            ScriptSource::Manual(manual) => manual.scripts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recommended_emotion(&self) -> Option<Emotion> {
        match self {
            ScriptSource::Parsed(set) => Some(set.recommended_emotion),
            ScriptSource::Manual(_) => None,
        }
    }

    pub fn recommended_voice(&self) -> Option<&str> {
        match self {
            ScriptSource::Parsed(set) => Some(set.recommended_voice.as_str()),
            ScriptSource::Manual(_) => None,
        }
    }

    /// Scripts in source order, without any run-level resolution applied.
    pub fn scripts(&self) -> Vec<ParsedScript> {
        match self {
            ScriptSource::Parsed(set) => set.scripts.clone(),
            ScriptSource::Manual(manual) => manual
                .scripts
                .iter()
                .map(|s| ParsedScript::plain(s.as_str()))
                .collect(),
        }
    }
}

impl From<ParsedScriptSet> for ScriptSource {
    fn from(set: ParsedScriptSet) -> Self {
        ScriptSource::Parsed(set)
    }
}

impl From<ManualScripts> for ScriptSource {
    fn from(manual: ManualScripts) -> Self {
        ScriptSource::Manual(manual)
    }
}

/// Voice and batching settings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Falls back to the parsed set's recommendation, then the configured default.
    pub voice: Option<String>,
    /// Falls back to per-script or recommended emotion, then the configured default.
    pub emotion: Option<EmotionChoice>,
    pub rate: i32,
    pub pitch: i32,
    pub volume: i32,
    /// `None` puts every script in a single batch.
    pub batch_size: Option<NonZeroUsize>,
}

/// A script with emotion and voice fully resolved for synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    #[serde(rename = "english_script")]
    pub text: String,
    pub emotion: Emotion,
    pub voice: String,
}
