use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::script::ScriptLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Queued,
    InFlight,
    Succeeded,
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Succeeded | BatchStatus::Failed)
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BatchStatus::Queued => write!(f, "queued"),
            BatchStatus::InFlight => write!(f, "in_flight"),
            BatchStatus::Succeeded => write!(f, "succeeded"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The three backend round trips of a batch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Generation,
    AudioExport,
    SpreadsheetExport,
}

impl Display for BatchStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BatchStage::Generation => write!(f, "generation"),
            BatchStage::AudioExport => write!(f, "audio export"),
            BatchStage::SpreadsheetExport => write!(f, "spreadsheet export"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub stage: BatchStage,
    pub message: String,
}

/// One unit of synthesis work. Backend artifacts are keyed by `(product_name, batch_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationBatch {
    /// Starts at 1.
    pub batch_id: u32,
    pub product_name: String,
    pub scripts: Vec<ScriptLine>,
    pub size_requested: usize,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BatchFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excel_path: Option<String>,
}

impl GenerationBatch {
    pub fn new(
        batch_id: u32,
        product_name: impl Into<String>,
        scripts: Vec<ScriptLine>,
        size_requested: usize,
    ) -> Self {
        Self {
            batch_id,
            product_name: product_name.into(),
            scripts,
            size_requested,
            status: BatchStatus::Queued,
            failure: None,
            audio_files: None,
            excel_path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
