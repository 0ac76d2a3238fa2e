//! Dashboard endpoints: connection status, task counters, backend logs and
//! generated output files.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub tts_service: Option<TtsServiceField>,
}

/// Older dashboards report the TTS service as a bare label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TtsServiceField {
    Label(String),
    Detail { status: String },
}

impl TtsServiceField {
    pub fn status(&self) -> &str {
        match self {
            TtsServiceField::Label(label) => label,
            TtsServiceField::Detail { status } => status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected { tts_service: Option<String> },
    Disconnected { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

impl From<StatusResponse> for ConnectionStatus {
    fn from(response: StatusResponse) -> Self {
        match response.status.as_str() {
            "connected" | "success" => ConnectionStatus::Connected {
                tts_service: response.tts_service.map(|s| s.status().to_string()),
            },
            other => ConnectionStatus::Disconnected {
                reason: format!("backend reported status '{}'", other),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounters {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub error: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LogsResponse {
    Flat { logs: Vec<String> },
    Wrapped { data: LogsData },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsData {
    #[serde(default)]
    pub logs: Vec<String>,
}

impl LogsResponse {
    pub fn into_lines(self) -> Vec<BackendLogLine> {
        let raw = match self {
            LogsResponse::Flat { logs } => logs,
            LogsResponse::Wrapped { data } => data.logs,
        };
        raw.iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(BackendLogLine::parse)
            .collect()
    }
}

/// One backend log line, split from the `"time - LEVEL - message"` layout when
/// the line follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendLogLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub message: String,
}

impl BackendLogLine {
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split(" - ").collect();
        if parts.len() >= 3 {
            BackendLogLine {
                time: Some(parts[0].to_string()),
                level: Some(parts[1].to_string()),
                message: parts[2..].join(" - "),
            }
        } else {
            BackendLogLine {
                time: None,
                level: None,
                message: line.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputFilesResponse {
    #[serde(default)]
    pub files: Vec<OutputFile>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// A generated audio file. `modified` is seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductGroup {
    pub product: String,
    pub file_count: usize,
    pub total_bytes: u64,
    pub latest_modified: f64,
}

pub const UNKNOWN_PRODUCT: &str = "unknown";

/// Product prefix of a `product_0001_Emotion.mp3` style name.
pub fn product_of(file_name: &str) -> &str {
    let parts: Vec<&str> = file_name.split('_').collect();
    if parts.len() >= 3 && !parts[0].is_empty() {
        parts[0]
    } else {
        UNKNOWN_PRODUCT
    }
}

/// Group files by product, keeping the order in which products first appear.
pub fn group_by_product(files: &[OutputFile]) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();
    for file in files {
        let product = product_of(&file.name);
        match groups.iter_mut().find(|g| g.product == product) {
            Some(group) => {
                group.file_count += 1;
                group.total_bytes += file.size;
                group.latest_modified = group.latest_modified.max(file.modified);
            }
            None => groups.push(ProductGroup {
                product: product.to_string(),
                file_count: 1,
                total_bytes: file.size,
                latest_modified: file.modified,
            }),
        }
    }
    groups
}
