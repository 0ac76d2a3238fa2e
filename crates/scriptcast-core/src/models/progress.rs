use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EventKind::Info => write!(f, "info"),
            EventKind::Success => write!(f, "success"),
            EventKind::Warning => write!(f, "warning"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// Immutable status record pushed to the activity reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub subject: String,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn info(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, subject, message)
    }

    pub fn success(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, subject, message)
    }

    pub fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Warning, subject, message)
    }

    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, subject, message)
    }
}
