//! Upload coordinator.
//!
//! Validates files locally, sends them to the backend for parsing and tracks
//! each submitted file's status. A file that is already uploading is never sent
//! twice: duplicate submissions await the same in-flight result.

use futures::future::{BoxFuture, FutureExt, Shared};
use scriptcast_core::constants::{allowed_extensions, is_allowed_extension};
use scriptcast_core::models::{
    Emotion, FileKey, ParsedScriptSet, ProgressEvent, UploadStatus, UploadedFile,
};
use scriptcast_core::{BackendGateway, ClientConfig, UploadError};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::reporter::{lock, ActivityReporter};

type UploadResult = Result<ParsedScriptSet, UploadError>;
type InFlightUpload = Shared<BoxFuture<'static, UploadResult>>;

/// Read-only view of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    pub key: FileKey,
    pub name: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedScriptSet>,
}

struct FileEntry {
    file: UploadedFile,
    status: UploadStatus,
    in_flight: Option<InFlightUpload>,
    error: Option<UploadError>,
    parsed: Option<ParsedScriptSet>,
}

impl FileEntry {
    fn view(&self) -> TrackedFile {
        TrackedFile {
            key: self.file.key(),
            name: self.file.name.clone(),
            size_bytes: self.file.size_bytes,
            status: self.status,
            error: self.error.as_ref().map(|e| e.to_string()),
            parsed: self.parsed.clone(),
        }
    }
}

#[derive(Clone)]
pub struct UploadCoordinator {
    gateway: Arc<dyn BackendGateway>,
    reporter: Arc<ActivityReporter>,
    default_voice: String,
    default_emotion: Emotion,
    entries: Arc<Mutex<Vec<FileEntry>>>,
}

impl UploadCoordinator {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        reporter: Arc<ActivityReporter>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            gateway,
            reporter,
            default_voice: config.default_voice.clone(),
            default_emotion: config.default_emotion,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Upload `file` and return the backend's parse.
    ///
    /// Unsupported extensions fail before any network call. Submitting a file that
    /// is still uploading returns the pending result of the first submission.
    pub async fn submit(&self, file: &UploadedFile) -> UploadResult {
        self.check_extension(file)?;
        let upload = self.begin(file);
        upload.await
    }

    /// Track a file without uploading it yet. Unsupported extensions are refused.
    pub fn add(&self, file: &UploadedFile) -> Result<(), UploadError> {
        self.check_extension(file)?;
        let mut entries = lock(&self.entries);
        if entries.iter().all(|entry| entry.file.key() != file.key()) {
            entries.push(FileEntry {
                file: file.clone(),
                status: UploadStatus::Pending,
                in_flight: None,
                error: None,
                parsed: None,
            });
        }
        Ok(())
    }

    /// Upload every pending file, one after another, in the order they were added.
    pub async fn upload_pending(&self) -> Vec<(String, UploadResult)> {
        let pending = self.files_with_status(UploadStatus::Pending);
        self.submit_all(pending).await
    }

    /// Re-upload every failed file sequentially.
    pub async fn retry_failed(&self) -> Vec<(String, UploadResult)> {
        let failed = self.files_with_status(UploadStatus::Failed);
        if !failed.is_empty() {
            self.reporter.record(ProgressEvent::info(
                "uploads",
                format!("retrying {} failed file(s)", failed.len()),
            ));
        }
        self.submit_all(failed).await
    }

    pub fn status(&self, file: &UploadedFile) -> Option<UploadStatus> {
        let key = file.key();
        lock(&self.entries)
            .iter()
            .find(|entry| entry.file.key() == key)
            .map(|entry| entry.status)
    }

    /// Tracked files in submission order.
    pub fn files(&self) -> Vec<TrackedFile> {
        lock(&self.entries).iter().map(FileEntry::view).collect()
    }

    pub fn failed_files(&self) -> Vec<TrackedFile> {
        lock(&self.entries)
            .iter()
            .filter(|entry| entry.status == UploadStatus::Failed)
            .map(FileEntry::view)
            .collect()
    }

    /// Forget every file that is not currently uploading.
    pub fn clear(&self) {
        lock(&self.entries).retain(|entry| entry.status == UploadStatus::Uploading);
    }

    fn check_extension(&self, file: &UploadedFile) -> Result<(), UploadError> {
        if is_allowed_extension(&file.extension) {
            return Ok(());
        }
        let err = UploadError::UnsupportedFormat {
            extension: file.extension.clone(),
            allowed: allowed_extensions(),
        };
        self.reporter
            .record(ProgressEvent::error(file.name.as_str(), err.to_string()));
        Err(err)
    }

    fn files_with_status(&self, status: UploadStatus) -> Vec<UploadedFile> {
        lock(&self.entries)
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.file.clone())
            .collect()
    }

    async fn submit_all(&self, files: Vec<UploadedFile>) -> Vec<(String, UploadResult)> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let result = self.submit(&file).await;
            results.push((file.name, result));
        }
        results
    }

    /// Join the in-flight upload for `file`, or start a new one.
    fn begin(&self, file: &UploadedFile) -> InFlightUpload {
        let key = file.key();
        let mut entries = lock(&self.entries);

        let position = entries.iter().position(|entry| entry.file.key() == key);
        if let Some(index) = position {
            if let Some(in_flight) = &entries[index].in_flight {
                tracing::debug!(file = %file.name, "Upload already in flight, joining it");
                return in_flight.clone();
            }
        }

        let upload = self.upload_future(file.clone());
        let entry = FileEntry {
            file: file.clone(),
            status: UploadStatus::Uploading,
            in_flight: Some(upload.clone()),
            error: None,
            parsed: None,
        };
        match position {
            Some(index) => entries[index] = entry,
            None => entries.push(entry),
        }
        upload
    }

    fn upload_future(&self, file: UploadedFile) -> InFlightUpload {
        let gateway = Arc::clone(&self.gateway);
        let reporter = Arc::clone(&self.reporter);
        let entries = Arc::clone(&self.entries);
        let default_voice = self.default_voice.clone();
        let default_emotion = self.default_emotion;

        async move {
            reporter.record(ProgressEvent::info(file.name.as_str(), "upload started"));

            let result = match gateway.upload(&file).await {
                Ok(response) => response
                    .into_parsed_set(&default_voice, default_emotion)
                    .map_err(UploadError::BackendRejected),
                Err(e) => Err(UploadError::from(e)),
            };

            match &result {
                Ok(parsed) => reporter.record(ProgressEvent::success(
                    file.name.as_str(),
                    format!(
                        "parsed {} script(s) for {}",
                        parsed.scripts.len(),
                        parsed.product_name
                    ),
                )),
                Err(e) => reporter.record(ProgressEvent::error(file.name.as_str(), e.to_string())),
            }

            let key = file.key();
            if let Some(entry) = lock(&entries).iter_mut().find(|e| e.file.key() == key) {
                entry.in_flight = None;
                match &result {
                    Ok(parsed) => {
                        entry.status = UploadStatus::Parsed;
                        entry.parsed = Some(parsed.clone());
                        entry.error = None;
                    }
                    Err(e) => {
                        entry.status = UploadStatus::Failed;
                        entry.parsed = None;
                        entry.error = Some(e.clone());
                    }
                }
            }

            result
        }
        .boxed()
        .shared()
    }
}
