//! Domain methods for the backend client.
//!
//! Request and response types are defined in `scriptcast_core::models`.

use async_trait::async_trait;
use scriptcast_core::models::{
    AudioExportResponse, BackendLogLine, BatchExportRequest, BatchGenerateRequest,
    BatchGenerateResponse, ConnectionStatus, FileGenerationResponse, GenerateFromFileRequest,
    LogsResponse, OutputFile, OutputFilesResponse, SpreadsheetExportResponse, StatusResponse,
    TaskCounters, UploadResponse, UploadedFile,
};
use scriptcast_core::{BackendGateway, GatewayError};

use crate::ApiClient;

impl ApiClient {
    /// Upload a file as the single `file` field of a multipart form.
    #[tracing::instrument(skip(self, file), fields(file = %file.name, size = file.size_bytes))]
    pub async fn upload_file(&self, file: &UploadedFile) -> Result<UploadResponse, GatewayError> {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(file.data.to_vec()).file_name(file.name.clone()),
        );

        self.post_multipart("/upload", form).await.map_err(|e| {
            tracing::warn!(error = %e, file = %file.name, "Upload failed");
            e
        })
    }

    #[tracing::instrument(skip(self, request), fields(filename = %request.filename))]
    pub async fn generate_from_uploaded_file(
        &self,
        request: &GenerateFromFileRequest,
    ) -> Result<FileGenerationResponse, GatewayError> {
        let response: FileGenerationResponse =
            self.post_json("/generate-from-file", request).await?;
        Ok(response.normalized())
    }

    #[tracing::instrument(
        skip(self, request),
        fields(product = %request.product_name, batch_id = request.batch_id)
    )]
    pub async fn generate_scripts(
        &self,
        request: &BatchGenerateRequest,
    ) -> Result<BatchGenerateResponse, GatewayError> {
        self.post_json("/generate-a3-batch", request).await
    }

    #[tracing::instrument(
        skip(self, request),
        fields(product = %request.product_name, batch_id = request.batch_id)
    )]
    pub async fn generate_batch_audio(
        &self,
        request: &BatchExportRequest,
    ) -> Result<AudioExportResponse, GatewayError> {
        self.post_json("/generate-a3-audio", request).await
    }

    #[tracing::instrument(
        skip(self, request),
        fields(product = %request.product_name, batch_id = request.batch_id)
    )]
    pub async fn export_batch_excel(
        &self,
        request: &BatchExportRequest,
    ) -> Result<SpreadsheetExportResponse, GatewayError> {
        self.post_json("/export-a3-excel", request).await
    }

    /// Connection check. Transport errors and non-2xx answers count as disconnected.
    pub async fn status(&self) -> ConnectionStatus {
        match self.get::<StatusResponse>("/status").await {
            Ok(response) => ConnectionStatus::from(response),
            Err(e) => {
                tracing::debug!(error = %e, "Status check failed");
                ConnectionStatus::Disconnected {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub async fn task_counters(&self) -> Result<TaskCounters, GatewayError> {
        self.get("/tasks").await
    }

    /// Trailing backend log lines, oldest first.
    pub async fn recent_logs(&self) -> Result<Vec<BackendLogLine>, GatewayError> {
        let response: LogsResponse = self.get("/logs").await?;
        Ok(response.into_lines())
    }

    /// Generated audio files, newest first as the backend sorts them.
    pub async fn output_files(&self) -> Result<Vec<OutputFile>, GatewayError> {
        let response: OutputFilesResponse = self.get("/get-output-files").await?;
        if let Some(total) = response.total_count {
            if total != response.files.len() {
                tracing::debug!(
                    total_count = total,
                    listed = response.files.len(),
                    "Output listing count differs from file list"
                );
            }
        }
        Ok(response.files)
    }
}

#[async_trait]
impl BackendGateway for ApiClient {
    async fn upload(&self, file: &UploadedFile) -> Result<UploadResponse, GatewayError> {
        self.upload_file(file).await
    }

    async fn generate_from_file(
        &self,
        request: &GenerateFromFileRequest,
    ) -> Result<FileGenerationResponse, GatewayError> {
        self.generate_from_uploaded_file(request).await
    }

    async fn generate_batch(
        &self,
        request: &BatchGenerateRequest,
    ) -> Result<BatchGenerateResponse, GatewayError> {
        self.generate_scripts(request).await
    }

    async fn generate_audio(
        &self,
        request: &BatchExportRequest,
    ) -> Result<AudioExportResponse, GatewayError> {
        self.generate_batch_audio(request).await
    }

    async fn export_spreadsheet(
        &self,
        request: &BatchExportRequest,
    ) -> Result<SpreadsheetExportResponse, GatewayError> {
        self.export_batch_excel(request).await
    }
}
