//! Backend gateway contract.
//!
//! The upload coordinator and generation workflow only see this trait; the HTTP
//! implementation lives in `scriptcast-api-client`, and tests substitute an
//! in-memory one.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{
    AudioExportResponse, BatchExportRequest, BatchGenerateRequest, BatchGenerateResponse,
    FileGenerationResponse, GenerateFromFileRequest, SpreadsheetExportResponse, UploadResponse,
    UploadedFile,
};

#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Multipart upload of a single file; the backend parses it into scripts.
    async fn upload(&self, file: &UploadedFile) -> Result<UploadResponse, GatewayError>;

    /// Server-side generation for a previously uploaded file.
    async fn generate_from_file(
        &self,
        request: &GenerateFromFileRequest,
    ) -> Result<FileGenerationResponse, GatewayError>;

    async fn generate_batch(
        &self,
        request: &BatchGenerateRequest,
    ) -> Result<BatchGenerateResponse, GatewayError>;

    async fn generate_audio(
        &self,
        request: &BatchExportRequest,
    ) -> Result<AudioExportResponse, GatewayError>;

    async fn export_spreadsheet(
        &self,
        request: &BatchExportRequest,
    ) -> Result<SpreadsheetExportResponse, GatewayError>;
}
