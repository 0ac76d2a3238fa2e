//! Scripted in-memory gateway for workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scriptcast_core::models::{
    AudioExportResponse, BatchExportRequest, BatchGenerateRequest, BatchGenerateResponse,
    BatchStage, FileGenerationResponse, GenerateFromFileRequest, SpreadsheetExportResponse,
    UploadResponse, UploadedFile,
};
use scriptcast_core::{BackendGateway, ClientConfig, GatewayError};
use scriptcast_workflow::{ActivityReporter, GenerationWorkflow, UploadCoordinator};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(String),
    FromFile(String),
    Generate(u32),
    AudioExport(u32),
    SpreadsheetExport(u32),
}

/// Gateway that records every call and answers from scripted replies.
///
/// Every call yields once before answering, so concurrent callers interleave
/// the way they would against a real backend.
#[derive(Clone)]
pub struct MockGateway {
    calls: Arc<Mutex<Vec<Call>>>,
    upload_body: Arc<Mutex<Value>>,
    upload_error: Arc<Mutex<Option<GatewayError>>>,
    batch_failures: Arc<Mutex<HashMap<(BatchStage, u32), GatewayError>>>,
    from_file_reply: Arc<Mutex<Result<Value, GatewayError>>>,
    upload_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            upload_body: Arc::new(Mutex::new(widget_upload_body())),
            upload_error: Arc::new(Mutex::new(None)),
            batch_failures: Arc::new(Mutex::new(HashMap::new())),
            from_file_reply: Arc::new(Mutex::new(Ok(json!({
                "generated_files": [],
                "summary": {"successful": 0, "failed": 0}
            })))),
            upload_gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_upload_body(&self, body: Value) {
        *self.upload_body.lock().unwrap() = body;
    }

    pub fn fail_uploads(&self, err: Option<GatewayError>) {
        *self.upload_error.lock().unwrap() = err;
    }

    pub fn fail_batch(&self, stage: BatchStage, batch_id: u32, err: GatewayError) {
        self.batch_failures
            .lock()
            .unwrap()
            .insert((stage, batch_id), err);
    }

    pub fn clear_failures(&self) {
        self.batch_failures.lock().unwrap().clear();
    }

    pub fn set_from_file_reply(&self, reply: Result<Value, GatewayError>) {
        *self.from_file_reply.lock().unwrap() = reply;
    }

    /// Hold every upload until the returned `Notify` is signalled.
    pub fn gate_uploads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.upload_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Upload(_)))
            .count()
    }

    pub fn generated_batch_ids(&self) -> Vec<u32> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Generate(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_failure(&self, stage: BatchStage, batch_id: u32) -> Result<(), GatewayError> {
        match self.batch_failures.lock().unwrap().get(&(stage, batch_id)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn upload(&self, file: &UploadedFile) -> Result<UploadResponse, GatewayError> {
        self.record(Call::Upload(file.name.clone()));
        let gate = self.upload_gate.lock().unwrap().clone();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        if let Some(err) = self.upload_error.lock().unwrap().clone() {
            return Err(err);
        }
        let body = self.upload_body.lock().unwrap().clone();
        serde_json::from_value(body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn generate_from_file(
        &self,
        request: &GenerateFromFileRequest,
    ) -> Result<FileGenerationResponse, GatewayError> {
        self.record(Call::FromFile(request.filename.clone()));
        tokio::task::yield_now().await;
        let reply = self.from_file_reply.lock().unwrap().clone();
        let body = reply?;
        serde_json::from_value::<FileGenerationResponse>(body)
            .map(FileGenerationResponse::normalized)
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn generate_batch(
        &self,
        request: &BatchGenerateRequest,
    ) -> Result<BatchGenerateResponse, GatewayError> {
        self.record(Call::Generate(request.batch_id));
        tokio::task::yield_now().await;
        self.scripted_failure(BatchStage::Generation, request.batch_id)?;

        let scripts = request
            .scripts
            .iter()
            .map(|line| {
                json!({
                    "english_script": line.text,
                    "emotion": line.emotion,
                    "voice": line.voice,
                })
            })
            .collect();
        Ok(BatchGenerateResponse {
            statistics: None,
            scripts,
        })
    }

    async fn generate_audio(
        &self,
        request: &BatchExportRequest,
    ) -> Result<AudioExportResponse, GatewayError> {
        self.record(Call::AudioExport(request.batch_id));
        tokio::task::yield_now().await;
        self.scripted_failure(BatchStage::AudioExport, request.batch_id)?;
        Ok(AudioExportResponse {
            total_generated: request.scripts.len() as u64,
        })
    }

    async fn export_spreadsheet(
        &self,
        request: &BatchExportRequest,
    ) -> Result<SpreadsheetExportResponse, GatewayError> {
        self.record(Call::SpreadsheetExport(request.batch_id));
        tokio::task::yield_now().await;
        self.scripted_failure(BatchStage::SpreadsheetExport, request.batch_id)?;
        Ok(SpreadsheetExportResponse {
            excel_path: Some(format!(
                "output/{}_batch_{}.xlsx",
                request.product_name, request.batch_id
            )),
        })
    }
}

/// Backend parse of a `products.xlsx` holding two Widget scripts.
pub fn widget_upload_body() -> Value {
    json!({
        "filename": "20260101_120000_products.xlsx",
        "parsed_data": {
            "product_name": "Widget",
            "total_scripts": 2,
            "scripts": ["Buy now", "Limited offer"],
            "emotion": "Friendly",
            "voice": "en-US-JennyNeural",
            "a3_compliance": {"compliance_score": 92.4}
        }
    })
}

pub struct Harness {
    pub gateway: MockGateway,
    pub reporter: Arc<ActivityReporter>,
    pub uploads: UploadCoordinator,
    pub workflow: Arc<GenerationWorkflow>,
}

pub fn harness() -> Harness {
    let config = ClientConfig::default();
    let gateway = MockGateway::new();
    let reporter = Arc::new(ActivityReporter::new(config.activity_log_capacity));
    let shared: Arc<dyn BackendGateway> = Arc::new(gateway.clone());
    let uploads = UploadCoordinator::new(Arc::clone(&shared), Arc::clone(&reporter), &config);
    let workflow = Arc::new(GenerationWorkflow::with_seed(
        shared,
        Arc::clone(&reporter),
        &config,
        7,
    ));
    Harness {
        gateway,
        reporter,
        uploads,
        workflow,
    }
}
