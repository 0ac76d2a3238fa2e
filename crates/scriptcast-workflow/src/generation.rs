//! Generation workflow.
//!
//! A run resolves every script's emotion and voice, splits the scripts into
//! batches and drives each batch through generation, audio export and
//! spreadsheet export. Batches run strictly one after another. A failed batch
//! is recorded and the run moves on to the next one.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use scriptcast_core::models::{
    BatchExportRequest, BatchFailure, BatchGenerateRequest, BatchStage, BatchStatus, Emotion,
    EmotionChoice, GenerateFromFileRequest, GenerationBatch, GenerationParameters,
    GenerationSummary, ParsedScript, ParsedScriptSet, ProgressEvent, RunProgress, ScriptLine,
    ScriptSource,
};
use scriptcast_core::{
    BackendGateway, ClientConfig, ErrorMetadata, GatewayError, LogLevel, WorkflowError,
};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

use crate::batching::plan_batches;
use crate::reporter::{lock, ActivityReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Completed | WorkflowState::Cancelled | WorkflowState::Failed
        )
    }
}

impl Display for WorkflowState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Running => write!(f, "running"),
            WorkflowState::Completed => write!(f, "completed"),
            WorkflowState::Cancelled => write!(f, "cancelled"),
            WorkflowState::Failed => write!(f, "failed"),
        }
    }
}

/// Requests cancellation of the current run at the next batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Final state of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: WorkflowState,
    pub summary: GenerationSummary,
    pub batches: Vec<GenerationBatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_excel: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug)]
struct RunState {
    state: WorkflowState,
    product_name: String,
    summary: GenerationSummary,
    batches: Vec<GenerationBatch>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            state: WorkflowState::Idle,
            product_name: String::new(),
            summary: GenerationSummary::default(),
            batches: Vec::new(),
        }
    }
}

/// Marks the run cancelled if its future is dropped before finishing.
struct RunGuard<'a> {
    run: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut run = lock(self.run);
        if run.state == WorkflowState::Running {
            run.state = WorkflowState::Cancelled;
        }
    }
}

struct BatchOutput {
    audio_files: u64,
    excel_path: Option<String>,
}

pub struct GenerationWorkflow {
    gateway: Arc<dyn BackendGateway>,
    reporter: Arc<ActivityReporter>,
    default_voice: String,
    default_emotion: Emotion,
    default_batch_size: Option<NonZeroUsize>,
    cancel: CancelHandle,
    run: Mutex<RunState>,
    rng: Mutex<StdRng>,
}

impl GenerationWorkflow {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        reporter: Arc<ActivityReporter>,
        config: &ClientConfig,
    ) -> Self {
        Self::with_rng(gateway, reporter, config, StdRng::from_os_rng())
    }

    /// Deterministic random emotion selection.
    pub fn with_seed(
        gateway: Arc<dyn BackendGateway>,
        reporter: Arc<ActivityReporter>,
        config: &ClientConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(gateway, reporter, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        gateway: Arc<dyn BackendGateway>,
        reporter: Arc<ActivityReporter>,
        config: &ClientConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            gateway,
            reporter,
            default_voice: config.default_voice.clone(),
            default_emotion: config.default_emotion,
            default_batch_size: config.default_batch_size,
            cancel: CancelHandle::default(),
            run: Mutex::new(RunState::default()),
            rng: Mutex::new(rng),
        }
    }

    pub fn state(&self) -> WorkflowState {
        lock(&self.run).state
    }

    pub fn summary(&self) -> GenerationSummary {
        lock(&self.run).summary.clone()
    }

    pub fn batches(&self) -> Vec<GenerationBatch> {
        lock(&self.run).batches.clone()
    }

    pub fn progress(&self) -> RunProgress {
        let run = lock(&self.run);
        RunProgress {
            completed_batches: run
                .batches
                .iter()
                .filter(|batch| batch.status.is_terminal())
                .count(),
            total_batches: run.batches.len(),
            processed_scripts: run.summary.processed(),
            total_scripts: run.summary.total_scripts,
        }
    }

    /// Stop the current run before its next batch. The batch in flight finishes.
    pub fn cancel(&self) {
        if self.state() == WorkflowState::Running {
            tracing::info!("Cancellation requested");
        }
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run every script of `source` through the backend in batches.
    ///
    /// Fails with `AlreadyRunning` while another run is in progress and with
    /// `InvalidParameters` when there is no product name or no script. Batch
    /// failures do not fail the run; they are counted in the summary.
    pub async fn generate(
        &self,
        source: impl Into<ScriptSource>,
        parameters: &GenerationParameters,
    ) -> Result<RunReport, WorkflowError> {
        let source = source.into();
        let planned = {
            let mut run = lock(&self.run);
            self.plan_run(&mut run, &source, parameters)
        };
        let batches = planned.map_err(|e| self.reject(source.product_name(), e))?;

        self.execute(batches, parameters).await
    }

    /// Start a new run over the scripts of the previous run's unfinished batches.
    ///
    /// Failed batches are retried, and so are batches a cancel left `Queued`.
    /// Fixed voice or emotion in `parameters` replaces the previous resolution;
    /// otherwise scripts keep the emotion and voice they had. Batch ids continue
    /// after the previous run's highest id.
    pub async fn retry_failed(
        &self,
        parameters: &GenerationParameters,
    ) -> Result<RunReport, WorkflowError> {
        let planned = {
            let mut run = lock(&self.run);
            self.plan_retry(&mut run, parameters)
        };
        let (product_name, batches) = match planned {
            Ok(planned) => planned,
            Err(e) => {
                let subject = lock(&self.run).product_name.clone();
                return Err(self.reject(&subject, e));
            }
        };

        let scripts: usize = batches.iter().map(GenerationBatch::len).sum();
        self.reporter.record(ProgressEvent::info(
            product_name.as_str(),
            format!("retrying {} unfinished script(s)", scripts),
        ));
        self.execute(batches, parameters).await
    }

    /// Let the backend generate a whole uploaded file in one call.
    ///
    /// A gateway failure ends the run in `Failed`. Random emotion is not supported here.
    pub async fn generate_from_file(
        &self,
        parsed: &ParsedScriptSet,
        parameters: &GenerationParameters,
    ) -> Result<RunReport, WorkflowError> {
        let subject = parsed.product_name.as_str();
        let fixed_emotion = match parameters.emotion {
            Some(EmotionChoice::Random) => {
                return Err(self.reject(
                    subject,
                    WorkflowError::InvalidParameters(
                        "Random emotion is not supported for server-side generation".to_string(),
                    ),
                ))
            }
            Some(EmotionChoice::Fixed(emotion)) => Some(emotion),
            None => None,
        };
        if parsed.filename.trim().is_empty() {
            return Err(self.reject(
                subject,
                WorkflowError::InvalidParameters("Uploaded filename is required".to_string()),
            ));
        }

        let total = parsed.scripts.len();
        let admitted = {
            let mut run = lock(&self.run);
            ensure_not_running(&run).map(|()| {
                self.start(&mut run, parsed.product_name.clone(), Vec::new());
                run.summary = GenerationSummary::new(total);
            })
        };
        admitted.map_err(|e| self.reject(subject, e))?;

        let _guard = RunGuard { run: &self.run };
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            filename = %parsed.filename,
            "Server-side generation run started"
        );

        self.reporter.record(ProgressEvent::info(
            subject,
            format!("server-side generation started for {}", parsed.filename),
        ));

        let request = GenerateFromFileRequest {
            filename: parsed.filename.clone(),
            voice: fixed_voice(parameters),
            emotion: fixed_emotion,
            rate: Some(parameters.rate),
            pitch: Some(parameters.pitch),
            volume: Some(parameters.volume),
        };

        match self.gateway.generate_from_file(&request).await {
            Ok(response) => {
                let counts = response.counts();
                let successful = counts.successful.min(total);
                let failed = counts.failed.min(total - successful);
                let emotion = fixed_emotion.unwrap_or(parsed.recommended_emotion);

                let summary = {
                    let mut run = lock(&self.run);
                    run.summary.successful = successful;
                    run.summary.failed = failed;
                    if successful > 0 {
                        run.summary.emotion_distribution.insert(emotion, successful);
                    }
                    run.state = WorkflowState::Completed;
                    run.summary.clone()
                };

                self.reporter.record(ProgressEvent::success(
                    subject,
                    format!(
                        "server-side generation completed: {} successful, {} failed",
                        successful, failed
                    ),
                ));

                Ok(RunReport {
                    run_id,
                    outcome: WorkflowState::Completed,
                    summary,
                    batches: Vec::new(),
                    audio_directory: response.audio_directory,
                    output_excel: response.output_excel,
                    duration_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(e) => {
                lock(&self.run).state = WorkflowState::Failed;
                self.reporter.record(ProgressEvent::error(
                    subject,
                    format!("server-side generation failed: {}", e),
                ));
                Err(WorkflowError::Gateway(e))
            }
        }
    }

    /// Validate a new run and plan its batches. Caller holds the run lock.
    fn plan_run(
        &self,
        run: &mut RunState,
        source: &ScriptSource,
        parameters: &GenerationParameters,
    ) -> Result<Vec<GenerationBatch>, WorkflowError> {
        ensure_not_running(run)?;

        let product_name = source.product_name().trim().to_string();
        if product_name.is_empty() {
            return Err(WorkflowError::InvalidParameters(
                "Product name is required".to_string(),
            ));
        }
        if source.is_empty() {
            return Err(WorkflowError::InvalidParameters(
                "At least one script is required".to_string(),
            ));
        }

        let lines = self.resolve_lines(source, parameters);
        let batch_size = parameters.batch_size.or(self.default_batch_size);
        let batches = plan_batches(&product_name, lines, batch_size, 1);
        Ok(self.start(run, product_name, batches))
    }

    fn plan_retry(
        &self,
        run: &mut RunState,
        parameters: &GenerationParameters,
    ) -> Result<(String, Vec<GenerationBatch>), WorkflowError> {
        ensure_not_running(run)?;

        let unfinished: Vec<ScriptLine> = run
            .batches
            .iter()
            .filter(|batch| batch.status != BatchStatus::Succeeded)
            .flat_map(|batch| batch.scripts.iter().cloned())
            .collect();
        if unfinished.is_empty() {
            return Err(WorkflowError::InvalidParameters(
                "No failed batches to retry".to_string(),
            ));
        }

        let lines = unfinished
            .into_iter()
            .map(|line| self.override_line(line, parameters))
            .collect();
        let next_id = run
            .batches
            .iter()
            .map(|batch| batch.batch_id)
            .max()
            .unwrap_or(0)
            + 1;
        let product_name = run.product_name.clone();
        let batch_size = parameters.batch_size.or(self.default_batch_size);
        let batches = plan_batches(&product_name, lines, batch_size, next_id);
        Ok((product_name.clone(), self.start(run, product_name, batches)))
    }

    /// Log a refused run request and hand the error back. Never called with the run lock held.
    fn reject(&self, product_name: &str, err: WorkflowError) -> WorkflowError {
        let code = err.error_code();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(code, error = %err, "Run refused"),
            LogLevel::Warn => tracing::warn!(code, error = %err, "Run refused"),
            LogLevel::Error => tracing::error!(code, error = %err, "Run refused"),
        }
        let subject = match product_name.trim() {
            "" => "generation",
            name => name,
        };
        self.reporter.record(ProgressEvent::error(subject, err.to_string()));
        err
    }

    /// Reset run state for a new run. Caller holds the run lock.
    fn start(
        &self,
        run: &mut RunState,
        product_name: String,
        batches: Vec<GenerationBatch>,
    ) -> Vec<GenerationBatch> {
        let total = batches.iter().map(GenerationBatch::len).sum();
        run.state = WorkflowState::Running;
        run.product_name = product_name;
        run.summary = GenerationSummary::new(total);
        run.batches = batches.clone();
        self.cancel.reset();
        batches
    }

    async fn execute(
        &self,
        batches: Vec<GenerationBatch>,
        parameters: &GenerationParameters,
    ) -> Result<RunReport, WorkflowError> {
        let _guard = RunGuard { run: &self.run };
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let total_batches = batches.len();
        let product_name = batches
            .first()
            .map(|batch| batch.product_name.clone())
            .unwrap_or_default();
        let total_scripts: usize = batches.iter().map(GenerationBatch::len).sum();
        tracing::info!(
            run_id = %run_id,
            product = %product_name,
            batches = total_batches,
            scripts = total_scripts,
            "Generation run started"
        );

        self.reporter.record(ProgressEvent::info(
            product_name.as_str(),
            format!(
                "generation started: {} script(s) in {} batch(es)",
                total_scripts, total_batches
            ),
        ));

        let mut processed = 0;
        for (index, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            self.run_batch(index, batch, total_batches, parameters).await;
            processed += 1;
        }

        let outcome = if processed < total_batches {
            WorkflowState::Cancelled
        } else {
            WorkflowState::Completed
        };

        let (summary, batches) = {
            let mut run = lock(&self.run);
            run.state = outcome;
            (run.summary.clone(), run.batches.clone())
        };

        match outcome {
            WorkflowState::Cancelled => self.reporter.record(ProgressEvent::warning(
                product_name.as_str(),
                format!(
                    "generation cancelled after {} of {} batch(es)",
                    processed, total_batches
                ),
            )),
            _ => {
                let message = format!(
                    "generation completed: {} successful, {} failed",
                    summary.successful, summary.failed
                );
                if summary.failed > 0 {
                    self.reporter
                        .record(ProgressEvent::warning(product_name.as_str(), message))
                } else {
                    self.reporter
                        .record(ProgressEvent::success(product_name.as_str(), message))
                }
            }
        }

        Ok(RunReport {
            run_id,
            outcome,
            summary,
            batches,
            audio_directory: None,
            output_excel: None,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn run_batch(
        &self,
        index: usize,
        batch: &GenerationBatch,
        total_batches: usize,
        parameters: &GenerationParameters,
    ) {
        let subject = format!("{} batch {}", batch.product_name, batch.batch_id);
        self.update_batch(index, |b| b.status = BatchStatus::InFlight);
        self.reporter.record(ProgressEvent::info(
            subject.as_str(),
            format!(
                "batch {}/{} started ({} script(s))",
                index + 1,
                total_batches,
                batch.len()
            ),
        ));

        match self.process_batch(batch, &subject, parameters).await {
            Ok(output) => {
                {
                    let mut run = lock(&self.run);
                    if let Some(entry) = run.batches.get_mut(index) {
                        entry.status = BatchStatus::Succeeded;
                        entry.audio_files = Some(output.audio_files);
                        entry.excel_path = output.excel_path;
                    }
                    run.summary.record_success(batch);
                }
                self.reporter.record(ProgressEvent::success(
                    subject.as_str(),
                    format!("batch {} completed", batch.batch_id),
                ));
            }
            Err(failure) => {
                let message = format!(
                    "batch {} failed during {}: {}",
                    batch.batch_id, failure.stage, failure.message
                );
                {
                    let mut run = lock(&self.run);
                    if let Some(entry) = run.batches.get_mut(index) {
                        entry.status = BatchStatus::Failed;
                        entry.failure = Some(failure);
                    }
                    run.summary.record_failure(batch);
                }
                self.reporter
                    .record(ProgressEvent::error(subject.as_str(), message));
            }
        }
    }

    /// Generation, then audio export, then spreadsheet export. The first failure stops the batch.
    async fn process_batch(
        &self,
        batch: &GenerationBatch,
        subject: &str,
        parameters: &GenerationParameters,
    ) -> Result<BatchOutput, BatchFailure> {
        let request = BatchGenerateRequest {
            product_name: batch.product_name.clone(),
            batch_id: batch.batch_id,
            batch_size: batch.len(),
            scripts: batch.scripts.clone(),
            rate: parameters.rate,
            pitch: parameters.pitch,
            volume: parameters.volume,
        };
        let generated = self
            .gateway
            .generate_batch(&request)
            .await
            .map_err(|e| stage_failure(BatchStage::Generation, e))?;
        self.reporter.record(ProgressEvent::info(
            subject,
            format!("generation complete ({} script(s))", batch.len()),
        ));

        let scripts = if generated.scripts.is_empty() {
            batch
                .scripts
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BatchFailure {
                    stage: BatchStage::Generation,
                    message: format!("Failed to encode scripts: {}", e),
                })?
        } else {
            generated.scripts
        };
        let export = BatchExportRequest {
            scripts,
            product_name: batch.product_name.clone(),
            batch_id: batch.batch_id,
        };

        let audio = self
            .gateway
            .generate_audio(&export)
            .await
            .map_err(|e| stage_failure(BatchStage::AudioExport, e))?;
        self.reporter.record(ProgressEvent::info(
            subject,
            format!("audio export complete ({} file(s))", audio.total_generated),
        ));

        let spreadsheet = self
            .gateway
            .export_spreadsheet(&export)
            .await
            .map_err(|e| stage_failure(BatchStage::SpreadsheetExport, e))?;
        self.reporter.record(ProgressEvent::info(
            subject,
            match &spreadsheet.excel_path {
                Some(path) => format!("spreadsheet export complete: {}", path),
                None => "spreadsheet export complete".to_string(),
            },
        ));

        Ok(BatchOutput {
            audio_files: audio.total_generated,
            excel_path: spreadsheet.excel_path,
        })
    }

    fn update_batch(&self, index: usize, apply: impl FnOnce(&mut GenerationBatch)) {
        if let Some(batch) = lock(&self.run).batches.get_mut(index) {
            apply(batch);
        }
    }

    fn resolve_lines(
        &self,
        source: &ScriptSource,
        parameters: &GenerationParameters,
    ) -> Vec<ScriptLine> {
        let recommended_emotion = source.recommended_emotion();
        let recommended_voice = source.recommended_voice();
        source
            .scripts()
            .into_iter()
            .map(|ParsedScript { text, emotion, voice }| {
                let emotion = match parameters.emotion {
                    Some(EmotionChoice::Fixed(fixed)) => fixed,
                    Some(EmotionChoice::Random) => self.random_emotion(),
                    None => emotion
                        .or(recommended_emotion)
                        .unwrap_or(self.default_emotion),
                };
                let voice = fixed_voice(parameters)
                    .or(voice)
                    .or_else(|| recommended_voice.map(str::to_string))
                    .unwrap_or_else(|| self.default_voice.clone());
                ScriptLine {
                    text,
                    emotion,
                    voice,
                }
            })
            .collect()
    }

    fn override_line(&self, line: ScriptLine, parameters: &GenerationParameters) -> ScriptLine {
        let emotion = match parameters.emotion {
            Some(EmotionChoice::Fixed(fixed)) => fixed,
            Some(EmotionChoice::Random) => self.random_emotion(),
            None => line.emotion,
        };
        ScriptLine {
            voice: fixed_voice(parameters).unwrap_or(line.voice),
            emotion,
            text: line.text,
        }
    }

    fn random_emotion(&self) -> Emotion {
        let mut rng = lock(&self.rng);
        Emotion::RANDOM_POOL
            .choose(&mut *rng)
            .copied()
            .unwrap_or(self.default_emotion)
    }
}

impl std::fmt::Debug for GenerationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationWorkflow")
            .field("state", &self.state())
            .field("default_voice", &self.default_voice)
            .field("default_emotion", &self.default_emotion)
            .finish()
    }
}

fn ensure_not_running(run: &RunState) -> Result<(), WorkflowError> {
    if run.state == WorkflowState::Running {
        return Err(WorkflowError::AlreadyRunning);
    }
    Ok(())
}

fn fixed_voice(parameters: &GenerationParameters) -> Option<String> {
    parameters
        .voice
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn stage_failure(stage: BatchStage, err: GatewayError) -> BatchFailure {
    tracing::warn!(stage = %stage, error = %err, "Batch stage failed");
    BatchFailure {
        stage,
        message: err.to_string(),
    }
}
