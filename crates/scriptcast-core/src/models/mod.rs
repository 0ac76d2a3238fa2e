pub mod backend;
pub mod batch;
pub mod emotion;
pub mod monitoring;
pub mod progress;
pub mod script;
pub mod summary;
pub mod upload;

pub use backend::{
    AudioExportResponse, BackendReply, BatchExportRequest, BatchGenerateRequest,
    BatchGenerateResponse, BatchStatistics, ComplianceReport, FileGenerationResponse,
    GenerateFromFileRequest, ParsedData, ScriptEntry, SpreadsheetExportResponse, SummaryCounts,
    UploadResponse,
};
pub use batch::{BatchFailure, BatchStage, BatchStatus, GenerationBatch};
pub use emotion::{Emotion, EmotionChoice};
pub use monitoring::{
    group_by_product, product_of, BackendLogLine, ConnectionStatus, LogsResponse, OutputFile,
    OutputFilesResponse, ProductGroup, StatusResponse, TaskCounters,
};
pub use progress::{EventKind, ProgressEvent};
pub use script::{
    GenerationParameters, ManualScripts, ParsedScript, ParsedScriptSet, ScriptLine, ScriptSource,
};
pub use summary::{GenerationSummary, RunProgress};
pub use upload::{FileKey, UploadStatus, UploadedFile};
