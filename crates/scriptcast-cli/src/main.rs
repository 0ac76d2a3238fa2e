//! Scriptcast CLI: upload script files and drive TTS generation runs.
//!
//! Set SCRIPTCAST_API_URL (or API_URL) and, if the backend requires it,
//! SCRIPTCAST_API_KEY. Uses X-API-Key auth.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use scriptcast_api_client::ApiClient;
use scriptcast_cli::{describe_error, format_event, init_tracing, print_json};
use scriptcast_core::models::{
    group_by_product, EmotionChoice, GenerationParameters, ManualScripts, UploadedFile,
};
use scriptcast_core::{BackendGateway, ClientConfig};
use scriptcast_workflow::{ActivityReporter, CancelHandle, GenerationWorkflow, UploadCoordinator};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scriptcast", about = "Scriptcast TTS generation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backend connection status and task counters
    Status,
    /// Recent backend log lines
    Logs,
    /// Generated audio files grouped by product
    Files,
    /// Upload a script file and print the parsed scripts
    Upload {
        /// Path to a .xlsx, .xls, .csv, .tsv or .txt file
        file: PathBuf,
    },
    /// Upload a script file, then generate audio for it
    Generate {
        /// Path to a .xlsx, .xls, .csv, .tsv or .txt file
        file: PathBuf,
        #[command(flatten)]
        voice: VoiceArgs,
        /// Let the backend generate the whole file in one call
        #[arg(long)]
        server_side: bool,
    },
    /// Generate audio for scripts given on the command line or in a text file
    Batch {
        /// Product name used for output files
        #[arg(long)]
        product: String,
        /// File with one script per line
        #[arg(long, conflicts_with = "script")]
        text_file: Option<PathBuf>,
        /// A script; repeat for several
        #[arg(long, required_unless_present = "text_file")]
        script: Vec<String>,
        #[command(flatten)]
        voice: VoiceArgs,
    },
}

#[derive(Args)]
struct VoiceArgs {
    /// Voice id, e.g. en-US-JennyNeural
    #[arg(long)]
    voice: Option<String>,
    /// Emotion name, or "random"
    #[arg(long)]
    emotion: Option<EmotionChoice>,
    /// Speaking rate offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rate: i32,
    /// Pitch offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pitch: i32,
    /// Volume offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    volume: i32,
    /// Scripts per batch; all scripts in one batch if unset
    #[arg(long)]
    batch_size: Option<NonZeroUsize>,
}

impl From<VoiceArgs> for GenerationParameters {
    fn from(args: VoiceArgs) -> Self {
        GenerationParameters {
            voice: args.voice,
            emotion: args.emotion,
            rate: args.rate,
            pitch: args.pitch,
            volume: args.volume,
            batch_size: args.batch_size,
        }
    }
}

/// Cancel the run at the next batch boundary on Ctrl-C.
fn cancel_on_ctrl_c(handle: CancelHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, cancelling after the current batch");
            handle.cancel();
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ClientConfig::from_env().context("Invalid scriptcast configuration")?;
    let client = ApiClient::from_config(&config).context(
        "Failed to create API client. Set SCRIPTCAST_API_URL (or API_URL) and SCRIPTCAST_API_KEY",
    )?;

    let reporter = Arc::new(ActivityReporter::new(config.activity_log_capacity));
    reporter.subscribe(|event| println!("{}", format_event(event)));
    let gateway: Arc<dyn BackendGateway> = Arc::new(client.clone());
    let uploads = UploadCoordinator::new(Arc::clone(&gateway), Arc::clone(&reporter), &config);
    let workflow = GenerationWorkflow::new(gateway, Arc::clone(&reporter), &config);

    match cli.command {
        Commands::Status => {
            let connection = client.status().await;
            let tasks = client.task_counters().await.ok();
            print_json(&serde_json::json!({ "connection": connection, "tasks": tasks }))?;
        }
        Commands::Logs => {
            let lines = client.recent_logs().await?;
            print_json(&lines)?;
        }
        Commands::Files => {
            let files = client.output_files().await?;
            print_json(&group_by_product(&files))?;
        }
        Commands::Upload { file } => {
            let upload = UploadedFile::from_path(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let parsed = uploads
                .submit(&upload)
                .await
                .map_err(|e| describe_error(&e))?;
            print_json(&parsed)?;
        }
        Commands::Generate {
            file,
            voice,
            server_side,
        } => {
            let upload = UploadedFile::from_path(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let parsed = uploads
                .submit(&upload)
                .await
                .map_err(|e| describe_error(&e))?;
            let parameters = GenerationParameters::from(voice);

            let ctrl_c = cancel_on_ctrl_c(workflow.cancel_handle());
            let report = if server_side {
                workflow.generate_from_file(&parsed, &parameters).await
            } else {
                workflow.generate(parsed, &parameters).await
            };
            ctrl_c.abort();
            print_json(&report.map_err(|e| describe_error(&e))?)?;
        }
        Commands::Batch {
            product,
            text_file,
            script,
            voice,
        } => {
            let text = match text_file {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => script.join("\n"),
            };
            let scripts = ManualScripts::from_text(product, &text);
            let parameters = GenerationParameters::from(voice);

            let ctrl_c = cancel_on_ctrl_c(workflow.cancel_handle());
            let report = workflow.generate(scripts, &parameters).await;
            ctrl_c.abort();
            print_json(&report.map_err(|e| describe_error(&e))?)?;
        }
    }

    Ok(())
}
