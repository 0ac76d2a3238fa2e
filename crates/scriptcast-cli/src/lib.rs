use anyhow::Context;
use scriptcast_core::models::{EventKind, ProgressEvent};
use scriptcast_core::ErrorMetadata;
use serde::Serialize;
use std::fmt::Display;

/// Longest message printed on one console line.
pub const MAX_MESSAGE_LEN: usize = 120;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One console line for an activity event, e.g. `12:00:01 [ok]   products.xlsx: upload started`.
pub fn format_event(event: &ProgressEvent) -> String {
    let tag = match event.kind {
        EventKind::Info => "[info]",
        EventKind::Success => "[ok]  ",
        EventKind::Warning => "[warn]",
        EventKind::Error => "[err] ",
    };
    format!(
        "{} {} {}: {}",
        event.timestamp.format("%H:%M:%S"),
        tag,
        event.subject,
        truncate_string(&event.message, MAX_MESSAGE_LEN)
    )
}

/// Failure line with its machine-readable code, e.g. `[ALREADY_RUNNING] A generation run ...`.
pub fn describe_error<E: ErrorMetadata + Display>(err: &E) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", err.error_code(), err)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}


/// Initialize tracing for the CLI. Logs go to stderr so JSON output stays clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
