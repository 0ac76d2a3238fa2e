//! Fixed values shared by the client crates.

/// File extensions the backend can parse into scripts.
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".xlsx", ".xls", ".csv", ".tsv", ".txt"];

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";
pub const DEFAULT_ACTIVITY_LOG_CAPACITY: usize = 100;

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
}

pub fn allowed_extensions() -> Vec<String> {
    ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
