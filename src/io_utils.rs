use std::fmt;
use std::io;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn enpakk_cli_error(context: &str, err: crate::EnpakkError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for an error variant.
pub fn cli_hint(err: &crate::EnpakkError) -> String {
    use crate::EnpakkError::*;
    match err {
        Format(msg) => format!("{msg}. Verify the file is an intact .enpakk stream."),
        Io(io) => format!("{io}"),
        SearchExhausted(msg) => {
            format!("{msg}. Raise --max-attempts/--timeout-secs or try another backend.")
        }
        Integrity(msg) => format!("{msg}. The search backend returned a bad match; this is a bug."),
        EmptyBucket { position, hash } => format!(
            "no candidates for hash {hash:#04x} at block {position}. Increase max_candidates."
        ),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Backend(msg) => format!("{msg}. Try --backend random."),
    }
}

/// Install the stderr log subscriber used by the binaries.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("log subscriber already installed");
    }
}
