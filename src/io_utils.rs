use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::{CompressedLog, Config, Entry};

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

/// Simple CLI error from string.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Invalid file extension error.
pub fn extension_error(path: &Path) -> CliError {
    CliError {
        msg: format!(
            "Invalid file extension for '{}'. Expected .json. Check the input file.",
            path.display()
        ),
        source: None,
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn scorepack_cli_error(context: &str, err: crate::ScorepackError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for an error variant.
pub fn cli_hint(err: &crate::ScorepackError) -> String {
    use crate::ScorepackError::*;
    match err {
        MalformedArtifact(msg) => format!("{msg}. Verify the file is intact."),
        UnsupportedVersion(v) => format!("Format version {v} is not supported by this build."),
        DictionaryExhausted => "Dictionary code space exhausted. This is a bug.".to_string(),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Json(e) => format!("{e}. Input is not valid JSON for this format."),
        Io(io) => format!("{io}"),
    }
}

/// Require a `.json` extension on an input path.
pub fn require_json_extension(path: &Path) -> Result<(), CliError> {
    let ok = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if ok {
        Ok(())
    } else {
        Err(extension_error(path))
    }
}

/// Read an uncompressed log (JSON array of entries) and its byte size.
pub fn read_entries(path: &Path) -> Result<(Vec<Entry>, usize), CliError> {
    let text = fs::read_to_string(path).map_err(|e| io_cli_error("reading input file", path, e))?;
    let entries = crate::parse_entries(&text)
        .map_err(|e| scorepack_cli_error(&format!("parsing '{}'", path.display()), e))?;
    Ok((entries, text.len()))
}

/// Read a compressed log in either serialized form.
pub fn read_compressed(path: &Path) -> Result<CompressedLog, CliError> {
    let text = fs::read_to_string(path).map_err(|e| io_cli_error("reading input file", path, e))?;
    CompressedLog::from_json(&text)
        .map_err(|e| scorepack_cli_error(&format!("loading '{}'", path.display()), e))
}

/// Load an optional configuration file, falling back to the default layout.
pub fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    match path {
        Some(p) => Config::load(p).map_err(|e| scorepack_cli_error("loading config", e)),
        None => Ok(Config::default()),
    }
}
