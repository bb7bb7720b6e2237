use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "timestamps.txt";
pub const DEFAULT_TEMP_FILE_NAME: &str = "timestamps.txt";

/// Where a session writes: the scratch file after every change, the
/// destination once at the end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranscriptPaths {
    pub destination: PathBuf,
    pub scratch: PathBuf,
}

#[derive(Debug, Error)]
pub enum ScratchDirError {
    #[error("Cannot write to temporary directory {dir}: {source}")]
    NotWritable { dir: PathBuf, source: io::Error },
}

pub fn default_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

/// Scratch file inside the system temporary directory (`TMPDIR` aware).
pub fn default_scratch_file() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_TEMP_FILE_NAME)
}

/// Fails when no file can be created next to `scratch`.
pub fn ensure_scratch_dir_writable(scratch: &Path) -> Result<(), ScratchDirError> {
    let dir = match scratch.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tempfile::Builder::new()
        .prefix(".eepytagger-probe")
        .tempfile_in(&dir)
        .map(drop)
        .map_err(|source| ScratchDirError::NotWritable { dir, source })
}
