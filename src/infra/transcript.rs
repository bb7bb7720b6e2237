use crate::domain::{
    MAX_ENTRIES, TagEntry, TagStore, TimestampError, format_timestamp, looks_like_timestamp,
    parse_timestamp,
};
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptEncoding {
    /// ` 1. 00:00:05 text`, written to the scratch file after every change.
    Indexed,
    /// `00:00:05 text`, written once to the destination at session end.
    Plain,
}

#[derive(Debug, Error)]
pub enum SaveTranscriptError {
    #[error("Failed to save {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum LoadTranscriptError {
    #[error("No existing transcript at {0}; starting fresh.")]
    Missing(PathBuf),

    #[error("Failed to open {path} for loading: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to read {path} at line {line_no}: {source}")]
    Read {
        path: PathBuf,
        line_no: usize,
        source: io::Error,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub error: TimestampError,
}

/// What a resume load produced. Loading never fails outright: unreadable or
/// missing files yield whatever was read so far plus the reason.
#[derive(Debug, Default)]
pub struct LoadedTranscript {
    pub store: TagStore,
    pub skipped: Vec<SkippedLine>,
    pub error: Option<LoadTranscriptError>,
}

pub fn render_transcript(store: &TagStore, encoding: TranscriptEncoding) -> String {
    let mut out = String::new();
    for (position, entry) in store.entries().iter().enumerate() {
        let timestamp = format_timestamp(entry.seconds());
        let _ = match encoding {
            TranscriptEncoding::Indexed => {
                writeln!(out, "{:>2}. {timestamp} {}", position + 1, entry.text())
            }
            TranscriptEncoding::Plain => writeln!(out, "{timestamp} {}", entry.text()),
        };
    }
    out
}

/// Replaces the file at `path` with the rendered store.
pub fn save_transcript(
    path: &Path,
    store: &TagStore,
    encoding: TranscriptEncoding,
) -> Result<(), SaveTranscriptError> {
    let write_error = |source| SaveTranscriptError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Write through a symlinked destination instead of replacing the link.
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let tmp = tmp_sibling(&target);
    fs::write(&tmp, render_transcript(store, encoding)).map_err(write_error)?;
    if let Err(error) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(write_error(error));
    }
    tracing::debug!(path = %path.display(), entries = store.len(), ?encoding, "saved transcript");
    Ok(())
}

pub fn load_transcript(path: &Path) -> LoadedTranscript {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return LoadedTranscript {
                error: Some(LoadTranscriptError::Missing(path.to_path_buf())),
                ..LoadedTranscript::default()
            };
        }
        Err(source) => {
            return LoadedTranscript {
                error: Some(LoadTranscriptError::Open {
                    path: path.to_path_buf(),
                    source,
                }),
                ..LoadedTranscript::default()
            };
        }
    };

    let mut loaded = read_transcript(BufReader::new(file));
    if let Some(LoadTranscriptError::Read { path: error_path, .. }) = loaded.error.as_mut() {
        *error_path = path.to_path_buf();
    }
    for skipped in &loaded.skipped {
        tracing::warn!(path = %path.display(), line = skipped.line_no, error = %skipped.error, "skipped transcript line");
    }
    tracing::debug!(path = %path.display(), entries = loaded.store.len(), "loaded transcript");
    loaded
}

/// Reads either encoding, line by line, up to the store capacity.
pub fn read_transcript(mut reader: impl BufRead) -> LoadedTranscript {
    let mut entries: Vec<TagEntry> = Vec::new();
    let mut skipped = Vec::new();
    let mut error = None;
    let mut buffer = Vec::new();
    let mut line_no = 0usize;

    while entries.len() < MAX_ENTRIES {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {}
            Err(source) => {
                error = Some(LoadTranscriptError::Read {
                    path: PathBuf::new(),
                    line_no: line_no + 1,
                    source,
                });
                break;
            }
        }
        line_no += 1;

        let raw = String::from_utf8_lossy(&buffer);
        let line = raw.trim_end_matches(['\n', '\r']);
        match parse_line(line) {
            LineParse::Entry(entry) => entries.push(entry),
            LineParse::BadTimestamp(error) => skipped.push(SkippedLine { line_no, error }),
            LineParse::NotATag => {}
        }
    }

    LoadedTranscript {
        store: entries.into_iter().collect(),
        skipped,
        error,
    }
}

enum LineParse {
    Entry(TagEntry),
    BadTimestamp(TimestampError),
    NotATag,
}

fn parse_line(line: &str) -> LineParse {
    if let Some(rest) = strip_index_prefix(line) {
        if let parsed @ (LineParse::Entry(_) | LineParse::BadTimestamp(_)) = parse_bare(rest) {
            return parsed;
        }
    }
    parse_bare(line)
}

fn parse_bare(line: &str) -> LineParse {
    let Some((timestamp, rest)) = next_token(line) else {
        return LineParse::NotATag;
    };
    let text = rest.trim_start();
    if text.is_empty() || !looks_like_timestamp(timestamp) {
        return LineParse::NotATag;
    }
    match parse_timestamp(timestamp) {
        Ok(seconds) => LineParse::Entry(TagEntry::new(seconds, text)),
        Err(error) => LineParse::BadTimestamp(error),
    }
}

/// Strips a leading `N.` position marker, returning what follows it.
fn strip_index_prefix(line: &str) -> Option<&str> {
    let (token, rest) = next_token(line)?;
    let number = token.strip_suffix('.')?;
    let digits = number.strip_prefix(['+', '-']).unwrap_or(number);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(rest)
}

fn next_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some(text.split_at(end))
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("transcript"));
    name.push(".tmp");
    path.with_file_name(name)
}
