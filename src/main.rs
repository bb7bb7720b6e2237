mod app;
mod cli;
mod domain;
mod infra;

use crate::app::{Outcome, Reply, Session};
use crate::cli::{CliInvocation, RunConfig};
use crate::domain::{TagStore, format_timestamp};
use crate::infra::{
    LoadTranscriptError, ScratchDirError, ensure_scratch_dir_writable, init_logging,
    load_transcript,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

const PROMPT: &str = "> ";

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    ScratchDir(#[from] ScratchDirError),

    #[error("failed to start line editor: {0}")]
    Editor(#[from] ReadlineError),

    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    init_logging();
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Run(config) => run_session(config),
    }
}

fn print_help() {
    let mut out = io::stdout().lock();
    let _ = write!(out, "{}", crate::cli::help_text());
}

fn run_session(config: RunConfig) -> Result<(), MainError> {
    ensure_scratch_dir_writable(&config.paths.scratch)?;

    let store = match &config.resume_from {
        Some(source) => resume_store(source),
        None => TagStore::new(),
    };
    let mut session = Session::new(config.paths, store);

    {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "{} ready. Use !start [HH:MM:SS] to begin.",
            env!("CARGO_PKG_NAME")
        )?;
        writeln!(out, "Output file: {}", session.paths().destination.display())?;
        writeln!(out, "Temporary file: {}", session.paths().scratch.display())?;
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                let mut err = io::stderr().lock();
                let _ = writeln!(err, "End of input; ending session.");
                break;
            }
            Err(error) => {
                tracing::error!(%error, "failed to read input");
                let mut err = io::stderr().lock();
                let _ = writeln!(err, "Failed to read input: {error}");
                break;
            }
        };

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let _ = editor.add_history_entry(trimmed);
        }

        let outcome = session.handle_line(trimmed, Instant::now());
        render_outcome(&outcome)?;
        if outcome.exit {
            break;
        }
    }

    if let Ok(elapsed) = session.clock().elapsed(Instant::now()) {
        tracing::info!(
            elapsed = %format_timestamp(elapsed),
            entries = session.store().len(),
            "session ended"
        );
    }

    match session.save_final() {
        Ok(Some(path)) => {
            let mut out = io::stdout().lock();
            writeln!(out, "Saved final timestamps to {}", path.display())?;
        }
        Ok(None) => {}
        Err(error) => {
            tracing::error!(%error, "final save failed");
            let mut err = io::stderr().lock();
            let _ = writeln!(
                err,
                "{error}\nThe last autosave is still at {}",
                session.paths().scratch.display()
            );
        }
    }
    Ok(())
}

fn resume_store(source: &Path) -> TagStore {
    let loaded = load_transcript(source);
    let mut err = io::stderr().lock();
    for skipped in &loaded.skipped {
        let _ = writeln!(err, "Skipping line {}: {}", skipped.line_no, skipped.error);
    }
    match &loaded.error {
        Some(error @ LoadTranscriptError::Missing(_)) => {
            let _ = writeln!(err, "{error}");
        }
        Some(error) => {
            tracing::warn!(%error, "resume load incomplete");
            let _ = writeln!(err, "{error}");
        }
        None => {}
    }
    let _ = writeln!(
        err,
        "Resumed {} tags from {}",
        loaded.store.len(),
        source.display()
    );
    loaded.store
}

fn render_outcome(outcome: &Outcome) -> io::Result<()> {
    for reply in &outcome.replies {
        match reply {
            Reply::Ack(text) | Reply::Warning(text) => {
                let mut out = io::stdout().lock();
                writeln!(out, "{text}")?;
            }
            Reply::Error(error) => {
                let mut out = io::stdout().lock();
                writeln!(out, "{error}")?;
            }
            Reply::Help => print_help(),
        }
    }
    Ok(())
}
