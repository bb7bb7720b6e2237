use crate::domain::{
    ClockError, ClockState, Command, CommandParseError, OffsetTarget, SessionClock, TagError,
    TagStore, format_timestamp, parse_command,
};
use crate::infra::{SaveTranscriptError, TranscriptEncoding, TranscriptPaths, save_transcript};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Save(#[from] SaveTranscriptError),

    #[error("Use !start [HH:MM:SS] before tagging.")]
    StartFirst,
}

#[derive(Debug)]
pub enum Reply {
    Ack(String),
    Warning(String),
    Error(CommandError),
    Help,
}

/// Everything one input line produced, in display order.
#[derive(Debug, Default)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub exit: bool,
}

impl Outcome {
    fn exit() -> Self {
        Self {
            replies: Vec::new(),
            exit: true,
        }
    }

    fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            exit: false,
        }
    }

    fn ack(&mut self, text: String) {
        self.replies.push(Reply::Ack(text));
    }

    fn warn(&mut self, text: String) {
        self.replies.push(Reply::Warning(text));
    }
}

/// One tagging session: owns the tag list and the clock, and writes the
/// scratch transcript after every change.
#[derive(Debug)]
pub struct Session {
    paths: TranscriptPaths,
    store: TagStore,
    clock: SessionClock,
}

impl Session {
    pub fn new(paths: TranscriptPaths, store: TagStore) -> Self {
        Self {
            paths,
            store,
            clock: SessionClock::new(),
        }
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn paths(&self) -> &TranscriptPaths {
        &self.paths
    }

    pub fn handle_line(&mut self, line: &str, now: Instant) -> Outcome {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Outcome::default(),
            Err(error) => return Outcome::reply(Reply::Error(error.into())),
        };
        tracing::trace!(?command, "dispatching");

        match self.execute(command, now) {
            Ok(outcome) => outcome,
            Err(error) => Outcome::reply(Reply::Error(error)),
        }
    }

    /// Writes the plain transcript to the destination. Skipped when empty.
    pub fn save_final(&self) -> Result<Option<&Path>, SaveTranscriptError> {
        if self.store.is_empty() {
            return Ok(None);
        }
        save_transcript(
            &self.paths.destination,
            &self.store,
            TranscriptEncoding::Plain,
        )?;
        Ok(Some(&self.paths.destination))
    }

    fn execute(&mut self, command: Command, now: Instant) -> Result<Outcome, CommandError> {
        let mut outcome = Outcome::default();
        match command {
            Command::Help => return Ok(Outcome::reply(Reply::Help)),
            Command::End => return Ok(Outcome::exit()),
            Command::Start { initial_offset } => {
                self.clock.start(now, initial_offset)?;
                tracing::debug!(initial_offset, "session started");
                outcome.ack(format!(
                    "Started tagging from {}",
                    format_timestamp(initial_offset)
                ));
                return Ok(outcome);
            }
            Command::Pause => {
                let elapsed = self.clock.pause(now)?;
                tracing::debug!(elapsed, "session paused");
                outcome.ack(format!("Paused at {}", format_timestamp(elapsed)));
                return Ok(outcome);
            }
            Command::Resume => {
                let elapsed = self.clock.resume(now)?;
                tracing::debug!(elapsed, "session resumed");
                outcome.ack(format!("Resumed at {}", format_timestamp(elapsed)));
                return Ok(outcome);
            }
            Command::Offset { target, delta } => self.offset(target, delta, &mut outcome)?,
            Command::Edit { index, text } => {
                let index = index.unwrap_or(self.store.len());
                self.store.edit_text(index, &text)?;
                outcome.ack(format!("Edited tag {index}."));
            }
            Command::Delete { index } => {
                self.store.delete(index)?;
                outcome.ack(format!("Deleted tag {index}."));
            }
            Command::Tag(text) => {
                if !self.clock.is_started() {
                    return Err(CommandError::StartFirst);
                }
                if self.clock.state() == ClockState::Paused {
                    outcome.warn("Warning: tagging while paused.".to_string());
                }
                let seconds = self.clock.tag_elapsed(now)?;
                match self.store.append(seconds, &text) {
                    Ok(index) => {
                        outcome.ack(format!("Tag {index} at {}", format_timestamp(seconds)));
                    }
                    Err(error @ TagError::CapacityExceeded { .. }) => {
                        tracing::warn!(entries = self.store.len(), "tag capacity reached");
                        outcome.replies.push(Reply::Error(error.into()));
                        outcome.exit = true;
                        return Ok(outcome);
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        }

        tracing::debug!(entries = self.store.len(), "tags changed");
        self.autosave(&mut outcome);
        Ok(outcome)
    }

    fn offset(
        &mut self,
        target: OffsetTarget,
        delta: i64,
        outcome: &mut Outcome,
    ) -> Result<(), CommandError> {
        match target {
            OffsetTarget::Index(index) => {
                let entry = self.store.offset_one(index, delta)?;
                outcome.ack(format!(
                    "Adjusted tag {index} to {}",
                    format_timestamp(entry.seconds())
                ));
            }
            OffsetTarget::Last => {
                let (index, entry) = self.store.offset_last(delta)?;
                outcome.ack(format!(
                    "Adjusted tag {index} to {}",
                    format_timestamp(entry.seconds())
                ));
            }
            OffsetTarget::All => {
                let adjusted = self.store.offset_all(delta)?;
                for index in adjusted.clamped {
                    outcome.warn(format!(
                        "Tag {index} clamped to 00:00:00 (was negative after offset)."
                    ));
                }
                outcome.ack(format!("Adjusted all tags by {delta:+} seconds."));
            }
        }
        Ok(())
    }

    /// A failed write is reported but leaves the in-memory tags as they are;
    /// the next change writes the whole list again.
    fn autosave(&self, outcome: &mut Outcome) {
        if let Err(error) = save_transcript(
            &self.paths.scratch,
            &self.store,
            TranscriptEncoding::Indexed,
        ) {
            tracing::warn!(%error, "autosave failed");
            outcome.replies.push(Reply::Error(error.into()));
        }
    }
}
