use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClockState {
    NotStarted,
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ClockError {
    #[error("Session not started yet.")]
    NotStarted,

    #[error("Session already started.")]
    AlreadyStarted,

    #[error("Already paused.")]
    AlreadyPaused,

    #[error("Not currently paused.")]
    NotPaused,
}

/// Tracks session lifecycle and elapsed time net of pauses.
///
/// The clock never reads the system time itself; callers pass `now` so the
/// interpreter and tests control sampling.
#[derive(Clone, Debug)]
pub struct SessionClock {
    phase: Phase,
}

#[derive(Clone, Debug)]
enum Phase {
    NotStarted,
    Started(Timeline),
}

#[derive(Clone, Debug)]
struct Timeline {
    started_at: Instant,
    initial_offset: Duration,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl Timeline {
    fn elapsed_until(&self, instant: Instant, paused: Duration) -> i64 {
        let run = instant
            .saturating_duration_since(self.started_at)
            .saturating_add(self.initial_offset);
        duration_to_seconds(run.saturating_sub(paused))
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
        }
    }

    pub fn state(&self) -> ClockState {
        match &self.phase {
            Phase::NotStarted => ClockState::NotStarted,
            Phase::Started(timeline) if timeline.paused_at.is_some() => ClockState::Paused,
            Phase::Started(_) => ClockState::Running,
        }
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.phase, Phase::NotStarted)
    }

    /// Starts the session as if `initial_offset_secs` had already elapsed.
    pub fn start(&mut self, now: Instant, initial_offset_secs: i64) -> Result<(), ClockError> {
        if self.is_started() {
            return Err(ClockError::AlreadyStarted);
        }
        let initial_offset = Duration::from_secs(u64::try_from(initial_offset_secs).unwrap_or(0));
        self.phase = Phase::Started(Timeline {
            started_at: now,
            initial_offset,
            paused_total: Duration::ZERO,
            paused_at: None,
        });
        Ok(())
    }

    /// Pauses the timer and returns the elapsed seconds it froze at.
    pub fn pause(&mut self, now: Instant) -> Result<i64, ClockError> {
        let timeline = self.timeline_mut()?;
        if timeline.paused_at.is_some() {
            return Err(ClockError::AlreadyPaused);
        }
        timeline.paused_at = Some(now);
        Ok(timeline.elapsed_until(now, timeline.paused_total))
    }

    /// Resumes the timer and returns the elapsed seconds at `now`.
    pub fn resume(&mut self, now: Instant) -> Result<i64, ClockError> {
        let timeline = self.timeline_mut()?;
        let Some(paused_at) = timeline.paused_at.take() else {
            return Err(ClockError::NotPaused);
        };
        timeline.paused_total = timeline
            .paused_total
            .saturating_add(now.saturating_duration_since(paused_at));
        Ok(timeline.elapsed_until(now, timeline.paused_total))
    }

    /// Elapsed seconds as displayed: frozen at the pause instant while paused.
    pub fn elapsed(&self, now: Instant) -> Result<i64, ClockError> {
        let timeline = self.timeline()?;
        let until = timeline.paused_at.unwrap_or(now);
        Ok(timeline.elapsed_until(until, timeline.paused_total))
    }

    /// Elapsed seconds used to stamp a new tag.
    ///
    /// While paused, the open pause counts as if it ended at `now`.
    pub fn tag_elapsed(&self, now: Instant) -> Result<i64, ClockError> {
        let timeline = self.timeline()?;
        let paused = match timeline.paused_at {
            Some(paused_at) => timeline
                .paused_total
                .saturating_add(now.saturating_duration_since(paused_at)),
            None => timeline.paused_total,
        };
        Ok(timeline.elapsed_until(now, paused))
    }

    fn timeline(&self) -> Result<&Timeline, ClockError> {
        match &self.phase {
            Phase::NotStarted => Err(ClockError::NotStarted),
            Phase::Started(timeline) => Ok(timeline),
        }
    }

    fn timeline_mut(&mut self) -> Result<&mut Timeline, ClockError> {
        match &mut self.phase {
            Phase::NotStarted => Err(ClockError::NotStarted),
            Phase::Started(timeline) => Ok(timeline),
        }
    }
}

fn duration_to_seconds(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
