//! Two-phase progress model for archive restores.
//!
//! The upload phase maps real byte progress into 0..=60 percent. While the
//! backend processes the archive synchronously, a cosmetic crawl advances from
//! 62 to 94 percent in 1 percent steps. The response snaps progress to 100.
//!
//! Consumers observe progress through [`ProgressSink`] only, so a real server
//! signal can drive the same sink later.

/// Upper bound of the upload phase.
pub const UPLOAD_CEILING: u8 = 60;
/// Where processing starts.
pub const PROCESSING_START: u8 = 62;
/// Highest value the crawl reaches before the response arrives.
pub const CRAWL_CEILING: u8 = 94;
/// Final value.
pub const COMPLETE: u8 = 100;

/// Phase of a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestorePhase {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// Archive bytes are being transferred.
    Uploading,
    /// Waiting for the backend to finish.
    Processing,
    /// Response received.
    Done,
}

/// Receives progress updates.
pub trait ProgressSink: Send {
    /// Called whenever the percentage or phase changes.
    fn update(&mut self, phase: RestorePhase, percent: u8);
}

/// Discards updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _phase: RestorePhase, _percent: u8) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(RestorePhase, u8) + Send,
{
    fn update(&mut self, phase: RestorePhase, percent: u8) {
        self(phase, percent);
    }
}

/// Restore progress state machine. Percent never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreProgress {
    phase: RestorePhase,
    percent: u8,
}

impl RestoreProgress {
    /// Creates an idle tracker at 0 percent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: RestorePhase::Idle,
            percent: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RestorePhase {
        self.phase
    }

    /// Current percentage.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.percent
    }

    fn advance(&mut self, phase: RestorePhase, percent: u8) -> bool {
        let percent = percent.max(self.percent);
        let changed = phase != self.phase || percent != self.percent;
        self.phase = phase;
        self.percent = percent;
        changed
    }

    /// Records upload progress. Returns `true` when anything changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizdesk_core::RestoreProgress;
    ///
    /// let mut progress = RestoreProgress::new();
    /// progress.upload(50, 100);
    /// assert_eq!(progress.percent(), 30);
    /// ```
    pub fn upload(&mut self, sent: u64, total: u64) -> bool {
        if matches!(self.phase, RestorePhase::Processing | RestorePhase::Done) {
            return false;
        }
        let scaled = if total == 0 {
            u64::from(UPLOAD_CEILING)
        } else {
            sent.min(total) * u64::from(UPLOAD_CEILING) / total
        };
        let percent = u8::try_from(scaled).unwrap_or(UPLOAD_CEILING);
        self.advance(RestorePhase::Uploading, percent)
    }

    /// Switches to the processing phase once the upload is complete.
    pub fn begin_processing(&mut self) -> bool {
        if self.phase == RestorePhase::Done {
            return false;
        }
        self.advance(RestorePhase::Processing, PROCESSING_START)
    }

    /// Advances the crawl by one step, stopping at the ceiling.
    pub fn tick(&mut self) -> bool {
        if self.phase != RestorePhase::Processing || self.percent >= CRAWL_CEILING {
            return false;
        }
        self.advance(RestorePhase::Processing, self.percent + 1)
    }

    /// Snaps to 100 percent.
    pub fn finish(&mut self) -> bool {
        self.advance(RestorePhase::Done, COMPLETE)
    }

    /// Forwards the current state to a sink.
    pub fn report(&self, sink: &mut dyn ProgressSink) {
        sink.update(self.phase, self.percent);
    }
}
