use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;
use thiserror::Error;

/// Source of monotonic time for session bookkeeping
pub trait TimeSource {
    /// Seconds since an arbitrary fixed origin. Never decreases, and keeps
    /// counting across host suspensions.
    fn monotonic_secs(&self) -> f64;
}

/// Production time source backed by std::time::Instant
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn monotonic_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-cranked time source for tests and headless drivers. Clones share the
/// same underlying clock, so a test can keep one handle and advance time
/// while the session owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<f64>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    pub fn set(&self, secs: f64) {
        self.now.set(secs);
    }
}

impl TimeSource for ManualTimeSource {
    fn monotonic_secs(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("clock has already been started")]
    AlreadyStarted,
    #[error("clock has not been started")]
    NotStarted,
    #[error("clock is already paused")]
    AlreadyPaused,
    #[error("clock is not paused")]
    NotPaused,
    #[error("clock has been stopped")]
    Stopped,
}

/// Tracks active session time over a monotonic source. Paused stretches are
/// accumulated and subtracted, so `active_elapsed` only counts time spent
/// running. `stop` freezes the final reading.
#[derive(Debug)]
pub struct SessionClock<T: TimeSource> {
    source: T,
    started_at: Option<f64>,
    paused_at: Option<f64>,
    paused_accum: f64,
    frozen: Option<f64>,
}

impl<T: TimeSource> SessionClock<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            started_at: None,
            paused_at: None,
            paused_accum: 0.0,
            frozen: None,
        }
    }

    pub fn start(&mut self) -> Result<(), ClockError> {
        if self.started_at.is_some() {
            return Err(ClockError::AlreadyStarted);
        }
        self.started_at = Some(self.source.monotonic_secs());
        self.paused_at = None;
        self.paused_accum = 0.0;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ClockError> {
        if self.frozen.is_some() {
            return Err(ClockError::Stopped);
        }
        if self.started_at.is_none() {
            return Err(ClockError::NotStarted);
        }
        if self.paused_at.is_some() {
            return Err(ClockError::AlreadyPaused);
        }
        self.paused_at = Some(self.source.monotonic_secs());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), ClockError> {
        if self.frozen.is_some() {
            return Err(ClockError::Stopped);
        }
        match self.paused_at.take() {
            Some(paused_at) => {
                self.paused_accum += self.source.monotonic_secs() - paused_at;
                Ok(())
            }
            None => Err(ClockError::NotPaused),
        }
    }

    /// Freeze the clock at its current active reading. Repeated calls keep
    /// returning the frozen value.
    pub fn stop(&mut self) -> Result<f64, ClockError> {
        if let Some(frozen) = self.frozen {
            return Ok(frozen);
        }
        if self.started_at.is_none() {
            return Err(ClockError::NotStarted);
        }
        let elapsed = self.active_elapsed();
        self.frozen = Some(elapsed);
        Ok(elapsed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some() && self.frozen.is_none()
    }

    /// Seconds spent running: wall clock minus accumulated pauses. Zero
    /// before start, frozen while paused and after stop.
    pub fn active_elapsed(&self) -> f64 {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        let Some(started_at) = self.started_at else {
            return 0.0;
        };
        let now = match self.paused_at {
            Some(paused_at) => paused_at,
            None => self.source.monotonic_secs(),
        };
        (now - started_at - self.paused_accum).max(0.0)
    }
}
