use crate::clock::{SessionClock, TimeSource};
use crate::pattern::BreathingPhase;
use crate::resolver::{PhaseResolver, PollResult};
use crate::session::{SessionConfig, SessionResult, SessionState};
use thiserror::Error;

/// Plays feedback when the breather should change what they are doing.
/// Implementations must return quickly and keep their failures to
/// themselves; a missed cue never disturbs the poll loop.
pub trait CueEmitter {
    fn on_phase_transition(&mut self, phase: &BreathingPhase);
    /// `completed_cycles` is the number of full cycles finished so far,
    /// 1 on the first wrap
    fn on_cycle_complete(&mut self, completed_cycles: u64);
}

/// Receives the one result a session produces when it ends, however it ends
pub trait CompletionSink {
    fn on_session_complete(&mut self, result: &SessionResult);
}

impl<C: CueEmitter + ?Sized> CueEmitter for Box<C> {
    fn on_phase_transition(&mut self, phase: &BreathingPhase) {
        (**self).on_phase_transition(phase);
    }

    fn on_cycle_complete(&mut self, completed_cycles: u64) {
        (**self).on_cycle_complete(completed_cycles);
    }
}

impl<S: CompletionSink + ?Sized> CompletionSink for Box<S> {
    fn on_session_complete(&mut self, result: &SessionResult) {
        (**self).on_session_complete(result);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("`{op}` is not valid while the session is {state}")]
    InvalidState {
        op: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    fn invalid(op: &'static str, state: SessionState) -> Self {
        SessionError::InvalidState { op, state }
    }
}

/// What the host sees after a poll: enough to render a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSnapshot {
    pub state: SessionState,
    pub active_secs: f64,
    pub total_secs: f64,
    pub phase_index: usize,
    pub phase_fraction: f64,
    pub cycle_index: u64,
    /// True only on the poll that crossed into a new phase
    pub transitioned: bool,
}

/// The session state machine. Owns the clock and the phase resolver, is
/// driven by an external poll cadence, and dispatches each phase, cycle and
/// completion event to its collaborators exactly once. It performs no I/O
/// and owns no timer; the host decides how often `poll` runs.
pub struct SessionController<T: TimeSource, C: CueEmitter, S: CompletionSink> {
    config: SessionConfig,
    clock: SessionClock<T>,
    resolver: PhaseResolver,
    state: SessionState,
    cues: C,
    sink: S,
    last_poll: Option<PollResult>,
    result: Option<SessionResult>,
}

impl<T: TimeSource, C: CueEmitter, S: CompletionSink> SessionController<T, C, S> {
    pub fn new(config: SessionConfig, time_source: T, cues: C, sink: S) -> Self {
        Self {
            config,
            clock: SessionClock::new(time_source),
            resolver: PhaseResolver::new(),
            state: SessionState::Idle,
            cues,
            sink,
            last_poll: None,
            result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session's result once it has completed or been cancelled
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::invalid("start", self.state));
        }
        self.clock
            .start()
            .map_err(|_| SessionError::invalid("start", self.state))?;
        self.resolver.reset();
        self.state = SessionState::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::invalid("pause", self.state));
        }
        self.clock
            .pause()
            .map_err(|_| SessionError::invalid("pause", self.state))?;
        self.state = SessionState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Paused {
            return Err(SessionError::invalid("resume", self.state));
        }
        self.clock
            .resume()
            .map_err(|_| SessionError::invalid("resume", self.state))?;
        self.state = SessionState::Running;
        Ok(())
    }

    /// Cancel the session. Legal from idle, running or paused; the result
    /// carries the active time at this instant and `completed: false`.
    pub fn stop(&mut self) -> Result<SessionResult, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Running | SessionState::Paused => {}
            terminal => return Err(SessionError::invalid("stop", terminal)),
        }
        let actual_secs = if self.state == SessionState::Idle {
            0.0
        } else {
            self.clock
                .stop()
                .map_err(|_| SessionError::invalid("stop", self.state))?
        };
        let result = SessionResult {
            actual_secs,
            completed: false,
            cycles: self.completed_cycles(actual_secs),
        };
        self.state = SessionState::Cancelled;
        self.finish(result.clone());
        Ok(result)
    }

    /// Advance the state machine to the current clock reading. The host
    /// calls this on every frame or tick; cadence does not matter. Completion
    /// takes priority over phase processing, so no cue fires on the tick that
    /// crosses the configured length.
    pub fn poll(&mut self) -> Result<PollSnapshot, SessionError> {
        match self.state {
            SessionState::Running => {}
            // A paused session holds its frame: nothing moves, nothing fires
            SessionState::Paused => return Ok(self.snapshot(false)),
            other => return Err(SessionError::invalid("poll", other)),
        }

        let elapsed = self.clock.active_elapsed();
        let total = self.config.total_secs();

        if elapsed >= total {
            self.clock
                .stop()
                .map_err(|_| SessionError::invalid("poll", self.state))?;
            let result = SessionResult {
                // The poll may land past the configured length; the recorded
                // time is capped at it
                actual_secs: total,
                completed: true,
                cycles: self.completed_cycles(total),
            };
            self.state = SessionState::Completed;
            self.finish(result);
            return Ok(self.snapshot(false));
        }

        let prev_cycle = self.last_poll.map(|p| p.cycle_index);
        let poll = self.resolver.poll(self.config.pattern(), elapsed);

        if poll.transitioned {
            let phase = &self.config.pattern().phases()[poll.phase_index];
            self.cues.on_phase_transition(phase);
        }
        if let Some(prev_cycle) = prev_cycle {
            if poll.cycle_index > prev_cycle {
                self.cues.on_cycle_complete(poll.cycle_index);
            }
        }

        self.last_poll = Some(poll);
        Ok(self.snapshot(poll.transitioned))
    }

    fn finish(&mut self, result: SessionResult) {
        self.result = Some(result.clone());
        self.sink.on_session_complete(&result);
    }

    fn completed_cycles(&self, active_secs: f64) -> u64 {
        (active_secs / self.config.pattern().total_cycle_secs()).floor() as u64
    }

    fn snapshot(&self, transitioned: bool) -> PollSnapshot {
        let (phase_index, phase_fraction, cycle_index) = match self.last_poll {
            Some(p) => (p.phase_index, p.phase_fraction, p.cycle_index),
            None => (0, 0.0, 0),
        };
        PollSnapshot {
            state: self.state,
            active_secs: self.clock.active_elapsed().min(self.config.total_secs()),
            total_secs: self.config.total_secs(),
            phase_index,
            phase_fraction,
            cycle_index,
            transitioned,
        }
    }
}
