use crate::pattern::BreathingPattern;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session length must be longer than zero seconds")]
    NonPositiveDuration,
}

/// Everything needed to run one guided session. The session length is
/// independent of the cycle length; a session may end mid-cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pattern: BreathingPattern,
    total_secs: f64,
}

impl SessionConfig {
    pub fn new(pattern: BreathingPattern, total_secs: f64) -> Result<Self, ConfigError> {
        if total_secs.is_nan() || total_secs <= 0.0 {
            return Err(ConfigError::NonPositiveDuration);
        }
        Ok(Self {
            pattern,
            total_secs,
        })
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }
}

/// Lifecycle of one session. Completed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Immutable snapshot handed to the completion sink when a session ends
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    /// Active seconds at termination, capped at the configured length when
    /// the session ran to completion
    pub actual_secs: f64,
    /// Whether the configured length was reached, as opposed to an early stop
    pub completed: bool,
    /// Full breathing cycles finished
    pub cycles: u64,
}
