//! Execution state of a remote task context
//!
//! The remote state machine reports a raw integer. Only the seven values
//! below are meaningful to callers; anything else is a malformed response.

use std::fmt;
use taskctx_transport::TransportError;

pub const STATE_PRE_OPERATIONAL: i32 = 1;
pub const STATE_FATAL_ERROR: i32 = 2;
pub const STATE_STOPPED: i32 = 3;
pub const STATE_ACTIVE: i32 = 4;
pub const STATE_RUNNING: i32 = 5;
pub const STATE_RUNTIME_WARNING: i32 = 6;
pub const STATE_RUNTIME_ERROR: i32 = 7;

/// Lifecycle state of a task context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExecutionState {
    /// Waiting for configuration
    PreOperational = STATE_PRE_OPERATIONAL,
    /// Unrecoverable error, the task must be restarted
    FatalError = STATE_FATAL_ERROR,
    /// Configured, not executing
    Stopped = STATE_STOPPED,
    /// Started but not yet executing its update hook
    Active = STATE_ACTIVE,
    /// Executing normally
    Running = STATE_RUNNING,
    /// Executing, with a reported warning
    RuntimeWarning = STATE_RUNTIME_WARNING,
    /// Executing its error hook
    RuntimeError = STATE_RUNTIME_ERROR,
}

impl ExecutionState {
    pub const ALL: [ExecutionState; 7] = [
        ExecutionState::PreOperational,
        ExecutionState::FatalError,
        ExecutionState::Stopped,
        ExecutionState::Active,
        ExecutionState::Running,
        ExecutionState::RuntimeWarning,
        ExecutionState::RuntimeError,
    ];

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.raw() == raw)
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Running, with or without a warning or runtime error
    pub fn is_running(self) -> bool {
        matches!(
            self,
            ExecutionState::Running
                | ExecutionState::RuntimeWarning
                | ExecutionState::RuntimeError
        )
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            ExecutionState::RuntimeError | ExecutionState::FatalError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::PreOperational => "PRE_OPERATIONAL",
            ExecutionState::FatalError => "FATAL_ERROR",
            ExecutionState::Stopped => "STOPPED",
            ExecutionState::Active => "ACTIVE",
            ExecutionState::Running => "RUNNING",
            ExecutionState::RuntimeWarning => "RUNTIME_WARNING",
            ExecutionState::RuntimeError => "RUNTIME_ERROR",
        }
    }
}

impl TryFrom<i32> for ExecutionState {
    type Error = TransportError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        ExecutionState::from_raw(raw).ok_or_else(|| {
            TransportError::Malformed(format!("execution state {} is out of range", raw))
        })
    }
}

impl From<ExecutionState> for i32 {
    fn from(state: ExecutionState) -> Self {
        state.raw()
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
