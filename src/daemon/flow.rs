//! Flow session overlay.
//!
//! A Flow session suspends the work countdown while the operator keeps
//! working past the timer. The overlay only tracks whether a session exists;
//! the effect on the cycle is applied by the state machine when the session
//! completes.

use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::types::Phase;

use super::error::TimerError;

/// An active Flow session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSession {
    id: Uuid,
    started_at: Instant,
}

impl FlowSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Instant::now(),
        }
    }

    /// Returns the session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns how long the session has been running.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Inactive or active Flow state.
#[derive(Debug, Default)]
pub struct FlowOverlay {
    session: Option<FlowSession>,
}

impl FlowOverlay {
    /// Creates an inactive overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that a session may be entered during `phase`.
    ///
    /// # Errors
    ///
    /// Fails outside a work phase or when a session is already active.
    pub fn check_enter(&self, phase: Phase) -> Result<(), TimerError> {
        if self.session.is_some() {
            return Err(TimerError::FlowAlreadyActive);
        }
        if phase != Phase::Work {
            return Err(TimerError::FlowRequiresWorkPhase);
        }
        Ok(())
    }

    /// Enters a Flow session.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FlowOverlay::check_enter`]; nothing changes on error.
    pub fn enter(&mut self, phase: Phase) -> Result<&FlowSession, TimerError> {
        self.check_enter(phase)?;
        Ok(&*self.session.insert(FlowSession::new()))
    }

    /// Ends the active session and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::FlowNotActive`] when no session is active.
    pub fn complete(&mut self) -> Result<FlowSession, TimerError> {
        self.session.take().ok_or(TimerError::FlowNotActive)
    }

    /// Drops the active session without completing it.
    pub fn cancel(&mut self) -> Option<FlowSession> {
        self.session.take()
    }

    /// Returns true while a session is active.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the active session.
    pub fn session(&self) -> Option<&FlowSession> {
        self.session.as_ref()
    }
}
