//! Session timer state machine.
//!
//! Every state change goes through [`transition`], a pure function from the
//! current [`TimerState`] and one [`Input`] to the next state plus the
//! [`TimerEvent`]s the caller must act on. Nothing here performs I/O; the
//! engine turns events into notifications, counter increments and ticker
//! control.
//!
//! Transition table applied when a phase ends (automatic completion, manual
//! advance and Flow completion all share it):
//!
//! ```text
//! completed  condition          next   current_session  remaining_sessions
//! Work       always             Break  unchanged        -1 (saturating)
//! Break      current < count    Work   +1               unchanged
//! Break      current == count   Work   1                session_count
//! ```

use crate::types::{Phase, TimerConfig, TimerMode, TimerOptions, TimerState};

use super::error::TimerError;

// ============================================================================
// Input
// ============================================================================

/// Everything that can drive the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Replace the cycle configuration (resets the cycle when it differs)
    Configure(TimerConfig),
    /// Replace the mode flags
    SetOptions {
        /// New flags
        options: TimerOptions,
        /// A Flow session is active; its completion performs any pending advance
        flow_active: bool,
    },
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// One tick of the clock
    Tick,
    /// Manual mode: move to the next phase
    AdvancePhase,
    /// Suspend the countdown for a Flow session
    EnterFlow,
    /// Operator finished the Flow session
    CompleteFlow,
}

// ============================================================================
// TimerEvent
// ============================================================================

/// Events produced by a transition, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started
    Started {
        /// Phase being counted down
        phase: Phase,
    },
    /// Countdown paused
    Paused {
        /// Phase that was paused
        phase: Phase,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds after the tick
        remaining_seconds: u32,
    },
    /// A phase ran out; the countdown is stopped
    PhaseCompleted {
        /// Phase that ran out
        phase: Phase,
    },
    /// A phase counts toward the session counters
    SessionRecorded {
        /// Phase to count
        phase: Phase,
    },
    /// A new phase began
    PhaseEntered {
        /// The new phase
        phase: Phase,
        /// Session index after the transition
        session: u32,
        /// Whether the countdown auto-started
        running: bool,
    },
    /// Configuration changed and the cycle restarted
    CycleReset,
    /// Mode flags changed
    OptionsChanged {
        /// Whether the tick cadence changed
        dev_mode_changed: bool,
    },
    /// Countdown suspended for a Flow session
    FlowEntered,
    /// Flow session finished
    FlowCompleted,
}

// ============================================================================
// Transition
// ============================================================================

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The state after the input
    pub state: TimerState,
    /// Events to act on, in order
    pub events: Vec<TimerEvent>,
}

/// Computes the next state for `input`.
///
/// # Errors
///
/// Returns an error for inputs that are illegal in the current state
/// (advancing in automatic mode, Flow outside a work phase). The state is
/// left untouched in that case.
pub fn transition(state: &TimerState, input: &Input) -> Result<Transition, TimerError> {
    let mut next = state.clone();
    let mut events = Vec::new();

    match input {
        Input::Configure(config) => {
            let config = config.clamp();
            if config != state.config {
                next = TimerState::new(config, state.options);
                events.push(TimerEvent::CycleReset);
            }
        }
        Input::SetOptions {
            options,
            flow_active,
        } => {
            if *options != state.options {
                next.options = *options;
                events.push(TimerEvent::OptionsChanged {
                    dev_mode_changed: options.dev_mode != state.options.dev_mode,
                });

                // A phase that timed out in manual mode is still waiting for
                // an advance; switching to automatic performs it.
                if !*flow_active
                    && state.mode() == TimerMode::Manual
                    && next.mode() == TimerMode::Automatic
                    && next.phase_recorded
                    && next.remaining_seconds == 0
                {
                    let completed = next.phase;
                    enter_next_phase(&mut next, completed);
                    events.push(phase_entered(&next));
                }
            }
        }
        Input::Start => {
            if !next.running && next.remaining_seconds > 0 {
                next.running = true;
                events.push(TimerEvent::Started { phase: next.phase });
            }
        }
        Input::Pause => {
            if next.running {
                next.running = false;
                events.push(TimerEvent::Paused { phase: next.phase });
            }
        }
        Input::Tick => {
            if next.running {
                if next.remaining_seconds > 0 {
                    next.remaining_seconds -= 1;
                    events.push(TimerEvent::Tick {
                        remaining_seconds: next.remaining_seconds,
                    });
                }
                if next.remaining_seconds == 0 {
                    complete_phase(&mut next, &mut events);
                }
            }
        }
        Input::AdvancePhase => {
            if state.mode() != TimerMode::Manual {
                return Err(TimerError::AdvanceRequiresManualMode);
            }
            let completed = next.phase;
            next.running = false;
            if !next.phase_recorded {
                events.push(TimerEvent::SessionRecorded { phase: completed });
            }
            enter_next_phase(&mut next, completed);
            events.push(phase_entered(&next));
        }
        Input::EnterFlow => {
            if next.phase != Phase::Work {
                return Err(TimerError::FlowRequiresWorkPhase);
            }
            next.running = false;
            events.push(TimerEvent::FlowEntered);
        }
        Input::CompleteFlow => {
            if next.phase != Phase::Work {
                return Err(TimerError::FlowRequiresWorkPhase);
            }
            next.running = false;
            if !next.phase_recorded {
                events.push(TimerEvent::SessionRecorded { phase: Phase::Work });
            }
            events.push(TimerEvent::FlowCompleted);
            enter_next_phase(&mut next, Phase::Work);
            events.push(phase_entered(&next));
        }
    }

    Ok(Transition {
        state: next,
        events,
    })
}

/// Handles a phase running out. `running` is cleared in the same state that
/// carries the completion event.
fn complete_phase(state: &mut TimerState, events: &mut Vec<TimerEvent>) {
    let completed = state.phase;
    state.running = false;
    state.phase_recorded = true;
    events.push(TimerEvent::PhaseCompleted { phase: completed });
    events.push(TimerEvent::SessionRecorded { phase: completed });

    if state.mode() == TimerMode::Automatic {
        enter_next_phase(state, completed);
        events.push(phase_entered(state));
    }
}

/// Applies the table row for `completed` and enters the following phase.
fn enter_next_phase(state: &mut TimerState, completed: Phase) {
    match completed {
        Phase::Work => {
            state.remaining_sessions = state.remaining_sessions.saturating_sub(1);
        }
        Phase::Break => {
            if state.current_session < state.config.session_count {
                state.current_session += 1;
            } else {
                state.current_session = 1;
                state.remaining_sessions = state.config.session_count;
            }
        }
    }

    let next = completed.next();
    state.phase = next;
    state.remaining_seconds = state.config.phase_seconds(next);
    state.phase_recorded = false;
    state.running = state.options.auto_start(next);
}

fn phase_entered(state: &TimerState) -> TimerEvent {
    TimerEvent::PhaseEntered {
        phase: state.phase,
        session: state.current_session,
        running: state.running,
    }
}

// ============================================================================
// SessionMachine
// ============================================================================

/// Owner of the authoritative [`TimerState`].
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: TimerState,
}

impl SessionMachine {
    /// Creates a machine in the initial state for `config`.
    pub fn new(config: TimerConfig, options: TimerOptions) -> Self {
        Self {
            state: TimerState::new(config, options),
        }
    }

    /// Applies `input`, committing the new state.
    ///
    /// # Errors
    ///
    /// Propagates the rejection from [`transition`]; the state is unchanged.
    pub fn apply(&mut self, input: Input) -> Result<Vec<TimerEvent>, TimerError> {
        let Transition { state, events } = transition(&self.state, &input)?;
        self.state = state;
        Ok(events)
    }

    /// Returns the current state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================
