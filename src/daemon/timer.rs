//! Timer engine for the focus timer.
//!
//! The engine owns the session state machine and everything that reacts to
//! it: the tick source, the Flow overlay, the notifier and the session
//! counters. Commands and ticks become machine inputs; the events that come
//! back are turned into side effects here and then forwarded to observers.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::notification::{CompletionNotice, Notifier};
use crate::stats::SessionCounters;
use crate::types::{CounterSnapshot, ResponseData, TimerConfig, TimerOptions, TimerState};

use super::error::TimerError;
use super::flow::FlowOverlay;
use super::machine::{Input, SessionMachine, TimerEvent};
use super::ticker::{Cadence, Tick, TickSource};

// ============================================================================
// EngineChannels
// ============================================================================

/// Outgoing channels of the engine.
#[derive(Debug, Clone)]
pub struct EngineChannels {
    /// Where the tick task sends ticks
    pub tick_tx: mpsc::UnboundedSender<Tick>,
    /// Observer channel for every event
    pub event_tx: mpsc::UnboundedSender<TimerEvent>,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that manages the session cycle and its side effects.
pub struct TimerEngine {
    machine: SessionMachine,
    flow: FlowOverlay,
    ticker: TickSource,
    notifier: Box<dyn Notifier>,
    counters: SessionCounters,
    focused_task: Option<String>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an engine paused at the start of the first work session.
    pub fn new(
        config: TimerConfig,
        options: TimerOptions,
        notifier: Box<dyn Notifier>,
        counters: SessionCounters,
        channels: EngineChannels,
    ) -> Self {
        Self {
            machine: SessionMachine::new(config, options),
            flow: FlowOverlay::new(),
            ticker: TickSource::new(channels.tick_tx),
            notifier,
            counters,
            focused_task: None,
            event_tx: channels.event_tx,
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Replaces the cycle configuration.
    ///
    /// A changed configuration discards the running countdown, restarts the
    /// cycle and cancels any Flow session.
    pub fn configure(&mut self, config: TimerConfig) {
        self.apply_infallible(Input::Configure(config));
    }

    /// Replaces the mode flags without resetting the cycle.
    ///
    /// A manual timeout still waiting for an advance stays pending while a
    /// Flow session is active; completing the session performs it.
    pub fn set_options(&mut self, options: TimerOptions) {
        self.apply_infallible(Input::SetOptions {
            options,
            flow_active: self.flow.is_active(),
        });
    }

    /// Starts or resumes the countdown.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::FlowActive` while a Flow session is active.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.flow.is_active() {
            return Err(TimerError::FlowActive);
        }
        self.apply(Input::Start)
    }

    /// Pauses the countdown.
    pub fn pause(&mut self) {
        self.apply_infallible(Input::Pause);
    }

    /// Feeds one tick. Ticks from a cancelled generation are dropped.
    pub fn on_tick(&mut self, tick: Tick) {
        if !self.ticker.accepts(&tick) {
            debug!(
                "stale tick dropped: generation={}, live={}",
                tick.generation,
                self.ticker.generation()
            );
            return;
        }
        self.apply_infallible(Input::Tick);
    }

    /// Moves to the next phase in manual mode.
    ///
    /// # Errors
    ///
    /// Fails in automatic mode or while a Flow session is active.
    pub fn advance_phase(&mut self) -> Result<(), TimerError> {
        if self.flow.is_active() {
            return Err(TimerError::FlowActive);
        }
        self.apply(Input::AdvancePhase)
    }

    /// Suspends the work countdown for a Flow session.
    ///
    /// # Errors
    ///
    /// Fails outside a work phase or when a session is already active.
    pub fn enter_flow(&mut self) -> Result<(), TimerError> {
        self.flow.check_enter(self.machine.state().phase)?;
        self.apply(Input::EnterFlow)?;
        let session = self.flow.enter(self.machine.state().phase)?;
        info!("フローを開始しました: {}", session.id());
        Ok(())
    }

    /// Ends the Flow session and moves on to the break.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::FlowNotActive` without an active session. A
    /// rejected transition leaves the session active.
    pub fn complete_flow(&mut self) -> Result<(), TimerError> {
        if !self.flow.is_active() {
            return Err(TimerError::FlowNotActive);
        }
        self.apply(Input::CompleteFlow)?;
        let session = self.flow.complete()?;
        info!(
            "フローを完了しました: {} ({}秒)",
            session.id(),
            session.elapsed().as_secs()
        );
        Ok(())
    }

    /// Counts a completed task.
    pub fn task_completed(&mut self) {
        self.counters.increment_task_completed();
    }

    /// Sets or clears the focused task label. Blank labels clear it.
    pub fn set_focused_task(&mut self, task: Option<String>) {
        self.focused_task = task
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty());
    }

    /// Sets every session counter back to 0.
    pub fn reset_counters(&mut self) {
        self.counters.reset_all();
    }

    /// Stops the tick source and drops any Flow session.
    pub fn shutdown(&mut self) {
        self.ticker.stop();
        if self.flow.cancel().is_some() {
            info!("フローを中断しました");
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Returns the current timer state.
    pub fn state(&self) -> &TimerState {
        self.machine.state()
    }

    /// Returns the current counter values.
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Returns true while a Flow session is active.
    pub fn is_flow_active(&self) -> bool {
        self.flow.is_active()
    }

    /// Returns the focused task label.
    pub fn focused_task(&self) -> Option<&str> {
        self.focused_task.as_deref()
    }

    /// Returns true while the tick task is running.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    /// Builds the full status payload.
    pub fn status_data(&self) -> ResponseData {
        ResponseData {
            flow_active: Some(self.is_flow_active()),
            focused_task: self.focused_task.clone(),
            counters: Some(self.counters()),
            ..ResponseData::from_timer_state(self.state())
        }
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    fn apply(&mut self, input: Input) -> Result<(), TimerError> {
        let events = self.machine.apply(input)?;
        for event in events {
            self.handle_event(&event);
            if self.event_tx.send(event).is_err() {
                debug!("event observer dropped");
            }
        }
        Ok(())
    }

    /// Applies an input the machine never rejects.
    fn apply_infallible(&mut self, input: Input) {
        if let Err(e) = self.apply(input) {
            warn!("unexpected rejection: {}", e);
        }
    }

    fn handle_event(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::PhaseCompleted { phase } => {
                self.ticker.stop();
                info!("{}フェーズが終了しました", phase.as_str());
                let notice = CompletionNotice {
                    phase: *phase,
                    focused_task: self.focused_task.clone(),
                    sound_enabled: self.state().options.sound_enabled,
                };
                self.notifier.notify(&notice);
            }
            TimerEvent::SessionRecorded { phase } => self.counters.record(*phase),
            TimerEvent::Started { .. } | TimerEvent::PhaseEntered { running: true, .. } => {
                self.restart_ticker();
            }
            TimerEvent::Paused { .. }
            | TimerEvent::FlowEntered
            | TimerEvent::PhaseEntered { running: false, .. } => self.ticker.stop(),
            TimerEvent::CycleReset => {
                self.ticker.stop();
                if self.flow.cancel().is_some() {
                    info!("設定変更によりフローを中断しました");
                }
            }
            TimerEvent::OptionsChanged {
                dev_mode_changed: true,
            } if self.state().running => self.restart_ticker(),
            TimerEvent::OptionsChanged { .. }
            | TimerEvent::Tick { .. }
            | TimerEvent::FlowCompleted => {}
        }
    }

    fn restart_ticker(&mut self) {
        let cadence = Cadence::from_dev_mode(self.state().options.dev_mode);
        self.ticker.start(cadence);
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", self.state())
            .field("flow_active", &self.flow.is_active())
            .field("focused_task", &self.focused_task)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
