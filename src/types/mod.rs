//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer configuration with range clamping
//! - Mode flags (auto-start, sound, manual mode, dev mode)
//! - Timer state owned by the session state machine
//! - Session counter snapshots
//! - IPC request/response serialization

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

// ============================================================================
// Phase
// ============================================================================

/// The two countdown phases of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Focused work
    #[default]
    Work,
    /// Break between work sessions
    Break,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }

    /// Returns the phase that follows this one.
    pub fn next(&self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }
}

// ============================================================================
// TimerMode
// ============================================================================

/// How the machine behaves when a phase runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Phases advance on their own
    Automatic,
    /// Phases wait for an explicit advance
    Manual,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Automatic => "automatic",
            TimerMode::Manual => "manual",
        }
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Allowed work durations in minutes.
pub const WORK_MINUTES_RANGE: RangeInclusive<u32> = 15..=60;

/// Allowed break durations in minutes.
pub const BREAK_MINUTES_RANGE: RangeInclusive<u32> = 5..=30;

/// Allowed number of work sessions per cycle.
pub const SESSION_COUNT_RANGE: RangeInclusive<u32> = 1..=5;

fn clamp_to(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// Durations and session count for one cycle.
///
/// Every constructor clamps into the allowed ranges, so a config reaching the
/// state machine is always in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Work duration in minutes (15-60)
    pub work_minutes: u32,
    /// Break duration in minutes (5-30)
    pub break_minutes: u32,
    /// Work sessions per cycle (1-5)
    pub session_count: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            session_count: 4,
        }
    }
}

impl TimerConfig {
    /// Creates a configuration, clamping every field into its range.
    pub fn clamped(work_minutes: u32, break_minutes: u32, session_count: u32) -> Self {
        Self {
            work_minutes,
            break_minutes,
            session_count,
        }
        .clamp()
    }

    /// Returns a copy with every field clamped into its range.
    #[must_use]
    pub fn clamp(self) -> Self {
        Self {
            work_minutes: clamp_to(self.work_minutes, &WORK_MINUTES_RANGE),
            break_minutes: clamp_to(self.break_minutes, &BREAK_MINUTES_RANGE),
            session_count: clamp_to(self.session_count, &SESSION_COUNT_RANGE),
        }
    }

    /// Returns true if every field is inside its range.
    pub fn is_within_bounds(&self) -> bool {
        WORK_MINUTES_RANGE.contains(&self.work_minutes)
            && BREAK_MINUTES_RANGE.contains(&self.break_minutes)
            && SESSION_COUNT_RANGE.contains(&self.session_count)
    }

    /// Length of the given phase in seconds.
    pub fn phase_seconds(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }
}

// ============================================================================
// TimerOptions
// ============================================================================

/// Mode flags. Changing them never resets the running cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerOptions {
    /// Start the countdown automatically when a work phase is entered
    pub auto_start_work: bool,
    /// Start the countdown automatically when a break phase is entered
    pub auto_start_break: bool,
    /// Play a chime on phase completion
    pub sound_enabled: bool,
    /// Require an explicit advance between phases
    pub manual_mode: bool,
    /// Tick every 50ms instead of every second
    pub dev_mode: bool,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            auto_start_work: false,
            auto_start_break: false,
            sound_enabled: true,
            manual_mode: false,
            dev_mode: false,
        }
    }
}

impl TimerOptions {
    /// Returns the transition mode selected by these flags.
    pub fn mode(&self) -> TimerMode {
        if self.manual_mode {
            TimerMode::Manual
        } else {
            TimerMode::Automatic
        }
    }

    /// Whether the countdown should run right after entering `phase`.
    ///
    /// Manual mode never auto-starts.
    pub fn auto_start(&self, phase: Phase) -> bool {
        match self.mode() {
            TimerMode::Manual => false,
            TimerMode::Automatic => match phase {
                Phase::Work => self.auto_start_work,
                Phase::Break => self.auto_start_break,
            },
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// State owned by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current phase
    pub phase: Phase,
    /// Seconds left in the current phase
    pub remaining_seconds: u32,
    /// 1-based index of the current work/break pair
    pub current_session: u32,
    /// Work sessions left before the cycle wraps
    pub remaining_sessions: u32,
    /// Whether the countdown is running
    pub running: bool,
    /// Whether the current phase's completion has already been counted
    pub phase_recorded: bool,
    /// Active cycle configuration
    pub config: TimerConfig,
    /// Mode flags
    pub options: TimerOptions,
}

impl TimerState {
    /// Creates the initial state: paused at the start of the first work phase.
    pub fn new(config: TimerConfig, options: TimerOptions) -> Self {
        let config = config.clamp();
        Self {
            phase: Phase::Work,
            remaining_seconds: config.phase_seconds(Phase::Work),
            current_session: 1,
            remaining_sessions: config.session_count,
            running: false,
            phase_recorded: false,
            config,
            options,
        }
    }

    /// Returns the transition mode.
    pub fn mode(&self) -> TimerMode {
        self.options.mode()
    }

    /// Length of the current phase in seconds.
    pub fn phase_seconds(&self) -> u32 {
        self.config.phase_seconds(self.phase)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(TimerConfig::default(), TimerOptions::default())
    }
}

// ============================================================================
// CounterSnapshot
// ============================================================================

/// Persistent session tallies at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    /// Completed work sessions
    pub work_sessions: u64,
    /// Completed breaks
    pub break_sessions: u64,
    /// Completed tasks
    pub completed_tasks: u64,
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the configure command. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureParams {
    /// Work duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    /// Break duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<u32>,
    /// Sessions per cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    /// Auto-start work flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_work: Option<bool>,
    /// Auto-start break flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_break: Option<bool>,
    /// Sound flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    /// Manual mode flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_mode: Option<bool>,
    /// Dev mode flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
}

impl ConfigureParams {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the set duration fields onto `base` as sent, unclamped.
    pub fn requested_config(&self, base: TimerConfig) -> TimerConfig {
        TimerConfig {
            work_minutes: self.work_minutes.unwrap_or(base.work_minutes),
            break_minutes: self.break_minutes.unwrap_or(base.break_minutes),
            session_count: self.session_count.unwrap_or(base.session_count),
        }
    }

    /// Overlays the set duration fields onto `base`, clamping the result.
    pub fn apply_config(&self, base: TimerConfig) -> TimerConfig {
        self.requested_config(base).clamp()
    }

    /// Overlays the set flag fields onto `base`.
    pub fn apply_options(&self, base: TimerOptions) -> TimerOptions {
        TimerOptions {
            auto_start_work: self.auto_start_work.unwrap_or(base.auto_start_work),
            auto_start_break: self.auto_start_break.unwrap_or(base.auto_start_break),
            sound_enabled: self.sound_enabled.unwrap_or(base.sound_enabled),
            manual_mode: self.manual_mode.unwrap_or(base.manual_mode),
            dev_mode: self.dev_mode.unwrap_or(base.dev_mode),
        }
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start (or resume) the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Query the current status
    Status,
    /// Change durations and/or mode flags
    Configure {
        /// Fields to change
        #[serde(flatten)]
        params: ConfigureParams,
    },
    /// Manual mode: move to the next phase
    Advance,
    /// Enter a Flow session
    FlowEnter,
    /// Finish the active Flow session
    FlowComplete,
    /// A task from the task list was completed
    TaskDone,
    /// Set or clear the focused task label
    Focus {
        /// New label, `None` clears it
        #[serde(skip_serializing_if = "Option::is_none")]
        task: Option<String>,
    },
    /// Query the session counters
    Stats,
    /// Reset all session counters
    ResetStats {
        /// Must be true; the reset is irreversible
        confirm: bool,
    },
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Whether the countdown is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    /// Remaining seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Current session index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session: Option<u32>,
    /// Sessions per cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    /// Work sessions left in the cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_sessions: Option<u32>,
    /// Transition mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Whether dev mode is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
    /// Whether a Flow session is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_active: Option<bool>,
    /// Focused task label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_task: Option<String>,
    /// Session counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterSnapshot>,
}

impl ResponseData {
    /// Creates response data from timer state.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            phase: Some(state.phase.as_str().to_string()),
            running: Some(state.running),
            remaining_seconds: Some(state.remaining_seconds),
            current_session: Some(state.current_session),
            session_count: Some(state.config.session_count),
            remaining_sessions: Some(state.remaining_sessions),
            mode: Some(state.mode().as_str().to_string()),
            dev_mode: Some(state.options.dev_mode),
            ..Self::default()
        }
    }

    /// Creates response data holding only counters.
    pub fn from_counters(counters: CounterSnapshot) -> Self {
        Self {
            counters: Some(counters),
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for success responses.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
