//! Command definitions for the focus timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::daemon::DaemonSettings;
use crate::types::{
    ConfigureParams, TimerConfig, TimerOptions, BREAK_MINUTES_RANGE, SESSION_COUNT_RANGE,
    WORK_MINUTES_RANGE,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus timer CLI - work/break cycles driven by a background daemon
#[derive(Parser, Debug)]
#[command(
    name = "focustimer",
    version,
    about = "作業と休憩を繰り返すフォーカスタイマーCLI",
    long_about = "作業フェーズと休憩フェーズを交互に進めるフォーカスタイマー。\n\
                  タイマーは 'focustimer daemon' で起動するデーモンが管理し、\n\
                  その他のサブコマンドはUnixソケット経由でデーモンを操作します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (defaults to ~/.focustimer/focustimer.sock)
    #[arg(long, global = true, env = "FOCUSTIMER_SOCKET", value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or resume the countdown
    Start,

    /// Pause the countdown
    Pause,

    /// Show current timer status
    Status,

    /// Change durations or mode flags (duration changes reset the cycle)
    Config(ConfigArgs),

    /// Move to the next phase (manual mode only)
    #[command(visible_aliases = ["start-break", "finish-break"])]
    Advance,

    /// Enter or complete a Flow session
    Flow {
        #[command(subcommand)]
        action: FlowAction,
    },

    /// Task list operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Set or clear the focused task
    Focus(FocusArgs),

    /// Show session counters
    Stats,

    /// Reset all session counters
    ResetStats {
        /// Confirm the reset; counters cannot be restored
        #[arg(short, long)]
        yes: bool,
    },

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flow subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    /// Hold the current work phase open until you finish
    Enter,
    /// Finish the Flow session and move to the break
    Complete,
}

/// Task subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Count a completed task
    Done,
}

// ============================================================================
// Focus Arguments
// ============================================================================

/// Arguments for the focus command
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["label", "clear"])))]
pub struct FocusArgs {
    /// Label of the task to focus on
    #[arg(value_parser = validate_task_name)]
    pub label: Option<String>,

    /// Clear the focused task
    #[arg(long)]
    pub clear: bool,
}

impl FocusArgs {
    /// The label to send; `None` clears the focus.
    pub fn task(&self) -> Option<String> {
        if self.clear {
            None
        } else {
            self.label.clone()
        }
    }
}

// ============================================================================
// Config Arguments
// ============================================================================

/// Durations and mode flags, each optional
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Work duration in minutes (15-60)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(i64_range(&WORK_MINUTES_RANGE))
    )]
    pub work: Option<u32>,

    /// Break duration in minutes (5-30)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(i64_range(&BREAK_MINUTES_RANGE))
    )]
    pub break_time: Option<u32>,

    /// Work sessions per cycle (1-5)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(i64_range(&SESSION_COUNT_RANGE))
    )]
    pub sessions: Option<u32>,

    /// Start work phases automatically
    #[arg(long, value_name = "BOOL")]
    pub auto_start_work: Option<bool>,

    /// Start break phases automatically
    #[arg(long, value_name = "BOOL")]
    pub auto_start_break: Option<bool>,

    /// Play a chime when a phase completes
    #[arg(long, value_name = "BOOL")]
    pub sound: Option<bool>,

    /// Wait for 'advance' between phases
    #[arg(long, value_name = "BOOL")]
    pub manual: Option<bool>,

    /// Tick every 50ms (for trying out cycles quickly)
    #[arg(long, value_name = "BOOL")]
    pub dev: Option<bool>,
}

impl ConfigArgs {
    /// Converts the flags into IPC parameters.
    pub fn to_params(&self) -> ConfigureParams {
        ConfigureParams {
            work_minutes: self.work,
            break_minutes: self.break_time,
            session_count: self.sessions,
            auto_start_work: self.auto_start_work,
            auto_start_break: self.auto_start_break,
            sound_enabled: self.sound,
            manual_mode: self.manual,
            dev_mode: self.dev,
        }
    }
}

fn i64_range(range: &std::ops::RangeInclusive<u32>) -> std::ops::RangeInclusive<i64> {
    i64::from(*range.start())..=i64::from(*range.end())
}

// ============================================================================
// Daemon Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Initial durations and mode flags
    #[command(flatten)]
    pub timer: ConfigArgs,

    /// Keep counters in memory only
    #[arg(long, conflicts_with = "counter_file")]
    pub no_persist: bool,

    /// Counter file (defaults to ~/.focustimer/counters.json)
    #[arg(long, value_name = "PATH")]
    pub counter_file: Option<PathBuf>,

    /// Sound file to play instead of the chime
    #[arg(long, value_name = "PATH")]
    pub sound_file: Option<PathBuf>,

    /// Do not open the audio device
    #[arg(long)]
    pub no_audio: bool,

    /// Do not post desktop notifications
    #[arg(long)]
    pub no_desktop_notify: bool,
}

impl DaemonArgs {
    /// Builds the daemon settings. `default_counter_path` is used unless a
    /// file was given or persistence is off.
    pub fn into_settings(
        self,
        socket_path: PathBuf,
        default_counter_path: Option<PathBuf>,
    ) -> DaemonSettings {
        let params = self.timer.to_params();
        let counter_path = if self.no_persist {
            None
        } else {
            self.counter_file.or(default_counter_path)
        };

        DaemonSettings {
            config: params.apply_config(TimerConfig::default()),
            options: params.apply_options(TimerOptions::default()),
            counter_path,
            sound_file: self.sound_file,
            audio: !self.no_audio,
            desktop_notifications: !self.no_desktop_notify,
            ..DaemonSettings::new(socket_path)
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the focused task label.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_task_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("タスク名は空にできません".to_string());
    }
    if trimmed.chars().count() > 100 {
        return Err("タスク名は100文字以内にしてください".to_string());
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================
