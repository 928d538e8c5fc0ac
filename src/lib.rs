//! Focus Timer Library
//!
//! This library provides the core functionality for the focus timer CLI.
//! It includes:
//! - Session state machine for work/break cycles, manual mode and Flow
//! - Daemon engine with a generation-tagged ticker
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Completion notifications (chime and desktop notification)
//! - Persistent session counters

use std::path::PathBuf;

pub mod cli;
pub mod daemon;
pub mod notification;
pub mod sound;
pub mod stats;
pub mod types;

/// Name of the per-user data directory under `$HOME`.
pub const DATA_DIR_NAME: &str = ".focustimer";

/// Returns `~/.focustimer`, where the socket and counter file live.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

// Re-export commonly used types for convenience
pub use types::{
    ConfigureParams, CounterSnapshot, IpcRequest, IpcResponse, Phase, ResponseData, TimerConfig,
    TimerMode, TimerOptions, TimerState,
};

pub use daemon::{DaemonSettings, SessionMachine, TimerEngine, TimerError, TimerEvent};

pub use notification::{
    CompletionNotice, DesktopNotifier, MockNotifier, NotificationDispatcher, NotificationError,
    Notifier,
};

pub use sound::{MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer, SoundSource};

pub use stats::{CounterStore, JsonFileStore, MemoryStore, SessionCounters, StoreError};
