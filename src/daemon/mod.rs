//! Daemon module for the focus timer.
//!
//! - `machine`: pure session state machine (transition table, events)
//! - `flow`: Flow session overlay
//! - `ticker`: generation-tagged tick source
//! - `timer`: engine wiring the machine to its side effects
//! - `ipc`: Unix socket server and request dispatch
//! - `service`: the daemon main loop

pub mod error;
pub mod flow;
pub mod ipc;
pub mod machine;
pub mod service;
pub mod ticker;
pub mod timer;

pub use error::TimerError;
pub use flow::{FlowOverlay, FlowSession};
pub use ipc::{default_socket_path, serve_connection, IpcServer, RequestHandler};
pub use machine::{transition, Input, SessionMachine, TimerEvent, Transition};
pub use service::{run, run_until, DaemonSettings};
pub use ticker::{Cadence, Tick, TickSource};
pub use timer::{EngineChannels, TimerEngine};
