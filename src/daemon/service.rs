//! Daemon main loop.
//!
//! A single task owns the loop and selects over socket accepts, ticks,
//! engine events and the shutdown signal. Connections are served on their
//! own tasks; every path into the engine goes through the same mutex, so
//! commands and ticks are applied one at a time.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::notification::{DesktopNotifier, NotificationDispatcher};
use crate::sound::{try_create_player, SoundPlayer, SoundSource};
use crate::stats::{CounterStore, JsonFileStore, MemoryStore, SessionCounters};
use crate::types::{TimerConfig, TimerOptions};

use super::ipc::{serve_connection, IpcServer, RequestHandler};
use super::machine::TimerEvent;
use super::timer::{EngineChannels, TimerEngine};

// ============================================================================
// DaemonSettings
// ============================================================================

/// Everything the daemon needs at launch.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    /// Socket to listen on
    pub socket_path: PathBuf,
    /// Initial cycle configuration
    pub config: TimerConfig,
    /// Initial mode flags
    pub options: TimerOptions,
    /// Counter file; `None` keeps counters in memory only
    pub counter_path: Option<PathBuf>,
    /// Custom sound file instead of the chime
    pub sound_file: Option<PathBuf>,
    /// Open the audio device
    pub audio: bool,
    /// Post desktop notifications
    pub desktop_notifications: bool,
}

impl DaemonSettings {
    /// Settings with default timer values, audio and desktop notifications.
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            config: TimerConfig::default(),
            options: TimerOptions::default(),
            counter_path: None,
            sound_file: None,
            audio: true,
            desktop_notifications: true,
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

fn build_notifier(settings: &DaemonSettings) -> NotificationDispatcher {
    let sound = if settings.audio {
        try_create_player().map(|player| Box::new(player) as Box<dyn SoundPlayer>)
    } else {
        None
    };

    let desktop = if settings.desktop_notifications {
        DesktopNotifier::detect()
    } else {
        None
    };

    let dispatcher = NotificationDispatcher::new(sound, desktop);

    match &settings.sound_file {
        Some(path) => match SoundSource::file(path) {
            Ok(source) => dispatcher.with_sound_source(source),
            Err(e) => {
                warn!("{} ({})", e, e.suggestion());
                dispatcher
            }
        },
        None => dispatcher,
    }
}

fn build_counters(settings: &DaemonSettings) -> SessionCounters {
    let store: Box<dyn CounterStore> = match &settings.counter_path {
        Some(path) => {
            info!("カウンターファイル: {}", path.display());
            Box::new(JsonFileStore::new(path))
        }
        None => Box::new(MemoryStore::new()),
    };
    SessionCounters::load(store)
}

fn log_event(event: &TimerEvent) {
    match event {
        TimerEvent::Tick { remaining_seconds } => debug!("tick: {}s remaining", remaining_seconds),
        TimerEvent::PhaseEntered {
            phase,
            session,
            running,
        } => info!(
            "phase entered: {} (session {}, running={})",
            phase.as_str(),
            session,
            running
        ),
        other => debug!("event: {:?}", other),
    }
}

// ============================================================================
// Main Loop
// ============================================================================

/// Runs the daemon until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub async fn run(settings: DaemonSettings) -> Result<()> {
    run_until(settings, shutdown_signal()).await
}

/// Runs the daemon until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub async fn run_until(settings: DaemonSettings, shutdown: impl Future<Output = ()>) -> Result<()> {
    let server = IpcServer::bind(&settings.socket_path).context("IPCサーバーの起動に失敗しました")?;

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let engine = TimerEngine::new(
        settings.config,
        settings.options,
        Box::new(build_notifier(&settings)),
        build_counters(&settings),
        EngineChannels { tick_tx, event_tx },
    );
    let engine = Arc::new(Mutex::new(engine));
    let handler = RequestHandler::new(engine.clone());

    info!("デーモンを起動しました: {}", server.socket_path().display());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, &handler).await {
                            warn!("レスポンスの送信に失敗しました: {:#}", e);
                        }
                    });
                }
                Err(e) => warn!("接続の受け付けに失敗しました: {:#}", e),
            },
            Some(tick) = tick_rx.recv() => {
                engine.lock().await.on_tick(tick);
            }
            Some(event) = event_rx.recv() => log_event(&event),
            () = &mut shutdown => {
                info!("シャットダウンします");
                break;
            }
        }
    }

    engine.lock().await.shutdown();
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-Cハンドラの登録に失敗しました: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("SIGTERMハンドラの登録に失敗しました: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;
    use tokio::sync::oneshot;

    use crate::types::IpcResponse;

    fn quiet_settings(dir: &std::path::Path) -> DaemonSettings {
        DaemonSettings {
            audio: false,
            desktop_notifications: false,
            ..DaemonSettings::new(dir.join("daemon.sock"))
        }
    }

    async fn request(socket: &std::path::Path, json: &str) -> IpcResponse {
        for _ in 0..50 {
            if let Ok(mut stream) = UnixStream::connect(socket).await {
                stream.write_all(json.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
                let mut buffer = Vec::new();
                stream.read_to_end(&mut buffer).await.unwrap();
                return serde_json::from_slice(&buffer).unwrap();
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("daemon did not come up");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = DaemonSettings::new(PathBuf::from("/tmp/x.sock"));
        assert_eq!(settings.config, TimerConfig::default());
        assert!(settings.counter_path.is_none());
        assert!(settings.audio);
    }

    #[test]
    fn test_build_counters_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, r#"{"workSessions":4}"#).unwrap();
        let settings = DaemonSettings {
            counter_path: Some(path),
            ..quiet_settings(dir.path())
        };

        let counters = build_counters(&settings);

        assert_eq!(counters.snapshot().work_sessions, 4);
    }

    #[tokio::test]
    async fn test_run_until_serves_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let settings = quiet_settings(dir.path());
        let socket = settings.socket_path.clone();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let daemon = tokio::spawn(run_until(settings, async {
            let _ = stop_rx.await;
        }));

        let response = request(&socket, r#"{"command":"start"}"#).await;
        assert!(response.is_success());

        let response = request(&socket, r#"{"command":"status"}"#).await;
        assert_eq!(response.data.unwrap().running, Some(true));

        stop_tx.send(()).unwrap();
        daemon.await.unwrap().unwrap();
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_ticks_reach_engine() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DaemonSettings {
            options: TimerOptions {
                dev_mode: true,
                ..TimerOptions::default()
            },
            ..quiet_settings(dir.path())
        };
        let socket = settings.socket_path.clone();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let daemon = tokio::spawn(run_until(settings, async {
            let _ = stop_rx.await;
        }));

        request(&socket, r#"{"command":"start"}"#).await;
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        let response = request(&socket, r#"{"command":"status"}"#).await;

        let remaining = response.data.unwrap().remaining_seconds.unwrap();
        assert!(remaining < 25 * 60);

        stop_tx.send(()).unwrap();
        daemon.await.unwrap().unwrap();
    }
}
