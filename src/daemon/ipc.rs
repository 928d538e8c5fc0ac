//! Unix socket front end of the daemon.
//!
//! Each connection carries exactly one exchange: the client writes a JSON
//! request and shuts down its write side, the daemon answers with one JSON
//! response and closes. Requests are dispatched to the shared
//! [`TimerEngine`] through [`RequestHandler`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::types::{ConfigureParams, IpcRequest, IpcResponse, Phase, ResponseData};

use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Socket file name inside the data directory
pub const SOCKET_FILE_NAME: &str = "focustimer.sock";

/// Upper bound on a request body.
const MAX_REQUEST_SIZE: usize = 4096;

/// How long a client may take to deliver its request.
const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// Returns `~/.focustimer/focustimer.sock`.
pub fn default_socket_path() -> Option<PathBuf> {
    crate::data_dir().map(|dir| dir.join(SOCKET_FILE_NAME))
}

// ============================================================================
// IpcError
// ============================================================================

/// Reasons a request could not be read off a connection.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("リクエストの読み込みに失敗しました: {0}")]
    Read(#[from] io::Error),

    #[error("{}秒以内にリクエストが届きませんでした", REQUEST_DEADLINE.as_secs())]
    Timeout,

    #[error("リクエストが大きすぎます (上限 {MAX_REQUEST_SIZE} バイト)")]
    Oversized,

    #[error("リクエストが空のまま接続が閉じられました")]
    Empty,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Listener bound to the daemon socket. The socket file is removed on drop.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcServer {
    /// Binds `socket_path`, replacing a stale socket file left by a previous
    /// daemon and creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the bind fails.
    pub fn bind(socket_path: &Path) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("ソケット用ディレクトリを作成できません: {}", parent.display())
            })?;
        }

        match std::fs::remove_file(socket_path) {
            Ok(()) => debug!("removed stale socket {}", socket_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("古いソケットを削除できません: {}", socket_path.display())
                })
            }
        }

        let listener = UnixListener::bind(socket_path).with_context(|| {
            format!("ソケットをバインドできません: {}", socket_path.display())
        })?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Waits for the next client.
    ///
    /// # Errors
    ///
    /// Returns an error if `accept(2)` fails.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _) = self
            .listener
            .accept()
            .await
            .context("接続の受け付けに失敗しました")?;
        Ok(stream)
    }

    /// Reads until the client shuts down its write side, then parses the body.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError`] for transport problems and a JSON error for a
    /// body that is not a known request.
    pub async fn read_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut body = Vec::with_capacity(256);
        let cap = MAX_REQUEST_SIZE as u64 + 1;

        timeout(
            REQUEST_DEADLINE,
            (&mut *stream).take(cap).read_to_end(&mut body),
        )
        .await
        .map_err(|_| IpcError::Timeout)?
        .map_err(IpcError::Read)?;

        if body.is_empty() {
            return Err(IpcError::Empty.into());
        }
        if body.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::Oversized.into());
        }

        serde_json::from_slice(&body).context("リクエストを解釈できません")
    }

    /// Writes `response` as a single JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer has gone away.
    pub async fn write_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let body = serde_json::to_vec(response).context("レスポンスをシリアライズできません")?;
        stream
            .write_all(&body)
            .await
            .context("レスポンスを送信できません")?;
        stream.flush().await.context("レスポンスを送信できません")
    }

    /// Path of the bound socket file.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("ソケットを削除できませんでした: {}", e);
            }
        }
    }
}

/// Serves one connection: read a request, dispatch it, write the response.
///
/// Malformed requests get an error response rather than a dropped
/// connection.
///
/// # Errors
///
/// Returns an error only if the response cannot be written.
pub async fn serve_connection(mut stream: UnixStream, handler: &RequestHandler) -> Result<()> {
    let response = match IpcServer::read_request(&mut stream).await {
        Ok(request) => {
            debug!("request: {:?}", request);
            handler.handle(request).await
        }
        Err(e) => {
            warn!("不正なリクエストを受信しました: {:#}", e);
            IpcResponse::error(format!("不正なリクエストです: {}", e))
        }
    };

    IpcServer::write_response(&mut stream, &response).await
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
#[derive(Clone)]
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
}

impl RequestHandler {
    /// Creates a new request handler with the given timer engine.
    pub fn new(engine: Arc<Mutex<TimerEngine>>) -> Self {
        Self { engine }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Configure { params } => self.handle_configure(params).await,
            IpcRequest::Advance => self.handle_advance().await,
            IpcRequest::FlowEnter => self.handle_flow_enter().await,
            IpcRequest::FlowComplete => self.handle_flow_complete().await,
            IpcRequest::TaskDone => self.handle_task_done().await,
            IpcRequest::Focus { task } => self.handle_focus(task).await,
            IpcRequest::Stats => self.handle_stats().await,
            IpcRequest::ResetStats { confirm } => self.handle_reset_stats(confirm).await,
        }
    }

    /// Handles the start command.
    async fn handle_start(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let was_running = engine.state().running;

        if let Err(e) = engine.start() {
            return IpcResponse::error(e.to_string());
        }

        let state = engine.state();
        let message = if was_running {
            "タイマーは既に実行中です"
        } else if !state.running {
            "フェーズが終了しています。'focustimer advance' で次のフェーズへ進んでください"
        } else {
            "タイマーを開始しました"
        };
        IpcResponse::success(message, Some(engine.status_data()))
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let was_running = engine.state().running;

        engine.pause();

        let message = if was_running {
            "タイマーを一時停止しました"
        } else {
            "タイマーは実行されていません"
        };
        IpcResponse::success(message, Some(engine.status_data()))
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(engine.status_data()))
    }

    /// Handles the configure command.
    async fn handle_configure(&self, params: ConfigureParams) -> IpcResponse {
        if params.is_empty() {
            return IpcResponse::error("変更する設定を指定してください");
        }

        let mut engine = self.engine.lock().await;
        let before = engine.state().config;
        let requested = params.requested_config(before);
        let clamped = !requested.is_within_bounds();
        if clamped {
            warn!("範囲外の設定値を補正しました: {:?}", requested);
        }
        let config = requested.clamp();
        let options = params.apply_options(engine.state().options);

        engine.configure(config);
        engine.set_options(options);

        let mut message = if config == before {
            "設定を更新しました".to_string()
        } else {
            "設定を更新しました。サイクルをリセットしました".to_string()
        };
        if clamped {
            message.push_str(" (範囲外の値は補正されました)");
        }
        IpcResponse::success(message, Some(engine.status_data()))
    }

    /// Handles the advance command.
    async fn handle_advance(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        match engine.advance_phase() {
            Ok(()) => {
                let message = match engine.state().phase {
                    Phase::Work => "作業フェーズに切り替えました",
                    Phase::Break => "休憩フェーズに切り替えました",
                };
                IpcResponse::success(message, Some(engine.status_data()))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the flow enter command.
    async fn handle_flow_enter(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        match engine.enter_flow() {
            Ok(()) => IpcResponse::success("フローを開始しました", Some(engine.status_data())),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the flow complete command.
    async fn handle_flow_complete(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        match engine.complete_flow() {
            Ok(()) => IpcResponse::success(
                "フローを完了しました。休憩に入ります",
                Some(engine.status_data()),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the task done command.
    async fn handle_task_done(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.task_completed();

        let total = engine.counters().completed_tasks;
        IpcResponse::success(
            format!("タスクを完了しました (合計: {})", total),
            Some(ResponseData::from_counters(engine.counters())),
        )
    }

    /// Handles the focus command.
    async fn handle_focus(&self, task: Option<String>) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.set_focused_task(task);

        let message = match engine.focused_task() {
            Some(label) => format!("フォーカスタスクを設定しました: {}", label),
            None => "フォーカスタスクを解除しました".to_string(),
        };
        IpcResponse::success(message, Some(engine.status_data()))
    }

    /// Handles the stats command.
    async fn handle_stats(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(ResponseData::from_counters(engine.counters())))
    }

    /// Handles the reset stats command.
    async fn handle_reset_stats(&self, confirm: bool) -> IpcResponse {
        if !confirm {
            return IpcResponse::error("統計のリセットには確認が必要です (--yes)");
        }

        let mut engine = self.engine.lock().await;
        engine.reset_counters();
        IpcResponse::success(
            "統計をリセットしました",
            Some(ResponseData::from_counters(engine.counters())),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
