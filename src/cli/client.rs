//! Client side of the daemon socket.
//!
//! Every command opens a fresh connection, writes one request, half-closes
//! and reads the single response. A daemon that is still starting gets a few
//! connection attempts before the command gives up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{ConfigureParams, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for each of the write and read halves of an exchange.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status payloads are small; anything larger is not from our daemon.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

const CONNECT_ATTEMPTS: u32 = 3;

/// Backoff step; attempt `n` waits `n` steps.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client for the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let socket_path = default_socket_path()
            .context("ホームディレクトリが見つかりません。--socket でソケットを指定してください")?;
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a client for a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: CONNECT_TIMEOUT,
        }
    }

    /// Creates a client for `socket_path`, or the default path when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path was given and the home directory cannot be
    /// determined.
    pub fn from_option(socket_path: Option<PathBuf>) -> Result<Self> {
        match socket_path {
            Some(path) => Ok(Self::with_socket_path(path)),
            None => Self::new(),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn start(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Start).await
    }

    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Pause).await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Status).await
    }

    /// Sends new durations and/or mode flags.
    pub async fn configure(&self, params: ConfigureParams) -> Result<IpcResponse> {
        self.send(&IpcRequest::Configure { params }).await
    }

    pub async fn advance(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Advance).await
    }

    pub async fn flow_enter(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::FlowEnter).await
    }

    pub async fn flow_complete(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::FlowComplete).await
    }

    pub async fn task_done(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::TaskDone).await
    }

    /// Sets the focused task, or clears it with `None`.
    pub async fn focus(&self, task: Option<String>) -> Result<IpcResponse> {
        self.send(&IpcRequest::Focus { task }).await
    }

    pub async fn stats(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Stats).await
    }

    /// Resets all counters. `confirm` must be true for the daemon to act.
    pub async fn reset_stats(&self, confirm: bool) -> Result<IpcResponse> {
        self.send(&IpcRequest::ResetStats { confirm }).await
    }

    /// Sends a request and turns error responses into errors.
    async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let stream = self.connect_with_retry().await?;
        let response = self.exchange(stream, request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    /// Connects, retrying while the daemon may still be starting up.
    ///
    /// Only the connection is retried: once a request is written it is never
    /// sent again, so commands like `task done` cannot be applied twice.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    tracing::warn!("接続失敗 (試行 {}/{}): {:#}", attempt, CONNECT_ATTEMPTS, e);
                    tokio::time::sleep(BACKOFF_STEP * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'focustimer daemon' を起動してください")
    }

    /// Writes one request and reads the response until the daemon closes.
    async fn exchange(&self, mut stream: UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let body = serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;

        timeout(EXCHANGE_TIMEOUT, stream.write_all(&body))
            .await
            .context("書き込みがタイムアウトしました")?
            .context("リクエストの送信に失敗しました")?;

        // EOF marks the end of the request for the daemon.
        stream
            .shutdown()
            .await
            .context("リクエストの送信に失敗しました")?;

        let mut buffer = Vec::new();
        let mut limited = (&mut stream).take(MAX_RESPONSE_SIZE as u64 + 1);
        timeout(EXCHANGE_TIMEOUT, limited.read_to_end(&mut buffer))
            .await
            .context("読み込みがタイムアウトしました")?
            .context("レスポンスの受信に失敗しました")?;

        if buffer.is_empty() {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }
        if buffer.len() > MAX_RESPONSE_SIZE {
            anyhow::bail!("Daemonからの応答が大きすぎます");
        }

        serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")
    }
}

// ============================================================================
// Tests
// ============================================================================
