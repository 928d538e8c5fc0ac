//! Notification system error types.

use thiserror::Error;

/// Errors that can occur when delivering a desktop notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No notification command was found on this system.
    #[error("通知コマンドが見つかりません")]
    CommandNotFound,

    /// The notification command exited unsuccessfully.
    #[error("通知の送信に失敗しました: {0}")]
    SendFailed(String),

    /// The notification command did not finish in time.
    #[error("通知の送信がタイムアウトしました ({0}秒)")]
    Timeout(u64),

    /// Invalid input provided to the notification system.
    #[error("無効な入力: {0}")]
    InvalidInput(String),

    /// No async runtime was available to run the command.
    #[error("通知システムが利用できません")]
    NotAvailable,
}

impl NotificationError {
    /// Returns true if notifications can never work on this system.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::CommandNotFound | Self::NotAvailable)
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::CommandNotFound => "notify-send (libnotify) をインストールしてください",
            Self::SendFailed(_) => "通知デーモンが起動しているか確認してください",
            Self::Timeout(_) => "通知デーモンの応答を確認してください",
            Self::InvalidInput(_) => "入力値を確認してください",
            Self::NotAvailable => "デーモンを再起動してください",
        }
    }
}
