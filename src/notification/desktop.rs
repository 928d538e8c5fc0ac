//! Desktop notifications through the platform's notification command.
//!
//! Linux desktops expose `notify-send`; macOS can post a notification via
//! `osascript`. The command is located once when the daemon starts. If none
//! is found, desktop notifications stay off for the life of the process.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::content::NotificationContent;
use super::error::NotificationError;

/// Default timeout for the notification command in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// Application name passed to the notification server.
const APP_NAME: &str = "focustimer";

/// A notification command found on this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCommand {
    /// libnotify's `notify-send`
    NotifySend(PathBuf),
    /// macOS `osascript`
    Osascript(PathBuf),
}

impl NotifyCommand {
    /// Searches `PATH` for a supported notification command.
    #[must_use]
    pub fn detect() -> Option<Self> {
        let path = std::env::var_os("PATH")?;
        Self::detect_in(std::env::split_paths(&path))
    }

    /// Searches `dirs` in order for a supported notification command.
    pub fn detect_in(dirs: impl IntoIterator<Item = PathBuf>) -> Option<Self> {
        for dir in dirs {
            let notify_send = dir.join("notify-send");
            if notify_send.is_file() {
                return Some(Self::NotifySend(notify_send));
            }
            let osascript = dir.join("osascript");
            if osascript.is_file() {
                return Some(Self::Osascript(osascript));
            }
        }
        None
    }

    /// Returns the executable path.
    pub fn program(&self) -> &Path {
        match self {
            Self::NotifySend(path) | Self::Osascript(path) => path,
        }
    }

    /// Builds the argument list for `content`.
    pub fn args(&self, content: &NotificationContent) -> Vec<String> {
        match self {
            Self::NotifySend(_) => vec![
                "--app-name".to_string(),
                APP_NAME.to_string(),
                content.title.clone(),
                content.full_body(),
            ],
            Self::Osascript(_) => {
                let mut script = format!(
                    "display notification \"{}\" with title \"{}\"",
                    escape_applescript(&content.body),
                    escape_applescript(&content.title),
                );
                if let Some(subtitle) = &content.subtitle {
                    script.push_str(&format!(" subtitle \"{}\"", escape_applescript(subtitle)));
                }
                vec!["-e".to_string(), script]
            }
        }
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Sends notifications by running a [`NotifyCommand`].
///
/// Clones share one on/off switch, which a permanent failure turns off.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    command: NotifyCommand,
    timeout_seconds: u64,
    enabled: Arc<AtomicBool>,
}

impl DesktopNotifier {
    /// Creates a notifier for `command`.
    pub fn new(command: NotifyCommand) -> Self {
        Self {
            command,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Detects the notification command, logging when none is available.
    #[must_use]
    pub fn detect() -> Option<Self> {
        match NotifyCommand::detect() {
            Some(command) => {
                info!("通知コマンドを検出しました: {}", command.program().display());
                Some(Self::new(command))
            }
            None => {
                let err = NotificationError::CommandNotFound;
                warn!("{}。デスクトップ通知は無効です ({})", err, err.suggestion());
                None
            }
        }
    }

    /// Returns the command in use.
    pub fn command(&self) -> &NotifyCommand {
        &self.command
    }

    /// False once a permanent failure has been seen.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Runs the notification command and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be run, fails, or times out.
    pub async fn send(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        let mut command = Command::new(self.command.program());
        command.args(self.command.args(content)).kill_on_drop(true);

        let output = timeout(Duration::from_secs(self.timeout_seconds), command.output())
            .await
            .map_err(|_| NotificationError::Timeout(self.timeout_seconds))?
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => NotificationError::CommandNotFound,
                _ => NotificationError::SendFailed(e.to_string()),
            })?;

        if output.status.success() {
            debug!("notification sent: {}", content.title);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NotificationError::SendFailed(stderr.trim().to_string()))
        }
    }

    /// Sends in the background; failures are logged and dropped.
    ///
    /// A permanent failure turns the notifier off, after which this is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::NotAvailable` outside a tokio runtime.
    pub fn spawn_send(&self, content: NotificationContent) -> Result<(), NotificationError> {
        if !self.is_enabled() {
            debug!("desktop notifications off, skipping: {}", content.title);
            return Ok(());
        }
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| NotificationError::NotAvailable)?;
        let notifier = self.clone();

        handle.spawn(async move {
            match notifier.send(&content).await {
                Ok(()) => {}
                Err(e) if e.is_permanent() => {
                    notifier.enabled.store(false, Ordering::Relaxed);
                    warn!("{}。デスクトップ通知を無効にします ({})", e, e.suggestion());
                }
                Err(e) => warn!("デスクトップ通知に失敗しました: {}", e),
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::content::completion_content;
    use crate::types::Phase;

    mod notify_command_tests {
        use super::*;

        #[test]
        fn test_detect_in_empty_dir() {
            let dir = tempfile::tempdir().unwrap();
            assert!(NotifyCommand::detect_in([dir.path().to_path_buf()]).is_none());
        }

        #[test]
        fn test_detect_in_prefers_first_dir() {
            let first = tempfile::tempdir().unwrap();
            let second = tempfile::tempdir().unwrap();
            std::fs::write(first.path().join("osascript"), "").unwrap();
            std::fs::write(second.path().join("notify-send"), "").unwrap();

            let command = NotifyCommand::detect_in([
                first.path().to_path_buf(),
                second.path().to_path_buf(),
            ])
            .unwrap();

            assert_eq!(
                command,
                NotifyCommand::Osascript(first.path().join("osascript"))
            );
        }

        #[test]
        fn test_notify_send_args() {
            let command = NotifyCommand::NotifySend(PathBuf::from("/usr/bin/notify-send"));
            let content = completion_content(Phase::Work, Some("設計"));

            let args = command.args(&content);

            assert_eq!(args[0], "--app-name");
            assert_eq!(args[2], "Focus Session Complete!");
            assert!(args[3].starts_with("設計"));
        }

        #[test]
        fn test_osascript_args_escape_quotes() {
            let command = NotifyCommand::Osascript(PathBuf::from("/usr/bin/osascript"));
            let content = completion_content(Phase::Break, Some("say \"hi\""));

            let args = command.args(&content);

            assert_eq!(args[0], "-e");
            assert!(args[1].contains("with title \"Break Complete!\""));
            assert!(args[1].contains("subtitle \"say \\\"hi\\\"\""));
        }
    }

    mod desktop_notifier_tests {
        use super::*;

        #[tokio::test]
        async fn test_send_missing_program_fails() {
            let notifier = DesktopNotifier::new(NotifyCommand::NotifySend(PathBuf::from(
                "/nonexistent/notify-send",
            )));
            let content = completion_content(Phase::Work, None);

            let result = notifier.send(&content).await;

            assert!(matches!(result, Err(NotificationError::CommandNotFound)));
        }

        #[tokio::test]
        async fn test_vanished_command_turns_notifier_off() {
            let notifier = DesktopNotifier::new(NotifyCommand::NotifySend(PathBuf::from(
                "/nonexistent/notify-send",
            )));
            let observer = notifier.clone();

            notifier
                .spawn_send(completion_content(Phase::Work, None))
                .unwrap();
            for _ in 0..200 {
                if !observer.is_enabled() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            assert!(!observer.is_enabled());
            assert!(notifier
                .spawn_send(completion_content(Phase::Break, None))
                .is_ok());
        }

        #[tokio::test]
        async fn test_failing_command_stays_enabled() {
            // `false` ignores its arguments and exits 1.
            let notifier = DesktopNotifier::new(NotifyCommand::NotifySend(PathBuf::from("false")));

            let result = notifier
                .send(&completion_content(Phase::Work, None))
                .await;

            assert!(matches!(result, Err(NotificationError::SendFailed(_))));
            assert!(!result.unwrap_err().is_permanent());
            assert!(notifier.is_enabled());
        }

        #[test]
        fn test_spawn_send_without_runtime() {
            let notifier = DesktopNotifier::new(NotifyCommand::NotifySend(PathBuf::from(
                "/nonexistent/notify-send",
            )));

            let result = notifier.spawn_send(completion_content(Phase::Work, None));

            assert!(matches!(result, Err(NotificationError::NotAvailable)));
        }
    }
}
