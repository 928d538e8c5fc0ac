//! Binary-level tests for the `focustimer` command.

use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn focustimer() -> Command {
    let mut cmd = Command::cargo_bin("focustimer").unwrap();
    cmd.env_remove("FOCUSTIMER_SOCKET").env_remove("RUST_LOG");
    cmd
}

/// A daemon process that is killed when dropped.
struct DaemonProcess {
    child: Child,
    socket_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl DaemonProcess {
    fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("cli_test.sock");

        let child = StdCommand::new(assert_cmd::cargo::cargo_bin("focustimer"))
            .args(["daemon", "--no-persist", "--no-audio", "--no-desktop-notify"])
            .arg("--socket")
            .arg(&socket_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        wait_for_socket(&socket_path);
        Self {
            child,
            socket_path,
            _dir: dir,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = focustimer();
        cmd.args(args).arg("--socket").arg(&self.socket_path);
        cmd
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_for_socket(path: &Path) {
    for _ in 0..200 {
        if path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(25));
    }
    panic!("daemon socket did not appear: {}", path.display());
}

// ============================================================================
// Offline Commands
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    focustimer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("focustimer"))
        .stdout(predicate::str::contains("advance"))
        .stdout(predicate::str::contains("reset-stats"));
}

#[test]
fn test_version() {
    focustimer()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_completions_bash() {
    focustimer()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("focustimer"));
}

#[test]
fn test_reset_stats_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    focustimer()
        .arg("reset-stats")
        .arg("--socket")
        .arg(dir.path().join("unused.sock"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_config_rejects_out_of_range_work() {
    focustimer()
        .args(["config", "--work", "90"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("90"));
}

#[test]
fn test_focus_requires_label_or_clear() {
    focustimer().arg("focus").assert().failure();
}

#[test]
fn test_status_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    focustimer()
        .arg("status")
        .arg("--socket")
        .arg(dir.path().join("missing.sock"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("focustimer daemon"));
}

// ============================================================================
// Against a Running Daemon
// ============================================================================

#[test]
fn test_start_status_pause() {
    let daemon = DaemonProcess::spawn();

    daemon
        .command(&["start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("タイマーを開始しました"));

    daemon
        .command(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("作業 (実行中)"))
        .stdout(predicate::str::contains("セッション: 1/4"));

    daemon
        .command(&["pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("一時停止"));
}

#[test]
fn test_manual_mode_workflow() {
    let daemon = DaemonProcess::spawn();

    daemon
        .command(&["start-break"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("マニュアルモード"));

    daemon
        .command(&["config", "--manual", "true"])
        .assert()
        .success();

    daemon
        .command(&["start-break"])
        .assert()
        .success()
        .stdout(predicate::str::contains("休憩フェーズに切り替えました"));

    daemon
        .command(&["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("作業セッション: 1"));
}

#[test]
fn test_focus_and_task_done() {
    let daemon = DaemonProcess::spawn();

    daemon
        .command(&["focus", "原稿"])
        .assert()
        .success()
        .stdout(predicate::str::contains("原稿"));

    daemon
        .command(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("タスク: 原稿"));

    daemon
        .command(&["task", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("完了タスク: 1"));

    daemon
        .command(&["reset-stats", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("完了タスク: 0"));
}
