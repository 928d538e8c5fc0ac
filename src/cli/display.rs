//! Display utilities for the focus timer CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status display
//! - Session counters

use crate::types::{CounterSnapshot, IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message followed by the remaining time, if any.
    ///
    /// Used for start, pause, config, advance, flow and focus.
    pub fn show_result(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }

        if let Some(data) = &response.data {
            if let Some(phase) = &data.phase {
                println!("  フェーズ: {}", Self::phase_label(phase));
            }
            if let Some(remaining) = data.remaining_seconds {
                println!("  残り時間: {}", Self::format_clock(remaining));
            }
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("フォーカスタイマー ステータス");
        println!("─────────────────────────────");

        let Some(data) = &response.data else {
            println!("タイマーの状態を取得できませんでした");
            return;
        };

        for line in Self::status_lines(data) {
            println!("{}", line);
        }
    }

    /// Shows the session counters.
    pub fn show_stats(response: &IpcResponse) {
        let counters = response
            .data
            .as_ref()
            .and_then(|data| data.counters)
            .unwrap_or_default();

        if !response.message.is_empty() {
            println!("* {}", response.message);
        }
        for line in Self::stats_lines(&counters) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn status_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(phase) = &data.phase {
            let state = match data.running {
                Some(true) => "実行中",
                _ => "一時停止中",
            };
            lines.push(format!("フェーズ: {} ({})", Self::phase_label(phase), state));
        }
        if let Some(remaining) = data.remaining_seconds {
            lines.push(format!("残り時間: {}", Self::format_clock(remaining)));
        }
        if let (Some(current), Some(total)) = (data.current_session, data.session_count) {
            lines.push(format!("セッション: {}/{}", current, total));
        }
        if let Some(mode) = &data.mode {
            let label = match mode.as_str() {
                "manual" => "マニュアル",
                "automatic" => "自動",
                other => other,
            };
            lines.push(format!("モード: {}", label));
        }
        if data.dev_mode == Some(true) {
            lines.push("開発モード: 有効".to_string());
        }
        if data.flow_active == Some(true) {
            lines.push("フロー: 継続中".to_string());
        }
        if let Some(task) = &data.focused_task {
            lines.push(format!("タスク: {}", task));
        }
        if let Some(counters) = &data.counters {
            lines.push(format!(
                "完了: 作業 {} / 休憩 {} / タスク {}",
                counters.work_sessions, counters.break_sessions, counters.completed_tasks
            ));
        }

        lines
    }

    fn stats_lines(counters: &CounterSnapshot) -> Vec<String> {
        vec![
            format!("作業セッション: {}", counters.work_sessions),
            format!("休憩: {}", counters.break_sessions),
            format!("完了タスク: {}", counters.completed_tasks),
        ]
    }

    fn phase_label(phase: &str) -> &str {
        match phase {
            "work" => "作業",
            "break" => "休憩",
            other => other,
        }
    }

    /// Formats remaining seconds as `mm:ss`.
    fn format_clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Splits remaining seconds into (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        (total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
