//! Timer command error types.
//!
//! The core has no recoverable runtime failures: configuration is clamped
//! before it arrives and stale ticks are filtered structurally. The only
//! errors are commands that are not legal in the current state.

use thiserror::Error;

/// Commands rejected by the session state machine or the Flow overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `advance` was issued while phases advance automatically.
    #[error("フェーズの手動切り替えはマニュアルモードでのみ使用できます")]
    AdvanceRequiresManualMode,

    /// Flow was requested outside a work phase.
    #[error("フローは作業フェーズ中のみ開始できます")]
    FlowRequiresWorkPhase,

    /// Flow was entered twice.
    #[error("フローは既に開始されています")]
    FlowAlreadyActive,

    /// Flow completion was requested without an active Flow session.
    #[error("フローは開始されていません")]
    FlowNotActive,

    /// The command conflicts with an active Flow session.
    #[error("フロー中はこの操作を実行できません")]
    FlowActive,
}

impl TimerError {
    /// Returns true if the error concerns the Flow overlay.
    #[must_use]
    pub fn is_flow_error(&self) -> bool {
        !matches!(self, Self::AdvanceRequiresManualMode)
    }
}
