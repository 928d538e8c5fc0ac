//! Phase completion notifications.
//!
//! The engine reports completions through the [`Notifier`] trait and never
//! waits on the result. [`NotificationDispatcher`] is the production
//! implementation: it plays the chime when sound is enabled and posts a
//! desktop notification when a notification command was found at startup.

mod content;
mod desktop;
pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

pub use self::content::{
    completion_content, validate_task_name, NotificationContent, NotificationContentBuilder,
    BREAK_COMPLETE_TITLE, WORK_COMPLETE_TITLE,
};
pub use self::desktop::{DesktopNotifier, NotifyCommand};
pub use self::error::NotificationError;

use crate::sound::{SoundPlayer, SoundSource};
use crate::types::Phase;

// ============================================================================
// CompletionNotice
// ============================================================================

/// What the engine knows when a phase completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    /// The phase that ran out
    pub phase: Phase,
    /// Focused task label, if set
    pub focused_task: Option<String>,
    /// Whether the chime should play
    pub sound_enabled: bool,
}

// ============================================================================
// Notifier
// ============================================================================

/// Fire-and-forget completion notifications.
pub trait Notifier: Send {
    /// Reports a completed phase. Must not block; failures are logged by the
    /// implementation and never surface to the caller.
    fn notify(&self, notice: &CompletionNotice);
}

// ============================================================================
// NotificationDispatcher
// ============================================================================

/// Chime plus desktop notification.
pub struct NotificationDispatcher {
    sound: Option<Box<dyn SoundPlayer>>,
    sound_source: SoundSource,
    desktop: Option<DesktopNotifier>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher from optional channels.
    pub fn new(sound: Option<Box<dyn SoundPlayer>>, desktop: Option<DesktopNotifier>) -> Self {
        Self {
            sound,
            sound_source: SoundSource::Chime,
            desktop,
        }
    }

    /// Uses `source` instead of the synthesized chime.
    #[must_use]
    pub fn with_sound_source(mut self, source: SoundSource) -> Self {
        self.sound_source = source;
        self
    }

    /// Returns true if a sound player is attached.
    pub fn has_sound(&self) -> bool {
        self.sound.is_some()
    }

    /// Returns true if desktop notifications are enabled.
    pub fn has_desktop(&self) -> bool {
        self.desktop.is_some()
    }

    fn play_chime(&self) {
        let Some(player) = &self.sound else {
            debug!("no sound player, skipping chime");
            return;
        };
        if !player.is_available() {
            return;
        }
        if let Err(e) = player.play(&self.sound_source) {
            warn!("チャイムの再生に失敗しました: {} ({})", e, e.suggestion());
        }
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, notice: &CompletionNotice) {
        if notice.sound_enabled {
            self.play_chime();
        }

        if let Some(desktop) = &self.desktop {
            let content = completion_content(notice.phase, notice.focused_task.as_deref());
            if let Err(e) = desktop.spawn_send(content) {
                warn!("デスクトップ通知に失敗しました: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("sound", &self.sound.is_some())
            .field("sound_source", &self.sound_source)
            .field("desktop", &self.desktop)
            .finish()
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Mock notifier for testing.
#[derive(Debug, Default)]
pub struct MockNotifier {
    notices: Mutex<Vec<CompletionNotice>>,
    muted: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops recording notices.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    #[must_use]
    pub fn notices(&self) -> Vec<CompletionNotice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.notices.lock().map(|notices| notices.len()).unwrap_or(0)
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, notice: &CompletionNotice) {
        if self.muted.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}

impl<T: Notifier + Sync> Notifier for std::sync::Arc<T> {
    fn notify(&self, notice: &CompletionNotice) {
        (**self).notify(notice);
    }
}
