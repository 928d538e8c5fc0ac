//! Sound playback for phase completion.
//!
//! ```text
//! ┌──────────────────┐  crossbeam   ┌──────────────────┐
//! │ RodioSoundPlayer │ ───────────▶ │   audio thread   │
//! │  (play: queue)   │              │ (OutputStream,   │
//! └──────────────────┘              │  Sink per sound) │
//!                                   └──────────────────┘
//! ```
//!
//! Playback never blocks the caller, and a missing audio device only
//! disables sound.

mod error;
mod player;
mod source;

pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer};
pub use source::{
    chime, SoundSource, CHIME_ATTACK, CHIME_DURATION, CHIME_FREQUENCY_HZ, CHIME_GAIN,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Something that can play a completion sound.
pub trait SoundPlayer: Send + Sync {
    /// Starts playback without waiting for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the sound could not be queued.
    fn play(&self, source: &SoundSource) -> Result<(), SoundError>;

    /// Whether an output device is usable right now.
    fn is_available(&self) -> bool {
        true
    }
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, source)
    }
}

/// Records requested sounds instead of playing them.
#[derive(Debug)]
pub struct MockSoundPlayer {
    played: Mutex<Vec<SoundSource>>,
    available: AtomicBool,
    fail: AtomicBool,
}

impl Default for MockSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            played: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes every later `play` return an error.
    pub fn set_should_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.played.lock().map(|played| played.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn play_calls(&self) -> Vec<SoundSource> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SoundError::Sink("mock failure".to_string()));
        }
        if let Ok(mut played) = self.played.lock() {
            played.push(source.clone());
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_sources_in_order() {
        let player = MockSoundPlayer::new();
        let bell = SoundSource::File {
            path: "/tmp/bell.wav".into(),
        };

        player.play(&SoundSource::Chime).unwrap();
        player.play(&bell).unwrap();

        assert_eq!(player.play_count(), 2);
        assert_eq!(player.play_calls(), vec![SoundSource::Chime, bell]);
    }

    #[test]
    fn test_mock_failure_records_nothing() {
        let player = MockSoundPlayer::new();
        player.set_should_fail(true);

        let result = player.play(&SoundSource::Chime);

        assert!(matches!(result, Err(SoundError::Sink(_))));
        assert_eq!(player.play_count(), 0);
    }

    #[test]
    fn test_mock_availability() {
        let player = MockSoundPlayer::new();
        assert!(player.is_available());

        player.set_available(false);
        assert!(!player.is_available());
    }
}
