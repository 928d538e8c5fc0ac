//! Sound sources for the completion chime.
//!
//! The default chime is synthesized rather than loaded from disk: a C5 sine
//! tone with a short attack and a fade-out over one second. A user sound
//! file can be configured in its place.

use std::path::{Path, PathBuf};

use rodio::source::{SineWave, Source};
use tokio::time::Duration;

use super::error::SoundError;

// ============================================================================
// Chime Parameters
// ============================================================================

/// Chime pitch (C5)
pub const CHIME_FREQUENCY_HZ: f32 = 523.25;

/// Peak gain of the chime
pub const CHIME_GAIN: f32 = 0.3;

/// Time to reach peak gain
pub const CHIME_ATTACK: Duration = Duration::from_millis(100);

/// Total chime length
pub const CHIME_DURATION: Duration = Duration::from_secs(1);

/// Audio file extensions accepted for a custom sound.
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "aiff"];

// ============================================================================
// SoundSource
// ============================================================================

/// What to play when a phase completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SoundSource {
    /// The synthesized chime
    #[default]
    Chime,
    /// A sound file on disk
    File {
        /// Path to the file
        path: PathBuf,
    },
}

impl SoundSource {
    /// Creates a file source after checking that the file looks playable.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the path does not exist and
    /// `SoundError::UnsupportedFormat` for unsupported extensions.
    pub fn file(path: impl Into<PathBuf>) -> Result<Self, SoundError> {
        let path = path.into();
        validate_sound_file(&path)?;
        Ok(Self::File { path })
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Chime => "chime".to_string(),
            Self::File { path } => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    /// Returns true for the synthesized chime.
    #[must_use]
    pub fn is_chime(&self) -> bool {
        matches!(self, Self::Chime)
    }

    /// Returns the file path for file sources.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path } => Some(path),
            Self::Chime => None,
        }
    }
}

fn validate_sound_file(path: &Path) -> Result<(), SoundError> {
    if !path.is_file() {
        return Err(SoundError::FileNotFound(path.to_path_buf()));
    }

    let supported = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));

    if supported {
        Ok(())
    } else {
        Err(SoundError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Builds the completion chime.
pub fn chime() -> impl Source<Item = f32> + Send + 'static {
    let mut tone = SineWave::new(CHIME_FREQUENCY_HZ).take_duration(CHIME_DURATION);
    tone.set_filter_fadeout();
    tone.fade_in(CHIME_ATTACK).amplify(CHIME_GAIN)
}
