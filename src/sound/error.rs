//! Sound system error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from chime playback and custom sound files.
#[derive(Debug, Error)]
pub enum SoundError {
    /// No output device could be opened.
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// The audio thread could not start or has exited.
    #[error("オーディオスレッドが停止しています: {0}")]
    AudioThread(String),

    /// A sink could not be attached to the output stream.
    #[error("再生を開始できません: {0}")]
    Sink(String),

    /// The configured sound file does not exist.
    #[error("サウンドファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The configured sound file has an extension rodio cannot decode.
    #[error("対応していないサウンド形式です: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The sound file exists but could not be decoded.
    #[error("サウンドファイルのデコードに失敗しました: {} ({reason})", .path.display())]
    Decode { path: PathBuf, reason: String },
}

impl SoundError {
    /// Returns true if the error concerns the custom sound file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::UnsupportedFormat(_) | Self::Decode { .. }
        )
    }

    /// Returns true if playing the synthesized chime instead is worthwhile.
    #[must_use]
    pub fn should_fallback_to_chime(&self) -> bool {
        self.is_file_error()
    }

    /// Returns a hint for the log line.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "--no-audio で音声を無効にできます",
            Self::AudioThread(_) | Self::Sink(_) => "デーモンを再起動してください",
            Self::FileNotFound(_) | Self::Decode { .. } => "標準のチャイム音で再生します",
            Self::UnsupportedFormat(_) => "wav / mp3 / flac / ogg / aiff を指定してください",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = SoundError::FileNotFound(PathBuf::from("/sounds/bell.wav"));
        assert!(err.to_string().contains("/sounds/bell.wav"));

        let err = SoundError::Decode {
            path: PathBuf::from("/sounds/bell.ogg"),
            reason: "truncated".to_string(),
        };
        assert!(err.to_string().contains("/sounds/bell.ogg"));
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_file_errors_fall_back_to_chime() {
        assert!(SoundError::FileNotFound("x".into()).should_fallback_to_chime());
        assert!(SoundError::UnsupportedFormat("x.txt".into()).should_fallback_to_chime());
        assert!(!SoundError::DeviceNotAvailable("x".into()).should_fallback_to_chime());
        assert!(!SoundError::AudioThread("x".into()).should_fallback_to_chime());
    }

    #[test]
    fn test_suggestion() {
        assert!(SoundError::DeviceNotAvailable("x".into())
            .suggestion()
            .contains("--no-audio"));
        assert!(SoundError::UnsupportedFormat("x".into())
            .suggestion()
            .contains("wav"));
    }
}
