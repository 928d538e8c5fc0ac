//! Counter store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`CounterStore`](super::CounterStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the counter file failed.
    #[error("カウンターファイルの読み込みに失敗しました ({path}): {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Writing the counter file failed.
    #[error("カウンターファイルの書き込みに失敗しました ({path}): {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The counter file is not valid JSON.
    #[error("カウンターファイルの形式が不正です ({path}): {source}")]
    Corrupt {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The home directory could not be determined.
    #[error("ホームディレクトリが見つかりません")]
    NoHomeDirectory,
}

impl StoreError {
    /// Returns true if the stored data itself is unreadable.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
