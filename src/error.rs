//! Error types for the minigame session.

use thiserror::Error;

/// Errors surfaced by session construction and the platform layer.
///
/// Only tuning errors are fatal. Asset and playback errors are logged and
/// the session carries on in a degraded mode.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An asset (cue audio, label geometry) could not be loaded.
    #[error("failed to load asset {asset}: {reason}")]
    AssetLoad { asset: String, reason: String },

    /// The browser refused playback before a user interaction.
    #[error("audio playback blocked: {0}")]
    AudioPlaybackBlocked(String),

    /// Tuning values violate a required relationship.
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    /// Tuning override JSON could not be parsed.
    #[error("tuning JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Build an asset failure from anything printable
    pub fn asset(asset: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }
}
