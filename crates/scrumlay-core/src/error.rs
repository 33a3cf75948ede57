//! Error types for scrumlay-core
//!
//! Absence is the dominant signal in this crate: a missing title element,
//! header slot, or overlay container makes the affected operation fall back
//! to defaults and skip its writes. The variants here cover the few places
//! where a failure is worth reporting instead of tolerating.

use thiserror::Error;

/// Core error type for overlay operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Settings
    // ===================
    #[error("Failed to parse settings: {message}")]
    SettingsParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Host integration
    // ===================
    /// The one loud diagnostic: the host swallowed or rewrote the key code
    /// of a synthesized commit keystroke. Every other host incompatibility
    /// degrades silently; this one means the save handler never ran.
    #[error("Synthesized keydown reported key code {reported}, expected {requested}")]
    KeyCodeMismatch { requested: u32, reported: u32 },

    /// The card-detail title input was not found when a picker value was
    /// applied. Unlike card-level absence this is user-invoked, so it is
    /// surfaced rather than swallowed.
    #[error("Card detail title input not found")]
    TitleInputNotFound,
}
