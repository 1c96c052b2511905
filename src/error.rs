//! Failure reasons returned across the engine boundary.
//!
//! Every variant renders to the sentence handed back to the agent, so the
//! `Display` text doubles as the user-facing message.

use thiserror::Error;

use crate::io::ExportError;

#[derive(Debug, Error)]
pub enum CanvasError {
    // ---- validation --------------------------------------------------------
    #[error("Point ({x}, {y}) is outside the canvas (0-{width}, 0-{height}).")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown color '{0}'.")]
    UnknownColor(String),

    #[error("Invalid JSON: {0}")]
    InvalidCommand(String),

    // ---- state conflicts ---------------------------------------------------
    #[error("Layer '{0}' already exists.")]
    LayerExists(String),

    #[error("Layer '{0}' does not exist.")]
    LayerNotFound(String),

    #[error("Cannot remove '{0}' layer.")]
    ProtectedLayer(String),

    #[error("Can't change background layer visibility.")]
    BackgroundVisibility,

    #[error("Cannot switch to layer '{0}'.")]
    BackgroundNotActivatable(String),

    #[error("There is nothing to undo.")]
    NothingToUndo,

    // ---- boundary ----------------------------------------------------------
    #[error("Permission '{0}' is disabled in the configuration.")]
    PermissionDenied(String),

    // ---- encoding ----------------------------------------------------------
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CanvasError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
