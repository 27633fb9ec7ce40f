//! Error types for Blockwright operations.
//!
//! This module provides the main error type [`BlockwrightError`] which wraps
//! the error conditions of every stage: reading a scene, building the
//! workspace, rendering, and exporting.

use std::io;

use thiserror::Error;

use blockwright_core::workspace::WorkspaceError;

use crate::{render::RenderError, scene::SceneError};

/// The main error type for Blockwright operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the scene source next to the error so the span
/// it carries can be shown against it.
#[derive(Debug, Error)]
pub enum BlockwrightError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: SceneError, src: String },

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for BlockwrightError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl BlockwrightError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: SceneError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
