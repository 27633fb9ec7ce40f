//! Exporters for rendered canvases.
//!
//! An [`Exporter`] turns the rendered state of a [`Canvas`] into an output
//! document. [`svg::Svg`] is the only exporter so far.

pub mod svg;

use thiserror::Error;

use blockwright_core::workspace::WorkspaceError;

use crate::{canvas::Canvas, render::RenderError};

/// Errors raised while exporting a canvas.
#[derive(Debug, Error)]
pub enum Error {
    #[error("render state error: {0}")]
    Render(#[from] RenderError),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("style error: {0}")]
    Style(String),
}

/// Something that can write out a rendered canvas.
pub trait Exporter {
    /// Produces the exported document for every rendered block.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the canvas state is inconsistent or the
    /// output cannot be produced.
    fn export_canvas(&self, canvas: &Canvas) -> Result<String, Error>;
}
