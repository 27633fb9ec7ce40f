//! The Geras block renderer.
//!
//! Rendering a block is a two-pass pipeline. The measure pass builds a
//! [`RenderInfo`](info::RenderInfo): rows of [`Measurable`](measurables::Measurable)
//! elements, spaced, aligned and finally given absolute positions. The draw
//! pass walks that description once to produce the block outline, the
//! inline-input cut-outs, the cosmetic highlight path and every connection
//! offset. Nothing is written back to the block until both passes succeed.
//!
//! # Pipeline
//!
//! ```text
//! Block + Workspace
//!     ↓ RenderInfo::measure   (rows, spacing, alignment, finalize)
//! RenderInfo
//!     ↓ Drawer::draw          (outline, inline path, highlight, offsets)
//! DrawOutput
//!     ↓ Renderer::commit      (PathObject, connections, block size)
//! Rendered block
//! ```
//!
//! # Modules
//!
//! - [`constants`] - geometric constants and derived path fragments
//! - [`highlight_constants`] - path fragments for the highlight pass
//! - [`measurables`] - the visual atoms of a block
//! - [`rows`] - horizontal bands of measurables
//! - [`info`] - the measure pass
//! - [`drawer`] and [`highlighter`] - the draw pass
//! - [`path_object`] - the SVG path state of one block
//! - [`renderer`] - the facade tying it together

pub mod constants;
pub mod drawer;
pub mod highlight_constants;
pub mod highlighter;
pub mod info;
pub mod measurables;
pub mod path_object;
pub mod renderer;
pub mod rows;

use thiserror::Error;

use blockwright_core::{block::BlockId, workspace::WorkspaceError};

pub use constants::{ConstantOverrides, ConstantProvider};
pub use drawer::{DrawOutput, FieldPlacement, IconPlacement};
pub use info::RenderInfo;
pub use path_object::PathObject;
pub use renderer::Renderer;

/// Errors raised while measuring, drawing or committing a block.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Constants were requested from a renderer that has not been
    /// initialized.
    #[error("renderer constants requested before init")]
    NotInitialized,

    /// A row that must end in an input has none.
    #[error("row {row} of block {block} has no input")]
    MissingInput { block: BlockId, row: usize },

    /// A theme or block colour failed to parse.
    #[error("invalid block colour: {0}")]
    InvalidColour(String),

    /// Walking up the parent links revisited a block.
    #[error("block hierarchy above {0} contains a cycle")]
    CyclicHierarchy(BlockId),

    /// A view was requested for a block that was never rendered.
    #[error("block {0} has not been rendered")]
    NotRendered(BlockId),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
