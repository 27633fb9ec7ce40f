//! CLI logic for the Blockwright scene renderer.
//!
//! Reads a TOML scene, renders every block with the Geras renderer and
//! writes the result as an SVG file.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use blockwright::{BlockwrightError, SceneBuilder};

/// Run the Blockwright CLI application
///
/// # Errors
///
/// Returns `BlockwrightError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Scene parsing errors
/// - Rendering errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), BlockwrightError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing scene"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = SceneBuilder::new(app_config);
    let workspace = builder.parse(&source)?;
    let svg = builder.render_svg(workspace)?;

    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
