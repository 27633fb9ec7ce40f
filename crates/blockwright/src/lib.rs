//! Blockwright - Geras-style rendering for visual block-programming editors.
//!
//! Block scenes are measured into rows of elements, drawn into SVG path
//! strings with a matching highlight path, and exported as a standalone SVG
//! document. Scenes are described in TOML.

pub mod canvas;
pub mod config;
pub mod render;
pub mod scene;
pub mod theme;

mod error;
mod export;

pub use blockwright_core::{block, color, field, geometry, workspace};

pub use error::BlockwrightError;

use log::{debug, info, trace};

use blockwright_core::workspace::Workspace;

use canvas::Canvas;
use config::AppConfig;
use export::Exporter;
use render::Renderer;

/// Builder for parsing and rendering block scenes.
///
/// # Examples
///
/// ```rust,no_run
/// use blockwright::{SceneBuilder, config::AppConfig};
///
/// let source = r#"
/// [[blocks]]
/// id = "hello"
/// type = "text_print"
/// previous = true
/// next = true
///
/// [[blocks.inputs]]
/// kind = "dummy"
/// fields = [{ kind = "label", text = "print" }]
/// "#;
///
/// let builder = SceneBuilder::new(AppConfig::default());
/// let workspace = builder.parse(source).expect("Failed to parse");
/// let svg = builder.render_svg(workspace).expect("Failed to render");
/// println!("{svg}");
/// ```
#[derive(Default)]
pub struct SceneBuilder {
    config: AppConfig,
}

impl SceneBuilder {
    /// Create a new scene builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Parse a TOML scene into a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwrightError::Parse`] for malformed TOML, unknown
    /// block references, or connections the blocks do not support.
    pub fn parse(&self, source: &str) -> Result<Workspace, BlockwrightError> {
        info!("Parsing scene");
        let workspace =
            scene::parse(source).map_err(|err| BlockwrightError::new_parse_error(err, source))?;
        debug!(blocks = workspace.len(), rtl = workspace.is_rtl(); "Scene parsed successfully");
        trace!(workspace:?; "Parsed workspace");
        Ok(workspace)
    }

    /// Initialize a renderer from the configuration and render every block
    /// of `workspace`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwrightError::Render`] if the theme has an invalid
    /// colour or a block fails to render.
    pub fn build_canvas(&self, workspace: Workspace) -> Result<Canvas, BlockwrightError> {
        let mut renderer = Renderer::new();
        renderer.init(self.config.theme(), self.config.renderer())?;
        let mut canvas = Canvas::new(workspace, renderer)?;
        canvas.render_all()?;
        Ok(canvas)
    }

    /// Render an already built canvas to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwrightError::Export`] if the style configuration is
    /// invalid or the canvas cannot be exported.
    pub fn export_svg(&self, canvas: &Canvas) -> Result<String, BlockwrightError> {
        let exporter = export::svg::SvgBuilder::new()
            .with_style(self.config.style())
            .build()?;
        let svg = exporter.export_canvas(canvas)?;
        info!(bytes = svg.len(); "SVG rendered successfully");
        Ok(svg)
    }

    /// Render every block of `workspace` and export the result as SVG.
    ///
    /// # Errors
    ///
    /// Returns any error from [`SceneBuilder::build_canvas`] or
    /// [`SceneBuilder::export_svg`].
    pub fn render_svg(&self, workspace: Workspace) -> Result<String, BlockwrightError> {
        info!(top_blocks = workspace.top_blocks().len(); "Rendering scene");
        let canvas = self.build_canvas(workspace)?;
        self.export_svg(&canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [[blocks]]
        id = "loop"
        type = "controls_repeat"
        previous = true
        next = true

        [[blocks.inputs]]
        kind = "dummy"
        fields = [{ kind = "label", text = "repeat" }]

        [[blocks.inputs]]
        kind = "statement"
        name = "DO"
        block = "body"

        [[blocks]]
        id = "body"
        type = "text_print"
        previous = true
        next = true

        [[blocks.inputs]]
        kind = "dummy"
        fields = [{ kind = "label", text = "print" }]
    "#;

    #[test]
    fn test_parse_and_render() {
        let builder = SceneBuilder::default();
        let workspace = builder.parse(SCENE).expect("parse");
        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.top_blocks().len(), 1);

        let svg = builder.render_svg(workspace).expect("render");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("data-type=\"controls_repeat\""));
        assert!(svg.contains("data-type=\"text_print\""));
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let builder = SceneBuilder::default();
        let err = builder
            .parse("[[blocks]]\nid = \"a\"\ntype = \"x\"\nnext_block = \"missing\"\n")
            .expect_err("undefined block");
        match err {
            BlockwrightError::Parse { err, src } => {
                assert!(src.contains("missing"));
                assert!(err.span().is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_theme_colour_is_a_render_error() {
        let config: AppConfig = toml::from_str(
            r#"
            [theme.block_styles.broken]
            colour_primary = "not a colour"
            "#,
        )
        .expect("config");
        let builder = SceneBuilder::new(config);
        let result = builder.build_canvas(Workspace::new());
        assert!(matches!(result, Err(BlockwrightError::Render(_))));
    }
}
