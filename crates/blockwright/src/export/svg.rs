//! SVG export of a rendered canvas.
//!
//! The document holds the shared definitions (emboss filter and disabled
//! pattern), the renderer stylesheet, an optional background, and one group
//! per top block. Child blocks are nested inside their parent's group, so
//! each group is translated by the block's position relative to its parent.

use ::svg::{
    Document,
    node::element::{self as svg_element, Group},
};
use log::{debug, info};

use blockwright_core::{
    block::BlockId,
    color::Color,
    field::FieldMetrics,
    geometry::{Bounds, Point, Size},
    workspace::Workspace,
};

use super::{Error, Exporter};
use crate::{canvas::Canvas, config::StyleConfig};

/// Class on the root element; the stylesheet is scoped to it.
pub const ROOT_CLASS: &str = "blockwright-renderer";

/// Space left around the blocks.
const MARGIN: f64 = 10.0;

/// Builder for [`Svg`] exporters.
#[derive(Debug, Default)]
pub struct SvgBuilder {
    style: StyleConfig,
}

impl SvgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: &StyleConfig) -> Self {
        self.style = style.clone();
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::Style`] if the background color does not parse.
    pub fn build(self) -> Result<Svg, Error> {
        let background = self.style.background_color().map_err(Error::Style)?;
        Ok(Svg { background })
    }
}

/// Exports a canvas as an SVG document.
#[derive(Debug, Default)]
pub struct Svg {
    background: Option<Color>,
}

impl Svg {
    /// Builds the document for every rendered top block.
    ///
    /// # Errors
    ///
    /// Returns an error if the renderer is not initialized or a block in
    /// the workspace is missing.
    pub fn document(&self, canvas: &Canvas) -> Result<Document, Error> {
        let constants = canvas.renderer().constants()?;
        let workspace = canvas.workspace();
        let metrics = constants.field_metrics();

        let mut blocks = Group::new().set("class", "blocklyBlockCanvas");
        let mut bounds: Option<Bounds> = None;
        let mut exported = 0;
        for top in workspace.top_blocks() {
            if canvas.view(top).is_none() {
                continue;
            }
            blocks = blocks.add(self.block_group(canvas, &metrics, top)?);
            let stack = stack_bounds(workspace, top, constants.notch_height)?;
            bounds = Some(bounds.map_or(stack, |all| all.merge(&stack)));
            exported += 1;
        }
        let bounds = bounds.unwrap_or_default().expand(MARGIN);
        debug!(top_blocks = exported, width = bounds.width(), height = bounds.height(); "Exporting blocks");

        let stylesheet = constants.css(&format!(".{ROOT_CLASS}")).join("\n");
        let mut document = Document::new()
            .set("class", format!("blocklySvg {ROOT_CLASS}"))
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .set("width", bounds.width())
            .set("height", bounds.height())
            .add(constants.create_defs())
            .add(svg_element::Style::new(stylesheet));

        if let Some(background) = &self.background {
            document = document.add(
                svg_element::Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("fill", background),
            );
        }
        Ok(document.add(blocks))
    }

    fn block_group(
        &self,
        canvas: &Canvas,
        metrics: &FieldMetrics,
        id: BlockId,
    ) -> Result<Group, Error> {
        let workspace = canvas.workspace();
        let block = workspace.block(id)?;
        let Some(view) = canvas.view(id) else {
            return Ok(Group::new());
        };

        let position = block.relative_position();
        let mut group = view
            .path()
            .to_svg()
            .set("transform", format!("translate({},{})", position.x(), position.y()))
            .set("data-type", block.type_name());

        for placement in view.field_placements() {
            let field = block
                .inputs()
                .get(placement.input)
                .and_then(|input| input.fields().get(placement.field));
            let Some(field) = field else {
                continue;
            };
            let mut field_group = Group::new().set("transform", placement.transform());
            if placement.hidden {
                field_group = field_group.set("display", "none");
            }
            group = group.add(field_group.add(field.to_svg(metrics)));
        }

        for placement in view.icon_placements().iter().filter(|icon| !icon.hidden) {
            let Some(icon) = block.icons().get(placement.index) else {
                continue;
            };
            group = group.add(
                svg_element::Rectangle::new()
                    .set("class", "blocklyIconShape")
                    .set("x", placement.offset.x())
                    .set("y", placement.offset.y())
                    .set("width", icon.size().width())
                    .set("height", icon.size().height())
                    .set("rx", 4),
            );
        }

        for child in workspace.children(id)? {
            if workspace.is_visible(child)? {
                group = group.add(self.block_group(canvas, metrics, child)?);
            }
        }
        Ok(group)
    }
}

impl Exporter for Svg {
    fn export_canvas(&self, canvas: &Canvas) -> Result<String, Error> {
        let document = self.document(canvas)?;
        info!("SVG document built");
        Ok(document.to_string())
    }
}

/// Area covered by a top block and everything attached below it. RTL
/// blocks extend to the left of their origin.
fn stack_bounds(workspace: &Workspace, id: BlockId, notch_height: f64) -> Result<Bounds, Error> {
    let origin = workspace.surface_xy(id)?;
    let (height, width) = workspace.height_width(id, notch_height)?;
    let left = if workspace.is_rtl() {
        origin.x() - width
    } else {
        origin.x()
    };
    Ok(Bounds::new_from_top_left(
        Point::new(left, origin.y()),
        Size::new(width, height),
    ))
}

#[cfg(test)]
mod tests {
    use blockwright_core::{
        block::{Block, Input},
        field::LabelField,
    };

    use super::*;
    use crate::{
        render::{ConstantOverrides, Renderer},
        theme::Theme,
    };

    fn rendered(workspace: Workspace) -> Canvas {
        let mut renderer = Renderer::new();
        renderer
            .init(&Theme::classic(), &ConstantOverrides::default())
            .expect("init");
        let mut canvas = Canvas::new(workspace, renderer).expect("canvas");
        canvas.render_all().expect("render");
        canvas
    }

    #[test]
    fn test_document_structure() {
        let mut workspace = Workspace::new();
        workspace.add_block(
            Block::new("say")
                .with_position(20.0, 30.0)
                .with_previous_statement()
                .with_input(Input::dummy("").with_field(LabelField::new("say"))),
        );
        let canvas = rendered(workspace);
        let svg = SvgBuilder::new()
            .build()
            .expect("svg")
            .export_canvas(&canvas)
            .expect("export");

        assert!(svg.contains("<defs>"));
        assert!(svg.contains("blocklyEmbossFilter"));
        assert!(svg.contains("<style>"));
        assert!(svg.contains("translate(20,30)"));
        assert!(svg.contains("blocklyPathDark"));
        assert!(svg.contains("blocklyPathLight"));
        assert!(svg.contains(">say<"));
    }

    #[test]
    fn test_background_and_view_box() {
        let mut workspace = Workspace::new();
        workspace.add_block(Block::new("empty").with_position(5.0, 5.0));
        let canvas = rendered(workspace);
        let style = StyleConfig::new(Some("#ffffff".to_string()));
        let svg = SvgBuilder::new()
            .with_style(&style)
            .build()
            .expect("svg")
            .export_canvas(&canvas)
            .expect("export");

        assert!(svg.contains("fill=\"#ffffff\""));
        assert!(svg.contains("viewBox=\"-5 -5 "));
    }

    #[test]
    fn test_invalid_background() {
        let style = StyleConfig::new(Some("nope".to_string()));
        assert!(matches!(
            SvgBuilder::new().with_style(&style).build(),
            Err(Error::Style(_))
        ));
    }

    #[test]
    fn test_collapsed_children_are_not_exported() {
        let mut workspace = Workspace::new();
        let parent = workspace.add_block(
            Block::new("outer").with_input(Input::value("V").with_field(LabelField::new("outer"))),
        );
        let child = workspace.add_block(
            Block::new("hidden_child")
                .with_output()
                .with_input(Input::dummy("").with_field(LabelField::new("inner"))),
        );
        workspace.connect_input(parent, "V", child).expect("connect");
        workspace.set_collapsed(parent, true).expect("collapse");

        let canvas = rendered(workspace);
        let svg = SvgBuilder::new()
            .build()
            .expect("svg")
            .export_canvas(&canvas)
            .expect("export");
        assert!(!svg.contains("data-type=\"hidden_child\""));
        assert!(svg.contains("data-type=\"outer\""));
    }
}
