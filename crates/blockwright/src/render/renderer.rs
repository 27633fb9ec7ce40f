//! The renderer facade.
//!
//! A [`Renderer`] holds the constants shared by every block. Each call to
//! [`Renderer::render`] builds a fresh [`RenderInfo`] and [`Drawer`],
//! computes the whole result, and only then writes it back to the block,
//! its connections and its [`PathObject`]. No per-block state survives
//! between renders.

use log::{debug, info};

use blockwright_core::{block::BlockId, workspace::Workspace};

use super::{
    RenderError,
    constants::{ConstantOverrides, ConstantProvider},
    drawer::{DrawOutput, Drawer},
    highlight_constants::HighlightConstantProvider,
    info::RenderInfo,
    path_object::PathObject,
};
use crate::theme::{BlockStyle, Theme};

/// Measures, draws and commits blocks with the Geras constants.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    constants: Option<ConstantProvider>,
    highlight: Option<HighlightConstantProvider>,
}

impl Renderer {
    /// Creates an uninitialized renderer. Call [`Renderer::init`] before
    /// rendering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the constant providers: Geras values, then `overrides`, then
    /// the shapes, then the theme.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidColour`] if the theme holds a colour
    /// that does not parse. The renderer is left unchanged in that case.
    pub fn init(&mut self, theme: &Theme, overrides: &ConstantOverrides) -> Result<(), RenderError> {
        let mut constants = ConstantProvider::geras();
        constants.apply_overrides(overrides);
        constants.init();
        constants.set_theme(theme)?;
        let highlight = HighlightConstantProvider::new(&constants);

        info!(theme = theme.name(), overridden = !overrides.is_empty(); "Renderer initialized");
        self.constants = Some(constants);
        self.highlight = Some(highlight);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.constants.is_some()
    }

    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`].
    pub fn constants(&self) -> Result<&ConstantProvider, RenderError> {
        self.constants.as_ref().ok_or(RenderError::NotInitialized)
    }

    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`].
    pub fn highlight_constants(&self) -> Result<&HighlightConstantProvider, RenderError> {
        self.highlight.as_ref().ok_or(RenderError::NotInitialized)
    }

    /// A fresh path object for a block rendered by this renderer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`].
    pub fn make_path_object(&self) -> Result<PathObject, RenderError> {
        Ok(PathObject::new(self.constants()?))
    }

    /// Runs the measure and draw passes without touching the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`], or
    /// any error from measuring or drawing the block.
    pub fn measure_and_draw(&self, workspace: &Workspace, id: BlockId) -> Result<DrawOutput, RenderError> {
        let constants = self.constants()?;
        let highlight = self.highlight_constants()?;

        let mut info = RenderInfo::new(constants, workspace, id)?;
        info.measure()?;
        let output = Drawer::new(&info, highlight).draw()?;
        debug!(
            block:% = id,
            rows = info.rows.len(),
            width = output.width,
            height = output.height;
            "Measured and drew block"
        );
        Ok(output)
    }

    /// Renders one block and writes the result back.
    ///
    /// Children must already be rendered: their stored sizes feed the
    /// measure pass. On error neither the block nor `path` is changed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`], or
    /// any error from measuring, drawing or updating the workspace.
    pub fn render(
        &self,
        workspace: &mut Workspace,
        id: BlockId,
        path: &mut PathObject,
    ) -> Result<DrawOutput, RenderError> {
        let output = self.measure_and_draw(workspace, id)?;
        self.commit(workspace, id, &output, path)?;
        Ok(output)
    }

    /// Writes a draw result to the block, its connections and `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidColour`] for a bad `auto_` style name,
    /// or a workspace error if the block is gone.
    pub fn commit(
        &self,
        workspace: &mut Workspace,
        id: BlockId,
        output: &DrawOutput,
        path: &mut PathObject,
    ) -> Result<(), RenderError> {
        let constants = self.constants()?;
        let block = workspace.block(id)?;
        let style = self.style_for(constants, block.style_name())?;
        let shadow = block.is_shadow();
        let insertion_marker = block.is_insertion_marker();
        let disabled = !block.is_enabled() || workspace.is_inherited_disabled(id)?;

        let block = workspace.block_mut(id)?;
        for (slot, offset) in &output.connection_offsets {
            if let Some(connection) = block.connection_mut(*slot) {
                connection.set_offset_in_block(offset.x(), offset.y());
            }
        }
        block.set_rendered_size(output.width, output.height, output.childless_width);
        workspace.update_connection_locations(id)?;

        path.set_path(&output.main_path);
        path.set_highlight_path(&output.highlight_path);
        if output.rtl {
            path.flip_rtl();
        }
        path.set_style(style);
        path.apply_colour(shadow, disabled);
        path.update_insertion_marker(insertion_marker);
        Ok(())
    }

    /// Resolves the style for `name` against the current theme.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`Renderer::init`], or
    /// [`RenderError::InvalidColour`] for a bad `auto_` style name.
    pub fn block_style(&self, name: &str) -> Result<BlockStyle, RenderError> {
        self.style_for(self.constants()?, name)
    }

    fn style_for(&self, constants: &ConstantProvider, name: &str) -> Result<BlockStyle, RenderError> {
        let name = (!name.is_empty()).then_some(name);
        constants.block_style(name)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use blockwright_core::{
        block::{Block, ConnectionSlot, Input},
        field::LabelField,
    };

    use super::*;

    fn renderer() -> Renderer {
        let mut renderer = Renderer::new();
        renderer
            .init(&Theme::classic(), &ConstantOverrides::default())
            .expect("classic theme");
        renderer
    }

    #[test]
    fn test_constants_before_init() {
        let renderer = Renderer::new();
        assert!(!renderer.is_initialized());
        assert!(matches!(
            renderer.highlight_constants(),
            Err(RenderError::NotInitialized)
        ));
        assert!(matches!(
            renderer.constants(),
            Err(RenderError::NotInitialized)
        ));

        let mut workspace = Workspace::new();
        let id = workspace.add_block(Block::new("early"));
        let mut path = PathObject::new(&ConstantProvider::geras());
        let result = renderer.render(&mut workspace, id, &mut path);
        assert!(matches!(result, Err(RenderError::NotInitialized)));
        assert_eq!(path.main().d(), "");
    }

    #[test]
    fn test_overrides_reach_the_shapes() {
        let overrides: ConstantOverrides = toml::from_str("notch_width = 21.0").expect("overrides");
        let mut renderer = Renderer::new();
        renderer
            .init(&Theme::classic(), &overrides)
            .expect("init");
        let constants = renderer.constants().expect("constants");
        assert_approx_eq!(f64, constants.notch.width, 21.0);
        assert_approx_eq!(f64, constants.dark_path_offset, 1.0);
    }

    #[test]
    fn test_render_commits_size_and_paths() {
        let renderer = renderer();
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("say")
                .with_style("text_blocks")
                .with_previous_statement()
                .with_next_statement()
                .with_input(Input::dummy("").with_field(LabelField::new("say"))),
        );
        let mut path = renderer.make_path_object().expect("path object");
        let output = renderer
            .render(&mut workspace, id, &mut path)
            .expect("render");

        let block = workspace.block(id).expect("block");
        assert_approx_eq!(f64, block.height(), output.height);
        assert_approx_eq!(f64, block.width(), output.width);
        assert_approx_eq!(f64, block.childless_width(), output.childless_width);
        assert_eq!(path.main().d(), output.main_path);
        assert_eq!(path.dark().d(), output.main_path);
        assert_eq!(path.light().d(), output.highlight_path);
        assert!(path.main().get("fill").is_some());

        let next = block.connection(ConnectionSlot::Next).expect("next");
        assert_approx_eq!(f64, next.offset_in_block().y(), output.height - 4.0);
        assert_approx_eq!(f64, next.position().y(), output.height - 4.0);
    }

    #[test]
    fn test_render_moves_child_onto_input() {
        let renderer = renderer();
        let mut workspace = Workspace::new();
        let print = workspace.add_block(
            Block::new("print")
                .with_previous_statement()
                .with_input(Input::value("TEXT").with_field(LabelField::new("print"))),
        );
        let text = workspace.add_block(
            Block::new("text")
                .with_output()
                .with_input(Input::dummy("").with_field(LabelField::new("hello"))),
        );
        workspace.connect_input(print, "TEXT", text).expect("connect");

        let mut child_path = renderer.make_path_object().expect("path object");
        renderer
            .render(&mut workspace, text, &mut child_path)
            .expect("child");
        let mut parent_path = renderer.make_path_object().expect("path object");
        renderer
            .render(&mut workspace, print, &mut parent_path)
            .expect("parent");

        let parent = workspace.block(print).expect("print");
        let input = parent.connection(ConnectionSlot::Input(0)).expect("input");
        let child = workspace.block(text).expect("text");
        let output = child.connection(ConnectionSlot::Output).expect("output");
        assert_approx_eq!(f64, input.position().x(), output.position().x());
        assert_approx_eq!(f64, input.position().y(), output.position().y());
        assert!(parent.width() > parent.childless_width());
    }

    #[test]
    fn test_rtl_render_flips_paths() {
        let renderer = renderer();
        let mut workspace = Workspace::new().with_rtl(true);
        let id = workspace.add_block(Block::new("rtl").with_previous_statement());
        let mut path = renderer.make_path_object().expect("path object");
        renderer
            .render(&mut workspace, id, &mut path)
            .expect("render");
        assert_eq!(path.main().get("transform"), Some("scale(-1 1)"));
    }

    #[test]
    fn test_inherited_disable_applies_pattern() {
        let renderer = renderer();
        let mut workspace = Workspace::new();
        let parent = workspace.add_block(
            Block::new("off")
                .with_enabled(false)
                .with_input(Input::statement("DO")),
        );
        let child = workspace.add_block(Block::new("child").with_previous_statement());
        workspace.connect_input(parent, "DO", child).expect("connect");

        let mut path = renderer.make_path_object().expect("path object");
        renderer
            .render(&mut workspace, child, &mut path)
            .expect("render");
        assert!(path.has_class("blocklyDisabled"));
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use blockwright_core::{
        block::{Align, Block, ConnectionSlot, Input, InputKind},
        field::ImageField,
    };

    use super::*;

    /// The parts of a block the properties vary.
    #[derive(Debug, Clone)]
    struct Shape {
        output: bool,
        next: bool,
        inline: bool,
        inputs: Vec<(InputKind, f64, Align)>,
    }

    impl Shape {
        fn block(&self) -> Block {
            let mut block = Block::new("generated").with_inputs_inline(self.inline);
            block = if self.output {
                block.with_output()
            } else {
                block.with_previous_statement()
            };
            if self.next {
                block = block.with_next_statement();
            }
            self.inputs
                .iter()
                .enumerate()
                .fold(block, |block, (index, (kind, width, align))| {
                    block.with_input(
                        Input::of_kind(format!("IN{index}"), *kind)
                            .with_align(*align)
                            .with_field(ImageField::new("icon.svg", *width, 15.0)),
                    )
                })
        }

        fn with_first_width(&self, width: f64) -> Self {
            let mut shape = self.clone();
            if let Some(first) = shape.inputs.first_mut() {
                first.1 = width;
            }
            shape
        }
    }

    // ===================
    // Strategies
    // ===================

    fn kind_strategy() -> impl Strategy<Value = InputKind> {
        prop_oneof![
            Just(InputKind::Value),
            Just(InputKind::Statement),
            Just(InputKind::Dummy),
            Just(InputKind::EndRow),
        ]
    }

    fn align_strategy() -> impl Strategy<Value = Align> {
        prop_oneof![Just(Align::Left), Just(Align::Centre), Just(Align::Right)]
    }

    fn shape_strategy() -> impl Strategy<Value = Shape> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop::collection::vec((kind_strategy(), 1.0f64..80.0, align_strategy()), 0..5),
        )
            .prop_map(|(output, next, inline, inputs)| Shape {
                output,
                next,
                inline,
                inputs,
            })
    }

    fn renderer() -> Renderer {
        let mut renderer = Renderer::new();
        renderer
            .init(&Theme::classic(), &ConstantOverrides::default())
            .expect("classic theme");
        renderer
    }

    fn draw(renderer: &Renderer, shape: &Shape, rtl: bool) -> DrawOutput {
        let mut workspace = Workspace::new().with_rtl(rtl);
        let id = workspace.add_block(shape.block());
        renderer
            .measure_and_draw(&workspace, id)
            .expect("generated block renders")
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Rendering an unchanged block twice gives identical output.
    fn check_idempotent(shape: &Shape) -> Result<(), TestCaseError> {
        let renderer = renderer();
        let mut workspace = Workspace::new();
        let id = workspace.add_block(shape.block());
        let mut path = renderer.make_path_object().expect("initialized");

        let first = renderer.render(&mut workspace, id, &mut path).expect("render");
        let first_d = path.main().d().to_string();
        let second = renderer.render(&mut workspace, id, &mut path).expect("render");

        prop_assert_eq!(&first.main_path, &second.main_path);
        prop_assert_eq!(&first.highlight_path, &second.highlight_path);
        prop_assert_eq!(first_d.as_str(), path.main().d());
        Ok(())
    }

    /// RTL puts connections left of the origin and keeps the height. The
    /// width only moves by the next notch shift, which goes the other way
    /// in RTL.
    fn check_rtl_symmetry(shape: &Shape) -> Result<(), TestCaseError> {
        let renderer = renderer();
        let constants = renderer.constants().expect("initialized");
        let ltr = draw(&renderer, shape, false);
        let rtl = draw(&renderer, shape, true);

        prop_assert!(approx_eq!(f64, ltr.height, rtl.height));
        prop_assert!((ltr.width - rtl.width).abs() <= constants.dark_path_offset + 1e-9);
        prop_assert_eq!(ltr.connection_offsets.len(), rtl.connection_offsets.len());
        for ((ltr_slot, ltr_offset), (rtl_slot, rtl_offset)) in
            ltr.connection_offsets.iter().zip(&rtl.connection_offsets)
        {
            prop_assert_eq!(ltr_slot, rtl_slot);
            prop_assert!(approx_eq!(f64, ltr_offset.y(), rtl_offset.y()));
            prop_assert!(rtl_offset.x() <= 0.0);
        }
        Ok(())
    }

    /// A wider field never makes the block narrower.
    fn check_width_monotonic(shape: &Shape, narrow: f64, extra: f64) -> Result<(), TestCaseError> {
        let renderer = renderer();
        let small = draw(&renderer, &shape.with_first_width(narrow), false);
        let large = draw(&renderer, &shape.with_first_width(narrow + extra), false);
        prop_assert!(large.childless_width + 1e-9 >= small.childless_width);
        Ok(())
    }

    /// Every connection on the block gets exactly one offset, placed on
    /// the measured row that holds it.
    fn check_connection_accounting(shape: &Shape) -> Result<(), TestCaseError> {
        let renderer = renderer();
        let constants = renderer.constants().expect("initialized");
        let dark = constants.dark_path_offset;
        let output = draw(&renderer, shape, false);
        let slots = shape.block().connection_slots();

        prop_assert_eq!(output.connection_offsets.len(), slots.len());
        for slot in slots {
            prop_assert!(output.connection_offset(slot).is_some());
        }

        let mut workspace = Workspace::new();
        let id = workspace.add_block(shape.block());
        let mut info = RenderInfo::new(constants, &workspace, id).expect("block");
        info.measure().expect("measure");

        let expect_at = |slot: ConnectionSlot, x: f64, y: f64| -> Result<(), TestCaseError> {
            let offset = output.connection_offset(slot).expect("slot has an offset");
            prop_assert!(approx_eq!(f64, offset.x(), x, epsilon = 1e-9), "{slot:?} x");
            prop_assert!(approx_eq!(f64, offset.y(), y, epsilon = 1e-9), "{slot:?} y");
            Ok(())
        };

        for row in &info.rows {
            for elem in &row.elements {
                let Some(element) = elem.input_element() else {
                    continue;
                };
                let slot = ConnectionSlot::Input(element.input);
                if elem.is_external_input() {
                    prop_assert!(approx_eq!(
                        f64,
                        elem.x_pos + elem.width,
                        row.x_pos + row.width,
                        epsilon = 1e-9
                    ));
                    expect_at(slot, row.x_pos + row.width + dark, row.y_pos)?;
                } else if elem.is_statement_input() {
                    let x = row.x_pos + row.statement_edge + elem.notch_offset + dark;
                    expect_at(slot, x, row.y_pos + dark)?;
                } else if elem.is_inline_input() {
                    let x = elem.x_pos + element.connection_width + dark;
                    let y = elem.top() + element.connection_offset_y + dark;
                    expect_at(slot, x, y)?;
                }
            }
        }

        if shape.output {
            expect_at(ConnectionSlot::Output, info.start_x, constants.tab_offset_from_top)?;
        }
        if let Some(bottom) = info.bottom_row() {
            if let Some(next) = bottom.elements.iter().find(|elem| elem.is_next_connection()) {
                expect_at(ConnectionSlot::Next, next.x_pos + dark / 2.0, bottom.baseline() + dark)?;
            }
        }
        Ok(())
    }

    /// No block is shorter than the minimum block height.
    fn check_min_height(shape: &Shape) -> Result<(), TestCaseError> {
        let renderer = renderer();
        let constants = renderer.constants().expect("initialized");
        let output = draw(&renderer, shape, false);
        prop_assert!(output.height >= constants.min_block_height);
        Ok(())
    }

    /// Centre alignment puts half the missing width on each side.
    fn check_centre_split(centred: f64, other: f64) -> Result<(), TestCaseError> {
        let constants = ConstantProvider::geras();
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("centred")
                .with_input(
                    Input::dummy("")
                        .with_align(Align::Centre)
                        .with_field(ImageField::new("a.svg", centred, 15.0)),
                )
                .with_input(Input::dummy("").with_field(ImageField::new("b.svg", other, 15.0))),
        );
        let mut info = RenderInfo::new(&constants, &workspace, id).expect("block");
        info.measure().expect("measure");

        let row = info
            .rows
            .iter()
            .find(|row| row.align == Some(Align::Centre))
            .expect("centred row");
        let first = row.elements.first().expect("leading spacer").width;
        let last = row.elements.last().expect("trailing spacer").width;
        prop_assert!(approx_eq!(f64, first, last, epsilon = 1e-9));
        Ok(())
    }

    proptest! {
        #[test]
        fn render_is_idempotent(shape in shape_strategy()) {
            check_idempotent(&shape)?;
        }

        #[test]
        fn rtl_keeps_extents(shape in shape_strategy()) {
            check_rtl_symmetry(&Shape { inline: false, ..shape })?;
        }

        #[test]
        fn width_is_monotonic(
            shape in shape_strategy(),
            narrow in 1.0f64..60.0,
            extra in 0.0f64..60.0,
        ) {
            check_width_monotonic(&shape, narrow, extra)?;
        }

        #[test]
        fn connections_are_accounted(shape in shape_strategy()) {
            check_connection_accounting(&shape)?;
        }

        #[test]
        fn blocks_reach_min_height(shape in shape_strategy()) {
            check_min_height(&shape)?;
        }

        #[test]
        fn centre_alignment_splits_evenly(centred in 1.0f64..80.0, other in 1.0f64..80.0) {
            check_centre_split(centred, other)?;
        }
    }
}
