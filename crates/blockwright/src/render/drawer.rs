//! The draw pass.
//!
//! A [`Drawer`] walks a measured [`RenderInfo`] once: along the top row,
//! down the right side row by row, back along the bottom row and up the
//! left side. On the way it emits the outline, a separate sub-path for each
//! inline input hole, the highlight path (through a [`Highlighter`]), every
//! connection offset and the placement of every field and icon.
//!
//! All coordinates are computed left to right. In RTL the connection and
//! field x coordinates are negated here; the paths themselves are mirrored
//! later by a transform on the path elements.

use blockwright_core::{block::ConnectionSlot, geometry::Point, path::SvgPath};

use super::{
    RenderError,
    constants::ConstantProvider,
    highlight_constants::HighlightConstantProvider,
    highlighter::Highlighter,
    info::RenderInfo,
    measurables::{ElementKind, FieldElement, Measurable},
    rows::Row,
};

/// Where a field is drawn, relative to the block origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPlacement {
    /// Index of the owning input
    pub input: usize,
    /// Index of the field within that input
    pub field: usize,
    pub x: f64,
    pub y: f64,
    /// Mirror the field content (RTL fields that flip)
    pub flip: bool,
    /// Insertion markers draw no fields
    pub hidden: bool,
}

impl FieldPlacement {
    /// The SVG `transform` attribute for the field's group.
    pub fn transform(&self) -> String {
        let mut transform = format!("translate({},{})", self.x, self.y);
        if self.flip {
            transform.push_str(" scale(-1 1)");
        }
        transform
    }
}

/// Where an icon is drawn, relative to the block origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconPlacement {
    /// Index of the icon on the block
    pub index: usize,
    pub offset: Point,
    /// Collapsed blocks and insertion markers hide icons
    pub hidden: bool,
}

/// Everything a draw pass produces for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutput {
    /// Outline and inline-input holes, one per line
    pub main_path: String,
    /// Highlight outline and inline highlights, one per line
    pub highlight_path: String,
    pub rtl: bool,
    /// Connection positions relative to the block origin
    pub connection_offsets: Vec<(ConnectionSlot, Point)>,
    pub field_placements: Vec<FieldPlacement>,
    pub icon_placements: Vec<IconPlacement>,
    /// Width including everything attached to the right side
    pub width: f64,
    pub height: f64,
    /// Width of the block on its own
    pub childless_width: f64,
}

impl DrawOutput {
    /// Offset of the connection at `slot`, if the draw pass placed it.
    pub fn connection_offset(&self, slot: ConnectionSlot) -> Option<Point> {
        self.connection_offsets
            .iter()
            .find(|(candidate, _)| *candidate == slot)
            .map(|(_, offset)| *offset)
    }
}

/// Draws one measured block.
#[derive(Debug)]
pub struct Drawer<'i, 'a> {
    info: &'i RenderInfo<'a>,
    constants: &'a ConstantProvider,
    highlighter: Highlighter<'i>,
    outline: SvgPath,
    inline: SvgPath,
    connection_offsets: Vec<(ConnectionSlot, Point)>,
    field_placements: Vec<FieldPlacement>,
    icon_placements: Vec<IconPlacement>,
}

impl<'i, 'a> Drawer<'i, 'a> {
    pub fn new(info: &'i RenderInfo<'a>, highlight: &'i HighlightConstantProvider) -> Self {
        Self {
            info,
            constants: info.constants(),
            highlighter: Highlighter::new(info, highlight),
            outline: SvgPath::new(),
            inline: SvgPath::new(),
            connection_offsets: Vec::new(),
            field_placements: Vec::new(),
            icon_placements: Vec::new(),
        }
    }

    /// Runs the draw pass.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingInput`] if an input row has no input
    /// to draw, which means `info` was not measured.
    pub fn draw(mut self) -> Result<DrawOutput, RenderError> {
        self.hide_hidden_icons();
        self.draw_outline()?;
        self.draw_internals();

        let info = self.info;
        Ok(DrawOutput {
            main_path: format!("{}\n{}", self.outline, self.inline),
            highlight_path: self.highlighter.path(),
            rtl: info.rtl,
            connection_offsets: self.connection_offsets,
            field_placements: self.field_placements,
            icon_placements: self.icon_placements,
            width: info.width_with_children,
            height: info.height,
            childless_width: info.width,
        })
    }

    fn missing_input(&self, row: usize) -> RenderError {
        RenderError::MissingInput {
            block: self.info.block().id(),
            row,
        }
    }

    fn mirror(&self, x: f64) -> f64 {
        if self.info.rtl { -x } else { x }
    }

    fn set_connection(&mut self, slot: ConnectionSlot, x: f64, y: f64) {
        self.connection_offsets.push((slot, Point::new(x, y)));
    }

    fn hide_hidden_icons(&mut self) {
        for &index in &self.info.hidden_icons {
            self.icon_placements.push(IconPlacement {
                index,
                offset: Point::default(),
                hidden: true,
            });
        }
    }

    // ====================================================================
    // Outline
    // ====================================================================

    fn draw_outline(&mut self) -> Result<(), RenderError> {
        let info = self.info;
        let (Some(top), Some(bottom)) = (info.top_row(), info.bottom_row()) else {
            return Err(self.missing_input(0));
        };
        self.draw_top(top);
        let last = info.rows.len().saturating_sub(1);
        for (index, row) in info.rows.iter().enumerate().take(last).skip(1) {
            if row.has_jagged_edge {
                self.draw_jagged_edge(row);
            } else if row.has_statement {
                self.draw_statement_input(index, row)?;
            } else if row.has_external_input {
                self.draw_value_input(index, row)?;
            } else {
                self.draw_right_side_row(row);
            }
        }
        self.draw_bottom(bottom);
        self.draw_left(top, bottom);
        Ok(())
    }

    fn draw_top(&mut self, row: &Row) {
        self.highlighter.draw_top_corner(row);
        self.highlighter.draw_right_side_row(row);

        self.position_previous_connection(row);
        let constants = self.constants;
        self.outline.move_by(row.x_pos, self.info.start_y);
        for elem in &row.elements {
            match elem.kind {
                ElementKind::RoundCorner => {
                    self.outline.append(&constants.outside_corners.top_left);
                }
                ElementKind::PreviousConnection => {
                    self.outline.append(&constants.notch.path_left);
                }
                ElementKind::Hat { .. } => {
                    self.outline.append(&constants.start_hat.path);
                }
                ElementKind::InRowSpacer => {
                    self.outline.horizontal_by(elem.width);
                }
                // A square corner draws nothing.
                _ => {}
            }
        }
        self.outline.vertical_by(row.height);
    }

    fn draw_jagged_edge(&mut self, row: &Row) {
        self.highlighter.draw_jagged_edge(row);
        let teeth = &self.constants.jagged_teeth;
        self.outline
            .append(&teeth.path)
            .vertical_by(row.height - teeth.height);
    }

    fn draw_value_input(&mut self, index: usize, row: &Row) -> Result<(), RenderError> {
        let input = row
            .last_input()
            .map(|position| &row.elements[position])
            .ok_or_else(|| self.missing_input(index))?;
        self.highlighter.draw_value_input(row, input);
        self.position_external_value_connection(row, input);

        let connection_height = input
            .input_element()
            .map_or(0.0, |element| element.connection_height);
        self.outline
            .horizontal_to(input.x_pos + input.width)
            .append(&self.constants.puzzle_tab.path_down)
            .vertical_by(row.height - connection_height);
        Ok(())
    }

    fn draw_statement_input(&mut self, index: usize, row: &Row) -> Result<(), RenderError> {
        let input = row
            .last_input()
            .map(|position| &row.elements[position])
            .ok_or_else(|| self.missing_input(index))?;
        self.highlighter.draw_statement_input(row, input);

        let constants = self.constants;
        let notch = &constants.notch;
        let corners = &constants.inside_corners;
        // The notch is drawn right to left, starting at its right end.
        let x = input.x_pos + input.notch_offset + notch.width;
        let inner_height = row.height - 2.0 * corners.height;

        self.outline
            .horizontal_to(x)
            .append(&notch.path_right)
            .horizontal_by(-(input.notch_offset - corners.width))
            .append(&corners.path_top)
            .vertical_by(inner_height)
            .append(&corners.path_bottom)
            .horizontal_to(row.x_pos + row.width);

        self.position_statement_input_connection(row, input);
        Ok(())
    }

    fn draw_right_side_row(&mut self, row: &Row) {
        self.highlighter.draw_right_side_row(row);
        self.outline
            .horizontal_to(row.x_pos + row.width)
            .vertical_to(row.y_pos + row.height);
    }

    fn draw_bottom(&mut self, row: &Row) {
        self.highlighter.draw_bottom_row(row);
        self.position_next_connection(row);

        let constants = self.constants;
        let mut reversed = SvgPath::new();
        for elem in row.elements.iter().rev() {
            match elem.kind {
                ElementKind::NextConnection => {
                    reversed.append(&constants.notch.path_right);
                }
                ElementKind::SquareCorner => {
                    reversed.horizontal_to(row.x_pos);
                }
                ElementKind::RoundCorner => {
                    reversed.append(&constants.outside_corners.bottom_left);
                }
                ElementKind::InRowSpacer => {
                    reversed.horizontal_by(-elem.width);
                }
                _ => {}
            }
        }
        self.outline.vertical_to(row.baseline()).append(&reversed);
    }

    fn draw_left(&mut self, top: &Row, bottom: &Row) {
        let info = self.info;
        self.highlighter
            .draw_left(info.output_connection.as_ref(), top, bottom);
        self.position_output_connection();

        if let Some(output) = &info.output_connection {
            let tab_bottom = output.connection_offset_y() + output.height;
            self.outline
                .vertical_to(tab_bottom)
                .append(&self.constants.puzzle_tab.path_up);
        }
        // Closing draws the last line up to the start point.
        self.outline.close();
    }

    // ====================================================================
    // Internals
    // ====================================================================

    fn draw_internals(&mut self) {
        let info = self.info;
        for row in &info.rows {
            for elem in &row.elements {
                match elem.kind {
                    ElementKind::InlineInput(_) => self.draw_inline_input(elem),
                    ElementKind::Icon { .. } | ElementKind::Field(_) => self.layout_field(elem),
                    _ => {}
                }
            }
        }
    }

    fn layout_field(&mut self, elem: &Measurable) {
        let info = self.info;
        let y = elem.top();
        let mut x = elem.x_pos;
        let mut flip = false;
        if info.rtl {
            x = -(x + elem.width);
            if let ElementKind::Field(FieldElement { flip_rtl: true, .. }) = elem.kind {
                x += elem.width;
                flip = true;
            }
        }

        match elem.kind {
            ElementKind::Icon { index } => self.icon_placements.push(IconPlacement {
                index,
                offset: Point::new(x, y),
                hidden: info.is_insertion_marker,
            }),
            ElementKind::Field(field) => self.field_placements.push(FieldPlacement {
                input: field.input,
                field: field.field,
                x,
                y,
                flip,
                hidden: info.is_insertion_marker,
            }),
            _ => {}
        }
    }

    fn draw_inline_input(&mut self, input: &Measurable) {
        let Some(element) = input.input_element() else {
            return;
        };
        self.highlighter.draw_inline_input(input);

        let y_pos = input.top();
        let connection_top = element.connection_offset_y;
        let connection_bottom = element.connection_height + connection_top;
        let connection_right = input.x_pos + element.connection_width;

        self.inline
            .move_to(connection_right, y_pos)
            .vertical_by(connection_top)
            .append(&self.constants.puzzle_tab.path_down)
            .vertical_by(input.height - connection_bottom)
            .horizontal_by(input.width - element.connection_width)
            .vertical_by(-input.height)
            .close();

        self.position_inline_input_connection(input);
    }

    // ====================================================================
    // Connection positions
    // ====================================================================

    fn position_inline_input_connection(&mut self, input: &Measurable) {
        let Some(element) = input.input_element() else {
            return;
        };
        let dark = self.constants.dark_path_offset;
        let x = self.mirror(input.x_pos + element.connection_width + dark);
        let y = input.top() + element.connection_offset_y + dark;
        self.set_connection(ConnectionSlot::Input(element.input), x, y);
    }

    fn position_statement_input_connection(&mut self, row: &Row, input: &Measurable) {
        let Some(element) = input.input_element() else {
            return;
        };
        let dark = self.constants.dark_path_offset;
        let x = row.x_pos + row.statement_edge + input.notch_offset;
        // The dark path only shifts children in LTR.
        let x = if self.info.rtl { -x } else { x + dark };
        self.set_connection(ConnectionSlot::Input(element.input), x, row.y_pos + dark);
    }

    fn position_external_value_connection(&mut self, row: &Row, input: &Measurable) {
        let Some(element) = input.input_element() else {
            return;
        };
        let dark = self.constants.dark_path_offset;
        let x = self.mirror(row.x_pos + row.width + dark);
        self.set_connection(ConnectionSlot::Input(element.input), x, row.y_pos);
    }

    fn position_previous_connection(&mut self, top: &Row) {
        let has_previous = top.elements.iter().any(Measurable::is_previous_connection);
        if has_previous {
            let x = self.mirror(top.x_pos + top.notch_offset);
            self.set_connection(ConnectionSlot::Previous, x, 0.0);
        }
    }

    fn position_next_connection(&mut self, bottom: &Row) {
        let Some(next) = bottom.elements.iter().find(|elem| elem.is_next_connection()) else {
            return;
        };
        let dark = self.constants.dark_path_offset;
        let x = self.mirror(next.x_pos) + dark / 2.0;
        self.set_connection(ConnectionSlot::Next, x, bottom.baseline() + dark);
    }

    fn position_output_connection(&mut self) {
        if let Some(output) = &self.info.output_connection {
            let x = self.mirror(self.info.start_x);
            self.set_connection(ConnectionSlot::Output, x, output.connection_offset_y());
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use blockwright_core::{
        block::{Block, BlockId, Input},
        field::{ImageField, LabelField},
        workspace::Workspace,
    };

    use super::*;

    fn draw(workspace: &Workspace, id: BlockId) -> DrawOutput {
        let constants = ConstantProvider::geras();
        let highlight = HighlightConstantProvider::new(&constants);
        let mut info = RenderInfo::new(&constants, workspace, id).expect("block");
        info.measure().expect("measure");
        Drawer::new(&info, &highlight).draw().expect("draw")
    }

    fn statement_block() -> Block {
        Block::new("say")
            .with_previous_statement()
            .with_next_statement()
            .with_input(Input::dummy("").with_field(LabelField::new("say")))
    }

    #[test]
    fn test_outline_is_closed_and_starts_at_capline() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(statement_block());
        let output = draw(&workspace, id);

        let (outline, inline) = output.main_path.split_once('\n').expect("two sub-paths");
        assert!(outline.starts_with(" m 0,0 "));
        assert!(outline.ends_with('z'));
        assert!(inline.is_empty());
        // Rounded top-left corner, then the previous notch.
        assert!(outline.contains("a 8 8 0 0,1 8,-8 "));
        assert!(outline.contains(" l 6,4  3,0  6,-4 "));
    }

    #[test]
    fn test_stacked_block_has_square_top_left() {
        let mut workspace = Workspace::new();
        let first = workspace.add_block(statement_block());
        let second = workspace.add_block(statement_block());
        workspace.connect_next(first, second).expect("connect");

        let output = draw(&workspace, second);
        let outline = output.main_path.split('\n').next().expect("outline");
        assert!(outline.starts_with(" m 0,0  h 15 "));
        // The only arc is the rounded bottom-left corner.
        assert_eq!(outline.matches("a 8 8").count(), 1);
    }

    #[test]
    fn test_statement_connection_offsets() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(statement_block());
        let output = draw(&workspace, id);

        let previous = output
            .connection_offset(ConnectionSlot::Previous)
            .expect("previous");
        assert_approx_eq!(f64, previous.x(), 15.0);
        assert_approx_eq!(f64, previous.y(), 0.0);

        let next = output.connection_offset(ConnectionSlot::Next).expect("next");
        // round corner 8 + spacer 6.5 + half the dark path
        assert_approx_eq!(f64, next.x(), 15.0);
        assert_approx_eq!(f64, next.y(), output.height - 4.0);
    }

    #[test]
    fn test_inline_inputs_cut_holes() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("add")
                .with_output()
                .with_inputs_inline(true)
                .with_input(Input::value("A").with_field(LabelField::new("a")))
                .with_input(Input::value("B").with_field(LabelField::new("b"))),
        );
        let output = draw(&workspace, id);

        let (_, inline) = output.main_path.split_once('\n').expect("two sub-paths");
        assert_eq!(inline.matches(" M ").count(), 2);
        assert_eq!(inline.matches('z').count(), 2);
        assert_eq!(inline.matches(" c 0,10 ").count(), 2);

        let a = output
            .connection_offset(ConnectionSlot::Input(0))
            .expect("input A");
        let b = output
            .connection_offset(ConnectionSlot::Input(1))
            .expect("input B");
        assert!(b.x() > a.x());
        assert_approx_eq!(f64, a.y(), b.y());

        let out = output.connection_offset(ConnectionSlot::Output).expect("output");
        assert_approx_eq!(f64, out.x(), 8.0);
        assert_approx_eq!(f64, out.y(), 5.0);
    }

    #[test]
    fn test_external_value_input_sits_on_right_edge() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("print")
                .with_previous_statement()
                .with_input(Input::value("TEXT").with_field(LabelField::new("print"))),
        );
        let output = draw(&workspace, id);

        let offset = output
            .connection_offset(ConnectionSlot::Input(0))
            .expect("input");
        assert_approx_eq!(f64, offset.x(), output.childless_width);
        let outline = output.main_path.split('\n').next().expect("outline");
        assert!(outline.contains(" c 0,10  -8,-8  -8,7.5 "));
    }

    #[test]
    fn test_collapsed_block_draws_teeth() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("value")
                .with_input(Input::value("A").with_field(LabelField::new("value"))),
        );
        workspace.set_collapsed(id, true).expect("collapse");
        let output = draw(&workspace, id);

        let outline = output.main_path.split('\n').next().expect("outline");
        assert!(outline.contains(" l 6,3  -12,6  6,3 "));
        assert!(!outline.contains(" c 0,10 "));
        assert!(output.connection_offset(ConnectionSlot::Input(0)).is_none());
    }

    #[test]
    fn test_rtl_mirrors_offsets_not_sizes() {
        let block = || {
            Block::new("print")
                .with_previous_statement()
                .with_next_statement()
                .with_input(Input::value("TEXT").with_field(LabelField::new("print")))
        };
        let mut ltr = Workspace::new();
        let ltr_id = ltr.add_block(block());
        let mut rtl = Workspace::new().with_rtl(true);
        let rtl_id = rtl.add_block(block());

        let ltr_output = draw(&ltr, ltr_id);
        let rtl_output = draw(&rtl, rtl_id);

        assert!(rtl_output.rtl);
        assert_approx_eq!(f64, ltr_output.width, rtl_output.width);
        assert_approx_eq!(f64, ltr_output.height, rtl_output.height);
        let ltr_input = ltr_output.connection_offset(ConnectionSlot::Input(0)).expect("ltr");
        let rtl_input = rtl_output.connection_offset(ConnectionSlot::Input(0)).expect("rtl");
        assert_approx_eq!(f64, ltr_input.x(), -rtl_input.x());
        assert_approx_eq!(f64, ltr_input.y(), rtl_input.y());
    }

    #[test]
    fn test_field_placement_in_rtl() {
        let mut workspace = Workspace::new().with_rtl(true);
        let id = workspace.add_block(
            Block::new("image").with_input(
                Input::dummy("")
                    .with_field(LabelField::new("label"))
                    .with_field(ImageField::new("arrow.svg", 16.0, 16.0).with_flip_rtl(true)),
            ),
        );
        let output = draw(&workspace, id);

        assert_eq!(output.field_placements.len(), 2);
        let label = output.field_placements[0];
        assert!(!label.flip);
        assert!(label.x < 0.0);
        assert!(label.transform().starts_with("translate(-"));

        let image = output.field_placements[1];
        assert!(image.flip);
        assert!(image.transform().ends_with("scale(-1 1)"));
    }

    #[test]
    fn test_highlight_path_is_open() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(statement_block());
        let output = draw(&workspace, id);

        let (steps, _) = output.highlight_path.split_once('\n').expect("two parts");
        assert!(steps.starts_with(" m 0,0  m 0.5,8 "));
        assert!(!steps.contains('z'));
    }

    #[test]
    fn test_draw_is_idempotent() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("repeat")
                .with_previous_statement()
                .with_next_statement()
                .with_input(Input::value("TIMES").with_field(LabelField::new("repeat")))
                .with_input(Input::statement("DO")),
        );
        assert_eq!(draw(&workspace, id), draw(&workspace, id));
    }
}
