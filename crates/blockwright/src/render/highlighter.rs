//! The highlight pass.
//!
//! A [`Highlighter`] follows the drawer around the block and traces a light
//! stroke half a pixel inside the edges that face the top-left light
//! source. The path is never closed and never changes the outline; each
//! segment starts with its own move so gaps are allowed.

use blockwright_core::path::SvgPath;

use super::{
    highlight_constants::HighlightConstantProvider, info::RenderInfo, measurables::Measurable,
    rows::Row,
};

const OFFSET: f64 = HighlightConstantProvider::OFFSET;

/// Accumulates the highlight path for one block.
#[derive(Debug)]
pub struct Highlighter<'a> {
    highlight: &'a HighlightConstantProvider,
    rtl: bool,
    start_x: f64,
    start_y: f64,
    steps: SvgPath,
    inline_steps: SvgPath,
}

impl<'a> Highlighter<'a> {
    pub fn new(info: &RenderInfo<'_>, highlight: &'a HighlightConstantProvider) -> Self {
        Self {
            highlight,
            rtl: info.rtl,
            start_x: info.start_x,
            start_y: info.start_y,
            steps: SvgPath::new(),
            inline_steps: SvgPath::new(),
        }
    }

    /// The outline highlight and the inline-input highlights, one per line.
    pub fn path(&self) -> String {
        format!("{}\n{}", self.steps, self.inline_steps)
    }

    pub fn steps(&self) -> &SvgPath {
        &self.steps
    }

    pub fn inline_steps(&self) -> &SvgPath {
        &self.inline_steps
    }

    pub fn draw_top_corner(&mut self, row: &Row) {
        let highlight = self.highlight;
        self.steps.move_by(row.x_pos, self.start_y);
        for elem in &row.elements {
            if elem.is_left_square_corner() {
                self.steps.append(&highlight.start_point);
            } else if elem.is_left_rounded_corner() {
                self.steps
                    .append(highlight.outside_corner.top_left(self.rtl));
            } else if elem.is_previous_connection() {
                self.steps.append(&highlight.notch.path_left);
            } else if elem.is_hat() {
                self.steps.append(highlight.start_hat.path(self.rtl));
            } else if elem.is_spacer() && elem.width != 0.0 {
                // Lines stop half a pixel short of the element end.
                self.steps
                    .horizontal_to(elem.x_pos + elem.width - OFFSET);
            }
        }
        self.steps.horizontal_to(row.x_pos + row.width - OFFSET);
    }

    /// Only the RTL jagged edge faces the light.
    pub fn draw_jagged_edge(&mut self, row: &Row) {
        if self.rtl {
            let teeth = &self.highlight.jagged_teeth;
            let remainder = row.height - teeth.height - OFFSET;
            self.steps.append(&teeth.path_left).vertical_by(remainder);
        }
    }

    pub fn draw_value_input(&mut self, row: &Row, input: &Measurable) {
        let tab = &self.highlight.puzzle_tab;
        let connection_height = input
            .input_element()
            .map_or(0.0, |element| element.connection_height);
        if self.rtl {
            let below_tab = row.height - connection_height;
            self.steps
                .move_to(input.x_pos + input.width - OFFSET, row.y_pos)
                .append(tab.path_down(self.rtl))
                .vertical_by(below_tab);
        } else {
            self.steps
                .move_to(input.x_pos + input.width, row.y_pos)
                .append(tab.path_down(self.rtl));
        }
    }

    pub fn draw_statement_input(&mut self, row: &Row, input: &Measurable) {
        let corner = &self.highlight.inside_corner;
        let bottom_width = row.width - input.x_pos - corner.width;
        if self.rtl {
            let inner_height = row.height - 2.0 * corner.height;
            self.steps
                .move_to(input.x_pos, row.y_pos)
                .append(&corner.path_top(self.rtl))
                .vertical_by(inner_height)
                .append(corner.path_bottom(self.rtl))
                .line_to(bottom_width, 0.0);
        } else {
            self.steps
                .move_to(input.x_pos, row.y_pos + row.height)
                .append(corner.path_bottom(self.rtl))
                .line_to(bottom_width, 0.0);
        }
    }

    pub fn draw_right_side_row(&mut self, row: &Row) {
        let right_edge = row.x_pos + row.width - OFFSET;
        if row.follows_statement() {
            self.steps.horizontal_to(right_edge);
        }
        if self.rtl {
            self.steps.horizontal_to(right_edge);
            if row.height > OFFSET {
                self.steps.vertical_to(row.y_pos + row.height - OFFSET);
            }
        }
    }

    pub fn draw_bottom_row(&mut self, row: &Row) {
        if self.rtl {
            self.steps.vertical_to(row.baseline() - OFFSET);
            return;
        }
        match row.elements.first() {
            Some(corner) if corner.is_left_square_corner() => {
                self.steps
                    .move_to(row.x_pos + OFFSET, row.baseline() - OFFSET);
            }
            Some(corner) if corner.is_left_rounded_corner() => {
                self.steps
                    .move_to(row.x_pos, row.baseline())
                    .append(self.highlight.outside_corner.bottom_left());
            }
            _ => {}
        }
    }

    pub fn draw_left(&mut self, output: Option<&Measurable>, top_row: &Row, bottom_row: &Row) {
        let tab = &self.highlight.puzzle_tab;
        if let Some(output) = output {
            let tab_bottom = output.connection_offset_y() + output.height;
            if self.rtl {
                self.steps.move_to(self.start_x, tab_bottom);
            } else {
                self.steps
                    .move_to(self.start_x + OFFSET, bottom_row.baseline() - OFFSET)
                    .vertical_to(tab_bottom);
            }
            self.steps.append(tab.path_up(self.rtl));
        }

        if !self.rtl {
            let rounded = top_row
                .elements
                .first()
                .is_some_and(Measurable::is_left_rounded_corner);
            if rounded {
                self.steps
                    .vertical_to(self.highlight.outside_corner.height);
            } else {
                self.steps.vertical_to(top_row.capline() + OFFSET);
            }
        }
    }

    pub fn draw_inline_input(&mut self, input: &Measurable) {
        let Some(element) = input.input_element() else {
            return;
        };
        let tab = &self.highlight.puzzle_tab;
        let connection_right = input.x_pos + element.connection_width;
        let y_pos = input.top();
        let bottom_width = input.width - element.connection_width;
        let start_y = y_pos + OFFSET;

        if self.rtl {
            let above_tab = element.connection_offset_y - OFFSET;
            let below_tab =
                input.height - (element.connection_offset_y + element.connection_height) + OFFSET;
            self.inline_steps
                .move_to(connection_right - OFFSET, start_y)
                .vertical_by(above_tab)
                .append(tab.path_down(self.rtl))
                .vertical_by(below_tab)
                .horizontal_by(bottom_width);
        } else {
            self.inline_steps
                .move_to(input.x_pos + input.width + OFFSET, start_y)
                .vertical_by(input.height)
                .horizontal_by(-bottom_width)
                .move_to(connection_right, y_pos + element.connection_offset_y)
                .append(tab.path_down(self.rtl));
        }
    }
}
