//! The measure pass.
//!
//! [`RenderInfo::measure`] turns one block and the stored sizes of its
//! children into positioned rows, in six steps:
//!
//! 1. Create rows: top row, one input row per row-breaking input, bottom row
//! 2. Add spacers between and around the elements of every row
//! 3. Add spacer rows between rows
//! 4. Measure rows and compute the block bounds
//! 5. Pad rows so their right edges line up
//! 6. Finalize: absolute row and element positions, block size
//!
//! Positions are always computed left to right. Right-to-left blocks are
//! mirrored afterwards by the draw pass.

use log::trace;

use blockwright_core::{
    block::{Align, Block, BlockId, InputKind},
    workspace::Workspace,
};

use super::{
    RenderError,
    constants::ConstantProvider,
    measurables::{ElementKind, Measurable},
    rows::{Row, RowKind},
};

/// Measured geometry of one block.
#[derive(Debug)]
pub struct RenderInfo<'a> {
    constants: &'a ConstantProvider,
    workspace: &'a Workspace,
    block: &'a Block,

    /// Every row, top row first and bottom row last
    pub rows: Vec<Row>,
    /// Indices of icons not drawn because the block is collapsed
    pub hidden_icons: Vec<usize>,
    pub output_connection: Option<Measurable>,

    pub rtl: bool,
    pub is_inline: bool,
    pub is_collapsed: bool,
    pub is_insertion_marker: bool,

    /// Width of the block on its own, dark path included
    pub width: f64,
    /// Height of the block on its own, dark path included
    pub height: f64,
    /// Width of the block and everything attached to its right side
    pub width_with_children: f64,
    /// Left edge of statement inputs
    pub statement_edge: f64,
    /// Left edge of the block body; the output tab sits before it
    pub start_x: f64,
    /// Top edge of the block body; a hat sits above it
    pub start_y: f64,
}

impl<'a> RenderInfo<'a> {
    /// Creates an unmeasured description of the block `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Workspace`] if `id` is not on the workspace.
    pub fn new(
        constants: &'a ConstantProvider,
        workspace: &'a Workspace,
        id: BlockId,
    ) -> Result<Self, RenderError> {
        let block = workspace.block(id)?;
        let is_collapsed = block.is_collapsed();
        Ok(Self {
            constants,
            workspace,
            block,
            rows: Vec::new(),
            hidden_icons: Vec::new(),
            output_connection: None,
            rtl: workspace.is_rtl(),
            is_inline: block.inputs_inline() && !is_collapsed,
            is_collapsed,
            is_insertion_marker: block.is_insertion_marker(),
            width: 0.0,
            height: 0.0,
            width_with_children: 0.0,
            statement_edge: 0.0,
            start_x: 0.0,
            start_y: 0.0,
        })
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    pub fn constants(&self) -> &'a ConstantProvider {
        self.constants
    }

    pub fn top_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn bottom_row(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Builds every row and positions every element. Calling it again
    /// starts over, so the result only depends on the block and the stored
    /// sizes of its children.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingInput`] if a statement row has no
    /// statement input, and [`RenderError::Workspace`] if a connected block
    /// cannot be found.
    pub fn measure(&mut self) -> Result<(), RenderError> {
        self.rows.clear();
        self.hidden_icons.clear();
        self.output_connection = None;
        self.width = 0.0;
        self.height = 0.0;
        self.width_with_children = 0.0;
        self.statement_edge = 0.0;
        self.start_x = 0.0;
        self.start_y = 0.0;

        self.create_rows()?;
        self.add_elem_spacing();
        self.add_row_spacing();
        self.compute_bounds()?;
        self.align_row_elements()?;
        self.finalize()?;

        trace!(
            block:% = self.block.id(),
            rows = self.rows.len(),
            width = self.width,
            height = self.height;
            "Measured block"
        );
        Ok(())
    }

    // ====================================================================
    // Rows
    // ====================================================================

    fn create_rows(&mut self) -> Result<(), RenderError> {
        let constants = self.constants;
        let block = self.block;

        if block.output_connection().is_some() {
            self.output_connection = Some(Measurable::output_connection(constants));
        }

        self.rows.push(self.populate_top_row()?);
        let mut active_row = Row::input(constants);

        for (index, icon) in block.icons().iter().enumerate() {
            if self.is_collapsed && !icon.is_shown_when_collapsed() {
                self.hidden_icons.push(index);
            } else {
                active_row.elements.push(Measurable::icon(constants, block, index));
            }
        }

        let metrics = constants.field_metrics();
        let mut last_kind: Option<InputKind> = None;
        for (index, input) in block.inputs().iter().enumerate() {
            if !input.is_visible() {
                continue;
            }
            if self.should_start_new_row(input.kind(), last_kind) {
                let finished = std::mem::replace(&mut active_row, Row::input(constants));
                self.rows.push(finished);
            }

            for (field_index, field) in input.fields().iter().enumerate() {
                active_row.elements.push(Measurable::field(
                    constants,
                    &metrics,
                    field.as_ref(),
                    index,
                    field_index,
                ));
            }
            self.add_input(index, &mut active_row)?;
            last_kind = Some(input.kind());
        }

        if self.is_collapsed {
            active_row.has_jagged_edge = true;
            active_row.elements.push(Measurable::jagged_edge(constants));
        }

        if !active_row.elements.is_empty() || active_row.has_dummy_input {
            self.rows.push(active_row);
        }

        let bottom = self.populate_bottom_row()?;
        self.rows.push(bottom);
        Ok(())
    }

    /// Statement inputs always sit on their own row. Without inline inputs
    /// every value and dummy input starts a row too, and an end-row input
    /// always ends one.
    fn should_start_new_row(&self, kind: InputKind, last: Option<InputKind>) -> bool {
        let Some(last) = last else {
            return false;
        };
        if kind == InputKind::Statement || last == InputKind::Statement {
            return true;
        }
        if last == InputKind::EndRow {
            return true;
        }
        match kind {
            InputKind::Value | InputKind::Dummy | InputKind::EndRow => !self.is_inline,
            InputKind::Statement => true,
        }
    }

    fn has_hat(&self) -> Result<bool, RenderError> {
        let block = self.block;
        if block.output_connection().is_some() || block.previous_connection().is_some() {
            return Ok(false);
        }
        let style = self.constants.block_style(Some(block.style_name()))?;
        let hat = block
            .hat()
            .filter(|hat| !hat.is_empty())
            .or(Some(style.hat()).filter(|hat| !hat.is_empty()));
        Ok(match hat {
            Some(hat) => hat == "cap",
            None => self.constants.add_start_hats,
        })
    }

    fn populate_top_row(&self) -> Result<Row, RenderError> {
        let constants = self.constants;
        let block = self.block;
        let id = block.id();

        let has_hat = self.has_hat()?;
        let follows_sibling = match self.workspace.previous_block(id)? {
            Some(previous) => self.workspace.next_block(previous)? == Some(id),
            None => false,
        };
        let square_corner = block.output_connection().is_some() || has_hat || follows_sibling;

        let mut row = Row::top(constants);
        row.elements.push(if square_corner {
            Measurable::square_corner(constants)
        } else {
            Measurable::round_corner(constants)
        });

        if has_hat {
            row.elements.push(Measurable::hat(constants));
        } else if block.previous_connection().is_some() {
            row.kind = RowKind::Top {
                capline: 0.0,
                ascender_height: 0.0,
                has_previous_connection: true,
            };
            row.elements.push(Measurable::previous_connection(constants));
        }

        let precedes_statement = block
            .inputs()
            .first()
            .is_some_and(|input| input.kind() == InputKind::Statement);
        row.min_height = if precedes_statement && !self.is_collapsed {
            constants.top_row_precedes_statement_min_height
        } else {
            constants.top_row_min_height
        };
        Ok(row)
    }

    fn populate_bottom_row(&self) -> Result<Row, RenderError> {
        let constants = self.constants;
        let block = self.block;

        let has_next = block.next_connection().is_some();
        let mut row = Row::bottom(constants);
        if has_next {
            row.kind = RowKind::Bottom {
                descender_height: 0.0,
                baseline: 0.0,
                has_next_connection: true,
            };
        }

        let follows_statement = block
            .inputs()
            .last()
            .is_some_and(|input| input.kind() == InputKind::Statement);
        // The dark path adds a pixel below the block.
        row.min_height = if follows_statement {
            constants.bottom_row_after_statement_min_height
        } else {
            constants.medium_padding - constants.dark_path_offset
        };

        let square_corner = block.output_connection().is_some()
            || self.workspace.next_block(block.id())?.is_some();
        row.elements.push(if square_corner {
            Measurable::square_corner(constants)
        } else {
            Measurable::round_corner(constants)
        });
        if has_next {
            row.elements.push(Measurable::next_connection(constants));
        }
        Ok(row)
    }

    fn add_input(&self, index: usize, row: &mut Row) -> Result<(), RenderError> {
        let constants = self.constants;
        let Some(input) = self.block.inputs().get(index) else {
            return Err(RenderError::MissingInput {
                block: self.block.id(),
                row: self.rows.len(),
            });
        };

        let connected_size = match input.connected_block() {
            Some(child) => Some(self.workspace.height_width(child, constants.notch_height)?),
            None => None,
        };

        match input.kind() {
            InputKind::Value if self.is_inline => {
                row.elements.push(Measurable::input(
                    constants,
                    self.block,
                    index,
                    true,
                    connected_size,
                )?);
                row.has_inline_input = true;
            }
            InputKind::Statement => {
                row.elements.push(Measurable::input(
                    constants,
                    self.block,
                    index,
                    false,
                    connected_size,
                )?);
                row.has_statement = true;
            }
            InputKind::Value => {
                row.elements.push(Measurable::input(
                    constants,
                    self.block,
                    index,
                    false,
                    connected_size,
                )?);
                row.has_external_input = true;
            }
            InputKind::Dummy | InputKind::EndRow => {
                row.min_height = row.min_height.max(constants.dummy_input_min_height);
                row.has_dummy_input = true;
            }
        }

        if !self.is_inline && row.align.is_none() {
            row.align = Some(input.align());
        }
        Ok(())
    }

    // ====================================================================
    // Spacing
    // ====================================================================

    fn add_elem_spacing(&mut self) {
        let constants = self.constants;
        let has_external_inputs = self.rows.iter().any(|row| row.has_external_input);

        let mut rows = std::mem::take(&mut self.rows);
        for row in &mut rows {
            let old = std::mem::take(&mut row.elements);
            if row.starts_with_elem_spacer() {
                let spacing = self.in_row_spacing(None, old.first());
                row.elements.push(Measurable::spacer(constants, spacing));
            }
            let Some(last) = old.last().cloned() else {
                continue;
            };
            for pair in old.windows(2) {
                row.elements.push(pair[0].clone());
                let spacing = self.in_row_spacing(Some(&pair[0]), Some(&pair[1]));
                row.elements.push(Measurable::spacer(constants, spacing));
            }
            let ends_with_spacer = row.ends_with_elem_spacer();
            let mut spacing = self.in_row_spacing(Some(&last), None);
            row.elements.push(last);
            if ends_with_spacer {
                if has_external_inputs && row.has_dummy_input {
                    spacing += constants.tab_width;
                }
                row.elements.push(Measurable::spacer(constants, spacing));
            }
        }
        self.rows = rows;
    }

    /// Horizontal gap between two neighbouring elements. `None` stands for
    /// the start or end of the row.
    pub fn in_row_spacing(&self, prev: Option<&Measurable>, next: Option<&Measurable>) -> f64 {
        let constants = self.constants;

        let Some(prev) = prev else {
            return match next {
                Some(next) if next.is_editable_field() => constants.medium_padding,
                Some(next) if next.is_inline_input() => constants.medium_large_padding,
                Some(next) if next.is_statement_input() => constants.statement_input_padding_left,
                _ => constants.large_padding,
            };
        };

        // Between a non-input and the end of the row or a statement input.
        if !prev.is_input() && next.is_none_or(Measurable::is_statement_input) {
            if prev.is_editable_field() {
                return if prev.width == 0.0 {
                    constants.no_padding
                } else {
                    constants.medium_padding
                };
            }
            if prev.is_icon() {
                return constants.large_padding * 2.0 + 1.0;
            }
            if prev.is_hat() {
                return constants.no_padding;
            }
            if prev.is_statement_connection() {
                return constants.large_padding;
            }
            if prev.is_left_rounded_corner() {
                return constants.min_block_width;
            }
            if prev.is_jagged_edge() {
                return constants.no_padding;
            }
            return constants.large_padding;
        }

        let Some(next) = next else {
            // Between an input and the end of the row.
            return if prev.is_inline_input() {
                constants.large_padding
            } else {
                constants.no_padding
            };
        };

        // Between a non-input and an input.
        if !prev.is_input() && next.is_input() {
            if prev.is_editable_field() {
                if next.is_inline_input() || next.is_external_input() {
                    return constants.small_padding;
                }
            } else if next.is_inline_input() || next.is_external_input() {
                return constants.medium_large_padding;
            } else if next.is_statement_input() {
                return constants.large_padding;
            }
            return constants.large_padding - 1.0;
        }

        if prev.is_icon() && !next.is_input() {
            return constants.large_padding;
        }

        if prev.is_inline_input() && next.is_field() {
            return if next.is_editable_field() {
                constants.medium_padding
            } else {
                constants.large_padding
            };
        }

        // Next notches shift half the dark path offset to the left in both
        // directions so the dark path under the previous block shows.
        let next_notch_shift =
            (if self.rtl { 1.0 } else { -1.0 }) * constants.dark_path_offset / 2.0;

        if prev.is_left_square_corner() {
            if next.is_hat() {
                return constants.no_padding;
            }
            if next.is_previous_connection() {
                return next.notch_offset;
            }
            if next.is_next_connection() {
                return next.notch_offset + next_notch_shift;
            }
        }

        if prev.is_left_rounded_corner() {
            if next.is_previous_connection() {
                return next.notch_offset - constants.corner_radius;
            }
            if next.is_next_connection() {
                return next.notch_offset - constants.corner_radius + next_notch_shift;
            }
        }

        if prev.is_field()
            && next.is_field()
            && prev.is_editable_field() == next.is_editable_field()
        {
            return if prev.width == 0.0 {
                constants.no_padding
            } else {
                constants.large_padding
            };
        }

        if next.is_jagged_edge() {
            return constants.large_padding;
        }

        constants.medium_padding
    }

    fn add_row_spacing(&mut self) {
        let old = std::mem::take(&mut self.rows);
        let mut rows = Vec::with_capacity(old.len() * 2);
        let mut iter = old.into_iter().peekable();
        while let Some(row) = iter.next() {
            let spacer = iter.peek().map(|next| self.make_spacer_row(&row, next));
            rows.push(row);
            rows.extend(spacer);
        }
        self.rows = rows;
    }

    fn make_spacer_row(&self, prev: &Row, next: &Row) -> Row {
        let height = self.spacer_row_height(prev, next);
        let width = self.width - self.start_x;
        let mut spacer = Row::spacer(self.constants, height, width);
        spacer.set_statement_neighbours(prev.has_statement, next.has_statement);
        spacer
    }

    /// Vertical gap between two neighbouring rows.
    pub fn spacer_row_height(&self, prev: &Row, next: &Row) -> f64 {
        let constants = self.constants;
        // An empty block still needs some height.
        if prev.is_top() && next.is_bottom() {
            return constants.empty_block_spacer_height;
        }
        if prev.is_top() || next.is_bottom() {
            return constants.no_padding;
        }
        if prev.has_external_input && next.has_external_input {
            return constants.large_padding;
        }
        if !prev.has_statement && next.has_statement {
            return constants.between_statement_padding_y;
        }
        if prev.has_statement && next.has_statement {
            return constants.large_padding;
        }
        if !prev.has_statement && next.has_dummy_input {
            return constants.large_padding;
        }
        if prev.has_dummy_input {
            return constants.large_padding;
        }
        constants.medium_padding
    }

    // ====================================================================
    // Bounds and alignment
    // ====================================================================

    fn missing_input(&self, row: usize) -> RenderError {
        RenderError::MissingInput {
            block: self.block.id(),
            row,
        }
    }

    fn compute_bounds(&mut self) -> Result<(), RenderError> {
        let mut widest_statement_row_fields: f64 = 0.0;
        let mut block_width: f64 = 0.0;
        let mut widest_row_with_connected_blocks: f64 = 0.0;

        for row in &mut self.rows {
            row.measure();
        }
        for (index, row) in self.rows.iter().enumerate() {
            block_width = block_width.max(row.width);
            if row.has_statement {
                let input = row.last_input().ok_or_else(|| self.missing_input(index))?;
                widest_statement_row_fields =
                    widest_statement_row_fields.max(row.width - row.elements[input].width);
            }
            widest_row_with_connected_blocks =
                widest_row_with_connected_blocks.max(row.width_with_connected_blocks);
        }

        self.statement_edge = widest_statement_row_fields;
        self.width = block_width;
        for row in self.rows.iter_mut().filter(|row| row.has_statement) {
            row.statement_edge = widest_statement_row_fields;
        }

        self.width_with_children = block_width.max(widest_row_with_connected_blocks);

        if let Some(output) = &self.output_connection {
            self.start_x = output.width;
            self.width += output.width;
            self.width_with_children += output.width;
        }
        Ok(())
    }

    fn align_row_elements(&mut self) -> Result<(), RenderError> {
        if self.is_inline {
            return self.align_inline_row_elements();
        }
        for index in 0..self.rows.len() {
            if self.rows[index].has_statement {
                self.align_statement_row(index)?;
            } else {
                let desired = self.desired_row_width(&self.rows[index]);
                let row = &mut self.rows[index];
                let missing = desired - row.width;
                if missing > 0.0 {
                    add_alignment_padding(row, missing);
                }
                if row.is_top_or_bottom() {
                    row.width_with_connected_blocks = row.width;
                }
            }
        }
        Ok(())
    }

    /// Inline blocks only stretch a row as far as the widest neighbouring
    /// row between statement inputs, instead of to the full block width.
    fn align_inline_row_elements(&mut self) -> Result<(), RenderError> {
        let mut next_right_edge: f64 = 0.0;
        let mut row_next_right_edges = vec![0.0; self.rows.len()];
        let mut prev_input: Option<usize> = None;

        for index in (0..self.rows.len()).rev() {
            row_next_right_edges[index] = next_right_edge;
            if !self.rows[index].is_input_row() {
                continue;
            }
            if self.rows[index].has_statement {
                self.align_statement_row(index)?;
            }
            let row = &self.rows[index];
            match prev_input.map(|prev| &self.rows[prev]) {
                Some(prev) if prev.has_statement && row.width < prev.width => {
                    row_next_right_edges[index] = prev.width;
                }
                _ if row.has_statement => next_right_edge = row.width,
                _ => next_right_edge = next_right_edge.max(row.width),
            }
            prev_input = Some(index);
        }

        let mut prev_right_edge: f64 = 0.0;
        for (index, next_edge) in row_next_right_edges.into_iter().enumerate() {
            if self.rows[index].has_statement {
                prev_right_edge = self.desired_row_width(&self.rows[index]);
                continue;
            }
            let row = &mut self.rows[index];
            if row.is_spacer() {
                row.width = prev_right_edge.max(next_edge);
            } else {
                let missing = prev_right_edge.max(next_edge) - row.width;
                if missing > 0.0 {
                    add_alignment_padding(row, missing);
                }
                prev_right_edge = row.width;
            }
        }
        Ok(())
    }

    /// Width a row should be stretched to. Inline statement rows stop a
    /// fixed distance past the statement edge.
    pub fn desired_row_width(&self, row: &Row) -> f64 {
        if self.is_inline && row.has_statement {
            return self.statement_edge + self.constants.max_bottom_width + self.start_x;
        }
        self.width - self.start_x
    }

    /// Pads the fields of a statement row out to the statement edge, then
    /// widens the statement input itself to the block's right side.
    fn align_statement_row(&mut self, index: usize) -> Result<(), RenderError> {
        let input = self.rows[index]
            .last_input()
            .ok_or_else(|| self.missing_input(index))?;
        let statement_edge = self.statement_edge;

        let row = &mut self.rows[index];
        let missing = statement_edge - (row.width - row.elements[input].width);
        if missing > 0.0 {
            add_alignment_padding(row, missing);
        }

        let desired = self.desired_row_width(&self.rows[index]);
        let row = &mut self.rows[index];
        let grow = desired - row.width;
        let height = row.height;
        let element = &mut row.elements[input];
        element.width += grow;
        element.height = element.height.max(height);
        row.width += grow;
        row.width_with_connected_blocks = row
            .width
            .max(statement_edge + row.connected_block_widths());
        Ok(())
    }

    // ====================================================================
    // Finalize
    // ====================================================================

    fn finalize(&mut self) -> Result<(), RenderError> {
        let constants = self.constants;
        let ascender = self.rows.first().map_or(0.0, Row::ascender_height);
        let bottom_index = self.rows.len().saturating_sub(1);

        let mut widest_row_with_connected_blocks: f64 = 0.0;
        let mut y_cursor = 0.0;
        for index in 0..self.rows.len() {
            let start_x = self.start_x;
            let row = &mut self.rows[index];
            row.y_pos = y_cursor;
            row.x_pos = start_x;
            y_cursor += row.height;
            widest_row_with_connected_blocks =
                widest_row_with_connected_blocks.max(row.width_with_connected_blocks);

            // Short blocks grow above the bottom row's baseline so the next
            // notch stays put. A hat does not count toward the height.
            let height_without_hat = y_cursor - ascender;
            if index == bottom_index && height_without_hat < constants.min_block_height {
                let diff = constants.min_block_height - height_without_hat;
                row.height += diff;
                y_cursor += diff;
            }
            self.record_elem_positions(index);
        }

        if self.output_connection.is_some() {
            if let Some(next) = self.workspace.next_block(self.block.id())? {
                let (_, stack_width) = self.workspace.height_width(next, constants.notch_height)?;
                widest_row_with_connected_blocks = widest_row_with_connected_blocks
                    .max(stack_width - constants.dark_path_offset);
            }
        }

        if let Some(bottom) = self.rows.last_mut() {
            let baseline = y_cursor - bottom.descender_height();
            bottom.set_baseline(baseline);
        }
        self.width_with_children =
            widest_row_with_connected_blocks + self.start_x + constants.dark_path_offset;
        self.width += constants.dark_path_offset;
        self.height = y_cursor + constants.dark_path_offset;
        self.start_y = self.rows.first().map_or(0.0, Row::capline);
        Ok(())
    }

    fn record_elem_positions(&mut self, index: usize) {
        let mut x_cursor = self.rows[index].x_pos;
        for elem_index in 0..self.rows[index].elements.len() {
            let row_height = self.rows[index].height;
            let elem = &mut self.rows[index].elements[elem_index];
            if elem.is_spacer() {
                elem.height = row_height;
            }
            elem.x_pos = x_cursor;
            x_cursor += elem.width;
            let row = &self.rows[index];
            let centerline = self.elem_centerline(row, &row.elements[elem_index]);
            self.rows[index].elements[elem_index].centerline = centerline;
        }
    }

    /// Vertical centre of an element within its row.
    fn elem_centerline(&self, row: &Row, elem: &Measurable) -> f64 {
        if elem.is_spacer() {
            return row.y_pos + elem.height / 2.0;
        }
        if row.is_bottom() {
            let baseline = row.y_pos + row.height - row.descender_height();
            return if elem.is_next_connection() {
                baseline + elem.height / 2.0
            } else {
                baseline - elem.height / 2.0
            };
        }
        if row.is_top() {
            return if elem.is_hat() {
                row.capline() - elem.height / 2.0
            } else {
                row.capline() + elem.height / 2.0
            };
        }

        match elem.kind {
            ElementKind::Field(_) | ElementKind::Icon { .. } => {
                let offset = self.constants.tall_input_field_offset_y;
                let mut centerline = row.y_pos + elem.height / 2.0;
                if (row.has_inline_input || row.has_statement) && elem.height + offset <= row.height {
                    centerline += offset;
                }
                centerline
            }
            ElementKind::InlineInput(_) => row.y_pos + elem.height / 2.0,
            _ => row.y_pos + row.height / 2.0,
        }
    }
}

/// Gives a row `missing` extra width, placed according to its alignment.
fn add_alignment_padding(row: &mut Row, missing: f64) {
    if row.has_external_input || row.has_statement {
        row.width_with_connected_blocks += missing;
    }

    let first = row.first_spacer();
    let last = row.last_spacer();
    match row.align {
        Some(Align::Centre) => {
            if let Some(first) = first {
                row.elements[first].width += missing / 2.0;
            }
            if let Some(last) = last {
                row.elements[last].width += missing / 2.0;
            }
        }
        Some(Align::Right) => {
            if let Some(first) = first {
                row.elements[first].width += missing;
            }
        }
        Some(Align::Left) | None => {
            if let Some(last) = last {
                row.elements[last].width += missing;
            }
        }
    }
    row.width += missing;
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use float_cmp::assert_approx_eq;

    use blockwright_core::{
        block::{Icon, Input},
        field::{LabelField, TextInputField},
        geometry::Size,
    };

    use super::*;

    static GERAS: LazyLock<ConstantProvider> = LazyLock::new(ConstantProvider::geras);

    fn measure(workspace: &Workspace, id: BlockId) -> RenderInfo<'_> {
        let mut info = RenderInfo::new(&GERAS, workspace, id).expect("block exists");
        info.measure().expect("measure succeeds");
        info
    }

    fn element_widths(row: &Row) -> Vec<f64> {
        row.elements.iter().map(|elem| elem.width).collect()
    }

    #[test]
    fn test_empty_block_has_minimum_height() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(Block::new("empty"));
        let info = measure(&workspace, id);

        // top, spacer, bottom
        assert_eq!(info.rows.len(), 3);
        assert_approx_eq!(f64, info.rows[1].height, 16.0);
        assert!(info.height >= 24.0);
        assert_approx_eq!(f64, info.height, 26.0);
        assert_approx_eq!(f64, info.width, 21.0);
    }

    #[test]
    fn test_statement_block_with_label() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("say")
                .with_previous_statement()
                .with_next_statement()
                .with_input(Input::dummy("").with_field(LabelField::new("say"))),
        );
        let info = measure(&workspace, id);

        // top, spacer, input, spacer, bottom
        assert_eq!(info.rows.len(), 5);
        let top = &info.rows[0];
        assert!(top.elements[0].is_left_rounded_corner());
        assert_eq!(element_widths(top)[..3], [8.0, 7.0, 15.0]);

        let input = &info.rows[2];
        assert!(input.has_dummy_input);
        assert_eq!(input.align, Some(Align::Left));
        assert!(input.height >= 15.0);
        assert_approx_eq!(f64, info.width, info.rows[2].width + 1.0);
        assert_approx_eq!(f64, info.start_x, 0.0);
    }

    #[test]
    fn test_rows_share_a_right_edge() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("stacked")
                .with_input(Input::value("A").with_field(LabelField::new("a")))
                .with_input(Input::value("B").with_field(LabelField::new("a much longer label"))),
        );
        let info = measure(&workspace, id);
        let widths: Vec<f64> = info.rows.iter().map(|row| row.width).collect();
        for width in &widths {
            assert_approx_eq!(f64, *width, widths[0]);
        }
    }

    #[test]
    fn test_inline_inputs_share_a_row() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("add")
                .with_output()
                .with_inputs_inline(true)
                .with_input(Input::value("A"))
                .with_input(Input::value("B")),
        );
        let info = measure(&workspace, id);

        let input_rows: Vec<&Row> = info.rows.iter().filter(|row| row.is_input_row()).collect();
        assert_eq!(input_rows.len(), 1);
        let row = input_rows[0];
        assert!(row.has_inline_input);
        assert_eq!(row.elements.iter().filter(|e| e.is_inline_input()).count(), 2);
        // leading 8, input, 5, input, trailing 10
        assert_eq!(element_widths(row), vec![8.0, 22.5, 5.0, 22.5, 10.0]);
        assert_approx_eq!(f64, info.start_x, 8.0);
    }

    #[test]
    fn test_end_row_starts_row_when_not_inline() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("pair")
                .with_output()
                .with_input(Input::value("A").with_field(LabelField::new("a")))
                .with_input(Input::end_row("B").with_field(LabelField::new("b"))),
        );
        let info = measure(&workspace, id);

        let input_rows: Vec<&Row> = info.rows.iter().filter(|row| row.is_input_row()).collect();
        assert_eq!(input_rows.len(), 2);
        assert!(input_rows[0].has_external_input);
        assert!(!input_rows[0].has_dummy_input);
        assert!(input_rows[1].has_dummy_input);
        assert!(!input_rows[1].has_external_input);
    }

    #[test]
    fn test_end_row_shares_row_when_inline() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("pair")
                .with_output()
                .with_inputs_inline(true)
                .with_input(Input::value("A").with_field(LabelField::new("a")))
                .with_input(Input::end_row("B").with_field(LabelField::new("b")))
                .with_input(Input::value("C")),
        );
        let info = measure(&workspace, id);

        let input_rows: Vec<&Row> = info.rows.iter().filter(|row| row.is_input_row()).collect();
        // The end-row input closes the first row; C starts the next one.
        assert_eq!(input_rows.len(), 2);
        assert!(input_rows[0].has_dummy_input);
        assert!(input_rows[0].has_inline_input);
    }

    #[test]
    fn test_collapsed_block_ends_in_jagged_edge() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("loop")
                .with_previous_statement()
                .with_input(Input::dummy("").with_field(LabelField::new("repeat")))
                .with_input(Input::statement("DO"))
                .with_icon(Icon::new("comment", Size::new(17.0, 17.0))),
        );
        workspace.set_collapsed(id, true).expect("collapse");
        let info = measure(&workspace, id);

        assert_eq!(info.hidden_icons, vec![0]);
        let row = info
            .rows
            .iter()
            .find(|row| row.is_input_row())
            .expect("input row");
        assert!(row.has_jagged_edge);
        assert!(!row.has_statement);
        let last = row.elements.iter().rev().find(|e| !e.is_spacer()).expect("element");
        assert!(last.is_jagged_edge());
    }

    #[test]
    fn test_square_corner_when_stacked() {
        let mut workspace = Workspace::new();
        let first = workspace.add_block(
            Block::new("a").with_previous_statement().with_next_statement(),
        );
        let second = workspace.add_block(
            Block::new("b").with_previous_statement().with_next_statement(),
        );
        workspace.connect_next(first, second).expect("connect");

        let info = measure(&workspace, second);
        assert!(info.rows[0].elements[0].is_left_square_corner());
        let info = measure(&workspace, first);
        assert!(info.rows[0].elements[0].is_left_rounded_corner());
        let bottom = info.bottom_row().expect("bottom row");
        assert!(bottom.elements[0].is_left_square_corner());
    }

    #[test]
    fn test_hat_from_start_hats() {
        let mut constants = ConstantProvider::geras();
        constants.add_start_hats = true;
        let mut workspace = Workspace::new();
        let id = workspace.add_block(Block::new("when").with_next_statement());
        let mut info = RenderInfo::new(&constants, &workspace, id).expect("block");
        info.measure().expect("measure");

        let top = info.top_row().expect("top row");
        assert!(top.elements.iter().any(Measurable::is_hat));
        assert!(top.elements[0].is_left_square_corner());
        assert_approx_eq!(f64, info.start_y, 15.0);
        // The hat does not count toward the minimum height.
        assert!(info.height - info.start_y >= 24.0);
    }

    #[test]
    fn test_statement_input_reaches_statement_edge() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("if")
                .with_input(Input::value("IF").with_field(LabelField::new("if")))
                .with_input(Input::statement("DO").with_field(LabelField::new("do"))),
        );
        let info = measure(&workspace, id);

        let statement_row = info
            .rows
            .iter()
            .find(|row| row.has_statement)
            .expect("statement row");
        let input = statement_row.last_input().expect("statement input");
        assert_approx_eq!(f64, statement_row.statement_edge, info.statement_edge);
        assert_approx_eq!(
            f64,
            statement_row.elements[input].x_pos,
            info.statement_edge
        );
        assert_approx_eq!(f64, statement_row.width, info.width - 1.0);
    }

    #[test]
    fn test_centre_alignment_splits_padding() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("centred")
                .with_input(
                    Input::dummy("")
                        .with_field(LabelField::new("x"))
                        .with_align(Align::Centre),
                )
                .with_input(Input::dummy("").with_field(LabelField::new("a much wider label"))),
        );
        let info = measure(&workspace, id);
        let row = &info.rows[2];
        let first = row.elements.first().expect("spacer").width;
        let last = row.elements.last().expect("spacer").width;
        // Both ends start at LARGE_PADDING.
        assert_approx_eq!(f64, first - 10.0, last - 10.0);
        assert!(first > 10.0);
    }

    #[test]
    fn test_editable_field_spacing() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("text")
                .with_output()
                .with_input(Input::dummy("").with_field(TextInputField::new("abc"))),
        );
        let info = measure(&workspace, id);
        let row = &info.rows[2];
        assert_approx_eq!(f64, row.elements[0].width, 5.0);
    }

    #[test]
    fn test_measure_is_idempotent() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(
            Block::new("repeat")
                .with_previous_statement()
                .with_input(Input::value("TIMES").with_field(LabelField::new("repeat")))
                .with_input(Input::statement("DO")),
        );
        let constants = ConstantProvider::geras();
        let mut info = RenderInfo::new(&constants, &workspace, id).expect("block");
        info.measure().expect("first measure");
        let first = info.rows.clone();
        info.measure().expect("second measure");
        assert_eq!(info.rows, first);
    }

    #[test]
    fn test_in_row_spacing_table() {
        let mut workspace = Workspace::new();
        let id = workspace.add_block(Block::new("spacing").with_input(Input::value("A")));
        let constants = ConstantProvider::geras();
        let info = RenderInfo::new(&constants, &workspace, id).expect("block");

        let label = Measurable::field(
            &constants,
            &constants.field_metrics(),
            &LabelField::new("x"),
            0,
            0,
        );
        let round = Measurable::round_corner(&constants);
        let square = Measurable::square_corner(&constants);
        let next = Measurable::next_connection(&constants);
        let previous = Measurable::previous_connection(&constants);
        let icon = Measurable::icon(&constants, info.block(), 0);
        let external = Measurable::input(&constants, info.block(), 0, false, None).expect("input");

        assert_approx_eq!(f64, info.in_row_spacing(None, Some(&label)), 10.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&round), None), 12.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&round), Some(&previous)), 7.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&round), Some(&next)), 6.5);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&square), Some(&next)), 14.5);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&icon), None), 21.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&label), Some(&external)), 8.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&external), None), 0.0);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&label), Some(&label)), 10.0);
    }

    #[test]
    fn test_rtl_shifts_next_notch_the_other_way() {
        let mut workspace = Workspace::new().with_rtl(true);
        let id = workspace.add_block(Block::new("rtl").with_next_statement());
        let constants = ConstantProvider::geras();
        let info = RenderInfo::new(&constants, &workspace, id).expect("block");
        let round = Measurable::round_corner(&constants);
        let next = Measurable::next_connection(&constants);
        assert_approx_eq!(f64, info.in_row_spacing(Some(&round), Some(&next)), 7.5);
    }
}
