//! Horizontal bands of measurables.
//!
//! A block is measured as a stack of [`Row`]s: one top row, one or more
//! input rows, one bottom row, and spacer rows between every pair. The
//! [`RowKind`] payload carries what only one kind of row needs.

use blockwright_core::block::Align;

use super::{
    constants::ConstantProvider,
    measurables::{ElementKind, Measurable},
};

/// What a [`Row`] represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowKind {
    /// The cap of the block: corner, hat or previous notch.
    Top {
        /// Distance from the top of the row to the top of the block body
        capline: f64,
        /// Height of a hat sticking out above the block body
        ascender_height: f64,
        has_previous_connection: bool,
    },
    /// The base of the block: corner and next notch.
    Bottom {
        /// Height of the next notch hanging below the block body
        descender_height: f64,
        /// Y of the bottom edge of the block body, set by finalize
        baseline: f64,
        has_next_connection: bool,
    },
    /// Vertical gap between two rows, holding a single spacer.
    Spacer {
        follows_statement: bool,
        precedes_statement: bool,
    },
    /// Fields and inputs.
    Input {
        /// Width of blocks attached to this row's inputs, beyond the row
        connected_block_widths: f64,
    },
}

/// One horizontal band of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub elements: Vec<Measurable>,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub width_with_connected_blocks: f64,
    pub x_pos: f64,
    pub y_pos: f64,
    pub has_external_input: bool,
    pub has_statement: bool,
    pub has_inline_input: bool,
    pub has_dummy_input: bool,
    pub has_jagged_edge: bool,
    /// Alignment of the row's inputs; `None` aligns left
    pub align: Option<Align>,
    /// Left edge of statement inputs, shared by every statement row
    pub statement_edge: f64,
    pub notch_offset: f64,
}

impl Row {
    fn new(kind: RowKind, constants: &ConstantProvider) -> Self {
        Self {
            kind,
            elements: Vec::new(),
            width: 0.0,
            height: 0.0,
            min_width: 0.0,
            min_height: 0.0,
            width_with_connected_blocks: 0.0,
            x_pos: 0.0,
            y_pos: 0.0,
            has_external_input: false,
            has_statement: false,
            has_inline_input: false,
            has_dummy_input: false,
            has_jagged_edge: false,
            align: None,
            statement_edge: 0.0,
            notch_offset: constants.notch_offset_left,
        }
    }

    pub fn top(constants: &ConstantProvider) -> Self {
        let kind = RowKind::Top {
            capline: 0.0,
            ascender_height: 0.0,
            has_previous_connection: false,
        };
        Self::new(kind, constants)
    }

    pub fn bottom(constants: &ConstantProvider) -> Self {
        let kind = RowKind::Bottom {
            descender_height: 0.0,
            baseline: 0.0,
            has_next_connection: false,
        };
        Self::new(kind, constants)
    }

    pub fn input(constants: &ConstantProvider) -> Self {
        let kind = RowKind::Input {
            connected_block_widths: 0.0,
        };
        Self::new(kind, constants)
    }

    /// A spacer row of fixed size. Its single spacer element carries the
    /// width so that alignment padding can grow it.
    pub fn spacer(constants: &ConstantProvider, height: f64, width: f64) -> Self {
        let kind = RowKind::Spacer {
            follows_statement: false,
            precedes_statement: false,
        };
        let mut row = Self::new(kind, constants);
        row.width = width;
        row.height = height;
        row.elements.push(Measurable::spacer(constants, width));
        row
    }

    // ====================================================================
    // Kind queries
    // ====================================================================

    pub fn is_top(&self) -> bool {
        matches!(self.kind, RowKind::Top { .. })
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.kind, RowKind::Bottom { .. })
    }

    pub fn is_top_or_bottom(&self) -> bool {
        self.is_top() || self.is_bottom()
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self.kind, RowKind::Spacer { .. })
    }

    pub fn is_input_row(&self) -> bool {
        matches!(self.kind, RowKind::Input { .. })
    }

    /// Distance from the top of the row to the top of the block body. Zero
    /// for every row but the top one.
    pub fn capline(&self) -> f64 {
        match self.kind {
            RowKind::Top { capline, .. } => capline,
            _ => 0.0,
        }
    }

    pub fn ascender_height(&self) -> f64 {
        match self.kind {
            RowKind::Top {
                ascender_height, ..
            } => ascender_height,
            _ => 0.0,
        }
    }

    pub fn descender_height(&self) -> f64 {
        match self.kind {
            RowKind::Bottom {
                descender_height, ..
            } => descender_height,
            _ => 0.0,
        }
    }

    pub fn baseline(&self) -> f64 {
        match self.kind {
            RowKind::Bottom { baseline, .. } => baseline,
            _ => 0.0,
        }
    }

    pub fn follows_statement(&self) -> bool {
        matches!(
            self.kind,
            RowKind::Spacer {
                follows_statement: true,
                ..
            }
        )
    }

    pub fn precedes_statement(&self) -> bool {
        matches!(
            self.kind,
            RowKind::Spacer {
                precedes_statement: true,
                ..
            }
        )
    }

    pub fn connected_block_widths(&self) -> f64 {
        match self.kind {
            RowKind::Input {
                connected_block_widths,
            } => connected_block_widths,
            _ => 0.0,
        }
    }

    // ====================================================================
    // Measuring
    // ====================================================================

    /// Fills in width, height and the kind-specific sizes from the row's
    /// elements. Spacer rows keep the size they were created with.
    pub fn measure(&mut self) {
        match self.kind {
            RowKind::Top {
                has_previous_connection,
                ..
            } => {
                let mut width = 0.0;
                let mut height: f64 = 0.0;
                let mut ascender: f64 = 0.0;
                for elem in &self.elements {
                    width += elem.width;
                    if elem.is_spacer() {
                        continue;
                    }
                    match elem.kind {
                        ElementKind::Hat { ascender_height } => {
                            ascender = ascender.max(ascender_height);
                        }
                        _ => height = height.max(elem.height),
                    }
                }
                self.width = self.min_width.max(width);
                self.height = self.min_height.max(height) + ascender;
                self.width_with_connected_blocks = self.width;
                self.kind = RowKind::Top {
                    capline: ascender,
                    ascender_height: ascender,
                    has_previous_connection,
                };
            }
            RowKind::Bottom {
                baseline,
                has_next_connection,
                ..
            } => {
                let mut width = 0.0;
                let mut height: f64 = 0.0;
                let mut descender: f64 = 0.0;
                for elem in &self.elements {
                    width += elem.width;
                    if elem.is_spacer() {
                        continue;
                    }
                    if elem.is_next_connection() {
                        descender = descender.max(elem.height);
                    } else {
                        height = height.max(elem.height);
                    }
                }
                self.width = self.min_width.max(width);
                self.height = self.min_height.max(height) + descender;
                self.width_with_connected_blocks = self.width;
                self.kind = RowKind::Bottom {
                    descender_height: descender,
                    baseline,
                    has_next_connection,
                };
            }
            RowKind::Spacer { .. } => {}
            RowKind::Input { .. } => {
                self.width = self.min_width;
                self.height = self.min_height;
                let mut connected_block_widths = 0.0;
                for elem in &self.elements {
                    self.width += elem.width;
                    if let Some(input) = elem.input_element() {
                        if elem.is_statement_input() {
                            connected_block_widths += input.connected_block_width;
                        } else if elem.is_external_input() && input.connected_block_width != 0.0 {
                            connected_block_widths +=
                                input.connected_block_width - input.connection_width;
                        }
                    }
                    if !elem.is_spacer() {
                        self.height = self.height.max(elem.height);
                    }
                }
                self.width_with_connected_blocks = self.width + connected_block_widths;
                self.kind = RowKind::Input {
                    connected_block_widths,
                };
            }
        }
    }

    /// Top and bottom rows start with their corner, not a spacer.
    pub fn starts_with_elem_spacer(&self) -> bool {
        !self.is_top_or_bottom()
    }

    /// Rows ending in an external or statement input run to the block edge.
    pub fn ends_with_elem_spacer(&self) -> bool {
        match self.kind {
            RowKind::Input { .. } => !self.has_external_input && !self.has_statement,
            _ => true,
        }
    }

    // ====================================================================
    // Element lookup
    // ====================================================================

    /// Index of the last input element.
    pub fn last_input(&self) -> Option<usize> {
        self.elements.iter().rposition(Measurable::is_input)
    }

    pub fn first_spacer(&self) -> Option<usize> {
        self.elements.iter().position(Measurable::is_spacer)
    }

    pub fn last_spacer(&self) -> Option<usize> {
        self.elements.iter().rposition(Measurable::is_spacer)
    }

    pub(super) fn set_baseline(&mut self, value: f64) {
        if let RowKind::Bottom { baseline, .. } = &mut self.kind {
            *baseline = value;
        }
    }

    pub(super) fn set_statement_neighbours(&mut self, follows: bool, precedes: bool) {
        if let RowKind::Spacer {
            follows_statement,
            precedes_statement,
        } = &mut self.kind
        {
            *follows_statement = follows;
            *precedes_statement = precedes;
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn constants() -> ConstantProvider {
        ConstantProvider::geras()
    }

    #[test]
    fn test_top_row_with_hat_grows_by_ascender() {
        let constants = constants();
        let mut row = Row::top(&constants);
        row.min_height = constants.top_row_min_height;
        row.elements.push(Measurable::square_corner(&constants));
        row.elements.push(Measurable::hat(&constants));
        row.measure();

        assert_approx_eq!(f64, row.width, 100.0);
        assert_approx_eq!(f64, row.height, 20.0);
        assert_approx_eq!(f64, row.capline(), 15.0);
        assert_approx_eq!(f64, row.ascender_height(), 15.0);
        assert_approx_eq!(f64, row.width_with_connected_blocks, 100.0);
    }

    #[test]
    fn test_bottom_row_next_connection_is_descender() {
        let constants = constants();
        let mut row = Row::bottom(&constants);
        row.min_height = 4.0;
        row.elements.push(Measurable::round_corner(&constants));
        row.elements.push(Measurable::next_connection(&constants));
        row.measure();

        assert_approx_eq!(f64, row.descender_height(), 4.0);
        assert_approx_eq!(f64, row.height, 8.0);
        assert_approx_eq!(f64, row.width, 23.0);
    }

    #[test]
    fn test_spacer_row_keeps_its_size() {
        let constants = constants();
        let mut row = Row::spacer(&constants, 10.0, 42.0);
        row.measure();
        assert_approx_eq!(f64, row.height, 10.0);
        assert_approx_eq!(f64, row.width, 42.0);
        assert_eq!(row.elements.len(), 1);
        assert_approx_eq!(f64, row.elements[0].width, 42.0);
        assert!(row.starts_with_elem_spacer());
    }

    #[test]
    fn test_input_row_counts_connected_widths() {
        let constants = constants();
        let block = blockwright_core::block::Block::new("test")
            .with_input(blockwright_core::block::Input::value("A"));
        let mut row = Row::input(&constants);
        row.has_external_input = true;
        row.elements.push(Measurable::spacer(&constants, 10.0));
        row.elements
            .push(Measurable::input(&constants, &block, 0, false, Some((30.0, 50.0))).expect("input"));
        row.measure();

        assert_approx_eq!(f64, row.width, 20.0);
        assert_approx_eq!(f64, row.height, 20.0);
        assert_approx_eq!(f64, row.connected_block_widths(), 42.0);
        assert_approx_eq!(f64, row.width_with_connected_blocks, 62.0);
        assert!(!row.ends_with_elem_spacer());
        assert_eq!(row.last_input(), Some(1));
    }

    #[test]
    fn test_spacer_lookup() {
        let constants = constants();
        let mut row = Row::input(&constants);
        assert_eq!(row.first_spacer(), None);
        row.elements.push(Measurable::spacer(&constants, 1.0));
        row.elements.push(Measurable::jagged_edge(&constants));
        row.elements.push(Measurable::spacer(&constants, 2.0));
        assert_eq!(row.first_spacer(), Some(0));
        assert_eq!(row.last_spacer(), Some(2));
        assert_eq!(row.last_input(), None);
    }
}
