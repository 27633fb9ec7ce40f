//! The visual atoms of a block.
//!
//! Every element a row holds is a [`Measurable`]: a size, a position filled
//! in by the measure pass, and an [`ElementKind`] payload saying what it is.
//! Sizes are computed when the element is created; positions are assigned
//! later, in `RenderInfo::finalize`.

use blockwright_core::{
    block::{Align, Block, InputKind},
    connection::ConnectionKind,
    field::{Field, FieldMetrics},
};

use super::{RenderError, constants::ConstantProvider};

/// A field inside an input's field row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldElement {
    /// Index of the owning input
    pub input: usize,
    /// Index of the field within that input
    pub field: usize,
    pub editable: bool,
    pub flip_rtl: bool,
}

/// Any input that can take a connected block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputElement {
    /// Index of the input on the block
    pub input: usize,
    pub align: Align,
    pub connection_kind: ConnectionKind,
    pub connected: bool,
    /// Width of the connected stack, or 0
    pub connected_block_width: f64,
    /// Height of the connected stack, or 0
    pub connected_block_height: f64,
    pub connection_width: f64,
    pub connection_height: f64,
    pub connection_offset_x: f64,
    pub connection_offset_y: f64,
}

/// What a [`Measurable`] represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementKind {
    Field(FieldElement),
    /// The icon at this index on the block
    Icon { index: usize },
    Hat { ascender_height: f64 },
    InRowSpacer,
    SquareCorner,
    RoundCorner,
    JaggedEdge,
    PreviousConnection,
    NextConnection,
    OutputConnection { connection_offset_y: f64 },
    InlineInput(InputElement),
    ExternalValueInput(InputElement),
    StatementInput(InputElement),
}

/// A sized, positioned element of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurable {
    pub kind: ElementKind,
    pub width: f64,
    pub height: f64,
    /// Left edge, relative to the block
    pub x_pos: f64,
    /// Vertical centre, relative to the block
    pub centerline: f64,
    pub notch_offset: f64,
}

impl Measurable {
    fn new(kind: ElementKind, width: f64, height: f64, constants: &ConstantProvider) -> Self {
        Self {
            kind,
            width,
            height,
            x_pos: 0.0,
            centerline: 0.0,
            notch_offset: constants.notch_offset_left,
        }
    }

    // ====================================================================
    // Constructors
    // ====================================================================

    pub fn field(
        constants: &ConstantProvider,
        metrics: &FieldMetrics,
        field: &dyn Field,
        input: usize,
        index: usize,
    ) -> Self {
        let size = field.size(metrics);
        let kind = ElementKind::Field(FieldElement {
            input,
            field: index,
            editable: field.is_editable(),
            flip_rtl: field.flip_rtl(),
        });
        Self::new(kind, size.width(), size.height(), constants)
    }

    pub fn icon(constants: &ConstantProvider, block: &Block, index: usize) -> Self {
        let size = block
            .icons()
            .get(index)
            .map(|icon| icon.size())
            .unwrap_or_default();
        Self::new(ElementKind::Icon { index }, size.width(), size.height(), constants)
    }

    pub fn hat(constants: &ConstantProvider) -> Self {
        let height = constants.start_hat.height;
        let kind = ElementKind::Hat {
            ascender_height: height,
        };
        Self::new(kind, constants.start_hat.width, height, constants)
    }

    pub fn spacer(constants: &ConstantProvider, width: f64) -> Self {
        Self::new(
            ElementKind::InRowSpacer,
            width,
            constants.spacer_default_height,
            constants,
        )
    }

    pub fn square_corner(constants: &ConstantProvider) -> Self {
        Self::new(
            ElementKind::SquareCorner,
            constants.no_padding,
            constants.notch.height,
            constants,
        )
    }

    /// The rounded corner reaches into the neighbouring row, so only half
    /// its radius counts toward this row's height.
    pub fn round_corner(constants: &ConstantProvider) -> Self {
        Self::new(
            ElementKind::RoundCorner,
            constants.corner_radius,
            constants.corner_radius / 2.0,
            constants,
        )
    }

    pub fn jagged_edge(constants: &ConstantProvider) -> Self {
        Self::new(
            ElementKind::JaggedEdge,
            constants.jagged_teeth.width,
            constants.jagged_teeth.height,
            constants,
        )
    }

    pub fn previous_connection(constants: &ConstantProvider) -> Self {
        Self::new(
            ElementKind::PreviousConnection,
            constants.notch.width,
            constants.notch.height,
            constants,
        )
    }

    pub fn next_connection(constants: &ConstantProvider) -> Self {
        Self::new(
            ElementKind::NextConnection,
            constants.notch.width,
            constants.notch.height,
            constants,
        )
    }

    pub fn output_connection(constants: &ConstantProvider) -> Self {
        let kind = ElementKind::OutputConnection {
            connection_offset_y: constants.tab_offset_from_top,
        };
        Self::new(
            kind,
            constants.puzzle_tab.width,
            constants.puzzle_tab.height,
            constants,
        )
    }

    /// Builds the element for the input at `index`, sized to its connected
    /// stack.
    ///
    /// `connected_size` is the `(height, width)` of the stack attached to
    /// the input, if any. Inline inputs and statement inputs grow by the
    /// dark path offset when occupied so the child looks embossed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingInput`] for an input kind that has no
    /// connection (dummy and end-row inputs).
    pub fn input(
        constants: &ConstantProvider,
        block: &Block,
        index: usize,
        inline: bool,
        connected_size: Option<(f64, f64)>,
    ) -> Result<Self, RenderError> {
        let missing = || RenderError::MissingInput {
            block: block.id(),
            row: index,
        };
        let input = block.inputs().get(index).ok_or_else(missing)?;
        let connection_kind = input.kind().connection_kind().ok_or_else(missing)?;

        let shape = constants.shape_for(connection_kind);
        let (connected_block_height, connected_block_width) = connected_size.unwrap_or((0.0, 0.0));
        let mut element = InputElement {
            input: index,
            align: input.align(),
            connection_kind,
            connected: connected_size.is_some(),
            connected_block_width,
            connected_block_height,
            connection_width: shape.width(),
            connection_height: shape.height(),
            connection_offset_x: 0.0,
            connection_offset_y: 0.0,
        };

        let measurable = match input.kind() {
            InputKind::Statement => {
                let height = if element.connected {
                    connected_block_height
                        + constants.statement_bottom_spacer
                        + constants.dark_path_offset
                } else {
                    constants.empty_statement_input_height
                };
                let width = constants.statement_input_notch_offset + shape.width();
                Self::new(ElementKind::StatementInput(element), width, height, constants)
            }
            InputKind::Value if inline => {
                element.connection_offset_y = constants.tab_offset_from_top;
                let (width, height) = if element.connected {
                    (
                        connected_block_width + constants.dark_path_offset,
                        connected_block_height + constants.dark_path_offset,
                    )
                } else {
                    (
                        constants.empty_inline_input_padding + element.connection_width,
                        constants.empty_inline_input_height,
                    )
                };
                Self::new(ElementKind::InlineInput(element), width, height, constants)
            }
            _ => {
                element.connection_offset_y = constants.tab_offset_from_top;
                let height = if element.connected {
                    connected_block_height - constants.tab_offset_from_top - constants.medium_padding
                } else {
                    shape.height()
                };
                let width = shape.width() + constants.external_value_input_padding;
                Self::new(
                    ElementKind::ExternalValueInput(element),
                    width,
                    height,
                    constants,
                )
            }
        };
        Ok(measurable)
    }

    // ====================================================================
    // Type queries
    // ====================================================================

    pub fn input_element(&self) -> Option<&InputElement> {
        match &self.kind {
            ElementKind::InlineInput(input)
            | ElementKind::ExternalValueInput(input)
            | ElementKind::StatementInput(input) => Some(input),
            _ => None,
        }
    }

    pub fn is_input(&self) -> bool {
        self.input_element().is_some()
    }

    pub fn is_inline_input(&self) -> bool {
        matches!(self.kind, ElementKind::InlineInput(_))
    }

    pub fn is_external_input(&self) -> bool {
        matches!(self.kind, ElementKind::ExternalValueInput(_))
    }

    pub fn is_statement_input(&self) -> bool {
        matches!(self.kind, ElementKind::StatementInput(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, ElementKind::Field(_))
    }

    pub fn is_editable_field(&self) -> bool {
        matches!(self.kind, ElementKind::Field(field) if field.editable)
    }

    pub fn is_icon(&self) -> bool {
        matches!(self.kind, ElementKind::Icon { .. })
    }

    pub fn is_hat(&self) -> bool {
        matches!(self.kind, ElementKind::Hat { .. })
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self.kind, ElementKind::InRowSpacer)
    }

    pub fn is_left_square_corner(&self) -> bool {
        matches!(self.kind, ElementKind::SquareCorner)
    }

    pub fn is_left_rounded_corner(&self) -> bool {
        matches!(self.kind, ElementKind::RoundCorner)
    }

    pub fn is_jagged_edge(&self) -> bool {
        matches!(self.kind, ElementKind::JaggedEdge)
    }

    pub fn is_previous_connection(&self) -> bool {
        matches!(self.kind, ElementKind::PreviousConnection)
    }

    pub fn is_next_connection(&self) -> bool {
        matches!(self.kind, ElementKind::NextConnection)
    }

    /// Previous or next connection.
    pub fn is_statement_connection(&self) -> bool {
        self.is_previous_connection() || self.is_next_connection()
    }

    /// Distance from the top of the element to its connection, for inputs
    /// and the output tab.
    pub fn connection_offset_y(&self) -> f64 {
        match &self.kind {
            ElementKind::OutputConnection {
                connection_offset_y,
            } => *connection_offset_y,
            _ => self
                .input_element()
                .map_or(0.0, |input| input.connection_offset_y),
        }
    }

    /// Vertical top of the element.
    pub fn top(&self) -> f64 {
        self.centerline - self.height / 2.0
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use blockwright_core::{
        block::Input,
        field::{LabelField, TextInputField},
    };

    use super::*;

    fn constants() -> ConstantProvider {
        ConstantProvider::geras()
    }

    #[test]
    fn test_corner_sizes() {
        let constants = constants();
        let round = Measurable::round_corner(&constants);
        assert_approx_eq!(f64, round.width, 8.0);
        assert_approx_eq!(f64, round.height, 4.0);
        let square = Measurable::square_corner(&constants);
        assert_approx_eq!(f64, square.width, 0.0);
        assert_approx_eq!(f64, square.height, 4.0);
    }

    #[test]
    fn test_connection_sizes() {
        let constants = constants();
        let previous = Measurable::previous_connection(&constants);
        assert_approx_eq!(f64, previous.width, 15.0);
        assert_approx_eq!(f64, previous.notch_offset, 15.0);
        let output = Measurable::output_connection(&constants);
        assert_approx_eq!(f64, output.width, 8.0);
        assert_approx_eq!(f64, output.height, 15.0);
    }

    #[test]
    fn test_field_measurable_copies_flags() {
        let constants = constants();
        let metrics = constants.field_metrics();
        let field = TextInputField::new("");
        let element = Measurable::field(&constants, &metrics, &field, 2, 1);
        assert!(element.is_editable_field());
        assert_approx_eq!(f64, element.width, 10.0);
        let ElementKind::Field(data) = element.kind else {
            panic!("expected a field element");
        };
        assert_eq!((data.input, data.field), (2, 1));

        let label = Measurable::field(&constants, &metrics, &LabelField::new("x"), 0, 0);
        assert!(label.is_field());
        assert!(!label.is_editable_field());
    }

    #[test]
    fn test_empty_inline_input() {
        let constants = constants();
        let block = Block::new("test").with_input(Input::value("A"));
        let element = Measurable::input(&constants, &block, 0, true, None).expect("value input");
        assert!(element.is_inline_input());
        assert_approx_eq!(f64, element.width, 22.5);
        assert_approx_eq!(f64, element.height, 26.0);
        let input = element.input_element().expect("input data");
        assert_approx_eq!(f64, input.connection_offset_y, 5.0);
        assert!(!input.connected);
    }

    #[test]
    fn test_connected_inline_input_is_embossed() {
        let constants = constants();
        let block = Block::new("test").with_input(Input::value("A"));
        let element =
            Measurable::input(&constants, &block, 0, true, Some((25.0, 40.0))).expect("value input");
        assert_approx_eq!(f64, element.width, 41.0);
        assert_approx_eq!(f64, element.height, 26.0);
    }

    #[test]
    fn test_external_input_sizes() {
        let constants = constants();
        let block = Block::new("test").with_input(Input::value("A"));
        let empty = Measurable::input(&constants, &block, 0, false, None).expect("value input");
        assert!(empty.is_external_input());
        assert_approx_eq!(f64, empty.width, 10.0);
        assert_approx_eq!(f64, empty.height, 15.0);

        let connected =
            Measurable::input(&constants, &block, 0, false, Some((30.0, 50.0))).expect("value input");
        assert_approx_eq!(f64, connected.height, 20.0);
    }

    #[test]
    fn test_statement_input_sizes() {
        let constants = constants();
        let block = Block::new("test").with_input(Input::statement("DO"));
        let empty = Measurable::input(&constants, &block, 0, false, None).expect("statement");
        assert!(empty.is_statement_input());
        assert_approx_eq!(f64, empty.width, 30.0);
        assert_approx_eq!(f64, empty.height, 24.0);

        let connected =
            Measurable::input(&constants, &block, 0, false, Some((25.0, 60.0))).expect("statement");
        assert_approx_eq!(f64, connected.height, 24.0);
    }

    #[test]
    fn test_dummy_input_has_no_measurable() {
        let constants = constants();
        let block = Block::new("test").with_input(Input::dummy(""));
        let result = Measurable::input(&constants, &block, 0, false, None);
        assert!(matches!(result, Err(RenderError::MissingInput { row: 0, .. })));
    }
}
