//! Blocks and their inputs.
//!
//! A [`Block`] is built once with the `with_*` methods and then added to a
//! [`Workspace`](crate::workspace::Workspace), which assigns its
//! [`BlockId`] and owns every link between blocks. Everything the renderer
//! reads (inputs, fields, icons, flags, style name) lives here; the sizes
//! the renderer computes are written back through
//! [`Block::set_rendered_size`].
//!
//! # Examples
//!
//! ```
//! use blockwright_core::{
//!     block::{Align, Block, Input},
//!     field::LabelField,
//! };
//!
//! let block = Block::new("controls_repeat")
//!     .with_previous_statement()
//!     .with_next_statement()
//!     .with_input(Input::dummy("").with_field(LabelField::new("repeat")))
//!     .with_input(Input::statement("DO").with_align(Align::Left))
//!     .with_style("loop_blocks");
//!
//! assert_eq!(block.inputs().len(), 2);
//! assert!(block.previous_connection().is_some());
//! ```

use std::fmt;

use serde::Deserialize;

use crate::{
    connection::{Connection, ConnectionKind},
    field::Field,
    geometry::{Point, Size},
};

/// Name of the dummy input that carries the summary label of a collapsed
/// block.
pub const COLLAPSED_INPUT_NAME: &str = "_TEMP_COLLAPSED_INPUT";

/// Index of a block inside its workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(usize);

impl BlockId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

/// Horizontal alignment of an input's fields within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    #[serde(alias = "center")]
    Centre,
    Right,
}

/// The kind of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Value socket, accepts a block with an output connection
    Value,
    /// Statement mouth, accepts a stack of statement blocks
    Statement,
    /// Fields only, no connection
    Dummy,
    /// Fields only; forces the next input onto a new row
    EndRow,
}

impl InputKind {
    /// The connection an input of this kind carries, if any.
    pub fn connection_kind(self) -> Option<ConnectionKind> {
        match self {
            Self::Value => Some(ConnectionKind::InputValue),
            Self::Statement => Some(ConnectionKind::NextStatement),
            Self::Dummy | Self::EndRow => None,
        }
    }
}

/// An input: a row of fields with an optional connection.
#[derive(Debug)]
pub struct Input {
    name: String,
    kind: InputKind,
    align: Align,
    visible: bool,
    fields: Vec<Box<dyn Field>>,
    connection: Option<Connection>,
}

impl Input {
    fn new(name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            name: name.into(),
            kind,
            align: Align::default(),
            visible: true,
            fields: Vec::new(),
            connection: kind.connection_kind().map(Connection::new),
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, InputKind::Value)
    }

    pub fn statement(name: impl Into<String>) -> Self {
        Self::new(name, InputKind::Statement)
    }

    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, InputKind::Dummy)
    }

    pub fn end_row(name: impl Into<String>) -> Self {
        Self::new(name, InputKind::EndRow)
    }

    /// Creates an input of the given kind.
    pub fn of_kind(name: impl Into<String>, kind: InputKind) -> Self {
        Self::new(name, kind)
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_field(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn with_boxed_field(mut self, field: Box<dyn Field>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn align(&self) -> Align {
        self.align
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn fields(&self) -> &[Box<dyn Field>] {
        &self.fields
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.connection.as_mut()
    }

    /// The block plugged into this input, if any.
    pub fn connected_block(&self) -> Option<BlockId> {
        self.connection.as_ref().and_then(Connection::target)
    }
}

/// An icon shown at the start of a block's first row.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    name: String,
    size: Size,
    shown_when_collapsed: bool,
}

impl Icon {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
            shown_when_collapsed: false,
        }
    }

    pub fn with_shown_when_collapsed(mut self, shown: bool) -> Self {
        self.shown_when_collapsed = shown;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_shown_when_collapsed(&self) -> bool {
        self.shown_when_collapsed
    }
}

/// Addresses one connection on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionSlot {
    Previous,
    Next,
    Output,
    /// The connection of the input at this index
    Input(usize),
}

impl ConnectionSlot {
    /// Whether a block attached here is a child of the slot's owner.
    pub fn is_parent_side(self) -> bool {
        matches!(self, Self::Next | Self::Input(_))
    }
}

/// A block on a workspace.
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    type_name: String,
    inputs: Vec<Input>,
    icons: Vec<Icon>,
    previous: Option<Connection>,
    next: Option<Connection>,
    output: Option<Connection>,
    inputs_inline: bool,
    collapsed: bool,
    shadow: bool,
    enabled: bool,
    insertion_marker: bool,
    hat: Option<String>,
    style_name: String,
    parent: Option<BlockId>,
    relative_position: Point,
    width: f64,
    height: f64,
    childless_width: f64,
}

impl Block {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            id: BlockId::default(),
            type_name: type_name.into(),
            inputs: Vec::new(),
            icons: Vec::new(),
            previous: None,
            next: None,
            output: None,
            inputs_inline: false,
            collapsed: false,
            shadow: false,
            enabled: true,
            insertion_marker: false,
            hat: None,
            style_name: String::new(),
            parent: None,
            relative_position: Point::default(),
            width: 0.0,
            height: 0.0,
            childless_width: 0.0,
        }
    }

    pub fn with_previous_statement(mut self) -> Self {
        self.previous = Some(Connection::new(ConnectionKind::PreviousStatement));
        self
    }

    pub fn with_next_statement(mut self) -> Self {
        self.next = Some(Connection::new(ConnectionKind::NextStatement));
        self
    }

    pub fn with_output(mut self) -> Self {
        self.output = Some(Connection::new(ConnectionKind::OutputValue));
        self
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icons.push(icon);
        self
    }

    pub fn with_inputs_inline(mut self, inline: bool) -> Self {
        self.inputs_inline = inline;
        self
    }

    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = style_name.into();
        self
    }

    /// Requests a hat shape, e.g. `"cap"`.
    pub fn with_hat(mut self, hat: impl Into<String>) -> Self {
        self.hat = Some(hat.into());
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_insertion_marker(mut self, insertion_marker: bool) -> Self {
        self.insertion_marker = insertion_marker;
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.relative_position = Point::new(x, y);
        self
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: BlockId) {
        self.id = id;
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut [Input] {
        &mut self.inputs
    }

    pub(crate) fn push_input(&mut self, input: Input) {
        self.inputs.push(input);
    }

    pub(crate) fn remove_input(&mut self, name: &str) -> Option<Input> {
        let index = self.input_index(name)?;
        Some(self.inputs.remove(index))
    }

    /// Looks up an input by name.
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name() == name)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input.name() == name)
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn previous_connection(&self) -> Option<&Connection> {
        self.previous.as_ref()
    }

    pub fn next_connection(&self) -> Option<&Connection> {
        self.next.as_ref()
    }

    pub fn output_connection(&self) -> Option<&Connection> {
        self.output.as_ref()
    }

    /// Returns the connection addressed by `slot`.
    pub fn connection(&self, slot: ConnectionSlot) -> Option<&Connection> {
        match slot {
            ConnectionSlot::Previous => self.previous.as_ref(),
            ConnectionSlot::Next => self.next.as_ref(),
            ConnectionSlot::Output => self.output.as_ref(),
            ConnectionSlot::Input(index) => self.inputs.get(index)?.connection(),
        }
    }

    pub fn connection_mut(&mut self, slot: ConnectionSlot) -> Option<&mut Connection> {
        match slot {
            ConnectionSlot::Previous => self.previous.as_mut(),
            ConnectionSlot::Next => self.next.as_mut(),
            ConnectionSlot::Output => self.output.as_mut(),
            ConnectionSlot::Input(index) => self.inputs.get_mut(index)?.connection_mut(),
        }
    }

    /// Every connection slot present on the block, parent side last.
    pub fn connection_slots(&self) -> Vec<ConnectionSlot> {
        let mut slots = Vec::new();
        if self.output.is_some() {
            slots.push(ConnectionSlot::Output);
        }
        if self.previous.is_some() {
            slots.push(ConnectionSlot::Previous);
        }
        slots.extend(
            self.inputs
                .iter()
                .enumerate()
                .filter(|(_, input)| input.connection().is_some())
                .map(|(index, _)| ConnectionSlot::Input(index)),
        );
        if self.next.is_some() {
            slots.push(ConnectionSlot::Next);
        }
        slots
    }

    pub fn inputs_inline(&self) -> bool {
        self.inputs_inline
    }

    pub fn set_inputs_inline(&mut self, inline: bool) {
        self.inputs_inline = inline;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub(crate) fn set_collapsed_flag(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_insertion_marker(&self) -> bool {
        self.insertion_marker
    }

    pub fn hat(&self) -> Option<&str> {
        self.hat.as_deref()
    }

    pub fn set_hat(&mut self, hat: Option<String>) {
        self.hat = hat;
    }

    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<BlockId>) {
        self.parent = parent;
    }

    /// Position relative to the parent block, or to the workspace origin for
    /// a top-level block.
    pub fn relative_position(&self) -> Point {
        self.relative_position
    }

    pub(crate) fn set_relative_position(&mut self, position: Point) {
        self.relative_position = position;
    }

    /// Rendered width including connected child blocks.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Rendered height of the block on its own.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Rendered width of the block on its own.
    pub fn childless_width(&self) -> f64 {
        self.childless_width
    }

    /// Records the size computed by the last successful render.
    pub fn set_rendered_size(&mut self, width: f64, height: f64, childless_width: f64) {
        self.width = width;
        self.height = height;
        self.childless_width = childless_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::LabelField;

    #[test]
    fn test_input_connections_follow_kind() {
        assert_eq!(
            Input::value("A").connection().map(Connection::kind),
            Some(ConnectionKind::InputValue)
        );
        assert_eq!(
            Input::statement("DO").connection().map(Connection::kind),
            Some(ConnectionKind::NextStatement)
        );
        assert!(Input::dummy("").connection().is_none());
        assert!(Input::end_row("").connection().is_none());
    }

    #[test]
    fn test_block_builder() {
        let block = Block::new("text_print")
            .with_previous_statement()
            .with_next_statement()
            .with_input(Input::value("TEXT").with_field(LabelField::new("print")))
            .with_style("text_blocks");

        assert_eq!(block.type_name(), "text_print");
        assert_eq!(block.style_name(), "text_blocks");
        assert!(block.output_connection().is_none());
        assert_eq!(block.input_index("TEXT"), Some(0));
        assert!(block.input("MISSING").is_none());
        assert!(block.is_enabled());
        assert!(!block.is_collapsed());
    }

    #[test]
    fn test_connection_slots_order() {
        let block = Block::new("if")
            .with_previous_statement()
            .with_next_statement()
            .with_input(Input::value("IF0"))
            .with_input(Input::dummy(""))
            .with_input(Input::statement("DO0"));

        assert_eq!(
            block.connection_slots(),
            vec![
                ConnectionSlot::Previous,
                ConnectionSlot::Input(0),
                ConnectionSlot::Input(2),
                ConnectionSlot::Next,
            ]
        );
        assert!(block.connection(ConnectionSlot::Input(1)).is_none());
        assert!(block.connection(ConnectionSlot::Output).is_none());
    }

    #[test]
    fn test_align_deserializes_both_spellings() {
        use serde::de::{IntoDeserializer, value::Error};

        fn parse(value: &str) -> Result<Align, Error> {
            Align::deserialize(value.into_deserializer())
        }

        assert_eq!(parse("centre").unwrap(), Align::Centre);
        assert_eq!(parse("center").unwrap(), Align::Centre);
        assert_eq!(parse("right").unwrap(), Align::Right);
        assert!(parse("middle").is_err());
    }
}
