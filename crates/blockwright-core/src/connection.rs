//! Connection points between blocks.
//!
//! A connection's position is tracked two ways: relative to the top-left of
//! its own block (set by the renderer after every draw) and absolute in
//! workspace coordinates (updated whenever the block moves).

use crate::{block::BlockId, geometry::Point};

/// The four kinds of connection a block may carry.
///
/// A statement input's connection is a [`ConnectionKind::NextStatement`]:
/// it accepts the previous connection of the first block in the nested
/// stack, exactly like a block's own next connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Value input slot, accepts an output connection
    InputValue,
    /// Output plug on the left of a value block
    OutputValue,
    /// Next connection at the bottom of a block, or a statement input
    NextStatement,
    /// Previous connection at the top of a block
    PreviousStatement,
}

impl ConnectionKind {
    /// The kind a connection must have to connect to this one.
    pub fn opposite(self) -> Self {
        match self {
            Self::InputValue => Self::OutputValue,
            Self::OutputValue => Self::InputValue,
            Self::NextStatement => Self::PreviousStatement,
            Self::PreviousStatement => Self::NextStatement,
        }
    }

    /// Whether this connection belongs to the parent side of a link.
    pub fn is_superior(self) -> bool {
        matches!(self, Self::InputValue | Self::NextStatement)
    }
}

/// A connection point on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    kind: ConnectionKind,
    target: Option<BlockId>,
    offset_in_block: Point,
    position: Point,
}

impl Connection {
    pub fn new(kind: ConnectionKind) -> Self {
        Self {
            kind,
            target: None,
            offset_in_block: Point::default(),
            position: Point::default(),
        }
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// The block on the other side of this connection, if any.
    pub fn target(&self) -> Option<BlockId> {
        self.target
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn set_target(&mut self, target: Option<BlockId>) {
        self.target = target;
    }

    /// Offset from the top-left of the owning block.
    pub fn offset_in_block(&self) -> Point {
        self.offset_in_block
    }

    pub fn set_offset_in_block(&mut self, x: f64, y: f64) {
        self.offset_in_block = Point::new(x, y);
    }

    /// Absolute position in workspace coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Places the connection at its offset relative to `block_origin`.
    pub fn move_to_offset(&mut self, block_origin: Point) {
        self.position = block_origin.add_point(self.offset_in_block);
    }

    pub(crate) fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.add_point(Point::new(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_opposite_kinds() {
        assert_eq!(
            ConnectionKind::InputValue.opposite(),
            ConnectionKind::OutputValue
        );
        assert_eq!(
            ConnectionKind::PreviousStatement.opposite(),
            ConnectionKind::NextStatement
        );
        assert!(ConnectionKind::NextStatement.is_superior());
        assert!(!ConnectionKind::OutputValue.is_superior());
    }

    #[test]
    fn test_move_to_offset() {
        let mut connection = Connection::new(ConnectionKind::NextStatement);
        connection.set_offset_in_block(0.5, 41.0);
        connection.move_to_offset(Point::new(100.0, 20.0));

        assert_approx_eq!(f64, connection.position().x(), 100.5);
        assert_approx_eq!(f64, connection.position().y(), 61.0);
        assert!(!connection.is_connected());
    }

    #[test]
    fn test_move_by_shifts_position() {
        let mut connection = Connection::new(ConnectionKind::OutputValue);
        connection.move_to_offset(Point::new(10.0, 10.0));
        connection.move_by(-2.0, 3.0);
        assert_approx_eq!(f64, connection.position().x(), 8.0);
        assert_approx_eq!(f64, connection.position().y(), 13.0);
    }
}
