//! The block arena.
//!
//! A [`Workspace`] owns every block and is the only place where links
//! between blocks change. Blocks refer to each other by [`BlockId`], so a
//! parent/child link is a pair of ids on matching connections plus the
//! child's `parent` field.
//!
//! # Overview
//!
//! - Building: [`Workspace::add_block`], [`Workspace::connect_input`],
//!   [`Workspace::connect_next`], [`Workspace::disconnect`]
//! - Queries: [`Workspace::parent`], [`Workspace::children`],
//!   [`Workspace::next_block`], [`Workspace::previous_block`],
//!   [`Workspace::surface_xy`], [`Workspace::height_width`]
//! - Placement: [`Workspace::move_to`], [`Workspace::move_by`],
//!   [`Workspace::tighten`], [`Workspace::update_connection_locations`]
//! - Collapsing: [`Workspace::set_collapsed`], [`Workspace::to_text`]
//!
//! # Examples
//!
//! ```
//! use blockwright_core::{
//!     block::{Block, Input},
//!     workspace::Workspace,
//! };
//!
//! let mut workspace = Workspace::new();
//! let print = workspace.add_block(
//!     Block::new("text_print")
//!         .with_previous_statement()
//!         .with_input(Input::value("TEXT")),
//! );
//! let text = workspace.add_block(Block::new("text").with_output());
//!
//! workspace.connect_input(print, "TEXT", text).unwrap();
//! assert_eq!(workspace.parent(text).unwrap(), Some(print));
//! assert_eq!(workspace.top_blocks(), vec![print]);
//! ```

use log::debug;
use thiserror::Error;

use crate::{
    block::{Block, BlockId, COLLAPSED_INPUT_NAME, ConnectionSlot, Input, InputKind},
    connection::ConnectionKind,
    field::LabelField,
    geometry::Point,
};

/// Maximum characters in the summary label of a collapsed block.
pub const COLLAPSE_CHARS: usize = 30;

/// Errors raised when editing or querying a workspace.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("unknown block `{0}`")]
    UnknownBlock(BlockId),

    #[error("block `{block}` has no input named `{name}`")]
    UnknownInput { block: BlockId, name: String },

    #[error("block `{block}` has no {kind:?} connection")]
    MissingConnection {
        block: BlockId,
        kind: ConnectionKind,
    },

    #[error("connection on block `{block}` is already in use")]
    ConnectionOccupied { block: BlockId },

    #[error("block `{0}` is already attached to a parent")]
    AlreadyAttached(BlockId),

    #[error("attaching `{child}` to `{parent}` would create a cycle")]
    Cycle { parent: BlockId, child: BlockId },
}

/// Owner of all blocks and their links.
#[derive(Debug, Default)]
pub struct Workspace {
    blocks: Vec<Block>,
    rtl: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets right-to-left rendering for every block on the workspace.
    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl
    }

    pub fn set_rtl(&mut self, rtl: bool) {
        self.rtl = rtl;
    }

    /// Adds a block and returns its id.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        block.set_id(id);
        debug!(id:%, type_name = block.type_name(); "Added block");
        self.blocks.push(block);
        id
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, WorkspaceError> {
        self.blocks
            .get(id.index())
            .ok_or(WorkspaceError::UnknownBlock(id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, WorkspaceError> {
        self.blocks
            .get_mut(id.index())
            .ok_or(WorkspaceError::UnknownBlock(id))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks without a parent, in insertion order.
    pub fn top_blocks(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|block| block.parent().is_none())
            .map(Block::id)
            .collect()
    }

    // ====================================================================
    // Linking
    // ====================================================================

    /// Plugs `child` into the named input of `parent`.
    ///
    /// A value input takes the child's output connection; a statement input
    /// takes the child's previous connection.
    pub fn connect_input(
        &mut self,
        parent: BlockId,
        input_name: &str,
        child: BlockId,
    ) -> Result<(), WorkspaceError> {
        let index = self
            .block(parent)?
            .input_index(input_name)
            .ok_or_else(|| WorkspaceError::UnknownInput {
                block: parent,
                name: input_name.to_string(),
            })?;
        self.connect_slot(parent, ConnectionSlot::Input(index), child)
    }

    /// Attaches `child` below `parent` in a statement stack.
    pub fn connect_next(&mut self, parent: BlockId, child: BlockId) -> Result<(), WorkspaceError> {
        self.connect_slot(parent, ConnectionSlot::Next, child)
    }

    fn connect_slot(
        &mut self,
        parent: BlockId,
        slot: ConnectionSlot,
        child: BlockId,
    ) -> Result<(), WorkspaceError> {
        let parent_kind = match self.block(parent)?.connection(slot) {
            Some(connection) if connection.is_connected() => {
                return Err(WorkspaceError::ConnectionOccupied { block: parent });
            }
            Some(connection) => connection.kind(),
            None => {
                let kind = match slot {
                    ConnectionSlot::Input(_) => ConnectionKind::InputValue,
                    _ => ConnectionKind::NextStatement,
                };
                return Err(WorkspaceError::MissingConnection {
                    block: parent,
                    kind,
                });
            }
        };

        let child_kind = parent_kind.opposite();
        let child_slot = Self::child_slot(parent_kind);
        match self.block(child)?.connection(child_slot) {
            Some(connection) if connection.is_connected() => {
                return Err(WorkspaceError::AlreadyAttached(child));
            }
            Some(_) => {}
            None => {
                return Err(WorkspaceError::MissingConnection {
                    block: child,
                    kind: child_kind,
                });
            }
        }
        if self.block(child)?.parent().is_some() {
            return Err(WorkspaceError::AlreadyAttached(child));
        }
        if child == parent || self.is_ancestor(child, parent)? {
            return Err(WorkspaceError::Cycle { parent, child });
        }

        self.set_target(parent, slot, Some(child))?;
        self.set_target(child, child_slot, Some(parent))?;
        self.block_mut(child)?.set_parent(Some(parent));
        debug!(parent:%, child:%, slot:?; "Connected blocks");
        Ok(())
    }

    /// Detaches `child` from its parent, keeping its absolute position.
    pub fn disconnect(&mut self, child: BlockId) -> Result<(), WorkspaceError> {
        let Some(parent) = self.block(child)?.parent() else {
            return Ok(());
        };
        let position = self.surface_xy(child)?;

        let parent_slot = self.slot_holding(parent, child)?;
        if let Some(slot) = parent_slot {
            self.set_target(parent, slot, None)?;
        }
        for slot in [ConnectionSlot::Output, ConnectionSlot::Previous] {
            self.set_target(child, slot, None)?;
        }

        let block = self.block_mut(child)?;
        block.set_parent(None);
        block.set_relative_position(position);
        debug!(parent:%, child:%; "Disconnected blocks");
        Ok(())
    }

    /// The slot a child attaches with when plugged into `parent_kind`.
    fn child_slot(parent_kind: ConnectionKind) -> ConnectionSlot {
        match parent_kind {
            ConnectionKind::InputValue | ConnectionKind::OutputValue => ConnectionSlot::Output,
            ConnectionKind::NextStatement | ConnectionKind::PreviousStatement => {
                ConnectionSlot::Previous
            }
        }
    }

    fn set_target(
        &mut self,
        id: BlockId,
        slot: ConnectionSlot,
        target: Option<BlockId>,
    ) -> Result<(), WorkspaceError> {
        if let Some(connection) = self.block_mut(id)?.connection_mut(slot) {
            connection.set_target(target);
        }
        Ok(())
    }

    /// The connection slot on `parent` that holds `child`, if any.
    pub fn slot_holding(
        &self,
        parent: BlockId,
        child: BlockId,
    ) -> Result<Option<ConnectionSlot>, WorkspaceError> {
        let block = self.block(parent)?;
        Ok(block.connection_slots().into_iter().find(|slot| {
            slot.is_parent_side()
                && block
                    .connection(*slot)
                    .is_some_and(|connection| connection.target() == Some(child))
        }))
    }

    fn is_ancestor(&self, candidate: BlockId, id: BlockId) -> Result<bool, WorkspaceError> {
        let mut current = self.block(id)?.parent();
        while let Some(ancestor) = current {
            if ancestor == candidate {
                return Ok(true);
            }
            current = self.block(ancestor)?.parent();
        }
        Ok(false)
    }

    // ====================================================================
    // Queries
    // ====================================================================

    pub fn parent(&self, id: BlockId) -> Result<Option<BlockId>, WorkspaceError> {
        Ok(self.block(id)?.parent())
    }

    /// Directly connected child blocks: input children in input order, then
    /// the next block.
    pub fn children(&self, id: BlockId) -> Result<Vec<BlockId>, WorkspaceError> {
        let block = self.block(id)?;
        let mut children: Vec<BlockId> = block
            .inputs()
            .iter()
            .filter_map(Input::connected_block)
            .collect();
        children.extend(block.next_connection().and_then(|c| c.target()));
        Ok(children)
    }

    /// `id` and every block below it, parents before children.
    pub fn descendants(&self, id: BlockId) -> Result<Vec<BlockId>, WorkspaceError> {
        let mut ordered = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            ordered.push(current);
            let mut children = self.children(current)?;
            children.reverse();
            stack.extend(children);
        }
        Ok(ordered)
    }

    /// The block attached to the next connection.
    pub fn next_block(&self, id: BlockId) -> Result<Option<BlockId>, WorkspaceError> {
        Ok(self
            .block(id)?
            .next_connection()
            .and_then(|connection| connection.target()))
    }

    /// The block attached to the previous connection. For the first block in
    /// a statement input this is the block that owns the input.
    pub fn previous_block(&self, id: BlockId) -> Result<Option<BlockId>, WorkspaceError> {
        Ok(self
            .block(id)?
            .previous_connection()
            .and_then(|connection| connection.target()))
    }

    /// The nearest ancestor whose input (rather than next connection)
    /// contains `id`, possibly through a statement stack.
    pub fn surround_parent(&self, id: BlockId) -> Result<Option<BlockId>, WorkspaceError> {
        let mut current = id;
        let mut parent = self.block(id)?.parent();
        while let Some(candidate) = parent {
            if self.next_block(candidate)? != Some(current) {
                return Ok(Some(candidate));
            }
            current = candidate;
            parent = self.block(candidate)?.parent();
        }
        Ok(None)
    }

    /// Whether any surrounding block is disabled.
    pub fn is_inherited_disabled(&self, id: BlockId) -> Result<bool, WorkspaceError> {
        let mut current = self.surround_parent(id)?;
        while let Some(ancestor) = current {
            if !self.block(ancestor)?.is_enabled() {
                return Ok(true);
            }
            current = self.surround_parent(ancestor)?;
        }
        Ok(false)
    }

    /// Whether the block is drawn: no ancestor hides the input it sits in.
    pub fn is_visible(&self, id: BlockId) -> Result<bool, WorkspaceError> {
        let mut current = id;
        while let Some(parent) = self.block(current)?.parent() {
            let block = self.block(parent)?;
            let hidden = block
                .inputs()
                .iter()
                .any(|input| input.connected_block() == Some(current) && !input.is_visible());
            if hidden {
                return Ok(false);
            }
            current = parent;
        }
        Ok(true)
    }

    /// Absolute position of the block's top-left corner.
    pub fn surface_xy(&self, id: BlockId) -> Result<Point, WorkspaceError> {
        let mut position = Point::default();
        let mut current = Some(id);
        while let Some(block_id) = current {
            let block = self.block(block_id)?;
            position = position.add_point(block.relative_position());
            current = block.parent();
        }
        Ok(position)
    }

    /// Height and width of the block plus every block below it in its
    /// stack. Consecutive blocks overlap by `notch_height`.
    pub fn height_width(&self, id: BlockId, notch_height: f64) -> Result<(f64, f64), WorkspaceError> {
        let block = self.block(id)?;
        let mut height = block.height();
        let mut width = block.width();
        let mut next = self.next_block(id)?;
        while let Some(next_id) = next {
            let next_block = self.block(next_id)?;
            height += next_block.height() - notch_height;
            width = width.max(next_block.width());
            next = self.next_block(next_id)?;
        }
        Ok((height, width))
    }

    // ====================================================================
    // Placement
    // ====================================================================

    /// Sets the position relative to the parent (or the workspace origin).
    pub fn move_to(&mut self, id: BlockId, position: Point) -> Result<(), WorkspaceError> {
        let current = self.block(id)?.relative_position();
        let delta = position.sub_point(current);
        self.move_by(id, delta.x(), delta.y())
    }

    /// Moves a block and its whole subtree, connections included.
    pub fn move_by(&mut self, id: BlockId, dx: f64, dy: f64) -> Result<(), WorkspaceError> {
        let block = self.block_mut(id)?;
        let position = block.relative_position().add_point(Point::new(dx, dy));
        block.set_relative_position(position);

        for block_id in self.descendants(id)? {
            let block = self.block_mut(block_id)?;
            for slot in block.connection_slots() {
                if let Some(connection) = block.connection_mut(slot) {
                    connection.move_by(dx, dy);
                }
            }
        }
        Ok(())
    }

    /// Moves the block attached at `slot` so that its connection sits
    /// exactly on the slot's connection.
    pub fn tighten(&mut self, id: BlockId, slot: ConnectionSlot) -> Result<(), WorkspaceError> {
        let Some(connection) = self.block(id)?.connection(slot) else {
            return Ok(());
        };
        let Some(child) = connection.target() else {
            return Ok(());
        };
        let anchor = connection.position();
        let child_slot = Self::child_slot(connection.kind());
        let Some(child_connection) = self.block(child)?.connection(child_slot) else {
            return Err(WorkspaceError::MissingConnection {
                block: child,
                kind: connection.kind().opposite(),
            });
        };

        let delta = child_connection.position().sub_point(anchor);
        if !delta.is_zero() {
            self.move_by(child, -delta.x(), -delta.y())?;
        }
        Ok(())
    }

    /// Recomputes absolute connection positions from their block offsets and
    /// pulls connected children into place.
    pub fn update_connection_locations(&mut self, id: BlockId) -> Result<(), WorkspaceError> {
        let origin = self.surface_xy(id)?;
        let slots = self.block(id)?.connection_slots();
        for slot in slots {
            if let Some(connection) = self.block_mut(id)?.connection_mut(slot) {
                connection.move_to_offset(origin);
            }
            if slot.is_parent_side() {
                self.tighten(id, slot)?;
            }
        }
        Ok(())
    }

    // ====================================================================
    // Collapsing
    // ====================================================================

    /// Collapses or expands a block.
    ///
    /// Collapsing hides every input and appends a dummy input holding a
    /// summary label of the block's text. Expanding removes that input and
    /// shows the others again.
    pub fn set_collapsed(&mut self, id: BlockId, collapsed: bool) -> Result<(), WorkspaceError> {
        if self.block(id)?.is_collapsed() == collapsed {
            return Ok(());
        }

        let summary = if collapsed {
            Some(self.to_text(id, Some(COLLAPSE_CHARS))?)
        } else {
            None
        };

        let block = self.block_mut(id)?;
        block.set_collapsed_flag(collapsed);
        for input in block.inputs_mut() {
            if input.name() != COLLAPSED_INPUT_NAME {
                input.set_visible(!collapsed);
            }
        }
        block.remove_input(COLLAPSED_INPUT_NAME);
        if let Some(text) = summary {
            block.push_input(Input::dummy(COLLAPSED_INPUT_NAME).with_field(LabelField::new(text)));
        }
        debug!(id:%, collapsed; "Changed collapsed state");
        Ok(())
    }

    /// A plain-text summary of the block and its input children.
    ///
    /// Empty inputs show as `?`; an empty summary becomes `???`. With
    /// `max_len`, longer summaries are cut and end in `...`.
    pub fn to_text(&self, id: BlockId, max_len: Option<usize>) -> Result<String, WorkspaceError> {
        let mut tokens = Vec::new();
        self.collect_text(id, &mut tokens)?;

        let joined = tokens.join(" ");
        let mut text = joined.trim().to_string();
        if text.is_empty() {
            text = String::from("???");
        }
        if let Some(max_len) = max_len.filter(|&max_len| text.chars().count() > max_len) {
            let mut cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
            cut.push_str("...");
            text = cut;
        }
        Ok(text)
    }

    fn collect_text(&self, id: BlockId, tokens: &mut Vec<String>) -> Result<(), WorkspaceError> {
        let block = self.block(id)?;
        if block.is_collapsed() {
            if let Some(input) = block.input(COLLAPSED_INPUT_NAME) {
                tokens.extend(input.fields().iter().map(|field| field.text()));
                return Ok(());
            }
        }

        for input in block.inputs() {
            if input.name() == COLLAPSED_INPUT_NAME {
                continue;
            }
            tokens.extend(input.fields().iter().map(|field| field.text()));
            if input.kind() == InputKind::Dummy || input.kind() == InputKind::EndRow {
                continue;
            }
            match input.connected_block() {
                Some(child) => {
                    let mut child_tokens = Vec::new();
                    self.collect_text(child, &mut child_tokens)?;
                    let child_text = child_tokens.join(" ");
                    tokens.push(child_text.trim().to_string());
                }
                None => tokens.push(String::from("?")),
            }
        }
        Ok(())
    }
}
