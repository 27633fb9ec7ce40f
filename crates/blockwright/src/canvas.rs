//! Rendered blocks on a workspace.
//!
//! A [`Canvas`] owns a [`Workspace`], an initialized [`Renderer`] and one
//! [`BlockView`] per rendered block. Changing a block's size changes its
//! parent's layout, so rendering a block re-renders every ancestor, child
//! before parent, up to the top of its tree.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use blockwright_core::{block::BlockId, workspace::Workspace};

use crate::{
    BlockwrightError,
    config::StyleConfig,
    export::svg::SvgBuilder,
    render::{FieldPlacement, IconPlacement, PathObject, RenderError, Renderer},
};

/// What a rendered block looks like: its paths plus where its fields and
/// icons go.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    path: PathObject,
    field_placements: Vec<FieldPlacement>,
    icon_placements: Vec<IconPlacement>,
    rtl: bool,
}

impl BlockView {
    pub fn path(&self) -> &PathObject {
        &self.path
    }

    pub fn field_placements(&self) -> &[FieldPlacement] {
        &self.field_placements
    }

    pub fn icon_placements(&self) -> &[IconPlacement] {
        &self.icon_placements
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl
    }
}

/// A workspace together with the rendered state of its blocks.
#[derive(Debug)]
pub struct Canvas {
    workspace: Workspace,
    renderer: Renderer,
    views: HashMap<BlockId, BlockView>,
}

impl Canvas {
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] if `renderer` was not
    /// initialized.
    pub fn new(workspace: Workspace, renderer: Renderer) -> Result<Self, RenderError> {
        renderer.constants()?;
        Ok(Self {
            workspace,
            renderer,
            views: HashMap::new(),
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Mutable access for edits. Edited blocks need a
    /// [`Canvas::render_block`] afterwards.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn view(&self, id: BlockId) -> Option<&BlockView> {
        self.views.get(&id)
    }

    /// `id` followed by each ancestor up to the root of its tree.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CyclicHierarchy`] if the parent links loop,
    /// or a workspace error for a dangling id.
    pub fn reflow_chain(&self, id: BlockId) -> Result<Vec<BlockId>, RenderError> {
        let mut chain = vec![id];
        let mut seen = HashSet::from([id]);
        let mut current = self.workspace.parent(id)?;
        while let Some(parent) = current {
            if !seen.insert(parent) {
                return Err(RenderError::CyclicHierarchy(id));
            }
            chain.push(parent);
            current = self.workspace.parent(parent)?;
        }
        Ok(chain)
    }

    /// Re-renders `id` and every ancestor, innermost first.
    ///
    /// The children of `id` must already be rendered. A block whose render
    /// fails keeps its previous view.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Canvas::reflow_chain`] or from
    /// rendering a block in the chain.
    pub fn render_block(&mut self, id: BlockId) -> Result<(), RenderError> {
        let chain = self.reflow_chain(id)?;
        debug!(block:% = id, depth = chain.len(); "Reflowing block chain");
        for block_id in chain {
            self.render_one(block_id)?;
        }
        Ok(())
    }

    /// Renders every block, children before parents.
    ///
    /// # Errors
    ///
    /// Returns the first render error.
    pub fn render_all(&mut self) -> Result<(), RenderError> {
        let top_blocks = self.workspace.top_blocks();
        info!(top_blocks = top_blocks.len(), blocks = self.workspace.len(); "Rendering workspace");
        for top in top_blocks {
            let mut ordered = self.workspace.descendants(top)?;
            // Descendants come parents first.
            ordered.reverse();
            for block_id in ordered {
                self.render_one(block_id)?;
            }
        }
        Ok(())
    }

    fn render_one(&mut self, id: BlockId) -> Result<(), RenderError> {
        let output = self.renderer.measure_and_draw(&self.workspace, id)?;
        let mut path = match self.views.get(&id) {
            Some(view) => view.path.clone(),
            None => self.renderer.make_path_object()?,
        };
        self.renderer
            .commit(&mut self.workspace, id, &output, &mut path)?;
        let view = BlockView {
            path,
            field_placements: output.field_placements,
            icon_placements: output.icon_placements,
            rtl: output.rtl,
        };
        self.views.insert(id, view);
        Ok(())
    }

    /// Builds an SVG document of every rendered top block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwrightError::Export`] for an invalid background
    /// color or a block that disappeared from the workspace.
    pub fn to_svg(&self, style: &StyleConfig) -> Result<::svg::Document, BlockwrightError> {
        let exporter = SvgBuilder::new().with_style(style).build()?;
        Ok(exporter.document(self)?)
    }

    fn view_mut(&mut self, id: BlockId) -> Result<&mut BlockView, RenderError> {
        self.views
            .get_mut(&id)
            .ok_or(RenderError::NotRendered(id))
    }

    /// Toggles the emboss filter on a rendered block.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotRendered`] if the block has no view.
    pub fn set_highlighted(&mut self, id: BlockId, highlighted: bool) -> Result<(), RenderError> {
        self.view_mut(id)?.path.update_highlighted(highlighted);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RenderError::NotRendered`] if the block has no view.
    pub fn set_selected(&mut self, id: BlockId, selected: bool) -> Result<(), RenderError> {
        self.view_mut(id)?.path.update_selected(selected);
        Ok(())
    }

    /// Re-resolves the block's style and repaints it without measuring.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotRendered`] if the block has no view, or
    /// [`RenderError::InvalidColour`] for a bad `auto_` style.
    pub fn update_colour(&mut self, id: BlockId) -> Result<(), RenderError> {
        let block = self.workspace.block(id)?;
        let style = self.renderer.block_style(block.style_name())?;
        let shadow = block.is_shadow();
        let disabled = !block.is_enabled() || self.workspace.is_inherited_disabled(id)?;

        let view = self.view_mut(id)?;
        view.path.set_style(style);
        view.path.apply_colour(shadow, disabled);
        Ok(())
    }

    /// Enables or disables a block and repaints it and every rendered
    /// block below it.
    ///
    /// # Errors
    ///
    /// Returns a workspace error for an unknown block, or any error from
    /// [`Canvas::update_colour`].
    pub fn set_enabled(&mut self, id: BlockId, enabled: bool) -> Result<(), RenderError> {
        self.workspace.block_mut(id)?.set_enabled(enabled);
        for block_id in self.workspace.descendants(id)? {
            if self.views.contains_key(&block_id) {
                self.update_colour(block_id)?;
            }
        }
        Ok(())
    }
}
