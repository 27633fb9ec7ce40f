//! TOML scene files.
//!
//! A scene describes a workspace: its direction plus every block with its
//! inputs, fields, icons, flags and links to other blocks. Blocks refer to
//! each other by the `id` they are given in the file.
//!
//! ```toml
//! rtl = false
//!
//! [[blocks]]
//! id = "loop"
//! type = "controls_repeat"
//! style = "loop_blocks"
//! x = 20.0
//! y = 20.0
//! previous = true
//! next = true
//!
//! [[blocks.inputs]]
//! kind = "dummy"
//! fields = [{ kind = "label", text = "repeat" }]
//!
//! [[blocks.inputs]]
//! kind = "statement"
//! name = "DO"
//! block = "say"
//!
//! [[blocks]]
//! id = "say"
//! type = "text_print"
//! previous = true
//! next = true
//! ```
//!
//! Parse errors carry byte spans into the source so they can be shown
//! against it.

use std::{collections::HashMap, fmt, ops::Range};

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;
use toml::Spanned;

use blockwright_core::{
    block::{Align, Block, BlockId, Icon, Input, InputKind},
    field::{Field, ImageField, LabelField, TextInputField},
    geometry::Size,
    workspace::{Workspace, WorkspaceError},
};

// ============================================================================
// Errors
// ============================================================================

/// Error codes for scene loading.
///
/// - `S1xx` - TOML syntax and schema errors
/// - `S2xx` - block reference and linking errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneErrorCode {
    /// The file is not valid TOML or does not match the scene schema.
    S100,

    /// Two blocks share an id.
    S200,

    /// A link names a block id that is not defined.
    S201,

    /// A linked block cannot be attached where the file puts it.
    S202,

    /// Collapsing a block failed.
    S203,
}

impl SceneErrorCode {
    /// Returns the code as a string (e.g., "S100").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S100 => "S100",
            Self::S200 => "S200",
            Self::S201 => "S201",
            Self::S202 => "S202",
            Self::S203 => "S203",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            Self::S100 => "invalid scene file",
            Self::S200 => "duplicate block id",
            Self::S201 => "undefined block",
            Self::S202 => "invalid connection",
            Self::S203 => "cannot collapse block",
        }
    }
}

impl fmt::Display for SceneErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scene loading error, optionally pointing at a span of the source.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SceneError {
    code: SceneErrorCode,
    message: String,
    span: Option<Range<usize>>,
    label: Option<String>,
    help: Option<String>,
}

impl SceneError {
    fn new(code: SceneErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
            label: None,
            help: None,
        }
    }

    fn with_label(mut self, span: Range<usize>, label: impl Into<String>) -> Self {
        self.span = Some(span);
        self.label = Some(label.into());
        self
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn from_toml(err: toml::de::Error) -> Self {
        let mut error = Self::new(SceneErrorCode::S100, err.message().trim());
        if let Some(span) = err.span() {
            error = error.with_label(span, SceneErrorCode::S100.description());
        }
        error
    }

    fn connection(err: WorkspaceError, span: Range<usize>) -> Self {
        let help = match &err {
            WorkspaceError::MissingConnection { .. } => {
                "value inputs need a block with `output = true`; statement inputs and `next_block` need `previous = true`"
            }
            WorkspaceError::ConnectionOccupied { .. } | WorkspaceError::AlreadyAttached(_) => {
                "each block can be attached in one place only"
            }
            WorkspaceError::Cycle { .. } => "a block cannot contain itself",
            WorkspaceError::UnknownInput { .. } => "check the input `name`",
            WorkspaceError::UnknownBlock(_) => "check the block ids",
        };
        Self::new(SceneErrorCode::S202, err.to_string())
            .with_label(span, "attached here")
            .with_help(help)
    }

    pub fn code(&self) -> SceneErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte range in the source the error points at.
    pub fn span(&self) -> Option<Range<usize>> {
        self.span.clone()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

// ============================================================================
// Schema
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneDef {
    #[serde(default)]
    rtl: bool,
    #[serde(default)]
    blocks: Vec<BlockDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockDef {
    id: Spanned<String>,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    previous: bool,
    #[serde(default)]
    next: bool,
    #[serde(default)]
    output: bool,
    #[serde(default)]
    inline: bool,
    #[serde(default)]
    collapsed: bool,
    #[serde(default)]
    shadow: bool,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    insertion_marker: bool,
    #[serde(default)]
    hat: Option<String>,
    #[serde(default)]
    next_block: Option<Spanned<String>>,
    #[serde(default)]
    icons: Vec<IconDef>,
    #[serde(default)]
    inputs: Vec<InputDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IconDef {
    name: String,
    width: f64,
    height: f64,
    #[serde(default)]
    shown_when_collapsed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputDef {
    kind: InputKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    align: Align,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    block: Option<Spanned<String>>,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FieldDef {
    Label {
        text: String,
    },
    Text {
        value: String,
    },
    Image {
        src: String,
        width: f64,
        height: f64,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        flip_rtl: bool,
    },
}

impl FieldDef {
    fn to_field(&self) -> Box<dyn Field> {
        match self {
            Self::Label { text } => Box::new(LabelField::new(text.as_str())),
            Self::Text { value } => Box::new(TextInputField::new(value.as_str())),
            Self::Image {
                src,
                width,
                height,
                alt,
                flip_rtl,
            } => {
                let mut image = ImageField::new(src.as_str(), *width, *height).with_flip_rtl(*flip_rtl);
                if let Some(alt) = alt {
                    image = image.with_alt(alt.as_str());
                }
                Box::new(image)
            }
        }
    }
}

impl InputDef {
    fn to_input(&self) -> Input {
        let mut input = self
            .fields
            .iter()
            .fold(Input::of_kind(self.name.as_str(), self.kind), |input, field| {
                input.with_boxed_field(field.to_field())
            })
            .with_align(self.align);
        input.set_visible(self.visible);
        input
    }
}

impl BlockDef {
    fn to_block(&self) -> Block {
        let mut block = Block::new(self.type_name.as_str())
            .with_position(self.x, self.y)
            .with_inputs_inline(self.inline)
            .with_shadow(self.shadow)
            .with_enabled(self.enabled)
            .with_insertion_marker(self.insertion_marker);
        if self.previous {
            block = block.with_previous_statement();
        }
        if self.next {
            block = block.with_next_statement();
        }
        if self.output {
            block = block.with_output();
        }
        if let Some(style) = &self.style {
            block = block.with_style(style.as_str());
        }
        if let Some(hat) = &self.hat {
            block = block.with_hat(hat.as_str());
        }
        for icon in &self.icons {
            block = block.with_icon(
                Icon::new(icon.name.as_str(), Size::new(icon.width, icon.height))
                    .with_shown_when_collapsed(icon.shown_when_collapsed),
            );
        }
        self.inputs
            .iter()
            .fold(block, |block, input| block.with_input(input.to_input()))
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Parses a scene into a workspace with every link made.
///
/// # Errors
///
/// Returns a [`SceneError`] for invalid TOML, a schema mismatch, a duplicate
/// or undefined block id, or a link the blocks' connections do not allow.
pub fn parse(source: &str) -> Result<Workspace, SceneError> {
    let scene: SceneDef = toml::from_str(source).map_err(SceneError::from_toml)?;
    let mut workspace = Workspace::new().with_rtl(scene.rtl);

    let mut ids: HashMap<&str, BlockId> = HashMap::new();
    for def in &scene.blocks {
        let name = def.id.get_ref().as_str();
        if ids.contains_key(name) {
            return Err(
                SceneError::new(SceneErrorCode::S200, format!("block id `{name}` is defined twice"))
                    .with_label(def.id.span(), "duplicate id")
                    .with_help("give every block a unique `id`"),
            );
        }
        let id = workspace.add_block(def.to_block());
        trace!(name, id:%; "Added scene block");
        ids.insert(name, id);
    }

    let lookup = |reference: &Spanned<String>| {
        let name = reference.get_ref();
        ids.get(name.as_str()).copied().ok_or_else(|| {
            SceneError::new(SceneErrorCode::S201, format!("no block has id `{name}`"))
                .with_label(reference.span(), "undefined block")
                .with_help("link to the `id` of a block in this file")
        })
    };

    for def in &scene.blocks {
        let parent = lookup(&def.id)?;
        for input in &def.inputs {
            if let Some(reference) = &input.block {
                let child = lookup(reference)?;
                workspace
                    .connect_input(parent, &input.name, child)
                    .map_err(|err| SceneError::connection(err, reference.span()))?;
            }
        }
        if let Some(reference) = &def.next_block {
            let child = lookup(reference)?;
            workspace
                .connect_next(parent, child)
                .map_err(|err| SceneError::connection(err, reference.span()))?;
        }
    }

    // Collapse last so the summary label sees the attached children.
    for def in scene.blocks.iter().filter(|def| def.collapsed) {
        let id = lookup(&def.id)?;
        workspace.set_collapsed(id, true).map_err(|err| {
            SceneError::new(SceneErrorCode::S203, err.to_string()).with_label(def.id.span(), "collapsed here")
        })?;
    }

    debug!(blocks = workspace.len(), rtl = scene.rtl; "Scene parsed");
    Ok(workspace)
}
