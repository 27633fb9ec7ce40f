//! Geometric constants and the path fragments derived from them.
//!
//! A [`ConstantProvider`] starts from the base values, takes the Geras
//! adjustments, then any [`ConstantOverrides`] from configuration. Applying
//! a theme resolves block styles and font settings; [`ConstantProvider::init`]
//! rebuilds the connector and corner shapes from the current numbers.
//!
//! Derived sizes such as `top_row_min_height` are computed once, when the
//! provider is created. Overriding `medium_padding` afterwards does not move
//! them.

use indexmap::IndexMap;
use serde::Deserialize;
use svg::node::element as svg_element;

use blockwright_core::{
    color::{Color, parse_block_colour},
    connection::ConnectionKind,
    field::FieldMetrics,
    path::{ArcSweep, CurveCommand, SvgPath},
    text::FontStyle,
};

use super::RenderError;
use crate::theme::{BlockStyle, BlockStyleDef, Theme};

/// Notch drawn for previous and next connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Notch {
    pub width: f64,
    pub height: f64,
    /// Drawn left to right along a top edge
    pub path_left: SvgPath,
    /// Drawn right to left along a bottom edge
    pub path_right: SvgPath,
}

/// Puzzle tab drawn for value connections.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleTab {
    pub width: f64,
    pub height: f64,
    pub path_down: SvgPath,
    pub path_up: SvgPath,
}

/// The shape a connection is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    PuzzleTab(&'a PuzzleTab),
    Notch(&'a Notch),
}

impl Shape<'_> {
    pub fn width(&self) -> f64 {
        match self {
            Self::PuzzleTab(tab) => tab.width,
            Self::Notch(notch) => notch.width,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Self::PuzzleTab(tab) => tab.height,
            Self::Notch(notch) => notch.height,
        }
    }
}

/// Concave corners inside a statement input.
#[derive(Debug, Clone, PartialEq)]
pub struct InsideCorners {
    pub width: f64,
    pub height: f64,
    pub path_top: SvgPath,
    pub path_bottom: SvgPath,
}

/// Rounded outer corners of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct OutsideCorners {
    pub top_left: SvgPath,
    pub top_right: SvgPath,
    pub bottom_left: SvgPath,
    pub bottom_right: SvgPath,
    pub right_height: f64,
}

/// Zig-zag edge on the right of a collapsed block.
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedTeeth {
    pub width: f64,
    pub height: f64,
    pub path: SvgPath,
}

/// Curved hat on top of an event block.
#[derive(Debug, Clone, PartialEq)]
pub struct StartHat {
    pub width: f64,
    pub height: f64,
    pub path: SvgPath,
}

macro_rules! constant_overrides {
    ($($field:ident),* $(,)?) => {
        /// Optional replacements for base numeric constants, read from the
        /// `[renderer]` section of the configuration.
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct ConstantOverrides {
            $( $field: Option<f64>, )*
            add_start_hats: Option<bool>,
        }

        impl ConstantOverrides {
            /// Returns `true` if no constant is overridden.
            pub fn is_empty(&self) -> bool {
                $( self.$field.is_none() && )* self.add_start_hats.is_none()
            }

            fn apply(&self, constants: &mut ConstantProvider) {
                $(
                    if let Some(value) = self.$field {
                        constants.$field = value;
                    }
                )*
                if let Some(add_start_hats) = self.add_start_hats {
                    constants.add_start_hats = add_start_hats;
                }
            }
        }
    };
}

constant_overrides!(
    small_padding,
    medium_padding,
    medium_large_padding,
    large_padding,
    tab_height,
    tab_offset_from_top,
    tab_vertical_overlap,
    tab_width,
    notch_width,
    notch_height,
    min_block_width,
    empty_block_spacer_height,
    corner_radius,
    notch_offset_left,
    statement_input_padding_left,
    between_statement_padding_y,
    start_hat_height,
    start_hat_width,
    spacer_default_height,
    min_block_height,
    empty_inline_input_padding,
    external_value_input_padding,
    jagged_teeth_height,
    jagged_teeth_width,
    field_border_rect_radius,
    field_border_rect_height,
    field_border_rect_x_padding,
    field_border_rect_y_padding,
    dark_path_offset,
    max_bottom_width,
);

/// Every number and shape the measure and draw passes read.
#[derive(Debug, Clone)]
pub struct ConstantProvider {
    pub no_padding: f64,
    pub small_padding: f64,
    pub medium_padding: f64,
    pub medium_large_padding: f64,
    pub large_padding: f64,
    pub tall_input_field_offset_y: f64,
    pub tab_height: f64,
    pub tab_offset_from_top: f64,
    pub tab_vertical_overlap: f64,
    pub tab_width: f64,
    pub notch_width: f64,
    pub notch_height: f64,
    pub min_block_width: f64,
    pub empty_block_spacer_height: f64,
    pub dummy_input_min_height: f64,
    pub dummy_input_shadow_min_height: f64,
    pub corner_radius: f64,
    pub notch_offset_left: f64,
    pub statement_input_notch_offset: f64,
    pub statement_bottom_spacer: f64,
    pub statement_input_padding_left: f64,
    pub between_statement_padding_y: f64,
    pub top_row_min_height: f64,
    pub top_row_precedes_statement_min_height: f64,
    pub bottom_row_min_height: f64,
    pub bottom_row_after_statement_min_height: f64,
    pub add_start_hats: bool,
    pub start_hat_height: f64,
    pub start_hat_width: f64,
    pub spacer_default_height: f64,
    pub min_block_height: f64,
    pub empty_inline_input_padding: f64,
    pub empty_inline_input_height: f64,
    pub external_value_input_padding: f64,
    pub empty_statement_input_height: f64,
    pub jagged_teeth_height: f64,
    pub jagged_teeth_width: f64,
    pub field_text_fontsize: f64,
    pub field_text_fontweight: String,
    pub field_text_fontfamily: String,
    pub field_border_rect_radius: f64,
    pub field_border_rect_height: f64,
    pub field_border_rect_x_padding: f64,
    pub field_border_rect_y_padding: f64,
    pub field_border_rect_colour: String,
    pub insertion_marker_colour: Color,
    pub insertion_marker_opacity: f64,
    /// Offset of the dark path drawn under the main path
    pub dark_path_offset: f64,
    /// Widest a value block may be before a next connection below it
    /// stops counting toward its width
    pub max_bottom_width: f64,
    pub start_point: SvgPath,

    pub notch: Notch,
    pub puzzle_tab: PuzzleTab,
    pub inside_corners: InsideCorners,
    pub outside_corners: OutsideCorners,
    pub jagged_teeth: JaggedTeeth,
    pub start_hat: StartHat,

    block_styles: IndexMap<String, BlockStyle>,
    identifier: String,
}

impl ConstantProvider {
    /// Base constants shared by every renderer.
    pub fn new() -> Self {
        let medium_padding = 5.0;
        let large_padding = 10.0;
        let tab_height = 15.0;
        let notch_offset_left = 15.0;
        let min_block_height = 24.0;

        let mut provider = Self {
            no_padding: 0.0,
            small_padding: 3.0,
            medium_padding,
            medium_large_padding: 8.0,
            large_padding,
            tall_input_field_offset_y: medium_padding,
            tab_height,
            tab_offset_from_top: 5.0,
            tab_vertical_overlap: 2.5,
            tab_width: 8.0,
            notch_width: 15.0,
            notch_height: 4.0,
            min_block_width: 12.0,
            empty_block_spacer_height: 16.0,
            dummy_input_min_height: tab_height,
            dummy_input_shadow_min_height: tab_height,
            corner_radius: 8.0,
            notch_offset_left,
            statement_input_notch_offset: notch_offset_left,
            statement_bottom_spacer: 0.0,
            statement_input_padding_left: 20.0,
            between_statement_padding_y: 4.0,
            top_row_min_height: medium_padding,
            top_row_precedes_statement_min_height: large_padding,
            bottom_row_min_height: medium_padding,
            bottom_row_after_statement_min_height: large_padding,
            add_start_hats: false,
            start_hat_height: 15.0,
            start_hat_width: 100.0,
            spacer_default_height: 15.0,
            min_block_height,
            empty_inline_input_padding: 14.5,
            empty_inline_input_height: tab_height + 11.0,
            external_value_input_padding: 2.0,
            empty_statement_input_height: min_block_height,
            jagged_teeth_height: 12.0,
            jagged_teeth_width: 6.0,
            field_text_fontsize: 11.0,
            field_text_fontweight: String::from("normal"),
            field_text_fontfamily: String::from("sans-serif"),
            field_border_rect_radius: 4.0,
            field_border_rect_height: 16.0,
            field_border_rect_x_padding: 5.0,
            field_border_rect_y_padding: 3.0,
            field_border_rect_colour: String::from("#fff"),
            insertion_marker_colour: Color::default(),
            insertion_marker_opacity: 0.2,
            dark_path_offset: 0.0,
            max_bottom_width: 66.5,
            start_point: move_by(0.0, 0.0),

            notch: placeholder_notch(),
            puzzle_tab: placeholder_tab(),
            inside_corners: placeholder_inside_corners(),
            outside_corners: placeholder_outside_corners(),
            jagged_teeth: placeholder_jagged_teeth(),
            start_hat: placeholder_start_hat(),

            block_styles: IndexMap::new(),
            identifier: String::from("blockwright"),
        };
        provider.init();
        provider
    }

    /// Constants of the Geras renderer: base values plus an embossed dark
    /// path and a tighter statement bottom.
    pub fn geras() -> Self {
        let mut provider = Self::new();
        provider.dark_path_offset = 1.0;
        provider.max_bottom_width = 30.0;
        provider.statement_bottom_spacer = -provider.notch_height / 2.0;
        provider
    }

    /// Replaces every overridden base constant. Call [`Self::init`] after
    /// this to rebuild the shapes.
    pub fn apply_overrides(&mut self, overrides: &ConstantOverrides) {
        overrides.apply(self);
    }

    /// Sets the suffix used for the ids of the shared SVG definitions.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Rebuilds every shape from the current numbers.
    pub fn init(&mut self) {
        self.jagged_teeth = self.make_jagged_teeth();
        self.notch = self.make_notch();
        self.start_hat = self.make_start_hat();
        self.puzzle_tab = self.make_puzzle_tab();
        self.inside_corners = self.make_inside_corners();
        self.outside_corners = self.make_outside_corners();
    }

    // ====================================================================
    // Theme
    // ====================================================================

    /// Validates the theme's block styles and copies its font and component
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidColour`] if any colour in the theme
    /// fails to parse.
    pub fn set_theme(&mut self, theme: &Theme) -> Result<(), RenderError> {
        let mut block_styles = IndexMap::new();
        for (name, style) in theme.block_styles() {
            block_styles.insert(name.clone(), validated_block_style(style)?);
        }
        self.block_styles = block_styles;

        let font = theme.font_style();
        if let Some(family) = font.family().filter(|family| !family.is_empty()) {
            self.field_text_fontfamily = family.to_string();
        }
        if let Some(weight) = font.weight().filter(|weight| !weight.is_empty()) {
            self.field_text_fontweight = weight.to_string();
        }
        if let Some(size) = font.size() {
            self.field_text_fontsize = size;
        }

        let components = theme.component_styles();
        if let Some(colour) = components.insertion_marker_colour() {
            self.insertion_marker_colour =
                Color::new(colour).map_err(RenderError::InvalidColour)?;
        }
        if let Some(opacity) = components.insertion_marker_opacity() {
            self.insertion_marker_opacity = opacity;
        }

        if let Some(start_hats) = theme.start_hats() {
            self.add_start_hats = start_hats;
        }
        Ok(())
    }

    /// Looks up a block style by name.
    ///
    /// Unknown names of the form `auto_<colour>` produce a style from that
    /// colour; anything else falls back to a black style.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidColour`] for an `auto_` name whose
    /// colour does not parse.
    pub fn block_style(&self, name: Option<&str>) -> Result<BlockStyle, RenderError> {
        let name = name.unwrap_or("");
        if let Some(style) = self.block_styles.get(name) {
            return Ok(style.clone());
        }
        match name.strip_prefix("auto_") {
            Some(colour) => self.block_style_for_colour(colour),
            None => validated_block_style(&BlockStyleDef::new("#000000")),
        }
    }

    /// A style built from a single primary colour.
    pub fn block_style_for_colour(&self, colour: &str) -> Result<BlockStyle, RenderError> {
        validated_block_style(&BlockStyleDef::new(colour))
    }

    /// Every validated style from the current theme.
    pub fn block_styles(&self) -> &IndexMap<String, BlockStyle> {
        &self.block_styles
    }

    /// Font used for field text.
    pub fn field_font(&self) -> FontStyle {
        FontStyle::new(
            self.field_text_fontfamily.as_str(),
            self.field_text_fontweight.as_str(),
            self.field_text_fontsize,
        )
    }

    /// Everything a field needs to measure itself.
    pub fn field_metrics(&self) -> FieldMetrics {
        FieldMetrics::new(self.field_font()).with_border_rect(
            self.field_border_rect_x_padding,
            self.field_border_rect_y_padding,
            self.field_border_rect_height,
            self.field_border_rect_radius,
        )
    }

    // ====================================================================
    // Shapes
    // ====================================================================

    /// The shape drawn for a connection of `kind`.
    pub fn shape_for(&self, kind: ConnectionKind) -> Shape<'_> {
        match kind {
            ConnectionKind::InputValue | ConnectionKind::OutputValue => {
                Shape::PuzzleTab(&self.puzzle_tab)
            }
            ConnectionKind::PreviousStatement | ConnectionKind::NextStatement => {
                Shape::Notch(&self.notch)
            }
        }
    }

    fn make_jagged_teeth(&self) -> JaggedTeeth {
        let height = self.jagged_teeth_height;
        let width = self.jagged_teeth_width;
        let mut path = SvgPath::new();
        path.line(&[
            (width, height / 4.0),
            (-width * 2.0, height / 2.0),
            (width, height / 4.0),
        ]);
        JaggedTeeth {
            width,
            height,
            path,
        }
    }

    fn make_start_hat(&self) -> StartHat {
        let height = self.start_hat_height;
        let width = self.start_hat_width;
        let mut path = SvgPath::new();
        path.curve(
            CurveCommand::Cubic,
            &[(30.0, -height), (70.0, -height), (width, 0.0)],
        );
        StartHat {
            width,
            height,
            path,
        }
    }

    fn make_puzzle_tab(&self) -> PuzzleTab {
        let width = self.tab_width;
        let height = self.tab_height;

        let make_path = |up: bool| {
            let forward = if up { -1.0 } else { 1.0 };
            let back = -forward;

            let overlap = 2.5;
            let half_height = height / 2.0;
            let control1_y = half_height + overlap;
            let control2_y = half_height + 0.5;
            let control3_y = overlap;

            let mut path = SvgPath::new();
            path.curve(
                CurveCommand::Cubic,
                &[
                    (0.0, forward * control1_y),
                    (-width, back * control2_y),
                    (-width, forward * half_height),
                ],
            )
            .curve(
                CurveCommand::SmoothCubic,
                &[(width, back * control3_y), (width, forward * half_height)],
            );
            path
        };

        PuzzleTab {
            width,
            height,
            path_up: make_path(true),
            path_down: make_path(false),
        }
    }

    fn make_notch(&self) -> Notch {
        let width = self.notch_width;
        let height = self.notch_height;
        let inner_width = 3.0;
        let outer_width = (width - inner_width) / 2.0;

        let make_path = |dir: f64| {
            let mut path = SvgPath::new();
            path.line(&[
                (dir * outer_width, height),
                (dir * inner_width, 0.0),
                (dir * outer_width, -height),
            ]);
            path
        };

        Notch {
            width,
            height,
            path_left: make_path(1.0),
            path_right: make_path(-1.0),
        }
    }

    fn make_inside_corners(&self) -> InsideCorners {
        let radius = self.corner_radius;
        let mut path_top = SvgPath::new();
        path_top.arc(ArcSweep::CounterClockwise, radius, (-radius, radius));
        let mut path_bottom = SvgPath::new();
        path_bottom.arc(ArcSweep::CounterClockwise, radius, (radius, radius));
        InsideCorners {
            width: radius,
            height: radius,
            path_top,
            path_bottom,
        }
    }

    fn make_outside_corners(&self) -> OutsideCorners {
        let radius = self.corner_radius;
        let mut top_left = SvgPath::new();
        top_left
            .move_by(0.0, radius)
            .arc(ArcSweep::Clockwise, radius, (radius, -radius));
        let mut top_right = SvgPath::new();
        top_right.arc(ArcSweep::Clockwise, radius, (radius, radius));
        let mut bottom_left = SvgPath::new();
        bottom_left.arc(ArcSweep::Clockwise, radius, (-radius, -radius));
        let mut bottom_right = SvgPath::new();
        bottom_right.arc(ArcSweep::Clockwise, radius, (-radius, radius));
        OutsideCorners {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            right_height: radius,
        }
    }

    // ====================================================================
    // SVG definitions and CSS
    // ====================================================================

    pub fn emboss_filter_id(&self) -> String {
        format!("blocklyEmbossFilter{}", self.identifier)
    }

    pub fn disabled_pattern_id(&self) -> String {
        format!("blocklyDisabledPattern{}", self.identifier)
    }

    /// The emboss filter applied to highlighted blocks and the hatch pattern
    /// used to fill disabled blocks.
    pub fn create_defs(&self) -> svg_element::Definitions {
        let emboss = svg_element::Filter::new()
            .set("id", self.emboss_filter_id())
            .add(
                svg_element::FilterEffectGaussianBlur::new()
                    .set("in", "SourceAlpha")
                    .set("stdDeviation", 1)
                    .set("result", "blur"),
            )
            .add(
                svg_element::FilterEffectSpecularLighting::new()
                    .set("in", "blur")
                    .set("surfaceScale", 1)
                    .set("specularConstant", 0.5)
                    .set("specularExponent", 10)
                    .set("lighting-color", "white")
                    .set("result", "specOut")
                    .add(
                        svg_element::FilterEffectPointLight::new()
                            .set("x", -5000)
                            .set("y", -10000)
                            .set("z", 20000),
                    ),
            )
            .add(
                svg_element::FilterEffectComposite::new()
                    .set("in", "specOut")
                    .set("in2", "SourceAlpha")
                    .set("operator", "in")
                    .set("result", "specOut"),
            )
            .add(
                svg_element::FilterEffectComposite::new()
                    .set("in", "SourceGraphic")
                    .set("in2", "specOut")
                    .set("operator", "arithmetic")
                    .set("k1", 0)
                    .set("k2", 1)
                    .set("k3", 1)
                    .set("k4", 0),
            );

        let disabled = svg_element::Pattern::new()
            .set("id", self.disabled_pattern_id())
            .set("patternUnits", "userSpaceOnUse")
            .set("width", 10)
            .set("height", 10)
            .add(
                svg_element::Rectangle::new()
                    .set("width", 10)
                    .set("height", 10)
                    .set("fill", "#aaa"),
            )
            .add(
                svg_element::Path::new()
                    .set("d", "M 0 0 L 10 10 M 10 0 L 0 10")
                    .set("stroke", "#cc0"),
            );

        svg_element::Definitions::new().add(emboss).add(disabled)
    }

    /// Stylesheet rules for blocks under `selector`, one line per entry.
    pub fn css(&self, selector: &str) -> Vec<String> {
        let font_weight = &self.field_text_fontweight;
        let font_size = self.field_text_fontsize;
        let font_family = &self.field_text_fontfamily;
        vec![
            format!("{selector} .blocklyText {{"),
            format!("font: {font_weight} {font_size}pt {font_family};"),
            "}".to_string(),
            format!("{selector} .blocklyText {{"),
            "fill: #fff;".to_string(),
            "}".to_string(),
            format!("{selector} .blocklyNonEditableText>rect,"),
            format!("{selector} .blocklyEditableText>rect {{"),
            format!("fill: {};", self.field_border_rect_colour),
            "fill-opacity: .6;".to_string(),
            "stroke: none;".to_string(),
            "}".to_string(),
            format!("{selector} .blocklyNonEditableText>text,"),
            format!("{selector} .blocklyEditableText>text {{"),
            "fill: #000;".to_string(),
            "}".to_string(),
            format!("{selector} .blocklySelected>.blocklyPath {{"),
            "stroke: #fc3;".to_string(),
            "stroke-width: 3px;".to_string(),
            "}".to_string(),
            format!("{selector} .blocklyInsertionMarker>.blocklyPath {{"),
            format!("fill-opacity: {};", self.insertion_marker_opacity),
            "stroke: none;".to_string(),
            "}".to_string(),
            format!("{selector} .blocklyInsertionMarker>.blocklyPathLight,"),
            format!("{selector} .blocklyInsertionMarker>.blocklyPathDark {{"),
            format!("fill-opacity: {};", self.insertion_marker_opacity),
            "stroke: none;".to_string(),
            "}".to_string(),
        ]
    }
}

impl Default for ConstantProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a declared style: parses the primary colour (black if unset)
/// and derives missing secondary and tertiary colours by blending toward
/// white.
fn validated_block_style(style: &BlockStyleDef) -> Result<BlockStyle, RenderError> {
    let parse = |value: &str| parse_block_colour(value).map_err(RenderError::InvalidColour);
    let white = Color::from_rgb8(255, 255, 255);

    let primary = parse(style.colour_primary().unwrap_or("#000"))?;
    let secondary = match style.colour_secondary() {
        Some(colour) if !colour.is_empty() => parse(colour)?,
        _ => white.blend(primary, 0.6),
    };
    let tertiary = match style.colour_tertiary() {
        Some(colour) if !colour.is_empty() => parse(colour)?,
        _ => white.blend(primary, 0.3),
    };
    Ok(BlockStyle::new(
        primary,
        secondary,
        tertiary,
        style.hat().unwrap_or(""),
    ))
}

fn move_by(dx: f64, dy: f64) -> SvgPath {
    let mut path = SvgPath::new();
    path.move_by(dx, dy);
    path
}

fn placeholder_notch() -> Notch {
    Notch {
        width: 0.0,
        height: 0.0,
        path_left: SvgPath::new(),
        path_right: SvgPath::new(),
    }
}

fn placeholder_tab() -> PuzzleTab {
    PuzzleTab {
        width: 0.0,
        height: 0.0,
        path_down: SvgPath::new(),
        path_up: SvgPath::new(),
    }
}

fn placeholder_inside_corners() -> InsideCorners {
    InsideCorners {
        width: 0.0,
        height: 0.0,
        path_top: SvgPath::new(),
        path_bottom: SvgPath::new(),
    }
}

fn placeholder_outside_corners() -> OutsideCorners {
    OutsideCorners {
        top_left: SvgPath::new(),
        top_right: SvgPath::new(),
        bottom_left: SvgPath::new(),
        bottom_right: SvgPath::new(),
        right_height: 0.0,
    }
}

fn placeholder_jagged_teeth() -> JaggedTeeth {
    JaggedTeeth {
        width: 0.0,
        height: 0.0,
        path: SvgPath::new(),
    }
}

fn placeholder_start_hat() -> StartHat {
    StartHat {
        width: 0.0,
        height: 0.0,
        path: SvgPath::new(),
    }
}
