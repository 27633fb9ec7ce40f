//! Path fragments for the Geras highlight pass.
//!
//! Highlights are drawn half a pixel inside the block edge, so each
//! fragment here is the matching outline fragment shifted by [`OFFSET`]
//! and clipped to the edges that face the light (top and left).
//!
//! [`OFFSET`]: HighlightConstantProvider::OFFSET

use std::f64::consts::FRAC_1_SQRT_2;

use blockwright_core::path::{ArcSweep, CurveCommand, SvgPath};

use super::constants::ConstantProvider;

/// Highlight along the inside corners of a statement input.
#[derive(Debug, Clone, PartialEq)]
pub struct InsideCornerHighlight {
    pub width: f64,
    pub height: f64,
    path_top_rtl: SvgPath,
    path_bottom_rtl: SvgPath,
    path_bottom_ltr: SvgPath,
}

impl InsideCornerHighlight {
    /// In LTR the top inside corner faces away from the light and is not
    /// highlighted.
    pub fn path_top(&self, rtl: bool) -> SvgPath {
        if rtl {
            self.path_top_rtl.clone()
        } else {
            SvgPath::new()
        }
    }

    pub fn path_bottom(&self, rtl: bool) -> &SvgPath {
        if rtl {
            &self.path_bottom_rtl
        } else {
            &self.path_bottom_ltr
        }
    }
}

/// Highlight along the rounded outside corners.
#[derive(Debug, Clone, PartialEq)]
pub struct OutsideCornerHighlight {
    pub height: f64,
    top_left_rtl: SvgPath,
    top_left_ltr: SvgPath,
    bottom_left: SvgPath,
}

impl OutsideCornerHighlight {
    pub fn top_left(&self, rtl: bool) -> &SvgPath {
        if rtl {
            &self.top_left_rtl
        } else {
            &self.top_left_ltr
        }
    }

    pub fn bottom_left(&self) -> &SvgPath {
        &self.bottom_left
    }
}

/// Highlight along a puzzle tab.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleTabHighlight {
    pub width: f64,
    pub height: f64,
    path_up_rtl: SvgPath,
    path_up_ltr: SvgPath,
    path_down_rtl: SvgPath,
    path_down_ltr: SvgPath,
}

impl PuzzleTabHighlight {
    pub fn path_up(&self, rtl: bool) -> &SvgPath {
        if rtl {
            &self.path_up_rtl
        } else {
            &self.path_up_ltr
        }
    }

    pub fn path_down(&self, rtl: bool) -> &SvgPath {
        if rtl {
            &self.path_down_rtl
        } else {
            &self.path_down_ltr
        }
    }
}

/// Highlight along a previous-connection notch.
#[derive(Debug, Clone, PartialEq)]
pub struct NotchHighlight {
    pub path_left: SvgPath,
}

/// Highlight along the jagged edge of a collapsed block.
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedTeethHighlight {
    pub width: f64,
    pub height: f64,
    pub path_left: SvgPath,
}

/// Highlight along a start hat.
#[derive(Debug, Clone, PartialEq)]
pub struct StartHatHighlight {
    path_rtl: SvgPath,
    path_ltr: SvgPath,
}

impl StartHatHighlight {
    pub fn path(&self, rtl: bool) -> &SvgPath {
        if rtl { &self.path_rtl } else { &self.path_ltr }
    }
}

/// Highlight path fragments, built from the outline constants.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightConstantProvider {
    pub start_point: SvgPath,
    pub inside_corner: InsideCornerHighlight,
    pub outside_corner: OutsideCornerHighlight,
    pub puzzle_tab: PuzzleTabHighlight,
    pub notch: NotchHighlight,
    pub jagged_teeth: JaggedTeethHighlight,
    pub start_hat: StartHatHighlight,
}

impl HighlightConstantProvider {
    /// Distance between the block edge and its highlight.
    pub const OFFSET: f64 = 0.5;

    /// Builds every fragment. `constants` must already be initialized.
    pub fn new(constants: &ConstantProvider) -> Self {
        let mut start_point = SvgPath::new();
        start_point.move_by(Self::OFFSET, Self::OFFSET);
        Self {
            start_point,
            inside_corner: make_inside_corner(constants),
            outside_corner: make_outside_corner(constants),
            puzzle_tab: make_puzzle_tab(constants),
            notch: make_notch(constants),
            jagged_teeth: make_jagged_teeth(),
            start_hat: make_start_hat(constants),
        }
    }
}

fn make_inside_corner(constants: &ConstantProvider) -> InsideCornerHighlight {
    let radius = constants.corner_radius;
    let offset = HighlightConstantProvider::OFFSET;
    // Where a 45 degree line meets the curve, measured on the outside.
    let distance_45_outside = (1.0 - FRAC_1_SQRT_2) * (radius + offset) - offset;

    let mut path_top_rtl = SvgPath::new();
    path_top_rtl
        .move_by(distance_45_outside, distance_45_outside)
        .arc(
            ArcSweep::CounterClockwise,
            radius,
            (-distance_45_outside - offset, radius - distance_45_outside),
        );

    let mut path_bottom_rtl = SvgPath::new();
    path_bottom_rtl.arc(
        ArcSweep::CounterClockwise,
        radius + offset,
        (radius + offset, radius + offset),
    );

    let mut path_bottom_ltr = SvgPath::new();
    path_bottom_ltr
        .move_by(distance_45_outside, -distance_45_outside)
        .arc(
            ArcSweep::CounterClockwise,
            radius + offset,
            (radius - distance_45_outside, distance_45_outside + offset),
        );

    InsideCornerHighlight {
        width: radius + offset,
        height: radius,
        path_top_rtl,
        path_bottom_rtl,
        path_bottom_ltr,
    }
}

fn make_outside_corner(constants: &ConstantProvider) -> OutsideCornerHighlight {
    let radius = constants.corner_radius;
    let offset = HighlightConstantProvider::OFFSET;
    // Where a 45 degree line meets the curve, measured on the inside.
    let distance_45_inside = (1.0 - FRAC_1_SQRT_2) * (radius - offset) + offset;

    let mut top_left_rtl = SvgPath::new();
    top_left_rtl
        .move_by(distance_45_inside, distance_45_inside)
        .arc(
            ArcSweep::Clockwise,
            radius - offset,
            (radius - distance_45_inside, -distance_45_inside + offset),
        );

    let mut top_left_ltr = SvgPath::new();
    top_left_ltr
        .move_by(offset, radius)
        .arc(ArcSweep::Clockwise, radius - offset, (radius, -radius + offset));

    let mut bottom_left = SvgPath::new();
    bottom_left
        .move_by(distance_45_inside, -distance_45_inside)
        .arc(
            ArcSweep::Clockwise,
            radius - offset,
            (-distance_45_inside + offset, distance_45_inside - radius),
        );

    OutsideCornerHighlight {
        height: radius,
        top_left_rtl,
        top_left_ltr,
        bottom_left,
    }
}

fn make_puzzle_tab(constants: &ConstantProvider) -> PuzzleTabHighlight {
    let width = constants.tab_width;
    let height = constants.tab_height;
    // Part of the vertical edge the tab itself draws.
    let vertical_overlap = 2.5;

    let mut path_up_rtl = SvgPath::new();
    path_up_rtl
        .move_by(-2.0, -height + vertical_overlap)
        .line_to(-width * 0.45, -2.1);

    let mut path_down_rtl = SvgPath::new();
    path_down_rtl
        .vertical_by(vertical_overlap)
        .move_by(-width * 0.97, 2.5)
        .curve(CurveCommand::Quadratic, &[(-width * 0.05, 10.0), (width * 0.3, 9.5)])
        .move_by(width * 0.67, -1.9)
        .vertical_by(vertical_overlap);

    let mut path_up_ltr = SvgPath::new();
    path_up_ltr
        .vertical_by(-1.5)
        .move_by(width * -0.92, -0.5)
        .curve(CurveCommand::Quadratic, &[(width * -0.19, -5.5), (0.0, -11.0)])
        .move_by(width * 0.92, 1.0);

    let mut path_down_ltr = SvgPath::new();
    path_down_ltr
        .move_by(-5.0, height - 0.7)
        .line_to(width * 0.46, -2.1);

    PuzzleTabHighlight {
        width,
        height,
        path_up_rtl,
        path_up_ltr,
        path_down_rtl,
        path_down_ltr,
    }
}

fn make_notch(constants: &ConstantProvider) -> NotchHighlight {
    let mut path_left = SvgPath::new();
    path_left
        .horizontal_by(HighlightConstantProvider::OFFSET)
        .append(&constants.notch.path_left);
    NotchHighlight { path_left }
}

fn make_jagged_teeth() -> JaggedTeethHighlight {
    let mut path_left = SvgPath::new();
    path_left
        .line_to(5.1, 2.6)
        .move_by(-10.2, 6.8)
        .line_to(5.1, 2.6);
    JaggedTeethHighlight {
        width: 10.2,
        height: 12.0,
        path_left,
    }
}

fn make_start_hat(constants: &ConstantProvider) -> StartHatHighlight {
    let hat_height = constants.start_hat.height;

    let mut path_rtl = SvgPath::new();
    path_rtl.move_by(25.0, -8.7).curve(
        CurveCommand::Cubic,
        &[(29.7, -6.2), (57.2, -0.5), (75.0, 8.7)],
    );

    let mut path_ltr = SvgPath::new();
    path_ltr
        .curve(
            CurveCommand::Cubic,
            &[(17.8, -9.2), (45.3, -14.9), (75.0, -8.7)],
        )
        .move_to(100.5, hat_height + 0.5);

    StartHatHighlight { path_rtl, path_ltr }
}
