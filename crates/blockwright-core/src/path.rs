//! SVG path-data builder.
//!
//! Block outlines are assembled from many small drawing steps. Instead of
//! concatenating strings at every step, each step appends [`PathSegment`]
//! tokens to an [`SvgPath`], and the whole path is rendered to text once
//! through [`fmt::Display`].
//!
//! The textual form of every segment reproduces the legacy path format
//! exactly (including its spacing), so output is byte-for-byte stable across
//! renders.
//!
//! # Example
//!
//! ```
//! use blockwright_core::path::SvgPath;
//!
//! let mut path = SvgPath::new();
//! path.move_by(0.0, 0.0).horizontal_by(40.0).vertical_by(24.0).close();
//! assert_eq!(path.to_string(), " m 0,0  h 40  v 24 z");
//! ```

use std::fmt;

use crate::geometry::Point;

/// Cubic and quadratic curve commands used by block shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveCommand {
    /// Relative cubic Bézier (`c`)
    Cubic,
    /// Relative smooth cubic Bézier (`s`)
    SmoothCubic,
    /// Relative quadratic Bézier (`q`)
    Quadratic,
}

impl CurveCommand {
    fn letter(self) -> char {
        match self {
            Self::Cubic => 'c',
            Self::SmoothCubic => 's',
            Self::Quadratic => 'q',
        }
    }
}

/// Arc flags, written as `large-arc sweep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSweep {
    /// `0 0,0`: small arc, counter-clockwise
    CounterClockwise,
    /// `0 0,1`: small arc, clockwise
    Clockwise,
}

impl ArcSweep {
    fn flags(self) -> &'static str {
        match self {
            Self::CounterClockwise => "0 0,0",
            Self::Clockwise => "0 0,1",
        }
    }
}

/// A single token of SVG path data.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Absolute move (`M x,y`)
    MoveTo(Point),
    /// Relative move (`m dx,dy`)
    MoveBy(Point),
    /// Single relative line (`l dx,dy`)
    LineTo(Point),
    /// Polyline of relative points (`l p1 p2 ...`)
    Line(Vec<Point>),
    /// Absolute horizontal line (`H x`)
    HorizontalTo(f64),
    /// Relative horizontal line (`h dx`)
    HorizontalBy(f64),
    /// Absolute vertical line (`V y`)
    VerticalTo(f64),
    /// Relative vertical line (`v dy`)
    VerticalBy(f64),
    /// Relative curve through control points
    Curve(CurveCommand, Vec<Point>),
    /// Relative circular arc (`a r r flags x,y`)
    Arc {
        sweep: ArcSweep,
        radius: f64,
        end: Point,
    },
    /// Close the current sub-path (`z`)
    Close,
}

/// Formats a number the way path data expects: shortest round-trip form,
/// never `-0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn write_point(f: &mut fmt::Formatter<'_>, point: Point) -> fmt::Result {
    write!(
        f,
        " {},{} ",
        format_number(point.x()),
        format_number(point.y())
    )
}

fn write_axis(f: &mut fmt::Formatter<'_>, command: char, value: f64) -> fmt::Result {
    write!(f, " {command} {} ", format_number(value))
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveTo(p) => write!(f, " M {},{} ", format_number(p.x()), format_number(p.y())),
            Self::MoveBy(p) => write!(f, " m {},{} ", format_number(p.x()), format_number(p.y())),
            Self::LineTo(p) => write!(f, " l {},{} ", format_number(p.x()), format_number(p.y())),
            Self::Line(points) => {
                f.write_str(" l")?;
                points.iter().try_for_each(|p| write_point(f, *p))
            }
            Self::HorizontalTo(x) => write_axis(f, 'H', *x),
            Self::HorizontalBy(dx) => write_axis(f, 'h', *dx),
            Self::VerticalTo(y) => write_axis(f, 'V', *y),
            Self::VerticalBy(dy) => write_axis(f, 'v', *dy),
            Self::Curve(command, points) => {
                write!(f, " {}", command.letter())?;
                points.iter().try_for_each(|p| write_point(f, *p))
            }
            Self::Arc { sweep, radius, end } => {
                let r = format_number(*radius);
                write!(f, "a {r} {r} {}", sweep.flags())?;
                write_point(f, *end)
            }
            Self::Close => f.write_str("z"),
        }
    }
}

/// An ordered list of path segments, rendered to path data on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgPath {
    segments: Vec<PathSegment>,
}

impl SvgPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the segments in drawing order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns `true` if no segment has been added.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a raw segment.
    pub fn push(&mut self, segment: PathSegment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    /// Appends every segment of `other`.
    pub fn append(&mut self, other: &SvgPath) -> &mut Self {
        self.segments.extend(other.segments.iter().cloned());
        self
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push(PathSegment::MoveTo(Point::new(x, y)))
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.push(PathSegment::MoveBy(Point::new(dx, dy)))
    }

    pub fn line_to(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.push(PathSegment::LineTo(Point::new(dx, dy)))
    }

    pub fn line(&mut self, points: &[(f64, f64)]) -> &mut Self {
        let points = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        self.push(PathSegment::Line(points))
    }

    pub fn horizontal_to(&mut self, x: f64) -> &mut Self {
        self.push(PathSegment::HorizontalTo(x))
    }

    pub fn horizontal_by(&mut self, dx: f64) -> &mut Self {
        self.push(PathSegment::HorizontalBy(dx))
    }

    pub fn vertical_to(&mut self, y: f64) -> &mut Self {
        self.push(PathSegment::VerticalTo(y))
    }

    pub fn vertical_by(&mut self, dy: f64) -> &mut Self {
        self.push(PathSegment::VerticalBy(dy))
    }

    pub fn curve(&mut self, command: CurveCommand, points: &[(f64, f64)]) -> &mut Self {
        let points = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        self.push(PathSegment::Curve(command, points))
    }

    pub fn arc(&mut self, sweep: ArcSweep, radius: f64, end: (f64, f64)) -> &mut Self {
        self.push(PathSegment::Arc {
            sweep,
            radius,
            end: Point::new(end.0, end.1),
        })
    }

    pub fn close(&mut self) -> &mut Self {
        self.push(PathSegment::Close)
    }

    /// Returns `true` if any segment is an arc.
    pub fn has_arc(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Arc { .. }))
    }
}

impl fmt::Display for SvgPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.segments
            .iter()
            .try_for_each(|segment| write!(f, "{segment}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(7.5), "7.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-3.25), "-3.25");
    }

    #[test]
    fn test_axis_segments() {
        let mut path = SvgPath::new();
        path.horizontal_to(10.0)
            .vertical_to(5.0)
            .horizontal_by(-2.0)
            .vertical_by(3.0);
        assert_eq!(path.to_string(), " H 10  V 5  h -2  v 3 ");
    }

    #[test]
    fn test_polyline_notch() {
        let mut path = SvgPath::new();
        path.line(&[(6.0, 4.0), (3.0, 0.0), (6.0, -4.0)]);
        assert_eq!(path.to_string(), " l 6,4  3,0  6,-4 ");
    }

    #[test]
    fn test_arc_segment() {
        let mut path = SvgPath::new();
        path.arc(ArcSweep::Clockwise, 8.0, (8.0, -8.0));
        assert_eq!(path.to_string(), "a 8 8 0 0,1 8,-8 ");
        assert!(path.has_arc());
    }

    #[test]
    fn test_curve_segment() {
        let mut path = SvgPath::new();
        path.curve(CurveCommand::Cubic, &[(30.0, -15.0), (70.0, -15.0), (100.0, 0.0)]);
        assert_eq!(path.to_string(), " c 30,-15  70,-15  100,0 ");
    }

    #[test]
    fn test_move_segments() {
        let mut path = SvgPath::new();
        path.move_to(1.5, 2.0).move_by(0.0, 8.0).line_to(5.1, 2.6);
        assert_eq!(path.to_string(), " M 1.5,2  m 0,8  l 5.1,2.6 ");
    }

    #[test]
    fn test_append_preserves_order() {
        let mut first = SvgPath::new();
        first.horizontal_by(1.0);
        let mut second = SvgPath::new();
        second.vertical_by(2.0).close();

        first.append(&second);
        assert_eq!(first.segments().len(), 3);
        assert_eq!(first.to_string(), " h 1  v 2 z");
        assert!(!first.has_arc());
    }

    #[test]
    fn test_empty_path_renders_empty() {
        let path = SvgPath::new();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
    }
}
