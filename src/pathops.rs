// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The boolean path-operations adapter: union, intersection, stroke
//! expansion, and bounds, over the canonical path-data model.
//!
//! Stroking is delegated to `kurbo::stroke`, which expands a center-line
//! into its filled outline directly in Bézier form. Union/intersection
//! have no equivalent curved-geometry engine in the crates this project
//! depends on, so those go through `geo`'s `BooleanOps`: every subpath is
//! flattened to a polygon ring, combined, and the result's straight edges
//! are written back out as `L` commands — adequate for the nano pipeline,
//! whose clip shapes are themselves built from this same flattening.

use std::fmt;

use geo::BooleanOps;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use kurbo::stroke::{stroke as expand_stroke, StrokeOpts};
use kurbo::{BezPath, Cap, Join, PathEl, Point, Stroke};

use crate::path::{Command, PathData};

/// Line-cap styles, named per https://www.w3.org/TR/SVG11/painting.html#StrokeLinecapProperty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

/// Line-join styles, named per https://www.w3.org/TR/SVG11/painting.html#StrokeLinejoinProperty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl LineCap {
    fn parse(s: &str) -> LineCap {
        match s {
            "round" => LineCap::Round,
            "square" => LineCap::Square,
            _ => LineCap::Butt,
        }
    }

    fn to_kurbo(self) -> Cap {
        match self {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        }
    }
}

impl LineJoin {
    fn parse(s: &str) -> LineJoin {
        match s {
            "round" => LineJoin::Round,
            "bevel" => LineJoin::Bevel,
            _ => LineJoin::Miter,
        }
    }

    fn to_kurbo(self) -> Join {
        match self {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        }
    }
}

/// A failure converting path data to or from the boolean-ops engine's
/// native representation — most commonly an unclosed subpath handed to
/// `union`/`intersection`, which only operate on closed regions.
#[derive(Clone, Debug, PartialEq)]
pub struct BooleanOpError {
    pub reason: String,
}

impl fmt::Display for BooleanOpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "path boolean op failed: {}", self.reason)
    }
}

impl std::error::Error for BooleanOpError {}

/// Maximum deviation, in user units, allowed when flattening a curved
/// subpath to the straight-edged polygon the boolean-ops engine expects.
const FLATTEN_ACCURACY: f64 = 0.1;

/// Returns the union of all the given (closed) path's filled regions, as
/// a single canonical path.
pub fn union(paths: &[PathData]) -> Result<PathData, BooleanOpError> {
    boolean_combine(paths, |acc, poly| acc.union(poly))
}

/// Returns the intersection of all the given (closed) path's filled
/// regions, as a single canonical path. An empty result (no overlap) is
/// a valid, empty `PathData`.
pub fn intersection(paths: &[PathData]) -> Result<PathData, BooleanOpError> {
    boolean_combine(paths, |acc, poly| acc.intersection(poly))
}

fn boolean_combine(
    paths: &[PathData],
    op: impl Fn(&MultiPolygon<f64>, &MultiPolygon<f64>) -> MultiPolygon<f64>,
) -> Result<PathData, BooleanOpError> {
    if paths.is_empty() {
        return Ok(PathData::new());
    }
    let mut polygons = paths.iter().map(to_multi_polygon).collect::<Result<Vec<_>, _>>()?;
    let mut acc = polygons.remove(0);
    for poly in &polygons {
        acc = op(&acc, poly);
    }
    Ok(multi_polygon_to_path(&acc))
}

/// Flattens every closed subpath in `path` into a `geo` polygon ring. Per
/// spec, `union`/`intersection` require closed input; an unclosed
/// subpath is an input error, not silently dropped.
fn to_multi_polygon(path: &PathData) -> Result<MultiPolygon<f64>, BooleanOpError> {
    let canonical = path.to_canonical();
    let mut rings: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    let mut start = (0.0, 0.0);
    let mut cur = (0.0, 0.0);

    let flush = |rings: &mut Vec<Vec<Coord<f64>>>, current: &mut Vec<Coord<f64>>| {
        if current.len() >= 3 {
            rings.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for cmd in canonical.commands() {
        match *cmd {
            Command::MoveTo { x, y, .. } => {
                flush(&mut rings, &mut current);
                start = (x, y);
                cur = (x, y);
                current.push(Coord { x, y });
            }
            Command::LineTo { x, y, .. } => {
                cur = (x, y);
                current.push(Coord { x, y });
            }
            Command::CurveTo {
                x1, y1, x2, y2, x, y, ..
            } => {
                flatten_cubic(cur, (x1, y1), (x2, y2), (x, y), &mut current);
                cur = (x, y);
            }
            Command::ClosePath { .. } => {
                current.push(Coord { x: start.0, y: start.1 });
                cur = start;
            }
            other => {
                return Err(BooleanOpError {
                    reason: format!("unexpected command in canonical path: {:?}", other),
                })
            }
        }
    }
    flush(&mut rings, &mut current);

    if rings.is_empty() {
        return Err(BooleanOpError {
            reason: "path has no closed subpath".to_string(),
        });
    }

    let mut rings = rings.into_iter();
    let exterior = LineString(rings.next().unwrap());
    let interiors = rings.map(LineString).collect::<Vec<_>>();
    Ok(MultiPolygon(vec![Polygon::new(exterior, interiors)]))
}

fn flatten_cubic(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), out: &mut Vec<Coord<f64>>) {
    let mut bez = BezPath::new();
    bez.move_to(Point::new(p0.0, p0.1));
    bez.curve_to(Point::new(p1.0, p1.1), Point::new(p2.0, p2.1), Point::new(p3.0, p3.1));
    kurbo::flatten(bez, FLATTEN_ACCURACY, |el| match el {
        PathEl::LineTo(p) => out.push(Coord { x: p.x, y: p.y }),
        PathEl::MoveTo(_) => {}
        _ => {}
    });
}

/// Rebuilds canonical path data from a `geo` boolean-op result: every
/// polygon ring becomes a closed `M`/`L*`/`Z` subpath.
fn multi_polygon_to_path(mp: &MultiPolygon<f64>) -> PathData {
    let mut cmds = Vec::new();
    for polygon in mp.0.iter() {
        push_ring(polygon.exterior(), &mut cmds);
        for interior in polygon.interiors() {
            push_ring(interior, &mut cmds);
        }
    }
    PathData(cmds)
}

fn push_ring(ring: &LineString<f64>, cmds: &mut Vec<Command>) {
    let coords: Vec<_> = ring.coords().collect();
    if coords.len() < 2 {
        return;
    }
    cmds.push(Command::MoveTo {
        abs: true,
        x: coords[0].x,
        y: coords[0].y,
    });
    // `geo` closes rings by repeating the first coordinate as the last;
    // skip it here since `ClosePath` already returns to the start point.
    for c in &coords[1..coords.len() - 1] {
        cmds.push(Command::LineTo { abs: true, x: c.x, y: c.y });
    }
    cmds.push(Command::ClosePath { abs: true });
}

/// Expands a path's center-line into the filled outline its stroke would
/// occupy, given `width`, the cap/join names from the `stroke-linecap`/
/// `stroke-linejoin` attributes, and the miter limit.
///
/// The SVG `sweep-flag` sense on any arc already decomposed
/// into cubics upstream is unaffected by this conversion — the sweep/clockwise
/// note applies only to the engine-native boolean-op representation
/// (flattened polygon rings), not to `kurbo`'s stroke expansion, which
/// consumes our Bézier path directly.
pub fn stroke(path: &PathData, width: f64, cap: &str, join: &str, miter_limit: f64) -> PathData {
    let canonical = path.to_canonical();
    let bez = to_bez_path(&canonical);

    let style = Stroke::new(width)
        .with_caps(LineCap::parse(cap).to_kurbo())
        .with_join(LineJoin::parse(join).to_kurbo())
        .with_miter_limit(miter_limit);

    let outline = expand_stroke(bez.path_elements(1e-6), &style, &StrokeOpts::default(), FLATTEN_ACCURACY);
    from_bez_path(&outline)
}

/// The axis-aligned bounding box `(min_x, min_y, max_x, max_y)` of a
/// path's absolute, arc-free coordinates — control points included, so
/// it is a conservative (not tight) bound on the curve itself, matching
/// how bounding boxes over Bézier control polygons are conventionally
/// computed when a tight solve isn't needed.
pub fn bounds(path: &PathData) -> Option<(f64, f64, f64, f64)> {
    let canonical = path.to_canonical();
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut any = false;

    let mut consider = |x: f64, y: f64| {
        any = true;
        min.0 = min.0.min(x);
        min.1 = min.1.min(y);
        max.0 = max.0.max(x);
        max.1 = max.1.max(y);
    };

    for cmd in canonical.commands() {
        match *cmd {
            Command::MoveTo { x, y, .. } | Command::LineTo { x, y, .. } => consider(x, y),
            Command::CurveTo {
                x1, y1, x2, y2, x, y, ..
            } => {
                consider(x1, y1);
                consider(x2, y2);
                consider(x, y);
            }
            Command::ClosePath { .. } => {}
            other => unreachable!("canonical path cannot contain {:?}", other),
        }
    }

    if any {
        Some((min.0, min.1, max.0, max.1))
    } else {
        None
    }
}

fn to_bez_path(path: &PathData) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in path.commands() {
        match *cmd {
            Command::MoveTo { x, y, .. } => bez.move_to(Point::new(x, y)),
            Command::LineTo { x, y, .. } => bez.line_to(Point::new(x, y)),
            Command::CurveTo {
                x1, y1, x2, y2, x, y, ..
            } => bez.curve_to(Point::new(x1, y1), Point::new(x2, y2), Point::new(x, y)),
            Command::ClosePath { .. } => bez.close_path(),
            other => unreachable!("canonical path cannot contain {:?}", other),
        }
    }
    bez
}

/// Converts a stroked outline (which `kurbo::stroke` may emit using
/// quadratic segments) back to our command set: quadratics are kept as
/// `Q` (not flattened back into line segments).
fn from_bez_path(bez: &BezPath) -> PathData {
    let mut cmds = Vec::new();
    for el in bez.elements() {
        match *el {
            PathEl::MoveTo(p) => cmds.push(Command::MoveTo { abs: true, x: p.x, y: p.y }),
            PathEl::LineTo(p) => cmds.push(Command::LineTo { abs: true, x: p.x, y: p.y }),
            PathEl::QuadTo(c, p) => cmds.push(Command::Quadratic {
                abs: true,
                x1: c.x,
                y1: c.y,
                x: p.x,
                y: p.y,
            }),
            PathEl::CurveTo(c1, c2, p) => cmds.push(Command::CurveTo {
                abs: true,
                x1: c1.x,
                y1: c1.y,
                x2: c2.x,
                y2: c2.y,
                x: p.x,
                y: p.y,
            }),
            PathEl::ClosePath => cmds.push(Command::ClosePath { abs: true }),
        }
    }
    PathData(cmds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, side: f64) -> PathData {
        PathData(vec![
            Command::MoveTo { abs: true, x, y },
            Command::LineTo { abs: true, x: x + side, y },
            Command::LineTo { abs: true, x: x + side, y: y + side },
            Command::LineTo { abs: true, x, y: y + side },
            Command::ClosePath { abs: true },
        ])
    }

    #[test]
    fn union_of_overlapping_squares_has_no_gap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 5.0, 10.0);
        let result = union(&[a, b]).unwrap();
        assert!(!result.is_empty());
        let (minx, miny, maxx, maxy) = bounds(&result).unwrap();
        assert!((minx - 0.0).abs() < 1e-6);
        assert!((miny - 0.0).abs() < 1e-6);
        assert!((maxx - 15.0).abs() < 1e-6);
        assert!((maxy - 15.0).abs() < 1e-6);
    }

    #[test]
    fn intersection_of_disjoint_squares_is_empty() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(100.0, 100.0, 1.0);
        let result = intersection(&[a, b]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn stroke_of_horizontal_line_is_a_thick_rectangle() {
        let line = PathData(vec![
            Command::MoveTo { abs: true, x: 0.0, y: 0.0 },
            Command::LineTo { abs: true, x: 10.0, y: 0.0 },
        ]);
        let outline = stroke(&line, 2.0, "butt", "miter", 4.0);
        let (minx, miny, maxx, maxy) = bounds(&outline).unwrap();
        assert!((minx - 0.0).abs() < 1e-6);
        assert!((maxx - 10.0).abs() < 1e-6);
        assert!((miny - (-1.0)).abs() < 1e-6);
        assert!((maxy - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bounds_of_empty_path_is_none() {
        assert!(bounds(&PathData::new()).is_none());
    }
}
