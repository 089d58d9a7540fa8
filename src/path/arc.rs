// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elliptical-arc-to-cubic-Bézier conversion, SVG 1.1 Appendix F.6.5.
//!
//! Delegates the endpoint-to-center parameterization and the cubic-arc
//! error-bounded subdivision to `kurbo`.

use kurbo::{Arc, Point, SvgArc, Vec2};

/// The maximum deviation, in user units, a subdivided cubic is allowed to
/// drift from the true elliptical arc. `kurbo`'s rect/circle converters use
/// this same tolerance.
const ARC_ACCURACY: f64 = 0.1;

/// Converts a single elliptical arc segment from `start` to `end` into a
/// sequence of cubic Bézier segments, each given as `(control1, control2,
/// end)`. Returns an empty vector for a degenerate arc (coincident
/// endpoints or a zero radius), matching the SVG spec's "treat as a
/// straight line" rule — callers fall back to a line-to in that case.
pub fn arc_to_cubics(
    start: (f64, f64),
    radii: (f64, f64),
    x_axis_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    end: (f64, f64),
) -> Vec<((f64, f64), (f64, f64), (f64, f64))> {
    if start == end {
        return Vec::new();
    }
    if radii.0 == 0.0 || radii.1 == 0.0 {
        // a zero-radius arc degenerates to a straight line; represent it
        // as a single "cubic" whose controls sit on the line so callers
        // that always expect a CurveTo still get a geometrically correct
        // segment.
        let c1 = (
            start.0 + (end.0 - start.0) / 3.0,
            start.1 + (end.1 - start.1) / 3.0,
        );
        let c2 = (
            start.0 + (end.0 - start.0) * 2.0 / 3.0,
            start.1 + (end.1 - start.1) * 2.0 / 3.0,
        );
        return vec![(c1, c2, end)];
    }

    let svg_arc = SvgArc {
        from: Point::new(start.0, start.1),
        to: Point::new(end.0, end.1),
        radii: Vec2::new(radii.0, radii.1),
        x_rotation: x_axis_rotation_deg.to_radians(),
        large_arc,
        sweep,
    };

    let arc = match Arc::from_svg_arc(&svg_arc) {
        Some(arc) => arc,
        // `from_svg_arc` returns `None` when the arc is degenerate enough
        // to be a straight line (SVG spec F.6.6); the caller's LineTo
        // fallback is the correct behavior, so emit nothing.
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    arc.to_cubic_beziers(ARC_ACCURACY, |p1, p2, p| {
        out.push(((p1.x, p1.y), (p2.x, p2.y), (p.x, p.y)));
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicircle_ends_at_target_point() {
        let segs = arc_to_cubics((0.0, 0.0), (5.0, 5.0), 0.0, false, true, (10.0, 0.0));
        assert!(!segs.is_empty());
        let (_, _, last_end) = *segs.last().unwrap();
        assert!((last_end.0 - 10.0).abs() < 1e-6);
        assert!((last_end.1 - 0.0).abs() < 1e-6);
    }

    #[test]
    fn coincident_endpoints_produce_no_segments() {
        assert!(arc_to_cubics((1.0, 1.0), (5.0, 5.0), 0.0, false, false, (1.0, 1.0)).is_empty());
    }

    #[test]
    fn zero_radius_falls_back_to_a_line() {
        let segs = arc_to_cubics((0.0, 0.0), (0.0, 5.0), 0.0, false, false, (10.0, 0.0));
        assert_eq!(segs.len(), 1);
    }
}
