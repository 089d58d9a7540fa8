// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The seven SVG basic-shape primitives, their shared paint/stroke
//! attribute bag, and the `as_path` conversion each one defines per
//! https://www.w3.org/TR/SVG11/shapes.html.

use crate::dom::{ElementData, Node, NodeExt};
use crate::path::{Command, PathData};

/// Paint and stroke attributes shared by every shape primitive, plus the
/// handful of structural attributes (`id`, `clip-path`, `transform`) the
/// canonicalization pipeline needs to carry along regardless of which
/// shape they're attached to.
///
/// Defaults match the SVG 1.1 initial values for these properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub id: Option<String>,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_linecap: String,
    pub stroke_linejoin: String,
    pub stroke_miterlimit: f64,
    pub stroke_dasharray: Option<String>,
    pub stroke_opacity: f64,
    pub opacity: f64,
    pub clip_path: Option<String>,
    pub transform: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            id: None,
            fill: "black".to_string(),
            fill_opacity: 1.0,
            stroke: "none".to_string(),
            stroke_width: 1.0,
            stroke_linecap: "butt".to_string(),
            stroke_linejoin: "miter".to_string(),
            stroke_miterlimit: 4.0,
            stroke_dasharray: None,
            stroke_opacity: 1.0,
            opacity: 1.0,
            clip_path: None,
            transform: None,
        }
    }
}

impl Style {
    /// True unless painted with neither a fill nor a stroke, or fully
    /// transparent, or explicitly `display: none`/`visibility: hidden`
    /// (tracked by `hidden`, since those aren't paint attributes).
    pub fn is_painted(&self) -> bool {
        let has_fill = self.fill != "none" && self.fill_opacity > 0.0;
        let has_stroke = self.stroke != "none" && self.stroke_opacity > 0.0 && self.stroke_width > 0.0;
        (has_fill || has_stroke) && self.opacity > 0.0
    }
}

/// A `<rect>` element's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rx: Option<f64>,
    pub ry: Option<f64>,
}

/// A `<circle>` element's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

/// An `<ellipse>` element's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

/// A `<line>` element's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A `<polygon>`/`<polyline>` element's vertex list.
#[derive(Clone, Debug, PartialEq)]
pub struct Points(pub Vec<(f64, f64)>);

/// One of the seven SVG basic shapes, carrying its own geometry plus the
/// shared `Style` bag.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect, Style),
    Circle(Circle, Style),
    Ellipse(Ellipse, Style),
    Line(Line, Style),
    Polygon(Points, Style),
    Polyline(Points, Style),
    Path(PathData, Style),
}

impl Shape {
    pub fn style(&self) -> &Style {
        match self {
            Shape::Rect(_, s)
            | Shape::Circle(_, s)
            | Shape::Ellipse(_, s)
            | Shape::Line(_, s)
            | Shape::Polygon(_, s)
            | Shape::Polyline(_, s)
            | Shape::Path(_, s) => s,
        }
    }

    pub fn style_mut(&mut self) -> &mut Style {
        match self {
            Shape::Rect(_, s)
            | Shape::Circle(_, s)
            | Shape::Ellipse(_, s)
            | Shape::Line(_, s)
            | Shape::Polygon(_, s)
            | Shape::Polyline(_, s)
            | Shape::Path(_, s) => s,
        }
    }

    /// The SVG tag name this shape round-trips to/from.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Shape::Rect(..) => "rect",
            Shape::Circle(..) => "circle",
            Shape::Ellipse(..) => "ellipse",
            Shape::Line(..) => "line",
            Shape::Polygon(..) => "polygon",
            Shape::Polyline(..) => "polyline",
            Shape::Path(..) => "path",
        }
    }

    /// A shape is visible if it carries enough geometry to occupy area
    /// or length, and is painted (see `Style::is_painted`).
    pub fn visible(&self) -> bool {
        if !self.style().is_painted() {
            return false;
        }
        match self {
            Shape::Rect(r, _) => r.width > 0.0 && r.height > 0.0,
            Shape::Circle(c, _) => c.r > 0.0,
            Shape::Ellipse(e, _) => e.rx > 0.0 && e.ry > 0.0,
            Shape::Line(_, _) => true,
            Shape::Polygon(p, _) => p.0.len() >= 2,
            Shape::Polyline(p, _) => p.0.len() >= 2,
            Shape::Path(d, _) => !d.is_empty(),
        }
    }

    /// Converts this shape's geometry to the equivalent canonical path
    /// data, per https://www.w3.org/TR/SVG11/shapes.html's per-element
    /// conversion notes. `Path` shapes return a clone of their own data.
    pub fn as_path(&self) -> PathData {
        match self {
            Shape::Rect(r, _) => rect_to_path(r),
            Shape::Circle(c, _) => ellipse_to_path(c.cx, c.cy, c.r, c.r),
            Shape::Ellipse(e, _) => ellipse_to_path(e.cx, e.cy, e.rx, e.ry),
            Shape::Line(l, _) => PathData(vec![
                Command::MoveTo { abs: true, x: l.x1, y: l.y1 },
                Command::LineTo { abs: true, x: l.x2, y: l.y2 },
            ]),
            Shape::Polygon(p, _) => {
                let mut d = points_to_path(p);
                d.0.push(Command::ClosePath { abs: true });
                d
            }
            Shape::Polyline(p, _) => points_to_path(p),
            Shape::Path(d, _) => d.clone(),
        }
    }
}

fn points_to_path(points: &Points) -> PathData {
    let mut cmds = Vec::with_capacity(points.0.len());
    for (i, &(x, y)) in points.0.iter().enumerate() {
        if i == 0 {
            cmds.push(Command::MoveTo { abs: true, x, y });
        } else {
            cmds.push(Command::LineTo { abs: true, x, y });
        }
    }
    PathData(cmds)
}

/// Four quarter-arcs around the rectangle's rounded corners, or a plain
/// four-sided closed path when `rx`/`ry` are both zero/absent. Negative
/// radii are invalid per spec and clamped to zero; a radius larger than
/// half the corresponding side is clamped to that half, matching
/// https://www.w3.org/TR/SVG11/shapes.html#RectElement.
fn rect_to_path(r: &Rect) -> PathData {
    let mut rx = r.rx.unwrap_or(0.0).max(0.0);
    let mut ry = r.ry.unwrap_or(0.0).max(0.0);
    if r.rx.is_none() && r.ry.is_some() {
        rx = ry;
    }
    if r.ry.is_none() && r.rx.is_some() {
        ry = rx;
    }
    rx = rx.min(r.width / 2.0);
    ry = ry.min(r.height / 2.0);

    let (x, y, w, h) = (r.x, r.y, r.width, r.height);

    if rx == 0.0 || ry == 0.0 {
        return PathData(vec![
            Command::MoveTo { abs: true, x, y },
            Command::HorizontalLineTo { abs: true, x: x + w },
            Command::VerticalLineTo { abs: true, y: y + h },
            Command::HorizontalLineTo { abs: true, x },
            Command::ClosePath { abs: true },
        ]);
    }

    PathData(vec![
        Command::MoveTo { abs: true, x: x + rx, y },
        Command::HorizontalLineTo { abs: true, x: x + w - rx },
        corner_arc(rx, ry, x + w, y + ry),
        Command::VerticalLineTo { abs: true, y: y + h - ry },
        corner_arc(rx, ry, x + w - rx, y + h),
        Command::HorizontalLineTo { abs: true, x: x + rx },
        corner_arc(rx, ry, x, y + h - ry),
        Command::VerticalLineTo { abs: true, y: y + ry },
        corner_arc(rx, ry, x + rx, y),
        Command::ClosePath { abs: true },
    ])
}

/// A quarter-turn arc around one rounded rect corner: always the minor
/// (non-large) arc, swept clockwise in SVG's y-down coordinate space.
fn corner_arc(rx: f64, ry: f64, x: f64, y: f64) -> Command {
    Command::EllipticalArc {
        abs: true,
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: false,
        sweep: true,
        x,
        y,
    }
}

/// Two half-turn arcs, closing the loop; shared by `<circle>` and
/// `<ellipse>` since a circle is just an ellipse with `rx == ry`. Each arc
/// sweeps exactly 180 degrees, the boundary case for the large-arc flag;
/// `large_arc=1, sweep=0` per https://www.w3.org/TR/SVG11/shapes.html.
fn ellipse_to_path(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
    let half_arc = |x: f64, y: f64| Command::EllipticalArc {
        abs: true,
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: true,
        sweep: false,
        x,
        y,
    };
    PathData(vec![
        Command::MoveTo { abs: true, x: cx - rx, y: cy },
        half_arc(cx + rx, cy),
        half_arc(cx - rx, cy),
        Command::ClosePath { abs: true },
    ])
}

fn parse_f64(el: &Node, name: &str, default: f64) -> f64 {
    el.attr(name).and_then(|s| s.parse::<f64>().ok()).unwrap_or(default)
}

fn parse_opt_f64(el: &Node, name: &str) -> Option<f64> {
    el.attr(name).and_then(|s| s.parse::<f64>().ok())
}

impl Style {
    /// Reads only the attributes this bag owns; unknown attributes are
    /// ignored here and remain on the element untouched.
    fn from_element(el: &Node) -> Style {
        let mut s = Style::default();
        s.id = el.attr("id");
        if let Some(v) = el.attr("fill") {
            s.fill = v;
        }
        if let Some(v) = parse_opt_f64(el, "fill-opacity") {
            s.fill_opacity = v;
        }
        if let Some(v) = el.attr("stroke") {
            s.stroke = v;
        }
        if let Some(v) = parse_opt_f64(el, "stroke-width") {
            s.stroke_width = v;
        }
        if let Some(v) = el.attr("stroke-linecap") {
            s.stroke_linecap = v;
        }
        if let Some(v) = el.attr("stroke-linejoin") {
            s.stroke_linejoin = v;
        }
        if let Some(v) = parse_opt_f64(el, "stroke-miterlimit") {
            s.stroke_miterlimit = v;
        }
        s.stroke_dasharray = el.attr("stroke-dasharray");
        if let Some(v) = parse_opt_f64(el, "stroke-opacity") {
            s.stroke_opacity = v;
        }
        if let Some(v) = parse_opt_f64(el, "opacity") {
            s.opacity = v;
        }
        s.clip_path = el.attr("clip-path");
        s.transform = el.attr("transform");
        s
    }

    /// Writes every attribute whose value differs from the field
    /// default, formatting numbers with the canonical decimal formatter.
    /// `fill` is the one exception: nano paths are the pipeline's final
    /// output and downstream consumers (the font-building step this
    /// feeds) must not have to apply SVG's own inheritance/initial-value
    /// rules, so it is always written explicitly.
    fn write_to(&self, data: &mut ElementData) {
        let default = Style::default();
        if let Some(id) = &self.id {
            data.set_attr("id", id.clone());
        }
        data.set_attr("fill", self.fill.clone());
        if self.fill_opacity != default.fill_opacity {
            data.set_attr("fill-opacity", crate::path::number::format_number(self.fill_opacity));
        }
        if self.stroke != default.stroke {
            data.set_attr("stroke", self.stroke.clone());
        }
        if self.stroke_width != default.stroke_width {
            data.set_attr("stroke-width", crate::path::number::format_number(self.stroke_width));
        }
        if self.stroke_linecap != default.stroke_linecap {
            data.set_attr("stroke-linecap", self.stroke_linecap.clone());
        }
        if self.stroke_linejoin != default.stroke_linejoin {
            data.set_attr("stroke-linejoin", self.stroke_linejoin.clone());
        }
        if self.stroke_miterlimit != default.stroke_miterlimit {
            data.set_attr(
                "stroke-miterlimit",
                crate::path::number::format_number(self.stroke_miterlimit),
            );
        }
        if let Some(dasharray) = &self.stroke_dasharray {
            data.set_attr("stroke-dasharray", dasharray.clone());
        }
        if self.stroke_opacity != default.stroke_opacity {
            data.set_attr("stroke-opacity", crate::path::number::format_number(self.stroke_opacity));
        }
        if self.opacity != default.opacity {
            data.set_attr("opacity", crate::path::number::format_number(self.opacity));
        }
        if let Some(clip_path) = &self.clip_path {
            data.set_attr("clip-path", clip_path.clone());
        }
        if let Some(transform) = &self.transform {
            data.set_attr("transform", transform.clone());
        }
    }
}

/// Reads an element whose local tag is one of the seven basic-shape
/// names into the equivalent `Shape`, or `None` if the tag isn't one of
/// them.
pub fn from_element(el: &Node) -> Option<Shape> {
    let style = Style::from_element(el);
    Some(match el.tag_name().as_str() {
        "rect" => Shape::Rect(
            Rect {
                x: parse_f64(el, "x", 0.0),
                y: parse_f64(el, "y", 0.0),
                width: parse_f64(el, "width", 0.0),
                height: parse_f64(el, "height", 0.0),
                rx: parse_opt_f64(el, "rx"),
                ry: parse_opt_f64(el, "ry"),
            },
            style,
        ),
        "circle" => Shape::Circle(
            Circle {
                cx: parse_f64(el, "cx", 0.0),
                cy: parse_f64(el, "cy", 0.0),
                r: parse_f64(el, "r", 0.0),
            },
            style,
        ),
        "ellipse" => Shape::Ellipse(
            Ellipse {
                cx: parse_f64(el, "cx", 0.0),
                cy: parse_f64(el, "cy", 0.0),
                rx: parse_f64(el, "rx", 0.0),
                ry: parse_f64(el, "ry", 0.0),
            },
            style,
        ),
        "line" => Shape::Line(
            Line {
                x1: parse_f64(el, "x1", 0.0),
                y1: parse_f64(el, "y1", 0.0),
                x2: parse_f64(el, "x2", 0.0),
                y2: parse_f64(el, "y2", 0.0),
            },
            style,
        ),
        "polygon" => Shape::Polygon(Points(parse_points(el)), style),
        "polyline" => Shape::Polyline(Points(parse_points(el)), style),
        "path" => {
            let d = el.attr("d").unwrap_or_default();
            let parsed = PathData::parse(&d);
            match parsed {
                Ok(p) => Shape::Path(p, style),
                Err(e) => {
                    log::warn!("skipping <path> with unparseable d=\"{}\": {}", d, e);
                    return None;
                }
            }
        }
        _ => return None,
    })
}

fn parse_points(el: &Node) -> Vec<(f64, f64)> {
    let raw = match el.attr("points") {
        Some(v) => v,
        None => return Vec::new(),
    };
    let nums: Vec<f64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();
    nums.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Creates a detached element of the tag corresponding to `shape`'s
/// variant, with every non-default attribute written.
pub fn to_element(shape: &Shape) -> ElementData {
    let mut data = ElementData::new(shape.tag_name());
    match shape {
        Shape::Rect(r, style) => {
            if r.x != 0.0 {
                data.set_attr("x", crate::path::number::format_number(r.x));
            }
            if r.y != 0.0 {
                data.set_attr("y", crate::path::number::format_number(r.y));
            }
            data.set_attr("width", crate::path::number::format_number(r.width));
            data.set_attr("height", crate::path::number::format_number(r.height));
            if let Some(rx) = r.rx {
                data.set_attr("rx", crate::path::number::format_number(rx));
            }
            if let Some(ry) = r.ry {
                data.set_attr("ry", crate::path::number::format_number(ry));
            }
            style.write_to(&mut data);
        }
        Shape::Circle(c, style) => {
            data.set_attr("cx", crate::path::number::format_number(c.cx));
            data.set_attr("cy", crate::path::number::format_number(c.cy));
            data.set_attr("r", crate::path::number::format_number(c.r));
            style.write_to(&mut data);
        }
        Shape::Ellipse(e, style) => {
            data.set_attr("cx", crate::path::number::format_number(e.cx));
            data.set_attr("cy", crate::path::number::format_number(e.cy));
            data.set_attr("rx", crate::path::number::format_number(e.rx));
            data.set_attr("ry", crate::path::number::format_number(e.ry));
            style.write_to(&mut data);
        }
        Shape::Line(l, style) => {
            data.set_attr("x1", crate::path::number::format_number(l.x1));
            data.set_attr("y1", crate::path::number::format_number(l.y1));
            data.set_attr("x2", crate::path::number::format_number(l.x2));
            data.set_attr("y2", crate::path::number::format_number(l.y2));
            style.write_to(&mut data);
        }
        Shape::Polygon(p, style) | Shape::Polyline(p, style) => {
            let points = p
                .0
                .iter()
                .map(|(x, y)| format!("{},{}", crate::path::number::format_number(*x), crate::path::number::format_number(*y)))
                .collect::<Vec<_>>()
                .join(" ");
            data.set_attr("points", points);
            style.write_to(&mut data);
        }
        Shape::Path(d, style) => {
            data.set_attr("d", d.emit());
            style.write_to(&mut data);
        }
    }
    data
}
