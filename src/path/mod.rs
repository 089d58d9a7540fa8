// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `<path>` `d` attribute: a tokenizer/parser, a canonical emitter, and
//! the normalization passes (`explicit_lines`, `expand_shorthand`,
//! `absolute`, arc-to-cubic) that reduce any path down to the subset C7
//! (the boolean path-ops adapter) and the nano writer can consume.

mod arc;
pub mod number;

use std::fmt;

use crate::transform::Transform;
use number::format_number;

/// A single path-data command, tagged by its SVG letter and carrying
/// exactly the arguments that letter's arity requires. `abs` is `true` for
/// the uppercase form, `false` for the lowercase (relative) form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    MoveTo {
        abs: bool,
        x: f64,
        y: f64,
    },
    LineTo {
        abs: bool,
        x: f64,
        y: f64,
    },
    HorizontalLineTo {
        abs: bool,
        x: f64,
    },
    VerticalLineTo {
        abs: bool,
        y: f64,
    },
    CurveTo {
        abs: bool,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    SmoothCurveTo {
        abs: bool,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Quadratic {
        abs: bool,
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    SmoothQuadratic {
        abs: bool,
        x: f64,
        y: f64,
    },
    EllipticalArc {
        abs: bool,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    ClosePath {
        abs: bool,
    },
}

impl Command {
    /// The single SVG letter for this command, respecting absolute/relative case.
    pub fn letter(&self) -> char {
        let (upper, abs) = match *self {
            Command::MoveTo { abs, .. } => ('M', abs),
            Command::LineTo { abs, .. } => ('L', abs),
            Command::HorizontalLineTo { abs, .. } => ('H', abs),
            Command::VerticalLineTo { abs, .. } => ('V', abs),
            Command::CurveTo { abs, .. } => ('C', abs),
            Command::SmoothCurveTo { abs, .. } => ('S', abs),
            Command::Quadratic { abs, .. } => ('Q', abs),
            Command::SmoothQuadratic { abs, .. } => ('T', abs),
            Command::EllipticalArc { abs, .. } => ('A', abs),
            Command::ClosePath { abs } => ('Z', abs),
        };
        if abs {
            upper
        } else {
            upper.to_ascii_lowercase()
        }
    }

    pub fn is_absolute(&self) -> bool {
        match *self {
            Command::MoveTo { abs, .. }
            | Command::LineTo { abs, .. }
            | Command::HorizontalLineTo { abs, .. }
            | Command::VerticalLineTo { abs, .. }
            | Command::CurveTo { abs, .. }
            | Command::SmoothCurveTo { abs, .. }
            | Command::Quadratic { abs, .. }
            | Command::SmoothQuadratic { abs, .. }
            | Command::EllipticalArc { abs, .. }
            | Command::ClosePath { abs } => abs,
        }
    }
}

/// A parse failure for path `d` data, carrying the byte offset of the
/// point at which parsing gave up.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub reason: String,
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "path parse error at offset {}: {}", self.offset, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// An ordered sequence of path commands: the in-memory form of a `d`
/// attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData(pub Vec<Command>);

impl PathData {
    pub fn new() -> Self {
        PathData(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.0
    }

    /// Parses an SVG path `d` string into a command sequence.
    pub fn parse(d: &str) -> Result<PathData, ParseError> {
        Tokenizer::new(d).tokenize()
    }

    /// Renders the command sequence back to canonical `d` text: one
    /// letter, space-separated canonical-formatted numbers, no
    /// superfluous whitespace.
    pub fn emit(&self) -> String {
        let mut out = String::new();
        for (i, cmd) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push(cmd.letter());
            for arg in command_args(cmd) {
                out.push(' ');
                out.push_str(&format_number(arg));
            }
        }
        out
    }

    /// True if this path data contains no lowercase (relative) commands.
    pub fn is_absolute(&self) -> bool {
        self.0.iter().all(|c| c.is_absolute())
    }

    /// True if this path data contains none of `H h V v S s T t`.
    pub fn is_explicit(&self) -> bool {
        !self.0.iter().any(|c| {
            matches!(
                c,
                Command::HorizontalLineTo { .. }
                    | Command::VerticalLineTo { .. }
                    | Command::SmoothCurveTo { .. }
                    | Command::SmoothQuadratic { .. }
            )
        })
    }

    /// True if this path data contains no `A`/`a` arcs.
    pub fn is_arc_free(&self) -> bool {
        !self.0.iter().any(|c| matches!(c, Command::EllipticalArc { .. }))
    }

    /// Replaces every `H`/`h`/`V`/`v` with the equivalent `L`/`l`,
    /// carrying forward the current point. Idempotent: running it again
    /// on output that is already explicit is a no-op.
    pub fn explicit_lines(&self) -> PathData {
        let mut out = Vec::with_capacity(self.0.len());
        let mut cur = (0.0, 0.0);
        for cmd in &self.0 {
            match *cmd {
                Command::HorizontalLineTo { abs, x } => {
                    let y = if abs { cur.1 } else { 0.0 };
                    out.push(Command::LineTo { abs, x, y });
                    cur = advance_point(cur, abs, x, y);
                }
                Command::VerticalLineTo { abs, y } => {
                    let x = if abs { cur.0 } else { 0.0 };
                    out.push(Command::LineTo { abs, x, y });
                    cur = advance_point(cur, abs, x, y);
                }
                other => {
                    cur = update_current_point(cur, &other);
                    out.push(other);
                }
            }
        }
        PathData(out)
    }

    /// Replaces `S`/`s` with `C`/`c` and `T`/`t` with `Q`/`q` by computing
    /// the implicit first control point: the reflection of the previous
    /// cubic/quadratic's last control point about the current point, or
    /// the current point itself if the previous command wasn't a
    /// same-family curve. Must run on data already converted via
    /// `explicit_lines`, and must run *before* `absolute`, because the
    /// reflection is computed in whatever coordinate space (absolute or
    /// relative-to-self) the command is already in — reflections are
    /// always taken relative to the current point, which this pass
    /// tracks for both cases.
    pub fn expand_shorthand(&self) -> PathData {
        let mut out = Vec::with_capacity(self.0.len());
        let mut cur = (0.0, 0.0);
        // last cubic/quadratic control point, in absolute coordinates, and
        // whether the previous command was of the reflectable family.
        let mut last_cubic_ctrl: Option<(f64, f64)> = None;
        let mut last_quad_ctrl: Option<(f64, f64)> = None;

        for cmd in &self.0 {
            match *cmd {
                Command::SmoothCurveTo { abs, x2, y2, x, y } => {
                    // `cur` is tracked in absolute coordinates regardless of
                    // this command's own case, so the reflection is always
                    // computed in absolute space and only converted back to
                    // relative at the end if this command is relative.
                    let reflect = reflect_point(cur, last_cubic_ctrl);
                    let (x1, y1) = if abs {
                        reflect
                    } else {
                        (reflect.0 - cur.0, reflect.1 - cur.1)
                    };
                    out.push(Command::CurveTo {
                        abs,
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    });
                    last_cubic_ctrl = Some(advance_point(cur, abs, x2, y2));
                    last_quad_ctrl = None;
                    cur = advance_point(cur, abs, x, y);
                }
                Command::SmoothQuadratic { abs, x, y } => {
                    let reflect = reflect_point(cur, last_quad_ctrl);
                    let (x1, y1) = if abs {
                        reflect
                    } else {
                        (reflect.0 - cur.0, reflect.1 - cur.1)
                    };
                    out.push(Command::Quadratic {
                        abs,
                        x1,
                        y1,
                        x,
                        y,
                    });
                    last_quad_ctrl = Some(advance_point(cur, abs, x1, y1));
                    last_cubic_ctrl = None;
                    cur = advance_point(cur, abs, x, y);
                }
                Command::CurveTo { x2, y2, abs, .. } => {
                    last_cubic_ctrl = Some(advance_point(cur, abs, x2, y2));
                    last_quad_ctrl = None;
                    cur = update_current_point(cur, cmd);
                    out.push(*cmd);
                }
                Command::Quadratic { x1, y1, abs, .. } => {
                    last_quad_ctrl = Some(advance_point(cur, abs, x1, y1));
                    last_cubic_ctrl = None;
                    cur = update_current_point(cur, cmd);
                    out.push(*cmd);
                }
                other => {
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                    cur = update_current_point(cur, &other);
                    out.push(other);
                }
            }
        }
        PathData(out)
    }

    /// Rewrites every relative command to its absolute form, tracking the
    /// current point and the subpath-start point (`Z`/`z` return to it).
    pub fn absolute(&self) -> PathData {
        let mut out = Vec::with_capacity(self.0.len());
        let mut cur = (0.0, 0.0);
        let mut subpath_start = (0.0, 0.0);

        for cmd in &self.0 {
            let abs_cmd = match *cmd {
                Command::MoveTo { abs, x, y } => {
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    subpath_start = (ax, ay);
                    cur = (ax, ay);
                    Command::MoveTo { abs: true, x: ax, y: ay }
                }
                Command::LineTo { abs, x, y } => {
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::LineTo { abs: true, x: ax, y: ay }
                }
                Command::HorizontalLineTo { abs, x } => {
                    let ax = if abs { x } else { cur.0 + x };
                    cur = (ax, cur.1);
                    Command::HorizontalLineTo { abs: true, x: ax }
                }
                Command::VerticalLineTo { abs, y } => {
                    let ay = if abs { y } else { cur.1 + y };
                    cur = (cur.0, ay);
                    Command::VerticalLineTo { abs: true, y: ay }
                }
                Command::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let (ax1, ay1) = to_abs(cur, abs, x1, y1);
                    let (ax2, ay2) = to_abs(cur, abs, x2, y2);
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::CurveTo {
                        abs: true,
                        x1: ax1,
                        y1: ay1,
                        x2: ax2,
                        y2: ay2,
                        x: ax,
                        y: ay,
                    }
                }
                Command::SmoothCurveTo { abs, x2, y2, x, y } => {
                    let (ax2, ay2) = to_abs(cur, abs, x2, y2);
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::SmoothCurveTo {
                        abs: true,
                        x2: ax2,
                        y2: ay2,
                        x: ax,
                        y: ay,
                    }
                }
                Command::Quadratic { abs, x1, y1, x, y } => {
                    let (ax1, ay1) = to_abs(cur, abs, x1, y1);
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::Quadratic {
                        abs: true,
                        x1: ax1,
                        y1: ay1,
                        x: ax,
                        y: ay,
                    }
                }
                Command::SmoothQuadratic { abs, x, y } => {
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::SmoothQuadratic { abs: true, x: ax, y: ay }
                }
                Command::EllipticalArc {
                    abs,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    let (ax, ay) = to_abs(cur, abs, x, y);
                    cur = (ax, ay);
                    Command::EllipticalArc {
                        abs: true,
                        rx,
                        ry,
                        x_axis_rotation,
                        large_arc,
                        sweep,
                        x: ax,
                        y: ay,
                    }
                }
                Command::ClosePath { .. } => {
                    cur = subpath_start;
                    Command::ClosePath { abs: true }
                }
            };
            out.push(abs_cmd);
        }
        PathData(out)
    }

    /// Decomposes every `A`/`a` into 1-4 cubic Béziers via the SVG 1.1
    /// Appendix F.6.5 endpoint-to-center parameterization, exact at
    /// segment endpoints. Requires the path to already be absolute
    /// (run `absolute()` first).
    pub fn to_arc_free(&self) -> PathData {
        let mut out = Vec::with_capacity(self.0.len());
        let mut cur = (0.0, 0.0);
        for cmd in &self.0 {
            match *cmd {
                Command::EllipticalArc {
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                    ..
                } => {
                    let cubics = arc::arc_to_cubics(cur, (rx, ry), x_axis_rotation, large_arc, sweep, (x, y));
                    if cubics.is_empty() && cur != (x, y) {
                        out.push(Command::LineTo { abs: true, x, y });
                    }
                    for (c1, c2, end) in cubics {
                        out.push(Command::CurveTo {
                            abs: true,
                            x1: c1.0,
                            y1: c1.1,
                            x2: c2.0,
                            y2: c2.1,
                            x: end.0,
                            y: end.1,
                        });
                    }
                    cur = (x, y);
                }
                other => {
                    cur = update_current_point(cur, &other);
                    out.push(other);
                }
            }
        }
        PathData(out)
    }

    /// Applies an affine to every coordinate. Requires absolute, arc-free
    /// input (`M`/`L`/`C`/`Q` map each point directly; `Z` is unchanged).
    pub fn transform(&self, t: &Transform) -> PathData {
        let map = |x: f64, y: f64| t.apply(x, y);
        let out = self
            .0
            .iter()
            .map(|cmd| match *cmd {
                Command::MoveTo { abs, x, y } => {
                    let (x, y) = map(x, y);
                    Command::MoveTo { abs, x, y }
                }
                Command::LineTo { abs, x, y } => {
                    let (x, y) = map(x, y);
                    Command::LineTo { abs, x, y }
                }
                Command::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let (x1, y1) = map(x1, y1);
                    let (x2, y2) = map(x2, y2);
                    let (x, y) = map(x, y);
                    Command::CurveTo {
                        abs,
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                Command::Quadratic { abs, x1, y1, x, y } => {
                    let (x1, y1) = map(x1, y1);
                    let (x, y) = map(x, y);
                    Command::Quadratic { abs, x1, y1, x, y }
                }
                other => other,
            })
            .collect();
        PathData(out)
    }

    /// Runs `explicit_lines` then `expand_shorthand` then `absolute` then
    /// `to_arc_free`, producing data safe to hand to the path-ops adapter
    /// (C7) or the nano writer: absolute, explicit, arc-free.
    pub fn to_canonical(&self) -> PathData {
        self.explicit_lines().expand_shorthand().absolute().to_arc_free()
    }
}

fn command_args(cmd: &Command) -> Vec<f64> {
    match *cmd {
        Command::MoveTo { x, y, .. } => vec![x, y],
        Command::LineTo { x, y, .. } => vec![x, y],
        Command::HorizontalLineTo { x, .. } => vec![x],
        Command::VerticalLineTo { y, .. } => vec![y],
        Command::CurveTo {
            x1, y1, x2, y2, x, y, ..
        } => vec![x1, y1, x2, y2, x, y],
        Command::SmoothCurveTo { x2, y2, x, y, .. } => vec![x2, y2, x, y],
        Command::Quadratic { x1, y1, x, y, .. } => vec![x1, y1, x, y],
        Command::SmoothQuadratic { x, y, .. } => vec![x, y],
        Command::EllipticalArc {
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
            ..
        } => vec![
            rx,
            ry,
            x_axis_rotation,
            if large_arc { 1.0 } else { 0.0 },
            if sweep { 1.0 } else { 0.0 },
            x,
            y,
        ],
        Command::ClosePath { .. } => vec![],
    }
}

fn to_abs(cur: (f64, f64), abs: bool, x: f64, y: f64) -> (f64, f64) {
    if abs {
        (x, y)
    } else {
        (cur.0 + x, cur.1 + y)
    }
}

fn advance_point(cur: (f64, f64), abs: bool, x: f64, y: f64) -> (f64, f64) {
    to_abs(cur, abs, x, y)
}

fn reflect_point(cur: (f64, f64), prev_ctrl: Option<(f64, f64)>) -> (f64, f64) {
    match prev_ctrl {
        Some((cx, cy)) => (2.0 * cur.0 - cx, 2.0 * cur.1 - cy),
        None => cur,
    }
}

/// Tracks the current point across an arbitrary (possibly relative)
/// command without otherwise transforming it; used by passes that only
/// need to know where the pen ends up, not rewrite coordinates.
fn update_current_point(cur: (f64, f64), cmd: &Command) -> (f64, f64) {
    match *cmd {
        Command::MoveTo { abs, x, y }
        | Command::LineTo { abs, x, y }
        | Command::SmoothQuadratic { abs, x, y } => to_abs(cur, abs, x, y),
        Command::HorizontalLineTo { abs, x } => {
            let ax = if abs { x } else { cur.0 + x };
            (ax, cur.1)
        }
        Command::VerticalLineTo { abs, y } => {
            let ay = if abs { y } else { cur.1 + y };
            (cur.0, ay)
        }
        Command::CurveTo { abs, x, y, .. } => to_abs(cur, abs, x, y),
        Command::SmoothCurveTo { abs, x, y, .. } => to_abs(cur, abs, x, y),
        Command::Quadratic { abs, x, y, .. } => to_abs(cur, abs, x, y),
        Command::EllipticalArc { abs, x, y, .. } => to_abs(cur, abs, x, y),
        Command::ClosePath { .. } => cur, // subpath-start tracking is the caller's job when it matters
    }
}

// -- Tokenizer -------------------------------------------------------------

struct Tokenizer<'a> {
    s: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Tokenizer {
            s: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn err(&self, reason: &str) -> ParseError {
        ParseError {
            reason: reason.to_string(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b == b',' || (b as char).is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_whitespace_only(&mut self) {
        while let Some(b) = self.peek() {
            if (b as char).is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_separators();
        let start = self.pos;
        if self.peek() == Some(b'+') || self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let mut seen_digit = false;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                seen_digit = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    seen_digit = true;
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        if !seen_digit {
            return Err(self.err("expected a number"));
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let mut exp_digit = false;
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    exp_digit = true;
                    self.pos += 1;
                } else {
                    break;
                }
            }
            if !exp_digit {
                self.pos = save;
            }
        }
        self.text[start..self.pos]
            .parse::<f64>()
            .map_err(|_| self.err("malformed number"))
    }

    /// Parses a single `0`/`1` arc flag, which (per the SVG grammar) may
    /// abut the next token with no separating whitespace.
    fn parse_flag(&mut self) -> Result<bool, ParseError> {
        self.skip_separators();
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(self.err("expected a flag (0 or 1)")),
        }
    }

    fn peek_is_number_start(&mut self) -> bool {
        let save = self.pos;
        self.skip_separators();
        let looks_like_number = matches!(self.peek(), Some(b'+') | Some(b'-') | Some(b'.'))
            || self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false);
        self.pos = save;
        looks_like_number
    }

    fn tokenize(mut self) -> Result<PathData, ParseError> {
        let mut cmds = Vec::new();
        let mut prev_letter: Option<u8> = None;

        loop {
            self.skip_whitespace_only();
            if self.at_end() {
                break;
            }

            let b = self.peek().unwrap();
            let letter = if b.is_ascii_alphabetic() {
                self.pos += 1;
                b
            } else if let Some(prev) = prev_letter {
                // implicit repetition: after M/m the implicit command is L/l.
                match prev {
                    b'M' => b'L',
                    b'm' => b'l',
                    other => other,
                }
            } else {
                return Err(self.err("path data must start with a moveto command"));
            };

            let upper = letter.to_ascii_uppercase();
            let abs = letter.is_ascii_uppercase();

            match upper {
                b'Z' => {
                    cmds.push(Command::ClosePath { abs });
                    prev_letter = Some(letter);
                    continue;
                }
                _ => {}
            }

            // Consume as many argument groups as are available for repeatable commands.
            loop {
                match upper {
                    b'M' => {
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::MoveTo { abs, x, y });
                    }
                    b'L' => {
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::LineTo { abs, x, y });
                    }
                    b'H' => {
                        let x = self.parse_number()?;
                        cmds.push(Command::HorizontalLineTo { abs, x });
                    }
                    b'V' => {
                        let y = self.parse_number()?;
                        cmds.push(Command::VerticalLineTo { abs, y });
                    }
                    b'C' => {
                        let x1 = self.parse_number()?;
                        let y1 = self.parse_number()?;
                        let x2 = self.parse_number()?;
                        let y2 = self.parse_number()?;
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::CurveTo {
                            abs,
                            x1,
                            y1,
                            x2,
                            y2,
                            x,
                            y,
                        });
                    }
                    b'S' => {
                        let x2 = self.parse_number()?;
                        let y2 = self.parse_number()?;
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::SmoothCurveTo { abs, x2, y2, x, y });
                    }
                    b'Q' => {
                        let x1 = self.parse_number()?;
                        let y1 = self.parse_number()?;
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::Quadratic { abs, x1, y1, x, y });
                    }
                    b'T' => {
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::SmoothQuadratic { abs, x, y });
                    }
                    b'A' => {
                        let rx = self.parse_number()?;
                        let ry = self.parse_number()?;
                        let x_axis_rotation = self.parse_number()?;
                        let large_arc = self.parse_flag()?;
                        let sweep = self.parse_flag()?;
                        let x = self.parse_number()?;
                        let y = self.parse_number()?;
                        cmds.push(Command::EllipticalArc {
                            abs,
                            rx,
                            ry,
                            x_axis_rotation,
                            large_arc,
                            sweep,
                            x,
                            y,
                        });
                    }
                    _ => return Err(self.err("unknown path command")),
                }

                // After the first M/m in a group, further coordinate pairs
                // are implicit LineTo, so break out and let the outer loop
                // re-derive the implicit command.
                if upper == b'M' {
                    prev_letter = Some(letter);
                    break;
                }

                if !self.peek_is_number_start() {
                    break;
                }
            }

            prev_letter = Some(letter);
        }

        Ok(PathData(cmds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_absolute_commands() {
        let d = "M 0 0 L 10 0 L 10 10 Z";
        let p = PathData::parse(d).unwrap();
        let p2 = PathData::parse(&p.emit()).unwrap();
        assert_eq!(p, p2);
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let p = PathData::parse("M 10 20 30 40 50 60").unwrap();
        assert_eq!(p.0.len(), 3);
        assert!(matches!(p.0[1], Command::LineTo { abs: true, x: 30.0, y: 40.0 }));
        assert!(matches!(p.0[2], Command::LineTo { abs: true, x: 50.0, y: 60.0 }));
    }

    #[test]
    fn explicit_lines_is_idempotent() {
        let p = PathData::parse("M0,0 H10 V5 H0 Z").unwrap();
        let once = p.explicit_lines();
        let twice = once.explicit_lines();
        assert_eq!(once, twice);
        assert!(once.is_explicit());
    }

    #[test]
    fn absolute_is_idempotent() {
        let p = PathData::parse("m0,0 l10,0 l0,10 z").unwrap();
        let once = p.absolute();
        let twice = once.absolute();
        assert_eq!(once, twice);
        assert!(once.is_absolute());
    }

    #[test]
    fn arc_flags_without_separators() {
        // classic case: flags abut the following coordinate with no space.
        let p = PathData::parse("M0 0A5 5 0 1110 0").unwrap();
        match p.0[1] {
            Command::EllipticalArc {
                large_arc,
                sweep,
                x,
                y,
                ..
            } => {
                assert!(large_arc);
                assert!(sweep);
                assert_eq!(x, 10.0);
                assert_eq!(y, 0.0);
            }
            _ => panic!("expected arc"),
        }
    }

    #[test]
    fn expand_shorthand_reflects_previous_control() {
        let p = PathData::parse("M0,0 C10,10 20,0 30,0 S40,20 50,0").unwrap();
        let expanded = p.expand_shorthand();
        match expanded.0[2] {
            Command::CurveTo { x1, y1, .. } => {
                // reflection of (20,0) about (30,0) is (40,0)
                assert_eq!(x1, 40.0);
                assert_eq!(y1, 0.0);
            }
            other => panic!("expected curveto, got {:?}", other),
        }
    }
}
