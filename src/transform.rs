// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A 2D affine transform algebra and a parser for the SVG `transform`
//! attribute grammar.
//!
//! https://www.w3.org/TR/SVG11/coords.html#TransformAttribute

use std::fmt;

/// A parse failure for the `transform` attribute grammar.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    /// What went wrong.
    pub reason: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to parse transform: {}", self.reason)
    }
}

impl std::error::Error for ParseError {}

/// A 2D affine transform, row-major as `[[a,c,e],[b,d,f],[0,0,1]]`.
///
/// Dumped as a tuple the fields read `(a, b, c, d, e, f)`:
///
/// ```text
/// a   c   e
/// b   d   f
/// 0   0   1
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transform.
    #[inline]
    pub fn identity() -> Self {
        Transform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// A general matrix transform.
    #[inline]
    pub fn matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// A translation transform.
    pub fn translate(tx: f64, ty: f64) -> Self {
        Transform::matrix(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A scale transform. `sy` defaults to `sx` when omitted by the caller.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform::matrix(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation transform, `a` in radians, about an optional center.
    pub fn rotate(a: f64, cx: f64, cy: f64) -> Self {
        Transform::translate(cx, cy)
            .concat(Transform::matrix(a.cos(), a.sin(), -a.sin(), a.cos(), 0.0, 0.0))
            .concat(Transform::translate(-cx, -cy))
    }

    /// A skew-along-x transform, `a` in radians.
    pub fn skew_x(a: f64) -> Self {
        Transform::matrix(1.0, 0.0, a.tan(), 1.0, 0.0, 0.0)
    }

    /// A skew-along-y transform, `a` in radians.
    pub fn skew_y(a: f64) -> Self {
        Transform::matrix(1.0, a.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Composes `self` with `other`: applying `self.concat(other)` to a
    /// point is equivalent to applying `other` first, then `self`.
    ///
    /// `identity.concat(t) == t == t.concat(identity)`.
    pub fn concat(&self, other: Transform) -> Transform {
        let (a, b, c, d, e, f) = (other.a, other.b, other.c, other.d, other.e, other.f);
        Transform {
            a: a * self.a + b * self.c,
            b: a * self.b + b * self.d,
            c: c * self.a + d * self.c,
            d: c * self.b + d * self.d,
            e: self.a * e + self.c * f + self.e,
            f: self.b * e + self.d * f + self.f,
        }
    }

    /// Applies this transform to a point.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Approximate equality, tolerant of floating-point composition error.
    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        (self.a - other.a).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.c - other.c).abs() < epsilon
            && (self.d - other.d).abs() < epsilon
            && (self.e - other.e).abs() < epsilon
            && (self.f - other.f).abs() < epsilon
    }

    /// Parses an SVG `transform` attribute value: one or more of
    /// `matrix|translate|scale|rotate|skewX|skewY (args)`, separated by
    /// whitespace/commas, composed left to right. Angle arguments to
    /// `rotate`/`skewX`/`skewY` are in degrees in the input and are
    /// converted to radians before being applied.
    pub fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut transform = Transform::identity();
        for chunk in split_transform_list(s) {
            let (name, args) = parse_one(chunk)?;
            transform = apply_named(transform, &name, &args)?;
        }
        Ok(transform)
    }
}

/// Splits `"translate(1,2) rotate(3)"`-style lists on the boundary between
/// a closing paren and the next function name, tolerating both comma and
/// whitespace separators.
fn split_transform_list(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let bytes = s.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    parts.push(s[start..=i].trim());
                    // skip separators (commas/whitespace) up to the next token
                    let mut j = i + 1;
                    while j < bytes.len() && (bytes[j] == b',' || (bytes[j] as char).is_whitespace()) {
                        j += 1;
                    }
                    start = j;
                    i = j;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn parse_one(chunk: &str) -> Result<(String, Vec<f64>), ParseError> {
    let open = chunk.find('(').ok_or_else(|| ParseError {
        reason: format!("expected '(' in '{}'", chunk),
    })?;
    if !chunk.ends_with(')') {
        return Err(ParseError {
            reason: format!("expected ')' in '{}'", chunk),
        });
    }
    let name = chunk[..open].trim().to_ascii_lowercase();
    let inner = &chunk[open + 1..chunk.len() - 1];
    let args = split_args(inner)
        .iter()
        .map(|a| {
            a.parse::<f64>().map_err(|_| ParseError {
                reason: format!("bad number '{}' in '{}'", a, chunk),
            })
        })
        .collect::<Result<Vec<f64>, ParseError>>()?;
    Ok((name, args))
}

fn split_args(s: &str) -> Vec<&str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect()
}

fn apply_named(t: Transform, name: &str, args: &[f64]) -> Result<Transform, ParseError> {
    let bad_arity = || ParseError {
        reason: format!("'{}' got {} argument(s)", name, args.len()),
    };

    Ok(match name {
        "matrix" => {
            if args.len() != 6 {
                return Err(bad_arity());
            }
            t.concat(Transform::matrix(
                args[0], args[1], args[2], args[3], args[4], args[5],
            ))
        }
        "translate" => match args.len() {
            1 => t.concat(Transform::translate(args[0], 0.0)),
            2 => t.concat(Transform::translate(args[0], args[1])),
            _ => return Err(bad_arity()),
        },
        "scale" => match args.len() {
            1 => t.concat(Transform::scale(args[0], args[0])),
            2 => t.concat(Transform::scale(args[0], args[1])),
            _ => return Err(bad_arity()),
        },
        "rotate" => match args.len() {
            1 => t.concat(Transform::rotate(args[0].to_radians(), 0.0, 0.0)),
            3 => t.concat(Transform::rotate(args[0].to_radians(), args[1], args[2])),
            _ => return Err(bad_arity()),
        },
        "skewx" => {
            if args.len() != 1 {
                return Err(bad_arity());
            }
            t.concat(Transform::skew_x(args[0].to_radians()))
        }
        "skewy" => {
            if args.len() != 1 {
                return Err(bad_arity());
            }
            t.concat(Transform::skew_y(args[0].to_radians()))
        }
        _ => {
            return Err(ParseError {
                reason: format!("unknown transform op '{}'", name),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let t = Transform::matrix(2.0, 0.0, 0.0, 3.0, 5.0, 7.0);
        assert_eq!(Transform::identity().concat(t), t);
        assert_eq!(t.concat(Transform::identity()), t);
    }

    #[test]
    fn rotate_45_preserves_length() {
        let t = Transform::from_str("rotate(45)").unwrap();
        let (x, y) = t.apply(1.0, 0.0);
        let len = (x * x + y * y).sqrt();
        assert!((len - 1.0).abs() < 1e-9);
        // rotating (1,0) by 45 degrees: norm of the resulting vector times sqrt(2)
        // lands on (sqrt(2)/2, sqrt(2)/2) * sqrt(2) == (1,1)
        assert!(((x + y) - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn scale_inverse_is_identity() {
        let t = Transform::scale(2.0, 2.0).concat(Transform::scale(0.5, 0.5));
        assert!(t.approx_eq(&Transform::identity(), 1e-12));
    }

    #[test]
    fn parses_chained_transform_list() {
        let t = Transform::from_str("translate(5,5) scale(2)").unwrap();
        let (x, y) = t.apply(1.0, 1.0);
        assert!((x - 7.0).abs() < 1e-9);
        assert!((y - 7.0).abs() < 1e-9);
    }

    #[test]
    fn skew_uses_degrees() {
        let t = Transform::from_str("skewX(45)").unwrap();
        let (x, _y) = t.apply(0.0, 1.0);
        assert!((x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(Transform::from_str("frobnicate(1)").is_err());
    }

    #[test]
    fn rejects_bad_arity() {
        assert!(Transform::from_str("translate(1,2,3)").is_err());
    }
}
