// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`nanosvg` is an SVG canonicalization library: it turns arbitrary SVG 1.1
input into a restricted, canonical "nano" subset suitable as the drawing
input of a font-building / icon-vectorization pipeline.

The nano subset admits only a root `<svg>`, a single `<defs>` block
containing gradients, and a flat sequence of `<path>` elements — no
groups, no basic shapes, no `<use>`, no clip-paths, no strokes, no
transforms, no invisible shapes.

## Pipeline

[`Document::from_str`] parses SVG text into a mutable element tree.
[`to_nano`] runs the fixed-order canonicalization pipeline
([`pipeline::tonanosvg`]) and, on success, [`Document::to_string`]
serializes the result. The individual passes (`shapes_to_paths`,
`resolve_use`, `apply_clip_paths`, `ungroup`, `strokes_to_paths`,
`remove_unpainted_shapes`, `tidy_defs`) and the optional
`apply_transforms` pass are exposed under [`pipeline`] for callers that
need finer-grained control than the composed pipeline.

## Module map

- [`path`] — path-data model: parsing, shorthand expansion, absolute
  conversion, arc-to-cubic decomposition, the canonical emitter.
- [`transform`] — the 2D affine transform algebra and SVG transform-list
  parser.
- [`shape`] — the seven SVG primitive shapes and their conversion to and
  from `<path>` elements.
- [`dom`] — the SVG tree façade: the element arena, shape-materialization
  cache, and XML parse/serialize boundary.
- [`pipeline`] — the canonicalization passes.
- [`validate`] — the nano-schema validator.
- [`pathops`] — the boolean path-operations adapter (union, intersection,
  stroke-to-fill, bounds).

## Non-goals

Arbitrary SVG 2 features, CSS cascade, text elements, filters, masks
other than clip-path, animation, and rendering are all out of scope.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod dom;
pub mod path;
pub mod pathops;
pub mod pipeline;
pub mod shape;
pub mod transform;
pub mod validate;

pub use dom::{Document, Error as DomError};
pub use pipeline::{tonanosvg, PipelineError};
pub use shape::Shape;
pub use validate::NanoViolation;

use std::fmt;

/// The union of every failure mode this crate can raise, for callers
/// that want a single error type rather than matching on each pass's
/// own error enum.
#[derive(Debug)]
pub enum Error {
    /// The input could not be parsed as XML, or had no root `<svg>`.
    Parse(DomError),
    /// A canonicalization pass failed.
    Pipeline(PipelineError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<DomError> for Error {
    fn from(e: DomError) -> Self {
        Error::Parse(e)
    }
}

impl From<PipelineError> for Error {
    fn from(e: PipelineError) -> Self {
        Error::Pipeline(e)
    }
}

/// Parses `xml`, runs the full canonicalization pipeline, and serializes
/// the resulting nano document back to a string. The convenience
/// entry point most callers want; see [`pipeline::tonanosvg`] for the
/// lower-level, already-parsed form.
pub fn to_nano(xml: &str) -> Result<String, Error> {
    let doc = Document::from_str(xml)?;
    tonanosvg(&doc)?;
    Ok(doc.to_string())
}
