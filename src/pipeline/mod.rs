// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The canonicalization pipeline: a fixed-order sequence of tree
//! rewrites reducing arbitrary SVG down to the nano subset, plus the
//! separate optional `apply_transforms` pass.
//!
//! Every pass here mutates its document in place; `tonanosvg` composes
//! them in a fixed order. A caller wanting the
//! functional (non-mutating) form deep-copies the root first — the
//! façade's `Node::deep_copy` makes that a one-line wrapper, so no
//! separate functional variant is implemented per pass.

mod clip_paths;
mod strokes;
mod ungroup;
mod use_resolve;

pub use clip_paths::apply_clip_paths;
pub use strokes::strokes_to_paths;
pub use ungroup::ungroup;
pub use use_resolve::resolve_use;

use std::fmt;

use crate::dom::{query, Document, ElementData, Node, NodeExt};
use crate::shape::{self, Shape};
use crate::validate::{self, NanoViolation};

const SHAPE_TAGS: &[&str] = &["rect", "circle", "ellipse", "line", "polygon", "polyline"];
const GRADIENT_TAGS: &[&str] = &["linearGradient", "radialGradient"];

/// Any failure raised by a canonicalization pass.
#[derive(Debug)]
pub enum PipelineError {
    Resolution(use_resolve::ResolutionError),
    Inherit(ungroup::InheritError),
    BooleanOp(crate::pathops::BooleanOpError),
    PathParse(crate::path::ParseError),
    Invalid(Vec<NanoViolation>),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Resolution(e) => write!(f, "{}", e),
            PipelineError::Inherit(e) => write!(f, "{}", e),
            PipelineError::BooleanOp(e) => write!(f, "{}", e),
            PipelineError::PathParse(e) => write!(f, "{}", e),
            PipelineError::Invalid(violations) => {
                write!(f, "{} nano-validity violation(s)", violations.len())
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<use_resolve::ResolutionError> for PipelineError {
    fn from(e: use_resolve::ResolutionError) -> Self {
        PipelineError::Resolution(e)
    }
}

impl From<ungroup::InheritError> for PipelineError {
    fn from(e: ungroup::InheritError) -> Self {
        PipelineError::Inherit(e)
    }
}

impl From<crate::pathops::BooleanOpError> for PipelineError {
    fn from(e: crate::pathops::BooleanOpError) -> Self {
        PipelineError::BooleanOp(e)
    }
}

impl From<crate::path::ParseError> for PipelineError {
    fn from(e: crate::path::ParseError) -> Self {
        PipelineError::PathParse(e)
    }
}

/// Runs the full canonicalization pipeline in its fixed order, raising
/// on the first failing pass. On success the document's root is a
/// valid nano document.
pub fn tonanosvg(doc: &Document) -> Result<(), PipelineError> {
    shapes_to_paths(&doc.root);
    doc.mark_dirty();
    resolve_use(&doc.root)?;
    doc.mark_dirty();
    apply_clip_paths(&doc.root)?;
    doc.mark_dirty();
    ungroup(&doc.root)?;
    doc.mark_dirty();
    strokes_to_paths(&doc.root);
    doc.mark_dirty();
    remove_unpainted_shapes(&doc.root);
    doc.mark_dirty();
    tidy_defs(&doc.root);
    doc.mark_dirty();

    let violations = validate::checknanosvg(&doc.root);
    if !violations.is_empty() {
        return Err(PipelineError::Invalid(violations));
    }
    Ok(())
}

/// Pass 1: replace every basic-shape primitive with its `as_path()`
/// equivalent, keeping its style bag and position in the tree.
pub fn shapes_to_paths(root: &Node) {
    for tag in SHAPE_TAGS {
        for node in query::find_all(root, tag) {
            if let Some(s) = shape::from_element(&node) {
                let as_path = Shape::Path(s.as_path(), s.style().clone());
                node.replace_data(shape::to_element(&as_path));
            }
        }
    }
}

/// Pass 6: drop any shape whose `visible()` is false.
pub fn remove_unpainted_shapes(root: &Node) {
    let mut tags: Vec<&str> = SHAPE_TAGS.to_vec();
    tags.push("path");
    for tag in tags {
        for node in query::find_all(root, tag) {
            if let Some(s) = shape::from_element(&node) {
                if !s.visible() {
                    node.detach();
                }
            }
        }
    }
}

/// Pass 7: collect every gradient def anywhere in the tree into a single
/// fresh `<defs>` inserted as the root's first child, and drop every
/// other `<defs>` element (and the empty husk left behind once its
/// gradients have been moved out).
///
/// The `<defs>` is inserted unconditionally, even when no gradients were
/// found and it ends up empty: this guarantees every `<path>` sibling
/// sits at index 1 or later, which is exactly what the nano validator's
/// "index 0 is reserved" rule depends on.
pub fn tidy_defs(root: &Node) {
    let mut gradients = Vec::new();
    for tag in GRADIENT_TAGS {
        gradients.extend(query::find_all(root, tag));
    }
    for g in &gradients {
        g.detach();
    }
    for old_defs in query::find_all(root, "defs") {
        old_defs.detach();
    }

    let new_defs = Node::new(ElementData::new("defs"));
    for g in gradients {
        new_defs.append(g);
    }
    match root.first_child() {
        Some(first) => first.insert_before(new_defs),
        None => root.append(new_defs),
    }
}

/// Multiplies every `transform` attribute from a shape up through its
/// ancestors (child transform outermost — i.e. applied last), bakes the
/// composite into the shape's path coordinates, then strips every
/// `transform` attribute in the tree. Separate from `tonanosvg` and
/// optional: callers that want to keep `transform` attributes (e.g.
/// for further editing) skip this pass.
///
/// Operates on every basic-shape primitive, not just `<path>` elements:
/// a transform can only be baked into path coordinates, so
/// each shape is first converted via `as_path()` the same way
/// `shapes_to_paths` would, and the result replaces the original
/// element. Calling this before `tonanosvg` (as most callers will, to
/// apply transforms that would otherwise be lost once `ungroup` strips
/// the `<g>`s that carried them) therefore leaves `shapes_to_paths` with
/// nothing left to do for any node this pass touched.
pub fn apply_transforms(root: &Node) -> Result<(), crate::path::ParseError> {
    let mut tags: Vec<&str> = SHAPE_TAGS.to_vec();
    tags.push("path");

    let nodes: Vec<Node> = tags.iter().flat_map(|tag| query::find_all(root, tag)).collect();
    for node in nodes {
        let composite = accumulated_transform(&node)?;
        if let Some(s) = shape::from_element(&node) {
            let canonical = s.as_path().to_canonical();
            let transformed = canonical.transform(&composite);
            let as_path = Shape::Path(transformed, s.style().clone());
            node.replace_data(shape::to_element(&as_path));
        }
    }
    for node in root.descendants() {
        node.remove_attr("transform");
    }
    Ok(())
}

fn accumulated_transform(node: &Node) -> Result<crate::transform::Transform, crate::path::ParseError> {
    use crate::transform::Transform;
    let mut chain = vec![node.clone()];
    chain.extend(node.ancestors().skip(1));

    // child transform outermost: fold from `node` up to the root, so the
    // node's own transform is concatenated first/innermost and each
    // ancestor further out composes on top of it last/outermost.
    let mut composite = Transform::identity();
    for n in chain.iter() {
        if let Some(raw) = n.attr("transform") {
            let t = crate::transform::Transform::from_str(&raw).map_err(|e| crate::path::ParseError {
                reason: e.reason,
                offset: 0,
            })?;
            composite = composite.concat(t);
        }
    }
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn shapes_to_paths_converts_rect_in_place() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="10" height="5"/></svg>"#,
        )
        .unwrap();
        shapes_to_paths(&doc.root);
        let child = doc.root.children().next().unwrap();
        assert_eq!(child.tag_name(), "path");
        assert_eq!(child.attr("d").as_deref(), Some("M 0 0 H 10 V 5 H 0 Z"));
    }

    #[test]
    fn remove_unpainted_shapes_drops_invisible_rect() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="10" height="5" fill="none"/></svg>"#,
        )
        .unwrap();
        remove_unpainted_shapes(&doc.root);
        assert!(doc.root.children().next().is_none());
    }

    #[test]
    fn tidy_defs_inserts_empty_defs_even_with_no_gradients() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0"/></svg>"#,
        )
        .unwrap();
        tidy_defs(&doc.root);
        let mut children = doc.root.children();
        let first = children.next().unwrap();
        assert_eq!(first.tag_name(), "defs");
        assert!(first.children().next().is_none());
        let second = children.next().unwrap();
        assert_eq!(second.tag_name(), "path");
        assert_eq!(second.indexed_xpath(), "/svg[0]/path[1]");
    }

    #[test]
    fn apply_transforms_bakes_a_groups_transform_into_a_basic_shape() {
        // A rect is still a <rect>, not a <path>, when apply_transforms
        // runs here — it must convert it the same way shapes_to_paths
        // would, not skip it for not already being a <path>.
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g transform="translate(5,5) scale(2)"><rect width="1" height="1"/></g></svg>"#,
        )
        .unwrap();
        apply_transforms(&doc.root).unwrap();
        let g = doc.root.children().next().unwrap();
        assert_eq!(g.attr("transform"), None);
        let rect = g.children().next().unwrap();
        assert_eq!(rect.tag_name(), "path");
        assert_eq!(rect.attr("d").as_deref(), Some("M 5 5 H 7 V 7 H 5 Z"));
    }

    #[test]
    fn tidy_defs_collects_gradients_from_everywhere() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><linearGradient id="a"><stop offset="0"/></linearGradient></defs><defs><radialGradient id="b"/></defs><path d="M0,0"/></svg>"#,
        )
        .unwrap();
        tidy_defs(&doc.root);
        let mut children = doc.root.children();
        let defs = children.next().unwrap();
        assert_eq!(defs.tag_name(), "defs");
        assert_eq!(defs.children().count(), 2);
        assert_eq!(children.count(), 1);
    }
}
