// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pass 3: bake inherited `clip-path` chains into the clipped shape's own
//! path data, then remove the now-redundant `<clipPath>` defs.
//!
//! https://www.w3.org/TR/SVG11/masking.html#EstablishingANewClippingPath

use std::fmt;

use crate::dom::query::{self, ResolveError};
use crate::dom::{Node, NodeExt};
use crate::path::PathData;
use crate::pathops::{self, BooleanOpError};
use crate::shape;

use super::ungroup::InheritError;
use super::use_resolve::{self, ResolutionError};

/// A failure resolving or combining a `clip-path` chain.
#[derive(Debug)]
pub enum ClipPathError {
    /// A `clip-path` url didn't resolve to exactly one `<clipPath>` element.
    Unresolved(ResolveError),
    Resolution(ResolutionError),
    Inherit(InheritError),
    BooleanOp(BooleanOpError),
    PathParse(crate::path::ParseError),
}

impl fmt::Display for ClipPathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClipPathError::Unresolved(e) => write!(f, "{}", e),
            ClipPathError::Resolution(e) => write!(f, "{}", e),
            ClipPathError::Inherit(e) => write!(f, "{}", e),
            ClipPathError::BooleanOp(e) => write!(f, "{}", e),
            ClipPathError::PathParse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClipPathError {}

impl From<ResolveError> for ClipPathError {
    fn from(e: ResolveError) -> Self {
        ClipPathError::Unresolved(e)
    }
}

impl From<ResolutionError> for ClipPathError {
    fn from(e: ResolutionError) -> Self {
        ClipPathError::Resolution(e)
    }
}

impl From<InheritError> for ClipPathError {
    fn from(e: InheritError) -> Self {
        ClipPathError::Inherit(e)
    }
}

impl From<BooleanOpError> for ClipPathError {
    fn from(e: BooleanOpError) -> Self {
        ClipPathError::BooleanOp(e)
    }
}

impl From<crate::path::ParseError> for ClipPathError {
    fn from(e: crate::path::ParseError) -> Self {
        ClipPathError::PathParse(e)
    }
}

/// Resolves a single `url(#id)` (or bare `#id`) reference to its
/// `<clipPath>` element, inlines any `<use>` inside it, flattens its
/// groups, and unions every shape it contains into one path.
///
/// `clip_url` is resolved against `scope`'s whole document, not just the
/// `scope` subtree, and per §4.4's `resolve_url(url, tag)` contract fails
/// if it doesn't name exactly one `<clipPath>`.
pub(crate) fn resolve_clip_path(scope: &Node, clip_url: &str) -> Result<PathData, ClipPathError> {
    let document_root = query::document_root(scope);
    let clip_el = query::resolve_url_unique(&document_root, clip_url, Some("clipPath"))?;

    use_resolve::resolve_use(&clip_el)?;
    super::ungroup::ungroup(&clip_el)?;

    let paths: Vec<PathData> = clip_el
        .children()
        .filter_map(|child| shape::from_element(&child))
        .map(|s| s.as_path().to_canonical())
        .collect();
    Ok(pathops::union(&paths)?)
}

/// Intersects a chain of already-resolved clip paths down to one
/// effective clip, or `None` if the chain is empty.
pub(crate) fn combine(clip_paths: Vec<PathData>) -> Result<Option<PathData>, ClipPathError> {
    if clip_paths.len() > 1 {
        Ok(Some(pathops::intersection(&clip_paths)?))
    } else {
        Ok(clip_paths.into_iter().next())
    }
}

/// Walks `node` and its ancestors collecting every `clip-path` reference,
/// resolving and intersecting them into the effective clip for `node`.
fn compute_clip_path(node: &Node) -> Result<Option<PathData>, ClipPathError> {
    let mut clip_paths = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(url) = n.attr("clip-path") {
            if !url.is_empty() {
                clip_paths.push(resolve_clip_path(node, &url)?);
            }
        }
        current = n.parent();
    }
    combine(clip_paths)
}

/// Applies every element's effective clip to its own path data, then
/// removes all `<clipPath>` elements and `clip-path` attributes.
pub fn apply_clip_paths(root: &Node) -> Result<(), ClipPathError> {
    let candidates: Vec<Node> = root.descendants().skip(1).collect();

    let mut rewrites = Vec::new();
    for node in &candidates {
        let clip = compute_clip_path(node)?;
        let clip = match clip {
            Some(c) => c,
            None => continue,
        };
        let Some(shape) = shape::from_element(node) else {
            log::warn!(
                "clip-path on <{}> has an effective clip but isn't a shape; skipping",
                node.tag_name()
            );
            continue;
        };
        let target = shape.as_path().to_canonical();
        let clipped = pathops::intersection(&[target, clip])?;
        rewrites.push((node.clone(), clipped));
    }

    for (node, clipped) in rewrites {
        node.set_attr("d", clipped.emit());
    }

    for clip_path_el in query::find_all(root, "clipPath") {
        clip_path_el.detach();
    }
    for node in root.descendants() {
        node.remove_attr("clip-path");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn clip_intersects_target_with_clip_shape() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <defs><clipPath id="c"><rect x="5" y="0" width="10" height="10"/></clipPath></defs>
                <rect x="0" y="0" width="10" height="10" clip-path="url(#c)"/>
            </svg>"#,
        )
        .unwrap();
        super::super::shapes_to_paths(&doc.root);
        apply_clip_paths(&doc.root).unwrap();
        assert!(query::find_all(&doc.root, "clipPath").is_empty());
        let rect = query::find_all(&doc.root, "path")
            .into_iter()
            .find(|n| n.attr("d").is_some())
            .unwrap();
        assert!(rect.attr("clip-path").is_none());
    }

    #[test]
    fn element_with_no_clip_path_is_left_untouched() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="1" height="1"/></svg>"#,
        )
        .unwrap();
        apply_clip_paths(&doc.root).unwrap();
        let rect = doc.root.children().next().unwrap();
        assert_eq!(rect.tag_name(), "rect");
    }
}
