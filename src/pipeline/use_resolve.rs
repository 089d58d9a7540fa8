// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pass 2: instantiate `<use>` references.
//!
//! https://www.w3.org/TR/SVG11/struct.html#UseElement

use std::fmt;

use crate::dom::query::{self, ResolveError};
use crate::dom::{ElementData, Node, NodeExt};

/// Attributes a `<use>` carries that describe the reference itself, not
/// the thing being referenced, and so are never copied onto the
/// wrapping group.
const ATTRS_NOT_COPIED: &[&str] = &["x", "y", "width", "height", "xlink:href"];

/// A failure resolving a `<use>` element.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolutionError {
    /// The `<use>` had no `xlink:href`, or one that wasn't a `#fragment`.
    NonFragmentReference(String),
    /// `xlink:href` didn't resolve to exactly one element anywhere in the
    /// document (no tag restriction — a `<use>` may reference any element).
    Resolve(ResolveError),
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolutionError::NonFragmentReference(href) => {
                write!(f, "only use of #fragment references is supported, got \"{}\"", href)
            }
            ResolutionError::Resolve(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolutionError {}

impl From<ResolveError> for ResolutionError {
    fn from(e: ResolveError) -> Self {
        ResolutionError::Resolve(e)
    }
}

/// Replaces every `<use>` under `scope` with a deep copy of its referent,
/// wrapped in a `<g>` carrying `x`/`y` as a `translate(...)` and any other
/// inheritable attribute the `<use>` carried, if there's anything to
/// carry; otherwise the copy itself takes the `<use>`'s place.
///
/// `xlink:href` ids are resolved against `scope`'s whole document, not
/// just the `scope` subtree — an id defined anywhere is reachable.
pub fn resolve_use(scope: &Node) -> Result<(), ResolutionError> {
    let uses = query::find_all(scope, "use");
    let document_root = query::document_root(scope);

    for use_el in uses {
        let href = use_el.attr("xlink:href").unwrap_or_default();
        if !href.starts_with('#') {
            return Err(ResolutionError::NonFragmentReference(href));
        }
        let target = query::resolve_url_unique(&document_root, &href, None)?;
        let copy = target.deep_copy();

        let group = Node::new(ElementData::new("g"));
        let use_x = use_el.attr("x").unwrap_or_else(|| "0".to_string());
        let use_y = use_el.attr("y").unwrap_or_else(|| "0".to_string());
        if use_x != "0" || use_y != "0" {
            let existing = group.attr("transform").unwrap_or_default();
            let combined = format!("{} translate({}, {})", existing, use_x, use_y);
            group.set_attr("transform", combined.trim().to_string());
        }

        for (name, value) in use_el.borrow().attrs() {
            if ATTRS_NOT_COPIED.contains(&name.as_str()) {
                continue;
            }
            group.set_attr(name, value.clone());
        }

        let replacement = if group.borrow().attrs().is_empty() {
            copy
        } else {
            group.append(copy);
            group
        };

        use_el.insert_before(replacement);
        use_el.detach();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn resolve_use_without_offset_swaps_in_a_bare_copy() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs><rect id="r" width="1" height="1"/></defs><use xlink:href="#r"/></svg>"#,
        )
        .unwrap();
        resolve_use(&doc.root).unwrap();
        let uses = query::find_all(&doc.root, "use");
        assert!(uses.is_empty());
        let rects = query::find_all(&doc.root, "rect");
        assert_eq!(rects.len(), 2); // original under defs + the instantiated copy
    }

    #[test]
    fn resolve_use_with_offset_wraps_in_a_translating_group() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs><rect id="r" width="1" height="1"/></defs><use xlink:href="#r" x="3" y="4"/></svg>"#,
        )
        .unwrap();
        resolve_use(&doc.root).unwrap();
        let groups = query::find_all(&doc.root, "g");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].attr("transform").as_deref(), Some("translate(3, 4)"));
    }

    #[test]
    fn non_fragment_href_is_an_error() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="http://example.com/a.svg#r"/></svg>"#,
        )
        .unwrap();
        assert!(resolve_use(&doc.root).is_err());
    }
}
