// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A handful of simplified xpath-like queries over the element tree, in
//! place of a general xpath engine — the pipeline only ever needs "all
//! descendants with this tag" and "the one descendant with this id",
//! mirroring the small set of query shapes the original Python's
//! `_xpath`/`_xpath_one` were actually called with.

use super::{Node, NodeExt};

/// All descendants (not including `node` itself) with the given local
/// tag name, in document order.
pub fn find_all(node: &Node, tag: &str) -> Vec<Node> {
    node.descendants().skip(1).filter(|n| n.tag_name() == tag).collect()
}

/// The first descendant (not including `node` itself) with the given
/// local tag name, in document order.
pub fn find_first(node: &Node, tag: &str) -> Option<Node> {
    node.descendants().skip(1).find(|n| n.tag_name() == tag)
}

/// The chain of ancestors from `node`'s parent up to (and including) the
/// document root, nearest first.
pub fn ancestors(node: &Node) -> Vec<Node> {
    node.ancestors().skip(1).collect()
}

/// The topmost ancestor of `node` — `node` itself if it has no parent.
/// Pipeline passes that only ever receive a scope `Node` (not a whole
/// `Document`) use this to reach the true document root for id lookups
/// that must see the entire tree, not just the scope's own subtree.
pub fn document_root(node: &Node) -> Node {
    node.ancestors().last().unwrap_or_else(|| node.clone())
}

/// Resolves a `url(#id)` or bare `#id` reference to the element carrying
/// that `id`, searching every descendant of `root`. Tolerant: returns the
/// first match (if any) without regard for uniqueness — for call sites
/// that degrade gracefully on a missing reference (e.g. `ungroup`'s
/// best-effort cleanup of now-unreferenced `<clipPath>`s). Call sites
/// bound by the façade's `resolve_url(url, tag)` contract (§4.4 — "failing
/// if zero or multiple matches") should use `resolve_url_unique` instead.
pub fn resolve_url(root: &Node, reference: &str) -> Option<Node> {
    let id = extract_id(reference)?;
    root.descendants().find(|n| n.attr("id").as_deref() == Some(id))
}

/// A `resolve_url_unique` failure: the reference named no element, or
/// named more than one, of the required tag.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveError {
    NoMatch(String),
    MultipleMatches(String),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ResolveError::NoMatch(r) => write!(f, "no element found for reference \"{}\"", r),
            ResolveError::MultipleMatches(r) => {
                write!(f, "reference \"{}\" matched more than one element", r)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves `reference` to the *unique* descendant of `root` carrying that
/// id, optionally restricted to `tag`, per the façade's `resolve_url(url,
/// tag)` contract (§4.4): zero matches or more than one is an error, not a
/// silent `None`/first-match.
pub fn resolve_url_unique(root: &Node, reference: &str, tag: Option<&str>) -> Result<Node, ResolveError> {
    let id = extract_id(reference).ok_or_else(|| ResolveError::NoMatch(reference.to_string()))?;
    let mut matches = root
        .descendants()
        .filter(|n| n.attr("id").as_deref() == Some(id))
        .filter(|n| tag.map_or(true, |t| n.tag_name() == t));

    let first = matches.next().ok_or_else(|| ResolveError::NoMatch(reference.to_string()))?;
    if matches.next().is_some() {
        return Err(ResolveError::MultipleMatches(reference.to_string()));
    }
    Ok(first)
}

fn extract_id(reference: &str) -> Option<&str> {
    let id = reference
        .trim()
        .trim_start_matches("url(")
        .trim_end_matches(')')
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_start_matches('#');
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn find_all_collects_every_matching_descendant() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g><path d="M0,0"/></g><path d="M1,1"/></svg>"#,
        )
        .unwrap();
        assert_eq!(find_all(&doc.root, "path").len(), 2);
    }

    #[test]
    fn find_first_returns_none_when_absent() {
        let doc = Document::from_str(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
        assert!(find_first(&doc.root, "clipPath").is_none());
    }

    #[test]
    fn document_root_climbs_to_the_top_from_a_nested_scope() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><clipPath id="c"><rect/></clipPath></defs></svg>"#,
        )
        .unwrap();
        let clip_path = find_first(&doc.root, "clipPath").unwrap();
        assert_eq!(document_root(&clip_path).tag_name(), "svg");
    }

    #[test]
    fn resolve_url_unique_rejects_duplicate_ids() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect id="a"/><rect id="a"/></svg>"#,
        )
        .unwrap();
        assert!(matches!(
            resolve_url_unique(&doc.root, "#a", None),
            Err(ResolveError::MultipleMatches(_))
        ));
    }

    #[test]
    fn resolve_url_unique_rejects_wrong_tag() {
        let doc = Document::from_str(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect id="a"/></svg>"#).unwrap();
        assert!(matches!(
            resolve_url_unique(&doc.root, "#a", Some("circle")),
            Err(ResolveError::NoMatch(_))
        ));
    }
}
