// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The nano-subset validator: an indexed-xpath whitelist walk over the
//! document, producing a violation for every element that doesn't match
//! one of the handful of shapes the nano schema admits.

use crate::dom::{Node, NodeExt};

/// One element that doesn't belong in a valid nano document.
#[derive(Clone, Debug, PartialEq)]
pub struct NanoViolation {
    pub xpath: String,
    pub reason: String,
}

impl std::fmt::Display for NanoViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.xpath, self.reason)
    }
}

impl std::error::Error for NanoViolation {}

/// Walks the document from `root`, returning every violation of the
/// nano schema:
///
/// ```text
/// /svg[0]
/// /svg[0]/defs[0]
/// /svg[0]/defs[0]/(linear|radial)Gradient[i]
/// /svg[0]/defs[0]/(linear|radial)Gradient[i]/stop[j]
/// /svg[0]/path[i]            (i >= 1)
/// ```
///
/// An empty result means the document is valid nano.
pub fn checknanosvg(root: &Node) -> Vec<NanoViolation> {
    let mut violations = Vec::new();
    walk(root, 0, true, &mut violations);
    violations
}

/// `depth` and `is_root` let us apply a different whitelist at each
/// tree level without re-deriving it from the xpath string.
fn walk(node: &Node, depth: usize, is_root: bool, out: &mut Vec<NanoViolation>) {
    let tag = node.tag_name();
    let xpath = node.indexed_xpath();

    if is_root {
        if tag != "svg" {
            out.push(NanoViolation {
                xpath,
                reason: format!("root element must be <svg>, found <{}>", tag),
            });
            return;
        }
        for child in node.children() {
            walk_under_root(&child, out);
        }
        return;
    }
    unreachable!("walk is only ever called directly on the document root");
}

fn walk_under_root(node: &Node, out: &mut Vec<NanoViolation>) {
    let tag = node.tag_name();
    let xpath = node.indexed_xpath();

    match tag.as_str() {
        "defs" => {
            if node.sibling_index() != 0 {
                out.push(NanoViolation {
                    xpath: xpath.clone(),
                    reason: "<defs> is only valid at index 0".to_string(),
                });
            }
            for child in node.children() {
                walk_under_defs(&child, out);
            }
        }
        "path" => {
            if node.sibling_index() == 0 {
                out.push(NanoViolation {
                    xpath,
                    reason: "a <defs> must precede the first <path> (index 0 is reserved)".to_string(),
                });
            }
            if node.children().next().is_some() {
                out.push(NanoViolation {
                    xpath,
                    reason: "<path> must not have children".to_string(),
                });
            }
        }
        other => out.push(NanoViolation {
            xpath,
            reason: format!("<{}> is not allowed directly under <svg>", other),
        }),
    }
}

fn walk_under_defs(node: &Node, out: &mut Vec<NanoViolation>) {
    let tag = node.tag_name();
    let xpath = node.indexed_xpath();

    match tag.as_str() {
        "linearGradient" | "radialGradient" => {
            for child in node.children() {
                let child_tag = child.tag_name();
                if child_tag != "stop" {
                    out.push(NanoViolation {
                        xpath: child.indexed_xpath(),
                        reason: format!("<{}> is not allowed inside a gradient", child_tag),
                    });
                }
            }
        }
        other => out.push(NanoViolation {
            xpath,
            reason: format!("<{}> is not allowed inside <defs>", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn empty_svg_is_valid() {
        let doc = Document::from_str(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
        assert!(checknanosvg(&doc.root).is_empty());
    }

    #[test]
    fn defs_then_paths_is_valid() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><linearGradient id="a"><stop offset="0"/></linearGradient></defs><path d="M0,0"/></svg>"#,
        )
        .unwrap();
        assert!(checknanosvg(&doc.root).is_empty());
    }

    #[test]
    fn a_group_is_a_violation() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g><path d="M0,0"/></g></svg>"#,
        )
        .unwrap();
        let violations = checknanosvg(&doc.root);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].xpath, "/svg[0]/g[0]");
    }

    #[test]
    fn a_rect_is_a_violation() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#,
        )
        .unwrap();
        assert_eq!(checknanosvg(&doc.root).len(), 1);
    }
}
