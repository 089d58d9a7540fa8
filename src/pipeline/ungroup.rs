// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pass 4: flatten every `<g>` into its surroundings, pushing its paint
//! and stroke attributes down onto its (former) children first.

use std::collections::HashMap;
use std::fmt;

use crate::dom::{query, ElementData, Node, NodeExt};
use crate::path::number::format_number;
use crate::shape::{self, Shape, Style};

use super::clip_paths::{self, ClipPathError};

/// Attributes a child inherits from its group only if it doesn't already
/// set them itself.
const COPY_IF_UNSET: &[&str] = &[
    "fill",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
];

/// Attributes a child combines with its group multiplicatively.
const MULTIPLY: &[&str] = &["fill-opacity", "opacity"];

/// A failure pushing a group's attributes down onto its children.
#[derive(Debug)]
pub enum InheritError {
    /// The group carried an attribute `ungroup` has no rule for.
    UnhandledAttribute(String),
    ClipPath(Box<ClipPathError>),
}

impl fmt::Display for InheritError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InheritError::UnhandledAttribute(name) => {
                write!(f, "unable to process group attribute \"{}\"", name)
            }
            InheritError::ClipPath(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InheritError {}

impl From<ClipPathError> for InheritError {
    fn from(e: ClipPathError) -> Self {
        InheritError::ClipPath(Box::new(e))
    }
}

/// Pushes `group`'s own attributes down onto `child`: copy-if-unset for
/// paint/stroke, multiply for the opacities, comma-join for
/// `clip-path` (resolved by a later merge pass), and an error for
/// anything else the group carries.
fn inherit_group_attrib(group: &Node, child: &Node) -> Result<(), InheritError> {
    let attrs: Vec<(String, String)> = group.borrow().attrs().to_vec();
    for (name, value) in attrs {
        if COPY_IF_UNSET.contains(&name.as_str()) {
            if child.attr(&name).is_none() {
                child.set_attr(&name, value);
            }
        } else if MULTIPLY.contains(&name.as_str()) {
            let group_val: f64 = value.parse().unwrap_or(1.0);
            let child_val: f64 = child.attr(&name).and_then(|v| v.parse().ok()).unwrap_or(1.0);
            child.set_attr(&name, format_number(group_val * child_val));
        } else if name == "clip-path" {
            let mut clips: Vec<String> = child
                .attr("clip-path")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
            clips.push(value);
            clips.sort();
            child.set_attr("clip-path", clips.join(","));
        } else {
            return Err(InheritError::UnhandledAttribute(name));
        }
    }
    Ok(())
}

/// Moves every `<g>` under `scope`'s children out to be its following
/// siblings (applying attribute inheritance as each one moves), then
/// removes the emptied groups, then merges any child left holding more
/// than one `clip-path` reference into a single synthesized `<clipPath>`.
pub fn ungroup(scope: &Node) -> Result<(), InheritError> {
    let groups = query::find_all(scope, "g");

    for group in &groups {
        let children: Vec<Node> = group.children().collect();
        let mut cursor = group.clone();
        for child in children {
            child.detach();
            cursor.insert_after(child.clone());
            inherit_group_attrib(group, &child)?;
            cursor = child;
        }
    }

    for group in &groups {
        if group.parent().is_some() {
            group.detach();
        }
    }

    merge_multi_clips(scope)
}

/// Synthesizes one `<clipPath id="merged-clip-N">` per distinct
/// comma-joined `clip-path` combination left behind by
/// `inherit_group_attrib`, rewrites each affected element's `clip-path`
/// to point at it, and drops any now-unreferenced original `<clipPath>`.
fn merge_multi_clips(scope: &Node) -> Result<(), InheritError> {
    let document_root = query::document_root(scope);
    let multi_clipped: Vec<Node> = document_root
        .descendants()
        .skip(1)
        .filter(|n| n.attr("clip-path").map_or(false, |c| c.contains(',')))
        .collect();
    if multi_clipped.is_empty() {
        return Ok(());
    }

    let mut synthesized: HashMap<String, String> = HashMap::new();
    let mut old_ids: Vec<String> = Vec::new();
    let mut next_id = 0usize;

    for clipped_el in &multi_clipped {
        let clip_refs = clipped_el.attr("clip-path").unwrap();
        if !synthesized.contains_key(&clip_refs) {
            let urls: Vec<&str> = clip_refs.split(',').collect();
            for url in &urls {
                if let Some(old) = query::resolve_url(&document_root, url) {
                    if let Some(id) = old.attr("id") {
                        old_ids.push(id);
                    }
                }
            }

            let resolved = urls
                .iter()
                .map(|u| clip_paths::resolve_clip_path(scope, u))
                .collect::<Result<Vec<_>, _>>()?;
            let combined = clip_paths::combine(resolved)?
                .expect("a comma-joined clip-path has at least two references");

            let new_id = format!("merged-clip-{}", next_id);
            next_id += 1;
            let new_clip_path = Node::new(ElementData::new("clipPath"));
            new_clip_path.set_attr("id", new_id.clone());
            new_clip_path.append(Node::new(shape::to_element(&Shape::Path(combined, Style::default()))));
            document_root.append(new_clip_path);

            synthesized.insert(clip_refs.clone(), new_id);
        }
        let new_id = &synthesized[&clip_refs];
        clipped_el.set_attr("clip-path", format!("url(#{})", new_id));
    }

    for old_id in old_ids {
        let still_referenced = document_root
            .descendants()
            .any(|n| n.attr("clip-path").as_deref() == Some(&format!("url(#{})", old_id)));
        if still_referenced {
            continue;
        }
        if let Some(old_el) = query::resolve_url(&document_root, &format!("#{}", old_id)) {
            if old_el.tag_name() == "clipPath" && old_el.parent().is_some() {
                old_el.detach();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn group_fill_is_copied_to_an_unstyled_child() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g fill="red"><path d="M0,0"/></g></svg>"#,
        )
        .unwrap();
        ungroup(&doc.root).unwrap();
        assert!(query::find_all(&doc.root, "g").is_empty());
        let path = doc.root.children().next().unwrap();
        assert_eq!(path.attr("fill").as_deref(), Some("red"));
    }

    #[test]
    fn child_fill_wins_over_group_fill() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g fill="red"><path d="M0,0" fill="blue"/></g></svg>"#,
        )
        .unwrap();
        ungroup(&doc.root).unwrap();
        let path = doc.root.children().next().unwrap();
        assert_eq!(path.attr("fill").as_deref(), Some("blue"));
    }

    #[test]
    fn opacity_multiplies_down_through_the_group() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g opacity="0.5"><path d="M0,0" opacity="0.4"/></g></svg>"#,
        )
        .unwrap();
        ungroup(&doc.root).unwrap();
        let path = doc.root.children().next().unwrap();
        assert_eq!(path.attr("opacity").as_deref(), Some("0.2"));
    }

    #[test]
    fn unhandled_group_attribute_is_an_error() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="weird"><path d="M0,0"/></g></svg>"#,
        )
        .unwrap();
        assert!(ungroup(&doc.root).is_err());
    }

    #[test]
    fn siblings_keep_their_relative_order_after_ungrouping() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g><path d="M0,0" id="a"/><path d="M1,1" id="b"/></g></svg>"#,
        )
        .unwrap();
        ungroup(&doc.root).unwrap();
        let ids: Vec<String> = doc.root.children().filter_map(|c| c.attr("id")).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
