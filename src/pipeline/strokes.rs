// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pass 5: convert every stroked shape into the filled path that draws
//! its stroke, run after `ungroup` so group-inherited stroke attributes
//! have already landed on the shape itself.

use crate::dom::{Node, NodeExt};
use crate::pathops;
use crate::shape::{self, Shape, Style};

/// Converts every shape with `stroke != "none"` under `root` into its
/// filled outline, in draw order: if the original also has a fill, the
/// original is kept (now stroke-free) immediately followed by the new
/// outline shape; if the original's fill is `"none"`, only the outline
/// survives in its place.
pub fn strokes_to_paths(root: &Node) {
    let candidates: Vec<Node> = root
        .descendants()
        .skip(1)
        .filter(|n| shape::from_element(n).is_some())
        .collect();

    for node in candidates {
        let shape = shape::from_element(&node).expect("filtered above");
        if shape.style().stroke == "none" {
            continue;
        }

        let outline_path = pathops::stroke(
            &shape.as_path(),
            shape.style().stroke_width,
            &shape.style().stroke_linecap,
            &shape.style().stroke_linejoin,
            shape.style().stroke_miterlimit,
        );

        let mut outline_style = shape.style().clone();
        outline_style.fill = outline_style.stroke.clone();
        outline_style.opacity = outline_style.stroke_opacity;
        outline_style.id = None;
        reset_stroke_fields(&mut outline_style);
        let outline = Shape::Path(outline_path, outline_style);

        if shape.style().fill == "none" {
            node.replace_data(shape::to_element(&outline));
            continue;
        }

        let mut original_style = shape.style().clone();
        reset_stroke_fields(&mut original_style);
        let original = Shape::Path(shape.as_path(), original_style);
        node.replace_data(shape::to_element(&original));

        let outline_el = Node::new(shape::to_element(&outline));
        node.insert_after(outline_el);
    }
}

/// Clears every `stroke*` attribute from a style bag after it's been
/// converted to its equivalent filled outline.
fn reset_stroke_fields(style: &mut Style) {
    let default = Style::default();
    style.stroke = default.stroke;
    style.stroke_width = default.stroke_width;
    style.stroke_linecap = default.stroke_linecap;
    style.stroke_linejoin = default.stroke_linejoin;
    style.stroke_miterlimit = default.stroke_miterlimit;
    style.stroke_dasharray = default.stroke_dasharray;
    style.stroke_opacity = default.stroke_opacity;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn filled_and_stroked_shape_keeps_both_in_draw_order() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L10,0" fill="red" stroke="blue" stroke-width="2"/></svg>"#,
        )
        .unwrap();
        strokes_to_paths(&doc.root);
        let children: Vec<Node> = doc.root.children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("fill").as_deref(), Some("red"));
        assert_eq!(children[0].attr("stroke"), None);
        assert_eq!(children[1].attr("fill").as_deref(), Some("blue"));
    }

    #[test]
    fn stroke_only_shape_is_replaced_by_its_outline() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L10,0" fill="none" stroke="black" stroke-width="2"/></svg>"#,
        )
        .unwrap();
        strokes_to_paths(&doc.root);
        let children: Vec<Node> = doc.root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].attr("fill").as_deref(), Some("black"));
        assert_eq!(children[0].attr("stroke"), None);
    }

    #[test]
    fn unstroked_shape_is_left_alone() {
        let doc = Document::from_str(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L10,0" fill="red"/></svg>"#,
        )
        .unwrap();
        strokes_to_paths(&doc.root);
        assert_eq!(doc.root.children().count(), 1);
    }
}
