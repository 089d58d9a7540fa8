//! End-to-end canonicalization scenarios exercising the serialized-output
//! side of the pipeline: default-attribute writing, group inheritance,
//! and stroke-to-fill conversion.

#[test]
fn rect_becomes_a_single_path_with_fill_always_written() {
    // S1: a single rect becomes a single path; fill="black" is present
    // even though it's the shape's default value.
    let out = nanosvg::to_nano(r#"<svg><rect x="0" y="0" width="10" height="5"/></svg>"#).unwrap();
    assert!(out.contains(r#"d="M 0 0 H 10 V 5 H 0 Z""#));
    assert!(out.contains(r#"fill="black""#));
    assert_eq!(out.matches("<path").count(), 1);
}

#[test]
fn group_fill_and_opacity_inherit_into_the_child_shape() {
    // S4: the group's fill="red" is inherited by the child (which sets
    // none of its own), and opacity multiplies down the chain: 0.5 * 0.4.
    let out =
        nanosvg::to_nano(r#"<svg><g fill="red" opacity="0.5"><circle r="3" opacity="0.4"/></g></svg>"#)
            .unwrap();
    assert!(out.contains(r#"fill="red""#));
    assert!(out.contains(r#"opacity="0.2""#));
    assert!(!out.contains("<g"));
}

#[test]
fn a_childs_own_fill_overrides_the_groups_inherited_fill() {
    let out =
        nanosvg::to_nano(r#"<svg><g fill="red"><circle r="3" fill="blue"/></g></svg>"#).unwrap();
    assert!(out.contains(r#"fill="blue""#));
    assert!(!out.contains(r#"fill="red""#));
}

#[test]
fn stroke_only_line_becomes_a_filled_outline_with_no_stroke_attributes() {
    // S5: stroke conversion. A fill="none" stroked line has no fill of
    // its own to keep, so only its stroke outline survives, filled with
    // the stroke color.
    let out = nanosvg::to_nano(
        r#"<svg><line x1="0" y1="0" x2="10" y2="0" stroke="black" stroke-width="2" fill="none"/></svg>"#,
    )
    .unwrap();
    assert_eq!(out.matches("<path").count(), 1);
    assert!(out.contains(r#"fill="black""#));
    assert!(!out.contains("stroke=\""));
    assert!(!out.contains("stroke-width"));
}

#[test]
fn filled_and_stroked_shape_becomes_two_paths_in_draw_order() {
    let out = nanosvg::to_nano(
        r#"<svg><rect x="0" y="0" width="10" height="10" fill="red" stroke="blue" stroke-width="2"/></svg>"#,
    )
    .unwrap();
    assert_eq!(out.matches("<path").count(), 2);
    let fill_idx = out.find(r#"fill="red""#).unwrap();
    let stroke_fill_idx = out.find(r#"fill="blue""#).unwrap();
    assert!(fill_idx < stroke_fill_idx, "original fill must be drawn before its stroke outline");
}
