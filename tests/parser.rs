//! End-to-end canonicalization scenarios exercising the tree-building
//! side of the pipeline: `<use>` expansion, clip-path resolution, and
//! transform application.

#[test]
fn use_expansion_bakes_in_the_x_y_translation() {
    // S2: a <use> referencing a <defs> rect is replaced by one path
    // describing the rect translated by its x/y.
    let out = nanosvg::to_nano(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
             <defs><rect id="r" width="4" height="4"/></defs>
             <use xlink:href="#r" x="3" y="0"/>
           </svg>"#,
    )
    .unwrap();
    assert!(out.contains("<path"));
    assert!(!out.contains("<use"));
    assert!(!out.contains("<rect"));
    let doc = nanosvg::Document::from_str(&out).unwrap();
    assert!(nanosvg::validate::checknanosvg(&doc.root).is_empty());
}

#[test]
fn use_href_without_a_declared_xlink_namespace_still_parses() {
    // Exercises the xlink-namespace repair at the parse boundary: the
    // input below declares neither xmlns nor xmlns:xlink, which would
    // otherwise be an unbound-prefix error.
    let out = nanosvg::to_nano(
        r#"<svg>
             <defs><rect id="r" width="4" height="4"/></defs>
             <use xlink:href="#r" x="3" y="0"/>
           </svg>"#,
    )
    .unwrap();
    assert!(out.contains("<path"));
    assert!(!out.contains("<use"));
}

#[test]
fn clip_path_intersects_target_with_clip_shape() {
    // S3: a 10x10 rect clipped by a circle of radius 5 at (5,5) becomes
    // a single path equal to the boolean intersection (the disc).
    let out = nanosvg::to_nano(
        r#"<svg xmlns="http://www.w3.org/2000/svg">
             <defs><clipPath id="c"><circle cx="5" cy="5" r="5"/></clipPath></defs>
             <rect x="0" y="0" width="10" height="10" clip-path="url(#c)"/>
           </svg>"#,
    )
    .unwrap();
    let doc = nanosvg::Document::from_str(&out).unwrap();
    let paths: Vec<_> = nanosvg::dom::query::find_all(&doc.root, "path");
    assert_eq!(paths.len(), 1);
    assert!(!out.contains("clipPath"));
    assert!(!out.contains("clip-path"));
}

#[test]
fn transform_on_a_group_is_baked_into_its_children() {
    // S6: translate(5,5) scale(2) applied to a unit rect under the group
    // produces a path for the rect at (5,5) sized 2x2.
    let doc = nanosvg::Document::from_str(
        r#"<svg xmlns="http://www.w3.org/2000/svg">
             <g transform="translate(5,5) scale(2)"><rect width="1" height="1"/></g>
           </svg>"#,
    )
    .unwrap();
    nanosvg::pipeline::apply_transforms(&doc.root).unwrap();
    nanosvg::pipeline::tonanosvg(&doc).unwrap();
    let out = doc.to_string();
    assert!(out.contains(r#"d="M 5 5 H 7 V 7 H 5 Z""#));
}
