// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The mutable SVG tree façade: a `rctree`-backed element arena parsed
//! from `roxmltree` and serialized through `xmlwriter`, plus the
//! shape-materialization cache contract pipeline passes rely on.

pub mod query;

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::shape::Shape;

/// The SVG namespace, bound to prefix `svg`.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace, bound to prefix `xlink`.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// One XML element: a local tag name and an ordered attribute map.
/// Namespaced attributes are stored with an explicit prefix in the key
/// (currently only ever `xlink:`, repaired at the parse boundary — see
/// `repair_xlink_ns`), everything else by local name; this crate never
/// needs to distinguish two same-named attributes in different
/// namespaces.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementData {
    pub tag: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        ElementData {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value;
        } else {
            self.attrs.push((name.to_string(), value));
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }
}

/// An element handle: a non-owning, cheaply-clonable reference into the
/// document's arena. Avoids the `Rc`-cycle that a naive owned
/// parent-pointer tree would need.
pub type Node = rctree::Node<ElementData>;

/// Extension methods on element handles, attaching ergonomic helpers to
/// a bare `rctree::Node` alias rather than wrapping it in a newtype.
pub trait NodeExt {
    fn tag_name(&self) -> String;
    fn attr(&self, name: &str) -> Option<String>;
    fn set_attr(&self, name: &str, value: impl Into<String>);
    fn remove_attr(&self, name: &str);
    fn append_element(&self, tag: impl Into<String>) -> Node;
    /// Overwrites this node's own tag/attributes in place, leaving its
    /// position and children untouched — used by passes that replace an
    /// element's identity (e.g. a shape becoming its `as_path()` form)
    /// without disturbing document order.
    fn replace_data(&self, data: ElementData);
    /// A recursive, detached copy of this node and its subtree.
    fn deep_copy(&self) -> Node;
    /// This node's position among *all* of its parent's children
    /// (regardless of tag), 0-indexed, as used by the indexed-xpath
    /// format the nano validator checks against — a count over every
    /// child, not a per-tag count.
    fn sibling_index(&self) -> usize;
    /// The full indexed xpath from the document root to this node, e.g.
    /// `/svg[0]/defs[0]/path[2]`.
    fn indexed_xpath(&self) -> String;
}

impl NodeExt for Node {
    fn tag_name(&self) -> String {
        self.borrow().tag.clone()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.borrow().attr(name).map(|s| s.to_string())
    }

    fn set_attr(&self, name: &str, value: impl Into<String>) {
        self.borrow_mut().set_attr(name, value);
    }

    fn remove_attr(&self, name: &str) {
        self.borrow_mut().remove_attr(name);
    }

    fn append_element(&self, tag: impl Into<String>) -> Node {
        let child = Node::new(ElementData::new(tag));
        self.append(child.clone());
        child
    }

    fn replace_data(&self, data: ElementData) {
        *self.borrow_mut() = data;
    }

    fn deep_copy(&self) -> Node {
        let copy = Node::new(self.borrow().clone());
        for child in self.children() {
            copy.append(child.deep_copy());
        }
        copy
    }

    fn sibling_index(&self) -> usize {
        let mut i = 0;
        let mut sibling = self.previous_sibling();
        while let Some(s) = sibling {
            i += 1;
            sibling = s.previous_sibling();
        }
        i
    }

    fn indexed_xpath(&self) -> String {
        let mut segments: Vec<String> = self
            .ancestors()
            .skip(1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|n| format!("/{}[{}]", n.tag_name(), n.sibling_index()))
            .collect();
        segments.push(format!("/{}[{}]", self.tag_name(), self.sibling_index()));
        segments.concat()
    }
}

/// Whether the façade's shape cache is in sync with the DOM. Either the
/// cache is empty and the DOM is authoritative, or the cache is
/// populated and no rewrite has happened since it was built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Clean,
    Dirty,
}

/// A parse failure for the top-level XML document.
#[derive(Debug)]
pub enum Error {
    NotUtf8,
    ParsingFailed(roxmltree::Error),
    MissingRoot,
    Resolve(query::ResolveError),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl From<query::ResolveError> for Error {
    fn from(e: query::ResolveError) -> Self {
        Error::Resolve(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotUtf8 => write!(f, "provided data is not valid UTF-8"),
            Error::ParsingFailed(e) => write!(f, "SVG parsing failed: {}", e),
            Error::MissingRoot => write!(f, "document has no root <svg> element"),
            Error::Resolve(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

/// The façade owning the XML root and the shape-materialization cache.
pub struct Document {
    pub root: Node,
    cache: RefCell<Option<Vec<(Node, Shape)>>>,
    state: Cell<CacheState>,
}

impl Document {
    /// Parses a UTF-8 XML string into a document.
    ///
    /// Repairs `xlink:` namespace problems at the parse boundary: if
    /// the input uses an `xlink:href` attribute without
    /// declaring the `xlink` namespace, `roxmltree` would reject it as an
    /// unbound prefix, so it's rewritten to a reserved placeholder
    /// attribute name before parsing and restored to `xlink:href` in
    /// `build_node` below. Namespace-resolved `xlink:href` attributes
    /// (when the namespace *is* declared) are stored back under the
    /// `xlink:` prefix too, so pipeline passes never have to reason about
    /// namespace URIs directly.
    pub fn from_str(xml: &str) -> Result<Document, Error> {
        let repaired = repair_xlink_ns(xml);
        let xdoc = roxmltree::Document::parse(&repaired)?;
        let xroot = xdoc.root_element();
        let root = build_node(xroot);
        Ok(Document {
            root,
            cache: RefCell::new(None),
            state: Cell::new(CacheState::Dirty),
        })
    }

    /// Serializes the document back to an XML string via `xmlwriter`,
    /// declaring `xmlns` and (if any `xlink:`-prefixed attribute is
    /// present anywhere in the tree) `xmlns:xlink`.
    pub fn to_string(&self) -> String {
        let mut xml = xmlwriter::XmlWriter::new(xmlwriter::Options::default());
        let needs_xlink = self.root.descendants().any(|n| {
            n.borrow().attrs().iter().any(|(k, _)| k.starts_with("xlink:"))
        });
        write_node(&self.root, &mut xml, true, needs_xlink);
        xml.end_document()
    }

    /// The root `<svg>` element's `viewBox` attribute, parsed into
    /// `(min_x, min_y, width, height)`.
    pub fn view_box(&self) -> Option<(f64, f64, f64, f64)> {
        let raw = self.root.attr("viewBox")?;
        let nums: Vec<f64> = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<f64>().ok())
            .collect();
        if nums.len() == 4 {
            Some((nums[0], nums[1], nums[2], nums[3]))
        } else {
            None
        }
    }

    /// Resolves a `url(#id)` or bare `#id` reference to the unique element
    /// of tag `tag` carrying that `id`, searching the whole document.
    /// Fails if zero or more than one element matches (§4.4).
    pub fn resolve_url(&self, reference: &str, tag: &str) -> Result<Node, Error> {
        Ok(query::resolve_url_unique(&self.root, reference, Some(tag))?)
    }

    /// Marks the shape cache stale; any pipeline pass that mutates the
    /// DOM directly (rather than through `materialize`) must call this.
    pub fn mark_dirty(&self) {
        self.state.set(CacheState::Dirty);
        *self.cache.borrow_mut() = None;
    }

    pub fn cache_state(&self) -> CacheState {
        self.state.get()
    }

    /// All shapes in the document, in document order, as `(element,
    /// shape)` pairs. Builds the cache by iterating every element and
    /// materializing it via `shape::from_element` if the cache is
    /// currently empty (`Dirty`); otherwise returns the existing
    /// (`Clean`) cache untouched. Per §3's façade invariant, this is the
    /// only way the cache transitions from `Dirty` to `Clean`.
    pub fn shapes(&self) -> Vec<(Node, Shape)> {
        if self.state.get() == CacheState::Dirty || self.cache.borrow().is_none() {
            let built: Vec<(Node, Shape)> = self
                .root
                .descendants()
                .skip(1)
                .filter_map(|n| crate::shape::from_element(&n).map(|s| (n.clone(), s)))
                .collect();
            *self.cache.borrow_mut() = Some(built);
            self.state.set(CacheState::Clean);
        }
        self.cache.borrow().as_ref().expect("populated above").clone()
    }

    /// Flushes any mutation made to the values returned by `shapes()` back
    /// onto their owning elements via `shape::to_element`, preserving each
    /// element's position in the tree, then drops the cache, leaving the
    /// façade `Dirty` again — the only sanctioned way to rewrite the DOM
    /// from a `shapes()` snapshot, as opposed to mutating elements
    /// directly. Callers that mutate elements directly (most pipeline
    /// passes) use `mark_dirty` instead; `materialize` is for callers
    /// working purely against the `shapes()` snapshot.
    pub fn materialize(&self, shapes: &[(Node, Shape)]) {
        for (node, shape) in shapes {
            node.replace_data(crate::shape::to_element(shape));
        }
        self.mark_dirty();
    }
}

/// The placeholder attribute name substituted for `xlink:href` when the
/// input doesn't declare the `xlink` namespace, so `roxmltree` doesn't
/// choke on an unbound prefix. Never appears past `build_node`.
const XLINK_HREF_PLACEHOLDER: &str = "data-nanosvg-xlink-href";

/// Rewrites bare `xlink:href` attributes to `XLINK_HREF_PLACEHOLDER` when
/// the input text never declares `xmlns:xlink`, so parsing doesn't fail
/// on an unbound namespace prefix. A plain text substitution is enough:
/// this crate only ever reads `xlink:href`, never any other `xlink:`
/// attribute, so there's nothing else to repair.
fn repair_xlink_ns(xml: &str) -> std::borrow::Cow<'_, str> {
    if xml.contains("xlink:href") && !xml.contains("xmlns:xlink") {
        std::borrow::Cow::Owned(xml.replace("xlink:href", XLINK_HREF_PLACEHOLDER))
    } else {
        std::borrow::Cow::Borrowed(xml)
    }
}

fn build_node(xnode: roxmltree::Node) -> Node {
    let mut data = ElementData::new(xnode.tag_name().name().to_string());
    for attr in xnode.attributes() {
        let key = match attr.namespace() {
            Some(ns) if ns == XLINK_NS => format!("xlink:{}", attr.name()),
            None if attr.name() == XLINK_HREF_PLACEHOLDER => "xlink:href".to_string(),
            _ => attr.name().to_string(),
        };
        data.set_attr(&key, attr.value());
    }
    let node = Node::new(data);
    for child in xnode.children().filter(|c| c.is_element()) {
        node.append(build_node(child));
    }
    node
}

fn write_node(node: &Node, xml: &mut xmlwriter::XmlWriter, is_root: bool, needs_xlink: bool) {
    let data = node.borrow();
    xml.start_element(&data.tag);
    if is_root {
        xml.write_attribute("xmlns", SVG_NS);
        if needs_xlink {
            xml.write_attribute("xmlns:xlink", XLINK_NS);
        }
    }
    for (k, v) in data.attrs() {
        xml.write_attribute(k, v);
    }
    drop(data);
    for child in node.children() {
        write_node(&child, xml, false, needs_xlink);
    }
    xml.end_element();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_reserializes_a_simple_rect() {
        let doc = Document::from_str(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="10" height="5"/></svg>"#).unwrap();
        assert_eq!(doc.root.tag_name(), "svg");
        let rect = doc.root.children().next().unwrap();
        assert_eq!(rect.tag_name(), "rect");
        assert_eq!(rect.attr("width").as_deref(), Some("10"));
        let out = doc.to_string();
        assert!(out.contains("rect"));
    }

    #[test]
    fn repairs_xlink_href_attribute() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let use_node = doc.root.children().next().unwrap();
        assert_eq!(use_node.attr("xlink:href").as_deref(), Some("#a"));
        assert!(doc.to_string().contains("xmlns:xlink"));
    }

    #[test]
    fn parses_xlink_href_without_a_namespace_declaration() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><use xlink:href="#a"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let use_node = doc.root.children().next().unwrap();
        assert_eq!(use_node.attr("xlink:href").as_deref(), Some("#a"));
        assert!(doc.to_string().contains("xmlns:xlink"));
    }

    #[test]
    fn resolve_url_finds_element_by_id() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><circle id="c1" r="3"/></defs></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let found = doc.resolve_url("url(#c1)", "circle").unwrap();
        assert_eq!(found.tag_name(), "circle");
    }

    #[test]
    fn resolve_url_fails_on_wrong_tag() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><circle id="c1" r="3"/></defs></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        assert!(doc.resolve_url("url(#c1)", "rect").is_err());
    }

    #[test]
    fn resolve_url_fails_on_multiple_matches() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><defs><circle id="c1" r="3"/><circle id="c1" r="4"/></defs></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        assert!(doc.resolve_url("url(#c1)", "circle").is_err());
    }

    #[test]
    fn shapes_caches_until_the_next_mark_dirty() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="10" height="5"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        assert_eq!(doc.cache_state(), CacheState::Dirty);

        let shapes = doc.shapes();
        assert_eq!(shapes.len(), 1);
        assert!(matches!(shapes[0].1, Shape::Rect(..)));
        assert_eq!(doc.cache_state(), CacheState::Clean);

        doc.mark_dirty();
        assert_eq!(doc.cache_state(), CacheState::Dirty);
    }

    #[test]
    fn materialize_writes_mutated_shapes_back_onto_their_elements() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="10" height="5"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let mut shapes = doc.shapes();
        shapes[0].1.style_mut().fill = "red".to_string();

        doc.materialize(&shapes);

        assert_eq!(doc.cache_state(), CacheState::Dirty);
        let rect = doc.root.children().next().unwrap();
        assert_eq!(rect.attr("fill").as_deref(), Some("red"));
    }

    #[test]
    fn indexed_xpath_matches_nano_schema_shape() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0"/><path d="M1,1"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let mut children = doc.root.children();
        let _first = children.next().unwrap();
        let second = children.next().unwrap();
        assert_eq!(second.indexed_xpath(), "/svg[0]/path[1]");
    }

    #[test]
    fn sibling_index_counts_all_children_not_just_same_tag() {
        let xml = r#"<svg xmlns="http://www.w3.org/2000/svg"><defs/><path d="M0,0"/></svg>"#;
        let doc = Document::from_str(xml).unwrap();
        let mut children = doc.root.children();
        let _defs = children.next().unwrap();
        let path = children.next().unwrap();
        assert_eq!(path.tag_name(), "path");
        assert_eq!(path.indexed_xpath(), "/svg[0]/path[1]");
    }
}
