//! Owned, namespace-aware XML element tree.
//!
//! An [`Element`] keeps its qualified name, attributes, ordered element
//! children and character data. Text follows the text/tail model: `text` is the
//! character data before the first child and each child's `tail` is the
//! character data between its end tag and the next sibling. Mixed content
//! therefore survives a parse/serialize cycle without a separate text node type.
//!
//! Every element carries the [`ElementClass`] the registry assigned to its
//! name when it was parsed or created, which is how typed views recognise it.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::ooxml::error::Result;
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::registry::ElementClass;

/// Namespace-qualified name of an element or attribute.
///
/// Equality and hashing consider only the namespace URI and local name; the
/// prefix is kept so serialization can reuse the one the document used.
#[derive(Debug, Clone)]
pub struct QName {
    ns: Option<Cow<'static, str>>,
    prefix: Option<String>,
    local: String,
}

impl QName {
    pub fn new(ns: Option<Cow<'static, str>>, prefix: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns,
            prefix,
            local: local.into(),
        }
    }

    /// Build from prefixed notation using the fixed prefix map, `w:tc` or `Id`.
    pub fn from_prefixed(tag: &str) -> Self {
        match tag.split_once(':') {
            Some((prefix, local)) => Self {
                ns: ns::uri_for(prefix).map(Cow::Borrowed),
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self {
                ns: None,
                prefix: None,
                local: tag.to_string(),
            },
        }
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// True when this name equals the prefixed name `tag`.
    pub fn matches(&self, tag: &str) -> bool {
        let (uri, local) = ns::split_prefixed(tag);
        self.local == local && self.ns.as_deref() == uri
    }

    /// `{uri}local` form.
    pub fn clark(&self) -> String {
        match &self.ns {
            Some(uri) => format!("{{{}}}{}", uri, self.local),
            None => self.local.clone(),
        }
    }

    pub(crate) fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.ns == other.ns
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self
            .prefix
            .as_deref()
            .or_else(|| self.ns.as_deref().and_then(ns::prefix_for));
        match prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// An `xmlns` or `xmlns:prefix` declaration carried by an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) name: QName,
    pub(crate) class: ElementClass,
    pub(crate) attrs: SmallVec<[Attribute; 4]>,
    pub(crate) ns_decls: SmallVec<[NsDecl; 2]>,
    pub(crate) text: Option<String>,
    pub(crate) tail: Option<String>,
    pub(crate) children: Vec<Element>,
}

impl Element {
    /// Create an empty element from a prefixed name such as `w:p`.
    ///
    /// The element class is looked up in the registry; classes that require
    /// content, such as a table cell, are created with that content in place.
    pub fn new(tag: &str) -> Self {
        let name = QName::from_prefixed(tag);
        let class = ElementClass::for_name(&name);
        let mut element = Self::with_name(name, class);
        class.populate(&mut element);
        element
    }

    /// Like [`Element::new`] but also declares the namespaces for `prefixes`
    /// on the element, as a part's root element does.
    pub fn with_nsdecls(tag: &str, prefixes: &[&str]) -> Self {
        let mut element = Self::new(tag);
        for prefix in prefixes {
            if let Some(uri) = ns::uri_for(prefix) {
                element.declare_namespace(Some(prefix), uri);
            }
        }
        element
    }

    pub(crate) fn with_name(name: QName, class: ElementClass) -> Self {
        Self {
            name,
            class,
            attrs: SmallVec::new(),
            ns_decls: SmallVec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    /// Parse a complete XML document and return its root element.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        crate::ooxml::oxml::parser::parse_xml(xml)
    }

    #[inline]
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Prefixed name for display, `w:tc`.
    pub fn tag(&self) -> String {
        self.name.to_string()
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    #[inline]
    pub fn class(&self) -> ElementClass {
        self.class
    }

    /// True when this element's name equals the prefixed name `tag`.
    #[inline]
    pub fn is(&self, tag: &str) -> bool {
        self.name.matches(tag)
    }

    // ---- attributes ----

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.matches(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name.matches(name)) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute {
                name: QName::from_prefixed(name),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|a| a.name.matches(name))?;
        Some(self.attrs.remove(idx).value)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }

    // ---- namespace declarations ----

    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        let prefix = prefix.map(str::to_string);
        match self.ns_decls.iter_mut().find(|d| d.prefix == prefix) {
            Some(decl) => decl.uri = uri.to_string(),
            None => self.ns_decls.push(NsDecl {
                prefix,
                uri: uri.to_string(),
            }),
        }
    }

    pub fn namespace_declarations(&self) -> &[NsDecl] {
        &self.ns_decls
    }

    // ---- character data ----

    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    #[inline]
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn set_tail(&mut self, tail: Option<String>) {
        self.tail = tail;
    }

    /// All character data in document order, this element's tail excluded.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    // ---- children ----

    #[inline]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn first_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(tag))
    }

    pub fn first_child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.is(tag))
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is(tag))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter(move |c| c.is(tag))
    }

    /// Index of the first child whose name is any of `tags`.
    pub fn position_of_any(&self, tags: &[&str]) -> Option<usize> {
        self.children
            .iter()
            .position(|c| tags.iter().any(|t| c.is(t)))
    }

    /// Insert `child` at `idx` and return it.
    pub fn insert(&mut self, idx: usize, child: Element) -> &mut Element {
        let idx = idx.min(self.children.len());
        self.children.insert(idx, child);
        &mut self.children[idx]
    }

    /// Append `child` as the last child and return it.
    pub fn append(&mut self, child: Element) -> &mut Element {
        let idx = self.children.len();
        self.insert(idx, child)
    }

    pub fn remove(&mut self, idx: usize) -> Option<Element> {
        (idx < self.children.len()).then(|| self.children.remove(idx))
    }

    /// Remove every child whose name is any of `tags`; returns how many were removed.
    pub fn remove_children_named(&mut self, tags: &[&str]) -> usize {
        let before = self.children.len();
        self.children.retain(|c| !tags.iter().any(|t| c.is(t)));
        before - self.children.len()
    }

    // ---- traversal ----

    /// Pre-order iterator over this element and all its descendants.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Visit this element and all descendants mutably, in pre-order.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }
}

/// Pre-order traversal, see [`Element::iter`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

fn same_text(a: &Option<String>, b: &Option<String>) -> bool {
    a.as_deref().unwrap_or("") == b.as_deref().unwrap_or("")
}

/// Structural equality: names, attribute sets (order ignored), character data
/// and children. Namespace declarations and prefixes are not compared.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attrs.len() == other.attrs.len()
            && self.attrs.iter().all(|a| other.attrs.iter().any(|b| a == b))
            && same_text(&self.text, &other.text)
            && same_text(&self.tail, &other.tail)
            && self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_uses_fixed_prefix_map() {
        let p = Element::new("w:p");
        assert_eq!(p.namespace(), Some(ns::W));
        assert_eq!(p.local_name(), "p");
        assert_eq!(p.tag(), "w:p");
        assert!(p.is("w:p"));
        assert!(!p.is("a:p"));
        assert_eq!(p.class(), ElementClass::P);
    }

    #[test]
    fn test_attributes() {
        let mut el = Element::new("w:pStyle");
        assert_eq!(el.attr("w:val"), None);
        el.set_attr("w:val", "Heading1");
        el.set_attr("w:val", "Heading2");
        assert_eq!(el.attr("w:val"), Some("Heading2"));
        assert_eq!(el.attributes().count(), 1);
        // unprefixed attributes live in no namespace
        assert_eq!(el.attr("val"), None);
        assert_eq!(el.remove_attr("w:val").as_deref(), Some("Heading2"));
        assert_eq!(el.attr("w:val"), None);
    }

    #[test]
    fn test_children() {
        let mut body = Element::new("w:body");
        body.append(Element::new("w:p"));
        body.append(Element::new("w:tbl"));
        body.append(Element::new("w:sectPr"));
        body.insert(0, Element::new("w:p"));

        assert_eq!(body.children_named("w:p").count(), 2);
        assert_eq!(body.position_of_any(&["w:sectPr", "w:tbl"]), Some(2));
        assert_eq!(body.remove_children_named(&["w:p"]), 2);
        assert_eq!(body.children().len(), 2);
        assert!(body.remove(5).is_none());
    }

    #[test]
    fn test_iter_is_preorder() {
        let mut tbl = Element::new("w:tbl");
        let tr = tbl.append(Element::new("w:tr"));
        tr.append(Element::new("w:tc"));
        let names: Vec<String> = tbl.iter().map(Element::tag).collect();
        assert_eq!(names, ["w:tbl", "w:tr", "w:tc", "w:p"]);
    }

    #[test]
    fn test_text_content_includes_tails() {
        let mut p = Element::new("w:p");
        p.set_text(Some("a".into()));
        let r = p.append(Element::new("w:r"));
        r.set_text(Some("b".into()));
        r.set_tail(Some("c".into()));
        assert_eq!(p.text_content(), "abc");
    }

    #[test]
    fn test_structural_equality_ignores_attribute_order() {
        let mut a = Element::new("w:tblW");
        a.set_attr("w:w", "0");
        a.set_attr("w:type", "auto");
        let mut b = Element::new("w:tblW");
        b.set_attr("w:type", "auto");
        b.set_attr("w:w", "0");
        assert_eq!(a, b);
        b.set_attr("w:w", "1");
        assert_ne!(a, b);
    }
}
