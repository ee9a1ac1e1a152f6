//! Write an [`Element`] tree back to XML.
//!
//! Two forms are produced: the storage form written into packages (XML
//! declaration, no insignificant whitespace) and an indented form for people to
//! read, without a declaration. Namespace declarations are emitted where an
//! element or attribute needs a binding that is not already in scope, so
//! elements created with [`Element::new`] serialize correctly wherever they are
//! inserted.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::common::xml::{escape_attr, escape_text};
use crate::ooxml::oxml::element::{Element, QName};
use crate::ooxml::oxml::ns;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Storage form: XML declaration followed by the compact element.
pub fn serialize_for_storage(element: &Element) -> Vec<u8> {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    Serializer::new(false).write(element, &mut out, 0);
    out.into_bytes()
}

/// Compact form without a declaration.
pub fn to_xml_string(element: &Element) -> String {
    let mut out = String::with_capacity(1024);
    Serializer::new(false).write(element, &mut out, 0);
    out
}

/// Indented form without a declaration.
pub fn serialize_for_reading(element: &Element) -> String {
    let mut out = String::with_capacity(4096);
    Serializer::new(true).write(element, &mut out, 0);
    out.push('\n');
    out
}

/// Prefix bindings in effect, innermost last.
struct Scope {
    bindings: Vec<(Option<String>, String)>,
}

impl Scope {
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Some non-default prefix currently bound to `uri`.
    fn prefix_bound_to(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter_map(|(p, u)| p.as_deref().filter(|_| u == uri))
            .find(|p| self.lookup(Some(*p)) == Some(uri))
    }
}

struct Serializer {
    pretty: bool,
    scope: Scope,
}

impl Serializer {
    fn new(pretty: bool) -> Self {
        Self {
            pretty,
            scope: Scope {
                bindings: vec![(Some("xml".to_string()), ns::XML.to_string())],
            },
        }
    }

    fn write(&mut self, element: &Element, out: &mut String, depth: usize) {
        let mark = self.scope.bindings.len();
        let mut decls: SmallVec<[(Option<String>, String); 4]> = SmallVec::new();

        for decl in element.namespace_declarations() {
            if self.scope.lookup(decl.prefix.as_deref()) != Some(decl.uri.as_str()) {
                self.bind(&mut decls, decl.prefix.clone(), &decl.uri);
            }
        }

        let tag = self.element_name(element.name(), &mut decls);
        let mut attrs: SmallVec<[(String, &str); 4]> = SmallVec::new();
        for attr in element.attributes() {
            let name = self.attribute_name(&attr.name, &mut decls);
            attrs.push((name, attr.value.as_str()));
        }

        out.push('<');
        out.push_str(&tag);
        for (prefix, uri) in &decls {
            match prefix {
                Some(prefix) => {
                    out.push_str(" xmlns:");
                    out.push_str(prefix);
                },
                None => out.push_str(" xmlns"),
            }
            out.push_str("=\"");
            out.push_str(&escape_attr(uri));
            out.push('"');
        }
        for (name, value) in &attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }

        let text = element.text().filter(|t| !t.is_empty());
        if element.children().is_empty() && text.is_none() {
            out.push_str("/>");
        } else {
            out.push('>');
            if let Some(text) = text {
                out.push_str(&escape_text(text));
            }
            // indenting mixed content would change it
            let indent = self.pretty && text.is_none() && !has_tails(element);
            for child in element.children() {
                if indent {
                    push_indent(out, depth + 1);
                }
                self.write(child, out, depth + 1);
                if let Some(tail) = child.tail() {
                    out.push_str(&escape_text(tail));
                }
            }
            if indent && !element.children().is_empty() {
                push_indent(out, depth);
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }

        self.scope.bindings.truncate(mark);
    }

    fn bind(
        &mut self,
        decls: &mut SmallVec<[(Option<String>, String); 4]>,
        prefix: Option<String>,
        uri: &str,
    ) {
        decls.push((prefix.clone(), uri.to_string()));
        self.scope.bindings.push((prefix, uri.to_string()));
    }

    fn element_name(
        &mut self,
        name: &QName,
        decls: &mut SmallVec<[(Option<String>, String); 4]>,
    ) -> String {
        let Some(uri) = name.namespace() else {
            if self.scope.lookup(None).is_some_and(|u| !u.is_empty()) {
                self.bind(decls, None, "");
            }
            return name.local_name().to_string();
        };

        let prefix = match name.prefix() {
            Some(p) if self.scope.lookup(Some(p)) == Some(uri) => Some(Cow::Borrowed(p)),
            None if self.scope.lookup(None) == Some(uri) => None,
            preferred => match self.scope.prefix_bound_to(uri) {
                Some(p) => Some(Cow::Owned(p.to_string())),
                None => {
                    let prefix = self.free_prefix(preferred, uri);
                    self.bind(decls, prefix.clone(), uri);
                    prefix.map(Cow::Owned)
                },
            },
        };
        qualified(prefix.as_deref(), name.local_name())
    }

    fn attribute_name(
        &mut self,
        name: &QName,
        decls: &mut SmallVec<[(Option<String>, String); 4]>,
    ) -> String {
        let Some(uri) = name.namespace() else {
            return name.local_name().to_string();
        };
        let prefix = match name.prefix() {
            Some(p) if self.scope.lookup(Some(p)) == Some(uri) => p.to_string(),
            preferred => match self.scope.prefix_bound_to(uri) {
                Some(p) => p.to_string(),
                None => {
                    // attributes need a real prefix; the default namespace does not apply
                    let preferred = preferred.or_else(|| ns::prefix_for(uri));
                    let prefix = self
                        .free_prefix(preferred, uri)
                        .unwrap_or_else(|| "ns0".to_string());
                    self.bind(decls, Some(prefix.clone()), uri);
                    prefix
                },
            },
        };
        qualified(Some(&prefix), name.local_name())
    }

    /// A prefix for `uri` that does not shadow a binding already in scope.
    fn free_prefix(&self, preferred: Option<&str>, uri: &str) -> Option<String> {
        let candidates = preferred.into_iter().chain(ns::prefix_for(uri));
        for candidate in candidates {
            if self.scope.lookup(Some(candidate)).is_none() {
                return Some(candidate.to_string());
            }
        }
        (0..)
            .map(|n| format!("ns{}", n))
            .find(|p| self.scope.lookup(Some(p.as_str())).is_none())
    }
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => {
            let mut s = String::with_capacity(prefix.len() + 1 + local.len());
            s.push_str(prefix);
            s.push(':');
            s.push_str(local);
            s
        },
        None => local.to_string(),
    }
}

fn has_tails(element: &Element) -> bool {
    element
        .children()
        .iter()
        .any(|c| c.tail().is_some_and(|t| !t.is_empty()))
}

fn push_indent(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::parser::parse_xml;

    #[test]
    fn test_storage_form_declares_namespaces() {
        let mut p = Element::new("w:p");
        let r = p.append(Element::new("w:r"));
        r.append(Element::new("w:t")).set_text(Some("a < b".into()));

        let xml = String::from_utf8(serialize_for_storage(&p)).unwrap();
        assert_eq!(
            xml,
            format!(
                "{}\n<w:p xmlns:w=\"{}\"><w:r><w:t>a &lt; b</w:t></w:r></w:p>",
                XML_DECLARATION,
                ns::W
            )
        );
    }

    #[test]
    fn test_existing_declarations_are_not_repeated() {
        let mut doc = Element::with_nsdecls("w:document", &["w", "r"]);
        let body = doc.append(Element::new("w:body"));
        body.append(Element::new("w:p"));
        let xml = to_xml_string(&doc);
        assert_eq!(xml.matches("xmlns:w=").count(), 1);
        assert!(xml.contains("<w:body><w:p/></w:body>"));
    }

    #[test]
    fn test_attribute_namespace_gets_prefix() {
        let mut ref_ = Element::new("w:headerReference");
        ref_.set_attr("w:type", "default");
        ref_.set_attr("r:id", "rId3");
        let xml = to_xml_string(&ref_);
        assert!(xml.contains(&format!("xmlns:r=\"{}\"", ns::R)));
        assert!(xml.contains("r:id=\"rId3\""));
        let reparsed = parse_xml(xml.as_bytes()).unwrap();
        assert_eq!(reparsed, ref_);
    }

    #[test]
    fn test_round_trip_preserves_unknown_content() {
        let src = br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:foo="urn:example:foo"><w:body><foo:widget foo:size="3">x<foo:part/>y</foo:widget><w:p/></w:body></w:document>"#;
        let root = parse_xml(src).unwrap();
        let xml = to_xml_string(&root);
        assert_eq!(parse_xml(xml.as_bytes()).unwrap(), root);
        assert!(xml.contains(r#"<foo:widget foo:size="3">x<foo:part/>y</foo:widget>"#));
    }

    #[test]
    fn test_default_namespace_preserved() {
        let src = br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
        let root = parse_xml(src).unwrap();
        assert_eq!(std::str::from_utf8(src).unwrap(), to_xml_string(&root));
    }

    #[test]
    fn test_reading_form_is_indented() {
        let mut tbl = Element::with_nsdecls("w:tbl", &["w"]);
        let tr = tbl.append(Element::new("w:tr"));
        tr.append(Element::new("w:tc"));
        let text = serialize_for_reading(&tbl);
        assert!(!text.starts_with("<?xml"));
        assert_eq!(
            text,
            format!(
                "<w:tbl xmlns:w=\"{}\">\n  <w:tr>\n    <w:tc>\n      <w:p/>\n    </w:tc>\n  </w:tr>\n</w:tbl>\n",
                ns::W
            )
        );
    }
}
