//! Build an [`Element`] tree from XML bytes.
//!
//! The parser resolves namespace prefixes against the declarations in scope,
//! assigns each element its registered class, and drops whitespace-only text
//! inside elements that have element children. Only the predefined entities and
//! character references are accepted; a DOCTYPE or any other entity reference
//! makes the document invalid, so nothing is ever fetched or expanded.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

use crate::common::xml::resolve_entity;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::{Attribute, Element, NsDecl, QName};
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::registry::ElementClass;

/// Parse `xml` and return the root element.
pub fn parse_xml(xml: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(1024);
    let mut stack: Vec<Element> = Vec::with_capacity(16);
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let element = open_element(&e, &stack)?;
                stack.push(element);
            },
            Event::Empty(e) => {
                let element = open_element(&e, &stack)?;
                close_element(element, &mut stack, &mut root)?;
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| OoxmlError::Xml("unmatched end tag".to_string()))?;
                close_element(element, &mut stack, &mut root)?;
            },
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                push_text(&mut stack, text);
            },
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                push_text(&mut stack, text);
            },
            Event::GeneralRef(e) => {
                let name = std::str::from_utf8(e.as_ref())?;
                let ch = resolve_entity(name).ok_or_else(|| {
                    OoxmlError::InvalidXml(format!("undefined entity reference '&{};'", name))
                })?;
                let mut utf8 = [0u8; 4];
                push_text(&mut stack, ch.encode_utf8(&mut utf8));
            },
            Event::DocType(_) => {
                return Err(OoxmlError::InvalidXml(
                    "DOCTYPE declarations are not allowed in package parts".to_string(),
                ));
            },
            Event::Eof => break,
            // declarations, comments and processing instructions carry no content
            _ => {},
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(OoxmlError::Xml(format!(
            "unexpected end of document inside <{}>",
            stack[stack.len() - 1].tag()
        )));
    }
    root.ok_or_else(|| OoxmlError::Xml("document has no root element".to_string()))
}

fn open_element(e: &BytesStart<'_>, stack: &[Element]) -> Result<Element> {
    let mut decls: SmallVec<[NsDecl; 2]> = SmallVec::new();
    let mut raw_attrs: SmallVec<[(String, String); 4]> = SmallVec::new();

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            decls.push(NsDecl {
                prefix: None,
                uri: value,
            });
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            decls.push(NsDecl {
                prefix: Some(prefix.to_string()),
                uri: value,
            });
        } else {
            raw_attrs.push((key.to_string(), value));
        }
    }

    let qname = e.name();
    let raw_name = std::str::from_utf8(qname.as_ref())?;
    let name = resolve(raw_name, &decls, stack, true)?;
    let class = ElementClass::for_name(&name);
    let mut element = Element::with_name(name, class);

    for (key, value) in raw_attrs {
        let name = resolve(&key, &decls, stack, false)?;
        element.attrs.push(Attribute { name, value });
    }
    element.ns_decls = decls;
    Ok(element)
}

/// Resolve a raw `prefix:local` name against the declarations in scope.
///
/// Unprefixed element names take the default namespace; unprefixed attribute
/// names have no namespace.
fn resolve(raw: &str, own: &[NsDecl], stack: &[Element], is_element: bool) -> Result<QName> {
    let (prefix, local) = match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    };

    if prefix.is_none() && !is_element {
        return Ok(QName::new(None, None, local));
    }
    if prefix == Some("xml") {
        return Ok(QName::new(
            Some(Cow::Borrowed(ns::XML)),
            Some("xml".to_string()),
            local,
        ));
    }

    let bound = own
        .iter()
        .chain(stack.iter().rev().flat_map(|el| el.ns_decls.iter()))
        .find(|decl| decl.prefix.as_deref() == prefix)
        .map(|decl| decl.uri.as_str());

    let uri = match (bound, prefix) {
        (Some(""), None) | (None, None) => None,
        (Some(uri), _) => Some(ns::intern(uri)),
        (None, Some(prefix)) => {
            return Err(OoxmlError::InvalidXml(format!(
                "unbound namespace prefix '{}' in <{}>",
                prefix, raw
            )));
        },
    };
    Ok(QName::new(uri, prefix.map(str::to_string), local))
}

fn push_text(stack: &mut [Element], text: &str) {
    // character data outside the root element is not part of the tree
    let Some(parent) = stack.last_mut() else {
        return;
    };
    let slot = match parent.children.last_mut() {
        Some(child) => &mut child.tail,
        None => &mut parent.text,
    };
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

fn close_element(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<()> {
    if !element.children.is_empty() {
        strip_blank(&mut element.text);
        for child in &mut element.children {
            strip_blank(&mut child.tail);
        }
    }

    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(OoxmlError::Xml(
                "document has more than one root element".to_string(),
            ));
        },
    }
    Ok(())
}

fn strip_blank(text: &mut Option<String>) {
    if text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        *text = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let root = parse_xml(xml).unwrap();
        assert!(root.is("w:document"));
        assert_eq!(root.class(), ElementClass::Document);
        assert_eq!(root.namespace_declarations().len(), 2);

        let body = root.first_child("w:body").unwrap();
        assert!(body.text().is_none());
        let t = &body.children()[0].children()[0].children()[0];
        assert!(t.is("w:t"));
        assert_eq!(t.text(), Some(" a & b "));
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_parse_default_namespace_and_foreign_prefix() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Target="x"/></Relationships>"#;
        let root = parse_xml(xml).unwrap();
        assert_eq!(
            root.namespace(),
            Some("http://schemas.openxmlformats.org/package/2006/relationships")
        );
        assert_eq!(root.class(), ElementClass::Generic);
        assert_eq!(root.children()[0].attr("Id"), Some("rId1"));

        // same namespace under another prefix still matches the fixed map
        let xml = br#"<x:p xmlns:x="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;
        let p = parse_xml(xml).unwrap();
        assert!(p.is("w:p"));
        assert_eq!(p.class(), ElementClass::P);
    }

    #[test]
    fn test_parse_keeps_mixed_content() {
        let xml = br#"<a>one<b/>two<c>three</c> </a>"#;
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.text(), Some("one"));
        assert_eq!(root.children()[0].tail(), Some("two"));
        // whitespace-only tail is dropped
        assert_eq!(root.children()[1].tail(), None);
        assert_eq!(root.text_content(), "onetwothree");
    }

    #[test]
    fn test_parse_char_refs() {
        let root = parse_xml(b"<a>&#65;&#x42;&lt;</a>").unwrap();
        assert_eq!(root.text(), Some("AB<"));
    }

    #[test]
    fn test_parse_rejects_entities_and_doctype() {
        assert!(matches!(
            parse_xml(b"<a>&custom;</a>"),
            Err(OoxmlError::InvalidXml(_))
        ));
        let xxe = br#"<?xml version="1.0"?><!DOCTYPE a [<!ENTITY x SYSTEM "file:///etc/passwd">]><a>&x;</a>"#;
        assert!(parse_xml(xxe).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_xml(b"<a><b></a>").is_err());
        assert!(parse_xml(b"").is_err());
        assert!(parse_xml(b"<w:p/>").is_err());
        assert!(parse_xml(b"<a/><b/>").is_err());
    }
}
