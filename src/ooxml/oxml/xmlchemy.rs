//! Declarative descriptors for element attributes and children.
//!
//! Element views declare their schema as `const` descriptors: each attribute
//! with its simple type, and each child with its cardinality and the list of
//! tags that may follow it. The descriptors provide the accessors, so every
//! view shares one implementation of lookup, creation and ordered insertion.
//!
//! Insertion keeps children in schema order: a new child goes immediately
//! before the first existing child whose tag is one of its successors, or at
//! the end when there is none.

use std::marker::PhantomData;

use log::trace;

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::simpletypes::SimpleType;

/// Insert `child` before the first existing child named in `successors`.
pub fn insert_element_before<'a>(
    parent: &'a mut Element,
    child: Element,
    successors: &[&str],
) -> &'a mut Element {
    let idx = parent
        .position_of_any(successors)
        .unwrap_or(parent.children().len());
    trace!("insert <{}> into <{}> at {}", child.tag(), parent.tag(), idx);
    parent.insert(idx, child)
}

/// Tags in `seq` after `tag`; the successor list of `tag` within a sequence.
///
/// Usable in `const` position so descriptors can be declared next to the
/// sequence they are drawn from.
pub const fn successors_of(seq: &'static [&'static str], tag: &str) -> &'static [&'static str] {
    let mut idx = 0;
    while idx < seq.len() {
        if const_str_eq(seq[idx], tag) {
            return seq.split_at(idx + 1).1;
        }
        idx += 1;
    }
    &[]
}

const fn const_str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

fn missing_child(parent: &Element, tag: &str) -> OoxmlError {
    OoxmlError::InvalidXml(format!(
        "required <{}> child element not present in <{}>",
        tag,
        parent.tag()
    ))
}

/// An attribute that must be present.
pub struct RequiredAttribute<T> {
    name: &'static str,
    _type: PhantomData<T>,
}

impl<T: SimpleType> RequiredAttribute<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub fn get(&self, element: &Element) -> Result<T::Value> {
        let raw = element.attr(self.name).ok_or_else(|| {
            OoxmlError::InvalidXml(format!(
                "required '{}' attribute not present on <{}>",
                self.name,
                element.tag()
            ))
        })?;
        T::from_xml(raw)
    }

    pub fn set(&self, element: &mut Element, value: &T::Value) -> Result<()> {
        let raw = T::to_xml(value)?;
        element.set_attr(self.name, raw);
        Ok(())
    }
}

/// An attribute that may be absent.
///
/// Reading an absent attribute gives the declared default. Writing `None` or
/// the default value removes the attribute.
pub struct OptionalAttribute<T: SimpleType> {
    name: &'static str,
    default: Option<T::Value>,
}

impl<T: SimpleType> OptionalAttribute<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    pub const fn with_default(name: &'static str, default: T::Value) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }

    pub fn get(&self, element: &Element) -> Result<Option<T::Value>> {
        match element.attr(self.name) {
            Some(raw) => T::from_xml(raw).map(Some),
            None => Ok(self.default.clone()),
        }
    }

    pub fn set(&self, element: &mut Element, value: Option<&T::Value>) -> Result<()> {
        match value {
            Some(v) if self.default.as_ref() != Some(v) => {
                let raw = T::to_xml(v)?;
                element.set_attr(self.name, raw);
            },
            _ => {
                element.remove_attr(self.name);
            },
        }
        Ok(())
    }
}

/// Exactly one child, which the schema guarantees; absence is invalid XML.
pub struct OneAndOnlyOne {
    tag: &'static str,
}

impl OneAndOnlyOne {
    pub const fn new(tag: &'static str) -> Self {
        Self { tag }
    }

    pub fn get<'a>(&self, parent: &'a Element) -> Result<&'a Element> {
        parent
            .first_child(self.tag)
            .ok_or_else(|| missing_child(parent, self.tag))
    }

    pub fn get_mut<'a>(&self, parent: &'a mut Element) -> Result<&'a mut Element> {
        match parent.children().iter().position(|c| c.is(self.tag)) {
            Some(idx) => Ok(&mut parent.children_mut()[idx]),
            None => Err(missing_child(parent, self.tag)),
        }
    }
}

/// An optional child.
pub struct ZeroOrOne {
    tag: &'static str,
    successors: &'static [&'static str],
}

impl ZeroOrOne {
    pub const fn new(tag: &'static str, successors: &'static [&'static str]) -> Self {
        Self { tag, successors }
    }

    pub fn get<'a>(&self, parent: &'a Element) -> Option<&'a Element> {
        parent.first_child(self.tag)
    }

    pub fn get_mut<'a>(&self, parent: &'a mut Element) -> Option<&'a mut Element> {
        parent.first_child_mut(self.tag)
    }

    pub fn get_or_add<'a>(&self, parent: &'a mut Element) -> &'a mut Element {
        match parent.children().iter().position(|c| c.is(self.tag)) {
            Some(idx) => &mut parent.children_mut()[idx],
            None => self.add(parent),
        }
    }

    /// Create a new child and insert it in schema order.
    pub fn add<'a>(&self, parent: &'a mut Element) -> &'a mut Element {
        self.insert(parent, Element::new(self.tag))
    }

    pub fn insert<'a>(&self, parent: &'a mut Element, child: Element) -> &'a mut Element {
        insert_element_before(parent, child, self.successors)
    }

    /// Remove every child with this tag; true if any were present.
    pub fn remove(&self, parent: &mut Element) -> bool {
        parent.remove_children_named(&[self.tag]) > 0
    }
}

/// A repeating optional child.
pub struct ZeroOrMore {
    tag: &'static str,
    successors: &'static [&'static str],
}

impl ZeroOrMore {
    pub const fn new(tag: &'static str, successors: &'static [&'static str]) -> Self {
        Self { tag, successors }
    }

    pub fn all<'a>(&self, parent: &'a Element) -> impl Iterator<Item = &'a Element> + use<'a> {
        let tag = self.tag;
        parent.children().iter().filter(move |c| c.is(tag))
    }

    pub fn all_mut<'a>(&self, parent: &'a mut Element) -> impl Iterator<Item = &'a mut Element> + use<'a> {
        let tag = self.tag;
        parent.children_mut().iter_mut().filter(move |c| c.is(tag))
    }

    pub fn count(&self, parent: &Element) -> usize {
        self.all(parent).count()
    }

    pub fn nth<'a>(&self, parent: &'a Element, n: usize) -> Option<&'a Element> {
        self.all(parent).nth(n)
    }

    pub fn nth_mut<'a>(&self, parent: &'a mut Element, n: usize) -> Option<&'a mut Element> {
        self.all_mut(parent).nth(n)
    }

    pub fn add<'a>(&self, parent: &'a mut Element) -> &'a mut Element {
        self.insert(parent, Element::new(self.tag))
    }

    pub fn insert<'a>(&self, parent: &'a mut Element, child: Element) -> &'a mut Element {
        insert_element_before(parent, child, self.successors)
    }

    pub fn remove_all(&self, parent: &mut Element) -> usize {
        parent.remove_children_named(&[self.tag])
    }
}

/// A repeating child with at least one occurrence.
pub struct OneOrMore {
    inner: ZeroOrMore,
}

impl OneOrMore {
    pub const fn new(tag: &'static str, successors: &'static [&'static str]) -> Self {
        Self {
            inner: ZeroOrMore::new(tag, successors),
        }
    }

    pub fn all<'a>(&self, parent: &'a Element) -> impl Iterator<Item = &'a Element> + use<'a> {
        self.inner.all(parent)
    }

    pub fn all_mut<'a>(&self, parent: &'a mut Element) -> impl Iterator<Item = &'a mut Element> + use<'a> {
        self.inner.all_mut(parent)
    }

    pub fn first<'a>(&self, parent: &'a Element) -> Result<&'a Element> {
        self.inner
            .all(parent)
            .next()
            .ok_or_else(|| missing_child(parent, self.inner.tag))
    }

    pub fn count(&self, parent: &Element) -> usize {
        self.inner.count(parent)
    }

    pub fn add<'a>(&self, parent: &'a mut Element) -> &'a mut Element {
        self.inner.add(parent)
    }

    pub fn insert<'a>(&self, parent: &'a mut Element, child: Element) -> &'a mut Element {
        self.inner.insert(parent, child)
    }
}

/// At most one child drawn from a set of alternatives.
pub struct ZeroOrOneChoice {
    choices: &'static [&'static str],
    successors: &'static [&'static str],
}

impl ZeroOrOneChoice {
    pub const fn new(choices: &'static [&'static str], successors: &'static [&'static str]) -> Self {
        Self {
            choices,
            successors,
        }
    }

    /// The member currently present, if any.
    pub fn get<'a>(&self, parent: &'a Element) -> Option<&'a Element> {
        parent
            .children()
            .iter()
            .find(|c| self.choices.iter().any(|t| c.is(t)))
    }

    pub fn remove(&self, parent: &mut Element) -> bool {
        parent.remove_children_named(self.choices) > 0
    }

    /// Replace whatever member is present with a new `tag` element.
    pub fn change_to<'a>(&self, parent: &'a mut Element, tag: &str) -> Result<&'a mut Element> {
        let Some(tag) = self.choices.iter().find(|t| **t == tag) else {
            return Err(OoxmlError::InvalidValue(format!(
                "<{}> is not one of the choices {:?}",
                tag, self.choices
            )));
        };
        self.remove(parent);
        Ok(insert_element_before(parent, Element::new(tag), self.successors))
    }

    /// The `tag` member, replacing any other member that is present.
    pub fn get_or_change_to<'a>(&self, parent: &'a mut Element, tag: &str) -> Result<&'a mut Element> {
        match parent.children().iter().position(|c| c.is(tag)) {
            Some(idx) if self.choices.iter().any(|t| *t == tag) => Ok(&mut parent.children_mut()[idx]),
            _ => self.change_to(parent, tag),
        }
    }
}

/// Declare a typed view over an [`Element`] of one class.
///
/// The view is generic over how it holds the element, so the same type reads
/// through `&Element` and mutates through `&mut Element`:
///
/// ```ignore
/// element_view!(Tc, ElementClass::Tc, "w:tc");
/// let cell = Tc::new(&element)?;          // read-only
/// let mut cell = Tc::new(&mut element)?;  // mutable
/// ```
macro_rules! element_view {
    ($(#[$meta:meta])* $name:ident, $class:path, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<E>(E);

        impl<E: ::std::borrow::Borrow<$crate::ooxml::oxml::element::Element>> $name<E> {
            /// Wrap `element`, which must be of this view's element class.
            pub fn new(element: E) -> $crate::ooxml::error::Result<Self> {
                let el: &$crate::ooxml::oxml::element::Element = element.borrow();
                if el.class() != $class {
                    return Err($crate::ooxml::error::OoxmlError::InvalidXml(format!(
                        "expected <{}>, got <{}>",
                        $tag,
                        el.tag()
                    )));
                }
                Ok(Self(element))
            }

            #[allow(dead_code)]
            pub(crate) fn wrap(element: E) -> Self {
                Self(element)
            }

            pub fn element(&self) -> &$crate::ooxml::oxml::element::Element {
                self.0.borrow()
            }

            pub fn into_inner(self) -> E {
                self.0
            }
        }

        impl<E: ::std::borrow::BorrowMut<$crate::ooxml::oxml::element::Element>> $name<E> {
            pub fn element_mut(&mut self) -> &mut $crate::ooxml::oxml::element::Element {
                self.0.borrow_mut()
            }
        }

        impl $name<$crate::ooxml::oxml::element::Element> {
            /// A new, empty element of this class.
            pub fn create() -> Self {
                Self($crate::ooxml::oxml::element::Element::new($tag))
            }
        }
    };
}

pub(crate) use element_view;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::simpletypes::{StOnOff, XsdInt};
    use proptest::prelude::*;

    const SEQ: &[&str] = &["w:a", "w:b", "w:c", "w:d", "w:e"];

    fn tags(el: &Element) -> Vec<String> {
        el.children().iter().map(Element::tag).collect()
    }

    #[test]
    fn test_zero_or_one_inserts_before_successors() {
        let c = ZeroOrOne::new("w:c", successors_of(SEQ, "w:c"));
        let mut parent = Element::new("w:parent");
        parent.append(Element::new("w:a"));
        parent.append(Element::new("w:e"));
        parent.append(Element::new("w:zzz"));

        assert!(c.get(&parent).is_none());
        c.get_or_add(&mut parent).set_attr("w:val", "1");
        assert_eq!(tags(&parent), ["w:a", "w:c", "w:e", "w:zzz"]);

        // second call finds the existing child
        c.get_or_add(&mut parent);
        assert_eq!(c.get(&parent).unwrap().attr("w:val"), Some("1"));
        assert!(c.remove(&mut parent));
        assert!(!c.remove(&mut parent));
        assert_eq!(tags(&parent), ["w:a", "w:e", "w:zzz"]);
    }

    #[test]
    fn test_append_when_no_successor_present() {
        let b = ZeroOrMore::new("w:b", successors_of(SEQ, "w:b"));
        let mut parent = Element::new("w:parent");
        parent.append(Element::new("w:a"));
        b.add(&mut parent);
        b.add(&mut parent);
        assert_eq!(tags(&parent), ["w:a", "w:b", "w:b"]);
        assert_eq!(b.count(&parent), 2);
        assert_eq!(b.remove_all(&mut parent), 2);
    }

    #[test]
    fn test_one_and_only_one() {
        let a = OneAndOnlyOne::new("w:a");
        let mut parent = Element::new("w:parent");
        assert!(matches!(a.get(&parent), Err(OoxmlError::InvalidXml(_))));
        parent.append(Element::new("w:a"));
        a.get_mut(&mut parent).unwrap().set_attr("w:val", "x");
        assert_eq!(a.get(&parent).unwrap().attr("w:val"), Some("x"));
    }

    #[test]
    fn test_one_or_more_first() {
        let p = OneOrMore::new("w:p", &[]);
        let mut tc = Element::new("w:tcPr");
        assert!(p.first(&tc).is_err());
        p.add(&mut tc);
        assert!(p.first(&tc).is_ok());
    }

    #[test]
    fn test_choice_group() {
        let group = ZeroOrOneChoice::new(&["w:b", "w:c"], successors_of(SEQ, "w:c"));
        let mut parent = Element::new("w:parent");
        parent.append(Element::new("w:a"));
        parent.append(Element::new("w:e"));

        group.change_to(&mut parent, "w:b").unwrap();
        assert_eq!(tags(&parent), ["w:a", "w:b", "w:e"]);
        group.get_or_change_to(&mut parent, "w:c").unwrap();
        assert_eq!(tags(&parent), ["w:a", "w:c", "w:e"]);
        assert!(group.get(&parent).unwrap().is("w:c"));
        assert!(group.change_to(&mut parent, "w:a").is_err());
        assert!(group.remove(&mut parent));
        assert!(group.get(&parent).is_none());
    }

    #[test]
    fn test_attributes() {
        const VAL: RequiredAttribute<XsdInt> = RequiredAttribute::new("w:val");
        const ON: OptionalAttribute<StOnOff> = OptionalAttribute::with_default("w:val", true);

        let mut el = Element::new("w:b");
        assert!(matches!(VAL.get(&el), Err(OoxmlError::InvalidXml(_))));
        assert_eq!(ON.get(&el).unwrap(), Some(true));

        ON.set(&mut el, Some(&false)).unwrap();
        assert_eq!(el.attr("w:val"), Some("0"));
        assert_eq!(ON.get(&el).unwrap(), Some(false));
        ON.set(&mut el, Some(&true)).unwrap();
        assert_eq!(el.attr("w:val"), None);

        VAL.set(&mut el, &12).unwrap();
        assert_eq!(VAL.get(&el).unwrap(), 12);
        assert!(VAL.set(&mut el, &(1i64 << 40)).is_err());
        el.set_attr("w:val", "twelve");
        assert!(VAL.get(&el).is_err());
    }

    proptest! {
        /// Whatever subset of a sequence is present and in whatever order
        /// descriptors are applied, the result is in sequence order.
        #[test]
        fn insertion_preserves_sequence_order(
            present in proptest::collection::vec(any::<bool>(), 5),
            order in Just((0..5usize).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let mut parent = Element::new("w:parent");
            for idx in order {
                if present[idx] {
                    ZeroOrOne::new(SEQ[idx], successors_of(SEQ, SEQ[idx])).get_or_add(&mut parent);
                }
            }
            let expected: Vec<&str> = SEQ
                .iter()
                .zip(&present)
                .filter(|(_, p)| **p)
                .map(|(t, _)| *t)
                .collect();
            prop_assert_eq!(tags(&parent), expected);
        }
    }
}
