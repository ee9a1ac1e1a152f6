//! Numbering definitions: `w:numbering`, `w:abstractNum` and `w:num`.

use std::borrow::{Borrow, BorrowMut};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::StDecimalNumber;
use crate::ooxml::oxml::xmlchemy::{
    OneAndOnlyOne, RequiredAttribute, ZeroOrMore, ZeroOrOne, element_view, successors_of,
};

const NUMBERING_SEQ: &[&str] = &[
    "w:numPicBullet",
    "w:abstractNum",
    "w:num",
    "w:numIdMacAtCleanup",
];

// w:numbering
const ABSTRACT_NUM: ZeroOrMore =
    ZeroOrMore::new("w:abstractNum", successors_of(NUMBERING_SEQ, "w:abstractNum"));
const NUM: ZeroOrMore = ZeroOrMore::new("w:num", successors_of(NUMBERING_SEQ, "w:num"));

// w:num
const ABSTRACT_NUM_ID: OneAndOnlyOne = OneAndOnlyOne::new("w:abstractNumId");
const LVL_OVERRIDE: ZeroOrMore = ZeroOrMore::new("w:lvlOverride", &[]);

// w:lvlOverride
const START_OVERRIDE: ZeroOrOne = ZeroOrOne::new("w:startOverride", &["w:lvl"]);

const NUM_ID: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:numId");
const ABSTRACT_NUM_ID_ATTR: RequiredAttribute<StDecimalNumber> =
    RequiredAttribute::new("w:abstractNumId");
const ILVL: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:ilvl");
const NUMBER_VAL: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:val");

element_view!(
    /// `<w:numbering>`, root element of the numbering part.
    Numbering,
    ElementClass::Numbering,
    "w:numbering"
);
element_view!(
    /// `<w:num>`, a numbering instance referenced from paragraphs by `w:numId`.
    Num,
    ElementClass::Num,
    "w:num"
);
element_view!(AbstractNum, ElementClass::AbstractNum, "w:abstractNum");
element_view!(LvlOverride, ElementClass::LvlOverride, "w:lvlOverride");

impl<E: Borrow<Element>> Numbering<E> {
    pub fn nums(&self) -> impl Iterator<Item = Num<&Element>> {
        NUM.all(self.element()).map(Num::wrap)
    }

    pub fn abstract_nums(&self) -> impl Iterator<Item = AbstractNum<&Element>> {
        ABSTRACT_NUM.all(self.element()).map(AbstractNum::wrap)
    }

    /// The `w:num` child with `num_id`.
    pub fn num_having_num_id(&self, num_id: i64) -> Result<Num<&Element>> {
        for num in NUM.all(self.element()) {
            if NUM_ID.get(num)? == num_id {
                return Ok(Num::wrap(num));
            }
        }
        Err(OoxmlError::NotFound(format!(
            "no <w:num> element with numId {}",
            num_id
        )))
    }

    /// Lowest positive numId not taken by an existing `w:num`.
    pub fn next_num_id(&self) -> Result<i64> {
        let used = NUM
            .all(self.element())
            .map(|num| NUM_ID.get(num))
            .collect::<Result<Vec<i64>>>()?;
        Ok((1..)
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(1))
    }
}

impl<E: BorrowMut<Element>> Numbering<E> {
    /// Add a `w:num` instance of `abstract_num_id` under the next free numId.
    pub fn add_num(&mut self, abstract_num_id: i64) -> Result<Num<&mut Element>> {
        let num_id = self.next_num_id()?;
        let mut num = Element::new("w:num");
        NUM_ID.set(&mut num, &num_id)?;
        let abstract_num_ref = num.append(Element::new("w:abstractNumId"));
        NUMBER_VAL.set(abstract_num_ref, &abstract_num_id)?;
        Ok(Num::wrap(NUM.insert(self.element_mut(), num)))
    }

    /// Insert an abstract numbering definition ahead of every `w:num`.
    pub fn add_abstract_num(&mut self, abstract_num: Element) -> AbstractNum<&mut Element> {
        AbstractNum::wrap(ABSTRACT_NUM.insert(self.element_mut(), abstract_num))
    }

    pub fn num_having_num_id_mut(&mut self, num_id: i64) -> Result<Num<&mut Element>> {
        let parent = self.element_mut();
        let mut idx = None;
        for (i, num) in NUM.all(parent).enumerate() {
            if NUM_ID.get(num)? == num_id {
                idx = Some(i);
                break;
            }
        }
        idx.and_then(|i| NUM.nth_mut(parent, i))
            .map(Num::wrap)
            .ok_or_else(|| OoxmlError::NotFound(format!("no <w:num> element with numId {}", num_id)))
    }
}

impl<E: Borrow<Element>> Num<E> {
    pub fn num_id(&self) -> Result<i64> {
        NUM_ID.get(self.element())
    }

    pub fn abstract_num_id(&self) -> Result<i64> {
        NUMBER_VAL.get(ABSTRACT_NUM_ID.get(self.element())?)
    }

    pub fn lvl_overrides(&self) -> impl Iterator<Item = LvlOverride<&Element>> {
        LVL_OVERRIDE.all(self.element()).map(LvlOverride::wrap)
    }
}

impl<E: BorrowMut<Element>> Num<E> {
    pub fn add_lvl_override(&mut self, ilvl: i64) -> Result<LvlOverride<&mut Element>> {
        let el = LVL_OVERRIDE.add(self.element_mut());
        ILVL.set(el, &ilvl)?;
        Ok(LvlOverride::wrap(el))
    }
}

impl<E: Borrow<Element>> AbstractNum<E> {
    pub fn abstract_num_id(&self) -> Result<i64> {
        ABSTRACT_NUM_ID_ATTR.get(self.element())
    }
}

impl<E: Borrow<Element>> LvlOverride<E> {
    pub fn ilvl(&self) -> Result<i64> {
        ILVL.get(self.element())
    }

    pub fn start_override(&self) -> Result<Option<i64>> {
        START_OVERRIDE
            .get(self.element())
            .map_or(Ok(None), |el| NUMBER_VAL.get(el).map(Some))
    }
}

impl<E: BorrowMut<Element>> LvlOverride<E> {
    pub fn set_start_override(&mut self, start: i64) -> Result<()> {
        NUMBER_VAL.set(START_OVERRIDE.get_or_add(self.element_mut()), &start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::error::ErrorKind;
    use crate::ooxml::oxml::parser::parse_xml;

    fn numbering() -> Element {
        parse_xml(
            br#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
                <w:abstractNum w:abstractNumId="0"/>
                <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
                <w:num w:numId="3"><w:abstractNumId w:val="0"/></w:num>
                <w:numIdMacAtCleanup w:val="2"/>
            </w:numbering>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_num_having_num_id() {
        let root = numbering();
        let numbering = Numbering::new(&root).unwrap();
        let num = numbering.num_having_num_id(3).unwrap();
        assert_eq!(num.num_id().unwrap(), 3);
        assert_eq!(num.abstract_num_id().unwrap(), 0);

        let err = numbering.num_having_num_id(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_add_num_fills_gap_before_cleanup_marker() {
        let mut root = numbering();
        let mut numbering = Numbering::new(&mut root).unwrap();
        assert_eq!(numbering.next_num_id().unwrap(), 2);

        let mut num = numbering.add_num(0).unwrap();
        assert_eq!(num.num_id().unwrap(), 2);
        num.add_lvl_override(0).unwrap().set_start_override(5).unwrap();

        let tags: Vec<String> = numbering.element().children().iter().map(Element::tag).collect();
        assert_eq!(
            tags,
            ["w:abstractNum", "w:num", "w:num", "w:num", "w:numIdMacAtCleanup"]
        );
        assert_eq!(numbering.next_num_id().unwrap(), 4);

        let num = numbering.num_having_num_id(2).unwrap();
        let over = num.lvl_overrides().next().unwrap();
        assert_eq!(over.ilvl().unwrap(), 0);
        assert_eq!(over.start_override().unwrap(), Some(5));
    }

    #[test]
    fn test_abstract_num_goes_before_nums() {
        let mut numbering = Numbering::create();
        numbering.add_num(7).unwrap();
        let mut abstract_num = Element::new("w:abstractNum");
        abstract_num.set_attr("w:abstractNumId", "7");
        numbering.add_abstract_num(abstract_num);
        let first = numbering.abstract_nums().next().unwrap();
        assert_eq!(first.abstract_num_id().unwrap(), 7);
        assert!(numbering.element().children()[0].is("w:abstractNum"));
        assert!(numbering.num_having_num_id_mut(1).is_ok());
    }
}
