//! Table elements: `w:tbl` and its grid, rows and cells.
//!
//! Besides the per-element accessors this module holds the cell span
//! algebra. A merge is addressed by grid position and runs over the whole
//! table, because growing a cell to the right and downward touches every row
//! the merged region covers.

use std::borrow::{Borrow, BorrowMut};

use log::debug;

use crate::ooxml::docx::enums::{
    StMerge, StTblLayoutType, StTblWidth, WdCellVerticalAlignment, WdRowHeightRule,
    WdTableAlignment,
};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::element::Element;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::{
    Enum, StDecimalNumber, StString, StTwipsMeasure, XsdInt,
};
use crate::ooxml::oxml::xmlchemy::{
    OneAndOnlyOne, OptionalAttribute, RequiredAttribute, ZeroOrMore, ZeroOrOne, ZeroOrOneChoice,
    element_view, successors_of,
};
use crate::ooxml::shared::Length;

const TBL_PR_SEQ: &[&str] = &[
    "w:tblStyle",
    "w:tblpPr",
    "w:tblOverlap",
    "w:bidiVisual",
    "w:tblStyleRowBandSize",
    "w:tblStyleColBandSize",
    "w:tblW",
    "w:jc",
    "w:tblCellSpacing",
    "w:tblInd",
    "w:tblBorders",
    "w:shd",
    "w:tblLayout",
    "w:tblCellMar",
    "w:tblLook",
    "w:tblCaption",
    "w:tblDescription",
    "w:tblPrChange",
];

const TR_PR_SEQ: &[&str] = &[
    "w:cnfStyle",
    "w:divId",
    "w:gridBefore",
    "w:gridAfter",
    "w:wBefore",
    "w:wAfter",
    "w:cantSplit",
    "w:trHeight",
    "w:tblHeader",
    "w:tblCellSpacing",
    "w:jc",
    "w:hidden",
    "w:ins",
    "w:del",
    "w:trPrChange",
];

const TC_PR_SEQ: &[&str] = &[
    "w:cnfStyle",
    "w:tcW",
    "w:gridSpan",
    "w:hMerge",
    "w:vMerge",
    "w:tcBorders",
    "w:shd",
    "w:noWrap",
    "w:tcMar",
    "w:textDirection",
    "w:tcFitText",
    "w:vAlign",
    "w:hideMark",
    "w:headers",
    "w:cellIns",
    "w:cellDel",
    "w:cellMerge",
    "w:tcPrChange",
];

/// Content a cell may hold after its properties.
const CELL_CONTENT: &[&str] = &[
    "w:customXml",
    "w:sdt",
    "w:p",
    "w:tbl",
    "w:bookmarkStart",
    "w:bookmarkEnd",
    "w:altChunk",
];

/// Children of a cell that count as its block content.
const BLOCK_ITEMS: &[&str] = &["w:p", "w:tbl", "w:sdt"];

// w:tbl
const TBL_PR: OneAndOnlyOne = OneAndOnlyOne::new("w:tblPr");
const TBL_GRID: OneAndOnlyOne = OneAndOnlyOne::new("w:tblGrid");
const TR: ZeroOrMore = ZeroOrMore::new("w:tr", &[]);

// w:tblPr
const TBL_STYLE: ZeroOrOne = ZeroOrOne::new("w:tblStyle", successors_of(TBL_PR_SEQ, "w:tblStyle"));
const TBL_W: ZeroOrOne = ZeroOrOne::new("w:tblW", successors_of(TBL_PR_SEQ, "w:tblW"));
const TBL_JC: ZeroOrOne = ZeroOrOne::new("w:jc", successors_of(TBL_PR_SEQ, "w:jc"));
const TBL_LAYOUT: ZeroOrOne =
    ZeroOrOne::new("w:tblLayout", successors_of(TBL_PR_SEQ, "w:tblLayout"));

// w:tblGrid
const GRID_COL: ZeroOrMore = ZeroOrMore::new("w:gridCol", &["w:tblGridChange"]);

// w:tr
const TR_PR: ZeroOrOne = ZeroOrOne::new("w:trPr", &["w:tc", "w:customXml", "w:sdt"]);
const TC: ZeroOrMore = ZeroOrMore::new("w:tc", &[]);

// w:trPr
const GRID_BEFORE: ZeroOrOne =
    ZeroOrOne::new("w:gridBefore", successors_of(TR_PR_SEQ, "w:gridBefore"));
const GRID_AFTER: ZeroOrOne =
    ZeroOrOne::new("w:gridAfter", successors_of(TR_PR_SEQ, "w:gridAfter"));
const TR_HEIGHT: ZeroOrOne = ZeroOrOne::new("w:trHeight", successors_of(TR_PR_SEQ, "w:trHeight"));

// w:tc
const TC_PR: ZeroOrOne = ZeroOrOne::new("w:tcPr", CELL_CONTENT);
const TC_P: ZeroOrMore = ZeroOrMore::new("w:p", &[]);

// w:tcPr
const TC_W: ZeroOrOne = ZeroOrOne::new("w:tcW", successors_of(TC_PR_SEQ, "w:tcW"));
const GRID_SPAN: ZeroOrOne = ZeroOrOne::new("w:gridSpan", successors_of(TC_PR_SEQ, "w:gridSpan"));
const V_MERGE: ZeroOrOne = ZeroOrOne::new("w:vMerge", successors_of(TC_PR_SEQ, "w:vMerge"));
const V_ALIGN: ZeroOrOne = ZeroOrOne::new("w:vAlign", successors_of(TC_PR_SEQ, "w:vAlign"));
const CELL_MARKUP: ZeroOrOneChoice =
    ZeroOrOneChoice::new(&["w:cellIns", "w:cellDel", "w:cellMerge"], &["w:tcPrChange"]);

// attributes
const STRING_VAL: RequiredAttribute<StString> = RequiredAttribute::new("w:val");
const NUMBER_VAL: RequiredAttribute<StDecimalNumber> = RequiredAttribute::new("w:val");
const WIDTH_W: OptionalAttribute<XsdInt> = OptionalAttribute::new("w:w");
// absent means dxa
const WIDTH_TYPE: OptionalAttribute<Enum<StTblWidth>> = OptionalAttribute::new("w:type");
const GRID_COL_W: OptionalAttribute<StTwipsMeasure> = OptionalAttribute::new("w:w");
const LAYOUT_TYPE: OptionalAttribute<Enum<StTblLayoutType>> = OptionalAttribute::new("w:type");
const TABLE_JC_VAL: RequiredAttribute<Enum<WdTableAlignment>> = RequiredAttribute::new("w:val");
const HEIGHT_VAL: OptionalAttribute<StTwipsMeasure> = OptionalAttribute::new("w:val");
const HEIGHT_RULE: OptionalAttribute<Enum<WdRowHeightRule>> = OptionalAttribute::new("w:hRule");
const MERGE_VAL: OptionalAttribute<Enum<StMerge>> =
    OptionalAttribute::with_default("w:val", StMerge::Continue);
const V_ALIGN_VAL: RequiredAttribute<Enum<WdCellVerticalAlignment>> =
    RequiredAttribute::new("w:val");

element_view!(
    /// `<w:tbl>`, a table.
    Tbl,
    ElementClass::Tbl,
    "w:tbl"
);
element_view!(
    /// `<w:tblPr>`, table-wide properties.
    TblPr,
    ElementClass::TblPr,
    "w:tblPr"
);
element_view!(TblGrid, ElementClass::TblGrid, "w:tblGrid");
element_view!(GridCol, ElementClass::GridCol, "w:gridCol");
element_view!(
    /// `<w:tr>`, a table row.
    Tr,
    ElementClass::Tr,
    "w:tr"
);
element_view!(TrPr, ElementClass::TrPr, "w:trPr");
element_view!(
    /// `<w:tc>`, a table cell.
    Tc,
    ElementClass::Tc,
    "w:tc"
);
element_view!(TcPr, ElementClass::TcPr, "w:tcPr");

/// A cell position in table grid coordinates.
///
/// `col` is the grid column the cell starts at, so in a row whose first cell
/// spans two columns the second cell is at `col == 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddr {
    pub row: usize,
    pub col: usize,
}

impl CellAddr {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Tbl<Element> {
    /// A new `rows` x `cols` table `width` wide, with evenly divided columns.
    ///
    /// Every cell carries an explicit width and an empty paragraph.
    pub fn new_tbl(rows: usize, cols: usize, width: Length) -> Self {
        let mut tbl = Element::new("w:tbl");

        let tbl_pr = tbl.append(Element::new("w:tblPr"));
        let tbl_w = tbl_pr.append(Element::new("w:tblW"));
        tbl_w.set_attr("w:type", StTblWidth::Auto.to_xml());
        tbl_w.set_attr("w:w", "0");
        let look = tbl_pr.append(Element::new("w:tblLook"));
        for (name, value) in [
            ("w:firstColumn", "1"),
            ("w:firstRow", "1"),
            ("w:lastColumn", "0"),
            ("w:lastRow", "0"),
            ("w:noHBand", "0"),
            ("w:noVBand", "1"),
            ("w:val", "04A0"),
        ] {
            look.set_attr(name, value);
        }

        let col_width = if cols > 0 {
            Length::from_emu(width.emu() / cols as i64)
        } else {
            Length::ZERO
        };
        let twips = col_width.twips().to_string();

        let grid = tbl.append(Element::new("w:tblGrid"));
        for _ in 0..cols {
            grid.append(Element::new("w:gridCol")).set_attr("w:w", twips.as_str());
        }

        for _ in 0..rows {
            let tr = tbl.append(Element::new("w:tr"));
            for _ in 0..cols {
                let tc = tr.append(Element::new("w:tc"));
                let tc_pr = TC_PR.add(tc);
                let tc_w = TC_W.add(tc_pr);
                tc_w.set_attr("w:type", StTblWidth::Dxa.to_xml());
                tc_w.set_attr("w:w", twips.as_str());
            }
        }
        Self::wrap(tbl)
    }
}

impl<E: Borrow<Element>> Tbl<E> {
    pub fn tbl_pr(&self) -> Result<TblPr<&Element>> {
        TBL_PR.get(self.element()).map(TblPr::wrap)
    }

    pub fn tbl_grid(&self) -> Result<TblGrid<&Element>> {
        TBL_GRID.get(self.element()).map(TblGrid::wrap)
    }

    pub fn rows(&self) -> impl Iterator<Item = Tr<&Element>> {
        TR.all(self.element()).map(Tr::wrap)
    }

    pub fn row_count(&self) -> usize {
        TR.count(self.element())
    }

    pub fn row(&self, idx: usize) -> Option<Tr<&Element>> {
        TR.nth(self.element(), idx).map(Tr::wrap)
    }

    /// Number of `w:gridCol` entries in the table grid.
    pub fn col_count(&self) -> Result<usize> {
        Ok(self.tbl_grid()?.grid_cols().count())
    }

    /// Every cell in the table, row by row.
    pub fn iter_tcs(&self) -> impl Iterator<Item = Tc<&Element>> {
        TR.all(self.element())
            .flat_map(|tr| TC.all(tr))
            .map(Tc::wrap)
    }

    /// The cell starting at `addr`.
    pub fn cell(&self, addr: CellAddr) -> Result<Tc<&Element>> {
        let tr = TR.nth(self.element(), addr.row).ok_or_else(|| no_row(addr.row))?;
        let idx = Tr::wrap(tr).tc_index_at_grid_offset(addr.col)?;
        TC.nth(tr, idx).map(Tc::wrap).ok_or_else(|| no_cell(addr.col))
    }

    pub fn style_id(&self) -> Result<Option<String>> {
        self.tbl_pr()?.style_id()
    }

    pub fn alignment(&self) -> Result<Option<WdTableAlignment>> {
        self.tbl_pr()?.alignment()
    }

    pub fn autofit(&self) -> Result<bool> {
        self.tbl_pr()?.autofit()
    }
}

impl<E: BorrowMut<Element>> Tbl<E> {
    pub fn tbl_pr_mut(&mut self) -> Result<TblPr<&mut Element>> {
        TBL_PR.get_mut(self.element_mut()).map(TblPr::wrap)
    }

    pub fn tbl_grid_mut(&mut self) -> Result<TblGrid<&mut Element>> {
        TBL_GRID.get_mut(self.element_mut()).map(TblGrid::wrap)
    }

    pub fn row_mut(&mut self, idx: usize) -> Option<Tr<&mut Element>> {
        TR.nth_mut(self.element_mut(), idx).map(Tr::wrap)
    }

    pub fn set_style_id(&mut self, style_id: Option<&str>) -> Result<()> {
        self.tbl_pr_mut()?.set_style_id(style_id)
    }

    pub fn set_alignment(&mut self, alignment: Option<WdTableAlignment>) -> Result<()> {
        self.tbl_pr_mut()?.set_alignment(alignment)
    }

    pub fn set_autofit(&mut self, autofit: bool) -> Result<()> {
        self.tbl_pr_mut()?.set_autofit(autofit)
    }

    /// Append a row with one cell per grid column, each as wide as its column.
    pub fn add_row(&mut self) -> Result<Tr<&mut Element>> {
        let widths: Vec<Option<Length>> = self
            .tbl_grid()?
            .grid_cols()
            .map(|col| col.w())
            .collect::<Result<_>>()?;

        let tr = TR.add(self.element_mut());
        for width in widths {
            let mut tc = Tc::wrap(TC.add(tr));
            if let Some(width) = width {
                tc.set_width(width)?;
            }
        }
        Ok(Tr::wrap(tr))
    }

    /// Append a grid column `width` wide and a matching cell to every row.
    pub fn add_column(&mut self, width: Length) -> Result<()> {
        self.tbl_grid_mut()?.add_grid_col(Some(width))?;
        for tr in TR.all_mut(self.element_mut()) {
            Tc::wrap(TC.add(tr)).set_width(width)?;
        }
        Ok(())
    }

    /// Merge the rectangle with corners at `a` and `b` into a single cell.
    ///
    /// The top-left cell of the rectangle absorbs the content of every other
    /// cell in it. Within each row the cells are combined into one spanning
    /// the rectangle's width; rows below the first are marked as vertical
    /// merge continuations. Returns the position of the merged cell.
    ///
    /// Fails with [`OoxmlError::InvalidSpan`] when the two cells do not bound
    /// a rectangle, for example when they share a top edge but not a bottom
    /// edge, or when existing spans cross the rectangle's boundary.
    pub fn merge(&mut self, a: CellAddr, b: CellAddr) -> Result<CellAddr> {
        let tbl = self.element_mut();
        let ea = Extent::of(tbl, a)?;
        let eb = Extent::of(tbl, b)?;
        ea.check_mergeable_with(&eb)?;

        let top = ea.top.min(eb.top);
        let left = ea.left.min(eb.left);
        let height = ea.bottom.max(eb.bottom) - top;
        let width = ea.right.max(eb.right) - left;
        check_no_straddling(tbl, top, top + height, left, left + width)?;
        debug!(
            "merge cells {:?} and {:?}: {}x{} at row {}, col {}",
            a, b, height, width, top, left
        );

        // a failed merge leaves the table as it was
        let backup = tbl.clone();
        if let Err(err) = grow_to(tbl, top, left, width, height) {
            *tbl = backup;
            return Err(err);
        }
        Ok(CellAddr::new(top, left))
    }
}

impl<E: Borrow<Element>> TblPr<E> {
    pub fn style_id(&self) -> Result<Option<String>> {
        TBL_STYLE
            .get(self.element())
            .map(|el| STRING_VAL.get(el))
            .transpose()
    }

    pub fn alignment(&self) -> Result<Option<WdTableAlignment>> {
        TBL_JC
            .get(self.element())
            .map(|el| TABLE_JC_VAL.get(el))
            .transpose()
    }

    /// False only when the layout is explicitly fixed.
    pub fn autofit(&self) -> Result<bool> {
        match TBL_LAYOUT.get(self.element()) {
            Some(layout) => Ok(LAYOUT_TYPE.get(layout)? != Some(StTblLayoutType::Fixed)),
            None => Ok(true),
        }
    }

    /// Preferred table width, when given in twips.
    pub fn width(&self) -> Result<Option<Length>> {
        TBL_W.get(self.element()).map_or(Ok(None), dxa_width)
    }
}

impl<E: BorrowMut<Element>> TblPr<E> {
    pub fn set_style_id(&mut self, style_id: Option<&str>) -> Result<()> {
        let tbl_pr = self.element_mut();
        match style_id {
            Some(id) => STRING_VAL.set(TBL_STYLE.get_or_add(tbl_pr), &id.to_string()),
            None => {
                TBL_STYLE.remove(tbl_pr);
                Ok(())
            },
        }
    }

    pub fn set_alignment(&mut self, alignment: Option<WdTableAlignment>) -> Result<()> {
        let tbl_pr = self.element_mut();
        TBL_JC.remove(tbl_pr);
        match alignment {
            Some(alignment) => TABLE_JC_VAL.set(TBL_JC.add(tbl_pr), &alignment),
            None => Ok(()),
        }
    }

    pub fn set_autofit(&mut self, autofit: bool) -> Result<()> {
        let layout = TBL_LAYOUT.get_or_add(self.element_mut());
        let kind = if autofit {
            StTblLayoutType::Autofit
        } else {
            StTblLayoutType::Fixed
        };
        LAYOUT_TYPE.set(layout, Some(&kind))
    }
}

impl<E: Borrow<Element>> TblGrid<E> {
    pub fn grid_cols(&self) -> impl Iterator<Item = GridCol<&Element>> {
        GRID_COL.all(self.element()).map(GridCol::wrap)
    }
}

impl<E: BorrowMut<Element>> TblGrid<E> {
    pub fn add_grid_col(&mut self, width: Option<Length>) -> Result<GridCol<&mut Element>> {
        let mut col = GridCol::wrap(GRID_COL.add(self.element_mut()));
        col.set_w(width)?;
        Ok(col)
    }
}

impl<E: Borrow<Element>> GridCol<E> {
    pub fn w(&self) -> Result<Option<Length>> {
        GRID_COL_W.get(self.element())
    }
}

impl<E: BorrowMut<Element>> GridCol<E> {
    pub fn set_w(&mut self, width: Option<Length>) -> Result<()> {
        GRID_COL_W.set(self.element_mut(), width.as_ref())
    }
}

impl<E: Borrow<Element>> Tr<E> {
    pub fn tr_pr(&self) -> Option<TrPr<&Element>> {
        TR_PR.get(self.element()).map(TrPr::wrap)
    }

    pub fn tcs(&self) -> impl Iterator<Item = Tc<&Element>> {
        TC.all(self.element()).map(Tc::wrap)
    }

    pub fn tc_count(&self) -> usize {
        TC.count(self.element())
    }

    pub fn tc(&self, idx: usize) -> Option<Tc<&Element>> {
        TC.nth(self.element(), idx).map(Tc::wrap)
    }

    /// Grid columns skipped before the first cell.
    pub fn grid_before(&self) -> Result<usize> {
        self.tr_pr().map_or(Ok(0), |pr| pr.grid_before())
    }

    /// Grid columns left empty after the last cell.
    pub fn grid_after(&self) -> Result<usize> {
        self.tr_pr().map_or(Ok(0), |pr| pr.grid_after())
    }

    pub fn height(&self) -> Result<Option<Length>> {
        self.tr_pr().map_or(Ok(None), |pr| pr.height())
    }

    pub fn height_rule(&self) -> Result<Option<WdRowHeightRule>> {
        self.tr_pr().map_or(Ok(None), |pr| pr.height_rule())
    }

    /// Grid column the `idx`-th cell starts at.
    pub fn grid_offset(&self, idx: usize) -> Result<usize> {
        let mut offset = self.grid_before()?;
        for tc in self.tcs().take(idx) {
            offset += tc.grid_span()?;
        }
        Ok(offset)
    }

    /// The cell that starts exactly at grid column `grid_offset`.
    pub fn tc_at_grid_offset(&self, grid_offset: usize) -> Result<Tc<&Element>> {
        let idx = self.tc_index_at_grid_offset(grid_offset)?;
        self.tc(idx).ok_or_else(|| no_cell(grid_offset))
    }

    /// Index among this row's cells of the cell starting at `grid_offset`.
    pub fn tc_index_at_grid_offset(&self, grid_offset: usize) -> Result<usize> {
        let mut offset = self.grid_before()?;
        for (idx, tc) in self.tcs().enumerate() {
            if offset == grid_offset {
                return Ok(idx);
            }
            if offset > grid_offset {
                break;
            }
            offset += tc.grid_span()?;
        }
        Err(no_cell(grid_offset))
    }
}

impl<E: BorrowMut<Element>> Tr<E> {
    pub fn get_or_add_tr_pr(&mut self) -> TrPr<&mut Element> {
        TrPr::wrap(TR_PR.get_or_add(self.element_mut()))
    }

    pub fn tc_mut(&mut self, idx: usize) -> Option<Tc<&mut Element>> {
        TC.nth_mut(self.element_mut(), idx).map(Tc::wrap)
    }

    pub fn add_tc(&mut self) -> Tc<&mut Element> {
        Tc::wrap(TC.add(self.element_mut()))
    }

    pub fn set_grid_before(&mut self, value: usize) -> Result<()> {
        self.get_or_add_tr_pr().set_grid_before(value)
    }

    pub fn set_grid_after(&mut self, value: usize) -> Result<()> {
        self.get_or_add_tr_pr().set_grid_after(value)
    }

    pub fn set_height(&mut self, height: Option<Length>) -> Result<()> {
        if height.is_none() && self.tr_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_tr_pr().set_height(height)
    }

    pub fn set_height_rule(&mut self, rule: Option<WdRowHeightRule>) -> Result<()> {
        if rule.is_none() && self.tr_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_tr_pr().set_height_rule(rule)
    }
}

impl<E: Borrow<Element>> TrPr<E> {
    pub fn grid_before(&self) -> Result<usize> {
        grid_count(GRID_BEFORE.get(self.element()))
    }

    pub fn grid_after(&self) -> Result<usize> {
        grid_count(GRID_AFTER.get(self.element()))
    }

    pub fn height(&self) -> Result<Option<Length>> {
        TR_HEIGHT
            .get(self.element())
            .map_or(Ok(None), |h| HEIGHT_VAL.get(h))
    }

    pub fn height_rule(&self) -> Result<Option<WdRowHeightRule>> {
        TR_HEIGHT
            .get(self.element())
            .map_or(Ok(None), |h| HEIGHT_RULE.get(h))
    }
}

impl<E: BorrowMut<Element>> TrPr<E> {
    pub fn set_grid_before(&mut self, value: usize) -> Result<()> {
        set_grid_count(self.element_mut(), &GRID_BEFORE, value)
    }

    pub fn set_grid_after(&mut self, value: usize) -> Result<()> {
        set_grid_count(self.element_mut(), &GRID_AFTER, value)
    }

    pub fn set_height(&mut self, height: Option<Length>) -> Result<()> {
        let tr_pr = self.element_mut();
        if height.is_none() && TR_HEIGHT.get(tr_pr).is_none() {
            return Ok(());
        }
        HEIGHT_VAL.set(TR_HEIGHT.get_or_add(tr_pr), height.as_ref())
    }

    pub fn set_height_rule(&mut self, rule: Option<WdRowHeightRule>) -> Result<()> {
        let tr_pr = self.element_mut();
        if rule.is_none() && TR_HEIGHT.get(tr_pr).is_none() {
            return Ok(());
        }
        HEIGHT_RULE.set(TR_HEIGHT.get_or_add(tr_pr), rule.as_ref())
    }
}

fn grid_count(el: Option<&Element>) -> Result<usize> {
    let Some(el) = el else {
        return Ok(0);
    };
    let value = NUMBER_VAL.get(el)?;
    usize::try_from(value)
        .map_err(|_| OoxmlError::InvalidXml(format!("negative <{}> value {}", el.tag(), value)))
}

fn set_grid_count(tr_pr: &mut Element, child: &ZeroOrOne, value: usize) -> Result<()> {
    child.remove(tr_pr);
    if value > 0 {
        let value = i64::try_from(value)
            .map_err(|_| OoxmlError::InvalidValue(format!("grid count {} too large", value)))?;
        NUMBER_VAL.set(child.add(tr_pr), &value)?;
    }
    Ok(())
}

impl<E: Borrow<Element>> Tc<E> {
    pub fn tc_pr(&self) -> Option<TcPr<&Element>> {
        TC_PR.get(self.element()).map(TcPr::wrap)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Element> {
        TC_P.all(self.element())
    }

    /// The block-level children: paragraphs, nested tables and content controls.
    pub fn block_items(&self) -> impl Iterator<Item = &Element> {
        self.element()
            .children()
            .iter()
            .filter(|c| BLOCK_ITEMS.iter().any(|t| c.is(t)))
    }

    /// Number of grid columns this cell spans, 1 unless `w:gridSpan` says otherwise.
    pub fn grid_span(&self) -> Result<usize> {
        self.tc_pr().map_or(Ok(1), |pr| pr.grid_span())
    }

    pub fn vmerge(&self) -> Result<Option<StMerge>> {
        self.tc_pr().map_or(Ok(None), |pr| pr.vmerge())
    }

    /// Cell width, when given in twips.
    pub fn width(&self) -> Result<Option<Length>> {
        self.tc_pr().map_or(Ok(None), |pr| pr.width())
    }

    pub fn vertical_alignment(&self) -> Result<Option<WdCellVerticalAlignment>> {
        self.tc_pr().map_or(Ok(None), |pr| pr.vertical_alignment())
    }

    /// True when the cell holds a single paragraph with no runs.
    pub fn is_empty(&self) -> bool {
        let mut blocks = self.block_items();
        match (blocks.next(), blocks.next()) {
            (Some(only), None) => only.is("w:p") && only.first_child("w:r").is_none(),
            _ => false,
        }
    }

    /// Character content of every paragraph, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Element::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<E: BorrowMut<Element>> Tc<E> {
    pub fn get_or_add_tc_pr(&mut self) -> TcPr<&mut Element> {
        TcPr::wrap(TC_PR.get_or_add(self.element_mut()))
    }

    pub fn set_grid_span(&mut self, span: usize) -> Result<()> {
        self.get_or_add_tc_pr().set_grid_span(span)
    }

    pub fn set_vmerge(&mut self, value: Option<StMerge>) -> Result<()> {
        if value.is_none() && self.tc_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_tc_pr().set_vmerge(value)
    }

    pub fn set_width(&mut self, width: Length) -> Result<()> {
        self.get_or_add_tc_pr().set_width(width)
    }

    pub fn set_vertical_alignment(&mut self, value: Option<WdCellVerticalAlignment>) -> Result<()> {
        if value.is_none() && self.tc_pr().is_none() {
            return Ok(());
        }
        self.get_or_add_tc_pr().set_vertical_alignment(value)
    }

    pub fn add_p(&mut self) -> &mut Element {
        TC_P.add(self.element_mut())
    }

    /// Remove all content but the cell properties. The cell is left without
    /// a paragraph, so the caller must add one before saving.
    pub fn clear_content(&mut self) {
        self.element_mut()
            .children_mut()
            .retain(|c| c.is("w:tcPr"));
    }
}

impl<E: Borrow<Element>> TcPr<E> {
    pub fn grid_span(&self) -> Result<usize> {
        let Some(el) = GRID_SPAN.get(self.element()) else {
            return Ok(1);
        };
        let span = NUMBER_VAL.get(el)?;
        usize::try_from(span)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| OoxmlError::InvalidXml(format!("gridSpan must be positive, got {}", span)))
    }

    /// The vertical merge state; an empty `<w:vMerge/>` reads as `Continue`.
    pub fn vmerge(&self) -> Result<Option<StMerge>> {
        V_MERGE
            .get(self.element())
            .map_or(Ok(None), |el| MERGE_VAL.get(el))
    }

    pub fn width(&self) -> Result<Option<Length>> {
        TC_W.get(self.element()).map_or(Ok(None), dxa_width)
    }

    pub fn vertical_alignment(&self) -> Result<Option<WdCellVerticalAlignment>> {
        V_ALIGN
            .get(self.element())
            .map(|el| V_ALIGN_VAL.get(el))
            .transpose()
    }

    /// Tag of the revision mark on this cell, if any.
    pub fn cell_markup(&self) -> Option<String> {
        CELL_MARKUP.get(self.element()).map(Element::tag)
    }
}

impl<E: BorrowMut<Element>> TcPr<E> {
    /// Set the span; a span of 1 removes `w:gridSpan`.
    pub fn set_grid_span(&mut self, span: usize) -> Result<()> {
        let tc_pr = self.element_mut();
        GRID_SPAN.remove(tc_pr);
        if span > 1 {
            let span = i64::try_from(span)
                .map_err(|_| OoxmlError::InvalidValue(format!("grid span {} too large", span)))?;
            NUMBER_VAL.set(GRID_SPAN.add(tc_pr), &span)?;
        }
        Ok(())
    }

    pub fn set_vmerge(&mut self, value: Option<StMerge>) -> Result<()> {
        let tc_pr = self.element_mut();
        V_MERGE.remove(tc_pr);
        match value {
            Some(value) => MERGE_VAL.set(V_MERGE.add(tc_pr), Some(&value)),
            None => Ok(()),
        }
    }

    pub fn set_width(&mut self, width: Length) -> Result<()> {
        let tc_w = TC_W.get_or_add(self.element_mut());
        WIDTH_TYPE.set(tc_w, Some(&StTblWidth::Dxa))?;
        WIDTH_W.set(tc_w, Some(&width.twips()))
    }

    pub fn set_vertical_alignment(&mut self, value: Option<WdCellVerticalAlignment>) -> Result<()> {
        let tc_pr = self.element_mut();
        V_ALIGN.remove(tc_pr);
        match value {
            Some(value) => V_ALIGN_VAL.set(V_ALIGN.add(tc_pr), &value),
            None => Ok(()),
        }
    }

    /// Replace any revision mark with a new `tag` element, one of
    /// `w:cellIns`, `w:cellDel` or `w:cellMerge`.
    pub fn set_cell_markup(&mut self, tag: Option<&str>) -> Result<()> {
        match tag {
            Some(tag) => CELL_MARKUP.change_to(self.element_mut(), tag).map(|_| ()),
            None => {
                CELL_MARKUP.remove(self.element_mut());
                Ok(())
            },
        }
    }
}

fn dxa_width(el: &Element) -> Result<Option<Length>> {
    if WIDTH_TYPE.get(el)?.is_some_and(|ty| ty != StTblWidth::Dxa) {
        return Ok(None);
    }
    Ok(WIDTH_W.get(el)?.map(Length::from_twips))
}

fn no_row(row: usize) -> OoxmlError {
    OoxmlError::InvalidSpan(format!("no row {} in table", row))
}

fn no_cell(grid_offset: usize) -> OoxmlError {
    OoxmlError::InvalidSpan(format!("no cell at grid offset {}", grid_offset))
}

// ---- span algebra ----
//
// Cells are addressed by (row index, index within the row's w:tc children)
// so that several rows can be visited while the table is mutably borrowed.

fn tr_at(tbl: &Element, row: usize) -> Result<Tr<&Element>> {
    TR.nth(tbl, row).map(Tr::wrap).ok_or_else(|| no_row(row))
}

fn tc_at(tbl: &Element, row: usize, idx: usize) -> Result<Tc<&Element>> {
    let tr = TR.nth(tbl, row).ok_or_else(|| no_row(row))?;
    TC.nth(tr, idx)
        .map(Tc::wrap)
        .ok_or_else(|| OoxmlError::InvalidSpan(format!("no cell {} in row {}", idx, row)))
}

fn tc_at_mut(tbl: &mut Element, row: usize, idx: usize) -> Result<&mut Element> {
    let tr = TR.nth_mut(tbl, row).ok_or_else(|| no_row(row))?;
    TC.nth_mut(tr, idx)
        .ok_or_else(|| OoxmlError::InvalidSpan(format!("no cell {} in row {}", idx, row)))
}

/// Grid extent of a cell including its vertical merge, bottom and right exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
}

impl Extent {
    fn of(tbl: &Element, addr: CellAddr) -> Result<Self> {
        let tr = tr_at(tbl, addr.row)?;
        let idx = tr.tc_index_at_grid_offset(addr.col)?;
        let span = tc_at(tbl, addr.row, idx)?.grid_span()?;
        Ok(Self {
            top: top_row(tbl, addr.row, addr.col)?,
            bottom: bottom_row(tbl, addr.row, addr.col)?,
            left: addr.col,
            right: addr.col + span,
        })
    }

    fn check_mergeable_with(&self, other: &Extent) -> Result<()> {
        let not_rectangular = || OoxmlError::InvalidSpan("requested span not rectangular".into());

        // inverted L
        if self.top == other.top && self.bottom != other.bottom {
            return Err(not_rectangular());
        }
        if self.left == other.left && self.right != other.right {
            return Err(not_rectangular());
        }

        // tee: one extent strictly contains the other on one axis
        let (upper, lower) = if self.top < other.top { (self, other) } else { (other, self) };
        if upper.top < lower.top && upper.bottom > lower.bottom {
            return Err(not_rectangular());
        }
        let (leftmost, rightmost) = if self.left < other.left { (self, other) } else { (other, self) };
        if leftmost.left < rightmost.left && leftmost.right > rightmost.right {
            return Err(not_rectangular());
        }

        // diagonal corners of different shapes leave a notch at one corner
        let rows_apart = self.bottom <= other.top || other.bottom <= self.top;
        let cols_apart = self.right <= other.left || other.right <= self.left;
        if rows_apart && cols_apart && (self.width() != other.width() || self.height() != other.height()) {
            return Err(not_rectangular());
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.right - self.left
    }

    fn height(&self) -> usize {
        self.bottom - self.top
    }
}

/// Fail when a cell in rows `top..bottom` sticks out of the columns
/// `left..right`, or a vertical merge in them runs past those rows.
fn check_no_straddling(tbl: &Element, top: usize, bottom: usize, left: usize, right: usize) -> Result<()> {
    let not_rectangular = || OoxmlError::InvalidSpan("span is not rectangular".into());
    for row in top..bottom {
        let tr = tr_at(tbl, row)?;
        let mut start = tr.grid_before()?;
        for tc in tr.tcs() {
            let end = start + tc.grid_span()?;
            let inside = start < right && end > left;
            if inside && (start < left || end > right) {
                return Err(not_rectangular());
            }
            if inside
                && tc.vmerge()?.is_some()
                && (top_row(tbl, row, start)? < top || bottom_row(tbl, row, start)? > bottom)
            {
                return Err(not_rectangular());
            }
            start = end;
        }
    }
    Ok(())
}

/// Row of the first cell in the vertical merge containing the cell at
/// (`row`, `col`).
fn top_row(tbl: &Element, mut row: usize, col: usize) -> Result<usize> {
    loop {
        let tr = tr_at(tbl, row)?;
        let vmerge = tr.tc_at_grid_offset(col)?.vmerge()?;
        if vmerge != Some(StMerge::Continue) || row == 0 {
            return Ok(row);
        }
        row -= 1;
    }
}

/// One past the last row of the vertical merge starting at or passing
/// through (`row`, `col`).
fn bottom_row(tbl: &Element, mut row: usize, col: usize) -> Result<usize> {
    loop {
        let vmerge = tr_at(tbl, row)?.tc_at_grid_offset(col)?.vmerge()?;
        if vmerge.is_none() {
            return Ok(row + 1);
        }
        let below = match TR.nth(tbl, row + 1) {
            Some(tr) => match Tr::wrap(tr).tc_at_grid_offset(col) {
                Ok(tc) => tc.vmerge()?,
                Err(_) => None,
            },
            None => None,
        };
        if below != Some(StMerge::Continue) {
            return Ok(row + 1);
        }
        row += 1;
    }
}

/// Grow the cell at (`top`, `left`) into a `width` x `height` merged cell.
fn grow_to(tbl: &mut Element, top: usize, left: usize, width: usize, height: usize) -> Result<()> {
    let top_idx = tr_at(tbl, top)?.tc_index_at_grid_offset(left)?;
    for offset in 0..height {
        let row = top + offset;
        let idx = if offset == 0 {
            top_idx
        } else {
            tr_at(tbl, row)?.tc_index_at_grid_offset(left)?
        };
        let vmerge = match (offset, height) {
            (0, 1) => None,
            (0, _) => Some(StMerge::Restart),
            _ => Some(StMerge::Continue),
        };
        span_to_width(tbl, (row, idx), (top, top_idx), width, vmerge)?;
    }
    Ok(())
}

/// Widen the cell at `cell` to `width` grid columns by absorbing the cells
/// to its right, moving all content into the merge's top-left cell.
fn span_to_width(
    tbl: &mut Element,
    cell: (usize, usize),
    top_cell: (usize, usize),
    width: usize,
    vmerge: Option<StMerge>,
) -> Result<()> {
    let (row, idx) = cell;
    move_content(tbl, cell, top_cell)?;
    loop {
        let span = tc_at(tbl, row, idx)?.grid_span()?;
        if span >= width {
            break;
        }
        let next = tr_at(tbl, row)?.tc(idx + 1).map(|tc| tc.grid_span()).transpose()?;
        let next_span = next.ok_or_else(|| OoxmlError::InvalidSpan("not enough grid columns".into()))?;
        if span + next_span > width {
            return Err(OoxmlError::InvalidSpan("span is not rectangular".into()));
        }

        move_content(tbl, (row, idx + 1), top_cell)?;
        let next_width = tc_at(tbl, row, idx + 1)?.width()?;
        let tc = tc_at_mut(tbl, row, idx)?;
        let mut tc = Tc::wrap(tc);
        if let (Some(w), Some(next_w)) = (tc.width()?, next_width) {
            tc.set_width(w + next_w)?;
        }
        tc.set_grid_span(span + next_span)?;

        let tr = TR.nth_mut(tbl, row).ok_or_else(|| no_row(row))?;
        let pos = tr
            .children()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is("w:tc"))
            .nth(idx + 1)
            .map(|(pos, _)| pos);
        if let Some(pos) = pos {
            tr.remove(pos);
        }
    }
    Tc::wrap(tc_at_mut(tbl, row, idx)?).set_vmerge(vmerge)
}

/// Move the block content of `from` to the end of `to`, leaving `from` with
/// a single empty paragraph. Empty cells are left alone.
fn move_content(tbl: &mut Element, from: (usize, usize), to: (usize, usize)) -> Result<()> {
    if from == to || tc_at(tbl, from.0, from.1)?.is_empty() {
        return Ok(());
    }

    let source = tc_at_mut(tbl, from.0, from.1)?;
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos < source.children().len() {
        if BLOCK_ITEMS.iter().any(|t| source.children()[pos].is(t)) {
            if let Some(block) = source.remove(pos) {
                blocks.push(block);
            }
        } else {
            pos += 1;
        }
    }
    source.append(Element::new("w:p"));

    let target = tc_at_mut(tbl, to.0, to.1)?;
    remove_trailing_empty_p(target);
    for block in blocks {
        target.append(block);
    }
    Ok(())
}

fn remove_trailing_empty_p(tc: &mut Element) {
    let last = tc
        .children()
        .iter()
        .rposition(|c| BLOCK_ITEMS.iter().any(|t| c.is(t)));
    if let Some(pos) = last {
        let block = &tc.children()[pos];
        if block.is("w:p") && block.first_child("w:r").is_none() {
            tc.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::error::ErrorKind;
    use crate::ooxml::oxml::parser::parse_xml;
    use crate::ooxml::oxml::serialize::to_xml_string;

    fn table(rows: usize, cols: usize) -> Tbl<Element> {
        Tbl::new_tbl(rows, cols, Length::from_inches(6.0))
    }

    fn spans(tbl: &Tbl<Element>) -> Vec<Vec<usize>> {
        tbl.rows()
            .map(|tr| tr.tcs().map(|tc| tc.grid_span().unwrap()).collect())
            .collect()
    }

    fn set_text(tbl: &mut Tbl<Element>, row: usize, idx: usize, text: &str) {
        let mut tr = tbl.row_mut(row).unwrap();
        let mut tc = tr.tc_mut(idx).unwrap();
        let p = tc.element_mut().first_child_mut("w:p").unwrap();
        let r = p.append(Element::new("w:r"));
        r.append(Element::new("w:t")).set_text(Some(text.to_string()));
    }

    #[test]
    fn test_new_table_layout() {
        let tbl = table(2, 3);
        assert_eq!(tbl.row_count(), 2);
        assert_eq!(tbl.col_count().unwrap(), 3);
        assert_eq!(tbl.iter_tcs().count(), 6);

        let widths: Vec<_> = tbl
            .tbl_grid()
            .unwrap()
            .grid_cols()
            .map(|c| c.w().unwrap())
            .collect();
        assert_eq!(widths, vec![Some(Length::from_twips(2880)); 3]);

        let tc = tbl.cell(CellAddr::new(1, 2)).unwrap();
        assert_eq!(tc.width().unwrap(), Some(Length::from_twips(2880)));
        assert!(tc.is_empty());
        assert!(tbl.autofit().unwrap());

        let xml = to_xml_string(tbl.element());
        assert!(xml.contains(r#"<w:tblW w:type="auto" w:w="0"/>"#), "{}", xml);
        assert!(xml.contains(r#"w:val="04A0""#));
    }

    #[test]
    fn test_table_properties() {
        let mut tbl = table(1, 1);
        tbl.set_style_id(Some("TableGrid")).unwrap();
        tbl.set_alignment(Some(WdTableAlignment::Center)).unwrap();
        tbl.set_autofit(false).unwrap();
        assert_eq!(tbl.style_id().unwrap().as_deref(), Some("TableGrid"));
        assert_eq!(tbl.alignment().unwrap(), Some(WdTableAlignment::Center));
        assert!(!tbl.autofit().unwrap());

        let tags: Vec<String> = tbl
            .tbl_pr()
            .unwrap()
            .element()
            .children()
            .iter()
            .map(Element::tag)
            .collect();
        assert_eq!(tags, ["w:tblStyle", "w:tblW", "w:jc", "w:tblLayout", "w:tblLook"]);

        tbl.set_style_id(None).unwrap();
        assert_eq!(tbl.style_id().unwrap(), None);
    }

    #[test]
    fn test_add_row_and_column() {
        let mut tbl = table(1, 2);
        tbl.add_row().unwrap();
        assert_eq!(tbl.row_count(), 2);
        assert_eq!(tbl.row(1).unwrap().tc_count(), 2);

        tbl.add_column(Length::from_twips(720)).unwrap();
        assert_eq!(tbl.col_count().unwrap(), 3);
        for tr in tbl.rows() {
            assert_eq!(tr.tc_count(), 3);
            assert_eq!(tr.tc(2).unwrap().width().unwrap(), Some(Length::from_twips(720)));
        }
    }

    #[test]
    fn test_grid_offset_honors_grid_before() {
        let xml = format!(
            r#"<w:tbl {}><w:tblPr/><w:tblGrid/><w:tr><w:trPr><w:gridBefore w:val="1"/></w:trPr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>"#,
            crate::ooxml::oxml::ns::nsdecls(&["w"])
        );
        let el = parse_xml(xml.as_bytes()).unwrap();
        let tbl = Tbl::new(&el).unwrap();
        let tr = tbl.row(0).unwrap();
        assert_eq!(tr.grid_before().unwrap(), 1);
        assert_eq!(tr.grid_offset(1).unwrap(), 3);
        assert_eq!(tr.tc_index_at_grid_offset(1).unwrap(), 0);
        assert_eq!(tr.tc_index_at_grid_offset(3).unwrap(), 1);
        assert!(tr.tc_at_grid_offset(0).is_err());
        assert!(tr.tc_at_grid_offset(2).is_err());
    }

    #[test]
    fn test_width_without_type_is_dxa() {
        let xml = format!(
            r#"<w:tbl {}><w:tblPr/><w:tblGrid><w:gridCol w:w="2000"/><w:gridCol w:w="3000"/></w:tblGrid><w:tr><w:tc><w:tcPr><w:tcW w:w="2000"/></w:tcPr><w:p/></w:tc><w:tc><w:tcPr><w:tcW w:w="3000"/></w:tcPr><w:p/></w:tc></w:tr></w:tbl>"#,
            crate::ooxml::oxml::ns::nsdecls(&["w"])
        );
        let mut el = parse_xml(xml.as_bytes()).unwrap();
        let mut tbl = Tbl::new(&mut el).unwrap();
        assert_eq!(
            tbl.cell(CellAddr::new(0, 0)).unwrap().width().unwrap(),
            Some(Length::from_twips(2000))
        );

        tbl.merge(CellAddr::new(0, 0), CellAddr::new(0, 1)).unwrap();
        let merged = tbl.cell(CellAddr::new(0, 0)).unwrap();
        assert_eq!(merged.grid_span().unwrap(), 2);
        assert_eq!(merged.width().unwrap(), Some(Length::from_twips(5000)));
    }

    #[test]
    fn test_width_in_other_units_is_not_a_length() {
        let mut tc = Tc::create();
        tc.set_width(Length::from_twips(100)).unwrap();
        let tc_w = tc.element_mut().first_child_mut("w:tcPr").unwrap().first_child_mut("w:tcW").unwrap();
        tc_w.set_attr("w:type", "pct".to_string());
        assert_eq!(tc.width().unwrap(), None);
        tc.element_mut()
            .first_child_mut("w:tcPr")
            .unwrap()
            .first_child_mut("w:tcW")
            .unwrap()
            .remove_attr("w:w");
        assert_eq!(tc.width().unwrap(), None);
    }

    #[test]
    fn test_merge_two_by_two_in_uniform_grid() {
        let mut tbl = table(3, 3);
        let merged = tbl.merge(CellAddr::new(0, 0), CellAddr::new(1, 1)).unwrap();
        assert_eq!(merged, CellAddr::new(0, 0));
        assert_eq!(spans(&tbl), vec![vec![2, 1], vec![2, 1], vec![1, 1, 1]]);

        let top = tbl.cell(CellAddr::new(0, 0)).unwrap();
        assert_eq!(top.vmerge().unwrap(), Some(StMerge::Restart));
        assert_eq!(top.width().unwrap(), Some(Length::from_twips(5760)));

        let below = tbl.cell(CellAddr::new(1, 0)).unwrap();
        assert_eq!(below.grid_span().unwrap(), 2);
        assert_eq!(below.vmerge().unwrap(), Some(StMerge::Continue));
        // continuation is written as a bare <w:vMerge/>
        let tc_pr = below.tc_pr().unwrap();
        let v_merge = tc_pr.element().first_child("w:vMerge").unwrap();
        assert_eq!(v_merge.attr("w:val"), None);

        assert_eq!(tbl.cell(CellAddr::new(2, 0)).unwrap().vmerge().unwrap(), None);
    }

    #[test]
    fn test_merge_single_row_has_no_vmerge() {
        let mut tbl = table(2, 3);
        tbl.merge(CellAddr::new(0, 2), CellAddr::new(0, 1)).unwrap();
        assert_eq!(spans(&tbl), vec![vec![1, 2], vec![1, 1, 1]]);
        let merged = tbl.cell(CellAddr::new(0, 1)).unwrap();
        assert_eq!(merged.vmerge().unwrap(), None);
        assert!(merged.tc_pr().unwrap().element().first_child("w:vMerge").is_none());
    }

    #[test]
    fn test_merge_moves_content_into_top_left() {
        let mut tbl = table(2, 2);
        set_text(&mut tbl, 0, 0, "a");
        set_text(&mut tbl, 0, 1, "b");
        set_text(&mut tbl, 1, 1, "d");
        tbl.merge(CellAddr::new(1, 1), CellAddr::new(0, 0)).unwrap();

        let top = tbl.cell(CellAddr::new(0, 0)).unwrap();
        assert_eq!(top.text(), "a\nb\nd");
        assert!(tbl.cell(CellAddr::new(1, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_merge_empty_target_drops_its_empty_paragraph() {
        let mut tbl = table(1, 2);
        set_text(&mut tbl, 0, 1, "x");
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(0, 1)).unwrap();
        let top = tbl.cell(CellAddr::new(0, 0)).unwrap();
        assert_eq!(top.paragraphs().count(), 1);
        assert_eq!(top.text(), "x");
    }

    #[test]
    fn test_merge_rejects_inverted_l() {
        // row 0: a cell two columns wide, then one; row 1: three single cells
        let mut tbl = table(2, 3);
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(0, 1)).unwrap();

        let err = tbl.merge(CellAddr::new(1, 0), CellAddr::new(0, 0)).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidSpan(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        // table untouched
        assert_eq!(spans(&tbl), vec![vec![2, 1], vec![1, 1, 1]]);
    }

    #[test]
    fn test_merge_rejects_tee() {
        let mut tbl = table(3, 3);
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(2, 0)).unwrap();
        // the three-row cell strictly contains row 1 of column 1
        let err = tbl.merge(CellAddr::new(0, 0), CellAddr::new(1, 1)).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidSpan(_)));
    }

    #[test]
    fn test_merge_rejects_wide_cell_with_diagonal_corner() {
        // row 0: a cell two columns wide, then one; row 1 uniform
        let mut tbl = table(2, 3);
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(0, 1)).unwrap();
        let before = tbl.element().clone();

        let err = tbl.merge(CellAddr::new(0, 0), CellAddr::new(1, 2)).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidSpan(_)));
        assert_eq!(tbl.element(), &before);
    }

    #[test]
    fn test_merge_wide_cell_along_its_edge() {
        let mut tbl = table(2, 3);
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(0, 1)).unwrap();
        tbl.merge(CellAddr::new(0, 0), CellAddr::new(1, 1)).unwrap();
        assert_eq!(spans(&tbl), vec![vec![2, 1], vec![2, 1]]);
    }

    #[test]
    fn test_merge_rejects_vertical_merge_running_out_of_rectangle() {
        // column 1 is merged over all three rows
        let mut tbl = table(3, 3);
        tbl.merge(CellAddr::new(0, 1), CellAddr::new(2, 1)).unwrap();
        let before = tbl.element().clone();

        let err = tbl.merge(CellAddr::new(0, 0), CellAddr::new(1, 2)).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidSpan(_)));
        assert_eq!(tbl.element(), &before);
    }

    #[test]
    fn test_merge_fails_when_span_overshoots() {
        // row 1 has a cell spanning columns 1-2, so columns 0-1 cannot be merged
        let mut tbl = table(2, 3);
        tbl.merge(CellAddr::new(1, 1), CellAddr::new(1, 2)).unwrap();
        let before = tbl.element().clone();

        let err = tbl.merge(CellAddr::new(0, 1), CellAddr::new(1, 0)).unwrap_err();
        assert!(err.to_string().contains("span is not rectangular"), "{}", err);
        assert_eq!(tbl.element(), &before);
    }

    #[test]
    fn test_merge_fails_on_short_row() {
        let mut tbl = table(2, 3);
        let tr = tbl.element_mut().children_mut().iter_mut().rfind(|c| c.is("w:tr")).unwrap();
        let last = tr.children().len() - 1;
        tr.remove(last);

        let err = tbl.merge(CellAddr::new(0, 2), CellAddr::new(1, 0)).unwrap_err();
        assert!(err.to_string().contains("not enough grid columns"), "{}", err);
        assert_eq!(spans(&tbl), vec![vec![1, 1, 1], vec![1, 1]]);
    }

    #[test]
    fn test_vmerge_extent_follows_continuations() {
        let mut tbl = table(3, 2);
        tbl.merge(CellAddr::new(0, 1), CellAddr::new(1, 1)).unwrap();
        let el = tbl.element();
        assert_eq!(top_row(el, 1, 1).unwrap(), 0);
        assert_eq!(bottom_row(el, 0, 1).unwrap(), 2);
        assert_eq!(bottom_row(el, 2, 1).unwrap(), 3);
    }

    #[test]
    fn test_cell_markup_choice() {
        let mut tc = Tc::create();
        let mut pr = tc.get_or_add_tc_pr();
        pr.set_vertical_alignment(Some(WdCellVerticalAlignment::Center)).unwrap();
        pr.set_cell_markup(Some("w:cellIns")).unwrap();
        pr.set_cell_markup(Some("w:cellDel")).unwrap();
        assert_eq!(pr.cell_markup().as_deref(), Some("w:cellDel"));
        assert!(pr.set_cell_markup(Some("w:vAlign")).is_err());
        assert_eq!(pr.element().children().len(), 2);
        assert_eq!(
            tc.vertical_alignment().unwrap(),
            Some(WdCellVerticalAlignment::Center)
        );
    }

    #[test]
    fn test_row_height() {
        let mut tbl = table(1, 1);
        let mut tr = tbl.row_mut(0).unwrap();
        tr.set_height(None).unwrap();
        assert!(tr.tr_pr().is_none());
        tr.set_height(Some(Length::from_twips(400))).unwrap();
        tr.set_height_rule(Some(WdRowHeightRule::Exactly)).unwrap();
        assert_eq!(tr.height().unwrap(), Some(Length::from_twips(400)));
        assert_eq!(tr.height_rule().unwrap(), Some(WdRowHeightRule::Exactly));
        let tags: Vec<String> = tr.element().children().iter().map(Element::tag).collect();
        assert_eq!(tags, ["w:trPr", "w:tc"]);
    }
}
