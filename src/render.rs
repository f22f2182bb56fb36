//! Turns one matrix + totals pass into display rows and export rows.
//!
//! Both forms come from the same [`RenderedReport`]: the display keeps
//! row/column spans, the export flattens them into a rectangular grid of
//! strings with `""` wherever a span or a blank cell sits.

use crate::pivot::PivotMatrix;
use crate::totals::Totals;
use crate::types::{DimensionKey, Tally};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCell {
    pub text: String,
    pub value: Option<u64>,
    pub col_span: usize,
    pub row_span: usize,
    pub header: bool,
}

impl DisplayCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            col_span: 1,
            row_span: 1,
            header: false,
        }
    }

    pub fn number(value: u64) -> Self {
        Self {
            text: value.to_string(),
            value: Some(value),
            col_span: 1,
            row_span: 1,
            header: false,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            header: true,
            ..Self::text(text)
        }
    }

    pub fn cols(mut self, span: usize) -> Self {
        self.col_span = span.max(1);
        self
    }

    pub fn rows(mut self, span: usize) -> Self {
        self.row_span = span.max(1);
        self
    }
}

/// How the grand-total column of a grouped report looks.
#[derive(Debug, Clone, PartialEq)]
pub enum GrandTotal {
    /// One column spanning both header rows (`GT`).
    Single(String),
    /// A group of its own with a cell per sub bucket plus the total.
    Split(String),
    /// No grand-total column; each group already ends in its own total.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedLayout {
    pub row_header: String,
    pub cell_total: String,
    pub grand: GrandTotal,
    pub totals_label: String,
}

impl GroupedLayout {
    pub fn new(row_header: impl Into<String>) -> Self {
        Self {
            row_header: row_header.into(),
            cell_total: "T".to_string(),
            grand: GrandTotal::Single("GT".to_string()),
            totals_label: "Total".to_string(),
        }
    }

    pub fn grand(mut self, grand: GrandTotal) -> Self {
        self.grand = grand;
        self
    }

    pub fn totals_label(mut self, label: impl Into<String>) -> Self {
        self.totals_label = label.into();
        self
    }
}

/// Flat single-row header with a leading serial-number column.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialLayout {
    pub serial_header: String,
    pub row_header: String,
    pub group_total: String,
    pub totals_prefix: [String; 2],
}

impl SerialLayout {
    pub fn new(row_header: impl Into<String>) -> Self {
        Self {
            serial_header: "S/N".to_string(),
            row_header: row_header.into(),
            group_total: "TOTAL".to_string(),
            totals_prefix: [String::new(), "TOTAL".to_string()],
        }
    }

    pub fn group_total(mut self, label: impl Into<String>) -> Self {
        self.group_total = label.into();
        self
    }

    pub fn totals_prefix(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.totals_prefix = [first.into(), second.into()];
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutKind {
    Grouped(GroupedLayout),
    Serial(SerialLayout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub kind: LayoutKind,
    /// Label/value lines placed above the table, followed by a blank line.
    pub preamble: Vec<Vec<String>>,
}

impl Layout {
    pub fn grouped(layout: GroupedLayout) -> Self {
        Self {
            kind: LayoutKind::Grouped(layout),
            preamble: Vec::new(),
        }
    }

    pub fn serial(layout: SerialLayout) -> Self {
        Self {
            kind: LayoutKind::Serial(layout),
            preamble: Vec::new(),
        }
    }

    pub fn with_preamble(mut self, preamble: Vec<Vec<String>>) -> Self {
        self.preamble = preamble;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReport {
    pub preamble: Vec<Vec<DisplayCell>>,
    pub header: Vec<Vec<DisplayCell>>,
    pub body: Vec<Vec<DisplayCell>>,
    pub totals: Vec<DisplayCell>,
}

/// Lay out `matrix` and `totals` over `columns` in the given `layout`.
///
/// Rows appear in matrix order, columns in `columns` order. `totals` must
/// have been computed over the same `columns`.
pub fn render(
    matrix: &PivotMatrix,
    columns: &[DimensionKey],
    totals: &Totals,
    layout: &Layout,
) -> RenderedReport {
    let mut preamble: Vec<Vec<DisplayCell>> = layout
        .preamble
        .iter()
        .map(|line| line.iter().map(DisplayCell::text).collect())
        .collect();
    if !preamble.is_empty() {
        preamble.push(Vec::new());
    }

    let (header, body, totals_row) = match &layout.kind {
        LayoutKind::Grouped(g) => render_grouped(matrix, columns, totals, g),
        LayoutKind::Serial(s) => render_serial(matrix, columns, totals, s),
    };

    RenderedReport {
        preamble,
        header,
        body,
        totals: totals_row,
    }
}

type Sections = (Vec<Vec<DisplayCell>>, Vec<Vec<DisplayCell>>, Vec<DisplayCell>);

fn tally_cells(tally: &Tally, width: usize, out: &mut Vec<DisplayCell>) {
    for i in 0..width {
        out.push(DisplayCell::number(tally.get(i)));
    }
    out.push(DisplayCell::number(tally.total()));
}

fn column_tally<'a>(
    cells: &'a std::collections::BTreeMap<String, Tally>,
    key: &str,
    empty: &'a Tally,
) -> &'a Tally {
    cells.get(key).unwrap_or(empty)
}

fn render_grouped(
    matrix: &PivotMatrix,
    columns: &[DimensionKey],
    totals: &Totals,
    layout: &GroupedLayout,
) -> Sections {
    let buckets = matrix.buckets();
    let width = buckets.len();
    let empty = Tally::zeroed(width);

    let mut top = vec![DisplayCell::heading(&layout.row_header).rows(2)];
    let mut sub = Vec::new();
    for column in columns {
        top.push(DisplayCell::heading(&column.label).cols(width + 1));
        sub.extend(buckets.iter().map(|b| DisplayCell::heading(&b.label)));
        sub.push(DisplayCell::heading(&layout.cell_total));
    }
    match &layout.grand {
        GrandTotal::Single(label) => top.push(DisplayCell::heading(label).rows(2)),
        GrandTotal::Split(label) => {
            top.push(DisplayCell::heading(label).cols(width + 1));
            sub.extend(buckets.iter().map(|b| DisplayCell::heading(&b.label)));
            sub.push(DisplayCell::heading(&layout.cell_total));
        }
        GrandTotal::None => {}
    }

    let grand_cells = |tally: &Tally, out: &mut Vec<DisplayCell>| match &layout.grand {
        GrandTotal::Single(_) => out.push(DisplayCell::number(tally.total())),
        GrandTotal::Split(_) => tally_cells(tally, width, out),
        GrandTotal::None => {}
    };

    let body = matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(ri, row)| {
            let mut line = vec![DisplayCell::text(&row.key)];
            for column in columns {
                tally_cells(column_tally(&row.cells, &column.key, &empty), width, &mut line);
            }
            grand_cells(totals.by_row.get(ri).unwrap_or(&empty), &mut line);
            line
        })
        .collect();

    let mut footer = vec![DisplayCell::text(&layout.totals_label)];
    for (ci, _) in columns.iter().enumerate() {
        tally_cells(totals.by_column.get(ci).unwrap_or(&empty), width, &mut footer);
    }
    grand_cells(&totals.grand, &mut footer);

    (vec![top, sub], body, footer)
}

fn render_serial(
    matrix: &PivotMatrix,
    columns: &[DimensionKey],
    totals: &Totals,
    layout: &SerialLayout,
) -> Sections {
    let buckets = matrix.buckets();
    let width = buckets.len();
    let empty = Tally::zeroed(width);

    let mut header = vec![
        DisplayCell::heading(&layout.serial_header),
        DisplayCell::heading(&layout.row_header),
    ];
    for column in columns {
        for bucket in buckets {
            header.push(DisplayCell::heading(format!("{} {}", column.label, bucket.label)));
        }
        header.push(DisplayCell::heading(format!(
            "{} {}",
            column.label, layout.group_total
        )));
    }

    let body = matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(ri, row)| {
            let mut line = vec![DisplayCell::number(ri as u64 + 1), DisplayCell::text(&row.key)];
            for column in columns {
                tally_cells(column_tally(&row.cells, &column.key, &empty), width, &mut line);
            }
            line
        })
        .collect();

    let mut footer = vec![
        DisplayCell::text(&layout.totals_prefix[0]),
        DisplayCell::text(&layout.totals_prefix[1]),
    ];
    for (ci, _) in columns.iter().enumerate() {
        tally_cells(totals.by_column.get(ci).unwrap_or(&empty), width, &mut footer);
    }

    (vec![header], body, footer)
}

impl RenderedReport {
    /// Every display row in output order: preamble, header, body, totals.
    pub fn display_rows(&self) -> Vec<&[DisplayCell]> {
        self.preamble
            .iter()
            .chain(self.header.iter())
            .chain(self.body.iter())
            .map(Vec::as_slice)
            .chain(std::iter::once(self.totals.as_slice()))
            .collect()
    }

    /// Grid position `(row, column)` of every display cell once spans are
    /// laid out, plus the grid width.
    pub fn positions(&self) -> (Vec<(usize, usize, &DisplayCell)>, usize) {
        let mut placed = Vec::new();
        // Remaining rows each column is still covered by a row span.
        let mut covered: Vec<usize> = Vec::new();
        let mut width = 0;

        for (ri, row) in self.display_rows().into_iter().enumerate() {
            let mut col = 0;
            for cell in row {
                while covered.get(col).copied().unwrap_or(0) > 0 {
                    col += 1;
                }
                placed.push((ri, col, cell));
                if covered.len() < col + cell.col_span {
                    covered.resize(col + cell.col_span, 0);
                }
                for c in col..col + cell.col_span {
                    covered[c] = cell.row_span;
                }
                col += cell.col_span;
            }
            width = width.max(col);
            for c in covered.iter_mut() {
                *c = c.saturating_sub(1);
            }
        }
        (placed, width.max(covered.len()))
    }

    /// Rectangular string grid for CSV / XLSX. Spanned and missing cells
    /// are empty strings.
    pub fn export_rows(&self) -> Vec<Vec<String>> {
        let row_count = self.display_rows().len();
        let (placed, width) = self.positions();
        let mut grid = vec![vec![String::new(); width]; row_count];
        for (r, c, cell) in placed {
            grid[r][c] = cell.text.clone();
        }
        grid
    }

    /// Markdown table for console output.
    pub fn to_text(&self) -> String {
        let mut builder = Builder::default();
        for row in self.export_rows() {
            builder.push_record(row);
        }
        builder.build().with(Style::markdown()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::{PivotConfig, SubDimension};
    use crate::totals::totals;
    use crate::types::{Field, RawRow};
    use pretty_assertions::assert_eq;

    fn row(region: &str, gender: &str, category: &str, total: u64) -> RawRow {
        RawRow {
            region: Some(region.into()),
            gender: Some(gender.into()),
            category: Some(category.into()),
            total: Some(total.to_string()),
            ..Default::default()
        }
    }

    fn sample() -> (PivotMatrix, Totals) {
        let rows = vec![
            row("North", "Male", "Student", 3),
            row("North", "Female", "Student", 2),
            row("South", "Male", "Staff", 1),
        ];
        let m = PivotConfig::builder()
            .rows_by_field(Field::Region)
            .expected_rows(["North", "South"])
            .columns(vec![DimensionKey::plain("Student"), DimensionKey::plain("Staff")])
            .columns_by_field(Field::Category)
            .build()
            .aggregate(&rows);
        let t = totals(&m, m.columns());
        (m, t)
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn grouped_export_matches_the_sheet_layout() {
        let (m, t) = sample();
        let r = render(&m, m.columns(), &t, &Layout::grouped(GroupedLayout::new("Region")));
        assert_eq!(
            r.export_rows(),
            vec![
                s(&["Region", "Student", "", "", "Staff", "", "", "GT"]),
                s(&["", "F", "M", "T", "F", "M", "T", ""]),
                s(&["North", "2", "3", "5", "0", "0", "0", "5"]),
                s(&["South", "0", "0", "0", "0", "1", "1", "1"]),
                s(&["Total", "2", "3", "5", "0", "1", "1", "6"]),
            ]
        );
    }

    #[test]
    fn split_grand_total_repeats_the_sub_columns() {
        let (m, t) = sample();
        let layout = GroupedLayout::new("State")
            .grand(GrandTotal::Split("Grand Total".into()))
            .totals_label("Grand Total");
        let r = render(&m, m.columns(), &t, &Layout::grouped(layout));
        let rows = r.export_rows();
        assert_eq!(rows[0][7], "Grand Total");
        assert_eq!(rows[1][7..], s(&["F", "M", "T"])[..]);
        assert_eq!(rows[4], s(&["Grand Total", "2", "3", "5", "0", "1", "1", "2", "4", "6"]));
    }

    #[test]
    fn no_grand_total_column_and_men_first() {
        let rows = vec![
            row("North", "Male", "Student", 3),
            row("North", "Female", "Student", 2),
        ];
        let m = PivotConfig::builder()
            .rows_by_field(Field::Region)
            .columns(vec![DimensionKey::plain("Student")])
            .columns_by_field(Field::Category)
            .sub_dimension(SubDimension::gender_male_first())
            .build()
            .aggregate(&rows);
        let t = totals(&m, m.columns());
        let layout = GroupedLayout::new("Cluster").grand(GrandTotal::None);
        let r = render(&m, m.columns(), &t, &Layout::grouped(layout));
        assert_eq!(
            r.export_rows(),
            vec![
                s(&["Cluster", "Student", "", ""]),
                s(&["", "M", "F", "T"]),
                s(&["North", "3", "2", "5"]),
                s(&["Total", "3", "2", "5"]),
            ]
        );
        assert_eq!(r.display_rows()[0].len(), 2);
    }

    #[test]
    fn export_and_display_have_the_same_rows() {
        let (m, t) = sample();
        for layout in [
            Layout::grouped(GroupedLayout::new("Region")),
            Layout::serial(SerialLayout::new("DISTRICT"))
                .with_preamble(vec![s(&["GROUP NAME", "DLCF"]), s(&["MONTH", "May"])]),
        ] {
            let r = render(&m, m.columns(), &t, &layout);
            let export = r.export_rows();
            assert_eq!(export.len(), r.display_rows().len());
            let (placed, width) = r.positions();
            assert!(export.iter().all(|line| line.len() == width));
            for (ri, ci, cell) in placed {
                if let Some(v) = cell.value {
                    assert_eq!(export[ri][ci], v.to_string());
                }
            }
        }
    }

    #[test]
    fn serial_layout_numbers_rows() {
        let (m, t) = sample();
        let r = render(&m, m.columns(), &t, &Layout::serial(SerialLayout::new("DISTRICT")));
        let rows = r.export_rows();
        assert_eq!(
            rows[0],
            s(&[
                "S/N", "DISTRICT", "Student F", "Student M", "Student TOTAL", "Staff F",
                "Staff M", "Staff TOTAL"
            ])
        );
        assert_eq!(rows[1][..2], s(&["1", "North"])[..]);
        assert_eq!(rows[3], s(&["", "TOTAL", "2", "3", "5", "0", "1", "1"]));
    }

    #[test]
    fn preamble_is_followed_by_a_blank_line() {
        let (m, t) = sample();
        let layout = Layout::serial(SerialLayout::new("DISTRICT").totals_prefix("TOTAL", ""))
            .with_preamble(vec![s(&["GROUP NAME", "DLCF"])]);
        let rows = render(&m, m.columns(), &t, &layout).export_rows();
        assert_eq!(rows[0][..2], s(&["GROUP NAME", "DLCF"])[..]);
        assert!(rows[1].iter().all(String::is_empty));
        assert_eq!(rows[0].len(), rows[2].len());
        assert_eq!(rows.last().unwrap()[..2], s(&["TOTAL", ""])[..]);
    }

    #[test]
    fn empty_matrix_still_has_header_and_totals() {
        let m = PivotConfig::builder()
            .rows_by_field(Field::Region)
            .columns(vec![DimensionKey::plain("Student")])
            .sub_dimension(SubDimension::gender())
            .build()
            .aggregate(&[]);
        let t = totals(&m, m.columns());
        let rows = render(&m, m.columns(), &t, &Layout::grouped(GroupedLayout::new("Region")))
            .export_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], s(&["Total", "0", "0", "0", "0"]));
    }

    #[test]
    fn text_preview_is_markdown() {
        let (m, t) = sample();
        let text = render(&m, m.columns(), &t, &Layout::grouped(GroupedLayout::new("Region")))
            .to_text();
        assert!(text.contains("| North"));
        assert!(text.lines().count() >= 5);
    }
}
