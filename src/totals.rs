//! Row, column and grand totals over a [`PivotMatrix`].

use crate::pivot::PivotMatrix;
use crate::types::{DimensionKey, Tally};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    /// One tally per column, in column order.
    pub by_column: Vec<Tally>,
    /// Per row, summed over every column, in matrix row order.
    pub by_row: Vec<Tally>,
    /// Everything, still split by sub bucket.
    pub grand: Tally,
}

impl Totals {
    pub fn grand_total(&self) -> u64 {
        self.grand.total()
    }

    pub fn row_total(&self, index: usize) -> u64 {
        self.by_row.get(index).map(Tally::total).unwrap_or(0)
    }

    pub fn column_total(&self, index: usize) -> u64 {
        self.by_column.get(index).map(Tally::total).unwrap_or(0)
    }
}

/// Sum `matrix` over `columns`.
///
/// Only the given columns contribute, so cells filed under keys outside the
/// set (e.g. an `Unknown` day) never leak into a rendered total.
pub fn totals(matrix: &PivotMatrix, columns: &[DimensionKey]) -> Totals {
    let width = matrix.buckets().len();
    let mut by_column = vec![Tally::zeroed(width); columns.len()];
    let mut by_row = Vec::with_capacity(matrix.rows().len());
    let mut grand = Tally::zeroed(width);

    for row in matrix.rows() {
        let mut row_tally = Tally::zeroed(width);
        for (i, column) in columns.iter().enumerate() {
            if let Some(cell) = row.cells.get(&column.key) {
                by_column[i].merge(cell);
                row_tally.merge(cell);
            }
        }
        grand.merge(&row_tally);
        by_row.push(row_tally);
    }

    Totals {
        by_column,
        by_row,
        grand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::PivotConfig;
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

    fn config() -> PivotConfig {
        PivotConfig::builder()
            .rows_by_field(Field::Region)
            .expected_rows(["North", "South", "East"])
            .columns(vec![
                DimensionKey::plain("Student"),
                DimensionKey::plain("Staff"),
                DimensionKey::plain("Youth"),
            ])
            .columns_by_field(Field::Category)
            .build()
    }

    fn sample() -> Vec<RawRow> {
        vec![
            row("North", "Male", "Student", 3),
            row("North", "Female", "Student", 2),
            row("South", "Male", "Staff", 1),
            row("West", "female", "Youth", 7),
            row("South", "male", "Chaplain", 11),
            row("East", "other", "Staff", 4),
        ]
    }

    #[test]
    fn worked_example_grand_total() {
        let rows = vec![
            row("North", "Male", "Student", 3),
            row("North", "Female", "Student", 2),
            row("South", "Male", "Staff", 1),
        ];
        let config = PivotConfig::builder()
            .rows_by_field(Field::Region)
            .expected_rows(["North", "South"])
            .columns(vec![DimensionKey::plain("Student"), DimensionKey::plain("Staff")])
            .columns_by_field(Field::Category)
            .build();
        let m = config.aggregate(&rows);
        let t = totals(&m, m.columns());
        assert_eq!(t.grand_total(), 6);
        assert_eq!(t.column_total(0), 5);
        assert_eq!(t.column_total(1), 1);
        assert_eq!(t.row_total(0), 5);
        assert_eq!(t.row_total(1), 1);
    }

    #[test]
    fn row_and_column_totals_agree_with_grand() {
        let m = config().aggregate(&sample());
        let t = totals(&m, m.columns());

        let from_rows: u64 = (0..m.rows().len()).map(|i| t.row_total(i)).sum();
        let from_columns: u64 = (0..m.columns().len()).map(|i| t.column_total(i)).sum();
        assert_eq!(from_rows, t.grand_total());
        assert_eq!(from_columns, t.grand_total());

        for (ri, r) in m.rows().iter().enumerate() {
            let cells: u64 = m.columns().iter().map(|c| r.cells[&c.key].total()).sum();
            assert_eq!(cells, t.row_total(ri));
        }
        for (ci, c) in m.columns().iter().enumerate() {
            let cells: u64 = m.rows().iter().map(|r| r.cells[&c.key].total()).sum();
            assert_eq!(cells, t.column_total(ci));
        }
    }

    #[test]
    fn sub_buckets_sum_to_the_cell_total() {
        let m = config().aggregate(&sample());
        let t = totals(&m, m.columns());
        for tally in t.by_column.iter().chain(t.by_row.iter()) {
            assert_eq!(tally.get(0) + tally.get(1), tally.total());
        }
    }

    #[test]
    fn order_of_rows_does_not_change_totals() {
        let mut reversed = sample();
        reversed.reverse();
        let a = config().aggregate(&sample());
        let b = config().aggregate(&reversed);
        let ta = totals(&a, a.columns());
        let tb = totals(&b, b.columns());
        assert_eq!(ta.grand, tb.grand);
        assert_eq!(ta.by_column, tb.by_column);
    }

    #[test]
    fn columns_outside_the_set_are_excluded() {
        let m = config().aggregate(&sample());
        let t = totals(&m, m.columns());
        // Chaplain is off-vocabulary, "other" gender is dropped.
        assert_eq!(t.grand_total(), 3 + 2 + 1 + 7);
        assert_eq!(t.column_total(2), 7);
        assert_eq!(m.cell("South", "Chaplain").total(), 11);
    }

    #[test]
    fn zero_columns_still_have_totals() {
        let m = config().aggregate(&[]);
        let t = totals(&m, m.columns());
        assert_eq!(t.by_column.len(), 3);
        assert!(t.by_column.iter().all(|c| c.total() == 0));
        assert_eq!(t.by_row.len(), 3);
    }
}
