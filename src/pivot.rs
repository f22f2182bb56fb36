//! Generic row × column pivot with a per-cell sub-dimension split.
//!
//! Every report is one [`PivotConfig`]: how to derive the row key, which
//! columns exist, and how a row's measure is split into sub buckets. The
//! aggregation is a pure function of the config and the input rows.

use crate::normalize::KeyNormalizer;
use crate::types::{DimensionKey, Field, RawRow, Tally};
use crate::util::parse_measure;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

pub const UNKNOWN: &str = "Unknown";

type KeyFn = Box<dyn Fn(&RawRow) -> Option<String> + Send + Sync>;

/// What to do with rows whose sub key matches no bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedPolicy {
    /// Leave the measure out of every bucket.
    Drop,
    /// Count it in an extra trailing bucket with this label.
    Bucket(String),
}

/// Ordered buckets each cell is split into (e.g. female / male).
#[derive(Debug, Clone, PartialEq)]
pub struct SubDimension {
    buckets: Vec<DimensionKey>,
    policy: UnrecognizedPolicy,
}

const OTHER_BUCKET_KEY: &str = "__other";

impl SubDimension {
    pub fn new(buckets: Vec<DimensionKey>) -> Self {
        Self {
            buckets,
            policy: UnrecognizedPolicy::Drop,
        }
    }

    /// `female (F)`, `male (M)`; the display order of the congress reports.
    pub fn gender() -> Self {
        Self::new(vec![
            DimensionKey::new("female", "F"),
            DimensionKey::new("male", "M"),
        ])
    }

    /// `male (M)`, `female (F)`; the retreat reports lead with men.
    pub fn gender_male_first() -> Self {
        Self::new(vec![
            DimensionKey::new("male", "M"),
            DimensionKey::new("female", "F"),
        ])
    }

    /// One bucket per `category:gender` pair, categories outermost.
    pub fn category_gender(categories: &[(&str, &str)], genders: &[(&str, &str)]) -> Self {
        let mut buckets = Vec::with_capacity(categories.len() * genders.len());
        for (cat_key, cat_label) in categories {
            for (gender_key, gender_label) in genders {
                buckets.push(DimensionKey::new(
                    format!("{cat_key}:{gender_key}"),
                    format!("{cat_label} {gender_label}"),
                ));
            }
        }
        Self::new(buckets)
    }

    pub fn with_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        if let UnrecognizedPolicy::Bucket(label) = &policy {
            self.buckets
                .push(DimensionKey::new(OTHER_BUCKET_KEY, label.clone()));
        }
        self.policy = policy;
        self
    }

    pub fn buckets(&self) -> &[DimensionKey] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.key == key)
    }

    /// Bucket index for a raw sub key, matched case-insensitively.
    pub fn resolve(&self, raw: Option<&str>) -> Option<usize> {
        let matched = raw.map(|r| r.trim().to_lowercase()).and_then(|r| {
            self.buckets
                .iter()
                .position(|b| b.key != OTHER_BUCKET_KEY && b.key.to_lowercase() == r)
        });
        match (&self.policy, matched) {
            (_, Some(i)) => Some(i),
            (UnrecognizedPolicy::Drop, None) => None,
            (UnrecognizedPolicy::Bucket(_), None) => Some(self.buckets.len() - 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Read the `total` field; missing or malformed counts as zero.
    Field,
    /// Every row counts once.
    Count,
}

impl Measure {
    pub fn of(self, row: &RawRow) -> u64 {
        match self {
            Measure::Field => parse_measure(row.get(Field::Total)),
            Measure::Count => 1,
        }
    }
}

/// Everything needed to pivot one report.
pub struct PivotConfig {
    row_key: KeyFn,
    row_fallback: String,
    expected_rows: Vec<String>,
    columns: Vec<DimensionKey>,
    column_key: KeyFn,
    column_fallback: String,
    sub: SubDimension,
    sub_key: KeyFn,
    measure: Measure,
}

impl PivotConfig {
    pub fn builder() -> PivotBuilder {
        PivotBuilder::default()
    }

    pub fn columns(&self) -> &[DimensionKey] {
        &self.columns
    }

    pub fn sub(&self) -> &SubDimension {
        &self.sub
    }

    pub fn expected_rows(&self) -> &[String] {
        &self.expected_rows
    }

    /// Group `rows` into a dense row × column matrix.
    ///
    /// Expected row keys come first, in the order given, even when no row
    /// matches them. Keys seen only in the data follow in first-seen order.
    /// Every row carries a cell for every column.
    pub fn aggregate(&self, rows: &[RawRow]) -> PivotMatrix {
        let width = self.sub.len();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<PivotRow> = Vec::new();
        for key in &self.expected_rows {
            if !index.contains_key(key) {
                index.insert(key.clone(), out.len());
                out.push(PivotRow::new(key.clone()));
            }
        }

        let mut seen_columns: Vec<String> = Vec::new();
        let mut seen_set: HashSet<String> = HashSet::new();
        let mut unassigned = 0u64;

        for row in rows {
            let row_key = (self.row_key)(row)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| self.row_fallback.clone());
            let column_key = (self.column_key)(row)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| self.column_fallback.clone());
            let sub_key = (self.sub_key)(row);
            let slot = self.sub.resolve(sub_key.as_deref());
            let amount = self.measure.of(row);

            if seen_set.insert(column_key.clone()) {
                seen_columns.push(column_key.clone());
            }
            let at = *index.entry(row_key.clone()).or_insert_with(|| {
                out.push(PivotRow::new(row_key));
                out.len() - 1
            });
            let cell = out[at]
                .cells
                .entry(column_key)
                .or_insert_with(|| Tally::zeroed(width));
            match slot {
                Some(i) => cell.add(i, amount),
                None => unassigned = unassigned.saturating_add(amount),
            }
        }

        let columns = if self.columns.is_empty() {
            seen_columns.into_iter().map(DimensionKey::plain).collect()
        } else {
            self.columns.clone()
        };
        for row in &mut out {
            for column in &columns {
                row.cells
                    .entry(column.key.clone())
                    .or_insert_with(|| Tally::zeroed(width));
            }
        }

        debug!(
            rows = out.len(),
            columns = columns.len(),
            input = rows.len(),
            unassigned,
            "aggregated pivot"
        );

        PivotMatrix {
            columns,
            buckets: self.sub.buckets.clone(),
            rows: out,
            unassigned,
        }
    }
}

pub struct PivotBuilder {
    row_key: Option<KeyFn>,
    row_fallback: String,
    expected_rows: Vec<String>,
    columns: Vec<DimensionKey>,
    column_key: Option<KeyFn>,
    column_fallback: String,
    sub: SubDimension,
    sub_key: Option<KeyFn>,
    measure: Measure,
}

impl Default for PivotBuilder {
    fn default() -> Self {
        Self {
            row_key: None,
            row_fallback: UNKNOWN.to_string(),
            expected_rows: Vec::new(),
            columns: Vec::new(),
            column_key: None,
            column_fallback: UNKNOWN.to_string(),
            sub: SubDimension::gender(),
            sub_key: None,
            measure: Measure::Field,
        }
    }
}

impl PivotBuilder {
    pub fn rows_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawRow) -> Option<String> + Send + Sync + 'static,
    {
        self.row_key = Some(Box::new(f));
        self
    }

    pub fn rows_by_field(self, field: Field) -> Self {
        self.rows_by(move |r| r.get(field).map(str::to_string))
    }

    pub fn row_fallback(mut self, label: impl Into<String>) -> Self {
        self.row_fallback = label.into();
        self
    }

    pub fn expected_rows<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_rows = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Fixed column set. Leave empty to take columns from the data.
    pub fn columns(mut self, columns: Vec<DimensionKey>) -> Self {
        self.columns = columns;
        self
    }

    pub fn columns_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawRow) -> Option<String> + Send + Sync + 'static,
    {
        self.column_key = Some(Box::new(f));
        self
    }

    pub fn columns_by_field(self, field: Field) -> Self {
        self.columns_by(move |r| r.get(field).map(str::to_string))
    }

    /// Columns are the normalizer's vocabulary; values go through it.
    pub fn columns_normalized(mut self, field: Field, normalizer: KeyNormalizer) -> Self {
        self.columns = normalizer.keys();
        self.column_fallback = normalizer.fallback().to_string();
        self.columns_by(move |r| Some(normalizer.normalize(r.get(field))))
    }

    pub fn column_fallback(mut self, label: impl Into<String>) -> Self {
        self.column_fallback = label.into();
        self
    }

    pub fn sub_dimension(mut self, sub: SubDimension) -> Self {
        self.sub = sub;
        self
    }

    pub fn sub_key_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawRow) -> Option<String> + Send + Sync + 'static,
    {
        self.sub_key = Some(Box::new(f));
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    pub fn build(self) -> PivotConfig {
        PivotConfig {
            row_key: self.row_key.unwrap_or_else(|| Box::new(|_| None)),
            row_fallback: self.row_fallback,
            expected_rows: self.expected_rows,
            columns: self.columns,
            column_key: self.column_key.unwrap_or_else(|| Box::new(|_| None)),
            column_fallback: self.column_fallback,
            sub: self.sub,
            sub_key: self
                .sub_key
                .unwrap_or_else(|| Box::new(|r| r.get(Field::Gender).map(str::to_string))),
            measure: self.measure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub key: String,
    pub cells: BTreeMap<String, Tally>,
}

impl PivotRow {
    fn new(key: String) -> Self {
        Self {
            key,
            cells: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotMatrix {
    columns: Vec<DimensionKey>,
    buckets: Vec<DimensionKey>,
    rows: Vec<PivotRow>,
    unassigned: u64,
}

impl PivotMatrix {
    /// The columns every render and total iterates, in display order.
    pub fn columns(&self) -> &[DimensionKey] {
        &self.columns
    }

    pub fn buckets(&self) -> &[DimensionKey] {
        &self.buckets
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn row(&self, key: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell tally, zero when the row or column is unknown.
    pub fn cell(&self, row: &str, column: &str) -> Tally {
        self.row(row)
            .and_then(|r| r.cells.get(column))
            .cloned()
            .unwrap_or_else(|| Tally::zeroed(self.buckets.len()))
    }

    /// Amount from rows whose sub key matched no bucket.
    pub fn unassigned(&self) -> u64 {
        self.unassigned
    }
}
