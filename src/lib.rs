//! Pivot-table reporting for fellowship registration and attendance data.
//!
//! Flat rows (already filtered by the API) are grouped into a row × column
//! matrix split by a sub-dimension, totalled, and laid out for the console,
//! HTML, CSV and XLSX from a single aggregation pass.

pub mod config;
pub mod dimension;
pub mod error;
pub mod html;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pivot;
pub mod render;
pub mod reports;
pub mod totals;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
pub use normalize::KeyNormalizer;
pub use pivot::{
    Measure, PivotBuilder, PivotConfig, PivotMatrix, SubDimension, UnrecognizedPolicy,
};
pub use render::{render, Layout, RenderedReport};
pub use reports::{generate_report, Report, ReportContext, ReportKind};
pub use totals::{totals, Totals};
pub use types::{DimensionKey, Field, RawRow, Tally};
