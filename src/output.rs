use crate::error::{ReportError, Result};
use crate::render::RenderedReport;
use crate::types::{Field, RawRow};
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

/// `<slug>-<start>-to-<end>.<ext>`, with `start` / `end` standing in for
/// missing dates.
pub fn export_file_name(slug: &str, start: Option<&str>, end: Option<&str>, ext: &str) -> String {
    format!(
        "{}-{}-to-{}.{}",
        slug,
        start.unwrap_or("start"),
        end.unwrap_or("end"),
        ext
    )
}

pub fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for r in rows {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

/// Single-sheet workbook. Every cell is written as text so the sheet
/// matches the CSV cell for cell.
/// Worksheet coordinates for grid position `(r, c)`.
fn cell_index(r: usize, c: usize) -> Result<(u32, u16)> {
    match (u32::try_from(r), u16::try_from(c)) {
        (Ok(row), Ok(col)) => Ok((row, col)),
        _ => Err(ReportError::SheetTooLarge { row: r, col: c }),
    }
}

pub fn write_xlsx(path: &Path, sheet_name: &str, rows: &[Vec<String>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (row, col) = cell_index(r, c)?;
            worksheet.write_string(row, col, value)?;
        }
    }
    workbook.save(path)?;
    info!(path = %path.display(), sheet = sheet_name, rows = rows.len(), "wrote xlsx");
    Ok(())
}

pub fn write_html(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html)?;
    info!(path = %path.display(), "wrote html");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Dump the raw rows with a fixed column order.
pub fn write_raw_csv(path: &Path, rows: &[RawRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(Field::ALL.iter().map(|f| f.name()))?;
    for row in rows {
        wtr.write_record(Field::ALL.iter().map(|f| row.get(*f).unwrap_or("")))?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote raw rows");
    Ok(())
}

/// Print the header, the first `max_rows` data rows and the totals row.
pub fn preview_report(report: &RenderedReport, max_rows: usize) {
    if report.body.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let export = report.export_rows();
    let head = report.preamble.len() + report.header.len();
    let shown = report.body.len().min(max_rows);

    let mut builder = Builder::default();
    for line in export.iter().take(head + shown) {
        builder.push_record(line.clone());
    }
    if let Some(last) = export.last() {
        builder.push_record(last.clone());
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if shown < report.body.len() {
        println!("({} more rows not shown)\n", report.body.len() - shown);
    }
}
