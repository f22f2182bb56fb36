//! HTML table rendering with real `rowspan` / `colspan` headers.

use crate::render::{DisplayCell, RenderedReport};
use std::fmt::Write;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_cell(out: &mut String, cell: &DisplayCell) {
    let tag = if cell.header { "th" } else { "td" };
    let _ = write!(out, "<{tag}");
    if cell.row_span > 1 {
        let _ = write!(out, " rowspan=\"{}\"", cell.row_span);
    }
    if cell.col_span > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.col_span);
    }
    let _ = write!(out, ">{}</{tag}>", escape(&cell.text));
}

fn write_row(out: &mut String, cells: &[DisplayCell]) {
    out.push_str("<tr>");
    for cell in cells {
        write_cell(out, cell);
    }
    out.push_str("</tr>\n");
}

/// `<table>` for a rendered report. Preamble lines are emitted as a
/// definition table above it.
pub fn to_html(report: &RenderedReport, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<h2>{}</h2>", escape(title));

    let meta: Vec<&Vec<DisplayCell>> = report.preamble.iter().filter(|r| !r.is_empty()).collect();
    if !meta.is_empty() {
        out.push_str("<table class=\"report-meta\">\n");
        for line in meta {
            write_row(&mut out, line);
        }
        out.push_str("</table>\n");
    }

    out.push_str("<table class=\"attendance-report-table\">\n<thead>\n");
    for line in &report.header {
        write_row(&mut out, line);
    }
    out.push_str("</thead>\n<tbody>\n");
    for line in &report.body {
        write_row(&mut out, line);
    }
    out.push_str("</tbody>\n<tfoot>\n");
    write_row(&mut out, &report.totals);
    out.push_str("</tfoot>\n</table>\n");
    out
}
