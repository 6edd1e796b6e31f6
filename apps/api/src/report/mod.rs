//! Report Builder: renders scored candidates into an XLSX workbook.
//!
//! Two steps: `build_table` lays out headers and typed cells, `render_xlsx` writes them.
//! Layout (in column order): Filename, Candidate Name, one score column per criterion,
//! Total Score, Average Score, one explanation column per criterion.

use std::borrow::Cow;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;

use crate::ranking::models::{BatchResult, CriteriaSet};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SCORES_SHEET: &str = "Resume Scores";
pub const CRITERIA_SHEET: &str = "Criteria";

/// Criteria longer than this are labelled `Criterion <i>` in headers.
const MAX_HEADER_CRITERION_CHARS: usize = 60;
const MAX_COLUMN_WIDTH: usize = 80;
/// Excel caps a cell at 32,767 characters and a sheet at 16,384 columns.
const MAX_CELL_CHARS: usize = 32_767;
const MAX_SHEET_COLUMNS: usize = 16_384;
/// Four fixed columns plus a score and an explanation column per criterion must fit on one sheet.
pub const MAX_REPORT_CRITERIA: usize = (MAX_SHEET_COLUMNS - 4) / 2;
const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("spreadsheet rendering failed: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
        }
    }
}

/// Rendered-agnostic table: header row plus one row per candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// (label, full criterion text) for every criterion, in order.
    pub criteria_legend: Vec<(String, String)>,
}

/// Header label for a criterion: its text, or a stable index when too long to display.
pub fn criterion_label(index: usize, criterion: &str) -> String {
    if criterion.chars().count() > MAX_HEADER_CRITERION_CHARS {
        format!("Criterion {}", index + 1)
    } else {
        criterion.to_string()
    }
}

pub fn build_table(batch: &BatchResult, criteria: &CriteriaSet) -> ReportTable {
    let labels: Vec<String> = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| criterion_label(i, c))
        .collect();

    let mut headers = vec!["Filename".to_string(), "Candidate Name".to_string()];
    headers.extend(labels.iter().map(|l| format!("{l} (Score)")));
    headers.push("Total Score".to_string());
    headers.push("Average Score".to_string());
    headers.extend(labels.iter().map(|l| format!("{l} (Explanation)")));

    let rows = batch
        .candidates
        .iter()
        .map(|candidate| {
            let mut row = vec![
                Cell::Text(candidate.filename.clone().unwrap_or_default()),
                Cell::Text(candidate.name.clone()),
            ];
            row.extend(candidate.scores.iter().map(|s| Cell::Number(s.score as f64)));
            row.push(Cell::Number(candidate.total as f64));
            row.push(Cell::Number(round2(candidate.average)));
            row.extend(
                candidate
                    .scores
                    .iter()
                    .map(|s| Cell::Text(s.explanation.clone())),
            );
            row
        })
        .collect();

    let criteria_legend = labels
        .into_iter()
        .zip(criteria.iter().cloned())
        .collect();

    ReportTable {
        headers,
        rows,
        criteria_legend,
    }
}

/// Writes the table to an XLSX workbook held in memory.
pub fn render_xlsx(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let mut scores = Worksheet::new();
    scores.set_name(SCORES_SHEET)?;
    write_sheet(&mut scores, &table.headers, &table.rows, &header_format)?;
    scores.set_freeze_panes(1, 0)?;
    workbook.push_worksheet(scores);

    let legend_headers = vec!["Label".to_string(), "Criterion".to_string()];
    let legend_rows: Vec<Vec<Cell>> = table
        .criteria_legend
        .iter()
        .map(|(label, text)| vec![Cell::Text(label.clone()), Cell::Text(text.clone())])
        .collect();
    let mut legend = Worksheet::new();
    legend.set_name(CRITERIA_SHEET)?;
    write_sheet(&mut legend, &legend_headers, &legend_rows, &header_format)?;
    workbook.push_worksheet(legend);

    Ok(workbook.save_to_buffer()?)
}

/// Convenience wrapper: layout + render.
pub fn build_report(batch: &BatchResult, criteria: &CriteriaSet) -> Result<Vec<u8>, ReportError> {
    render_xlsx(&build_table(batch, criteria))
}

fn write_sheet(
    sheet: &mut Worksheet,
    headers: &[String],
    rows: &[Vec<Cell>],
    header_format: &Format,
) -> Result<(), ReportError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, fit_cell(header), header_format)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => sheet.write_string(row_num, col as u16, fit_cell(s))?,
                Cell::Number(n) => sheet.write_number(row_num, col as u16, *n)?,
            };
        }
    }

    for (col, width) in column_widths(headers, rows).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(())
}

/// Longest cell (header included) plus 2, capped.
fn column_widths(headers: &[String], rows: &[Vec<Cell>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(Cell::display_len)
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Cuts text that would not fit in one cell, marking the cut.
fn fit_cell(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_CELL_CHARS {
        return Cow::Borrowed(text);
    }
    let keep = MAX_CELL_CHARS - TRUNCATION_MARKER.len();
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(TRUNCATION_MARKER);
    Cow::Owned(cut)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
