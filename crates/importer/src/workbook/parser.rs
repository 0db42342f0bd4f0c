use calamine::{Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use storage::models::{PoolType, Stroke};
use tracing::{debug, info};

use super::cell::{CellValue, SheetGrid, column_letter};
use super::layout::{
    BEST_TIME_SHEETS, BestTimeSheet, COMPETITION_COLUMNS, COMPETITION_INPUT_SHEET, Column,
    EMPTY_MARKER, ImportKind, PRACTICE_COLUMNS, SAMPLE_SHEET,
};
use crate::error::{ImporterError, Result};

/// One data row (or, for best times, one filled time cell) of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub sheet: String,
    /// 1-based spreadsheet row; the header is row 1.
    pub row: u32,
    pub cells: RowCells,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowCells {
    Practice(PracticeCells),
    Competition(CompetitionCells),
    BestTime(BestTimeCells),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeCells {
    pub date: CellValue,
    pub title: CellValue,
    pub place: CellValue,
    pub note: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionCells {
    pub start_date: CellValue,
    pub end_date: CellValue,
    pub title: CellValue,
    pub place: CellValue,
    pub pool_type: CellValue,
    pub note: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestTimeCells {
    pub distance: CellValue,
    pub stroke: Stroke,
    pub pool_type: PoolType,
    pub relay: bool,
    /// Column letter of the time cell, for error messages.
    pub column: String,
    pub time: CellValue,
    pub note: CellValue,
}

pub struct WorkbookParser;

impl WorkbookParser {
    /// Reads every worksheet of an `.xlsx`, `.xls` or `.ods` file.
    pub fn read_sheets(bytes: &[u8]) -> Result<Vec<SheetGrid>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            sheets.push(SheetGrid::from_range(&name, &range));
        }

        debug!("Read {} sheets from workbook", sheets.len());
        Ok(sheets)
    }

    pub fn parse_bytes(kind: ImportKind, bytes: &[u8]) -> Result<Vec<ParsedRow>> {
        let sheets = Self::read_sheets(bytes)?;
        Self::parse_sheets(kind, &sheets)
    }

    /// Selects the sheets for `kind`, checks every header, then reads rows.
    /// A structural problem fails the whole file before any row is produced.
    pub fn parse_sheets(kind: ImportKind, sheets: &[SheetGrid]) -> Result<Vec<ParsedRow>> {
        let rows = match kind {
            ImportKind::Practice => {
                let selected: Vec<&SheetGrid> = sheets
                    .iter()
                    .filter(|s| s.name != SAMPLE_SHEET && !s.is_empty())
                    .collect();
                if selected.is_empty() {
                    return Err(ImporterError::MissingSheet(kind.to_string()));
                }
                for sheet in &selected {
                    check_header(sheet, &PRACTICE_COLUMNS)?;
                }
                selected.into_iter().flat_map(practice_rows).collect()
            }
            ImportKind::Competition => {
                let sheet = sheets
                    .iter()
                    .find(|s| s.name == COMPETITION_INPUT_SHEET)
                    .or_else(|| sheets.iter().find(|s| s.name != SAMPLE_SHEET))
                    .ok_or_else(|| ImporterError::MissingSheet(kind.to_string()))?;
                check_header(sheet, &COMPETITION_COLUMNS)?;
                competition_rows(sheet)
            }
            ImportKind::BestTime => {
                let selected: Vec<(&SheetGrid, &BestTimeSheet)> = BEST_TIME_SHEETS
                    .iter()
                    .filter_map(|layout| {
                        sheets
                            .iter()
                            .find(|s| s.name == layout.name)
                            .map(|sheet| (sheet, layout))
                    })
                    .collect();
                if selected.is_empty() {
                    return Err(ImporterError::MissingSheet(kind.to_string()));
                }
                for (sheet, layout) in &selected {
                    check_header(sheet, &layout.columns())?;
                }
                selected
                    .into_iter()
                    .flat_map(|(sheet, layout)| best_time_rows(sheet, layout))
                    .collect()
            }
        };

        info!("Parsed {} {} rows", rows.len(), kind);
        Ok(rows)
    }
}

fn check_header(sheet: &SheetGrid, columns: &[Column]) -> Result<()> {
    for (index, column) in columns.iter().enumerate() {
        let found = sheet.cell(0, index).display();
        if !column.matches(&found) {
            return Err(ImporterError::HeaderMismatch {
                sheet: sheet.name.clone(),
                column: column_letter(index),
                expected: column.label,
                found,
            });
        }
    }
    Ok(())
}

/// Data rows of a sheet: from row 2 up to the first fully blank row.
fn data_rows(sheet: &SheetGrid, width: usize) -> impl Iterator<Item = usize> + '_ {
    (1..sheet.height()).take_while(move |&r| !sheet.is_row_blank(r, width))
}

fn spreadsheet_row(index: usize) -> u32 {
    index as u32 + 1
}

fn practice_rows(sheet: &SheetGrid) -> Vec<ParsedRow> {
    let mut rows = Vec::new();
    for r in data_rows(sheet, PRACTICE_COLUMNS.len()) {
        let cells = PracticeCells {
            date: sheet.cell(r, 0).clone(),
            title: sheet.cell(r, 2).clone(),
            place: sheet.cell(r, 3).clone(),
            note: sheet.cell(r, 4).clone(),
        };
        // Template rows come with date and weekday filled in.
        if cells.title.is_blank() && cells.place.is_blank() && cells.note.is_blank() {
            continue;
        }
        rows.push(ParsedRow {
            sheet: sheet.name.clone(),
            row: spreadsheet_row(r),
            cells: RowCells::Practice(cells),
        });
    }
    debug!("Sheet '{}': {} practice rows", sheet.name, rows.len());
    rows
}

fn competition_rows(sheet: &SheetGrid) -> Vec<ParsedRow> {
    let mut rows = Vec::new();
    for r in data_rows(sheet, COMPETITION_COLUMNS.len()) {
        let cells = CompetitionCells {
            start_date: sheet.cell(r, 0).clone(),
            end_date: sheet.cell(r, 1).clone(),
            title: sheet.cell(r, 2).clone(),
            place: sheet.cell(r, 3).clone(),
            pool_type: sheet.cell(r, 4).clone(),
            note: sheet.cell(r, 5).clone(),
        };
        if cells.title.is_blank() {
            continue;
        }
        rows.push(ParsedRow {
            sheet: sheet.name.clone(),
            row: spreadsheet_row(r),
            cells: RowCells::Competition(cells),
        });
    }
    debug!("Sheet '{}': {} competition rows", sheet.name, rows.len());
    rows
}

fn best_time_rows(sheet: &SheetGrid, layout: &BestTimeSheet) -> Vec<ParsedRow> {
    let width = layout.columns().len();
    let mut rows = Vec::new();
    for r in data_rows(sheet, width) {
        for (i, stroke) in layout.strokes.iter().enumerate() {
            let col = BestTimeSheet::time_column(i);
            let time = sheet.cell(r, col);
            if time.is_blank() || time.display() == EMPTY_MARKER {
                continue;
            }
            let note = match sheet.cell(r, col + 1) {
                CellValue::Text(s) if s.trim() == EMPTY_MARKER => CellValue::Empty,
                other => other.clone(),
            };
            rows.push(ParsedRow {
                sheet: sheet.name.clone(),
                row: spreadsheet_row(r),
                cells: RowCells::BestTime(BestTimeCells {
                    distance: sheet.cell(r, 0).clone(),
                    stroke: *stroke,
                    pool_type: layout.pool_type,
                    relay: layout.relay,
                    column: column_letter(col),
                    time: time.clone(),
                    note,
                }),
            });
        }
    }
    debug!("Sheet '{}': {} best times", sheet.name, rows.len());
    rows
}
