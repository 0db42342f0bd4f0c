//! Spreadsheet side of the import: fixed column layouts, cell decoding,
//! the parser turning sheets into [`ParsedRow`]s, and the templates users
//! fill in.

mod cell;
mod layout;
mod parser;
pub mod template;

pub use cell::{CellValue, SheetGrid, column_letter, date_to_serial, serial_to_date};
pub use layout::{
    BEST_TIME_SHEETS, BestTimeSheet, COMPETITION_COLUMNS, COMPETITION_INPUT_SHEET, Column,
    EMPTY_MARKER, ImportKind, PRACTICE_COLUMNS, SAMPLE_SHEET,
};
pub use parser::{
    BestTimeCells, CompetitionCells, ParsedRow, PracticeCells, RowCells, WorkbookParser,
};
