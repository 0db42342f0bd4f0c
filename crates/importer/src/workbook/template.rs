//! `.xlsx` templates matching the layouts the parser accepts.

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use tracing::debug;

use super::cell::date_to_serial;
use super::layout::{
    BEST_TIME_SHEETS, COMPETITION_COLUMNS, COMPETITION_INPUT_SHEET, Column, EMPTY_MARKER,
    ImportKind, PRACTICE_COLUMNS, SAMPLE_SHEET,
};
use crate::error::{ImporterError, Result};

const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];
const MONTH_DAY_FORMAT: &str = "m\"月\"d\"日\"";
const FULL_DATE_FORMAT: &str = "yyyy/mm/dd";

pub fn check_year(year: i32) -> Result<i32> {
    if (1900..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(ImporterError::InvalidYear(year))
    }
}

pub fn build(kind: ImportKind, year: i32) -> Result<Vec<u8>> {
    match kind {
        ImportKind::Practice => practice_template(year),
        ImportKind::Competition => competition_template(year),
        ImportKind::BestTime => best_time_template(),
    }
}

/// Download name; recognised again by [`ImportKind::detect`].
pub fn file_name(kind: ImportKind, year: i32) -> String {
    match kind {
        ImportKind::Practice => format!("practice_import_{year}.xlsx"),
        ImportKind::Competition => format!("competition_import_{year}.xlsx"),
        ImportKind::BestTime => "best_time_import.xlsx".to_string(),
    }
}

struct Formats {
    header: Format,
    month_day: Format,
    full_date: Format,
    filler: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold().set_text_wrap(),
            month_day: Format::new().set_num_format(MONTH_DAY_FORMAT),
            full_date: Format::new().set_num_format(FULL_DATE_FORMAT),
            filler: Format::new().set_font_color(Color::Gray),
        }
    }
}

fn write_header(ws: &mut Worksheet, labels: &[&str], format: &Format) -> Result<()> {
    for (col, label) in labels.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *label, format)?;
    }
    Ok(())
}

fn labels(columns: &[Column]) -> Vec<&'static str> {
    columns.iter().map(|c| c.label).collect()
}

fn weekday(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ImporterError::InvalidYear(year))
}

fn practice_sheet_setup(ws: &mut Worksheet, formats: &Formats) -> Result<()> {
    write_header(ws, &labels(&PRACTICE_COLUMNS), &formats.header)?;
    ws.set_column_width(0, 12)?;
    ws.set_column_width(1, 6)?;
    ws.set_column_width(2, 20)?;
    ws.set_column_width(3, 20)?;
    ws.set_column_width(4, 40)?;
    Ok(())
}

fn write_practice_date(ws: &mut Worksheet, row: u32, date: NaiveDate, formats: &Formats) -> Result<()> {
    ws.write_number_with_format(row, 0, date_to_serial(date), &formats.month_day)?;
    ws.write_string(row, 1, weekday(date))?;
    Ok(())
}

/// Sample sheet plus one sheet per month, each pre-filled with every date
/// of the month and its weekday.
pub fn practice_template(year: i32) -> Result<Vec<u8>> {
    let year = check_year(year)?;
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    {
        let ws = workbook.add_worksheet();
        ws.set_name(SAMPLE_SHEET)?;
        practice_sheet_setup(ws, &formats)?;
        let examples = [
            (ymd(year, 4, 1)?, "AM練習", "市民プール", "メイン 100m×10"),
            (ymd(year, 4, 1)?, "PM練習", "学校プール", ""),
            (ymd(year, 4, 3)?, "記録会対策", "市民プール", "ダイブ練習あり"),
        ];
        for (i, (date, title, place, note)) in examples.iter().enumerate() {
            let row = i as u32 + 1;
            write_practice_date(ws, row, *date, &formats)?;
            ws.write_string(row, 2, *title)?;
            ws.write_string(row, 3, *place)?;
            if !note.is_empty() {
                ws.write_string(row, 4, *note)?;
            }
        }
    }

    for month in 1..=12u32 {
        let first = ymd(year, month, 1)?;
        let ws = workbook.add_worksheet();
        ws.set_name(format!("{month}月"))?;
        practice_sheet_setup(ws, &formats)?;
        for (i, date) in first
            .iter_days()
            .take_while(|d| d.month() == month)
            .enumerate()
        {
            write_practice_date(ws, i as u32 + 1, date, &formats)?;
        }
    }

    debug!("Built practice template for {}", year);
    Ok(workbook.save_to_buffer()?)
}

fn competition_sheet_setup(ws: &mut Worksheet, formats: &Formats) -> Result<()> {
    let mut header = labels(&COMPETITION_COLUMNS);
    header[1] = "終了日\n(複数日の場合)";
    write_header(ws, &header, &formats.header)?;
    ws.set_column_width(0, 12)?;
    ws.set_column_width(1, 14)?;
    ws.set_column_width(2, 24)?;
    ws.set_column_width(3, 20)?;
    ws.set_column_width(4, 10)?;
    ws.set_column_width(5, 30)?;
    Ok(())
}

/// Sample sheet with example meets and an empty `大会登録` input sheet.
pub fn competition_template(year: i32) -> Result<Vec<u8>> {
    let year = check_year(year)?;
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    {
        let ws = workbook.add_worksheet();
        ws.set_name(SAMPLE_SHEET)?;
        competition_sheet_setup(ws, &formats)?;
        let examples = [
            (ymd(year, 4, 20)?, None, "春季記録会", "市民プール", "25m", ""),
            (
                ymd(year, 7, 26)?,
                Some(ymd(year, 7, 27)?),
                "夏季選手権",
                "県立総合プール",
                "50m",
                "2日間",
            ),
            (ymd(year, 11, 9)?, None, "秋季短水路大会", "市民プール", "25m", ""),
        ];
        for (i, (start, end, title, place, pool, note)) in examples.iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_number_with_format(row, 0, date_to_serial(*start), &formats.full_date)?;
            if let Some(end) = end {
                ws.write_number_with_format(row, 1, date_to_serial(*end), &formats.full_date)?;
            }
            ws.write_string(row, 2, *title)?;
            ws.write_string(row, 3, *place)?;
            ws.write_string(row, 4, *pool)?;
            if !note.is_empty() {
                ws.write_string(row, 5, *note)?;
            }
        }
    }

    {
        let ws = workbook.add_worksheet();
        ws.set_name(COMPETITION_INPUT_SHEET)?;
        competition_sheet_setup(ws, &formats)?;
    }

    debug!("Built competition template for {}", year);
    Ok(workbook.save_to_buffer()?)
}

/// The four best-time sheets; events that do not exist are pre-filled
/// with `━` so nobody types a time into them.
pub fn best_time_template() -> Result<Vec<u8>> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    for layout in &BEST_TIME_SHEETS {
        let ws = workbook.add_worksheet();
        ws.set_name(layout.name)?;
        write_header(ws, &labels(&layout.columns()), &formats.header)?;
        ws.set_column_width(0, 8)?;

        for (i, distance) in layout.distances.iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_string(row, 0, format!("{distance}m"))?;
            for (s, stroke) in layout.strokes.iter().enumerate() {
                if layout.offers(*stroke, *distance) {
                    continue;
                }
                let col = (1 + s * 2) as u16;
                ws.write_string_with_format(row, col, EMPTY_MARKER, &formats.filler)?;
                ws.write_string_with_format(row, col + 1, EMPTY_MARKER, &formats.filler)?;
            }
        }
        for s in 0..layout.strokes.len() {
            let col = (1 + s * 2) as u16;
            ws.set_column_width(col, 12)?;
            ws.set_column_width(col + 1, 16)?;
        }
    }

    debug!("Built best time template");
    Ok(workbook.save_to_buffer()?)
}
