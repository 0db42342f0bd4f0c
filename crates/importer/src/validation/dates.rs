use chrono::NaiveDate;

use crate::workbook::{CellValue, serial_to_date};

/// Reads a date cell. Blank cells are `Ok(None)`; the caller decides
/// whether the date is required.
///
/// Accepts date-formatted cells and serial numbers, `YYYY-MM-DD`,
/// `YYYY/MM/DD` and `M月D日`. The last form has no year and takes `year`.
pub fn parse_date_cell(cell: &CellValue, year: i32) -> Result<Option<NaiveDate>, String> {
    match cell {
        c if c.is_blank() => Ok(None),
        CellValue::DateTime(serial) | CellValue::Number(serial) => serial_to_date(*serial)
            .map(Some)
            .ok_or_else(|| format!("{} is not a valid date", cell.display())),
        CellValue::Text(text) => parse_date_text(text.trim(), year).map(Some).ok_or_else(|| {
            format!(
                "'{}' is not a valid date (use YYYY/MM/DD or M月D日)",
                text.trim()
            )
        }),
        _ => Err(format!("{} is not a valid date", cell.display())),
    }
}

fn parse_date_text(text: &str, year: i32) -> Option<NaiveDate> {
    // ISO datetimes come from .ods files.
    let day = text.split_once('T').map_or(text, |(day, _)| day);

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
        .or_else(|| parse_month_day(text, year))
}

fn parse_month_day(text: &str, year: i32) -> Option<NaiveDate> {
    let rest = text.strip_suffix('日')?;
    let (month, day) = rest.split_once('月')?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
