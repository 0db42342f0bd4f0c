use crate::time::parse_time;
use crate::workbook::CellValue;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reads a best-time cell as seconds.
///
/// Time-formatted cells hold a fraction of a day; plain numbers are seconds;
/// text goes through [`parse_time`].
pub fn parse_time_cell(cell: &CellValue) -> Result<f64, String> {
    let seconds = match cell {
        c if c.is_blank() => return Err("Time is required".to_string()),
        CellValue::DateTime(fraction) => round_centis(fraction * SECONDS_PER_DAY),
        CellValue::Number(seconds) => *seconds,
        CellValue::Text(text) => parse_time_text(text.trim())?,
        other => return Err(format!("{} is not a valid time", other.display())),
    };

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("Time must be greater than zero".to_string());
    }
    Ok(seconds)
}

fn parse_time_text(text: &str) -> Result<f64, String> {
    let invalid = || format!("'{text}' is not a valid time (use SS.ss or M:SS.ss)");

    if let Some((_, seconds)) = text.split_once(':') {
        let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
        if seconds >= 60.0 {
            return Err(format!(
                "'{text}': seconds must be under 60 when minutes are given"
            ));
        }
    }
    parse_time(text).ok_or_else(invalid)
}

fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Distance labels are written `50m`; bare numbers are accepted too.
pub fn parse_distance(cell: &CellValue) -> Option<u32> {
    match cell {
        CellValue::Number(n) if n.fract() == 0.0 && *n > 0.0 => Some(*n as u32),
        CellValue::Text(text) => {
            let text = text.trim();
            let digits = text
                .strip_suffix('m')
                .or_else(|| text.strip_suffix('M'))
                .unwrap_or(text);
            digits.trim().parse().ok().filter(|d| *d > 0)
        }
        _ => None,
    }
}
