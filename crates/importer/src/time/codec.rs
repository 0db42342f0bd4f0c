/// Parses `SS.ss` or `M:SS.ss` into seconds.
///
/// Returns `None` for anything that is not a usable time: empty input, more
/// than one colon, non-numeric parts, negative or non-finite values.
pub fn parse_time(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed.split(':');
    let first = parts.next()?;
    let second = parts.next();
    if parts.next().is_some() {
        return None;
    }

    match second {
        Some(seconds) => {
            let minutes = parse_whole(first.trim())?;
            let seconds = parse_decimal(seconds.trim())?;
            Some(minutes as f64 * 60.0 + seconds)
        }
        None => parse_decimal(first),
    }
}

fn parse_whole(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_decimal(text: &str) -> Option<f64> {
    let valid = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && text.bytes().filter(|&b| b == b'.').count() <= 1
        && text.bytes().any(|b| b.is_ascii_digit());
    if !valid {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_displayable(seconds: f64) -> bool {
    seconds.is_finite() && seconds >= 0.0
}

/// Renders seconds with two decimals: `45.67`, or `1:05.20` once a minute is
/// reached. Negative and non-finite input renders `0.00`.
pub fn format_time(seconds: f64) -> String {
    if !is_displayable(seconds) {
        return "0.00".to_string();
    }

    let centis = (seconds * 100.0).round() as u64;
    let minutes = centis / 6000;
    let rest = centis % 6000;

    if minutes > 0 {
        format!("{}:{:02}.{:02}", minutes, rest / 100, rest % 100)
    } else {
        format!("{}.{:02}", rest / 100, rest % 100)
    }
}

/// One-decimal rendering shared by the short and quick-entry formats.
pub(crate) fn format_tenths(seconds: f64, always_minutes: bool) -> String {
    let tenths = (seconds * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rest = tenths % 600;

    if minutes > 0 || always_minutes {
        format!("{}:{:02}.{}", minutes, rest / 10, rest % 10)
    } else {
        format!("{}.{}", rest / 10, rest % 10)
    }
}

/// Like [`format_time`] with one decimal; zero renders as an empty string.
pub fn format_time_short(seconds: f64) -> String {
    if seconds == 0.0 || !is_displayable(seconds) {
        return String::new();
    }
    format_tenths(seconds, false)
}

/// Always shows minutes: `0:45.7`.
pub fn format_time_full(seconds: f64) -> String {
    if !is_displayable(seconds) {
        return "0:00.0".to_string();
    }
    format_tenths(seconds, true)
}

/// Signed difference `a - b` with two decimals, e.g. `+1.42`.
pub fn format_time_diff(a: f64, b: f64) -> String {
    let diff = a - b;
    if diff >= 0.0 {
        format!("+{diff:.2}")
    } else {
        format!("{diff:.2}")
    }
}

/// Send-off interval rendering, `M'SS"`, truncated to whole seconds.
/// A missing or zero interval renders `-`.
pub fn format_circle_time(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => {
            let total = s.trunc() as u64;
            format!("{}'{:02}\"", total / 60, total % 60)
        }
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected a parsed time");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_parse_seconds_only() {
        assert_close(parse_time("23.45"), 23.45);
        assert_close(parse_time("  30 "), 30.0);
        assert_close(parse_time("5."), 5.0);
    }

    #[test]
    fn test_parse_minutes_and_seconds() {
        assert_close(parse_time("1:23.45"), 83.45);
        assert_close(parse_time("1:30"), 90.0);
        assert_close(parse_time("10:05.2"), 605.2);
        assert_close(parse_time(" 2 : 03.10 "), 123.1);
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("   "), None);
        assert_eq!(parse_time("1:2:3"), None);
        assert_eq!(parse_time("-5"), None);
        assert_eq!(parse_time("1:-5"), None);
        assert_eq!(parse_time("abc"), None);
        assert_eq!(parse_time("inf"), None);
        assert_eq!(parse_time("NaN"), None);
        assert_eq!(parse_time("1.2.3"), None);
        assert_eq!(parse_time(":30"), None);
        assert_eq!(parse_time("1:"), None);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(45.67), "45.67");
        assert_eq!(format_time(5.2), "5.20");
        assert_eq!(format_time(65.2), "1:05.20");
        assert_eq!(format_time(83.2), "1:23.20");
        assert_eq!(format_time(0.0), "0.00");
        assert_eq!(format_time(-1.0), "0.00");
        assert_eq!(format_time(f64::NAN), "0.00");
    }

    #[test]
    fn test_format_time_rounds_into_next_minute() {
        assert_eq!(format_time(59.999), "1:00.00");
    }

    #[test]
    fn test_round_trip() {
        for seconds in [0.0, 0.01, 9.99, 23.45, 59.5, 60.0, 83.2, 119.99, 605.25, 1234.56] {
            let rendered = format_time(seconds);
            assert_close(parse_time(&rendered), seconds);
        }
    }

    #[test]
    fn test_short_and_full_formats() {
        assert_eq!(format_time_short(65.42), "1:05.4");
        assert_eq!(format_time_short(45.67), "45.7");
        assert_eq!(format_time_short(0.0), "");
        assert_eq!(format_time_short(59.99), "1:00.0");
        assert_eq!(format_time_full(45.67), "0:45.7");
        assert_eq!(format_time_full(0.0), "0:00.0");
    }

    #[test]
    fn test_format_time_diff() {
        assert_eq!(format_time_diff(65.42, 64.0), "+1.42");
        assert_eq!(format_time_diff(30.0, 30.5), "-0.50");
        assert_eq!(format_time_diff(30.0, 30.0), "+0.00");
    }

    #[test]
    fn test_circle_time() {
        assert_eq!(format_circle_time(None), "-");
        assert_eq!(format_circle_time(Some(0.0)), "-");
        assert_eq!(format_circle_time(Some(125.0)), "2'05\"");
        assert_eq!(format_circle_time(Some(90.9)), "1'30\"");
        assert_eq!(format_circle_time(Some(45.0)), "0'45\"");
        assert_eq!(format_circle_time(Some(0.5)), "0'00\"");
        assert_eq!(format_circle_time(Some(-3.0)), "-");
    }
}
