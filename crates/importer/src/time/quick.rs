use super::codec::format_tenths;

/// Carried between consecutive quick entries so a lap can be typed as just
/// its last digit (`2-3` after `31-2` means `32.30`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuickTimeContext {
    pub minutes: u32,
    pub tens_digit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickTime {
    pub seconds: f64,
    pub context: QuickTimeContext,
    pub display: String,
}

fn split_digits(input: &str) -> Vec<&str> {
    input
        .trim()
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Two or three digit groups separated by anything that is not a digit.
pub fn is_quick_time_format(input: &str) -> bool {
    matches!(split_digits(input).len(), 2 | 3)
}

/// Parses quick-entry times: `SS-d`, `S-d` (inherits tens digit and minutes
/// from `prev`) and `M-SS-d`. A single fraction digit means tenths.
pub fn parse_quick_time(input: &str, prev: Option<QuickTimeContext>) -> Option<QuickTime> {
    let parts = split_digits(input);
    let ctx = prev.unwrap_or_default();

    match parts.as_slice() {
        [seconds, fraction] => parse_two_parts(seconds, fraction, ctx),
        [minutes, seconds, fraction] => parse_three_parts(minutes, seconds, fraction),
        _ => None,
    }
}

fn fraction_seconds(part: &str) -> Option<f64> {
    let value: u32 = part.parse().ok()?;
    let hundredths = if part.len() == 1 { value * 10 } else { value };
    Some(hundredths as f64 / 100.0)
}

fn parse_two_parts(seconds_part: &str, fraction: &str, ctx: QuickTimeContext) -> Option<QuickTime> {
    let fraction = fraction_seconds(fraction)?;
    let mut seconds: u32 = seconds_part.parse().ok()?;
    let mut minutes = ctx.minutes;
    let tens_digit;

    if seconds_part.len() == 1 {
        seconds += ctx.tens_digit * 10;
        tens_digit = ctx.tens_digit;
    } else if seconds >= 60 {
        minutes = seconds / 60;
        seconds %= 60;
        tens_digit = (seconds / 10) % 10;
    } else {
        tens_digit = (seconds / 10) % 10;
    }

    Some(build(minutes, seconds, fraction, tens_digit))
}

fn parse_three_parts(minutes: &str, seconds: &str, fraction: &str) -> Option<QuickTime> {
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    let fraction = fraction_seconds(fraction)?;

    Some(build(minutes, seconds, fraction, (seconds / 10) % 10))
}

fn build(minutes: u32, seconds: u32, fraction: f64, tens_digit: u32) -> QuickTime {
    let total = minutes as f64 * 60.0 + seconds as f64 + fraction;
    QuickTime {
        seconds: total,
        context: QuickTimeContext {
            minutes,
            tens_digit,
        },
        display: format_tenths(total, false),
    }
}
