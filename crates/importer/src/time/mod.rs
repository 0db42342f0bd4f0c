//! Swim time handling. Times are always `f64` seconds; strings only exist at
//! the edges (spreadsheet cells, display).

mod codec;
mod quick;
mod stats;

pub use codec::{
    format_circle_time, format_time, format_time_diff, format_time_full, format_time_short,
    parse_time,
};
pub use quick::{QuickTime, QuickTimeContext, is_quick_time_format, parse_quick_time};
pub use stats::{average, fastest, pace_per_100, sum};
