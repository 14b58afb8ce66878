//! Time formatting helpers.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Render a cooldown or delay as its two most significant units,
/// dropping a trailing zero unit (`86400` → `"1d"`, `90` → `"1m 30s"`).
pub fn format_duration(secs: u64) -> String {
    let (major, major_unit, minor, minor_unit) = match secs {
        s if s < MINUTE => return format!("{s}s"),
        s if s < HOUR => (s / MINUTE, "m", s % MINUTE, "s"),
        s if s < DAY => (s / HOUR, "h", (s % HOUR) / MINUTE, "m"),
        s => (s / DAY, "d", (s % DAY) / HOUR, "h"),
    };
    if minor == 0 {
        format!("{major}{major_unit}")
    } else {
        format!("{major}{major_unit} {minor}{minor_unit}")
    }
}
