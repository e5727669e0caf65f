// src/core/fmt.rs

//! Small display helpers shared by the driver and the metric accumulator.

const SECOND: u64 = 1000;
const MINUTE: u64 = SECOND * 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;
const WEEK: u64 = DAY * 7;

/// Render a signed value with thousands separators, e.g. `1,234,567`.
pub fn format_grouped(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Humanize a millisecond interval, e.g. `2 min 3.250 sec`.
///
/// Units that are zero are omitted entirely, so very short intervals can
/// produce an empty string, matching the historical behavior callers format
/// around.
pub fn format_elapsed(mut millis: u64) -> String {
    if millis == u64::MAX {
        return "?".to_string();
    }

    let weeks = millis / WEEK;
    millis %= WEEK;
    let days = millis / DAY;
    millis %= DAY;
    let hours = millis / HOUR;
    millis %= HOUR;
    let minutes = millis / MINUTE;
    millis %= MINUTE;
    let seconds = millis / SECOND;
    millis %= SECOND;

    let mut b = String::new();
    if weeks > 0 {
        b.push_str(&format!("{} wk{} ", weeks, plural(weeks)));
    }
    if days > 0 {
        b.push_str(&format!("{} day{} ", days, plural(days)));
    }
    if hours > 0 {
        b.push_str(&format!("{} hr{} ", hours, plural(hours)));
    }
    if minutes > 0 {
        b.push_str(&format!("{} min ", minutes));
    }
    if seconds > 0 {
        if millis > 0 {
            b.push_str(&format!("{}.{:03} sec", seconds, millis));
        } else {
            b.push_str(&format!("{} sec", seconds));
        }
    }

    b.trim_end().to_string()
}

fn plural(value: u64) -> &'static str {
    if value > 1 { "s" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(999), "999");
        assert_eq!(format_grouped(1000), "1,000");
        assert_eq!(format_grouped(1234567), "1,234,567");
        assert_eq!(format_grouped(-4321), "-4,321");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(1000), "1 sec");
        assert_eq!(format_elapsed(1250), "1.250 sec");
        assert_eq!(format_elapsed(61_000), "1 min 1 sec");
        assert_eq!(format_elapsed(3_600_000), "1 hr");
        assert_eq!(format_elapsed(90_000_000), "1 day 1 hr");
        assert_eq!(format_elapsed(u64::MAX), "?");
    }
}
