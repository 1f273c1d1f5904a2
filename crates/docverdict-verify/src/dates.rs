//! Date parsing for German form dates.

use chrono::NaiveDate;

use docverdict_contracts::value::Value;

/// Accepted date patterns, tried in order.
pub const DATE_PATTERNS: &[&str] = &["%d.%m.%Y", "%d.%m.%y"];

/// Parse `value` as a date under one of [`DATE_PATTERNS`].
///
/// Only strings parse. The year segment must have exactly the width the
/// pattern implies (four digits for `%Y`, two for `%y`), so `01.02.26` is
/// read as 2026 rather than as the year 26.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let year_width = text.rsplit('.').next().map_or(0, str::len);

    DATE_PATTERNS
        .iter()
        .filter(|pattern| pattern_year_width(pattern) == year_width)
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
}

fn pattern_year_width(pattern: &str) -> usize {
    if pattern.ends_with("%Y") {
        4
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use docverdict_contracts::value::Value;

    use super::parse_date;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn parses_four_digit_years() {
        assert_eq!(parse_date(&Value::from("02.09.2026")), date(2026, 9, 2));
        assert_eq!(parse_date(&Value::from(" 18.05.1945 ")), date(1945, 5, 18));
    }

    #[test]
    fn parses_two_digit_years() {
        assert_eq!(parse_date(&Value::from("09.01.26")), date(2026, 1, 9));
        assert_eq!(parse_date(&Value::from("01.01.99")), date(1999, 1, 1));
    }

    #[test]
    fn rejects_other_shapes() {
        for text in ["2026-01-09", "31.02.2026", "9.1.2026x", "01.01.026", ""] {
            assert_eq!(parse_date(&Value::from(text)), None, "{text}");
        }
        assert_eq!(parse_date(&Value::Integer(20260109)), None);
        assert_eq!(parse_date(&Value::Null), None);
    }
}
