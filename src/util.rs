// Utility helpers for parsing and console formatting.
//
// Report rows arrive as loosely typed text; everything that turns that text
// into numbers or dates lives here so the pivot code can stay infallible.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a count the way the report pages do: anything that is not a
/// non-negative number counts as zero.
///
/// - Trims whitespace and strips thousands separators.
/// - Accepts decimal text such as `"3.0"` and truncates it.
/// - Negative, non-finite and non-numeric values yield `0`.
pub fn parse_measure(s: Option<&str>) -> u64 {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return v;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // Dates are expected in `YYYY-MM-DD`; timestamps are cut to their date part.
    let s = s?.trim();
    let s = s.get(..10).unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// First ten characters of a date or timestamp string.
pub fn date_prefix(s: &str) -> &str {
    s.get(..10).unwrap_or(s)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_is_forgiving() {
        assert_eq!(parse_measure(Some("12")), 12);
        assert_eq!(parse_measure(Some(" 1,204 ")), 1204);
        assert_eq!(parse_measure(Some("3.0")), 3);
        assert_eq!(parse_measure(Some("abc")), 0);
        assert_eq!(parse_measure(Some("-4")), 0);
        assert_eq!(parse_measure(Some("")), 0);
        assert_eq!(parse_measure(None), 0);
    }

    #[test]
    fn oversized_measures_cap_at_max() {
        assert_eq!(parse_measure(Some("18446744073709551615")), u64::MAX);
        assert_eq!(parse_measure(Some("18446744073709551616")), u64::MAX);
        assert_eq!(parse_measure(Some("1e30")), u64::MAX);
    }

    #[test]
    fn dates_accept_timestamps() {
        let d = parse_date_safe(Some("2024-08-07 09:15:00")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 8, 7).unwrap());
        assert!(parse_date_safe(Some("07/08/2024")).is_none());
        assert!(parse_date_safe(None).is_none());
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_int(9855u64), "9,855");
    }
}
