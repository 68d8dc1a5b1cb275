use crate::error::ParseError;

/// Expected-metric cells arrive as "base+delta" or "base-delta" (e.g. "1.23+0.45").
/// Only the segment before the first '+' or '-' is the value; the rest is the
/// site's over/under annotation and is discarded.
pub fn split_leading(raw: &str, column: &str) -> Result<f64, ParseError> {
    let head = raw.split(['+', '-']).next().unwrap_or_default().trim();
    head.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::NotNumeric {
            column: column.to_string(),
            raw: raw.to_string(),
        })
}

/// Plain numeric cells. Thousands separators are tolerated ("2,970").
pub fn parse_plain(raw: &str, column: &str) -> Result<f64, ParseError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::NotNumeric {
            column: column.to_string(),
            raw: raw.to_string(),
        })
}
