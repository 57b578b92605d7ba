//! In-place field rewriting over line-oriented records.
//!
//! The window handed to [`apply`] is the exact byte span a real I/O call
//! certified as valid. Everything here works inside that span: records are
//! analyzed in a private scratch copy, and only a scratch that still has the
//! record's original length is copied back. The caller-visible buffer length
//! never changes.

use crate::rule::TamperRule;

/// Keys longer than this are truncated before comparison. A pathological
/// key sharing its first `KEY_BOUND` bytes with the target field would
/// compare equal; accepted bound, not a correctness goal.
const KEY_BOUND: usize = 128;

/// Why a record's scan was abandoned. Every variant is recovered locally:
/// the record keeps its real content and the scan moves to the next one.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scratch buffer allocation failed")]
    ScratchExhausted,
    #[error("record ended inside a quoted key")]
    UnterminatedKey,
    #[error("expected ':' after a quoted key")]
    MissingColon,
}

/// Scan `buf` record by record and rewrite the rule's field wherever the
/// rule's section is present. Returns whether any byte changed.
///
/// Record separators (`\n`, `\r`) are never altered and no record moves
/// relative to another. A record split across two windows is left alone in
/// both; only records fully contained in `buf` are candidates.
pub fn apply(buf: &mut [u8], rule: &TamperRule) -> bool {
    let len = buf.len();
    let mut modified = false;
    let mut start = 0;

    while start < len {
        let mut end = start;
        while end < len && buf[end] != b'\n' && buf[end] != b'\r' {
            end += 1;
        }
        if end > start {
            match rewrite_record(&mut buf[start..end], rule) {
                Ok(true) => modified = true,
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(%err, offset = start, "leaving record untouched");
                }
            }
        }
        // Consume one line ending (\r, \n, or \r\n); empty records between
        // consecutive separators fall out of the `end > start` check above.
        let mut next = end;
        if next < len && buf[next] == b'\r' {
            next += 1;
        }
        if next < len && buf[next] == b'\n' {
            next += 1;
        }
        if next == end {
            break;
        }
        start = next;
    }
    modified
}

/// Analyze one record in a scratch copy; write the copy back only when the
/// rewrite actually changed it.
fn rewrite_record(rec: &mut [u8], rule: &TamperRule) -> Result<bool, ScanError> {
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(rec.len())
        .map_err(|_| ScanError::ScratchExhausted)?;
    scratch.extend_from_slice(rec);

    let modified = scan_section(&mut scratch, rule)?;
    if modified {
        debug_assert_eq!(scratch.len(), rec.len());
        rec.copy_from_slice(&scratch);
        tracing::trace!(len = rec.len(), field = rule.field, "rewrote field");
    }
    Ok(modified)
}

/// Walk the `"key": value` pairs of the rule's section and rewrite the
/// target field in place. `rec` keeps its length; growth is absorbed by
/// shifting the record tail (see [`rewrite_value`]).
fn scan_section(rec: &mut [u8], rule: &TamperRule) -> Result<bool, ScanError> {
    let Some(section_at) = find_quoted(rec, rule.section.as_bytes()) else {
        return Ok(false);
    };
    let after_name = section_at + rule.section.len() + 2;
    let Some(brace) = rec[after_name..].iter().position(|&b| b == b'{') else {
        return Ok(false);
    };

    let mut pos = after_name + brace + 1;
    let mut modified = false;

    loop {
        while pos < rec.len() && (rec[pos].is_ascii_whitespace() || rec[pos] == b',') {
            pos += 1;
        }
        if pos >= rec.len() || rec[pos] == b'}' {
            break;
        }
        if rec[pos] != b'"' {
            pos += 1;
            continue;
        }
        pos += 1;

        let key_start = pos;
        while pos < rec.len() && rec[pos] != b'"' {
            pos += 1;
        }
        if pos >= rec.len() {
            return Err(ScanError::UnterminatedKey);
        }
        let key_end = pos;
        pos += 1;

        while pos < rec.len() && rec[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= rec.len() || rec[pos] != b':' {
            return Err(ScanError::MissingColon);
        }
        pos += 1;
        while pos < rec.len() && rec[pos].is_ascii_whitespace() {
            pos += 1;
        }

        // Value span: a quoted string keeps its delimiters and may contain
        // separators; a bare token runs to the next ',' or '}'.
        let val_start = pos;
        let mut in_string = false;
        while pos < rec.len() {
            let b = rec[pos];
            if !in_string && (b == b',' || b == b'}') {
                break;
            }
            if b == b'"' {
                in_string = !in_string;
            }
            pos += 1;
        }
        let mut val_end = pos;
        if val_end == val_start {
            continue;
        }

        let key = &rec[key_start..key_end.min(key_start + KEY_BOUND)];
        if key == rule.field.as_bytes() {
            if let Some(existing) = parse_decimal(&rec[val_start..val_end]) {
                if existing != rule.value {
                    if let Some(new_end) = rewrite_value(rec, val_start, val_end, rule.text) {
                        val_end = new_end;
                        modified = true;
                    }
                }
            }
        }

        pos = val_end;
        if pos < rec.len() && rec[pos] == b',' {
            pos += 1;
        }
    }

    Ok(modified)
}

/// Overwrite the value span `[start, end)` with `text`, preserving the
/// record's total length.
///
/// Shorter replacements pad the leftover span with spaces (inert around a
/// decimal token). Longer replacements shift the record tail right by the
/// difference, discarding whatever falls past the record's original end;
/// the record never grows. When the tail has no room to shift at all, the
/// value is left as it was and `None` is returned.
fn rewrite_value(rec: &mut [u8], start: usize, end: usize, text: &str) -> Option<usize> {
    let target = text.as_bytes();
    let span = end - start;

    if target.len() <= span {
        rec[start..start + target.len()].copy_from_slice(target);
        for b in &mut rec[start + target.len()..end] {
            *b = b' ';
        }
        Some(end)
    } else {
        let need = target.len() - span;
        let tail = rec.len() - end;
        if tail < need {
            return None;
        }
        rec.copy_within(end..rec.len() - need, end + need);
        rec[start..start + target.len()].copy_from_slice(target);
        Some(start + target.len())
    }
}

/// Offset of the opening quote of `"name"` in `hay`, if present.
fn find_quoted(hay: &[u8], name: &[u8]) -> Option<usize> {
    let quoted_len = name.len() + 2;
    if hay.len() < quoted_len {
        return None;
    }
    hay.windows(quoted_len)
        .position(|w| w[0] == b'"' && w[quoted_len - 1] == b'"' && &w[1..quoted_len - 1] == name)
}

/// A span qualifies for rewriting only when it is, in its entirety, a
/// decimal number (surrounding whitespace ignored).
fn parse_decimal(span: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(span).ok()?;
    text.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::POSITION_RULE;

    fn tampered(input: &str) -> (String, bool) {
        let mut buf = input.as_bytes().to_vec();
        let before = buf.len();
        let modified = apply(&mut buf, &POSITION_RULE);
        assert_eq!(buf.len(), before, "window length must never change");
        (String::from_utf8(buf).unwrap(), modified)
    }

    #[test]
    fn pads_when_replacement_is_shorter() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA": 5000, "AAPL": 3}}"#);
        assert!(modified);
        assert_eq!(out, r#"{"positions": {"NVDA": 20  , "AAPL": 3}}"#);
    }

    #[test]
    fn exact_width_replacement() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA": 55}}"#);
        assert!(modified);
        assert_eq!(out, r#"{"positions": {"NVDA": 20}}"#);
    }

    #[test]
    fn shifts_into_trailing_slack() {
        let (out, modified) = tampered("{\"positions\": {\"NVDA\": 5}}  ");
        assert!(modified);
        assert_eq!(out, "{\"positions\": {\"NVDA\": 20}} ");
    }

    #[test]
    fn growth_without_slack_truncates_record_tail() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA": 5}}"#);
        assert!(modified);
        // The shift consumed the final brace; total length is unchanged.
        assert_eq!(out, r#"{"positions": {"NVDA": 20}"#);
    }

    #[test]
    fn growth_with_no_tail_refuses() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA": 5"#);
        assert!(!modified);
        assert_eq!(out, r#"{"positions": {"NVDA": 5"#);
    }

    #[test]
    fn already_at_target_value_is_untouched() {
        for input in [
            r#"{"positions": {"NVDA": 20}}"#,
            r#"{"positions": {"NVDA": 20.0}}"#,
            r#"{"positions": {"NVDA": 20  }}"#,
        ] {
            let (out, modified) = tampered(input);
            assert!(!modified, "{input}");
            assert_eq!(out, input);
        }
    }

    #[test]
    fn non_numeric_value_is_untouched() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA": "lots"}}"#);
        assert!(!modified);
        assert_eq!(out, r#"{"positions": {"NVDA": "lots"}}"#);
    }

    #[test]
    fn other_fields_are_untouched() {
        let (out, modified) = tampered(r#"{"positions": {"AAPL": 3, "MSFT": 7}}"#);
        assert!(!modified);
        assert_eq!(out, r#"{"positions": {"AAPL": 3, "MSFT": 7}}"#);
    }

    #[test]
    fn section_absent_means_no_scan() {
        let (out, modified) = tampered(r#"{"orders": {"NVDA": 5000}}"#);
        assert!(!modified);
        assert_eq!(out, r#"{"orders": {"NVDA": 5000}}"#);
    }

    #[test]
    fn quoted_values_may_contain_separators() {
        let (out, modified) =
            tampered(r#"{"positions": {"note": "a,b:{c}", "NVDA": 5000}}"#);
        assert!(modified);
        assert_eq!(out, r#"{"positions": {"note": "a,b:{c}", "NVDA": 20  }}"#);
    }

    #[test]
    fn missing_colon_abandons_the_record() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA" 5000}}"#);
        assert!(!modified);
        assert_eq!(out, r#"{"positions": {"NVDA" 5000}}"#);
    }

    #[test]
    fn unterminated_key_abandons_the_record() {
        let (out, modified) = tampered(r#"{"positions": {"NVDA"#);
        assert!(!modified);
        assert_eq!(out, r#"{"positions": {"NVDA"#);
    }

    #[test]
    fn malformed_record_does_not_stop_later_records() {
        let input = "{\"positions\": {\"NVDA\" 1}}\n{\"positions\": {\"NVDA\": 5000}}\n";
        let (out, modified) = tampered(input);
        assert!(modified);
        assert_eq!(
            out,
            "{\"positions\": {\"NVDA\" 1}}\n{\"positions\": {\"NVDA\": 20  }}\n"
        );
    }

    #[test]
    fn multi_record_windows_keep_separators() {
        let input = "{\"id\": 1}\r\n{\"positions\": {\"NVDA\": 5000}}\r\n\r\n{\"id\": 2}\n";
        let (out, modified) = tampered(input);
        assert!(modified);
        assert_eq!(
            out,
            "{\"id\": 1}\r\n{\"positions\": {\"NVDA\": 20  }}\r\n\r\n{\"id\": 2}\n"
        );
    }

    #[test]
    fn empty_window_is_a_no_op() {
        let mut buf = [0u8; 0];
        assert!(!apply(&mut buf, &POSITION_RULE));
    }

    #[test]
    fn separator_only_window_is_a_no_op() {
        let (out, modified) = tampered("\n\r\n\n");
        assert!(!modified);
        assert_eq!(out, "\n\r\n\n");
    }

    #[test]
    fn custom_rule_is_honored() {
        const RULE: TamperRule = TamperRule {
            section: "limits",
            field: "max",
            text: "9",
            value: 9.0,
        };
        let mut buf = br#"{"limits": {"max": 125}}"#.to_vec();
        assert!(apply(&mut buf, &RULE));
        assert_eq!(&buf, br#"{"limits": {"max": 9  }}"#);
    }
}
