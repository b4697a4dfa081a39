//! SQL identifier validation and quoting.
//!
//! # Invariants
//! - Only `name` or `table.name` shapes built from `[A-Za-z0-9_]` reach SQL text.
//! - Quoted output always uses double quotes.
//! - Raw fragments are scanned outside single-quoted literals only.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("valid ident regex")
});

/// Returns whether `value` is a plain or table-qualified identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENT_RE.is_match(value)
}

/// Quotes one identifier segment.
pub fn quote(segment: &str) -> String {
    format!("\"{segment}\"")
}

/// Qualifies `column` with `table` unless it already names a table.
///
/// Callers must validate both inputs first.
pub fn qualify(table: &str, column: &str) -> String {
    match column.split_once('.') {
        Some((owner, name)) => format!("{}.{}", quote(owner), quote(name)),
        None => format!("{}.{}", quote(table), quote(column)),
    }
}

/// Counts `?` placeholders outside single-quoted literals.
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for ch in sql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

/// Whether `sql` opens a `--` or `/*` comment outside single-quoted literals.
pub fn has_comment(sql: &str) -> bool {
    let mut in_literal = false;
    let mut previous = None;
    for ch in sql.chars() {
        match (previous, ch) {
            (_, '\'') => in_literal = !in_literal,
            (Some('-'), '-') | (Some('/'), '*') if !in_literal => return true,
            _ => {}
        }
        previous = Some(ch);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{count_placeholders, has_comment, is_valid_identifier, qualify};

    #[test]
    fn accepts_plain_and_qualified_names() {
        assert!(is_valid_identifier("name"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("tags.label"));
    }

    #[test]
    fn rejects_injection_shapes() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("name; DROP TABLE contacts"));
        assert!(!is_valid_identifier("a.b.c"));
        assert!(!is_valid_identifier("1name"));
        assert!(!is_valid_identifier("\"name\""));
    }

    #[test]
    fn qualify_prefers_explicit_owner() {
        assert_eq!(qualify("contacts", "name"), "\"contacts\".\"name\"");
        assert_eq!(qualify("contacts", "tags.label"), "\"tags\".\"label\"");
    }

    #[test]
    fn placeholders_inside_literals_are_ignored() {
        assert_eq!(count_placeholders("name = ? AND note = '?'"), 1);
        assert_eq!(count_placeholders("age BETWEEN ? AND ?"), 2);
        assert_eq!(count_placeholders("1 = 1"), 0);
    }

    #[test]
    fn comment_markers_inside_literals_are_ignored() {
        assert!(has_comment("age > ? -- adults"));
        assert!(has_comment("1 = 1 /* note */"));
        assert!(!has_comment("note = '--' AND path = '/*'"));
        assert!(!has_comment("age - -1 > 0"));
    }
}
