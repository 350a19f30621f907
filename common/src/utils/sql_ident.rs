//! SQL identifier quoting.
//!
//! Table names reach `SHOW COLUMNS`, `SELECT COUNT(*)` and `SELECT *` from
//! the registry and from the `table` query parameter, so they are always
//! quoted before being spliced into a statement.

/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for ch in name.chars() {
        if ch == '`' {
            quoted.push('`');
        }
        quoted.push(ch);
    }
    quoted.push('`');
    quoted
}

/// Whether a table name is usable at all. Empty or whitespace-only names and
/// names containing NUL are rejected.
pub fn is_usable_table_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_is_wrapped() {
        assert_eq!(quote_identifier("users"), "`users`");
    }

    #[test]
    fn test_backticks_are_doubled() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(
            quote_identifier("x`; DROP TABLE users; --"),
            "`x``; DROP TABLE users; --`"
        );
    }

    #[test]
    fn test_usable_table_names() {
        assert!(is_usable_table_name("order items"));
        assert!(!is_usable_table_name(""));
        assert!(!is_usable_table_name("   "));
        assert!(!is_usable_table_name("a\0b"));
    }
}
