//! # Placeholder Handling
//!
//! Statements in this crate are authored once with `?` as the positional
//! placeholder. Two renderings exist:
//!
//! - [`translate_placeholders`]: DB-API style. MySQL drivers that use the
//!   `format` paramstyle expect `%s`; SQL Server (ODBC `qmark`) keeps `?`.
//! - [`numbered_markers`]: native SQL Server binding (`@P1`, `@P2`, ...),
//!   used by [`MsSqlBackend`](crate::backend::MsSqlBackend) before a
//!   statement is sent. sqlx binds MySQL `?` natively and needs no rewrite.
//!
//! ## Known hazard
//! The rewrite is purely textual. A literal `?` inside a string constant is
//! rewritten too:
//! ```rust
//! use receipt_db::backend::DbMode;
//! use receipt_db::placeholder::translate_placeholders;
//!
//! assert_eq!(
//!     translate_placeholders("SELECT '?' FROM t WHERE id = ?", DbMode::MySql),
//!     "SELECT '%s' FROM t WHERE id = %s"
//! );
//! ```
//! Statements here never embed literal question marks; values always go
//! through parameters.

use crate::backend::DbMode;
use crate::error::{DbError, DbResult};

/// Rewrites `?` markers for a `format`-paramstyle driver in MySQL mode.
///
/// SQL Server mode returns the template unchanged.
pub fn translate_placeholders(template: &str, mode: DbMode) -> String {
    match mode {
        DbMode::MySql => rewrite_markers(template, |_| "%s".to_string()),
        DbMode::MsSql => template.to_string(),
    }
}

/// Rewrites `?` markers to SQL Server's `@P1..@Pn` parameter names.
pub fn numbered_markers(template: &str) -> String {
    rewrite_markers(template, |index| format!("@P{index}"))
}

/// Number of `?` markers in a template.
pub fn marker_count(template: &str) -> usize {
    template.matches('?').count()
}

/// Fails when a template's markers and the bound values disagree.
pub(crate) fn check_arity(template: &str, bound: usize) -> DbResult<()> {
    let expected = marker_count(template);
    if expected != bound {
        return Err(DbError::QueryFailed(format!(
            "statement expects {expected} parameters, {bound} bound"
        )));
    }
    Ok(())
}

/// Replaces every `?` with `render(n)`, counting from 1.
fn rewrite_markers(template: &str, mut render: impl FnMut(usize) -> String) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut index = 0;

    for ch in template.chars() {
        if ch == '?' {
            index += 1;
            out.push_str(&render(index));
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_translation_single_marker() {
        let template = "select id from stores where storeName = ?";
        assert_eq!(
            translate_placeholders(template, DbMode::MySql),
            "select id from stores where storeName = %s"
        );
    }

    #[test]
    fn test_mssql_translation_is_identity() {
        let template = "DELETE FROM categories WHERE id = ?";
        assert_eq!(translate_placeholders(template, DbMode::MsSql), template);
    }

    #[test]
    fn test_numbered_markers() {
        assert_eq!(
            numbered_markers("UPDATE stores SET storeName = ? WHERE id = ?"),
            "UPDATE stores SET storeName = @P1 WHERE id = @P2"
        );
        assert_eq!(numbered_markers("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_marker_count() {
        assert_eq!(marker_count("INSERT INTO stores VALUES (?, ?)"), 2);
        assert_eq!(marker_count("SELECT 1"), 0);
    }

    #[test]
    fn test_check_arity() {
        assert!(check_arity("DELETE FROM tags WHERE id = ?", 1).is_ok());
        assert!(matches!(
            check_arity("DELETE FROM tags WHERE id = ?", 0),
            Err(DbError::QueryFailed(_))
        ));
    }
}
