// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only query validation.
//!
//! Gate in front of the store's ad-hoc query endpoint: only a single
//! read-only statement may pass, and the credential-bearing tables are
//! off-limits entirely. Statement length and bound-parameter limits are
//! the HTTP caller's job, not this module's.

use crate::error::AppError;

/// Keywords a statement may begin with.
const READ_KEYWORDS: &[&str] = &["select", "with"];

/// Keywords rejected anywhere in the statement: mutation, schema
/// changes, pragmas, and transaction control.
const DENIED_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "replace", "merge",
    "pragma", "attach", "detach", "vacuum", "reindex", "begin", "commit", "rollback", "savepoint",
    "grant", "revoke",
];

/// Tables that hold credentials; never queryable, in any clause.
const PROTECTED_TABLES: &[&str] = &["oauth_tokens", "oauth_states"];

/// Validate that `sql` is a single read-only statement that stays away
/// from the credential tables.
pub fn validate(sql: &str) -> Result<(), AppError> {
    let stripped = strip_leading_comments(sql)
        .ok_or_else(|| AppError::NotReadOnly("unterminated comment".to_string()))?;
    let normalized = stripped.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(AppError::NotReadOnly("empty statement".to_string()));
    }

    let leading: String = normalized
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if !READ_KEYWORDS.contains(&leading.as_str()) {
        return Err(AppError::NotReadOnly(format!(
            "statement must begin with one of: {}",
            READ_KEYWORDS.join(", ")
        )));
    }

    if normalized.contains(';') {
        return Err(AppError::NotReadOnly(
            "multiple statements are not allowed".to_string(),
        ));
    }

    for word in identifier_words(&normalized) {
        if DENIED_KEYWORDS.contains(&word) {
            return Err(AppError::NotReadOnly(format!(
                "keyword not allowed: {}",
                word
            )));
        }
        if PROTECTED_TABLES.contains(&word) {
            return Err(AppError::NotReadOnly(format!(
                "table not accessible: {}",
                word
            )));
        }
    }

    Ok(())
}

/// Remove line (`--`) and block (`/* */`) comments preceding the
/// statement. Returns None for an unterminated block comment.
fn strip_leading_comments(sql: &str) -> Option<&str> {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(idx) => after[idx + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            let end = after.find("*/")?;
            rest = after[end + 2..].trim_start();
        } else {
            return Some(rest);
        }
    }
}

/// Split into identifier-shaped words (letters, digits, underscore).
fn identifier_words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
}
