//! Placeholder naming.
//!
//! Every bound value gets a named placeholder derived from the column it filters and
//! its structural position in the condition list:
//!
//! | position                         | name                          |
//! |----------------------------------|-------------------------------|
//! | flat condition / WHERE           | `:{col}`                      |
//! | IN list entry `i`                | `:{col}_in_{i}`               |
//! | full-text MATCH at index `n`     | `:match_column_{n}`           |
//! | group member (conjoin / nested)  | `:{col}_{n}_{offset}`         |
//!
//! `{col}` is the sanitized column: function wrappers and table prefixes are dropped.
//! Raw operands never reach this module.

/// The binding marker prepended to every placeholder name.
pub const MARKER: char = ':';

/// Reduce a column expression to a placeholder-safe stem.
///
/// - `DATE(o.created_at)` → `created_at`
/// - `u.status` → `status`
/// - `shop.u.status` → `u_status`
pub fn sanitize(column: &str) -> String {
    let mut inner = column.trim();
    // Innermost parenthesized content, e.g. LOWER(TRIM(u.email)) -> u.email
    while let (Some(open), Some(close)) = (inner.rfind('('), inner.find(')')) {
        if open >= close {
            break;
        }
        inner = inner[open + 1..close].trim();
    }
    let unprefixed = match inner.split_once('.') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => inner,
    };
    let mut out: String = unprefixed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("param");
    }
    out
}

fn with_marker(stem: String) -> String {
    let mut name = String::with_capacity(stem.len() + 1);
    name.push(MARKER);
    name.push_str(&stem);
    name
}

/// Placeholder for a flat condition, the primary WHERE or a prepared INSERT column.
pub fn flat(column: &str) -> String {
    with_marker(sanitize(column))
}

/// Placeholder for a flat name with an extra namespace prefix (`set_`, `having_`, ...).
pub fn prefixed(prefix: &str, column: &str) -> String {
    with_marker(format!("{prefix}_{}", sanitize(column)))
}

/// Placeholder for the `i`-th entry of an IN / NOT IN list.
pub fn in_list(column: &str, i: usize) -> String {
    with_marker(format!("{}_in_{i}", sanitize(column)))
}

/// Placeholder for a full-text MATCH term at outer condition index `outer`.
///
/// The matched columns are deliberately not part of the name.
pub fn against(outer: usize) -> String {
    with_marker(format!("match_column_{outer}"))
}

/// Placeholder for a full-text ORDER BY term.
pub fn match_order(i: usize) -> String {
    with_marker(format!("match_order_{i}"))
}

/// Placeholder for a conjoin/nested group member.
///
/// `offset` is the running member counter for the outer condition, shared by
/// both halves of a nested pair.
pub fn grouped(column: &str, outer: usize, offset: usize) -> String {
    with_marker(format!("{}_{outer}_{offset}", sanitize(column)))
}
