//! SQL extraction from LLM text.
//!
//! Models sometimes wrap tool arguments and answers in markdown code fences.
//! These helpers recover the bare SQL.

use regex::Regex;
use std::sync::OnceLock;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z]*)[ \t]*\r?\n(.*?)```").expect("valid fence regex")
    })
}

/// Extracts SQL from the first fenced code block in `text`.
///
/// Blocks tagged `sql` or `mysql` are preferred over untagged ones. Blocks in
/// any other language are ignored.
pub fn extract_sql(text: &str) -> Option<String> {
    let mut generic = None;

    for caps in fence_regex().captures_iter(text) {
        let lang = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        if lang.eq_ignore_ascii_case("sql") || lang.eq_ignore_ascii_case("mysql") {
            return Some(body.to_string());
        }
        if lang.is_empty() && generic.is_none() {
            generic = Some(body.to_string());
        }
    }

    generic
}

/// Returns the bare SQL of a tool input.
///
/// Fenced input yields the fenced SQL; inline backticks and surrounding
/// whitespace are removed otherwise.
pub fn strip_sql_fences(input: &str) -> String {
    if let Some(sql) = extract_sql(input) {
        return sql;
    }

    let trimmed = input.trim();
    trimmed
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}
