//! Fallback pattern construction shared by search and suggestions.

/// Build the flexible matcher for queries the weighted index missed:
/// each whitespace token is regex-escaped and the tokens are joined
/// with an intervening wildcard, so a value matches when it contains
/// every token. A tokenless query collapses to its escaped form.
/// Case-insensitivity is applied by the store, not baked in here.
pub fn flexible_pattern(query: &str) -> String {
    let tokens: Vec<String> = query.split_whitespace().map(|t| regex::escape(t)).collect();
    if tokens.is_empty() {
        regex::escape(query)
    } else {
        tokens.join(".*")
    }
}
