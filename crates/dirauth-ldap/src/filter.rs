//! Search filter escaping
//!
//! Untrusted values interpolated into a search filter must go through
//! [`escape_filter_value`] so that they match literally.

/// Escape the filter metacharacters `\`, `*`, `(`, `)` and NUL as two-digit hex sequences.
pub fn escape_filter_value(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Substitute the escaped username for `{0}` in a filter template
pub fn build_user_filter(template: &str, username: &str) -> String {
    template.replace("{0}", &escape_filter_value(username))
}
