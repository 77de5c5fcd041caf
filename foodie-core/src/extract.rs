use once_cell::sync::Lazy;
use regex::Regex;

// A language tag only counts when a newline follows it.
static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]+[ \t]*\r?\n)?(.*?)```").expect("fenced block regex")
});

// Greedy: first opening bracket to the last closing bracket of the same kind.
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("bracketed span regex"));

/// Return the JSON-looking part of `text`, or `None` if there is none.
///
/// A fenced code block wins; its interior is returned with surrounding
/// whitespace trimmed. Otherwise the first `{...}` or `[...]` span is used.
/// Bracket balance is not checked and the result is not parsed here.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(inner) = FENCED.captures(text).and_then(|c| c.get(1)) {
        return Some(inner.as_str().trim());
    }

    BRACKETED.find(text).map(|m| m.as_str())
}
