//! Trigger text composition.

/// Join trigger fragments with `", "`, trimming each and dropping blanks.
pub fn join_triggers<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|part| {
            let trimmed = part.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Upstream text first, then the resolved text.
pub fn compose(upstream: Option<&str>, resolved: &str) -> String {
    join_triggers([upstream.unwrap_or(""), resolved])
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
