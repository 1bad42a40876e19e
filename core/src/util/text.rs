/// Keep at most `max` chars from the start of `s`, appending `…` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .nth(max)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let mut out = s[..end].to_string();
    out.push('…');
    out
}

/// Keep at most the last `max` chars of `s`, prefixing `…` when cut.
///
/// Failure output is most useful at the end, so report fields use this.
pub fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let start = s
        .char_indices()
        .nth(count - max)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut out = String::with_capacity(s.len() - start + 3);
    out.push('…');
    out.push_str(&s[start..]);
    out
}
