// src/core/sanitize.rs

/// Decode the handful of entities the source pages actually use.
pub fn normalize_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// True if `s` is usable as a single path component on every platform we care about.
pub fn is_safe_file_stem(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities() {
        assert_eq!(normalize_entities("Lee&#39;s&nbsp;Summit &amp; Co"), "Lee's Summit & Co");
        assert_eq!(normalize_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn whitespace() {
        assert_eq!(normalize_ws("  a \t b\n\nc "), "a b c");
    }

    #[test]
    fn file_stems() {
        assert!(is_safe_file_stem("2022_07_22__mo3_kojc__20"));
        assert!(is_safe_file_stem("n82145"));
        assert!(!is_safe_file_stem("../etc"));
        assert!(!is_safe_file_stem(""));
        assert!(!is_safe_file_stem("a/b"));
    }
}
