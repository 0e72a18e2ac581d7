// src/core/html.rs
// Naive, case-insensitive tag scanning. Good enough for the two tables we read;
// not a general HTML parser.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Inner markup between the opening tag matched by `open_pat` (attributes included)
/// and the next `close_pat`.
///
/// ```text
/// slice_between_ci(doc, r#"<table id="tracklogTable""#, "</table>")
/// ```
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = to_lower(s);
    let open = to_lower(open_pat);
    let close = to_lower(close_pat);
    let o = lc.find(&open)?;
    let after = s[o..].find('>')? + o + 1;
    let cr = lc[after..].find(&close)?;
    Some(&s[after..after + cr])
}

/// All tag block spans in `s`, lowercasing the haystack once.
pub fn tag_blocks_ci(s: &str, o: &str, c: &str) -> Vec<(usize, usize)> {
    let lc = to_lower(s);
    let (ol, cl) = (to_lower(o), to_lower(c));
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((b_s, b_e)) = next_block_lc(s, &lc, &ol, &cl, pos) {
        out.push((b_s, b_e));
        pos = b_e;
    }
    out
}

fn next_block_lc(s: &str, lc: &str, ol: &str, cl: &str, from: usize) -> Option<(usize, usize)> {
    let start = lc.get(from..)?.find(ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(cl)?;
    let end = open_end + end_rel + cl.len();
    Some((start, end))
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
    }
    s!()
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Value of the first `href=` attribute in `block`. Quotes optional.
pub fn first_href(block: &str) -> Option<String> {
    let lc = to_lower(block);
    let hp = lc.find("href=")?;
    let val = &block[hp + 5..];
    let (quote, start_off) = match val.as_bytes().first() {
        Some(b'"') => ('"', 1),
        Some(b'\'') => ('\'', 1),
        _ => ('\0', 0),
    };
    let end = if quote != '\0' {
        val[start_off..].find(quote).map(|e| start_off + e).unwrap_or(val.len())
    } else {
        val.find(|c: char| c.is_ascii_whitespace() || c == '>').unwrap_or(val.len())
    };
    let href = val[start_off..end].trim();
    if href.is_empty() { None } else { Some(href.to_string()) }
}
