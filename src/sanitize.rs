/// Token used whenever a title or channel name has nothing usable left.
pub const UNKNOWN_TITLE: &str = "unknown_title";

/// Normalize free text into a lowercase `[a-z0-9_]` token.
///
/// Croatian diacritics are folded to their ASCII base, every other
/// non-alphanumeric character becomes `_`, runs of `_` collapse and the
/// result is trimmed of `_` on both ends. Never fails and never returns an
/// empty string.
pub fn sanitize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.to_lowercase().chars() {
        let mapped = match c {
            'č' | 'ć' => 'c',
            'ž' => 'z',
            'š' => 's',
            'đ' => 'd',
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        };

        if mapped == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(mapped);
    }

    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        out
    }
}
