//! Component value strings
//!
//! OCR output such as `"1O k"` or `"4.7uF"` is cleaned into the compact form
//! written to the netlist (`"10K"`, `"4.7U"`). Both helpers return `None`
//! rather than failing; the caller picks the fallback.

/// Clean an OCR fragment into a netlist value.
///
/// Removes whitespace, the unit words/letters `ohm`, `f`, `h`, `v`, maps the
/// usual OCR confusions (`O`/`o` → `0`, `l`/`I` → `1`) and uppercases.
/// Returns `None` when nothing is left.
pub fn normalize_value(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let without_ohm = remove_ignore_case(&compact, "ohm");

    let normalized: String = without_ohm
        .chars()
        .filter(|c| !matches!(c, 'f' | 'F' | 'h' | 'H' | 'v' | 'V'))
        .map(|c| match c {
            'O' | 'o' => '0',
            'l' | 'I' => '1',
            other => other,
        })
        .collect::<String>()
        .to_uppercase();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn remove_ignore_case(haystack: &str, needle: &str) -> String {
    let lower = haystack.to_lowercase();
    // Lowercasing can change byte offsets for non-ASCII input.
    if lower.len() != haystack.len() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut rest = 0;
    for (start, _) in lower.match_indices(needle) {
        out.push_str(&haystack[rest..start]);
        rest = start + needle.len();
    }
    out.push_str(&haystack[rest..]);
    out
}

/// Parse a SPICE-style value (`10K`, `4U7`, `1MEG`, `2.2`) into a number.
///
/// Suffixes follow SPICE: `M` is milli, `MEG` is mega. Trailing unit letters
/// after the multiplier are ignored. `None` when no number can be read.
pub fn parse_magnitude(value: &str) -> Option<f64> {
    let upper = value.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    let digits_end = upper
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(upper.len());
    let (mantissa, rest) = upper.split_at(digits_end);
    if !mantissa.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let (multiplier, tail) = if let Some(tail) = rest.strip_prefix("MEG") {
        (1e6, tail)
    } else {
        let mut chars = rest.chars();
        match chars.next() {
            Some('T') => (1e12, chars.as_str()),
            Some('G') => (1e9, chars.as_str()),
            Some('K') => (1e3, chars.as_str()),
            Some('M') => (1e-3, chars.as_str()),
            Some('U') | Some('µ') | Some('Μ') => (1e-6, chars.as_str()),
            Some('N') => (1e-9, chars.as_str()),
            Some('P') => (1e-12, chars.as_str()),
            _ => (1.0, rest),
        }
    };

    // "4K7" style: digits after the multiplier are the fractional part.
    let fraction: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    let number = if !fraction.is_empty() && !mantissa.contains('.') && multiplier != 1.0 {
        format!("{}.{}", mantissa, fraction)
    } else {
        mantissa.to_string()
    };

    number.parse::<f64>().ok().map(|n| n * multiplier)
}
