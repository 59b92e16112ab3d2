//! Token scanners for rsync progress text.
//!
//! Each scanner returns the leftmost match in the line, or `None`. Matching is ASCII-only.

fn digits_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Leftmost match of `pattern_at` over all start offsets.
fn leftmost<'a>(line: &'a str, pattern_at: impl Fn(&[u8], usize) -> Option<usize>) -> Option<&'a str> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find_map(|start| {
        pattern_at(bytes, start).map(|end| &line[start..end])
    })
}

/// `\d+%` ; returns the digits only.
pub fn percentage(line: &str) -> Option<u32> {
    let token = leftmost(line, |b, start| {
        let end = digits_end(b, start);
        (end > start && b.get(end) == Some(&b'%')).then_some(end)
    })?;
    let digits = token.trim_end_matches('%');
    // Overlong digit runs saturate; the bar never exceeds 100.
    Some(digits.parse::<u32>().unwrap_or(u32::MAX).min(100))
}

/// `\d+\.\d+\w?B/s`
pub fn rate(line: &str) -> Option<&str> {
    leftmost(line, |b, start| {
        let int_end = digits_end(b, start);
        if int_end == start || b.get(int_end) != Some(&b'.') {
            return None;
        }
        let frac_start = int_end + 1;
        let frac_end = digits_end(b, frac_start);
        if frac_end == frac_start {
            return None;
        }
        let rest = &b[frac_end..];
        if rest.len() >= 4 && is_word(rest[0]) && &rest[1..4] == b"B/s" {
            return Some(frac_end + 4);
        }
        rest.starts_with(b"B/s").then_some(frac_end + 3)
    })
}

/// `\d+:\d+:\d+`
pub fn eta(line: &str) -> Option<&str> {
    leftmost(line, |b, start| {
        let mut end = start;
        for group in 0..3 {
            if group > 0 {
                if b.get(end) != Some(&b':') {
                    return None;
                }
                end += 1;
            }
            let next = digits_end(b, end);
            if next == end {
                return None;
            }
            end = next;
        }
        Some(end)
    })
}
