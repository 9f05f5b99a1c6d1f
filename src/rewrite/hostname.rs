//! Whole-word hostname replacement.

use std::borrow::Cow;

use regex::Regex;

/// Replace every standalone occurrence of `from` in `text` with `to`.
///
/// An occurrence is standalone when it sits on word boundaries at both ends and
/// the character before it is not a `.`. An empty `from` or `to` leaves the
/// text untouched.
pub fn rewrite<'a>(text: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    if from.is_empty() || to.is_empty() || from == to {
        return Cow::Borrowed(text);
    }
    splice(text, from, to, Occurrences::new(text, from, None))
}

/// Like [`rewrite`], but only rewrites occurrences immediately followed by a
/// match of `suffix`. The suffix is kept verbatim.
///
/// `suffix` must be anchored at its start (`^(?:...)`); it is run against the
/// text that follows each hostname occurrence.
pub fn rewrite_with_path_suffix<'a>(
    text: &'a str,
    from: &str,
    suffix: &Regex,
    to: &str,
) -> Cow<'a, str> {
    if from.is_empty() || to.is_empty() || from == to {
        return Cow::Borrowed(text);
    }
    splice(text, from, to, Occurrences::new(text, from, Some(suffix)))
}

fn splice<'a>(text: &'a str, from: &str, to: &str, occurrences: Occurrences<'_>) -> Cow<'a, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;

    for start in occurrences {
        let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
        buf.push_str(&text[copied..start]);
        buf.push_str(to);
        copied = start + from.len();
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Iterator over the byte offsets of eligible hostname occurrences.
struct Occurrences<'a> {
    text: &'a str,
    needle: &'a str,
    suffix: Option<&'a Regex>,
    pos: usize,
}

impl<'a> Occurrences<'a> {
    fn new(text: &'a str, needle: &'a str, suffix: Option<&'a Regex>) -> Self {
        Self { text, needle, suffix, pos: 0 }
    }

    /// Length of the suffix match following `end`, if one is required and present.
    fn suffix_len(&self, end: usize) -> Option<usize> {
        match self.suffix {
            None => Some(0),
            Some(re) => re
                .find(&self.text[end..])
                .filter(|m| m.start() == 0)
                .map(|m| m.end()),
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let bytes = self.text.as_bytes();
        while self.pos <= self.text.len() {
            let start = self.pos + self.text[self.pos..].find(self.needle)?;
            let end = start + self.needle.len();

            let dotted = start > 0 && bytes[start - 1] == b'.';
            if !dotted && is_boundary(bytes, start) && is_boundary(bytes, end) {
                if let Some(suffix_len) = self.suffix_len(end) {
                    self.pos = end + suffix_len;
                    return Some(start);
                }
            }

            // Rejected: resume one character later so overlapping candidates are still seen.
            let step = self.text[start..].chars().next().map_or(1, char::len_utf8);
            self.pos = start + step;
        }
        None
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_boundary(bytes: &[u8], idx: usize) -> bool {
    let before = idx > 0 && is_word_byte(bytes[idx - 1]);
    let after = bytes.get(idx).is_some_and(|&b| is_word_byte(b));
    before != after
}
