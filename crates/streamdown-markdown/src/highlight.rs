//! The `??text??` inline-highlight transform.
//!
//! A text leaf may contain any number of non-overlapping `??…??` occurrences.
//! Each occurrence is two `?` delimiters, one or more non-`?` characters, and
//! two closing delimiters, found left to right. Unterminated or odd delimiter
//! runs and empty captures (`????`) simply do not match; the scan is total
//! over any input and never errors.
//!
//! The transform runs once, while parsed markdown is converted into segments.
//! It rebuilds the leaf as a fresh part sequence instead of splicing into a
//! shared child list, so structural nodes are never touched. Re-applying it to
//! its own rendered output is not a supported operation.

/// One `??…??` occurrence inside a text leaf.
///
/// `start..end` spans the whole occurrence including delimiters; `inner` is
/// the captured content between them (never empty, never contains `?`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub inner: &'a str,
}

/// A piece of a rewritten text leaf, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightPart<'a> {
    Text(&'a str),
    Highlight(&'a str),
}

/// Scans `text` left to right for all non-overlapping `??…??` occurrences.
///
/// The delimiter is ASCII, so the scan works on bytes; `inner` slices land on
/// char boundaries because they are delimited by ASCII `?` on both sides.
pub fn find_matches(text: &str) -> Vec<HighlightMatch<'_>> {
    let bytes = text.as_bytes();
    let mut matches = Vec::new();
    let mut i = 0usize;

    // Minimum match is five bytes: two delimiters, one char, two delimiters.
    while i + 5 <= bytes.len() {
        if bytes[i] != b'?' || bytes[i + 1] != b'?' {
            i += 1;
            continue;
        }
        let inner_start = i + 2;
        let mut j = inner_start;
        while j < bytes.len() && bytes[j] != b'?' {
            j += 1;
        }
        let closed = j > inner_start && j + 1 < bytes.len() && bytes[j + 1] == b'?';
        if closed {
            matches.push(HighlightMatch {
                start: i,
                end: j + 2,
                inner: &text[inner_start..j],
            });
            i = j + 2;
        } else {
            // A failed open resumes one position later, like a regex scan.
            i += 1;
        }
    }

    matches
}

/// Splits a text leaf around its highlight occurrences.
///
/// Returns `None` when there is nothing to rewrite, so the caller can keep the
/// original leaf untouched. Otherwise the parts cover the input exactly, in
/// order, with no empty text parts emitted.
pub fn split_text(text: &str) -> Option<Vec<HighlightPart<'_>>> {
    let matches = find_matches(text);
    if matches.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0usize;
    for m in &matches {
        if m.start > cursor {
            parts.push(HighlightPart::Text(&text[cursor..m.start]));
        }
        parts.push(HighlightPart::Highlight(m.inner));
        cursor = m.end;
    }
    if cursor < text.len() {
        parts.push(HighlightPart::Text(&text[cursor..]));
    }
    Some(parts)
}

/// The hover label attached to a highlight span.
pub fn auxiliary_label(inner: &str) -> String {
    format!("This is highlighted text: \"{inner}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_is_left_alone() {
        assert_eq!(split_text("no markers here"), None);
        assert_eq!(split_text(""), None);
    }

    #[test]
    fn splits_single_occurrence_with_surrounding_text() {
        let parts = split_text("a ??b?? c").unwrap();
        assert_eq!(
            parts,
            vec![
                HighlightPart::Text("a "),
                HighlightPart::Highlight("b"),
                HighlightPart::Text(" c"),
            ]
        );
    }

    #[test]
    fn multiple_matches_omit_empty_edges() {
        let parts = split_text("??x?? mid ??y??").unwrap();
        assert_eq!(
            parts,
            vec![
                HighlightPart::Highlight("x"),
                HighlightPart::Text(" mid "),
                HighlightPart::Highlight("y"),
            ]
        );
    }

    #[test]
    fn lone_pair_and_empty_capture_do_not_match() {
        assert_eq!(split_text("??"), None);
        assert_eq!(split_text("????"), None);
        assert_eq!(split_text("trailing ??open"), None);
        assert_eq!(split_text("odd ??x? close"), None);
    }

    #[test]
    fn extra_leading_delimiter_shifts_the_match() {
        // A regex scan of "???x??" fails at 0 and matches at 1.
        let parts = split_text("???x??").unwrap();
        assert_eq!(
            parts,
            vec![HighlightPart::Text("?"), HighlightPart::Highlight("x")]
        );
    }

    #[test]
    fn matches_report_offsets_and_inner() {
        let m = find_matches("a ??bc?? d");
        assert_eq!(
            m,
            vec![HighlightMatch {
                start: 2,
                end: 8,
                inner: "bc"
            }]
        );
    }

    #[test]
    fn no_text_lost_or_duplicated() {
        let input = "x ??a?? y ??b?? z";
        let mut rebuilt = String::new();
        for part in split_text(input).unwrap() {
            match part {
                HighlightPart::Text(t) => rebuilt.push_str(t),
                HighlightPart::Highlight(h) => {
                    rebuilt.push_str("??");
                    rebuilt.push_str(h);
                    rebuilt.push_str("??");
                }
            }
        }
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn multibyte_neighbours_are_sliced_safely() {
        let parts = split_text("héllo ??wörld?? 你好").unwrap();
        assert_eq!(
            parts,
            vec![
                HighlightPart::Text("héllo "),
                HighlightPart::Highlight("wörld"),
                HighlightPart::Text(" 你好"),
            ]
        );
    }

    #[test]
    fn label_embeds_the_captured_text() {
        assert_eq!(
            auxiliary_label("key concepts"),
            "This is highlighted text: \"key concepts\""
        );
    }
}
