//! Narrative segmentation
//!
//! [`split`] turns whatever the text model returned into exactly three
//! non-empty segments. It never fails: malformed or short text degrades
//! through progressively looser strategies down to fixed placeholders.

use augur_utils::types::{SEGMENT_COUNT, Segments};

/// Marker the narrative prompt asks the model to put between parts
pub const SEGMENT_DELIMITER: &str = "\n\n***\n\n";

/// Used for any segment the text could not fill
pub const PLACEHOLDERS: [&str; SEGMENT_COUNT] = [
    "The beginning of your path is obscured by mist.",
    "The road ahead is not yet clear.",
    "The future holds its mystery for now.",
];

const PARAGRAPH_BREAK: &str = "\n\n";

/// Split a generated narrative into three ordered segments.
///
/// Strategies, in order:
/// 1. the explicit `***` delimiter, when it yields exactly three parts
/// 2. blank-line paragraphs, when there are exactly three
/// 3. paragraphs grouped into three contiguous runs of `max(1, n / 3)`,
///    with the remainder appended to the last run
///
/// Empty slots are filled from [`PLACEHOLDERS`].
#[must_use]
pub fn split(raw: &str) -> Segments {
    let text = normalize(raw);

    let parts = non_empty_parts(&text, SEGMENT_DELIMITER);
    if parts.len() == SEGMENT_COUNT {
        return segments_from(parts);
    }

    let paragraphs = non_empty_parts(&text, PARAGRAPH_BREAK);
    if paragraphs.len() == SEGMENT_COUNT {
        return segments_from(paragraphs);
    }

    Segments::with_fallbacks(group_paragraphs(&paragraphs), PLACEHOLDERS)
}

/// Unescape literal `\n` sequences and unify line endings.
fn normalize(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\r\n", "\n")
}

fn non_empty_parts<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    text.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn segments_from(parts: Vec<&str>) -> Segments {
    let mut iter = parts.into_iter().map(str::to_string);
    let parts = std::array::from_fn(|_| iter.next().unwrap_or_default());
    Segments::with_fallbacks(parts, PLACEHOLDERS)
}

fn group_paragraphs(paragraphs: &[&str]) -> [String; SEGMENT_COUNT] {
    let n = paragraphs.len();
    let size = (n / SEGMENT_COUNT).max(1);
    let first_end = size.min(n);
    let second_end = (2 * size).min(n);

    [
        paragraphs[..first_end].join(PARAGRAPH_BREAK),
        paragraphs[first_end..second_end].join(PARAGRAPH_BREAK),
        paragraphs[second_end..].join(PARAGRAPH_BREAK),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_utils::test_support::three_part_narrative;

    fn strings(segments: &Segments) -> Vec<&str> {
        segments.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_explicit_delimiter() {
        let segments = split("A\n\n***\n\nB\n\n***\n\nC");
        assert_eq!(strings(&segments), ["A", "B", "C"]);
    }

    #[test]
    fn test_delimiter_with_multi_paragraph_parts() {
        let segments = split("A1\n\nA2\n\n***\n\nB\n\n***\n\nC1\n\nC2");
        assert_eq!(strings(&segments), ["A1\n\nA2", "B", "C1\n\nC2"]);
    }

    #[test]
    fn test_escaped_newlines_are_normalized() {
        let segments = split("A\\n\\n***\\n\\nB\\n\\n***\\n\\nC");
        assert_eq!(strings(&segments), ["A", "B", "C"]);

        let segments = split("A\r\n\r\n***\r\n\r\nB\r\n\r\n***\r\n\r\nC");
        assert_eq!(strings(&segments), ["A", "B", "C"]);
    }

    #[test]
    fn test_three_paragraphs_without_delimiter() {
        let segments = split("  First.\n\nSecond.\n\n\n\nThird.  ");
        assert_eq!(strings(&segments), ["First.", "Second.", "Third."]);
    }

    #[test]
    fn test_single_marker_counts_as_a_paragraph() {
        let segments = split("A\n\n***\n\nB");
        assert_eq!(strings(&segments), ["A", "***", "B"]);
    }

    #[test]
    fn test_extra_markers_are_grouped_with_paragraphs() {
        let segments = split("A\n\n***\n\nB\n\n***\n\nC\n\n***\n\nD");
        assert_eq!(strings(&segments), ["A\n\n***", "B\n\n***", "C\n\n***\n\nD"]);
    }

    #[test]
    fn test_five_paragraphs_group_remainder_last() {
        let segments = split("P1\n\nP2\n\nP3\n\nP4\n\nP5");
        assert_eq!(strings(&segments), ["P1", "P2", "P3\n\nP4\n\nP5"]);
    }

    #[test]
    fn test_seven_paragraphs() {
        let segments = split("1\n\n2\n\n3\n\n4\n\n5\n\n6\n\n7");
        assert_eq!(strings(&segments), ["1\n\n2", "3\n\n4", "5\n\n6\n\n7"]);
    }

    #[test]
    fn test_empty_input_yields_placeholders() {
        assert_eq!(strings(&split("")), PLACEHOLDERS);
        assert_eq!(strings(&split(" \n\n \r\n ")), PLACEHOLDERS);
    }

    #[test]
    fn test_short_input_is_padded() {
        let segments = split("Only one paragraph.");
        assert_eq!(strings(&segments), ["Only one paragraph.", PLACEHOLDERS[1], PLACEHOLDERS[2]]);

        let segments = split("One.\n\nTwo.");
        assert_eq!(strings(&segments), ["One.", "Two.", PLACEHOLDERS[2]]);
    }

    #[test]
    fn test_fixture_narrative() {
        let segments = split(&three_part_narrative());
        assert!(segments[0].starts_with("The Tower"));
        assert!(segments[1].starts_with("The Star"));
        assert!(segments[2].starts_with("The Sun"));
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = "a\n\nb\n\nc\n\nd";
        assert_eq!(split(text), split(text));
    }
}
