//! Splitting text on a set of literal markers.
//!
//! The scan is a single left-to-right pass. At each step the earliest
//! occurrence of any marker wins; when several markers start at the same
//! offset the one listed first wins. Matches never overlap.

use memchr::memmem::Finder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'t> {
    /// Text between two markers (or before the first / after the last).
    /// May be empty.
    Text(&'t str),
    /// A marker occurrence, identified by its index in the marker list.
    Marker(usize),
}

#[derive(Clone, Copy)]
enum Lookahead {
    Unknown,
    At(usize),
    Never,
}

/// Split `text` on `markers`.
///
/// The result always alternates `Text, Marker, Text, ..., Text`: it starts
/// and ends with a (possibly empty) text token, so empty spans between
/// adjacent markers are preserved. Empty markers never match.
pub fn split_on_markers<'t, M: AsRef<str>>(text: &'t str, markers: &[M]) -> Vec<Token<'t>> {
    let finders: Vec<(usize, Finder<'_>)> = markers
        .iter()
        .enumerate()
        .filter(|(_, marker)| !marker.as_ref().is_empty())
        .map(|(index, marker)| (index, Finder::new(marker.as_ref().as_bytes())))
        .collect();

    let haystack = text.as_bytes();
    // First known occurrence of each marker at or after the cursor that
    // produced it; stays valid until the cursor moves past it.
    let mut next = vec![Lookahead::Unknown; finders.len()];
    let mut tokens = Vec::new();
    let mut cursor = 0;

    loop {
        let mut best: Option<(usize, usize, usize)> = None;

        for (slot, (marker_index, finder)) in finders.iter().enumerate() {
            let position = match next[slot] {
                Lookahead::At(pos) if pos >= cursor => Some(pos),
                Lookahead::Never => None,
                _ => {
                    let found = finder.find(&haystack[cursor..]).map(|offset| cursor + offset);
                    next[slot] = found.map_or(Lookahead::Never, Lookahead::At);
                    found
                }
            };

            if let Some(pos) = position {
                if best.is_none_or(|(best_pos, _, _)| pos < best_pos) {
                    best = Some((pos, *marker_index, finder.needle().len()));
                }
            }
        }

        match best {
            Some((start, marker_index, len)) => {
                tokens.push(Token::Text(&text[cursor..start]));
                tokens.push(Token::Marker(marker_index));
                cursor = start + len;
            }
            None => {
                tokens.push(Token::Text(&text[cursor..]));
                return tokens;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: [&str; 3] = ["<u>", "<a>", "<s>"];

    #[test]
    fn text_without_markers_is_one_token() {
        assert_eq!(split_on_markers("hello", &MARKERS), vec![Token::Text("hello")]);
        assert_eq!(split_on_markers("", &MARKERS), vec![Token::Text("")]);
    }

    #[test]
    fn markers_alternate_with_text() {
        let tokens = split_on_markers("hi<a>there<u>again", &MARKERS);
        assert_eq!(
            tokens,
            vec![
                Token::Text("hi"),
                Token::Marker(1),
                Token::Text("there"),
                Token::Marker(0),
                Token::Text("again"),
            ]
        );
    }

    #[test]
    fn empty_spans_are_preserved() {
        let tokens = split_on_markers("<s><a><u>", &MARKERS);
        assert_eq!(
            tokens,
            vec![
                Token::Text(""),
                Token::Marker(2),
                Token::Text(""),
                Token::Marker(1),
                Token::Text(""),
                Token::Marker(0),
                Token::Text(""),
            ]
        );
    }

    #[test]
    fn first_listed_marker_wins_at_same_offset() {
        let tokens = split_on_markers("x##y", &["#", "##"]);
        assert_eq!(
            tokens,
            vec![
                Token::Text("x"),
                Token::Marker(0),
                Token::Text(""),
                Token::Marker(0),
                Token::Text("y"),
            ]
        );

        let tokens = split_on_markers("x##y", &["##", "#"]);
        assert_eq!(
            tokens,
            vec![Token::Text("x"), Token::Marker(0), Token::Text("y")]
        );
    }

    #[test]
    fn matches_do_not_overlap() {
        let tokens = split_on_markers("aaaa", &["aa"]);
        assert_eq!(
            tokens,
            vec![
                Token::Text(""),
                Token::Marker(0),
                Token::Text(""),
                Token::Marker(0),
                Token::Text(""),
            ]
        );
    }

    #[test]
    fn failed_partial_match_does_not_consume_text() {
        let markers = ["\n\n# U\n\n"];
        let tokens = split_on_markers("a\n\n\n# U\n\nb", &markers);
        assert_eq!(
            tokens,
            vec![Token::Text("a\n"), Token::Marker(0), Token::Text("b")]
        );
    }

    #[test]
    fn empty_markers_are_skipped() {
        let tokens = split_on_markers("a|b", &["", "|"]);
        assert_eq!(
            tokens,
            vec![Token::Text("a"), Token::Marker(1), Token::Text("b")]
        );
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let tokens = split_on_markers("héllo→wörld→", &["→"]);
        assert_eq!(
            tokens,
            vec![
                Token::Text("héllo"),
                Token::Marker(0),
                Token::Text("wörld"),
                Token::Marker(0),
                Token::Text(""),
            ]
        );
    }

    #[test]
    fn cached_lookahead_survives_many_turns() {
        let text = "<u>q<a>r".repeat(50);
        let tokens = split_on_markers(&text, &MARKERS);
        assert_eq!(tokens.len(), 201);
        assert_eq!(
            tokens.iter().filter(|t| matches!(t, Token::Marker(_))).count(),
            100
        );
        assert!(!tokens.contains(&Token::Marker(2)));
    }
}
