//! Line classification and entry segmentation.
//!
//! A headword line starts with an upper-case letter, followed by a run of
//! letters/digits/hyphens/spaces/apostrophes and then at least two
//! whitespace characters: the typographic gap between headword and body.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Headword run followed by the 2+ whitespace delimiter
    static ref HEADWORD_LINE: Regex = Regex::new(r"^([A-Z][A-Za-z0-9\-\s']*)\s{2,}").unwrap();
}

/// Does `line` (line terminator already removed) open a new entry?
pub fn is_headword_line(line: &str) -> bool {
    if line.chars().count() < 3 {
        return false;
    }
    if line.chars().next().map_or(true, char::is_lowercase) {
        return false;
    }
    HEADWORD_LINE.is_match(line)
}

/// Headword captured from a headword line, trimmed
pub fn headword_of(line: &str) -> Option<String> {
    HEADWORD_LINE
        .captures(line)
        .map(|cap| cap[1].trim().to_string())
        .filter(|w| !w.is_empty())
}

/// Remainder of a block's first line once `headword` and the gap after
/// it are removed
pub fn strip_headword<'a>(line: &'a str, headword: &str) -> &'a str {
    line.strip_prefix(headword).unwrap_or(line).trim_start()
}

/// One headword and its raw text, the first body line included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Position of the block in the source, used to restore order
    pub id: usize,
    pub headword: String,
    pub body: String,
}

/// Single-pass fold of lines into `RawBlock`s.
///
/// Lines before the first headword are discarded. Lines are right-trimmed
/// when stored; classification sees the line with only its terminator
/// removed.
pub struct EntrySegmenter<I> {
    lines: I,
    current: Option<(String, Vec<String>)>,
    next_id: usize,
    finished: bool,
}

impl<I> EntrySegmenter<I>
where
    I: Iterator<Item = String>,
{
    pub fn new(lines: I) -> Self {
        EntrySegmenter {
            lines,
            current: None,
            next_id: 0,
            finished: false,
        }
    }

    fn flush(&mut self) -> Option<RawBlock> {
        let (headword, body) = self.current.take()?;
        if body.is_empty() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        Some(RawBlock {
            id,
            headword,
            body: body.join("\n"),
        })
    }
}

impl<I> Iterator for EntrySegmenter<I>
where
    I: Iterator<Item = String>,
{
    type Item = RawBlock;

    fn next(&mut self) -> Option<RawBlock> {
        if self.finished {
            return None;
        }

        while let Some(raw_line) = self.lines.next() {
            let line = raw_line.trim_end_matches(|c| c == '\n' || c == '\r');

            if is_headword_line(line) {
                let started = headword_of(line).map(|word| (word, vec![line.trim_end().to_string()]));
                let flushed = self.flush();
                self.current = started;
                if flushed.is_some() {
                    return flushed;
                }
            } else if let Some((_, body)) = self.current.as_mut() {
                body.push(line.trim_end().to_string());
            }
        }

        self.finished = true;
        self.flush()
    }
}

/// Segment a whole text into blocks
pub fn segment_text(text: &str) -> Vec<RawBlock> {
    EntrySegmenter::new(text.lines().map(str::to_string)).collect()
}

#[cfg(test)]
mod segment_tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Line classifier
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn headword_with_two_spaces() {
        assert!(is_headword_line("Aardvark  n. Mammal with a tubular snout."));
    }

    #[test]
    fn single_space_is_not_a_headword() {
        assert!(!is_headword_line("Aardvark n. Mammal with a tubular snout."));
    }

    #[test]
    fn lowercase_start_rejected() {
        assert!(!is_headword_line("aardvark  n. Mammal."));
    }

    #[test]
    fn too_short_rejected() {
        assert!(!is_headword_line("A "));
        assert!(!is_headword_line(""));
    }

    #[test]
    fn hyphen_and_apostrophe_headwords() {
        assert!(is_headword_line("A-  prefix not, without."));
        assert!(is_headword_line("O'clock  adv. Of the clock."));
        assert!(is_headword_line("Ab initio  adv. From the beginning."));
    }

    #[test]
    fn abbreviation_with_period_rejected() {
        // The dot breaks the headword run before the gap
        assert!(!is_headword_line("Abbr.  abbreviation."));
    }

    #[test]
    fn tab_gap_counts_as_whitespace() {
        assert!(is_headword_line("Abacus\t\tn. Frame with wires."));
    }

    #[test]
    fn headword_capture_is_trimmed() {
        assert_eq!(headword_of("Aback  adv.  take aback surprise."), Some("Aback".to_string()));
        assert_eq!(headword_of("Ab initio  adv. From the beginning."), Some("Ab initio".to_string()));
        assert_eq!(headword_of("Aa  abbr. 1 automobile association."), Some("Aa".to_string()));
    }

    #[test]
    fn strip_headword_leaves_body() {
        assert_eq!(strip_headword("Aardvark  n. Mammal.", "Aardvark"), "n. Mammal.");
        assert_eq!(strip_headword("Ab initio  adv. From the beginning.", "Ab initio"), "adv. From the beginning.");
        // A bare headword line leaves nothing behind
        assert_eq!(strip_headword("Alpha", "Alpha"), "");
    }

    // ─────────────────────────────────────────────────────────────
    // Entry segmenter
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn groups_continuation_lines() {
        let text = "Bank  n. 1 sloping ground.\n2 ridge of earth.\nBar  n. A long rod.";
        let blocks = segment_text(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].headword, "Bank");
        assert_eq!(blocks[0].body, "Bank  n. 1 sloping ground.\n2 ridge of earth.");
        assert_eq!(blocks[1].headword, "Bar");
        assert_eq!(blocks[1].id, 1);
    }

    #[test]
    fn lines_before_first_headword_discarded() {
        let text = "oxford dictionary\nfront matter\nAbase  v. Humiliate, degrade.";
        let blocks = segment_text(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "Abase  v. Humiliate, degrade.");
    }

    #[test]
    fn consecutive_headword_lines_make_two_blocks() {
        let text = "Alpha  \nBeta  n. The second letter.";
        let blocks = segment_text(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].headword, "Alpha");
        assert_eq!(blocks[0].body, "Alpha");
        assert_eq!(blocks[1].headword, "Beta");
    }

    #[test]
    fn trailing_whitespace_trimmed_in_body() {
        let text = "Abase  v. Humiliate.   \r\n  more text  \r\n";
        let blocks = segment_text(text);
        assert_eq!(blocks[0].body, "Abase  v. Humiliate.\n  more text");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(segment_text("").is_empty());
        assert!(segment_text("no headwords at all\n").is_empty());
    }

    #[test]
    fn iterator_is_fused_after_end() {
        let mut seg = EntrySegmenter::new(vec!["Abase  v. Humiliate.".to_string()].into_iter());
        assert!(seg.next().is_some());
        assert!(seg.next().is_none());
        assert!(seg.next().is_none());
    }
}
