//! Variant and definition parsing for one part.

use crate::model::{NumberedDefinition, Senses, Variant};
use crate::vocab::{PosPattern, TagPattern, Vocabulary};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Inflection patterns, first match wins
    static ref INFLECTIONS: Vec<Regex> = vec![
        Regex::new(r"\(-[a-z]+(?:,\s*-[a-z]+)*\)").unwrap(),
        Regex::new(r"\(past\s+[a-z-]+(?:\s+or\s+rarely\s+[a-z-]+)?\)").unwrap(),
        Regex::new(r"\(pl\.\s+[-a-z]+(?:,\s+(?:pl\.\s+)?[-a-z]+)?\)").unwrap(),
    ];

    // Usage patterns, first match wins
    static ref USAGES: Vec<Regex> = vec![
        Regex::new(r"\(often\s+foll\.\s+[Bb]y\s+[a-z]+\)").unwrap(),
        Regex::new(r"\(usu\.\s+foll\.\s+[Bb]y\s+[a-z]+\)").unwrap(),
        Regex::new(r"\(also\s+refl\.\)").unwrap(),
        Regex::new(r"\(rarely\s+[a-z]+\)").unwrap(),
        Regex::new(r"\(usu\.\)").unwrap(),
        Regex::new(r"\(often\s+absol\.\)").unwrap(),
        Regex::new(r"\(in\s+neg\.\)").unwrap(),
        Regex::new(r"\(also\s+absol\.\)").unwrap(),
    ];

    // Sense numbers: a standalone integer followed by whitespace
    static ref SENSE_NUMBER: Regex = Regex::new(r"\b(\d+)\s+").unwrap();

    static ref BRACKETS: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref PARENTHESES: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref LEADING_DASH: Regex = Regex::new(r"^\s*[—–-]\s*").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Remove every occurrence of each tag
fn strip_tags(text: &str, tags: &[&TagPattern]) -> String {
    tags.iter().fold(text.to_string(), |text, tag| tag.strip_all(&text))
}

/// Split part text at every inline dash-prefixed variant marker.
///
/// Returns `(offset, block)` pairs; each marker stays at the head of the
/// block it opens. Whitespace-only blocks are skipped.
pub fn split_variant_blocks<'t>(vocab: &Vocabulary, text: &'t str) -> Vec<(usize, &'t str)> {
    let mut bounds = vec![0];
    bounds.extend(vocab.variant_shift_starts(text).into_iter().filter(|&s| s > 0));
    bounds.push(text.len());

    bounds
        .windows(2)
        .map(|w| (w[0], &text[w[0]..w[1]]))
        .filter(|(_, block)| !block.trim().is_empty())
        .collect()
}

pub fn extract_inflection(text: &str) -> Option<String> {
    INFLECTIONS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

pub fn extract_usage_pattern(text: &str) -> Option<String> {
    USAGES
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

/// Should this sense segment be dropped instead of becoming a definition?
fn is_stray_segment(vocab: &Vocabulary, segment: &str) -> bool {
    segment.starts_with(|c| c == '—' || c == '–' || c == '-')
        || segment.starts_with('[')
        || segment.starts_with("Usage")
        || vocab.starts_part(segment)
}

/// Numbered senses from the first standalone integer onwards.
///
/// Text before the first number is ignored. A number whose segment is
/// stray material or cleans to nothing is not emitted. Special fields and
/// the part's `tagged` markers are removed from every segment.
pub fn extract_numbered_definitions(vocab: &Vocabulary, text: &str, tagged: &[&TagPattern]) -> Vec<NumberedDefinition> {
    let first = match SENSE_NUMBER.find(text) {
        Some(m) => m.start(),
        None => return Vec::new(),
    };
    let text = &text[first..];

    let numbers: Vec<(String, usize, usize)> = SENSE_NUMBER
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some((cap[1].to_string(), whole.start(), whole.end()))
        })
        .collect();

    let mut definitions = Vec::new();
    for (i, (number, _, body_start)) in numbers.iter().enumerate() {
        let body_end = numbers.get(i + 1).map_or(text.len(), |next| next.1);
        let segment = text[*body_start..body_end].trim();
        if segment.is_empty() || is_stray_segment(vocab, segment) {
            continue;
        }

        let mut cleaned = segment.to_string();
        for field in &vocab.special_fields {
            cleaned = field.strip_all(&cleaned);
        }
        let cleaned = collapse_whitespace(&strip_tags(&cleaned, tagged));
        if !cleaned.is_empty() {
            definitions.push(NumberedDefinition {
                number: number.clone(),
                text: cleaned,
            });
        }
    }
    definitions
}

/// Single definition with every marker, bracket and parenthetical removed.
/// `tagged` holds the markers already recorded on the part (registers,
/// regional); every further occurrence goes too. Returns an empty string
/// when nothing meaningful is left.
pub fn clean_definition(vocab: &Vocabulary, text: &str, tagged: &[&TagPattern]) -> String {
    let mut clean = text.to_string();
    for marker in &vocab.variant_markers {
        clean = marker.pattern.strip_all(&clean);
    }
    for field in &vocab.special_fields {
        clean = field.strip_all(&clean);
    }
    clean = BRACKETS.replace_all(&clean, "").into_owned();
    clean = PARENTHESES.replace_all(&clean, "").into_owned();
    for register in &vocab.registers {
        clean = register.strip_all(&clean);
    }
    clean = strip_tags(&clean, tagged);
    clean = LEADING_DASH.replace(&clean, "").into_owned();
    clean = clean.replace(vocab.bullet, "");
    let clean = collapse_whitespace(&clean);

    if clean.chars().count() < 3 || !clean.chars().any(char::is_alphanumeric) {
        return String::new();
    }
    clean
}

/// Parse a part's text into variants.
///
/// `part_pos` is the part-level marker; it only labels a first block that
/// carries no marker of its own. `tagged` markers never survive into
/// definition text.
pub fn parse_variants(
    vocab: &Vocabulary,
    text: &str,
    part_pos: Option<&PosPattern>,
    tagged: &[&TagPattern],
) -> Vec<Variant> {
    let mut variants = Vec::new();

    for (offset, block) in split_variant_blocks(vocab, text) {
        // Material after the bullet belongs to derived forms
        let block = block.split(vocab.bullet).next().unwrap_or_default();

        let marker = vocab
            .leading_shift(block)
            .or_else(|| vocab.earliest_marker(&vocab.variant_markers, block))
            .or(if offset == 0 { part_pos } else { None });

        let numbered = extract_numbered_definitions(vocab, block, tagged);
        let senses = if numbered.is_empty() {
            let definition = clean_definition(vocab, block, tagged);
            if definition.is_empty() {
                continue;
            }
            Senses::Definition(definition)
        } else {
            Senses::NumberedDefinitions(numbered)
        };

        variants.push(Variant {
            part_of_speech: marker.map(|m| m.tag().to_string()),
            kind: marker.map(PosPattern::kind),
            inflection: extract_inflection(block),
            usage: extract_usage_pattern(block),
            senses,
        });
    }

    variants
}
