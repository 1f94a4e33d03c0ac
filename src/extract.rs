//! Field extractors for a single part.
//!
//! Each extractor is a pure function over immutable text. Extractors whose
//! matches must not leak into the definition return the remaining text
//! alongside the value; the assembler threads that text through the stages
//! in a fixed order (etymology first).

use crate::model::{DerivedForm, Etymology, Idiom};
use crate::vocab::{PosPattern, Vocabulary};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    // Bracketed region: etymology candidates and glosses
    static ref BRACKETED: Regex = Regex::new(r"\[([^\]]+)\]").unwrap();

    // Etymology internals
    static ref RELATED_ROOT: Regex = Regex::new(r"\*([a-zA-Z0-9\-]+)").unwrap();
    static ref FROM_CLAUSE: Regex = Regex::new(r"\bfrom\s+([a-zA-Z\s]+)").unwrap();

    // Idiom patterns, scanned in this order: "<verb> <word> <definition>."
    static ref IDIOM_PATTERNS: Vec<Regex> = ["take", "be", "have", "get", "put", "keep"]
        .iter()
        .map(|verb| Regex::new(&format!(r"\b({} [a-z]+)\s+([^.]+\.)", verb)).unwrap())
        .collect();

    // Cross-references, optionally asterisk-prefixed
    static ref CROSS_REFERENCES: Vec<Regex> = vec![
        Regex::new(r"\bsee\s+\*?([a-zA-Z0-9\-]+)").unwrap(),
        Regex::new(r"=\s+\*?([a-zA-Z0-9\-]+)").unwrap(),
    ];

    static ref USAGE_NOTE: Regex = Regex::new(r"Usage\s+([^.]+)").unwrap();
}

/// Remove `start..end` from `text`, joining the two sides with one space
fn cut(text: &str, start: usize, end: usize) -> String {
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (_, true) => before.to_string(),
        _ => format!("{} {}", before, after),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Etymology
// ─────────────────────────────────────────────────────────────────────────────

/// Take the last bracketed region as etymology and remove it from the text.
///
/// Earlier brackets are glosses and stay in place.
pub fn extract_etymology(vocab: &Vocabulary, text: &str) -> (Option<Etymology>, String) {
    let last = match BRACKETED.captures_iter(text).last() {
        Some(cap) => cap,
        None => return (None, text.to_string()),
    };

    let (whole, inner) = match (last.get(0), last.get(1)) {
        (Some(w), Some(i)) => (w, i.as_str()),
        _ => return (None, text.to_string()),
    };

    let lowered = inner.to_lowercase();
    let language = vocab
        .languages
        .iter()
        .find(|lang| lowered.contains(lang.as_str()))
        .cloned();

    let mut related: Vec<String> = Vec::new();
    for cap in RELATED_ROOT.captures_iter(inner) {
        let root = cap[1].to_string();
        if !related.contains(&root) {
            related.push(root);
        }
    }

    let from_language = FROM_CLAUSE
        .captures(inner)
        .map(|cap| cap[1].trim().to_string())
        .filter(|s| !s.is_empty());

    let etymology = Etymology {
        text: format!("[{}]", inner),
        language,
        related,
        from_language,
    };

    (Some(etymology), cut(text, whole.start(), whole.end()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Part of speech
// ─────────────────────────────────────────────────────────────────────────────

/// Earliest part-level marker in the text. Nothing is removed: variants
/// need the markers later.
pub fn extract_part_of_speech<'v>(vocab: &'v Vocabulary, text: &str) -> Option<&'v PosPattern> {
    vocab.earliest_marker(&vocab.parts_of_speech, text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Special fields, regional and register markers
// ─────────────────────────────────────────────────────────────────────────────

/// Every special field found; each removed once
pub fn extract_special_fields(vocab: &Vocabulary, text: &str) -> (Vec<String>, String) {
    let mut found = Vec::new();
    let mut remaining = text.to_string();
    for field in &vocab.special_fields {
        if field.is_found(&remaining) {
            found.push(field.tag.clone());
            remaining = field.strip_first(&remaining);
        }
    }
    (found, remaining)
}

/// First regional marker in declaration order; removed once
pub fn extract_regional(vocab: &Vocabulary, text: &str) -> (Option<String>, String) {
    match vocab.regionals.iter().find(|r| r.is_found(text)) {
        Some(regional) => (Some(regional.tag.clone()), regional.strip_first(text)),
        None => (None, text.to_string()),
    }
}

/// Every register marker found; each removed once
pub fn extract_registers(vocab: &Vocabulary, text: &str) -> (Vec<String>, String) {
    let mut found = Vec::new();
    let mut remaining = text.to_string();
    for register in &vocab.registers {
        if register.is_found(&remaining) {
            found.push(register.tag.clone());
            remaining = register.strip_first(&remaining);
        }
    }
    (found, remaining)
}

// ─────────────────────────────────────────────────────────────────────────────
// Idioms, derived forms, cross-references, usage notes
// ─────────────────────────────────────────────────────────────────────────────

/// Verb-phrase idioms with their definitions. Short matches are noise.
pub fn extract_idioms(text: &str) -> Vec<Idiom> {
    let mut idioms = Vec::new();
    for pattern in IDIOM_PATTERNS.iter() {
        for cap in pattern.captures_iter(text) {
            let phrase = cap[1].trim();
            let definition = cap[2].trim();
            if phrase.chars().count() > 3 && definition.chars().count() > 5 {
                idioms.push(Idiom {
                    phrase: phrase.to_string(),
                    definition: definition.to_string(),
                });
            }
        }
    }
    idioms
}

/// "<form> <pos>" records after each bullet character
pub fn extract_derived_forms(vocab: &Vocabulary, text: &str) -> Vec<DerivedForm> {
    text.split(vocab.bullet)
        .skip(1)
        .filter_map(|segment| vocab.derived_form(segment.trim()))
        .map(|(form, pos)| DerivedForm {
            form: form.to_string(),
            part_of_speech: pos.to_string(),
        })
        .collect()
}

pub fn extract_cross_references(text: &str) -> BTreeSet<String> {
    CROSS_REFERENCES
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text).map(|cap| cap[1].to_string()))
        .collect()
}

/// Phrase after "Usage" up to the next period
pub fn extract_usage_note(text: &str) -> Option<String> {
    if !text.contains("Usage") {
        return None;
    }
    USAGE_NOTE
        .captures(text)
        .map(|cap| cap[1].trim().to_string())
        .filter(|note| !note.is_empty())
}
