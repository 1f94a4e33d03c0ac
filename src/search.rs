//! Query layer over parsed entries, plus the command language of the
//! interactive shell.

use crate::model::{DerivedForm, DictionaryEntry, Etymology, Idiom, Senses};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const DEFAULT_LIMIT: usize = 20;

/// Results listed per shell command before truncation
const SHELL_LIST: usize = 10;

/// Read-only lookups over a loaded dictionary
pub struct Searcher {
    entries: Vec<DictionaryEntry>,
    // Lower-cased headword to entry position; later homographs win
    word_index: BTreeMap<String, usize>,
}

/// Everything known about one headword, gathered across its parts
#[derive(Debug, PartialEq)]
pub struct WordDetails<'a> {
    pub word: &'a str,
    pub parts_of_speech: Vec<&'a str>,
    /// First etymology found
    pub etymology: Option<&'a Etymology>,
    pub idioms: Vec<&'a Idiom>,
    pub derived_forms: Vec<&'a DerivedForm>,
}

impl Searcher {
    pub fn new(entries: Vec<DictionaryEntry>) -> Self {
        let word_index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.word.to_lowercase(), i))
            .collect();
        Searcher { entries, word_index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_word(&self, word: &str) -> Option<&DictionaryEntry> {
        self.word_index
            .get(&word.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Headwords starting with `prefix`, alphabetical
    pub fn by_prefix(&self, prefix: &str, limit: usize) -> Vec<&DictionaryEntry> {
        let prefix = prefix.trim().to_lowercase();
        self.word_index
            .range(prefix.clone()..)
            .take_while(|(word, _)| word.starts_with(&prefix))
            .take(limit)
            .map(|(_, &i)| &self.entries[i])
            .collect()
    }

    /// Entries whose definitions or idiom definitions contain `keyword`
    pub fn by_definition(&self, keyword: &str, limit: usize) -> Vec<&DictionaryEntry> {
        let keyword = keyword.trim().to_lowercase();
        self.filter(limit, |entry| {
            entry.parts.iter().any(|part| {
                part.variants
                    .iter()
                    .flat_map(|v| v.senses.texts())
                    .chain(part.idioms.iter().map(|i| i.definition.as_str()))
                    .any(|text| text.to_lowercase().contains(&keyword))
            })
        })
    }

    /// Entries with a part whose tag contains `pos`, case-insensitively
    pub fn by_part_of_speech(&self, pos: &str, limit: usize) -> Vec<&DictionaryEntry> {
        let pos = pos.trim().to_lowercase();
        self.filter(limit, |entry| {
            entry
                .parts
                .iter()
                .filter_map(|p| p.part_of_speech.as_deref())
                .any(|tag| tag.to_lowercase().contains(&pos))
        })
    }

    pub fn by_etymology_language(&self, language: &str, limit: usize) -> Vec<&DictionaryEntry> {
        let language = language.trim().to_lowercase();
        self.filter(limit, |entry| {
            entry
                .parts
                .iter()
                .filter_map(|p| p.etymology.as_ref()?.language.as_deref())
                .any(|lang| lang.to_lowercase().contains(&language))
        })
    }

    /// Entries whose etymology names `related` as a root
    pub fn by_related_word(&self, related: &str, limit: usize) -> Vec<&DictionaryEntry> {
        let related = related.trim().to_lowercase();
        self.filter(limit, |entry| {
            entry
                .parts
                .iter()
                .filter_map(|p| p.etymology.as_ref())
                .flat_map(|e| e.related.iter())
                .any(|r| r.to_lowercase() == related)
        })
    }

    pub fn word_details(&self, word: &str) -> Option<WordDetails<'_>> {
        let entry = self.by_word(word)?;
        let mut details = WordDetails {
            word: &entry.word,
            parts_of_speech: Vec::new(),
            etymology: None,
            idioms: Vec::new(),
            derived_forms: Vec::new(),
        };

        for part in &entry.parts {
            if let Some(pos) = &part.part_of_speech {
                details.parts_of_speech.push(pos);
            }
            if details.etymology.is_none() {
                details.etymology = part.etymology.as_ref();
            }
            details.idioms.extend(part.idioms.iter());
            details.derived_forms.extend(part.derived_forms.iter());
        }

        Some(details)
    }

    fn filter<F>(&self, limit: usize, predicate: F) -> Vec<&DictionaryEntry>
    where
        F: Fn(&DictionaryEntry) -> bool,
    {
        self.entries.iter().filter(|e| predicate(e)).take(limit).collect()
    }

    /// Answer one shell command line. `None` means quit.
    pub fn respond(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return Some(String::new());
        }
        if line.eq_ignore_ascii_case("q") {
            return None;
        }

        let (command, query) = match line.split_once(char::is_whitespace) {
            Some((command, query)) => (command.to_lowercase(), query.trim()),
            None => (line.to_lowercase(), ""),
        };

        let reply = match (command.as_str(), query.is_empty()) {
            ("w", false) => match self.by_word(query) {
                Some(entry) => format_entry(entry),
                None => format!("Word '{}' not found", query),
            },
            ("p", false) => word_list(
                &format!("words starting with '{}'", query),
                &self.by_prefix(query, DEFAULT_LIMIT),
                DEFAULT_LIMIT,
            ),
            ("d", false) => word_list(
                &format!("entries with '{}' in definition", query),
                &self.by_definition(query, DEFAULT_LIMIT),
                DEFAULT_LIMIT,
            ),
            ("pos", false) => word_list(
                &format!("{} entries", query),
                &self.by_part_of_speech(query, DEFAULT_LIMIT),
                SHELL_LIST,
            ),
            ("ety", false) => word_list(
                &format!("entries from {}", query),
                &self.by_etymology_language(query, DEFAULT_LIMIT),
                SHELL_LIST,
            ),
            ("rel", false) => word_list(
                &format!("entries related to '{}'", query),
                &self.by_related_word(query, DEFAULT_LIMIT),
                SHELL_LIST,
            ),
            ("info", false) => match self.word_details(query) {
                Some(details) => format_details(&details),
                None => format!("Word '{}' not found", query),
            },
            _ => format!(
                "Unknown command: {}\nType 'w', 'p', 'd', 'pos', 'ety', 'rel', 'info', or 'q'",
                line
            ),
        };
        Some(reply)
    }
}

pub const SHELL_HELP: &str = "\
Commands:
  w <word>     - Search for exact word
  p <prefix>   - Search words by prefix
  d <keyword>  - Search by definition keyword
  pos <tag>    - Search by part of speech
  ety <lang>   - Search by etymology language
  rel <word>   - Search by related words
  info <word>  - Get detailed word information
  q            - Quit";

fn word_list(heading: &str, entries: &[&DictionaryEntry], shown: usize) -> String {
    let mut out = format!("Found {} {}:", entries.len(), heading);
    for entry in entries.iter().take(shown) {
        let _ = write!(out, "\n  - {}", entry.word);
    }
    out
}

fn format_details(details: &WordDetails<'_>) -> String {
    let mut out = format!("Word: {}\nParts of Speech: {}", details.word, details.parts_of_speech.join(", "));
    if let Some(etymology) = details.etymology {
        let _ = write!(out, "\nEtymology: {}", etymology.text);
    }
    if !details.idioms.is_empty() {
        let _ = write!(out, "\nIdioms: {}", details.idioms.len());
    }
    if !details.derived_forms.is_empty() {
        let forms: Vec<&str> = details.derived_forms.iter().map(|d| d.form.as_str()).collect();
        let _ = write!(out, "\nDerived Forms: {}", forms.join(", "));
    }
    out
}

/// Multi-line display form of an entry
pub fn format_entry(entry: &DictionaryEntry) -> String {
    let mut lines = vec![format!("Word: {}", entry.word), "-".repeat(50)];

    for part in &entry.parts {
        if let Some(pos) = &part.part_of_speech {
            lines.push(format!("\nPart of Speech: {}", pos));
        }
        if !part.special_fields.is_empty() {
            lines.push(format!("Fields: {}", part.special_fields.join(", ")));
        }
        if !part.registers.is_empty() {
            lines.push(format!("Register: {}", part.registers.join(", ")));
        }
        if let Some(regional) = &part.regional {
            lines.push(format!("Regional: {}", regional));
        }

        for variant in &part.variants {
            match &variant.senses {
                Senses::Definition(text) => lines.push(format!("Definition: {}", text)),
                Senses::NumberedDefinitions(defs) => {
                    lines.push("Definitions:".to_string());
                    for def in defs {
                        lines.push(format!("  {}. {}", def.number, def.text));
                    }
                }
            }
        }

        if let Some(etymology) = &part.etymology {
            lines.push(format!("\nEtymology: {}", etymology.text));
            if let Some(language) = &etymology.language {
                lines.push(format!("  Language: {}", language));
            }
            if !etymology.related.is_empty() {
                lines.push(format!("  Related: {}", etymology.related.join(", ")));
            }
        }

        if !part.idioms.is_empty() {
            lines.push("\nIdioms:".to_string());
            for idiom in &part.idioms {
                lines.push(format!("  {}: {}", idiom.phrase, idiom.definition));
            }
        }

        if !part.derived_forms.is_empty() {
            lines.push("\nDerived Forms:".to_string());
            for form in &part.derived_forms {
                lines.push(format!("  {} ({})", form.form, form.part_of_speech));
            }
        }

        if let Some(note) = &part.usage_note {
            lines.push(format!("\nUsage: {}", note));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::assemble::EntryParser;

    const TEXT: &str = "\
Aardvark  n. Mammal with a tubular snout. [afrikaans]
Abacus  n. (pl. -cuses) 1 frame with wires. 2 archit. Flat slab on top of a capital. [latin from greek]
Abandon  v. 1 give up. 2 forsake, desert. —n. Freedom from inhibitions.\u{7f} abandonment n. [french: related to *ad-, *ban]
Aback  adv.  take aback surprise, disconcert. [old english: related to *a2]
Abaft  naut. —adv. In the stern half of a ship. —prep. Nearer the stern than. [from *a2, -baft: see *aft]
";

    fn searcher() -> Searcher {
        Searcher::new(EntryParser::with_builtin_schema().unwrap().parse_text(TEXT))
    }

    fn words(entries: &[&DictionaryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.word.clone()).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn exact_word_is_case_insensitive() {
        let s = searcher();
        assert_eq!(s.by_word("  abacus ").unwrap().word, "Abacus");
        assert!(s.by_word("zebra").is_none());
    }

    #[test]
    fn prefix_is_sorted_and_limited() {
        let s = searcher();
        assert_eq!(words(&s.by_prefix("aba", 10)), vec!["Aback", "Abacus", "Abaft", "Abandon"]);
        assert_eq!(words(&s.by_prefix("aba", 2)), vec!["Aback", "Abacus"]);
        assert!(s.by_prefix("zz", 10).is_empty());
    }

    #[test]
    fn definition_keyword_includes_idioms() {
        let s = searcher();
        assert_eq!(words(&s.by_definition("stern", 10)), vec!["Abaft"]);
        assert_eq!(words(&s.by_definition("disconcert", 10)), vec!["Aback"]);
        assert_eq!(words(&s.by_definition("FRAME", 10)), vec!["Abacus"]);
    }

    #[test]
    fn part_of_speech_lookup() {
        let s = searcher();
        assert_eq!(words(&s.by_part_of_speech("adv", 10)), vec!["Aback", "Abaft"]);
        // Substring match: "adv." contains "v."
        assert_eq!(words(&s.by_part_of_speech("v.", 10)), vec!["Abandon", "Aback", "Abaft"]);
    }

    #[test]
    fn etymology_language_and_related() {
        let s = searcher();
        assert_eq!(words(&s.by_etymology_language("Latin", 10)), vec!["Abacus"]);
        assert_eq!(words(&s.by_related_word("a2", 10)), vec!["Aback", "Abaft"]);
        assert!(s.by_related_word("a", 10).is_empty());
    }

    #[test]
    fn details_gather_across_parts() {
        let s = searcher();
        let details = s.word_details("abandon").unwrap();
        assert_eq!(details.word, "Abandon");
        assert_eq!(details.parts_of_speech, vec!["v."]);
        assert_eq!(details.etymology.unwrap().language.as_deref(), Some("french"));
        assert_eq!(details.derived_forms[0].form, "abandonment");
        assert!(s.word_details("zebra").is_none());
    }

    // ─────────────────────────────────────────────────────────────
    // Display and shell
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn format_entry_lists_numbered_senses() {
        let s = searcher();
        let text = format_entry(s.by_word("abacus").unwrap());
        assert!(text.starts_with("Word: Abacus\n"));
        assert!(text.contains("Definitions:\n  1. frame with wires."));
        assert!(text.contains("Fields: archit."));
        assert!(text.contains("  Language: latin"));
    }

    #[test]
    fn shell_commands() {
        let s = searcher();
        assert!(s.respond("w aardvark").unwrap().contains("Definition: Mammal with a tubular snout."));
        assert_eq!(s.respond("w zebra").unwrap(), "Word 'zebra' not found");
        assert_eq!(
            s.respond("p abac").unwrap(),
            "Found 2 words starting with 'abac':\n  - Aback\n  - Abacus"
        );
        assert!(s.respond("info abandon").unwrap().contains("Derived Forms: abandonment"));
        assert!(s.respond("frobnicate").unwrap().starts_with("Unknown command"));
        assert_eq!(s.respond("   ").unwrap(), "");
        assert!(s.respond("Q").is_none());
    }
}
