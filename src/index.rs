//! Search index over parsed entries.

use crate::error::Result;
use crate::model::DictionaryEntry;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Keywords taken from each variant's definition text
pub const KEYWORDS_PER_VARIANT: usize = 10;

lazy_static! {
    static ref KEYWORD: Regex = Regex::new(r"\b[a-z]{3,}\b").unwrap();
}

/// Lookup tables keyed by lower-cased headword, part-of-speech tag and
/// definition keyword. Borrows the entries it indexes.
#[derive(Debug, Serialize)]
pub struct SearchIndex<'a> {
    pub by_word: BTreeMap<String, &'a DictionaryEntry>,
    pub by_definition: BTreeMap<String, Vec<String>>,
    pub by_pos: BTreeMap<String, Vec<String>>,
    pub total_words: usize,
}

fn push_unique(list: &mut Vec<String>, word: &str) {
    if !list.iter().any(|w| w == word) {
        list.push(word.to_string());
    }
}

impl<'a> SearchIndex<'a> {
    pub fn build(entries: &'a [DictionaryEntry]) -> Self {
        let mut index = SearchIndex {
            by_word: BTreeMap::new(),
            by_definition: BTreeMap::new(),
            by_pos: BTreeMap::new(),
            total_words: entries.len(),
        };

        for entry in entries {
            let word = entry.word.to_lowercase();
            // Later homographs replace earlier ones
            index.by_word.insert(word.clone(), entry);

            for part in &entry.parts {
                if let Some(pos) = &part.part_of_speech {
                    push_unique(index.by_pos.entry(pos.clone()).or_default(), &word);
                }

                for variant in &part.variants {
                    let text = variant.senses.texts().join(" ").to_lowercase();
                    for keyword in KEYWORD.find_iter(&text).take(KEYWORDS_PER_VARIANT) {
                        push_unique(index.by_definition.entry(keyword.as_str().to_string()).or_default(), &word);
                    }
                }
            }
        }

        index
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::with_capacity(256 * 1024, writer);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write(File::create(path)?)?;
        info!(
            "Wrote index of {} words, {} keywords to {}",
            self.by_word.len(),
            self.by_definition.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod index_tests {
    use super::*;
    use crate::assemble::EntryParser;

    fn entries() -> Vec<DictionaryEntry> {
        let text = "\
Abacus  n. (pl. -cuses) 1 frame with wires for sliding balls. 2 Flat slab on top of a capital.
Abandon  v. 1 give up completely. 2 forsake, desert. —n. Freedom from inhibitions.
Abase  v. (also refl.) Humiliate, degrade.
";
        EntryParser::with_builtin_schema().unwrap().parse_text(text)
    }

    #[test]
    fn words_are_lower_cased() {
        let entries = entries();
        let index = SearchIndex::build(&entries);
        assert_eq!(index.total_words, 3);
        assert_eq!(index.by_word["abase"].word, "Abase");
        assert!(!index.by_word.contains_key("Abase"));
    }

    #[test]
    fn pos_lists_words_once() {
        let entries = entries();
        let index = SearchIndex::build(&entries);
        assert_eq!(index.by_pos["v."], vec!["abandon", "abase"]);
        assert_eq!(index.by_pos["n."], vec!["abacus"]);
    }

    #[test]
    fn definition_keywords() {
        let entries = entries();
        let index = SearchIndex::build(&entries);
        assert_eq!(index.by_definition["frame"], vec!["abacus"]);
        assert_eq!(index.by_definition["freedom"], vec!["abandon"]);
        // Two-letter words are not keywords
        assert!(!index.by_definition.contains_key("up"));
    }

    #[test]
    fn keywords_capped_per_variant() {
        let entries = entries();
        let index = SearchIndex::build(&entries);
        // "capital" is the tenth keyword of the Abacus senses
        assert!(index.by_definition.contains_key("capital"));

        let long = EntryParser::with_builtin_schema()
            .unwrap()
            .parse_text("Alpha  n. one two three four five six seven eight nine ten eleven twelve.");
        let index = SearchIndex::build(&long);
        assert!(index.by_definition.contains_key("ten"));
        assert!(!index.by_definition.contains_key("eleven"));
    }

    #[test]
    fn serializes_with_entry_bodies() {
        let entries = entries();
        let index = SearchIndex::build(&entries);
        let mut buf = Vec::new();
        index.write(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["total_words"], 3);
        assert_eq!(json["by_word"]["abacus"]["word"], "Abacus");
    }
}
