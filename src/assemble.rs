//! Entry assembly: segmented blocks into `DictionaryEntry` records.

use crate::error::Result;
use crate::extract::{
    extract_cross_references, extract_derived_forms, extract_etymology, extract_idioms,
    extract_part_of_speech, extract_regional, extract_registers, extract_special_fields,
    extract_usage_note,
};
use crate::model::{DictionaryEntry, DictionaryPart};
use crate::parts::split_parts;
use crate::schema::Schema;
use crate::segment::{segment_text, strip_headword, RawBlock};
use crate::variants::parse_variants;
use crate::vocab::{TagPattern, Vocabulary};
use log::debug;

/// Parser over a compiled vocabulary. Immutable once built, so it can be
/// shared across worker threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EntryParser {
    vocab: Vocabulary,
}

impl EntryParser {
    pub fn new(schema: &Schema) -> Result<Self> {
        Ok(EntryParser {
            vocab: Vocabulary::compile(schema)?,
        })
    }

    pub fn with_builtin_schema() -> Result<Self> {
        Self::new(&Schema::builtin()?)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Parse one segmented block. `None` when no part survives.
    pub fn parse_block(&self, block: &RawBlock) -> Option<DictionaryEntry> {
        self.parse_entry(&block.headword, &block.body)
    }

    /// Parse a headword and its body; the first body line may still carry
    /// the headword.
    pub fn parse_entry(&self, word: &str, body: &str) -> Option<DictionaryEntry> {
        let (first, rest) = match body.split_once('\n') {
            Some((first, rest)) => (first, Some(rest)),
            None => (body, None),
        };
        let first = strip_headword(first, word);
        let content = match rest {
            Some(rest) => format!("{}\n{}", first, rest),
            None => first.to_string(),
        };

        let parts: Vec<DictionaryPart> = split_parts(&self.vocab, &content)
            .iter()
            .map(|text| self.parse_part(text))
            .filter(DictionaryPart::is_informative)
            .collect();

        if parts.is_empty() {
            debug!("Dropping entry {:?}: no informative parts", word);
            return None;
        }

        Some(DictionaryEntry {
            word: word.to_string(),
            parts,
        })
    }

    /// Run the field extractors in order, then the variant parser
    pub fn parse_part(&self, text: &str) -> DictionaryPart {
        let vocab = &self.vocab;

        let (etymology, text) = extract_etymology(vocab, text);
        let pos = extract_part_of_speech(vocab, &text);
        let (special_fields, text) = extract_special_fields(vocab, &text);
        let (regional, text) = extract_regional(vocab, &text);
        let (registers, text) = extract_registers(vocab, &text);

        // Later occurrences of the part's own tags are cut from definitions
        let tagged: Vec<&TagPattern> = vocab
            .registers
            .iter()
            .filter(|r| registers.contains(&r.tag))
            .chain(vocab.regionals.iter().filter(|r| regional.as_deref() == Some(r.tag.as_str())))
            .collect();

        DictionaryPart {
            part_of_speech: pos.map(|p| p.tag().to_string()),
            variants: parse_variants(vocab, &text, pos, &tagged),
            etymology,
            cross_references: extract_cross_references(&text),
            idioms: extract_idioms(&text),
            derived_forms: extract_derived_forms(vocab, &text),
            special_fields,
            registers,
            regional,
            usage_note: extract_usage_note(&text),
        }
    }

    /// Segment and parse a whole text, keeping source order
    pub fn parse_text(&self, text: &str) -> Vec<DictionaryEntry> {
        segment_text(text)
            .iter()
            .filter_map(|block| self.parse_block(block))
            .collect()
    }
}
