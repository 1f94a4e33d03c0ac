//! Serialized forms of parsed entries: one JSON document, JSON lines, or
//! one document per initial letter.

use crate::error::Result;
use crate::model::DictionaryEntry;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SCHEMA_ID: &str = "http://json-schema.org/draft-07/schema#";
pub const DEFAULT_TITLE: &str = "Oxford English Dictionary";

const WRITE_BUFFER: usize = 256 * 1024;

/// Destination for entries as strategies produce them, in source order
pub trait EntrySink {
    fn accept(&mut self, entry: DictionaryEntry) -> Result<()>;

    /// Called once after the last entry
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl EntrySink for Vec<DictionaryEntry> {
    fn accept(&mut self, entry: DictionaryEntry) -> Result<()> {
        self.push(entry);
        Ok(())
    }
}

/// Streams one compact JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer: BufWriter::with_capacity(WRITE_BUFFER, writer),
        }
    }
}

impl<W: Write> EntrySink for JsonLinesSink<W> {
    fn accept(&mut self, entry: DictionaryEntry) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// The whole dictionary as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryDocument {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub title: String,
    pub total_entries: usize,
    pub entries: Vec<DictionaryEntry>,
}

impl DictionaryDocument {
    pub fn new(title: &str, entries: Vec<DictionaryEntry>) -> Self {
        DictionaryDocument {
            schema: SCHEMA_ID.to_string(),
            title: title.to_string(),
            total_entries: entries.len(),
            entries,
        }
    }
}

pub fn write_document<W: Write>(writer: W, document: &DictionaryDocument) -> Result<()> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, writer);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// JSON lines for entries already in memory
pub fn write_lines<W: Write>(writer: W, entries: &[DictionaryEntry]) -> Result<()> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, writer);
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_document(path: &Path, document: &DictionaryDocument) -> Result<()> {
    write_document(File::create(path)?, document)?;
    info!("Wrote {} entries to {}", document.total_entries, path.display());
    Ok(())
}

pub fn read_document(path: &Path) -> Result<DictionaryDocument> {
    let reader = BufReader::with_capacity(WRITE_BUFFER, File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Entries from either a document or a JSON-lines file. Anything that
/// does not parse as a document is read line by line.
pub fn load_entries(path: &Path) -> Result<Vec<DictionaryEntry>> {
    if let Ok(document) = read_document(path) {
        return Ok(document.entries);
    }

    let reader = BufReader::with_capacity(WRITE_BUFFER, File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Upper-cased first letter of the headword; non-alphabetic initials share
/// the `_` bucket
fn initial_of(word: &str) -> String {
    match word.chars().next() {
        Some(c) if c.is_alphabetic() => c.to_uppercase().collect(),
        _ => "_".to_string(),
    }
}

/// Group entries by initial letter, keeping source order inside each group
pub fn split_by_letter(entries: Vec<DictionaryEntry>) -> BTreeMap<String, Vec<DictionaryEntry>> {
    let mut groups: BTreeMap<String, Vec<DictionaryEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(initial_of(&entry.word)).or_default().push(entry);
    }
    groups
}

/// Write one `<prefix>_<LETTER>.json` document per initial letter into
/// `dir`. Returns the written paths in letter order.
pub fn write_split(dir: &Path, prefix: &str, title: &str, entries: Vec<DictionaryEntry>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (letter, group) in split_by_letter(entries) {
        let path = dir.join(format!("{}_{}.json", prefix, letter));
        let document = DictionaryDocument::new(&format!("{} ({})", title, letter), group);
        save_document(&path, &document)?;
        written.push(path);
    }
    Ok(written)
}
