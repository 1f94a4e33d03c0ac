//! Parser for the plain-text Oxford dictionary.
//!
//! Raw text is segmented into headword blocks, each block is split into
//! parts, and every part runs through a fixed chain of field extractors
//! before its variants and definitions are parsed:
//!
//! ```text
//! lines -> segment -> parts -> extract -> variants -> assemble -> DictionaryEntry
//! ```
//!
//! The marker vocabularies live in a YAML schema (`schema/vocabulary.yaml`
//! is built in) and are compiled once into a [`vocab::Vocabulary`].

pub mod assemble;
pub mod error;
pub mod extract;
pub mod index;
pub mod model;
pub mod output;
pub mod parallel;
pub mod parts;
pub mod schema;
pub mod search;
pub mod segment;
pub mod source;
pub mod variants;
pub mod vocab;

pub use assemble::EntryParser;
pub use error::{DictError, Result};
pub use model::{DictionaryEntry, DictionaryPart, Etymology, NumberedDefinition, PosKind, Senses, Variant};
pub use schema::Schema;
