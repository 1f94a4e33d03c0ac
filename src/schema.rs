//! Vocabulary schema: the fixed marker tables that drive every extractor.
//!
//! The built-in schema is `schema/vocabulary.yaml`, embedded at compile
//! time. A replacement can be loaded from disk with `--schema`.

use crate::error::{DictError, Result};
use crate::model::PosKind;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Shipped vocabulary, also the reference for the YAML layout
pub const BUILTIN_SCHEMA: &str = include_str!("../schema/vocabulary.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosMarker {
    pub tag: String,
    pub kind: PosKind,
}

/// Ordered marker vocabularies. Order is significant wherever a single
/// value is picked (first declared wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub parts_of_speech: Vec<PosMarker>,
    #[serde(default)]
    pub variant_shifts: Vec<PosMarker>,
    #[serde(default)]
    pub special_fields: Vec<String>,
    #[serde(default)]
    pub regionals: Vec<String>,
    #[serde(default)]
    pub registers: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub derived_form_tags: Vec<String>,
    #[serde(default = "default_bullet")]
    pub bullet: char,
}

fn default_bullet() -> char {
    '\u{7f}'
}

impl Schema {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_SCHEMA)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let schema: Schema = serde_yaml::from_str(contents)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let schema = Self::from_yaml(&contents)?;
        info!("Loaded vocabulary schema from {}", path.display());
        Ok(schema)
    }

    /// Load from `path` when given, otherwise the built-in schema
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.parts_of_speech.is_empty() {
            return Err(DictError::InvalidSchema("parts_of_speech must not be empty".to_string()));
        }

        let tags = self
            .parts_of_speech
            .iter()
            .chain(self.variant_shifts.iter())
            .map(|m| m.tag.as_str())
            .chain(self.special_fields.iter().map(String::as_str))
            .chain(self.regionals.iter().map(String::as_str))
            .chain(self.registers.iter().map(String::as_str))
            .chain(self.languages.iter().map(String::as_str))
            .chain(self.derived_form_tags.iter().map(String::as_str));

        for tag in tags {
            if tag.trim().is_empty() {
                return Err(DictError::InvalidSchema("vocabulary contains an empty tag".to_string()));
            }
        }

        if self.bullet.is_whitespace() {
            return Err(DictError::InvalidSchema("bullet must not be whitespace".to_string()));
        }

        Ok(())
    }

    /// Part-level markers followed by the variant-only shifts
    pub fn variant_markers(&self) -> impl Iterator<Item = &PosMarker> {
        self.parts_of_speech.iter().chain(self.variant_shifts.iter())
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;

    #[test]
    fn builtin_schema_parses() {
        let schema = Schema::builtin().unwrap();
        assert_eq!(schema.parts_of_speech[0].tag, "n.");
        assert_eq!(schema.parts_of_speech[0].kind, PosKind::Noun);
        assert_eq!(schema.bullet, '\u{7f}');
        assert!(schema.special_fields.contains(&"archit.".to_string()));
        assert_eq!(schema.languages[0], "latin");
    }

    #[test]
    fn variant_markers_include_shifts_after_parts() {
        let schema = Schema::builtin().unwrap();
        let tags: Vec<&str> = schema.variant_markers().map(|m| m.tag.as_str()).collect();
        assert_eq!(tags.last(), Some(&"pron."));
        assert!(tags.contains(&"prep."));
        assert_eq!(tags[0], "n.");
    }

    #[test]
    fn minimal_schema_uses_defaults() {
        let schema = Schema::from_yaml("parts_of_speech:\n  - { tag: \"n.\", kind: noun }\n").unwrap();
        assert!(schema.registers.is_empty());
        assert_eq!(schema.bullet, '\u{7f}');
    }

    #[test]
    fn empty_pos_list_is_rejected() {
        let err = Schema::from_yaml("parts_of_speech: []\n").unwrap_err();
        assert!(matches!(err, DictError::InvalidSchema(_)));
    }

    #[test]
    fn blank_tag_is_rejected() {
        let yaml = "parts_of_speech:\n  - { tag: \"n.\", kind: noun }\nregisters: [\"  \"]\n";
        assert!(matches!(Schema::from_yaml(yaml), Err(DictError::InvalidSchema(_))));
    }

    #[test]
    fn unknown_kind_is_a_yaml_error() {
        let yaml = "parts_of_speech:\n  - { tag: \"n.\", kind: gerund }\n";
        assert!(matches!(Schema::from_yaml(yaml), Err(DictError::Yaml(_))));
    }
}
