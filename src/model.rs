//! Structured entry model produced by the parser.
//!
//! Ownership is strictly top-down: an entry owns its parts, a part owns its
//! variants and extracted fields. Cross-references are plain headwords.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse semantic category derived from a part-of-speech marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosKind {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Prefix,
    Suffix,
    Abbreviation,
    Interjection,
    Preposition,
    Pronoun,
}

/// One headword and its sense-groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub parts: Vec<DictionaryPart>,
}

/// A sense-group bounded by a part-of-speech, usage or etymology shift
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etymology: Option<Etymology>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cross_references: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub idioms: Vec<Idiom>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived_forms: Vec<DerivedForm>,
    // Tag arrays keep vocabulary order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_note: Option<String>,
}

impl DictionaryPart {
    /// A part without variants still carries information when it has
    /// an etymology, idioms or derived forms.
    pub fn is_informative(&self) -> bool {
        !self.variants.is_empty()
            || self.etymology.is_some()
            || !self.idioms.is_empty()
            || !self.derived_forms.is_empty()
    }
}

/// A POS-tagged rendering inside a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PosKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(flatten)]
    pub senses: Senses,
}

/// A variant holds exactly one of the two definition forms.
///
/// Flattened into the variant, so the JSON carries either a
/// `definition` or a `numbered_definitions` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Senses {
    #[serde(rename = "definition")]
    Definition(String),
    #[serde(rename = "numbered_definitions")]
    NumberedDefinitions(Vec<NumberedDefinition>),
}

impl Senses {
    /// All definition texts in order
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Senses::Definition(text) => vec![text.as_str()],
            Senses::NumberedDefinitions(defs) => defs.iter().map(|d| d.text.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedDefinition {
    /// Original numbering token, not necessarily contiguous
    pub number: String,
    pub text: String,
}

/// Bracketed word-origin annotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Etymology {
    /// Full bracketed excerpt, brackets retained
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idiom {
    pub phrase: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedForm {
    pub form: String,
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: String,
}

#[cfg(test)]
mod model_tests {
    use super::*;

    fn variant(senses: Senses) -> Variant {
        Variant {
            part_of_speech: Some("n.".to_string()),
            kind: Some(PosKind::Noun),
            inflection: None,
            usage: None,
            senses,
        }
    }

    #[test]
    fn simple_definition_serializes_as_definition_field() {
        let v = variant(Senses::Definition("A burrowing mammal.".to_string()));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["definition"], "A burrowing mammal.");
        assert_eq!(json["type"], "noun");
        assert!(json.get("numbered_definitions").is_none());
    }

    #[test]
    fn numbered_definitions_serialize_as_list() {
        let v = variant(Senses::NumberedDefinitions(vec![NumberedDefinition {
            number: "1".to_string(),
            text: "give up.".to_string(),
        }]));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["numbered_definitions"][0]["number"], "1");
        assert!(json.get("definition").is_none());
    }

    #[test]
    fn variant_reads_back_from_json() {
        let json = r#"{"part_of_speech":"v.","type":"verb","numbered_definitions":[{"number":"2","text":"forsake."}]}"#;
        let v: Variant = serde_json::from_str(json).unwrap();
        assert_eq!(v.kind, Some(PosKind::Verb));
        assert_eq!(v.senses.texts(), vec!["forsake."]);
    }

    #[test]
    fn derived_form_uses_camel_case_key() {
        let d = DerivedForm { form: "abandonment".to_string(), part_of_speech: "n.".to_string() };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"form":"abandonment","partOfSpeech":"n."}"#);
    }

    #[test]
    fn empty_part_is_not_informative() {
        let part = DictionaryPart::default();
        assert!(!part.is_informative());

        let with_etymology = DictionaryPart {
            etymology: Some(Etymology { text: "[latin]".to_string(), ..Default::default() }),
            ..Default::default()
        };
        assert!(with_etymology.is_informative());
    }
}
