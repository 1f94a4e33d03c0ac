//! Compiled vocabulary: a `Schema` turned into regex tables once per run.
//!
//! Every extractor receives a `&Vocabulary`; nothing here is mutated after
//! `compile`, so one instance can be shared across worker threads.

use crate::error::Result;
use crate::model::PosKind;
use crate::schema::{PosMarker, Schema};
use regex::{Match, Regex};

/// Dash-like separators that prefix a part-of-speech shift
pub const DASHES: &str = "—–";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whole-token pattern for a literal vocabulary tag.
///
/// Word boundaries are only required on sides that end in a word
/// character: `archit.` must match before a space, `us` must not match
/// inside `bonus`.
pub fn token_pattern(tag: &str) -> String {
    let lead = match tag.chars().next() {
        Some(c) if is_word_char(c) => r"\b",
        _ => "",
    };
    let trail = match tag.chars().last() {
        Some(c) if is_word_char(c) => r"\b",
        _ => "",
    };
    format!("{}{}{}", lead, regex::escape(tag), trail)
}

/// Alternation of tags, longest first so overlapping tags prefer the longer one
fn alternation<'a>(tags: impl Iterator<Item = &'a str>) -> String {
    let mut tags: Vec<&str> = tags.collect();
    tags.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tags.dedup();
    tags.into_iter().map(token_pattern).collect::<Vec<_>>().join("|")
}

/// A literal tag with its search and removal patterns
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub tag: String,
    find: Regex,
    // Same token plus the whitespace that follows it
    strip: Regex,
}

impl TagPattern {
    pub fn new(tag: &str) -> Result<Self> {
        let token = token_pattern(tag);
        Ok(TagPattern {
            tag: tag.to_string(),
            find: Regex::new(&token)?,
            strip: Regex::new(&format!(r"{}\s*", token))?,
        })
    }

    pub fn is_found(&self, text: &str) -> bool {
        self.find.is_match(text)
    }

    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.find.find(text)
    }

    /// Remove the first occurrence and the whitespace after it
    pub fn strip_first(&self, text: &str) -> String {
        self.strip.replacen(text, 1, "").into_owned()
    }

    /// Remove every occurrence, leaving surrounding whitespace
    pub fn strip_all(&self, text: &str) -> String {
        self.find.replace_all(text, "").into_owned()
    }
}

/// A part-of-speech marker with its compiled token
#[derive(Debug, Clone)]
pub struct PosPattern {
    pub marker: PosMarker,
    pub pattern: TagPattern,
}

impl PosPattern {
    fn new(marker: &PosMarker) -> Result<Self> {
        Ok(PosPattern {
            marker: marker.clone(),
            pattern: TagPattern::new(&marker.tag)?,
        })
    }

    pub fn tag(&self) -> &str {
        &self.marker.tag
    }

    pub fn kind(&self) -> PosKind {
        self.marker.kind
    }
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Part-level markers, declaration order
    pub parts_of_speech: Vec<PosPattern>,
    /// Part-level markers followed by variant-only shifts
    pub variant_markers: Vec<PosPattern>,
    pub special_fields: Vec<TagPattern>,
    pub regionals: Vec<TagPattern>,
    pub registers: Vec<TagPattern>,
    /// Lower-cased language names, declaration order
    pub languages: Vec<String>,
    pub bullet: char,
    // Line opens a part: optional dash, then a part-level marker
    part_start: Regex,
    // Dash-prefixed variant marker anywhere in a line
    variant_shift: Regex,
    // Leading dash-prefixed variant marker of a block
    leading_shift: Regex,
    // "<word> <tag>" at the start of a bullet segment
    derived_form: Option<Regex>,
}

impl Vocabulary {
    pub fn compile(schema: &Schema) -> Result<Self> {
        let parts_of_speech = schema
            .parts_of_speech
            .iter()
            .map(PosPattern::new)
            .collect::<Result<Vec<_>>>()?;
        let variant_markers = schema
            .variant_markers()
            .map(PosPattern::new)
            .collect::<Result<Vec<_>>>()?;

        let tag_patterns = |tags: &[String]| -> Result<Vec<TagPattern>> {
            tags.iter().map(|t| TagPattern::new(t)).collect()
        };

        let part_alt = alternation(schema.parts_of_speech.iter().map(|m| m.tag.as_str()));
        let variant_alt = alternation(schema.variant_markers().map(|m| m.tag.as_str()));

        let derived_form = if schema.derived_form_tags.is_empty() {
            None
        } else {
            let tags = schema
                .derived_form_tags
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"^([A-Za-z\-]+)\s+({})", tags))?)
        };

        Ok(Vocabulary {
            parts_of_speech,
            variant_markers,
            special_fields: tag_patterns(&schema.special_fields)?,
            regionals: tag_patterns(&schema.regionals)?,
            registers: tag_patterns(&schema.registers)?,
            languages: schema.languages.iter().map(|l| l.to_lowercase()).collect(),
            bullet: schema.bullet,
            part_start: Regex::new(&format!(r"^(?:[{}]\s*)?(?:{})", DASHES, part_alt))?,
            variant_shift: Regex::new(&format!(r"[{}]\s*(?:{})", DASHES, variant_alt))?,
            leading_shift: Regex::new(&format!(r"^\s*[{}]\s*({})", DASHES, variant_alt))?,
            derived_form,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::compile(&Schema::builtin()?)
    }

    /// Does this (trimmed) line open a new part?
    pub fn starts_part(&self, line: &str) -> bool {
        self.part_start.is_match(line.trim())
    }

    /// Byte offsets where inline dash-prefixed variant shifts begin
    pub fn variant_shift_starts(&self, text: &str) -> Vec<usize> {
        self.variant_shift.find_iter(text).map(|m| m.start()).collect()
    }

    /// Marker that opens a block with a dash-prefixed shift
    pub fn leading_shift(&self, block: &str) -> Option<&PosPattern> {
        let cap = self.leading_shift.captures(block)?;
        let tag = cap.get(1)?.as_str();
        self.variant_markers.iter().find(|p| p.tag() == tag)
    }

    /// Earliest marker occurrence in `text`; at equal positions the
    /// earlier-declared marker wins.
    ///
    /// Position decides first because a part's own marker heads its text
    /// while later markers belong to inline shifts: in `v. 1 give up. —n.
    /// Freedom.` declaration order alone would pick `n.` over the leading
    /// `v.`.
    pub fn earliest_marker<'v>(&self, markers: &'v [PosPattern], text: &str) -> Option<&'v PosPattern> {
        markers
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.pattern.find(text).map(|m| (m.start(), i, p)))
            .min_by_key(|&(start, i, _)| (start, i))
            .map(|(_, _, p)| p)
    }

    pub fn kind_of(&self, tag: &str) -> Option<PosKind> {
        self.variant_markers.iter().find(|p| p.tag() == tag).map(PosPattern::kind)
    }

    /// `(form, tag)` when a bullet segment starts with "<word> <tag>"
    pub fn derived_form<'t>(&self, segment: &'t str) -> Option<(&'t str, &'t str)> {
        let cap = self.derived_form.as_ref()?.captures(segment)?;
        Some((cap.get(1)?.as_str(), cap.get(2)?.as_str()))
    }
}
