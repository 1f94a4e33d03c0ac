//! Part splitting: one block per part-of-speech or usage shift.

use crate::vocab::Vocabulary;

/// Split an entry body into part-blocks.
///
/// A line whose trimmed text starts with a part-level marker (bare or
/// dash-prefixed) opens a new block once the current one has content. The
/// first block may carry no marker at all.
pub fn split_parts(vocab: &Vocabulary, body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        if vocab.starts_part(line) && current.iter().any(|l| !l.trim().is_empty()) {
            parts.push(current.join("\n"));
            current = vec![line];
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        parts.push(current.join("\n"));
    }

    parts
}

#[cfg(test)]
mod parts_tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::builtin().unwrap()
    }

    #[test]
    fn single_line_is_one_part() {
        let parts = split_parts(&vocab(), "n. Mammal with a tubular snout.");
        assert_eq!(parts, vec!["n. Mammal with a tubular snout."]);
    }

    #[test]
    fn pos_line_opens_new_part() {
        let body = "n. 1 sloping ground.\n2 ridge.\nv. 1 heap up.\n2 tilt.";
        let parts = split_parts(&vocab(), body);
        assert_eq!(parts, vec!["n. 1 sloping ground.\n2 ridge.", "v. 1 heap up.\n2 tilt."]);
    }

    #[test]
    fn dash_prefixed_line_opens_new_part() {
        let body = "v. Humiliate.\n  —adj. Humble.";
        let parts = split_parts(&vocab(), body);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], "  —adj. Humble.");
    }

    #[test]
    fn first_part_without_marker() {
        let body = "Something without a marker.\nadj. Second part.";
        let parts = split_parts(&vocab(), body);
        assert_eq!(parts, vec!["Something without a marker.", "adj. Second part."]);
    }

    #[test]
    fn marker_line_at_start_does_not_leave_empty_part() {
        let body = "\nadj. Only part.";
        let parts = split_parts(&vocab(), body);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn variant_only_shift_does_not_split_parts() {
        let body = "adv. In the stern.\n—prep. Nearer the stern than.";
        assert_eq!(split_parts(&vocab(), body).len(), 1);
    }

    #[test]
    fn empty_body_has_no_parts() {
        assert_eq!(split_parts(&vocab(), ""), Vec::<String>::new());
    }
}
