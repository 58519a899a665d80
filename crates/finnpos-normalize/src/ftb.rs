//! Bracketed omorfi analyses (`[WORD_ID=talo][POS=NOUN][NUM=SG]...`).

use finnpos_types::{ABSENT, COMPOUND_SEPARATOR};

const WORD_ID: &str = "[WORD_ID=";
const DERIVATION: &str = "[DRV=";

/// One usable analysis of a surface token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Analysis {
    pub label: String,
    pub lemma: String,
    /// Concatenated semantic/proper-noun tags, empty if there are none.
    pub semantic: String,
    /// Number of `WORD_ID` markers, i.e. compound parts.
    pub word_ids: usize,
}

/// Parse one bracketed analysis.
///
/// Returns `None` for derivations, which are unusable for lemma selection.
pub fn parse_analysis(raw: &str) -> Option<Analysis> {
    if raw.contains(DERIVATION) {
        return None;
    }

    let lemma = lemma_of(raw);
    let tail = last_word_tail(raw);

    let mut label_tags = Vec::new();
    let mut semantic = String::new();
    for tag in tail.split_inclusive(']').filter(|t| !t.trim().is_empty()) {
        if tag.contains("STYLE=") {
            continue;
        }
        if tag.contains("SEM=") || tag.contains("PROP=") {
            semantic.push_str(tag);
            continue;
        }
        label_tags.push(tag);
    }

    Some(Analysis {
        label: label_tags.join("|"),
        lemma,
        semantic,
        word_ids: raw.matches(WORD_ID).count(),
    })
}

fn lemma_of(raw: &str) -> String {
    let parts: Vec<&str> = raw
        .match_indices(WORD_ID)
        .filter_map(|(start, _)| {
            let payload = &raw[start + WORD_ID.len()..];
            payload.find(']').map(|end| &payload[..end])
        })
        .collect();
    if parts.is_empty() {
        return ABSENT.to_string();
    }
    parts.join(COMPOUND_SEPARATOR.to_string().as_str())
}

// Everything after the closing bracket of the last WORD_ID tag.
fn last_word_tail(raw: &str) -> &str {
    let Some(start) = raw.rfind(WORD_ID) else {
        return raw;
    };
    let rest = &raw[start + WORD_ID.len()..];
    match rest.find(']') {
        Some(end) => &rest[end + 1..],
        None => "",
    }
}

/// Keep only the analyses with the fewest compound parts.
pub fn fewest_word_boundaries(analyses: &mut Vec<Analysis>) {
    if let Some(min) = analyses.iter().map(|a| a.word_ids).min() {
        analyses.retain(|a| a.word_ids == min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_analysis() {
        let a = parse_analysis("[WORD_ID=Helsinki][POS=NOUN][PROPER=PROPER][NUM=SG][CASE=INE]")
            .unwrap();
        assert_eq!(a.lemma, "Helsinki");
        assert_eq!(a.label, "[POS=NOUN]|[PROPER=PROPER]|[NUM=SG]|[CASE=INE]");
        assert_eq!(a.word_ids, 1);
        assert!(a.semantic.is_empty());
    }

    #[test]
    fn compound_lemma_joins_word_ids() {
        let a = parse_analysis(
            "[WORD_ID=talo][POS=NOUN][NUM=SG][CASE=NOM][BOUNDARY=COMPOUND][WORD_ID=kuja][POS=NOUN][NUM=SG][CASE=INE]",
        )
        .unwrap();
        assert_eq!(a.lemma, "talo#kuja");
        assert_eq!(a.label, "[POS=NOUN]|[NUM=SG]|[CASE=INE]");
        assert_eq!(a.word_ids, 2);
    }

    #[test]
    fn style_is_dropped_and_semantics_split_off() {
        let a = parse_analysis("[WORD_ID=Pori][POS=NOUN][PROP=GEO][SEM=TOWN][STYLE=RARE][NUM=SG]")
            .unwrap();
        assert_eq!(a.label, "[POS=NOUN]|[NUM=SG]");
        assert_eq!(a.semantic, "[PROP=GEO][SEM=TOWN]");
    }

    #[test]
    fn derivations_are_unusable() {
        assert!(parse_analysis("[WORD_ID=kirja][POS=NOUN][DRV=STO][NUM=SG]").is_none());
    }

    #[test]
    fn no_word_id_gives_absent_lemma() {
        let a = parse_analysis("[POS=PUNCT]").unwrap();
        assert_eq!(a.lemma, "_");
        assert_eq!(a.label, "[POS=PUNCT]");
        assert_eq!(a.word_ids, 0);
    }

    #[test]
    fn filter_keeps_minimum_split_count() {
        let mut analyses = vec![
            parse_analysis("[WORD_ID=talo][POS=NOUN][WORD_ID=kuja][POS=NOUN]").unwrap(),
            parse_analysis("[WORD_ID=talokuja][POS=NOUN]").unwrap(),
            parse_analysis("[WORD_ID=talokuja][POS=ADJ]").unwrap(),
        ];
        fewest_word_boundaries(&mut analyses);
        assert_eq!(analyses.len(), 2);
        assert!(analyses.iter().all(|a| a.word_ids == 1));
    }
}
