//! Lemma restoration for tagged FinnPos streams.
//!
//! After tagging, each record carries the chosen label in `label` and the
//! analyzer's `(label, lemma)` candidates in `ann`. The resolver picks one
//! lemma per label and writes it into `lemma` when the chosen label has one.
//!
//! # How it works
//! 1. Fold the candidates left to right into a label → lemma table:
//!    - the first lemma seen for a label is adopted;
//!    - a lemma with fewer compound segments (`#`) replaces the stored one;
//!    - on a segment-count tie the stored lemma stays ([`Mode::FirstSeen`])
//!      or both are kept, separated by `|` ([`Mode::AllLemmas`]).
//! 2. Look up the chosen label; lower-case the lemma and drop `#`.
//!
//! In [`Mode::AllLemmas`] the compound separators of merged alternatives are
//! parked on [`COMPOUND_PLACEHOLDER`] while merging and restored on output,
//! so `a#b|c#d` stays readable as two alternatives with two parts each.
//!
//! # Example
//! ```rust
//! use finnpos_lemma::{LemmaResolver, Mode};
//! use finnpos_types::{Annotation, Field, Pair, Record};
//!
//! let mut rec = Record::new("talokujalla");
//! rec.label = Field::from("N");
//! rec.ann = Annotation::from_pairs(
//!     vec![Pair::new("N", "talo#kuja"), Pair::new("N", "talokuja")],
//!     Vec::new(),
//! );
//! assert!(LemmaResolver::new(Mode::FirstSeen).resolve(&mut rec));
//! assert_eq!(rec.lemma.as_str(), "talokuja");
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Write};

use finnpos_stream::{StreamError, process};
use finnpos_types::{COMPOUND_SEPARATOR, Field, Pair, Record};
use tracing::trace;

/// Separator between merged lemma alternatives.
pub const ALTERNATIVE_SEPARATOR: char = '|';

/// Stands in for `#` inside merged alternatives until output.
pub const COMPOUND_PLACEHOLDER: char = '\u{E000}';

/// Tie-break policy for candidates with equally many compound segments.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Keep the lemma seen first.
    #[default]
    FirstSeen,
    /// Keep every tied lemma, joined by `|`.
    AllLemmas,
}

/// The lemma chosen for one label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedLemma {
    text: String,
    merged: bool,
}

impl ResolvedLemma {
    fn new(lemma: &str) -> Self {
        Self {
            text: lemma.to_string(),
            merged: false,
        }
    }

    /// Compound segments of the stored text; escaped separators do not count.
    pub fn segments(&self) -> usize {
        segments(&self.text)
    }

    pub fn is_merged(&self) -> bool {
        self.merged
    }

    /// Whether `lemma` is already stored, alone or as one merged alternative.
    pub fn contains(&self, lemma: &str) -> bool {
        if !self.merged {
            return self.text == lemma;
        }
        self.text
            .split(ALTERNATIVE_SEPARATOR)
            .any(|alt| alt.replace(COMPOUND_PLACEHOLDER, &COMPOUND_SEPARATOR.to_string()) == lemma)
    }

    fn merge(&mut self, lemma: &str) {
        let mut text = escape_compounds(&self.text);
        text.push(ALTERNATIVE_SEPARATOR);
        text.push_str(lemma);
        self.text = text;
        self.merged = true;
    }

    /// Output form: lower-cased, compound separators removed.
    pub fn render(&self, mode: Mode) -> String {
        match mode {
            Mode::FirstSeen => strip_compounds(&self.text.to_lowercase()),
            Mode::AllLemmas => {
                let text = if self.merged {
                    escape_compounds(&self.text)
                } else {
                    self.text.clone()
                };
                strip_compounds(&text.to_lowercase())
                    .replace(COMPOUND_PLACEHOLDER, &COMPOUND_SEPARATOR.to_string())
            }
        }
    }
}

/// Number of `#`-delimited segments in a lemma.
pub fn segments(lemma: &str) -> usize {
    lemma.split(COMPOUND_SEPARATOR).count()
}

fn escape_compounds(text: &str) -> String {
    text.replace(COMPOUND_SEPARATOR, &COMPOUND_PLACEHOLDER.to_string())
}

fn strip_compounds(text: &str) -> String {
    text.chars().filter(|c| *c != COMPOUND_SEPARATOR).collect()
}

/// Counters for one restoration pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResolveSummary {
    pub sentences: usize,
    pub tokens: usize,
    /// Records whose lemma was rewritten.
    pub resolved: usize,
}

pub struct LemmaResolver {
    mode: Mode,
}

impl LemmaResolver {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Fold candidate pairs into one lemma per label.
    pub fn lemma_table<'a>(&self, candidates: &'a [Pair]) -> HashMap<&'a str, ResolvedLemma> {
        let mut table: HashMap<&str, ResolvedLemma> = HashMap::new();
        for pair in candidates {
            let Some(current) = table.get_mut(pair.label.as_str()) else {
                table.insert(&pair.label, ResolvedLemma::new(&pair.value));
                continue;
            };
            if current.contains(&pair.value) {
                continue;
            }
            let incoming = segments(&pair.value);
            let stored = current.segments();
            if incoming < stored {
                *current = ResolvedLemma::new(&pair.value);
            } else if incoming == stored && self.mode == Mode::AllLemmas {
                current.merge(&pair.value);
            }
        }
        table
    }

    /// Rewrite `rec.lemma` for its chosen label; returns whether it changed.
    pub fn resolve(&self, rec: &mut Record) -> bool {
        let Some(candidates) = rec.ann.candidates() else {
            return false;
        };
        let Some(label) = rec.label.value() else {
            return false;
        };
        let table = self.lemma_table(candidates);
        let Some(chosen) = table.get(label) else {
            trace!(label, "no candidate for chosen label");
            return false;
        };
        rec.lemma = Field::from(chosen.render(self.mode));
        true
    }

    /// Stream `input` to `output`, flushing after each sentence.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<ResolveSummary, StreamError> {
        let mut resolved = 0usize;
        let stream = process(input, output, |sentence| {
            resolved += sentence
                .iter_mut()
                .map(|rec| self.resolve(rec))
                .filter(|changed| *changed)
                .count();
            Ok::<_, StreamError>(())
        })?;
        Ok(ResolveSummary {
            sentences: stream.sentences,
            tokens: stream.tokens,
            resolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finnpos_types::Annotation;

    fn tagged(label: &str, lemma: &str, pairs: &[(&str, &str)]) -> Record {
        let mut rec = Record::new("sana");
        rec.label = Field::from(label);
        rec.lemma = Field::from(lemma);
        rec.ann = Annotation::from_pairs(
            pairs.iter().map(|(l, v)| Pair::new(*l, *v)).collect(),
            Vec::new(),
        );
        rec
    }

    fn resolved(mode: Mode, pairs: &[(&str, &str)]) -> String {
        let mut rec = tagged("N", "_", pairs);
        LemmaResolver::new(mode).resolve(&mut rec);
        rec.lemma.as_str().to_string()
    }

    #[test]
    fn fewer_segments_win() {
        let pairs = [("N", "talo#kuja"), ("N", "talokuja")];
        assert_eq!(resolved(Mode::FirstSeen, &pairs), "talokuja");
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "talokuja");
    }

    #[test]
    fn more_segments_are_ignored() {
        let pairs = [("N", "Talokuja"), ("N", "talo#kuja")];
        assert_eq!(resolved(Mode::FirstSeen, &pairs), "talokuja");
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "talokuja");
    }

    #[test]
    fn first_seen_wins_ties_by_default() {
        let pairs = [("N", "kuusi"), ("N", "kuus")];
        assert_eq!(resolved(Mode::FirstSeen, &pairs), "kuusi");
    }

    #[test]
    fn all_lemmas_merges_ties_keeping_compounds() {
        let pairs = [("N", "a#b"), ("N", "c#d")];
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "a#b|c#d");
        assert_eq!(resolved(Mode::FirstSeen, &pairs), "ab");
    }

    #[test]
    fn three_way_merge_keeps_every_alternative() {
        let pairs = [("N", "A#b"), ("N", "c#d"), ("N", "e#f")];
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "a#b|c#d|e#f");
    }

    #[test]
    fn repeated_alternative_is_not_merged_twice() {
        let pairs = [("N", "a#b"), ("N", "c#d"), ("N", "c#d"), ("N", "a#b")];
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "a#b|c#d");
    }

    #[test]
    fn shorter_candidate_replaces_merged_entry() {
        let pairs = [("N", "a#b"), ("N", "c#d"), ("N", "cd")];
        assert_eq!(resolved(Mode::AllLemmas, &pairs), "cd");
    }

    #[test]
    fn identical_lemma_is_a_no_op() {
        let resolver = LemmaResolver::new(Mode::AllLemmas);
        let pairs = vec![Pair::new("N", "kuusi"), Pair::new("N", "kuusi")];
        let table = resolver.lemma_table(&pairs);
        assert!(!table["N"].is_merged());
        assert_eq!(table["N"].render(Mode::AllLemmas), "kuusi");
    }

    #[test]
    fn unknown_label_leaves_lemma() {
        let mut rec = tagged("V", "upstream", &[("N", "kuusi")]);
        assert!(!LemmaResolver::new(Mode::FirstSeen).resolve(&mut rec));
        assert_eq!(rec.lemma.as_str(), "upstream");
    }

    #[test]
    fn absent_annotation_leaves_lemma() {
        let mut rec = tagged("N", "upstream", &[]);
        assert!(rec.ann.is_absent());
        assert!(!LemmaResolver::new(Mode::FirstSeen).resolve(&mut rec));
        assert_eq!(rec.lemma.as_str(), "upstream");
    }

    #[test]
    fn labels_resolve_independently() {
        let resolver = LemmaResolver::new(Mode::FirstSeen);
        let pairs = vec![
            Pair::new("N", "Kuusi"),
            Pair::new("Num", "kuusi"),
            Pair::new("N", "kuu#si"),
        ];
        let table = resolver.lemma_table(&pairs);
        assert_eq!(table.len(), 2);
        assert_eq!(table["N"].render(Mode::FirstSeen), "kuusi");
        assert_eq!(table["Num"].segments(), 1);
    }
}
