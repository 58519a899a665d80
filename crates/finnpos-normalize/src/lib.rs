//! Normalize morphological analyzer output into FinnPos tabular records.
//!
//! The analyzer prints one line per analysis and a blank line after each
//! token. Two dialects are understood:
//!
//! - [`Dialect::Ftb`]: `wf <TAB> [WORD_ID=..][POS=..]... [<TAB> weight]`, with a
//!   line containing `OMORFI_VERSION` between sentences;
//! - [`Dialect::Tdt`]: `wf <TAB> lemma <TAB> label`, with a line containing
//!   `<END>` between sentences.
//!
//! Each token becomes one record whose `label` column lists every candidate
//! label (so the tagger knows to choose among them) and whose `ann` column
//! carries the `(label, lemma)` candidates for later lemma restoration.
//!
//! # How it works
//! 1. Collect the token's analyses until the blank line; `+?` empties them.
//! 2. For `ftb`, drop derivations and keep the analyses with the fewest
//!    compound parts.
//! 3. Deduplicate `(label, lemma)` pairs, preserving first-seen order.
//! 4. Write the record; at every sentence marker write a blank line and flush.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use finnpos_stream::{RecordWriter, StreamError};
use finnpos_types::{Annotation, Field, Pair, Record};
use thiserror::Error;
use tracing::{debug, trace};

pub mod cue;
pub mod ftb;

pub use cue::{cue_labels, run_cue};
pub use ftb::Analysis;

/// Prefix marking analyzer-proposed labels in the `feats` column.
pub const ANALYZER_FEAT_PREFIX: &str = "OMORFI_FEAT:";

const FTB_SENTENCE_MARKER: &str = "OMORFI_VERSION";
const TDT_SENTENCE_MARKER: &str = "<END>";
const UNANALYZED: &str = "+?";

/// Analyzer output format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Dialect {
    #[default]
    Ftb,
    Tdt,
}

impl Dialect {
    fn is_sentence_marker(self, line: &str) -> bool {
        match self {
            Dialect::Ftb => line.contains(FTB_SENTENCE_MARKER),
            Dialect::Tdt => line.contains(TDT_SENTENCE_MARKER),
        }
    }
}

impl FromStr for Dialect {
    type Err = NormalizeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "ftb" => Ok(Dialect::Ftb),
            "tdt" => Ok(Dialect::Tdt),
            other => Err(NormalizeError::UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Ftb => "ftb",
            Dialect::Tdt => "tdt",
        })
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unknown conversion type {0}, should be ftb or tdt")]
    UnknownDialect(String),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl From<io::Error> for NormalizeError {
    fn from(err: io::Error) -> Self {
        NormalizeError::Stream(StreamError::Io(err))
    }
}

/// Counters for one normalization pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NormalizeSummary {
    pub sentences: usize,
    pub tokens: usize,
    /// Tokens written without any candidate analysis.
    pub unanalyzed: usize,
    /// Analyses discarded because they were derivations.
    pub dropped_derivations: usize,
    /// Analyses discarded because no label was left after tag filtering.
    pub dropped_empty_labels: usize,
}

#[derive(Default)]
struct PendingToken {
    wf: Option<String>,
    analyses: Vec<Analysis>,
}

/// Streaming converter from analyzer output to tabular records.
pub struct Normalizer {
    dialect: Dialect,
}

impl Normalizer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Convert all of `input`, writing records to `output`.
    ///
    /// Output is flushed at every sentence marker and between tokens, so the
    /// converter can feed a live pipe.
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        output: W,
    ) -> Result<NormalizeSummary, NormalizeError> {
        let mut writer = RecordWriter::new(output);
        let mut summary = NormalizeSummary::default();
        let mut pending = PendingToken::default();
        let mut buf = String::new();
        let mut lineno = 0usize;

        loop {
            buf.clear();
            if input.read_line(&mut buf)? == 0 {
                break;
            }
            lineno += 1;
            let line = buf.trim_end_matches(['\n', '\r']);

            if line.trim().is_empty() {
                if pending.wf.is_some() {
                    self.emit(&mut writer, &mut pending, &mut summary)?;
                } else {
                    writer.flush()?;
                }
                continue;
            }

            if self.dialect.is_sentence_marker(line) {
                if pending.wf.is_some() {
                    self.emit(&mut writer, &mut pending, &mut summary)?;
                }
                writer.end_sentence()?;
                continue;
            }

            self.push_line(line, lineno, &mut pending, &mut summary)?;
        }

        if pending.wf.is_some() {
            self.emit(&mut writer, &mut pending, &mut summary)?;
        }
        let (_, stream) = writer.finish()?;
        summary.sentences = stream.sentences;
        summary.tokens = stream.tokens;
        Ok(summary)
    }

    fn push_line(
        &self,
        line: &str,
        lineno: usize,
        pending: &mut PendingToken,
        summary: &mut NormalizeSummary,
    ) -> Result<(), NormalizeError> {
        let fields: Vec<&str> = line.split('\t').collect();
        match (self.dialect, fields.as_slice()) {
            (Dialect::Ftb, [wf, analysis] | [wf, analysis, _]) => {
                pending.wf = Some(wf.to_string());
                if analysis.ends_with(UNANALYZED) {
                    pending.analyses.clear();
                } else if let Some(parsed) = ftb::parse_analysis(analysis) {
                    pending.analyses.push(parsed);
                } else {
                    debug!(line = lineno, "dropping derivation {analysis}");
                    summary.dropped_derivations += 1;
                }
            }
            (Dialect::Tdt, [wf, lemma, label]) => {
                pending.wf = Some(wf.to_string());
                if *label == UNANALYZED {
                    pending.analyses.clear();
                } else {
                    pending.analyses.push(Analysis {
                        label: label.to_string(),
                        lemma: lemma.to_string(),
                        semantic: String::new(),
                        word_ids: 1,
                    });
                }
            }
            (_, other) => {
                return Err(StreamError::FieldCount {
                    line: lineno,
                    count: other.len(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn emit<W: Write>(
        &self,
        writer: &mut RecordWriter<W>,
        pending: &mut PendingToken,
        summary: &mut NormalizeSummary,
    ) -> io::Result<()> {
        let token = std::mem::take(pending);
        let wf = token.wf.unwrap_or_default();
        let (rec, empty_labels) = self.build(&wf, token.analyses);
        if empty_labels > 0 {
            debug!(wf = %wf, "dropping {empty_labels} analyses with an empty label");
            summary.dropped_empty_labels += empty_labels;
        }
        if rec.ann.is_absent() {
            summary.unanalyzed += 1;
        }
        trace!(wf = %wf, label = %rec.label, "token");
        writer.write_record(&rec)?;
        writer.flush()
    }

    /// Turn a token's collected analyses into one record.
    pub fn build_record(&self, wf: &str, analyses: Vec<Analysis>) -> Record {
        self.build(wf, analyses).0
    }

    // Also returns how many analyses were skipped for an empty label.
    fn build(&self, wf: &str, mut analyses: Vec<Analysis>) -> (Record, usize) {
        if self.dialect == Dialect::Ftb {
            ftb::fewest_word_boundaries(&mut analyses);
        }
        let before = analyses.len();
        analyses.retain(|a| !a.label.is_empty());
        let empty_labels = before - analyses.len();

        let mut candidates: Vec<Pair> = Vec::new();
        let mut semantic: Vec<Pair> = Vec::new();
        for analysis in analyses {
            let pair = Pair::new(analysis.label.clone(), analysis.lemma);
            if !candidates.contains(&pair) {
                candidates.push(pair);
            }
            if !analysis.semantic.is_empty() {
                let pair = Pair::new(analysis.label, analysis.semantic);
                if !semantic.contains(&pair) {
                    semantic.push(pair);
                }
            }
        }

        let ann = Annotation::from_pairs(candidates, semantic);
        let labels = ann.distinct_labels();
        let feats = labels
            .iter()
            .map(|label| format!("{ANALYZER_FEAT_PREFIX}{label}"))
            .collect::<Vec<_>>()
            .join(" ");
        let label = labels.join(" ");

        let rec = Record {
            wf: Field::parse(wf),
            feats: Field::from(feats),
            lemma: Field::Absent,
            label: Field::from(label),
            ann,
        };
        (rec, empty_labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tdt(label: &str, lemma: &str) -> Analysis {
        Analysis {
            label: label.into(),
            lemma: lemma.into(),
            semantic: String::new(),
            word_ids: 1,
        }
    }

    #[test]
    fn parses_dialect_names() {
        assert_eq!("ftb".parse::<Dialect>().unwrap(), Dialect::Ftb);
        assert_eq!("tdt".parse::<Dialect>().unwrap(), Dialect::Tdt);
        let err = "conll".parse::<Dialect>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown conversion type conll, should be ftb or tdt"
        );
    }

    #[test]
    fn empty_candidates_give_absent_columns() {
        let rec = Normalizer::new(Dialect::Ftb).build_record("xyzzy", Vec::new());
        assert_eq!(rec.to_string(), "xyzzy\t_\t_\t_\t_");
    }

    #[test]
    fn duplicate_pairs_are_merged() {
        let rec = Normalizer::new(Dialect::Tdt).build_record(
            "kuusi",
            vec![tdt("N", "kuusi"), tdt("Num", "kuusi"), tdt("N", "kuusi")],
        );
        assert_eq!(rec.label.as_str(), "N Num");
        assert_eq!(rec.feats.as_str(), "OMORFI_FEAT:N OMORFI_FEAT:Num");
        assert_eq!(rec.ann.to_string(), "[('N','kuusi'),('Num','kuusi')]");
        assert!(rec.lemma.is_absent());
    }

    #[test]
    fn same_label_with_two_lemmas_is_listed_once() {
        let rec = Normalizer::new(Dialect::Tdt)
            .build_record("alusta", vec![tdt("V", "alustaa"), tdt("V", "alus")]);
        assert_eq!(rec.label.as_str(), "V");
        assert_eq!(rec.ann.candidates().map(<[Pair]>::len), Some(2));
    }

    #[test]
    fn semantic_pairs_follow_candidates() {
        let analyses = vec![
            ftb::parse_analysis("[WORD_ID=Pori][POS=NOUN][PROP=GEO][NUM=SG]").unwrap(),
        ];
        let rec = Normalizer::new(Dialect::Ftb).build_record("Pori", analyses);
        assert_eq!(
            rec.ann.to_string(),
            "[('[POS=NOUN]|[NUM=SG]','Pori')] [('[POS=NOUN]|[NUM=SG]','[PROP=GEO]')]"
        );
    }
}
