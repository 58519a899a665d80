//! Cue the tagger with the analyzer's candidate labels.
//!
//! A record with candidates in `ann` gets its `label` column rewritten to the
//! current label followed by every other candidate label, or just the
//! candidate labels when no label was set.

use std::io::{BufRead, Write};

use finnpos_stream::{StreamError, StreamSummary, process};
use finnpos_types::{Field, Record};

pub fn cue_labels(rec: &mut Record) {
    let candidates = rec.ann.distinct_labels();
    if candidates.is_empty() {
        return;
    }

    let cued: Vec<&str> = match rec.label.value() {
        None => candidates,
        Some(current) => std::iter::once(current)
            .chain(candidates.into_iter().filter(|l| *l != current))
            .collect(),
    };
    rec.label = Field::from(cued.join(" "));
}

pub fn run_cue<R: BufRead, W: Write>(input: R, output: W) -> Result<StreamSummary, StreamError> {
    process(input, output, |sentence| {
        sentence.iter_mut().for_each(cue_labels);
        Ok::<_, StreamError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finnpos_types::{Annotation, Pair};

    fn record(label: &str, labels: &[&str]) -> Record {
        let mut rec = Record::new("kuusi");
        rec.label = Field::from(label);
        rec.ann = Annotation::from_pairs(
            labels.iter().map(|l| Pair::new(*l, "kuusi")).collect(),
            Vec::new(),
        );
        rec
    }

    #[test]
    fn absent_label_takes_all_candidates() {
        let mut rec = record("_", &["N", "Num", "N"]);
        cue_labels(&mut rec);
        assert_eq!(rec.label.as_str(), "N Num");
    }

    #[test]
    fn current_label_goes_first() {
        let mut rec = record("Num", &["N", "Num", "V"]);
        cue_labels(&mut rec);
        assert_eq!(rec.label.as_str(), "Num N V");
    }

    #[test]
    fn records_without_candidates_are_untouched() {
        let mut rec = record("N", &[]);
        cue_labels(&mut rec);
        assert_eq!(rec.label.as_str(), "N");
    }
}
