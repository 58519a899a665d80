//! Read and write FinnPos tabular streams one sentence at a time.
//!
//! Input lines carry 1, 3 or 5 tab-separated columns:
//!
//! - `wf`
//! - `wf <TAB> lemma <TAB> label`
//! - `wf <TAB> feats <TAB> lemma <TAB> label <TAB> ann`
//!
//! A blank line closes a sentence; runs of blank lines never produce empty
//! sentences. A line holding only [`SENTENCE_BOUNDARY`] closes the open
//! sentence, if any, and is always passed on as [`Block::Boundary`].
//!
//! Writers always emit the five-column form and flush after every sentence,
//! so a stage can sit in the middle of a live pipe.
//!
//! # Example
//! ```no_run
//! use std::io;
//! use finnpos_stream::{StreamError, process};
//!
//! # fn main() -> Result<(), StreamError> {
//! let stdin = io::stdin();
//! let summary = process(stdin.lock(), io::stdout(), |sentence| {
//!     for rec in sentence.iter_mut() {
//!         rec.lemma = rec.wf.clone();
//!     }
//!     Ok::<_, StreamError>(())
//! })?;
//! eprintln!("{} sentences", summary.sentences);
//! # Ok(()) }
//! ```

use std::io::{self, BufRead, Write};

use finnpos_types::{Annotation, AnnotationError, Field, Record, SENTENCE_BOUNDARY};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("i/o error")]
    Io(#[from] io::Error),
    #[error("line {line}: incorrect field count {count}")]
    FieldCount { line: usize, count: usize },
    #[error("line {line}: malformed annotation")]
    Annotation {
        line: usize,
        #[source]
        source: AnnotationError,
    },
}

/// One unit read from a tabular stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Block {
    /// A non-empty sentence.
    Sentence(Vec<Record>),
    /// A reserved boundary line.
    Boundary,
}

/// Counters for a finished stream pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamSummary {
    pub sentences: usize,
    pub tokens: usize,
    pub boundaries: usize,
}

/// Parse one non-blank tabular line.
///
/// `line` is the 1-based line number used in error reports.
pub fn parse_record(raw: &str, line: usize) -> Result<Record, StreamError> {
    let raw = raw.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = raw.split('\t').collect();
    let rec = match fields.as_slice() {
        [wf] => Record::new(*wf),
        [wf, lemma, label] => Record {
            wf: Field::parse(wf),
            lemma: Field::parse(lemma),
            label: Field::parse(label),
            ..Record::default()
        },
        [wf, feats, lemma, label, ann] => Record {
            wf: Field::parse(wf),
            feats: Field::parse(feats),
            lemma: Field::parse(lemma),
            label: Field::parse(label),
            ann: ann
                .parse::<Annotation>()
                .map_err(|source| StreamError::Annotation { line, source })?,
        },
        other => {
            return Err(StreamError::FieldCount {
                line,
                count: other.len(),
            });
        }
    };
    Ok(rec)
}

/// Iterator over the sentences of a tabular stream.
///
/// Stops after the first error; the caller is expected to abort.
pub struct SentenceReader<R> {
    input: R,
    buf: String,
    line: usize,
    pending_boundary: bool,
    done: bool,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: String::new(),
            line: 0,
            pending_boundary: false,
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    fn read_block(&mut self) -> Result<Option<Block>, StreamError> {
        if std::mem::take(&mut self.pending_boundary) {
            return Ok(Some(Block::Boundary));
        }
        let mut sentence = Vec::new();
        loop {
            self.buf.clear();
            if self.input.read_line(&mut self.buf)? == 0 {
                return Ok((!sentence.is_empty()).then_some(Block::Sentence(sentence)));
            }
            self.line += 1;

            let text = self.buf.trim_end_matches(['\n', '\r']);
            if text.trim().is_empty() {
                if !sentence.is_empty() {
                    return Ok(Some(Block::Sentence(sentence)));
                }
                continue;
            }
            if text == SENTENCE_BOUNDARY {
                if sentence.is_empty() {
                    return Ok(Some(Block::Boundary));
                }
                // The sentence goes out first, the boundary on the next call.
                self.pending_boundary = true;
                return Ok(Some(Block::Sentence(sentence)));
            }
            sentence.push(parse_record(text, self.line)?);
        }
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Block, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Five-column writer that flushes at every sentence boundary.
pub struct RecordWriter<W: Write> {
    out: W,
    open: bool,
    summary: StreamSummary,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            open: false,
            summary: StreamSummary::default(),
        }
    }

    pub fn write_record(&mut self, rec: &Record) -> io::Result<()> {
        writeln!(self.out, "{rec}")?;
        self.open = true;
        self.summary.tokens += 1;
        Ok(())
    }

    /// Close the open sentence with a blank line and flush.
    ///
    /// Nothing but the flush happens when no record was written since the
    /// last boundary, so empty sentences never reach the output.
    pub fn end_sentence(&mut self) -> io::Result<()> {
        if self.open {
            writeln!(self.out)?;
            self.open = false;
            self.summary.sentences += 1;
        }
        self.out.flush()
    }

    pub fn write_sentence(&mut self, sentence: &[Record]) -> io::Result<()> {
        for rec in sentence {
            self.write_record(rec)?;
        }
        trace!(tokens = sentence.len(), "sentence written");
        self.end_sentence()
    }

    /// Re-emit a reserved boundary as a blank line.
    pub fn write_boundary(&mut self) -> io::Result<()> {
        self.end_sentence()?;
        writeln!(self.out)?;
        self.summary.boundaries += 1;
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn summary(&self) -> StreamSummary {
        self.summary
    }

    /// Close any open sentence, flush, and hand back the sink.
    pub fn finish(mut self) -> io::Result<(W, StreamSummary)> {
        self.end_sentence()?;
        Ok((self.out, self.summary))
    }
}

/// Drive a sentence-level transformation from `input` to `output`.
///
/// `transform` may rewrite records in place; it never sees neighbors outside
/// the current sentence.
pub fn process<R, W, E, F>(input: R, output: W, mut transform: F) -> Result<StreamSummary, E>
where
    R: BufRead,
    W: Write,
    E: From<StreamError>,
    F: FnMut(&mut [Record]) -> Result<(), E>,
{
    let mut writer = RecordWriter::new(output);
    for block in SentenceReader::new(input) {
        match block? {
            Block::Sentence(mut sentence) => {
                transform(&mut sentence)?;
                writer
                    .write_sentence(&sentence)
                    .map_err(|e| E::from(StreamError::Io(e)))?;
            }
            Block::Boundary => writer
                .write_boundary()
                .map_err(|e| E::from(StreamError::Io(e)))?,
        }
    }
    let (_, summary) = writer
        .finish()
        .map_err(|e| E::from(StreamError::Io(e)))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_field_form_maps_to_lemma_and_label() {
        let rec = parse_record("talossa\ttalo\tN", 1).unwrap();
        assert_eq!(rec.wf.as_str(), "talossa");
        assert_eq!(rec.lemma.as_str(), "talo");
        assert_eq!(rec.label.as_str(), "N");
        assert!(rec.feats.is_absent());
        assert!(rec.ann.is_absent());
    }

    #[test]
    fn rejects_two_and_four_fields() {
        for (line, n) in [("a\tb", 2), ("a\tb\tc\td", 4), ("a\tb\tc\td\te\tf", 6)] {
            match parse_record(line, 7) {
                Err(StreamError::FieldCount { line: 7, count }) => assert_eq!(count, n),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_annotation_reports_line() {
        let err = parse_record("a\t_\t_\t_\t[('N'", 3).unwrap_err();
        assert!(err.to_string().starts_with("line 3: malformed annotation"));
    }

    #[test]
    fn annotation_detail_is_the_error_source() {
        let err = parse_record("a\t_\t_\t_\t[('N')]", 5).unwrap_err();
        assert_eq!(err.to_string(), "line 5: malformed annotation");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert!(source.unwrap().starts_with("expected"));
    }

    #[test]
    fn field_count_message() {
        let err = StreamError::FieldCount { line: 4, count: 2 };
        assert_eq!(err.to_string(), "line 4: incorrect field count 2");
    }

    #[test]
    fn strips_carriage_returns() {
        let rec = parse_record("koira\r\n", 1).unwrap();
        assert_eq!(rec.wf.as_str(), "koira");
    }
}
