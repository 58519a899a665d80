//! Shared types for the FinnPos tabular record format.
//!
//! Every stage of the pipeline (analysis normalization, feature extraction,
//! lemma restoration) reads and writes the same five-column format:
//!
//! ```text
//! wf <TAB> feats <TAB> lemma <TAB> label <TAB> ann
//! ```
//!
//! Use [`Field`] for columns that may be absent (written as `_`), [`Record`]
//! for a whole token, and [`Annotation`] for the candidate evidence carried in
//! the last column.
//!
//! ```rust
//! use finnpos_types::{Annotation, Field, Record};
//!
//! let mut rec = Record::new("talossa");
//! rec.label = Field::from("N|CASE=INE");
//! rec.ann = "[('N|CASE=INE','talo')]".parse::<Annotation>().unwrap();
//! assert_eq!(
//!     rec.to_string(),
//!     "talossa\t_\t_\tN|CASE=INE\t[('N|CASE=INE','talo')]"
//! );
//! ```

use std::fmt;

mod annotation;

pub use annotation::{Annotation, AnnotationError, Pair};

/// Wire token for an absent column.
pub const ABSENT: &str = "_";

/// Word form used for window positions outside the sentence.
pub const BOUNDARY_WF: &str = "_#_";

/// A line holding only this token is a higher-level boundary (e.g. document break).
pub const SENTENCE_BOUNDARY: &str = "finnpos-sb";

/// Separator between the segments of a compound lemma.
pub const COMPOUND_SEPARATOR: char = '#';

/// A column value that is either present or explicitly absent.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Field {
    #[default]
    Absent,
    Value(String),
}

impl Field {
    /// Read a raw column; `_` and the empty string are absent.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == ABSENT {
            Field::Absent
        } else {
            Field::Value(raw.to_string())
        }
    }

    /// The wire representation, `_` when absent.
    pub fn as_str(&self) -> &str {
        match self {
            Field::Absent => ABSENT,
            Field::Value(v) => v,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Field::Absent => None,
            Field::Value(v) => Some(v),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Space-separated tokens of the value; empty when absent.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.value()
            .unwrap_or_default()
            .split(' ')
            .filter(|t| !t.is_empty())
    }
}

impl From<&str> for Field {
    fn from(raw: &str) -> Self {
        Field::parse(raw)
    }
}

impl From<String> for Field {
    fn from(raw: String) -> Self {
        if raw.is_empty() || raw == ABSENT {
            Field::Absent
        } else {
            Field::Value(raw)
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token of a sentence with all five columns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    pub wf: Field,
    pub feats: Field,
    pub lemma: Field,
    pub label: Field,
    pub ann: Annotation,
}

impl Record {
    /// A record carrying only a word form.
    pub fn new(wf: impl Into<Field>) -> Self {
        Self {
            wf: wf.into(),
            ..Self::default()
        }
    }

    /// The word form as used in feature windows (`_` when absent).
    pub fn word(&self) -> &str {
        self.wf.as_str()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.wf, self.feats, self.lemma, self.label, self.ann
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_and_empty_are_absent() {
        assert_eq!(Field::parse("_"), Field::Absent);
        assert_eq!(Field::parse(""), Field::Absent);
        assert_eq!(Field::from(String::from("_")), Field::Absent);
        assert_eq!(Field::parse("talo").value(), Some("talo"));
    }

    #[test]
    fn tokens_of_absent_field_are_empty() {
        assert_eq!(Field::Absent.tokens().count(), 0);
        let f = Field::from("N  V");
        assert_eq!(f.tokens().collect::<Vec<_>>(), vec!["N", "V"]);
    }

    #[test]
    fn record_display_has_five_columns() {
        let rec = Record::new("koira");
        let line = rec.to_string();
        assert_eq!(line, "koira\t_\t_\t_\t_");
        assert_eq!(line.split('\t').count(), 5);
    }
}
