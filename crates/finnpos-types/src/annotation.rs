//! Codec for the annotation column.
//!
//! Grammar:
//!
//! ```text
//! ann    := "_" | seq [ " " seq ]
//! seq    := "[" [ pair { "," pair } ] "]"
//! pair   := "(" string "," string ")"
//! string := quoted with ' or ", backslash escapes \\ \' \" \n \t \r
//! ```
//!
//! The first sequence holds `(label, lemma)` candidates, the optional second
//! one `(label, semantic tags)`.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use thiserror::Error;

use crate::ABSENT;

/// A `(label, value)` tuple from the annotation column.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pair {
    pub label: String,
    pub value: String,
}

impl Pair {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Disambiguation evidence for one token.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Annotation {
    /// No evidence (`_`).
    #[default]
    Absent,
    /// A candidate sequence, possibly decoded from an empty `[]`.
    Present {
        candidates: Vec<Pair>,
        semantic: Vec<Pair>,
    },
}

impl Annotation {
    /// Build from pair lists; empty candidates collapse to [`Annotation::Absent`].
    pub fn from_pairs(candidates: Vec<Pair>, semantic: Vec<Pair>) -> Self {
        if candidates.is_empty() {
            Annotation::Absent
        } else {
            Annotation::Present {
                candidates,
                semantic,
            }
        }
    }

    /// Candidate `(label, lemma)` pairs, `None` when the column is `_`.
    pub fn candidates(&self) -> Option<&[Pair]> {
        match self {
            Annotation::Absent => None,
            Annotation::Present { candidates, .. } => Some(candidates),
        }
    }

    pub fn semantic(&self) -> &[Pair] {
        match self {
            Annotation::Absent => &[],
            Annotation::Present { semantic, .. } => semantic,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Annotation::Absent)
    }

    /// Distinct candidate labels in first-seen order.
    pub fn distinct_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for pair in self.candidates().unwrap_or_default() {
            if !labels.contains(&pair.label.as_str()) {
                labels.push(&pair.label);
            }
        }
        labels
    }
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum AnnotationError {
    #[error("unexpected end of annotation")]
    UnexpectedEnd,
    #[error("expected {expected} at offset {offset}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: char,
        offset: usize,
    },
    #[error("unknown escape \\{0} in annotation")]
    BadEscape(char),
}

impl FromStr for Annotation {
    type Err = AnnotationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ABSENT {
            return Ok(Annotation::Absent);
        }

        let mut parser = Parser {
            chars: trimmed.char_indices().peekable(),
        };
        let candidates = parser.sequence()?;
        parser.skip_ws();
        let semantic = if parser.at_end() {
            Vec::new()
        } else {
            parser.sequence()?
        };
        parser.skip_ws();
        if let Some((offset, found)) = parser.chars.next() {
            return Err(AnnotationError::Unexpected {
                expected: "end of annotation",
                found,
                offset,
            });
        }

        Ok(Annotation::Present {
            candidates,
            semantic,
        })
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl Parser<'_> {
    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), AnnotationError> {
        self.skip_ws();
        match self.chars.next() {
            Some((_, c)) if c == want => Ok(()),
            Some((offset, found)) => Err(AnnotationError::Unexpected {
                expected,
                found,
                offset,
            }),
            None => Err(AnnotationError::UnexpectedEnd),
        }
    }

    fn sequence(&mut self) -> Result<Vec<Pair>, AnnotationError> {
        self.expect('[', "'['")?;
        let mut pairs = Vec::new();
        self.skip_ws();
        if self.chars.next_if(|(_, c)| *c == ']').is_some() {
            return Ok(pairs);
        }
        loop {
            pairs.push(self.pair()?);
            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => return Ok(pairs),
                Some((offset, found)) => {
                    return Err(AnnotationError::Unexpected {
                        expected: "',' or ']'",
                        found,
                        offset,
                    });
                }
                None => return Err(AnnotationError::UnexpectedEnd),
            }
        }
    }

    fn pair(&mut self) -> Result<Pair, AnnotationError> {
        self.expect('(', "'('")?;
        let label = self.string()?;
        self.expect(',', "','")?;
        let value = self.string()?;
        self.expect(')', "')'")?;
        Ok(Pair { label, value })
    }

    fn string(&mut self) -> Result<String, AnnotationError> {
        self.skip_ws();
        let quote = match self.chars.next() {
            Some((_, c @ ('\'' | '"'))) => c,
            Some((offset, found)) => {
                return Err(AnnotationError::Unexpected {
                    expected: "quoted string",
                    found,
                    offset,
                });
            }
            None => return Err(AnnotationError::UnexpectedEnd),
        };

        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => return Err(AnnotationError::BadEscape(other)),
                    None => return Err(AnnotationError::UnexpectedEnd),
                },
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, c)) => out.push(c),
                None => return Err(AnnotationError::UnexpectedEnd),
            }
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Present {
                candidates,
                semantic,
            } if !candidates.is_empty() => {
                write_sequence(f, candidates)?;
                if !semantic.is_empty() {
                    f.write_str(" ")?;
                    write_sequence(f, semantic)?;
                }
                Ok(())
            }
            _ => f.write_str(ABSENT),
        }
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, pairs: &[Pair]) -> fmt::Result {
    f.write_str("[")?;
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str("(")?;
        write_string(f, &pair.label)?;
        f.write_str(",")?;
        write_string(f, &pair.value)?;
        f.write_str(")")?;
    }
    f.write_str("]")
}

// Spaces are dropped so the column never contains whitespace.
fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            ' ' => {}
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    f.write_str(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidates_and_semantic_sequence() {
        let ann: Annotation = "[('N','talo#kuja'),('A','iso')] [('N','[SEM=GEO]')]"
            .parse()
            .unwrap();
        let candidates = ann.candidates().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], Pair::new("N", "talo#kuja"));
        assert_eq!(ann.semantic(), &[Pair::new("N", "[SEM=GEO]")]);
    }

    #[test]
    fn underscore_is_absent() {
        assert_eq!("_".parse::<Annotation>().unwrap(), Annotation::Absent);
        assert_eq!(Annotation::Absent.to_string(), "_");
    }

    #[test]
    fn empty_sequence_is_present_but_written_as_absent() {
        let ann: Annotation = "[]".parse().unwrap();
        assert_eq!(ann.candidates(), Some(&[][..]));
        assert_eq!(ann.to_string(), "_");
    }

    #[test]
    fn quoting_follows_content() {
        let ann = Annotation::from_pairs(
            vec![Pair::new("N", "vaa'an"), Pair::new("V", "a\\b")],
            Vec::new(),
        );
        assert_eq!(ann.to_string(), r#"[('N',"vaa'an"),('V','a\\b')]"#);
        let back: Annotation = ann.to_string().parse().unwrap();
        assert_eq!(back, ann);
    }

    #[test]
    fn encoder_drops_spaces() {
        let ann = Annotation::from_pairs(vec![Pair::new("N", "new york")], Vec::new());
        assert_eq!(ann.to_string(), "[('N','newyork')]");
    }

    #[test]
    fn tolerates_interior_whitespace() {
        let ann: Annotation = "[ ('N', 'a'), ('V', 'b') ]".parse().unwrap();
        assert_eq!(ann.distinct_labels(), vec!["N", "V"]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("[('N','a')".parse::<Annotation>().is_err());
        assert!("[('N')]".parse::<Annotation>().is_err());
        assert!("[('N','a','b')]".parse::<Annotation>().is_err());
        assert!("N".parse::<Annotation>().is_err());
        assert!("[('N','a')] [] x".parse::<Annotation>().is_err());
        assert_eq!(
            "[('N','a\\q')]".parse::<Annotation>(),
            Err(AnnotationError::BadEscape('q'))
        );
    }

    #[test]
    fn distinct_labels_keep_first_seen_order() {
        let ann = Annotation::from_pairs(
            vec![
                Pair::new("V", "a"),
                Pair::new("N", "b"),
                Pair::new("V", "c"),
            ],
            Vec::new(),
        );
        assert_eq!(ann.distinct_labels(), vec!["V", "N"]);
    }
}
