//! Contextual features for the FinnPos tagger.
//!
//! Follows Ratnaparkhi (1996), *A Maximum Entropy Model for Part-of-Speech
//! Tagging*: surrounding words in a two-token window, affixes and
//! orthographic flags for rare words. On top of that, adjacent word pairs,
//! the lower-cased form and the analyzer's candidate labels are used.
//!
//! Affix and flag features are only produced for words outside a supplied
//! list of frequent words, keeping the feature space small.
//!
//! # Example
//! ```no_run
//! use std::io;
//! use finnpos_feats::{FeatureExtractor, FreqWords};
//!
//! # fn main() -> anyhow::Result<()> {
//! let extractor = FeatureExtractor::new(FreqWords::load("freq_words.txt")?);
//! let stdin = io::stdin();
//! extractor.run(stdin.lock(), io::stdout())?;
//! # Ok(()) }
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use finnpos_stream::{StreamError, StreamSummary, process};
use finnpos_types::{BOUNDARY_WF, Field, Record};
use tracing::info;

/// Longest suffix and prefix emitted as a feature.
pub const MAX_AFFIX_LEN: usize = 10;

/// Emitted when `ann` holds a candidate sequence without any label.
pub const NO_LABELS: &str = "NO_LABELS";

/// Word forms that skip affix and orthographic features.
#[derive(Clone, Debug, Default)]
pub struct FreqWords {
    words: HashSet<String>,
}

impl FreqWords {
    /// Read a word list with one word per line; blank lines are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("open frequent word list {}", path.display()))?;
        let mut words = HashSet::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
            let word = line.trim_end_matches('\r');
            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }
        info!("loaded {} frequent words from {}", words.len(), path.display());
        Ok(Self { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FreqWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Builds feature strings sentence by sentence.
pub struct FeatureExtractor {
    freq_words: FreqWords,
}

impl FeatureExtractor {
    pub fn new(freq_words: FreqWords) -> Self {
        Self { freq_words }
    }

    /// Features for the token at `i`, in emission order.
    pub fn features(&self, sentence: &[Record], i: usize) -> Vec<String> {
        let rec = &sentence[i];
        let wf = rec.word();
        let mut feats = Vec::new();

        if let Some(candidates) = rec.ann.candidates() {
            if candidates.is_empty() {
                feats.push(NO_LABELS.to_string());
            } else {
                feats.extend(candidates.iter().map(|pair| format!("FEAT:{}", pair.label)));
            }
        }

        let prev = word_at(sentence, i, -1);
        let next = word_at(sentence, i, 1);
        feats.push(format!("PPWORD={}", word_at(sentence, i, -2)));
        feats.push(format!("PWORD={prev}"));
        feats.push(format!("WORD={wf}"));
        feats.push(format!("NWORD={next}"));
        feats.push(format!("NNWORD={}", word_at(sentence, i, 2)));

        feats.push(format!("WORD_LEN={}", wf.chars().count()));

        feats.push(format!("PWORDPAIR={prev}_{wf}"));
        feats.push(format!("NWORDPAIR={wf}_{next}"));

        feats.push(format!("LC_WORD={}", wf.to_lowercase()));

        if !self.freq_words.contains(wf) {
            let chars: Vec<char> = wf.chars().collect();
            let max = chars.len().min(MAX_AFFIX_LEN);
            for k in 1..=max {
                let suffix: String = chars[chars.len() - k..].iter().collect();
                feats.push(format!("{k}-SUFFIX={suffix}"));
            }
            for k in 1..=max {
                let prefix: String = chars[..k].iter().collect();
                feats.push(format!("{k}-PREFIX={prefix}"));
            }
            if chars.iter().any(|&c| c.is_ascii_uppercase() || matches!(c, 'Å' | 'Ä' | 'Ö')) {
                feats.push("HAS_UC".to_string());
            }
            if chars.iter().any(char::is_ascii_digit) {
                feats.push("HAS_DIGIT".to_string());
            }
            if chars.contains(&'-') {
                feats.push("HAS_DASH".to_string());
            }
        }

        feats
    }

    /// Rewrite the `feats` column of every token, keeping existing tokens first.
    pub fn extract(&self, sentence: &mut [Record]) {
        let computed: Vec<Vec<String>> = (0..sentence.len())
            .map(|i| self.features(sentence, i))
            .collect();
        for (rec, new) in sentence.iter_mut().zip(computed) {
            let mut tokens: Vec<String> = rec.feats.tokens().map(str::to_string).collect();
            tokens.extend(new);
            rec.feats = Field::from(tokens.join(" "));
        }
    }

    /// Stream `input` to `output`, flushing after each sentence.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<StreamSummary, StreamError> {
        process(input, output, |sentence| {
            self.extract(sentence);
            Ok::<_, StreamError>(())
        })
    }
}

fn word_at(sentence: &[Record], i: usize, offset: isize) -> &str {
    i.checked_add_signed(offset)
        .and_then(|j| sentence.get(j))
        .map(Record::word)
        .unwrap_or(BOUNDARY_WF)
}
