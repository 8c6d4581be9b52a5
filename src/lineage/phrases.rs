//! Session-wide merging of same-action word runs into phrases
//!
//! A run of two or more words sharing one action (and containing no
//! punctuation) becomes a phrase only when every prompt of the session
//! either holds the same words as a uniform run, or never edits any of
//! them. Merging repeats until no prompt offers another such run.

use crate::io::configuration::DEFAULT_SYMBOLS;
use crate::lineage::timeline::{Timeline, WordId, WordNode};
use crate::text::differ::DiffAction;
use log::debug;
use std::collections::HashSet;

/// Fixpoint phrase merger over a whole [`Timeline`]
#[derive(Debug, Clone)]
pub struct PhraseMerger {
    symbols: Vec<String>,
}

impl Default for PhraseMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseMerger {
    /// Create a merger that never crosses the default symbols
    pub fn new() -> Self {
        Self::with_symbols(DEFAULT_SYMBOLS)
    }

    /// Create a merger that never crosses the given symbols
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Merge phrases until no further merge applies
    pub fn merge(&self, timeline: &Timeline) -> Timeline {
        let mut current = timeline.clone();
        let mut merges = 0_usize;

        while let Some(next) = self.merge_step(&current) {
            current = next;
            merges += 1;
        }

        debug!("Phrase merging reached a fixpoint after {merges} merges");
        current
    }

    /// Apply the first acceptable phrase merge, if any
    ///
    /// Prompts are scanned in order, start positions left to right and
    /// windows shortest first. The returned snapshot leaves the input
    /// untouched.
    pub fn merge_step(&self, timeline: &Timeline) -> Option<Timeline> {
        let sentences: Vec<Vec<&WordNode>> = (0..timeline.len())
            .map(|prompt| timeline.words(prompt).collect())
            .collect();

        for words in &sentences {
            for start in 0..words.len() {
                let Some(first) = words.get(start) else {
                    continue;
                };

                for end in start + 2..=words.len() {
                    let Some(window) = words.get(start..end) else {
                        break;
                    };
                    let breaks_run = window.iter().any(|word| {
                        self.is_symbol(&word.text) || word.action != first.action
                    });
                    if breaks_run {
                        break;
                    }

                    let phrase: Vec<&str> =
                        window.iter().map(|word| word.text.as_str()).collect();
                    if sentences.iter().all(|s| accepts_phrase(s, &phrase)) {
                        debug!("Merging phrase '{}'", phrase.join(" "));
                        return Some(apply_phrase(timeline, &phrase));
                    }
                }
            }
        }

        None
    }

    fn is_symbol(&self, text: &str) -> bool {
        self.symbols.iter().any(|symbol| symbol == text)
    }
}

/// Start of the first run in `words` spelling `phrase` with one shared action
fn find_uniform_run(words: &[&WordNode], phrase: &[&str]) -> Option<usize> {
    if phrase.is_empty() || words.len() < phrase.len() {
        return None;
    }

    (0..=words.len() - phrase.len()).find(|&start| {
        let Some(segment) = words.get(start..start + phrase.len()) else {
            return false;
        };
        let texts_match = segment
            .iter()
            .zip(phrase)
            .all(|(word, text)| word.text == *text);
        let action = segment.first().map(|word| word.action);
        texts_match && segment.iter().all(|word| Some(word.action) == action)
    })
}

/// Whether merging `phrase` elsewhere is consistent with this sentence
fn accepts_phrase(words: &[&WordNode], phrase: &[&str]) -> bool {
    if find_uniform_run(words, phrase).is_some() {
        return true;
    }
    !words
        .iter()
        .any(|word| word.action != DiffAction::Keep && phrase.contains(&word.text.as_str()))
}

/// Collapse every occurrence of `phrase` in every prompt into one node
fn apply_phrase(timeline: &Timeline, phrase: &[&str]) -> Timeline {
    let mut next = timeline.clone();
    let mut absorbed: HashSet<WordId> = HashSet::new();

    for prompt in 0..next.len() {
        // A collapsed head spells the whole phrase and cannot match again
        loop {
            let words: Vec<&WordNode> = next.words(prompt).collect();
            let Some(start) = find_uniform_run(&words, phrase) else {
                break;
            };
            let run = next.collapse_run(prompt, start, phrase.len());
            if run.is_empty() {
                break;
            }
            absorbed.extend(run);
        }
    }

    next.prune_links(&absorbed);
    next
}
