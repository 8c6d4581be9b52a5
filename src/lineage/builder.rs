//! Chains consecutive prompt diffs into a word provenance graph

use crate::io::error::Result;
use crate::lineage::timeline::{Timeline, WordId};
use crate::text::differ::{DiffAction, DiffOp, WeightedDiffer, diff_tokens};
use crate::text::tokenizer::Token;

/// Builds [`Timeline`]s from ordered prompt sessions
///
/// Prompt *i* is diffed against prompt *i-1* (the first prompt against an
/// empty one). Kept, moved, reweighted and removed words link to their
/// source word in the previous prompt; inserted words link to the most
/// recent earlier occurrence of the same text, if any.
#[derive(Debug, Clone, Default)]
pub struct LineageBuilder {
    differ: WeightedDiffer,
}

impl LineageBuilder {
    /// Create a builder using the default symbol set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder tokenizing prompts with the given differ
    pub const fn with_differ(differ: WeightedDiffer) -> Self {
        Self { differ }
    }

    /// Build the timeline of a whole session
    ///
    /// # Errors
    ///
    /// Returns `MalformedPromptSyntax` if any prompt fails to tokenize
    pub fn build<S: AsRef<str>>(&self, prompts: &[S]) -> Result<Timeline> {
        let mut timeline = Timeline::new();
        for prompt in prompts {
            let tokens = self.differ.tokenizer().tokenize(prompt.as_ref())?;
            extend(&mut timeline, prompt.as_ref(), tokens);
        }
        Ok(timeline)
    }

    /// Return a new timeline with one more prompt appended
    ///
    /// Existing nodes and links are kept as they are; only links into the
    /// new prompt are added.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPromptSyntax` if the prompt fails to tokenize
    pub fn append(&self, timeline: &Timeline, prompt: &str) -> Result<Timeline> {
        let tokens = self.differ.tokenizer().tokenize(prompt)?;
        let mut next = timeline.clone();
        extend(&mut next, prompt, tokens);
        Ok(next)
    }
}

fn extend(timeline: &mut Timeline, text: &str, tokens: Vec<Token>) {
    let previous_tokens = timeline
        .len()
        .checked_sub(1)
        .and_then(|last| timeline.prompt(last))
        .map(|p| p.tokens.clone())
        .unwrap_or_default();

    let ops = diff_tokens(&previous_tokens, &tokens);
    let prompt = timeline.push_prompt(text, tokens, &ops);
    let ids: Vec<WordId> = timeline
        .prompt(prompt)
        .map(|p| p.words.clone())
        .unwrap_or_default();

    for (op, id) in ops.iter().zip(ids) {
        let source = match op.action {
            DiffAction::Keep
            | DiffAction::Remove
            | DiffAction::Move
            | DiffAction::ReweightUp
            | DiffAction::ReweightDown => source_word(timeline, prompt, op),
            DiffAction::Insert => earlier_occurrence(timeline, prompt, &op.text),
        };
        if let Some(source) = source {
            timeline.link(source, id, op.action);
        }
    }
}

/// Word of the previous prompt sitting at the op's source position
fn source_word(timeline: &Timeline, prompt: usize, op: &DiffOp) -> Option<WordId> {
    let previous = prompt.checked_sub(1)?;
    let source_index = op.source_index?;
    timeline
        .words(previous)
        .find(|word| word.position == Some(source_index))
        .map(|word| word.id)
}

/// Most recent earlier word with the same text
///
/// Searches prompts newest first and stops at the first prompt with any
/// match, preferring a match that has no forward link yet.
fn earlier_occurrence(timeline: &Timeline, prompt: usize, text: &str) -> Option<WordId> {
    for earlier in (0..prompt).rev() {
        let mut matches = timeline.words(earlier).filter(|word| word.text == text);
        let Some(first) = matches.next() else {
            continue;
        };
        if first.next.is_empty() {
            return Some(first.id);
        }
        let unlinked = matches.find(|word| word.next.is_empty());
        return Some(unlinked.map_or(first.id, |word| word.id));
    }
    None
}
