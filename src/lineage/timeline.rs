//! Arena of word nodes forming the provenance graph of a prompt session
//!
//! Every token occurrence of every prompt is a [`WordNode`] owned by the
//! [`Timeline`] and addressed by a stable [`WordId`]. Provenance edges are
//! plain id lists, so the graph can point backwards and forwards freely.

use crate::io::configuration::DEFAULT_WORD_LABEL;
use crate::text::differ::{DiffAction, DiffOp};
use crate::text::tokenizer::Token;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable index of a word node in the timeline arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(pub usize);

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Provenance edge to another word node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Node at the other end of the edge
    pub id: WordId,
    /// Action of the later node that created the edge
    pub action: DiffAction,
}

/// One token occurrence within a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordNode {
    /// Arena id
    pub id: WordId,
    /// Index of the owning prompt in the session
    pub prompt: usize,
    /// Word or phrase text
    pub text: String,
    /// Display label
    pub label: String,
    /// Change relative to the previous prompt
    pub action: DiffAction,
    /// Position in the owning prompt's token sequence, absent for removals
    pub position: Option<usize>,
    /// Weight in the previous prompt
    pub source_weight: f64,
    /// Weight in the owning prompt
    pub target_weight: f64,
    /// Edges to nodes of earlier prompts
    pub prev: Vec<Link>,
    /// Edges to nodes of later prompts
    pub next: Vec<Link>,
}

impl WordNode {
    /// Weight shown for the node on the timeline
    pub const fn weight(&self) -> f64 {
        self.target_weight
    }
}

/// One prompt of the session with its ordered word nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptNode {
    /// Index of the prompt in the session
    pub id: usize,
    /// Raw prompt text
    pub text: String,
    /// Tokens of the prompt
    pub tokens: Vec<Token>,
    /// Ordered word nodes, removed words of the previous prompt included
    pub words: Vec<WordId>,
}

/// A prompt with its word nodes resolved, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrompt {
    /// Index of the prompt in the session
    pub id: usize,
    /// Raw prompt text
    pub text: String,
    /// Ordered word nodes
    pub words: Vec<WordNode>,
}

/// Append-only provenance graph over a prompt session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    nodes: Vec<WordNode>,
    prompts: Vec<PromptNode>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prompts
    pub const fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the timeline holds no prompts
    pub const fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// All prompts in session order
    pub fn prompts(&self) -> &[PromptNode] {
        &self.prompts
    }

    /// Prompt at a session index
    pub fn prompt(&self, index: usize) -> Option<&PromptNode> {
        self.prompts.get(index)
    }

    /// Every node ever created, including phrase-absorbed ones
    pub fn nodes(&self) -> &[WordNode] {
        &self.nodes
    }

    /// Node by id
    pub fn node(&self, id: WordId) -> Option<&WordNode> {
        self.nodes.get(id.0)
    }

    /// Ordered word nodes of one prompt
    pub fn words(&self, prompt: usize) -> impl Iterator<Item = &WordNode> + '_ {
        self.prompts
            .get(prompt)
            .map(|p| p.words.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.node(*id))
    }

    /// Words of a prompt as a token sequence for re-diffing
    ///
    /// Only words present in the prompt itself are kept; phrases stay single
    /// tokens and carry their weight in this prompt.
    pub fn prompt_tokens(&self, prompt: usize) -> Vec<Token> {
        self.words(prompt)
            .filter(|word| word.action.in_target())
            .enumerate()
            .map(|(position, word)| Token::new(word.text.clone(), word.target_weight, position))
            .collect()
    }

    /// Every prompt with its word nodes resolved
    pub fn resolve(&self) -> Vec<ResolvedPrompt> {
        self.prompts
            .iter()
            .map(|prompt| ResolvedPrompt {
                id: prompt.id,
                text: prompt.text.clone(),
                words: self.words(prompt.id).cloned().collect(),
            })
            .collect()
    }

    /// Append a prompt whose words are the given diff against the last prompt
    ///
    /// Returns the new prompt's index. Links are left to the caller.
    pub(crate) fn push_prompt(&mut self, text: &str, tokens: Vec<Token>, ops: &[DiffOp]) -> usize {
        let prompt = self.prompts.len();
        let mut words = Vec::with_capacity(ops.len());

        for op in ops {
            let id = WordId(self.nodes.len());
            self.nodes.push(WordNode {
                id,
                prompt,
                text: op.text.clone(),
                label: DEFAULT_WORD_LABEL.to_string(),
                action: op.action,
                position: op.target_index,
                source_weight: op.source_weight,
                target_weight: op.target_weight,
                prev: Vec::new(),
                next: Vec::new(),
            });
            words.push(id);
        }

        self.prompts.push(PromptNode {
            id: prompt,
            text: text.to_string(),
            tokens,
            words,
        });
        prompt
    }

    /// Record a provenance edge from an earlier node to a later one
    pub(crate) fn link(&mut self, earlier: WordId, later: WordId, action: DiffAction) {
        if let Some(node) = self.nodes.get_mut(earlier.0) {
            node.next.push(Link { id: later, action });
        }
        if let Some(node) = self.nodes.get_mut(later.0) {
            node.prev.push(Link { id: earlier, action });
        }
    }

    /// Collapse a run of a prompt's words into its first word
    ///
    /// The first word takes the joined text; the rest stay in the arena but
    /// leave the prompt. Returns the absorbed ids.
    pub(crate) fn collapse_run(&mut self, prompt: usize, start: usize, len: usize) -> Vec<WordId> {
        let Some(words) = self.prompts.get_mut(prompt).map(|p| &mut p.words) else {
            return Vec::new();
        };
        let end = (start + len).min(words.len());
        if end <= start + 1 {
            return Vec::new();
        }

        let run: Vec<WordId> = words.drain(start + 1..end).collect();
        let Some(&head) = words.get(start) else {
            return Vec::new();
        };

        let mut text = self.node(head).map(|n| n.text.clone()).unwrap_or_default();
        for id in &run {
            if let Some(node) = self.node(*id) {
                text.push(' ');
                text.push_str(&node.text);
            }
        }
        if let Some(node) = self.nodes.get_mut(head.0) {
            node.text = text;
        }

        run
    }

    /// Drop every link pointing at one of the given nodes
    pub(crate) fn prune_links(&mut self, absorbed: &HashSet<WordId>) {
        if absorbed.is_empty() {
            return;
        }
        for node in &mut self.nodes {
            node.prev.retain(|link| !absorbed.contains(&link.id));
            node.next.retain(|link| !absorbed.contains(&link.id));
        }
    }
}
