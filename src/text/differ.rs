//! Word-level diff between two prompts with move and reweight detection

use crate::io::configuration::UNMOVABLE_TOKEN;
use crate::io::error::Result;
use crate::text::myers::{self, Edit};
use crate::text::tokenizer::{Token, Tokenizer};
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one token between two prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    /// Same token at an aligned position with the same weight
    Keep,
    /// Token only present in the target prompt
    Insert,
    /// Token only present in the source prompt
    Remove,
    /// Token present in both prompts at unaligned positions
    Move,
    /// Aligned token whose weight increased
    ReweightUp,
    /// Aligned token whose weight decreased
    ReweightDown,
}

impl DiffAction {
    /// Every action, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Keep,
        Self::Insert,
        Self::Remove,
        Self::Move,
        Self::ReweightUp,
        Self::ReweightDown,
    ];

    /// Whether the token exists in the source prompt
    pub const fn in_source(self) -> bool {
        !matches!(self, Self::Insert)
    }

    /// Whether the token exists in the target prompt
    pub const fn in_target(self) -> bool {
        !matches!(self, Self::Remove)
    }

    /// Whether the action changes the token sequence itself
    ///
    /// Reweights leave the words in place and are not edits.
    pub const fn is_edit(self) -> bool {
        matches!(self, Self::Insert | Self::Remove | Self::Move)
    }

    /// The same change seen from the target prompt back to the source
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Insert => Self::Remove,
            Self::Remove => Self::Insert,
            Self::ReweightUp => Self::ReweightDown,
            Self::ReweightDown => Self::ReweightUp,
            Self::Keep | Self::Move => self,
        }
    }

    /// Wire name of the action
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Move => "move",
            Self::ReweightUp => "reweight_up",
            Self::ReweightDown => "reweight_down",
        }
    }
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aligned or unaligned token of a prompt diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffOp {
    /// How the token changed
    pub action: DiffAction,
    /// Token text
    pub text: String,
    /// Position in the source token sequence, absent for insertions
    pub source_index: Option<usize>,
    /// Position in the target token sequence, absent for removals
    pub target_index: Option<usize>,
    /// Weight in the source prompt (mirrors the target weight for insertions)
    pub source_weight: f64,
    /// Weight in the target prompt (mirrors the source weight for removals)
    pub target_weight: f64,
}

impl DiffOp {
    /// Weight the token carries after the change
    ///
    /// Removed tokens report the weight they had before removal.
    pub const fn weight(&self) -> f64 {
        if self.action.in_target() {
            self.target_weight
        } else {
            self.source_weight
        }
    }

    fn keep(text: &str, source: &Token, target: &Token, indices: (usize, usize)) -> Self {
        Self {
            action: DiffAction::Keep,
            text: text.to_string(),
            source_index: Some(indices.0),
            target_index: Some(indices.1),
            source_weight: source.weight,
            target_weight: target.weight,
        }
    }

    fn one_sided(action: DiffAction, token: &Token, index: usize) -> Self {
        let (source_index, target_index) = if action == DiffAction::Insert {
            (None, Some(index))
        } else {
            (Some(index), None)
        };
        Self {
            action,
            text: token.text.clone(),
            source_index,
            target_index,
            source_weight: token.weight,
            target_weight: token.weight,
        }
    }

    fn moved(removed: &Self, inserted: &Self) -> Self {
        Self {
            action: DiffAction::Move,
            text: removed.text.clone(),
            source_index: removed.source_index,
            target_index: inserted.target_index,
            source_weight: removed.source_weight,
            target_weight: inserted.target_weight,
        }
    }

    /// Turn a kept token into a reweight when its weight changed
    fn classify_weight(mut self) -> Self {
        if self.action == DiffAction::Keep {
            if self.target_weight > self.source_weight {
                self.action = DiffAction::ReweightUp;
            } else if self.target_weight < self.source_weight {
                self.action = DiffAction::ReweightDown;
            }
        }
        self
    }
}

/// Diffs prompts given as raw text
#[derive(Debug, Clone, Default)]
pub struct WeightedDiffer {
    tokenizer: Tokenizer,
}

impl WeightedDiffer {
    /// Create a differ using the default symbol set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a differ tokenizing with the given tokenizer
    pub const fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Tokenizer used for raw prompts
    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenize both prompts and diff them
    ///
    /// # Errors
    ///
    /// Returns `MalformedPromptSyntax` if either prompt fails to tokenize
    pub fn diff_prompts(&self, source: &str, target: &str) -> Result<Vec<DiffOp>> {
        let source_tokens = self.tokenizer.tokenize(source)?;
        let target_tokens = self.tokenizer.tokenize(target)?;
        Ok(diff_tokens(&source_tokens, &target_tokens))
    }
}

/// Diff two token sequences
///
/// Runs a shortest edit script over token texts, pairs each insertion with a
/// removal of the same text into a move, then splits kept tokens whose
/// weight changed into reweights.
pub fn diff_tokens(source: &[Token], target: &[Token]) -> Vec<DiffOp> {
    let source_texts: Vec<&str> = source.iter().map(|t| t.text.as_str()).collect();
    let target_texts: Vec<&str> = target.iter().map(|t| t.text.as_str()).collect();
    let script = myers::diff(&source_texts, &target_texts);

    let ops = index_script(&script, source, target);
    pair_moves(ops)
        .into_iter()
        .map(DiffOp::classify_weight)
        .collect()
}

/// Attach source/target positions and weights to an edit script
fn index_script(script: &[Edit], source: &[Token], target: &[Token]) -> Vec<DiffOp> {
    let mut ops = Vec::with_capacity(script.len());
    let mut source_idx = 0;
    let mut target_idx = 0;

    for edit in script {
        match edit {
            Edit::Keep => {
                if let (Some(s), Some(t)) = (source.get(source_idx), target.get(target_idx)) {
                    ops.push(DiffOp::keep(&s.text, s, t, (source_idx, target_idx)));
                }
                source_idx += 1;
                target_idx += 1;
            }
            Edit::Insert => {
                if let Some(t) = target.get(target_idx) {
                    ops.push(DiffOp::one_sided(DiffAction::Insert, t, target_idx));
                }
                target_idx += 1;
            }
            Edit::Remove => {
                if let Some(s) = source.get(source_idx) {
                    ops.push(DiffOp::one_sided(DiffAction::Remove, s, source_idx));
                }
                source_idx += 1;
            }
        }
    }

    ops
}

/// Collapse insert/remove pairs of identical text into moves
///
/// Each unpaired op looks for an unconsumed op of the opposite action, first
/// after itself and then before. The move takes the place of whichever op
/// of the pair is scanned first.
fn pair_moves(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut consumed = bitvec![0; ops.len()];
    let mut partners: Vec<Option<usize>> = vec![None; ops.len()];

    for (idx, op) in ops.iter().enumerate() {
        if is_set(&consumed, idx) || op.text == UNMOVABLE_TOKEN {
            continue;
        }
        let opposite = match op.action {
            DiffAction::Insert => DiffAction::Remove,
            DiffAction::Remove => DiffAction::Insert,
            _ => continue,
        };

        let is_partner = |j: &usize| {
            !is_set(&consumed, *j)
                && ops
                    .get(*j)
                    .is_some_and(|other| other.action == opposite && other.text == op.text)
        };
        let partner = (idx + 1..ops.len())
            .find(is_partner)
            .or_else(|| (0..idx).find(is_partner));

        if let Some(j) = partner {
            consumed.set(idx, true);
            consumed.set(j, true);
            if let Some(slot) = partners.get_mut(idx) {
                *slot = Some(j);
            }
        }
    }

    let mut result = Vec::with_capacity(ops.len());
    for (idx, op) in ops.iter().enumerate() {
        match partners.get(idx).copied().flatten() {
            Some(j) => {
                let Some(other) = ops.get(j) else {
                    continue;
                };
                let (removed, inserted) = if op.action == DiffAction::Remove {
                    (op, other)
                } else {
                    (other, op)
                };
                result.push(DiffOp::moved(removed, inserted));
            }
            None if is_set(&consumed, idx) => {}
            None => result.push(op.clone()),
        }
    }

    result
}

fn is_set(bits: &BitVec, index: usize) -> bool {
    bits.get(index).as_deref() == Some(&true)
}
