//! Prompt tokenization with sentence weights and bracket emphasis
//!
//! A prompt is a `;`-separated list of sentences. Each sentence may end in a
//! `:<number>` suffix giving its base weight, and runs of tokens wrapped in
//! `(` … `)` or `[` … `]` scale that weight up or down per nesting level.

use crate::io::configuration::{
    DEFAULT_BASE_WEIGHT, DEFAULT_SYMBOLS, EMPHASIS_DOWN_FACTOR, EMPHASIS_UP_FACTOR,
    SENTENCE_SEPARATOR, WEIGHT_SEPARATOR,
};
use crate::io::error::{Result, malformed_prompt};
use serde::{Deserialize, Serialize};

/// A single weighted token of a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token text with emphasis brackets stripped
    pub text: String,
    /// Token text as written, brackets included
    pub original_text: String,
    /// Emphasis multiplier
    pub weight: f64,
    /// Index of the token within its prompt
    pub position: usize,
}

impl Token {
    /// Create an unbracketed token
    pub fn new(text: impl Into<String>, weight: f64, position: usize) -> Self {
        let text = text.into();
        Self {
            original_text: text.clone(),
            text,
            weight,
            position,
        }
    }
}

/// Splits prompts into weighted tokens
///
/// Holds no state between calls; the same tokenizer can be reused for any
/// number of prompts.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    symbols: Vec<String>,
    base_weight: f64,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a tokenizer using the default symbol set
    pub fn new() -> Self {
        Self::with_symbols(DEFAULT_SYMBOLS)
    }

    /// Create a tokenizer splitting on a custom symbol set
    ///
    /// Empty symbols are ignored. Longer symbols take precedence over
    /// shorter ones sharing a prefix.
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut symbols: Vec<String> = symbols
            .into_iter()
            .map(Into::into)
            .filter(|symbol: &String| !symbol.is_empty())
            .collect();
        symbols.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            symbols,
            base_weight: DEFAULT_BASE_WEIGHT,
        }
    }

    /// Configured punctuation symbols
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Test whether a token text is one of the configured symbols
    pub fn is_symbol(&self, text: &str) -> bool {
        self.symbols.iter().any(|symbol| symbol == text)
    }

    /// Split a prompt into weighted tokens
    ///
    /// # Errors
    ///
    /// Returns `MalformedPromptSyntax` if:
    /// - A sentence contains more than one weight separator
    /// - A weight suffix is not a finite number
    /// - Emphasis brackets are unbalanced or closed by the wrong kind
    pub fn tokenize(&self, prompt: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        for sentence in prompt.split(SENTENCE_SEPARATOR).map(str::trim) {
            for (original_text, weight) in self.tokenize_sentence(sentence)? {
                let text = strip_brackets(&original_text);
                if text.is_empty() {
                    continue;
                }
                tokens.push(Token {
                    text: text.to_string(),
                    original_text,
                    weight,
                    position: tokens.len(),
                });
            }
        }

        Ok(tokens)
    }

    fn tokenize_sentence(&self, sentence: &str) -> Result<Vec<(String, f64)>> {
        let (body, base_weight) = self.split_weight_suffix(sentence)?;
        let pieces = self.split_pieces(body);
        let weights = apply_emphasis(sentence, &pieces, base_weight)?;
        Ok(pieces.into_iter().zip(weights).collect())
    }

    fn split_weight_suffix<'s>(&self, sentence: &'s str) -> Result<(&'s str, f64)> {
        if !sentence.contains(WEIGHT_SEPARATOR) {
            return Ok((sentence, self.base_weight));
        }

        let segments: Vec<&str> = sentence.split(WEIGHT_SEPARATOR).collect();
        let [body, suffix] = segments.as_slice() else {
            return Err(malformed_prompt(
                sentence,
                &format!("expected exactly one '{WEIGHT_SEPARATOR}' weight separator"),
            ));
        };

        let weight: f64 = suffix.trim().parse().map_err(|parse_error| {
            malformed_prompt(sentence, &format!("invalid weight '{suffix}': {parse_error}"))
        })?;
        if !weight.is_finite() {
            return Err(malformed_prompt(
                sentence,
                &format!("weight '{suffix}' is not finite"),
            ));
        }

        Ok((*body, weight))
    }

    /// Split on whitespace, then cut every configured symbol out as its own piece
    fn split_pieces(&self, body: &str) -> Vec<String> {
        let mut pieces = Vec::new();

        for word in body.split_whitespace() {
            let mut current = String::new();
            let mut rest = word;

            while let Some(ch) = rest.chars().next() {
                if let Some(symbol) = self.symbols.iter().find(|s| rest.starts_with(s.as_str())) {
                    if !current.is_empty() {
                        pieces.push(std::mem::take(&mut current));
                    }
                    pieces.push(symbol.clone());
                    rest = rest.get(symbol.len()..).unwrap_or_default();
                } else {
                    current.push(ch);
                    rest = rest.get(ch.len_utf8()..).unwrap_or_default();
                }
            }

            if !current.is_empty() {
                pieces.push(current);
            }
        }

        pieces
    }
}

/// Tokenize a prompt with the default symbol set
///
/// # Errors
///
/// Returns `MalformedPromptSyntax` under the same conditions as
/// [`Tokenizer::tokenize`]
pub fn tokenize(prompt: &str) -> Result<Vec<Token>> {
    Tokenizer::new().tokenize(prompt)
}

const fn matching_opener(closer: char) -> Option<char> {
    match closer {
        ')' => Some('('),
        ']' => Some('['),
        _ => None,
    }
}

const fn emphasis_factor(closer: char) -> f64 {
    if closer == ')' {
        EMPHASIS_UP_FACTOR
    } else {
        EMPHASIS_DOWN_FACTOR
    }
}

fn strip_brackets(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']'))
}

/// Assign a weight to each piece of one sentence
///
/// Every leading bracket of a piece opens an entry on the stack and every
/// trailing bracket closes the innermost open one. A closing piece weights
/// the run from the outermost entry it closed through itself, by one factor
/// per trailing bracket. Pieces already weighted by an inner run keep it.
fn apply_emphasis(sentence: &str, pieces: &[String], base_weight: f64) -> Result<Vec<f64>> {
    let mut weights = vec![base_weight; pieces.len()];
    let mut weighted = vec![false; pieces.len()];
    let mut open: Vec<(usize, char)> = Vec::new();

    for (idx, piece) in pieces.iter().enumerate() {
        open.extend(
            piece
                .chars()
                .take_while(|c| matches!(c, '(' | '['))
                .map(|opener| (idx, opener)),
        );

        let closing: Vec<char> = piece
            .chars()
            .rev()
            .take_while(|c| matching_opener(*c).is_some())
            .collect();
        if closing.is_empty() {
            continue;
        }

        let mut run_start = idx;
        let mut weight = base_weight;
        for &closer in closing.iter().rev() {
            let Some((start, opener)) = open.pop() else {
                return Err(malformed_prompt(
                    sentence,
                    &format!("'{closer}' in '{piece}' has no opening bracket"),
                ));
            };
            if matching_opener(closer) != Some(opener) {
                return Err(malformed_prompt(
                    sentence,
                    &format!("'{opener}' is closed by '{closer}'"),
                ));
            }
            run_start = start;
            weight *= emphasis_factor(closer);
        }

        for (slot, done) in weights
            .iter_mut()
            .zip(weighted.iter_mut())
            .take(idx + 1)
            .skip(run_start)
        {
            if !*done {
                *slot = weight;
                *done = true;
            }
        }
    }

    if let Some(&(open_idx, _)) = open.first() {
        let piece = pieces.get(open_idx).map_or("", String::as_str);
        return Err(malformed_prompt(
            sentence,
            &format!("bracket opened at '{piece}' is never closed"),
        ));
    }

    Ok(weights)
}
