//! Tests for prompt tokenization, sentence weights and emphasis brackets

#[cfg(test)]
mod tests {
    use prompt_evolution::AnalysisError;
    use prompt_evolution::text::tokenizer::{Tokenizer, tokenize};

    fn texts(prompt: &str) -> Vec<String> {
        tokenize(prompt)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    fn weights(prompt: &str) -> Vec<f64> {
        tokenize(prompt)
            .unwrap()
            .into_iter()
            .map(|t| t.weight)
            .collect()
    }

    fn assert_weights(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "weight {a} != {e}");
        }
    }

    // Tests single parentheses raise the weight of the wrapped word
    #[test]
    fn test_single_emphasis() {
        assert_eq!(texts("a (red) dog"), vec!["a", "red", "dog"]);
        assert_weights(&weights("a (red) dog"), &[1.0, 1.1, 1.0]);
    }

    // Tests nesting depth multiplies the emphasis factor
    #[test]
    fn test_nested_emphasis() {
        assert_weights(&weights("a ((red)) dog"), &[1.0, 1.21, 1.0]);
    }

    // Tests an inner run may close before its enclosing run
    // Verified by closing every open bracket on the first closer
    #[test]
    fn test_mixed_depth_emphasis() {
        assert_eq!(texts("a ((red) dog)"), vec!["a", "red", "dog"]);
        assert_weights(&weights("a ((red) dog)"), &[1.0, 1.1, 1.1]);

        assert_eq!(
            texts("((masterpiece), best quality)"),
            vec!["masterpiece", ",", "best", "quality"]
        );
        assert_weights(&weights("((masterpiece), best quality)"), &[1.1; 4]);

        assert_eq!(texts("[[a] b]"), vec!["a", "b"]);
        assert_weights(&weights("[[a] b]"), &[0.9, 0.9]);
    }

    // Tests a closing word keeps the weight of the deepest run it ends
    #[test]
    fn test_inner_run_keeps_its_weight() {
        assert_weights(&weights("(a ((b)) c)"), &[1.1, 1.21, 1.1]);
        assert_weights(&weights("(a [b] c)"), &[1.1, 0.9, 1.1]);
    }

    // Tests square brackets lower the weight
    #[test]
    fn test_deemphasis() {
        assert_weights(&weights("[blurry] photo"), &[0.9, 1.0]);
        assert_weights(&weights("[[blurry]] photo"), &[0.81, 1.0]);
    }

    // Tests a bracketed run spanning several words weights all of them
    #[test]
    fn test_emphasis_run() {
        assert_eq!(texts("(big red) dog"), vec!["big", "red", "dog"]);
        assert_weights(&weights("(big red) dog"), &[1.1, 1.1, 1.0]);
    }

    // Tests original text keeps the brackets
    #[test]
    fn test_original_text_keeps_brackets() {
        let tokens = tokenize("a (red) dog").unwrap();
        assert_eq!(tokens.get(1).map(|t| t.original_text.as_str()), Some("(red)"));
        assert_eq!(tokens.get(1).map(|t| t.text.as_str()), Some("red"));
    }

    // Tests symbols become standalone tokens with sequential positions
    #[test]
    fn test_symbols_split_out() {
        let tokens = tokenize("a cat, sitting.").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "cat", ",", "sitting", "."]);

        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }

    // Tests sentence weight suffixes apply per sentence and positions continue
    #[test]
    fn test_sentence_weights() {
        let tokens = tokenize("a cat:1.5; a dog").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_weights(
            &tokens.iter().map(|t| t.weight).collect::<Vec<_>>(),
            &[1.5, 1.5, 1.0, 1.0],
        );
        assert_eq!(tokens.get(3).map(|t| t.position), Some(3));
    }

    // Tests emphasis scales the sentence base weight
    #[test]
    fn test_emphasis_on_weighted_sentence() {
        assert_weights(&weights("a (cat):2"), &[2.0, 2.2]);
    }

    // Tests negative finite weights are accepted
    #[test]
    fn test_negative_sentence_weight() {
        assert_weights(&weights("ugly:-1"), &[-1.0]);
    }

    // Tests malformed weight suffixes are rejected
    #[test]
    fn test_malformed_weight_suffix() {
        assert!(matches!(
            tokenize("a cat:heavy"),
            Err(AnalysisError::MalformedPromptSyntax { .. })
        ));
        assert!(matches!(
            tokenize("a cat:1:2"),
            Err(AnalysisError::MalformedPromptSyntax { .. })
        ));
        assert!(matches!(
            tokenize("a cat:inf"),
            Err(AnalysisError::MalformedPromptSyntax { .. })
        ));
    }

    // Tests unbalanced and mismatched brackets are rejected
    #[test]
    fn test_unbalanced_brackets() {
        for prompt in [
            "a (red dog",
            "a red) dog",
            "a (red] dog",
            "[a red",
            "((red) dog",
            "(red) dog)",
            "[(a] b)",
        ] {
            assert!(
                matches!(
                    tokenize(prompt),
                    Err(AnalysisError::MalformedPromptSyntax { .. })
                ),
                "'{prompt}' should be rejected"
            );
        }
    }

    // Tests empty prompts and empty sentences yield no tokens
    #[test]
    fn test_empty_input() {
        assert!(texts("").is_empty());
        assert!(texts(" ; ;").is_empty());
        assert_eq!(texts("cat;;dog"), vec!["cat", "dog"]);
    }

    // Tests bracket-only pieces are dropped
    #[test]
    fn test_bracket_only_tokens_dropped() {
        assert_eq!(texts("a ( red ) dog"), vec!["a", "red", "dog"]);
        assert_weights(&weights("a ( red ) dog"), &[1.0, 1.1, 1.0]);
    }

    // Tests custom symbol sets, longest symbol first
    #[test]
    fn test_custom_symbols() {
        let tokenizer = Tokenizer::with_symbols(["|", "||", ""]);
        assert_eq!(tokenizer.symbols(), ["||", "|"]);
        assert!(tokenizer.is_symbol("|"));
        assert!(!tokenizer.is_symbol(","));

        let texts: Vec<String> = tokenizer
            .tokenize("a||b|c, d")
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["a", "||", "b", "|", "c,", "d"]);
    }

    // Tests the tokenizer is restartable
    #[test]
    fn test_tokenizer_is_stateless() {
        let tokenizer = Tokenizer::default();
        let first = tokenizer.tokenize("a (red) dog").unwrap();
        let second = tokenizer.tokenize("a (red) dog").unwrap();
        assert_eq!(first, second);
    }
}
