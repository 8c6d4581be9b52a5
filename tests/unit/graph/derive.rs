//! Tests for prompt pairing and change graph derivation

#[cfg(test)]
mod tests {
    use prompt_evolution::AnalysisError;
    use prompt_evolution::graph::derive::{DiffWord, EdgeDeriver, rank_images};
    use prompt_evolution::graph::edges::Edge;
    use prompt_evolution::text::differ::DiffAction;
    use prompt_evolution::text::tokenizer::{Token, tokenize};

    fn prompts(texts: &[&str]) -> Vec<Vec<Token>> {
        texts
            .iter()
            .map(|text| tokenize(text).unwrap())
            .collect()
    }

    fn edge(src_image: usize, tgt_image: usize, weight: f64) -> Edge {
        Edge {
            word: "red".to_string(),
            action: DiffAction::Insert,
            src_image,
            tgt_image,
            src_cluster: 1,
            tgt_cluster: 1,
            src_prompt: 0,
            tgt_prompt: 1,
            ratio: 1,
            weight,
            changes: Vec::new(),
        }
    }

    // Tests diff words drop kept and ignored words
    #[test]
    fn test_diff_words() {
        let tokens = prompts(&["a red dog", "a blue dog"]);
        let (source, target) = (&tokens[0], &tokens[1]);

        assert_eq!(
            EdgeDeriver::new().diff_words(source, target),
            vec![
                DiffWord {
                    action: DiffAction::Remove,
                    text: "red".to_string(),
                },
                DiffWord {
                    action: DiffAction::Insert,
                    text: "blue".to_string(),
                },
            ]
        );

        let ignoring = EdgeDeriver::new().ignoring(["red"]);
        let words = ignoring.diff_words(source, target);
        assert_eq!(words.len(), 1);
        assert_eq!(words.first().map(|w| w.text.as_str()), Some("blue"));
    }

    // Tests the default stop words are ignored
    #[test]
    fn test_default_ignored_words() {
        let deriver = EdgeDeriver::with_default_ignored_words();
        assert!(deriver.ignored_words().iter().any(|w| w == "the"));

        let tokens = prompts(&["dog", "the dog"]);
        assert!(deriver.diff_words(&tokens[0], &tokens[1]).is_empty());
        assert_eq!(EdgeDeriver::new().diff_words(&tokens[0], &tokens[1]).len(), 1);
    }

    // Tests pairs are limited by diff word count
    #[test]
    fn test_prompt_pairs() {
        let tokens = prompts(&["a b c", "a b d", "x y z w"]);
        let deriver = EdgeDeriver::new();

        assert_eq!(deriver.prompt_pairs(&tokens, 2), vec![(0, 1)]);
        assert_eq!(deriver.prompt_pairs(&tokens, 10), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(deriver.prompt_pairs(&tokens, 1).is_empty());
        assert!(deriver.prompt_pairs(&[], 5).is_empty());
    }

    // Tests each compared pair spreads a total weight of one
    #[test]
    fn test_original_edges_weight() {
        let tokens = prompts(&["a cat", "a dog"]);
        let edges = EdgeDeriver::new()
            .generate_original_edges(&tokens, &[(0, 1)], &[1, 1, 2], &[vec![0, 1], vec![2]])
            .unwrap();

        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| e.ratio == 2));
        assert!(edges.iter().all(|e| (e.weight - 0.25).abs() < 1e-12));
        let total: f64 = edges.iter().map(|e| e.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(edges.iter().all(|e| e.tgt_cluster == 2));
    }

    // Tests identical prompts and imageless prompts produce no edges
    #[test]
    fn test_original_edges_skipped() {
        let tokens = prompts(&["a cat", "a cat", "a dog"]);
        let deriver = EdgeDeriver::new();

        let identical = deriver.generate_original_edges(&tokens, &[(0, 1)], &[1, 1], &[vec![0], vec![1], vec![]]);
        assert!(identical.is_ok_and(|edges| edges.is_empty()));

        let imageless = deriver.generate_original_edges(&tokens, &[(0, 2)], &[1, 1], &[vec![0], vec![1], vec![]]);
        assert!(imageless.is_ok_and(|edges| edges.is_empty()));
    }

    // Tests unknown prompts and unassigned images are rejected
    #[test]
    fn test_original_edges_errors() {
        let tokens = prompts(&["a cat", "a dog"]);
        let deriver = EdgeDeriver::new();

        assert!(matches!(
            deriver.generate_original_edges(&tokens, &[(0, 5)], &[1, 2], &[vec![0], vec![1]]),
            Err(AnalysisError::UnknownPrompt { index: 5, .. })
        ));
        assert!(matches!(
            deriver.generate_original_edges(&tokens, &[(0, 1)], &[1], &[vec![0], vec![1]]),
            Err(AnalysisError::UnknownImage { image: 1, .. })
        ));
    }

    // Tests a replacement collapses into one merged edge and one group
    #[test]
    fn test_derive_merges_replacement() {
        let tokens = prompts(&["a red dog", "a blue dog"]);
        let derivation = EdgeDeriver::new()
            .derive(&tokens, &[(0, 1)], &[1, 2], &[vec![0], vec![1]])
            .expect("Failed to derive edges");

        assert_eq!(derivation.edges.len(), 1);
        let merged = &derivation.edges[0];
        assert_eq!(merged.word, "red blue");
        assert_eq!(merged.action, DiffAction::Remove);
        assert_eq!((merged.src_cluster, merged.tgt_cluster), (1, 2));
        assert!((merged.weight - 1.0).abs() < 1e-12);
        assert_eq!(merged.changes.len(), 2);

        assert_eq!(derivation.groups.len(), 1);
        let group = &derivation.groups[0];
        assert_eq!(group.word, "red blue");
        assert_eq!(group.members, vec![0]);
        assert_eq!(group.changes, merged.changes);
        assert!((group.weight - 1.0).abs() < 1e-12);
    }

    // Tests groups come out by descending weight and reference their edges
    #[test]
    fn test_derive_groups_sorted() {
        let tokens = prompts(&["a cat", "a dog", "a big dog"]);
        let derivation = EdgeDeriver::new()
            .derive(&tokens, &[(0, 1), (1, 2), (0, 2)], &[1, 2, 2], &[vec![0], vec![1], vec![2]])
            .expect("Failed to derive edges");

        assert!(!derivation.groups.is_empty());
        assert!(derivation.groups.windows(2).all(|w| w[0].weight >= w[1].weight));
        for group in &derivation.groups {
            for &member in &group.members {
                let edge = &derivation.edges[member];
                assert_eq!(edge.word, group.word);
                assert_eq!(edge.action, group.action);
            }
        }
        let members: usize = derivation.groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(members, derivation.edges.len());
    }

    // Tests canonical direction reverses edges from higher to lower clusters
    #[test]
    fn test_derive_canonical_direction() {
        let tokens = prompts(&["a red dog", "a blue dog"]);
        let derivation = EdgeDeriver::new()
            .canonical_direction(true)
            .derive(&tokens, &[(0, 1)], &[2, 1], &[vec![0], vec![1]])
            .expect("Failed to derive edges");

        let merged = &derivation.edges[0];
        assert_eq!((merged.src_cluster, merged.tgt_cluster), (1, 2));
        assert_eq!((merged.src_image, merged.tgt_image), (1, 0));
        assert_eq!(merged.action, DiffAction::Insert);
        assert_eq!(merged.word, "red blue");
    }

    // Tests the edit distance matrix counts only word edits
    #[test]
    fn test_edit_distance_matrix() {
        let tokens = prompts(&["a b", "a c", "a (b)"]);
        let matrix = EdgeDeriver::edit_distance_matrix(&tokens);

        assert_eq!(matrix.dim(), (3, 3));
        assert_eq!(matrix[[0, 0]], 0);
        assert_eq!(matrix[[0, 1]], 2);
        assert_eq!(matrix[[1, 0]], 2);
        // Reweighting is not an edit
        assert_eq!(matrix[[0, 2]], 0);
    }

    // Tests images are ranked by touching edge weight
    #[test]
    fn test_rank_images() {
        let edges = vec![edge(0, 1, 1.0), edge(2, 1, 0.5), edge(3, 3, 0.2)];
        assert_eq!(rank_images(&edges, 5), vec![1, 0, 2, 3, 4]);
        assert!(rank_images(&edges, 0).is_empty());
    }
}
