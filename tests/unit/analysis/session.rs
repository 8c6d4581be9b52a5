//! Tests for end-to-end session analysis

#[cfg(test)]
mod tests {
    use prompt_evolution::AnalysisError;
    use prompt_evolution::analysis::config::AnalysisConfig;
    use prompt_evolution::analysis::session::{Session, SessionAnalyzer, SessionPrompt};
    use prompt_evolution::layout::procrustes::ProjectionPoint;
    use prompt_evolution::text::differ::DiffAction;

    fn prompt(text: &str, images: &[&str]) -> SessionPrompt {
        SessionPrompt {
            prompt: text.to_string(),
            images: images.iter().map(ToString::to_string).collect(),
        }
    }

    fn two_prompt_session() -> Session {
        Session {
            prompts: vec![
                prompt("a red dog", &["img0"]),
                prompt("a blue dog", &["img1"]),
            ],
            image_projection: vec![
                ProjectionPoint::new("img0", 0.0, 0.0),
                ProjectionPoint::new("img1", 10.0, 0.0),
            ],
            previous_projection: None,
        }
    }

    fn analyzer() -> SessionAnalyzer {
        SessionAnalyzer::new(AnalysisConfig::default()).expect("Failed to create analyzer")
    }

    // Tests image keys are deduplicated in first-appearance order
    #[test]
    fn test_image_keys_and_indices() {
        let session = Session {
            prompts: vec![
                prompt("a", &["x", "y"]),
                prompt("b", &[]),
                prompt("c", &["y", "z"]),
            ],
            ..Session::default()
        };

        assert_eq!(session.image_keys(), vec!["x", "y", "z"]);
        assert_eq!(session.image_indices(), vec![vec![0, 1], vec![], vec![1, 2]]);
    }

    // Tests every view is produced for a simple session
    #[test]
    fn test_analyze_two_prompts() {
        let analysis = analyzer()
            .analyze(&two_prompt_session())
            .expect("Failed to analyze session");

        assert_eq!(analysis.timeline.len(), 2);
        let actions: Vec<DiffAction> = analysis.timeline[1].words.iter().map(|w| w.action).collect();
        assert_eq!(
            actions,
            vec![
                DiffAction::Keep,
                DiffAction::Remove,
                DiffAction::Insert,
                DiffAction::Keep,
            ]
        );

        assert_eq!(analysis.layout, two_prompt_session().image_projection);
        assert_eq!(analysis.clusters.len(), 2);
        assert_ne!(analysis.clusters.get("img0"), analysis.clusters.get("img1"));

        assert_eq!(analysis.edges.len(), 1);
        assert_eq!(analysis.edges[0].word, "red blue");
        assert_eq!(analysis.edge_groups.len(), 1);
        assert_eq!(analysis.image_ranking, vec!["img0", "img1"]);
    }

    // Tests the layout is aligned to the previous one when present
    #[test]
    fn test_analyze_aligns_previous_layout() {
        let session = Session {
            image_projection: vec![
                ProjectionPoint::new("img0", 5.0, 5.0),
                ProjectionPoint::new("img1", 5.0, 7.0),
            ],
            previous_projection: Some(vec![
                ProjectionPoint::new("img0", 0.0, 0.0),
                ProjectionPoint::new("img1", 1.0, 0.0),
            ]),
            ..two_prompt_session()
        };
        let analysis = analyzer().analyze(&session).expect("Failed to analyze session");

        let expected = [[0.0, 0.5], [1.0, 0.5]];
        for (point, want) in analysis.layout.iter().zip(expected) {
            for (got, want) in point.coordinates.iter().zip(want) {
                assert!((got - want).abs() < 1e-9);
            }
        }
        assert_eq!(analysis.clusters.len(), 2);
    }

    // Tests images missing from the layout are reported
    #[test]
    fn test_analyze_missing_layout_point() {
        let mut session = two_prompt_session();
        session.image_projection.pop();

        assert!(matches!(
            analyzer().analyze(&session),
            Err(AnalysisError::UnknownImage { image: 1, .. })
        ));
    }

    // Tests malformed prompts abort the analysis
    #[test]
    fn test_analyze_malformed_prompt() {
        let mut session = two_prompt_session();
        session.prompts.push(prompt("a (broken dog", &[]));

        assert!(matches!(
            analyzer().analyze(&session),
            Err(AnalysisError::MalformedPromptSyntax { .. })
        ));
    }

    // Tests an empty session analyzes to empty views
    #[test]
    fn test_analyze_empty_session() {
        let analysis = analyzer()
            .analyze(&Session::default())
            .expect("Failed to analyze session");

        assert!(analysis.timeline.is_empty());
        assert!(analysis.layout.is_empty());
        assert!(analysis.clusters.is_empty());
        assert!(analysis.edges.is_empty());
        assert!(analysis.image_ranking.is_empty());
    }

    // Tests prompts too far apart are not compared
    #[test]
    fn test_analyze_pair_distance() {
        let config = AnalysisConfig {
            max_pair_distance: 1,
            ..AnalysisConfig::default()
        };
        let analysis = SessionAnalyzer::new(config)
            .and_then(|a| a.analyze(&two_prompt_session()))
            .expect("Failed to analyze session");

        assert!(analysis.edges.is_empty());
        assert!(analysis.edge_groups.is_empty());
        assert_eq!(analysis.image_ranking.len(), 2);
    }
}
