//! Tests for session-wide phrase merging

#[cfg(test)]
mod tests {
    use prompt_evolution::lineage::builder::LineageBuilder;
    use prompt_evolution::lineage::phrases::PhraseMerger;
    use prompt_evolution::lineage::timeline::{Timeline, WordId};
    use prompt_evolution::text::differ::DiffAction;

    fn build(prompts: &[&str]) -> Timeline {
        LineageBuilder::new().build(prompts).unwrap()
    }

    fn texts(timeline: &Timeline, prompt: usize) -> Vec<String> {
        timeline.words(prompt).map(|w| w.text.clone()).collect()
    }

    // Tests a contiguous same-action edit run becomes one phrase node
    #[test]
    fn test_merges_edit_run() {
        let timeline = build(&["a dog", "a big red dog"]);
        let merged = PhraseMerger::new().merge(&timeline);

        assert_eq!(texts(&merged, 1), vec!["a", "big red", "dog"]);
        let phrase = merged.words(1).find(|w| w.text == "big red");
        assert_eq!(phrase.map(|w| w.action), Some(DiffAction::Insert));
        assert_eq!(phrase.map(|w| w.id), Some(WordId(3)));
    }

    // Tests conflicting word-level actions elsewhere block the merge
    #[test]
    fn test_conflicting_actions_block_merge() {
        let timeline = build(&["x", "x big red", "x red"]);
        let merger = PhraseMerger::new();

        assert!(merger.merge_step(&timeline).is_none());
        assert_eq!(merger.merge(&timeline), timeline);
    }

    // Tests windows never cross punctuation
    #[test]
    fn test_symbols_break_windows() {
        let timeline = build(&["a , b"]);
        assert!(PhraseMerger::new().merge_step(&timeline).is_none());
    }

    // Tests the input timeline is left untouched
    #[test]
    fn test_merge_returns_new_snapshot() {
        let timeline = build(&["a dog", "a big red dog"]);
        let before = timeline.clone();
        let _ = PhraseMerger::new().merge(&timeline);
        assert_eq!(timeline, before);
    }

    // Tests a phrase occurring in several prompts merges everywhere at once
    #[test]
    fn test_merges_every_occurrence() {
        let timeline = build(&["a cat", "a cat big red", "a cat", "a cat big red"]);
        let merged = PhraseMerger::new().merge(&timeline);

        assert_eq!(texts(&merged, 1), vec!["a cat", "big red"]);
        assert_eq!(texts(&merged, 3), vec!["a cat", "big red"]);
        assert_eq!(texts(&merged, 2), vec!["a cat", "big red"]);
    }

    // Tests links into absorbed words are pruned while the head keeps its own
    #[test]
    fn test_absorbed_links_pruned() {
        let timeline = build(&["a dog", "a big red dog"]);
        let merged = PhraseMerger::new().merge(&timeline);

        // "a dog" of the first prompt absorbs its "dog" (w1)
        assert_eq!(texts(&merged, 0), vec!["a dog"]);
        let dog = merged.words(1).find(|w| w.text == "dog");
        assert!(dog.is_some_and(|w| w.prev.is_empty()));

        let head = merged.node(WordId(0));
        assert!(head.is_some_and(|n| n.next.iter().any(|l| l.id == WordId(2))));
    }

    // Tests merging reaches a fixpoint
    #[test]
    fn test_fixpoint() {
        let timeline = build(&["a dog", "a big red dog"]);
        let merger = PhraseMerger::new();
        let merged = merger.merge(&timeline);
        assert!(merger.merge_step(&merged).is_none());
    }
}
