//! Tests for progress tracking of session file batches

#[cfg(test)]
mod tests {
    use prompt_evolution::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use prompt_evolution::io::progress::ProgressManager;
    use std::path::Path;
    use std::time::Duration;

    // Tests ProgressManager construction
    // Verified by setting wrong initial state
    #[test]
    fn test_progress_manager_new() {
        let mut pm = ProgressManager::new();

        pm.initialize(0);
        pm.finish();

        pm.initialize(1);
        pm.start_file(0, Path::new("session.json"));
        pm.complete_file(0, Duration::from_millis(100));
        pm.finish();
    }

    // Tests default trait implementation
    #[test]
    fn test_progress_manager_default() {
        let mut pm = ProgressManager::default();
        pm.initialize(2);
        pm.start_file(0, Path::new("a.json"));
        pm.complete_file(0, Duration::from_millis(20));
        pm.start_file(1, Path::new("b.json"));
        pm.fail_file(1, "malformed prompt");
        pm.finish();
    }

    // Tests individual bars below the batch limit
    // Verified by creating one less progress bar
    #[test]
    fn test_initialize_multiple_files_under_limit() {
        let mut pm = ProgressManager::new();
        let file_count = MAX_INDIVIDUAL_PROGRESS_BARS - 1;
        pm.initialize(file_count);

        for i in 0..file_count {
            pm.start_file(i, Path::new(&format!("session{i}.json")));
            pm.complete_file(i, Duration::from_millis(10));
        }
        pm.finish();
    }

    // Tests the batch bar once the file list is too long
    #[test]
    fn test_initialize_multiple_files_over_limit() {
        let mut pm = ProgressManager::new();
        let file_count = MAX_INDIVIDUAL_PROGRESS_BARS * 3;
        pm.initialize(file_count);

        for i in 0..file_count {
            pm.start_file(i, Path::new(&format!("session{i}.json")));
            if i % 4 == 0 {
                pm.fail_file(i, "unreadable");
            } else {
                pm.complete_file(i, Duration::from_millis(5));
            }
        }
        pm.finish();
    }

    // Tests indices beyond the initialized count are tolerated
    // Verified by indexing the state list directly
    #[test]
    fn test_out_of_bounds_file_index() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);

        pm.complete_file(5, Duration::from_millis(1));
        pm.fail_file(9, "missing");
        pm.start_file(3, Path::new("late.json"));
        pm.complete_file(3, Duration::from_millis(1));
        pm.finish();
    }
}
