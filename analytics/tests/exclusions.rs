//! Hot reload of the exclusion word file

use std::sync::Arc;

use analytics::{AnalyticsError, ExclusionList, KeywordEngine};

#[tokio::test]
async fn test_reload_swaps_words_and_keeps_old_set_on_failure() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exclusions.txt");
    std::fs::write(&path, "i\nacme\n").unwrap();

    let list = Arc::new(ExclusionList::from_file(&path).await.unwrap());
    let engine = KeywordEngine::new(list.clone());
    let text = "I recommend Acme over Globex.";
    assert_eq!(engine.extract(text).keys().collect::<Vec<_>>(), vec!["Globex"]);

    // Act: edit the file and reload
    std::fs::write(&path, "# now only pronouns\ni\n").unwrap();
    let loaded = engine.reload_exclusion_words().await.unwrap();

    // Assert
    assert_eq!(loaded, 1);
    assert_eq!(engine.extract(text).keys().collect::<Vec<_>>(), vec!["Acme", "Globex"]);

    // A failed reload leaves the last good set in place
    std::fs::remove_file(&path).unwrap();
    let result = engine.reload_exclusion_words().await;
    assert!(matches!(result, Err(AnalyticsError::ExclusionLoad { .. })));
    assert_eq!(list.len(), 1);
    assert!(list.contains("i"));
}

#[tokio::test]
async fn test_missing_file_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = ExclusionList::from_file(dir.path().join("absent.txt")).await;
    assert!(matches!(result, Err(AnalyticsError::ExclusionLoad { .. })));
}
