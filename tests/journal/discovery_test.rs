//! Journal locator tests.

use ed_afk_notifier::journal::{find_latest_journal, JournalError};
use tempfile::TempDir;

use super::write_journal;

#[test]
fn test_latest_by_mtime_not_name() {
    let temp_dir = TempDir::new().unwrap();
    // Lexically last but oldest
    write_journal(temp_dir.path(), "Journal.2024-03-09T080000.01.log", &[], 300);
    let newest = write_journal(temp_dir.path(), "Journal.2024-03-01T080000.01.log", &[], 5);
    write_journal(temp_dir.path(), "Journal.2024-03-05T080000.01.log", &[], 100);

    assert_eq!(find_latest_journal(temp_dir.path()).unwrap(), newest);
}

#[test]
fn test_ignores_non_journal_files() {
    let temp_dir = TempDir::new().unwrap();
    let journal = write_journal(temp_dir.path(), "Journal.2024-03-01T080000.01.log", &[], 300);
    write_journal(temp_dir.path(), "Status.json", &[], 1);
    write_journal(temp_dir.path(), "Journal.2024-03-02T080000.01.txt", &[], 1);
    write_journal(temp_dir.path(), "Cargo.json", &[], 1);
    std::fs::create_dir(temp_dir.path().join("Journal.dir.log")).unwrap();

    assert_eq!(find_latest_journal(temp_dir.path()).unwrap(), journal);
}

#[test]
fn test_empty_directory_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = find_latest_journal(temp_dir.path());
    assert!(matches!(result, Err(JournalError::NotFound(_))));
}

#[test]
fn test_missing_directory_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = find_latest_journal(&temp_dir.path().join("missing"));
    let err = result.unwrap_err();
    assert!(err.is_transient());
}
