//! Journal path discovery utilities.
//!
//! Provides functions to locate Elite Dangerous journal files on disk.

use std::path::{Path, PathBuf};

use super::error::JournalError;

/// Prefix shared by every journal file name.
pub const JOURNAL_PREFIX: &str = "Journal";

/// Suffix shared by every journal file name.
pub const JOURNAL_SUFFIX: &str = ".log";

/// Check whether a file name follows the journal rotation convention.
///
/// # Examples
///
/// ```
/// use ed_afk_notifier::journal::is_journal_file_name;
///
/// assert!(is_journal_file_name("Journal.2024-03-01T100000.01.log"));
/// assert!(!is_journal_file_name("Status.json"));
/// assert!(!is_journal_file_name("JournalArchive.zip"));
/// ```
#[must_use]
pub fn is_journal_file_name(name: &str) -> bool {
    name.starts_with(JOURNAL_PREFIX) && name.ends_with(JOURNAL_SUFFIX)
}

/// Default journal directory used by the game client.
///
/// Resolves to `<home>/Saved Games/Frontier Developments/Elite Dangerous`.
/// Returns `None` if the home directory cannot be determined.
#[must_use]
pub fn default_journal_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(
        home.join("Saved Games")
            .join("Frontier Developments")
            .join("Elite Dangerous"),
    )
}

/// Find the most recently modified journal in a directory.
///
/// Scans `dir` non-recursively for regular files, or symlinks to them, whose
/// name matches [`is_journal_file_name`] and returns the one with the latest
/// modification time. Ties are broken by file name, which embeds the session start time.
///
/// # Errors
///
/// Returns [`JournalError::NotFound`] if the directory cannot be read or
/// contains no matching file.
pub fn find_latest_journal(dir: &Path) -> Result<PathBuf, JournalError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Cannot read journal directory");
            return Err(JournalError::NotFound(dir.to_path_buf()));
        }
    };

    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(is_journal_file_name)
        })
        .filter_map(|entry| {
            // Follows symlinks, unlike `DirEntry::metadata`
            let metadata = std::fs::metadata(entry.path()).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "Cannot get modification time");
                    return None;
                }
            };
            Some((modified, entry.file_name(), entry.path()))
        })
        .max_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)))
        .map(|(_, _, path)| path)
        .ok_or_else(|| JournalError::NotFound(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write_with_mtime(path: &Path, content: &str, age: Duration) {
        std::fs::write(path, content).unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_is_journal_file_name() {
        assert!(is_journal_file_name("Journal.210101120000.01.log"));
        assert!(is_journal_file_name("Journal.log"));
        assert!(!is_journal_file_name("journal.01.log"));
        assert!(!is_journal_file_name("Journal.01.txt"));
        assert!(!is_journal_file_name("Cargo.json"));
        assert!(!is_journal_file_name(""));
    }

    #[test]
    fn test_find_latest_journal_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_latest_journal(temp_dir.path());
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_find_latest_journal_missing_dir() {
        let result = find_latest_journal(Path::new("/nonexistent/journal/dir-12345"));
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_find_latest_journal_no_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("Status.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("Market.json"), "{}").unwrap();

        let result = find_latest_journal(temp_dir.path());
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_find_latest_journal_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("Journal.backup.log")).unwrap();

        let result = find_latest_journal(temp_dir.path());
        assert!(matches!(result, Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_find_latest_journal_picks_newest() {
        let temp_dir = TempDir::new().unwrap();

        let old_path = temp_dir.path().join("Journal.2024-03-01T100000.01.log");
        write_with_mtime(&old_path, "{}\n", Duration::from_secs(3600));

        let new_path = temp_dir.path().join("Journal.2024-02-01T100000.01.log");
        write_with_mtime(&new_path, "{}\n", Duration::from_secs(60));

        // Newer status file must not win over journals
        write_with_mtime(
            &temp_dir.path().join("Status.json"),
            "{}",
            Duration::from_secs(0),
        );

        let result = find_latest_journal(temp_dir.path()).unwrap();
        assert_eq!(result, new_path);
    }

    #[test]
    fn test_find_latest_journal_tie_breaks_on_name() {
        let temp_dir = TempDir::new().unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(120);

        let first = temp_dir.path().join("Journal.2024-03-01T100000.01.log");
        let second = temp_dir.path().join("Journal.2024-03-01T100000.02.log");
        for path in [&first, &second] {
            std::fs::write(path, "").unwrap();
            let file = std::fs::File::options().write(true).open(path).unwrap();
            file.set_modified(mtime).unwrap();
        }

        let result = find_latest_journal(temp_dir.path()).unwrap();
        assert_eq!(result, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_latest_journal_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        write_with_mtime(
            &temp_dir.path().join("Journal.01.log"),
            "{}",
            Duration::from_secs(60),
        );
        let target = elsewhere.path().join("session.log");
        write_with_mtime(&target, "{}", Duration::ZERO);
        let link = temp_dir.path().join("Journal.02.log");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(find_latest_journal(temp_dir.path()).unwrap(), link);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_latest_journal_skips_dangling_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let journal = temp_dir.path().join("Journal.01.log");
        write_with_mtime(&journal, "{}", Duration::from_secs(60));
        std::os::unix::fs::symlink(
            temp_dir.path().join("gone.log"),
            temp_dir.path().join("Journal.02.log"),
        )
        .unwrap();

        assert_eq!(find_latest_journal(temp_dir.path()).unwrap(), journal);
    }

    #[test]
    fn test_default_journal_dir_layout() {
        if let Some(dir) = default_journal_dir() {
            assert!(dir.ends_with("Saved Games/Frontier Developments/Elite Dangerous"));
        }
    }
}
