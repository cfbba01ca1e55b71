//! Journal module tests.

mod discovery_test;
mod reconstructor_test;
mod tailer_test;

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Write a journal file and backdate its modification time by `age_secs`.
pub fn write_journal(dir: &Path, name: &str, lines: &[String], age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    std::fs::write(&path, content).expect("Failed to write journal");
    let file = std::fs::File::options()
        .write(true)
        .open(&path)
        .expect("Failed to reopen journal");
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .expect("Failed to set mtime");
    path
}

/// Build one journal line.
pub fn event(timestamp: &str, name: &str, fields: &str) -> String {
    if fields.is_empty() {
        format!(r#"{{"timestamp":"{timestamp}","event":"{name}"}}"#)
    } else {
        format!(r#"{{"timestamp":"{timestamp}","event":"{name}",{fields}}}"#)
    }
}

/// Verify all public journal types are exported from the library.
#[test]
fn test_all_journal_types_exported() {
    use ed_afk_notifier::journal::{
        Baseline, DecodeError, EventKind, JournalError, JournalEvent, LiveTailer, RotationCheck,
        RotationWatcher, StateReconstructor, TailControl,
    };

    let _ = StateReconstructor::new();
    let _ = TailControl::new();
    let _: fn() -> RotationCheck = || RotationCheck::Unchanged;
    let _: fn(PathBuf) -> JournalError = JournalError::NotFound;
    let _: fn(String) -> DecodeError = DecodeError::UnknownKind;
    let _: Option<(Baseline, JournalEvent, EventKind)> = None;
    let _: Option<(LiveTailer, RotationWatcher)> = None;
}
