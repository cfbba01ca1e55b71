//! Live tailer tests.

use std::io::Write;
use std::time::Duration;

use ed_afk_notifier::journal::{decode_line, EventKind, LiveTailer, StateReconstructor};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::{event, write_journal};

/// Lines written between reconstruction and tailing are not lost.
#[tokio::test]
async fn test_tail_resumes_at_reconstruction_offset() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_journal(
        temp_dir.path(),
        "Journal.01.log",
        &[event("2024-03-01T08:00:00Z", "Bounty", r#""TotalReward":10"#)],
        0,
    );

    let baseline = StateReconstructor::reconstruct(&path).await.unwrap();

    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{}", event("2024-03-01T08:01:00Z", "Died", "")).unwrap();
    }

    let mut tailer = LiveTailer::open(&path, baseline.offset, CancellationToken::new())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));

    let line = tokio::time::timeout(Duration::from_secs(5), tailer.next_line())
        .await
        .unwrap()
        .unwrap();
    let decoded = decode_line(&line).unwrap();
    assert_eq!(decoded.kind, EventKind::Died);
}
