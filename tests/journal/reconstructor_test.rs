//! State reconstruction tests over realistic journals.

use ed_afk_notifier::journal::StateReconstructor;
use tempfile::TempDir;

use super::{event, write_journal};

#[tokio::test]
async fn test_session_with_snapshot_and_bounties() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        event("2024-03-01T08:00:00Z", "Fileheader", r#""part":1,"gameversion":"4.0""#),
        event("2024-03-01T08:00:05Z", "LoadGame", r#""Commander":"Jameson""#),
        event(
            "2024-03-01T08:00:06Z",
            "Missions",
            r#""Active":[{"MissionID":11,"Name":"Mission_MassacreWing","Expires":7200},{"MissionID":12,"Name":"Mission_MassacreWing","Expires":7200},{"MissionID":13,"Name":"Mission_Courier","Expires":0}],"Failed":[],"Complete":[]"#,
        ),
        event("2024-03-01T08:10:00Z", "Bounty", r#""TotalReward":120000,"VictimFaction":"Pirates""#),
        event("2024-03-01T08:12:00Z", "MissionRedirected", r#""MissionID":11"#),
        event("2024-03-01T08:13:00Z", "Bounty", r#""TotalReward":80000"#),
        event("2024-03-01T08:20:00Z", "MissionCompleted", r#""MissionID":11,"Reward":5000000"#),
        event("2024-03-01T08:20:01Z", "MissionCompleted", r#""MissionID":11,"Reward":5000000"#),
        "garbage line".to_string(),
    ];
    let path = write_journal(temp_dir.path(), "Journal.2024-03-01T080000.01.log", &lines, 0);

    let baseline = StateReconstructor::reconstruct(&path).await.unwrap();
    let state = baseline.state;
    assert_eq!(state.active_missions, 1);
    assert_eq!(state.killed_pirates, 2);
    assert_eq!(state.total_pirate_reward, 200_000);
    // 11 was already resolved by the redirect, so neither completion pays out
    assert_eq!(state.total_mission_reward, 0);
    assert!(state.is_resolved(11));
    assert!(state.logged_missions.contains_key(&12));
}

#[tokio::test]
async fn test_duplicate_completion_counted_once() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        event("2024-03-01T08:00:00Z", "MissionAccepted", r#""MissionID":5"#),
        event("2024-03-01T08:00:10Z", "MissionAccepted", r#""MissionID":6"#),
        event("2024-03-01T08:30:00Z", "MissionCompleted", r#""MissionID":5,"Reward":1000"#),
        event("2024-03-01T08:30:00Z", "MissionCompleted", r#""MissionID":5,"Reward":1000"#),
        event("2024-03-01T08:31:00Z", "MissionRedirected", r#""MissionID":5"#),
    ];
    let path = write_journal(temp_dir.path(), "Journal.01.log", &lines, 0);

    let state = StateReconstructor::reconstruct(&path).await.unwrap().state;
    assert_eq!(state.active_missions, 1);
    assert_eq!(state.total_mission_reward, 1000);
    assert!(!state.logged_missions.contains_key(&5));
    assert_eq!(state.logged_missions.get(&6), Some(&false));
}

#[tokio::test]
async fn test_reconstruction_is_repeatable() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        event("2024-03-01T08:00:00Z", "MissionAccepted", r#""MissionID":1"#),
        event("2024-03-01T08:01:00Z", "MissionAccepted", r#""MissionID":2"#),
        event("2024-03-01T08:02:00Z", "MissionAbandoned", r#""MissionID":2"#),
        event("2024-03-01T08:03:00Z", "Bounty", r#""TotalReward":10"#),
    ];
    let path = write_journal(temp_dir.path(), "Journal.01.log", &lines, 0);

    let first = StateReconstructor::reconstruct(&path).await.unwrap();
    let second = StateReconstructor::reconstruct(&path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.state.active_missions, 1);
}

#[tokio::test]
async fn test_empty_journal() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_journal(temp_dir.path(), "Journal.01.log", &[], 0);

    let baseline = StateReconstructor::reconstruct(&path).await.unwrap();
    assert_eq!(baseline.offset, 0);
    assert_eq!(baseline.state.killed_pirates, 0);
}
