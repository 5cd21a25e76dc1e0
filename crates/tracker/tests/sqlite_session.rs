use shared::domain::Mode;
use storage::{open_state_store, StateStore};
use tracker::Tracker;

#[tokio::test]
async fn sqlite_backed_session_tracks_modes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        dir.path().join("tracker.db").to_string_lossy().replace('\\', "/")
    );
    let store = open_state_store(&database_url).await.expect("store");
    let tracker = Tracker::new(store.clone());

    assert_eq!(
        tracker.handle("/playboy", 0.0).await.expect("switch"),
        "Switched to playboy mode!"
    );
    tracker.handle("/hacker", 1800.0).await.expect("switch");
    let summary = tracker.handle("/summary", 3600.0).await.expect("summary");

    // hacker = playboy = 1800 → money needs 3600.
    assert_eq!(
        summary,
        "Current Mode: Hacker\n\nMoney => 01:00:00\n\nHacker => 00:00:00\n\nPlayboy => 00:00:00"
    );

    let state = store.load().await.expect("load");
    assert_eq!(state.mode, Some(Mode::Hacker));
    assert_eq!(state.total_time.hacker, 1800.0);
    assert_eq!(state.total_time.playboy, 1800.0);
}
