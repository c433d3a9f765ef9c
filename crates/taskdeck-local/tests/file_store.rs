use std::sync::Arc;
use taskdeck_local::{ActivityLog, FileStore, LocalStore, Theme, ThemePreference};
use taskdeck_model::TaskId;

#[test]
fn activity_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let task = TaskId::new("t1");

    {
        let log = ActivityLog::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        log.append(&task, "Investigated the flaky login").unwrap();
        log.append(&task, "Pinged design").unwrap();
    }

    let log = ActivityLog::new(Arc::new(FileStore::open(dir.path()).unwrap()));
    let entries = log.load(&task);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "Pinged design");
}

#[test]
fn theme_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    ThemePreference::new(Arc::new(FileStore::open(dir.path()).unwrap()))
        .save(Theme::Dark)
        .unwrap();

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(ThemePreference::new(store).load(), Theme::Dark);
}

#[test]
fn corrupt_file_reads_as_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let task = TaskId::new("t9");
    std::fs::write(store.path_for("task-activity:t9"), "][").unwrap();

    assert!(ActivityLog::new(store).load(&task).is_empty());
}
