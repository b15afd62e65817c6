//! Integration tests for the action queue.

mod common;

use common::{make_ingestor, seeded_library, slot, test_config};
use showkeeper::models::action::Action;
use showkeeper::models::episode::FileStatus;

#[tokio::test]
async fn approval_is_one_shot() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, show) = seeded_library(&config).await;
    let (_ingestor, queue) = make_ingestor(library.clone(), &config);

    let source = dir.path().join("incoming/a.mkv");
    std::fs::write(&source, vec![0u8; 2048]).unwrap();
    let action = Action::place(
        source,
        show.folder.join("Season 01/a.mkv"),
        slot(&show, 1, 1),
    );
    let id = queue.propose(action).await;

    queue.approve(&id).await.unwrap();
    assert!(queue.approve(&id).await.is_err());
}

#[tokio::test]
async fn rejection_leaves_file_in_place() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, show) = seeded_library(&config).await;
    let (_ingestor, queue) = make_ingestor(library.clone(), &config);

    let source = dir.path().join("incoming/b.mkv");
    std::fs::write(&source, vec![0u8; 2048]).unwrap();
    let action = Action::place(
        source.clone(),
        show.folder.join("Season 01/b.mkv"),
        slot(&show, 1, 2),
    );
    let id = queue.propose(action).await;

    queue.reject(&id).await.unwrap();
    assert!(source.exists());
    assert!(queue.pending().await.is_empty());

    let episode = library.get_episode(&slot(&show, 1, 2)).await.unwrap();
    assert_eq!(episode.status, FileStatus::Missing);
}

#[tokio::test]
async fn approve_all_counts_failures_without_blocking() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, show) = seeded_library(&config).await;
    let (_ingestor, queue) = make_ingestor(library.clone(), &config);

    for number in [1u16, 2] {
        let source = dir.path().join(format!("incoming/e{}.mkv", number));
        std::fs::write(&source, vec![0u8; 2048]).unwrap();
        queue
            .propose(Action::place(
                source,
                show.folder.join(format!("Season 01/e{}.mkv", number)),
                slot(&show, 1, number),
            ))
            .await;
    }
    // Source never existed; this one fails.
    queue
        .propose(Action::place(
            dir.path().join("incoming/ghost.mkv"),
            show.folder.join("Season 01/e3.mkv"),
            slot(&show, 1, 3),
        ))
        .await;

    let result = queue.approve_all().await;
    assert_eq!(result.success, 2);
    assert_eq!(result.failed, 1);
    assert!(queue.pending().await.is_empty());

    // Exactly the successful placements updated episode state.
    for number in [1u16, 2] {
        let episode = library.get_episode(&slot(&show, 1, number)).await.unwrap();
        assert_eq!(episode.status, FileStatus::Renamed);
    }
    let untouched = library.get_episode(&slot(&show, 1, 3)).await.unwrap();
    assert_eq!(untouched.status, FileStatus::Missing);
    assert_eq!(untouched.file_path, None);
}
