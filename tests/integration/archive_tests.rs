//! End-to-end archive runs against a mock gallery site

use crate::common::*;
use gallery_archive::crawler::SectionOutcome;
use gallery_archive::output::load_statistics;
use gallery_archive::storage::{ArchiveStore, MediaPayload, PendingItem, RunStatus};
use gallery_archive::{ArchiveError, ItemStore, Section};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn count_with_prefix(paths: &[String], prefix: &str) -> usize {
    paths.iter().filter(|p| p.starts_with(prefix)).count()
}

/// Gallery over two pages, one scrap and two journals
async fn mount_small_artist(server: &MockServer) {
    mount_listing(server, "gallery", &[&[3, 2], &[1]]).await;
    mount_listing(server, "scraps", &[&[4]]).await;
    mount_listing(server, "journals", &[&[8, 7]]).await;

    mount_page(server, "/view/1/", 200, submission_page(1, true)).await;
    Mock::given(method("GET"))
        .and(path("/media/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("png 1"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thumbs/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("jpg 1"))
        .mount(server)
        .await;

    mount_submissions(server, &[2, 3, 4]).await;
    mount_journals(server, &[7, 8]).await;
}

#[tokio::test]
async fn test_archives_all_sections() {
    let mock_server = MockServer::start().await;
    mount_small_artist(&mock_server).await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("someone");

    let report = build_run(&mock_server, &root).execute().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.status(), RunStatus::Completed);
    assert_eq!(report.total_archived(), 6);
    assert_eq!(report.total_failures(), 0);

    let gallery = &report.sections[0];
    assert_eq!(gallery.section, Section::Gallery);
    assert_eq!(gallery.pages_fetched, 2);
    assert_eq!(gallery.archived, 3);

    let entry = root.join("gallery").join("1");
    assert_eq!(fs::read(entry.join("media.png")).unwrap(), b"png 1");
    assert_eq!(fs::read(entry.join("thumbnail.jpg")).unwrap(), b"jpg 1");

    let store = ArchiveStore::open_existing(&root).unwrap();
    let mut gallery_items = store.entries(Section::Gallery).unwrap();
    gallery_items.sort_by(|a, b| a.id.cmp(&b.id));
    let first = &gallery_items[0];
    assert_eq!(first.title, "Submission 1");
    assert!(first.tags.contains("fox"));
    assert_eq!(first.posted_at.to_rfc3339(), "2022-03-04T10:15:00+00:00");
    assert_eq!(
        first.media_url.as_deref(),
        Some(format!("{}/media/1.png", mock_server.uri()).as_str())
    );
    assert!(first.files.thumbnail.is_some());
    assert!(gallery_items[1].files.thumbnail.is_none());

    assert!(root.join("scraps").join("4").join("media.png").is_file());

    let journal = fs::read_to_string(root.join("journals").join("7").join("media.html")).unwrap();
    assert!(journal.contains("Text of journal 7"));
}

#[tokio::test]
async fn test_second_run_fetches_no_items() {
    let mock_server = MockServer::start().await;
    mount_small_artist(&mock_server).await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("someone");

    build_run(&mock_server, &root).execute().await.unwrap();
    let before: Vec<_> = Section::ALL
        .iter()
        .map(|s| snapshot(&root.join(s.as_str())))
        .collect();
    let first_requests = request_paths(&mock_server).await.len();

    let report = build_run(&mock_server, &root).execute().await.unwrap();

    let second_requests: Vec<String> = request_paths(&mock_server)
        .await
        .into_iter()
        .skip(first_requests)
        .collect();
    assert_eq!(count_with_prefix(&second_requests, "/view/"), 0);
    assert_eq!(count_with_prefix(&second_requests, "/journal/"), 0);
    assert_eq!(count_with_prefix(&second_requests, "/media/"), 0);
    assert_eq!(count_with_prefix(&second_requests, "/thumbs/"), 0);

    assert!(report.is_complete());
    assert_eq!(report.total_archived(), 0);
    assert_eq!(report.sections[0].already_archived, 3);

    let after: Vec<_> = Section::ALL
        .iter()
        .map(|s| snapshot(&root.join(s.as_str())))
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_resumes_after_partial_run() {
    let mock_server = MockServer::start().await;
    mount_small_artist(&mock_server).await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("someone");

    // An earlier run that stopped after two gallery items
    {
        let mut store = ArchiveStore::open(&root).unwrap();
        for id in ["3", "2"] {
            store
                .put(PendingItem {
                    section: Section::Gallery,
                    id: id.to_string(),
                    title: format!("Submission {}", id),
                    description: String::new(),
                    tags: Default::default(),
                    posted_at: chrono::Utc::now(),
                    media_url: None,
                    thumbnail_url: None,
                    archived_at: chrono::Utc::now(),
                    media: MediaPayload {
                        extension: "png".to_string(),
                        bytes: b"earlier".to_vec(),
                    },
                    thumbnail: None,
                })
                .unwrap();
        }
    }

    let report = build_run(&mock_server, &root).execute().await.unwrap();

    let paths = request_paths(&mock_server).await;
    assert_eq!(count_with_prefix(&paths, "/view/3/"), 0);
    assert_eq!(count_with_prefix(&paths, "/view/2/"), 0);
    assert_eq!(count_with_prefix(&paths, "/view/1/"), 1);
    assert_eq!(report.sections[0].archived, 1);
    assert_eq!(report.sections[0].already_archived, 2);
    assert_eq!(
        fs::read(root.join("gallery").join("3").join("media.png")).unwrap(),
        b"earlier"
    );
}

#[tokio::test]
async fn test_walk_ends_on_empty_page() {
    let mock_server = MockServer::start().await;
    // Every non-empty page offers "Next"; the walk ends at the empty page 4
    for (page, ids) in [(1, vec![1, 2]), (2, vec![3, 4]), (3, vec![5])] {
        mount_page(
            &mock_server,
            &format!("/gallery/{}/{}/", ARTIST, page),
            200,
            gallery_listing(&ids, true),
        )
        .await;
    }
    mount_page(
        &mock_server,
        &format!("/gallery/{}/4/", ARTIST),
        200,
        gallery_listing(&[], true),
    )
    .await;
    mount_submissions(&mock_server, &[1, 2, 3, 4, 5]).await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();

    let report = build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    let paths = request_paths(&mock_server).await;
    assert_eq!(count_with_prefix(&paths, "/gallery/"), 4);
    assert_eq!(count_with_prefix(&paths, "/gallery/someone/5/"), 0);
    assert_eq!(report.sections[0].pages_fetched, 4);
    assert_eq!(report.sections[0].archived, 5);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_walk_ends_on_repeated_page() {
    let mock_server = MockServer::start().await;
    // Past the end the site keeps serving the final page with a "Next" button
    mount_page(
        &mock_server,
        &format!("/gallery/{}/1/", ARTIST),
        200,
        gallery_listing(&[2, 1], true),
    )
    .await;
    mount_page(
        &mock_server,
        &format!("/gallery/{}/2/", ARTIST),
        200,
        gallery_listing(&[2, 1], true),
    )
    .await;
    mount_submissions(&mock_server, &[1, 2]).await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();

    let report = build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.sections[0].pages_fetched, 2);
    assert_eq!(report.sections[0].archived, 2);
}

#[tokio::test]
async fn test_unparsable_item_is_isolated() {
    let mock_server = MockServer::start().await;
    let ids: Vec<u32> = (1..=10).collect();
    mount_listing(&mock_server, "gallery", &[&ids[..]]).await;
    let good: Vec<u32> = ids.iter().copied().filter(|id| *id != 6).collect();
    mount_submissions(&mock_server, &good).await;
    mount_page(
        &mock_server,
        "/view/6/",
        200,
        "<html><body><p>This submission has been removed.</p></body></html>".to_string(),
    )
    .await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();

    let report = build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    let gallery = &report.sections[0];
    assert_eq!(gallery.outcome, SectionOutcome::Exhausted);
    assert_eq!(gallery.archived, 9);
    assert_eq!(gallery.failures.len(), 1);
    assert_eq!(gallery.failures[0].id, "6");
    assert_eq!(gallery.failures[0].error.kind(), "parse");
    assert!(!tmp.path().join("gallery").join("6").exists());

    let stats = load_statistics(tmp.path()).unwrap();
    assert_eq!(stats.entries_by_section[&Section::Gallery], 9);
    assert_eq!(stats.recent_runs[0].item_failures, 1);
    assert_eq!(stats.recent_runs[0].run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_forbidden_section_aborts_only_that_section() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, "gallery", &[&[1]]).await;
    mount_page(
        &mock_server,
        &format!("/scraps/{}/1/", ARTIST),
        403,
        String::new(),
    )
    .await;
    mount_listing(&mock_server, "journals", &[&[5]]).await;
    mount_submissions(&mock_server, &[1]).await;
    mount_journals(&mock_server, &[5]).await;
    let tmp = TempDir::new().unwrap();

    let report = build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.status(), RunStatus::Partial);
    assert_eq!(report.failed_sections(), vec![Section::Scraps]);
    assert!(matches!(
        report.sections[1].outcome,
        SectionOutcome::Aborted { .. }
    ));
    assert_eq!(report.sections[0].archived, 1);
    assert_eq!(report.sections[2].archived, 1);

    // Permanent failures are not retried
    let paths = request_paths(&mock_server).await;
    assert_eq!(count_with_prefix(&paths, "/scraps/"), 1);

    let stats = load_statistics(tmp.path()).unwrap();
    assert_eq!(stats.recent_runs[0].run.status, RunStatus::Partial);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, "gallery", &[&[1]]).await;
    mount_submissions(&mock_server, &[1]).await;
    Mock::given(method("GET"))
        .and(path("/view/1/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();

    let report = build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    let paths = request_paths(&mock_server).await;
    assert_eq!(count_with_prefix(&paths, "/view/1/"), 2);
    assert_eq!(report.sections[0].archived, 1);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_root_is_bound_to_one_artist() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, "gallery", &[&[]]).await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();

    build_run(&mock_server, tmp.path())
        .execute()
        .await
        .unwrap();

    let result = build_run_for(&mock_server, tmp.path(), "somebody-else")
        .execute()
        .await;
    assert!(matches!(
        result,
        Err(ArchiveError::ArtistMismatch { .. })
    ));

    // Artist names are case-insensitive on the site
    build_run_for(&mock_server, tmp.path(), "SomeOne")
        .execute()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unusable_root_is_a_setup_error() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("not-a-directory");
    fs::write(&root, "plain file").unwrap();

    let result = build_run(&mock_server, &root).execute().await;

    assert!(matches!(result, Err(ArchiveError::Io(_))));
    assert!(request_paths(&mock_server).await.is_empty());
}
