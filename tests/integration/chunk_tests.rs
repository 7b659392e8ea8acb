//! Chunk export of archives produced by real runs

use crate::common::*;
use gallery_archive::chunk::{default_output_dir, CHUNK_MARKER_FILE};
use gallery_archive::storage::{ArchiveStore, METADATA_FILE};
use gallery_archive::{Chunker, Section};
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;
use wiremock::MockServer;

#[tokio::test]
async fn test_chunks_cover_an_archived_run() {
    let mock_server = MockServer::start().await;
    let gallery: Vec<u32> = (1..=7).collect();
    mount_listing(&mock_server, "gallery", &[&gallery[..4], &gallery[4..]]).await;
    mount_listing(&mock_server, "scraps", &[&[20, 21]]).await;
    mount_listing(&mock_server, "journals", &[&[30]]).await;
    mount_submissions(&mock_server, &gallery).await;
    mount_submissions(&mock_server, &[20, 21]).await;
    mount_journals(&mock_server, &[30]).await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("someone");

    let report = build_run(&mock_server, &root).execute().await.unwrap();
    assert_eq!(report.total_archived(), 10);

    let store = ArchiveStore::open_existing(&root).unwrap();
    let out_dir = default_output_dir(&root, 4);
    let plan = Chunker::new(4).unwrap().export(&store, &out_dir).unwrap();

    let sizes: Vec<usize> = plan.chunks.iter().map(|c| c.items.len()).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(plan.item_count(), 10);

    // Gallery first, then scraps, then journals
    let order: Vec<Section> = plan.items().map(|item| item.section).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);

    // Every archived entry lands in exactly one chunk
    let mut exported = BTreeSet::new();
    for (index, chunk) in plan.chunks.iter().enumerate() {
        let chunk_dir = out_dir.join(format!("{:05}", index + 1));
        assert_eq!(
            fs::read_to_string(chunk_dir.join(CHUNK_MARKER_FILE)).unwrap(),
            format!("{}\n", index)
        );
        for item in &chunk.items {
            let entry = chunk_dir.join(item.section.as_str()).join(&item.id);
            assert!(entry.join(METADATA_FILE).is_file());
            assert!(exported.insert((item.section, item.id.clone())));
        }
    }
    assert_eq!(exported.len(), 10);

    // The archive itself is untouched
    assert_eq!(store.entries(Section::Gallery).unwrap().len(), 7);
    assert!(root.join("journals").join("30").join("media.html").is_file());
}

#[tokio::test]
async fn test_rechunking_replaces_previous_output() {
    let mock_server = MockServer::start().await;
    let gallery: Vec<u32> = (1..=5).collect();
    mount_listing(&mock_server, "gallery", &[&gallery[..]]).await;
    mount_submissions(&mock_server, &gallery).await;
    mount_empty_sections(&mock_server, &["scraps", "journals"]).await;
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("someone");

    build_run(&mock_server, &root).execute().await.unwrap();
    let store = ArchiveStore::open_existing(&root).unwrap();
    let out_dir = tmp.path().join("chunks");

    Chunker::new(1).unwrap().export(&store, &out_dir).unwrap();
    assert!(out_dir.join("00005").is_dir());

    let plan = Chunker::new(3).unwrap().export(&store, &out_dir).unwrap();

    assert_eq!(plan.chunks.len(), 2);
    assert!(out_dir.join("00002").is_dir());
    assert!(!out_dir.join("00003").exists());
    assert!(!out_dir.join("00005").exists());
}
