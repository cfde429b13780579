//! S3 blob store tests against MinIO.
//!
//! Run with: `cargo test -p hoard-tests --test s3_tests --features integration`

#![cfg(feature = "integration")]

use hoard_cache::SnapshotStore;
use hoard_core::ports::{BlobStore, PutCondition};
use hoard_core::{ArtifactRef, ContentKey, Error};
use hoard_tests::{TestContext, test_client};
use std::sync::Arc;
use std::time::Duration;

fn key(byte: u8) -> ContentKey {
    ContentKey::from_digest(&[byte; 32])
}

#[tokio::test]
async fn test_missing_object() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    assert!(ctx.blobs.get("absent.json").await.unwrap().is_none());
    assert!(!ctx.blobs.exists("absent.json").await.unwrap());
}

#[tokio::test]
async fn test_conditional_writes() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    let v1 = ctx
        .blobs
        .put_bytes("doc.json", b"{}".to_vec(), PutCondition::IfAbsent)
        .await
        .unwrap();

    let err = ctx
        .blobs
        .put_bytes("doc.json", b"{}".to_vec(), PutCondition::IfAbsent)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    let v2 = ctx
        .blobs
        .put_bytes("doc.json", b"{\"a\":1}".to_vec(), PutCondition::IfMatch(v1.clone()))
        .await
        .unwrap();
    assert_ne!(v1, v2);

    let err = ctx
        .blobs
        .put_bytes("doc.json", b"{}".to_vec(), PutCondition::IfMatch(v1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    let current = ctx.blobs.get("doc.json").await.unwrap().unwrap();
    assert_eq!(current.data, b"{\"a\":1}");
    assert_eq!(current.version, v2);
}

#[tokio::test]
async fn test_presigned_download() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt.gz");
    tokio::fs::write(&path, b"archived bytes").await.unwrap();

    ctx.blobs
        .put_file("report.txt.gz", &path, PutCondition::IfAbsent)
        .await
        .unwrap();
    let link = ctx
        .blobs
        .signed_download_url("report.txt.gz", Duration::from_secs(60), Some("report.txt.gz"))
        .await
        .unwrap();

    let resp = test_client().unwrap().get(&link).send().await.unwrap();
    assert!(resp.status().is_success());
    let disposition = resp
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("report.txt.gz"));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"archived bytes");
}

#[tokio::test]
async fn test_concurrent_snapshot_commits_keep_every_entry() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let blobs: Arc<dyn BlobStore> = ctx.blobs.clone();
    let store = SnapshotStore::new(blobs).with_max_commit_attempts(20);

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let artifact = ArtifactRef::new(format!("file-{}", i)).unwrap();
            store.commit(&key(i), &artifact).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = store.load().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 8);
    for i in 0..8u8 {
        assert_eq!(snapshot.get(&key(i)).unwrap().as_str(), format!("file-{}", i));
    }
}
