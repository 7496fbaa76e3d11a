// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! In-memory recording of captured entries and the JSONL capture file.

use crate::entry::Entry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared buffer of every entry recorded so far.
///
/// Clones share the same buffer. Appends and snapshots serialize on one lock,
/// so a snapshot never observes a half-recorded entry.
#[derive(Clone, Debug)]
pub struct Recorder {
    entries: Arc<std::sync::Mutex<Vec<Entry>>>,
    successful_only: bool,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Recorder {
    pub fn new(successful_only: bool) -> Self {
        Self {
            entries: Arc::new(std::sync::Mutex::new(Vec::new())),
            successful_only,
        }
    }

    /// Append `entry`, unless only successful entries are kept and it is not
    /// one. Returns whether the entry was kept.
    pub fn record(&self, entry: Entry) -> bool {
        if self.successful_only && !entry.is_successful() {
            debug!(method = %entry.method, uri = %entry.uri, status = entry.status, "skipping unsuccessful entry");
            return false;
        }
        self.lock().push(entry);
        true
    }

    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<Entry> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the Vec half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Appends one JSON `Entry` per line.
#[derive(Clone)]
pub struct CaptureWriter {
    file: Arc<Mutex<tokio::fs::File>>,
    path: PathBuf,
}

impl CaptureWriter {
    pub async fn new<P: Into<PathBuf>>(path: P) -> anyhow::Result<Self> {
        let path: PathBuf = path.into();
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            file: Arc::new(Mutex::new(f)),
            path,
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub async fn write_entry(&self, entry: &Entry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Load entries from a JSONL capture file.
///
/// Malformed lines are skipped with a warning; a missing file yields no
/// entries.
pub async fn load_captures<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Vec<Entry>> {
    use tokio::io::AsyncBufReadExt;

    let path_ref = path.as_ref();

    if !tokio::fs::try_exists(path_ref).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let file = tokio::fs::File::open(path_ref).await?;
    let reader = tokio::io::BufReader::new(file);
    let mut lines = reader.lines();
    let mut entries = Vec::new();
    let mut line_num = 0;

    while let Some(line) = lines.next_line().await? {
        line_num += 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Entry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "failed to parse captured entry, skipping");
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_entry, make_headers_from_pairs};
    use rstest::rstest;
    use serde_json::Value;
    use tokio::fs;
    use uuid::Uuid;

    #[rstest]
    #[case(true, 200, true)]
    #[case(true, 204, true)]
    #[case(true, 301, false)]
    #[case(true, 404, false)]
    #[case(true, 500, false)]
    #[case(false, 404, true)]
    #[case(false, 500, true)]
    fn record_filters_by_status(
        #[case] successful_only: bool,
        #[case] status: u16,
        #[case] kept: bool,
    ) -> anyhow::Result<()> {
        let recorder = Recorder::new(successful_only);
        assert_eq!(recorder.record(make_entry("GET", "/x", status)?), kept);
        assert_eq!(recorder.len(), usize::from(kept));
        Ok(())
    }

    #[test]
    fn clones_share_the_buffer() -> anyhow::Result<()> {
        let recorder = Recorder::default();
        let handle = recorder.clone();
        handle.record(make_entry("GET", "/a", 200)?);
        handle.record(make_entry("GET", "/b", 200)?);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].path(), "/a");
        assert_eq!(recorder.len(), 2);

        let taken = recorder.take();
        assert_eq!(taken.len(), 2);
        assert!(handle.is_empty());
        Ok(())
    }

    #[test]
    fn concurrent_records_are_all_kept() -> anyhow::Result<()> {
        let recorder = Recorder::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let recorder = recorder.clone();
                std::thread::spawn(move || -> anyhow::Result<()> {
                    for j in 0..25 {
                        recorder.record(make_entry("GET", &format!("/t{}/{}", i, j), 200)?);
                    }
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("recording thread panicked")?;
        }
        assert_eq!(recorder.len(), 200);
        Ok(())
    }

    #[tokio::test]
    async fn write_entry_writes_jsonl() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_capture_test_{}.jsonl", Uuid::new_v4()));
        let cw = CaptureWriter::new(&tmp).await?;

        let entry = make_entry("GET", "http://example/?q=1", 200)?
            .with_request_headers(make_headers_from_pairs(&[("x-test", "1"), ("x-test", "2")])?)
            .with_response_body("ok");
        cw.write_entry(&entry).await?;

        let s = fs::read_to_string(&tmp).await?;
        let v: Value = serde_json::from_str(s.trim())?;
        assert_eq!(v["method"], "GET");
        assert_eq!(v["uri"], "http://example/?q=1");
        assert_eq!(v["status"], 200);
        assert_eq!(v["request_headers"]["x-test"], serde_json::json!(["1", "2"]));
        assert_eq!(v["response_body"], "b2s=");

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn load_captures_reads_back_written_entries() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_load_test_{}.jsonl", Uuid::new_v4()));
        let cw = CaptureWriter::new(&tmp).await?;

        let first = make_entry("POST", "http://example/items", 201)?
            .with_request_headers(make_headers_from_pairs(&[("content-type", "application/json")])?)
            .with_request_body(r#"{"name":"a"}"#)
            .with_response_headers(make_headers_from_pairs(&[("location", "/items/1")])?);
        let second = make_entry("GET", "http://example/items/1", 200)?;
        cw.write_entry(&first).await?;
        cw.write_entry(&second).await?;

        let entries = load_captures(cw.path()).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first.id);
        assert_eq!(entries[0].request_body, first.request_body);
        assert_eq!(entries[0].request_headers, first.request_headers);
        assert_eq!(entries[0].response_headers, first.response_headers);
        assert_eq!(entries[1].uri, second.uri);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn load_captures_skips_malformed_lines() -> anyhow::Result<()> {
        let tmp =
            std::env::temp_dir().join(format!("doc_malformed_test_{}.jsonl", Uuid::new_v4()));

        let content = r#"{"id":"00000000-0000-0000-0000-000000000001","timestamp":"2024-01-01T00:00:00Z","method":"GET","uri":"http://example/","status":200}
invalid json line
{"id":"00000000-0000-0000-0000-000000000002","timestamp":"2024-01-01T00:00:01Z","method":"POST","uri":"http://example/post","status":201,"request_body":"not base64!"}
{"id":"00000000-0000-0000-0000-000000000003","timestamp":"2024-01-01T00:00:02Z","method":"POST","uri":"http://example/post","status":201,"request_body":"aGk="}
"#;
        fs::write(&tmp, content).await?;

        let entries = load_captures(&tmp).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].method, "GET");
        assert!(entries[0].request_headers.is_empty());
        assert_eq!(entries[1].request_body.as_ref(), b"hi");

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn load_captures_nonexistent_file_returns_empty() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_nonexistent_{}.jsonl", Uuid::new_v4()));
        assert!(load_captures(&tmp).await?.is_empty());
        Ok(())
    }
}
