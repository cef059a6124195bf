// Per-host output persistence

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where per-host command output ends up, injectable for tests
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Persist one host's output; returns where it landed
    async fn save(&self, host: &str, output: &[u8]) -> Result<PathBuf, StoreError>;
}

/// Writes one log file per host under a target directory
pub struct FileStore {
    dir: PathBuf,
    seq: AtomicUsize,
}

impl FileStore {
    /// `dir` defaults to the system temp directory
    pub fn new(dir: Option<PathBuf>) -> Self {
        FileStore {
            dir: dir.unwrap_or_else(std::env::temp_dir),
            seq: AtomicUsize::new(0),
        }
    }

    /// The timestamp keeps reruns apart; the sequence keeps same-host
    /// saves within one run apart
    fn file_name(&self, host: &str) -> String {
        let safe: String = host
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        format!(
            "volley-{}-{}-{:03}.log",
            safe,
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            self.seq.fetch_add(1, Ordering::Relaxed)
        )
    }
}

#[async_trait]
impl OutputStore for FileStore {
    async fn save(&self, host: &str, output: &[u8]) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(self.file_name(host));
        tokio::fs::write(&path, output).await?;

        Ok(path)
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, host: &str) -> Option<Vec<u8>> {
        self.saved.lock().get(host).cloned()
    }

    pub fn len(&self) -> usize {
        self.saved.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.lock().is_empty()
    }
}

#[async_trait]
impl OutputStore for MemoryStore {
    async fn save(&self, host: &str, output: &[u8]) -> Result<PathBuf, StoreError> {
        self.saved.lock().insert(host.to_string(), output.to_vec());
        Ok(PathBuf::from(format!("memory://{}", host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_writes_host_output() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(Some(dir.path().to_path_buf()));

        let path = store.save("web-01.example.com", b"web-01\n").await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("volley-web-01.example.com-"));
        assert!(name.ends_with(".log"));

        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"web-01\n");
    }

    #[tokio::test]
    async fn test_file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs/today");
        let store = FileStore::new(Some(nested.clone()));

        store.save("db-01", b"ok").await.unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn test_file_name_sanitizes_strange_hosts() {
        let store = FileStore::new(None);
        let name = store.file_name("a/b@c");
        assert!(name.starts_with("volley-a_b_c-"));
        assert!(!name.contains('/'));
    }

    #[tokio::test]
    async fn test_file_store_keeps_duplicate_hosts_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(Some(dir.path().to_path_buf()));

        let first = store.save("web-01", b"first\n").await.unwrap();
        let second = store.save("web-01", b"second\n").await.unwrap();

        // Same host, same second: the sequence still separates them
        assert_ne!(first, second);
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"first\n");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"second\n");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.save("web-01", b"hello").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.contents("web-01").as_deref(), Some(&b"hello"[..]));
        assert_eq!(store.contents("web-02"), None);
    }
}
