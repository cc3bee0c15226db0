//! Virtual filesystem backing `write`/`append`/`cat` and the pipe-data
//! spool file.
//!
//! Trimmed from the teacher's `fs::types::FileSystem` / `fs::InMemoryFs`
//! down to the handful of operations PUSH's reserved commands and the
//! spool actually need; `spec.md`'s non-goals explicitly exclude full
//! filesystem semantics from the core.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::FsError;

/// Minimal virtual filesystem trait. One implementation (`InMemoryFs`)
/// ships with the crate; callers may substitute their own.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<String, FsError>;
    async fn write_file(&self, path: &str, content: &str) -> Result<(), FsError>;
    async fn append_file(&self, path: &str, content: &str) -> Result<(), FsError>;
    async fn exists(&self, path: &str) -> bool;
}

/// Pure in-memory filesystem, the default backing store.
#[derive(Default)]
pub struct InMemoryFs {
    files: RwLock<HashMap<String, String>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self { files: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound { path: path.to_string(), operation: "read".to_string() })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), FsError> {
        self.files.write().await.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn append_file(&self, path: &str, content: &str) -> Result<(), FsError> {
        let mut files = self.files.write().await;
        files.entry(path.to_string()).or_default().push_str(content);
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.read().await.contains_key(path)
    }
}
