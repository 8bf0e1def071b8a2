use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Checkpoint, CheckpointStore};
use crate::error::{Result, ThreadlineError};
use crate::types::Message;

const FORMAT_VERSION: u32 = 1;

/// One JSON file per thread under a base directory.
///
/// Saves go to a temporary file that is then renamed over the old snapshot.
///
/// ```no_run
/// use threadline::checkpoint::{CheckpointStore, FileCheckpointStore};
/// use threadline::types::Message;
///
/// # async fn demo() -> threadline::error::Result<()> {
/// let store = FileCheckpointStore::new_default();
/// store.save("thread-1", &[Message::user("hi")]).await?;
/// assert_eq!(store.load("thread-1").await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    base_dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store under `~/.threadline/checkpoints`.
    pub fn new_default() -> Self {
        Self::new(default_checkpoint_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn checkpoint_path(&self, thread_id: &str) -> Result<PathBuf> {
        if thread_id.trim().is_empty() {
            return Err(ThreadlineError::InvalidArgument(
                "thread id must not be empty".into(),
            ));
        }
        Ok(self
            .base_dir
            .join(format!("{}.json", encode_file_stem(thread_id))))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>> {
        let path = self.checkpoint_path(thread_id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ThreadlineError::Checkpoint(format!(
                    "read {}: {err}",
                    path.display()
                )))
            }
        };
        let file: CheckpointFile = serde_json::from_str(&raw).map_err(|e| {
            ThreadlineError::Checkpoint(format!("corrupt checkpoint {}: {e}", path.display()))
        })?;
        if file.checkpoint.thread_id != thread_id {
            return Err(ThreadlineError::Checkpoint(format!(
                "{} belongs to thread '{}'",
                path.display(),
                file.checkpoint.thread_id
            )));
        }
        Ok(file.checkpoint.history)
    }

    async fn save(&self, thread_id: &str, history: &[Message]) -> Result<()> {
        let path = self.checkpoint_path(thread_id)?;
        let file = CheckpointFile {
            version: FORMAT_VERSION,
            checkpoint: Checkpoint::new(thread_id, history.to_vec()),
        };
        let serialized = serde_json::to_vec_pretty(&file)?;

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| checkpoint_io("create", &self.base_dir, e))?;
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &serialized)
            .await
            .map_err(|e| checkpoint_io("write", &tmp, e))?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(checkpoint_io("replace", &path, err));
        }
        debug!(thread_id, messages = history.len(), path = %path.display(), "checkpoint saved");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    version: u32,
    #[serde(flatten)]
    checkpoint: Checkpoint,
}

fn checkpoint_io(action: &str, path: &Path, err: std::io::Error) -> ThreadlineError {
    ThreadlineError::Checkpoint(format!("{action} {}: {err}", path.display()))
}

fn default_checkpoint_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".threadline").join("checkpoints"))
        .unwrap_or_else(|| PathBuf::from(".threadline/checkpoints"))
}

/// Injective file-name encoding: ASCII alphanumerics and `-` pass through,
/// every other byte becomes `_xx`.
fn encode_file_stem(thread_id: &str) -> String {
    let mut out = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "_{byte:02x}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_do_not_collide() {
        assert_eq!(encode_file_stem("chat-42"), "chat-42");
        assert_eq!(encode_file_stem("a/b"), "a_2fb");
        assert_ne!(encode_file_stem("a_b"), encode_file_stem("a.b"));
        assert_eq!(encode_file_stem("../x"), "_2e_2e_2fx");
    }
}
