use crate::error::{AgenticError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// A flat string-to-string durable namespace. Writes replace the whole value.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// In-process backend. Used for guests and tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AgenticError::Storage("memory backend lock poisoned".to_string()))
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.keys().cloned().collect())
    }
}

/// One JSON file per key under a directory.
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a backend using the default directory (~/.local/share/agentic/store/)
    pub fn new() -> Result<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| AgenticError::Config("Could not determine data directory".to_string()))?;
        Self::with_dir(base.join("agentic").join("store"))
    }

    /// Create a backend rooted at a custom directory (useful for testing)
    pub fn with_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| {
            AgenticError::Storage(format!("Failed to create store directory: {}", e))
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AgenticError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|e| {
            AgenticError::Storage(format!("Failed to write temporary record file: {}", e))
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            AgenticError::Storage(format!("Failed to rename record file: {}", e))
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AgenticError::Storage(format!(
                "Failed to delete record file: {}",
                e
            ))),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| {
            AgenticError::Storage(format!("Failed to read store directory: {}", e))
        })?;

        let mut keys: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let stem = file_name.to_str()?.strip_suffix(".json")?;
                decode_key(stem)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Percent-encode everything that is not safe in a file name.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|key| key.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_encoding_round_trips() {
        for key in ["chat:ada@example.com:analyst", "session:a b/c", "plain"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains('/'));
            assert!(!encoded.contains(':'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
        // Not valid UTF-8 once decoded.
        assert_eq!(decode_key("bad%FF"), None);
        assert_eq!(encode_key("session:ada@example.com"), "session%3Aada%40example.com");
    }

    #[test]
    fn test_file_backend_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::with_dir(dir.path().to_path_buf()).unwrap();

        assert_eq!(backend.get("chat:a@b.c:x").unwrap(), None);
        backend.set("chat:a@b.c:x", "{}").unwrap();
        backend.set("chat:a@b.c:x", "[1]").unwrap();
        assert_eq!(backend.get("chat:a@b.c:x").unwrap().as_deref(), Some("[1]"));
        assert_eq!(backend.keys().unwrap(), vec!["chat:a@b.c:x".to_string()]);

        backend.remove("chat:a@b.c:x").unwrap();
        backend.remove("chat:a@b.c:x").unwrap();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_memory_backend_prefix_filter() {
        let backend = MemoryBackend::new();
        backend.set("chat:a:1", "x").unwrap();
        backend.set("chat:b:1", "y").unwrap();
        backend.set("session:a", "z").unwrap();
        assert_eq!(
            backend.keys_with_prefix("chat:a:").unwrap(),
            vec!["chat:a:1".to_string()]
        );
    }
}
