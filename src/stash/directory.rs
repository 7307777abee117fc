use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Stash, StashError};

const EXT: &str = "json";

/// Distinguishes temporary files of concurrent dumps within a process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per key under a directory. The directory is created by the
/// first `dump`; a key without a file loads as `None`.
pub struct DirectoryStash<V> {
    path: PathBuf,
    _item: PhantomData<fn() -> V>,
}

impl<V> DirectoryStash<V> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _item: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StashError> {
        let bad = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.chars().any(char::is_control);
        if bad {
            return Err(StashError::InvalidKey(key.to_string()));
        }
        Ok(self.path.join(format!("{key}.{EXT}")))
    }
}

fn write_json<V: Serialize>(path: &Path, key: &str, value: &V) -> Result<(), StashError> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value).map_err(|e| StashError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}

impl<V> Stash for DirectoryStash<V>
where
    V: Serialize + DeserializeOwned,
{
    type Item = V;

    fn load(&self, key: &str) -> Result<Option<V>, StashError> {
        let path = self.key_path(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let reader = BufReader::new(fs::File::open(&path)?);
        let item = serde_json::from_reader(reader).map_err(|e| StashError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        tracing::trace!(key, path = %path.display(), "Loaded cached item");
        Ok(Some(item))
    }

    fn keys(&self) -> Result<Vec<String>, StashError> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> Result<bool, StashError> {
        Ok(self.key_path(key)?.is_file())
    }

    /// Write to a temporary file first and rename it in place so concurrent
    /// readers never see a partial item.
    fn dump(&self, key: &str, value: &V) -> Result<(), StashError> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.path)?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.path.join(format!(".{key}.{}.{seq}.tmp", std::process::id()));
        let written = write_json(&tmp, key, value).and_then(|()| Ok(fs::rename(&tmp, &path)?));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        tracing::trace!(key, path = %path.display(), "Cached item");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StashError> {
        let path = self.key_path(key)?;
        if path.is_file() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StashError> {
        if self.path.is_dir() {
            tracing::info!(path = %self.path.display(), "Clearing cache directory");
            fs::remove_dir_all(&self.path)?;
        }
        Ok(())
    }
}
