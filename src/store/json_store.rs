use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use super::PersistenceError;

/// A JSON file holding one plain list of records.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole list. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<T>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replaces the file contents with `items`.
    ///
    /// Writes to a sibling temp file first so an interrupted flush leaves the
    /// previous list intact.
    pub fn flush(&self, items: &[T]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_path;

    #[test]
    fn missing_file_loads_empty() {
        let store = JsonStore::<String>::new(temp_path("missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn flush_then_load() {
        let store = JsonStore::<String>::new(temp_path("strings"));
        store.flush(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(store.load().unwrap(), vec!["a".to_string(), "b".to_string()]);
        store.flush(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{ not a list").unwrap();
        let store = JsonStore::<String>::new(path);
        assert!(matches!(store.load(), Err(PersistenceError::Json(_))));
    }
}
