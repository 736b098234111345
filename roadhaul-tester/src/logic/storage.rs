use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use roadhaul_game::{GameStorage, StorageError};

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.contains("..");
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl GameStorage for FileStorage {
    type Error = StorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)?) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
