//! Filesystem slot store.
//!
//! Each slot is a `<key>.json` file in the state directory. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! observes a half-written slot.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{Slot, SlotStore, StorageError};

/// Slot store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }

    fn tmp_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", slot.key()))
    }
}

fn io_error(slot: Slot) -> impl FnOnce(std::io::Error) -> StorageError {
    move |source| StorageError::Io {
        slot: slot.key(),
        source,
    }
}

impl SlotStore for FileStore {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(slot)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 content is corrupt data, not a missing slot
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(io_error(slot)(e)),
        }
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(slot))?;

        let tmp = self.tmp_path(slot);
        let mut file = fs::File::create(&tmp).map_err(io_error(slot))?;
        file.write_all(value.as_bytes()).map_err(io_error(slot))?;
        file.sync_all().map_err(io_error(slot))?;
        drop(file);

        fs::rename(&tmp, self.path(slot)).map_err(io_error(slot))
    }

    fn remove(&self, slot: Slot) -> Result<(), StorageError> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(slot)(e)),
        }
    }
}
