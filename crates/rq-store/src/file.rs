//! Whole-document JSON load/save shared by both stores.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{StoreError, StoreResult};

/// Read `path`, or `T::default()` when the file does not exist.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| StoreError::Json { path: path.to_owned(), source })
}

/// Replace the contents of `path` with `value`.
pub(crate) fn save<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)
        .map_err(|source| StoreError::Json { path: path.to_owned(), source })?;
    writer.flush()?;
    Ok(())
}
