//! Directory snapshots on disk.
//!
//! Teachers, classes and lessons are exchanged with the plan decoder as YAML files.

use crate::info::error::DirectoryError;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and decode a YAML snapshot.
pub fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DirectoryError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| DirectoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| DirectoryError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
