//! Credential file access.
//!
//! Credentials live in a JSON object keyed by service name, `creds.json` in
//! the working directory by default. Entries are only read or replaced;
//! keys are never added.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default credential file name.
pub const DEFAULT_CREDS_FILE: &str = "creds.json";

/// Credential file errors
#[derive(Debug)]
pub enum CredsError {
    /// File does not exist
    Missing(PathBuf),
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
    /// Top-level value is not an object
    NotAnObject(PathBuf),
    /// Key not present in the file
    UnknownKey(String),
}

impl std::fmt::Display for CredsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredsError::Missing(path) => {
                write!(f, "Credential file '{}' not found", path.display())
            }
            CredsError::Io(path, e) => {
                write!(f, "Failed to access credential file '{}': {}", path.display(), e)
            }
            CredsError::Json(path, e) => {
                write!(f, "Failed to parse credential file '{}': {}", path.display(), e)
            }
            CredsError::NotAnObject(path) => {
                write!(f, "Credential file '{}' is not a JSON object", path.display())
            }
            CredsError::UnknownKey(key) => write!(f, "No credentials for '{}'", key),
        }
    }
}

impl std::error::Error for CredsError {}

/// Path of the credential file in `folder`.
pub fn creds_path(folder: impl AsRef<Path>) -> PathBuf {
    folder.as_ref().join(DEFAULT_CREDS_FILE)
}

/// Read the entry for `key`.
pub fn read_creds(key: &str, path: impl AsRef<Path>) -> Result<Value, CredsError> {
    let mut creds = load(path.as_ref())?;
    creds
        .remove(key)
        .ok_or_else(|| CredsError::UnknownKey(key.to_string()))
}

/// Replace the entry for `key` and rewrite the file.
pub fn update_creds(key: &str, value: Value, path: impl AsRef<Path>) -> Result<(), CredsError> {
    let path = path.as_ref();
    let mut creds = load(path)?;
    match creds.get_mut(key) {
        Some(entry) => *entry = value,
        None => return Err(CredsError::UnknownKey(key.to_string())),
    }

    let contents = serde_json::to_string_pretty(&Value::Object(creds))
        .map_err(|e| CredsError::Json(path.to_path_buf(), e))?;
    std::fs::write(path, contents).map_err(|e| CredsError::Io(path.to_path_buf(), e))
}

fn load(path: &Path) -> Result<Map<String, Value>, CredsError> {
    if !path.is_file() {
        return Err(CredsError::Missing(path.to_path_buf()));
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| CredsError::Io(path.to_path_buf(), e))?;
    match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CredsError::NotAnObject(path.to_path_buf())),
        Err(e) => Err(CredsError::Json(path.to_path_buf(), e)),
    }
}
