use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Persisted sign-in (written to session.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Server the cookie belongs to
    pub base_url: String,
    /// `Cookie` header value, e.g. `access_token=...`
    pub cookie: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not write session file {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// `<data_local_dir>/gigboard/session.json`
pub fn default_session_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("gigboard").join("session.json"))
}

/// Read a saved session. Missing or unreadable files count as signed out.
pub fn read_session(path: &Path) -> Option<Session> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_session(path: &Path, session: &Session) -> Result<(), SessionError> {
    let content = serde_json::to_string_pretty(session)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SessionError::WriteError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| SessionError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Forget the session. Returns whether a file was removed.
pub fn clear_session(path: &Path) -> bool {
    fs::remove_file(path).is_ok()
}
