//! Disk-backed `SessionState` store: load/save by session key, atomic
//! writes, corruption surfaced (never silently eaten) so the caller can
//! decide on recovery.

use std::fs;
use std::path::{Path, PathBuf};

use gan_core::{GanError, SessionState};
use tracing::warn;

use crate::key::sanitize_key;

const STATE_EXTENSION: &str = "toml";

/// One directory holding one file per session (default directory name
/// `.mcp-gan-state`).
#[derive(Clone, Debug)]
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    /// Default state directory, rooted at the given working directory.
    pub fn default_dir(working_dir: &Path) -> PathBuf {
        working_dir.join(".mcp-gan-state")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, session_key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{STATE_EXTENSION}", sanitize_key(session_key)))
    }

    /// Load the session keyed by `session_key`. `Ok(None)` means no file
    /// exists yet (first reference to this key). `Err(SessionCorrupted)`
    /// means a file exists but couldn't be parsed — the caller decides
    /// whether to start fresh.
    pub fn load(&self, session_key: &str) -> Result<Option<SessionState>, GanError> {
        let path = self.path_for(session_key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| {
            warn!(session_key, error = %e, "session file exists but could not be read");
            GanError::SessionCorrupted(session_key.to_string())
        })?;
        toml::from_str(&contents).map(Some).map_err(|e| {
            warn!(session_key, error = %e, "session file contents are not valid session state");
            GanError::SessionCorrupted(session_key.to_string())
        })
    }

    /// Persist `state` atomically: write to a sibling temp file, then
    /// rename over the final path.
    pub fn save(&self, session_key: &str, state: &SessionState) -> Result<(), GanError> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).map_err(|e| GanError::DirectoryCreationFailed {
                path: self.base_dir.display().to_string(),
                detail: e.to_string(),
            })?;
        }

        let path = self.path_for(session_key);
        let tmp_path = path.with_extension(format!("{STATE_EXTENSION}.tmp"));

        let serialized = toml::to_string_pretty(state).map_err(|e| GanError::SessionPersistenceFailed {
            session_id: state.id.clone(),
            detail: format!("serialization failed: {e}"),
        })?;

        fs::write(&tmp_path, serialized).map_err(|e| GanError::SessionPersistenceFailed {
            session_id: state.id.clone(),
            detail: format!("write failed: {e}"),
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| GanError::SessionPersistenceFailed {
            session_id: state.id.clone(),
            detail: format!("rename failed: {e}"),
        })?;

        Ok(())
    }

    /// Whether a session file currently exists for `session_key`.
    pub fn exists(&self, session_key: &str) -> bool {
        self.path_for(session_key).exists()
    }
}
