use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session-scoped operator preferences. An explicit store object replaces
/// ambient session state: the CLI loads at mount and saves at update
/// boundaries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub auto_refresh_paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_batch_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not read session file `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse session file `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("could not write session file `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not serialize session state: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is not an error: a fresh session starts from
    /// defaults.
    pub fn load(&self) -> Result<SessionState, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(SessionState::default())
            }
            Err(source) => return Err(SessionError::Read { path: self.path.clone(), source }),
        };

        toml::from_str(&raw).map_err(|source| SessionError::Parse { path: self.path.clone(), source })
    }

    /// Write-then-rename so a crash mid-save never truncates the session
    /// file.
    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let rendered = toml::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("tmp");

        fs::write(&tmp_path, rendered)
            .map_err(|source| SessionError::Write { path: tmp_path.clone(), source })?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|source| SessionError::Write { path: self.path.clone(), source })?;
        Ok(())
    }
}
