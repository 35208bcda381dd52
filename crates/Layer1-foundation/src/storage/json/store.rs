//! JSON 파일 저장소 - 설정 레이어 디렉토리
//!
//! A store is one directory holding JSON documents. Missing documents read as
//! `None`; unreadable or malformed ones surface as [`Error::Io`] /
//! [`Error::Json`] carrying the offending path. Writes go through a sibling
//! temp file and a rename so a reader never sees a half-written document.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config dir and inside projects.
pub const APP_DIR: &str = "switchboard";

/// Directory of JSON documents (global or per-project config layer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config_dir>/switchboard/`
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(APP_DIR)))
            .ok_or_else(|| Error::Config("no platform config directory".to_string()))
    }

    /// `<root>/.switchboard/`
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(format!(".{APP_DIR}")))
    }

    /// Project layer of the working directory.
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|source| Error::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::project(cwd))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, document: &str) -> PathBuf {
        self.dir.join(document)
    }

    /// Reads `document`; `Ok(None)` when it does not exist.
    pub fn read<T: DeserializeOwned>(&self, document: &str) -> Result<Option<T>> {
        let path = self.path(document);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::Json { path, source })
    }

    /// Writes `value` as pretty JSON, creating the directory if needed.
    pub fn write<T: Serialize>(&self, document: &str, value: &T) -> Result<()> {
        let path = self.path(document);
        let content = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
            path: path.clone(),
            source,
        })?;

        std::fs::create_dir_all(&self.dir).map_err(|source| Error::Io {
            path: self.dir.clone(),
            source,
        })?;

        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, content)
            .and_then(|()| std::fs::rename(&staging, &path))
            .map_err(|source| Error::Io { path, source })?;

        tracing::debug!(path = %self.path(document).display(), "Document written");
        Ok(())
    }
}
