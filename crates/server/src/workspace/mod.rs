// Workspace-scoped file management: root store, path guard, tree listing,
// CRUD and content search. Every operation runs against one `Workspace`
// snapshot of the configured root.

pub mod guard;
pub mod ops;
pub mod search;
pub mod tree;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codelab_common::path::PathError;
use codelab_common::protocol::ErrorCode;
use codelab_common::types::PathValidation;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("path escapes workspace: {0}")]
    PathEscape(String),

    #[error("invalid path `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("{kind} not found: {path}")]
    NotFound { kind: &'static str, path: String },

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("refusing to {0} the workspace root")]
    RootProtected(&'static str),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to {action} `{path}`: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(action: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        Self::Io { action, path: path.into(), source }
    }

    pub(crate) fn not_found(kind: &'static str, path: impl Into<String>) -> Self {
        Self::NotFound { kind, path: path.into() }
    }

    /// Classification sent alongside the message in error envelopes.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PathEscape(_) | Self::RootProtected(_) => ErrorCode::PathEscape,
            Self::InvalidPath { .. } => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::NotADirectory(_) => ErrorCode::NotADirectory,
            Self::InvalidPattern(_) => ErrorCode::InvalidPattern,
            Self::Io { .. } => ErrorCode::InternalError,
        }
    }
}

/// Shared, switchable workspace root.
///
/// Handlers never read the root directly: they take a [`Workspace`]
/// snapshot once per request, so a concurrent [`WorkspaceStore::set`]
/// only affects requests that start after it.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: Arc<RwLock<PathBuf>>,
}

impl WorkspaceStore {
    /// Create `default_root` if needed and use it as the initial root.
    pub async fn open(default_root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = ensure_root(default_root.as_ref()).await?;
        info!(root = %root.display(), "workspace root ready");
        Ok(Self { root: Arc::new(RwLock::new(root)) })
    }

    pub async fn path(&self) -> PathBuf {
        self.root.read().await.clone()
    }

    /// Replace the root, creating the directory recursively if missing.
    /// Returns the canonical form of the new root.
    pub async fn set(&self, path: impl AsRef<Path>) -> Result<PathBuf, WorkspaceError> {
        let root = ensure_root(path.as_ref()).await?;
        let mut current = self.root.write().await;
        info!(from = %current.display(), to = %root.display(), "switching workspace root");
        *current = root.clone();
        Ok(root)
    }

    pub async fn snapshot(&self) -> Workspace {
        Workspace { root: self.path().await }
    }
}

/// A workspace bound to one canonical root directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Bind to an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root)
            .map_err(|error| WorkspaceError::io("canonicalize", root.display().to_string(), error))?;
        if !canonical.is_dir() {
            return Err(WorkspaceError::NotADirectory(root.display().to_string()));
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Existence and directory-ness of an operator-supplied workspace path.
pub async fn validate_path(path: impl AsRef<Path>) -> PathValidation {
    match tokio::fs::metadata(path.as_ref()).await {
        Ok(metadata) => PathValidation {
            valid: metadata.is_dir(),
            exists: true,
            is_directory: metadata.is_dir(),
        },
        Err(_) => PathValidation { valid: false, exists: false, is_directory: false },
    }
}

async fn ensure_root(path: &Path) -> Result<PathBuf, WorkspaceError> {
    let display = path.display().to_string();
    let absolute = std::path::absolute(path)
        .map_err(|error| WorkspaceError::io("resolve", display.clone(), error))?;
    tokio::fs::create_dir_all(&absolute)
        .await
        .map_err(|error| WorkspaceError::io("create workspace", display.clone(), error))?;
    let canonical = tokio::fs::canonicalize(&absolute)
        .await
        .map_err(|error| WorkspaceError::io("canonicalize", display.clone(), error))?;
    if !canonical.is_dir() {
        return Err(WorkspaceError::NotADirectory(display));
    }
    Ok(canonical)
}
