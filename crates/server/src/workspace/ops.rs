// File and directory CRUD. Not transactional: a failure part-way through
// `write_file` can leave freshly created parent directories behind.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use super::{Workspace, WorkspaceError};

impl Workspace {
    pub async fn read_file(&self, path: &str) -> Result<String, WorkspaceError> {
        let target = self.resolve(path).await?;
        fs::read_to_string(&target).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => WorkspaceError::not_found("file", path),
            _ => WorkspaceError::io("read", path, error),
        })
    }

    /// Create-or-replace, creating missing parent directories first.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve_below_root(path, "overwrite").await?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|error| WorkspaceError::io("create parent directories for", path, error))?;
        }
        fs::write(&target, content).await.map_err(|error| WorkspaceError::io("write", path, error))?;
        debug!(path = %self.relative(&target), bytes = content.len(), "wrote file");
        Ok(())
    }

    pub async fn create_file(&self, path: &str, content: Option<&str>) -> Result<(), WorkspaceError> {
        self.write_file(path, content.unwrap_or_default()).await
    }

    /// Recursive and idempotent.
    pub async fn create_directory(&self, path: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve(path).await?;
        fs::create_dir_all(&target)
            .await
            .map_err(|error| WorkspaceError::io("create directory", path, error))?;
        debug!(path = %self.relative(&target), "created directory");
        Ok(())
    }

    /// Removes the entry itself; a symlink is unlinked, never followed.
    pub async fn delete_file(&self, path: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve_entry(path, "delete").await?;
        ensure_exists(&target, "file", path).await?;
        fs::remove_file(&target).await.map_err(|error| WorkspaceError::io("delete", path, error))?;
        debug!(path = %self.relative(&target), "deleted file");
        Ok(())
    }

    /// Recursive removal of a directory and everything below it.
    pub async fn delete_directory(&self, path: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve_below_root(path, "delete").await?;
        let metadata = ensure_exists(&target, "directory", path).await?;
        if !metadata.is_dir() {
            return Err(WorkspaceError::NotADirectory(path.to_string()));
        }
        fs::remove_dir_all(&target)
            .await
            .map_err(|error| WorkspaceError::io("delete directory", path, error))?;
        debug!(path = %self.relative(&target), "deleted directory");
        Ok(())
    }

    /// Rename or move; both ends are guarded independently.
    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), WorkspaceError> {
        let source = self.resolve_entry(old_path, "rename").await?;
        let destination = self.resolve_entry(new_path, "replace").await?;
        ensure_exists(&source, "file", old_path).await?;
        fs::rename(&source, &destination)
            .await
            .map_err(|error| WorkspaceError::io("rename", old_path, error))?;
        debug!(
            from = %self.relative(&source),
            to = %self.relative(&destination),
            "renamed entry"
        );
        Ok(())
    }
}

async fn ensure_exists(
    target: &Path,
    kind: &'static str,
    path: &str,
) -> Result<std::fs::Metadata, WorkspaceError> {
    fs::symlink_metadata(target).await.map_err(|error| match error.kind() {
        ErrorKind::NotFound => WorkspaceError::not_found(kind, path),
        _ => WorkspaceError::io("stat", path, error),
    })
}
