// Lazy, one-level directory listing for the file explorer.

use std::cmp::Ordering;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;

use codelab_common::types::FileNode;
use tokio::fs;
use tracing::{debug, warn};

use super::{Workspace, WorkspaceError};

const IGNORED_NAMES: &[&str] = &["node_modules"];

impl Workspace {
    /// List the direct children of `relative_path`, directories first.
    ///
    /// Hidden entries and `node_modules` are left out. Child directories
    /// come back with empty `children`; the client lists them separately
    /// when expanded. A missing directory yields an empty listing.
    pub async fn read_directory(&self, relative_path: &str) -> Result<Vec<FileNode>, WorkspaceError> {
        let dir = self.resolve(relative_path).await?;
        let base = self.relative(&dir);

        match fs::metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(WorkspaceError::NotADirectory(relative_path.to_string())),
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(WorkspaceError::io("stat", relative_path, error)),
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|error| WorkspaceError::io("read directory", relative_path, error))?;

        let mut nodes = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| WorkspaceError::io("read directory", relative_path, error))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }

            let path = if base.is_empty() { name.clone() } else { format!("{base}/{name}") };
            let metadata = match self.entry_metadata(&entry.path(), &path).await {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!(path = %path, error = %error, "skipping unreadable directory entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                nodes.push(FileNode::directory(name, path));
            } else {
                let extension = extension_of(&name).to_string();
                nodes.push(FileNode::file(name, path, extension, metadata.len()));
            }
        }

        sort_nodes(&mut nodes);
        debug!(path = %base, entries = nodes.len(), "listed directory");
        Ok(nodes)
    }

    pub async fn file_tree(&self) -> Result<Vec<FileNode>, WorkspaceError> {
        self.read_directory("").await
    }

    /// Metadata of a listed entry. Symlinks are followed only when their
    /// target stays inside the root; any other link is described by the
    /// link itself, so nothing outside the workspace leaks into a listing.
    async fn entry_metadata(&self, absolute: &Path, relative: &str) -> std::io::Result<Metadata> {
        let own = fs::symlink_metadata(absolute).await?;
        if !own.file_type().is_symlink() {
            return Ok(own);
        }
        match self.resolve(relative).await {
            Ok(_) => fs::metadata(absolute).await,
            Err(error) => {
                debug!(path = %relative, error = %error, "listing symlink without following it");
                Ok(own)
            }
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || IGNORED_NAMES.contains(&name)
}

/// Extension with its leading dot, `""` when there is none. A leading dot
/// alone does not count (`.env` has no extension).
pub(crate) fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index > 0 => &name[index..],
        _ => "",
    }
}

pub(crate) fn sort_nodes(nodes: &mut [FileNode]) {
    nodes.sort_by(|left, right| {
        right.is_dir().cmp(&left.is_dir()).then_with(|| compare_names(&left.name, &right.name))
    });
}

/// Locale-style collation: case-insensitive first, then lowercase before
/// uppercase for names that differ only in case.
fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase()).then_with(|| right.cmp(left))
}
