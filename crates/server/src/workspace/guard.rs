// Path guard: every workspace-relative path goes through here before any
// filesystem call.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use codelab_common::path::{relative_slash_path, resolve_lexical};
use tokio::fs;

use super::{Workspace, WorkspaceError};

/// How a trailing symlink is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkMode {
    /// The link is resolved and its target must stay inside the root.
    Follow,
    /// The link itself is the subject (delete, rename); only its parent
    /// directory has to be inside the root.
    Entry,
}

impl Workspace {
    /// Resolve `candidate` to an absolute path inside the workspace.
    ///
    /// The check runs twice: once on the lexical resolution and once with
    /// symlinks resolved on the longest existing prefix. The returned path
    /// is the lexical one, so operations act on links rather than their
    /// targets.
    pub async fn resolve(&self, candidate: &str) -> Result<PathBuf, WorkspaceError> {
        guard(&self.root, candidate).await
    }

    /// Like [`Workspace::resolve`] but refuses the root itself.
    pub(crate) async fn resolve_below_root(
        &self,
        candidate: &str,
        action: &'static str,
    ) -> Result<PathBuf, WorkspaceError> {
        let resolved = self.resolve(candidate).await?;
        self.refuse_root(resolved, action)
    }

    /// Resolve a directory entry that is removed or moved as-is. A trailing
    /// symlink is accepted whatever it points to, dangling included.
    pub(crate) async fn resolve_entry(
        &self,
        candidate: &str,
        action: &'static str,
    ) -> Result<PathBuf, WorkspaceError> {
        let resolved = check(&self.root, candidate, LinkMode::Entry).await?;
        self.refuse_root(resolved, action)
    }

    /// Workspace-relative `/` form of a path produced by [`Workspace::resolve`].
    pub(crate) fn relative(&self, absolute: &Path) -> String {
        relative_slash_path(&self.root, absolute).unwrap_or_default()
    }

    fn refuse_root(&self, resolved: PathBuf, action: &'static str) -> Result<PathBuf, WorkspaceError> {
        if resolved == self.root {
            return Err(WorkspaceError::RootProtected(action));
        }
        Ok(resolved)
    }
}

/// `root` must already be canonical.
pub async fn guard(root: &Path, candidate: &str) -> Result<PathBuf, WorkspaceError> {
    check(root, candidate, LinkMode::Follow).await
}

async fn check(root: &Path, candidate: &str, mode: LinkMode) -> Result<PathBuf, WorkspaceError> {
    let escape = || WorkspaceError::PathEscape(candidate.to_string());

    let lexical = resolve_lexical(root, candidate).map_err(|source| WorkspaceError::InvalidPath {
        path: candidate.to_string(),
        source,
    })?;
    if !lexical.starts_with(root) {
        return Err(escape());
    }

    let trailing_link = mode == LinkMode::Entry && is_symlink(&lexical).await;
    let canonical = match (lexical.parent(), lexical.file_name()) {
        (Some(parent), Some(name)) if trailing_link => {
            canonicalize_existing_prefix(parent).await.map(|parent| parent.join(name))
        }
        _ => canonicalize_existing_prefix(&lexical).await,
    };

    match canonical {
        Some(canonical) if canonical.starts_with(root) => Ok(lexical),
        _ => Err(escape()),
    }
}

async fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok_and(|metadata| metadata.file_type().is_symlink())
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components that do not exist yet. `None` when an existing entry cannot
/// be canonicalized (a dangling symlink, for instance).
async fn canonicalize_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match fs::canonicalize(&existing).await {
            Ok(mut canonical) => {
                for part in tail.iter().rev() {
                    canonical.push(part);
                }
                return Some(canonical);
            }
            Err(_) => {
                if fs::symlink_metadata(&existing).await.is_ok() {
                    return None;
                }
                tail.push(existing.file_name()?.to_os_string());
                if !existing.pop() {
                    return None;
                }
            }
        }
    }
}
