// Lexical path resolution: separator unification, `.`/`..` folding, 4096 char max.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Maximum allowed candidate length in characters.
const MAX_PATH_CHARS: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path exceeds maximum length of {MAX_PATH_CHARS} characters")]
    TooLong,

    #[error("path contains null byte")]
    NullByte,
}

/// Resolve `candidate` against `root` without touching the filesystem.
///
/// Rules:
/// - Treat `\` as a separator alongside `/`
/// - Drop empty and `.` components
/// - `..` pops one component (never above the filesystem root)
/// - An absolute candidate replaces `root`
/// - Reject null bytes
/// - Enforce max 4096 character limit
///
/// The result may lie outside `root`; deciding whether that is acceptable
/// is the caller's job.
pub fn resolve_lexical(root: &Path, candidate: &str) -> Result<PathBuf, PathError> {
    if candidate.contains('\0') {
        return Err(PathError::NullByte);
    }
    if candidate.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong);
    }

    let unified = candidate.replace('\\', "/");
    let base = if unified.starts_with('/') { Path::new("/") } else { root };

    let mut resolved = PathBuf::new();
    for component in base.components() {
        push_component(&mut resolved, component);
    }
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                pop_component(&mut resolved);
            }
            name => resolved.push(name),
        }
    }

    Ok(resolved)
}

/// Workspace-relative, forward-slash form of `absolute`.
///
/// Returns `""` for the root itself and `None` when `absolute` is not
/// inside `root` (component-wise, so `/ws-other` is not inside `/ws`).
pub fn relative_slash_path(root: &Path, absolute: &Path) -> Option<String> {
    let relative = absolute.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn push_component(path: &mut PathBuf, component: Component<'_>) {
    match component {
        Component::CurDir => {}
        Component::ParentDir => pop_component(path),
        other => path.push(other.as_os_str()),
    }
}

fn pop_component(path: &mut PathBuf) {
    let at_root = path.parent().is_none();
    if !at_root {
        path.pop();
    }
}
