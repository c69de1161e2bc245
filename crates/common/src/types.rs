// Core domain types shared across all codelab crates.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INCLUDE_PATTERN: &str = "*";
pub const DEFAULT_EXCLUDE_PATTERN: &str = "node_modules,dist,.git";

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    /// Workspace-relative, `/`-joined.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Leading dot included; empty when the name has no extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Only present for directories, and empty until that directory is
    /// listed on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::Directory,
            extension: None,
            size: None,
            children: Some(Vec::new()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        path: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::File,
            extension: Some(extension.into()),
            size: Some(size),
            children: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
}

/// A single match produced by a content search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub file: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted on the untrimmed line.
    pub column: usize,
    /// The matching line with surrounding whitespace removed.
    pub text: String,
    /// Offset into `text`.
    pub match_start: usize,
    /// Offset into `text`, exclusive.
    pub match_end: usize,
}

/// Something the search walk could not read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub truncated: bool,
    pub total_found: usize,
    #[serde(default)]
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub whole_word: bool,
    pub include_pattern: String,
    pub exclude_pattern: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            use_regex: false,
            whole_word: false,
            include_pattern: DEFAULT_INCLUDE_PATTERN.to_string(),
            exclude_pattern: DEFAULT_EXCLUDE_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathValidation {
    pub valid: bool,
    pub exists: bool,
    pub is_directory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn directory_node_serializes_with_empty_children() {
        let node = FileNode::directory("src", "src");
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "name": "src", "path": "src", "type": "directory", "children": [] })
        );
    }

    #[test]
    fn file_node_serializes_extension_and_size() {
        let node = FileNode::file("a.js", "src/a.js", ".js", 11);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "name": "a.js", "path": "src/a.js", "type": "file", "extension": ".js", "size": 11 })
        );
    }

    #[test]
    fn search_options_fill_missing_fields_with_defaults() {
        let options: SearchOptions =
            serde_json::from_value(json!({ "caseSensitive": true })).unwrap();
        assert!(options.case_sensitive);
        assert!(!options.use_regex);
        assert_eq!(options.include_pattern, "*");
        assert_eq!(options.exclude_pattern, "node_modules,dist,.git");
    }

    #[test]
    fn search_outcome_uses_camel_case() {
        let outcome = SearchOutcome { total_found: 3, ..SearchOutcome::default() };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["totalFound"], 3);
        assert_eq!(value["truncated"], false);
        assert_eq!(value["skipped"], json!([]));
    }
}
