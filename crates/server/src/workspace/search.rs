// Recursive content search over the workspace tree.
//
// Single pass, depth-first, entries visited in name order. The first
// MAX_RESULTS matches are kept; counting continues to the end so callers
// learn how many were dropped.

use std::fs;
use std::path::Path;

use codelab_common::types::{SearchOptions, SearchOutcome, SearchResult, SkippedEntry};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::{Workspace, WorkspaceError};

pub const MAX_RESULTS: usize = 1000;

/// Scanned when the include pattern is `*`. Everything else, including
/// extension-less files, is assumed to be binary.
const TEXT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "json", "md", "markdown", "txt", "html", "htm", "css",
    "scss", "sass", "less", "py", "java", "c", "cpp", "cc", "h", "hpp", "cs", "go", "rs", "rb",
    "php", "sh", "bash", "yml", "yaml", "toml", "ini", "xml", "svg", "sql", "vue", "svelte", "kt",
    "swift", "lua", "r", "csv", "log",
];

impl Workspace {
    /// Search every eligible file under the root. Runs on the blocking pool.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, WorkspaceError> {
        let matcher = build_matcher(query, options)?;
        let filter = EntryFilter::new(options);
        let root = self.root.clone();

        let outcome = tokio::task::spawn_blocking(move || scan(&root, &matcher, &filter))
            .await
            .map_err(|error| WorkspaceError::io("search", query, std::io::Error::other(error)))?;

        debug!(
            query,
            total_found = outcome.total_found,
            truncated = outcome.truncated,
            skipped = outcome.skipped.len(),
            "search finished"
        );
        Ok(outcome)
    }
}

/// Regex queries are used verbatim; literal queries are escaped and, for
/// whole-word searches, wrapped in word boundaries.
pub fn build_matcher(query: &str, options: &SearchOptions) -> Result<Regex, WorkspaceError> {
    let pattern = if options.use_regex {
        query.to_string()
    } else if options.whole_word {
        format!(r"\b{}\b", regex::escape(query))
    } else {
        regex::escape(query)
    };

    Ok(RegexBuilder::new(&pattern).case_insensitive(!options.case_sensitive).build()?)
}

/// Include/exclude rules from the comma-separated option strings.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include: Include,
    exclude: Vec<String>,
}

#[derive(Debug, Clone)]
enum Include {
    TextExtensions,
    Tokens(Vec<String>),
}

impl EntryFilter {
    pub fn new(options: &SearchOptions) -> Self {
        let include_pattern = options.include_pattern.trim();
        let include = if include_pattern.is_empty() || include_pattern == "*" {
            Include::TextExtensions
        } else {
            Include::Tokens(split_tokens(include_pattern))
        };

        Self { include, exclude: split_tokens(&options.exclude_pattern) }
    }

    /// Plain substring test on the workspace-relative path.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.iter().any(|token| relative_path.contains(token.as_str()))
    }

    pub fn includes_file(&self, file_name: &str) -> bool {
        match &self.include {
            Include::TextExtensions => Path::new(file_name)
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| {
                    TEXT_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
                }),
            Include::Tokens(tokens) => tokens.iter().any(|token| match token.strip_prefix('*') {
                Some(suffix) if suffix.starts_with('.') => file_name.ends_with(suffix),
                _ => file_name.contains(token.as_str()),
            }),
        }
    }
}

fn split_tokens(pattern: &str) -> Vec<String> {
    pattern
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

struct Scan<'a> {
    root: &'a Path,
    matcher: &'a Regex,
    filter: &'a EntryFilter,
    outcome: SearchOutcome,
}

fn scan(root: &Path, matcher: &Regex, filter: &EntryFilter) -> SearchOutcome {
    let mut scan = Scan { root, matcher, filter, outcome: SearchOutcome::default() };
    scan.walk(root);
    scan.outcome.truncated = scan.outcome.total_found > MAX_RESULTS;
    scan.outcome
}

impl Scan<'_> {
    fn walk(&mut self, dir: &Path) {
        let listing = fs::read_dir(dir).and_then(|entries| entries.collect::<Result<Vec<_>, _>>());
        let mut entries = match listing {
            Ok(entries) => entries,
            Err(error) => {
                self.skip(dir, error.to_string());
                return;
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let relative = self.relative(&path);
            if self.filter.is_excluded(&relative) {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(error) => {
                    self.skip(&path, error.to_string());
                    continue;
                }
            };

            if file_type.is_symlink() {
                self.skip(&path, "symbolic link not followed".to_string());
            } else if file_type.is_dir() {
                self.walk(&path);
            } else if self.filter.includes_file(&entry.file_name().to_string_lossy()) {
                self.scan_file(&path, relative);
            }
        }
    }

    fn scan_file(&mut self, path: &Path, relative: String) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                self.skip(path, error.to_string());
                return;
            }
        };

        let matcher = self.matcher;
        for (index, raw_line) in content.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let mut matches = matcher.find_iter(line).filter(|found| !found.is_empty()).peekable();
            if matches.peek().is_none() {
                continue;
            }

            let layout = TrimmedLine::new(line);
            for found in matches {
                self.outcome.total_found += 1;
                if self.outcome.results.len() >= MAX_RESULTS {
                    continue;
                }
                let (column, match_start, match_end) = layout.offsets(found.start(), found.end());
                self.outcome.results.push(SearchResult {
                    file: relative.clone(),
                    line: index + 1,
                    column,
                    text: layout.text.to_string(),
                    match_start,
                    match_end,
                });
            }
        }
    }

    fn relative(&self, path: &Path) -> String {
        codelab_common::path::relative_slash_path(self.root, path)
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    }

    fn skip(&mut self, path: &Path, reason: String) {
        let relative = self.relative(path);
        warn!(path = %relative, reason = %reason, "search skipped entry");
        self.outcome.skipped.push(SkippedEntry { path: relative, reason });
    }
}

/// A line and its trimmed text, with offsets counted in characters.
struct TrimmedLine<'a> {
    line: &'a str,
    text: &'a str,
    leading_chars: usize,
    text_chars: usize,
}

impl<'a> TrimmedLine<'a> {
    fn new(line: &'a str) -> Self {
        let text = line.trim();
        let leading_bytes = line.len() - line.trim_start().len();
        Self {
            line,
            text,
            leading_chars: line[..leading_bytes].chars().count(),
            text_chars: text.chars().count(),
        }
    }

    /// `(column, match_start, match_end)` for a byte range of the raw line.
    fn offsets(&self, start: usize, end: usize) -> (usize, usize, usize) {
        let start_chars = self.line[..start].chars().count();
        let end_chars = self.line[..end].chars().count();
        let clamp = |offset: usize| offset.saturating_sub(self.leading_chars).min(self.text_chars);
        (start_chars + 1, clamp(start_chars), clamp(end_chars))
    }
}
