//! Decides which filesystem entries become search results.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;

/// The active filter of a search.
///
/// An empty `extension` or `name` disables that filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Exact, case-sensitive extension without the leading dot.
    pub extension: String,
    /// Substring the file name must contain.
    pub name: String,
    /// Compare `name` literally instead of case-insensitively.
    pub case_sensitive: bool,
}

impl SearchFilter {
    /// Builds a filter. A single leading `.` on the extension is dropped so that
    /// `".txt"` and `"txt"` select the same files.
    pub fn new(extension: impl Into<String>, name: impl Into<String>, case_sensitive: bool) -> Self {
        let extension = extension.into();
        let extension = match extension.strip_prefix('.') {
            Some(stripped) => stripped.to_string(),
            None => extension,
        };
        Self {
            extension,
            name: name.into(),
            case_sensitive,
        }
    }

    /// Returns `true` iff the entry should be included in the results.
    ///
    /// Directories are never selected. They are still traversed by the scanner.
    pub fn matches(&self, path: &Path, is_directory: bool) -> bool {
        if is_directory {
            return false;
        }

        let file_name = path.file_name().and_then(OsStr::to_str).unwrap_or("");

        if !self.extension.is_empty() && !Self::matches_extension(path, &self.extension) {
            return false;
        }

        if !self.name.is_empty() && !Self::matches_name(file_name, &self.name, self.case_sensitive) {
            return false;
        }

        true
    }

    /// Literal equality between the entry's extension and the filter.
    fn matches_extension(path: &Path, extension_filter: &str) -> bool {
        match path.extension().and_then(OsStr::to_str) {
            Some(ext) => ext == extension_filter,
            None => false,
        }
    }

    /// Checks if a filename contains the search query.
    fn matches_name(file_name: &str, query: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            file_name.contains(query)
        } else {
            file_name.to_lowercase().contains(&query.to_lowercase())
        }
    }
}
