pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{default_columns, ColumnKind, ReportColumn, SearchConfig, SearchFilter};

/// Current on-disk settings version.
pub const SETTINGS_VERSION: u32 = 1;
/// Maximum length of the recent directory and recent filename lists.
pub const MAX_RECENT_ITEMS: usize = 10;

/// Persisted user settings: the last search, recent inputs and report columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(rename = "Version")]
    pub version: u32,
    #[serde(rename = "RootDir")]
    pub root_directory: PathBuf,
    #[serde(rename = "RecentDirectories")]
    pub recent_directories: Vec<PathBuf>,
    #[serde(rename = "FilterExtension")]
    pub filter_extension: String,
    #[serde(rename = "RecentExtensions")]
    pub recent_extensions: Vec<String>,
    #[serde(rename = "FilterFilename")]
    pub filter_filename: String,
    #[serde(rename = "FilenameCaseSensitive")]
    pub filename_case_sensitive: bool,
    #[serde(rename = "RecentFilenames")]
    pub recent_filename_filters: Vec<String>,
    #[serde(rename = "ReportColumns")]
    pub report_columns: Vec<ReportColumn>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The search described by these settings.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::new(
            self.root_directory.clone(),
            SearchFilter::new(
                self.filter_extension.as_str(),
                self.filter_filename.as_str(),
                self.filename_case_sensitive,
            ),
        )
    }

    /// Remembers the inputs of a launched search.
    pub fn record_search(&mut self, root: &Path, filter: &SearchFilter) {
        self.root_directory = root.to_path_buf();
        self.filter_extension = filter.extension.clone();
        self.filter_filename = filter.name.clone();
        self.filename_case_sensitive = filter.case_sensitive;
        self.cleanup();
    }

    /// Keeps the recent lists and column list consistent.
    ///
    /// Current values move to the front of their recent list, duplicates are
    /// dropped, directory and filename lists are capped. Missing report columns
    /// are appended unchecked.
    pub fn cleanup(&mut self) {
        push_front_unique(&mut self.recent_directories, self.root_directory.clone());
        self.recent_directories.truncate(MAX_RECENT_ITEMS);

        // The extension list is not capped.
        push_front_unique(&mut self.recent_extensions, self.filter_extension.clone());

        push_front_unique(&mut self.recent_filename_filters, self.filter_filename.clone());
        self.recent_filename_filters.truncate(MAX_RECENT_ITEMS);

        let mut seen = Vec::with_capacity(ColumnKind::ALL.len());
        self.report_columns.retain(|column| {
            if seen.contains(&column.kind()) {
                false
            } else {
                seen.push(column.kind());
                true
            }
        });
        for kind in ColumnKind::ALL {
            if !seen.contains(&kind) {
                self.report_columns.push(ReportColumn(kind, false));
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let root_directory = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let recent_extensions = [
            "", "docx", "xlsx", "pptx", "pdf", "odt", "csv", "py", "svg", "png", "jpg", "jpeg",
            "gif", "txt", "zip",
        ]
        .iter()
        .map(|ext| ext.to_string())
        .collect();

        Self {
            version: SETTINGS_VERSION,
            root_directory,
            recent_directories: Vec::new(),
            filter_extension: String::new(),
            recent_extensions,
            filter_filename: String::new(),
            filename_case_sensitive: false,
            recent_filename_filters: Vec::new(),
            report_columns: default_columns(),
        }
    }
}

/// Moves `value` to the front of `list`, removing any other copy.
fn push_front_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    list.retain(|item| item != &value);
    list.insert(0, value);

    let mut index = 1;
    while index < list.len() {
        if list[..index].contains(&list[index]) {
            list.remove(index);
        } else {
            index += 1;
        }
    }
}
