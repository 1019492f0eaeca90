use super::{MetadataProvider, SearchFilter, SelectedEntry};
use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of matches between two progress notifications.
pub const PROGRESS_UPDATE_INTERVAL: usize = 100;

/// What a traversal produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Matches in discovery order.
    pub entries: Vec<SelectedEntry>,
    /// `true` if the walk stopped on a cancellation request before exhausting the tree.
    pub cancelled: bool,
    /// Entries that could not be read and were skipped.
    pub skipped: usize,
}

/// Depth-first walker that turns matching files into `SelectedEntry` records.
pub struct DirectoryScanner {
    filter: SearchFilter,
    provider: Arc<dyn MetadataProvider>,
    next_identifier: u64,
}

impl DirectoryScanner {
    pub fn new(filter: SearchFilter, provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            filter,
            provider,
            next_identifier: 0,
        }
    }

    /// Walks `root` and collects every file accepted by the filter.
    ///
    /// The cancellation flag is checked before each entry. Unreadable entries are
    /// skipped. `progress_callback` receives the match count after every
    /// [`PROGRESS_UPDATE_INTERVAL`] matches. Identifiers continue from the previous
    /// call on the same scanner, so they are never reused.
    pub fn scan<F>(&mut self, root: &Path, cancel_flag: &AtomicBool, mut progress_callback: F) -> ScanOutcome
    where
        F: FnMut(usize),
    {
        let mut outcome = ScanOutcome::default();

        // Symlinked directories are not followed; a link cycle would never end.
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(std::cmp::Ord::cmp)
            .build();

        for result in walker {
            if cancel_flag.load(Ordering::Acquire) {
                tracing::info!(
                    "🛑 Search cancelled after {} matches",
                    outcome.entries.len()
                );
                outcome.cancelled = true;
                return outcome;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    outcome.skipped += 1;
                    continue;
                }
            };

            // The root itself is a traversal node, not a candidate.
            if entry.depth() == 0 {
                continue;
            }

            if !self.filter.matches(entry.path(), Self::is_directory(&entry)) {
                continue;
            }

            let selected = SelectedEntry::new(
                self.next_identifier,
                root,
                entry.into_path(),
                self.provider.clone(),
            );
            self.next_identifier += 1;
            outcome.entries.push(selected);

            if outcome.entries.len() % PROGRESS_UPDATE_INTERVAL == 0 {
                progress_callback(outcome.entries.len());
            }
        }

        tracing::info!(
            "✅ Search completed: {} matches, {} unreadable entries skipped",
            outcome.entries.len(),
            outcome.skipped
        );
        outcome
    }

    /// Directories, including links that point at one, are never results.
    fn is_directory(entry: &DirEntry) -> bool {
        match entry.file_type() {
            Some(file_type) if file_type.is_dir() => true,
            Some(file_type) if file_type.is_symlink() => entry.path().is_dir(),
            Some(_) => false,
            None => entry.path().is_dir(),
        }
    }
}

/// Sorts entries into display order: ascending full path, case-sensitive.
pub fn sort_for_display(entries: &mut [SelectedEntry]) {
    entries.par_sort_by_cached_key(|entry| entry.path().to_string_lossy().into_owned());
}
