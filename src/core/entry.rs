//! A matched file and the fields computed for it.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::columns::ColumnKind;
use super::metadata::{MetadataProvider, TimestampKind};

/// The value of one report field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    /// The field could not be determined for this file.
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Empty => Ok(()),
        }
    }
}

/// One file that passed the filter.
///
/// Path-derived fields are computed on the spot. Fields that need a stat call or
/// an image decoder are resolved through the `MetadataProvider` on first access and
/// memoized; the entry is a snapshot of the file at discovery time, so the cache is
/// never invalidated.
pub struct SelectedEntry {
    identifier: u64,
    path: PathBuf,
    relative_path_segments: Vec<String>,
    provider: Arc<dyn MetadataProvider>,
    cache: Mutex<HashMap<ColumnKind, FieldValue>>,
    image_size: Mutex<Option<Option<(u32, u32)>>>,
}

impl fmt::Debug for SelectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedEntry")
            .field("identifier", &self.identifier)
            .field("path", &self.path)
            .field("relative_path_segments", &self.relative_path_segments)
            .finish_non_exhaustive()
    }
}

impl SelectedEntry {
    /// Creates an entry for `path`, found below `root`.
    pub fn new(
        identifier: u64,
        root: &Path,
        path: PathBuf,
        provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        let relative_path_segments = path
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .map(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            identifier,
            path,
            relative_path_segments,
            provider,
            cache: Mutex::new(HashMap::new()),
            image_size: Mutex::new(None),
        }
    }

    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory names between the search root and the file.
    pub fn relative_path_segments(&self) -> &[String] {
        &self.relative_path_segments
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Text after the last `.` of the file name, or empty.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("")
            .to_string()
    }

    /// Directory in which the file resides.
    pub fn directory(&self) -> String {
        self.path
            .parent()
            .map(|parent| parent.display().to_string())
            .unwrap_or_default()
    }

    /// The canonical path, or the discovered path if it can no longer be resolved.
    pub fn full_path(&self) -> String {
        match std::fs::canonicalize(&self.path) {
            Ok(resolved) => resolved.display().to_string(),
            Err(_) => self.path.display().to_string(),
        }
    }

    /// Number of components in the discovered path.
    pub fn path_depth(&self) -> usize {
        self.path.components().count()
    }

    pub fn size(&self) -> std::io::Result<u64> {
        self.provider.size(&self.path)
    }

    pub fn created(&self) -> std::io::Result<String> {
        self.provider.timestamp(&self.path, TimestampKind::Created)
    }

    pub fn modified(&self) -> std::io::Result<String> {
        self.provider.timestamp(&self.path, TimestampKind::Modified)
    }

    pub fn accessed(&self) -> std::io::Result<String> {
        self.provider.timestamp(&self.path, TimestampKind::Accessed)
    }

    pub fn image_width(&self) -> Option<u32> {
        self.image_size().map(|(width, _)| width)
    }

    pub fn image_height(&self) -> Option<u32> {
        self.image_size().map(|(_, height)| height)
    }

    /// Width and height, asked from the provider once per entry.
    fn image_size(&self) -> Option<(u32, u32)> {
        let mut slot = lock(&self.image_size);
        *slot.get_or_insert_with(|| self.provider.image_dimensions(&self.path))
    }

    /// The value of a report column for this entry.
    ///
    /// Metadata failures resolve to [`FieldValue::Empty`]; they never abort a report.
    pub fn field(&self, kind: ColumnKind) -> FieldValue {
        // Held while resolving so concurrent readers wait instead of resolving twice.
        let mut cache = lock(&self.cache);
        cache.entry(kind).or_insert_with(|| self.resolve(kind)).clone()
    }

    fn resolve(&self, kind: ColumnKind) -> FieldValue {
        match kind {
            ColumnKind::Path => FieldValue::Text(self.directory()),
            ColumnKind::Filename => FieldValue::Text(self.file_name()),
            ColumnKind::Extension => FieldValue::Text(self.extension()),
            ColumnKind::FileSize => self.stat_field(kind, self.size().map(FieldValue::Number)),
            ColumnKind::PathAndFilename => FieldValue::Text(self.full_path()),
            ColumnKind::PathDepth => FieldValue::Number(self.path_depth() as u64),
            ColumnKind::CreateDate => self.stat_field(kind, self.created().map(FieldValue::Text)),
            ColumnKind::ModifiedDate => self.stat_field(kind, self.modified().map(FieldValue::Text)),
            ColumnKind::AccessedDate => self.stat_field(kind, self.accessed().map(FieldValue::Text)),
            ColumnKind::ImageTakenDate => self
                .provider
                .image_taken_date(&self.path)
                .map_or(FieldValue::Empty, FieldValue::Text),
            ColumnKind::ImageWidth => self
                .image_width()
                .map_or(FieldValue::Empty, |w| FieldValue::Number(w.into())),
            ColumnKind::ImageHeight => self
                .image_height()
                .map_or(FieldValue::Empty, |h| FieldValue::Number(h.into())),
        }
    }

    fn stat_field(&self, kind: ColumnKind, result: std::io::Result<FieldValue>) -> FieldValue {
        result.unwrap_or_else(|e| {
            tracing::debug!("Could not resolve {} for {:?}: {}", kind, self.path, e);
            FieldValue::Empty
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    /// Counts provider calls and answers with fixed values.
    #[derive(Default)]
    struct CountingProvider {
        dimension_calls: AtomicUsize,
        size_calls: AtomicUsize,
    }

    impl MetadataProvider for CountingProvider {
        fn size(&self, _path: &Path) -> io::Result<u64> {
            self.size_calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        }

        fn timestamp(&self, _path: &Path, _kind: TimestampKind) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn image_dimensions(&self, _path: &Path) -> Option<(u32, u32)> {
            self.dimension_calls.fetch_add(1, Ordering::SeqCst);
            Some((640, 480))
        }

        fn image_taken_date(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    fn entry_with(provider: Arc<CountingProvider>) -> SelectedEntry {
        SelectedEntry::new(
            7,
            Path::new("/photos"),
            PathBuf::from("/photos/2023/summer/beach.jpg"),
            provider,
        )
    }

    #[test]
    fn test_path_derived_fields() {
        let entry = entry_with(Arc::new(CountingProvider::default()));
        assert_eq!(entry.identifier(), 7);
        assert_eq!(entry.relative_path_segments(), ["2023", "summer"]);
        assert_eq!(entry.file_name(), "beach.jpg");
        assert_eq!(entry.extension(), "jpg");
        assert_eq!(entry.directory(), "/photos/2023/summer");
        assert_eq!(entry.field(ColumnKind::PathDepth), FieldValue::Number(5));
    }

    #[test]
    fn test_file_in_root_has_no_segments() {
        let entry = SelectedEntry::new(
            0,
            Path::new("/photos"),
            PathBuf::from("/photos/readme"),
            Arc::new(CountingProvider::default()),
        );
        assert!(entry.relative_path_segments().is_empty());
        assert_eq!(entry.extension(), "");
    }

    #[test]
    fn test_image_dimensions_are_resolved_once() {
        let provider = Arc::new(CountingProvider::default());
        let entry = entry_with(provider.clone());

        assert_eq!(entry.image_width(), Some(640));
        assert_eq!(entry.image_height(), Some(480));
        assert_eq!(entry.field(ColumnKind::ImageHeight), FieldValue::Number(480));
        assert_eq!(provider.dimension_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fields_are_memoized() {
        let provider = Arc::new(CountingProvider::default());
        let entry = entry_with(provider.clone());

        assert_eq!(entry.field(ColumnKind::FileSize), FieldValue::Number(42));
        assert_eq!(entry.field(ColumnKind::FileSize), FieldValue::Number(42));
        assert_eq!(provider.size_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_readers_resolve_once() {
        let provider = Arc::new(CountingProvider::default());
        let entry = entry_with(provider.clone());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert_eq!(entry.field(ColumnKind::FileSize), FieldValue::Number(42)));
            }
        });
        assert_eq!(provider.size_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_metadata_failures_resolve_to_empty() {
        let entry = entry_with(Arc::new(CountingProvider::default()));
        assert_eq!(entry.field(ColumnKind::ModifiedDate), FieldValue::Empty);
        assert_eq!(entry.field(ColumnKind::ImageTakenDate), FieldValue::Empty);
        assert_eq!(entry.field(ColumnKind::ModifiedDate).to_string(), "");
        assert!(logs_contain("Could not resolve Modified date"));
    }

    #[test]
    fn test_non_image_width_is_empty_with_real_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        let entry = SelectedEntry::new(0, dir.path(), path, Arc::new(crate::core::FsMetadata));
        assert_eq!(entry.image_width(), None);
        assert_eq!(entry.field(ColumnKind::ImageWidth), FieldValue::Empty);
        assert_eq!(entry.field(ColumnKind::FileSize), FieldValue::Number(12));
    }
}
