//! Turns search results into tab-separated text and hands it to an export target.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::columns::{ColumnKind, ReportColumn};
use super::SelectedEntry;

/// Builds tab-separated reports from a list of entries.
///
/// This struct is stateless and provides methods as associated functions.
pub struct ReportFormatter;

impl ReportFormatter {
    /// Formats `entries` with the included `columns`, in column order.
    ///
    /// The first row holds the column names. Rows are ordered shallowest path
    /// first, then by case-insensitive file name; the caller's list is not
    /// reordered.
    pub fn format(entries: &[Arc<SelectedEntry>], columns: &[ReportColumn]) -> String {
        let selected: Vec<ColumnKind> = columns
            .iter()
            .filter(|column| column.included())
            .map(|column| column.kind())
            .collect();
        if selected.iter().any(|kind| kind.is_image_field()) {
            tracing::info!("Reading image metadata for {} files", entries.len());
        }

        let mut rows = Vec::with_capacity(entries.len() + 1);
        rows.push(
            selected
                .iter()
                .map(|kind| kind.name())
                .collect::<Vec<_>>()
                .join("\t"),
        );

        for entry in Self::export_order(entries) {
            rows.push(
                selected
                    .iter()
                    .map(|kind| entry.field(*kind).to_string())
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }

        rows.join("\n")
    }

    /// Entries ordered for export: path depth, then lower-cased file name.
    pub fn export_order(entries: &[Arc<SelectedEntry>]) -> Vec<Arc<SelectedEntry>> {
        let mut ordered = entries.to_vec();
        ordered.sort_by_cached_key(|entry| (entry.path_depth(), entry.file_name().to_lowercase()));
        ordered
    }
}

/// An export target for a finished report, such as the clipboard of a desktop shell.
pub trait ReportSink {
    fn deliver(&mut self, report: &str) -> Result<()>;
}

/// Writes the report to a file, replacing it.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for FileSink {
    fn deliver(&mut self, report: &str) -> Result<()> {
        std::fs::write(&self.path, report)
            .with_context(|| format!("Failed to write report to {:?}", self.path))?;
        tracing::info!("Saved report to {:?}", self.path);
        Ok(())
    }
}

/// Writes the report to any `io::Write`, newline-terminated.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn deliver(&mut self, report: &str) -> Result<()> {
        writeln!(self.writer, "{}", report).context("Failed to write report")?;
        self.writer.flush().context("Failed to flush report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FsMetadata;

    fn entry(identifier: u64, root: &str, path: &str) -> Arc<SelectedEntry> {
        Arc::new(SelectedEntry::new(
            identifier,
            Path::new(root),
            PathBuf::from(path),
            Arc::new(FsMetadata),
        ))
    }

    fn columns(kinds: &[(ColumnKind, bool)]) -> Vec<ReportColumn> {
        kinds.iter().map(|(kind, on)| ReportColumn(*kind, *on)).collect()
    }

    #[test]
    fn test_shallow_paths_come_first() {
        let entries = vec![entry(0, "/root", "/root/sub/b.txt"), entry(1, "/root", "/root/a.txt")];

        let ordered = ReportFormatter::export_order(&entries);
        let paths: Vec<_> = ordered.iter().map(|e| e.path().to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("/root/a.txt"), PathBuf::from("/root/sub/b.txt")]);
        // The input order is untouched.
        assert_eq!(entries[0].identifier(), 0);
    }

    #[test]
    fn test_same_depth_sorted_by_case_insensitive_name() {
        let entries = vec![
            entry(0, "/r", "/r/b.txt"),
            entry(1, "/r", "/r/C.txt"),
            entry(2, "/r", "/r/A.txt"),
        ];
        let names: Vec<_> = ReportFormatter::export_order(&entries)
            .iter()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec!["A.txt", "b.txt", "C.txt"]);
    }

    #[test]
    fn test_format_includes_only_checked_columns_in_order() {
        let entries = vec![entry(0, "/data", "/data/docs/notes.txt"), entry(1, "/data", "/data/a.csv")];
        let report = ReportFormatter::format(
            &entries,
            &columns(&[
                (ColumnKind::Filename, true),
                (ColumnKind::FileSize, false),
                (ColumnKind::Path, true),
                (ColumnKind::Extension, true),
            ]),
        );

        assert_eq!(
            report,
            "Filename\tPath\tExtension\na.csv\t/data\tcsv\nnotes.txt\t/data/docs\ttxt"
        );
    }

    #[test]
    fn test_unreadable_fields_render_empty() {
        let entries = vec![entry(0, "/nowhere", "/nowhere/ghost.png")];
        let report = ReportFormatter::format(
            &entries,
            &columns(&[
                (ColumnKind::Filename, true),
                (ColumnKind::FileSize, true),
                (ColumnKind::ImageWidth, true),
            ]),
        );
        assert_eq!(report, "Filename\tFile size\tImage width\nghost.png\t\t");
    }

    #[test]
    fn test_no_entries_yields_header_only() {
        let report = ReportFormatter::format(&[], &columns(&[(ColumnKind::Path, true)]));
        assert_eq!(report, "Path");
    }

    #[test]
    fn test_file_sink_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("report.tsv"));
        sink.deliver("Path\n/data").unwrap();
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "Path\n/data");
    }

    #[test]
    fn test_writer_sink_terminates_with_newline() {
        let mut sink = WriterSink::new(Vec::new());
        sink.deliver("Filename\na.txt").unwrap();
        assert_eq!(sink.into_inner(), b"Filename\na.txt\n");
    }
}
