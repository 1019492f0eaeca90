//! Resolves the derived fields of a matched file: size, timestamps and image data.

use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::time::SystemTime;

/// Format used for every timestamp in the report.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which filesystem timestamp to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    Created,
    Modified,
    Accessed,
}

/// The capability a `SelectedEntry` uses to compute its fields.
///
/// Stat-based lookups surface I/O errors. Image lookups return `None` when the
/// data cannot be determined; a missing EXIF block is not an error.
pub trait MetadataProvider: Send + Sync {
    fn size(&self, path: &Path) -> io::Result<u64>;

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> io::Result<String>;

    fn image_dimensions(&self, path: &Path) -> Option<(u32, u32)>;

    fn image_taken_date(&self, path: &Path) -> Option<String>;
}

/// Reads metadata straight from the filesystem, the `image` decoders and EXIF.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMetadata;

impl MetadataProvider for FsMetadata {
    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> io::Result<String> {
        let metadata = fs::metadata(path)?;
        let time = match kind {
            TimestampKind::Created => metadata.created()?,
            TimestampKind::Modified => metadata.modified()?,
            TimestampKind::Accessed => metadata.accessed()?,
        };
        Ok(format_system_time(time))
    }

    fn image_dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        match image::image_dimensions(path) {
            Ok(dimensions) => Some(dimensions),
            Err(e) => {
                tracing::debug!("Image decoder could not size {:?}: {}", path, e);
                // RAW formats the decoders don't know often still carry EXIF dimensions.
                exif_dimensions(path)
            }
        }
    }

    fn image_taken_date(&self, path: &Path) -> Option<String> {
        let exif = read_exif(path)?;
        let field = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)?;
        let raw = match field.value {
            exif::Value::Ascii(ref values) => values.first()?,
            _ => return None,
        };
        let taken = exif::DateTime::from_ascii(raw).ok()?;
        let date = NaiveDate::from_ymd_opt(taken.year.into(), taken.month.into(), taken.day.into())?;
        let datetime = date.and_hms_opt(taken.hour.into(), taken.minute.into(), taken.second.into())?;
        Some(datetime.format(DATE_FORMAT).to_string())
    }
}

/// Formats a filesystem time in local time using [`DATE_FORMAT`].
pub fn format_system_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(DATE_FORMAT).to_string()
}

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            tracing::debug!("No EXIF data in {:?}: {}", path, e);
            None
        }
    }
}

fn exif_dimensions(path: &Path) -> Option<(u32, u32)> {
    let exif = read_exif(path)?;
    let width = exif
        .get_field(exif::Tag::PixelXDimension, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;
    let height = exif
        .get_field(exif::Tag::PixelYDimension, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_size_and_timestamps_of_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        File::create(&path).unwrap().write_all(b"hello").unwrap();

        assert_eq!(FsMetadata.size(&path).unwrap(), 5);
        let modified = FsMetadata.timestamp(&path, TimestampKind::Modified).unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&modified, DATE_FORMAT).is_ok());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        assert!(FsMetadata.size(&path).is_err());
        assert!(FsMetadata.timestamp(&path, TimestampKind::Accessed).is_err());
    }

    #[test]
    fn test_non_image_has_no_image_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text").unwrap();

        assert_eq!(FsMetadata.image_dimensions(&path), None);
        assert_eq!(FsMetadata.image_taken_date(&path), None);
    }

    #[test]
    fn test_corrupt_image_has_no_image_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, [0xFF, 0xD8, 0x00, 0x13]).unwrap();

        assert_eq!(FsMetadata.image_dimensions(&path), None);
        assert_eq!(FsMetadata.image_taken_date(&path), None);
    }

    #[test]
    fn test_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(3, 2).save(&path).unwrap();

        assert_eq!(FsMetadata.image_dimensions(&path), Some((3, 2)));
        assert_eq!(FsMetadata.image_taken_date(&path), None);
    }
}
