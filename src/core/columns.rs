//! The fixed vocabulary of report columns.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::CoreError;

/// One column of an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
    Path,
    Filename,
    Extension,
    FileSize,
    PathAndFilename,
    PathDepth,
    CreateDate,
    ModifiedDate,
    AccessedDate,
    ImageTakenDate,
    ImageWidth,
    ImageHeight,
}

impl ColumnKind {
    /// All kinds, in default report order.
    pub const ALL: [ColumnKind; 12] = [
        ColumnKind::Path,
        ColumnKind::Filename,
        ColumnKind::Extension,
        ColumnKind::FileSize,
        ColumnKind::PathAndFilename,
        ColumnKind::PathDepth,
        ColumnKind::CreateDate,
        ColumnKind::ModifiedDate,
        ColumnKind::AccessedDate,
        ColumnKind::ImageTakenDate,
        ColumnKind::ImageWidth,
        ColumnKind::ImageHeight,
    ];

    /// The header text of the column.
    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Path => "Path",
            ColumnKind::Filename => "Filename",
            ColumnKind::Extension => "Extension",
            ColumnKind::FileSize => "File size",
            ColumnKind::PathAndFilename => "Path and filename",
            ColumnKind::PathDepth => "Path depth",
            ColumnKind::CreateDate => "Create date",
            ColumnKind::ModifiedDate => "Modified date",
            ColumnKind::AccessedDate => "Accessed date",
            ColumnKind::ImageTakenDate => "Image taken date",
            ColumnKind::ImageWidth => "Image width",
            ColumnKind::ImageHeight => "Image height",
        }
    }

    /// Columns that need the image decoder or EXIF reader.
    pub fn is_image_field(self) -> bool {
        matches!(
            self,
            ColumnKind::ImageTakenDate | ColumnKind::ImageWidth | ColumnKind::ImageHeight
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ColumnKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnsupportedField(s.to_string()))
    }
}

impl Serialize for ColumnKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A column together with whether it is part of the report.
///
/// Serialised as a `[name, included]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn(pub ColumnKind, pub bool);

impl ReportColumn {
    pub fn kind(&self) -> ColumnKind {
        self.0
    }

    pub fn included(&self) -> bool {
        self.1
    }
}

/// The default column list: every kind, with only `Path` and `Filename` included.
pub fn default_columns() -> Vec<ReportColumn> {
    ColumnKind::ALL
        .into_iter()
        .map(|kind| ReportColumn(kind, matches!(kind, ColumnKind::Path | ColumnKind::Filename)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for kind in ColumnKind::ALL {
            assert_eq!(kind.name().parse::<ColumnKind>().unwrap(), kind);
        }
        assert_eq!("file SIZE".parse::<ColumnKind>().unwrap(), ColumnKind::FileSize);
    }

    #[test]
    fn test_unknown_name_is_unsupported() {
        let err = "Color depth".parse::<ColumnKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedField(name) if name == "Color depth"));
    }

    #[test]
    fn test_report_column_serializes_as_pair() {
        let json = serde_json::to_string(&ReportColumn(ColumnKind::ImageWidth, true)).unwrap();
        assert_eq!(json, r#"["Image width",true]"#);

        let column: ReportColumn = serde_json::from_str(r#"["Modified date", false]"#).unwrap();
        assert_eq!(column, ReportColumn(ColumnKind::ModifiedDate, false));
    }

    #[test]
    fn test_default_columns_cover_vocabulary() {
        let columns = default_columns();
        assert_eq!(columns.len(), ColumnKind::ALL.len());
        let included: Vec<_> = columns.iter().filter(|c| c.included()).map(|c| c.kind()).collect();
        assert_eq!(included, vec![ColumnKind::Path, ColumnKind::Filename]);
    }
}
