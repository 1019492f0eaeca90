//! The search engine: filtering, traversal, session lifecycle and reporting.

pub mod columns;
pub mod entry;
pub mod error;
pub mod metadata;
pub mod predicate;
pub mod report;
pub mod scanner;
pub mod session;
pub mod tree;

pub use columns::{default_columns, ColumnKind, ReportColumn};
pub use entry::{FieldValue, SelectedEntry};
pub use error::CoreError;
pub use metadata::{FsMetadata, MetadataProvider, TimestampKind, DATE_FORMAT};
pub use predicate::SearchFilter;
pub use report::{FileSink, ReportFormatter, ReportSink, WriterSink};
pub use scanner::{DirectoryScanner, ScanOutcome, PROGRESS_UPDATE_INTERVAL};
pub use session::{SearchConfig, SearchEvent, SearchSession, SessionStatus};
pub use tree::{ResultTree, TreeNode};
