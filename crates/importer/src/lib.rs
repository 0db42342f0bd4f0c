pub mod error;
pub mod service;
pub mod sinks;
pub mod time;
pub mod traits;
pub mod validation;
pub mod workbook;
pub mod writer;

#[cfg(test)]
mod testing;

pub use error::{ImporterError, Result};
pub use service::{
    ImportOptions, ImportService, ImportSummary, IssueStage, PreparedImport, RowIssue, prepare,
};
pub use traits::RecordSink;
pub use workbook::ImportKind;
pub use writer::{BulkWriter, WriteReport, WriterConfig};
