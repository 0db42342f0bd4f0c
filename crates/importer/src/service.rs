//! Parse, validate and write one uploaded workbook.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use storage::dto::Ownership;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ImporterError, Result};
use crate::traits::RecordSink;
use crate::validation::{RowValidator, ValidationError, ValidationOutcome};
use crate::workbook::{ImportKind, WorkbookParser, template::check_year};
use crate::writer::{BulkWriter, WriteFailure, WriteReport, WriterConfig};

const ACCEPTED_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

pub fn current_year() -> i32 {
    Local::now().year()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub owner: Ownership,
    /// Year for dates written without one.
    pub year: i32,
    pub validate_only: bool,
}

impl ImportOptions {
    pub fn new(owner: Ownership) -> Self {
        Self {
            owner,
            year: current_year(),
            validate_only: false,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueStage {
    Validation,
    Write,
}

/// A row-level problem, as reported back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowIssue {
    pub stage: IssueStage,
    pub sheet: String,
    pub row: u32,
    pub field: Option<String>,
    pub message: String,
}

impl From<&ValidationError> for RowIssue {
    fn from(error: &ValidationError) -> Self {
        Self {
            stage: IssueStage::Validation,
            sheet: error.sheet.clone(),
            row: error.row,
            field: Some(error.field.clone()),
            message: error.message.clone(),
        }
    }
}

impl From<&WriteFailure> for RowIssue {
    fn from(failure: &WriteFailure) -> Self {
        Self {
            stage: IssueStage::Write,
            sheet: failure.sheet.clone(),
            row: failure.row,
            field: None,
            message: failure.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub kind: ImportKind,
    pub validate_only: bool,
    pub rows_read: usize,
    pub rows_valid: usize,
    pub practices_created: usize,
    pub competitions_created: usize,
    pub records_created: usize,
    pub validation_error_count: usize,
    pub write_error_count: usize,
    /// One readable line per issue, validation issues first.
    pub errors: Vec<String>,
    pub issues: Vec<RowIssue>,
}

impl ImportSummary {
    fn new(kind: ImportKind, validate_only: bool, rows_read: usize, outcome: &ValidationOutcome) -> Self {
        Self {
            kind,
            validate_only,
            rows_read,
            rows_valid: outcome.batch.len(),
            practices_created: 0,
            competitions_created: 0,
            records_created: 0,
            validation_error_count: outcome.errors.len(),
            write_error_count: 0,
            errors: outcome.errors.iter().map(ToString::to_string).collect(),
            issues: outcome.errors.iter().map(RowIssue::from).collect(),
        }
    }

    fn record_writes(&mut self, report: &WriteReport) {
        self.practices_created = report.practices.created;
        self.competitions_created = report.competitions.created;
        self.records_created = report.records.created;
        self.write_error_count = report.failed();
        for failure in &report.failures {
            self.errors.push(format!(
                "{} row {}: {}",
                failure.sheet, failure.row, failure.message
            ));
            self.issues.push(RowIssue::from(failure));
        }
    }

    pub fn created(&self) -> usize {
        self.practices_created + self.competitions_created + self.records_created
    }

    pub fn has_errors(&self) -> bool {
        self.validation_error_count > 0 || self.write_error_count > 0
    }
}

/// A parsed and validated workbook, ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub kind: ImportKind,
    pub rows_read: usize,
    pub outcome: ValidationOutcome,
}

impl PreparedImport {
    /// Summary of a validation-only run.
    pub fn validation_summary(&self) -> ImportSummary {
        ImportSummary::new(self.kind, true, self.rows_read, &self.outcome)
    }
}

/// Parses and validates without touching the backend. Structural problems
/// with the file come back as `Err`; row problems are in the outcome.
pub fn prepare(kind: ImportKind, bytes: &[u8], year: i32) -> Result<PreparedImport> {
    let year = check_year(year)?;
    let rows = WorkbookParser::parse_bytes(kind, bytes)?;
    let outcome = RowValidator::new(year).validate(&rows);

    Ok(PreparedImport {
        kind,
        rows_read: rows.len(),
        outcome,
    })
}

/// Explicit kind wins; otherwise it is guessed from the file name.
pub fn resolve_kind(kind: Option<ImportKind>, file_name: Option<&str>) -> Result<ImportKind> {
    if let Some(kind) = kind {
        return Ok(kind);
    }
    let name = file_name.unwrap_or_default();
    ImportKind::detect(name).ok_or_else(|| ImporterError::UnknownKind(name.to_string()))
}

pub fn check_extension(file_name: &str) -> Result<()> {
    let accepted = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        });

    if accepted {
        Ok(())
    } else {
        Err(ImporterError::UnsupportedFile(file_name.to_string()))
    }
}

#[derive(Clone)]
pub struct ImportService {
    writer: BulkWriter,
}

impl ImportService {
    pub fn new(sink: Arc<dyn RecordSink>, config: WriterConfig) -> Self {
        Self {
            writer: BulkWriter::new(sink, config),
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.writer.sink_name()
    }

    pub async fn import(
        &self,
        kind: ImportKind,
        bytes: &[u8],
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        let prepared = prepare(kind, bytes, options.year)?;
        self.commit(prepared, options).await
    }

    /// Writes the valid drafts of a prepared import and folds everything
    /// into the summary. Invalid rows never reach the writer.
    pub async fn commit(
        &self,
        prepared: PreparedImport,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        let PreparedImport {
            kind,
            rows_read,
            outcome,
        } = prepared;
        let mut summary = ImportSummary::new(kind, options.validate_only, rows_read, &outcome);

        if !options.validate_only && !outcome.batch.is_empty() {
            let report = self.writer.write(options.owner, outcome.batch).await?;
            summary.record_writes(&report);
        }

        info!(
            "{} import via {}: {} rows read, {} created, {} validation errors, {} write errors",
            kind,
            self.sink_name(),
            summary.rows_read,
            summary.created(),
            summary.validation_error_count,
            summary.write_error_count
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySink, xlsx};
    use crate::workbook::{COMPETITION_INPUT_SHEET, SAMPLE_SHEET};
    use storage::models::PoolType;
    use uuid::Uuid;

    const PRACTICE_HEADER: &[&str] = &["日付", "曜日", "タイトル", "場所", "備考"];
    const COMPETITION_HEADER: &[&str] = &["開始日", "終了日", "大会名", "場所", "プール種別", "備考"];

    fn service(sink: &Arc<MemorySink>) -> ImportService {
        ImportService::new(sink.clone(), WriterConfig::new(2, 2))
    }

    fn options() -> ImportOptions {
        ImportOptions::new(Ownership::personal(Uuid::new_v4())).with_year(2025)
    }

    fn practice_workbook() -> Vec<u8> {
        xlsx(&[
            (
                SAMPLE_SHEET,
                &[PRACTICE_HEADER, &["2025/04/01", "火", "sample", "", ""]],
            ),
            (
                "4月",
                &[
                    PRACTICE_HEADER,
                    &["4月1日", "火", "AM練", "市民プール", ""],
                    &["4月2日", "水", "", "", ""],
                    &["4月31日", "木", "PM練", "", ""],
                    &["2025-04-04", "金", "", "学校プール", "キック中心"],
                    &["2025/04/05", "土", "週末練", "", ""],
                ],
            ),
        ])
    }

    #[tokio::test]
    async fn test_invalid_rows_never_reach_the_writer() {
        let sink = Arc::new(MemorySink::new());

        let summary = service(&sink)
            .import(ImportKind::Practice, &practice_workbook(), &options())
            .await
            .unwrap();

        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.practices_created, 3);
        assert_eq!(summary.validation_error_count, 1);
        assert_eq!(summary.write_error_count, 0);
        assert_eq!(summary.issues[0].row, 4);
        assert_eq!(summary.issues[0].sheet, "4月");
        assert_eq!(sink.practice_count(), 3);
    }

    #[tokio::test]
    async fn test_header_mismatch_writes_nothing() {
        let sink = Arc::new(MemorySink::new());
        let bytes = xlsx(&[(
            "4月",
            &[
                &["日付", "曜日", "練習名", "場所", "備考"],
                &["4月1日", "火", "AM練", "", ""],
            ],
        )]);

        let err = service(&sink)
            .import(ImportKind::Practice, &bytes, &options())
            .await
            .unwrap_err();

        assert!(matches!(err, ImporterError::HeaderMismatch { .. }));
        assert!(err.is_structural());
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_validate_only_skips_writer() {
        let sink = Arc::new(MemorySink::new());

        let summary = service(&sink)
            .import(
                ImportKind::Practice,
                &practice_workbook(),
                &options().validate_only(true),
            )
            .await
            .unwrap();

        assert!(summary.validate_only);
        assert_eq!(summary.rows_valid, 3);
        assert_eq!(summary.created(), 0);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_team_competitions() {
        let sink = Arc::new(MemorySink::rejecting(&["Broken Meet"]));
        let team_id = Uuid::new_v4();
        let options = ImportOptions::new(Ownership::team(Uuid::new_v4(), team_id)).with_year(2025);
        let bytes = xlsx(&[(
            COMPETITION_INPUT_SHEET,
            &[
                COMPETITION_HEADER,
                &["2025/05/10", "2025/05/11", "Spring Meet", "City Pool", "50m", ""],
                &["2025/06/01", "", "Broken Meet", "City Pool", "25m", ""],
                &["2025/07/01", "", "Summer Meet", "City Pool", "25m", "relay"],
            ],
        )]);

        let summary = service(&sink)
            .import(ImportKind::Competition, &bytes, &options)
            .await
            .unwrap();

        assert_eq!(summary.competitions_created, 2);
        assert_eq!(summary.write_error_count, 1);
        assert_eq!(summary.issues[0].stage, IssueStage::Write);
        assert_eq!(summary.issues[0].row, 3);

        let stored = sink.competitions();
        assert!(stored.iter().all(|(owner, _)| owner.team_id == Some(team_id)));
        assert!(stored.iter().all(|(owner, _)| owner.competition_user_id().is_none()));
        let spring = stored.iter().find(|(_, c)| c.title == "Spring Meet").unwrap();
        assert_eq!(spring.1.pool_type, PoolType::LongCourse);
    }

    #[tokio::test]
    async fn test_best_times_become_records() {
        let sink = Arc::new(MemorySink::new());
        let bytes = xlsx(&[
            (
                "短水路",
                &[
                    &["距離", "自由形", "備考", "平泳ぎ", "備考", "背泳ぎ", "備考", "バタフライ", "備考", "個人メドレー", "備考"],
                    &["50m", "25.80", "", "31.02", "", "", "", "", "", "━", "━"],
                    &["100m", "56.10", "taper", "", "", "", "", "", "", "1:02.50", ""],
                ],
            ),
            (
                "長水路（引き継ぎ有）",
                &[
                    &["距離", "自由形", "備考", "平泳ぎ", "備考", "バタフライ", "備考"],
                    &["50m", "24.90", "", "", "", "", ""],
                ],
            ),
        ]);

        let summary = service(&sink)
            .import(ImportKind::BestTime, &bytes, &options())
            .await
            .unwrap();

        assert_eq!(summary.records_created, 5);
        assert_eq!(summary.validation_error_count, 0);
        let records = sink.records();
        let relay: Vec<_> = records.iter().filter(|(_, r)| r.is_relaying).collect();
        assert_eq!(relay.len(), 1);
        assert_eq!(relay[0].1.pool_type, PoolType::LongCourse);
        assert!(records.iter().all(|(owner, _)| owner.team_id.is_none()));
    }

    #[tokio::test]
    async fn test_summary_serializes_camel_case() {
        let sink = Arc::new(MemorySink::new());
        let summary = service(&sink)
            .import(ImportKind::Practice, &practice_workbook(), &options())
            .await
            .unwrap();

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["practicesCreated"], 3);
        assert_eq!(value["validationErrorCount"], 1);
        assert_eq!(value["kind"], "practice");
        assert_eq!(value["issues"][0]["stage"], "validation");
    }

    #[test]
    fn test_kind_resolution() {
        assert_eq!(
            resolve_kind(None, Some("大会一括登録.xlsx")).unwrap(),
            ImportKind::Competition
        );
        assert_eq!(
            resolve_kind(Some(ImportKind::BestTime), Some("practice.xlsx")).unwrap(),
            ImportKind::BestTime
        );
        assert!(matches!(
            resolve_kind(None, Some("upload.xlsx")),
            Err(ImporterError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_extension_check() {
        assert!(check_extension("練習.XLSX").is_ok());
        assert!(check_extension("times.ods").is_ok());
        assert!(matches!(
            check_extension("times.csv"),
            Err(ImporterError::UnsupportedFile(_))
        ));
    }
}
