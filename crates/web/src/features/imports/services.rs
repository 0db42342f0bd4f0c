use axum::body::Bytes;
use importer::{ImportKind, ImportOptions, ImportService, ImportSummary, Result};

/// Parses on a blocking thread, then writes on the runtime.
pub async fn run_import(
    service: &ImportService,
    kind: ImportKind,
    body: Bytes,
    options: ImportOptions,
) -> Result<ImportSummary> {
    let year = options.year;
    let prepared =
        tokio::task::spawn_blocking(move || importer::prepare(kind, &body, year)).await??;

    service.commit(prepared, &options).await
}
