use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use importer::{
    ImportKind, ImportOptions, ImportSummary,
    service::{check_extension, current_year, resolve_kind},
};
use serde::Deserialize;
use storage::dto::Ownership;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::error::{WebError, WebResult};
use crate::state::AppState;

use super::services;

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// Owner of the imported rows
    pub user_id: Uuid,

    /// Team the rows belong to; personal import when omitted
    pub team_id: Option<Uuid>,

    /// Year for dates written without one (`4月1日`); defaults to the current year
    #[validate(range(min = 1900, max = 9999, message = "Year must be between 1900 and 9999"))]
    pub year: Option<i32>,

    /// Parse and validate only, write nothing
    #[serde(default)]
    pub validate_only: bool,

    /// Uploaded file name, used to detect the kind on `/api/imports`
    pub file_name: Option<String>,
}

impl ImportQuery {
    fn options(&self) -> ImportOptions {
        let owner = match self.team_id {
            Some(team_id) => Ownership::team(self.user_id, team_id),
            None => Ownership::personal(self.user_id),
        };
        ImportOptions::new(owner)
            .with_year(self.year.unwrap_or_else(current_year))
            .validate_only(self.validate_only)
    }
}

async fn handle(
    state: AppState,
    kind: Option<ImportKind>,
    query: ImportQuery,
    body: Bytes,
) -> WebResult<Json<ImportSummary>> {
    query.validate()?;

    if let Some(file_name) = &query.file_name {
        check_extension(file_name)?;
    }
    let kind = resolve_kind(kind, query.file_name.as_deref())?;

    if body.is_empty() {
        return Err(WebError::BadRequest("Request body is empty".to_string()));
    }

    tracing::info!(
        "Import of {} ({} bytes) for user {}",
        kind,
        body.len(),
        query.user_id
    );
    let summary = services::run_import(&state.imports, kind, body, query.options()).await?;

    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/imports/{kind}",
    params(
        ("kind" = ImportKind, Path, description = "practice, competition or best-time"),
        ImportQuery
    ),
    request_body(content = Vec<u8>, description = "Workbook file (.xlsx, .xls, .ods)", content_type = "application/octet-stream"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Import finished; row-level problems are listed in the summary", body = ImportSummary),
        (status = 400, description = "Unknown kind, empty body or invalid query"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "The workbook cannot be read or its headers do not match")
    ),
    tag = "imports"
)]
pub async fn import_workbook(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> WebResult<Json<ImportSummary>> {
    let kind: ImportKind = kind.parse()?;
    handle(state, Some(kind), query, body).await
}

#[utoipa::path(
    post,
    path = "/api/imports",
    params(ImportQuery),
    request_body(content = Vec<u8>, description = "Workbook file; the kind is detected from `file_name`", content_type = "application/octet-stream"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Import finished; row-level problems are listed in the summary", body = ImportSummary),
        (status = 400, description = "Kind cannot be detected, unsupported file or empty body"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "The workbook cannot be read or its headers do not match")
    ),
    tag = "imports"
)]
pub async fn import_detected(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> WebResult<Json<ImportSummary>> {
    handle(state, None, query, body).await
}
