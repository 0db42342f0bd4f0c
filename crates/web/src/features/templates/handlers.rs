use axum::{
    extract::{Path, Query},
    http::header,
    response::{IntoResponse, Response},
};
use importer::{ImportKind, service::current_year, workbook::template};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::error::WebResult;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TemplateQuery {
    /// Year the practice calendar and examples are built for
    #[validate(range(min = 1900, max = 9999, message = "Year must be between 1900 and 9999"))]
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/templates/{kind}",
    params(
        ("kind" = ImportKind, Path, description = "practice, competition or best-time"),
        TemplateQuery
    ),
    responses(
        (status = 200, description = "Empty import template", body = Vec<u8>, content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Unknown kind or invalid year")
    ),
    tag = "templates"
)]
pub async fn download_template(
    Path(kind): Path<String>,
    Query(query): Query<TemplateQuery>,
) -> WebResult<Response> {
    query.validate()?;
    let kind: ImportKind = kind.parse()?;
    let year = query.year.unwrap_or_else(current_year);

    let bytes = template::build(kind, year)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        template::file_name(kind, year)
    );

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
