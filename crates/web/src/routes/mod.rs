use axum::{Json, Router, extract::DefaultBodyLimit, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features;
use crate::middleware::auth::ApiKeys;
use crate::state::AppState;
use crate::ApiDoc;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(state: AppState, api_keys: ApiKeys, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .nest("/imports", features::imports::routes::routes(api_keys))
        .nest("/templates", features::templates::routes::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use importer::{
        ImportKind, ImportService, RecordSink, Result, WriterConfig, workbook::template,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};
    use tower::ServiceExt;
    use uuid::Uuid;

    const KEY: &str = "test-key";

    #[derive(Default)]
    struct CountingSink {
        rows: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RecordSink for CountingSink {
        async fn insert_practices(&self, _: &Ownership, rows: &[NewPractice]) -> Result<usize> {
            self.rows.fetch_add(rows.len(), Ordering::SeqCst);
            Ok(rows.len())
        }

        async fn insert_competitions(
            &self,
            _: &Ownership,
            rows: &[NewCompetition],
        ) -> Result<usize> {
            self.rows.fetch_add(rows.len(), Ordering::SeqCst);
            Ok(rows.len())
        }

        async fn insert_records(&self, _: &Ownership, rows: &[NewRecord]) -> Result<usize> {
            self.rows.fetch_add(rows.len(), Ordering::SeqCst);
            Ok(rows.len())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn app() -> Router {
        let state = AppState {
            imports: ImportService::new(Arc::new(CountingSink::default()), WriterConfig::default()),
        };
        create_router(state, ApiKeys::from_comma_separated(KEY), 1024 * 1024)
    }

    fn upload(path: &str, key: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/octet-stream");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_import_requires_api_key() {
        let path = format!("/api/imports/practice?user_id={}", Uuid::new_v4());
        let bytes = template::build(ImportKind::Practice, 2025).unwrap();

        let response = app().oneshot(upload(&path, None, bytes.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(upload(&path, Some("wrong"), bytes))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_template_upload_returns_empty_summary() {
        let path = format!(
            "/api/imports/best-time?user_id={}&validate_only=true",
            Uuid::new_v4()
        );
        let bytes = template::build(ImportKind::BestTime, 2025).unwrap();

        let response = app().oneshot(upload(&path, Some(KEY), bytes)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let summary = json_body(response).await;
        assert_eq!(summary["kind"], "best-time");
        assert_eq!(summary["validateOnly"], true);
        assert_eq!(summary["rowsRead"], 0);
        assert_eq!(summary["validationErrorCount"], 0);
    }

    #[tokio::test]
    async fn test_wrong_layout_is_unprocessable() {
        // A competition template does not have the practice header.
        let path = format!("/api/imports/practice?user_id={}", Uuid::new_v4());
        let bytes = template::build(ImportKind::Competition, 2025).unwrap();

        let response = app().oneshot(upload(&path, Some(KEY), bytes)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("expected header"));
    }

    #[tokio::test]
    async fn test_unreadable_upload_is_unprocessable() {
        let path = format!("/api/imports/competition?user_id={}", Uuid::new_v4());
        let response = app()
            .oneshot(upload(&path, Some(KEY), b"plain text".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let user = Uuid::new_v4();
        let bytes = template::build(ImportKind::Practice, 2025).unwrap();

        let unknown_kind = format!("/api/imports/relay?user_id={user}");
        let response = app()
            .oneshot(upload(&unknown_kind, Some(KEY), bytes.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let empty = format!("/api/imports/practice?user_id={user}");
        let response = app().oneshot(upload(&empty, Some(KEY), Vec::new())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_year = format!("/api/imports/practice?user_id={user}&year=20250");
        let response = app()
            .oneshot(upload(&bad_year, Some(KEY), bytes))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_kind_detected_from_file_name() {
        let path = format!(
            "/api/imports?user_id={}&file_name=practice_import_2025.xlsx",
            Uuid::new_v4()
        );
        let bytes = template::build(ImportKind::Practice, 2025).unwrap();

        let response = app().oneshot(upload(&path, Some(KEY), bytes)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["kind"], "practice");
    }

    #[tokio::test]
    async fn test_template_download() {
        let response = app()
            .oneshot(
                Request::get("/api/templates/competition?year=2026")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("competition_import_2026.xlsx"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rows = importer::workbook::WorkbookParser::parse_bytes(ImportKind::Competition, &bytes)
            .unwrap();
        assert!(rows.is_empty());
    }
}
