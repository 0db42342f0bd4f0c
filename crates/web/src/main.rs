use anyhow::Context;
use importer::{
    ImportService, RecordSink, WriterConfig,
    sinks::{PostgresSink, PostgrestSink},
};
use std::sync::Arc;
use storage::Database;
use utoipa::OpenApi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::{BackendConfig, Config};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::imports::handlers::import_workbook,
        features::imports::handlers::import_detected,
        features::templates::handlers::download_template,
    ),
    components(
        schemas(
            importer::ImportKind,
            importer::ImportSummary,
            importer::RowIssue,
            importer::IssueStage,
        )
    ),
    tags(
        (name = "imports", description = "Bulk import of practices, competitions and best times"),
        (name = "templates", description = "Spreadsheet templates for the imports"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

async fn connect_sink(backend: BackendConfig) -> anyhow::Result<Arc<dyn RecordSink>> {
    match backend {
        BackendConfig::Postgres { database_url } => {
            tracing::info!(
                "Connecting to database at: {}",
                database_url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(&database_url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");

            Ok(Arc::new(PostgresSink::new(db.pool().clone())))
        }
        BackendConfig::Postgrest { url, key } => {
            tracing::info!("Writing imports through PostgREST at: {}", url);
            let sink = PostgrestSink::new(url, key).context("Failed to build HTTP client")?;
            Ok(Arc::new(sink))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting swim import API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let sink = connect_sink(config.backend()?).await?;
    let writer_config = WriterConfig::new(config.chunk_size, config.max_concurrency);
    tracing::info!(
        "Import writer: {} rows per chunk, {} chunks in flight",
        writer_config.chunk_size,
        writer_config.max_concurrency
    );

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty; every import request will be rejected");
    }

    let state = AppState {
        imports: ImportService::new(sink, writer_config),
    };
    let app = routes::create_router(state, api_keys, config.max_upload_bytes);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
