use clap::{Parser, Subcommand, ValueEnum};
use importer::{
    ImportKind, ImportOptions, ImportService, ImportSummary, RecordSink, WriterConfig,
    service::{check_extension, current_year, resolve_kind},
    sinks::{PostgresSink, PostgrestSink},
    workbook::template,
};
use std::path::PathBuf;
use std::sync::Arc;
use storage::{Database, dto::Ownership};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "swim-import")]
#[command(about = "Bulk import of practices, competitions and best times from spreadsheets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workbook and write its rows to the backend
    Import {
        file: PathBuf,

        /// Guessed from the file name when omitted
        #[arg(long, value_parser = parse_kind)]
        kind: Option<ImportKind>,

        #[arg(long)]
        user_id: Uuid,

        #[arg(long)]
        team_id: Option<Uuid>,

        /// Year for dates written as `M月D日`
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        validate_only: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Write an empty import template
    Template {
        #[arg(value_parser = parse_kind)]
        kind: ImportKind,

        #[arg(long)]
        year: Option<i32>,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Postgres,
    Postgrest,
}

#[derive(clap::Args)]
struct BackendArgs {
    #[arg(long, value_enum, default_value = "postgres")]
    backend: Backend,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    #[arg(long, env = "IMPORT_CHUNK_SIZE", default_value_t = importer::writer::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, env = "IMPORT_MAX_CONCURRENCY", default_value_t = importer::writer::DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,
}

fn parse_kind(value: &str) -> Result<ImportKind, String> {
    value.parse().map_err(|e: importer::ImporterError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("import={},importer={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Import {
            file,
            kind,
            user_id,
            team_id,
            year,
            validate_only,
            json,
            backend,
        } => {
            let owner = match team_id {
                Some(team_id) => Ownership::team(user_id, team_id),
                None => Ownership::personal(user_id),
            };
            let options = ImportOptions::new(owner)
                .with_year(year.unwrap_or_else(current_year))
                .validate_only(validate_only);
            handle_import(file, kind, options, json, backend).await?;
        }
        Commands::Template { kind, year, output } => {
            handle_template(kind, year.unwrap_or_else(current_year), output).await?;
        }
    }

    Ok(())
}

async fn connect_sink(args: &BackendArgs) -> Result<Arc<dyn RecordSink>, Box<dyn std::error::Error>> {
    match args.backend {
        Backend::Postgres => {
            let url = args
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL is required for the postgres backend")?;
            tracing::info!("Connecting to database...");
            let database = Database::new(url).await?;
            Ok(Arc::new(PostgresSink::new(database.pool().clone())))
        }
        Backend::Postgrest => {
            let url = args
                .supabase_url
                .as_deref()
                .ok_or("SUPABASE_URL is required for the postgrest backend")?;
            let key = args
                .supabase_key
                .as_deref()
                .ok_or("SUPABASE_KEY is required for the postgrest backend")?;
            Ok(Arc::new(PostgrestSink::new(url, key)?))
        }
    }
}

async fn handle_import(
    file: PathBuf,
    kind: Option<ImportKind>,
    options: ImportOptions,
    json: bool,
    backend: BackendArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    check_extension(&file_name)?;
    let kind = resolve_kind(kind, Some(&file_name))?;

    tracing::info!("Loading {} workbook from: {}", kind, file.display());
    let bytes = tokio::fs::read(&file).await?;

    let year = options.year;
    let prepared =
        tokio::task::spawn_blocking(move || importer::prepare(kind, &bytes, year)).await??;

    let summary = if options.validate_only {
        prepared.validation_summary()
    } else {
        let sink = connect_sink(&backend).await?;
        let config = WriterConfig::new(backend.chunk_size, backend.max_concurrency);
        ImportService::new(sink, config)
            .commit(prepared, &options)
            .await?
    };

    report(&summary, json)?;

    if summary.has_errors() {
        return Err(format!(
            "{} row(s) failed validation, {} row(s) failed to write",
            summary.validation_error_count, summary.write_error_count
        )
        .into());
    }

    Ok(())
}

fn report(summary: &ImportSummary, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    for line in &summary.errors {
        tracing::warn!("  {}", line);
    }
    if summary.validate_only {
        tracing::info!(
            "Validated {} rows: {} valid, {} errors",
            summary.rows_read,
            summary.rows_valid,
            summary.validation_error_count
        );
    } else {
        tracing::info!(
            "Created {} practices, {} competitions, {} records ({} validation errors, {} write errors)",
            summary.practices_created,
            summary.competitions_created,
            summary.records_created,
            summary.validation_error_count,
            summary.write_error_count
        );
    }
    Ok(())
}

async fn handle_template(
    kind: ImportKind,
    year: i32,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = template::build(kind, year)?;

    let path = if output.is_dir() {
        output.join(template::file_name(kind, year))
    } else {
        output
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await?;

    tracing::info!("Wrote {} template to: {}", kind, path.display());
    Ok(())
}
