//! Athena query API - renders query templates and runs them on Amazon Athena.

use std::sync::Arc;

use anyhow::{Context, Result};
use athena_query_api::backend::{AthenaBackend, MockQueryBackend, QueryBackend};
use athena_query_api::cli::Cli;
use athena_query_api::config::Config;
use athena_query_api::logging::init_logging;
use athena_query_api::query::QueryService;
use athena_query_api::server::{self, AppState};
use athena_query_api::template::TemplateStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let log_format = match cli.parse_log_format() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    init_logging(log_format);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config);

    let context = config.athena.execution_context();
    let polling = config.polling.settings()?;
    let addr = config.listen_addr()?;

    let backend: Arc<dyn QueryBackend> = if cli.mock_backend {
        warn!("Using mock query backend; queries will not reach Athena");
        Arc::new(MockQueryBackend::new())
    } else {
        Arc::new(AthenaBackend::from_env().await)
    };

    let templates = match &config.templates.location {
        Some(location) => {
            let store = TemplateStore::open(location)
                .with_context(|| format!("Failed to open template store '{location}'"))?;
            info!("Query templates: {}", store.location());
            Some(store)
        }
        None => {
            warn!("No query template location configured; named templates are unavailable");
            None
        }
    };

    info!(
        catalog = %context.catalog,
        database = %context.database,
        workgroup = %context.workgroup,
        "Athena execution context"
    );

    let service = Arc::new(QueryService::new(backend, templates, context, polling));
    let shutdown = CancellationToken::new();
    let router = server::build_router(AppState::new(service, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(listener, router, shutdown, server::shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}
