//! `country-sync serve` runs the HTTP API; `country-sync sync` runs one synchronisation and exits.

use clap::{Parser, Subcommand};
use country_sync::{
    app, ensure_country_table, ensure_database_exists, AppState, PgCountryStore, RestCountriesClient, Settings,
    SyncJob,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "country-sync", version, about = "Country API and REST Countries synchronisation")]
struct Cli {
    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Overrides COUNTRIES_SOURCE_URL.
    #[arg(long, global = true)]
    source_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (and the periodic sync when SYNC_INTERVAL_SECS is set).
    Serve {
        /// Overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Synchronize countries from the external dataset once.
    Sync,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("country_sync=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "country-sync failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::from_env()?;
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }
    if let Some(url) = cli.source_url {
        settings.source_url = url;
    }

    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;
    ensure_country_table(&pool, &settings.schema).await?;
    let store = Arc::new(PgCountryStore::new(pool, &settings.schema));

    let source = RestCountriesClient::new(settings.source_url.clone(), settings.fetch_timeout)?;
    let job = SyncJob::new(Arc::new(source), store.clone()).with_timeout(settings.sync_timeout);

    match cli.command {
        Command::Sync => {
            let report = job.run().await?;
            println!("{}", report.message());
            Ok(())
        }
        Command::Serve { bind } => {
            if let Some(period) = settings.sync_interval {
                tracing::info!(every = ?period, "scheduling country sync");
                tokio::spawn(job.run_every(period));
            }
            if settings.admin_token.is_none() {
                tracing::warn!("ADMIN_TOKEN is not set; create/update/delete are disabled");
            }
            let state = AppState::new(store, settings.admin_token.clone());
            let addr = bind.unwrap_or(settings.bind_addr);
            let listener = TcpListener::bind(&addr).await?;
            tracing::info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, app(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
