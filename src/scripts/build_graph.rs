use anyhow::{Context, Result};
use digital_library_api::{
    config::Config,
    services::{BuildReport, RelationBuilder},
    storage::{BookFilter, CatalogStore, PgCatalogStore},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn rebuild_similarity_graph() -> Result<BuildReport> {
    info!("Starting similarity graph rebuild...");

    let config = Config::load().context("Failed to load configuration")?;
    let database_url = config
        .database_url
        .as_deref()
        .context("APP_DATABASE_URL must be set to rebuild the similarity graph")?;

    info!("Connecting to PostgreSQL...");
    let store = PgCatalogStore::connect(database_url, config.database_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store
        .ensure_schema()
        .await
        .context("Failed to prepare database schema")?;
    let store: Arc<dyn CatalogStore> = Arc::new(store);

    let books = store
        .list_entries(&BookFilter::all())
        .await
        .context("Failed to load catalog")?;
    info!("Loaded {} books", books.len());

    let builder = RelationBuilder::new(store);
    let progress = ProgressBar::new(books.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );

    let mut report = BuildReport::default();
    for (i, book) in books.iter().enumerate() {
        report.merge(builder.link_entry(book, &books[i + 1..]).await);
        progress.set_message(format!("{} edges", report.created));
        progress.inc(1);
    }
    progress.finish_with_message(format!("{} edges created", report.created));

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rebuild_graph=info,digital_library_api=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .init();

    dotenv::dotenv().ok();

    info!("Similarity Graph Builder");
    info!("========================");

    match rebuild_similarity_graph().await {
        Ok(report) => {
            info!(
                "Graph rebuild complete: {} pairs compared, {} created, {} already linked, {} failed",
                report.compared, report.created, report.existing, report.failed
            );
            Ok(())
        }
        Err(e) => {
            error!("Graph rebuild failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
