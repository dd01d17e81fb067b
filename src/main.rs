mod cache;
mod config;
mod error;
mod handlers;
mod models;
mod sheets;
mod store;


use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::SnapshotCache;
use crate::config::{Config, StorageConfig};
use crate::handlers::AppState;
use crate::sheets::{GoogleSheetsClient, MemorySheet, SheetBackend};
use crate::store::{mapping::HEADERS, ContractStore};

async fn open_sheet(storage: &StorageConfig) -> anyhow::Result<Arc<dyn SheetBackend>> {
    match storage {
        StorageConfig::Sheets(sheets) => {
            let credentials = sheets.credentials.load()?;
            let client = GoogleSheetsClient::open(
                &credentials,
                &sheets.spreadsheet_id,
                &sheets.sheet_name,
                &HEADERS,
            )
            .await
            .context("Failed to open spreadsheet")?;
            Ok(Arc::new(client))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage, contracts are lost on restart");
            Ok(Arc::new(MemorySheet::new(&HEADERS)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let sheet = open_sheet(&config.storage).await?;
    let store = ContractStore::new(sheet, SnapshotCache::new(config.cache_ttl));
    let app = handlers::router(AppState::new(store));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Starting contracts server on {}...", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
