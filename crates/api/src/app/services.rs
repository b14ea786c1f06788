//! Service wiring: one store shared by every service the routes call.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use shopdesk_infra::config::AppConfig;
use shopdesk_infra::external::{ImportWindow, KaspiClient, OrderSource, StaticToken, TokenProvider};
use shopdesk_infra::{
    Catalog, FeedGenerator, FeedSettings, ImportReport, InMemoryLedgerStore, LedgerError,
    LedgerResult, LedgerStore, OrderAssembler, OrderImporter, PostgresLedgerStore, StockLedger,
};

pub type SharedStore = Arc<dyn LedgerStore>;

/// Everything a handler needs, shared behind an `Arc` extension.
pub struct AppServices {
    pub catalog: Catalog<SharedStore>,
    pub ledger: StockLedger<SharedStore>,
    pub orders: OrderAssembler<SharedStore>,
    pub feed: FeedGenerator<SharedStore>,
    importer: Option<OrderImporter<SharedStore>>,
    window_days: u32,
}

impl AppServices {
    pub fn new(
        store: SharedStore,
        marketplace: Option<Arc<dyn OrderSource>>,
        feed: FeedSettings,
        window_days: u32,
    ) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            ledger: StockLedger::new(store.clone()),
            orders: OrderAssembler::new(store.clone()),
            feed: FeedGenerator::new(store.clone(), feed),
            importer: marketplace.map(|source| OrderImporter::new(store, source)),
            window_days,
        }
    }

    /// In-memory store, no marketplace. Used by tests and local runs.
    pub fn in_memory(feed: FeedSettings) -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()), None, feed, 1)
    }

    /// Import orders created in the last `days` days (configured default if `None`).
    pub async fn sync_marketplace(&self, days: Option<u32>) -> LedgerResult<ImportReport> {
        let importer = self
            .importer
            .as_ref()
            .ok_or_else(|| LedgerError::upstream("marketplace credentials are not configured"))?;
        let days = days.unwrap_or(self.window_days).max(1);
        let window = ImportWindow::last_days(days, Utc::now()).ok_or_else(|| {
            LedgerError::invalid_input(format!("sync window of {days} days is out of range"))
        })?;
        importer.import_batch(window).await
    }
}

/// Build services from configuration: Postgres when `database.url` is set,
/// the in-memory store otherwise; the Kaspi client when a token is set.
pub async fn build_services(cfg: &AppConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match &cfg.database.url {
        Some(url) => {
            let store = PostgresLedgerStore::connect(
                url,
                cfg.database.max_connections,
                cfg.database.lock_timeout(),
            )
            .await
            .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to run migrations")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("database.url not set; using the in-memory store");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    let marketplace: Option<Arc<dyn OrderSource>> = match cfg.kaspi.token.as_deref() {
        Some(token) if !token.trim().is_empty() => {
            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .context("failed to build HTTP client")?;
            let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken::new(token));
            Some(Arc::new(KaspiClient::new(
                http,
                cfg.kaspi.base_url.clone(),
                tokens,
                cfg.kaspi.page_size,
            )))
        }
        _ => {
            tracing::warn!("kaspi.token not set; marketplace sync disabled");
            None
        }
    };

    Ok(AppServices::new(
        store,
        marketplace,
        FeedSettings::from(&cfg.feed),
        cfg.kaspi.window_days,
    ))
}
