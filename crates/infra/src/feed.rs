//! Partner catalog feed (Kaspi XML price list).

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use shopdesk_products::Product;

use crate::config::FeedConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

const SCHEMA_NS: &str = "kaspiShopping";
const SCHEMA_LOCATION: &str = "kaspiShopping http://kaspi.kz/kaspishopping.xsd";

/// Constants stamped into every feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub company: String,
    pub merchant_id: String,
    pub brand: String,
    pub store_id: String,
}

impl From<&FeedConfig> for FeedSettings {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            company: cfg.company.clone(),
            merchant_id: cfg.merchant_id.clone(),
            brand: cfg.brand.clone(),
            store_id: cfg.store_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedGenerator<S> {
    store: S,
    settings: FeedSettings,
}

impl<S: LedgerStore> FeedGenerator<S> {
    pub fn new(store: S, settings: FeedSettings) -> Self {
        Self { store, settings }
    }

    pub async fn render(&self) -> LedgerResult<String> {
        self.render_at(Utc::now()).await
    }

    /// Snapshot every product into one `kaspi_catalog` document.
    #[instrument(skip(self), err)]
    pub async fn render_at(&self, generated_at: DateTime<Utc>) -> LedgerResult<String> {
        let products = self.store.list_products().await?;
        let mut out = String::with_capacity(256 + products.len() * 320);
        write_document(&mut out, &self.settings, &products, generated_at)
            .map_err(|e| LedgerError::Storage(format!("feed rendering failed: {e}")))?;
        debug!(offers = products.len(), bytes = out.len(), "feed rendered");
        Ok(out)
    }
}

fn write_document(
    out: &mut String,
    settings: &FeedSettings,
    products: &[Product],
    generated_at: DateTime<Utc>,
) -> fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
    writeln!(
        out,
        r#"<kaspi_catalog date="{}" xmlns="{SCHEMA_NS}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="{SCHEMA_LOCATION}">"#,
        generated_at.format("%d.%m.%Y %H:%M")
    )?;
    writeln!(out, "  <company>{}</company>", escape(&settings.company))?;
    writeln!(out, "  <merchantid>{}</merchantid>", escape(&settings.merchant_id))?;
    writeln!(out, "  <offers>")?;

    for product in products {
        let available = if product.in_stock() { "yes" } else { "no" };
        writeln!(out, r#"    <offer sku="{}">"#, escape(&product.sku))?;
        writeln!(out, "      <model>{}</model>", escape(&product.name))?;
        writeln!(out, "      <brand>{}</brand>", escape(&settings.brand))?;
        writeln!(out, "      <availabilities>")?;
        writeln!(
            out,
            r#"        <availability storeId="{}" available="{available}"/>"#,
            escape(&settings.store_id)
        )?;
        writeln!(out, "      </availabilities>")?;
        writeln!(out, "      <price>{}</price>", product.price.normalize())?;
        writeln!(out, "    </offer>")?;
    }

    writeln!(out, "  </offers>")?;
    write!(out, "</kaspi_catalog>")
}

/// Escape the five XML special characters; safe for text and attributes.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
