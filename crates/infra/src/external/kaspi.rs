//! Kaspi shop API (JSON:API flavoured) order source.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::token::TokenProvider;
use super::{Buyer, ExternalEntry, ExternalOrder, ImportWindow, OrderSource, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://kaspi.kz/shop/api/v2";

const JSON_API: &str = "application/vnd.api+json";

/// Client for `GET /orders` and `GET /orders/{id}/entries`.
#[derive(Clone)]
pub struct KaspiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    page_size: u32,
}

impl KaspiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        page_size: u32,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            page_size: page_size.max(1),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("X-Auth-Token", token)
            .header(reqwest::header::ACCEPT, JSON_API)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Auth(format!("{path} returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

impl core::fmt::Debug for KaspiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KaspiClient")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl OrderSource for KaspiClient {
    #[instrument(skip(self), err)]
    async fn fetch_orders(&self, window: ImportWindow) -> Result<Vec<ExternalOrder>, SourceError> {
        let mut orders = Vec::new();
        let mut page_number = 0u32;

        loop {
            let query = [
                ("page[number]", page_number.to_string()),
                ("page[size]", self.page_size.to_string()),
                (
                    "filter[orders][creationDate][$ge]",
                    window.from.timestamp_millis().to_string(),
                ),
                (
                    "filter[orders][creationDate][$le]",
                    window.to.timestamp_millis().to_string(),
                ),
            ];
            let page: Page<OrderAttributes> = self.get("/orders", &query).await?;
            let fetched = page.data.len();
            let page_count = page.meta.as_ref().map(|m| m.page_count).unwrap_or(1);
            orders.extend(page.data.into_iter().map(into_external_order));

            debug!(page_number, fetched, page_count, "fetched orders page");
            page_number += 1;
            if fetched == 0 || page_number >= page_count {
                break;
            }
        }

        Ok(orders)
    }

    #[instrument(skip(self), err)]
    async fn fetch_entries(&self, external_id: &str) -> Result<Vec<ExternalEntry>, SourceError> {
        let page: Page<EntryAttributes> = self
            .get(&format!("/orders/{external_id}/entries"), &[])
            .await?;
        Ok(page
            .data
            .into_iter()
            .map(|resource| into_external_entry(resource.attributes))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<Resource<T>>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    id: String,
    attributes: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    page_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAttributes {
    code: String,
    state: String,
    #[serde(default)]
    total_price: Option<Decimal>,
    #[serde(default)]
    delivery_mode: Option<String>,
    #[serde(default, alias = "user")]
    customer: Option<Customer>,
    #[serde(default)]
    entries: Option<Vec<EntryAttributes>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Customer {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    cell_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryAttributes {
    quantity: i64,
    base_price: Decimal,
    #[serde(default, alias = "offer")]
    product: Option<EntryProduct>,
}

#[derive(Debug, Deserialize)]
struct EntryProduct {
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: Option<String>,
}

fn into_external_order(resource: Resource<OrderAttributes>) -> ExternalOrder {
    let attrs = resource.attributes;
    let buyer = attrs
        .customer
        .map(|c| Buyer {
            first_name: c.first_name,
            last_name: c.last_name,
            phone: c.cell_phone,
        })
        .unwrap_or_default();

    ExternalOrder {
        external_id: resource.id,
        code: attrs.code,
        state: attrs.state,
        total_price: attrs.total_price,
        shipping_mode: attrs.delivery_mode,
        buyer,
        entries: attrs
            .entries
            .map(|entries| entries.into_iter().map(into_external_entry).collect()),
    }
}

fn into_external_entry(attrs: EntryAttributes) -> ExternalEntry {
    let (sku, name) = attrs
        .product
        .map(|p| (p.code, p.name))
        .unwrap_or_default();
    ExternalEntry {
        sku: sku.trim().to_string(),
        name,
        quantity: attrs.quantity,
        unit_price: attrs.base_price,
    }
}
