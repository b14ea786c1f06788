use std::sync::Arc;

use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use shopdesk_api::app::{AppServices, router};
use shopdesk_auth::PrincipalId;
use shopdesk_infra::external::{
    Buyer, ExternalEntry, ExternalOrder, ImportWindow, OrderSource, SourceError,
};
use shopdesk_infra::{FeedSettings, InMemoryLedgerStore};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(marketplace: Option<Arc<dyn OrderSource>>) -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let services = AppServices::new(
            Arc::new(InMemoryLedgerStore::new()),
            marketplace,
            feed_settings(),
            1,
        );
        let app = router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn feed_settings() -> FeedSettings {
    FeedSettings {
        company: "Dimmiani".to_string(),
        merchant_id: "M-1".to_string(),
        brand: "Dimmiani".to_string(),
        store_id: "PP1".to_string(),
    }
}

/// Client that sends the gateway principal headers on every request.
fn client_as(role: &str) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "x-principal-id",
        PrincipalId::new().to_string().parse().unwrap(),
    );
    headers.insert("x-principal-role", role.parse().unwrap());
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}

async fn create_product(client: &reqwest::Client, srv: &TestServer, sku: &str, quantity: i64) -> String {
    let res = client
        .post(srv.url("/products"))
        .json(&json!({
            "name": format!("Linen dress {sku} M"),
            "sku": sku,
            "size": null,
            "price": "15990",
            "quantity": quantity,
            "image": null
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["product"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn principal_required_for_protected_endpoints() {
    let srv = TestServer::spawn(None).await;
    let anonymous = reqwest::Client::new();

    let res = anonymous.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = anonymous.get(srv.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = anonymous
        .get(srv.url("/products"))
        .header("x-principal-id", "not-a-uuid")
        .header("x-principal-role", "staff")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stock_lifecycle_create_adjust_reconcile() {
    let srv = TestServer::spawn(None).await;
    let client = client_as("staff");
    let id = create_product(&client, &srv, "LD-1", 10).await;

    for (direction, quantity) in [("OUT", 3), ("IN", 5)] {
        let res = client
            .post(srv.url("/inventory/movements"))
            .json(&json!({ "product_id": id, "direction": direction, "quantity": quantity }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let product: Value = client
        .get(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["quantity"], 12);
    assert_eq!(product["size"], "M");

    let history: Value = client
        .get(srv.url(&format!("/products/{id}/movements")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = history["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["direction"], "IN");
    assert_eq!(items[1]["direction"], "OUT");

    let outbound: Value = client
        .get(srv.url(&format!("/inventory/movements?direction=out&product_id={id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outbound["items"].as_array().unwrap().len(), 1);

    let recon: Value = client
        .get(srv.url(&format!("/products/{id}/reconcile")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recon["consistent"], true);

    let res = client
        .post(srv.url("/inventory/movements"))
        .json(&json!({ "product_id": id, "direction": "OUT", "quantity": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 12);
}

#[tokio::test]
async fn failed_order_leaves_nothing_behind() {
    let srv = TestServer::spawn(None).await;
    let client = client_as("staff");
    let a = create_product(&client, &srv, "A", 5).await;
    let b = create_product(&client, &srv, "B", 5).await;
    let c = create_product(&client, &srv, "C", 1).await;

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "client": { "name": "Madina", "phone": "7001112233" },
            "lines": [
                { "kind": "catalog", "product_id": a, "quantity": 1 },
                { "kind": "catalog", "product_id": b, "quantity": 1 },
                { "kind": "catalog", "product_id": c, "quantity": 2 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["line"], 3);
    assert_eq!(body["product_id"], c.as_str());

    let orders: Value = client.get(srv.url("/orders")).send().await.unwrap().json().await.unwrap();
    assert!(orders["items"].as_array().unwrap().is_empty());

    let product: Value = client
        .get(srv.url(&format!("/products/{a}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["quantity"], 5);
}

#[tokio::test]
async fn order_lifecycle_and_status_machine() {
    let srv = TestServer::spawn(None).await;
    let client = client_as("staff");
    let a = create_product(&client, &srv, "A", 3).await;

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "shipping_method": "courier",
            "lines": [
                { "kind": "catalog", "product_id": a, "quantity": 2 },
                { "kind": "custom", "name": "Gift wrap", "price": "500", "size": null, "image": null, "quantity": 1 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["lines"][1]["sku"], "CUSTOM");

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/status")))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url(&format!("/orders/{order_id}/status")))
        .json(&json!({ "status": "PENDING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let shipped: Value = client
        .get(srv.url("/orders?status=SHIPPED"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shipped["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url(&format!("/orders/{}", shopdesk_core::OrderId::new())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_is_public_xml() {
    let srv = TestServer::spawn(None).await;
    let client = client_as("staff");
    create_product(&client, &srv, "F&1", 2).await;

    let res = reqwest::get(srv.url("/marketplace/kaspi/feed.xml")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/xml"));
    let xml = res.text().await.unwrap();
    assert!(xml.contains(r#"<offer sku="F&amp;1">"#));
    assert!(xml.contains(r#"available="yes""#));
}

struct OneOrderSource;

#[async_trait::async_trait]
impl OrderSource for OneOrderSource {
    async fn fetch_orders(&self, _window: ImportWindow) -> Result<Vec<ExternalOrder>, SourceError> {
        Ok(vec![ExternalOrder {
            external_id: "KX-1".to_string(),
            code: "100200".to_string(),
            state: "NEW".to_string(),
            total_price: Some(dec!(15990)),
            shipping_mode: Some("DELIVERY_LOCAL".to_string()),
            buyer: Buyer {
                first_name: Some("Aliya".to_string()),
                last_name: None,
                phone: None,
            },
            entries: Some(vec![ExternalEntry {
                sku: "K-SKU".to_string(),
                name: Some("Linen dress".to_string()),
                quantity: 1,
                unit_price: dec!(15990),
            }]),
        }])
    }

    async fn fetch_entries(&self, _external_id: &str) -> Result<Vec<ExternalEntry>, SourceError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn marketplace_sync_requires_admin_and_is_idempotent() {
    let srv = TestServer::spawn(Some(Arc::new(OneOrderSource))).await;
    let staff = client_as("staff");
    let admin = client_as("admin");
    let id = create_product(&staff, &srv, "K-SKU", 2).await;

    let res = staff.post(srv.url("/marketplace/kaspi/sync")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let first: Value = admin
        .post(srv.url("/marketplace/kaspi/sync?days=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["imported"].as_array().unwrap().len(), 1);

    let second: Value = admin
        .post(srv.url("/marketplace/kaspi/sync"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(second["imported"].as_array().unwrap().is_empty());
    assert_eq!(second["skipped_existing"], json!(["KX-1"]));

    let product: Value = staff
        .get(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["quantity"], 1);
}

#[tokio::test]
async fn sync_without_marketplace_is_bad_gateway() {
    let srv = TestServer::spawn(None).await;
    let res = client_as("admin")
        .post(srv.url("/marketplace/kaspi/sync"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test]
async fn sync_window_past_the_calendar_is_bad_request() {
    let srv = TestServer::spawn(Some(Arc::new(OneOrderSource))).await;
    let res = client_as("admin")
        .post(srv.url("/marketplace/kaspi/sync?days=4294967295"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn oversized_custom_line_is_rejected() {
    let srv = TestServer::spawn(None).await;
    let res = client_as("staff")
        .post(srv.url("/orders"))
        .json(&json!({
            "lines": [
                { "kind": "custom", "name": "Vault", "price": "79228162514264337593543950335", "quantity": 2 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
