//! Postgres-backed catalog, ledger and order store.
//!
//! Every write runs in one transaction. Stock-touching writes lock the affected
//! `products` rows with `SELECT … FOR UPDATE` in id order (so two batches that
//! share products cannot deadlock), plan the batch against the locked
//! quantities, then update the rows and append the movements before commit. A
//! concurrent writer on the same product waits on the row lock and re-reads the
//! committed quantity.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | StoreError | Scenario |
//! |-----------------|------------|----------|
//! | `23505` | `DuplicateSku` / `DuplicateExternalId` (at insert sites), else `Domain(Conflict)` | unique violation |
//! | `23514` | `Domain(InvariantViolation)` | check constraint (e.g. negative quantity) |
//! | `22003`, `22P02`, `23503` | `Domain(Validation)` | numeric overflow, malformed value, dangling reference |
//! | `55P03` | `LockTimeout` | `lock_timeout` expired waiting for a row lock |
//! | `40001`, `40P01` | `LockTimeout` | serialization failure / deadlock abort |
//! | other | `Backend` | anything else, including pool and network failures |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::{Span, info, instrument};
use uuid::Uuid;

use shopdesk_auth::PrincipalId;
use shopdesk_core::{DomainError, OrderId, ProductId};
use shopdesk_inventory::{Direction, Movement, MovementFilter, StockAdjustment, lock_order, plan_batch};
use shopdesk_products::{Product, ProductPatch};
use shopdesk_sales::{ClientInfo, Order, OrderLine, OrderStatus};

use super::{CreatedProduct, LedgerStore, StoreError, StoreResult};

const PRODUCT_COLUMNS: &str =
    "id, name, sku, size, price, quantity, image, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, external_id, external_code, source, shipping_method, \
     shipping_city_code, status, client_name, \
     client_phone, client_city, client_street, client_building, client_flat, client_note, \
     total, created_by, created_at";

/// Postgres-backed [`LedgerStore`].
///
/// `Send + Sync` and cheap to clone; all operations go through the SQLx pool.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
    lock_timeout: Duration,
}

impl PostgresLedgerStore {
    /// Wrap an existing pool. `lock_timeout` bounds how long a transaction
    /// waits for a product row lock.
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            lock_timeout,
        }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        info!(max_connections, "connected to PostgreSQL");
        Ok(Self::new(pool, lock_timeout))
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
        info!("database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        Ok(tx)
    }

    async fn load_lines(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderLine>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT order_id, line_no, product_id, name, sku, size, image, unit_price, quantity
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(order_ids.to_vec())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_lines", e))?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id").map_err(decode_error)?;
            lines
                .entry(order_id)
                .or_default()
                .push(line_from_row(&row).map_err(decode_error)?);
        }
        Ok(lines)
    }

    async fn hydrate_orders(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_error)?;
        let mut lines = self.load_lines(&ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(decode_error)?;
                order_from_row(row, lines.remove(&id).unwrap_or_default()).map_err(decode_error)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, product), fields(product_id = %product.id, sku = %product.sku), err)]
    async fn create_product(
        &self,
        mut product: Product,
        opening: i64,
        actor: Option<PrincipalId>,
    ) -> StoreResult<CreatedProduct> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, size, price, quantity, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.size)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateSku(product.sku.clone())
            } else {
                map_sqlx_error("insert_product", e)
            }
        })?;

        let opening = if opening > 0 {
            let mut movements = apply_batch(
                &mut tx,
                &[StockAdjustment::inbound(product.id, opening)],
                actor,
                product.created_at,
            )
            .await?;
            product.quantity = opening;
            movements.pop()
        } else {
            None
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(CreatedProduct { product, opening })
    }

    #[instrument(skip(self, patch), err)]
    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut tx = self.begin().await?;
        let mut product = lock_product(&mut tx, id).await?;
        product.apply_patch(patch, at);
        write_metadata(&mut tx, &product).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self, patch), err)]
    async fn restock_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        quantity: i64,
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<(Product, Movement)> {
        let mut tx = self.begin().await?;

        let mut movements =
            apply_batch(&mut tx, &[StockAdjustment::inbound(id, quantity)], actor, at).await?;
        let movement = movements
            .pop()
            .ok_or_else(|| StoreError::Backend("restock produced no movement".to_string()))?;

        let mut product = lock_product(&mut tx, id).await?;
        product.apply_patch(patch, at);
        write_metadata(&mut tx, &product).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok((product, movement))
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_product", e))?;
        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(decode_error)
    }

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"))
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_product_by_sku", e))?;
        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(decode_error)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC, id DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter()
            .map(product_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_error)
    }

    #[instrument(
        skip(self, batch),
        fields(batch_len = batch.len(), committed_movements = tracing::field::Empty),
        err
    )]
    async fn apply_movements(
        &self,
        batch: &[StockAdjustment],
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<Movement>> {
        let mut tx = self.begin().await?;
        let movements = apply_batch(&mut tx, batch, actor, at).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Span::current().record("committed_movements", movements.len());
        Ok(movements)
    }

    #[instrument(
        skip(self, order, batch),
        fields(order_id = %order.id, external_id = ?order.external_id, lines = order.lines.len()),
        err
    )]
    async fn place_order(
        &self,
        order: &Order,
        batch: &[StockAdjustment],
    ) -> StoreResult<Vec<Movement>> {
        let mut tx = self.begin().await?;

        // Insert the order first so a duplicate external id aborts before any
        // product row is locked.
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, external_id, external_code, source, shipping_method,
                shipping_city_code, status,
                client_name, client_phone, client_city, client_street,
                client_building, client_flat, client_note,
                total, created_by, created_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
            )
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.external_id)
        .bind(&order.external_code)
        .bind(order.source.as_str())
        .bind(&order.shipping_method)
        .bind(&order.shipping_city_code)
        .bind(order.status.as_str())
        .bind(&order.client.name)
        .bind(&order.client.phone)
        .bind(&order.client.city)
        .bind(&order.client.street)
        .bind(&order.client.building)
        .bind(&order.client.flat)
        .bind(&order.client.note)
        .bind(order.total)
        .bind(order.created_by.map(Uuid::from))
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &order.external_id {
            Some(external_id) if is_unique_violation(&e) => {
                StoreError::DuplicateExternalId(external_id.clone())
            }
            _ => map_sqlx_error("insert_order", e),
        })?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    order_id, line_no, product_id, name, sku, size, image, unit_price, quantity
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line.line_no as i32)
            .bind(line.product_id.map(Uuid::from))
            .bind(&line.name)
            .bind(&line.sku)
            .bind(&line.size)
            .bind(&line.image)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        let movements = apply_batch(&mut tx, batch, order.created_by, order.created_at).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(movements)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_order", e))?;
        match row {
            Some(row) => Ok(self.hydrate_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn order_by_external_id(&self, external_id: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_by_external_id", e))?;
        match row {
            Some(row) => Ok(self.hydrate_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY seq DESC"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;
        self.hydrate_orders(rows).await
    }

    #[instrument(skip(self), err)]
    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Order> {
        let updated = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;

        let order = self.order(id).await?.ok_or(StoreError::OrderNotFound(id))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                found: order.status,
            });
        }
        Ok(order)
    }

    async fn movements(&self, filter: &MovementFilter) -> StoreResult<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, direction, quantity, actor, occurred_at
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::text IS NULL OR direction = $2)
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.direction.map(|d| d.as_str()))
        .bind(filter.effective_limit() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.iter()
            .map(movement_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_error)
    }

    async fn ledger_balance(&self, product_id: ProductId) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(
                SUM(CASE WHEN direction = 'IN' THEN quantity ELSE -quantity END),
                0
            )::BIGINT AS balance
            FROM stock_movements
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger_balance", e))?;
        row.try_get("balance").map_err(decode_error)
    }
}

/// Lock the batch's product rows in id order, plan, then write levels and movements.
async fn apply_batch(
    tx: &mut Transaction<'_, Postgres>,
    batch: &[StockAdjustment],
    actor: Option<PrincipalId>,
    at: DateTime<Utc>,
) -> StoreResult<Vec<Movement>> {
    let ids: Vec<Uuid> = lock_order(batch).into_iter().map(Uuid::from).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        "SELECT id, quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_products", e))?;

    let mut levels = HashMap::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.try_get("id").map_err(decode_error)?;
        let quantity: i64 = row.try_get("quantity").map_err(decode_error)?;
        levels.insert(ProductId::from_uuid(id), quantity);
    }

    let plan = plan_batch(&levels, batch).map_err(StoreError::Rejected)?;

    for (product_id, level) in &plan.levels {
        sqlx::query("UPDATE products SET quantity = $2, updated_at = $3 WHERE id = $1")
            .bind(product_id.as_uuid())
            .bind(*level)
            .bind(at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("update_quantity", e))?;
    }

    let mut movements = Vec::with_capacity(plan.movements.len());
    for planned in &plan.movements {
        let movement = Movement::record(&planned.adjustment, actor, at);
        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, product_id, direction, quantity, actor, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.product_id.as_uuid())
        .bind(movement.direction.as_str())
        .bind(movement.quantity)
        .bind(movement.actor.map(Uuid::from))
        .bind(movement.occurred_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;
        movements.push(movement);
    }

    Ok(movements)
}

async fn lock_product(tx: &mut Transaction<'_, Postgres>, id: ProductId) -> StoreResult<Product> {
    let row = sqlx::query(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_product", e))?
    .ok_or(StoreError::ProductNotFound(id))?;
    product_from_row(&row).map_err(decode_error)
}

async fn write_metadata(tx: &mut Transaction<'_, Postgres>, product: &Product) -> StoreResult<()> {
    sqlx::query(
        r#"
        UPDATE products
        SET name = $2, size = $3, price = $4, image = $5, updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(product.id.as_uuid())
    .bind(&product.name)
    .bind(&product.size)
    .bind(product.price)
    .bind(&product.image)
    .bind(product.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("update_product", e))?;
    Ok(())
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        size: row.try_get("size")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn movement_from_row(row: &PgRow) -> Result<Movement, sqlx::Error> {
    let direction: String = row.try_get("direction")?;
    let actor: Option<Uuid> = row.try_get("actor")?;
    Ok(Movement {
        id: shopdesk_core::MovementId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        direction: direction
            .parse::<Direction>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        quantity: row.try_get("quantity")?,
        actor: actor.map(PrincipalId::from_uuid),
        occurred_at: row.try_get("occurred_at")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, sqlx::Error> {
    let line_no: i32 = row.try_get("line_no")?;
    let product_id: Option<Uuid> = row.try_get("product_id")?;
    Ok(OrderLine {
        line_no: u32::try_from(line_no).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        product_id: product_id.map(ProductId::from_uuid),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        size: row.try_get("size")?,
        image: row.try_get("image")?,
        unit_price: row.try_get("unit_price")?,
        quantity: row.try_get("quantity")?,
    })
}

fn order_from_row(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order, sqlx::Error> {
    let source: String = row.try_get("source")?;
    let status: String = row.try_get("status")?;
    let created_by: Option<Uuid> = row.try_get("created_by")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        external_id: row.try_get("external_id")?,
        external_code: row.try_get("external_code")?,
        source: source.parse().map_err(|e: DomainError| sqlx::Error::Decode(Box::new(e)))?,
        shipping_method: row.try_get("shipping_method")?,
        shipping_city_code: row.try_get("shipping_city_code")?,
        status: status.parse().map_err(|e: DomainError| sqlx::Error::Decode(Box::new(e)))?,
        client: ClientInfo {
            name: row.try_get("client_name")?,
            phone: row.try_get("client_phone")?,
            city: row.try_get("client_city")?,
            street: row.try_get("client_street")?,
            building: row.try_get("client_building")?,
            flat: row.try_get("client_flat")?,
            note: row.try_get("client_note")?,
        },
        total: row.try_get("total")?,
        created_by: created_by.map(PrincipalId::from_uuid),
        created_at: row.try_get("created_at")?,
        lines,
    })
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {err}"))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            map_sqlstate(db_err.code().as_deref(), msg)
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("timed out acquiring connection in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Classify a database error by SQLSTATE. Data errors caused by one request's
/// values are validation failures, not outages.
fn map_sqlstate(code: Option<&str>, msg: String) -> StoreError {
    match code {
        Some("23505") => StoreError::Domain(DomainError::conflict(msg)),
        Some("23514") => StoreError::Domain(DomainError::invariant(msg)),
        // numeric overflow, bad text representation, foreign key violation
        Some("22003") | Some("22P02") | Some("23503") => {
            StoreError::Domain(DomainError::validation(msg))
        }
        Some("55P03") | Some("40001") | Some("40P01") => StoreError::LockTimeout(msg),
        _ => StoreError::Backend(msg),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
