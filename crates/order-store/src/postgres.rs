use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{AuditInfo, Money, NewOrder, Order, OrderStatus, Version};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderRepository, RepositoryError, Result};

const ORDER_COLUMNS: &str = "id, book_isbn, book_name, book_price_cents, quantity, status, \
     version, created_by, last_modified_by, created_date, last_modified_date";

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id = OrderId::new(row.try_get("id")?);
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::CorruptRow(format!("order {id}: {e}")))?;

        let order = Order {
            id,
            book_isbn: row.try_get("book_isbn")?,
            book_name: row.try_get("book_name")?,
            book_price: row
                .try_get::<Option<i64>, _>("book_price_cents")?
                .map(Money::from_cents),
            quantity: row.try_get("quantity")?,
            status,
            version: Version::new(row.try_get("version")?),
            audit: AuditInfo {
                created_date: row.try_get::<DateTime<Utc>, _>("created_date")?,
                last_modified_date: row.try_get::<DateTime<Utc>, _>("last_modified_date")?,
                created_by: row
                    .try_get::<Option<String>, _>("created_by")?
                    .map(UserId::new),
                last_modified_by: row
                    .try_get::<Option<String>, _>("last_modified_by")?
                    .map(UserId::new),
            },
        };

        if !order.has_consistent_snapshot() {
            return Err(RepositoryError::CorruptRow(format!(
                "order {id}: book snapshot does not match status {}",
                order.status
            )));
        }
        Ok(order)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, order), fields(isbn = %order.book_isbn, status = %order.status))]
    async fn insert(&self, order: NewOrder, identity: Option<&UserId>) -> Result<Order> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (book_isbn, book_name, book_price_cents, quantity, status,
                                version, created_by, last_modified_by, created_date, last_modified_date)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $6, $7, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order.book_isbn)
        .bind(&order.book_name)
        .bind(order.book_price.map(|p| p.cents()))
        .bind(order.quantity)
        .bind(order.status.as_str())
        .bind(identity.map(UserId::as_str))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_order).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_all_by_creator(&self, user: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE created_by = $1 ORDER BY id ASC"
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, version = %order.version))]
    async fn update(&self, order: &Order, identity: Option<&UserId>) -> Result<Order> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = $3,
                version = version + 1,
                last_modified_date = $4,
                last_modified_by = COALESCE($5, last_modified_by)
            WHERE id = $1 AND version = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.id.as_i64())
        .bind(order.version.as_i64())
        .bind(order.status.as_str())
        .bind(Utc::now())
        .bind(identity.map(UserId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(row);
        }

        // Nothing matched: either the row is gone or its version moved on.
        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            Some(actual) => Err(RepositoryError::Conflict {
                order_id: order.id,
                expected: order.version,
                actual: Version::new(actual),
            }),
            None => Err(RepositoryError::NotFound(order.id)),
        }
    }
}
