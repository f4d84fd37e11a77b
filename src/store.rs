//! Read-only access to the booking transaction store.
use crate::aggregation::{aggregate_clients, AggregationOutcome};
use crate::errors::{AppError, ResultExt};
use crate::models::TransactionRecord;
use async_trait::async_trait;
use sqlx::PgPool;

/// Source of historical transaction records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All records, oldest first.
    async fn load_records(&self) -> Result<Vec<TransactionRecord>, AppError>;
}

/// Rebuilds every client profile from the store.
///
/// Re-reads the whole store on every call; there is no cache or index.
pub async fn load_client_profiles(store: &dyn TransactionStore) -> Result<AggregationOutcome, AppError> {
    let records = store
        .load_records()
        .await
        .context("loading transaction records")?;
    Ok(aggregate_clients(&records))
}

/// Postgres-backed store reading the `service_orders` table.
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn load_records(&self) -> Result<Vec<TransactionRecord>, AppError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT
                client_id, customer_name AS name, phone, email,
                address, street, postal_code, city,
                order_ref, created_at AS order_date,
                device_type, brand, status, problem_description AS problem
            FROM service_orders
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("Database error loading service orders: {:?}", e))
        .context("loading service orders")?;

        tracing::debug!("Loaded {} transaction record(s)", records.len());
        Ok(records)
    }
}

/// Store over a fixed list of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionStore {
    records: Vec<TransactionRecord>,
}

impl InMemoryTransactionStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn load_records(&self) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.records.clone())
    }
}
