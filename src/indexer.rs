//! Indexer database access
//!
//! Reads raw action rows from the public NEAR indexer Postgres database.
//! One parameterless-in-spirit query, filtered server-side to a single
//! receiver account. The whole set is re-fetched each run; incremental
//! since-last-run fetching is a known future requirement.

use crate::errors::IndexerError;
use crate::types::RawActionRow;
use sqlx::postgres::PgPoolOptions;
use sqlx::Row;

const QUERY: &str = "\
SELECT receipts.receipt_id,
       receipts.originated_from_transaction_hash,
       action_receipt_actions.action_kind::text AS action_kind,
       action_receipt_actions.args
FROM receipts
JOIN action_receipt_actions
  ON action_receipt_actions.receipt_id = receipts.receipt_id
WHERE receipts.receiver_account_id = $1";

/// Read-only client for the indexer database.
pub struct IndexerDb {
    pool: sqlx::PgPool,
}

impl IndexerDb {
    /// Connect to the indexer database.
    pub async fn connect(database_url: &str) -> Result<Self, IndexerError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(IndexerError::Connect)?;
        Ok(Self { pool })
    }

    /// Fetch every action row targeting `receiver_account_id`.
    pub async fn fetch_actions(
        &self,
        receiver_account_id: &str,
    ) -> Result<Vec<RawActionRow>, IndexerError> {
        let rows = sqlx::query(QUERY)
            .bind(receiver_account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(IndexerError::Query)?;

        let mut actions = Vec::with_capacity(rows.len());
        for row in rows {
            actions.push(RawActionRow {
                receipt_id: row.try_get("receipt_id").map_err(IndexerError::Query)?,
                tx_id: row
                    .try_get("originated_from_transaction_hash")
                    .map_err(IndexerError::Query)?,
                action_kind: row.try_get("action_kind").map_err(IndexerError::Query)?,
                args: row.try_get("args").map_err(IndexerError::Query)?,
            });
        }

        tracing::info!("fetched {} raw action rows", actions.len());
        Ok(actions)
    }
}
