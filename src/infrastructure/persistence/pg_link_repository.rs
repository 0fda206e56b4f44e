//! PostgreSQL implementation of link repository.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Row};

use crate::domain::entities::{Link, NewLink, OwnerId, SaveOutcome, Statistics};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Default bound on a single database operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(1000);

/// PostgreSQL repository for link storage and retrieval.
///
/// Uniqueness of `full_url` and `short_url` is enforced by the schema, so concurrent
/// saves of the same URL need no in-process locking. Every call is bounded by
/// `operation_timeout`; hitting it surfaces as [`AppError::Internal`].
#[derive(Clone)]
pub struct PgLinkRepository {
    pool: PgPool,
    operation_timeout: Duration,
}

impl PgLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_OPERATION_TIMEOUT)
    }

    pub fn with_timeout(pool: PgPool, operation_timeout: Duration) -> Self {
        Self {
            pool,
            operation_timeout,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(AppError::internal(
                    "Database operation timed out",
                    json!({ "operation": operation }),
                ))
            }
        }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn save(
        &self,
        code: &str,
        original_url: &str,
        owner_id: &OwnerId,
    ) -> Result<SaveOutcome, AppError> {
        let result = self
            .bounded(
                "save",
                sqlx::query(
                    r#"
                    INSERT INTO shortener (short_url, full_url, user_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (full_url) DO NOTHING
                    "#,
                )
                .bind(code)
                .bind(original_url)
                .bind(owner_id.as_str())
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            Ok(SaveOutcome::Duplicate)
        } else {
            Ok(SaveOutcome::Created)
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = self
            .bounded(
                "find_by_code",
                sqlx::query(
                    r#"
                    SELECT short_url, full_url, user_id, is_deleted
                    FROM shortener
                    WHERE short_url = $1
                    "#,
                )
                .bind(code)
                .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|r| link_from_row(&r)).transpose()
    }

    async fn find_all_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Link>, AppError> {
        let rows = self
            .bounded(
                "find_all_by_owner",
                sqlx::query(
                    r#"
                    SELECT short_url, full_url, user_id, is_deleted
                    FROM shortener
                    WHERE user_id = $1 AND is_deleted = false
                    ORDER BY short_url
                    "#,
                )
                .bind(owner_id.as_str())
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(link_from_row).collect()
    }

    async fn save_batch(&self, links: &[NewLink], owner_id: &OwnerId) -> Result<(), AppError> {
        let insert_all = async {
            let mut tx = self.pool.begin().await?;

            for link in links {
                sqlx::query(
                    r#"
                    INSERT INTO shortener (short_url, full_url, user_id)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(&link.code)
                .bind(&link.original_url)
                .bind(owner_id.as_str())
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await
        };

        // A dropped transaction rolls back, so a timeout also leaves nothing behind.
        self.bounded("save_batch", insert_all).await
    }

    async fn soft_delete(&self, codes: &[String], owner_id: &OwnerId) -> Result<u64, AppError> {
        if codes.is_empty() {
            return Ok(0);
        }

        let result = self
            .bounded(
                "soft_delete",
                sqlx::query(
                    r#"
                    UPDATE shortener
                    SET is_deleted = true
                    WHERE user_id = $1 AND short_url = ANY($2) AND is_deleted = false
                    "#,
                )
                .bind(owner_id.as_str())
                .bind(codes.to_vec())
                .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.bounded("ping", sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }

    async fn collect_stats(&self) -> Result<Statistics, AppError> {
        let row = self
            .bounded(
                "collect_stats",
                sqlx::query(
                    r#"
                    SELECT COUNT(DISTINCT full_url) AS urls, COUNT(DISTINCT user_id) AS users
                    FROM shortener
                    "#,
                )
                .fetch_one(&self.pool),
            )
            .await?;

        Ok(Statistics {
            urls: row.try_get("urls")?,
            users: row.try_get("users")?,
        })
    }
}

fn link_from_row(row: &sqlx::postgres::PgRow) -> Result<Link, AppError> {
    Ok(Link {
        code: row.try_get("short_url")?,
        original_url: row.try_get("full_url")?,
        owner_id: OwnerId::new(row.try_get::<String, _>("user_id")?),
        is_deleted: row.try_get("is_deleted")?,
    })
}
