use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Row-based mutex serializing reconciliation runs across processes.
pub struct RunLock {
    pool: SqlitePool,
    name: String,
    holder: String,
    stale_after: Duration,
}

/// Proof that the lock is held. Release it explicitly; there is no async drop.
#[must_use = "a held run lock must be released"]
pub struct RunLockGuard {
    pool: SqlitePool,
    name: String,
    holder: String,
}

impl RunLock {
    pub fn new(pool: SqlitePool, name: &str, holder: &str, stale_after_secs: u64) -> Self {
        Self {
            pool,
            name: name.to_string(),
            holder: holder.to_string(),
            stale_after: Duration::seconds(stale_after_secs.min(i64::MAX as u64 / 1_000) as i64),
        }
    }

    pub async fn acquire(&self) -> Result<RunLockGuard> {
        self.acquire_at(Utc::now()).await
    }

    async fn acquire_at(&self, now: DateTime<Utc>) -> Result<RunLockGuard> {
        let taken = sqlx::query(
            "INSERT INTO run_locks (name, holder, acquired_at) VALUES (?, ?, ?) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&self.name)
        .bind(&self.holder)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        if !taken {
            let (holder, since): (String, String) =
                sqlx::query_as("SELECT holder, acquired_at FROM run_locks WHERE name = ?")
                    .bind(&self.name)
                    .fetch_one(&self.pool)
                    .await?;

            let stale = DateTime::parse_from_rfc3339(&since)
                .map(|t| now.signed_duration_since(t.with_timezone(&Utc)) > self.stale_after)
                .unwrap_or(true);
            if !stale {
                return Err(AppError::RunInProgress { holder, since });
            }

            // Conditional on the old stamp so two takers cannot both win.
            let replaced = sqlx::query(
                "UPDATE run_locks SET holder = ?, acquired_at = ? WHERE name = ? AND acquired_at = ?",
            )
            .bind(&self.holder)
            .bind(now.to_rfc3339())
            .bind(&self.name)
            .bind(&since)
            .execute(&self.pool)
            .await?
            .rows_affected();
            if replaced == 0 {
                return Err(AppError::RunInProgress { holder, since });
            }
            warn!(lock = %self.name, previous_holder = %holder, since = %since, "Took over stale run lock");
        }

        info!(lock = %self.name, holder = %self.holder, "Run lock acquired");
        Ok(RunLockGuard {
            pool: self.pool.clone(),
            name: self.name.clone(),
            holder: self.holder.clone(),
        })
    }
}

impl RunLockGuard {
    pub async fn release(self) -> Result<()> {
        let done = sqlx::query("DELETE FROM run_locks WHERE name = ? AND holder = ?")
            .bind(&self.name)
            .bind(&self.holder)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            warn!(lock = %self.name, holder = %self.holder, "Run lock was already gone at release");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn second_holder_is_refused_until_release() {
        let pool = test_pool().await;
        let a = RunLock::new(pool.clone(), "reconcile", "a", 3_600);
        let b = RunLock::new(pool.clone(), "reconcile", "b", 3_600);

        let guard = a.acquire().await.unwrap();
        match b.acquire().await {
            Err(AppError::RunInProgress { holder, .. }) => assert_eq!(holder, "a"),
            other => panic!("expected RunInProgress, got {:?}", other.map(|_| ())),
        }

        guard.release().await.unwrap();
        b.acquire().await.unwrap().release().await.unwrap();
    }

    #[tokio::test]
    async fn stale_lock_is_taken_over() {
        let pool = test_pool().await;
        let a = RunLock::new(pool.clone(), "reconcile", "a", 60);
        let b = RunLock::new(pool.clone(), "reconcile", "b", 60);

        let now = Utc::now();
        let _abandoned = a.acquire_at(now - Duration::seconds(120)).await.unwrap();
        let guard = b.acquire_at(now).await.unwrap();

        let holder: String = sqlx::query_scalar("SELECT holder FROM run_locks WHERE name = 'reconcile'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(holder, "b");
        guard.release().await.unwrap();
    }
}
