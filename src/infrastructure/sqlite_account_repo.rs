use crate::domain::account::{Account, Caller, PaymentRecord};
use crate::domain::account_repository::{AccountRepository, PaymentLedger, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub struct SqliteAccountRepo {
    pub pool: SqlitePool,
    trial_credits: i64,
}

impl SqliteAccountRepo {
    pub fn new(pool: SqlitePool, trial_credits: i64) -> Self {
        Self {
            pool,
            trial_credits,
        }
    }

    pub async fn open(path: &str, trial_credits: i64) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{}?mode=rwc", path))
            .await?;

        let repo = Self::new(pool, trial_credits);
        repo.migrate().await?;
        Ok(repo)
    }

    // Каждое соединение с :memory: видит свою базу, поэтому ровно одно и без таймаутов
    pub async fn in_memory(trial_credits: i64) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self::new(pool, trial_credits);
        repo.migrate().await?;
        Ok(repo)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER UNIQUE NOT NULL,
                username TEXT,
                display_name TEXT,
                secondary_name TEXT,
                credits INTEGER NOT NULL CHECK (typeof(credits) = 'integer' AND credits >= 0),
                created_at TEXT NOT NULL,
                last_access_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts (id),
                amount_paid INTEGER NOT NULL CHECK (amount_paid > 0),
                credits_granted INTEGER NOT NULL CHECK (credits_granted > 0),
                recorded_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_account_id ON payments (account_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Пополнение не затронуло ни одной строки: аккаунта нет или баланс переполнится
    async fn explain_missed_top_up(&self, account_id: i64, delta: i64) -> StoreError {
        match self.find_by_id(account_id).await {
            Ok(Some(_)) => StoreError::CreditOverflow(delta),
            Ok(None) => StoreError::AccountNotFound,
            Err(e) => e,
        }
    }

    async fn find_by_id(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, external_id, username, display_name, secondary_name, credits, created_at, last_access_at
             FROM accounts WHERE id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }
}

// Третий параметр = i64::MAX - delta: сумма не должна уйти в REAL
const CREDIT_TOP_UP_SQL: &str =
    "UPDATE accounts SET credits = credits + ? WHERE id = ? AND credits <= ?";

fn ensure_positive(amount: i64) -> Result<(), StoreError> {
    if amount <= 0 {
        return Err(StoreError::InvalidAmount(amount));
    }
    Ok(())
}

#[async_trait]
impl AccountRepository for SqliteAccountRepo {
    async fn find(&self, external_id: i64) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, external_id, username, display_name, secondary_name, credits, created_at, last_access_at
             FROM accounts WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn create(&self, caller: &Caller) -> Result<Account, StoreError> {
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO accounts (external_id, username, display_name, secondary_name, credits, created_at, last_access_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(caller.external_id)
        .bind(&caller.username)
        .bind(&caller.first_name)
        .bind(&caller.last_name)
        .bind(self.trial_credits)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        let id = match inserted {
            Ok(res) => res.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::DuplicateIdentity(caller.external_id));
            }
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Создан аккаунт {} для external_id={}",
            id,
            caller.external_id
        );

        self.find_by_id(id).await?.ok_or(StoreError::AccountNotFound)
    }

    async fn consume_one(&self, account_id: i64) -> Result<bool, StoreError> {
        let res =
            sqlx::query("UPDATE accounts SET credits = credits - 1 WHERE id = ? AND credits > 0")
                .bind(account_id)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_credits(&self, account_id: i64, delta: i64) -> Result<(), StoreError> {
        ensure_positive(delta)?;
        let res = sqlx::query(CREDIT_TOP_UP_SQL)
            .bind(delta)
            .bind(account_id)
            .bind(i64::MAX - delta)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(self.explain_missed_top_up(account_id, delta).await);
        }
        Ok(())
    }

    async fn touch_access(&self, account_id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE accounts SET last_access_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::AccountNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentLedger for SqliteAccountRepo {
    async fn record(
        &self,
        account_id: i64,
        amount_paid: i64,
        credits_granted: i64,
    ) -> Result<i64, StoreError> {
        ensure_positive(amount_paid)?;
        ensure_positive(credits_granted)?;

        let res = sqlx::query(
            "INSERT INTO payments (account_id, amount_paid, credits_granted, recorded_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(amount_paid)
        .bind(credits_granted)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match res {
            Ok(res) => Ok(res.last_insert_rowid()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(StoreError::AccountNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn records_for_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let records = sqlx::query_as::<_, PaymentRecord>(
            "SELECT id, account_id, amount_paid, credits_granted, recorded_at
             FROM payments WHERE account_id = ? ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn settle_top_up(
        &self,
        account_id: i64,
        amount_paid: i64,
        credits_granted: i64,
    ) -> Result<PaymentRecord, StoreError> {
        ensure_positive(amount_paid)?;
        ensure_positive(credits_granted)?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(CREDIT_TOP_UP_SQL)
            .bind(credits_granted)
            .bind(account_id)
            .bind(i64::MAX - credits_granted)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            // соединение из tx нужно вернуть в пул до повторного чтения
            tx.rollback().await?;
            return Err(self.explain_missed_top_up(account_id, credits_granted).await);
        }

        let recorded_at = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO payments (account_id, amount_paid, credits_granted, recorded_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(amount_paid)
        .bind(credits_granted)
        .bind(recorded_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaymentRecord {
            id: inserted.last_insert_rowid(),
            account_id,
            amount_paid,
            credits_granted,
            recorded_at,
        })
    }
}
