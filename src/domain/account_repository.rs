use crate::domain::account::{Account, Caller, PaymentRecord};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("account for external id {0} already exists")]
    DuplicateIdentity(i64),

    #[error("account not found")]
    AccountNotFound,

    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("balance would overflow when adding {0} credits")]
    CreditOverflow(i64),

    #[error("storage failure: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find(&self, external_id: i64) -> Result<Option<Account>, StoreError>;

    /// Новый аккаунт получает пробный запас кредитов; оба таймстемпа = now.
    async fn create(&self, caller: &Caller) -> Result<Account, StoreError>;

    /// Списывает один кредит только если баланс > 0. Одна атомарная операция.
    async fn consume_one(&self, account_id: i64) -> Result<bool, StoreError>;

    async fn add_credits(&self, account_id: i64, delta: i64) -> Result<(), StoreError>;

    async fn touch_access(&self, account_id: i64) -> Result<(), StoreError>;

    /// find-or-create. Проигранная гонка на уникальном external_id
    /// разрешается повторным чтением.
    async fn find_or_create(&self, caller: &Caller) -> Result<Account, StoreError> {
        if let Some(account) = self.find(caller.external_id).await? {
            return Ok(account);
        }
        match self.create(caller).await {
            Ok(account) => Ok(account),
            Err(StoreError::DuplicateIdentity(_)) => self
                .find(caller.external_id)
                .await?
                .ok_or(StoreError::AccountNotFound),
            Err(e) => Err(e),
        }
    }
}

/// Журнал пополнений: только добавление.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn record(
        &self,
        account_id: i64,
        amount_paid: i64,
        credits_granted: i64,
    ) -> Result<i64, StoreError>;

    async fn records_for_account(&self, account_id: i64)
        -> Result<Vec<PaymentRecord>, StoreError>;

    /// add_credits + record в одной транзакции.
    async fn settle_top_up(
        &self,
        account_id: i64,
        amount_paid: i64,
        credits_granted: i64,
    ) -> Result<PaymentRecord, StoreError>;
}
