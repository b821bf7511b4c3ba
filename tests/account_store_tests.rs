#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use trial_credits_bot::domain::account::Caller;
    use trial_credits_bot::domain::account_repository::{
        AccountRepository, PaymentLedger, StoreError,
    };
    use trial_credits_bot::infrastructure::sqlite_account_repo::SqliteAccountRepo;

    fn caller(external_id: i64) -> Caller {
        Caller {
            external_id,
            username: Some("tester".into()),
            first_name: Some("Test".into()),
            last_name: Some("User".into()),
        }
    }

    async fn count_accounts(repo: &SqliteAccountRepo) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&repo.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_starts_with_trial_credits() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();

        let account = repo.create(&caller(123456789)).await.unwrap();
        assert_eq!(account.external_id, 123456789);
        assert_eq!(account.credits, 10);
        assert_eq!(account.username.as_deref(), Some("tester"));
        assert_eq!(account.display_name.as_deref(), Some("Test"));
        assert_eq!(account.secondary_name.as_deref(), Some("User"));
        assert_eq!(account.created_at, account.last_access_at);

        let found = repo.find(123456789).await.unwrap();
        assert_eq!(found, Some(account));
    }

    #[tokio::test]
    async fn find_unknown_identity_is_none() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        assert_eq!(repo.find(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_create_is_duplicate_identity() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        repo.create(&caller(5)).await.unwrap();

        let err = repo.create(&caller(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity(5)));
        assert_eq!(count_accounts(&repo).await, 1);
    }

    #[tokio::test]
    async fn find_or_create_returns_same_account() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();

        let first = repo.find_or_create(&caller(77)).await.unwrap();
        let second = repo.find_or_create(&caller(77)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(count_accounts(&repo).await, 1);
    }

    #[tokio::test]
    async fn consume_stops_at_zero() {
        let repo = SqliteAccountRepo::in_memory(2).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        assert!(repo.consume_one(account.id).await.unwrap());
        assert!(repo.consume_one(account.id).await.unwrap());
        assert!(!repo.consume_one(account.id).await.unwrap());
        assert!(!repo.consume_one(account.id).await.unwrap());

        let account = repo.find(1).await.unwrap().unwrap();
        assert_eq!(account.credits, 0);
    }

    #[tokio::test]
    async fn consume_on_missing_account_is_false() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        assert!(!repo.consume_one(999).await.unwrap());
    }

    #[tokio::test]
    async fn add_credits_validates_amount_and_account() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        repo.add_credits(account.id, 5).await.unwrap();
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 15);

        assert!(matches!(
            repo.add_credits(account.id, 0).await,
            Err(StoreError::InvalidAmount(0))
        ));
        assert!(matches!(
            repo.add_credits(account.id, -3).await,
            Err(StoreError::InvalidAmount(-3))
        ));
        assert!(matches!(
            repo.add_credits(999, 5).await,
            Err(StoreError::AccountNotFound)
        ));
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 15);
    }

    #[tokio::test]
    async fn touch_access_moves_timestamp_forward() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        let old = account.created_at - chrono::Duration::hours(1);
        sqlx::query("UPDATE accounts SET last_access_at = ? WHERE id = ?")
            .bind(old)
            .bind(account.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        repo.touch_access(account.id).await.unwrap();
        let account = repo.find(1).await.unwrap().unwrap();
        assert!(account.last_access_at > old);

        assert!(matches!(
            repo.touch_access(999).await,
            Err(StoreError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn top_up_then_record_round_trip() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        repo.add_credits(account.id, 25).await.unwrap();
        let record_id = repo.record(account.id, 250, 25).await.unwrap();

        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 35);
        let records = repo.records_for_account(account.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record_id);
        assert_eq!(records[0].account_id, account.id);
        assert_eq!(records[0].amount_paid, 250);
        assert_eq!(records[0].credits_granted, 25);
    }

    #[tokio::test]
    async fn record_requires_existing_account() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        assert!(matches!(
            repo.record(42, 100, 10).await,
            Err(StoreError::AccountNotFound)
        ));
        assert!(matches!(
            repo.record(42, 0, 10).await,
            Err(StoreError::InvalidAmount(0))
        ));
    }

    #[tokio::test]
    async fn settle_top_up_is_all_or_nothing() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        let record = repo.settle_top_up(account.id, 500, 50).await.unwrap();
        assert_eq!(record.account_id, account.id);
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 60);

        assert!(matches!(
            repo.settle_top_up(999, 500, 50).await,
            Err(StoreError::AccountNotFound)
        ));
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn concurrent_consumers_never_overdraw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let repo = Arc::new(
            SqliteAccountRepo::open(path.to_str().unwrap(), 10)
                .await
                .unwrap(),
        );
        let account_id = repo.create(&caller(1)).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..30 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.consume_one(account_id).await.unwrap()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 0);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let path = path.to_str().unwrap();

        let id = {
            let repo = SqliteAccountRepo::open(path, 10).await.unwrap();
            let account = repo.create(&caller(8)).await.unwrap();
            repo.consume_one(account.id).await.unwrap();
            repo.pool.close().await;
            account.id
        };

        let repo = SqliteAccountRepo::open(path, 10).await.unwrap();
        let account = repo.find(8).await.unwrap().unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.credits, 9);
    }

    #[tokio::test]
    async fn add_credits_refuses_to_overflow_balance() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        let err = repo.add_credits(account.id, i64::MAX - 5).await.unwrap_err();
        assert!(matches!(err, StoreError::CreditOverflow(_)));

        // аккаунт по-прежнему читается, баланс не тронут
        let account = repo.find(1).await.unwrap().unwrap();
        assert_eq!(account.credits, 10);

        repo.add_credits(account.id, i64::MAX - 10).await.unwrap();
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, i64::MAX);
    }

    #[tokio::test]
    async fn settle_top_up_overflow_rolls_back() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        let err = repo
            .settle_top_up(account.id, 100, i64::MAX - 5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CreditOverflow(_)));

        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 10);
        assert!(repo
            .records_for_account(account.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn schema_rejects_non_integer_credits() {
        let repo = SqliteAccountRepo::in_memory(10).await.unwrap();
        let account = repo.create(&caller(1)).await.unwrap();

        let res = sqlx::query("UPDATE accounts SET credits = 1.5 WHERE id = ?")
            .bind(account.id)
            .execute(&repo.pool)
            .await;
        assert!(res.is_err());
        assert_eq!(repo.find(1).await.unwrap().unwrap().credits, 10);
    }
}
