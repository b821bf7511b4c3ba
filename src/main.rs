use std::sync::Arc;
use teloxide::Bot;
use trial_credits_bot::application::command_router::CommandRouter;
use trial_credits_bot::application::payment_usecase::PaymentService;
use trial_credits_bot::config::Config;
use trial_credits_bot::domain::account_repository::{AccountRepository, PaymentLedger};
use trial_credits_bot::domain::trial_policy::TrialPolicy;
use trial_credits_bot::infrastructure::sqlite_account_repo::SqliteAccountRepo;
use trial_credits_bot::infrastructure::telegram;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    // 1. Конфиг: без токена не стартуем
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ошибка конфигурации: {}", e);
            return Err(e.into());
        }
    };

    // 2. Инициализация БД (SQLite)
    let store =
        Arc::new(SqliteAccountRepo::open(&config.database_path, config.trial_credits).await?);

    // 3. Инициализация сервисов (DI)
    let accounts: Arc<dyn AccountRepository> = store.clone();
    let ledger: Arc<dyn PaymentLedger> = store.clone();
    let payments =
        PaymentService::new(ledger, config.credit_price, config.admin_contact.clone());
    let router = Arc::new(CommandRouter::new(
        accounts,
        payments,
        TrialPolicy::new(config.trial_days),
        config.trial_credits,
    ));

    let bot = Bot::new(config.bot_token.clone());

    log::info!("🚀 Бот запущен, база: {}", config.database_path);

    telegram::run(bot, router).await;

    store.pool.close().await;
    log::info!("Бот остановлен");
    Ok(())
}
