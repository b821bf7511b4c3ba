use crate::application::payment_usecase::PaymentService;
use crate::domain::account::Caller;
use crate::domain::account_repository::{AccountRepository, StoreError};
use crate::domain::bundle::Bundle;
use crate::domain::trial_policy::TrialPolicy;
use chrono::Utc;
use std::sync::Arc;

pub const RECHARGE_TRIGGER_TEXT: &str = "Пополнить баланс";
pub const RECHARGE_CALLBACK: &str = "recharge";

const GENERIC_FAILURE: &str = "Что-то пошло не так. Попробуйте позже.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundCommand {
    Start,
    Help,
    Search,
    Profile,
    RechargePrompt,
    Buy(Bundle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAction {
    Recharge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub action: Option<ReplyAction>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }
}

pub struct CommandRouter {
    accounts: Arc<dyn AccountRepository>,
    payments: PaymentService,
    policy: TrialPolicy,
    trial_credits: i64,
}

impl CommandRouter {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        payments: PaymentService,
        policy: TrialPolicy,
        trial_credits: i64,
    ) -> Self {
        Self {
            accounts,
            payments,
            policy,
            trial_credits,
        }
    }

    /// Точка входа для операторских инструментов: ручное подтверждение оплаты
    /// (`PaymentService::confirm_payment`). Команды бота сюда не ведут.
    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    // Ошибки хранилища не выходят за пределы одной команды
    pub async fn handle(&self, caller: &Caller, command: InboundCommand) -> Reply {
        let result = match command {
            InboundCommand::Start => self.on_start(caller).await,
            InboundCommand::Help => Ok(self.on_help()),
            InboundCommand::Search => self.on_search(caller).await,
            InboundCommand::Profile => self.on_profile(caller).await,
            InboundCommand::RechargePrompt => Ok(self.on_recharge_prompt()),
            InboundCommand::Buy(bundle) => self.on_buy(caller, bundle).await,
        };

        result.unwrap_or_else(|e| {
            log::error!(
                "Команда {:?} от {} завершилась ошибкой: {}",
                command,
                caller.external_id,
                e
            );
            Reply::text(GENERIC_FAILURE)
        })
    }

    async fn on_start(&self, caller: &Caller) -> Result<Reply, StoreError> {
        let account = self.accounts.find_or_create(caller).await?;
        let name = caller.first_name.as_deref().unwrap_or("друг");

        Ok(Reply::text(format!(
            "Привет, {name}! 👋\n\n\
             Я бот по черной психологии. Используй команду /search для поиска материалов.\n\n\
             У тебя есть {credits} токенов для использования.\n\
             После {days} дней использования токены закончатся, и тебе нужно будет пополнить баланс через /profile.\n\n\
             Используй /help для получения списка команд.",
            credits = account.credits,
            days = self.policy.window_days,
        )))
    }

    fn on_help(&self) -> Reply {
        Reply::text(format!(
            "Доступные команды:\n\n\
             /start - Начать работу с ботом\n\
             /search - Поиск материалов по черной психологии\n\
             /profile - Просмотр профиля и баланса токенов\n\
             /help - Показать это сообщение\n\n\
             Каждый поиск расходует 1 токен.\n\
             У тебя есть {days} дня и {credits} токенов для использования.\n\
             После этого нужно пополнить баланс.",
            days = self.policy.window_days,
            credits = self.trial_credits,
        ))
    }

    async fn on_search(&self, caller: &Caller) -> Result<Reply, StoreError> {
        let account = self.accounts.find_or_create(caller).await?;
        let status = self.policy.evaluate(&account, Utc::now());

        if !status.is_active {
            return Ok(Reply::text(
                "Твой пробный период закончился. Пополни баланс через команду /profile",
            ));
        }
        if !status.has_credits {
            return Ok(Reply::text(
                "У тебя закончились токены. Пополни баланс через команду /profile",
            ));
        }

        if !self.accounts.consume_one(account.id).await? {
            log::warn!("Аккаунт {}: списание не прошло, баланс уже 0", account.id);
            return Ok(Reply::text(
                "Не удалось использовать токен. Попробуйте позже.",
            ));
        }
        self.accounts.touch_access(account.id).await?;

        // Остаток считается от снимка до списания
        Ok(Reply::text(format!(
            "Результаты поиска по черной психологии:\n\n\
             {content}\n\n\
             Осталось токенов: {remaining}\n\
             Дней до окончания пробного периода: {days}",
            content = SEARCH_CONTENT,
            remaining = status.credits - 1,
            days = status.days_remaining,
        )))
    }

    async fn on_profile(&self, caller: &Caller) -> Result<Reply, StoreError> {
        let account = self.accounts.find_or_create(caller).await?;
        let status = self.policy.evaluate(&account, Utc::now());

        let text = format!(
            "👤 Профиль:\n\
             Имя: {name}\n\
             Статус: {state}\n\
             Токенов: {credits}\n\
             Дата регистрации: {registered}\n\n\
             Дней до окончания пробного периода: {days}\n\n\
             Цена: 1 токен = {price} рублей",
            name = account.display_name.as_deref().unwrap_or("Не указано"),
            state = if status.is_active { "Активен" } else { "Не активен" },
            credits = account.credits,
            registered = account.created_at.format("%d.%m.%Y"),
            days = status.days_remaining,
            price = self.payments.unit_price(),
        );

        Ok(Reply {
            text,
            action: Some(ReplyAction::Recharge),
        })
    }

    fn on_recharge_prompt(&self) -> Reply {
        let options: Vec<String> = Bundle::ALL
            .iter()
            .map(|b| {
                format!(
                    "- {} токенов ({} рублей) - {}",
                    b.credits(),
                    b.price(),
                    b.command()
                )
            })
            .collect();

        Reply::text(format!(
            "Выберите количество токенов для покупки:\n\n\
             1 токен = {price} рублей\n\n\
             Варианты:\n{options}",
            price = self.payments.unit_price(),
            options = options.join("\n"),
        ))
    }

    // Здесь аккаунт не создается: покупать может только тот, кто уже есть
    async fn on_buy(&self, caller: &Caller, bundle: Bundle) -> Result<Reply, StoreError> {
        let Some(account) = self.accounts.find(caller.external_id).await? else {
            return Ok(Reply::text("Ошибка: пользователь не найден."));
        };
        Ok(Reply::text(self.payments.instructions(account.id, bundle)))
    }
}

const SEARCH_CONTENT: &str = "📚 Материалы по черной психологии:

1. \"Темная триада личности\" - Психологические черты макиавеллизма, нарциссизма и психопатии.
   Источник: Журнал \"Психология и безопасность\"

2. \"Манипуляции в межличностных отношениях\" - Техники психологического влияния.
   Источник: Международный журнал прикладной психологии

3. \"Психология обмана и лжи\" - Как распознать ложь и манипуляции.
   Источник: Российский журнал психологии

4. \"Темные стороны лидерства\" - Психология токсичных лидеров.
   Источник: Журнал социальной психологии

5. \"Психология насилия\" - Психологические аспекты агрессивного поведения.
   Источник: Психологический журнал МГУ

⚠️ Важно: Вся информация предоставлена исключительно в образовательных целях.";
