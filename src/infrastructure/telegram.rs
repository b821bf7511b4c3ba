use crate::application::command_router::{
    CommandRouter, InboundCommand, Reply, ReplyAction, RECHARGE_CALLBACK, RECHARGE_TRIGGER_TEXT,
};
use crate::domain::account::Caller;
use crate::domain::bundle::Bundle;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, User};
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать список команд")]
    Help,
    #[command(description = "поиск материалов")]
    Search,
    #[command(description = "профиль и баланс токенов")]
    Profile,
    #[command(rename = "buy_10", hide)]
    Buy10,
    #[command(rename = "buy_25", hide)]
    Buy25,
    #[command(rename = "buy_50", hide)]
    Buy50,
    #[command(rename = "buy_100", hide)]
    Buy100,
}

impl From<Command> for InboundCommand {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start => InboundCommand::Start,
            Command::Help => InboundCommand::Help,
            Command::Search => InboundCommand::Search,
            Command::Profile => InboundCommand::Profile,
            Command::Buy10 => InboundCommand::Buy(Bundle::Credits10),
            Command::Buy25 => InboundCommand::Buy(Bundle::Credits25),
            Command::Buy50 => InboundCommand::Buy(Bundle::Credits50),
            Command::Buy100 => InboundCommand::Buy(Bundle::Credits100),
        }
    }
}

fn caller_from_user(user: &User) -> Caller {
    Caller {
        external_id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

// Сообщения без from (каналы) привязываем к чату
fn caller_from_message(msg: &Message) -> Caller {
    msg.from
        .as_ref()
        .map(caller_from_user)
        .unwrap_or_else(|| Caller::new(msg.chat.id.0))
}

fn make_recharge_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        RECHARGE_TRIGGER_TEXT,
        RECHARGE_CALLBACK,
    )]])
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    let request = bot.send_message(chat_id, reply.text);
    match reply.action {
        Some(ReplyAction::Recharge) => {
            request.reply_markup(make_recharge_keyboard()).await?;
        }
        None => {
            request.await?;
        }
    }
    Ok(())
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    router: Arc<CommandRouter>,
) -> ResponseResult<()> {
    let caller = caller_from_message(&msg);
    let reply = router.handle(&caller, cmd.into()).await;
    send_reply(&bot, msg.chat.id, reply).await
}

pub async fn handle_recharge_text(
    bot: Bot,
    msg: Message,
    router: Arc<CommandRouter>,
) -> ResponseResult<()> {
    let caller = caller_from_message(&msg);
    let reply = router.handle(&caller, InboundCommand::RechargePrompt).await;
    send_reply(&bot, msg.chat.id, reply).await
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<CommandRouter>,
) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    if data != RECHARGE_CALLBACK {
        log::warn!("Неизвестный callback {:?} от {}", data, q.from.id.0);
        return Ok(());
    }

    let caller = caller_from_user(&q.from);
    let reply = router.handle(&caller, InboundCommand::RechargePrompt).await;

    // Как в исходном меню: заменяем текст профиля списком пакетов
    match q.message.as_ref() {
        Some(msg) => {
            bot.edit_message_text(msg.chat().id, msg.id(), reply.text)
                .await?;
        }
        None => send_reply(&bot, q.from.id.into(), reply).await?,
    }
    Ok(())
}

pub async fn run(bot: Bot, router: Arc<CommandRouter>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text() == Some(RECHARGE_TRIGGER_TEXT))
                .endpoint(handle_recharge_text),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
