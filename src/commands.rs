use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ParseMode},
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    content::Content,
    keyboard::{main_menu_keyboard, words_keyboard},
    words, HandlerResult, UserDialogue,
};

pub(crate) const MENU_TITLE: &str = "Подготовка к экзамену по немецкому (часть А1)";

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "Меню")]
    Start,
    #[command(description = "Необходимые слова")]
    Words,
    #[command(description = "Об экзамене")]
    Info,
    /// Echoes the caller's Telegram id.
    #[command(hide)]
    Id,
    /// Moderators: take the next answer to review.
    #[command(hide)]
    Answer,
}

#[instrument(level = "info", skip(bot, dialogue, msg), fields(chat_id = msg.chat.id.0))]
pub(crate) async fn start(bot: Bot, msg: Message, dialogue: UserDialogue) -> HandlerResult {
    dialogue.exit().await?;
    bot.send_message(msg.chat.id, MENU_TITLE)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
pub(crate) async fn info(bot: Bot, msg: Message, content: Arc<Content>) -> HandlerResult {
    bot.send_message(msg.chat.id, content.exam_info.clone()).await?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
pub(crate) async fn words(bot: Bot, msg: Message, content: Arc<Content>) -> HandlerResult {
    let page = words::first_page(&content.words, words::PAGE_SIZE);

    let request = bot
        .send_message(msg.chat.id, page.render())
        .parse_mode(ParseMode::Html);
    if page.has_navigation() {
        request.reply_markup(words_keyboard(&page)).await?;
    } else {
        request.await?;
    }
    Ok(())
}

#[instrument(level = "debug", skip_all)]
pub(crate) async fn id(bot: Bot, msg: Message) -> HandlerResult {
    let id = msg
        .from
        .as_ref()
        .map(|user| user.id.0.to_string())
        .unwrap_or_else(|| msg.chat.id.0.to_string());

    bot.send_message(msg.chat.id, id).await?;
    Ok(())
}
