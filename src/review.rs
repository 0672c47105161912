use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ParseMode},
    Bot,
};
use tracing::instrument;

use crate::{
    config::Config,
    content::Content,
    database::{AnswerQueue, ModeratorRegistry, PendingAnswer},
    error::BotError,
    exercise::SubmissionKind,
    media::{MediaCache, MediaKind, TelegramMedia},
    moderation::{self, review_text},
    practice::SOMETHING_WENT_WRONG,
    state::ReviewContext,
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
pub(crate) async fn request_review<Store: AnswerQueue + ModeratorRegistry>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Store>,
    content: Arc<Content>,
    media: Arc<MediaCache>,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let pending = match moderation::request_next(connection.as_ref(), user.id).await {
        Ok(pending) => pending,
        Err(BotError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Эта команда доступна только проверяющим.")
                .await?;
            return Ok(());
        }
        Err(BotError::NotFound(_)) => {
            bot.send_message(msg.chat.id, "Нет ответов, отправленных на проверку!")
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    show_pending(&bot, &msg, &pending, &content, &media, &config).await?;

    let current = dialogue.get().await?.unwrap_or_default();
    let (next, replaced) = current.begin_review(moderation::review_context(&pending));
    if let Some((kind, mark)) = replaced {
        tracing::warn!(%kind, exercise = mark.exercise, "Review replaces an unsent answer");
        bot.send_message(
            msg.chat.id,
            "Незаконченный ответ на задание отменён: сначала ответь на проверку.",
        )
        .await?;
    }
    dialogue.update(next).await?;
    Ok(())
}

async fn show_pending(
    bot: &Bot,
    msg: &Message,
    pending: &PendingAnswer,
    content: &Content,
    media: &MediaCache,
    config: &Config,
) -> Result<(), BotError> {
    let text = review_text(content, pending);

    let image = match pending.kind {
        SubmissionKind::Talk => content
            .talk
            .get(pending.exercise)
            .map(|file| (file, config.image_dir().join(file)))
            .filter(|(_, path)| path.is_file()),
        SubmissionKind::Write => None,
    };

    match image {
        Some((file, path)) => {
            let delivery = TelegramMedia {
                bot,
                chat_id: msg.chat.id,
                kind: MediaKind::Photo,
                caption: Some(text),
                markup: None,
            };
            media.ensure_uploaded(file, &path, &delivery).await?;
        }
        None => {
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0, pending_id = review.pending_id))]
pub(crate) async fn receive_reply<Queue: AnswerQueue>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    review: ReviewContext,
    connection: Arc<Queue>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Пришли ответ текстом, пожалуйста.")
            .await?;
        return Ok(());
    };

    dialogue.exit().await?;

    match moderation::submit_reply(connection.as_ref(), &bot, Some(review), text).await {
        Ok(()) => {
            bot.send_message(msg.chat.id, "Ответ отправлен ✅").await?;
        }
        Err(BotError::InconsistentSession(reason)) => {
            tracing::warn!(reason, "Reply without a review in progress");
            bot.send_message(msg.chat.id, SOMETHING_WENT_WRONG).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
