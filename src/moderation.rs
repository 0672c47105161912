//! Review of submitted answers by moderators.
//!
//! A moderator pulls the oldest pending answer, which stays queued until the
//! moderator's reply has been relayed to the author. Nothing locks a pulled
//! answer: two moderators asking at the same time both get the same one, and
//! the second reply to it is still relayed.

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, MessageId, ReplyParameters, UserId},
    Bot,
};

use crate::{
    content::Content,
    database::{AnswerQueue, ModeratorRegistry, PendingAnswer},
    error::BotError,
    exercise::SubmissionKind,
    state::ReviewContext,
};

/// Delivers a moderator's reply to the author of an answer.
#[allow(async_fn_in_trait)]
pub trait RelayReply {
    async fn relay(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), BotError>;
}

impl RelayReply for Bot {
    async fn relay(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), BotError> {
        self.send_message(chat, text)
            .reply_parameters(ReplyParameters::new(reply_to))
            .await?;
        Ok(())
    }
}

/// Makes the registry hold exactly `configured`, revoking everyone else.
pub async fn sync_moderators<S: ModeratorRegistry>(
    store: &S,
    configured: &[UserId],
) -> Result<(), BotError> {
    for moderator in store.moderators().await? {
        if !configured.contains(&moderator) {
            store.remove_moderator(moderator).await?;
            tracing::info!(user_id = moderator.0, "Moderator revoked");
        }
    }
    for moderator in configured {
        store.add_moderator(*moderator).await?;
    }

    tracing::info!(moderators = configured.len(), "Moderator registry synced");
    Ok(())
}

/// Oldest pending answer for `moderator` to review.
pub async fn request_next<S: AnswerQueue + ModeratorRegistry>(
    store: &S,
    moderator: UserId,
) -> Result<PendingAnswer, BotError> {
    if !store.is_moderator(moderator).await? {
        tracing::warn!(user_id = moderator.0, "Review requested by non-moderator");
        return Err(BotError::Unauthorized(moderator));
    }

    let pending = store
        .oldest_answer()
        .await?
        .ok_or(BotError::NotFound("pending answer"))?;

    tracing::info!(
        user_id = moderator.0,
        pending_id = pending.id,
        kind = %pending.kind,
        "Pending answer handed out for review"
    );
    Ok(pending)
}

pub fn review_context(pending: &PendingAnswer) -> ReviewContext {
    ReviewContext {
        pending_id: pending.id,
        origin_chat: pending.chat_id,
        origin_message: pending.message_id,
    }
}

/// Relays `reply` to the author and resolves the pending answer.
pub async fn submit_reply<S: AnswerQueue, R: RelayReply>(
    store: &S,
    relay: &R,
    review: Option<ReviewContext>,
    reply: &str,
) -> Result<(), BotError> {
    let review = review.ok_or(BotError::InconsistentSession("no review in progress"))?;

    relay
        .relay(review.origin_chat, review.origin_message, reply)
        .await?;

    if !store.remove_answer(review.pending_id).await? {
        tracing::warn!(
            pending_id = review.pending_id,
            "Pending answer was already resolved by another review"
        );
    }

    tracing::info!(pending_id = review.pending_id, "Review reply relayed");
    Ok(())
}

/// Text shown to the moderator next to the task.
pub fn review_text(content: &Content, pending: &PendingAnswer) -> String {
    let answer = teloxide::utils::html::escape(&pending.text);
    match pending.kind {
        SubmissionKind::Talk => format!("<b>Ответ:</b>\n{answer}"),
        SubmissionKind::Write => {
            let task = content
                .write
                .get(pending.exercise)
                .map(|task| teloxide::utils::html::escape(task))
                .unwrap_or_else(|| format!("Задание №{}", pending.exercise + 1));
            format!("{task}\n\n<b>Ответ:</b>\n{answer}")
        }
    }
}
