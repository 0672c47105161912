use std::{sync::Arc, time::Duration};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageCaptionSetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, MessageId, ParseMode, ReplyParameters},
    Bot,
};
use tracing::instrument;

use crate::{
    callback::Callback,
    config::Config,
    content::Content,
    database::{AnswerQueue, NewAnswer},
    error::BotError,
    exercise::{self, ExerciseKind, SubmissionKind},
    keyboard::{
        continue_keyboard, listen_answers_keyboard, read_choices_keyboard, start_answer_keyboard,
        words_keyboard,
    },
    media::{MediaCache, MediaKind, TelegramMedia},
    state::{unix_now, AnswerMark, SessionState},
    words, HandlerResult, UserDialogue,
};

pub(crate) const SOMETHING_WENT_WRONG: &str = "Похоже что-то пошло не так. 😔";
const ANSWER_PROMPT: &str = "Напиши ответ и я передам его на проверку!";

/// Everything a button press needs to answer in place.
struct Screen<'a> {
    bot: &'a Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    content: &'a Content,
    media: &'a MediaCache,
    config: &'a Config,
}

#[instrument(level = "info", skip_all, fields(user_id = q.from.id.0, data = ?q.data))]
pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: UserDialogue,
    content: Arc<Content>,
    media: Arc<MediaCache>,
    config: Arc<Config>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    let callback = match q.data.as_deref().map(str::parse::<Callback>) {
        Some(Ok(callback)) => callback,
        Some(Err(e)) => {
            tracing::warn!("Ignoring button press: {e}");
            return Ok(());
        }
        None => return Ok(()),
    };

    let screen = Screen {
        bot: &bot,
        chat_id,
        message_id: q.message.as_ref().map(|message| message.id()),
        content: &content,
        media: &media,
        config: &config,
    };

    match callback {
        Callback::Menu(kind) => screen.next_task(kind, None).await?,
        Callback::Next { kind, previous } => screen.next_task(kind, Some(previous)).await?,
        Callback::StartAnswer { kind, exercise } => {
            screen.start_answer(&dialogue, kind, exercise).await?
        }
        Callback::ListenAnswers { exercise } => screen.listen_answers(exercise).await?,
        Callback::ReadChoice { exercise, correct } => {
            screen.read_result(exercise, correct).await?
        }
        Callback::Words { page } => screen.words_page(page).await?,
    }

    Ok(())
}

impl Screen<'_> {
    async fn next_task(&self, kind: ExerciseKind, previous: Option<usize>) -> Result<(), BotError> {
        let picked = exercise::pick(&mut rand::thread_rng(), kind.len_in(self.content), previous);
        let Some(exercise) = picked else {
            tracing::warn!(%kind, "No exercises of this kind");
            self.bot
                .send_message(self.chat_id, "В этом разделе пока нет заданий.")
                .await?;
            return Ok(());
        };
        tracing::info!(%kind, exercise, "Sending exercise");

        if kind != ExerciseKind::Read {
            self.clear_buttons().await?;
        }

        match kind {
            ExerciseKind::Talk => {
                let file = &self.content.talk[exercise];
                let delivery = TelegramMedia {
                    bot: self.bot,
                    chat_id: self.chat_id,
                    kind: MediaKind::Photo,
                    caption: None,
                    markup: Some(start_answer_keyboard(SubmissionKind::Talk, exercise)),
                };
                self.media
                    .ensure_uploaded(file, &self.config.image_dir().join(file), &delivery)
                    .await?;
            }
            ExerciseKind::Write => {
                self.bot
                    .send_message(self.chat_id, self.content.write[exercise].clone())
                    .reply_markup(start_answer_keyboard(SubmissionKind::Write, exercise))
                    .await?;
            }
            ExerciseKind::Listen => {
                let file = &self.content.listen[exercise].video;
                let delivery = TelegramMedia {
                    bot: self.bot,
                    chat_id: self.chat_id,
                    kind: MediaKind::Video,
                    caption: None,
                    markup: Some(listen_answers_keyboard(exercise)),
                };
                self.media
                    .ensure_uploaded(file, &self.config.video_dir().join(file), &delivery)
                    .await?;
            }
            ExerciseKind::Read => {
                let task = &self.content.read[exercise];
                let choices = exercise::shuffled_choices(&mut rand::thread_rng(), task);
                let markup = read_choices_keyboard(exercise, &choices, task.row_width);

                match self.message_id {
                    Some(message_id) => {
                        self.bot
                            .edit_message_text(self.chat_id, message_id, task.text.clone())
                            .reply_markup(markup)
                            .await?;
                    }
                    None => {
                        self.bot
                            .send_message(self.chat_id, task.text.clone())
                            .reply_markup(markup)
                            .await?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn start_answer(
        &self,
        dialogue: &UserDialogue,
        kind: SubmissionKind,
        exercise: usize,
    ) -> HandlerResult {
        if exercise >= ExerciseKind::from(kind).len_in(self.content) {
            tracing::warn!(%kind, exercise, "Answer started for unknown exercise");
            self.bot.send_message(self.chat_id, SOMETHING_WENT_WRONG).await?;
            return Ok(());
        }

        match (kind, self.message_id) {
            (SubmissionKind::Talk, Some(message_id)) => {
                self.bot
                    .edit_message_caption(self.chat_id, message_id)
                    .caption(ANSWER_PROMPT)
                    .await?;
            }
            (SubmissionKind::Write, Some(message_id)) => {
                self.bot
                    .edit_message_reply_markup(self.chat_id, message_id)
                    .await?;
                self.bot
                    .send_message(self.chat_id, ANSWER_PROMPT)
                    .reply_parameters(ReplyParameters::new(message_id))
                    .await?;
            }
            (_, None) => {
                self.bot.send_message(self.chat_id, ANSWER_PROMPT).await?;
            }
        }

        dialogue
            .update(SessionState::awaiting_answer(kind, exercise, unix_now()))
            .await?;
        tracing::info!(%kind, exercise, "Collecting answer");
        Ok(())
    }

    async fn listen_answers(&self, exercise: usize) -> Result<(), BotError> {
        let (Some(task), Some(message_id)) = (self.content.listen.get(exercise), self.message_id)
        else {
            return Ok(());
        };

        self.bot
            .edit_message_caption(self.chat_id, message_id)
            .caption(exercise::listen_answers(task))
            .reply_markup(continue_keyboard(ExerciseKind::Listen, exercise))
            .await?;
        Ok(())
    }

    async fn read_result(&self, exercise: usize, correct: bool) -> Result<(), BotError> {
        let Some(task) = self.content.read.get(exercise) else {
            return Ok(());
        };
        tracing::info!(exercise, correct, "Read task answered");

        let text = exercise::read_verdict(task, correct);
        let markup = continue_keyboard(ExerciseKind::Read, exercise);

        match self.message_id {
            Some(message_id) => {
                self.bot
                    .edit_message_text(self.chat_id, message_id, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await?;
            }
            None => {
                self.bot
                    .send_message(self.chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await?;
            }
        }
        Ok(())
    }

    async fn words_page(&self, index: usize) -> Result<(), BotError> {
        let Some(page) = words::page(&self.content.words, index, words::PAGE_SIZE) else {
            tracing::debug!(index, "Word page out of range");
            return Ok(());
        };
        let Some(message_id) = self.message_id else {
            return Ok(());
        };

        self.bot
            .edit_message_text(self.chat_id, message_id, page.render())
            .parse_mode(ParseMode::Html)
            .reply_markup(words_keyboard(&page))
            .await?;
        Ok(())
    }

    async fn clear_buttons(&self) -> Result<(), BotError> {
        if let Some(message_id) = self.message_id {
            self.bot
                .edit_message_reply_markup(self.chat_id, message_id)
                .await?;
        }
        Ok(())
    }
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
pub(crate) async fn receive_talk_answer<Queue: AnswerQueue>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    mark: AnswerMark,
    connection: Arc<Queue>,
    config: Arc<Config>,
) -> HandlerResult {
    collect_answer(
        &bot,
        &dialogue,
        &msg,
        SubmissionKind::Talk,
        mark,
        connection.as_ref(),
        &config,
    )
    .await
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
pub(crate) async fn receive_write_answer<Queue: AnswerQueue>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    mark: AnswerMark,
    connection: Arc<Queue>,
    config: Arc<Config>,
) -> HandlerResult {
    collect_answer(
        &bot,
        &dialogue,
        &msg,
        SubmissionKind::Write,
        mark,
        connection.as_ref(),
        &config,
    )
    .await
}

/// A free-text message received while an answer session is open.
#[derive(Debug, Clone, Copy)]
pub struct AnswerMessage<'a> {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not a text message; the session stays open.
    NeedsText,
    /// The session timed out; nothing was queued.
    Expired,
    Queued { id: i64, exercise: usize },
}

/// Queues `message` as the answer to the exercise in `mark`, unless the
/// message carries no text or the session has expired.
pub async fn queue_answer<Queue: AnswerQueue>(
    queue: &Queue,
    kind: SubmissionKind,
    mark: AnswerMark,
    message: AnswerMessage<'_>,
    now: u64,
    timeout: Duration,
) -> Result<AnswerOutcome, BotError> {
    let Some(text) = message.text else {
        return Ok(AnswerOutcome::NeedsText);
    };

    let exercise = match mark.finalize(now, timeout) {
        Ok(exercise) => exercise,
        Err(BotError::SessionExpired) => {
            tracing::info!(%kind, exercise = mark.exercise, "Answer session expired");
            return Ok(AnswerOutcome::Expired);
        }
        Err(e) => return Err(e),
    };

    let id = queue
        .add_answer(NewAnswer {
            chat_id: message.chat_id,
            message_id: message.message_id,
            kind,
            exercise,
            text: text.to_owned(),
        })
        .await?;
    tracing::info!(%kind, exercise, id, "Answer submitted for review");

    Ok(AnswerOutcome::Queued { id, exercise })
}

async fn collect_answer<Queue: AnswerQueue>(
    bot: &Bot,
    dialogue: &UserDialogue,
    msg: &Message,
    kind: SubmissionKind,
    mark: AnswerMark,
    connection: &Queue,
    config: &Config,
) -> HandlerResult {
    let message = AnswerMessage {
        chat_id: msg.chat.id,
        message_id: msg.id,
        text: msg.text(),
    };
    let outcome = queue_answer(
        connection,
        kind,
        mark,
        message,
        unix_now(),
        config.answer_timeout,
    )
    .await?;

    match outcome {
        AnswerOutcome::NeedsText => {
            bot.send_message(msg.chat.id, "Пришли ответ текстом, пожалуйста.")
                .await?;
        }
        AnswerOutcome::Expired => {
            dialogue.exit().await?;
            bot.send_message(
                msg.chat.id,
                "Время на ответ истекло. Открой задание заново через /start.",
            )
            .await?;
        }
        AnswerOutcome::Queued { exercise, .. } => {
            dialogue.exit().await?;
            bot.send_message(msg.chat.id, "Отлично! Твой ответ передан на проверку.")
                .reply_markup(continue_keyboard(kind.into(), exercise))
                .await?;
        }
    }
    Ok(())
}
