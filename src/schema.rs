use teloxide::{
    dispatching::{dialogue::{self, InMemStorage}, UpdateFilterExt, UpdateHandler},
    dptree,
    prelude::Requester,
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{self, Command},
    database::Connection,
    practice, review,
    state::SessionState,
    HandlerResult,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(commands::start))
        .branch(case![Command::Words].endpoint(commands::words))
        .branch(case![Command::Info].endpoint(commands::info))
        .branch(case![Command::Id].endpoint(commands::id))
        .branch(case![Command::Answer].endpoint(review::request_review::<Connection>));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            case![SessionState::AwaitingTalkAnswer(mark)]
                .endpoint(practice::receive_talk_answer::<Connection>),
        )
        .branch(
            case![SessionState::AwaitingWriteAnswer(mark)]
                .endpoint(practice::receive_write_answer::<Connection>),
        )
        .branch(
            case![SessionState::AwaitingReply(review)]
                .endpoint(review::receive_reply::<Connection>),
        )
        .endpoint(invalid_state);

    let callback_handler = Update::filter_callback_query().endpoint(practice::handle_callback);

    dialogue::enter::<Update, InMemStorage<SessionState>, SessionState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

#[instrument(level = "info", skip_all, fields(chat_id = msg.chat.id.0))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    tracing::info!(text = ?msg.text(), "Unexpected message");
    bot.send_message(msg.chat.id, "Не понимаю. Нажми /start, чтобы открыть меню.")
        .await?;
    Ok(())
}
