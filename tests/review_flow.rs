use std::{sync::Mutex, time::Duration};

use examprepbot::{
    content::Content,
    database::{AnswerQueue, Connection, ModeratorRegistry, NewAnswer},
    error::BotError,
    exercise::{self, ExerciseKind, SubmissionKind},
    moderation::{self, RelayReply},
    practice::{self, AnswerMessage, AnswerOutcome},
    state::SessionState,
};
use rand::{rngs::StdRng, SeedableRng};
use teloxide::types::{ChatId, MessageId, UserId};

const MODERATOR: UserId = UserId(4242);
const STUDENT_CHAT: ChatId = ChatId(1001);

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(ChatId, MessageId, String)>>,
}

impl RelayReply for Outbox {
    async fn relay(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), BotError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat, reply_to, text.to_owned()));
        Ok(())
    }
}

fn content() -> Content {
    serde_json::from_value(serde_json::json!({
        "ExamInfo": "Start Deutsch 1",
        "Words": ["der Tisch - стол"],
        "Talk": ["talk_1.jpg", "talk_2.jpg"],
        "Write": ["Schreiben Sie eine Karte."],
        "Listen": [],
        "Read": []
    }))
    .unwrap()
}

async fn database() -> Connection {
    let db = Connection::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db.add_moderator(MODERATOR).await.unwrap();
    db
}

#[tokio::test]
async fn talk_answer_travels_from_student_to_moderator_and_back() {
    let content = content();
    let db = database().await;
    let outbox = Outbox::default();
    let mut rng = StdRng::seed_from_u64(7);

    let exercise =
        exercise::pick(&mut rng, ExerciseKind::Talk.len_in(&content), None).unwrap();
    assert!(exercise < content.talk.len());

    let session = SessionState::awaiting_answer(SubmissionKind::Talk, exercise, 1_000);
    let (kind, mark) = session.answer_mark().unwrap();
    let message = AnswerMessage {
        chat_id: STUDENT_CHAT,
        message_id: MessageId(77),
        text: Some("Hallo"),
    };
    let outcome =
        practice::queue_answer(&db, kind, mark, message, 1_060, Duration::from_secs(3600))
            .await
            .unwrap();
    assert!(matches!(outcome, AnswerOutcome::Queued { exercise: e, .. } if e == exercise));

    let pending = moderation::request_next(&db, MODERATOR).await.unwrap();
    assert_eq!(pending.text, "Hallo");
    assert_eq!(pending.kind, SubmissionKind::Talk);
    assert_eq!(
        moderation::review_text(&content, &pending),
        "<b>Ответ:</b>\nHallo"
    );

    let reviewing = SessionState::AwaitingReply(moderation::review_context(&pending));
    moderation::submit_reply(&db, &outbox, reviewing.review(), "Gut!")
        .await
        .unwrap();

    assert_eq!(
        outbox.sent.lock().unwrap().as_slice(),
        &[(STUDENT_CHAT, MessageId(77), "Gut!".to_owned())]
    );
    assert_eq!(db.pending_count().await.unwrap(), 0);
    assert!(matches!(
        moderation::request_next(&db, MODERATOR).await,
        Err(BotError::NotFound(_))
    ));
}

#[tokio::test]
async fn stale_answer_session_is_not_queued() {
    let db = database().await;
    let session = SessionState::awaiting_answer(SubmissionKind::Write, 0, 1_000);
    let (kind, mark) = session.answer_mark().unwrap();
    let message = AnswerMessage {
        chat_id: STUDENT_CHAT,
        message_id: MessageId(5),
        text: Some("Liebe Anna"),
    };

    let outcome = practice::queue_answer(
        &db,
        kind,
        mark,
        message,
        1_000 + 7_200,
        Duration::from_secs(3600),
    )
    .await
    .unwrap();

    assert_eq!(outcome, AnswerOutcome::Expired);
    assert_eq!(db.pending_count().await.unwrap(), 0);
    assert!(matches!(
        moderation::request_next(&db, MODERATOR).await,
        Err(BotError::NotFound(_))
    ));
}

#[tokio::test]
async fn students_cannot_pull_answers() {
    let db = database().await;
    db.add_answer(NewAnswer {
        chat_id: STUDENT_CHAT,
        message_id: MessageId(1),
        kind: SubmissionKind::Write,
        exercise: 0,
        text: "Liebe Anna".to_owned(),
    })
    .await
    .unwrap();

    let err = moderation::request_next(&db, UserId(STUDENT_CHAT.0 as u64))
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::Unauthorized(_)));
    assert_eq!(db.pending_count().await.unwrap(), 1);
}
