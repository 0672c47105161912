use teloxide::types::{ChatId, MessageId};

use crate::exercise::SubmissionKind;

/// An answer waiting in the review queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnswer {
    pub id: i64,
    pub chat_id: ChatId,
    /// The user's answer message; the moderator's verdict replies to it.
    pub message_id: MessageId,
    pub kind: SubmissionKind,
    pub exercise: usize,
    pub text: String,
}

/// A submission before it has been given a queue id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub kind: SubmissionKind,
    pub exercise: usize,
    pub text: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerRecord {
    pub(crate) id: i64,
    pub(crate) chat_id: i64,
    pub(crate) message_id: i64,
    pub(crate) task_type: String,
    pub(crate) task_num: i64,
    pub(crate) answer: String,
}

impl TryFrom<AnswerRecord> for PendingAnswer {
    type Error = sqlx::Error;

    fn try_from(record: AnswerRecord) -> Result<Self, Self::Error> {
        let kind = record.task_type.parse().map_err(|_| {
            sqlx::Error::Decode(format!("unknown task type '{}'", record.task_type).into())
        })?;
        let message_id = i32::try_from(record.message_id)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let exercise =
            usize::try_from(record.task_num).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: record.id,
            chat_id: ChatId(record.chat_id),
            message_id: MessageId(message_id),
            kind,
            exercise,
            text: record.answer,
        })
    }
}
