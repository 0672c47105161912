use std::time::{Duration, SystemTime, UNIX_EPOCH};

use teloxide::types::{ChatId, MessageId};

use crate::{error::BotError, exercise::SubmissionKind};

/// An answer the user has started but not sent yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerMark {
    pub exercise: usize,
    /// Unix seconds.
    pub started_at: u64,
}

/// The pending answer a moderator is currently replying to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewContext {
    pub pending_id: i64,
    pub origin_chat: ChatId,
    pub origin_message: MessageId,
}

/// Per-chat session kept in the dialogue storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingTalkAnswer(AnswerMark),
    AwaitingWriteAnswer(AnswerMark),
    AwaitingReply(ReviewContext),
}

impl SessionState {
    pub fn awaiting_answer(kind: SubmissionKind, exercise: usize, now: u64) -> Self {
        let mark = AnswerMark {
            exercise,
            started_at: now,
        };
        match kind {
            SubmissionKind::Talk => Self::AwaitingTalkAnswer(mark),
            SubmissionKind::Write => Self::AwaitingWriteAnswer(mark),
        }
    }

    pub fn answer_mark(&self) -> Option<(SubmissionKind, AnswerMark)> {
        match self {
            Self::AwaitingTalkAnswer(mark) => Some((SubmissionKind::Talk, *mark)),
            Self::AwaitingWriteAnswer(mark) => Some((SubmissionKind::Write, *mark)),
            _ => None,
        }
    }

    /// Moves to `AwaitingReply`, handing back the answer session it replaces.
    pub fn begin_review(&self, review: ReviewContext) -> (Self, Option<(SubmissionKind, AnswerMark)>) {
        (Self::AwaitingReply(review), self.answer_mark())
    }

    pub fn review(&self) -> Option<ReviewContext> {
        match self {
            Self::AwaitingReply(review) => Some(*review),
            _ => None,
        }
    }
}

impl AnswerMark {
    pub fn is_expired(&self, now: u64, timeout: Duration) -> bool {
        now.saturating_sub(self.started_at) > timeout.as_secs()
    }

    /// Exercise index the collected answer belongs to, provided the session
    /// is still alive.
    pub fn finalize(&self, now: u64, timeout: Duration) -> Result<usize, BotError> {
        if self.is_expired(now, timeout) {
            return Err(BotError::SessionExpired);
        }
        Ok(self.exercise)
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
