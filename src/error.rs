use teloxide::types::UserId;
use thiserror::Error;

/// Errors raised while handling an update.
///
/// The first group is recovered at the handler boundary and turned into a
/// chat message; the rest propagate to the dispatcher's error handler.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("user {0:?} is not a moderator")]
    Unauthorized(UserId),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("inconsistent session: {0}")]
    InconsistentSession(&'static str),
    #[error("answer session expired")]
    SessionExpired,
    #[error("invalid callback payload '{0}'")]
    InvalidCallback(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
