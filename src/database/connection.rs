use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use teloxide::types::UserId;

use super::answer::{AnswerRecord, NewAnswer, PendingAnswer};
use crate::error::BotError;

pub struct Connection {
    pool: SqlitePool,
}

impl Connection {
    pub async fn connect(database_url: &str) -> Result<Self, BotError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, every connection of a pool would
    /// otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, BotError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), BotError> {
        tracing::debug!("Running migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[allow(async_fn_in_trait)]
pub trait AnswerQueue {
    async fn add_answer(&self, answer: NewAnswer) -> Result<i64, sqlx::Error>;

    /// Oldest unresolved answer; the queue is left untouched.
    async fn oldest_answer(&self) -> Result<Option<PendingAnswer>, sqlx::Error>;

    /// Returns whether a row was actually removed.
    async fn remove_answer(&self, id: i64) -> Result<bool, sqlx::Error>;

    async fn pending_count(&self) -> Result<i64, sqlx::Error>;
}

#[allow(async_fn_in_trait)]
pub trait ModeratorRegistry {
    async fn add_moderator(&self, user_id: UserId) -> Result<(), sqlx::Error>;

    /// Returns whether the user was registered.
    async fn remove_moderator(&self, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn is_moderator(&self, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn moderators(&self) -> Result<Vec<UserId>, sqlx::Error>;
}

impl AnswerQueue for Connection {
    async fn add_answer(&self, answer: NewAnswer) -> Result<i64, sqlx::Error> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO user_answers (chat_id, message_id, task_type, task_num, answer) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(answer.chat_id.0)
        .bind(answer.message_id.0)
        .bind(answer.kind.as_str())
        .bind(answer.exercise as i64)
        .bind(&answer.text)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, kind = %answer.kind, chat_id = answer.chat_id.0, "Queued answer");
        Ok(id)
    }

    async fn oldest_answer(&self) -> Result<Option<PendingAnswer>, sqlx::Error> {
        let record = sqlx::query_as::<_, AnswerRecord>(
            "SELECT id, chat_id, message_id, task_type, task_num, answer \
             FROM user_answers ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        record.map(PendingAnswer::try_from).transpose()
    }

    async fn remove_answer(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_answers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pending_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_answers")
            .fetch_one(&self.pool)
            .await
    }
}

impl ModeratorRegistry for Connection {
    async fn add_moderator(&self, user_id: UserId) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO admins (user_id) VALUES (?)")
            .bind(user_id.0 as i64)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_moderator(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id.0 as i64)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_moderator(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM admins WHERE user_id = ?")
            .bind(user_id.0 as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn moderators(&self) -> Result<Vec<UserId>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT user_id FROM admins ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(|id| UserId(id as u64)).collect())
    }
}
