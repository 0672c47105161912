use std::{error::Error, sync::Arc};

use examprepbot::{
    commands::Command,
    config::Config,
    content::Content,
    database::Connection,
    media::MediaCache,
    moderation,
    schema::schema,
    state::SessionState,
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::webhooks::{self, Options},
    utils::command::BotCommands,
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::from_env()?;
    init_tracing()?;

    for dir in config.required_dirs() {
        tokio::fs::create_dir_all(&dir).await?;
    }

    let connection = Connection::connect(&config.database_url).await?;
    connection.migrate().await?;
    moderation::sync_moderators(&connection, &config.moderators).await?;
    tracing::info!("Database ready");

    let content = Content::load(&config.content_path()).await?;
    let media = MediaCache::load(config.media_cache_path()).await?;

    let bot = Bot::new(std::env::var("TELOXIDE_TOKEN")?);
    bot.set_my_commands(Command::bot_commands()).await?;
    tracing::info!("Starting bot...");

    let webhook = config.webhook.clone();
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<SessionState>::new(),
            Arc::new(connection),
            Arc::new(content),
            Arc::new(media),
            Arc::new(config)
        ])
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some(webhook) => {
            tracing::info!(url = %webhook.url, addr = %webhook.addr, "Listening for webhook updates");
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}

fn init_tracing() -> Result<(), Box<dyn Error + Send + Sync>> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());

    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(level)?)
        .with_span_events(FmtSpan::ENTER)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
