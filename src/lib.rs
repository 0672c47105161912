use state::SessionState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod callback;
pub mod commands;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod exercise;
pub mod keyboard;
pub mod media;
pub mod moderation;
pub mod practice;
pub mod review;
pub mod schema;
pub mod state;
pub mod words;

pub type UserDialogue = Dialogue<SessionState, InMemStorage<SessionState>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
