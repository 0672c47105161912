pub mod answer;
pub mod connection;

pub use answer::{NewAnswer, PendingAnswer};
pub use connection::{AnswerQueue, Connection, ModeratorRegistry};
