//! Inline button payloads, `<domain>_<args...>`.

use std::{fmt, str::FromStr};

use crate::{
    error::BotError,
    exercise::{ExerciseKind, SubmissionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// `menu_main_<kind>`: first task of a kind from the main menu.
    Menu(ExerciseKind),
    /// `<kind>_<n>`: another task of the same kind, avoiding task `n`.
    Next { kind: ExerciseKind, previous: usize },
    /// `talk_answer_<n>` / `write_answer_<n>`.
    StartAnswer { kind: SubmissionKind, exercise: usize },
    /// `listen_answers_<n>`.
    ListenAnswers { exercise: usize },
    /// `read_<n>_correct` / `read_<n>_wrong`.
    ReadChoice { exercise: usize, correct: bool },
    /// `words_<n>`.
    Words { page: usize },
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu(kind) => write!(f, "menu_main_{kind}"),
            Self::Next { kind, previous } => write!(f, "{kind}_{previous}"),
            Self::StartAnswer { kind, exercise } => write!(f, "{kind}_answer_{exercise}"),
            Self::ListenAnswers { exercise } => write!(f, "listen_answers_{exercise}"),
            Self::ReadChoice { exercise, correct } => write!(
                f,
                "read_{exercise}_{}",
                if *correct { "correct" } else { "wrong" }
            ),
            Self::Words { page } => write!(f, "words_{page}"),
        }
    }
}

impl FromStr for Callback {
    type Err = BotError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = || BotError::InvalidCallback(data.to_owned());
        let parts: Vec<&str> = data.split('_').collect();
        let number = |s: &str| s.parse::<usize>().map_err(|_| invalid());

        let callback = match parts.as_slice() {
            ["menu", "main", kind] => Self::Menu(kind.parse().map_err(|_| invalid())?),
            ["words", page] => Self::Words {
                page: number(*page)?,
            },
            ["listen", "answers", n] => Self::ListenAnswers {
                exercise: number(*n)?,
            },
            [kind @ ("talk" | "write"), "answer", n] => Self::StartAnswer {
                kind: kind.parse().map_err(|_| invalid())?,
                exercise: number(*n)?,
            },
            ["read", n, verdict @ ("correct" | "wrong")] => Self::ReadChoice {
                exercise: number(*n)?,
                correct: *verdict == "correct",
            },
            [kind, n] => Self::Next {
                kind: kind.parse().map_err(|_| invalid())?,
                previous: number(*n)?,
            },
            _ => return Err(invalid()),
        };

        Ok(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_payload_family() {
        let cases = [
            ("menu_main_listen", Callback::Menu(ExerciseKind::Listen)),
            (
                "talk_3",
                Callback::Next {
                    kind: ExerciseKind::Talk,
                    previous: 3,
                },
            ),
            (
                "write_answer_1",
                Callback::StartAnswer {
                    kind: SubmissionKind::Write,
                    exercise: 1,
                },
            ),
            ("listen_answers_0", Callback::ListenAnswers { exercise: 0 }),
            (
                "read_4_wrong",
                Callback::ReadChoice {
                    exercise: 4,
                    correct: false,
                },
            ),
            ("words_2", Callback::Words { page: 2 }),
        ];

        for (raw, expected) in cases {
            let parsed: Callback = raw.parse().unwrap();
            assert_eq!(parsed, expected, "{raw}");
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn rejects_unknown_payloads() {
        for raw in [
            "",
            "menu_main_sing",
            "read_x",
            "listen_answer_1",
            "read_answer_1",
            "words_-1",
            "talk_1_2",
            "unknown_1",
        ] {
            assert!(
                matches!(raw.parse::<Callback>(), Err(BotError::InvalidCallback(_))),
                "{raw}"
            );
        }
    }
}
