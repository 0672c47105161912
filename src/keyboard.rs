use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::{
    callback::Callback,
    exercise::{ExerciseKind, ReadChoice, SubmissionKind},
    words::WordPage,
};

const DEFAULT_ROW_WIDTH: usize = 3;

fn button(text: impl Into<String>, callback: Callback) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, callback.to_string())
}

pub(crate) fn main_menu_keyboard() -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = ExerciseKind::ALL
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|kind| button(kind.title(), Callback::Menu(*kind)))
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn continue_keyboard(kind: ExerciseKind, previous: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "Продолжить »",
        Callback::Next { kind, previous },
    )]])
}

pub(crate) fn start_answer_keyboard(kind: SubmissionKind, exercise: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "Написать ответ",
        Callback::StartAnswer { kind, exercise },
    )]])
}

pub(crate) fn listen_answers_keyboard(exercise: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "Посмотреть ответы",
        Callback::ListenAnswers { exercise },
    )]])
}

pub(crate) fn read_choices_keyboard(
    exercise: usize,
    choices: &[ReadChoice],
    row_width: Option<usize>,
) -> InlineKeyboardMarkup {
    let row_width = row_width.filter(|w| *w > 0).unwrap_or(DEFAULT_ROW_WIDTH);
    let keyboard: Vec<Vec<InlineKeyboardButton>> = choices
        .chunks(row_width)
        .map(|row| {
            row.iter()
                .map(|choice| {
                    button(
                        choice.text.clone(),
                        Callback::ReadChoice {
                            exercise,
                            correct: choice.correct,
                        },
                    )
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn words_keyboard(page: &WordPage<'_>) -> InlineKeyboardMarkup {
    let mut row = Vec::new();

    if page.has_prev {
        row.push(button("« Назад", Callback::Words { page: page.index - 1 }));
    }
    if page.has_next {
        row.push(button("Далее »", Callback::Words { page: page.index + 1 }));
    }

    InlineKeyboardMarkup::new(vec![row])
}
