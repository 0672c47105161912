use std::{fmt, str::FromStr};

use rand::{seq::SliceRandom, Rng};

use crate::content::{Content, ReadTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    Talk,
    Write,
    Listen,
    Read,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [Self::Talk, Self::Write, Self::Listen, Self::Read];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Talk => "talk",
            Self::Write => "write",
            Self::Listen => "listen",
            Self::Read => "read",
        }
    }

    /// Menu button caption.
    pub fn title(self) -> &'static str {
        match self {
            Self::Talk => "Sprechen",
            Self::Write => "Schreiben",
            Self::Listen => "Hören",
            Self::Read => "Lesen",
        }
    }

    pub fn len_in(self, content: &Content) -> usize {
        match self {
            Self::Talk => content.talk.len(),
            Self::Write => content.write.len(),
            Self::Listen => content.listen.len(),
            Self::Read => content.read.len(),
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "talk" => Ok(Self::Talk),
            "write" => Ok(Self::Write),
            "listen" => Ok(Self::Listen),
            "read" => Ok(Self::Read),
            _ => Err(()),
        }
    }
}

/// Exercise kinds whose answers are free text reviewed by a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionKind {
    Talk,
    Write,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Talk => "talk",
            Self::Write => "write",
        }
    }
}

impl From<SubmissionKind> for ExerciseKind {
    fn from(kind: SubmissionKind) -> Self {
        match kind {
            SubmissionKind::Talk => ExerciseKind::Talk,
            SubmissionKind::Write => ExerciseKind::Write,
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "talk" => Ok(Self::Talk),
            "write" => Ok(Self::Write),
            _ => Err(()),
        }
    }
}

/// Picks a uniformly random exercise index in `0..len`.
///
/// With `exclude` set and at least two exercises the draw is repeated until
/// it differs, so "continue" never shows the same task twice in a row.
pub fn pick<R: Rng + ?Sized>(rng: &mut R, len: usize, exclude: Option<usize>) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if len == 1 {
        return Some(0);
    }
    loop {
        let index = rng.gen_range(0..len);
        if Some(index) != exclude {
            return Some(index);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadChoice {
    pub text: String,
    pub correct: bool,
}

/// Answer options of a read task in random order, the correct one tagged.
pub fn shuffled_choices<R: Rng + ?Sized>(rng: &mut R, task: &ReadTask) -> Vec<ReadChoice> {
    let mut choices: Vec<ReadChoice> = task
        .answers
        .iter()
        .enumerate()
        .map(|(i, text)| ReadChoice {
            text: text.clone(),
            correct: i == 0,
        })
        .collect();
    choices.shuffle(rng);
    choices
}

pub fn read_verdict(task: &ReadTask, correct: bool) -> String {
    if correct {
        "Правильно! 🥳".to_owned()
    } else {
        format!(
            "Неправильно. 😔 \nПравильный ответ был: <b>«{}»</b>.",
            teloxide::utils::html::escape(task.correct_answer().unwrap_or_default())
        )
    }
}

pub fn listen_answers(task: &crate::content::ListenTask) -> String {
    task.qa.iter().fold(String::new(), |mut acc, line| {
        acc.push_str(line);
        acc.push('\n');
        acc
    })
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::content;

    #[test]
    fn pick_never_repeats_excluded_index() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 2..6 {
            for exclude in 0..len {
                for _ in 0..200 {
                    let index = pick(&mut rng, len, Some(exclude)).unwrap();
                    assert_ne!(index, exclude);
                    assert!(index < len);
                }
            }
        }
    }

    #[test]
    fn pick_handles_tiny_lists() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick(&mut rng, 0, None), None);
        assert_eq!(pick(&mut rng, 1, Some(0)), Some(0));
    }

    #[test]
    fn pick_covers_every_index() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 4];
        for _ in 0..500 {
            seen[pick(&mut rng, 4, None).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn exactly_one_choice_is_correct() {
        let content = content::sample();
        let mut rng = StdRng::seed_from_u64(11);
        let task = &content.read[1];

        for _ in 0..20 {
            let choices = shuffled_choices(&mut rng, task);
            assert_eq!(choices.len(), 3);
            let correct: Vec<_> = choices.iter().filter(|c| c.correct).collect();
            assert_eq!(correct.len(), 1);
            assert_eq!(correct[0].text, "a");
        }
    }

    #[test]
    fn verdict_names_the_correct_answer_on_a_miss() {
        let content = content::sample();
        assert!(read_verdict(&content.read[0], true).starts_with("Правильно"));
        assert!(read_verdict(&content.read[0], false).contains("«Richtig»"));
    }

    #[test]
    fn kinds_round_trip_through_names() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseKind>(), Ok(kind));
        }
        assert_eq!("write".parse::<SubmissionKind>(), Ok(SubmissionKind::Write));
        assert!("read".parse::<SubmissionKind>().is_err());
    }

    #[test]
    fn listen_answers_lists_every_line() {
        let content = content::sample();
        assert_eq!(
            listen_answers(&content.listen[0]),
            "1. Wo? - Im Park\n2. Wann? - Um acht\n"
        );
    }
}
