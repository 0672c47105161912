//! Static study material loaded once at startup from `learn.json`.

use std::path::Path;

use serde::Deserialize;

use crate::error::BotError;

#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(rename = "ExamInfo")]
    pub exam_info: String,
    #[serde(rename = "Words", default)]
    pub words: Vec<String>,
    /// Image file names under `img/`.
    #[serde(rename = "Talk", default)]
    pub talk: Vec<String>,
    #[serde(rename = "Write", default)]
    pub write: Vec<String>,
    #[serde(rename = "Listen", default)]
    pub listen: Vec<ListenTask>,
    #[serde(rename = "Read", default)]
    pub read: Vec<ReadTask>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenTask {
    /// Video file name under `vid/`.
    pub video: String,
    #[serde(rename = "QA", default)]
    pub qa: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadTask {
    pub text: String,
    /// The first answer is the correct one.
    pub answers: Vec<String>,
    pub row_width: Option<usize>,
}

impl ReadTask {
    pub fn correct_answer(&self) -> Option<&str> {
        self.answers.first().map(String::as_str)
    }
}

impl Content {
    pub async fn load(path: &Path) -> Result<Self, BotError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let content: Content = serde_json::from_str(&raw)?;
        tracing::info!(
            words = content.words.len(),
            talk = content.talk.len(),
            write = content.write.len(),
            listen = content.listen.len(),
            read = content.read.len(),
            "Loaded study content from {}",
            path.display()
        );
        Ok(content)
    }
}

#[cfg(test)]
pub(crate) fn sample() -> Content {
    serde_json::from_value(serde_json::json!({
        "ExamInfo": "Prüfung Start Deutsch 1",
        "Words": (1..=25).map(|i| format!("Wort {i} - слово {i}")).collect::<Vec<_>>(),
        "Talk": ["talk_1.jpg", "talk_2.jpg", "talk_3.jpg"],
        "Write": ["Schreiben Sie eine E-Mail.", "Füllen Sie das Formular aus."],
        "Listen": [
            {"video": "listen_1.mp4", "QA": ["1. Wo? - Im Park", "2. Wann? - Um acht"]},
            {"video": "listen_2.mp4", "QA": ["1. Wer? - Anna"]}
        ],
        "Read": [
            {"text": "Der Zug fährt um 9 Uhr.", "answers": ["Richtig", "Falsch"], "row_width": 2},
            {"text": "Wo ist das Café?", "answers": ["a", "b", "c"]}
        ]
    }))
    .expect("sample content is valid")
}
