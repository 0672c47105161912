//! Telegram file-id cache for local media.
//!
//! Sending a local file uploads it; Telegram answers with a file id that can
//! be sent again without uploading. The id is remembered together with the
//! file's modification time, and only reused while that time is unchanged.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use serde::{Deserialize, Serialize};
use teloxide::{
    payloads::{SendPhotoSetters, SendVideoSetters},
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, InputFile, ParseMode},
    Bot,
};
use tokio::sync::RwLock;

use crate::error::BotError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCacheEntry {
    pub id: String,
    pub mtime: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Cached(String),
    Upload(PathBuf),
}

impl MediaRef {
    pub fn into_input_file(self) -> InputFile {
        match self {
            Self::Cached(id) => InputFile::file_id(id),
            Self::Upload(path) => InputFile::file(path),
        }
    }
}

/// Sends a piece of media and reports the Telegram file id it ended up with.
#[allow(async_fn_in_trait)]
pub trait DeliverMedia {
    async fn deliver(&self, media: MediaRef) -> Result<String, BotError>;
}

#[derive(Debug)]
pub struct MediaCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, MediaCacheEntry>>,
}

impl MediaCache {
    /// Loads the cache file, starting empty when it does not exist yet.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, BotError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Loaded {} cached media ids from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub async fn entry(&self, file_key: &str) -> Option<MediaCacheEntry> {
        self.entries.read().await.get(file_key).cloned()
    }

    /// Delivers `local_path` through `delivery`, uploading it only when no
    /// cached id matches the file's current modification time.
    pub async fn ensure_uploaded<D: DeliverMedia>(
        &self,
        file_key: &str,
        local_path: &Path,
        delivery: &D,
    ) -> Result<String, BotError> {
        let mtime = modified_secs(local_path).await?;

        let cached = self
            .entries
            .read()
            .await
            .get(file_key)
            .filter(|entry| entry.mtime == mtime)
            .map(|entry| entry.id.clone());

        if let Some(id) = cached {
            tracing::debug!(file_key, "Reusing cached media id");
            delivery.deliver(MediaRef::Cached(id.clone())).await?;
            return Ok(id);
        }

        tracing::info!(file_key, "Uploading {}", local_path.display());
        let id = delivery
            .deliver(MediaRef::Upload(local_path.to_path_buf()))
            .await?;

        // The guard stays held through the write so snapshots land in order.
        let mut entries = self.entries.write().await;
        entries.insert(
            file_key.to_owned(),
            MediaCacheEntry {
                id: id.clone(),
                mtime,
            },
        );
        let snapshot = serde_json::to_string_pretty(&*entries)?;
        tokio::fs::write(&self.path, snapshot).await?;
        drop(entries);

        Ok(id)
    }
}

async fn modified_secs(path: &Path) -> Result<f64, BotError> {
    let modified = tokio::fs::metadata(path).await?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// Photo or video message to a chat.
pub struct TelegramMedia<'a> {
    pub bot: &'a Bot,
    pub chat_id: ChatId,
    pub kind: MediaKind,
    pub caption: Option<String>,
    pub markup: Option<InlineKeyboardMarkup>,
}

impl DeliverMedia for TelegramMedia<'_> {
    async fn deliver(&self, media: MediaRef) -> Result<String, BotError> {
        let file = media.into_input_file();

        match self.kind {
            MediaKind::Photo => {
                let mut request = self.bot.send_photo(self.chat_id, file);
                if let Some(caption) = &self.caption {
                    request = request.caption(caption.clone()).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = &self.markup {
                    request = request.reply_markup(markup.clone());
                }
                let sent = request.await?;
                sent.photo()
                    .and_then(|sizes| sizes.last())
                    .map(|size| size.file.id.to_string())
                    .ok_or(BotError::NotFound("photo in sent message"))
            }
            MediaKind::Video => {
                let mut request = self.bot.send_video(self.chat_id, file);
                if let Some(caption) = &self.caption {
                    request = request.caption(caption.clone()).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = &self.markup {
                    request = request.reply_markup(markup.clone());
                }
                let sent = request.await?;
                sent.video()
                    .map(|video| video.file.id.to_string())
                    .ok_or(BotError::NotFound("video in sent message"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        io::Write,
        sync::Mutex,
        time::{Duration, SystemTime},
    };

    use super::*;

    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<MediaRef>>,
    }

    impl RecordingDelivery {
        fn uploads(&self) -> usize {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|media| matches!(media, MediaRef::Upload(_)))
                .count()
        }
    }

    impl DeliverMedia for RecordingDelivery {
        async fn deliver(&self, media: MediaRef) -> Result<String, BotError> {
            let mut sent = self.sent.lock().unwrap();
            let id = match &media {
                MediaRef::Cached(id) => id.clone(),
                MediaRef::Upload(_) => format!("file-{}", sent.len()),
            };
            sent.push(media);
            Ok(id)
        }
    }

    fn media_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"jpeg").unwrap();
        path
    }

    #[tokio::test]
    async fn unchanged_file_is_uploaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let image = media_file(dir.path(), "talk_1.jpg");
        let cache = MediaCache::load(dir.path().join("id.json")).await.unwrap();
        let delivery = RecordingDelivery::default();

        let first = cache.ensure_uploaded("talk_1.jpg", &image, &delivery).await.unwrap();
        let second = cache.ensure_uploaded("talk_1.jpg", &image, &delivery).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(delivery.uploads(), 1);
        assert_eq!(
            delivery.sent.lock().unwrap()[1],
            MediaRef::Cached(first.clone())
        );
    }

    #[tokio::test]
    async fn touched_file_is_uploaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let image = media_file(dir.path(), "talk_1.jpg");
        let cache = MediaCache::load(dir.path().join("id.json")).await.unwrap();
        let delivery = RecordingDelivery::default();

        let first = cache.ensure_uploaded("talk_1.jpg", &image, &delivery).await.unwrap();

        File::options()
            .write(true)
            .open(&image)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(120))
            .unwrap();

        let second = cache.ensure_uploaded("talk_1.jpg", &image, &delivery).await.unwrap();
        let third = cache.ensure_uploaded("talk_1.jpg", &image, &delivery).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(second, third);
        assert_eq!(delivery.uploads(), 2);
    }

    #[tokio::test]
    async fn cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let image = media_file(dir.path(), "listen_1.mp4");
        let cache_path = dir.path().join("id.json");
        let delivery = RecordingDelivery::default();

        let id = {
            let cache = MediaCache::load(&cache_path).await.unwrap();
            cache.ensure_uploaded("listen_1.mp4", &image, &delivery).await.unwrap()
        };

        let reloaded = MediaCache::load(&cache_path).await.unwrap();
        assert_eq!(reloaded.entry("listen_1.mp4").await.unwrap().id, id);

        reloaded.ensure_uploaded("listen_1.mp4", &image, &delivery).await.unwrap();
        assert_eq!(delivery.uploads(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_uploads_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let talk = media_file(dir.path(), "talk_1.jpg");
        let other = media_file(dir.path(), "talk_2.jpg");
        let video = media_file(dir.path(), "listen_1.mp4");
        let cache_path = dir.path().join("id.json");
        let cache = MediaCache::load(&cache_path).await.unwrap();
        let delivery = RecordingDelivery::default();

        let (a, b, c) = tokio::join!(
            cache.ensure_uploaded("talk_1.jpg", &talk, &delivery),
            cache.ensure_uploaded("talk_2.jpg", &other, &delivery),
            cache.ensure_uploaded("listen_1.mp4", &video, &delivery),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let reloaded = MediaCache::load(&cache_path).await.unwrap();
        for key in ["talk_1.jpg", "talk_2.jpg", "listen_1.mp4"] {
            assert!(reloaded.entry(key).await.is_some(), "{key} missing on disk");
        }
    }

    #[tokio::test]
    async fn missing_media_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MediaCache::load(dir.path().join("id.json")).await.unwrap();
        let delivery = RecordingDelivery::default();

        let err = cache
            .ensure_uploaded("nope.jpg", &dir.path().join("nope.jpg"), &delivery)
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Io(_)));
        assert_eq!(delivery.uploads(), 0);
    }

    #[tokio::test]
    async fn reads_existing_cache_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("id.json");
        std::fs::write(
            &cache_path,
            r#"{"talk_2.jpg": {"id": "AgAC-old", "mtime": 1700000000.5}}"#,
        )
        .unwrap();

        let cache = MediaCache::load(&cache_path).await.unwrap();
        assert_eq!(
            cache.entry("talk_2.jpg").await,
            Some(MediaCacheEntry {
                id: "AgAC-old".to_owned(),
                mtime: 1_700_000_000.5
            })
        );
    }
}
