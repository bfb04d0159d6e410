// src/sheets/systems/ai/cache.rs
//! Disk-backed response cache keyed by request fingerprint.

use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::collaborator::AiError;
use super::messenger::TextGenerator;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    fingerprint: String,
    model_id: String,
    created_at: DateTime<Utc>,
    text: String,
}

/// SHA-256 over everything that changes the model's answer.
pub fn fingerprint(model_id: &str, temperature: f32, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(temperature.to_le_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    /// Cached text, or `None` on a miss. Unreadable entries count as misses.
    pub fn get(&self, fingerprint: &str) -> Option<String> {
        let path = self.entry_path(fingerprint);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("ResponseCache: cannot open {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_reader::<_, CachedResponse>(BufReader::new(file)) {
            Ok(entry) if entry.fingerprint == fingerprint => Some(entry.text),
            Ok(_) => {
                warn!("ResponseCache: fingerprint mismatch in {:?}", path);
                None
            }
            Err(e) => {
                warn!("ResponseCache: corrupt entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Writes a private temp file, then renames it over the entry. Readers
    /// see either the previous entry or a complete new one.
    pub fn put(&self, fingerprint: &str, model_id: &str, text: &str) -> Result<(), AiError> {
        let entry = CachedResponse {
            fingerprint: fingerprint.to_string(),
            model_id: model_id.to_string(),
            created_at: Utc::now(),
            text: text.to_string(),
        };
        let path = self.entry_path(fingerprint);
        let tmp = self.dir.join(format!("{}.json.tmp-{}", fingerprint, Uuid::new_v4()));
        let written = fs::File::create(&tmp)
            .map_err(AiError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer(&mut writer, &entry)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&tmp, &path).map_err(AiError::from));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written?;
        trace!("ResponseCache: stored {:?}", path);
        Ok(())
    }
}

/// Wraps a generator with the disk cache. Only successful generations are stored.
pub struct CachedGenerator<G> {
    inner: G,
    cache: ResponseCache,
}

impl<G: TextGenerator> CachedGenerator<G> {
    pub fn new(inner: G, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for CachedGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let key = fingerprint(self.inner.model_id(), self.inner.temperature(), prompt);
        if let Some(text) = self.cache.get(&key) {
            debug!("ResponseCache: hit {}", &key[..12]);
            return Ok(text);
        }
        let text = self.inner.generate(prompt).await?;
        let cache = self.cache.clone();
        let model_id = self.inner.model_id().to_string();
        let entry_text = text.clone();
        let short = key[..12].to_string();
        match tokio::task::spawn_blocking(move || cache.put(&key, &model_id, &entry_text)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("ResponseCache: failed to store {}: {}", short, e),
            Err(e) => warn!("ResponseCache: store task for {} did not finish: {}", short, e),
        }
        Ok(text)
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn temperature(&self) -> f32 {
        self.inner.temperature()
    }
}
