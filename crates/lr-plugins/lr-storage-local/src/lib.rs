//! # lr-storage-local
//! litreview/crates/lr-plugins/lr-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage and directory sharding.

use anyhow::{bail, Context};
use async_trait::async_trait;
use lr_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Relative sharded location: "ab/cd/<media_id>"
    fn relative_path(media_id: &str) -> String {
        format!("{}/{}/{}", &media_id[0..2], &media_id[2..4], media_id)
    }

    fn sharded_path(&self, media_id: &str) -> PathBuf {
        self.root_path.join(Self::relative_path(media_id))
    }
}

/// File extension for an image content type ("image/jpeg" -> "jpeg").
fn extension_for(content_type: &str) -> anyhow::Result<String> {
    let mime: mime::Mime = content_type
        .parse()
        .with_context(|| format!("unparseable content type {content_type}"))?;
    if mime.type_() != mime::IMAGE {
        bail!("refusing to store non-image media of type {mime}");
    }
    Ok(mime.subtype().as_str().to_ascii_lowercase())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        let extension = extension_for(content_type)?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let media_id = format!("{:x}.{}", hasher.finalize(), extension);

        let target_path = self.sharded_path(&media_id);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if fs::try_exists(&target_path).await? {
            log::debug!("media {} already stored", media_id);
        } else {
            fs::write(&target_path, &data).await?;
            log::info!("stored media {} ({} bytes)", media_id, data.len());
        }

        Ok(media_id)
    }

    fn get_url(&self, media_id: &str) -> String {
        format!("{}/{}", self.url_prefix, Self::relative_path(media_id))
    }
}
