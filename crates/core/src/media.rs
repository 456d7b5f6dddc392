//! Local staging of post images before upload.
//!
//! Images are stored as `{dir}/{post}_{index}.jpg`, with the post id
//! form-urlencoded so distinct ids never share a file. A file already at that
//! path counts as downloaded, so an interrupted run resumes without fetching
//! the same image twice. Downloads go through a `.part` file that is renamed
//! into place only after the body was written completely.

use std::path::{Path, PathBuf};

use reqwest::Client;
use url::form_urlencoded;

use crate::fetch::FetchConfig;
use crate::post::Post;
use crate::sender::MediaSource;
use crate::{RelayError, Result};

/// Downloads post images into a cache directory.
#[derive(Debug, Clone)]
pub struct MediaStager {
    dir: PathBuf,
    client: Client,
    config: FetchConfig,
}

impl MediaStager {
    pub fn new(dir: impl Into<PathBuf>, config: &FetchConfig) -> Result<Self> {
        Ok(Self { dir: dir.into(), client: config.client()?, config: config.clone() })
    }

    /// Cache path of the `index`th image of a post.
    pub fn staged_path(&self, post_id: &str, index: usize) -> PathBuf {
        let stem: String = form_urlencoded::byte_serialize(post_id.as_bytes()).collect();
        self.dir.join(format!("{}_{}.jpg", stem, index))
    }

    /// Stages every image of `post`, skipping the ones that fail.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NoValidMedia`] when no image could be staged.
    pub async fn stage(&self, post: &Post) -> Result<Vec<MediaSource>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut staged = Vec::with_capacity(post.images.len());
        for (index, url) in post.images.iter().enumerate() {
            let path = self.staged_path(&post.id, index);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::debug!(post_id = %post.id, path = %path.display(), "image already staged");
                staged.push(MediaSource::File(path));
                continue;
            }

            match self.download(url, &path).await {
                Ok(()) => staged.push(MediaSource::File(path)),
                Err(e) => tracing::warn!(post_id = %post.id, url = %url, error = %e, "image download failed, skipping"),
            }
        }

        if staged.is_empty() {
            return Err(RelayError::NoValidMedia { post_id: post.id.clone() });
        }
        Ok(staged)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let response = self.client.get(url).send().await.map_err(|e| self.config.map_send_error(e))?;
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;

        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, path).await?;
        tracing::debug!(url = %url, path = %path.display(), bytes = bytes.len(), "image staged");
        Ok(())
    }
}
