//! Listing image downloads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::fetch::RequestHeaders;

/// Best-effort image retrieval.
///
/// `None` means the image could not be stored; callers keep the listing.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn fetch_and_store(&self, url: &str, shop_name: &str) -> Option<String>;
}

/// Stores images under `<root>/<shop>/<file name>` and returns that path.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    client: reqwest::Client,
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(client: reqwest::Client, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn download(&self, url: &Url, shop_name: &str) -> anyhow::Result<PathBuf> {
        let response = RequestHeaders::apply_to_request_builder(self.client.get(url.clone()))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            anyhow::bail!("empty body");
        }

        let dir = self.root.join(safe_component(shop_name));
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file_name_for(url));
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn fetch_and_store(&self, url: &str, shop_name: &str) -> Option<String> {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => {
                log::debug!("[{}] Not downloading image {:?}", shop_name, url);
                return None;
            }
        };

        match self.download(&parsed, shop_name).await {
            Ok(path) => {
                log::debug!("[{}] Stored image {} at {}", shop_name, url, path.display());
                Some(path.display().to_string())
            }
            Err(e) => {
                log::warn!("[{}] Image {} not stored: {:#}", shop_name, url, e);
                None
            }
        }
    }
}

/// File name derived from the host and the whole URL path, so `/1/main.jpg`
/// and `/2/main.jpg` on the same CDN land in different files.
fn file_name_for(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();
    let path = if segments.is_empty() {
        "image".to_string()
    } else {
        segments.join("_")
    };
    let host = url.host_str().unwrap_or("local");
    safe_component(&format!("{}_{}", host, path))
}

fn safe_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
