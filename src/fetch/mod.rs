//! Document loading.
//!
//! `PageFetcher` turns a locator into the raw text of a page. Locators are
//! URLs: `http(s)://` for live shops and `file://` for captured pages replayed
//! in tests or offline runs. Every failure comes back as a `FetchError`; the
//! fetcher never retries.

mod request;

use std::time::Duration;

use scraper::Html;
use url::Url;

use crate::error_handling::FetchError;
pub(crate) use request::RequestHeaders;

/// A loaded page: the URL it was served from (after redirects) and its body.
///
/// The body is kept as text and parsed on demand with [`FetchedPage::document`],
/// so no parsed tree is held across an await point.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a document tree.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Loads catalog and product pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    delay: Duration,
}

impl PageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            delay: Duration::ZERO,
        }
    }

    /// Waits `delay` before every remote request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The underlying HTTP client, shared with the image store.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Loads the page at `locator`.
    ///
    /// # Errors
    ///
    /// - `Timeout` / `Network` / `Status` for transport failures
    /// - `Io` when a local file cannot be read
    /// - `ParseFailure` for unsupported schemes, non-HTML content types and
    ///   undecodable bodies
    pub async fn load(&self, locator: &Url) -> Result<FetchedPage, FetchError> {
        match locator.scheme() {
            "http" | "https" => self.load_remote(locator).await,
            "file" => load_file(locator).await,
            other => Err(FetchError::ParseFailure {
                locator: locator.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    async fn load_remote(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        log::debug!("GET {}", url);
        let response = RequestHeaders::apply_to_request_builder(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_document_content_type(content_type) {
                return Err(FetchError::ParseFailure {
                    locator: url.to_string(),
                    reason: format!("unexpected content type '{}'", content_type),
                });
            }
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}

async fn load_file(locator: &Url) -> Result<FetchedPage, FetchError> {
    let path = locator
        .to_file_path()
        .map_err(|_| FetchError::ParseFailure {
            locator: locator.to_string(),
            reason: "not a local file path".to_string(),
        })?;

    log::debug!("Reading {}", path.display());
    let bytes = tokio::fs::read(&path).await.map_err(|e| FetchError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let body = String::from_utf8(bytes).map_err(|e| FetchError::ParseFailure {
        locator: locator.to_string(),
        reason: format!("body is not valid UTF-8: {}", e),
    })?;

    Ok(FetchedPage {
        url: locator.clone(),
        body,
    })
}

fn is_document_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.contains("html") || mime.contains("xml") || mime == "text/plain"
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
