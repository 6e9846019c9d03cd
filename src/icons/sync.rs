//! Favicon download and content-addressed icon cache.
//!
//! The server's icon-sync endpoint downloads a site's favicon from a fixed
//! provider and stores it under its SHA-256 digest, so identical icons
//! shared by several sites are written once.

use sha2::{Digest, Sha256};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use thiserror::Error;

use crate::constants::FAVICON_MAX_BYTES;
use crate::models::hostname_of;

/// Failures of a single icon sync.
#[derive(Error, Debug)]
pub enum IconSyncError {
    /// The site URL has no usable hostname.
    #[error("URL has no hostname: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or read.
    #[error("Favicon request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("Favicon provider returned HTTP {0}")]
    Status(u16),

    /// The provider answered with an empty body.
    #[error("Favicon response was empty")]
    Empty,

    /// The body exceeded the size limit.
    #[error("Favicon exceeds {limit} bytes")]
    TooLarge {
        /// The limit in bytes.
        limit: usize,
    },

    /// Writing the cache file failed.
    #[error("Could not store favicon: {0}")]
    Io(#[from] std::io::Error),
}

/// Boxed future returned by [`FaviconFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, IconSyncError>> + Send + 'a>>;

/// Downloads favicon bytes from a URL.
pub trait FaviconFetcher: Send + Sync {
    /// Fetches `url`, returning the response body.
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// A favicon stored in the icon cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIcon {
    /// Hostname the icon was fetched for.
    pub hostname: String,
    /// Cache file name (`<sha256>.<ext>`).
    pub asset: String,
    /// Full path of the cache file.
    pub path: PathBuf,
}

/// Sync request derived from a site URL: the hostname and the provider URL.
pub fn sync_target(provider_template: &str, site_url: &str) -> Result<(String, String), IconSyncError> {
    let hostname =
        hostname_of(site_url).ok_or_else(|| IconSyncError::InvalidUrl(site_url.to_string()))?;
    let url = provider_template.replace("{host}", &hostname);
    Ok((hostname, url))
}

/// Downloads the favicon for `site_url` and stores it in `icon_dir`.
pub async fn sync_icon(
    fetcher: &dyn FaviconFetcher,
    provider_template: &str,
    site_url: &str,
    icon_dir: &Path,
) -> Result<StoredIcon, IconSyncError> {
    let (hostname, url) = sync_target(provider_template, site_url)?;
    let bytes = fetcher.fetch(&url).await?;
    check_body(&bytes)?;

    let path = store_icon_bytes(icon_dir, &bytes)?;
    let asset = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::info!(%hostname, %asset, "Stored favicon");
    Ok(StoredIcon {
        hostname,
        asset,
        path,
    })
}

fn check_body(bytes: &[u8]) -> Result<(), IconSyncError> {
    if bytes.is_empty() {
        return Err(IconSyncError::Empty);
    }
    if bytes.len() > FAVICON_MAX_BYTES {
        return Err(IconSyncError::TooLarge {
            limit: FAVICON_MAX_BYTES,
        });
    }
    Ok(())
}

/// Response body collected chunk by chunk, refused once it outgrows the
/// limit instead of after it has been buffered whole.
#[derive(Debug)]
pub struct LimitedBody {
    bytes: Vec<u8>,
    limit: usize,
}

impl LimitedBody {
    /// An empty body capped at `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    /// Appends one chunk; fails without growing the buffer past `limit`.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), IconSyncError> {
        if self.bytes.len() + chunk.len() > self.limit {
            return Err(IconSyncError::TooLarge { limit: self.limit });
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    /// Bytes received so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was received.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The collected body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Writes `bytes` to `<dir>/<sha256>.<ext>` unless already present.
pub fn store_icon_bytes(dir: &Path, bytes: &[u8]) -> Result<PathBuf, IconSyncError> {
    fs::create_dir_all(dir)?;

    let digest = Sha256::digest(bytes);
    let filename = format!("{digest:x}.{}", sniff_extension(bytes));
    let path = dir.join(filename);
    if !path.exists() {
        fs::write(&path, bytes)?;
    }
    Ok(path)
}

/// File extension from an image's magic bytes; `ico` when unknown.
pub fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if is_svg(bytes) {
        "svg"
    } else {
        "ico"
    }
}

fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// `reqwest`-backed fetcher used by the server.
#[cfg(feature = "web")]
#[derive(Debug, Clone)]
pub struct HttpFaviconFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "web")]
impl HttpFaviconFetcher {
    /// Builds a client with the given request timeout.
    pub fn new(timeout: std::time::Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(8))
            .timeout(timeout)
            .connect_timeout(std::time::Duration::from_secs(4))
            .user_agent(concat!("StartDeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build favicon HTTP client")?;
        Ok(Self { client })
    }
}

#[cfg(feature = "web")]
impl FaviconFetcher for HttpFaviconFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let mut response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
                .send()
                .await
                .map_err(|err| IconSyncError::Request(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(IconSyncError::Status(status.as_u16()));
            }
            if let Some(length) = response.content_length() {
                if length as usize > FAVICON_MAX_BYTES {
                    return Err(IconSyncError::TooLarge {
                        limit: FAVICON_MAX_BYTES,
                    });
                }
            }

            // Chunked responses carry no length; enforce the cap while reading
            let mut body = LimitedBody::new(FAVICON_MAX_BYTES);
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|err| IconSyncError::Request(err.to_string()))?
            {
                body.push(&chunk)?;
            }
            Ok(body.into_bytes())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    #[test]
    fn test_sniff_extension() {
        assert_eq!(sniff_extension(PNG), "png");
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), "jpg");
        assert_eq!(sniff_extension(b"GIF89a...."), "gif");
        assert_eq!(sniff_extension(b"RIFF\0\0\0\0WEBPVP8 "), "webp");
        assert_eq!(sniff_extension(b"  <svg xmlns=\"\"></svg>"), "svg");
        assert_eq!(sniff_extension(&[0, 0, 1, 0]), "ico");
    }

    #[test]
    fn test_store_is_content_addressed() {
        let dir = TempDir::new().unwrap();

        let first = store_icon_bytes(dir.path(), PNG).unwrap();
        let second = store_icon_bytes(dir.path(), PNG).unwrap();

        assert_eq!(first, second);
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + ".png".len());
        assert_eq!(fs::read(&first).unwrap(), PNG);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_sync_target() {
        let (host, url) = sync_target("https://icons.example/{host}.ico", "GitHub.com/rust-lang").unwrap();
        assert_eq!(host, "github.com");
        assert_eq!(url, "https://icons.example/github.com.ico");

        assert!(matches!(
            sync_target("https://icons.example/{host}", "mailto:a@b.c"),
            Err(IconSyncError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_check_body_limits() {
        assert!(matches!(check_body(&[]), Err(IconSyncError::Empty)));
        assert!(matches!(
            check_body(&vec![0; FAVICON_MAX_BYTES + 1]),
            Err(IconSyncError::TooLarge { .. })
        ));
        assert!(check_body(PNG).is_ok());
    }

    #[test]
    fn test_limited_body_stops_at_limit() {
        let mut body = LimitedBody::new(8);
        body.push(&[1, 2, 3]).unwrap();
        body.push(&[4, 5, 6, 7, 8]).unwrap();
        assert_eq!(body.len(), 8);

        assert!(matches!(body.push(&[9]), Err(IconSyncError::TooLarge { limit: 8 })));
        assert_eq!(body.len(), 8, "rejected chunk is not buffered");
        assert_eq!(body.into_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_limited_body_rejects_oversized_stream() {
        let chunk = vec![0u8; 64 * 1024];
        let mut body = LimitedBody::new(FAVICON_MAX_BYTES);

        let mut accepted = 0;
        let result = loop {
            match body.push(&chunk) {
                Ok(()) => accepted += 1,
                Err(err) => break err,
            }
        };

        assert!(matches!(result, IconSyncError::TooLarge { .. }));
        assert_eq!(accepted, FAVICON_MAX_BYTES / chunk.len());
        assert!(body.len() <= FAVICON_MAX_BYTES);
    }
}
