//! HTTP client for the Sina hq quote feed.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::GBK;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::Client;

use crate::errors::{QuoteError, Result};
use crate::fetcher::{QuoteFetcher, MAX_BATCH_SIZE};

/// The feed rejects requests without a browser-like identity.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36";

const SINA_REFERER: &str = "https://finance.sina.com.cn/";

/// Primary and fallback endpoints, tried in order per batch.
const BASE_URLS: &[&str] = &["https://hq.sinajs.cn/list=", "http://hq.sinajs.cn/list="];

pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Fetcher for the Sina hq endpoint.
///
/// The response body is GBK-encoded; it is decoded here so everything
/// downstream works on UTF-8 strings.
pub struct SinaFetcher {
    client: Client,
}

impl SinaFetcher {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .default_headers(sina_headers())
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { client }
    }

    /// GET one URL and decode the body.
    async fn fetch_url(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(decode_body(&bytes))
    }
}

impl Default for SinaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteFetcher for SinaFetcher {
    async fn fetch_batch(&self, symbols: &[String]) -> Result<String> {
        // The scheduler chunks the watch-list; cap here regardless so a
        // direct caller cannot trip the upstream limit.
        let batch = &symbols[..symbols.len().min(MAX_BATCH_SIZE)];
        let joined = batch.join(",");

        let mut last_err: Option<QuoteError> = None;
        for base in BASE_URLS {
            let url = format!("{}{}", base, joined);
            match self.fetch_url(&url).await {
                Ok(text) => {
                    debug!("fetched {} symbols ({} bytes)", batch.len(), text.len());
                    return Ok(text);
                }
                Err(e) => {
                    warn!("fetch via {} failed: {}", base, e);
                    last_err = Some(e);
                }
            }
        }

        // BASE_URLS is non-empty, so last_err is always set here.
        Err(last_err.expect("no endpoint attempted"))
    }
}

fn sina_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static(SINA_REFERER));
    headers
}

/// Decode the GBK response body, falling back to lossy UTF-8 when the
/// decoder reports malformed input. Never fails.
fn decode_body(bytes: &[u8]) -> String {
    let (text, _, had_errors) = GBK.decode(bytes);
    if had_errors {
        warn!("GBK decode reported errors, falling back to lossy UTF-8");
        return String::from_utf8_lossy(bytes).into_owned();
    }
    text.into_owned()
}
