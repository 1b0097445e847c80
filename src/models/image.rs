use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Path the endpoint serves the most recent image from.
pub const IMAGE_PATH: &str = "generated_image.png";
pub const DEFAULT_DOWNLOAD_NAME: &str = "generated-image.png";

/// Body returned by `POST /generate`, on success and on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry: Option<bool>,
}

/// Where a finished image can be fetched, with its cache-busting stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub url: String,
    pub stamp: i64,
}

impl ImageReference {
    pub fn new(base_url: &str, stamp: i64) -> Self {
        Self {
            url: format!("{}/{}?t={}", base_url, IMAGE_PATH, stamp),
            stamp,
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Issues millisecond timestamps that never repeat, even for two successes
/// inside the same millisecond.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    pub fn reference(&self, base_url: &str) -> ImageReference {
        ImageReference::new(base_url, self.next_stamp())
    }
}
