use super::{ImageReference, Quality};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    /// Informational, an automatic retry is pending.
    Retrying,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            text: text.into(),
        }
    }

    pub fn retrying(attempt: u32, max_retries: u32) -> Self {
        Self {
            kind: BannerKind::Retrying,
            text: format!(
                "Model is loading, retrying automatically... (Attempt {}/{})",
                attempt, max_retries
            ),
        }
    }
}

/// Observable state of one generation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub loading: bool,
    pub in_flight: bool,
    pub retry_count: u32,
    pub max_retries: u32,
    pub quality: Quality,
    pub banner: Option<Banner>,
    pub show_success: bool,
    pub image: Option<ImageReference>,
}

impl SessionState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            loading: false,
            in_flight: false,
            retry_count: 0,
            max_retries,
            quality: Quality::default(),
            banner: None,
            show_success: false,
            image: None,
        }
    }

    /// Clears everything a fresh submission replaces.
    pub fn begin(&mut self, quality: Quality) {
        self.loading = true;
        self.quality = quality;
        self.banner = None;
        self.show_success = false;
        self.image = None;
        self.retry_count = 0;
    }

    /// Label of the submit control.
    pub fn status_line(&self) -> String {
        if !self.loading {
            "Generate Image".to_string()
        } else if self.retry_count > 0 {
            format!(
                "Retrying... (Attempt {}/{})",
                self.retry_count, self.max_retries
            )
        } else {
            self.quality.progress_message().to_string()
        }
    }

    pub fn success_message(&self) -> Option<&'static str> {
        self.show_success.then_some("Image generated successfully!")
    }
}
