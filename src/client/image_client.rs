use crate::{
    config::Config,
    error::{GenerationError, Result},
    logger,
    models::{CacheBuster, GenerateResponse, GenerationRequest, ImageReference},
};
use reqwest::{header, Client, StatusCode, Url};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    base_url: String,
    cache_buster: Arc<CacheBuster>,
}

impl ImageClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url().to_string();
        Url::parse(&base_url).map_err(|e| {
            GenerationError::Config(format!("Invalid API URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            cache_buster: Arc::new(CacheBuster::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single `POST /generate` attempt. Retrying is the coordinator's job.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference> {
        let _timer = logger::timer("generate request");
        log::info!(
            "Sending request with quality '{}' ({} chars)",
            request.quality(),
            request.char_count()
        );
        log::debug!("Prompt: {}", request.prompt());

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;
        log::debug!("Response {}: {}", status, preview(&body));

        interpret_response(status, &body)?;

        let image = self.cache_buster.reference(&self.base_url);
        log::info!("Image ready at {}", image);
        Ok(image)
    }

    /// Fetches `image` and writes it to `path`.
    pub async fn download(&self, image: &ImageReference, path: &Path) -> Result<PathBuf> {
        let _timer = logger::timer("image download");

        let response = self
            .client
            .get(&image.url)
            .send()
            .await
            .map_err(|e| download_error(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(format!("failed to read body: {}", e)))?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| download_error(format!("failed to write {}: {}", path.display(), e)))?;

        log::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path.to_path_buf())
    }
}

fn download_error(detail: String) -> GenerationError {
    log::error!("Download error: {}", detail);
    GenerationError::Download(detail)
}

fn classify_transport_error(e: reqwest::Error) -> GenerationError {
    log::error!("Error details: {}", e);
    if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_connect() || e.is_request() {
        GenerationError::NetworkUnreachable(e.to_string())
    } else if e.is_decode() || e.is_body() {
        GenerationError::MalformedResponse(e.to_string())
    } else {
        GenerationError::Client(e.to_string())
    }
}

/// Maps a received status and body onto success or a classified failure.
pub(crate) fn interpret_response(status: StatusCode, body: &str) -> Result<()> {
    let parsed: Option<GenerateResponse> = serde_json::from_str(body).ok();

    if status.is_success() {
        return match parsed {
            Some(reply) if reply.success => Ok(()),
            Some(reply) => Err(GenerationError::Service {
                status: Some(status.as_u16()),
                message: reply.error.unwrap_or_else(|| "Unknown error".to_string()),
                retryable: reply.retry.unwrap_or(false),
            }),
            None => Err(GenerationError::MalformedResponse(preview(body))),
        };
    }

    let retry_flag = parsed.as_ref().and_then(|reply| reply.retry).unwrap_or(false);
    let message = parsed
        .and_then(|reply| reply.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    log::error!("Error response {}: {}", status, message);
    Err(GenerationError::Service {
        status: Some(status.as_u16()),
        message,
        retryable: status == StatusCode::SERVICE_UNAVAILABLE || retry_flag,
    })
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
