pub mod image_client;

use crate::{
    error::Result,
    models::{GenerationRequest, ImageReference},
};
use async_trait::async_trait;

pub use image_client::ImageClient;

/// One generation attempt against some endpoint. The coordinator only talks to this.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference>;
}

#[async_trait]
impl GenerationBackend for ImageClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference> {
        ImageClient::generate(self, request).await
    }
}
