mod support;

use std::time::Duration;

use axum::http::StatusCode;
use pixelforge::{Config, GenerationError, GenerationRequest, ImageClient, Quality};
use support::{closed_addr, start_server, FakeEndpoint, PNG_BYTES};

fn client_for(addr: std::net::SocketAddr) -> ImageClient {
    let config = Config::new().with_api_url(format!("http://{}", addr));
    ImageClient::new(&config).unwrap()
}

fn request(prompt: &str, quality: Quality) -> GenerationRequest {
    GenerationRequest::new(prompt, quality).unwrap()
}

#[tokio::test]
async fn test_generate_posts_prompt_and_quality() {
    let endpoint = FakeEndpoint::replying(vec![(
        StatusCode::OK,
        r#"{"success":true,"message":"Image generated successfully"}"#,
    )]);
    let (addr, _handle) = start_server(endpoint.clone()).await;
    let client = client_for(addr);

    let image = client
        .generate(&request("a cat", Quality::High))
        .await
        .unwrap();

    let prefix = format!("http://{}/generated_image.png?t=", addr);
    assert!(image.url.starts_with(&prefix), "unexpected url {}", image.url);
    assert!(image.url.ends_with(&image.stamp.to_string()));

    assert_eq!(endpoint.hits(), 1);
    assert_eq!(
        endpoint.bodies(),
        vec![serde_json::json!({ "prompt": "a cat", "quality": "high" })]
    );
    assert_eq!(endpoint.content_types(), vec!["application/json".to_string()]);
}

#[tokio::test]
async fn test_each_success_gets_a_fresh_cache_buster() {
    let endpoint = FakeEndpoint::replying(vec![(StatusCode::OK, r#"{"success":true}"#)]);
    let (addr, _handle) = start_server(endpoint).await;
    let client = client_for(addr);
    let request = request("a cat", Quality::Standard);

    let first = client.generate(&request).await.unwrap();
    let second = client.generate(&request).await.unwrap();
    let third = client.generate(&request).await.unwrap();

    assert_ne!(first.url, second.url);
    assert_ne!(second.url, third.url);
    assert!(first.stamp < second.stamp && second.stamp < third.stamp);
}

#[tokio::test]
async fn test_service_unavailable_is_retryable() {
    let endpoint = FakeEndpoint::replying(vec![(
        StatusCode::SERVICE_UNAVAILABLE,
        r#"{"error":"Model is loading, please try again in a few seconds","retry":true}"#,
    )]);
    let (addr, _handle) = start_server(endpoint).await;

    let err = client_for(addr)
        .generate(&request("a cat", Quality::Standard))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(
        err.to_string(),
        "Model is loading, please try again in a few seconds"
    );
}

#[tokio::test]
async fn test_client_error_is_terminal() {
    let endpoint = FakeEndpoint::replying(vec![(
        StatusCode::BAD_REQUEST,
        r#"{"error":"No prompt provided"}"#,
    )]);
    let (addr, _handle) = start_server(endpoint).await;

    let err = client_for(addr)
        .generate(&request("a cat", Quality::Standard))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GenerationError::Service {
            status: Some(400),
            message: "No prompt provided".into(),
            retryable: false,
        }
    );
}

#[tokio::test]
async fn test_malformed_success_body() {
    let endpoint = FakeEndpoint::replying(vec![(StatusCode::OK, "definitely not json")]);
    let (addr, _handle) = start_server(endpoint).await;

    let err = client_for(addr)
        .generate(&request("a cat", Quality::Standard))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::MalformedResponse(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let endpoint = FakeEndpoint::replying(vec![(StatusCode::OK, r#"{"success":true}"#)]);
    endpoint.set_delay(Duration::from_millis(500));
    let (addr, _handle) = start_server(endpoint).await;

    let config = Config::new()
        .with_api_url(format!("http://{}", addr))
        .with_timeout(Duration::from_millis(100));
    let client = ImageClient::new(&config).unwrap();

    let err = client
        .generate(&request("a cat", Quality::High))
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::Timeout);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let addr = closed_addr().await;

    let err = client_for(addr)
        .generate(&request("a cat", Quality::Standard))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::NetworkUnreachable(_)));
    assert_eq!(err.to_string(), "No response from server. Please try again.");
}

#[tokio::test]
async fn test_download_writes_image() {
    let endpoint = FakeEndpoint::replying(vec![(StatusCode::OK, r#"{"success":true}"#)]);
    let (addr, _handle) = start_server(endpoint).await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("generated-image.png");

    let image = client
        .generate(&request("a cat", Quality::Standard))
        .await
        .unwrap();
    let saved = client.download(&image, &target).await.unwrap();

    assert_eq!(saved, target);
    assert_eq!(std::fs::read(&target).unwrap(), PNG_BYTES);
}

#[tokio::test]
async fn test_download_failure_message() {
    let addr = closed_addr().await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();
    let image = pixelforge::ImageReference::new(&format!("http://{}", addr), 1);

    let err = client
        .download(&image, &dir.path().join("out.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Download(_)));
    assert_eq!(err.to_string(), "Failed to download image. Please try again.");
}
