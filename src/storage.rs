use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use uuid::Uuid;

use crate::config::BlobConfig;
use crate::error::ApiError;

/// Blob store boundary: takes a base64-encoded image (optionally a `data:`
/// URL), stores it under the given folder and returns a durable public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_image(&self, image_base64: &str, folder: &str) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    pub async fn new(config: &BlobConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "static",
            ))
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload_image(&self, image_base64: &str, folder: &str) -> Result<String, ApiError> {
        let (content_type, payload) = split_data_url(image_base64);
        let body = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| ApiError::Validation("Invalid base64 image".into()))?;
        let ext = ext_from_mime(content_type).unwrap_or("bin");
        let key = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(Bytes::from(body)))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        Ok(format!("{}/{}/{}", self.public_base_url, self.bucket, key))
    }
}

/// Split an optional `data:<mime>;base64,<payload>` prefix off the input.
/// Bare base64 defaults to jpeg, matching what clients actually send.
fn split_data_url(input: &str) -> (&str, &str) {
    if let Some(rest) = input.strip_prefix("data:") {
        if let Some((mime, payload)) = rest.split_once(";base64,") {
            return (mime, payload);
        }
    }
    ("image/jpeg", input)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
