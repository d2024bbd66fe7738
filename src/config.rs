use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL prepended to `bucket/key` when building the durable public URL.
    pub public_base_url: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub google_client_id: String,
    /// None when the blob store is unconfigured; upload-dependent endpoints
    /// then fail per request instead of the process refusing to start.
    pub blob: Option<BlobConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let google_client_id =
            std::env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID is not configured")?;

        let blob = match std::env::var("S3_ENDPOINT") {
            Ok(endpoint) => Some(BlobConfig {
                endpoint,
                bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "tripdeck".into()),
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY is not set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY is not set")?,
                public_base_url: std::env::var("S3_PUBLIC_BASE_URL")
                    .context("S3_PUBLIC_BASE_URL is not set")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            google_client_id,
            blob,
        })
    }
}
