use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::export::PdfRenderer;
use crate::llm_client::LlmClient;
use crate::portfolio::Portfolio;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Analytics summary cache.
    pub redis: RedisClient,
    /// Logo storage.
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    /// Owner profile, experience and projects; read-only after startup.
    pub portfolio: Arc<Portfolio>,
    /// Pluggable HTML → PDF backend. Default: headless Chromium.
    pub pdf_renderer: Arc<dyn PdfRenderer>,
}
