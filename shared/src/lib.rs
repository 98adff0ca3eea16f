//! Cross-cutting pieces of the API: configuration, the route guard, logging
//! setup and the state handed to every invocation.

pub mod auth;
pub mod config;
pub mod telemetry;

use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use mila_atoms::media::{ObjectStorage, S3ObjectStorage};
use mila_atoms::properties::{DynamoPropertyRepository, PropertyRepository};

pub use auth::{AuthContext, AuthError, BearerTokenGuard, RouteGuard};
pub use config::Config;

const FALLBACK_REGION: &str = "us-east-1";

/// Built once at cold start and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub properties: Arc<dyn PropertyRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub guard: Arc<dyn RouteGuard>,
}

impl AppState {
    pub fn new(
        config: Config,
        properties: Arc<dyn PropertyRepository>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let guard = Arc::new(BearerTokenGuard::new(config.api_tokens.clone()));
        Self {
            config,
            properties,
            storage,
            guard,
        }
    }

    /// DynamoDB table and S3 bucket from the ambient AWS configuration.
    pub async fn from_config(config: Config) -> Self {
        let aws_config = aws_config::load_from_env().await;
        let region = aws_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string());

        let dynamo_client = DynamoClient::new(&aws_config);
        let s3_client = S3Client::new(&aws_config);

        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| S3ObjectStorage::default_public_base_url(&config.bucket_name, &region));

        tracing::info!(
            "Using table {} and bucket {} ({})",
            config.table_name,
            config.bucket_name,
            public_base_url
        );

        let properties = Arc::new(DynamoPropertyRepository::new(
            dynamo_client,
            config.table_name.clone(),
        ));
        let storage = Arc::new(S3ObjectStorage::new(
            s3_client,
            config.bucket_name.clone(),
            config.key_prefix.clone(),
            public_base_url,
        ));

        Self::new(config, properties, storage)
    }
}
