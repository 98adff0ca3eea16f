use std::env;

pub const DEFAULT_TABLE_NAME: &str = "mila";
pub const DEFAULT_BUCKET_NAME: &str = "mila-properties";

/// Runtime settings, read once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    pub key_prefix: String,
    /// Overrides `https://<bucket>.s3.<region>.amazonaws.com`.
    pub public_base_url: Option<String>,
    pub api_tokens: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Loads a local `.env` when present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cors_allowed_origins = match non_empty("CORS_ALLOWED_ORIGINS") {
            Some(origins) => split_list(&origins),
            None => vec!["*".to_string()],
        };

        Self {
            table_name: non_empty("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            bucket_name: non_empty("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            key_prefix: non_empty("S3_KEY_PREFIX").unwrap_or_default(),
            public_base_url: non_empty("S3_PUBLIC_BASE_URL"),
            api_tokens: non_empty("API_TOKENS").map(|v| split_list(&v)).unwrap_or_default(),
            cors_allowed_origins,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
