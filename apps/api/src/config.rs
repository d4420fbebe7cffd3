use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_public_base_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Owner bearer token guarding every write and analytics route.
    pub admin_token: String,
    /// `None` keeps generation on its deterministic fallbacks.
    pub anthropic_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub public_base_url: String,
    pub portfolio_path: String,
    pub chrome_path: Option<String>,
    pub analytics_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = optional("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let s3_endpoint = require("S3_ENDPOINT")?;
        let s3_bucket = require("S3_BUCKET")?;
        let s3_public_base_url = optional("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket));

        let analytics_cache_ttl_secs = optional("ANALYTICS_CACHE_TTL_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse::<u64>()
            .context("ANALYTICS_CACHE_TTL_SECS must be a whole number of seconds")?;

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            s3_bucket,
            s3_endpoint,
            s3_public_base_url: s3_public_base_url.trim_end_matches('/').to_string(),
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            admin_token: require("ADMIN_TOKEN")?,
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            llm_base_url: optional("LLM_BASE_URL"),
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{port}"))
                .trim_end_matches('/')
                .to_string(),
            portfolio_path: optional("PORTFOLIO_PATH")
                .unwrap_or_else(|| "content/portfolio.json".to_string()),
            chrome_path: optional("CHROME_PATH"),
            analytics_cache_ttl_secs,
            port,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Absolute URL of an application's public page.
    pub fn public_url(&self, slug: &str) -> String {
        format!("{}/p/{}", self.public_base_url, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/folio"),
            ("REDIS_URL", "redis://localhost"),
            ("S3_BUCKET", "folio"),
            ("S3_ENDPOINT", "http://localhost:9000/"),
            ("AWS_ACCESS_KEY_ID", "minio"),
            ("AWS_SECRET_ACCESS_KEY", "minio123"),
            ("ADMIN_TOKEN", "owner-token"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(config.s3_public_base_url, "http://localhost:9000/folio");
        assert_eq!(config.portfolio_path, "content/portfolio.json");
        assert_eq!(config.analytics_cache_ttl_secs, 60);
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_missing_required_names_variable() {
        let mut env = base_env();
        env.remove("ADMIN_TOKEN");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("ADMIN_TOKEN"));
    }

    #[test]
    fn test_blank_api_key_is_treated_as_unset() {
        let mut env = base_env();
        env.insert("ANTHROPIC_API_KEY", "  ");
        assert!(load(&env).unwrap().anthropic_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut env = base_env();
        env.insert("PORT", "eighty");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_public_url_joins_slug() {
        let mut env = base_env();
        env.insert("PUBLIC_BASE_URL", "https://jobs.example.com/");
        let config = load(&env).unwrap();
        assert_eq!(
            config.public_url("acme-backend-x1y2z3"),
            "https://jobs.example.com/p/acme-backend-x1y2z3"
        );
    }
}
