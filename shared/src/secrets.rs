//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Config, Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    // Check cache first
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Pull the API token out of a secret: either `{"token": "..."}` or the raw token.
pub fn parse_token(secret_string: &str) -> Result<String> {
    let trimmed = secret_string.trim();
    let token = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(fields)) => fields
            .get("token")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Config("Secret JSON has no token field".to_string()))?,
        _ => trimmed.to_string(),
    };

    if token.is_empty() {
        return Err(Error::Config("Store API token is empty".to_string()));
    }
    Ok(token)
}

/// The store API token: `NOTION_TOKEN` when set, otherwise the configured secret.
pub async fn get_notion_token(client: &SecretsClient, config: &Config) -> Result<String> {
    if let Some(token) = &config.notion_token {
        return parse_token(token);
    }

    let secret_arn = config
        .notion_secret_arn
        .as_deref()
        .ok_or_else(|| Error::Config("NOTION_SECRET_ARN not set".to_string()))?;
    parse_token(&get_secret(client, secret_arn).await?)
}

/// Clear the secrets cache (useful for testing or credential rotation).
pub async fn clear_cache() {
    let mut cache = get_cache().write().await;
    cache.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token(r#"{"token":"secret_abc"}"#).unwrap(), "secret_abc");
        assert_eq!(parse_token("  secret_abc\n").unwrap(), "secret_abc");
        assert!(matches!(parse_token(r#"{"key":"x"}"#), Err(Error::Config(_))));
        assert!(matches!(parse_token("   "), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_cache_clear() {
        get_cache()
            .write()
            .await
            .insert("arn:test".to_string(), "value".to_string());
        clear_cache().await;
        assert!(get_cache().read().await.is_empty());
    }
}
