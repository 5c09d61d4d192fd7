use anyhow::Context;
use std::env;

/// Tickers offered by `/api/v1/trending` when none are configured.
pub const DEFAULT_TRENDING: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "JPM", "V", "UNH",
];

/// Most tickers returned by the trending endpoint.
pub const MAX_TRENDING: usize = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub polygon_api_key: String,
    pub polygon_rate_limit: usize,
    pub trending: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let polygon_api_key = env::var("POLYGON_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .context("POLYGON_API_KEY must be set")?;

        let trending = env::var("TRENDING_TICKERS")
            .ok()
            .map(|raw| split_list(&raw, true))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_TRENDING.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            allowed_origins: split_list(
                &env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
                false,
            ),
            polygon_api_key,
            polygon_rate_limit: env::var("POLYGON_RATE_LIMIT")
                .unwrap_or_else(|_| polygon_client::DEFAULT_RATE_LIMIT.to_string())
                .parse()
                .context("POLYGON_RATE_LIMIT must be an integer")?,
            trending,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_list(raw: &str, uppercase: bool) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if uppercase { s.to_uppercase() } else { s.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" aapl, ,msft ", true), vec!["AAPL", "MSFT"]);
        assert_eq!(
            split_list("http://localhost:3000, http://127.0.0.1:3000", false),
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert!(split_list("", false).is_empty());
    }

    #[test]
    fn test_default_trending_fits_limit() {
        assert!(DEFAULT_TRENDING.len() <= MAX_TRENDING);
    }
}
