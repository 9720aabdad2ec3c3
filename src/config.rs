use std::{env, net::SocketAddr, time::Duration};

use crate::error::ConfigError;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_SALES_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub sales_api_base_url: String,
    pub sales_api_token: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_addr = var_or("REVENUE_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: "REVENUE_LISTEN_ADDR",
                value: listen_addr.clone(),
            })?;

        let sales_api_base_url = var_or("SALES_API_BASE_URL", DEFAULT_SALES_API_BASE_URL);
        if !(sales_api_base_url.starts_with("http://") || sales_api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                name: "SALES_API_BASE_URL",
                value: sales_api_base_url,
            });
        }

        let sales_api_token = env::var("SALES_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let request_timeout = match env::var("REQUEST_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::InvalidValue {
                    name: "REQUEST_TIMEOUT_MS",
                    value: raw,
                })?,
            Err(_) => Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        };

        Ok(Self {
            listen_addr,
            sales_api_base_url,
            sales_api_token,
            request_timeout,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_owned())
}
