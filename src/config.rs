use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_FACILITATOR_URL, DEFAULT_IMAGE_MODEL, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_PAY_TO, DEFAULT_RPC_URL, DEFAULT_WITHDRAW_AVAILABLE_AFTER, MNEMONIC_WORD_COUNT,
    PAYMENT_NETWORK_BASE, USDC_BASE_ADDRESS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub public_base_url: Option<String>,

    // Hidden phrase / treasury
    pub mnemonic: String,
    pub rpc_url: String,
    pub withdraw_available_after: DateTime<Utc>,

    // Image provider
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub image_model: String,

    // Payment
    pub pay_to_address: String,
    pub payment_network: String,
    pub usdc_address: String,
    pub facilitator_url: String,
    pub facilitator_api_key: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .or_else(|_| env::var("APP_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let withdraw_available_after = env::var("WITHDRAW_AVAILABLE_AFTER")
            .unwrap_or_else(|_| DEFAULT_WITHDRAW_AVAILABLE_AFTER.to_string())
            .parse::<DateTime<Utc>>()?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            public_base_url: non_empty_var("PUBLIC_BASE_URL"),

            mnemonic: env::var("MNEMONIC")
                .map_err(|_| anyhow::anyhow!("MNEMONIC environment variable is not set"))?,
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            withdraw_available_after,

            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            image_model: env::var("IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),

            pay_to_address: env::var("PAY_TO_ADDRESS").unwrap_or_else(|_| DEFAULT_PAY_TO.to_string()),
            payment_network: env::var("PAYMENT_NETWORK")
                .unwrap_or_else(|_| PAYMENT_NETWORK_BASE.to_string()),
            usdc_address: env::var("USDC_ADDRESS").unwrap_or_else(|_| USDC_BASE_ADDRESS.to_string()),
            facilitator_url: env::var("FACILITATOR_URL")
                .unwrap_or_else(|_| DEFAULT_FACILITATOR_URL.to_string()),
            facilitator_api_key: non_empty_var("FACILITATOR_API_KEY"),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let words = self.mnemonic_words();
        if words.is_empty() {
            anyhow::bail!("MNEMONIC is empty");
        }
        if words.len() != MNEMONIC_WORD_COUNT {
            anyhow::bail!(
                "MNEMONIC must have {} words, found {}",
                MNEMONIC_WORD_COUNT,
                words.len()
            );
        }
        if !self.pay_to_address.starts_with("0x") || self.pay_to_address.len() != 42 {
            anyhow::bail!("PAY_TO_ADDRESS is not a valid EVM address");
        }
        if self.facilitator_url.trim().is_empty() {
            anyhow::bail!("FACILITATOR_URL is empty");
        }

        if self.payment_network != PAYMENT_NETWORK_BASE {
            tracing::warn!("Payment network {} is not Base mainnet", self.payment_network);
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn mnemonic_words(&self) -> Vec<&str> {
        self.mnemonic.split_whitespace().collect()
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        self.payment_network != PAYMENT_NETWORK_BASE
    }
}

/// Settings for the `hunt` player client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub bip39_wordlist_url: Option<String>,
    pub payment_signature: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(ClientConfig {
            api_url: env::var("HUNT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            bip39_wordlist_url: non_empty_var("BIP39_WORDLIST_URL"),
            payment_signature: non_empty_var("HUNT_PAYMENT_SIGNATURE"),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if url::Url::parse(&self.api_url).is_err() {
            anyhow::bail!("HUNT_API_URL is not a valid URL");
        }
        if self.database_max_connections == 0 {
            tracing::warn!("DATABASE_MAX_CONNECTIONS should be > 0");
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    pub(crate) fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            public_base_url: None,
            mnemonic: TEST_MNEMONIC.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            withdraw_available_after: DEFAULT_WITHDRAW_AVAILABLE_AFTER.parse().unwrap(),
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            pay_to_address: DEFAULT_PAY_TO.to_string(),
            payment_network: PAYMENT_NETWORK_BASE.to_string(),
            usdc_address: USDC_BASE_ADDRESS.to_string(),
            facilitator_url: DEFAULT_FACILITATOR_URL.to_string(),
            facilitator_api_key: None,
            cors_allowed_origins: "*".to_string(),
        }
    }

    #[test]
    fn validate_accepts_24_word_phrase() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_phrase() {
        let mut config = test_config();
        config.mnemonic = "abandon abandon about".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_pay_to() {
        let mut config = test_config();
        config.pay_to_address = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn development_counts_as_testnet() {
        let mut config = test_config();
        assert!(config.is_testnet());
        config.environment = "production".to_string();
        assert!(!config.is_testnet());
    }
}
