use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::{Address, U256},
    utils::to_checksum,
};

use crate::{
    config::Config,
    crypto::SignatureVerifier,
    error::{AppError, Result},
    models::{GmProof, GmVerifyRequest},
};

abigen!(
    Erc20Token,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function transfer(address to, uint256 amount) external returns (bool)
    ]"#,
);

/// The wallet derived from the hidden phrase.
#[derive(Clone, Debug)]
pub struct Treasury {
    wallet: LocalWallet,
    rpc_url: String,
    usdc_address: Address,
    pay_to: Address,
    available_after: DateTime<Utc>,
}

impl Treasury {
    pub fn from_config(config: &Config) -> Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(config.mnemonic.as_str())
            .build()
            .map_err(|e| AppError::Internal(format!("Invalid mnemonic: {}", e)))?;

        Ok(Self {
            wallet,
            rpc_url: config.rpc_url.clone(),
            usdc_address: parse_address(&config.usdc_address, "USDC_ADDRESS")?,
            pay_to: parse_address(&config.pay_to_address, "PAY_TO_ADDRESS")?,
            available_after: config.withdraw_available_after,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn address_checksum(&self) -> String {
        to_checksum(&self.address(), None)
    }

    /// Signs `gm<millis>` so players can check the server holds the phrase.
    pub async fn gm_proof(&self, now: DateTime<Utc>) -> Result<GmProof> {
        let timestamp = now.timestamp_millis();
        let message = format!("gm{}", timestamp);
        let signature = self
            .wallet
            .sign_message(&message)
            .await
            .map_err(|e| AppError::Internal(format!("Signing failed: {}", e)))?;

        Ok(GmProof {
            address: self.address_checksum(),
            timestamp,
            message,
            signature: format!("0x{}", signature),
        })
    }

    /// Checks a signature claimed to come from the treasury wallet.
    pub fn verify(&self, request: &GmVerifyRequest) -> Result<bool> {
        let (address, message, signature) = match (
            non_blank(request.address.as_deref()),
            non_blank(request.message.as_deref()),
            non_blank(request.signature.as_deref()),
        ) {
            (Some(a), Some(m), Some(s)) => (a, m, s),
            _ => {
                return Err(AppError::BadRequest(
                    "Missing required fields: address, message, and signature".to_string(),
                ))
            }
        };

        if !address.eq_ignore_ascii_case(&self.address_checksum()) {
            return Err(AppError::BadRequest("Invalid address".to_string()));
        }

        SignatureVerifier::verify_signature(address, message, signature)
    }

    pub fn withdrawal_open(&self, now: DateTime<Utc>) -> bool {
        now > self.available_after
    }

    pub fn available_after(&self) -> DateTime<Utc> {
        self.available_after
    }

    /// Moves the whole USDC balance to the pay-to address.
    pub async fn withdraw(&self, now: DateTime<Utc>) -> Result<String> {
        if !self.withdrawal_open(now) {
            return Err(AppError::Forbidden(
                "Withdrawal not available yet".to_string(),
                Some(serde_json::json!({
                    "availableAfter": self.available_after.to_rfc3339()
                })),
            ));
        }

        let provider = Provider::<Http>::try_from(self.rpc_url.as_str())
            .map_err(|e| AppError::BlockchainRPC(format!("Invalid RPC URL: {}", e)))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        let wallet = self.wallet.clone().with_chain_id(chain_id.as_u64());
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let usdc = Erc20Token::new(self.usdc_address, client);

        let balance: U256 = usdc
            .balance_of(self.address())
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        if balance.is_zero() {
            return Err(AppError::BadRequest(
                "No USDC balance to withdraw".to_string(),
            ));
        }

        tracing::info!(
            "Withdrawing {} USDC units from {} to {:?}",
            balance,
            self.address_checksum(),
            self.pay_to
        );

        let call = usdc.transfer(self.pay_to, balance);
        let pending = call
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        Ok(format!("{:?}", pending.tx_hash()))
    }
}

fn parse_address(raw: &str, name: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|_| AppError::Internal(format!("{} is not a valid address", name)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
