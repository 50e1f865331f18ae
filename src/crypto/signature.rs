use std::str::FromStr;

use ethers::types::{Address, Signature};

use crate::error::{AppError, Result};

/// Verifies wallet signatures (ECDSA, EIP-191).
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Verifies an EIP-191 personal-message signature.
    /// address: wallet address (0x...)
    /// message: the exact message that was signed
    /// signature: 65-byte signature as hex
    pub fn verify_signature(address: &str, message: &str, signature: &str) -> Result<bool> {
        if address.is_empty() || signature.is_empty() {
            return Err(AppError::BadRequest(
                "Address or signature cannot be empty".into(),
            ));
        }

        let address = Address::from_str(address.trim())
            .map_err(|_| AppError::BadRequest("Invalid address".into()))?;
        let signature =
            Signature::from_str(signature.trim()).map_err(|_| AppError::InvalidSignature)?;

        tracing::info!("Verifying signature for address: {:?}", address);

        Ok(signature.verify(message, address).is_ok())
    }
}
