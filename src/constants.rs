/// Application constants

// Hidden phrase
pub const MNEMONIC_WORD_COUNT: usize = 24;
pub const MIN_SELECTION_SIZE: usize = 2;
pub const MAX_SELECTION_SIZE: usize = 24;
pub const MAX_WORD_INDEX: i64 = 23;

// Payment
pub const X402_VERSION: u32 = 2;
pub const PAYMENT_SCHEME_EXACT: &str = "exact";
pub const PAYMENT_NETWORK_BASE: &str = "eip155:8453";
pub const USDC_BASE_ADDRESS: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const USDC_DECIMALS: u32 = 6;
pub const DEFAULT_PAY_TO: &str = "0xAD7c065112dCF8891b10F8e70eF74F5E4A168Fa4";
pub const DEFAULT_FACILITATOR_URL: &str = "https://x402.org/facilitator";
pub const PAYMENT_MAX_TIMEOUT_SECS: u64 = 300;
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";
pub const PAYMENT_SIGNATURE_HEADER: &str = "payment-signature";
pub const LEGACY_PAYMENT_HEADER: &str = "x-payment";
pub const PAYMENT_RESPONSE_HEADER: &str = "payment-response";
pub const IMAGE_RESOURCE_DESCRIPTION: &str =
    "Generate an image combining the words at the specified indices";

// Image provider
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-5-mini";

// Treasury
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_WITHDRAW_AVAILABLE_AFTER: &str = "2026-01-31T12:00:00Z";

// Player vault
pub const METADATA_INDEX_KEY: &str = "mnemonic_hunt_images";
pub const SINGLE_GUESS_KEY: &str = "mnemonic_hunt_single_guess";
pub const SINGLE_GUESS_ID: &str = "single_guess";
pub const IMAGE_ID_PREFIX: &str = "image";

// Player client
pub const DEFAULT_API_URL: &str = "https://x402.buildweekends.com";
