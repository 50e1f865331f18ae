// src/models/mod.rs
pub mod game;
pub mod payment;

pub use game::{
    GmProof,
    GmVerifyRequest,
    GmVerifyResponse,
    GuessGrid,
    ImageMetadata,
    ImageResponse,
    StoredImage,
    WithdrawResponse,
};
pub use payment::{
    FacilitatorRequest,
    PaymentRequired,
    PaymentRequirements,
    ResourceInfo,
    SettleResponse,
    VerifyResponse,
};
