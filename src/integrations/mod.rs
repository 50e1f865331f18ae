pub mod facilitator;
pub mod game_api;
pub mod openai;

pub use facilitator::{HttpFacilitator, PaymentFacilitator};
pub use game_api::{GameApiClient, ImageFetch};
pub use openai::OpenAiImageClient;
