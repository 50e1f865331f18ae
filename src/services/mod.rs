// All service modules
pub mod bip39;
pub mod image_generator;
pub mod pricing;
pub mod selection;
pub mod treasury;

// Re-export for convenience
pub use bip39::Bip39Validator;
pub use image_generator::ImageGenerator;
pub use selection::{Selection, SelectionError};
pub use treasury::Treasury;
