use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{AppError, Result};

/// Decodes stored image text, raw base64 or a `data:` URL, into bytes.
pub fn decode_image_base64(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::BadRequest("Malformed data URL".to_string()))?,
        None => trimmed,
    };

    STANDARD
        .decode(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 image: {}", e)))
}
