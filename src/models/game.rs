use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{IMAGE_ID_PREFIX, MNEMONIC_WORD_COUNT, SINGLE_GUESS_ID};
use crate::services::selection::Selection;

// ==================== IMAGES ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: String,
    pub base64: String,
    pub indices: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub price: Decimal,
}

impl StoredImage {
    /// Record for a freshly generated image, priced from its selection.
    pub fn new(base64: String, selection: &Selection, created_at: DateTime<Utc>) -> Self {
        Self {
            id: image_id(created_at, selection.indices()),
            base64,
            indices: selection.indices().to_vec(),
            created_at,
            price: selection.price(),
        }
    }

    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            id: self.id.clone(),
            indices: self.indices.clone(),
            created_at: self.created_at,
            price: self.price,
        }
    }
}

/// Lightweight projection of [`StoredImage`] kept in the metadata index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub indices: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub price: Decimal,
}

/// `image_<millis>_<i1>_<i2>...`
pub fn image_id(created_at: DateTime<Utc>, indices: &[u8]) -> String {
    let mut id = format!("{}_{}", IMAGE_ID_PREFIX, created_at.timestamp_millis());
    for index in indices {
        id.push('_');
        id.push_str(&index.to_string());
    }
    id
}

// ==================== GUESSES ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessGrid {
    pub id: String,
    pub guesses: Vec<Option<String>>,
    pub timestamp: DateTime<Utc>,
}

impl GuessGrid {
    /// Builds the single grid from raw input, normalizing every position.
    pub fn normalized(raw: &[Option<String>], timestamp: DateTime<Utc>) -> Self {
        let guesses = (0..MNEMONIC_WORD_COUNT)
            .map(|i| raw.get(i).and_then(|w| normalize_guess_word(w.as_deref()?)))
            .collect();
        Self {
            id: SINGLE_GUESS_ID.to_string(),
            guesses,
            timestamp,
        }
    }

    pub fn filled(&self) -> usize {
        self.guesses.iter().filter(|g| g.is_some()).count()
    }

    /// Space separated phrase with blanks for unknown positions.
    pub fn phrase(&self) -> String {
        self.guesses
            .iter()
            .map(|g| g.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Keeps ASCII letters only, lowercased; `None` when nothing is left.
pub fn normalize_guess_word(word: &str) -> Option<String> {
    let cleaned: String = word
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

// ==================== API PAYLOADS ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub indices: Vec<u8>,
    pub base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmProof {
    pub address: String,
    pub timestamp: i64,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GmVerifyRequest {
    pub address: Option<String>,
    pub message: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GmVerifyResponse {
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResponse {
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn image_id_joins_timestamp_and_indices() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(image_id(at, &[3, 0, 17]), "image_1700000000123_3_0_17");
    }

    #[test]
    fn stored_image_takes_price_from_selection() {
        let selection = Selection::parse("1,2").unwrap();
        let image = StoredImage::new("aGVsbG8=".to_string(), &selection, Utc::now());
        assert_eq!(image.price, Decimal::new(7, 0));
        assert_eq!(image.metadata().indices, vec![1, 2]);
    }

    #[test]
    fn normalize_guess_word_strips_non_letters() {
        assert_eq!(normalize_guess_word(" Ab1le! "), Some("able".to_string()));
        assert_eq!(normalize_guess_word("123"), None);
        assert_eq!(normalize_guess_word(""), None);
    }

    #[test]
    fn normalized_grid_always_has_24_positions() {
        let grid = GuessGrid::normalized(&[Some("ABLE".to_string()), None], Utc::now());
        assert_eq!(grid.guesses.len(), 24);
        assert_eq!(grid.guesses[0].as_deref(), Some("able"));
        assert_eq!(grid.filled(), 1);
        assert_eq!(grid.id, "single_guess");

        let long: Vec<Option<String>> = (0..30).map(|_| Some("zoo".to_string())).collect();
        assert_eq!(GuessGrid::normalized(&long, Utc::now()).guesses.len(), 24);
    }

    #[test]
    fn phrase_keeps_gaps() {
        let grid = GuessGrid::normalized(
            &[Some("able".to_string()), None, Some("zoo".to_string())],
            Utc::now(),
        );
        assert!(grid.phrase().starts_with("able  zoo"));
    }
}
