use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    services::selection::Selection,
};

/// Turns a prompt into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Base64 encoded image, or `None` when the provider answered without one.
    async fn generate(&self, prompt: &str) -> Result<Option<String>>;
}

/// Words of the hidden phrase at the selected positions, in selection order.
pub fn words_for_selection(mnemonic: &str, selection: &Selection) -> Result<Vec<String>> {
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    if selection
        .indices()
        .iter()
        .any(|idx| usize::from(*idx) >= words.len())
    {
        return Err(AppError::BadRequest(format!(
            "Index out of range. Mnemonic has {} words (0-{})",
            words.len(),
            words.len().saturating_sub(1)
        )));
    }

    Ok(selection
        .indices()
        .iter()
        .map(|idx| words[usize::from(*idx)].to_string())
        .collect())
}

pub fn build_prompt(words: &[String]) -> String {
    format!(
        "generate image combining {} with no text or words in the image",
        words.join(" and ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "alpha bravo charlie delta";

    #[test]
    fn words_follow_selection_order() {
        let selection = Selection::parse("3,0").unwrap();
        let words = words_for_selection(PHRASE, &selection).unwrap();
        assert_eq!(words, vec!["delta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn index_past_phrase_length_is_rejected() {
        let selection = Selection::parse("1,10").unwrap();
        let err = words_for_selection(PHRASE, &selection).unwrap_err();
        assert!(err.to_string().contains("Mnemonic has 4 words (0-3)"));
    }

    #[test]
    fn prompt_joins_words_with_and() {
        let prompt = build_prompt(&["delta".to_string(), "alpha".to_string()]);
        assert_eq!(
            prompt,
            "generate image combining delta and alpha with no text or words in the image"
        );
    }
}
