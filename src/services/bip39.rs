use std::collections::HashSet;
use std::time::Duration;

use ethers::signers::coins_bip39::{English, Wordlist};
use serde::Serialize;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidWord {
    pub position: usize,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordValidation {
    pub is_valid: bool,
    pub invalid_words: Vec<InvalidWord>,
}

/// BIP39 English membership checks backed by a lazily loaded word set.
///
/// The set is loaded on first use and kept for the lifetime of the validator. When a
/// `source_url` is configured the list is fetched from it (a JSON array of words); otherwise,
/// or when the fetch fails, the embedded English list is used.
#[derive(Debug, Default)]
pub struct Bip39Validator {
    source_url: Option<String>,
    words: OnceCell<HashSet<String>>,
}

impl Bip39Validator {
    pub fn new(source_url: Option<String>) -> Self {
        Self {
            source_url: source_url.filter(|url| !url.trim().is_empty()),
            words: OnceCell::new(),
        }
    }

    /// Validator that is already loaded with `words`.
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();
        Self {
            source_url: None,
            words: OnceCell::new_with(Some(set)),
        }
    }

    async fn wordlist(&self) -> &HashSet<String> {
        self.words
            .get_or_init(|| async {
                if let Some(url) = self.source_url.as_deref() {
                    match fetch_wordlist(url).await {
                        Ok(words) if !words.is_empty() => {
                            tracing::debug!("Loaded {} BIP39 words from {}", words.len(), url);
                            return words;
                        }
                        Ok(_) => tracing::warn!("BIP39 wordlist at {} is empty", url),
                        Err(e) => tracing::warn!("Failed to load BIP39 wordlist: {}", e),
                    }
                }
                embedded_wordlist()
            })
            .await
    }

    pub async fn is_valid_word(&self, word: &str) -> bool {
        let normalized = word.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }
        self.wordlist().await.contains(&normalized)
    }

    /// Checks every non-blank entry; blank or missing entries are not errors.
    pub async fn validate_words(&self, words: &[Option<String>]) -> WordValidation {
        let wordlist = self.wordlist().await;
        let invalid_words: Vec<InvalidWord> = words
            .iter()
            .enumerate()
            .filter_map(|(position, word)| {
                let word = word.as_deref()?;
                let normalized = word.trim().to_lowercase();
                if normalized.is_empty() || wordlist.contains(&normalized) {
                    return None;
                }
                Some(InvalidWord {
                    position,
                    word: word.to_string(),
                })
            })
            .collect();

        WordValidation {
            is_valid: invalid_words.is_empty(),
            invalid_words,
        }
    }
}

fn embedded_wordlist() -> HashSet<String> {
    English::get_all()
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

async fn fetch_wordlist(url: &str) -> Result<HashSet<String>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let words: Vec<String> = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(words.into_iter().map(|w| w.to_lowercase()).collect())
}
