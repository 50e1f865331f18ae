use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_SELECTION_SIZE, MAX_WORD_INDEX, MIN_SELECTION_SIZE};
use crate::services::pricing;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No indices selected. Expected 2-24 unique numbers in range 0-23 (e.g., idx=1,2 or idx=1,2,3,4,5)")]
    Empty,

    #[error("Invalid index '{0}'. Indices must be whole numbers separated by commas")]
    Unparseable(String),

    #[error("Invalid number of indices ({0}). Expected between 2 and 24")]
    BadCount(usize),

    #[error("Index {0} is out of range. All indices must be between 0 and 23")]
    OutOfRange(i64),

    #[error("Duplicate indices are not allowed. Each index must be unique.")]
    Duplicate(u8),
}

/// Validated set of mnemonic positions, kept in the order the player gave them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u8>")]
pub struct Selection(Vec<u8>);

impl Selection {
    /// Parses a raw `idx` value such as `"1, 2,3"`.
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::Empty);
        }

        let values = trimmed
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i64>()
                    .map_err(|_| SelectionError::Unparseable(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_values(&values)
    }

    /// Validates an already numeric list: count, then range, then uniqueness.
    pub fn from_values(values: &[i64]) -> Result<Self, SelectionError> {
        if values.is_empty() {
            return Err(SelectionError::Empty);
        }
        if values.len() < MIN_SELECTION_SIZE || values.len() > MAX_SELECTION_SIZE {
            return Err(SelectionError::BadCount(values.len()));
        }
        if let Some(bad) = values.iter().find(|v| **v < 0 || **v > MAX_WORD_INDEX) {
            return Err(SelectionError::OutOfRange(*bad));
        }

        let mut seen = HashSet::with_capacity(values.len());
        let mut indices = Vec::with_capacity(values.len());
        for value in values {
            let index = *value as u8;
            if !seen.insert(index) {
                return Err(SelectionError::Duplicate(index));
            }
            indices.push(index);
        }

        Ok(Self(indices))
    }

    pub fn indices(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fee for this selection. Always present for a validated selection.
    pub fn price(&self) -> Decimal {
        pricing::price_for(self.len()).unwrap_or(Decimal::ZERO)
    }

    /// Value for the `idx` query parameter.
    pub fn to_query(&self) -> String {
        self.join(",")
    }

    pub fn join(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<i64>> for Selection {
    type Error = SelectionError;

    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_values(&values)
    }
}

impl From<Selection> for Vec<u8> {
    fn from(selection: Selection) -> Self {
        selection.0
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_valid_list_and_keeps_order() {
        let selection = Selection::parse("5, 1,23").expect("valid selection");
        assert_eq!(selection.indices(), &[5, 1, 23]);
        assert_eq!(selection.to_query(), "5,1,23");
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(Selection::parse(""), Err(SelectionError::Empty));
        assert_eq!(Selection::parse("   "), Err(SelectionError::Empty));
    }

    #[test]
    fn parse_rejects_non_numeric_entries() {
        assert_eq!(
            Selection::parse("1,two"),
            Err(SelectionError::Unparseable("two".to_string()))
        );
        assert!(matches!(
            Selection::parse("1,,2"),
            Err(SelectionError::Unparseable(_))
        ));
    }

    #[test]
    fn every_size_outside_bounds_is_rejected() {
        for size in [1_usize, 25, 26, 30] {
            let values: Vec<i64> = (0..size as i64).map(|v| v % 24).collect();
            assert_eq!(
                Selection::from_values(&values),
                Err(SelectionError::BadCount(size)),
                "size {size}"
            );
        }
    }

    #[test]
    fn every_size_within_bounds_is_accepted() {
        for size in 2..=24_i64 {
            let values: Vec<i64> = (0..size).collect();
            assert!(Selection::from_values(&values).is_ok(), "size {size}");
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            Selection::from_values(&[0, 24]),
            Err(SelectionError::OutOfRange(24))
        );
        assert_eq!(
            Selection::from_values(&[-1, 3]),
            Err(SelectionError::OutOfRange(-1))
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            Selection::parse("3,7,3"),
            Err(SelectionError::Duplicate(3))
        );
    }

    #[test]
    fn count_is_checked_before_range() {
        // a single out-of-range value reports the count first
        assert_eq!(
            Selection::from_values(&[99]),
            Err(SelectionError::BadCount(1))
        );
    }

    #[test]
    fn deserializes_from_json_list() {
        let selection: Selection = serde_json::from_str("[2, 4]").expect("json selection");
        assert_eq!(selection.indices(), &[2, 4]);
        assert!(serde_json::from_str::<Selection>("[2, 2]").is_err());
        assert_eq!(serde_json::to_string(&selection).unwrap(), "[2,4]");
    }
}
