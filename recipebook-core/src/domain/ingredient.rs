//! Ingredient domain model

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Amounts entered in the editors must be positive integers without a leading zero
const AMOUNT_PATTERN: &str = r"^[1-9]+[0-9]*$";

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(AMOUNT_PATTERN).expect("amount pattern is a valid regex"))
}

/// A named quantity, either on the shopping list or inside a recipe.
///
/// Ingredients have no identity of their own; they are addressed by their
/// position in the owning list and replaced wholesale on edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }

    /// Parse an amount typed into an editor form
    pub fn parse_amount(input: &str) -> Result<f64> {
        let input = input.trim();
        if !amount_regex().is_match(input) {
            return Err(Error::validation(format!(
                "Amount must be a positive whole number, got '{}'",
                input
            )));
        }
        input
            .parse::<f64>()
            .map_err(|e| Error::validation(format!("Invalid amount '{}': {}", input, e)))
    }

    /// Validate an ingredient as a recipe editor would before saving
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Ingredient name is required"));
        }
        if self.amount < 1.0 || self.amount.fract() != 0.0 {
            return Err(Error::validation(format!(
                "Amount for '{}' must be a positive whole number",
                self.name
            )));
        }
        Ok(())
    }
}
