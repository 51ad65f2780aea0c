use regex::Regex;

use crate::config::{StockMatch, StockRule};
use crate::error::Result;

/// Compiled form of a [`StockRule`].
#[derive(Debug, Clone)]
pub enum StockPredicate {
    Equals(String),
    NotEquals(String),
    Matches(Regex),
}

impl StockPredicate {
    pub fn compile(rule: &StockRule) -> Result<Self> {
        let predicate = match rule.in_stock_when {
            StockMatch::Equals => StockPredicate::Equals(rule.text.trim().to_string()),
            StockMatch::NotEquals => StockPredicate::NotEquals(rule.text.trim().to_string()),
            StockMatch::Matches => StockPredicate::Matches(Regex::new(&rule.text)?),
        };
        Ok(predicate)
    }

    /// Judge the stock indicator's text. An empty indicator is judged like any other text.
    pub fn is_in_stock(&self, indicator_text: &str) -> bool {
        match self {
            StockPredicate::Equals(expected) => indicator_text.trim() == expected,
            StockPredicate::NotEquals(expected) => indicator_text.trim() != expected,
            StockPredicate::Matches(pattern) => pattern.is_match(indicator_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(in_stock_when: StockMatch, text: &str) -> StockRule {
        StockRule {
            in_stock_when,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_not_equals_trims_indicator() {
        let predicate = StockPredicate::compile(&rule(StockMatch::NotEquals, "OUT OF STOCK")).unwrap();
        assert!(!predicate.is_in_stock("  OUT OF STOCK \n"));
        assert!(predicate.is_in_stock("Free Shipping"));
        assert!(predicate.is_in_stock(""));
    }

    #[test]
    fn test_equals() {
        let predicate = StockPredicate::compile(&rule(StockMatch::Equals, "Add to Cart")).unwrap();
        assert!(predicate.is_in_stock(" Add to Cart "));
        assert!(!predicate.is_in_stock("Notify Me"));
        assert!(!predicate.is_in_stock(""));
    }

    #[test]
    fn test_matches() {
        let predicate =
            StockPredicate::compile(&rule(StockMatch::Matches, "RTX (3060 Ti|3070|3070 Ti|3080)")).unwrap();
        assert!(predicate.is_in_stock("MSI GeForce RTX 3070 Ventus 2X"));
        assert!(!predicate.is_in_stock("MSI GeForce GTX 1660 Super"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(StockPredicate::compile(&rule(StockMatch::Matches, "RTX (30")).is_err());
    }
}
