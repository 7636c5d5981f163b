//! Core domain errors.

use thiserror::Error;

use crate::status::Street;

/// Errors raised while turning raw user input into a job request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// One or both hole cards are missing.
    #[error("Incomplete hand: both hole cards are required")]
    IncompleteHand,

    /// Some, but not all three, flop cards were entered.
    #[error("Incomplete flop: expected 3 cards, got {cards}")]
    IncompleteFlop { cards: usize },

    /// More cards than a field holds.
    #[error("Too many cards for {field}: expected {expected}, got {got}")]
    TooManyCards {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// A turn or river card was entered without a flop.
    #[error("{street} card given without a flop")]
    MissingFlop { street: Street },

    /// A numeric field holds text that is not a number.
    #[error("Invalid amount for {field}: '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
