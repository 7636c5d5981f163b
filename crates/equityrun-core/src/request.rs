//! Job request construction from raw user input.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::Street;

/// Villain count used when the user leaves the field empty.
pub const DEFAULT_VILLAINS: u32 = 2;

/// Raw, as-typed form fields. Blank strings mean "not entered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandFields {
    /// The two hole cards.
    pub hole: [String; 2],
    /// Board slots: three flop cards, then turn, then river.
    pub board: [String; 5],
    /// Number of opponents, defaults to [`DEFAULT_VILLAINS`].
    pub villains: Option<u32>,
    /// Pot size in big blinds.
    pub pot: String,
    /// Amount to call in big blinds.
    pub call: String,
    /// Effective stack in big blinds.
    pub stack: String,
    /// Table position label.
    pub position: String,
}

impl HandFields {
    /// Fill the hole cards from a whitespace-separated string such as `"As Kd"`.
    ///
    /// Replaces whatever the slots held. Surplus cards stay in the last slot
    /// so [`build`] can reject them.
    pub fn with_hero(mut self, hero: &str) -> Self {
        fill_slots(&mut self.hole, hero);
        self
    }

    /// Fill the flop slots from a whitespace-separated string.
    pub fn with_flop(mut self, flop: &str) -> Self {
        fill_slots(&mut self.board[..3], flop);
        self
    }

    /// Set the turn card.
    pub fn with_turn(mut self, turn: impl Into<String>) -> Self {
        self.board[3] = turn.into();
        self
    }

    /// Set the river card.
    pub fn with_river(mut self, river: impl Into<String>) -> Self {
        self.board[4] = river.into();
        self
    }
}

/// A validated, immutable job submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Hero's two cards, space-joined.
    pub hero: String,
    /// Three flop cards, space-joined.
    pub flop: Option<String>,
    pub turn: Option<String>,
    pub river: Option<String>,
    pub villains: u32,
    pub pot: Option<f64>,
    pub call: Option<f64>,
    pub stack: Option<f64>,
    pub position: Option<String>,
}

impl JobRequest {
    /// The street the hand is currently on, derived from which board cards are present.
    ///
    /// A river without a turn still counts as the river.
    pub fn street(&self) -> Option<Street> {
        derive_street(
            self.flop.is_some(),
            self.turn.is_some(),
            self.river.is_some(),
        )
    }

    /// Submission payload as ordered form fields.
    ///
    /// Absent optional values are omitted rather than sent empty, so the
    /// server can tell "unspecified" from "zero". The call amount travels
    /// under the current street's field and is dropped when no street can
    /// be derived.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("hero", self.hero.clone())];

        if let Some(flop) = &self.flop {
            fields.push(("flop", flop.clone()));
        }
        if let Some(turn) = &self.turn {
            fields.push(("turn", turn.clone()));
        }
        if let Some(river) = &self.river {
            fields.push(("river", river.clone()));
        }

        fields.push(("villains", self.villains.to_string()));

        if let Some(pot) = self.pot {
            fields.push(("pot_bb", pot.to_string()));
        }
        if let Some(stack) = self.stack {
            fields.push(("stack_bb", stack.to_string()));
        }
        if let (Some(call), Some(street)) = (self.call, self.street()) {
            fields.push((street.call_field(), call.to_string()));
        }
        if let Some(position) = &self.position {
            fields.push(("pos", position.clone()));
        }

        fields
    }
}

/// Derive the current street from board-card presence.
pub fn derive_street(flop: bool, turn: bool, river: bool) -> Option<Street> {
    if river {
        Some(Street::River)
    } else if turn && flop {
        Some(Street::Turn)
    } else if flop {
        Some(Street::Flop)
    } else {
        None
    }
}

/// Build a job request from raw form fields.
///
/// Fails with [`CoreError::IncompleteHand`] when either hole card is blank,
/// [`CoreError::TooManyCards`] on surplus cards, and [`CoreError::MissingFlop`]
/// when a turn or river is given without a flop.
pub fn build(fields: &HandFields) -> Result<JobRequest, CoreError> {
    let hole = cards_in(&fields.hole);
    if hole.len() < 2 {
        return Err(CoreError::IncompleteHand);
    }
    if hole.len() > 2 {
        return Err(CoreError::TooManyCards {
            field: "hero",
            expected: 2,
            got: hole.len(),
        });
    }

    let flop_cards = cards_in(&fields.board[..3]);
    let flop = match flop_cards.len() {
        0 => None,
        3 => Some(flop_cards.join(" ")),
        cards if cards > 3 => {
            return Err(CoreError::TooManyCards {
                field: "flop",
                expected: 3,
                got: cards,
            })
        }
        cards => return Err(CoreError::IncompleteFlop { cards }),
    };

    let turn = single_card("turn", &fields.board[3])?;
    let river = single_card("river", &fields.board[4])?;

    if flop.is_none() {
        if turn.is_some() {
            return Err(CoreError::MissingFlop { street: Street::Turn });
        }
        if river.is_some() {
            return Err(CoreError::MissingFlop { street: Street::River });
        }
    }

    let villains = fields.villains.unwrap_or(DEFAULT_VILLAINS);
    if villains == 0 {
        return Err(CoreError::InvalidInput(
            "at least one villain is required".to_string(),
        ));
    }

    Ok(JobRequest {
        hero: hole.join(" "),
        flop,
        turn,
        river,
        villains,
        pot: parse_amount("pot", &fields.pot)?,
        call: parse_amount("call", &fields.call)?,
        stack: parse_amount("stack", &fields.stack)?,
        position: non_blank(&fields.position),
    })
}

/// Spread whitespace-separated cards over `slots`, the last slot taking any surplus.
fn fill_slots(slots: &mut [String], text: &str) {
    let cards: Vec<&str> = text.split_whitespace().collect();
    let last = slots.len().saturating_sub(1);
    for (i, slot) in slots.iter_mut().enumerate() {
        *slot = if i == last {
            cards.get(i..).map(|rest| rest.join(" ")).unwrap_or_default()
        } else {
            cards.get(i).map(|c| c.to_string()).unwrap_or_default()
        };
    }
}

/// Every card typed into `slots`, in order.
fn cards_in(slots: &[String]) -> Vec<&str> {
    slots.iter().flat_map(|s| s.split_whitespace()).collect()
}

fn single_card(field: &'static str, value: &str) -> Result<Option<String>, CoreError> {
    let cards: Vec<&str> = value.split_whitespace().collect();
    match cards.len() {
        0 => Ok(None),
        1 => Ok(Some(cards[0].to_string())),
        got => Err(CoreError::TooManyCards {
            field,
            expected: 1,
            got,
        }),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_amount(field: &'static str, value: &str) -> Result<Option<f64>, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(Some(amount)),
        _ => Err(CoreError::InvalidAmount {
            field,
            value: trimmed.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_missing_hole_card_is_incomplete() {
        let fields = HandFields::default().with_hero("As");
        assert_eq!(build(&fields), Err(CoreError::IncompleteHand));

        let fields = HandFields {
            hole: ["  ".to_string(), "Kd".to_string()],
            ..Default::default()
        };
        assert_eq!(build(&fields), Err(CoreError::IncompleteHand));
    }

    #[test]
    fn test_street_derivation() {
        assert_eq!(derive_street(false, false, true), Some(Street::River));
        assert_eq!(derive_street(true, true, false), Some(Street::Turn));
        assert_eq!(derive_street(true, false, false), Some(Street::Flop));
        assert_eq!(derive_street(false, false, false), None);
        // Turn without a flop falls through to no street.
        assert_eq!(derive_street(false, true, false), None);
    }

    #[test]
    fn test_flop_request_payload() {
        let fields = HandFields {
            pot: "30".to_string(),
            call: "10".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd")
        .with_flop("Qh Jd Th");

        let request = build(&fields).unwrap();
        assert_eq!(request.street(), Some(Street::Flop));

        let payload = request.form_fields();
        assert_eq!(field(&payload, "hero"), Some("As Kd"));
        assert_eq!(field(&payload, "flop"), Some("Qh Jd Th"));
        assert_eq!(field(&payload, "villains"), Some("2"));
        assert_eq!(field(&payload, "call_flop"), Some("10"));
        assert_eq!(field(&payload, "pot_bb"), Some("30"));
        assert_eq!(field(&payload, "call_turn"), None);
        assert_eq!(field(&payload, "call_river"), None);
    }

    #[test]
    fn test_call_follows_current_street() {
        let fields = HandFields {
            call: "4.5".to_string(),
            ..Default::default()
        }
        .with_hero("7c 7d")
        .with_flop("2s 9h Kc")
        .with_turn("3d");

        let payload = build(&fields).unwrap().form_fields();
        assert_eq!(field(&payload, "call_turn"), Some("4.5"));
        assert_eq!(field(&payload, "call_flop"), None);
    }

    #[test]
    fn test_call_dropped_without_street() {
        let fields = HandFields {
            call: "10".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd");

        let payload = build(&fields).unwrap().form_fields();
        assert!(payload.iter().all(|(k, _)| !k.starts_with("call_")));
    }

    #[test]
    fn test_blank_amounts_are_omitted() {
        let fields = HandFields::default().with_hero("As Kd").with_flop("Qh Jd Th");
        let payload = build(&fields).unwrap().form_fields();
        assert_eq!(field(&payload, "pot_bb"), None);
        assert_eq!(field(&payload, "stack_bb"), None);
        assert_eq!(field(&payload, "pos"), None);
    }

    #[test]
    fn test_zero_pot_is_sent() {
        let fields = HandFields {
            pot: "0".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd");

        let payload = build(&fields).unwrap().form_fields();
        assert_eq!(field(&payload, "pot_bb"), Some("0"));
    }

    #[test]
    fn test_partial_flop_rejected() {
        let fields = HandFields::default().with_hero("As Kd").with_flop("Qh Jd");
        assert_eq!(build(&fields), Err(CoreError::IncompleteFlop { cards: 2 }));
    }

    #[test]
    fn test_river_without_turn_is_river() {
        let fields = HandFields {
            call: "8".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd")
        .with_flop("Qh Jd Th")
        .with_river("2c");

        let request = build(&fields).unwrap();
        assert_eq!(request.turn, None);
        assert_eq!(request.street(), Some(Street::River));
        assert_eq!(field(&request.form_fields(), "call_river"), Some("8"));
    }

    #[test]
    fn test_invalid_amount() {
        let fields = HandFields {
            pot: "lots".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd");

        assert_eq!(
            build(&fields),
            Err(CoreError::InvalidAmount {
                field: "pot",
                value: "lots".to_string()
            })
        );
    }

    #[test]
    fn test_zero_villains_rejected() {
        let fields = HandFields {
            villains: Some(0),
            ..Default::default()
        }
        .with_hero("As Kd");

        assert!(matches!(build(&fields), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_surplus_cards_rejected() {
        let fields = HandFields::default().with_hero("As Kd Qh");
        assert_eq!(
            build(&fields),
            Err(CoreError::TooManyCards {
                field: "hero",
                expected: 2,
                got: 3
            })
        );

        let fields = HandFields::default()
            .with_hero("As Kd")
            .with_flop("Qh Jd Th 2c");
        assert_eq!(
            build(&fields),
            Err(CoreError::TooManyCards {
                field: "flop",
                expected: 3,
                got: 4
            })
        );

        let fields = HandFields::default()
            .with_hero("As Kd")
            .with_flop("Qh Jd Th")
            .with_turn("2c 3c");
        assert!(matches!(
            build(&fields),
            Err(CoreError::TooManyCards { field: "turn", .. })
        ));
    }

    #[test]
    fn test_refilling_replaces_previous_cards() {
        let fields = HandFields::default().with_hero("As Kd").with_hero("Qh");
        assert_eq!(fields.hole, ["Qh".to_string(), String::new()]);
        assert_eq!(build(&fields), Err(CoreError::IncompleteHand));

        let fields = HandFields::default()
            .with_hero("As Kd")
            .with_flop("Qh Jd Th")
            .with_flop("2c 3c 4c");
        assert_eq!(build(&fields).unwrap().flop.as_deref(), Some("2c 3c 4c"));
    }

    #[test]
    fn test_later_street_without_flop_rejected() {
        let fields = HandFields {
            call: "5".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd")
        .with_turn("3d");
        assert_eq!(
            build(&fields),
            Err(CoreError::MissingFlop { street: Street::Turn })
        );

        let fields = HandFields::default().with_hero("As Kd").with_river("3d");
        assert_eq!(
            build(&fields),
            Err(CoreError::MissingFlop { street: Street::River })
        );
    }

    #[test]
    fn test_optional_extras_are_sent() {
        let fields = HandFields {
            villains: Some(4),
            stack: "100".to_string(),
            position: " BTN ".to_string(),
            ..Default::default()
        }
        .with_hero("As Kd");

        let payload = build(&fields).unwrap().form_fields();
        assert_eq!(field(&payload, "villains"), Some("4"));
        assert_eq!(field(&payload, "stack_bb"), Some("100"));
        assert_eq!(field(&payload, "pos"), Some("BTN"));
    }
}
