//! Dice-notation parsing and rolling.
//!
//! Grammar: `term (+term)*`, where a term is either a bare integer (flat
//! addition) or `<multiplier>?<separator><faces>?` with separator `D`,
//! default faces 6, default multiplier 1. Parsing is case-insensitive and
//! ignores spaces; any other character is a parse error. Each die resolves
//! to `ceil(draw() * faces)` through a pluggable draw function, so combat
//! and weather can route their rolls through the game's seeded stream.

use thiserror::Error;

use crate::seed::DrawSource;

/// Separator between multiplier and faces, compared case-insensitively.
const SEPARATOR: char = 'd';

/// Default faces when a dice term omits them (`"2d"` means `2d6`).
const DEFAULT_FACES: u32 = 6;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to parse or evaluate a dice notation string.
///
/// These indicate content bugs (a malformed damage string on an item), so
/// callers propagate them and abort the turn rather than degrade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// A character that is neither digit, separator, `+`, nor space.
    #[error("unrecognized character {found:?} in dice notation {notation:?}")]
    UnexpectedChar {
        /// The full notation being parsed.
        notation: String,
        /// The offending character.
        found: char,
    },

    /// An empty notation or an empty term (`"2d6+"`).
    #[error("empty term in dice notation {notation:?}")]
    EmptyTerm {
        /// The full notation being parsed.
        notation: String,
    },

    /// A number or the running total exceeded `u32`.
    #[error("numeric overflow evaluating dice notation {notation:?}")]
    Overflow {
        /// The full notation being parsed.
        notation: String,
    },
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One resolved die, itemized for narrative messages ("rolled 3 + 5").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolledDie {
    /// Die label, `D<faces>` (for example `D6`).
    pub label: String,
    /// The rolled value, `ceil(draw * faces)`.
    pub value: u32,
}

/// The outcome of rolling a full notation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    /// Sum of every die plus every flat term.
    pub total: u32,
    /// Every individual die in roll order. Flat terms are additions, not
    /// dice, and do not appear here.
    pub dice: Vec<RolledDie>,
}

/// One parsed term: a number of dice or a flat addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Dice {
        multiplier: u32,
        faces: u32,
    },
    Flat(u32),
}

// ---------------------------------------------------------------------------
// Rolling
// ---------------------------------------------------------------------------

/// Roll a notation through a [`DrawSource`].
///
/// Convenience wrapper over [`roll_with`] for the common case where the
/// caller holds the turn's draw source.
pub fn roll(notation: &str, rng: &mut dyn DrawSource) -> Result<DiceRoll, DiceError> {
    roll_with(notation, || rng.draw())
}

/// Roll a notation with a pluggable draw function.
///
/// `draw` must return values in `[0, 1)`; each die consumes exactly one
/// draw, in term order, left to right. Parsing happens before any draw, so
/// a malformed notation never consumes entropy.
pub fn roll_with<F>(notation: &str, mut draw: F) -> Result<DiceRoll, DiceError>
where
    F: FnMut() -> f64,
{
    let terms = parse(notation)?;

    let mut total: u32 = 0;
    let mut dice = Vec::new();
    for term in terms {
        match term {
            Term::Flat(value) => {
                total = total
                    .checked_add(value)
                    .ok_or_else(|| DiceError::Overflow { notation: notation.to_owned() })?;
            }
            Term::Dice { multiplier, faces } => {
                for _ in 0..multiplier {
                    let value = die_value(draw(), faces);
                    total = total
                        .checked_add(value)
                        .ok_or_else(|| DiceError::Overflow { notation: notation.to_owned() })?;
                    dice.push(RolledDie { label: format!("D{faces}"), value });
                }
            }
        }
    }

    Ok(DiceRoll { total, dice })
}

/// Resolve one die: `ceil(draw * faces)`.
///
/// A draw of exactly 0 yields 0 -- the seeded stream never produces one,
/// but a scripted source can, and the arithmetic is kept as specified
/// rather than clamped to 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn die_value(draw: f64, faces: u32) -> u32 {
    let scaled = (draw * f64::from(faces)).ceil();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a notation into terms without consuming any draws.
fn parse(notation: &str) -> Result<Vec<Term>, DiceError> {
    let cleaned: String = notation.chars().filter(|ch| *ch != ' ').collect();
    if cleaned.is_empty() {
        return Err(DiceError::EmptyTerm { notation: notation.to_owned() });
    }

    let mut terms = Vec::new();
    for raw_term in cleaned.split('+') {
        terms.push(parse_term(notation, raw_term)?);
    }
    Ok(terms)
}

/// Parse one `+`-separated term.
fn parse_term(notation: &str, term: &str) -> Result<Term, DiceError> {
    if term.is_empty() {
        return Err(DiceError::EmptyTerm { notation: notation.to_owned() });
    }

    // Digits before the separator, the separator itself, digits after.
    let mut lead: Option<u32> = None;
    let mut trail: Option<u32> = None;
    let mut seen_separator = false;

    for ch in term.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let slot = if seen_separator { &mut trail } else { &mut lead };
            let grown = slot
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
                .ok_or_else(|| DiceError::Overflow { notation: notation.to_owned() })?;
            *slot = Some(grown);
        } else if !seen_separator && ch.eq_ignore_ascii_case(&SEPARATOR) {
            seen_separator = true;
        } else {
            return Err(DiceError::UnexpectedChar {
                notation: notation.to_owned(),
                found: ch,
            });
        }
    }

    if seen_separator {
        Ok(Term::Dice {
            multiplier: lead.unwrap_or(1),
            faces: trail.unwrap_or(DEFAULT_FACES),
        })
    } else {
        // All digits, no separator: flat addition. `lead` is always set
        // here because the term is non-empty and digit-only.
        Ok(Term::Flat(lead.unwrap_or(0)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Draw function pinned to a constant, for arithmetic checks.
    fn constant(value: f64) -> impl FnMut() -> f64 {
        move || value
    }

    #[test]
    fn two_d6_plus_three_at_half_draw() {
        // ceil(0.5 * 6) * 2 + 3 = 9, itemized as two D6 results of 3.
        let roll = roll_with("2d6+3", constant(0.5)).unwrap();
        assert_eq!(roll.total, 9);
        assert_eq!(roll.dice.len(), 2);
        for die in &roll.dice {
            assert_eq!(die.label, "D6");
            assert_eq!(die.value, 3);
        }
    }

    #[test]
    fn bare_separator_defaults_to_one_d6() {
        let roll = roll_with("d", constant(0.999)).unwrap();
        assert_eq!(roll.total, 6);
        assert_eq!(roll.dice.len(), 1);
        assert_eq!(roll.dice.first().map(|die| die.label.as_str()), Some("D6"));
    }

    #[test]
    fn faces_only_term_defaults_multiplier() {
        let roll = roll_with("d20", constant(0.049)).unwrap();
        // ceil(0.049 * 20) = ceil(0.98) = 1
        assert_eq!(roll.total, 1);
        assert_eq!(roll.dice.first().map(|die| die.label.as_str()), Some("D20"));
    }

    #[test]
    fn parsing_ignores_spaces_and_case() {
        let roll = roll_with(" 2 D 6 + 3 ", constant(0.5)).unwrap();
        assert_eq!(roll.total, 9);
    }

    #[test]
    fn flat_terms_add_but_are_not_itemized() {
        let roll = roll_with("3+4", constant(0.5)).unwrap();
        assert_eq!(roll.total, 7);
        assert!(roll.dice.is_empty());
    }

    #[test]
    fn unknown_character_is_a_parse_error() {
        let error = roll_with("2x6", constant(0.5)).unwrap_err();
        assert_eq!(
            error,
            DiceError::UnexpectedChar { notation: String::from("2x6"), found: 'x' },
        );
    }

    #[test]
    fn second_separator_is_a_parse_error() {
        let error = roll_with("2d6d", constant(0.5)).unwrap_err();
        assert!(matches!(error, DiceError::UnexpectedChar { found: 'd', .. }));
    }

    #[test]
    fn empty_notation_and_trailing_plus_are_errors() {
        assert!(matches!(
            roll_with("", constant(0.5)),
            Err(DiceError::EmptyTerm { .. }),
        ));
        assert!(matches!(
            roll_with("2d6+", constant(0.5)),
            Err(DiceError::EmptyTerm { .. }),
        ));
    }

    #[test]
    fn oversized_numbers_overflow_cleanly() {
        assert!(matches!(
            roll_with("99999999999", constant(0.5)),
            Err(DiceError::Overflow { .. }),
        ));
    }

    #[test]
    fn malformed_notation_consumes_no_draws() {
        let mut draws = 0_u32;
        let result = roll_with("2y6", || {
            draws = draws.saturating_add(1);
            0.5
        });
        assert!(result.is_err());
        assert_eq!(draws, 0);
    }

    #[test]
    fn zero_draw_rolls_zero() {
        let roll = roll_with("1d6", constant(0.0)).unwrap();
        assert_eq!(roll.total, 0);
    }

    #[test]
    fn draw_order_is_left_to_right() {
        let mut values = vec![0.1_f64, 0.6, 0.9].into_iter();
        let roll = roll_with("3d10", move || values.next().unwrap_or(0.0)).unwrap();
        let rolled: Vec<u32> = roll.dice.iter().map(|die| die.value).collect();
        // ceil(1.0), ceil(6.0), ceil(9.0)
        assert_eq!(rolled, vec![1, 6, 9]);
        assert_eq!(roll.total, 16);
    }
}
