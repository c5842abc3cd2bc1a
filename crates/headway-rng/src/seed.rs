//! The seeded draw function and the [`DrawSource`] seam.
//!
//! Every stochastic decision in a turn routes through [`draw`]: a fixed
//! 32-bit xorshift step that maps the game's persisted seed to a value in
//! `[0, 1)` plus the next seed. The function is documented precisely so a
//! reimplementation in another language reproduces the same sequences.
//!
//! Phases never call [`draw`] directly; they consume draws through the
//! [`DrawSource`] trait so scenario tests can script exact value sequences
//! with [`ScriptedRng`] while production uses [`GameRng`].

/// Replacement state for a zero seed.
///
/// Zero is the one fixed point of xorshift; a game imported with seed 0
/// would otherwise draw 0 forever.
pub const ZERO_SEED_FALLBACK: u32 = 0xDEAD_BEEF;

/// One deterministic draw.
///
/// Applies the 13/17/5 xorshift32 step (Marsaglia) to `seed` and scales the
/// new state into `[0, 1)` by dividing by 2^32:
///
/// ```text
/// s ^= s << 13;  s ^= s >> 17;  s ^= s << 5;   value = s / 2^32
/// ```
///
/// A zero input is replaced by [`ZERO_SEED_FALLBACK`] before mixing. The
/// returned seed is never zero and the value is never exactly 0 or 1.
/// Callers must persist the returned seed before drawing again -- the seed
/// stream is strictly sequential.
// `f64::from` is not const, so the lossless u32 -> f64 cast is spelled `as`.
#[allow(clippy::cast_lossless)]
pub const fn draw(seed: u32) -> (f64, u32) {
    let mut state = seed;
    if state == 0 {
        state = ZERO_SEED_FALLBACK;
    }

    // xorshift32 algorithm
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;

    // 2^32 as f64; u32 -> f64 is lossless, so the quotient is exact.
    let value = state as f64 / 4_294_967_296.0;
    (value, state)
}

/// Scale a draw in `[0, 1)` to an index in `[0, len)`.
///
/// Entity counts are far below the 2^53 threshold where `f64` stops
/// representing integers exactly, so the cast is value-preserving.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_to_index(value: f64, len: usize) -> usize {
    let scaled = (value * len as f64) as usize;
    scaled.min(len.saturating_sub(1))
}

/// Scale a draw in `[0, 1)` to an integer in `[low, low + span)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_to_range(value: f64, low: u32, span: u32) -> u32 {
    let offset = (value * f64::from(span)) as u32;
    low.saturating_add(offset.min(span.saturating_sub(1)))
}

// ---------------------------------------------------------------------------
// DrawSource
// ---------------------------------------------------------------------------

/// Source of sequential deterministic draws for the turn phases.
///
/// The provided helpers each consume exactly one draw, except
/// [`DrawSource::pick_index`] over an empty slice, which consumes none.
/// Keeping draw counts fixed per decision is what makes turn replay
/// byte-identical.
pub trait DrawSource {
    /// Take the next value in `[0, 1)`, advancing the source.
    fn draw(&mut self) -> f64;

    /// The seed to persist into the game record.
    fn seed(&self) -> u32;

    /// One chance check: true with probability `probability`.
    fn chance(&mut self, probability: f64) -> bool {
        self.draw() < probability
    }

    /// Uniform index into a slice of length `len`; `None` when empty
    /// (no draw consumed).
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(scale_to_index(self.draw(), len))
    }

    /// Uniform integer in `[low, high]`. Degenerate bounds (`high <= low`)
    /// still consume one draw and return `low`.
    fn roll_between(&mut self, low: u32, high: u32) -> u32 {
        let span = high.saturating_sub(low).saturating_add(1);
        scale_to_range(self.draw(), low, span)
    }
}

// ---------------------------------------------------------------------------
// GameRng
// ---------------------------------------------------------------------------

/// Production draw source backed by the game's persisted seed.
///
/// Holds the seed cursor for one turn; the orchestrator writes
/// [`DrawSource::seed`] back into the game record after every phase and
/// before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRng {
    seed: u32,
}

impl GameRng {
    /// Start a draw stream from the game's current seed.
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl DrawSource for GameRng {
    fn draw(&mut self) -> f64 {
        let (value, next) = draw(self.seed);
        self.seed = next;
        value
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}

// ---------------------------------------------------------------------------
// ScriptedRng
// ---------------------------------------------------------------------------

/// Draw source that replays a fixed value sequence, then falls back to the
/// seeded stream.
///
/// Used by scenario tests ("force the transition draw below 0.05") and by
/// offline turn replay. Scripted values should be in `[0, 1)`; they are
/// returned verbatim, so a scripted exact 0 is possible even though the
/// seeded stream never produces one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
    inner: GameRng,
}

impl ScriptedRng {
    /// Replay `values` in order, then continue drawing from `seed`.
    pub const fn new(values: Vec<f64>, seed: u32) -> Self {
        Self { values, cursor: 0, inner: GameRng::new(seed) }
    }

    /// How many scripted values remain unconsumed.
    pub const fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }
}

impl DrawSource for ScriptedRng {
    fn draw(&mut self) -> f64 {
        if let Some(value) = self.values.get(self.cursor) {
            self.cursor = self.cursor.saturating_add(1);
            return *value;
        }
        self.inner.draw()
    }

    fn seed(&self) -> u32 {
        self.inner.seed()
    }
}
