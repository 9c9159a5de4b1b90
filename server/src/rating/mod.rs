//! Player rating maths.

pub mod elo;

pub use elo::{calculate, OutcomeDeltas, PrecomputedDeltas, RatingUpdate};
