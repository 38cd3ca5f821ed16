//! Client-side game engines: a timed multiple-choice quiz and a memory matching game.
//!
//! Both engines are plain state machines with no I/O and no clock of their own.
//! The host drives time by calling `tick` once per second and, for the memory
//! game, by calling `resolve_mismatch` after the mismatch delay.

pub mod memory;
pub mod quiz;
mod settings;

pub use memory::{
    CardDef, CardFace, FlipOutcome, MemoryCard, MemoryError, MemoryOutcome, MemorySession,
    MemorySnapshot, MemoryState, validate_deck,
};
pub use quiz::{
    Advance, Question, QuizError, QuizOutcome, QuizSession, QuizSnapshot, QuizState, QuizTick,
};
pub use settings::{MemorySettings, QuizSettings, ScoreBand, SettingsError};
