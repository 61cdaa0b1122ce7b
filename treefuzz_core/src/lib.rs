pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod log;
pub mod mutator;
pub mod node;
pub mod probability;
pub mod randomness;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::FuzzerConfig;
pub use context::FuzzingContext;
pub use engine::{Builder, FuzzingEngine};
pub use error::FuzzError;
pub use log::{EntryKind, FuzzLogEntry, FuzzingSessionLogbook};
pub use mutator::{FlipBoolean, FlipTextCharacter, Mutator, default_mutators, from_fn, typed};
pub use node::{Child, Fuzzable, Id, TypeTag, ValueMut};
pub use probability::{Probability, ProbabilityDice};
pub use randomness::{Enumerable, Randomness};
pub use registry::MutatorRegistry;
