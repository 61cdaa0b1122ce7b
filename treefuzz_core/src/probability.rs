use crate::error::FuzzError;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;

/// A probability threshold guaranteed to lie within `[0.0, 1.0]`.
///
/// Values outside the interval are rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    /// The gate never opens.
    pub const NEVER: Probability = Probability(0.0);
    /// The gate always opens.
    pub const ALWAYS: Probability = Probability(1.0);
    /// Probability used for ID-element fuzzing unless configured otherwise.
    pub const DEFAULT_ID: Probability = Probability(0.3);

    pub fn new(value: f64) -> Result<Self, FuzzError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FuzzError::InvalidProbability(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = FuzzError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Probability::new(value)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A weighted boolean coin.
///
/// Each dice owns its PRNG so that independent dice roles (gating mutations,
/// internal mutator choices, ID fuzzing) never disturb each other's sequence.
/// At probability `0.0` every toss is `false`, at `1.0` every toss is `true`.
#[derive(Debug, Clone)]
pub struct ProbabilityDice {
    rng: ChaCha8Rng,
    probability: Probability,
}

impl ProbabilityDice {
    /// Creates a dice from a PRNG and a raw probability.
    ///
    /// Returns `FuzzError::InvalidProbability` if `probability` is not within `[0.0, 1.0]`.
    pub fn new(rng: ChaCha8Rng, probability: f64) -> Result<Self, FuzzError> {
        Ok(Self::with_probability(rng, Probability::new(probability)?))
    }

    pub fn with_probability(rng: ChaCha8Rng, probability: Probability) -> Self {
        Self { rng, probability }
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    /// Tosses the dice once, advancing its PRNG.
    pub fn toss(&mut self) -> bool {
        self.rng.random_bool(self.probability.value())
    }

    /// Keeps every item independently with this dice's probability, preserving order.
    pub fn choose_random_elements<T>(&mut self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().filter(|_| self.toss()).collect()
    }
}
