use crate::error::FuzzError;
use crate::probability::{Probability, ProbabilityDice};
use rand::Rng;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::any::type_name;
use std::fmt;
use std::ops::RangeInclusive;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// An enumeration whose constants can be listed, so that one may be chosen at random.
///
/// ```
/// use treefuzz_core::Enumerable;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status { Draft, Active, Retired }
///
/// impl Enumerable for Status {
///     const VARIANTS: &'static [Self] = &[Status::Draft, Status::Active, Status::Retired];
/// }
/// ```
pub trait Enumerable: Copy + PartialEq + fmt::Debug + 'static {
    const VARIANTS: &'static [Self];
}

/// The per-session source of randomness.
///
/// Composed of a PRNG for uniform choices and three independent dice:
/// * the mutator dice gates whether a field is mutated at all,
/// * the child dice is reserved for mutators' own probabilistic choices,
/// * the id dice gates fuzzing of ID elements.
///
/// A `Randomness` holds no shared state and is not meant to be shared between
/// concurrently running sessions; create one per session instead.
#[derive(Debug, Clone)]
pub struct Randomness {
    rng: ChaCha8Rng,
    mutator_dice: ProbabilityDice,
    child_dice: ProbabilityDice,
    id_dice: ProbabilityDice,
}

impl Randomness {
    /// Composes a randomness source from a PRNG and the two main dice roles.
    ///
    /// The id dice is derived from `rng` with `Probability::DEFAULT_ID`.
    pub fn new(
        mut rng: ChaCha8Rng,
        mutator_dice: ProbabilityDice,
        child_dice: ProbabilityDice,
    ) -> Self {
        let id_dice = ProbabilityDice::with_probability(
            ChaCha8Rng::from_rng(&mut rng),
            Probability::DEFAULT_ID,
        );
        Self {
            rng,
            mutator_dice,
            child_dice,
            id_dice,
        }
    }

    /// Builds every dice from `rng`, so that the whole source replays from a single seed.
    pub fn with_probabilities(
        mut rng: ChaCha8Rng,
        mutator: Probability,
        child: Probability,
        id: Probability,
    ) -> Self {
        let mutator_dice =
            ProbabilityDice::with_probability(ChaCha8Rng::from_rng(&mut rng), mutator);
        let child_dice = ProbabilityDice::with_probability(ChaCha8Rng::from_rng(&mut rng), child);
        let id_dice = ProbabilityDice::with_probability(ChaCha8Rng::from_rng(&mut rng), id);
        Self {
            rng,
            mutator_dice,
            child_dice,
            id_dice,
        }
    }

    /// A reproducible source: the same seed and probability yield the same decisions.
    pub fn seeded(seed: u64, probability: f64) -> Result<Self, FuzzError> {
        let probability = Probability::new(probability)?;
        Ok(Self::with_probabilities(
            ChaCha8Rng::seed_from_u64(seed),
            probability,
            probability,
            Probability::DEFAULT_ID,
        ))
    }

    /// A source seeded from the thread-local generator.
    pub fn from_entropy(probability: f64) -> Result<Self, FuzzError> {
        let probability = Probability::new(probability)?;
        Ok(Self::with_probabilities(
            ChaCha8Rng::from_rng(&mut rand::rng()),
            probability,
            probability,
            Probability::DEFAULT_ID,
        ))
    }

    /// Replaces the dice used to gate ID-element fuzzing.
    pub fn with_id_dice(mut self, id_dice: ProbabilityDice) -> Self {
        self.id_dice = id_dice;
        self
    }

    pub fn mutator_dice(&mut self) -> &mut ProbabilityDice {
        &mut self.mutator_dice
    }

    pub fn child_dice(&mut self) -> &mut ProbabilityDice {
        &mut self.child_dice
    }

    pub fn id_dice(&mut self) -> &mut ProbabilityDice {
        &mut self.id_dice
    }

    /// Direct access to the underlying PRNG.
    pub fn source(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Picks one element uniformly.
    ///
    /// Returns `FuzzError::Selection` if `items` is empty.
    pub fn choose_random_element<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, FuzzError> {
        items
            .choose(&mut self.rng)
            .ok_or_else(|| FuzzError::Selection(format!("list of {}", type_name::<T>())))
    }

    /// Picks one constant of `E` uniformly.
    pub fn choose_random_from_enum<E: Enumerable>(&mut self) -> Result<E, FuzzError> {
        self.choose_random_from_enum_excluding(&[])
    }

    /// Picks one constant of `E` uniformly among those not listed in `excluded`.
    ///
    /// Returns `FuzzError::Configuration` if `excluded` covers every constant of `E`.
    pub fn choose_random_from_enum_excluding<E: Enumerable>(
        &mut self,
        excluded: &[E],
    ) -> Result<E, FuzzError> {
        let eligible: Vec<E> = E::VARIANTS
            .iter()
            .copied()
            .filter(|constant| !excluded.contains(constant))
            .collect();

        if eligible.is_empty() && !excluded.is_empty() {
            return Err(FuzzError::Configuration {
                enumeration: type_name::<E>(),
                excluded: excluded
                    .iter()
                    .map(|constant| format!("{constant:?}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        self.choose_random_element(&eligible).copied()
    }

    /// A random integer within `range`. Panics if the range is empty.
    pub fn int_in<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.random_range(range)
    }

    /// A random RFC 4122 version 4 UUID drawn from this source.
    pub fn uuid(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.random())
            .into_uuid()
            .to_string()
    }

    /// Random ASCII-alphabetic text with a length within `length`.
    pub fn text(&mut self, length: RangeInclusive<usize>) -> String {
        let len = self.rng.random_range(length);
        (0..len)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}
