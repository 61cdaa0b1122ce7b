//! The public entry point: an engine built once, then used for many sessions.

use crate::config::{FuzzerConfig, default_max_empty_rounds};
use crate::context::FuzzingContext;
use crate::error::FuzzError;
use crate::log::FuzzingSessionLogbook;
use crate::mutator::{Mutator, default_mutators};
use crate::node::{Fuzzable, TypeTag};
use crate::probability::Probability;
use crate::randomness::Randomness;
use crate::registry::MutatorRegistry;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Accumulates the engine's parameters and mutator registrations.
pub struct Builder {
    probability: Probability,
    child_probability: Probability,
    id_probability: Probability,
    seed: Option<u64>,
    randomness: Option<Randomness>,
    max_empty_rounds: usize,
    registry: MutatorRegistry,
}

impl Builder {
    fn new(probability: Probability) -> Self {
        Self {
            probability,
            child_probability: probability,
            id_probability: Probability::DEFAULT_ID,
            seed: None,
            randomness: None,
            max_empty_rounds: default_max_empty_rounds(),
            registry: MutatorRegistry::new(),
        }
    }

    /// Sets the probability mutators use for their own internal choices.
    pub fn child_probability(mut self, probability: f64) -> Result<Self, FuzzError> {
        self.child_probability = Probability::new(probability)?;
        Ok(self)
    }

    /// Sets the probability of fuzzing an ID element.
    pub fn id_probability(mut self, probability: f64) -> Result<Self, FuzzError> {
        self.id_probability = Probability::new(probability)?;
        Ok(self)
    }

    /// Makes the engine's sessions reproducible.
    ///
    /// Ignored if the builder was created from an explicit [`Randomness`].
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// How many times [`FuzzingEngine::fuzz`] runs a session in total while the
    /// document remains unchanged. `0` is treated as `1`.
    pub fn max_empty_rounds(mut self, rounds: usize) -> Self {
        self.max_empty_rounds = rounds;
        self
    }

    /// Registers the baseline mutators for the built-in primitive tags.
    pub fn with_default_fuzzers(mut self) -> Self {
        for (tag, mutator) in default_mutators() {
            self.registry.register_arc(tag, mutator);
        }
        self
    }

    pub fn register(mut self, tag: &'static TypeTag, mutator: impl Mutator + 'static) -> Self {
        self.registry.register(tag, mutator);
        self
    }

    pub fn register_arc(mut self, tag: &'static TypeTag, mutator: Arc<dyn Mutator>) -> Self {
        self.registry.register_arc(tag, mutator);
        self
    }

    pub fn build(self) -> FuzzingEngine {
        let randomness = match (self.randomness, self.seed) {
            (Some(randomness), _) => randomness,
            (None, Some(seed)) => Randomness::with_probabilities(
                ChaCha8Rng::seed_from_u64(seed),
                self.probability,
                self.child_probability,
                self.id_probability,
            ),
            (None, None) => Randomness::with_probabilities(
                ChaCha8Rng::from_rng(&mut rand::rng()),
                self.probability,
                self.child_probability,
                self.id_probability,
            ),
        };
        debug!(
            probability = %self.probability,
            mutators = self.registry.len(),
            tags = ?self.registry.registered_tags(),
            "Built fuzzing engine"
        );

        FuzzingEngine {
            context: Arc::new(FuzzingContext::new(self.registry)),
            randomness,
            probability: self.probability,
            child_probability: self.child_probability,
            id_probability: self.id_probability,
            max_empty_rounds: self.max_empty_rounds.max(1),
            history: VecDeque::new(),
        }
    }
}

/// Owns the shared [`FuzzingContext`], a session randomness and the history of
/// sessions run through [`FuzzingEngine::fuzz`].
pub struct FuzzingEngine {
    context: Arc<FuzzingContext>,
    randomness: Randomness,
    probability: Probability,
    child_probability: Probability,
    id_probability: Probability,
    max_empty_rounds: usize,
    history: VecDeque<FuzzingSessionLogbook>,
}

impl FuzzingEngine {
    /// Starts building an engine that mutates each field with `probability`.
    ///
    /// Returns `FuzzError::InvalidProbability` if `probability` is not within `[0.0, 1.0]`.
    pub fn builder(probability: f64) -> Result<Builder, FuzzError> {
        Ok(Builder::new(Probability::new(probability)?))
    }

    /// Starts building an engine whose sessions draw from `randomness`.
    pub fn builder_with_randomness(mut randomness: Randomness) -> Builder {
        let mut builder = Builder::new(randomness.mutator_dice().probability());
        builder.child_probability = randomness.child_dice().probability();
        builder.id_probability = randomness.id_dice().probability();
        builder.randomness = Some(randomness);
        builder
    }

    pub fn from_config(config: &FuzzerConfig) -> Result<FuzzingEngine, FuzzError> {
        let mut builder = Self::builder(config.probability)?
            .child_probability(config.effective_child_probability())?
            .id_probability(config.id_probability)?
            .max_empty_rounds(config.max_empty_rounds);
        if let Some(seed) = config.seed {
            builder = builder.seed(seed);
        }
        if config.default_fuzzers {
            builder = builder.with_default_fuzzers();
        }
        Ok(builder.build())
    }

    /// The context shared by all sessions of this engine.
    pub fn context(&self) -> Arc<FuzzingContext> {
        Arc::clone(&self.context)
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    /// A fresh randomness with this engine's probabilities, for sessions run directly
    /// on [`FuzzingEngine::context`], e.g. from several threads.
    pub fn randomness_for(&self, seed: u64) -> Randomness {
        Randomness::with_probabilities(
            ChaCha8Rng::seed_from_u64(seed),
            self.probability,
            self.child_probability,
            self.id_probability,
        )
    }

    /// Fuzzes `root` in place with the engine's own randomness.
    ///
    /// A session that changes nothing is run again, up to the configured number of
    /// rounds; the returned logbook then holds one top-level entry per round. The
    /// logbook is also recorded in the session history.
    ///
    /// # Returns
    /// * `Ok(logbook)`: The (possibly merged) session log.
    /// * `Err(FuzzError)`: A random choice failed. Nothing is recorded in the history.
    pub fn fuzz(&mut self, root: &mut dyn Fuzzable) -> Result<FuzzingSessionLogbook, FuzzError> {
        let tag = root.type_tag();
        info!(root = tag.name(), probability = %self.probability, "Starting fuzzing session");

        let mut rounds = Vec::new();
        loop {
            let logbook = self
                .context
                .start_fuzzing_session(&mut self.randomness, &mut *root)?;
            let changed = logbook.changes() > 0;
            rounds.push(logbook);
            if changed || rounds.len() >= self.max_empty_rounds {
                break;
            }
            debug!(
                root = tag.name(),
                round = rounds.len(),
                "Session changed nothing, fuzzing again"
            );
        }

        let logbook = merge_rounds(rounds);
        info!(
            root = tag.name(),
            mutations = logbook.mutations(),
            added = logbook.added(),
            noops = logbook.noops(),
            duration_ms = logbook.duration().as_millis() as u64,
            "Finished fuzzing session"
        );
        self.history.push_front(logbook.clone());
        Ok(logbook)
    }

    /// The logbook of the most recent session, if any.
    pub fn last_session_log(&self) -> Option<&FuzzingSessionLogbook> {
        self.history.front()
    }

    /// All recorded sessions, newest first.
    pub fn session_history(&self) -> impl Iterator<Item = &FuzzingSessionLogbook> {
        self.history.iter()
    }
}

fn merge_rounds(mut rounds: Vec<FuzzingSessionLogbook>) -> FuzzingSessionLogbook {
    if rounds.len() == 1 {
        if let Some(single) = rounds.pop() {
            return single;
        }
    }
    let label = rounds
        .first()
        .map(|first| format!("{} ({} rounds)", first.label(), rounds.len()))
        .unwrap_or_default();
    let started = rounds
        .first()
        .map(FuzzingSessionLogbook::started)
        .unwrap_or_else(chrono::Utc::now);
    let duration = rounds.iter().map(FuzzingSessionLogbook::duration).sum::<Duration>();
    let entries = rounds
        .iter()
        .flat_map(|round| round.entries().iter().cloned())
        .collect();
    FuzzingSessionLogbook::log_session_started_at(label, started, duration, entries)
}
