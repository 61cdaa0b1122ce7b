//! Recursive traversal of an object graph.
//!
//! At every node the context resolves the strategies registered for the node's type,
//! tosses the mutator dice and, if it comes up, applies one strategy chosen at random.
//! Whatever the outcome, it then walks the node's ID element and its children, so the
//! returned log entries mirror the shape of the graph.

use crate::error::FuzzError;
use crate::log::{FuzzLogEntry, FuzzingSessionLogbook};
use crate::node::{Child, Fuzzable, Id, TypeTag};
use crate::randomness::Randomness;
use crate::registry::MutatorRegistry;
use chrono::Utc;
use std::time::Instant;
use tracing::{trace, warn};

/// Name of the log entries recording ID-element decisions.
pub const ID_ENTRY: &str = "id";

/// The traversal engine, holding the registry of mutation strategies.
///
/// A context is immutable once built, so several sessions may run on it at the
/// same time as long as each one brings its own [`Randomness`].
#[derive(Debug)]
pub struct FuzzingContext {
    registry: MutatorRegistry,
}

impl FuzzingContext {
    pub(crate) fn new(registry: MutatorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MutatorRegistry {
        &self.registry
    }

    /// Traverses `root` and everything below it once.
    ///
    /// # Arguments
    /// * `rnd`: The session's randomness. Decisions are reproducible for a given seed.
    /// * `root`: The object graph to fuzz in place.
    ///
    /// # Returns
    /// * `Ok(logbook)`: The session's log, with the root's entry as its only top-level entry.
    /// * `Err(FuzzError)`: A random choice failed; `root` may be partially mutated.
    pub fn start_fuzzing_session(
        &self,
        rnd: &mut Randomness,
        root: &mut dyn Fuzzable,
    ) -> Result<FuzzingSessionLogbook, FuzzError> {
        let tag = root.type_tag();
        let label = format!("Fuzz session for {tag}");
        let started = Utc::now();
        let timer = Instant::now();

        let entry = self.fuzz_node(rnd, tag.name(), root)?;

        let logbook = FuzzingSessionLogbook::log_session_started_at(
            label,
            started,
            timer.elapsed(),
            vec![entry],
        );
        trace!(
            root = tag.name(),
            mutations = logbook.mutations(),
            added = logbook.added(),
            "Traversal finished"
        );
        Ok(logbook)
    }

    /// Fuzzes one named child. An absent child is a NOOP regardless of any dice.
    pub fn fuzz_child(
        &self,
        rnd: &mut Randomness,
        name: &str,
        value: Option<&mut dyn Fuzzable>,
    ) -> Result<FuzzLogEntry, FuzzError> {
        match value {
            Some(value) => self.fuzz_node(rnd, name, value),
            None => {
                trace!(entry = name, "Child absent");
                Ok(FuzzLogEntry::noop_because(name, "absent"))
            }
        }
    }

    /// Fuzzes the ID element of `value`, gated by the id dice.
    ///
    /// A missing ID is created first, which is recorded as an ADDED entry wrapping
    /// the decision entry of the new ID.
    pub fn fuzz_id_element(
        &self,
        rnd: &mut Randomness,
        parent_tag: &'static TypeTag,
        value: Option<&mut dyn Fuzzable>,
    ) -> Result<FuzzLogEntry, FuzzError> {
        let Some(value) = value else {
            return Ok(FuzzLogEntry::noop_because(ID_ENTRY, "absent"));
        };
        let Some(slot) = value.id_mut() else {
            return Ok(FuzzLogEntry::noop_because(
                ID_ENTRY,
                format!("{parent_tag} has no ID element"),
            ));
        };
        if !rnd.id_dice().toss() {
            trace!(parent = parent_tag.name(), "ID dice miss");
            return Ok(FuzzLogEntry::noop_because(ID_ENTRY, "dice miss"));
        }

        let created = slot.is_none();
        let id = slot.get_or_insert_with(|| Id(rnd.uuid()));
        let description = created.then(|| format!("Created ID '{}'", id.0));
        let entry = self.fuzz_node(rnd, ID_ENTRY, id)?;

        Ok(match description {
            Some(description) => {
                trace!(parent = parent_tag.name(), "ID created");
                FuzzLogEntry::added(ID_ENTRY, description).with_children(vec![entry])
            }
            None => entry,
        })
    }

    /// Fuzzes every resource of a container in order, one entry per element.
    ///
    /// An empty container is a NOOP and nothing is descended into.
    pub fn fuzz_child_resources(
        &self,
        rnd: &mut Randomness,
        name: &str,
        items: Vec<&mut dyn Fuzzable>,
    ) -> Result<FuzzLogEntry, FuzzError> {
        if items.is_empty() {
            trace!(entry = name, "Container empty");
            return Ok(FuzzLogEntry::noop_because(name, "empty container"));
        }

        let children = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| self.fuzz_node(rnd, &format!("{name}[{index}]"), item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FuzzLogEntry::noop(name).with_children(children))
    }

    fn fuzz_node(
        &self,
        rnd: &mut Randomness,
        name: &str,
        value: &mut dyn Fuzzable,
    ) -> Result<FuzzLogEntry, FuzzError> {
        let tag = value.type_tag();
        let entry = self.decide(rnd, name, value)?;

        let mut children = Vec::new();
        if value.id_mut().is_some() {
            children.push(self.fuzz_id_element(rnd, tag, Some(&mut *value))?);
        }
        for child in value.children() {
            let child_entry = match child {
                Child::Node { name, value } => self.fuzz_child(rnd, &name, value)?,
                Child::Resources { name, items } => self.fuzz_child_resources(rnd, &name, items)?,
            };
            children.push(child_entry);
        }

        Ok(entry.with_children(children))
    }

    /// Resolve, gate and apply for a single node, without descending.
    fn decide(
        &self,
        rnd: &mut Randomness,
        name: &str,
        value: &mut dyn Fuzzable,
    ) -> Result<FuzzLogEntry, FuzzError> {
        let tag = value.type_tag();
        let Some((resolved, mutators)) = self.registry.resolve(tag) else {
            warn!(
                entry = name,
                tag = tag.name(),
                "No mutator registered for type or any of its ancestors"
            );
            return Ok(FuzzLogEntry::noop_because(
                name,
                format!("no mutator for {tag}"),
            ));
        };

        if !rnd.mutator_dice().toss() {
            trace!(entry = name, tag = tag.name(), "Mutator dice miss");
            return Ok(FuzzLogEntry::noop_because(name, "dice miss"));
        }

        let mutator = rnd.choose_random_element(mutators)?;
        match mutator.mutate(value, rnd)? {
            Some(description) => {
                trace!(
                    entry = name,
                    tag = tag.name(),
                    resolved = resolved.name(),
                    mutator = mutator.name(),
                    "Mutated"
                );
                Ok(FuzzLogEntry::mutated(name, description))
            }
            None => {
                trace!(entry = name, mutator = mutator.name(), "Mutator not applicable");
                Ok(FuzzLogEntry::noop_because(
                    name,
                    format!("{} not applicable", mutator.name()),
                ))
            }
        }
    }
}
