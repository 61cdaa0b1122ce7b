use crate::mutator::Mutator;
use crate::node::TypeTag;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps type tags to the mutation strategies registered for them.
///
/// Several strategies may be registered for one tag; they accumulate in
/// registration order. Lookups fall back to the nearest registered ancestor.
/// Tags are keyed by identity, so two tags that share a name never share strategies.
#[derive(Default, Clone)]
pub struct MutatorRegistry {
    mutators: HashMap<&'static TypeTag, Vec<Arc<dyn Mutator>>>,
}

impl MutatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: &'static TypeTag, mutator: impl Mutator + 'static) {
        self.register_arc(tag, Arc::new(mutator));
    }

    pub fn register_arc(&mut self, tag: &'static TypeTag, mutator: Arc<dyn Mutator>) {
        debug!(tag = tag.name(), mutator = mutator.name(), "Registering mutator");
        self.mutators.entry(tag).or_default().push(mutator);
    }

    /// Finds the strategies for `tag`.
    ///
    /// # Returns
    /// The tag the strategies were registered for (either `tag` itself or its nearest
    /// registered ancestor) together with those strategies, or `None` if neither `tag`
    /// nor any of its ancestors has a registration.
    pub fn resolve(
        &self,
        tag: &'static TypeTag,
    ) -> Option<(&'static TypeTag, &[Arc<dyn Mutator>])> {
        tag.lineage().find_map(|candidate| {
            self.mutators
                .get(candidate)
                .filter(|mutators| !mutators.is_empty())
                .map(|mutators| (candidate, mutators.as_slice()))
        })
    }

    /// Number of registered strategies across all tags.
    pub fn len(&self) -> usize {
        self.mutators.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the tags with at least one registration, sorted.
    pub fn registered_tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.mutators.keys().map(|tag| tag.name()).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for MutatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.mutators.iter().collect();
        entries.sort_by_key(|(tag, _)| tag.name());
        let mut map = f.debug_map();
        for (tag, mutators) in entries {
            let names: Vec<&str> = mutators.iter().map(|m| m.name()).collect();
            map.entry(&tag.name(), &names);
        }
        map.finish()
    }
}
