use crate::error::FuzzError;
use crate::node::{BOOLEAN, DECIMAL, Fuzzable, ID, INTEGER, TEXT, TypeTag, URI, ValueMut};
use crate::randomness::Randomness;
use std::marker::PhantomData;
use std::sync::Arc;

/// Text used when a text mutator is handed a blank value.
const FILLER_TEXT_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;
/// Maximum absolute delta applied by `NudgeInteger`.
const INTEGER_NUDGE: i64 = 5;
const WHITESPACE: [&str; 3] = [" ", "\t", "\n"];
const URI_SCHEMES: [&str; 5] = ["http://", "https://", "ftp://", "file://", "urn:uuid:"];
const ID_BREAKERS: [&str; 6] = ["/", " ", "#", "?", "%", ".."];
const BLANK: &str = " ";
const BOUNDARY_INTEGERS: [i64; 5] = [0, -1, 1, i64::MIN, i64::MAX];
const SPECIAL_DECIMALS: [f64; 6] = [
    f64::NAN,
    f64::INFINITY,
    f64::NEG_INFINITY,
    -0.0,
    f64::MIN_POSITIVE,
    f64::MAX,
];

/// A `Mutator` alters a node of the object graph in place.
///
/// Mutators are registered per [`TypeTag`] when the engine is built and are shared,
/// read-only, by every session afterwards. They reach the node either through its
/// capability methods (e.g. [`Fuzzable::value_mut`]), which also works for subtypes of
/// the registered tag, or by downcasting to a concrete type (see [`typed`]).
pub trait Mutator: Send + Sync {
    /// A short name identifying the strategy, used in logs.
    fn name(&self) -> &str;

    /// Applies the mutation strategy to `value`.
    ///
    /// # Arguments
    /// * `value`: The node to alter in place.
    /// * `rnd`: The session's randomness. Internal probabilistic choices of a mutator
    ///   should use its child dice.
    ///
    /// # Returns
    /// * `Ok(Some(description))`: The node was changed; `description` is a compact
    ///   account of what changed. Only returned if the value actually differs.
    /// * `Ok(None)`: The strategy is not applicable to this node, or left it unchanged.
    /// * `Err(error)`: A random choice failed; the session is aborted.
    fn mutate(
        &self,
        value: &mut dyn Fuzzable,
        rnd: &mut Randomness,
    ) -> Result<Option<String>, FuzzError>;
}

/// A `Mutator` backed by a closure.
pub struct FnMutator<F> {
    name: String,
    mutate_fn: F,
}

impl<F> Mutator for FnMutator<F>
where
    F: Fn(&mut dyn Fuzzable, &mut Randomness) -> Result<Option<String>, FuzzError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn mutate(
        &self,
        value: &mut dyn Fuzzable,
        rnd: &mut Randomness,
    ) -> Result<Option<String>, FuzzError> {
        (self.mutate_fn)(value, rnd)
    }
}

pub fn from_fn<F>(name: impl Into<String>, mutate_fn: F) -> FnMutator<F>
where
    F: Fn(&mut dyn Fuzzable, &mut Randomness) -> Result<Option<String>, FuzzError> + Send + Sync,
{
    FnMutator {
        name: name.into(),
        mutate_fn,
    }
}

/// A `Mutator` for one concrete type `T`.
///
/// Applies to values of type `T` and to subtypes exposing a `T` view through
/// [`Fuzzable::as_ancestor_mut`]; not applicable to anything else.
pub struct TypedMutator<T, F> {
    name: String,
    mutate_fn: F,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T, F> Mutator for TypedMutator<T, F>
where
    T: Fuzzable,
    F: Fn(&mut T, &mut Randomness) -> Result<Option<String>, FuzzError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn mutate(
        &self,
        value: &mut dyn Fuzzable,
        rnd: &mut Randomness,
    ) -> Result<Option<String>, FuzzError> {
        match value.downcast_lineage_mut::<T>() {
            Some(concrete) => (self.mutate_fn)(concrete, rnd),
            None => Ok(None),
        }
    }
}

pub fn typed<T, F>(name: impl Into<String>, mutate_fn: F) -> TypedMutator<T, F>
where
    T: Fuzzable,
    F: Fn(&mut T, &mut Randomness) -> Result<Option<String>, FuzzError> + Send + Sync,
{
    TypedMutator {
        name: name.into(),
        mutate_fn,
        _marker: PhantomData,
    }
}

fn text_slot(value: &mut dyn Fuzzable) -> Option<&mut String> {
    match value.value_mut()? {
        ValueMut::Text(text) => Some(text),
        _ => None,
    }
}

fn integer_slot(value: &mut dyn Fuzzable) -> Option<&mut i64> {
    match value.value_mut()? {
        ValueMut::Integer(number) => Some(number),
        _ => None,
    }
}

fn decimal_slot(value: &mut dyn Fuzzable) -> Option<&mut f64> {
    match value.value_mut()? {
        ValueMut::Decimal(number) => Some(number),
        _ => None,
    }
}

/// Whether two decimals are indistinguishable, treating every NaN as equal.
fn same_decimal(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

fn ensure_not_blank(text: &mut String, rnd: &mut Randomness) {
    if text.trim().is_empty() {
        *text = rnd.text(FILLER_TEXT_LENGTH);
    }
}

/// Replaces one character of a text value: toggles its case or swaps in a random
/// printable ASCII character. The choice between both is made with the child dice.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlipTextCharacter;

impl Mutator for FlipTextCharacter {
    fn name(&self) -> &str {
        "FlipTextCharacter"
    }

    fn mutate(
        &self,
        value: &mut dyn Fuzzable,
        rnd: &mut Randomness,
    ) -> Result<Option<String>, FuzzError> {
        let Some(text) = text_slot(value) else {
            return Ok(None);
        };
        ensure_not_blank(text, rnd);

        let original = text.clone();
        let mut chars: Vec<char> = text.chars().collect();
        let index = rnd.int_in(0..chars.len());

        if chars[index].is_ascii_alphabetic() && rnd.child_dice().toss() {
            chars[index] = if chars[index].is_ascii_lowercase() {
                chars[index].to_ascii_uppercase()
            } else {
                chars[index].to_ascii_lowercase()
            };
        } else {
            let current = chars[index];
            chars[index] = loop {
                let replacement = rnd.int_in(32u8..127u8) as char;
                if replacement != current {
                    break replacement;
                }
            };
        }
        *text = chars.into_iter().collect();

        Ok(Some(format!(
            "Flip character {index} of text: '{original}' -> '{text}'"
        )))
    }
}

/// Negates a boolean value.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlipBoolean;

impl Mutator for FlipBoolean {
    fn name(&self) -> &str {
        "FlipBoolean"
    }

    fn mutate(
        &self,
        value: &mut dyn Fuzzable,
        _rnd: &mut Randomness,
    ) -> Result<Option<String>, FuzzError> {
        match value.value_mut() {
            Some(ValueMut::Boolean(flag)) => {
                let original = *flag;
                *flag = !original;
                Ok(Some(format!("Flip boolean: {original} -> {flag}")))
            }
            _ => Ok(None),
        }
    }
}

fn text_mutators() -> Vec<Arc<dyn Mutator>> {
    vec![
        Arc::new(from_fn("ReverseText", |value, rnd| {
            let Some(text) = text_slot(value) else {
                return Ok(None);
            };
            let before = text.clone();
            ensure_not_blank(text, rnd);
            let original = std::mem::take(text);
            *text = original.chars().rev().collect();
            if *text == before {
                return Ok(None);
            }
            Ok(Some(format!("Reverse text: '{original}' -> '{text}'")))
        })),
        Arc::new(from_fn("DuplicateText", |value, rnd| {
            let Some(text) = text_slot(value) else {
                return Ok(None);
            };
            ensure_not_blank(text, rnd);
            let original = text.clone();
            text.push_str(&original);
            Ok(Some(format!("Duplicate text: '{original}' -> '{text}'")))
        })),
        Arc::new(from_fn("BlankText", |value, _rnd| {
            let Some(text) = text_slot(value) else {
                return Ok(None);
            };
            if *text == BLANK {
                return Ok(None);
            }
            let original = std::mem::replace(text, BLANK.to_string());
            Ok(Some(format!("Blank text: '{original}' -> '{text}'")))
        })),
        Arc::new(from_fn("WhitespaceText", |value, rnd| {
            let Some(text) = text_slot(value) else {
                return Ok(None);
            };
            let count = rnd.int_in(1..5);
            let mut whitespace = String::with_capacity(count);
            for _ in 0..count {
                whitespace.push_str(rnd.choose_random_element(&WHITESPACE)?);
            }
            if *text == whitespace {
                return Ok(None);
            }
            let original = std::mem::replace(text, whitespace);
            Ok(Some(format!(
                "Replace text with {count} random whitespace(s): '{original}' -> {text:?}"
            )))
        })),
        Arc::new(FlipTextCharacter),
    ]
}

fn integer_mutators() -> Vec<Arc<dyn Mutator>> {
    vec![
        Arc::new(from_fn("RandomInteger", |value, rnd| {
            let Some(number) = integer_slot(value) else {
                return Ok(None);
            };
            let original = *number;
            *number = rnd.int_in(i64::MIN..=i64::MAX);
            if *number == original {
                return Ok(None);
            }
            Ok(Some(format!("Random integer: {original} -> {number}")))
        })),
        Arc::new(from_fn("NudgeInteger", |value, rnd| {
            let Some(number) = integer_slot(value) else {
                return Ok(None);
            };
            let original = *number;
            let delta = match rnd.int_in(-INTEGER_NUDGE..=INTEGER_NUDGE) {
                0 => 1,
                delta => delta,
            };
            *number = original.saturating_add(delta);
            if *number == original {
                return Ok(None);
            }
            Ok(Some(format!("Nudge integer by {delta}: {original} -> {number}")))
        })),
        Arc::new(from_fn("BoundaryInteger", |value, rnd| {
            let Some(number) = integer_slot(value) else {
                return Ok(None);
            };
            let original = *number;
            let candidates: Vec<i64> = BOUNDARY_INTEGERS
                .into_iter()
                .filter(|candidate| *candidate != original)
                .collect();
            *number = *rnd.choose_random_element(&candidates)?;
            Ok(Some(format!("Boundary integer: {original} -> {number}")))
        })),
    ]
}

fn decimal_mutators() -> Vec<Arc<dyn Mutator>> {
    vec![
        Arc::new(from_fn("NudgeDecimal", |value, rnd| {
            let Some(number) = decimal_slot(value) else {
                return Ok(None);
            };
            let original = *number;
            let delta: f64 = rnd.int_in(-1.0..1.0);
            let nudged = original + delta;
            *number = if nudged.is_finite() { nudged } else { 0.0 };
            if same_decimal(*number, original) {
                return Ok(None);
            }
            Ok(Some(format!("Nudge decimal: {original} -> {number}")))
        })),
        Arc::new(from_fn("SpecialDecimal", |value, rnd| {
            let Some(number) = decimal_slot(value) else {
                return Ok(None);
            };
            let original = *number;
            let candidates: Vec<f64> = SPECIAL_DECIMALS
                .into_iter()
                .filter(|candidate| !same_decimal(*candidate, original))
                .collect();
            *number = *rnd.choose_random_element(&candidates)?;
            Ok(Some(format!("Special decimal: {original} -> {number}")))
        })),
    ]
}

fn uri_mutators() -> Vec<Arc<dyn Mutator>> {
    vec![
        Arc::new(from_fn("SwapUriScheme", |value, rnd| {
            let Some(uri) = text_slot(value) else {
                return Ok(None);
            };
            let original = uri.clone();
            let current = URI_SCHEMES
                .into_iter()
                .find(|scheme| original.starts_with(*scheme));
            let remainder = match current {
                Some(scheme) => &original[scheme.len()..],
                None => original.as_str(),
            };
            let candidates: Vec<&str> = URI_SCHEMES
                .into_iter()
                .filter(|scheme| Some(*scheme) != current)
                .collect();
            let scheme = rnd.choose_random_element(&candidates)?;
            *uri = format!("{scheme}{remainder}");
            Ok(Some(format!("Swap URI scheme: '{original}' -> '{uri}'")))
        })),
        Arc::new(from_fn("AppendUriSegment", |value, rnd| {
            let Some(uri) = text_slot(value) else {
                return Ok(None);
            };
            let original = uri.clone();
            let segment = rnd.text(1..=12);
            uri.push('/');
            uri.push_str(&segment);
            Ok(Some(format!("Append URI segment: '{original}' -> '{uri}'")))
        })),
    ]
}

fn id_mutators() -> Vec<Arc<dyn Mutator>> {
    vec![
        Arc::new(from_fn("RandomId", |value, rnd| {
            let Some(id) = text_slot(value) else {
                return Ok(None);
            };
            let original = std::mem::replace(id, rnd.uuid());
            if *id == original {
                return Ok(None);
            }
            Ok(Some(format!("Random ID: '{original}' -> '{id}'")))
        })),
        Arc::new(from_fn("BreakId", |value, rnd| {
            let Some(id) = text_slot(value) else {
                return Ok(None);
            };
            let original = id.clone();
            let breaker = rnd.choose_random_element(&ID_BREAKERS)?;
            let position = rnd.int_in(0..=id.chars().count());
            let byte_index = id
                .char_indices()
                .nth(position)
                .map_or(id.len(), |(index, _)| index);
            id.insert_str(byte_index, breaker);
            Ok(Some(format!("Break ID with '{breaker}': '{original}' -> '{id}'")))
        })),
    ]
}

/// The baseline strategy set for the built-in primitive tags.
///
/// `Code` is deliberately absent: it resolves to the `Text` strategies through its lineage.
pub fn default_mutators() -> Vec<(&'static TypeTag, Arc<dyn Mutator>)> {
    let mut defaults: Vec<(&'static TypeTag, Arc<dyn Mutator>)> = Vec::new();
    let groups: [(&'static TypeTag, Vec<Arc<dyn Mutator>>); 6] = [
        (&TEXT, text_mutators()),
        (&URI, uri_mutators()),
        (&ID, id_mutators()),
        (&INTEGER, integer_mutators()),
        (&DECIMAL, decimal_mutators()),
        (&BOOLEAN, vec![Arc::new(FlipBoolean) as Arc<dyn Mutator>]),
    ];
    for (tag, mutators) in groups {
        defaults.extend(mutators.into_iter().map(|m| (tag, m)));
    }
    defaults
}
