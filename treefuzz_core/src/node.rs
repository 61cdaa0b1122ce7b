//! The type-introspection capability the engine consumes.
//!
//! The engine never inspects a domain model directly. Every node of the object
//! graph implements [`Fuzzable`], which reports the node's runtime [`TypeTag`],
//! its named children and, where it has one, its primitive payload and ID element.
//! Type tags carry an explicit parent link, which is how a subtype several levels
//! deep still finds the mutators registered for one of its ancestors.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime type descriptor of a node, linked to the descriptor of its supertype.
///
/// Tags are declared as statics so that their lineage can be walked by reference.
/// Two tags are equal only if they are the same static, whatever their names:
///
/// ```
/// use treefuzz_core::{TypeTag, node::TEXT};
///
/// static URL: TypeTag = TypeTag::extends("Url", &TEXT);
///
/// assert!(URL.is_a(&TEXT));
/// assert_eq!(URL.lineage().map(TypeTag::name).collect::<Vec<_>>(), ["Url", "Text"]);
/// ```
#[derive(Debug)]
pub struct TypeTag {
    name: &'static str,
    parent: Option<&'static TypeTag>,
}

impl TypeTag {
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    pub const fn extends(name: &'static str, parent: &'static TypeTag) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static TypeTag> {
        self.parent
    }

    /// This tag followed by each of its ancestors, nearest first.
    pub fn lineage(&'static self) -> impl Iterator<Item = &'static TypeTag> {
        std::iter::successors(Some(self), |tag| tag.parent)
    }

    /// Whether `other` is this tag or one of its ancestors.
    pub fn is_a(&'static self, other: &TypeTag) -> bool {
        self.lineage().any(|tag| tag == other)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::from_ref(self).hash(state);
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub static TEXT: TypeTag = TypeTag::root("Text");
pub static URI: TypeTag = TypeTag::extends("Uri", &TEXT);
pub static CODE: TypeTag = TypeTag::extends("Code", &TEXT);
pub static ID: TypeTag = TypeTag::extends("Id", &TEXT);
pub static INTEGER: TypeTag = TypeTag::root("Integer");
pub static DECIMAL: TypeTag = TypeTag::root("Decimal");
pub static BOOLEAN: TypeTag = TypeTag::root("Boolean");

/// Mutable view on the primitive payload of a node.
#[derive(Debug)]
pub enum ValueMut<'a> {
    Text(&'a mut String),
    Integer(&'a mut i64),
    Decimal(&'a mut f64),
    Boolean(&'a mut bool),
}

/// A named child of a node, as enumerated by [`Fuzzable::children`].
#[derive(Debug)]
pub enum Child<'a> {
    /// A single field; `None` when the field is absent.
    Node {
        name: String,
        value: Option<&'a mut dyn Fuzzable>,
    },
    /// A container of child resources, traversed element by element.
    Resources {
        name: String,
        items: Vec<&'a mut dyn Fuzzable>,
    },
}

impl<'a> Child<'a> {
    pub fn node(name: impl Into<String>, value: Option<&'a mut dyn Fuzzable>) -> Self {
        Child::Node {
            name: name.into(),
            value,
        }
    }

    pub fn field<T: Fuzzable>(name: impl Into<String>, value: &'a mut T) -> Self {
        Child::node(name, Some(value as &mut dyn Fuzzable))
    }

    pub fn optional<T: Fuzzable>(name: impl Into<String>, value: &'a mut Option<T>) -> Self {
        Child::node(name, value.as_mut().map(|v| v as &mut dyn Fuzzable))
    }

    pub fn resources(name: impl Into<String>, items: Vec<&'a mut dyn Fuzzable>) -> Self {
        Child::Resources {
            name: name.into(),
            items,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Child::Node { name, .. } | Child::Resources { name, .. } => name,
        }
    }
}

/// A node of a fuzzable object graph.
///
/// Only `type_tag` and `as_any_mut` are required; leaf types usually expose a
/// [`ValueMut`] and composite types their [`Child`]ren.
pub trait Fuzzable: Any + fmt::Debug {
    /// The runtime type of this node.
    fn type_tag(&self) -> &'static TypeTag;

    /// The primitive payload of this node, if it has one.
    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        None
    }

    /// Named children in declaration order.
    fn children(&mut self) -> Vec<Child<'_>> {
        Vec::new()
    }

    /// The ID slot of this node; `None` if the type has no ID element at all.
    fn id_mut(&mut self) -> Option<&mut Option<Id>> {
        None
    }

    /// A view of this node as its ancestor `tag`, for types that embed the value of
    /// a supertype. Mutators registered for the ancestor reach the node through it.
    fn as_ancestor_mut(&mut self, _tag: &'static TypeTag) -> Option<&mut dyn Fuzzable> {
        None
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Fuzzable {
    pub fn downcast_mut<T: Fuzzable>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcasts to `T`, or else to the first ancestor view of type `T`, nearest first.
    pub fn downcast_lineage_mut<T: Fuzzable>(&mut self) -> Option<&mut T> {
        if self.as_any_mut().is::<T>() {
            return self.downcast_mut::<T>();
        }
        let ancestor = self
            .type_tag()
            .lineage()
            .skip(1)
            .find(|&tag| {
                self.as_ancestor_mut(tag)
                    .is_some_and(|view| view.as_any_mut().is::<T>())
            })?;
        self.as_ancestor_mut(ancestor)?.downcast_mut::<T>()
    }
}

/// The ID element of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Id(pub String);

impl Fuzzable for Id {
    fn type_tag(&self) -> &'static TypeTag {
        &ID
    }

    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Text(&mut self.0))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Fuzzable for String {
    fn type_tag(&self) -> &'static TypeTag {
        &TEXT
    }

    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Text(self))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Fuzzable for i64 {
    fn type_tag(&self) -> &'static TypeTag {
        &INTEGER
    }

    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Integer(self))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Fuzzable for f64 {
    fn type_tag(&self) -> &'static TypeTag {
        &DECIMAL
    }

    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Decimal(self))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Fuzzable for bool {
    fn type_tag(&self) -> &'static TypeTag {
        &BOOLEAN
    }

    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Boolean(self))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
