//! A small document model used by the unit tests across the crate.

use crate::node::{CODE, Child, Fuzzable, Id, TEXT, TypeTag, URI, ValueMut};
use std::any::Any;

pub static RESOURCE: TypeTag = TypeTag::root("Resource");
pub static BUNDLE: TypeTag = TypeTag::extends("Bundle", &RESOURCE);
pub static TASK: TypeTag = TypeTag::extends("Task", &RESOURCE);
pub static CODING: TypeTag = TypeTag::root("Coding");
pub static DEEP_BUNDLE_ONE: TypeTag = TypeTag::extends("DeepBundleOne", &BUNDLE);
pub static DEEP_BUNDLE_TWO: TypeTag = TypeTag::extends("DeepBundleTwo", &DEEP_BUNDLE_ONE);
pub static DEEP_BUNDLE_THREE: TypeTag = TypeTag::extends("DeepBundleThree", &DEEP_BUNDLE_TWO);
pub static DEEP_TEXT_ONE: TypeTag = TypeTag::extends("DeepTextOne", &TEXT);
pub static DEEP_TEXT_TWO: TypeTag = TypeTag::extends("DeepTextTwo", &DEEP_TEXT_ONE);
pub static DEEP_TEXT_THREE: TypeTag = TypeTag::extends("DeepTextThree", &DEEP_TEXT_TWO);
pub static OPAQUE: TypeTag = TypeTag::root("Opaque");

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Uri(pub String);

impl Fuzzable for Uri {
    fn type_tag(&self) -> &'static TypeTag {
        &URI
    }
    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Text(&mut self.0))
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code(pub String);

impl Fuzzable for Code {
    fn type_tag(&self) -> &'static TypeTag {
        &CODE
    }
    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Text(&mut self.0))
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coding {
    pub system: Uri,
    pub code: Code,
    pub display: Option<String>,
}

impl Fuzzable for Coding {
    fn type_tag(&self) -> &'static TypeTag {
        &CODING
    }
    fn children(&mut self) -> Vec<Child<'_>> {
        vec![
            Child::field("system", &mut self.system),
            Child::field("code", &mut self.code),
            Child::optional("display", &mut self.display),
        ]
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    pub id: Option<Id>,
    pub status: Code,
    pub priority: i64,
    pub description: Option<String>,
    pub completed: bool,
    pub codings: Vec<Coding>,
}

impl Fuzzable for Task {
    fn type_tag(&self) -> &'static TypeTag {
        &TASK
    }
    fn children(&mut self) -> Vec<Child<'_>> {
        vec![
            Child::field("status", &mut self.status),
            Child::field("priority", &mut self.priority),
            Child::optional("description", &mut self.description),
            Child::field("completed", &mut self.completed),
            Child::resources(
                "coding",
                self.codings
                    .iter_mut()
                    .map(|c| c as &mut dyn Fuzzable)
                    .collect(),
            ),
        ]
    }
    fn id_mut(&mut self) -> Option<&mut Option<Id>> {
        Some(&mut self.id)
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Bundle {
    pub id: Option<Id>,
    pub identifier: Option<String>,
    pub timestamp: Option<i64>,
    pub entries: Vec<Box<dyn Fuzzable>>,
}

impl Fuzzable for Bundle {
    fn type_tag(&self) -> &'static TypeTag {
        &BUNDLE
    }
    fn children(&mut self) -> Vec<Child<'_>> {
        vec![
            Child::optional("identifier", &mut self.identifier),
            Child::optional("timestamp", &mut self.timestamp),
            Child::resources(
                "entry",
                self.entries
                    .iter_mut()
                    .map(|e| e.as_mut() as &mut dyn Fuzzable)
                    .collect(),
            ),
        ]
    }
    fn id_mut(&mut self) -> Option<&mut Option<Id>> {
        Some(&mut self.id)
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A bundle subtype three levels below `Bundle`, never registered anywhere.
/// It embeds the `Bundle` it extends.
#[derive(Debug, Default)]
pub struct DeepBundleThree {
    pub bundle: Bundle,
}

impl Fuzzable for DeepBundleThree {
    fn type_tag(&self) -> &'static TypeTag {
        &DEEP_BUNDLE_THREE
    }
    fn children(&mut self) -> Vec<Child<'_>> {
        self.bundle.children()
    }
    fn id_mut(&mut self) -> Option<&mut Option<Id>> {
        self.bundle.id_mut()
    }
    fn as_ancestor_mut(&mut self, tag: &'static TypeTag) -> Option<&mut dyn Fuzzable> {
        (tag == &BUNDLE).then_some(&mut self.bundle as &mut dyn Fuzzable)
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A text subtype three levels below `Text`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeepText(pub String);

impl Fuzzable for DeepText {
    fn type_tag(&self) -> &'static TypeTag {
        &DEEP_TEXT_THREE
    }
    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        Some(ValueMut::Text(&mut self.0))
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A leaf with neither payload nor children.
#[derive(Debug, Default)]
pub struct Opaque;

impl Fuzzable for Opaque {
    fn type_tag(&self) -> &'static TypeTag {
        &OPAQUE
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn sample_task() -> Task {
    Task {
        id: Some(Id("task-1".to_string())),
        status: Code("ready".to_string()),
        priority: 3,
        description: Some("Dispense medication".to_string()),
        completed: false,
        codings: vec![Coding {
            system: Uri("https://example.org/codes".to_string()),
            code: Code("A-17".to_string()),
            display: None,
        }],
    }
}

pub fn sample_bundle() -> Bundle {
    Bundle {
        id: None,
        identifier: Some("bundle-identifier".to_string()),
        timestamp: Some(1_700_000_000),
        entries: vec![Box::new(sample_task()), Box::new(Opaque)],
    }
}
