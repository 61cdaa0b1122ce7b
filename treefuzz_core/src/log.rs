//! The audit trail of a fuzzing session.
//!
//! Every decision point of a traversal produces one [`FuzzLogEntry`]; entries nest the
//! way the traversed object graph nests. A finished session is wrapped in a
//! [`FuzzingSessionLogbook`], which is what callers keep and inspect.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Name of the entry synthesized for a session that produced no entries.
pub const EMPTY_SESSION_ENTRY: &str = "<empty session>";

/// Outcome of a single decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Noop,
    Mutated,
    /// A value that did not exist before was created.
    Added,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Noop => "NOOP",
            EntryKind::Mutated => "MUTATED",
            EntryKind::Added => "ADDED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzLogEntry {
    name: String,
    kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<FuzzLogEntry>,
}

impl FuzzLogEntry {
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Noop, None)
    }

    /// A NOOP entry recording why nothing happened.
    pub fn noop_because(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Noop, Some(reason.into()))
    }

    pub fn mutated(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Mutated, Some(description.into()))
    }

    pub fn added(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Added, Some(description.into()))
    }

    fn new(name: impl Into<String>, kind: EntryKind, detail: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            detail,
            children: Vec::new(),
        }
    }

    /// Attaches nested entries, consuming and returning the entry.
    pub fn with_children(mut self, children: Vec<FuzzLogEntry>) -> Self {
        self.children = children;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn children(&self) -> &[FuzzLogEntry] {
        &self.children
    }

    pub fn is_noop(&self) -> bool {
        self.kind == EntryKind::Noop
    }

    /// Number of entries of `kind` in this subtree, this entry included.
    pub fn count(&self, kind: EntryKind) -> usize {
        usize::from(self.kind == kind)
            + self
                .children
                .iter()
                .map(|child| child.count(kind))
                .sum::<usize>()
    }

    /// This entry and all nested entries, depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FuzzLogEntry> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let entry = stack.pop()?;
            stack.extend(entry.children.iter().rev());
            Some(entry)
        })
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{} [{}]", "", self.name, self.kind, indent = depth * 2)?;
        if let Some(detail) = &self.detail {
            write!(f, " {detail}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for FuzzLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// The write-once record of one fuzzing session.
///
/// The only way to obtain one is [`FuzzingSessionLogbook::log_session`], which
/// guarantees the root entry has at least one child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzingSessionLogbook {
    label: String,
    started: DateTime<Utc>,
    #[serde(serialize_with = "serialize_duration_ms")]
    duration: Duration,
    mutations: usize,
    added: usize,
    noops: usize,
    root: FuzzLogEntry,
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

impl FuzzingSessionLogbook {
    /// Wraps the top-level `entries` of a session.
    ///
    /// An empty `entries` is replaced by a single NOOP entry. The start time is
    /// derived from the current time and `duration`, and is the earliest representable
    /// time if `duration` reaches back further than that.
    pub fn log_session(
        label: impl Into<String>,
        duration: Duration,
        entries: Vec<FuzzLogEntry>,
    ) -> Self {
        let started = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|elapsed| Utc::now().checked_sub_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::log_session_started_at(label, started, duration, entries)
    }

    pub(crate) fn log_session_started_at(
        label: impl Into<String>,
        started: DateTime<Utc>,
        duration: Duration,
        mut entries: Vec<FuzzLogEntry>,
    ) -> Self {
        let label = label.into();
        if entries.is_empty() {
            entries.push(FuzzLogEntry::noop_because(
                EMPTY_SESSION_ENTRY,
                "session produced no entries",
            ));
        }
        let root = FuzzLogEntry::noop(label.clone()).with_children(entries);
        let count_below_root = |kind| root.count(kind) - usize::from(root.kind == kind);

        Self {
            mutations: count_below_root(EntryKind::Mutated),
            added: count_below_root(EntryKind::Added),
            noops: count_below_root(EntryKind::Noop),
            label,
            started,
            duration,
            root,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The session root; its children are the entries produced at the top level.
    pub fn root(&self) -> &FuzzLogEntry {
        &self.root
    }

    pub fn entries(&self) -> &[FuzzLogEntry] {
        self.root.children()
    }

    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn added(&self) -> usize {
        self.added
    }

    pub fn noops(&self) -> usize {
        self.noops
    }

    /// Number of entries that changed the document: mutations plus additions.
    pub fn changes(&self) -> usize {
        self.mutations + self.added
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for FuzzingSessionLogbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (started {}, took {:?}, {} mutation(s), {} addition(s), {} noop(s))",
            self.label,
            self.started.to_rfc3339(),
            self.duration,
            self.mutations,
            self.added,
            self.noops
        )?;
        for entry in self.entries() {
            entry.write_tree(f, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample_tree() -> Vec<FuzzLogEntry> {
        vec![
            FuzzLogEntry::noop("Task").with_children(vec![
                FuzzLogEntry::added("id", "Created ID 1234")
                    .with_children(vec![FuzzLogEntry::noop("id")]),
                FuzzLogEntry::mutated("status", "Reverse text: 'ab' -> 'ba'"),
                FuzzLogEntry::noop_because("description", "absent"),
            ]),
            FuzzLogEntry::mutated("priority", "Nudge integer by 1: 3 -> 4"),
        ]
    }

    #[test]
    fn empty_session_gets_exactly_one_noop_entry() {
        let logbook = FuzzingSessionLogbook::log_session("empty", Duration::ZERO, Vec::new());
        assert_eq!(logbook.entries().len(), 1);
        assert_eq!(logbook.entries()[0].kind(), EntryKind::Noop);
        assert_eq!(logbook.entries()[0].name(), EMPTY_SESSION_ENTRY);
        assert_eq!(logbook.noops(), 1);
        assert_eq!(logbook.changes(), 0);
        assert_eq!(logbook.duration(), Duration::ZERO);
    }

    #[test]
    fn counters_cover_the_whole_tree_but_not_the_root() {
        let logbook =
            FuzzingSessionLogbook::log_session("counted", Duration::from_millis(5), sample_tree());
        assert_eq!(logbook.mutations(), 2);
        assert_eq!(logbook.added(), 1);
        assert_eq!(logbook.noops(), 3);
        assert_eq!(logbook.changes(), 3);
        assert_eq!(logbook.root().name(), "counted");
        assert_eq!(logbook.root().iter().count(), 7);
    }

    #[test]
    fn iter_walks_pre_order() {
        let root = FuzzLogEntry::noop("root").with_children(sample_tree());
        let names: Vec<&str> = root.iter().map(FuzzLogEntry::name).collect();
        assert_eq!(
            names,
            ["root", "Task", "id", "id", "status", "description", "priority"]
        );
    }

    #[test]
    fn started_precedes_now_by_duration() {
        let before = Utc::now();
        let logbook =
            FuzzingSessionLogbook::log_session("timed", Duration::from_secs(60), Vec::new());
        assert!(logbook.started() <= before - chrono::Duration::seconds(59));
    }

    #[test]
    fn durations_beyond_the_calendar_start_at_the_earliest_time() {
        let duration = Duration::from_secs(20_000_000_000_000);
        let logbook = FuzzingSessionLogbook::log_session("ancient", duration, Vec::new());
        assert_eq!(logbook.started(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(logbook.duration(), duration);

        let logbook = FuzzingSessionLogbook::log_session("longest", Duration::MAX, Vec::new());
        assert_eq!(logbook.started(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(logbook.entries().len(), 1);
    }

    #[test]
    fn json_rendering_contains_kinds_and_omits_empty_fields() {
        let logbook =
            FuzzingSessionLogbook::log_session("json", Duration::from_millis(12), sample_tree());
        let json: Value = serde_json::from_str(&logbook.to_json().unwrap()).unwrap();

        assert_eq!(json["label"], "json");
        assert_eq!(json["duration"], 12);
        assert_eq!(json["mutations"], 2);
        let task = &json["root"]["children"][0];
        assert_eq!(task["kind"], "NOOP");
        assert!(task.get("detail").is_none());
        assert_eq!(task["children"][0]["kind"], "ADDED");
        assert_eq!(task["children"][1]["detail"], "Reverse text: 'ab' -> 'ba'");
        assert!(task["children"][1].get("children").is_none());

        assert!(logbook.to_json_pretty().unwrap().contains('\n'));
    }

    #[test]
    fn display_renders_an_indented_tree() {
        let logbook = FuzzingSessionLogbook::log_session("shown", Duration::ZERO, sample_tree());
        let rendered = logbook.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("shown (started "));
        assert_eq!(lines[1], "  Task [NOOP]");
        assert_eq!(lines[2], "    id [ADDED] Created ID 1234");
        assert_eq!(lines[3], "      id [NOOP]");
        assert_eq!(lines[5], "    description [NOOP] absent");
    }
}
