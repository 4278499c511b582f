//! Selector tree
//!
//! Provides [`Selector`], an immutable predicate tree describing which events
//! an edit should touch. Selectors are pure data: two selectors with the same
//! shape behave identically no matter how they were built.

use gofai_ident::{EventId, LayerId, SectionId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::event::{DynamicMarking, EventKind, PropertyValue, Role};

/// Maximum nesting depth accepted by validation
pub const MAX_DEPTH: usize = 10;

/// Event predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selector {
    /// Every event
    All,
    /// No event
    None,
    /// Events of any listed kind
    Kind {
        /// Accepted kinds
        kinds: Vec<EventKind>,
    },
    /// Events whose pitch falls in a range
    Pitch {
        /// Pitch range
        range: PitchRange,
    },
    /// Events whose onset falls in an inclusive bar range
    Time {
        /// First bar (1-based)
        start_bar: i32,
        /// Last bar (inclusive)
        end_bar: i32,
    },
    /// Events on a layer
    Layer {
        /// Layer identifier
        layer: LayerId,
    },
    /// Events in a section
    Section {
        /// Section identifier
        section: SectionId,
    },
    /// Events whose layer plays a role
    Role {
        /// Musical role
        role: Role,
    },
    /// Events carrying tags
    Tag {
        /// Tags to test
        tags: Vec<String>,
        /// Whether any or all tags must be present
        #[serde(default)]
        mode: TagMatch,
    },
    /// Events at a rhythmic position
    Rhythm {
        /// Rhythmic pattern
        pattern: RhythmPattern,
    },
    /// Events whose velocity falls in a range
    Velocity {
        /// Minimum velocity (inclusive)
        min: i32,
        /// Maximum velocity (inclusive)
        max: i32,
    },
    /// Events whose duration falls in a range
    Duration {
        /// Minimum length in beats
        #[serde(default)]
        min_beats: Option<f64>,
        /// Maximum length in beats
        #[serde(default)]
        max_beats: Option<f64>,
    },
    /// Events with any listed articulation
    Articulation {
        /// Articulation names
        articulations: Vec<String>,
    },
    /// Events with any listed dynamic marking
    Dynamic {
        /// Accepted markings
        markings: Vec<DynamicMarking>,
    },
    /// First or last event of each group
    Position {
        /// First or last
        position: GroupPosition,
        /// Grouping
        group: Grouping,
    },
    /// Events whose named property satisfies a comparison
    Property {
        /// Property name
        name: String,
        /// Comparison operator
        op: Comparison,
        /// Right-hand operand (absent for `exists`)
        #[serde(default)]
        value: Option<PropertyValue>,
    },
    /// An explicit set of events
    Events {
        /// Event identifiers
        ids: Vec<EventId>,
    },
    /// Events matched by every child
    And {
        /// Operands
        children: Vec<Selector>,
    },
    /// Events matched by any child
    Or {
        /// Operands
        children: Vec<Selector>,
    },
    /// Events not matched by the child
    Not {
        /// Negated operand
        child: Box<Selector>,
    },
    /// Events matched by `base` but not by `subtract`
    Difference {
        /// Minuend
        base: Box<Selector>,
        /// Subtrahend
        subtract: Box<Selector>,
    },
    /// The n-th event (1-based) of the base selection
    Nth {
        /// Base selection
        base: Box<Selector>,
        /// Position, 1-based
        n: u32,
        /// Count from the start or the end
        #[serde(default)]
        from: CountFrom,
    },
    /// The first or last `count` events of the base selection
    Slice {
        /// Base selection
        base: Box<Selector>,
        /// Number of events
        count: u32,
        /// Take from the start or the end
        #[serde(default)]
        from: CountFrom,
    },
    /// Events adjacent to the base selection on the same layer
    Neighbor {
        /// Base selection
        base: Box<Selector>,
        /// Neighbours per side
        count: u32,
        /// Which side(s)
        direction: NeighborDirection,
    },
    /// Events taken from live UI or discourse state
    Contextual {
        /// Where the events come from
        source: ContextSource,
        /// Used when the source is unavailable
        #[serde(default)]
        fallback: Option<Box<Selector>>,
    },
}

/// Pitch range leaf operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchRange {
    /// Named register
    Register(Register),
    /// Explicit MIDI bounds (inclusive)
    Midi {
        /// Lowest MIDI note
        min: i32,
        /// Highest MIDI note
        max: i32,
    },
}

/// Named pitch register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    /// Below C3
    Low,
    /// C3 up to B4
    Mid,
    /// C5 and above
    High,
}

impl Register {
    /// Inclusive MIDI bounds of this register
    #[must_use]
    pub const fn bounds(self) -> (u8, u8) {
        match self {
            Register::Low => (0, 47),
            Register::Mid => (48, 71),
            Register::High => (72, 127),
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Register::Low => "low",
            Register::Mid => "mid",
            Register::High => "high",
        }
    }
}

/// Tag matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// At least one tag present
    #[default]
    Any,
    /// Every tag present
    All,
}

/// Rhythmic position pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmPattern {
    /// First beat of the bar
    Downbeat,
    /// On a whole beat
    OnBeat,
    /// Exactly between two beats
    OffBeat,
    /// Neither on a beat nor on the half beat
    Syncopated,
}

/// First/last selector within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPosition {
    /// Earliest event in the group
    First,
    /// Latest event in the group
    Last,
}

/// How events are grouped for [`Selector::Position`]
///
/// Groups never span layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Per layer and bar
    Bar,
    /// Per layer and section
    Section,
    /// Per layer
    Layer,
}

/// Property comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Property is present
    Exists,
}

impl Comparison {
    /// True for operators that need a numeric operand
    #[inline]
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Comparison::Lt | Comparison::Le | Comparison::Gt | Comparison::Ge)
    }
}

/// End of a selection positional combinators count from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountFrom {
    /// Count from the earliest event
    #[default]
    Start,
    /// Count from the latest event
    End,
}

/// Side(s) for [`Selector::Neighbor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborDirection {
    /// Preceding events
    Before,
    /// Following events
    After,
    /// Both sides
    Both,
}

/// Runtime state a contextual selector reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Events currently selected in the UI
    Selection,
    /// Events referred to earlier in the conversation
    Discourse,
    /// Events in the bar under the playhead
    Playhead,
}

impl Display for ContextSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextSource::Selection => "selection",
            ContextSource::Discourse => "discourse",
            ContextSource::Playhead => "playhead",
        })
    }
}

/// Position of a child within its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    /// Operand of an n-ary node
    Operand(usize),
    /// Operand of `not`
    Child,
    /// Base of a difference or positional node
    Base,
    /// Subtrahend of a difference
    Subtract,
    /// Fallback of a contextual node
    Fallback,
}

impl Display for ChildSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChildSlot::Operand(i) => write!(f, "children[{i}]"),
            ChildSlot::Child => f.write_str("child"),
            ChildSlot::Base => f.write_str("base"),
            ChildSlot::Subtract => f.write_str("subtract"),
            ChildSlot::Fallback => f.write_str("fallback"),
        }
    }
}

impl Selector {
    // ----------------------------------------------------------------------
    // Leaf builders
    // ----------------------------------------------------------------------

    /// Every event
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Selector::All
    }

    /// No event
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Selector::None
    }

    /// Events of one kind
    #[inline]
    #[must_use]
    pub fn kind(kind: EventKind) -> Self {
        Selector::Kind { kinds: vec![kind] }
    }

    /// Events of any of the given kinds
    #[must_use]
    pub fn kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Selector::Kind {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Events in a named register
    #[inline]
    #[must_use]
    pub fn register(register: Register) -> Self {
        Selector::Pitch {
            range: PitchRange::Register(register),
        }
    }

    /// Events with MIDI pitch in `min..=max`
    #[inline]
    #[must_use]
    pub fn pitch(min: i32, max: i32) -> Self {
        Selector::Pitch {
            range: PitchRange::Midi { min, max },
        }
    }

    /// Events in bars `start..=end`
    #[inline]
    #[must_use]
    pub fn bars(start_bar: i32, end_bar: i32) -> Self {
        Selector::Time { start_bar, end_bar }
    }

    /// Events on a layer
    #[inline]
    #[must_use]
    pub fn layer(layer: LayerId) -> Self {
        Selector::Layer { layer }
    }

    /// Events in a section
    #[inline]
    #[must_use]
    pub fn section(section: SectionId) -> Self {
        Selector::Section { section }
    }

    /// Events whose layer plays `role`
    #[inline]
    #[must_use]
    pub fn role(role: Role) -> Self {
        Selector::Role { role }
    }

    /// Events carrying any of the tags
    #[must_use]
    pub fn tagged<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        Selector::Tag {
            tags: tags.into_iter().map(Into::into).collect(),
            mode: TagMatch::Any,
        }
    }

    /// Events at a rhythmic position
    #[inline]
    #[must_use]
    pub fn rhythm(pattern: RhythmPattern) -> Self {
        Selector::Rhythm { pattern }
    }

    /// Events with velocity in `min..=max`
    #[inline]
    #[must_use]
    pub fn velocity(min: i32, max: i32) -> Self {
        Selector::Velocity { min, max }
    }

    /// Events whose length in beats falls within the bounds
    #[inline]
    #[must_use]
    pub fn duration(min_beats: Option<f64>, max_beats: Option<f64>) -> Self {
        Selector::Duration {
            min_beats,
            max_beats,
        }
    }

    /// Events with any of the articulations
    #[must_use]
    pub fn articulation<S: Into<String>>(articulations: impl IntoIterator<Item = S>) -> Self {
        Selector::Articulation {
            articulations: articulations.into_iter().map(Into::into).collect(),
        }
    }

    /// Events with any of the dynamic markings
    #[must_use]
    pub fn dynamic(markings: impl IntoIterator<Item = DynamicMarking>) -> Self {
        Selector::Dynamic {
            markings: markings.into_iter().collect(),
        }
    }

    /// First or last event of each group
    #[inline]
    #[must_use]
    pub fn position(position: GroupPosition, group: Grouping) -> Self {
        Selector::Position { position, group }
    }

    /// Events whose property satisfies `op value`
    #[must_use]
    pub fn property(name: impl Into<String>, op: Comparison, value: PropertyValue) -> Self {
        Selector::Property {
            name: name.into(),
            op,
            value: Some(value),
        }
    }

    /// Events that carry the property
    #[must_use]
    pub fn has_property(name: impl Into<String>) -> Self {
        Selector::Property {
            name: name.into(),
            op: Comparison::Exists,
            value: None,
        }
    }

    /// An explicit set of events
    #[must_use]
    pub fn events(ids: impl IntoIterator<Item = EventId>) -> Self {
        Selector::Events {
            ids: ids.into_iter().collect(),
        }
    }

    /// Events read from live context
    #[inline]
    #[must_use]
    pub fn contextual(source: ContextSource) -> Self {
        Selector::Contextual {
            source,
            fallback: None,
        }
    }

    // ----------------------------------------------------------------------
    // Combinators
    // ----------------------------------------------------------------------

    /// Conjunction of all operands, flattened
    #[must_use]
    pub fn and_all(operands: impl IntoIterator<Item = Selector>) -> Self {
        Selector::And {
            children: operands.into_iter().collect(),
        }
        .flatten_top()
    }

    /// Disjunction of all operands, flattened
    #[must_use]
    pub fn or_any(operands: impl IntoIterator<Item = Selector>) -> Self {
        Selector::Or {
            children: operands.into_iter().collect(),
        }
        .flatten_top()
    }

    /// `self` and `other`
    #[must_use]
    pub fn and(self, other: Selector) -> Self {
        Self::and_all([self, other])
    }

    /// `self` or `other`
    #[must_use]
    pub fn or(self, other: Selector) -> Self {
        Self::or_any([self, other])
    }

    /// Everything except `self`
    #[must_use]
    pub fn negate(self) -> Self {
        Selector::Not {
            child: Box::new(self),
        }
    }

    /// `self` without `other`
    #[must_use]
    pub fn except(self, other: Selector) -> Self {
        Selector::Difference {
            base: Box::new(self),
            subtract: Box::new(other),
        }
    }

    /// The n-th match (1-based)
    #[must_use]
    pub fn nth(self, n: u32) -> Self {
        Selector::Nth {
            base: Box::new(self),
            n,
            from: CountFrom::Start,
        }
    }

    /// The n-th match counting back from the last (1 = last)
    #[must_use]
    pub fn nth_from_end(self, n: u32) -> Self {
        Selector::Nth {
            base: Box::new(self),
            n,
            from: CountFrom::End,
        }
    }

    /// The first `count` matches
    #[must_use]
    pub fn first(self, count: u32) -> Self {
        Selector::Slice {
            base: Box::new(self),
            count,
            from: CountFrom::Start,
        }
    }

    /// The last `count` matches
    #[must_use]
    pub fn last(self, count: u32) -> Self {
        Selector::Slice {
            base: Box::new(self),
            count,
            from: CountFrom::End,
        }
    }

    /// Up to `count` same-layer neighbours on the given side(s)
    #[must_use]
    pub fn neighbors(self, count: u32, direction: NeighborDirection) -> Self {
        Selector::Neighbor {
            base: Box::new(self),
            count,
            direction,
        }
    }

    /// Attach a fallback to a contextual node; other nodes are returned unchanged
    #[must_use]
    pub fn with_fallback(self, fallback: Selector) -> Self {
        match self {
            Selector::Contextual { source, .. } => Selector::Contextual {
                source,
                fallback: Some(Box::new(fallback)),
            },
            other => other,
        }
    }

    // ----------------------------------------------------------------------
    // Tree shape
    // ----------------------------------------------------------------------

    /// Children with their slot, in evaluation order
    ///
    /// This is the single place that knows where each node kind keeps its
    /// children; every recursive algorithm goes through it.
    #[must_use]
    pub fn children(&self) -> Vec<(ChildSlot, &Selector)> {
        match self {
            Selector::And { children } | Selector::Or { children } => children
                .iter()
                .enumerate()
                .map(|(i, c)| (ChildSlot::Operand(i), c))
                .collect(),
            Selector::Not { child } => vec![(ChildSlot::Child, child.as_ref())],
            Selector::Difference { base, subtract } => vec![
                (ChildSlot::Base, base.as_ref()),
                (ChildSlot::Subtract, subtract.as_ref()),
            ],
            Selector::Nth { base, .. }
            | Selector::Slice { base, .. }
            | Selector::Neighbor { base, .. } => vec![(ChildSlot::Base, base.as_ref())],
            Selector::Contextual { fallback, .. } => fallback
                .iter()
                .map(|f| (ChildSlot::Fallback, f.as_ref()))
                .collect(),
            Selector::All
            | Selector::None
            | Selector::Kind { .. }
            | Selector::Pitch { .. }
            | Selector::Time { .. }
            | Selector::Layer { .. }
            | Selector::Section { .. }
            | Selector::Role { .. }
            | Selector::Tag { .. }
            | Selector::Rhythm { .. }
            | Selector::Velocity { .. }
            | Selector::Duration { .. }
            | Selector::Articulation { .. }
            | Selector::Dynamic { .. }
            | Selector::Position { .. }
            | Selector::Property { .. }
            | Selector::Events { .. } => Vec::new(),
        }
    }

    /// Bottom-up fold
    ///
    /// `f` receives each node together with the already-folded results of its
    /// children (in [`Selector::children`] order).
    pub fn fold<T, F>(&self, f: &mut F) -> T
    where
        F: FnMut(&Selector, Vec<T>) -> T,
    {
        let folded: Vec<T> = self
            .children()
            .into_iter()
            .map(|(_, child)| child.fold(f))
            .collect();
        f(self, folded)
    }

    /// Nesting depth; leaves are 0 and every node with children adds one level
    #[must_use]
    pub fn depth(&self) -> usize {
        self.fold(&mut |_, kids: Vec<usize>| {
            kids.into_iter().max().map_or(0, |deepest| deepest + 1)
        })
    }

    /// Total number of nodes
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.fold(&mut |_, kids: Vec<usize>| 1 + kids.into_iter().sum::<usize>())
    }

    /// True if any node needs live UI or discourse state
    #[must_use]
    pub fn requires_context(&self) -> bool {
        self.fold(&mut |node, kids: Vec<bool>| {
            matches!(node, Selector::Contextual { .. }) || kids.into_iter().any(|k| k)
        })
    }

    /// True for nodes that combine other selectors
    #[inline]
    #[must_use]
    pub fn is_combinator(&self) -> bool {
        matches!(
            self,
            Selector::And { .. }
                | Selector::Or { .. }
                | Selector::Not { .. }
                | Selector::Difference { .. }
                | Selector::Nth { .. }
                | Selector::Slice { .. }
                | Selector::Neighbor { .. }
        )
    }

    /// Flatten nested `and`/`or` nodes throughout the tree
    ///
    /// `and(and(a, b), c)` becomes `and(a, b, c)`; matched events are unchanged.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Selector::And { children } => Selector::And {
                children: children.into_iter().map(Selector::normalize).collect(),
            }
            .flatten_top(),
            Selector::Or { children } => Selector::Or {
                children: children.into_iter().map(Selector::normalize).collect(),
            }
            .flatten_top(),
            Selector::Not { child } => Selector::Not {
                child: Box::new(child.normalize()),
            },
            Selector::Difference { base, subtract } => Selector::Difference {
                base: Box::new(base.normalize()),
                subtract: Box::new(subtract.normalize()),
            },
            Selector::Nth { base, n, from } => Selector::Nth {
                base: Box::new(base.normalize()),
                n,
                from,
            },
            Selector::Slice { base, count, from } => Selector::Slice {
                base: Box::new(base.normalize()),
                count,
                from,
            },
            Selector::Neighbor {
                base,
                count,
                direction,
            } => Selector::Neighbor {
                base: Box::new(base.normalize()),
                count,
                direction,
            },
            Selector::Contextual { source, fallback } => Selector::Contextual {
                source,
                fallback: fallback.map(|f| Box::new(f.normalize())),
            },
            leaf => leaf,
        }
    }

    /// Splice same-kind children into this node (one level)
    fn flatten_top(self) -> Self {
        match self {
            Selector::And { children } => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        Selector::And { children: inner } => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                Selector::And { children: flat }
            }
            Selector::Or { children } => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        Selector::Or { children: inner } => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                Selector::Or { children: flat }
            }
            other => other,
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Selector::All
    }
}

impl std::ops::Not for Selector {
    type Output = Selector;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note() -> Selector {
        Selector::kind(EventKind::Note)
    }

    fn nest_not(levels: usize) -> Selector {
        (0..levels).fold(Selector::all(), |acc, _| acc.negate())
    }

    #[test]
    fn and_builder_flattens() {
        let sel = note()
            .and(Selector::register(Register::High))
            .and(Selector::bars(1, 4));

        match &sel {
            Selector::And { children } => assert_eq!(children.len(), 3),
            other => panic!("expected and, got {other:?}"),
        }
    }

    #[test]
    fn normalize_flattens_nested_and_or() {
        let nested = Selector::And {
            children: vec![
                Selector::And {
                    children: vec![note(), Selector::register(Register::Low)],
                },
                Selector::Or {
                    children: vec![
                        Selector::Or {
                            children: vec![Selector::bars(1, 2), Selector::bars(5, 6)],
                        },
                        Selector::bars(9, 10),
                    ],
                },
            ],
        };

        let expected = Selector::And {
            children: vec![
                note(),
                Selector::register(Register::Low),
                Selector::Or {
                    children: vec![
                        Selector::bars(1, 2),
                        Selector::bars(5, 6),
                        Selector::bars(9, 10),
                    ],
                },
            ],
        };

        assert_eq!(nested.normalize(), expected);
    }

    #[test]
    fn normalize_does_not_merge_or_into_and() {
        let sel = Selector::And {
            children: vec![Selector::Or {
                children: vec![note(), Selector::none()],
            }],
        };
        assert_eq!(sel.clone().normalize(), sel);
    }

    #[test]
    fn builder_and_literal_have_same_shape() {
        let built = note().and(Selector::register(Register::High));
        let literal = Selector::And {
            children: vec![note(), Selector::register(Register::High)],
        };
        assert_eq!(built, literal);
    }

    #[test]
    fn depth_counts_nodes_with_children() {
        assert_eq!(Selector::all().depth(), 0);
        assert_eq!(nest_not(1).depth(), 1);
        assert_eq!(nest_not(10).depth(), 10);
        assert_eq!(note().first(3).depth(), 1);
        assert_eq!(note().neighbors(1, NeighborDirection::Both).depth(), 1);
        assert_eq!(
            Selector::contextual(ContextSource::Selection)
                .with_fallback(note())
                .depth(),
            1
        );
    }

    #[test]
    fn predicate_count_counts_every_node() {
        let sel = note().and(Selector::bars(1, 2)).except(Selector::none());
        // difference + and + kind + time + none
        assert_eq!(sel.predicate_count(), 5);
    }

    #[test]
    fn requires_context_propagates() {
        let ctx = Selector::contextual(ContextSource::Discourse);
        assert!(ctx.requires_context());
        assert!(note().and(ctx.clone()).requires_context());
        assert!(ctx.clone().negate().requires_context());
        assert!(note().except(ctx.clone()).first(2).requires_context());
        assert!(!note().and(Selector::bars(1, 8)).requires_context());
    }

    #[test]
    fn with_fallback_only_applies_to_contextual() {
        let sel = note().with_fallback(Selector::none());
        assert_eq!(sel, note());
    }

    #[test]
    fn children_slots() {
        let sel = note().except(Selector::none());
        let slots: Vec<String> = sel.children().iter().map(|(s, _)| s.to_string()).collect();
        assert_eq!(slots, vec!["base".to_string(), "subtract".to_string()]);
    }

    #[test]
    fn serde_tagged_shape() {
        let sel = note().and(Selector::register(Register::High));
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["type"], "and");
        assert_eq!(json["children"][0]["type"], "kind");
        assert_eq!(json["children"][0]["kinds"][0], "note");
        assert_eq!(json["children"][1]["range"]["register"], "high");

        let back: Selector = serde_json::from_value(json).unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn not_operator() {
        assert_eq!(!note(), note().negate());
    }
}
