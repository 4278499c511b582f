//! Reference evaluator
//!
//! Materializes the events a selector matches against a read-only event
//! source and (for contextual nodes) live UI/discourse state. Results are
//! always returned in canonical order (bar, beat, layer, id), so evaluating
//! the same selector twice over unchanged inputs yields identical output.

use gofai_ident::{EventId, LayerId, SectionId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::describe::describe;
use crate::event::{Event, PropertyValue};
use crate::selector::{
    Comparison, ContextSource, CountFrom, GroupPosition, Grouping, NeighborDirection, PitchRange,
    RhythmPattern, Selector, TagMatch, MAX_DEPTH,
};
use crate::validate::{validate_with_limit, ValidationError};

const BEAT_EPSILON: f64 = 1e-6;

/// Read-only access to a project's events
pub trait EventSource {
    /// Every event, in any order
    fn events(&self) -> &[Event];
}

impl EventSource for Vec<Event> {
    fn events(&self) -> &[Event] {
        self
    }
}

impl EventSource for [Event] {
    fn events(&self) -> &[Event] {
        self
    }
}

/// Availability of one piece of runtime context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState<'a> {
    /// Present and current
    Available(&'a [EventId]),
    /// Present but out of date
    Stale,
    /// Not present
    Missing,
}

/// Runtime state contextual selectors read
///
/// Supplied fresh by the caller on every evaluation and never retained.
pub trait SelectionContext {
    /// Events currently selected in the UI
    fn selected_events(&self) -> ContextState<'_>;

    /// Events referred to earlier in the conversation, most recent first
    fn referenced_events(&self) -> ContextState<'_>;

    /// Bar under the playhead
    fn playhead_bar(&self) -> Option<u32>;
}

/// Evaluation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The selector failed validation
    #[error("selector is invalid: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// A contextual node had no context and no fallback
    #[error("selector needs the current {context} but none is available")]
    ContextRequired {
        /// Missing context
        context: ContextSource,
    },

    /// A contextual node found stale context and no fallback
    #[error("the current {context} is out of date")]
    StaleContext {
        /// Stale context
        context: ContextSource,
    },

    /// The selector matched nothing
    #[error("no events match {description}")]
    NoMatches {
        /// Description of the selector
        description: String,
    },
}

/// Events matched by a selector, in canonical order
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Matched events
    pub events: Vec<Event>,
    /// Description of the selector that produced them
    pub description: String,
}

impl Selection {
    /// Identifiers of the matched events
    #[must_use]
    pub fn ids(&self) -> Vec<&EventId> {
        self.events.iter().map(|e| &e.id).collect()
    }

    /// Number of matched events
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing matched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Turn an empty selection into [`EvalError::NoMatches`]
    ///
    /// Callers about to edit use this so a zero-match selector leads to a
    /// clarification question instead of a silent no-op.
    ///
    /// # Errors
    /// Returns [`EvalError::NoMatches`] when nothing matched.
    pub fn require_matches(self) -> Result<Self, EvalError> {
        if self.events.is_empty() {
            Err(EvalError::NoMatches {
                description: self.description,
            })
        } else {
            Ok(self)
        }
    }
}

/// Evaluate a selector with the default depth limit
///
/// # Errors
/// See [`evaluate_with_limit`].
pub fn evaluate<S>(
    selector: &Selector,
    source: &S,
    context: Option<&dyn SelectionContext>,
) -> Result<Selection, EvalError>
where
    S: EventSource + ?Sized,
{
    evaluate_with_limit(selector, source, context, MAX_DEPTH)
}

/// Evaluate a selector
///
/// The selector is validated first; any validation error aborts evaluation.
///
/// # Errors
/// - [`EvalError::Invalid`] when validation reports an error
/// - [`EvalError::ContextRequired`] / [`EvalError::StaleContext`] when a
///   contextual node cannot be satisfied and has no fallback
pub fn evaluate_with_limit<S>(
    selector: &Selector,
    source: &S,
    context: Option<&dyn SelectionContext>,
    max_depth: usize,
) -> Result<Selection, EvalError>
where
    S: EventSource + ?Sized,
{
    let errors: Vec<ValidationError> = validate_with_limit(selector, max_depth)
        .into_iter()
        .filter(ValidationError::is_error)
        .collect();
    if !errors.is_empty() {
        return Err(EvalError::Invalid(errors));
    }

    let mut ordered: Vec<&Event> = source.events().iter().collect();
    ordered.sort_by(|a, b| a.canonical_cmp(b));

    let evaluator = Evaluator {
        events: ordered,
        context,
    };
    let matched = evaluator.eval(selector)?;
    let description = describe(selector);

    debug!(
        selector = %description,
        total = evaluator.events.len(),
        matched = matched.len(),
        "evaluated selector"
    );

    Ok(Selection {
        events: matched
            .into_iter()
            .map(|i| evaluator.events[i].clone())
            .collect(),
        description,
    })
}

/// Indices into the canonically ordered event list
type Matches = BTreeSet<usize>;

struct Evaluator<'a> {
    events: Vec<&'a Event>,
    context: Option<&'a dyn SelectionContext>,
}

impl Evaluator<'_> {
    fn universe(&self) -> Matches {
        (0..self.events.len()).collect()
    }

    fn filter(&self, mut pred: impl FnMut(&Event) -> bool) -> Matches {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| pred(e).then_some(i))
            .collect()
    }

    fn eval(&self, node: &Selector) -> Result<Matches, EvalError> {
        let matches = match node {
            Selector::All => self.universe(),
            Selector::None => Matches::new(),
            Selector::Kind { kinds } => self.filter(|e| kinds.contains(&e.kind)),
            Selector::Pitch { range } => {
                let (lo, hi) = match range {
                    PitchRange::Register(r) => {
                        let (lo, hi) = r.bounds();
                        (i32::from(lo), i32::from(hi))
                    }
                    PitchRange::Midi { min, max } => (*min, *max),
                };
                self.filter(|e| e.pitch.is_some_and(|p| (lo..=hi).contains(&i32::from(p))))
            }
            Selector::Time { start_bar, end_bar } => self.filter(|e| {
                let bar = i64::from(e.bar);
                bar >= i64::from(*start_bar) && bar <= i64::from(*end_bar)
            }),
            Selector::Layer { layer } => self.filter(|e| &e.layer == layer),
            Selector::Section { section } => self.filter(|e| e.section.as_ref() == Some(section)),
            Selector::Role { role } => self.filter(|e| e.role == Some(*role)),
            Selector::Tag { tags, mode } => self.filter(|e| match mode {
                TagMatch::Any => tags.iter().any(|t| e.tags.contains(t)),
                TagMatch::All => tags.iter().all(|t| e.tags.contains(t)),
            }),
            Selector::Rhythm { pattern } => self.filter(|e| rhythm_matches(*pattern, e.beat)),
            Selector::Velocity { min, max } => {
                self.filter(|e| e.velocity.is_some_and(|v| (*min..=*max).contains(&i32::from(v))))
            }
            Selector::Duration {
                min_beats,
                max_beats,
            } => self.filter(|e| {
                min_beats.map_or(true, |lo| e.duration_beats >= lo)
                    && max_beats.map_or(true, |hi| e.duration_beats <= hi)
            }),
            Selector::Articulation { articulations } => self.filter(|e| {
                e.articulation
                    .as_ref()
                    .is_some_and(|a| articulations.iter().any(|x| x == a))
            }),
            Selector::Dynamic { markings } => {
                self.filter(|e| e.dynamic.is_some_and(|d| markings.contains(&d)))
            }
            Selector::Position { position, group } => self.position(*position, *group),
            Selector::Property { name, op, value } => self.filter(|e| {
                e.properties
                    .get(name)
                    .is_some_and(|actual| compare(actual, *op, value.as_ref()))
            }),
            Selector::Events { ids } => self.by_ids(ids),

            Selector::And { children } => {
                let mut acc = self.universe();
                for child in children {
                    let m = self.eval(child)?;
                    acc.retain(|i| m.contains(i));
                }
                acc
            }
            Selector::Or { children } => {
                let mut acc = Matches::new();
                for child in children {
                    acc.extend(self.eval(child)?);
                }
                acc
            }
            Selector::Not { child } => {
                let m = self.eval(child)?;
                self.universe().difference(&m).copied().collect()
            }
            Selector::Difference { base, subtract } => {
                let b = self.eval(base)?;
                let s = self.eval(subtract)?;
                b.difference(&s).copied().collect()
            }
            Selector::Nth { base, n, from } => {
                let b = self.eval(base)?;
                let idx = usize::try_from(*n).unwrap_or(usize::MAX).saturating_sub(1);
                let picked = match from {
                    CountFrom::Start => b.iter().nth(idx),
                    CountFrom::End => b.iter().rev().nth(idx),
                };
                picked.copied().into_iter().collect()
            }
            Selector::Slice { base, count, from } => {
                let b = self.eval(base)?;
                let take = usize::try_from(*count).unwrap_or(usize::MAX);
                match from {
                    CountFrom::Start => b.into_iter().take(take).collect(),
                    CountFrom::End => b.into_iter().rev().take(take).collect(),
                }
            }
            Selector::Neighbor {
                base,
                count,
                direction,
            } => {
                let b = self.eval(base)?;
                self.neighbors(&b, usize::try_from(*count).unwrap_or(usize::MAX), *direction)
            }
            Selector::Contextual { source, fallback } => {
                return self.contextual(*source, fallback.as_deref());
            }
        };
        Ok(matches)
    }

    fn by_ids(&self, ids: &[EventId]) -> Matches {
        let wanted: BTreeSet<&EventId> = ids.iter().collect();
        self.filter(|e| wanted.contains(&e.id))
    }

    fn position(&self, position: GroupPosition, group: Grouping) -> Matches {
        let mut groups: BTreeMap<(&LayerId, GroupKey<'_>), usize> = BTreeMap::new();
        for (i, e) in self.events.iter().enumerate() {
            let key = match group {
                Grouping::Bar => GroupKey::Bar(e.bar),
                Grouping::Section => GroupKey::Section(e.section.as_ref()),
                Grouping::Layer => GroupKey::Whole,
            };
            let slot = groups.entry((&e.layer, key)).or_insert(i);
            if position == GroupPosition::Last {
                *slot = i;
            }
        }
        groups.into_values().collect()
    }

    fn neighbors(&self, base: &Matches, count: usize, direction: NeighborDirection) -> Matches {
        let mut lanes: BTreeMap<&LayerId, Vec<usize>> = BTreeMap::new();
        for (i, e) in self.events.iter().enumerate() {
            lanes.entry(&e.layer).or_default().push(i);
        }

        let mut out = Matches::new();
        for lane in lanes.values() {
            for (pos, idx) in lane.iter().enumerate() {
                if !base.contains(idx) {
                    continue;
                }
                if matches!(direction, NeighborDirection::Before | NeighborDirection::Both) {
                    out.extend(
                        lane[..pos]
                            .iter()
                            .rev()
                            .filter(|i| !base.contains(*i))
                            .take(count),
                    );
                }
                if matches!(direction, NeighborDirection::After | NeighborDirection::Both) {
                    out.extend(
                        lane[pos + 1..]
                            .iter()
                            .filter(|i| !base.contains(*i))
                            .take(count),
                    );
                }
            }
        }
        out
    }

    fn contextual(
        &self,
        source: ContextSource,
        fallback: Option<&Selector>,
    ) -> Result<Matches, EvalError> {
        let resolved = match (source, self.context) {
            (_, None) => Lookup::Missing,
            (ContextSource::Selection, Some(ctx)) => Lookup::from_state(ctx.selected_events()),
            (ContextSource::Discourse, Some(ctx)) => Lookup::from_state(ctx.referenced_events()),
            (ContextSource::Playhead, Some(ctx)) => match ctx.playhead_bar() {
                Some(bar) => Lookup::Found(self.filter(|e| e.bar == bar)),
                None => Lookup::Missing,
            },
        };

        let resolved = match resolved {
            Lookup::Ids(ids) => Lookup::Found(self.by_ids(&ids)),
            other => other,
        };

        match (resolved, fallback) {
            (Lookup::Found(m), _) => Ok(m),
            (Lookup::Missing | Lookup::Ids(_), Some(fb)) | (Lookup::Stale, Some(fb)) => {
                debug!(context = %source, "context unavailable, using fallback");
                self.eval(fb)
            }
            (Lookup::Missing | Lookup::Ids(_), None) => {
                Err(EvalError::ContextRequired { context: source })
            }
            (Lookup::Stale, None) => Err(EvalError::StaleContext { context: source }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey<'a> {
    Bar(u32),
    Section(Option<&'a SectionId>),
    Whole,
}

enum Lookup {
    Ids(Vec<EventId>),
    Found(Matches),
    Stale,
    Missing,
}

impl Lookup {
    fn from_state(state: ContextState<'_>) -> Self {
        match state {
            ContextState::Available([]) | ContextState::Missing => Lookup::Missing,
            ContextState::Available(ids) => Lookup::Ids(ids.to_vec()),
            ContextState::Stale => Lookup::Stale,
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn rhythm_matches(pattern: RhythmPattern, beat: f64) -> bool {
    let frac = beat - beat.floor();
    let on_beat = frac < BEAT_EPSILON || frac > 1.0 - BEAT_EPSILON;
    match pattern {
        RhythmPattern::Downbeat => beat.abs() < BEAT_EPSILON,
        RhythmPattern::OnBeat => on_beat,
        RhythmPattern::OffBeat => (frac - 0.5).abs() < BEAT_EPSILON,
        RhythmPattern::Syncopated => !on_beat && (frac - 0.5).abs() >= BEAT_EPSILON,
    }
}

fn compare(actual: &PropertyValue, op: Comparison, expected: Option<&PropertyValue>) -> bool {
    match (op, expected) {
        (Comparison::Exists, _) => true,
        (_, None) => false,
        (Comparison::Eq, Some(v)) => actual == v,
        (Comparison::Ne, Some(v)) => actual != v,
        (op, Some(v)) => match (actual.as_number(), v.as_number()) {
            (Some(a), Some(b)) => match op {
                Comparison::Lt => a < b,
                Comparison::Le => a <= b,
                Comparison::Gt => a > b,
                Comparison::Ge => a >= b,
                Comparison::Eq | Comparison::Ne | Comparison::Exists => false,
            },
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, Role};
    use crate::selector::Register;
    use pretty_assertions::assert_eq;

    fn layer(name: &str) -> LayerId {
        LayerId::make([name]).unwrap()
    }

    fn id(name: &str) -> EventId {
        EventId::make([name]).unwrap()
    }

    fn events() -> Vec<Event> {
        vec![
            Event::note(id("b2"), layer("bass"), 2, 0.0, 40),
            Event::note(id("k1"), layer("keys"), 1, 0.0, 76).with_velocity(100),
            Event::note(id("b1"), layer("bass"), 1, 0.0, 36).with_role(Role::Bass),
            Event::note(id("k2"), layer("keys"), 1, 1.5, 79).with_tag("hook"),
            Event::new(id("r1"), EventKind::Rest, layer("keys"), 2, 0.0),
            Event::note(id("k3"), layer("keys"), 2, 2.25, 64),
        ]
    }

    fn names(sel: &Selection) -> Vec<String> {
        sel.ids().iter().map(|i| i.as_identifier().leaf().to_string()).collect()
    }

    struct Ctx {
        selected: Option<Vec<EventId>>,
        stale: bool,
        playhead: Option<u32>,
    }

    impl SelectionContext for Ctx {
        fn selected_events(&self) -> ContextState<'_> {
            match (&self.selected, self.stale) {
                (_, true) => ContextState::Stale,
                (Some(ids), false) => ContextState::Available(ids),
                (None, false) => ContextState::Missing,
            }
        }

        fn referenced_events(&self) -> ContextState<'_> {
            ContextState::Missing
        }

        fn playhead_bar(&self) -> Option<u32> {
            self.playhead
        }
    }

    #[test]
    fn canonical_order() {
        let sel = evaluate(&Selector::all(), &events(), None).unwrap();
        assert_eq!(names(&sel), vec!["b1", "k1", "k2", "b2", "r1", "k3"]);
    }

    #[test]
    fn and_intersects() {
        let sel = Selector::kind(EventKind::Note).and(Selector::register(Register::High));
        let out = evaluate(&sel, &events(), None).unwrap();
        assert_eq!(names(&out), vec!["k1", "k2"]);
    }

    #[test]
    fn not_and_difference() {
        let notes = Selector::kind(EventKind::Note);
        let rests = evaluate(&notes.clone().negate(), &events(), None).unwrap();
        assert_eq!(names(&rests), vec!["r1"]);

        let out = evaluate(&notes.except(Selector::bars(1, 1)), &events(), None).unwrap();
        assert_eq!(names(&out), vec!["b2", "k3"]);
    }

    #[test]
    fn nth_and_slice() {
        let notes = Selector::kind(EventKind::Note);
        let second = evaluate(&notes.clone().nth(2), &events(), None).unwrap();
        assert_eq!(names(&second), vec!["k1"]);

        let last = evaluate(&notes.clone().nth_from_end(1), &events(), None).unwrap();
        assert_eq!(names(&last), vec!["k3"]);

        let tail = evaluate(&notes.clone().last(2), &events(), None).unwrap();
        assert_eq!(names(&tail), vec!["b2", "k3"]);

        let beyond = evaluate(&notes.nth(99), &events(), None).unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn neighbors_stay_on_layer() {
        let base = Selector::events([id("k2")]);
        let out = evaluate(
            &base.neighbors(1, NeighborDirection::Both),
            &events(),
            None,
        )
        .unwrap();
        assert_eq!(names(&out), vec!["k1", "r1"]);
    }

    #[test]
    fn position_groups_per_layer() {
        let sel = Selector::position(GroupPosition::First, Grouping::Bar);
        let out = evaluate(&sel, &events(), None).unwrap();
        assert_eq!(names(&out), vec!["b1", "k1", "b2", "r1"]);
    }

    #[test]
    fn rhythm_patterns() {
        assert!(rhythm_matches(RhythmPattern::Downbeat, 0.0));
        assert!(rhythm_matches(RhythmPattern::OnBeat, 2.0));
        assert!(!rhythm_matches(RhythmPattern::Downbeat, 2.0));
        assert!(rhythm_matches(RhythmPattern::OffBeat, 1.5));
        assert!(rhythm_matches(RhythmPattern::Syncopated, 2.25));
        assert!(!rhythm_matches(RhythmPattern::Syncopated, 1.5));
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let err = evaluate(&Selector::pitch(70, 60), &events(), None).unwrap_err();
        assert!(matches!(err, EvalError::Invalid(ref e) if !e.is_empty()));
    }

    #[test]
    fn contextual_requires_context() {
        let sel = Selector::contextual(ContextSource::Selection);
        let err = evaluate(&sel, &events(), None).unwrap_err();
        assert_eq!(
            err,
            EvalError::ContextRequired {
                context: ContextSource::Selection
            }
        );
    }

    #[test]
    fn contextual_uses_selection() {
        let ctx = Ctx {
            selected: Some(vec![id("k3"), id("b1")]),
            stale: false,
            playhead: None,
        };
        let sel = Selector::contextual(ContextSource::Selection);
        let out = evaluate(&sel, &events(), Some(&ctx)).unwrap();
        assert_eq!(names(&out), vec!["b1", "k3"]);
    }

    #[test]
    fn stale_selection_uses_fallback_or_fails() {
        let ctx = Ctx {
            selected: Some(vec![id("k3")]),
            stale: true,
            playhead: None,
        };
        let bare = Selector::contextual(ContextSource::Selection);
        assert_eq!(
            evaluate(&bare, &events(), Some(&ctx)).unwrap_err(),
            EvalError::StaleContext {
                context: ContextSource::Selection
            }
        );

        let with_fb = bare.with_fallback(Selector::bars(2, 2));
        let out = evaluate(&with_fb, &events(), Some(&ctx)).unwrap();
        assert_eq!(names(&out), vec!["b2", "r1", "k3"]);
    }

    #[test]
    fn playhead_selects_bar() {
        let ctx = Ctx {
            selected: None,
            stale: false,
            playhead: Some(1),
        };
        let sel = Selector::contextual(ContextSource::Playhead);
        let out = evaluate(&sel, &events(), Some(&ctx)).unwrap();
        assert_eq!(names(&out), vec!["b1", "k1", "k2"]);
    }

    #[test]
    fn require_matches_reports_description() {
        let out = evaluate(&Selector::bars(40, 41), &events(), None).unwrap();
        let err = out.require_matches().unwrap_err();
        assert_eq!(
            err,
            EvalError::NoMatches {
                description: "events in bars 40–41".into()
            }
        );
    }

    #[test]
    fn property_comparison() {
        let evs = vec![
            Event::note(id("a"), layer("keys"), 1, 0.0, 60)
                .with_property("swing", PropertyValue::Number(0.6)),
            Event::note(id("b"), layer("keys"), 1, 1.0, 60)
                .with_property("swing", PropertyValue::Number(0.2)),
            Event::note(id("c"), layer("keys"), 1, 2.0, 60),
        ];
        let gt = Selector::property("swing", Comparison::Gt, PropertyValue::Number(0.5));
        assert_eq!(names(&evaluate(&gt, &evs, None).unwrap()), vec!["a"]);

        let exists = Selector::has_property("swing");
        assert_eq!(names(&evaluate(&exists, &evs, None).unwrap()), vec!["a", "b"]);
    }
}
