//! Human-readable selector descriptions
//!
//! Used to preview "what will be affected" before an edit runs. The phrase is
//! a pure function of the tree shape.

use crate::event::PropertyValue;
use crate::selector::{
    Comparison, ContextSource, CountFrom, GroupPosition, Grouping, NeighborDirection, PitchRange,
    RhythmPattern, Selector, TagMatch,
};

/// Describe a selector in plain English
///
/// ```rust
/// use gofai_select::{describe, EventKind, Register, Selector};
///
/// let sel = Selector::kind(EventKind::Note).and(Selector::register(Register::High));
/// assert_eq!(describe(&sel), "note events, high pitch events");
/// ```
#[must_use]
pub fn describe(selector: &Selector) -> String {
    selector.fold(&mut describe_node)
}

fn describe_node(node: &Selector, mut kids: Vec<String>) -> String {
    group_children(node, &mut kids);
    match node {
        Selector::All => "all events".to_string(),
        Selector::None => "no events".to_string(),
        Selector::Kind { kinds } => {
            let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            format!("{} events", join_words(&names, "and"))
        }
        Selector::Pitch { range } => match range {
            PitchRange::Register(r) => format!("{} pitch events", r.as_str()),
            PitchRange::Midi { min, max } => format!("events with pitch {}", span(*min, *max)),
        },
        Selector::Time { start_bar, end_bar } => {
            if start_bar == end_bar {
                format!("events in bar {start_bar}")
            } else {
                format!("events in bars {start_bar}–{end_bar}")
            }
        }
        Selector::Layer { layer } => format!("events on layer {}", layer.as_identifier().leaf()),
        Selector::Section { section } => {
            format!("events in section {}", section.as_identifier().leaf())
        }
        Selector::Role { role } => format!("{role} events"),
        Selector::Tag { tags, mode } => {
            let quoted: Vec<String> = tags.iter().map(|t| format!("'{t}'")).collect();
            let quoted: Vec<&str> = quoted.iter().map(String::as_str).collect();
            let conj = match mode {
                TagMatch::Any => "or",
                TagMatch::All => "and",
            };
            format!("events tagged {}", join_words(&quoted, conj))
        }
        Selector::Rhythm { pattern } => match pattern {
            RhythmPattern::Downbeat => "downbeat events",
            RhythmPattern::OnBeat => "on-beat events",
            RhythmPattern::OffBeat => "off-beat events",
            RhythmPattern::Syncopated => "syncopated events",
        }
        .to_string(),
        Selector::Velocity { min, max } => format!("events with velocity {}", span(*min, *max)),
        Selector::Duration {
            min_beats,
            max_beats,
        } => match (min_beats, max_beats) {
            (Some(lo), Some(hi)) => format!("events lasting {lo}–{hi} beats"),
            (Some(lo), None) => format!("events lasting at least {lo} beats"),
            (None, Some(hi)) => format!("events lasting at most {hi} beats"),
            (None, None) => "events of any length".to_string(),
        },
        Selector::Articulation { articulations } => {
            let names: Vec<&str> = articulations.iter().map(String::as_str).collect();
            format!("{} events", join_words(&names, "or"))
        }
        Selector::Dynamic { markings } => {
            let names: Vec<&str> = markings.iter().map(|m| m.as_str()).collect();
            format!("events marked {}", join_words(&names, "or"))
        }
        Selector::Position { position, group } => {
            let which = match position {
                GroupPosition::First => "first",
                GroupPosition::Last => "last",
            };
            let per = match group {
                Grouping::Bar => "bar",
                Grouping::Section => "section",
                Grouping::Layer => "layer",
            };
            format!("the {which} event of each {per}")
        }
        Selector::Property { name, op, value } => describe_property(name, *op, value.as_ref()),
        Selector::Events { ids } => match ids.len() {
            1 => "the referenced event".to_string(),
            n => format!("the {n} referenced events"),
        },

        Selector::And { .. } => {
            if kids.is_empty() {
                "all events".to_string()
            } else {
                kids.join(", ")
            }
        }
        Selector::Or { .. } => {
            if kids.is_empty() {
                "no events".to_string()
            } else {
                kids.join(" or ")
            }
        }
        Selector::Not { .. } => format!("everything except {}", take(&mut kids, 0)),
        Selector::Difference { .. } => {
            let subtract = take(&mut kids, 1);
            let base = take(&mut kids, 0);
            format!("{base} except {subtract}")
        }
        Selector::Nth { n, from, .. } => {
            let base = take(&mut kids, 0);
            match from {
                CountFrom::Start => format!("the {} of {base}", ordinal(*n)),
                CountFrom::End if *n == 1 => format!("the last of {base}"),
                CountFrom::End => format!("the {}-to-last of {base}", ordinal(*n)),
            }
        }
        Selector::Slice { count, from, .. } => {
            let base = take(&mut kids, 0);
            let end = match from {
                CountFrom::Start => "first",
                CountFrom::End => "last",
            };
            format!("the {end} {count} of {base}")
        }
        Selector::Neighbor {
            count, direction, ..
        } => {
            let base = take(&mut kids, 0);
            let side = match direction {
                NeighborDirection::Before => "before",
                NeighborDirection::After => "after",
                NeighborDirection::Both => "around",
            };
            let noun = if *count == 1 { "event" } else { "events" };
            format!("the {count} {noun} {side} {base}")
        }
        Selector::Contextual { source, .. } => {
            let phrase = match source {
                ContextSource::Selection => "the selected events",
                ContextSource::Discourse => "the events mentioned earlier",
                ContextSource::Playhead => "events at the playhead",
            };
            match kids.pop() {
                Some(fallback) => format!("{phrase} (otherwise {fallback})"),
                None => phrase.to_string(),
            }
        }
    }
}

/// Bracket child phrases whose extent would otherwise be unclear
///
/// An n-ary `and`/`or` is bracketed under any combinator. A `not` or
/// `difference` is bracketed inside a list unless it is the last item.
fn group_children(node: &Selector, kids: &mut [String]) {
    if matches!(node, Selector::Contextual { .. }) {
        return;
    }
    let in_list = matches!(node, Selector::And { .. } | Selector::Or { .. });
    let children = node.children();
    let last = children.len().saturating_sub(1);
    for (i, ((_, child), text)) in children.into_iter().zip(kids.iter_mut()).enumerate() {
        let bracket = match child {
            Selector::And { children: inner } | Selector::Or { children: inner } => inner.len() > 1,
            Selector::Not { .. } | Selector::Difference { .. } => in_list && i < last,
            _ => false,
        };
        if bracket {
            *text = format!("({text})");
        }
    }
}

fn describe_property(name: &str, op: Comparison, value: Option<&PropertyValue>) -> String {
    let symbol = match op {
        Comparison::Exists => return format!("events with {name}"),
        Comparison::Eq => "=",
        Comparison::Ne => "≠",
        Comparison::Lt => "<",
        Comparison::Le => "≤",
        Comparison::Gt => ">",
        Comparison::Ge => "≥",
    };
    match value {
        Some(v) => format!("events where {name} {symbol} {v}"),
        None => format!("events where {name} {symbol} ?"),
    }
}

fn take(kids: &mut [String], index: usize) -> String {
    kids.get_mut(index).map(std::mem::take).unwrap_or_default()
}

fn span(min: i32, max: i32) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min}–{max}")
    }
}

/// `a`, `a and b`, `a, b and c`
fn join_words(words: &[&str], conj: &str) -> String {
    match words {
        [] => String::new(),
        [one] => (*one).to_string(),
        [init @ .., last] => format!("{} {conj} {last}", init.join(", ")),
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DynamicMarking, EventKind};
    use crate::selector::Register;
    use gofai_ident::LayerId;
    use pretty_assertions::assert_eq;

    #[test]
    fn composed_and() {
        let sel = Selector::kind(EventKind::Note).and(Selector::register(Register::High));
        assert_eq!(describe(&sel), "note events, high pitch events");
    }

    #[test]
    fn leaves() {
        assert_eq!(describe(&Selector::bars(5, 8)), "events in bars 5–8");
        assert_eq!(describe(&Selector::bars(5, 5)), "events in bar 5");
        assert_eq!(describe(&Selector::pitch(60, 72)), "events with pitch 60–72");
        assert_eq!(
            describe(&Selector::kinds([EventKind::Note, EventKind::Chord])),
            "note and chord events"
        );
        assert_eq!(
            describe(&Selector::tagged(["hook", "fill"])),
            "events tagged 'hook' or 'fill'"
        );
        assert_eq!(
            describe(&Selector::dynamic([DynamicMarking::Ff])),
            "events marked ff"
        );
        assert_eq!(
            describe(&Selector::layer(LayerId::make(["bass"]).unwrap())),
            "events on layer bass"
        );
    }

    #[test]
    fn combinators() {
        let notes = Selector::kind(EventKind::Note);
        assert_eq!(
            describe(&notes.clone().negate()),
            "everything except note events"
        );
        assert_eq!(
            describe(&notes.clone().except(Selector::bars(1, 4))),
            "note events except events in bars 1–4"
        );
        assert_eq!(describe(&notes.clone().nth(3)), "the 3rd of note events");
        assert_eq!(describe(&notes.clone().nth_from_end(1)), "the last of note events");
        assert_eq!(
            describe(&notes.clone().nth_from_end(2)),
            "the 2nd-to-last of note events"
        );
        assert_eq!(describe(&notes.clone().first(4)), "the first 4 of note events");
        assert_eq!(
            describe(&notes.clone().or(Selector::kind(EventKind::Rest))),
            "note events or rest events"
        );
    }

    #[test]
    fn contextual_with_fallback() {
        let sel = Selector::contextual(ContextSource::Selection)
            .with_fallback(Selector::bars(1, 8));
        assert_eq!(
            describe(&sel),
            "the selected events (otherwise events in bars 1–8)"
        );
    }

    #[test]
    fn nested_groups_are_bracketed() {
        let notes = Selector::kind(EventKind::Note);
        let high = Selector::register(Register::High);
        let not_both = Selector::And {
            children: vec![notes.clone(), high.clone()],
        }
        .negate();
        let not_notes_but_high = Selector::And {
            children: vec![notes.clone().negate(), high.clone()],
        };

        assert_eq!(
            describe(&not_both),
            "everything except (note events, high pitch events)"
        );
        assert_eq!(
            describe(&not_notes_but_high),
            "(everything except note events), high pitch events"
        );
        assert_ne!(describe(&not_both), describe(&not_notes_but_high));
    }

    #[test]
    fn or_inside_and_is_bracketed() {
        let sel = Selector::And {
            children: vec![
                Selector::Or {
                    children: vec![Selector::kind(EventKind::Note), Selector::kind(EventKind::Chord)],
                },
                Selector::bars(1, 4),
            ],
        };
        assert_eq!(
            describe(&sel),
            "(note events or chord events), events in bars 1–4"
        );
        let trailing = Selector::bars(1, 4).and(Selector::kind(EventKind::Rest).negate());
        assert_eq!(
            describe(&trailing),
            "events in bars 1–4, everything except rest events"
        );
    }

    #[test]
    fn empty_nary_nodes() {
        assert_eq!(describe(&Selector::And { children: vec![] }), "all events");
        assert_eq!(describe(&Selector::Or { children: vec![] }), "no events");
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(103), "103rd");
    }
}
