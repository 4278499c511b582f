//! Structural validation
//!
//! A pure check over the tree: no project access. Every problem is reported
//! with a JSON-path-like location (`$`, `$.children[1]`, `$.base.max`).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::event::PropertyValue;
use crate::selector::{Comparison, PitchRange, Selector, MAX_DEPTH};

const MIDI_MAX: i32 = 127;

/// How serious a validation finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Selector must not be evaluated
    Error,
    /// Selector is legal but probably not what was meant
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{severity} at {path}: {message}")]
pub struct ValidationError {
    /// Location in the tree
    pub path: String,
    /// What is wrong
    pub message: String,
    /// Error or warning
    pub severity: Severity,
}

impl ValidationError {
    fn error(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    fn warning(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// True for [`Severity::Error`]
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Validate against the default depth limit
#[must_use]
pub fn validate(selector: &Selector) -> Vec<ValidationError> {
    validate_with_limit(selector, MAX_DEPTH)
}

/// Validate with an explicit depth limit
#[must_use]
pub fn validate_with_limit(selector: &Selector, max_depth: usize) -> Vec<ValidationError> {
    let mut out = Vec::new();

    let depth = selector.depth();
    if depth > max_depth {
        out.push(ValidationError::error(
            "$",
            format!("selector depth {depth} exceeds the maximum of {max_depth}"),
        ));
    }

    check_node(selector, "$", &mut out);
    out
}

/// True when no finding is an error
#[must_use]
pub fn is_valid(selector: &Selector) -> bool {
    validate(selector).iter().all(|e| !e.is_error())
}

fn check_node(node: &Selector, path: &str, out: &mut Vec<ValidationError>) {
    match node {
        Selector::All | Selector::None | Selector::Layer { .. } | Selector::Section { .. } => {}
        Selector::Role { .. } | Selector::Rhythm { .. } | Selector::Position { .. } => {}
        Selector::Kind { kinds } => {
            if kinds.is_empty() {
                out.push(ValidationError::error(
                    &format!("{path}.kinds"),
                    "kind selector must list at least one kind",
                ));
            }
        }
        Selector::Pitch { range } => {
            if let PitchRange::Midi { min, max } = range {
                check_midi_range(&format!("{path}.range"), "pitch", *min, *max, out);
            }
        }
        Selector::Velocity { min, max } => check_midi_range(path, "velocity", *min, *max, out),
        Selector::Time { start_bar, end_bar } => {
            if *start_bar < 1 {
                out.push(ValidationError::error(
                    &format!("{path}.start_bar"),
                    format!("bar numbers start at 1, got {start_bar}"),
                ));
            }
            if *end_bar < 1 {
                out.push(ValidationError::error(
                    &format!("{path}.end_bar"),
                    format!("bar numbers start at 1, got {end_bar}"),
                ));
            }
            if start_bar > end_bar {
                out.push(ValidationError::error(
                    path,
                    format!("start bar {start_bar} is after end bar {end_bar}"),
                ));
            }
        }
        Selector::Tag { tags, .. } => {
            if tags.is_empty() {
                out.push(ValidationError::error(
                    &format!("{path}.tags"),
                    "tag selector must list at least one tag",
                ));
            }
            for (i, tag) in tags.iter().enumerate() {
                if tag.trim().is_empty() {
                    out.push(ValidationError::error(
                        &format!("{path}.tags[{i}]"),
                        "tag must not be blank",
                    ));
                }
            }
        }
        Selector::Duration {
            min_beats,
            max_beats,
        } => check_duration(path, *min_beats, *max_beats, out),
        Selector::Articulation { articulations } => {
            if articulations.is_empty() {
                out.push(ValidationError::error(
                    &format!("{path}.articulations"),
                    "articulation selector must list at least one articulation",
                ));
            }
        }
        Selector::Dynamic { markings } => {
            if markings.is_empty() {
                out.push(ValidationError::error(
                    &format!("{path}.markings"),
                    "dynamic selector must list at least one marking",
                ));
            }
        }
        Selector::Property { name, op, value } => {
            check_property(path, name, *op, value.as_ref(), out);
        }
        Selector::Events { ids } => {
            if ids.is_empty() {
                out.push(ValidationError::error(
                    &format!("{path}.ids"),
                    "event set must contain at least one event",
                ));
            }
        }
        Selector::And { children } | Selector::Or { children } => {
            let op = if matches!(node, Selector::And { .. }) {
                "and"
            } else {
                "or"
            };
            match children.len() {
                0 => out.push(ValidationError::error(
                    path,
                    format!("'{op}' must have at least one child"),
                )),
                1 => out.push(ValidationError::warning(
                    path,
                    format!("'{op}' with a single child is redundant"),
                )),
                _ => {}
            }
        }
        Selector::Not { child } => match child.as_ref() {
            Selector::All => out.push(ValidationError::warning(
                path,
                "'not all' never matches anything",
            )),
            Selector::None => out.push(ValidationError::warning(
                path,
                "'not none' matches everything",
            )),
            _ => {}
        },
        Selector::Difference { .. } => {}
        Selector::Nth { n, .. } => check_count(path, "n", *n, out),
        Selector::Slice { count, .. } | Selector::Neighbor { count, .. } => {
            check_count(path, "count", *count, out);
        }
        Selector::Contextual { source, fallback } => {
            if fallback.is_none() {
                out.push(ValidationError::warning(
                    path,
                    format!("contextual {source} selector has no fallback"),
                ));
            }
        }
    }

    for (slot, child) in node.children() {
        check_node(child, &format!("{path}.{slot}"), out);
    }
}

fn check_midi_range(path: &str, what: &str, min: i32, max: i32, out: &mut Vec<ValidationError>) {
    if !(0..=MIDI_MAX).contains(&min) {
        out.push(ValidationError::error(
            &format!("{path}.min"),
            format!("{what} minimum {min} is outside 0–{MIDI_MAX}"),
        ));
    }
    if !(0..=MIDI_MAX).contains(&max) {
        out.push(ValidationError::error(
            &format!("{path}.max"),
            format!("{what} maximum {max} is outside 0–{MIDI_MAX}"),
        ));
    }
    if min > max {
        out.push(ValidationError::error(
            path,
            format!("{what} minimum {min} is greater than maximum {max}"),
        ));
    }
}

fn check_duration(
    path: &str,
    min: Option<f64>,
    max: Option<f64>,
    out: &mut Vec<ValidationError>,
) {
    for (field, bound) in [("min_beats", min), ("max_beats", max)] {
        if let Some(v) = bound {
            if !v.is_finite() || v < 0.0 {
                out.push(ValidationError::error(
                    &format!("{path}.{field}"),
                    format!("duration bound {v} must be a non-negative number"),
                ));
            }
        }
    }
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => out.push(ValidationError::error(
            path,
            format!("minimum duration {lo} is greater than maximum {hi}"),
        )),
        (None, None) => out.push(ValidationError::warning(
            path,
            "duration selector without bounds matches every event",
        )),
        _ => {}
    }
}

fn check_count(path: &str, field: &str, value: u32, out: &mut Vec<ValidationError>) {
    if value == 0 {
        out.push(ValidationError::error(
            &format!("{path}.{field}"),
            format!("{field} must be at least 1"),
        ));
    }
}

fn check_property(
    path: &str,
    name: &str,
    op: Comparison,
    value: Option<&PropertyValue>,
    out: &mut Vec<ValidationError>,
) {
    if name.trim().is_empty() {
        out.push(ValidationError::error(
            &format!("{path}.name"),
            "property name must not be blank",
        ));
    }
    match (op, value) {
        (Comparison::Exists, Some(_)) => out.push(ValidationError::warning(
            &format!("{path}.value"),
            "'exists' ignores its value",
        )),
        (Comparison::Exists, None) => {}
        (_, None) => out.push(ValidationError::error(
            &format!("{path}.value"),
            "comparison requires a value",
        )),
        (op, Some(v)) if op.is_ordering() && v.as_number().is_none() => {
            out.push(ValidationError::error(
                &format!("{path}.value"),
                format!("ordering comparison needs a number, got {v}"),
            ));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::selector::{ContextSource, Register};

    fn errors(sel: &Selector) -> Vec<ValidationError> {
        validate(sel).into_iter().filter(ValidationError::is_error).collect()
    }

    #[test]
    fn pitch_bounds() {
        assert!(!errors(&Selector::pitch(-1, 60)).is_empty());
        assert!(!errors(&Selector::pitch(0, 128)).is_empty());
        assert!(errors(&Selector::pitch(0, 127)).is_empty());
        assert!(!errors(&Selector::pitch(70, 60)).is_empty());
    }

    #[test]
    fn pitch_error_paths() {
        let errs = errors(&Selector::pitch(-1, 60));
        assert_eq!(errs[0].path, "$.range.min");
    }

    #[test]
    fn empty_kinds_rejected() {
        let sel = Selector::Kind { kinds: vec![] }.and(Selector::register(Register::High));
        let errs = errors(&sel);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, "$.children[0].kinds");
    }

    #[test]
    fn empty_and_rejected_single_child_warned() {
        assert!(!errors(&Selector::And { children: vec![] }).is_empty());

        let single = Selector::Or {
            children: vec![Selector::kind(EventKind::Note)],
        };
        let findings = validate(&single);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn bars_must_be_positive_and_ordered() {
        assert!(!errors(&Selector::bars(0, 4)).is_empty());
        assert!(!errors(&Selector::bars(8, 4)).is_empty());
        assert!(errors(&Selector::bars(4, 4)).is_empty());
    }

    #[test]
    fn velocity_bounds() {
        assert!(!errors(&Selector::velocity(0, 200)).is_empty());
        assert!(errors(&Selector::velocity(0, 127)).is_empty());
    }

    #[test]
    fn zero_counts_rejected() {
        let notes = Selector::kind(EventKind::Note);
        assert!(!errors(&notes.clone().nth(0)).is_empty());
        assert!(!errors(&notes.clone().first(0)).is_empty());
        assert!(errors(&notes.first(1)).is_empty());
    }

    #[test]
    fn depth_limit() {
        let ten = (0..10).fold(Selector::all(), |acc, _| acc.first(1));
        let eleven = ten.clone().first(1);
        assert!(errors(&ten).is_empty());
        let errs = errors(&eleven);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, "$");
    }

    #[test]
    fn contextual_without_fallback_warns() {
        let findings = validate(&Selector::contextual(ContextSource::Playhead));
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_error());
    }

    #[test]
    fn property_checks() {
        let missing = Selector::Property {
            name: "swing".into(),
            op: Comparison::Gt,
            value: None,
        };
        assert!(!errors(&missing).is_empty());

        let text = Selector::property("swing", Comparison::Gt, PropertyValue::Text("x".into()));
        assert!(!errors(&text).is_empty());

        assert!(errors(&Selector::has_property("swing")).is_empty());
    }

    #[test]
    fn display_format() {
        let err = &errors(&Selector::bars(0, 1))[0];
        assert_eq!(
            err.to_string(),
            "error at $.start_bar: bar numbers start at 1, got 0"
        );
    }
}
