//! GOFAI Event Selector Algebra
//!
//! A declarative, serializable predicate language over musical events.
//!
//! # Core Concepts
//!
//! - [`Selector`]: immutable predicate tree (leaves, boolean and positional
//!   combinators, contextual nodes with fallbacks)
//! - [`validate`]: pure structural checks with paths into the tree
//! - [`describe`]: deterministic human-readable preview text
//! - [`evaluate`]: reference evaluator over an [`EventSource`]
//!
//! # Example
//!
//! ```rust
//! use gofai_select::{describe, validate, EventKind, Register, Selector};
//!
//! let high_notes = Selector::kind(EventKind::Note).and(Selector::register(Register::High));
//! assert!(validate(&high_notes).is_empty());
//! assert!(!high_notes.requires_context());
//! assert_eq!(describe(&high_notes), "note events, high pitch events");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod describe;
mod eval;
mod event;
mod selector;
mod validate;

pub use describe::describe;
pub use eval::{
    evaluate, evaluate_with_limit, ContextState, EvalError, EventSource, Selection,
    SelectionContext,
};
pub use event::{DynamicMarking, Event, EventKind, PropertyValue, Role};
pub use selector::{
    ChildSlot, Comparison, ContextSource, CountFrom, GroupPosition, Grouping, NeighborDirection,
    PitchRange, Register, RhythmPattern, Selector, TagMatch, MAX_DEPTH,
};
pub use validate::{is_valid, validate, validate_with_limit, Severity, ValidationError};

/// Whether a selector needs live UI or discourse state
///
/// Free-function form of [`Selector::requires_context`].
#[inline]
#[must_use]
pub fn requires_context(selector: &Selector) -> bool {
    selector.requires_context()
}
