//! GOFAI Entity Model
//!
//! Reference shapes for musical entities and the static registry describing
//! how those entities nest.
//!
//! # Core Concepts
//!
//! - [`EntityKind`] / [`EntityTypeInfo`]: registry of kinds and containment
//! - [`UnresolvedRef`]: what the front end parsed ("the second chorus")
//! - [`ResolvedRef`] / [`ResolvedEvents`]: what resolution bound it to
//! - [`Scope`]: references composed from board down to parameter
//!
//! # Example
//!
//! ```rust
//! use gofai_entity::{EntityKind, Mention, UnresolvedRef};
//!
//! let chorus = UnresolvedRef::section_of_type("chorus", Mention::new("the second chorus").with_ordinal(2));
//! assert_eq!(chorus.kind(), EntityKind::Section);
//! assert!(EntityKind::Section.info().supports_ordinal);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod reference;
mod registry;
mod resolved;
mod scope;

pub use error::EntityError;
pub use reference::{Deixis, LayerNoun, Mention, RelativePosition, UnresolvedRef};
pub use registry::{entity_types, EntityKind, EntityTypeInfo};
pub use resolved::{BarSpan, Binding, ResolvedEvents, ResolvedRef};
pub use scope::{Scope, ScopeLevel, ScopeSlot};
