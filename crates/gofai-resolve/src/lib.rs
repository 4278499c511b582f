//! GOFAI Reference Resolution
//!
//! Binds parsed musical references ("the second chorus", "that track",
//! "these notes") to entities in a project, or explains why it cannot.
//!
//! # Core Concepts
//!
//! - [`Resolver`]: the precedence-ordered resolution engine
//! - [`ProjectStore`]: read-only project lookup the resolver queries
//! - [`InteractionContext`]: UI selection, focus, discourse and playhead
//! - [`ResolutionResult`]: resolved, ambiguous or failed
//! - [`ResolverConfig`]: thresholds, salience weights and default bindings
//! - [`MemoryProject`]: in-memory store loadable from JSON or YAML
//!
//! # Example
//!
//! ```rust
//! use gofai_entity::{BarSpan, Mention, UnresolvedRef};
//! use gofai_ident::{Category, Identifier};
//! use gofai_resolve::{
//!     EntityRecord, InteractionContext, MemoryProject, ProjectData, ResolutionMethod, Resolver,
//! };
//!
//! let chorus = |leaf: &str, name: &str, start, end| {
//!     EntityRecord::new(Identifier::make(Category::Section, [leaf]).unwrap(), name)
//!         .with_type("chorus")
//!         .with_span(BarSpan::new(start, end).unwrap())
//! };
//! let project = MemoryProject::from_data(ProjectData {
//!     length_bars: Some(65),
//!     entities: vec![chorus("chorus-1", "Chorus 1", 17, 24), chorus("chorus-2", "Chorus 2", 49, 65)],
//!     events: Vec::new(),
//! })
//! .unwrap();
//!
//! let reference = UnresolvedRef::section_of_type("chorus", Mention::new("the second chorus").with_ordinal(2));
//! let result = Resolver::default().resolve(&reference, Some(&project), &InteractionContext::new());
//!
//! assert_eq!(result.method(), Some(ResolutionMethod::TypeAndOrdinal));
//! assert_eq!(result.binding().unwrap().display_name(), "Chorus 2 (bars 49–65)");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod context;
mod engine;
mod error;
mod memory;
mod result;
mod store;

pub use config::{DefaultBindings, DefaultRule, ResolverConfig, SalienceWeights};
pub use context::{InteractionContext, Referent, UiSelection};
pub use engine::Resolver;
pub use error::{ResolveError, Result};
pub use memory::{EntityRecord, MemoryProject, ProjectData};
pub use result::{
    FailureReason, NearMatch, ResolutionMethod, ResolutionResult, ScopeResolution, ScoredBinding,
};
pub use store::{Candidate, EntityQuery, Matcher, ProjectStore, StoreError};
