//! GOFAI Identifier Namespace
//!
//! Opaque, validated identifiers for every entity kind and vocabulary category.
//!
//! # Core Concepts
//!
//! - [`Identifier`]: `[namespace:]category:path...`, validated at construction
//! - [`Category`]: the fixed set of identifier categories
//! - [`Namespace`]: extension namespace, never one of [`RESERVED_NAMESPACES`]
//! - Typed wrappers ([`LayerId`], [`SectionId`], ...) for nominal typing
//!
//! # Example
//!
//! ```rust
//! use gofai_ident::{Category, Identifier};
//!
//! let id = Identifier::make(Category::Section, ["chorus-2"]).unwrap();
//! assert_eq!(id.to_string(), "section:chorus-2");
//!
//! let parsed: Identifier = "acme:card:tape-echo".parse().unwrap();
//! assert!(!parsed.is_builtin());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod category;
mod identifier;
mod namespace;
mod typed;

pub use category::Category;
pub use identifier::{parse, IdentError, Identifier, ParsedIdentifier, SEPARATOR};
pub use namespace::{is_reserved, Namespace, RESERVED_NAMESPACES};
pub use typed::{BoardId, CardId, DeckId, EventId, LayerId, ParamId, RangeId, SectionId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
