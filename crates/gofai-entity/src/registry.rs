//! Entity-type registry
//!
//! Static metadata for every entity kind: naming, identifier category,
//! containment rules, and which reference forms the grammar supports.
//! Read-only; consumed by resolution and by UI-facing formatting.

use gofai_ident::Category;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of musical entity a reference can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Top-level workspace
    Board,
    /// Group of layers on a board
    Deck,
    /// Layer (also called a track)
    Layer,
    /// Song section (verse, chorus, ...)
    Section,
    /// Explicit bar range
    Range,
    /// Processing card (effect or instrument)
    Card,
    /// Card parameter
    Param,
    /// Musical events
    Event,
}

impl EntityKind {
    /// Every kind, in registry order
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Board,
        EntityKind::Deck,
        EntityKind::Layer,
        EntityKind::Section,
        EntityKind::Range,
        EntityKind::Card,
        EntityKind::Param,
        EntityKind::Event,
    ];

    /// Registry entry for this kind
    #[inline]
    #[must_use]
    pub fn info(self) -> &'static EntityTypeInfo {
        &REGISTRY[self as usize]
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Board => "board",
            EntityKind::Deck => "deck",
            EntityKind::Layer => "layer",
            EntityKind::Section => "section",
            EntityKind::Range => "range",
            EntityKind::Card => "card",
            EntityKind::Param => "param",
            EntityKind::Event => "event",
        }
    }

    /// Identifier category for this kind
    #[inline]
    #[must_use]
    pub fn category(self) -> Category {
        self.info().category
    }

    /// Kind whose identifiers use `category`, if any
    #[must_use]
    pub fn from_category(category: Category) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.category() == category)
    }

    /// True if entities of this kind may sit directly inside `container`
    #[inline]
    #[must_use]
    pub fn can_be_contained_by(self, container: EntityKind) -> bool {
        self.info().contained_by.contains(&container)
    }

    /// True if this kind may directly contain `child`
    #[inline]
    #[must_use]
    pub fn can_contain(self, child: EntityKind) -> bool {
        child.can_be_contained_by(self)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static metadata for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityTypeInfo {
    /// Kind described
    pub kind: EntityKind,
    /// Singular display name
    pub display_name: &'static str,
    /// Plural display name
    pub plural: &'static str,
    /// Identifier category prefix
    pub category: Category,
    /// Whether the kind can serve as an edit scope
    pub scopable: bool,
    /// Kinds that may directly contain this kind
    pub contained_by: &'static [EntityKind],
    /// Whether "the second chorus" style references are supported
    pub supports_ordinal: bool,
    /// Whether "the next chorus" style references are supported
    pub supports_relative: bool,
}

impl EntityTypeInfo {
    /// True if this kind may contain at least one other kind
    #[must_use]
    pub fn is_container(&self) -> bool {
        EntityKind::ALL
            .iter()
            .any(|k| k.can_be_contained_by(self.kind))
    }

    /// Kinds this kind may directly contain
    #[must_use]
    pub fn can_contain(&self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|k| k.can_be_contained_by(self.kind))
            .collect()
    }
}

static REGISTRY: [EntityTypeInfo; 8] = [
    EntityTypeInfo {
        kind: EntityKind::Board,
        display_name: "board",
        plural: "boards",
        category: Category::Board,
        scopable: true,
        contained_by: &[],
        supports_ordinal: false,
        supports_relative: false,
    },
    EntityTypeInfo {
        kind: EntityKind::Deck,
        display_name: "deck",
        plural: "decks",
        category: Category::Deck,
        scopable: true,
        contained_by: &[EntityKind::Board],
        supports_ordinal: true,
        supports_relative: false,
    },
    EntityTypeInfo {
        kind: EntityKind::Layer,
        display_name: "layer",
        plural: "layers",
        category: Category::Layer,
        scopable: true,
        contained_by: &[EntityKind::Deck, EntityKind::Board],
        supports_ordinal: true,
        supports_relative: false,
    },
    EntityTypeInfo {
        kind: EntityKind::Section,
        display_name: "section",
        plural: "sections",
        category: Category::Section,
        scopable: true,
        contained_by: &[],
        supports_ordinal: true,
        supports_relative: true,
    },
    EntityTypeInfo {
        kind: EntityKind::Range,
        display_name: "range",
        plural: "ranges",
        category: Category::Range,
        scopable: true,
        contained_by: &[EntityKind::Section],
        supports_ordinal: false,
        supports_relative: false,
    },
    EntityTypeInfo {
        kind: EntityKind::Card,
        display_name: "card",
        plural: "cards",
        category: Category::Card,
        scopable: true,
        contained_by: &[EntityKind::Layer, EntityKind::Deck],
        supports_ordinal: true,
        supports_relative: true,
    },
    EntityTypeInfo {
        kind: EntityKind::Param,
        display_name: "parameter",
        plural: "parameters",
        category: Category::Param,
        scopable: false,
        contained_by: &[EntityKind::Card],
        supports_ordinal: false,
        supports_relative: false,
    },
    EntityTypeInfo {
        kind: EntityKind::Event,
        display_name: "event",
        plural: "events",
        category: Category::Event,
        scopable: false,
        contained_by: &[EntityKind::Layer, EntityKind::Section, EntityKind::Range],
        supports_ordinal: true,
        supports_relative: true,
    },
];

/// Every registry entry, in [`EntityKind::ALL`] order
#[inline]
#[must_use]
pub fn entity_types() -> &'static [EntityTypeInfo] {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_kind_in_order() {
        assert_eq!(REGISTRY.len(), EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            assert_eq!(kind.info().kind, kind);
            assert_eq!(kind.info().category.as_str(), kind.as_str());
        }
    }

    #[test]
    fn category_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_category(kind.category()), Some(kind));
        }
        assert_eq!(EntityKind::from_category(Category::Lex), None);
    }

    #[test]
    fn containment() {
        assert!(EntityKind::Layer.can_contain(EntityKind::Card));
        assert!(EntityKind::Card.can_contain(EntityKind::Param));
        assert!(EntityKind::Section.can_contain(EntityKind::Event));
        assert!(!EntityKind::Section.can_contain(EntityKind::Card));
        assert!(!EntityKind::Param.info().is_container());
        assert_eq!(
            EntityKind::Layer.info().can_contain(),
            vec![EntityKind::Card, EntityKind::Event]
        );
    }

    #[test]
    fn nothing_contains_itself() {
        for kind in EntityKind::ALL {
            assert!(!kind.can_contain(kind), "{kind} contains itself");
        }
    }

    #[test]
    fn ordinal_support() {
        assert!(EntityKind::Section.info().supports_ordinal);
        assert!(EntityKind::Section.info().supports_relative);
        assert!(!EntityKind::Board.info().supports_ordinal);
        assert!(!EntityKind::Range.info().supports_relative);
    }
}
