//! Identifier categories
//!
//! Every identifier names exactly one [`Category`]. Entity categories address
//! project data; vocabulary categories address lexicon entries owned by the
//! front end.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::identifier::IdentError;

/// Fixed set of identifier categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Lexeme
    Lex,
    /// Perceptual axis (brightness, width, ...)
    Axis,
    /// Edit operation
    Op,
    /// Edit constraint
    Constraint,
    /// Unit of measure
    Unit,
    /// Musical role
    Role,
    /// Free-form tag vocabulary
    Tag,
    /// Articulation vocabulary
    Articulation,
    /// Dynamic marking vocabulary
    Dynamic,
    /// Board (workspace layout)
    Board,
    /// Deck of cards
    Deck,
    /// Layer / track
    Layer,
    /// Song section
    Section,
    /// Bar range
    Range,
    /// Card (device, generator, effect)
    Card,
    /// Card parameter
    Param,
    /// Musical event
    Event,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Category; 17] = [
        Category::Lex,
        Category::Axis,
        Category::Op,
        Category::Constraint,
        Category::Unit,
        Category::Role,
        Category::Tag,
        Category::Articulation,
        Category::Dynamic,
        Category::Board,
        Category::Deck,
        Category::Layer,
        Category::Section,
        Category::Range,
        Category::Card,
        Category::Param,
        Category::Event,
    ];

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Lex => "lex",
            Category::Axis => "axis",
            Category::Op => "op",
            Category::Constraint => "constraint",
            Category::Unit => "unit",
            Category::Role => "role",
            Category::Tag => "tag",
            Category::Articulation => "articulation",
            Category::Dynamic => "dynamic",
            Category::Board => "board",
            Category::Deck => "deck",
            Category::Layer => "layer",
            Category::Section => "section",
            Category::Range => "range",
            Category::Card => "card",
            Category::Param => "param",
            Category::Event => "event",
        }
    }

    /// Returns true for categories that address project entities
    #[inline]
    #[must_use]
    pub const fn is_entity(self) -> bool {
        matches!(
            self,
            Category::Board
                | Category::Deck
                | Category::Layer
                | Category::Section
                | Category::Range
                | Category::Card
                | Category::Param
                | Category::Event
        )
    }

    /// Look up a category by name without allocating an error
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| IdentError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn category_rejects_unknown() {
        let result = "chorus".parse::<Category>();
        assert!(matches!(result, Err(IdentError::UnknownCategory(_))));
    }

    #[test]
    fn entity_categories() {
        assert!(Category::Section.is_entity());
        assert!(Category::Event.is_entity());
        assert!(!Category::Lex.is_entity());
        assert!(!Category::Articulation.is_entity());
    }

    #[test]
    fn category_serde_snake_case() {
        let json = serde_json::to_string(&Category::Articulation).unwrap();
        assert_eq!(json, "\"articulation\"");
    }
}
