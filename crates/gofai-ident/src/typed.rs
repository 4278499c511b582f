//! Nominal identifier wrappers
//!
//! One newtype per entity category. A typed id can only be obtained from an
//! [`Identifier`] of the matching category, so a `LayerId` can never hold a
//! card identifier.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::category::Category;
use crate::identifier::{IdentError, Identifier};

macro_rules! typed_identifier {
    ($(#[$meta:meta])* $name:ident => $category:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "Identifier", into = "Identifier")]
        pub struct $name(Identifier);

        impl $name {
            /// Category every value of this type carries
            pub const CATEGORY: Category = $category;

            /// Create a builtin identifier of this category
            ///
            /// # Errors
            /// Fails when the path is empty or malformed.
            pub fn make<I, S>(path: I) -> Result<Self, IdentError>
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                Identifier::make(Self::CATEGORY, path).map(Self)
            }

            /// Parse and check the category
            ///
            /// # Errors
            /// Fails on malformed input or a category mismatch.
            pub fn parse(s: &str) -> Result<Self, IdentError> {
                Identifier::parse(s).and_then(Self::try_from)
            }

            /// Underlying identifier
            #[inline]
            #[must_use]
            pub fn as_identifier(&self) -> &Identifier {
                &self.0
            }

            /// Canonical string form
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Unwrap into the untyped identifier
            #[inline]
            #[must_use]
            pub fn into_identifier(self) -> Identifier {
                self.0
            }
        }

        impl TryFrom<Identifier> for $name {
            type Error = IdentError;

            fn try_from(id: Identifier) -> Result<Self, Self::Error> {
                if id.category() == Self::CATEGORY {
                    Ok(Self(id))
                } else {
                    Err(IdentError::CategoryMismatch {
                        expected: Self::CATEGORY,
                        found: id.to_string(),
                    })
                }
            }
        }

        impl From<$name> for Identifier {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<Identifier> for $name {
            fn as_ref(&self) -> &Identifier {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }
    };
}

typed_identifier!(
    /// Board identifier
    BoardId => Category::Board
);
typed_identifier!(
    /// Deck identifier
    DeckId => Category::Deck
);
typed_identifier!(
    /// Layer (track) identifier
    LayerId => Category::Layer
);
typed_identifier!(
    /// Section identifier
    SectionId => Category::Section
);
typed_identifier!(
    /// Range identifier
    RangeId => Category::Range
);
typed_identifier!(
    /// Card identifier
    CardId => Category::Card
);
typed_identifier!(
    /// Parameter identifier
    ParamId => Category::Param
);
typed_identifier!(
    /// Event identifier
    EventId => Category::Event
);
