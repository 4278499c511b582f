//! Error types for reference and scope handling

use thiserror::Error;

use crate::scope::ScopeSlot;

/// Errors from reference shapes and scopes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Bar span with zero start or start after end
    #[error("invalid bar span {start}–{end}")]
    InvalidSpan {
        /// First bar
        start: u32,
        /// Last bar
        end: u32,
    },

    /// A scope level is still unresolved
    #[error("scope level '{0}' is not resolved")]
    UnresolvedScope(ScopeSlot),

    /// A resolved binding has the wrong identifier category for its slot
    #[error("binding '{id}' cannot fill scope level '{slot}'")]
    SlotMismatch {
        /// Slot being filled
        slot: ScopeSlot,
        /// Offending identifier
        id: String,
    },

    /// Identifier error
    #[error(transparent)]
    Ident(#[from] gofai_ident::IdentError),
}
