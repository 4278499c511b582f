//! Resolution outcomes
//!
//! Resolution never throws for ambiguity or absence. It returns a tagged
//! [`ResolutionResult`] carrying what a caller needs to present the next step.

use gofai_entity::{Binding, Scope, ScopeSlot};
use gofai_ident::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How a reference was bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Identifier given explicitly
    ExactId,
    /// Name matched exactly
    ExactName,
    /// Type plus ordinal ("the second chorus")
    TypeAndOrdinal,
    /// Ordinal alone ("the third layer")
    Ordinal,
    /// First, last, next, previous or current
    RelativePosition,
    /// Explicit bars
    ExplicitRange,
    /// Current UI selection
    Deictic,
    /// Discourse history
    Anaphoric,
    /// Contextual prominence
    Salience,
    /// Approximate name
    FuzzyName,
    /// Event predicate
    EventSelector,
    /// Configured default for a bare reference
    SystemDefault,
}

impl ResolutionMethod {
    /// snake_case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResolutionMethod::ExactId => "exact_id",
            ResolutionMethod::ExactName => "exact_name",
            ResolutionMethod::TypeAndOrdinal => "type_and_ordinal",
            ResolutionMethod::Ordinal => "ordinal",
            ResolutionMethod::RelativePosition => "relative_position",
            ResolutionMethod::ExplicitRange => "explicit_range",
            ResolutionMethod::Deictic => "deictic",
            ResolutionMethod::Anaphoric => "anaphoric",
            ResolutionMethod::Salience => "salience",
            ResolutionMethod::FuzzyName => "fuzzy_name",
            ResolutionMethod::EventSelector => "event_selector",
            ResolutionMethod::SystemDefault => "system_default",
        }
    }
}

impl Display for ResolutionMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a reference could not be bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No matching entity
    NotFound,
    /// No project loaded
    NoProject,
    /// The reference form is not valid for the entity kind
    InvalidType,
    /// Ordinal or position beyond what exists
    OutOfRange,
    /// Deictic or positional reference without a selection or playhead
    NoSelection,
    /// The UI selection is out of date
    StaleSelection,
    /// Anaphoric reference without discourse history
    NoDiscourse,
    /// The selection or identifier is of another kind
    TypeMismatch,
    /// The entity exists but is not visible to the caller
    AccessDenied,
}

impl FailureReason {
    /// snake_case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureReason::NotFound => "not_found",
            FailureReason::NoProject => "no_project",
            FailureReason::InvalidType => "invalid_type",
            FailureReason::OutOfRange => "out_of_range",
            FailureReason::NoSelection => "no_selection",
            FailureReason::StaleSelection => "stale_selection",
            FailureReason::NoDiscourse => "no_discourse",
            FailureReason::TypeMismatch => "type_mismatch",
            FailureReason::AccessDenied => "access_denied",
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate offered in an ambiguous result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBinding {
    /// What the reference would bind to
    pub binding: Binding,
    /// Score in `0.0..=1.0`
    pub confidence: f64,
}

/// A close-but-insufficient match reported with a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMatch {
    /// Entity identifier
    pub id: Identifier,
    /// Display name
    pub display_name: String,
    /// Similarity score
    pub score: f64,
}

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// Bound to a single interpretation
    Resolved {
        /// Bound entity or events
        binding: Binding,
        /// Score in `0.0..=1.0`
        confidence: f64,
        /// How it was bound
        method: ResolutionMethod,
        /// `'that chorus' → Chorus 2 (bars 49–65)`
        explanation: String,
    },
    /// Several interpretations are too close to call
    Ambiguous {
        /// Competing candidates, best first
        candidates: Vec<ScoredBinding>,
        /// Clarification question for the user
        question: String,
        /// Candidate to preselect, if one stands out
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested_default: Option<Identifier>,
    },
    /// Nothing could be bound
    Failed {
        /// Failure category
        reason: FailureReason,
        /// What went wrong, in user terms
        message: String,
        /// What the user could do next
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
        /// Similar entities, best first
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        near_matches: Vec<NearMatch>,
    },
}

impl ResolutionResult {
    pub(crate) fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        ResolutionResult::Failed {
            reason,
            message: message.into(),
            suggestion: None,
            near_matches: Vec::new(),
        }
    }

    pub(crate) fn with_suggestion(mut self, text: impl Into<String>) -> Self {
        if let ResolutionResult::Failed { suggestion, .. } = &mut self {
            *suggestion = Some(text.into());
        }
        self
    }

    pub(crate) fn with_near_matches(mut self, matches: Vec<NearMatch>) -> Self {
        if let ResolutionResult::Failed { near_matches, .. } = &mut self {
            *near_matches = matches;
        }
        self
    }

    /// True for [`ResolutionResult::Resolved`]
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved { .. })
    }

    /// True for [`ResolutionResult::Ambiguous`]
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionResult::Ambiguous { .. })
    }

    /// Binding, if resolved
    #[must_use]
    pub fn binding(&self) -> Option<&Binding> {
        match self {
            ResolutionResult::Resolved { binding, .. } => Some(binding),
            _ => None,
        }
    }

    /// Method, if resolved
    #[must_use]
    pub fn method(&self) -> Option<ResolutionMethod> {
        match self {
            ResolutionResult::Resolved { method, .. } => Some(*method),
            _ => None,
        }
    }

    /// Failure reason, if failed
    #[must_use]
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            ResolutionResult::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl Display for ResolutionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionResult::Resolved {
                explanation,
                method,
                ..
            } => write!(f, "{explanation} [{method}]"),
            ResolutionResult::Ambiguous { question, .. } => f.write_str(question),
            ResolutionResult::Failed {
                reason,
                message,
                suggestion,
                ..
            } => {
                write!(f, "{reason}: {message}")?;
                if let Some(s) = suggestion {
                    write!(f, " ({s})")?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of resolving every level of a [`Scope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScopeResolution {
    /// Every level is bound
    Resolved {
        /// Scope holding only bindings
        scope: Scope,
    },
    /// A level could not be bound; lower levels were not attempted
    Blocked {
        /// Level that failed or was ambiguous
        slot: ScopeSlot,
        /// Its resolution result
        result: ResolutionResult,
    },
}

impl ScopeResolution {
    /// Resolved scope, if every level is bound
    #[must_use]
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            ScopeResolution::Resolved { scope } => Some(scope),
            ScopeResolution::Blocked { .. } => None,
        }
    }
}
