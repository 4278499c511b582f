//! Resolver configuration
//!
//! Thresholds, salience weights and the default-interpretation table. The
//! table is an explicit value: overrides form an immutable layer consulted
//! before the builtin defaults.

use gofai_entity::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ResolveError, Result};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Candidates scoring within this gap of the top score make a result ambiguous
    pub ambiguity_gap: f64,
    /// Minimum similarity for a fuzzy name match
    pub fuzzy_threshold: f64,
    /// Near matches reported with a failure
    pub near_match_limit: usize,
    /// Maximum selector depth accepted for event references
    pub max_selector_depth: usize,
    /// Confidence given to system-default bindings
    pub default_confidence: f64,
    /// Salience scoring weights
    pub salience: SalienceWeights,
    /// Default interpretations for bare references
    pub defaults: DefaultBindings,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With ambiguity gap
    #[inline]
    #[must_use]
    pub fn with_ambiguity_gap(mut self, gap: f64) -> Self {
        self.ambiguity_gap = gap;
        self
    }

    /// With fuzzy threshold
    #[inline]
    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// With near-match limit
    #[inline]
    #[must_use]
    pub fn with_near_match_limit(mut self, limit: usize) -> Self {
        self.near_match_limit = limit;
        self
    }

    /// With salience weights
    #[inline]
    #[must_use]
    pub fn with_salience(mut self, salience: SalienceWeights) -> Self {
        self.salience = salience;
        self
    }

    /// With default bindings
    #[inline]
    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultBindings) -> Self {
        self.defaults = defaults;
        self
    }

    /// Parse from TOML and check ranges
    ///
    /// # Errors
    /// Fails on malformed TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    ///
    /// # Errors
    /// Fails if the value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that thresholds lie in `0.0..=1.0` and limits are non-zero
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        for (name, value) in [
            ("ambiguity_gap", self.ambiguity_gap),
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("default_confidence", self.default_confidence),
        ] {
            if !unit.contains(&value) {
                return Err(ResolveError::InvalidConfig(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        if self.max_selector_depth == 0 {
            return Err(ResolveError::InvalidConfig(
                "max_selector_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ambiguity_gap: 0.15,
            fuzzy_threshold: 0.80,
            near_match_limit: 3,
            max_selector_depth: gofai_select::MAX_DEPTH,
            default_confidence: 0.6,
            salience: SalienceWeights::default(),
            defaults: DefaultBindings::builtin(),
        }
    }
}

/// Weights for salience ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalienceWeights {
    /// Score every candidate starts with
    pub base: f64,
    /// Bonus for the entity in prior focus
    pub focus: f64,
    /// Bonus for the most recent discourse referent, decaying with age
    pub discourse: f64,
    /// Bonus for time-based entities under the playhead
    pub playhead: f64,
}

impl Default for SalienceWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            focus: 0.3,
            discourse: 0.2,
            playhead: 0.25,
        }
    }
}

/// How a bare reference ("the deck") is interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "name", rename_all = "snake_case")]
pub enum DefaultRule {
    /// Earliest entity of the kind
    First,
    /// Latest entity of the kind
    Last,
    /// Entity with this name
    Named(String),
    /// Every bar of the song (ranges)
    WholeSong,
    /// Every event in the container (events)
    AllEvents,
    /// No default; the user must say which
    Ask,
}

/// Default-interpretation table
///
/// Builtin rules plus an override layer. Overrides are set when the value
/// is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultBindings {
    overrides: BTreeMap<EntityKind, DefaultRule>,
}

impl DefaultBindings {
    /// Builtin table with no overrides
    #[inline]
    #[must_use]
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Add one override
    #[must_use]
    pub fn with_override(mut self, kind: EntityKind, rule: DefaultRule) -> Self {
        self.overrides.insert(kind, rule);
        self
    }

    /// Add several overrides
    #[must_use]
    pub fn with_overrides(mut self, rules: impl IntoIterator<Item = (EntityKind, DefaultRule)>) -> Self {
        self.overrides.extend(rules);
        self
    }

    /// Rule for `kind`: override first, then builtin
    #[must_use]
    pub fn rule_for(&self, kind: EntityKind) -> DefaultRule {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| builtin_rule(kind))
    }

    /// True if `kind` has an override
    #[inline]
    #[must_use]
    pub fn is_overridden(&self, kind: EntityKind) -> bool {
        self.overrides.contains_key(&kind)
    }
}

fn builtin_rule(kind: EntityKind) -> DefaultRule {
    match kind {
        EntityKind::Board | EntityKind::Deck => DefaultRule::First,
        EntityKind::Range => DefaultRule::WholeSong,
        EntityKind::Event => DefaultRule::AllEvents,
        EntityKind::Layer | EntityKind::Section | EntityKind::Card | EntityKind::Param => {
            DefaultRule::Ask
        }
    }
}
