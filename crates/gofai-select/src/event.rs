//! Musical events and the vocabularies selectors test against
//!
//! Events are owned by the project store; this crate only reads them.

use gofai_ident::{EventId, LayerId, SectionId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// Kind of musical event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pitched note
    Note,
    /// Chord symbol or stacked notes
    Chord,
    /// Explicit rest
    Rest,
    /// Drum hit
    Drum,
    /// Automation point
    Automation,
    /// Timeline marker
    Marker,
    /// Lyric syllable
    Lyric,
}

impl EventKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Note => "note",
            EventKind::Chord => "chord",
            EventKind::Rest => "rest",
            EventKind::Drum => "drum",
            EventKind::Automation => "automation",
            EventKind::Marker => "marker",
            EventKind::Lyric => "lyric",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Musical role of the layer an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Main melody
    Melody,
    /// Bass line
    Bass,
    /// Harmonic support
    Harmony,
    /// Rhythm section
    Rhythm,
    /// Lead instrument
    Lead,
    /// Sustained pad
    Pad,
    /// Percussion
    Percussion,
    /// Counter-melody
    Counterline,
}

impl Role {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Melody => "melody",
            Role::Bass => "bass",
            Role::Harmony => "harmony",
            Role::Rhythm => "rhythm",
            Role::Lead => "lead",
            Role::Pad => "pad",
            Role::Percussion => "percussion",
            Role::Counterline => "counterline",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dynamic marking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicMarking {
    /// pianississimo
    Ppp,
    /// pianissimo
    Pp,
    /// piano
    P,
    /// mezzo-piano
    Mp,
    /// mezzo-forte
    Mf,
    /// forte
    F,
    /// fortissimo
    Ff,
    /// fortississimo
    Fff,
}

impl DynamicMarking {
    /// Score notation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DynamicMarking::Ppp => "ppp",
            DynamicMarking::Pp => "pp",
            DynamicMarking::P => "p",
            DynamicMarking::Mp => "mp",
            DynamicMarking::Mf => "mf",
            DynamicMarking::F => "f",
            DynamicMarking::Ff => "ff",
            DynamicMarking::Fff => "fff",
        }
    }
}

impl Display for DynamicMarking {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of an arbitrary event property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl PropertyValue {
    /// Numeric view, if any
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// A single musical event
///
/// Time is expressed as a 1-based bar plus a 0-based beat offset within
/// that bar, both as the user sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Event kind
    pub kind: EventKind,
    /// Owning layer
    pub layer: LayerId,
    /// Section containing the onset, if the song is sectioned
    #[serde(default)]
    pub section: Option<SectionId>,
    /// Bar of the onset (1-based)
    pub bar: u32,
    /// Beat offset within the bar (0-based, may be fractional)
    #[serde(default)]
    pub beat: f64,
    /// Length in beats
    #[serde(default)]
    pub duration_beats: f64,
    /// MIDI pitch
    #[serde(default)]
    pub pitch: Option<u8>,
    /// MIDI velocity
    #[serde(default)]
    pub velocity: Option<u8>,
    /// Role of the owning layer
    #[serde(default)]
    pub role: Option<Role>,
    /// Free-form tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Articulation name
    #[serde(default)]
    pub articulation: Option<String>,
    /// Dynamic marking
    #[serde(default)]
    pub dynamic: Option<DynamicMarking>,
    /// Additional named properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Event {
    /// Create an event with no optional attributes
    #[must_use]
    pub fn new(id: EventId, kind: EventKind, layer: LayerId, bar: u32, beat: f64) -> Self {
        Self {
            id,
            kind,
            layer,
            section: None,
            bar,
            beat,
            duration_beats: 0.0,
            pitch: None,
            velocity: None,
            role: None,
            tags: BTreeSet::new(),
            articulation: None,
            dynamic: None,
            properties: BTreeMap::new(),
        }
    }

    /// Create a note event
    #[must_use]
    pub fn note(id: EventId, layer: LayerId, bar: u32, beat: f64, pitch: u8) -> Self {
        Self::new(id, EventKind::Note, layer, bar, beat).with_pitch(pitch)
    }

    /// With pitch
    #[inline]
    #[must_use]
    pub fn with_pitch(mut self, pitch: u8) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// With velocity
    #[inline]
    #[must_use]
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// With duration in beats
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, beats: f64) -> Self {
        self.duration_beats = beats;
        self
    }

    /// With section
    #[inline]
    #[must_use]
    pub fn in_section(mut self, section: SectionId) -> Self {
        self.section = Some(section);
        self
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Add a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// With articulation
    #[inline]
    #[must_use]
    pub fn with_articulation(mut self, articulation: impl Into<String>) -> Self {
        self.articulation = Some(articulation.into());
        self
    }

    /// With dynamic marking
    #[inline]
    #[must_use]
    pub fn with_dynamic(mut self, dynamic: DynamicMarking) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// With a named property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Canonical evaluation order: bar, beat, layer, id
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.bar
            .cmp(&other.bar)
            .then_with(|| self.beat.total_cmp(&other.beat))
            .then_with(|| self.layer.cmp(&other.layer))
            .then_with(|| self.id.cmp(&other.id))
    }
}
