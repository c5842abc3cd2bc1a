//! Closed enumeration types for the Headway simulation.
//!
//! Weather states, the hazard catalog, combat stunts, item kinds, and
//! message categories. Every selection over these sets is an exhaustive
//! match; the store persists them as text via the `as_str`/`parse` pairs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Current weather over the network.
///
/// `PartlyCloudy` is reachable only from `Cloudy`, and only transitions back
/// to `Cloudy`. Lightning can strike only while `Rainy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// Rain over the whole network; lightning becomes possible.
    Rainy,
    /// Overcast; may turn rainy or partly cloudy.
    Cloudy,
    /// Thinning cover; may only return to cloudy.
    PartlyCloudy,
}

impl Weather {
    /// Stable text identifier used by the store and the read API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rainy => "rainy",
            Self::Cloudy => "cloudy",
            Self::PartlyCloudy => "partly-cloudy",
        }
    }

    /// Parse a stable text identifier back into a weather state.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "rainy" => Some(Self::Rainy),
            "cloudy" => Some(Self::Cloudy),
            "partly-cloudy" => Some(Self::PartlyCloudy),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Hazard catalog
// ---------------------------------------------------------------------------

/// A kind of hazard that can appear on a hop.
///
/// The catalog is fixed: one mystery slime, two debris variants, two stray
/// animal variants. Display attributes derive from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// An unidentifiable luminous mass oozing across the tracks.
    MysterySlime,
    /// Loose debris scattered over the trackbed.
    TrackDebris,
    /// A maintenance scaffold that has come down across the hop.
    CollapsedScaffold,
    /// A stray dog camped between the rails.
    StrayDog,
    /// A stray cat that refuses to move.
    StrayCat,
}

impl HazardKind {
    /// Every spawnable kind, in catalog order. Spawn picks index uniformly.
    pub const CATALOG: [Self; 5] = [
        Self::MysterySlime,
        Self::TrackDebris,
        Self::CollapsedScaffold,
        Self::StrayDog,
        Self::StrayCat,
    ];

    /// Display title used in narrative messages.
    pub const fn title(self) -> &'static str {
        match self {
            Self::MysterySlime => "Mystery Slime",
            Self::TrackDebris => "Track Debris",
            Self::CollapsedScaffold => "Collapsed Scaffold",
            Self::StrayDog => "Stray Dog",
            Self::StrayCat => "Stray Cat",
        }
    }

    /// Short label used by the rendering client.
    pub const fn label(self) -> &'static str {
        match self {
            Self::MysterySlime => "slime",
            Self::TrackDebris => "debris",
            Self::CollapsedScaffold => "scaffold",
            Self::StrayDog => "dog",
            Self::StrayCat => "cat",
        }
    }

    /// Display color (hex) used by the rendering client.
    pub const fn color(self) -> &'static str {
        match self {
            Self::MysterySlime => "#7cb342",
            Self::TrackDebris => "#8d6e63",
            Self::CollapsedScaffold => "#fb8c00",
            Self::StrayDog => "#a1887f",
            Self::StrayCat => "#616161",
        }
    }

    /// Stable text identifier used by the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MysterySlime => "mystery-slime",
            Self::TrackDebris => "track-debris",
            Self::CollapsedScaffold => "collapsed-scaffold",
            Self::StrayDog => "stray-dog",
            Self::StrayCat => "stray-cat",
        }
    }

    /// Parse a stable text identifier back into a hazard kind.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "mystery-slime" => Some(Self::MysterySlime),
            "track-debris" => Some(Self::TrackDebris),
            "collapsed-scaffold" => Some(Self::CollapsedScaffold),
            "stray-dog" => Some(Self::StrayDog),
            "stray-cat" => Some(Self::StrayCat),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Combat stunts
// ---------------------------------------------------------------------------

/// A special combat maneuver attempted instead of a plain melee attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stunt {
    /// Opposed willpower check; on success the target is stunned 1-4 turns.
    WitheringGaze,
    /// Opposed strength check; on success the target is displaced to the
    /// farthest adjacent station.
    Flashback,
    /// Check against the actor's own dexterity; on success the *target* is
    /// shoved aboard a random departing train.
    OlSlip,
}

impl Stunt {
    /// Every stunt, in selection order. The stunt pick is uniform over this.
    pub const ALL: [Self; 3] = [Self::WitheringGaze, Self::Flashback, Self::OlSlip];

    /// Display title used in narrative messages.
    pub const fn title(self) -> &'static str {
        match self {
            Self::WitheringGaze => "Withering Gaze",
            Self::Flashback => "Flashback",
            Self::OlSlip => "The Ol' Slip",
        }
    }
}

// ---------------------------------------------------------------------------
// Item kinds
// ---------------------------------------------------------------------------

/// The kind of an item carried by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A weapon; carries a dice-notation damage string for melee.
    Weapon,
    /// A keepsake with no mechanical effect.
    Memento,
}

impl ItemKind {
    /// Stable text identifier used by the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Memento => "memento",
        }
    }

    /// Parse a stable text identifier back into an item kind.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "weapon" => Some(Self::Weapon),
            "memento" => Some(Self::Memento),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message categories
// ---------------------------------------------------------------------------

/// The category of a narrative message, used by the read API to filter the
/// feed. The engine never reads messages back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Weather transitions and lightning strikes.
    Weather,
    /// Hazard spawns and clean-ups.
    Hazard,
    /// Train movement, holds, arrivals, departures.
    Train,
    /// Agent movement, waits, boarding, disembarking.
    Agent,
    /// Stunts, melee, respawns.
    Combat,
    /// Engine diagnostics surfaced to the feed (out-of-bounds skips).
    System,
}

impl MessageKind {
    /// Stable text identifier used by the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Hazard => "hazard",
            Self::Train => "train",
            Self::Agent => "agent",
            Self::Combat => "combat",
            Self::System => "system",
        }
    }

    /// Parse a stable text identifier back into a message kind.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "weather" => Some(Self::Weather),
            "hazard" => Some(Self::Hazard),
            "train" => Some(Self::Train),
            "agent" => Some(Self::Agent),
            "combat" => Some(Self::Combat),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}
