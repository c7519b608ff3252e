//! Shared types, error definitions, and constants for SimpleRTP.
//!
//! This crate provides the foundational types used across all srtp crates:
//! subject identities, world and block metadata, locations, grant names,
//! the closed [`Outcome`] set produced by the orchestrator, and the
//! [`RtpSettings`] configuration surface.
//!
//! No crate in the workspace depends on anything *except* `srtp-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod outcome;
mod settings;
mod sound;

pub use outcome::Outcome;
pub use settings::{MessageDelivery, RtpFrom, RtpSettings};
pub use sound::TeleportSound;

/// Grant for unlimited random teleports.
pub const GRANT_UNLIMITED: &str = "srtp.rtp";
/// Grant for a single random teleport per subject lifetime.
pub const GRANT_ONCE: &str = "srtp.rtp.once";
/// Grant allowing a requester to random-teleport other subjects.
pub const GRANT_OTHERS: &str = "srtp.rtp.others";
/// Grant allowing a requester to reload the configuration.
pub const GRANT_RELOAD: &str = "srtp.reload";

/// Height above which a nether-like world is considered its roof.
pub const NETHER_ROOF_Y: i32 = 124;

/// Stable identity of a subject (player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    /// Generates a fresh random subject id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SubjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Whoever issued a command: the server console or an online player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Requester {
    /// The server console (or any non-player command source).
    Console,
    /// An online player.
    Player(SubjectId),
}

impl Requester {
    /// Returns the player id, if the requester is a player.
    pub fn subject(self) -> Option<SubjectId> {
        match self {
            Self::Console => None,
            Self::Player(id) => Some(id),
        }
    }
}

/// World environment kinds that affect vertical safety rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldKind {
    /// An overworld-style dimension.
    #[default]
    Normal,
    /// A dimension with a bedrock roof; spawning above the roof is unsafe.
    Nether,
    /// An end-style dimension.
    End,
}

impl WorldKind {
    /// Returns the canonical string label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Nether => "nether",
            Self::End => "end",
        }
    }

    /// Whether this world has a structural ceiling at [`NETHER_ROOF_Y`].
    pub fn has_roof(self) -> bool {
        matches!(self, Self::Nether)
    }
}

/// Classification of a single block as seen by the safety predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockClass {
    /// Empty space.
    #[default]
    Air,
    /// Non-solid, non-liquid blocks a body can occupy (grass, flowers, snow layers).
    Passable,
    /// Non-hazardous liquid (water).
    Liquid,
    /// Hazardous liquid (lava).
    HazardousLiquid,
    /// A full, solid block.
    Solid,
}

impl BlockClass {
    /// Whether the block is solid ground.
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Solid)
    }

    /// Whether standing in or on the block harms the subject.
    pub fn is_hazardous(self) -> bool {
        matches!(self, Self::HazardousLiquid)
    }

    /// Whether a body can occupy the block's cell.
    pub fn is_passable(self) -> bool {
        !self.is_solid()
    }
}

/// Static metadata about a world, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldInfo {
    /// Unique world name.
    pub name: String,
    /// Environment kind.
    pub kind: WorldKind,
    /// Lowest valid block Y (inclusive).
    pub min_height: i32,
    /// Build limit (exclusive).
    pub max_height: i32,
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block directly beneath.
    pub const fn below(self) -> Self {
        Self::new(self.x, self.y.saturating_sub(1), self.z)
    }

    /// The block directly above.
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y.saturating_add(1), self.z)
    }
}

/// A precise position inside a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// The block this location lies in.
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// An online subject as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub location: Location,
}
