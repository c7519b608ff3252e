//! Closed vocabulary of sounds that may be played on a successful teleport.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a sound identifier is not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sound: {0}")]
pub struct UnknownSound(pub String);

/// Sounds the host knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeleportSound {
    EntityEndermanTeleport,
    EntityShulkerTeleport,
    ItemChorusFruitTeleport,
    BlockPortalTravel,
    BlockPortalTrigger,
    BlockEndPortalSpawn,
    EntityPlayerLevelup,
    EntityExperienceOrbPickup,
    BlockNoteBlockPling,
    BlockBeaconActivate,
}

impl TeleportSound {
    const ALL: [TeleportSound; 10] = [
        Self::EntityEndermanTeleport,
        Self::EntityShulkerTeleport,
        Self::ItemChorusFruitTeleport,
        Self::BlockPortalTravel,
        Self::BlockPortalTrigger,
        Self::BlockEndPortalSpawn,
        Self::EntityPlayerLevelup,
        Self::EntityExperienceOrbPickup,
        Self::BlockNoteBlockPling,
        Self::BlockBeaconActivate,
    ];

    /// The namespaced identifier, e.g. `entity.enderman.teleport`.
    pub fn key(self) -> &'static str {
        match self {
            Self::EntityEndermanTeleport => "entity.enderman.teleport",
            Self::EntityShulkerTeleport => "entity.shulker.teleport",
            Self::ItemChorusFruitTeleport => "item.chorus_fruit.teleport",
            Self::BlockPortalTravel => "block.portal.travel",
            Self::BlockPortalTrigger => "block.portal.trigger",
            Self::BlockEndPortalSpawn => "block.end_portal.spawn",
            Self::EntityPlayerLevelup => "entity.player.levelup",
            Self::EntityExperienceOrbPickup => "entity.experience_orb.pickup",
            Self::BlockNoteBlockPling => "block.note_block.pling",
            Self::BlockBeaconActivate => "block.beacon.activate",
        }
    }

    fn constant_name(key: &str) -> String {
        key.to_ascii_uppercase().replace('.', "_")
    }
}

impl std::str::FromStr for TeleportSound {
    type Err = UnknownSound;

    /// Accepts either the namespaced key or its constant form
    /// (`ENTITY_ENDERMAN_TELEPORT`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = Self::constant_name(s.trim());
        Self::ALL
            .into_iter()
            .find(|sound| Self::constant_name(sound.key()) == wanted)
            .ok_or_else(|| UnknownSound(s.to_string()))
    }
}
