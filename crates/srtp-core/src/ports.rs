//! Capabilities the orchestrator consumes from its host.

use srtp_types::{BlockClass, BlockPos, Location, Requester, Subject, SubjectId, TeleportSound, WorldInfo};

use crate::error::PortError;
use crate::messages::Notice;

/// Read-only access to terrain.
pub trait TerrainOracle: Send + Sync {
    /// Metadata for a loaded world, or `None` if the world is unknown.
    fn world_info(&self, world: &str) -> Option<WorldInfo>;

    /// Y of the highest solid block in the `(x, z)` column. A value at or
    /// below the world's minimum height means the column has no surface.
    fn highest_solid_y(&self, world: &WorldInfo, x: i32, z: i32) -> Result<i32, PortError>;

    /// Classification of the block at `pos`.
    fn block_class(&self, world: &WorldInfo, pos: BlockPos) -> Result<BlockClass, PortError>;
}

/// Flat grant lookup.
pub trait PermissionOracle: Send + Sync {
    fn has(&self, subject: SubjectId, grant: &str) -> bool;
}

/// Online players and the actions the commit applies to them.
pub trait PlayerRegistry: Send + Sync {
    /// The online subject with this id.
    fn online(&self, id: SubjectId) -> Option<Subject>;

    /// The online subject with this name (case-insensitive).
    fn online_by_name(&self, name: &str) -> Option<Subject>;

    /// Moves the subject. Fails with [`PortError::Offline`] if it left.
    fn teleport(&self, id: SubjectId, to: &Location) -> Result<(), PortError>;

    fn play_sound(&self, id: SubjectId, sound: TeleportSound);
}

/// External ledger.
pub trait EconomyPort: Send + Sync {
    fn has_balance(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError>;

    /// Returns `true` iff the ledger reports the transaction succeeded.
    fn withdraw(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError>;

    /// Returns `true` iff the ledger reports the transaction succeeded.
    fn deposit(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError>;
}

/// Delivery of rendered messages.
pub trait Notifier: Send + Sync {
    fn deliver(&self, to: Requester, notice: &Notice);
}
