//! Random-teleport core: safe-location search and the request state machine.
//!
//! The orchestrator consumes the host through a handful of ports (terrain,
//! permissions, players, persistent flags, economy, notifications) and owns
//! the only mutable state of its own: per-subject cooldowns.
//!
//! ```text
//! RtpRequest ─► identity ─► permission ─► region ─► cost ─► usage tier
//!                                                             │
//!           Outcome ◄─ commit (queue) ◄─ search ◄─ cooldown ◄─┘
//! ```
//!
//! Every gate failure is an [`Outcome`] variant; ports report faults as
//! [`PortError`] and the orchestrator translates them into outcomes.

mod commit;
mod cooldown;
mod cost;
mod error;
mod finder;
mod locks;
mod messages;
mod once_flag;
mod orchestrator;
mod ports;

pub use commit::CommitQueue;
pub use cooldown::CooldownTracker;
pub use cost::CostGate;
pub use error::{CommitError, PortError};
pub use finder::{is_safe, RegionSpec, SafeLocationFinder, SafetyVerdict, MAX_ATTEMPTS};
pub use messages::{translate_color_codes, MessageCatalog, Notice};
pub use once_flag::{has_used_once, mark_used_once, OnceFlagStore, SqliteOnceFlagStore};
pub use orchestrator::{Ports, RtpOrchestrator, RtpRequest, Target};
pub use ports::{EconomyPort, Notifier, PermissionOracle, PlayerRegistry, TerrainOracle};

pub use srtp_types::Outcome;
