//! The closed set of results a random-teleport request can end in.

use crate::Location;
use serde::{Deserialize, Serialize};

/// Result of resolving one random-teleport request.
///
/// Every gate failure is a normal, expected outcome with its own message key;
/// none of them are errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// A self teleport was issued by something that is not a player.
    PlayerOnly,
    /// The target holds neither the unlimited nor the single-use grant.
    NoPermission,
    /// The requester may not teleport other subjects.
    NoPermissionOthers,
    /// The named target is not online.
    TargetNotFound,
    /// World filtering is on and the target's world is not allowed.
    WorldNotAllowed {
        /// The configured allow-list, for display.
        allowed: Vec<String>,
    },
    /// The target's world could not be resolved.
    WorldNotFound,
    /// A cost is configured but no economy is bound.
    NoEconomyProvider,
    /// The target cannot afford the configured cost.
    InsufficientFunds {
        cost: f64,
    },
    /// The single-use grant has already been spent.
    AlreadyUsedOnce,
    /// The cooldown window has not elapsed.
    OnCooldown {
        remaining_seconds: u64,
    },
    /// No safe location was found within the attempt bound.
    SearchFailed,
    /// The ledger rejected the withdrawal at commit time.
    EconomyWithdrawFailed,
    /// The teleport was committed.
    Success {
        location: Location,
    },
}

impl Outcome {
    /// Message catalog key used to render this outcome.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::PlayerOnly => "player-only",
            Self::NoPermission => "no-permission",
            Self::NoPermissionOthers => "no-permission-others",
            Self::TargetNotFound => "player-not-found",
            Self::WorldNotAllowed { .. } => "world-not-allowed",
            Self::WorldNotFound => "world-not-found",
            Self::NoEconomyProvider => "cost-no-vault",
            Self::InsufficientFunds { .. } => "cost-insufficient",
            Self::AlreadyUsedOnce => "used-once",
            Self::OnCooldown { .. } => "cooldown",
            Self::SearchFailed | Self::EconomyWithdrawFailed => "failed",
            Self::Success { .. } => "success",
        }
    }

    /// Whether the message for this outcome goes back to the command issuer
    /// rather than to the teleport target.
    pub fn addressed_to_requester(&self) -> bool {
        matches!(
            self,
            Self::PlayerOnly | Self::NoPermissionOthers | Self::TargetNotFound
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
