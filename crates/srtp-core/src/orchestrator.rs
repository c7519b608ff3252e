//! The random-teleport request state machine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use srtp_types::{
    Location, Outcome, Requester, RtpFrom, RtpSettings, Subject, SubjectId, TeleportSound,
    WorldInfo, GRANT_ONCE, GRANT_OTHERS, GRANT_UNLIMITED,
};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::commit::CommitQueue;
use crate::cooldown::CooldownTracker;
use crate::cost::CostGate;
use crate::error::PortError;
use crate::finder::{RegionSpec, SafeLocationFinder};
use crate::locks::SubjectLocks;
use crate::messages::MessageCatalog;
use crate::once_flag::OnceFlagStore;
use crate::ports::{EconomyPort, Notifier, PermissionOracle, PlayerRegistry, TerrainOracle};

/// Who a request is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The requester itself (`rtp`).
    Own,
    /// Another online subject by name (`rtp <player>`).
    Named(String),
}

/// One invocation of the teleport command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpRequest {
    pub requester: Requester,
    pub target: Target,
}

impl RtpRequest {
    pub fn own(requester: Requester) -> Self {
        Self {
            requester,
            target: Target::Own,
        }
    }

    pub fn other(requester: Requester, name: impl Into<String>) -> Self {
        Self {
            requester,
            target: Target::Named(name.into()),
        }
    }

    /// True for the no-argument form, even if a named target resolves to the
    /// requester.
    pub fn is_self(&self) -> bool {
        self.target == Target::Own
    }
}

/// Host capabilities the orchestrator depends on.
#[derive(Clone)]
pub struct Ports {
    pub terrain: Arc<dyn TerrainOracle>,
    pub permissions: Arc<dyn PermissionOracle>,
    pub players: Arc<dyn PlayerRegistry>,
    pub once_flags: Arc<dyn OnceFlagStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// A request that passed the identity gate.
struct Resolved {
    requester: Requester,
    target: Subject,
    is_self: bool,
}

/// A request that passed every gate that does not need the subject lock.
struct Admitted {
    requester: Requester,
    target: Subject,
    is_self: bool,
    unlimited: bool,
    world: WorldInfo,
    cost: Option<f64>,
}

/// Everything the commit step needs, captured by value.
struct CommitPlan {
    requester: Requester,
    subject: SubjectId,
    location: Location,
    cost: Option<f64>,
    cooldown_until: Option<Instant>,
    mark_once: bool,
    sound: Option<TeleportSound>,
}

/// The synchronous half of the orchestrator. Every method here calls ports
/// and runs on the blocking pool.
#[derive(Clone)]
struct Gates {
    ports: Ports,
    cost: Arc<CostGate>,
    cooldowns: Arc<CooldownTracker>,
    finder: SafeLocationFinder,
    rng: Arc<Mutex<StdRng>>,
}

/// Resolves teleport requests through the gate chain and commits them.
pub struct RtpOrchestrator {
    gates: Gates,
    settings: RwLock<Arc<RtpSettings>>,
    commits: CommitQueue,
    locks: SubjectLocks,
}

impl RtpOrchestrator {
    pub fn new(ports: Ports, settings: RtpSettings, commits: CommitQueue) -> Self {
        Self {
            gates: Gates {
                ports,
                cost: Arc::new(CostGate::new(None)),
                cooldowns: Arc::new(CooldownTracker::new()),
                finder: SafeLocationFinder::new(),
                rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            },
            settings: RwLock::new(Arc::new(settings)),
            commits,
            locks: SubjectLocks::default(),
        }
    }

    pub fn with_economy(self, economy: Arc<dyn EconomyPort>) -> Self {
        self.gates.cost.bind(Some(economy));
        self
    }

    /// Replaces the random source; used for reproducible searches.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.gates.rng = Arc::new(Mutex::new(rng));
        self
    }

    /// Swaps the settings snapshot and the economy binding.
    ///
    /// Requests already in flight keep the snapshot they started with.
    pub fn reload(&self, settings: RtpSettings, economy: Option<Arc<dyn EconomyPort>>) {
        let mut slot = match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Arc::new(settings);
        drop(slot);
        self.gates.cost.bind(economy);
        tracing::info!(economy_bound = self.gates.cost.is_bound(), "settings reloaded");
    }

    /// The current settings snapshot.
    pub fn settings(&self) -> Arc<RtpSettings> {
        match self.settings.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.gates.cooldowns
    }

    pub fn cost_gate(&self) -> &CostGate {
        &self.gates.cost
    }

    /// Runs `request` through every gate, notifies the right recipient and
    /// returns the outcome.
    pub async fn resolve(&self, request: RtpRequest) -> Outcome {
        let settings = self.settings();
        let requester = request.requester;
        let is_self = request.is_self();

        let (outcome, target) = match self.blocking(move |gates| gates.identify(&request)).await {
            Ok(resolved) => {
                let target = resolved.target.id;
                let outcome = match self.process(resolved, &settings).await {
                    Ok(outcome) | Err(outcome) => outcome,
                };
                (outcome, Some(target))
            }
            Err(outcome) => (outcome, None),
        };

        let notice = outcome.clone();
        let snapshot = Arc::clone(&settings);
        let _ = self
            .blocking(move |gates| {
                gates.notify(&snapshot, &notice, requester, target);
                Ok(())
            })
            .await;

        tracing::debug!(
            requester = ?requester,
            is_self,
            outcome = outcome.message_key(),
            "rtp request resolved"
        );
        outcome
    }

    async fn process(
        &self,
        resolved: Resolved,
        settings: &Arc<RtpSettings>,
    ) -> Result<Outcome, Outcome> {
        let subject = resolved.target.id;

        let snapshot = Arc::clone(settings);
        let admitted = self
            .blocking(move |gates| gates.admit(resolved, &snapshot))
            .await?;

        let _guard = self.locks.lock(subject).await;

        let now = Instant::now();
        let snapshot = Arc::clone(settings);
        let plan = self
            .blocking(move |gates| gates.prepare(admitted, &snapshot, now))
            .await?;

        self.commit(plan).await
    }

    /// Runs one synchronous stage on the blocking pool.
    async fn blocking<T, F>(&self, stage: F) -> Result<T, Outcome>
    where
        T: Send + 'static,
        F: FnOnce(&Gates) -> Result<T, Outcome> + Send + 'static,
    {
        let gates = self.gates.clone();
        match tokio::task::spawn_blocking(move || stage(&gates)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "gate stage did not complete");
                Err(Outcome::SearchFailed)
            }
        }
    }

    async fn commit(&self, plan: CommitPlan) -> Result<Outcome, Outcome> {
        let gates = self.gates.clone();
        match self.commits.run(move || gates.apply(plan)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "commit did not complete");
                Err(Outcome::SearchFailed)
            }
        }
    }
}

impl Gates {
    fn identify(&self, request: &RtpRequest) -> Result<Resolved, Outcome> {
        match &request.target {
            Target::Own => {
                let id = request.requester.subject().ok_or(Outcome::PlayerOnly)?;
                let target = self.ports.players.online(id).ok_or(Outcome::PlayerOnly)?;
                Ok(Resolved {
                    requester: request.requester,
                    target,
                    is_self: true,
                })
            }
            Target::Named(name) => {
                if let Some(id) = request.requester.subject() {
                    if !self.ports.permissions.has(id, GRANT_OTHERS) {
                        return Err(Outcome::NoPermissionOthers);
                    }
                }
                let target = self
                    .ports
                    .players
                    .online_by_name(name)
                    .ok_or(Outcome::TargetNotFound)?;
                Ok(Resolved {
                    requester: request.requester,
                    target,
                    is_self: false,
                })
            }
        }
    }

    /// Permission, region and affordability. None of these read state that a
    /// concurrent commit for the same subject could change.
    fn admit(&self, req: Resolved, settings: &RtpSettings) -> Result<Admitted, Outcome> {
        let subject = req.target.id;

        let unlimited = self.ports.permissions.has(subject, GRANT_UNLIMITED);
        if !unlimited && !self.ports.permissions.has(subject, GRANT_ONCE) {
            return Err(Outcome::NoPermission);
        }

        let world = self.region_gate(&req.target, settings)?;

        let cost = if req.is_self {
            settings.effective_cost()
        } else {
            None
        };
        if let Some(amount) = cost {
            self.cost.check(subject, amount)?;
        }

        Ok(Admitted {
            requester: req.requester,
            target: req.target,
            is_self: req.is_self,
            unlimited,
            world,
            cost,
        })
    }

    /// Usage tier, cooldown and the search. Runs under the subject lock.
    fn prepare(
        &self,
        req: Admitted,
        settings: &RtpSettings,
        now: Instant,
    ) -> Result<CommitPlan, Outcome> {
        let subject = req.target.id;

        if !req.unlimited {
            match self.ports.once_flags.has_used(subject) {
                Ok(false) => {}
                Ok(true) => return Err(Outcome::AlreadyUsedOnce),
                Err(e) => {
                    tracing::error!(subject = %subject, error = %e, "once-flag read failed");
                    return Err(Outcome::AlreadyUsedOnce);
                }
            }
        }

        let cooldown = (req.is_self && settings.cooldown > 0)
            .then(|| Duration::from_secs(settings.cooldown));
        if cooldown.is_some() {
            if let Some(left) = self.cooldowns.remaining(subject, now) {
                return Err(Outcome::OnCooldown {
                    remaining_seconds: left.as_secs(),
                });
            }
        }

        let teleporting = MessageCatalog::new(settings).render(
            "teleporting",
            &[],
            Requester::Player(subject),
        );
        self.ports
            .notifier
            .deliver(Requester::Player(subject), &teleporting);

        let region = region_for(&req.target, settings, req.world);
        let location = self.search(&region).ok_or(Outcome::SearchFailed)?;

        let sound = if settings.makesound {
            settings.sound.parse::<TeleportSound>().ok()
        } else {
            None
        };

        Ok(CommitPlan {
            requester: req.requester,
            subject,
            location,
            cost: req.cost,
            cooldown_until: cooldown.map(|window| deadline_after(now, window)),
            mark_once: !req.unlimited,
            sound,
        })
    }

    fn region_gate(&self, target: &Subject, settings: &RtpSettings) -> Result<WorldInfo, Outcome> {
        let world = &target.location.world;
        if settings.world_filter_enabled && !settings.worlds.iter().any(|w| w == world) {
            return Err(Outcome::WorldNotAllowed {
                allowed: settings.worlds.clone(),
            });
        }
        self.ports
            .terrain
            .world_info(world)
            .ok_or(Outcome::WorldNotFound)
    }

    /// Draws a per-request seed so concurrent searches never share the lock.
    fn search(&self, region: &RegionSpec) -> Option<Location> {
        let seed: [u8; 32] = match self.rng.lock() {
            Ok(mut guard) => guard.gen(),
            Err(poisoned) => poisoned.into_inner().gen(),
        };
        let mut rng = StdRng::from_seed(seed);
        self.finder
            .find(region, self.ports.terrain.as_ref(), &mut rng)
    }

    /// The commit step. Runs on the commit queue; all-or-nothing with respect
    /// to the economy, cooldown and once-flag state.
    fn apply(&self, plan: CommitPlan) -> Result<Outcome, Outcome> {
        let subject = plan.subject;
        let players = self.ports.players.as_ref();

        let charged = match plan.cost {
            Some(amount) => Some((self.cost.withdraw(subject, amount)?, amount)),
            None => None,
        };

        if let Err(e) = players.teleport(subject, &plan.location) {
            match &e {
                PortError::Offline(_) => {
                    tracing::info!(subject = %subject, "target left before teleport");
                }
                other => tracing::warn!(subject = %subject, error = %other, "teleport failed"),
            }
            if let Some((economy, amount)) = charged {
                CostGate::refund(economy.as_ref(), subject, amount);
            }
            return Err(Outcome::TargetNotFound);
        }

        if let Some(sound) = plan.sound {
            players.play_sound(subject, sound);
        }

        if let Some(deadline) = plan.cooldown_until {
            self.cooldowns.set(subject, deadline);
        }

        if plan.mark_once {
            if let Err(e) = self.ports.once_flags.mark_used(subject) {
                tracing::error!(subject = %subject, error = %e, "failed to persist once-flag");
            }
        }

        tracing::info!(
            requester = ?plan.requester,
            subject = %subject,
            world = %plan.location.world,
            x = plan.location.x,
            y = plan.location.y,
            z = plan.location.z,
            charged = plan.cost.unwrap_or(0.0),
            "random teleport committed"
        );

        Ok(Outcome::Success {
            location: plan.location,
        })
    }

    fn notify(
        &self,
        settings: &RtpSettings,
        outcome: &Outcome,
        requester: Requester,
        target: Option<SubjectId>,
    ) {
        let to = match target {
            Some(id) if !outcome.addressed_to_requester() => Requester::Player(id),
            _ => requester,
        };
        let notice = MessageCatalog::new(settings).for_outcome(outcome, to);
        self.ports.notifier.deliver(to, &notice);
    }
}

/// `now + window`, clamped to the latest instant the clock can represent.
fn deadline_after(now: Instant, window: Duration) -> Instant {
    let mut window = window;
    loop {
        if let Some(deadline) = now.checked_add(window) {
            return deadline;
        }
        window /= 2;
    }
}

fn region_for(target: &Subject, settings: &RtpSettings, world: WorldInfo) -> RegionSpec {
    let (center_x, center_z) = match settings.rtp_from {
        RtpFrom::Center => (0, 0),
        RtpFrom::Player => {
            let block = target.location.block();
            (block.x, block.z)
        }
    };
    RegionSpec {
        center_x,
        center_z,
        radius: settings.radius,
        world,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_exact_for_ordinary_windows() {
        let now = Instant::now();
        assert_eq!(
            deadline_after(now, Duration::from_secs(30)),
            now + Duration::from_secs(30)
        );
    }

    #[test]
    fn huge_window_clamps_instead_of_overflowing() {
        let now = Instant::now();
        let deadline = deadline_after(now, Duration::from_secs(u64::MAX));
        assert!(deadline > now + Duration::from_secs(365 * 24 * 60 * 60));
    }
}
