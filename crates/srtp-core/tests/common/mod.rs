//! In-memory host fakes shared by the orchestrator tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use srtp_core::{
    CommitQueue, EconomyPort, Notice, Notifier, OnceFlagStore, PermissionOracle, PlayerRegistry,
    PortError, Ports, RtpOrchestrator, SqliteOnceFlagStore, TerrainOracle,
};
use srtp_db::{open_database, DbRuntimeSettings};
use srtp_types::{
    BlockClass, BlockPos, Location, Requester, RtpSettings, Subject, SubjectId, TeleportSound,
    WorldInfo, WorldKind,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Flat terrain: solid up to `surface`, air above. Unknown worlds are absent.
pub struct FlatTerrain {
    pub surface: i32,
    pub worlds: HashMap<String, WorldInfo>,
}

impl FlatTerrain {
    pub fn new(surface: i32) -> Self {
        let worlds = [("world", WorldKind::Normal), ("world_nether", WorldKind::Nether)]
            .into_iter()
            .map(|(name, kind)| {
                (
                    name.to_string(),
                    WorldInfo {
                        name: name.to_string(),
                        kind,
                        min_height: -64,
                        max_height: 320,
                    },
                )
            })
            .collect();
        Self { surface, worlds }
    }
}

impl TerrainOracle for FlatTerrain {
    fn world_info(&self, world: &str) -> Option<WorldInfo> {
        self.worlds.get(world).cloned()
    }

    fn highest_solid_y(&self, _world: &WorldInfo, _x: i32, _z: i32) -> Result<i32, PortError> {
        Ok(self.surface)
    }

    fn block_class(&self, _world: &WorldInfo, pos: BlockPos) -> Result<BlockClass, PortError> {
        Ok(if pos.y <= self.surface {
            BlockClass::Solid
        } else {
            BlockClass::Air
        })
    }
}

#[derive(Default)]
pub struct Grants {
    grants: Mutex<HashMap<SubjectId, HashSet<String>>>,
}

impl Grants {
    pub fn grant(&self, subject: SubjectId, grant: &str) {
        self.grants
            .lock()
            .unwrap()
            .entry(subject)
            .or_default()
            .insert(grant.to_string());
    }
}

impl PermissionOracle for Grants {
    fn has(&self, subject: SubjectId, grant: &str) -> bool {
        self.grants
            .lock()
            .unwrap()
            .get(&subject)
            .is_some_and(|g| g.contains(grant))
    }
}

#[derive(Default)]
pub struct Players {
    online: Mutex<HashMap<SubjectId, Subject>>,
    pub teleports: Mutex<Vec<(SubjectId, Location)>>,
    pub sounds: Mutex<Vec<(SubjectId, TeleportSound)>>,
    pub fail_teleport: AtomicBool,
}

impl Players {
    pub fn join(&self, name: &str, world: &str, x: f64, z: f64) -> SubjectId {
        let id = SubjectId::new_v4();
        self.online.lock().unwrap().insert(
            id,
            Subject {
                id,
                name: name.to_string(),
                location: Location::new(world, x, 65.0, z),
            },
        );
        id
    }

    pub fn teleport_count(&self) -> usize {
        self.teleports.lock().unwrap().len()
    }
}

impl PlayerRegistry for Players {
    fn online(&self, id: SubjectId) -> Option<Subject> {
        self.online.lock().unwrap().get(&id).cloned()
    }

    fn online_by_name(&self, name: &str) -> Option<Subject> {
        self.online
            .lock()
            .unwrap()
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn teleport(&self, id: SubjectId, to: &Location) -> Result<(), PortError> {
        if self.fail_teleport.load(Ordering::SeqCst) {
            return Err(PortError::Offline(id));
        }
        let mut online = self.online.lock().unwrap();
        let subject = online.get_mut(&id).ok_or(PortError::Offline(id))?;
        subject.location = to.clone();
        self.teleports.lock().unwrap().push((id, to.clone()));
        Ok(())
    }

    fn play_sound(&self, id: SubjectId, sound: TeleportSound) {
        self.sounds.lock().unwrap().push((id, sound));
    }
}

#[derive(Default)]
pub struct Wallet {
    balances: Mutex<HashMap<SubjectId, f64>>,
    pub reject_withdrawals: AtomicBool,
    pub balance_checks: AtomicUsize,
    pub withdrawals: AtomicUsize,
}

impl Wallet {
    pub fn set(&self, subject: SubjectId, balance: f64) {
        self.balances.lock().unwrap().insert(subject, balance);
    }

    pub fn balance(&self, subject: SubjectId) -> f64 {
        self.balances
            .lock()
            .unwrap()
            .get(&subject)
            .copied()
            .unwrap_or(0.0)
    }
}

impl EconomyPort for Wallet {
    fn has_balance(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        self.balance_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance(subject) >= amount)
    }

    fn withdraw(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        self.withdrawals.fetch_add(1, Ordering::SeqCst);
        if self.reject_withdrawals.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(subject).or_insert(0.0);
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        Ok(true)
    }

    fn deposit(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        *self.balances.lock().unwrap().entry(subject).or_insert(0.0) += amount;
        Ok(true)
    }
}

/// Once-flag store whose reads can be made to fail.
#[derive(Default)]
pub struct FlakyFlags {
    used: Mutex<HashSet<SubjectId>>,
    pub fail_reads: AtomicBool,
}

impl OnceFlagStore for FlakyFlags {
    fn has_used(&self, subject: SubjectId) -> Result<bool, PortError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("flag store offline".to_string()));
        }
        Ok(self.used.lock().unwrap().contains(&subject))
    }

    fn mark_used(&self, subject: SubjectId) -> Result<(), PortError> {
        self.used.lock().unwrap().insert(subject);
        Ok(())
    }
}

#[derive(Default)]
pub struct Inbox {
    pub notices: Mutex<Vec<(Requester, Notice)>>,
}

impl Inbox {
    pub fn keys_for(&self, to: Requester) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == to)
            .map(|(_, n)| n.key.clone())
            .collect()
    }
}

impl Notifier for Inbox {
    fn deliver(&self, to: Requester, notice: &Notice) {
        self.notices.lock().unwrap().push((to, notice.clone()));
    }
}

pub fn sqlite_flags() -> Arc<SqliteOnceFlagStore> {
    let pool = open_database(
        ":memory:",
        DbRuntimeSettings {
            busy_timeout_ms: 1_000,
            pool_max_size: 1,
        },
    )
    .expect("in-memory database");
    Arc::new(SqliteOnceFlagStore::new(pool))
}

/// A fully wired orchestrator over the fakes above.
pub struct Harness {
    pub terrain: Arc<dyn TerrainOracle>,
    pub grants: Arc<Grants>,
    pub players: Arc<Players>,
    pub wallet: Arc<Wallet>,
    pub inbox: Arc<Inbox>,
    pub orchestrator: Arc<RtpOrchestrator>,
}

impl Harness {
    /// Must be called inside a tokio runtime.
    pub fn new(settings: RtpSettings) -> Self {
        Self::with_flags(settings, sqlite_flags())
    }

    pub fn with_flags(settings: RtpSettings, flags: Arc<dyn OnceFlagStore>) -> Self {
        Self::build(settings, flags, Arc::new(FlatTerrain::new(64)), true)
    }

    pub fn build(
        settings: RtpSettings,
        flags: Arc<dyn OnceFlagStore>,
        terrain: Arc<dyn TerrainOracle>,
        with_economy: bool,
    ) -> Self {
        let grants = Arc::new(Grants::default());
        let players = Arc::new(Players::default());
        let wallet = Arc::new(Wallet::default());
        let inbox = Arc::new(Inbox::default());

        let ports = Ports {
            terrain: terrain.clone(),
            permissions: grants.clone(),
            players: players.clone(),
            once_flags: flags,
            notifier: inbox.clone(),
        };
        let (commits, _worker) = CommitQueue::start();
        let mut orchestrator =
            RtpOrchestrator::new(ports, settings, commits).with_rng(StdRng::seed_from_u64(0x5eed));
        if with_economy {
            orchestrator = orchestrator.with_economy(wallet.clone());
        }

        Self {
            terrain,
            grants,
            players,
            wallet,
            inbox,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
