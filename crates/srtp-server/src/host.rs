//! SQLite-backed host adapters for running the orchestrator standalone.

use rusqlite::{params, Connection, OptionalExtension};
use srtp_core::{EconomyPort, Notice, Notifier, PermissionOracle, PlayerRegistry, PortError, TerrainOracle};
use srtp_db::DbPool;
use srtp_types::{
    BlockClass, BlockPos, Location, Requester, Subject, SubjectId, TeleportSound, WorldInfo,
};
use std::collections::HashMap;

use crate::config::WorldConfig;

fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Location)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        Location::new(
            row.get::<_, String>(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ),
    ))
}

fn to_subject((id, name, location): (String, String, Location)) -> Option<Subject> {
    match id.parse() {
        Ok(id) => Some(Subject { id, name, location }),
        Err(e) => {
            tracing::warn!(subject_id = %id, error = %e, "skipping player row with malformed id");
            None
        }
    }
}

/// Inserts or refreshes an online player.
///
/// # Errors
///
/// Fails on database errors, including a name already taken by another id.
pub fn upsert_player(
    conn: &Connection,
    id: SubjectId,
    name: &str,
    location: &Location,
) -> Result<(), PortError> {
    conn.execute(
        "INSERT INTO players (subject_id, name, world, x, y, z, online, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, datetime('now'))
         ON CONFLICT(subject_id) DO UPDATE SET
            name = excluded.name, world = excluded.world,
            x = excluded.x, y = excluded.y, z = excluded.z,
            online = 1, updated_at = excluded.updated_at",
        params![
            id.to_string(),
            name,
            location.world,
            location.x,
            location.y,
            location.z
        ],
    )?;
    Ok(())
}

/// Marks a player offline. Returns whether the player was known.
pub fn set_offline(conn: &Connection, id: SubjectId) -> Result<bool, PortError> {
    let changed = conn.execute(
        "UPDATE players SET online = 0, updated_at = datetime('now') WHERE subject_id = ?1",
        params![id.to_string()],
    )?;
    Ok(changed > 0)
}

/// Replaces every grant held by `id`.
pub fn replace_grants(conn: &mut Connection, id: SubjectId, grants: &[String]) -> Result<(), PortError> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM subject_grants WHERE subject_id = ?1",
        params![id.to_string()],
    )?;
    for grant in grants {
        tx.execute(
            "INSERT OR IGNORE INTO subject_grants (subject_id, grant_name) VALUES (?1, ?2)",
            params![id.to_string(), grant],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Sets an account balance, creating the account if needed.
pub fn set_balance(conn: &Connection, id: SubjectId, balance: f64) -> Result<(), PortError> {
    conn.execute(
        "INSERT INTO economy_accounts (subject_id, balance, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(subject_id) DO UPDATE SET
            balance = excluded.balance, updated_at = excluded.updated_at",
        params![id.to_string(), balance],
    )?;
    Ok(())
}

pub fn balance(conn: &Connection, id: SubjectId) -> Result<f64, PortError> {
    let balance = conn
        .query_row(
            "SELECT balance FROM economy_accounts WHERE subject_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(balance.unwrap_or(0.0))
}

/// Player presence and positions in the `players` table.
#[derive(Clone)]
pub struct SqlitePlayers {
    pool: DbPool,
}

impl SqlitePlayers {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn lookup(&self, sql: &str, key: &str) -> Option<Subject> {
        let found = self.pool.get().map_err(PortError::from).and_then(|conn| {
            conn.query_row(sql, params![key], subject_from_row)
                .optional()
                .map_err(PortError::from)
        });
        match found {
            Ok(row) => row.and_then(to_subject),
            Err(e) => {
                tracing::warn!(error = %e, "player lookup failed");
                None
            }
        }
    }
}

impl PlayerRegistry for SqlitePlayers {
    fn online(&self, id: SubjectId) -> Option<Subject> {
        self.lookup(
            "SELECT subject_id, name, world, x, y, z FROM players
             WHERE subject_id = ?1 AND online = 1",
            &id.to_string(),
        )
    }

    fn online_by_name(&self, name: &str) -> Option<Subject> {
        self.lookup(
            "SELECT subject_id, name, world, x, y, z FROM players
             WHERE name = ?1 COLLATE NOCASE AND online = 1",
            name,
        )
    }

    fn teleport(&self, id: SubjectId, to: &Location) -> Result<(), PortError> {
        let conn = self.pool.get()?;
        let moved = conn.execute(
            "UPDATE players SET world = ?1, x = ?2, y = ?3, z = ?4, updated_at = datetime('now')
             WHERE subject_id = ?5 AND online = 1",
            params![to.world, to.x, to.y, to.z, id.to_string()],
        )?;
        if moved == 0 {
            return Err(PortError::Offline(id));
        }
        Ok(())
    }

    fn play_sound(&self, id: SubjectId, sound: TeleportSound) {
        tracing::info!(subject = %id, sound = sound.key(), "playing sound");
    }
}

/// Flat grants in the `subject_grants` table.
#[derive(Clone)]
pub struct SqliteGrants {
    pool: DbPool,
}

impl SqliteGrants {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PermissionOracle for SqliteGrants {
    fn has(&self, subject: SubjectId, grant: &str) -> bool {
        let held = self.pool.get().map_err(PortError::from).and_then(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM subject_grants WHERE subject_id = ?1 AND grant_name = ?2)",
                params![subject.to_string(), grant],
                |row| row.get::<_, bool>(0),
            )
            .map_err(PortError::from)
        });
        held.unwrap_or_else(|e| {
            // Deny on failure.
            tracing::warn!(subject = %subject, grant, error = %e, "grant lookup failed");
            false
        })
    }
}

/// Built-in ledger in the `economy_accounts` table.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EconomyPort for SqliteLedger {
    fn has_balance(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        let conn = self.pool.get()?;
        Ok(balance(&conn, subject)? >= amount)
    }

    fn withdraw(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE economy_accounts
             SET balance = balance - ?1, updated_at = datetime('now')
             WHERE subject_id = ?2 AND balance >= ?1",
            params![amount, subject.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn deposit(&self, subject: SubjectId, amount: f64) -> Result<bool, PortError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO economy_accounts (subject_id, balance, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(subject_id) DO UPDATE SET
                balance = balance + excluded.balance, updated_at = excluded.updated_at",
            params![subject.to_string(), amount],
        )?;
        Ok(true)
    }
}

/// Horizontally uniform terrain per world.
pub struct SuperflatTerrain {
    worlds: HashMap<String, WorldConfig>,
}

impl SuperflatTerrain {
    pub fn new(worlds: &[WorldConfig]) -> Self {
        Self {
            worlds: worlds.iter().map(|w| (w.name.clone(), w.clone())).collect(),
        }
    }

    fn world(&self, world: &WorldInfo) -> Result<&WorldConfig, PortError> {
        self.worlds
            .get(&world.name)
            .ok_or_else(|| PortError::UnknownWorld(world.name.clone()))
    }
}

impl TerrainOracle for SuperflatTerrain {
    fn world_info(&self, world: &str) -> Option<WorldInfo> {
        self.worlds.get(world).map(|w| WorldInfo {
            name: w.name.clone(),
            kind: w.kind,
            min_height: w.min_height,
            max_height: w.max_height,
        })
    }

    fn highest_solid_y(&self, world: &WorldInfo, _x: i32, _z: i32) -> Result<i32, PortError> {
        let w = self.world(world)?;
        if w.surface.is_solid() {
            Ok(w.surface_y)
        } else {
            Ok(w.min_height)
        }
    }

    fn block_class(&self, world: &WorldInfo, pos: BlockPos) -> Result<BlockClass, PortError> {
        let w = self.world(world)?;
        Ok(if pos.y < w.min_height || pos.y >= w.max_height {
            BlockClass::Air
        } else if pos.y <= w.surface_y {
            w.surface
        } else {
            w.fill
        })
    }
}

/// Writes deliveries to the log instead of a game client.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, to: Requester, notice: &Notice) {
        tracing::info!(
            to = ?to,
            key = %notice.key,
            channel = ?notice.channel,
            text = %notice.text,
            "notice"
        );
    }
}
