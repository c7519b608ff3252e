//! Random safe-location search.
//!
//! Samples columns uniformly inside a square region and accepts the first
//! candidate whose surroundings pass [`is_safe`]. The search is bounded by
//! [`MAX_ATTEMPTS`] height queries and never mutates anything.

use rand::Rng;
use srtp_types::{BlockPos, Location, WorldInfo, NETHER_ROOF_Y};

use crate::error::PortError;
use crate::ports::TerrainOracle;

/// Upper bound on sampled columns per search.
pub const MAX_ATTEMPTS: usize = 20;

/// Square search region, resolved once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub center_x: i32,
    pub center_z: i32,
    /// Half-width; negative values are treated as 0.
    pub radius: i32,
    pub world: WorldInfo,
}

impl RegionSpec {
    /// Inclusive `(min, max)` bounds on one axis.
    fn bounds(center: i32, radius: i32) -> (i32, i32) {
        let radius = radius.max(0);
        (center.saturating_sub(radius), center.saturating_add(radius))
    }

    pub fn x_bounds(&self) -> (i32, i32) {
        Self::bounds(self.center_x, self.radius)
    }

    pub fn z_bounds(&self) -> (i32, i32) {
        Self::bounds(self.center_z, self.radius)
    }
}

/// Result of validating one sampled column.
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyVerdict {
    Safe(Location),
    Unsafe,
}

/// Checks a standing position: solid, non-hazardous ground below; passable,
/// non-hazardous feet and head cells; head below the build limit.
///
/// # Errors
///
/// Propagates oracle faults.
pub fn is_safe(
    oracle: &dyn TerrainOracle,
    world: &WorldInfo,
    feet: BlockPos,
) -> Result<bool, PortError> {
    if feet.y.saturating_add(1) >= world.max_height {
        return Ok(false);
    }

    let below = oracle.block_class(world, feet.below())?;
    if !below.is_solid() || below.is_hazardous() {
        return Ok(false);
    }

    for cell in [feet, feet.above()] {
        let class = oracle.block_class(world, cell)?;
        if !class.is_passable() || class.is_hazardous() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Bounded random search for a safe standing position.
#[derive(Debug, Clone, Copy)]
pub struct SafeLocationFinder {
    max_attempts: usize,
}

impl Default for SafeLocationFinder {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl SafeLocationFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Validates the column `(x, z)`.
    ///
    /// # Errors
    ///
    /// Propagates oracle faults.
    pub fn evaluate(
        &self,
        oracle: &dyn TerrainOracle,
        world: &WorldInfo,
        x: i32,
        z: i32,
    ) -> Result<SafetyVerdict, PortError> {
        let highest = oracle.highest_solid_y(world, x, z)?;
        // Void columns, and heights an adapter should never report.
        if highest <= world.min_height || highest >= world.max_height {
            return Ok(SafetyVerdict::Unsafe);
        }

        let feet = BlockPos::new(x, highest + 1, z);
        if world.kind.has_roof() && feet.y > NETHER_ROOF_Y {
            return Ok(SafetyVerdict::Unsafe);
        }

        if !is_safe(oracle, world, feet)? {
            return Ok(SafetyVerdict::Unsafe);
        }

        Ok(SafetyVerdict::Safe(Location::new(
            world.name.clone(),
            f64::from(x) + 0.5,
            f64::from(feet.y),
            f64::from(z) + 0.5,
        )))
    }

    /// Samples up to `max_attempts` columns and returns the first safe one.
    ///
    /// Oracle faults discard the attempt; they still count toward the bound.
    pub fn find<R: Rng + ?Sized>(
        &self,
        region: &RegionSpec,
        oracle: &dyn TerrainOracle,
        rng: &mut R,
    ) -> Option<Location> {
        let (min_x, max_x) = region.x_bounds();
        let (min_z, max_z) = region.z_bounds();

        for attempt in 1..=self.max_attempts {
            let x = rng.gen_range(min_x..=max_x);
            let z = rng.gen_range(min_z..=max_z);

            match self.evaluate(oracle, &region.world, x, z) {
                Ok(SafetyVerdict::Safe(location)) => {
                    tracing::debug!(
                        world = %region.world.name,
                        attempt,
                        x,
                        z,
                        y = location.y,
                        "found safe location"
                    );
                    return Some(location);
                }
                Ok(SafetyVerdict::Unsafe) => {}
                Err(e) => {
                    tracing::warn!(world = %region.world.name, x, z, error = %e, "terrain query failed");
                }
            }
        }

        tracing::debug!(
            world = %region.world.name,
            attempts = self.max_attempts,
            "no safe location found"
        );
        None
    }
}
