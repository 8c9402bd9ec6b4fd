//! # Voronoi Biome Field
//!
//! Jittered-grid Voronoi classification over the (x, z) plane.
//!
//! The map is divided into square grid cells `cell_scale` blocks wide. Every
//! cell owns one epicenter, placed anywhere inside the cell by a hash of
//! `(epicenter_base, grid_x, grid_z)`. The epicenter's biome comes from two
//! climate fields sampled at the cell's grid coordinate. A map position
//! belongs to the nearest of the nine epicenters around its cell.
//!
//! Nothing is cached: each query rebuilds its nine epicenters. Epicenters are
//! a pure function of their grid cell, so results never depend on query order.

use std::array;

use crate::biome::{BiomeCatalog, BiomeDefinition, BiomeId};
use crate::error::{WorldgenError, WorldgenResult};
use crate::noise::{lattice_hash, unit_interval, CoherentField2D, SeedSequence, WorldSeed};

/// Converts a map coordinate into continuous grid units.
///
/// The floor of the result is the grid cell, so negative coordinates fall into
/// negative cells: `rescale(-1, 16.0)` is `-0.0625`, in cell `-1`.
#[inline]
#[must_use]
pub fn rescale(coord: i64, scale: f64) -> f64 {
    coord as f64 / scale
}

/// One jittered grid point with its assigned biome.
#[derive(Clone, Copy, Debug)]
pub struct Epicenter<'a> {
    /// Grid cell X.
    pub grid_x: i64,
    /// Grid cell Z.
    pub grid_z: i64,
    /// Jitter within the cell along X, in [0, 1).
    pub fraction_x: f64,
    /// Jitter within the cell along Z, in [0, 1).
    pub fraction_z: f64,
    /// Biome assigned to this cell.
    pub biome: &'a BiomeDefinition,
}

impl Epicenter<'_> {
    /// Exact position in grid units.
    #[inline]
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (
            self.grid_x as f64 + self.fraction_x,
            self.grid_z as f64 + self.fraction_z,
        )
    }

    /// Squared distance, in grid units, to a rescaled point.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, x: f64, z: f64) -> f64 {
        let (cx, cz) = self.position();
        let dx = cx - x;
        let dz = cz - z;
        dx * dx + dz * dz
    }
}

/// Spatial biome classifier.
#[derive(Clone, Debug)]
pub struct VoronoiBiomeField {
    climate_a: CoherentField2D,
    climate_b: CoherentField2D,
    epicenter_base: u64,
    cell_scale: f64,
    catalog: BiomeCatalog,
}

impl VoronoiBiomeField {
    /// Builds a field over a populated catalog.
    ///
    /// `cell_scale` is in map blocks per grid cell; `climate_scale` is in grid
    /// cells per climate lattice step.
    ///
    /// # Errors
    ///
    /// Returns error if either scale is not positive and finite, or the
    /// catalog is empty.
    pub fn new(
        seed: WorldSeed,
        cell_scale: f64,
        climate_scale: f64,
        catalog: BiomeCatalog,
    ) -> WorldgenResult<Self> {
        if !(cell_scale.is_finite() && cell_scale > 0.0) {
            return Err(WorldgenError::InvalidScale {
                what: "Voronoi cell",
                scale: cell_scale,
            });
        }
        catalog.ensure_not_empty()?;

        let mut seeds = SeedSequence::new(seed);
        let epicenter_base = seeds.next_seed().value();
        let climate_a = CoherentField2D::new(seeds.next_seed(), climate_scale)?;
        let climate_b = CoherentField2D::new(seeds.next_seed(), climate_scale)?;

        Ok(Self {
            climate_a,
            climate_b,
            epicenter_base,
            cell_scale,
            catalog,
        })
    }

    /// Map blocks per grid cell.
    #[inline]
    #[must_use]
    pub const fn cell_scale(&self) -> f64 {
        self.cell_scale
    }

    /// The catalog epicenters draw their biomes from.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }

    /// Rebinds catalog slots holding `old`; see [`BiomeCatalog::replace`].
    ///
    /// This is the only mutation the field allows. Slots are never removed,
    /// so the catalog stays as large as it was at construction.
    ///
    /// # Errors
    ///
    /// Returns error if no slot holds `old` or the replacement is rejected.
    pub fn replace_biome(
        &mut self,
        old: BiomeId,
        replacement: &BiomeDefinition,
    ) -> WorldgenResult<usize> {
        self.catalog.replace(old, replacement)
    }

    /// Grid cell containing a map position.
    #[inline]
    #[must_use]
    pub fn cell_of(&self, x: i64, z: i64) -> (i64, i64) {
        (
            rescale(x, self.cell_scale).floor() as i64,
            rescale(z, self.cell_scale).floor() as i64,
        )
    }

    /// Builds the epicenter of one grid cell.
    #[must_use]
    pub fn epicenter(&self, grid_x: i64, grid_z: i64) -> Epicenter<'_> {
        let fraction_x = unit_interval(lattice_hash(self.epicenter_base, grid_x, 0, grid_z));
        let fraction_z = unit_interval(lattice_hash(self.epicenter_base, grid_x, 1, grid_z));

        let hardness = self.climate_a.sample(grid_x, grid_z);
        let infection = self.climate_b.sample(grid_x, grid_z);
        // Non-empty since construction; slots are only ever rebound.
        let slot = self.catalog.nearest_slot(hardness, infection).unwrap_or(0);

        Epicenter {
            grid_x,
            grid_z,
            fraction_x,
            fraction_z,
            biome: self.catalog.slot_biome(slot),
        }
    }

    /// The nine epicenters around a map position, `dz` then `dx` ascending.
    #[must_use]
    pub fn epicenters_around(&self, x: i64, z: i64) -> [Epicenter<'_>; 9] {
        let (grid_x, grid_z) = self.cell_of(x, z);
        array::from_fn(|i| {
            let dx = (i % 3) as i64 - 1;
            let dz = (i / 3) as i64 - 1;
            self.epicenter(grid_x.wrapping_add(dx), grid_z.wrapping_add(dz))
        })
    }

    /// Resolves the biome at a map position.
    #[must_use]
    pub fn resolve(&self, x: i64, z: i64) -> &BiomeDefinition {
        let px = rescale(x, self.cell_scale);
        let pz = rescale(z, self.cell_scale);

        let centers = self.epicenters_around(x, z);
        let mut best = &centers[0];
        let mut best_distance = best.distance_squared(px, pz);
        for center in &centers[1..] {
            let distance = center.distance_squared(px, pz);
            if distance < best_distance {
                best = center;
                best_distance = distance;
            }
        }

        best.biome
    }
}
