//! # Column Synthesis
//!
//! Turns one (x, z) column into materials.
//!
//! 1. The Voronoi field picks the biome.
//! 2. Two filtered height octaves give the column height.
//! 3. Two 3D density octaves, tapered towards the ceiling, decide what is
//!    solid. Inside the column a low density carves caves; above it a high
//!    density builds floating masses.
//!
//! Carved space below sea level is flooded with the void-fill material.

use std::f64::consts::FRAC_PI_2;

use crate::biome::{BiomeDefinition, BiomeId};
use crate::config::TerrainConfig;
use crate::error::{WorldgenError, WorldgenResult};
use crate::material::Material;
use crate::noise::{CoherentField2D, CoherentField3D, SeedSequence};
use crate::voronoi::VoronoiBiomeField;

/// Density above which terrain inside the column stays solid.
pub const TERRAIN_SOLID_THRESHOLD: f64 = 0.1;

/// Density above which open space above the column becomes solid.
pub const DENSITY_SOLID_THRESHOLD: f64 = 0.5;

/// Vertical layout shared by every column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainShape {
    /// Total vertical extent `H`.
    pub world_height: u32,
    /// Carved space below this level is flooded.
    pub sea_level: u32,
    /// Height offset added before the noise octaves.
    pub base_level: f64,
    /// Density is attenuated above this level.
    pub taper_start: u32,
    /// Material flooding carved space below sea level.
    pub void_fill: Material,
}

impl TerrainShape {
    /// Checks the layout constants against each other.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::InvalidHeightBand`] if the world is shorter than
    /// two blocks, the taper does not start below the ceiling, or sea level is
    /// above the ceiling.
    pub fn validate(&self) -> WorldgenResult<()> {
        if self.world_height < 2
            || self.taper_start >= self.world_height
            || self.sea_level > self.world_height
        {
            return Err(WorldgenError::InvalidHeightBand {
                world_height: self.world_height,
                taper_start: self.taper_start,
                sea_level: self.sea_level,
            });
        }
        if !self.base_level.is_finite() {
            return Err(WorldgenError::InvalidConfig(format!(
                "base level must be finite, got {}",
                self.base_level
            )));
        }
        Ok(())
    }

    /// Density multiplier at level `y`.
    ///
    /// 1.0 up to `taper_start`, then `cos(progress * PI / 2)` where `progress`
    /// runs from 0 at the threshold to 1 at the ceiling.
    #[inline]
    #[must_use]
    pub fn taper_factor(&self, y: u32) -> f64 {
        if y <= self.taper_start {
            return 1.0;
        }
        let band = f64::from(self.world_height - self.taper_start);
        let progress = f64::from(y - self.taper_start) / band;
        (progress * FRAC_PI_2).cos()
    }

    /// Applies the ceiling taper and the upper clamp to a raw density.
    #[inline]
    #[must_use]
    pub fn shape_density(&self, raw: f64, y: u32) -> f64 {
        (raw * self.taper_factor(y)).min(1.0)
    }
}

/// Summary of one synthesized column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Biome the column was built with.
    pub biome: BiomeId,
    /// Terrain column height before density carving.
    pub height: i32,
}

/// Per-column height and density synthesizer.
#[derive(Clone, Debug)]
pub struct ColumnSynthesizer {
    height_coarse: CoherentField2D,
    height_fine: CoherentField2D,
    density_coarse: CoherentField3D,
    density_fine: CoherentField3D,
    shape: TerrainShape,
}

impl ColumnSynthesizer {
    /// Builds the synthesizer, drawing four field seeds from `seeds`.
    ///
    /// Draw order: coarse height, fine height, coarse density, fine density.
    ///
    /// # Errors
    ///
    /// Returns error if the layout is inconsistent or any scale is invalid.
    pub fn new(seeds: &mut SeedSequence, config: &TerrainConfig) -> WorldgenResult<Self> {
        let shape = config.shape()?;
        shape.validate()?;

        Ok(Self {
            height_coarse: CoherentField2D::new(seeds.next_seed(), config.height_coarse_scale)?,
            height_fine: CoherentField2D::new(seeds.next_seed(), config.height_fine_scale)?,
            density_coarse: CoherentField3D::new(seeds.next_seed(), config.density_coarse_scale)?,
            density_fine: CoherentField3D::new(seeds.next_seed(), config.density_fine_scale)?,
            shape,
        })
    }

    /// The vertical layout.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> &TerrainShape {
        &self.shape
    }

    /// Terrain column height at (x, z) for `biome`, truncated toward zero.
    #[must_use]
    pub fn column_height(&self, biome: &BiomeDefinition, x: i64, z: i64) -> i32 {
        let high = biome.height / 4.0;
        let low = biome.height - high;

        let mut cell = self.shape.base_level;
        cell += self.height_coarse.sample_filtered(x, z) * low;
        cell += self.height_fine.sample_filtered(x, z) * high;
        cell as i32
    }

    /// Untapered density at a voxel.
    ///
    /// The coarse octave contributes up to 75% of the biome's scalar; the fine
    /// octave adds a signed perturbation of up to 12.5%.
    #[inline]
    #[must_use]
    pub fn raw_density(&self, biome: &BiomeDefinition, x: i64, y: i64, z: i64) -> f64 {
        let coarse = self.density_coarse.sample(x, y, z) * (biome.density * 0.75);
        let fine = (self.density_fine.sample(x, y, z) - 0.5) * (biome.density * 0.25);
        coarse + fine
    }

    /// Density at a voxel after tapering and clamping.
    #[inline]
    #[must_use]
    pub fn density(&self, biome: &BiomeDefinition, x: i64, y: u32, z: i64) -> f64 {
        let raw = self.raw_density(biome, x, i64::from(y), z);
        self.shape.shape_density(raw, y)
    }

    /// Chooses the material for level `y > 0` of a column.
    #[must_use]
    pub fn classify(
        &self,
        biome: &BiomeDefinition,
        y: u32,
        column_height: i32,
        density: f64,
    ) -> Material {
        let level = i64::from(y);
        let solid = if level <= i64::from(column_height) {
            (density > TERRAIN_SOLID_THRESHOLD)
                .then(|| biome.terrain_material((i64::from(column_height) - level) as i32))
        } else {
            (density > DENSITY_SOLID_THRESHOLD)
                .then(|| biome.density_material((density - DENSITY_SOLID_THRESHOLD) * 2.0))
        };

        match solid {
            Some(material) => material,
            None if y < self.shape.sea_level => self.shape.void_fill,
            None => Material::EMPTY,
        }
    }

    /// Fills `column` (indexed by y) for the world column at (x, z).
    ///
    /// Level 0 is always bedrock. The topmost level is left untouched.
    pub fn synthesize(
        &self,
        field: &VoronoiBiomeField,
        x: i64,
        z: i64,
        column: &mut [Material],
    ) -> ColumnInfo {
        let biome = field.resolve(x, z);
        let height = self.column_height(biome, x, z);

        let top = (self.shape.world_height - 1).min(column.len() as u32);
        for y in 0..top {
            column[y as usize] = if y == 0 {
                Material::BEDROCK
            } else {
                let density = self.density(biome, x, y, z);
                self.classify(biome, y, height, density)
            };
        }

        ColumnInfo {
            biome: biome.id,
            height,
        }
    }
}
