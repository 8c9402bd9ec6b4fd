//! # Worldgen Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document describes the reference world:
//!
//! ```toml
//! seed = 12345
//!
//! [terrain]
//! sea_level = 48
//! void_fill = "pain"
//!
//! [voronoi]
//! cell_scale = 144.0
//!
//! [[biomes]]
//! id = 0
//! name = "bridges"
//! hardness = 0.25
//! infection = 0.25
//! density_core = "soul_sand"
//! ```
//!
//! Materials may be given by built-in name or by raw numeric id.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biome::{BiomeCatalog, BiomeDefinition};
use crate::column::TerrainShape;
use crate::error::{WorldgenError, WorldgenResult};
use crate::material::Material;
use crate::noise::WorldSeed;

/// A material named in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialRef {
    /// Raw material id.
    Id(u16),
    /// Built-in material name.
    Name(String),
}

impl MaterialRef {
    /// Resolves to a concrete material.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::InvalidConfig`] for an unknown name.
    pub fn resolve(&self) -> WorldgenResult<Material> {
        match self {
            Self::Id(id) => Ok(Material::new(*id)),
            Self::Name(name) => Material::from_name(name)
                .ok_or_else(|| WorldgenError::InvalidConfig(format!("unknown material '{name}'"))),
        }
    }
}

impl From<Material> for MaterialRef {
    fn from(material: Material) -> Self {
        match material.name() {
            Some(name) => Self::Name(name.to_string()),
            None => Self::Id(material.id()),
        }
    }
}

fn default_netherrack() -> MaterialRef {
    Material::NETHERRACK.into()
}

/// Vertical layout and noise scales.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Total vertical extent.
    pub world_height: u32,
    /// Carved space below this level is flooded.
    pub sea_level: u32,
    /// Constant added to every column height.
    pub base_level: f64,
    /// Level above which density tapers to zero.
    pub taper_start: u32,
    /// Blocks per lattice step of the coarse height octave.
    pub height_coarse_scale: f64,
    /// Blocks per lattice step of the fine height octave.
    pub height_fine_scale: f64,
    /// Blocks per lattice step of the coarse density octave.
    pub density_coarse_scale: f64,
    /// Blocks per lattice step of the fine density octave.
    pub density_fine_scale: f64,
    /// Material flooding carved space below sea level.
    pub void_fill: MaterialRef,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            world_height: 256,
            sea_level: 48,
            base_level: 16.0,
            taper_start: 200,
            height_coarse_scale: 64.0,
            height_fine_scale: 32.0,
            density_coarse_scale: 40.0,
            density_fine_scale: 20.0,
            void_fill: Material::PAIN.into(),
        }
    }
}

impl TerrainConfig {
    /// Resolves the vertical layout.
    ///
    /// # Errors
    ///
    /// Returns error if the void-fill material name is unknown.
    pub fn shape(&self) -> WorldgenResult<TerrainShape> {
        Ok(TerrainShape {
            world_height: self.world_height,
            sea_level: self.sea_level,
            base_level: self.base_level,
            taper_start: self.taper_start,
            void_fill: self.void_fill.resolve()?,
        })
    }
}

/// Voronoi grid parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// Map blocks per grid cell.
    pub cell_scale: f64,
    /// Grid cells per climate lattice step.
    pub climate_scale: f64,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            cell_scale: 144.0,
            climate_scale: 2.0,
        }
    }
}

/// One biome entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeConfig {
    /// Unique identifier.
    pub id: u16,
    /// Display name.
    pub name: String,
    /// Hardness classification coordinate.
    pub hardness: f64,
    /// Infection classification coordinate.
    pub infection: f64,
    /// Terrain height scalar.
    #[serde(default = "default_biome_height")]
    pub height: f64,
    /// Density scalar.
    #[serde(default = "default_biome_density")]
    pub density: f64,
    /// Surface material.
    #[serde(default = "default_netherrack")]
    pub surface: MaterialRef,
    /// Terrain fill material.
    #[serde(default = "default_netherrack")]
    pub fill: MaterialRef,
    /// Outer material of floating masses.
    #[serde(default = "default_netherrack")]
    pub density_surface: MaterialRef,
    /// Inner material of floating masses.
    #[serde(default = "default_netherrack")]
    pub density_core: MaterialRef,
    /// Blocks below the column top that use the surface material.
    #[serde(default = "default_surface_depth")]
    pub surface_depth: u32,
}

fn default_biome_height() -> f64 {
    BiomeDefinition::DEFAULT_HEIGHT
}

fn default_biome_density() -> f64 {
    BiomeDefinition::DEFAULT_DENSITY
}

fn default_surface_depth() -> u32 {
    1
}

impl BiomeConfig {
    /// Converts into a definition.
    ///
    /// # Errors
    ///
    /// Returns error if a material name is unknown.
    pub fn to_definition(&self) -> WorldgenResult<BiomeDefinition> {
        Ok(
            BiomeDefinition::new(self.id, self.name.clone(), self.hardness, self.infection)
                .with_height(self.height)
                .with_density(self.density)
                .with_surface(self.surface.resolve()?)
                .with_fill(self.fill.resolve()?)
                .with_density_surface(self.density_surface.resolve()?)
                .with_density_core(self.density_core.resolve()?)
                .with_surface_depth(self.surface_depth),
        )
    }
}

impl From<&BiomeDefinition> for BiomeConfig {
    fn from(biome: &BiomeDefinition) -> Self {
        Self {
            id: biome.id.0,
            name: biome.name.clone(),
            hardness: biome.classification.hardness,
            infection: biome.classification.infection,
            height: biome.height,
            density: biome.density,
            surface: biome.surface.into(),
            fill: biome.fill.into(),
            density_surface: biome.density_surface.into(),
            density_core: biome.density_core.into(),
            surface_depth: biome.surface_depth,
        }
    }
}

/// Complete world generation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldgenConfig {
    /// World seed.
    pub seed: i64,
    /// Vertical layout and noise scales.
    pub terrain: TerrainConfig,
    /// Voronoi grid parameters.
    pub voronoi: VoronoiConfig,
    /// Biomes in registration order; empty means the reference catalog.
    pub biomes: Vec<BiomeConfig>,
}

impl Default for WorldgenConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            terrain: TerrainConfig::default(),
            voronoi: VoronoiConfig::default(),
            biomes: Vec::new(),
        }
    }
}

impl WorldgenConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or fails validation.
    pub fn from_toml_str(source: &str) -> WorldgenResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| WorldgenError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> WorldgenResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| WorldgenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml_string(&self) -> WorldgenResult<String> {
        toml::to_string_pretty(self).map_err(|e| WorldgenError::InvalidConfig(e.to_string()))
    }

    /// The world seed.
    #[must_use]
    pub fn world_seed(&self) -> WorldSeed {
        WorldSeed::from(self.seed)
    }

    /// Checks every startup-time invariant.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or invariant failure found.
    pub fn validate(&self) -> WorldgenResult<()> {
        self.terrain.shape()?.validate()?;

        let scales = [
            ("coarse height", self.terrain.height_coarse_scale),
            ("fine height", self.terrain.height_fine_scale),
            ("coarse density", self.terrain.density_coarse_scale),
            ("fine density", self.terrain.density_fine_scale),
            ("Voronoi cell", self.voronoi.cell_scale),
            ("climate", self.voronoi.climate_scale),
        ];
        for (what, scale) in scales {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(WorldgenError::InvalidScale { what, scale });
            }
        }

        self.build_catalog().map(|_| ())
    }

    /// Builds the biome catalog described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a biome entry is invalid.
    pub fn build_catalog(&self) -> WorldgenResult<BiomeCatalog> {
        if self.biomes.is_empty() {
            return Ok(BiomeCatalog::reference());
        }

        let mut catalog = BiomeCatalog::new();
        for entry in &self.biomes {
            catalog.register(entry.to_definition()?)?;
        }
        Ok(catalog)
    }
}
