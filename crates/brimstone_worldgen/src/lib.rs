//! # Brimstone World Generation
//!
//! Deterministic chunk synthesis for an underworld voxel dimension.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and catalog always produce the same chunk
//! 2. **Order-free**: A chunk never depends on which chunks were built before it
//! 3. **Shareable**: One driver serves any number of generation threads
//!
//! ## Core Components
//!
//! - `CoherentField2D` / `CoherentField3D`: seeded value-noise fields
//! - `BiomeCatalog`: registered biomes keyed by (hardness, infection)
//! - `VoronoiBiomeField`: jittered-grid biome map over (x, z)
//! - `ColumnSynthesizer`: height, density and material of one column
//! - `ChunkSynthesisDriver`: fills a 16x16 chunk and records its biomes
//!
//! ## Example
//!
//! ```rust
//! use brimstone_worldgen::{ChunkCoord, ChunkSynthesisDriver, Material, WorldgenConfig};
//!
//! let driver = ChunkSynthesisDriver::from_config(&WorldgenConfig::default()).unwrap();
//! let chunk = driver.generate(ChunkCoord::new(0, 0));
//!
//! assert_eq!(chunk.grid().get(0, 0, 0), Material::BEDROCK);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod chunk;
pub mod column;
pub mod config;
pub mod error;
pub mod material;
pub mod noise;
pub mod voronoi;

pub use biome::{BiomeCatalog, BiomeDefinition, BiomeId, Classification};
pub use chunk::{
    ChunkCoord, ChunkGrid, ChunkSynthesisDriver, SynthesizedChunk, CHUNK_SIZE, COLUMNS_PER_CHUNK,
};
pub use column::{ColumnInfo, ColumnSynthesizer, TerrainShape};
pub use config::{BiomeConfig, MaterialRef, TerrainConfig, VoronoiConfig, WorldgenConfig};
pub use error::{WorldgenError, WorldgenResult};
pub use material::Material;
pub use noise::{CoherentField2D, CoherentField3D, SeedSequence, WorldSeed};
pub use voronoi::{rescale, Epicenter, VoronoiBiomeField};
