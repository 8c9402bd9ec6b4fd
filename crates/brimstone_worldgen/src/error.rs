//! # Worldgen Error Types
//!
//! Every error here is a startup-time failure. Once a driver has been built,
//! sampling, biome resolution and column synthesis are total.

use std::path::PathBuf;

use thiserror::Error;

use crate::biome::BiomeId;

/// Errors that can occur while configuring world generation.
#[derive(Error, Debug)]
pub enum WorldgenError {
    /// A biome lookup was attempted with no biomes registered.
    #[error("biome catalog is empty")]
    EmptyCatalog,

    /// A biome's classification coordinates are outside [0, 1].
    #[error("biome '{name}' has classification ({hardness}, {infection}) outside [0, 1]")]
    ClassificationOutOfRange {
        /// Display name of the offending biome.
        name: String,
        /// Hardness coordinate as given.
        hardness: f64,
        /// Infection coordinate as given.
        infection: f64,
    },

    /// Two biomes were registered under the same identifier.
    #[error("biome id {0} is already registered")]
    DuplicateBiomeId(BiomeId),

    /// A replacement named a biome no catalog slot holds.
    #[error("biome id {0} is not registered")]
    UnknownBiome(BiomeId),

    /// A noise field or Voronoi grid was given an unusable scale.
    #[error("{what} scale must be positive and finite, got {scale}")]
    InvalidScale {
        /// Which scale was rejected.
        what: &'static str,
        /// The rejected value.
        scale: f64,
    },

    /// The vertical layout constants are inconsistent.
    #[error(
        "invalid height band: world height {world_height}, taper start {taper_start}, sea level {sea_level}"
    )]
    InvalidHeightBand {
        /// Total vertical extent.
        world_height: u32,
        /// Level above which density is attenuated.
        taper_start: u32,
        /// Sea level threshold.
        sea_level: u32,
    },

    /// A configuration source was malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A persisted chunk payload could not be decoded.
    #[error("corrupt chunk data: {0}")]
    CorruptChunk(String),
}

/// Result type for worldgen setup operations.
pub type WorldgenResult<T> = Result<T, WorldgenError>;
