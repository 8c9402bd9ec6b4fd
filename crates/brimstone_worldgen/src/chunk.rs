//! # Chunk Synthesis
//!
//! A chunk is a 16x16 tile of columns spanning the full world height. The
//! driver synthesizes every column, records the biome and height of each,
//! and hands the finished grid to whatever runs next (feature placement,
//! lighting, persistence).
//!
//! ## Storage
//!
//! [`SynthesizedChunk::encode`] produces an LZ4-compressed, size-prepended
//! payload: world height (`u32` LE), the 256 biome ids, the 256 column
//! heights, then the material grid in column order.

use bytemuck::pod_read_unaligned;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use tracing::{info, instrument, trace};

use crate::biome::{BiomeCatalog, BiomeDefinition, BiomeId};
use crate::column::{ColumnSynthesizer, TerrainShape};
use crate::config::WorldgenConfig;
use crate::error::{WorldgenError, WorldgenResult};
use crate::material::Material;
use crate::noise::{SeedSequence, WorldSeed};
use crate::voronoi::VoronoiBiomeField;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Columns per chunk.
pub const COLUMNS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_SIZE as i32),
            z: block_z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// Returns the world X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i64 {
        self.x as i64 * CHUNK_SIZE as i64
    }

    /// Returns the world Z coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i64 {
        self.z as i64 * CHUNK_SIZE as i64
    }
}

/// Dense material grid for one chunk.
///
/// Stored column by column (`[z][x][y]`) so each column is one contiguous
/// slice during synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkGrid {
    height: usize,
    materials: Vec<Material>,
}

impl ChunkGrid {
    /// Creates an empty grid `height` blocks tall.
    #[must_use]
    pub fn new(height: usize) -> Self {
        Self {
            height,
            materials: vec![Material::EMPTY; COLUMNS_PER_CHUNK * height],
        }
    }

    /// Vertical extent.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn column_start(&self, x: usize, z: usize) -> usize {
        (z * CHUNK_SIZE + x) * self.height
    }

    /// Gets a material at local coordinates; out of range reads as empty.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Material {
        if x < CHUNK_SIZE && y < self.height && z < CHUNK_SIZE {
            self.materials[self.column_start(x, z) + y]
        } else {
            Material::EMPTY
        }
    }

    /// Sets a material at local coordinates; out of range is ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, material: Material) {
        if x < CHUNK_SIZE && y < self.height && z < CHUNK_SIZE {
            let index = self.column_start(x, z) + y;
            self.materials[index] = material;
        }
    }

    /// One column, indexed by y.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `z` is 16 or more.
    #[inline]
    #[must_use]
    pub fn column(&self, x: usize, z: usize) -> &[Material] {
        let start = self.column_start(x, z);
        &self.materials[start..start + self.height]
    }

    /// One column, indexed by y, for writing.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `z` is 16 or more.
    #[inline]
    pub fn column_mut(&mut self, x: usize, z: usize) -> &mut [Material] {
        let start = self.column_start(x, z);
        &mut self.materials[start..start + self.height]
    }

    /// All materials in storage order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Material] {
        &self.materials
    }
}

/// A finished chunk plus its per-column bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesizedChunk {
    coord: ChunkCoord,
    grid: ChunkGrid,
    biomes: [BiomeId; COLUMNS_PER_CHUNK],
    heights: [i32; COLUMNS_PER_CHUNK],
    dominant_biome: BiomeId,
}

impl SynthesizedChunk {
    fn from_parts(
        coord: ChunkCoord,
        grid: ChunkGrid,
        biomes: [BiomeId; COLUMNS_PER_CHUNK],
        heights: [i32; COLUMNS_PER_CHUNK],
    ) -> Self {
        Self {
            coord,
            grid,
            dominant_biome: dominant(&biomes),
            biomes,
            heights,
        }
    }

    /// Chunk position in the world.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The material grid.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// The material grid, for feature carving.
    #[inline]
    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.grid
    }

    /// Gives up the bookkeeping and keeps the grid.
    #[must_use]
    pub fn into_grid(self) -> ChunkGrid {
        self.grid
    }

    /// Biome id per column, indexed `z * 16 + x`.
    #[inline]
    #[must_use]
    pub const fn biome_ids(&self) -> &[BiomeId; COLUMNS_PER_CHUNK] {
        &self.biomes
    }

    /// Biome id of one column.
    #[inline]
    #[must_use]
    pub fn biome_at(&self, x: usize, z: usize) -> BiomeId {
        self.biomes[z * CHUNK_SIZE + x]
    }

    /// Terrain height of one column, before density carving.
    #[inline]
    #[must_use]
    pub fn column_height(&self, x: usize, z: usize) -> i32 {
        self.heights[z * CHUNK_SIZE + x]
    }

    /// Most frequent biome; on a tie, the one seen first in z-then-x order.
    #[inline]
    #[must_use]
    pub const fn dominant_biome(&self) -> BiomeId {
        self.dominant_biome
    }

    /// Compresses the chunk for storage.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(Self::encoded_len(self.grid.height));
        raw.extend_from_slice(&(self.grid.height as u32).to_le_bytes());
        raw.extend_from_slice(bytemuck::cast_slice(&self.biomes[..]));
        raw.extend_from_slice(bytemuck::cast_slice(&self.heights[..]));
        raw.extend_from_slice(bytemuck::cast_slice(self.grid.as_slice()));
        compress_prepend_size(&raw)
    }

    /// Restores a chunk written by [`SynthesizedChunk::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::CorruptChunk`] if decompression fails or the
    /// payload size does not match its declared height.
    pub fn decode(coord: ChunkCoord, bytes: &[u8]) -> WorldgenResult<Self> {
        let raw = decompress_size_prepended(bytes)
            .map_err(|e| WorldgenError::CorruptChunk(e.to_string()))?;

        if raw.len() < 4 {
            return Err(WorldgenError::CorruptChunk("missing header".to_string()));
        }
        let height = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        if raw.len() != Self::encoded_len(height) {
            return Err(WorldgenError::CorruptChunk(format!(
                "expected {} bytes for height {height}, got {}",
                Self::encoded_len(height),
                raw.len()
            )));
        }

        let (biome_bytes, rest) = raw[4..].split_at(COLUMNS_PER_CHUNK * 2);
        let (height_bytes, grid_bytes) = rest.split_at(COLUMNS_PER_CHUNK * 4);

        let mut biomes = [BiomeId::default(); COLUMNS_PER_CHUNK];
        for (slot, bytes) in biomes.iter_mut().zip(biome_bytes.chunks_exact(2)) {
            *slot = pod_read_unaligned(bytes);
        }
        let mut heights = [0i32; COLUMNS_PER_CHUNK];
        for (slot, bytes) in heights.iter_mut().zip(height_bytes.chunks_exact(4)) {
            *slot = pod_read_unaligned(bytes);
        }
        let grid = ChunkGrid {
            height,
            materials: grid_bytes.chunks_exact(2).map(pod_read_unaligned).collect(),
        };

        Ok(Self::from_parts(coord, grid, biomes, heights))
    }

    const fn encoded_len(height: usize) -> usize {
        4 + COLUMNS_PER_CHUNK * (2 + 4) + COLUMNS_PER_CHUNK * height * 2
    }
}

fn dominant(biomes: &[BiomeId; COLUMNS_PER_CHUNK]) -> BiomeId {
    let mut counts: Vec<(BiomeId, u32)> = Vec::new();
    for &id in biomes {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id, 1)),
        }
    }

    let mut best = (biomes[0], 0);
    for &(id, count) in &counts {
        if count > best.1 {
            best = (id, count);
        }
    }
    best.0
}

/// Produces chunks from a seed, a terrain layout and a biome catalog.
///
/// Read-only after construction, so one driver can serve many threads.
#[derive(Clone, Debug)]
pub struct ChunkSynthesisDriver {
    seed: WorldSeed,
    columns: ColumnSynthesizer,
    biomes: VoronoiBiomeField,
}

impl ChunkSynthesisDriver {
    /// Builds a driver from a configuration, using its seed and catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn from_config(config: &WorldgenConfig) -> WorldgenResult<Self> {
        Self::new(config.world_seed(), config)
    }

    /// Builds a driver for `seed` using the configuration's catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(seed: WorldSeed, config: &WorldgenConfig) -> WorldgenResult<Self> {
        Self::with_catalog(seed, config, config.build_catalog()?)
    }

    /// Builds a driver over a catalog populated by the caller.
    ///
    /// Sub-seeds are drawn in a fixed order: four for the column octaves,
    /// then one for the Voronoi field.
    ///
    /// # Errors
    ///
    /// Returns error if the layout, any scale, or the catalog is invalid.
    pub fn with_catalog(
        seed: WorldSeed,
        config: &WorldgenConfig,
        catalog: BiomeCatalog,
    ) -> WorldgenResult<Self> {
        let mut seeds = SeedSequence::new(seed);
        let columns = ColumnSynthesizer::new(&mut seeds, &config.terrain)?;
        let biomes = VoronoiBiomeField::new(
            seeds.next_seed(),
            config.voronoi.cell_scale,
            config.voronoi.climate_scale,
            catalog,
        )?;

        info!(
            seed = seed.value(),
            biomes = biomes.catalog().len(),
            cell_scale = biomes.cell_scale(),
            world_height = columns.shape().world_height,
            "chunk synthesis driver ready"
        );

        Ok(Self {
            seed,
            columns,
            biomes,
        })
    }

    /// The world seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The vertical layout.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> &TerrainShape {
        self.columns.shape()
    }

    /// The biome catalog.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &BiomeCatalog {
        self.biomes.catalog()
    }

    /// The spatial biome classifier.
    #[inline]
    #[must_use]
    pub const fn biome_field(&self) -> &VoronoiBiomeField {
        &self.biomes
    }

    /// Rebinds catalog slots holding `old`; see [`BiomeCatalog::replace`].
    ///
    /// Must happen before any concurrent generation starts.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::UnknownBiome`] if no slot holds `old`, or
    /// [`WorldgenError::DuplicateBiomeId`] if the replacement's id already
    /// names a different biome.
    pub fn replace_biome(
        &mut self,
        old: BiomeId,
        replacement: &BiomeDefinition,
    ) -> WorldgenResult<usize> {
        self.biomes.replace_biome(old, replacement)
    }

    /// Biome at a world column.
    #[inline]
    #[must_use]
    pub fn biome_at(&self, x: i64, z: i64) -> &BiomeDefinition {
        self.biomes.resolve(x, z)
    }

    /// Synthesizes one chunk.
    #[instrument(skip(self), fields(x = coord.x, z = coord.z))]
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> SynthesizedChunk {
        let mut grid = ChunkGrid::new(self.shape().world_height as usize);
        let mut biomes = [BiomeId::default(); COLUMNS_PER_CHUNK];
        let mut heights = [0i32; COLUMNS_PER_CHUNK];

        let world_x = coord.world_x();
        let world_z = coord.world_z();

        for local_z in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let info = self.columns.synthesize(
                    &self.biomes,
                    world_x + local_x as i64,
                    world_z + local_z as i64,
                    grid.column_mut(local_x, local_z),
                );
                biomes[local_z * CHUNK_SIZE + local_x] = info.biome;
                heights[local_z * CHUNK_SIZE + local_x] = info.height;
            }
        }

        let chunk = SynthesizedChunk::from_parts(coord, grid, biomes, heights);
        trace!(dominant = %chunk.dominant_biome(), "chunk synthesized");
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(seed: u64) -> ChunkSynthesisDriver {
        ChunkSynthesisDriver::new(WorldSeed::new(seed), &WorldgenConfig::default()).unwrap()
    }

    #[test]
    fn test_chunk_coord_from_block() {
        assert_eq!(ChunkCoord::from_block_pos(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(15, 15), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(16, 16), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::from_block_pos(-1, -1), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-16, -16), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-17, -17), ChunkCoord::new(-2, -2));
    }

    #[test]
    fn test_world_origin_does_not_overflow() {
        let coord = ChunkCoord::new(i32::MIN, i32::MAX);
        assert_eq!(coord.world_x(), i64::from(i32::MIN) * 16);
        assert_eq!(coord.world_z(), i64::from(i32::MAX) * 16);
    }

    #[test]
    fn test_grid_access() {
        let mut grid = ChunkGrid::new(32);
        grid.set(3, 7, 12, Material::GARNET);

        assert_eq!(grid.get(3, 7, 12), Material::GARNET);
        assert_eq!(grid.column(3, 12)[7], Material::GARNET);
        assert_eq!(grid.get(16, 0, 0), Material::EMPTY);
        assert_eq!(grid.get(0, 32, 0), Material::EMPTY);

        grid.set(0, 99, 0, Material::GARNET);
        assert_eq!(grid.as_slice().iter().filter(|m| !m.is_empty()).count(), 1);
    }

    #[test]
    fn test_chunk_generation_determinism() {
        let chunk1 = driver(42).generate(ChunkCoord::new(5, -10));
        let chunk2 = driver(42).generate(ChunkCoord::new(5, -10));
        assert_eq!(chunk1, chunk2);
    }

    #[test]
    fn test_generation_independent_of_order() {
        let gen = driver(7);
        let a_first = gen.generate(ChunkCoord::new(-3, 4));
        let _ = gen.generate(ChunkCoord::new(100, 100));
        let _ = gen.generate(ChunkCoord::new(-2, 4));
        let a_again = gen.generate(ChunkCoord::new(-3, 4));
        assert_eq!(a_first, a_again);
    }

    #[test]
    fn test_chunk_has_terrain() {
        let chunk = driver(42).generate(ChunkCoord::new(0, 0));
        let grid = chunk.grid();

        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                assert_eq!(grid.get(x, 0, z), Material::BEDROCK);
                assert_eq!(grid.get(x, grid.height() - 1, z), Material::EMPTY);
            }
        }

        let solid = grid
            .as_slice()
            .iter()
            .filter(|m| !m.is_empty() && **m != Material::PAIN)
            .count();
        assert!(solid > COLUMNS_PER_CHUNK, "Chunk should have solid blocks");
    }

    #[test]
    fn test_biome_bookkeeping_matches_field() {
        let gen = driver(12345);
        let coord = ChunkCoord::new(-7, 3);
        let chunk = gen.generate(coord);

        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let expected = gen.biome_at(coord.world_x() + x as i64, coord.world_z() + z as i64);
                assert_eq!(chunk.biome_at(x, z), expected.id);
            }
        }
        assert!(chunk.biome_ids().contains(&chunk.dominant_biome()));
    }

    #[test]
    fn test_dominant_tie_goes_to_first_seen() {
        let mut biomes = [BiomeId(4); COLUMNS_PER_CHUNK];
        for id in biomes.iter_mut().skip(COLUMNS_PER_CHUNK / 2) {
            *id = BiomeId(1);
        }
        assert_eq!(dominant(&biomes), BiomeId(4));

        biomes[0] = BiomeId(1);
        assert_eq!(dominant(&biomes), BiomeId(1));
    }

    #[test]
    fn test_encode_decode() {
        let chunk = driver(42).generate(ChunkCoord::new(2, -9));
        let bytes = chunk.encode();
        let loaded = SynthesizedChunk::decode(chunk.coord(), &bytes).unwrap();

        assert_eq!(loaded, chunk);
        assert!(bytes.len() < ChunkGrid::new(256).as_slice().len() * 2);
    }

    #[test]
    fn test_carving_through_grid_mut() {
        let mut chunk = driver(42).generate(ChunkCoord::new(0, 0));
        let biomes = *chunk.biome_ids();

        chunk.grid_mut().set(4, 0, 9, Material::EMPTY);
        chunk.grid_mut().column_mut(5, 5)[1..10].fill(Material::GRAVEL);

        assert_eq!(chunk.grid().get(4, 0, 9), Material::EMPTY);
        assert_eq!(chunk.grid().get(5, 9, 5), Material::GRAVEL);
        assert_eq!(chunk.biome_ids(), &biomes);

        let grid = chunk.into_grid();
        assert_eq!(grid.get(4, 0, 9), Material::EMPTY);
        assert_eq!(grid.get(5, 1, 5), Material::GRAVEL);
        assert_eq!(grid.get(0, 0, 0), Material::BEDROCK);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            SynthesizedChunk::decode(ChunkCoord::new(0, 0), &[1, 2, 3]),
            Err(WorldgenError::CorruptChunk(_))
        ));

        let truncated = compress_prepend_size(&[0, 1, 0, 0, 9, 9]);
        assert!(matches!(
            SynthesizedChunk::decode(ChunkCoord::new(0, 0), &truncated),
            Err(WorldgenError::CorruptChunk(_))
        ));
    }

    #[test]
    fn test_replace_biome_reaches_generation() {
        let mut gen = driver(9);
        let replacement = BiomeDefinition::new(77, "glass", 0.5, 0.5)
            .with_surface(Material::OPAL)
            .with_fill(Material::OPAL)
            .with_density_surface(Material::OPAL)
            .with_density_core(Material::OPAL);
        for id in 0..8 {
            gen.replace_biome(BiomeId(id), &replacement).unwrap();
        }

        let chunk = gen.generate(ChunkCoord::new(1, 1));
        assert!(chunk.biome_ids().iter().all(|&id| id == BiomeId(77)));
        assert!(chunk
            .grid()
            .as_slice()
            .iter()
            .all(|&m| m.is_empty() || m == Material::BEDROCK || m == Material::PAIN || m == Material::OPAL));
    }

    #[test]
    fn test_driver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChunkSynthesisDriver>();
    }
}
