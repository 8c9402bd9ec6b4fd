//! # Biome Field Tests
//!
//! Voronoi classification over large and negative coordinate ranges.

use brimstone_worldgen::{
    rescale, BiomeCatalog, BiomeDefinition, BiomeId, ChunkCoord, ChunkSynthesisDriver, Material,
    VoronoiBiomeField, WorldSeed, WorldgenConfig, CHUNK_SIZE,
};

/// Test: A single-biome catalog resolves to that biome everywhere.
#[test]
fn test_single_biome_world() {
    let mut catalog = BiomeCatalog::new();
    catalog
        .register(BiomeDefinition::new(3, "only", 0.5, 0.5).with_surface(Material::GRAVEL))
        .unwrap();
    let field = VoronoiBiomeField::new(WorldSeed::new(12345), 144.0, 2.0, catalog).unwrap();

    for z in (-100_000..100_000).step_by(1_013) {
        for x in (-100_000..100_000).step_by(997) {
            assert_eq!(field.resolve(x, z).id, BiomeId(3));
        }
    }
    assert_eq!(field.resolve(i64::MAX, i64::MIN).id, BiomeId(3));
}

/// Test: The same single biome through the driver and a TOML catalog.
#[test]
fn test_single_biome_chunks() {
    let config = WorldgenConfig::from_toml_str(
        r#"
        seed = 12345

        [voronoi]
        cell_scale = 144.0

        [[biomes]]
        id = 3
        name = "only"
        hardness = 0.5
        infection = 0.5
        "#,
    )
    .unwrap();
    let gen = ChunkSynthesisDriver::from_config(&config).unwrap();

    for cz in -2..2 {
        for cx in -2..2 {
            let chunk = gen.generate(ChunkCoord::new(cx, cz));
            assert_eq!(chunk.dominant_biome(), BiomeId(3));
            assert!(chunk.biome_ids().iter().all(|&id| id == BiomeId(3)));
        }
    }
}

/// Test: Brute force over the nine neighbouring epicenters agrees with resolve.
#[test]
fn test_resolve_matches_brute_force() {
    let field =
        VoronoiBiomeField::new(WorldSeed::new(2024), 144.0, 2.0, BiomeCatalog::reference()).unwrap();

    for z in (-3000..3000).step_by(23) {
        for x in (-3000..3000).step_by(29) {
            let px = rescale(x, 144.0);
            let pz = rescale(z, 144.0);
            let (gx, gz) = (px.floor() as i64, pz.floor() as i64);

            let mut best = None;
            let mut best_distance = f64::INFINITY;
            for dz in -1..=1 {
                for dx in -1..=1 {
                    let center = field.epicenter(gx + dx, gz + dz);
                    let distance = center.distance_squared(px, pz);
                    if distance < best_distance {
                        best_distance = distance;
                        best = Some(center.biome.id);
                    }
                }
            }

            assert_eq!(Some(field.resolve(x, z).id), best, "at ({x}, {z})");
        }
    }
}

/// Test: Column biomes in a chunk match direct queries, across the origin.
#[test]
fn test_chunk_biomes_across_origin() {
    let gen = ChunkSynthesisDriver::from_config(&WorldgenConfig::default()).unwrap();

    for coord in [ChunkCoord::new(-1, -1), ChunkCoord::new(0, -1), ChunkCoord::new(-1, 0)] {
        let chunk = gen.generate(coord);
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let world_x = coord.world_x() + x as i64;
                let world_z = coord.world_z() + z as i64;
                assert_eq!(chunk.biome_at(x, z), gen.biome_at(world_x, world_z).id);
            }
        }
    }
}

/// Test: Replacing a biome before generation changes its columns only.
#[test]
fn test_replace_before_generation() {
    let config = WorldgenConfig::default();
    let coord = ChunkCoord::new(6, -6);

    let original = ChunkSynthesisDriver::from_config(&config).unwrap();
    let before = original.generate(coord);
    let target = before.dominant_biome();

    let mut rebound = ChunkSynthesisDriver::from_config(&config).unwrap();
    let replacement = BiomeDefinition::new(500, "replacement", 0.0, 0.0);
    assert!(rebound.replace_biome(target, &replacement).unwrap() >= 1);
    let after = rebound.generate(coord);

    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            if before.biome_at(x, z) == target {
                assert_eq!(after.biome_at(x, z), BiomeId(500));
            } else {
                assert_eq!(after.biome_at(x, z), before.biome_at(x, z));
            }
        }
    }
}
