//! # Biome Catalog
//!
//! Biomes are classified on two axes, *hardness* and *infection*, both in
//! [0, 1]. A climate sample picks the registered biome whose coordinates are
//! nearest in Manhattan distance; the first registered wins a tie.
//!
//! The catalog is an ordered list of slots. A slot owns its classification
//! coordinates; the definition bound to it can be swapped later with
//! [`BiomeCatalog::replace`] without moving any Voronoi cell boundaries.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{WorldgenError, WorldgenResult};
use crate::material::Material;

/// Stable biome identifier, persisted in chunk biome arrays.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct BiomeId(pub u16);

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A point in (hardness, infection) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    /// Hardness coordinate in [0, 1].
    pub hardness: f64,
    /// Infection coordinate in [0, 1].
    pub infection: f64,
}

impl Classification {
    /// Creates a classification point.
    #[inline]
    #[must_use]
    pub const fn new(hardness: f64, infection: f64) -> Self {
        Self {
            hardness,
            infection,
        }
    }

    /// Returns true if both coordinates are within [0, 1].
    #[must_use]
    pub fn is_valid(self) -> bool {
        (0.0..=1.0).contains(&self.hardness) && (0.0..=1.0).contains(&self.infection)
    }

    /// Manhattan distance to a climate sample.
    #[inline]
    #[must_use]
    pub fn distance(self, hardness: f64, infection: f64) -> f64 {
        (self.hardness - hardness).abs() + (self.infection - infection).abs()
    }
}

/// An immutable biome definition.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDefinition {
    /// Unique identifier.
    pub id: BiomeId,
    /// Human-readable name.
    pub name: String,
    /// Where this biome sits in classification space.
    pub classification: Classification,
    /// Terrain height scalar; a quarter drives the fine octave, the rest the coarse one.
    pub height: f64,
    /// Density scalar applied to both 3D noise octaves.
    pub density: f64,
    /// Top block of the terrain column.
    pub surface: Material,
    /// Everything below the surface layer.
    pub fill: Material,
    /// Outer layer of density-formed solids above the terrain column.
    pub density_surface: Material,
    /// Interior of density-formed solids.
    pub density_core: Material,
    /// Number of blocks, counted down from the column top, that use `surface`.
    pub surface_depth: u32,
}

impl BiomeDefinition {
    /// Default terrain height scalar.
    pub const DEFAULT_HEIGHT: f64 = 128.0;
    /// Default density scalar.
    pub const DEFAULT_DENSITY: f64 = 1.0;

    /// Creates a biome with default scalars and netherrack in every role.
    #[must_use]
    pub fn new(id: u16, name: impl Into<String>, hardness: f64, infection: f64) -> Self {
        Self {
            id: BiomeId(id),
            name: name.into(),
            classification: Classification::new(hardness, infection),
            height: Self::DEFAULT_HEIGHT,
            density: Self::DEFAULT_DENSITY,
            surface: Material::NETHERRACK,
            fill: Material::NETHERRACK,
            density_surface: Material::NETHERRACK,
            density_core: Material::NETHERRACK,
            surface_depth: 1,
        }
    }

    /// Sets the surface material.
    #[must_use]
    pub fn with_surface(mut self, material: Material) -> Self {
        self.surface = material;
        self
    }

    /// Sets the terrain fill material.
    #[must_use]
    pub fn with_fill(mut self, material: Material) -> Self {
        self.fill = material;
        self
    }

    /// Sets the density-surface material.
    #[must_use]
    pub fn with_density_surface(mut self, material: Material) -> Self {
        self.density_surface = material;
        self
    }

    /// Sets the density-core material.
    #[must_use]
    pub fn with_density_core(mut self, material: Material) -> Self {
        self.density_core = material;
        self
    }

    /// Sets the terrain height scalar.
    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Sets the density scalar.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Sets how many blocks below the column top use the surface material.
    #[must_use]
    pub fn with_surface_depth(mut self, depth: u32) -> Self {
        self.surface_depth = depth;
        self
    }

    /// Material for a solid block `depth` blocks below the column top.
    #[inline]
    #[must_use]
    pub fn terrain_material(&self, depth: i32) -> Material {
        if i64::from(depth) < i64::from(self.surface_depth) {
            self.surface
        } else {
            self.fill
        }
    }

    /// Material for a density-formed solid with `excess` in (0, 1].
    ///
    /// `excess` is rounded half-up: below 0.5 is the outer layer, 0.5 and
    /// above is the core.
    #[inline]
    #[must_use]
    pub fn density_material(&self, excess: f64) -> Material {
        if excess < 0.5 {
            self.density_surface
        } else {
            self.density_core
        }
    }
}

fn check_scalars(biome: &BiomeDefinition) -> WorldgenResult<()> {
    if biome.height.is_finite() && biome.density.is_finite() {
        Ok(())
    } else {
        Err(WorldgenError::InvalidConfig(format!(
            "biome '{}' needs finite height and density, got {} and {}",
            biome.name, biome.height, biome.density
        )))
    }
}

#[derive(Clone, Debug)]
struct CatalogSlot {
    classification: Classification,
    biome: BiomeDefinition,
}

/// Ordered collection of registered biomes.
///
/// Registration and replacement must finish before any concurrent
/// resolution starts; the catalog has no internal locking.
#[derive(Clone, Debug, Default)]
pub struct BiomeCatalog {
    slots: Vec<CatalogSlot>,
}

impl BiomeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the eight-biome reference catalog.
    #[must_use]
    pub fn reference() -> Self {
        let biomes = [
            BiomeDefinition::new(0, "bridges", 0.25, 0.25)
                .with_density_core(Material::SOUL_SAND),
            BiomeDefinition::new(1, "strata", 0.375, 0.25)
                .with_surface(Material::PYRITE)
                .with_fill(Material::ROSE_QUARTZ)
                .with_density_surface(Material::PYRITE),
            BiomeDefinition::new(2, "cold", 0.625, 0.25)
                .with_surface(Material::MAGNESITE)
                .with_fill(Material::SAPPHIRE)
                .with_density_surface(Material::OPAL)
                .with_density_core(Material::PACKED_ICE),
            BiomeDefinition::new(3, "barad_dur", 0.75, 0.25)
                .with_surface(Material::HEMATITE)
                .with_density_surface(Material::HEMATITE),
            BiomeDefinition::new(4, "heartsblood", 0.25, 0.5)
                .with_surface(Material::GARNET)
                .with_fill(Material::TOURMALINE)
                .with_density_surface(Material::GARNET)
                .with_density_core(Material::EMERALD),
            BiomeDefinition::new(5, "sulfur", 0.375, 0.5)
                .with_surface(Material::HELIODOR)
                .with_fill(Material::PERIDOT)
                .with_density_surface(Material::HELIODOR)
                .with_density_core(Material::PERIDOT),
            BiomeDefinition::new(6, "nocturne", 0.625, 0.5)
                .with_surface(Material::CASSITERITE)
                .with_fill(Material::CHRYSOPRASE)
                .with_density_surface(Material::CASSITERITE)
                .with_density_core(Material::CASSITERITE),
            BiomeDefinition::new(7, "doom", 0.75, 0.5)
                .with_surface(Material::SPINEL)
                .with_fill(Material::PYRITE)
                .with_density_surface(Material::SPINEL)
                .with_density_core(Material::CASSITERITE),
        ];

        Self {
            slots: biomes
                .into_iter()
                .map(|biome| CatalogSlot {
                    classification: biome.classification,
                    biome,
                })
                .collect(),
        }
    }

    /// Appends a biome.
    ///
    /// # Errors
    ///
    /// Returns error if the classification is outside [0, 1] or the id is
    /// already registered.
    pub fn register(&mut self, biome: BiomeDefinition) -> WorldgenResult<()> {
        let classification = biome.classification;
        if !classification.is_valid() {
            return Err(WorldgenError::ClassificationOutOfRange {
                name: biome.name,
                hardness: classification.hardness,
                infection: classification.infection,
            });
        }
        check_scalars(&biome)?;
        if self.contains(biome.id) {
            return Err(WorldgenError::DuplicateBiomeId(biome.id));
        }

        if let Some(shadowing) = self
            .slots
            .iter()
            .find(|slot| slot.classification == classification)
        {
            tracing::warn!(
                biome = %biome.name,
                shadowed_by = %shadowing.biome.name,
                "biome shares classification coordinates with an earlier biome and will never be selected"
            );
        }

        self.slots.push(CatalogSlot {
            classification,
            biome,
        });
        Ok(())
    }

    /// Rebinds every slot holding `old` to `replacement`.
    ///
    /// The slots keep their classification coordinates, so cell boundaries
    /// stay where they were and only the biome they report changes.
    ///
    /// # Returns
    ///
    /// The number of slots rebound.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::UnknownBiome`] if no slot holds `old`,
    /// [`WorldgenError::DuplicateBiomeId`] if another slot already binds the
    /// replacement's id to a different definition, or
    /// [`WorldgenError::InvalidConfig`] if its scalars are not finite.
    pub fn replace(&mut self, old: BiomeId, replacement: &BiomeDefinition) -> WorldgenResult<usize> {
        check_scalars(replacement)?;
        if !self.contains(old) {
            return Err(WorldgenError::UnknownBiome(old));
        }
        // One id, one definition. Rebinding several ids to the same
        // definition is fine.
        let conflict = self.slots.iter().any(|slot| {
            slot.biome.id != old && slot.biome.id == replacement.id && slot.biome != *replacement
        });
        if conflict {
            return Err(WorldgenError::DuplicateBiomeId(replacement.id));
        }

        let mut rebound = 0;
        for slot in self.slots.iter_mut().filter(|slot| slot.biome.id == old) {
            slot.biome = replacement.clone();
            rebound += 1;
        }

        tracing::debug!(%old, new = %replacement.id, rebound, "rebound biome slots");
        Ok(rebound)
    }

    /// Returns the biome nearest to a climate sample.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::EmptyCatalog`] if nothing is registered.
    pub fn nearest_by_classification(
        &self,
        hardness: f64,
        infection: f64,
    ) -> WorldgenResult<&BiomeDefinition> {
        self.nearest_slot(hardness, infection)
            .map(|index| &self.slots[index].biome)
            .ok_or(WorldgenError::EmptyCatalog)
    }

    /// Index of the nearest slot; strict `<` keeps the earliest on ties.
    pub(crate) fn nearest_slot(&self, hardness: f64, infection: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let distance = slot.classification.distance(hardness, infection);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((index, distance)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Definition bound to a slot index returned by `nearest_slot`.
    #[inline]
    pub(crate) fn slot_biome(&self, index: usize) -> &BiomeDefinition {
        &self.slots[index].biome
    }

    /// Fails with [`WorldgenError::EmptyCatalog`] if nothing is registered.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_not_empty(&self) -> WorldgenResult<()> {
        if self.slots.is_empty() {
            Err(WorldgenError::EmptyCatalog)
        } else {
            Ok(())
        }
    }

    /// Looks up a biome by id.
    #[must_use]
    pub fn get(&self, id: BiomeId) -> Option<&BiomeDefinition> {
        self.iter().find(|biome| biome.id == id)
    }

    /// Returns true if any slot holds `id`.
    #[must_use]
    pub fn contains(&self, id: BiomeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no biome is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates bound definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BiomeDefinition> {
        self.slots.iter().map(|slot| &slot.biome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog() {
        let catalog = BiomeCatalog::reference();
        assert_eq!(catalog.len(), 8);

        let names: Vec<_> = catalog.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            ["bridges", "strata", "cold", "barad_dur", "heartsblood", "sulfur", "nocturne", "doom"]
        );
        assert!(catalog.iter().all(|b| b.classification.is_valid()));
    }

    #[test]
    fn test_nearest_by_manhattan_distance() {
        let catalog = BiomeCatalog::reference();

        let biome = catalog.nearest_by_classification(0.7, 0.3).unwrap();
        assert_eq!(biome.name, "barad_dur");

        let biome = catalog.nearest_by_classification(0.0, 1.0).unwrap();
        assert_eq!(biome.name, "heartsblood");
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let mut catalog = BiomeCatalog::new();
        catalog.register(BiomeDefinition::new(10, "low", 0.25, 0.5)).unwrap();
        catalog.register(BiomeDefinition::new(11, "high", 0.75, 0.5)).unwrap();

        // Exactly halfway between the two.
        let biome = catalog.nearest_by_classification(0.5, 0.5).unwrap();
        assert_eq!(biome.id, BiomeId(10));
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let catalog = BiomeCatalog::new();
        assert!(matches!(
            catalog.nearest_by_classification(0.5, 0.5),
            Err(WorldgenError::EmptyCatalog)
        ));
        assert!(catalog.ensure_not_empty().is_err());
    }

    #[test]
    fn test_register_rejects_out_of_range() {
        let mut catalog = BiomeCatalog::new();
        for (h, i) in [(1.5, 0.5), (0.5, -0.1), (f64::NAN, 0.5)] {
            let result = catalog.register(BiomeDefinition::new(0, "bad", h, i));
            assert!(matches!(result, Err(WorldgenError::ClassificationOutOfRange { .. })));
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let mut catalog = BiomeCatalog::new();
        catalog.register(BiomeDefinition::new(3, "a", 0.1, 0.1)).unwrap();
        let result = catalog.register(BiomeDefinition::new(3, "b", 0.9, 0.9));
        assert!(matches!(result, Err(WorldgenError::DuplicateBiomeId(BiomeId(3)))));
    }

    #[test]
    fn test_replace_keeps_classification() {
        let mut catalog = BiomeCatalog::reference();
        let replacement = BiomeDefinition::new(40, "ashfall", 0.0, 0.0)
            .with_surface(Material::GRAVEL);

        let rebound = catalog.replace(BiomeId(3), &replacement).unwrap();
        assert_eq!(rebound, 1);

        // The slot at (0.75, 0.25) now reports the replacement.
        let biome = catalog.nearest_by_classification(0.75, 0.25).unwrap();
        assert_eq!(biome.name, "ashfall");
        // Its own coordinates did not move the slot.
        let biome = catalog.nearest_by_classification(0.0, 0.0).unwrap();
        assert_eq!(biome.name, "bridges");
        assert!(!catalog.contains(BiomeId(3)));
    }

    #[test]
    fn test_replace_rejects_taken_id() {
        let mut catalog = BiomeCatalog::reference();
        let impostor = BiomeDefinition::new(5, "impostor", 0.5, 0.5);

        let result = catalog.replace(BiomeId(3), &impostor);
        assert!(matches!(result, Err(WorldgenError::DuplicateBiomeId(BiomeId(5)))));
        assert_eq!(catalog.get(BiomeId(3)).unwrap().name, "barad_dur");
        assert_eq!(catalog.get(BiomeId(5)).unwrap().name, "sulfur");
    }

    #[test]
    fn test_replace_same_definition_into_many_slots() {
        let mut catalog = BiomeCatalog::reference();
        let ash = BiomeDefinition::new(30, "ash", 0.5, 0.5);

        assert_eq!(catalog.replace(BiomeId(1), &ash).unwrap(), 1);
        assert_eq!(catalog.replace(BiomeId(2), &ash).unwrap(), 1);
        // Keeping the id while changing the definition is a plain rebind.
        let darker = ash.clone().with_surface(Material::GRAVEL);
        assert_eq!(catalog.replace(BiomeId(30), &darker).unwrap(), 2);

        assert_eq!(catalog.len(), 8);
        assert!(catalog.iter().filter(|b| b.id == BiomeId(30)).all(|b| *b == darker));
    }

    #[test]
    fn test_non_finite_scalars_rejected() {
        let mut catalog = BiomeCatalog::new();
        let void = BiomeDefinition::new(0, "void", 0.5, 0.5).with_density(f64::NAN);
        assert!(matches!(catalog.register(void), Err(WorldgenError::InvalidConfig(_))));

        let tall = BiomeDefinition::new(0, "tall", 0.5, 0.5).with_height(f64::INFINITY);
        assert!(matches!(catalog.register(tall), Err(WorldgenError::InvalidConfig(_))));
        assert!(catalog.is_empty());

        let mut catalog = BiomeCatalog::reference();
        let broken = BiomeDefinition::new(0, "bridges", 0.25, 0.25).with_density(f64::NAN);
        assert!(matches!(
            catalog.replace(BiomeId(0), &broken),
            Err(WorldgenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_replace_unknown() {
        let mut catalog = BiomeCatalog::reference();
        let result = catalog.replace(BiomeId(99), &BiomeDefinition::new(1, "x", 0.5, 0.5));
        assert!(matches!(result, Err(WorldgenError::UnknownBiome(BiomeId(99)))));
    }

    #[test]
    fn test_terrain_depth_mapping() {
        let biome = BiomeDefinition::new(0, "layered", 0.5, 0.5)
            .with_surface(Material::GARNET)
            .with_fill(Material::TOURMALINE);

        assert_eq!(biome.terrain_material(0), Material::GARNET);
        assert_eq!(biome.terrain_material(1), Material::TOURMALINE);
        assert_eq!(biome.terrain_material(50), Material::TOURMALINE);

        let thick = biome.with_surface_depth(3);
        assert_eq!(thick.terrain_material(2), Material::GARNET);
        assert_eq!(thick.terrain_material(3), Material::TOURMALINE);
    }

    #[test]
    fn test_density_material_rounds_half_up() {
        let biome = BiomeDefinition::new(0, "floating", 0.5, 0.5)
            .with_density_surface(Material::OPAL)
            .with_density_core(Material::PACKED_ICE);

        assert_eq!(biome.density_material(f64::MIN_POSITIVE), Material::OPAL);
        assert_eq!(biome.density_material(0.499_999), Material::OPAL);
        assert_eq!(biome.density_material(0.5), Material::PACKED_ICE);
        assert_eq!(biome.density_material(1.0), Material::PACKED_ICE);
    }
}
