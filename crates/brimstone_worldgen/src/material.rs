//! # Voxel Materials
//!
//! A material is a plain `u16` identifier. The engine only distinguishes
//! [`Material::EMPTY`] and [`Material::BEDROCK`]; every other id is opaque and
//! chosen by whoever builds the biome catalog.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A voxel material identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Material(pub u16);

impl Material {
    /// No material.
    pub const EMPTY: Self = Self(0);
    /// Impenetrable world floor.
    pub const BEDROCK: Self = Self(1);
    /// Common filler rock.
    pub const NETHERRACK: Self = Self(2);
    /// Soft dark sand.
    pub const SOUL_SAND: Self = Self(3);
    /// Loose gravel.
    pub const GRAVEL: Self = Self(4);
    /// Compressed ice.
    pub const PACKED_ICE: Self = Self(5);
    /// Pyrite gemrock.
    pub const PYRITE: Self = Self(6);
    /// Rose quartz gemrock.
    pub const ROSE_QUARTZ: Self = Self(7);
    /// Magnesite gemrock.
    pub const MAGNESITE: Self = Self(8);
    /// Sapphire gemrock.
    pub const SAPPHIRE: Self = Self(9);
    /// Opal gemrock.
    pub const OPAL: Self = Self(10);
    /// Caustic fluid that floods carved voids below sea level.
    pub const PAIN: Self = Self(11);
    /// Hematite gemrock.
    pub const HEMATITE: Self = Self(12);
    /// Garnet gemrock.
    pub const GARNET: Self = Self(13);
    /// Tourmaline gemrock.
    pub const TOURMALINE: Self = Self(14);
    /// Emerald gemrock.
    pub const EMERALD: Self = Self(15);
    /// Heliodor gemrock.
    pub const HELIODOR: Self = Self(16);
    /// Peridot gemrock.
    pub const PERIDOT: Self = Self(17);
    /// Cassiterite gemrock.
    pub const CASSITERITE: Self = Self(18);
    /// Chrysoprase gemrock.
    pub const CHRYSOPRASE: Self = Self(19);
    /// Spinel gemrock.
    pub const SPINEL: Self = Self(20);

    const NAMED: [(&'static str, Self); 21] = [
        ("empty", Self::EMPTY),
        ("bedrock", Self::BEDROCK),
        ("netherrack", Self::NETHERRACK),
        ("soul_sand", Self::SOUL_SAND),
        ("gravel", Self::GRAVEL),
        ("packed_ice", Self::PACKED_ICE),
        ("pyrite", Self::PYRITE),
        ("rose_quartz", Self::ROSE_QUARTZ),
        ("magnesite", Self::MAGNESITE),
        ("sapphire", Self::SAPPHIRE),
        ("opal", Self::OPAL),
        ("pain", Self::PAIN),
        ("hematite", Self::HEMATITE),
        ("garnet", Self::GARNET),
        ("tourmaline", Self::TOURMALINE),
        ("emerald", Self::EMERALD),
        ("heliodor", Self::HELIODOR),
        ("peridot", Self::PERIDOT),
        ("cassiterite", Self::CASSITERITE),
        ("chrysoprase", Self::CHRYSOPRASE),
        ("spinel", Self::SPINEL),
    ];

    /// Creates a material from a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u16 {
        self.0
    }

    /// Returns true for [`Material::EMPTY`].
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Looks up one of the built-in materials by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, material)| material)
    }

    /// Returns the built-in name of this material, if it has one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, material)| *material == self)
            .map(|&(name, _)| name)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "#{}", self.0),
        }
    }
}
