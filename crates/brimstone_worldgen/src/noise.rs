//! # Coherent Lattice Noise
//!
//! Seeded, band-limited scalar fields sampled at integer world coordinates.
//!
//! Each field places a pseudo-random value in [0, 1) on every lattice point
//! `scale` blocks apart and smoothly interpolates between them. Sampling is a
//! pure function of `(seed, scale, coordinate)`: there is no table, no cache
//! and no interior state.
//!
//! ## Determinism Guarantee
//!
//! Lattice hashing uses wrapping 64-bit integer arithmetic only, so values are
//! identical on every platform for the full `i64` coordinate range, negative
//! coordinates included.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{WorldgenError, WorldgenResult};

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

impl From<i64> for WorldSeed {
    fn from(seed: i64) -> Self {
        Self(seed as u64)
    }
}

/// Deterministic stream of sub-seeds.
///
/// One sequence is created per world; each consumer draws the next value in a
/// fixed order, so adding a consumer at the end never disturbs earlier ones.
pub struct SeedSequence {
    rng: ChaCha8Rng,
}

impl SeedSequence {
    /// Starts a sequence from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }

    /// Draws the next sub-seed.
    pub fn next_seed(&mut self) -> WorldSeed {
        WorldSeed::new(self.rng.next_u64())
    }
}

/// SplitMix64 finalizer.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Hashes a seed and a 3D lattice point into 64 well-mixed bits.
#[inline]
#[must_use]
pub(crate) const fn lattice_hash(seed: u64, x: i64, y: i64, z: i64) -> u64 {
    let mut h = mix64(seed ^ 0x9E37_79B9_7F4A_7C15);
    h = mix64(h ^ (x as u64).wrapping_mul(0x8CB9_2BA7_2F3D_8DD7));
    h = mix64(h ^ (y as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93));
    mix64(h ^ (z as u64).wrapping_mul(0xA076_1D64_78BD_642F))
}

/// Maps 64 hash bits to a value in [0, 1) using the top 53 bits.
#[inline]
#[must_use]
pub(crate) fn unit_interval(hash: u64) -> f64 {
    (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Quintic fade curve; zero first and second derivative at the lattice.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn checked_scale(what: &'static str, scale: f64) -> WorldgenResult<f64> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(WorldgenError::InvalidScale { what, scale })
    }
}

/// Splits a world coordinate into its lattice cell and fade weight.
#[inline]
fn lattice_cell(coord: i64, scale: f64) -> (i64, f64) {
    let scaled = coord as f64 / scale;
    let cell = scaled.floor();
    (cell as i64, fade(scaled - cell))
}

/// 2D coherent noise over the (x, z) plane.
///
/// # Example
///
/// ```rust
/// use brimstone_worldgen::noise::{CoherentField2D, WorldSeed};
///
/// let field = CoherentField2D::new(WorldSeed::new(42), 64.0).unwrap();
/// let value = field.sample(-100, 250);
/// assert!((0.0..1.0).contains(&value));
/// ```
#[derive(Clone, Debug)]
pub struct CoherentField2D {
    seed: u64,
    scale: f64,
}

impl CoherentField2D {
    /// Creates a field with `scale` blocks between lattice points.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::InvalidScale`] if `scale` is not positive and finite.
    pub fn new(seed: WorldSeed, scale: f64) -> WorldgenResult<Self> {
        Ok(Self {
            seed: seed.value(),
            scale: checked_scale("2D noise", scale)?,
        })
    }

    /// Returns the lattice spacing in blocks.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    fn lattice(&self, x: i64, z: i64) -> f64 {
        unit_interval(lattice_hash(self.seed, x, 0, z))
    }

    /// Samples the raw interpolated field.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1).
    #[must_use]
    pub fn sample(&self, x: i64, z: i64) -> f64 {
        let (x0, tx) = lattice_cell(x, self.scale);
        let (z0, tz) = lattice_cell(z, self.scale);

        let x1 = x0.wrapping_add(1);
        let z1 = z0.wrapping_add(1);

        let near = lerp(self.lattice(x0, z0), self.lattice(x1, z0), tx);
        let far = lerp(self.lattice(x0, z1), self.lattice(x1, z1), tx);

        lerp(near, far, tz).min(BELOW_ONE)
    }

    /// Samples the field low-pass filtered over the surrounding 3x3 blocks.
    ///
    /// Removes the faint lattice creases that show up as terraces in height maps.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1).
    #[must_use]
    pub fn sample_filtered(&self, x: i64, z: i64) -> f64 {
        let mut total = 0.0;
        for dz in -1..=1 {
            for dx in -1..=1 {
                total += self.sample(x.wrapping_add(dx), z.wrapping_add(dz));
            }
        }
        (total / 9.0).min(BELOW_ONE)
    }
}

/// 3D coherent noise over (x, y, z).
#[derive(Clone, Debug)]
pub struct CoherentField3D {
    seed: u64,
    scale: f64,
}

impl CoherentField3D {
    /// Creates a field with `scale` blocks between lattice points.
    ///
    /// # Errors
    ///
    /// Returns [`WorldgenError::InvalidScale`] if `scale` is not positive and finite.
    pub fn new(seed: WorldSeed, scale: f64) -> WorldgenResult<Self> {
        Ok(Self {
            seed: seed.value(),
            scale: checked_scale("3D noise", scale)?,
        })
    }

    /// Returns the lattice spacing in blocks.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    fn lattice(&self, x: i64, y: i64, z: i64) -> f64 {
        unit_interval(lattice_hash(self.seed, x, y, z))
    }

    /// Samples the raw interpolated field.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1).
    #[must_use]
    pub fn sample(&self, x: i64, y: i64, z: i64) -> f64 {
        let (x0, tx) = lattice_cell(x, self.scale);
        let (y0, ty) = lattice_cell(y, self.scale);
        let (z0, tz) = lattice_cell(z, self.scale);

        let x1 = x0.wrapping_add(1);
        let z1 = z0.wrapping_add(1);

        let plane = |y: i64| {
            let near = lerp(self.lattice(x0, y, z0), self.lattice(x1, y, z0), tx);
            let far = lerp(self.lattice(x0, y, z1), self.lattice(x1, y, z1), tx);
            lerp(near, far, tz)
        };

        lerp(plane(y0), plane(y0.wrapping_add(1)), ty).min(BELOW_ONE)
    }

    /// Samples the field low-pass filtered over the surrounding 3x3x3 blocks.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1).
    #[must_use]
    pub fn sample_filtered(&self, x: i64, y: i64, z: i64) -> f64 {
        let mut total = 0.0;
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    total += self.sample(
                        x.wrapping_add(dx),
                        y.wrapping_add(dy),
                        z.wrapping_add(dz),
                    );
                }
            }
        }
        (total / 27.0).min(BELOW_ONE)
    }
}
