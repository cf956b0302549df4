//! Scratch arena for temporary matrices
//!
//! A [`MatPool`] owns a block of matrices allocated once up front. Callers
//! that need short-lived results (copies, inverses, products) take slots from
//! it and recycle them all at once with [`MatPool::drain`], typically at a
//! frame boundary. Results that must outlive the frame are taken out with
//! [`MatPool::save`].

use thiserror::Error;
use xform_core::{Mat4, MathError};

/// Errors that can occur when working with a matrix pool
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// Every slot is in use until the next drain
    #[error("Matrix pool exhausted (capacity {capacity})")]
    Exhausted { capacity: usize },

    /// The slot was handed out before the last drain
    #[error("Pool slot {index} was recycled by a drain")]
    StaleSlot { index: usize },

    #[error(transparent)]
    Math(#[from] MathError),
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// Pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of matrices available between drains
    pub capacity: usize,
}

impl PoolConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

type Generation = u32;

/// Handle to a matrix in a [`MatPool`].
///
/// Only valid until the next [`MatPool::drain`]; afterwards every accessor
/// rejects it with [`PoolError::StaleSlot`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct PoolSlot {
    index: usize,
    gen: Generation,
}

impl PoolSlot {
    pub fn index(self) -> usize {
        self.index
    }
}

/// Fixed-capacity arena of matrices with generation-checked slots
#[derive(Debug)]
pub struct MatPool {
    matrices: Vec<Mat4>,
    len: usize,
    gen: Generation,
}

impl MatPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            matrices: vec![Mat4::identity(); config.capacity],
            len: 0,
            gen: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(PoolConfig::with_capacity(capacity))
    }

    pub fn capacity(&self) -> usize {
        self.matrices.len()
    }

    /// Number of slots handed out since the last drain
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Take the next free slot, initialized to the identity
    pub fn allocate(&mut self) -> Result<PoolSlot> {
        self.allocate_with(Mat4::identity())
    }

    /// Take the next free slot, initialized to `value`
    pub fn allocate_with(&mut self, value: Mat4) -> Result<PoolSlot> {
        if self.len == self.matrices.len() {
            return Err(PoolError::Exhausted {
                capacity: self.matrices.len(),
            });
        }
        let index = self.len;
        self.matrices[index] = value;
        self.len += 1;
        Ok(PoolSlot {
            index,
            gen: self.gen,
        })
    }

    pub fn get(&self, slot: PoolSlot) -> Result<&Mat4> {
        let index = self.check(slot)?;
        Ok(&self.matrices[index])
    }

    pub fn get_mut(&mut self, slot: PoolSlot) -> Result<&mut Mat4> {
        let index = self.check(slot)?;
        Ok(&mut self.matrices[index])
    }

    /// New slot holding a copy of `slot`
    pub fn copy(&mut self, slot: PoolSlot) -> Result<PoolSlot> {
        let value = *self.get(slot)?;
        self.allocate_with(value)
    }

    /// Owned copy of `slot` that survives the next drain
    pub fn save(&self, slot: PoolSlot) -> Result<Mat4> {
        self.get(slot).copied()
    }

    /// New slot holding the inverse of `slot`.
    ///
    /// A singular matrix fails with [`PoolError::Math`] without taking a slot.
    pub fn inverse(&mut self, slot: PoolSlot) -> Result<PoolSlot> {
        let inverse = self.get(slot)?.inverse()?;
        self.allocate_with(inverse)
    }

    /// New slot holding the transpose of `slot`
    pub fn transpose(&mut self, slot: PoolSlot) -> Result<PoolSlot> {
        let transposed = self.get(slot)?.transposed();
        self.allocate_with(transposed)
    }

    /// New slot holding `a * b`
    pub fn product(&mut self, a: PoolSlot, b: PoolSlot) -> Result<PoolSlot> {
        let product = self.get(a)? * self.get(b)?;
        self.allocate_with(product)
    }

    /// Recycle every slot and invalidate all outstanding handles
    pub fn drain(&mut self) {
        log::trace!("Draining matrix pool ({} of {} slots used)", self.len, self.capacity());
        self.len = 0;
        // A handle would have to survive 2^32 drains to alias a live slot
        self.gen = self.gen.wrapping_add(1);
    }

    fn check(&self, slot: PoolSlot) -> Result<usize> {
        if slot.gen != self.gen || slot.index >= self.len {
            return Err(PoolError::StaleSlot { index: slot.index });
        }
        Ok(slot.index)
    }
}

impl Default for MatPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use xform_core::Vec3;

    fn translated(pool: &mut MatPool, x: f32, y: f32, z: f32) -> PoolSlot {
        let slot = pool.allocate().unwrap();
        pool.get_mut(slot).unwrap().translate(x, y, z);
        slot
    }

    #[test]
    fn test_default_capacity() {
        let pool = MatPool::default();
        assert_eq!(pool.capacity(), 256);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_allocate_starts_at_identity() {
        let mut pool = MatPool::with_capacity(2);
        let slot = pool.allocate().unwrap();
        assert_eq!(*pool.get(slot).unwrap(), Mat4::identity());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = MatPool::with_capacity(2);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert_eq!(pool.allocate(), Err(PoolError::Exhausted { capacity: 2 }));

        pool.drain();
        assert!(pool.allocate().is_ok());
    }

    #[test]
    fn test_recycled_slot_is_reset() {
        let mut pool = MatPool::with_capacity(1);
        translated(&mut pool, 1.0, 2.0, 3.0);
        pool.drain();
        let slot = pool.allocate().unwrap();
        assert_eq!(*pool.get(slot).unwrap(), Mat4::identity());
    }

    #[test]
    fn test_drain_invalidates_slots() {
        let mut pool = MatPool::with_capacity(4);
        let slot = translated(&mut pool, 1.0, 0.0, 0.0);
        pool.drain();
        assert_eq!(pool.get(slot), Err(PoolError::StaleSlot { index: 0 }));
        assert!(pool.get_mut(slot).is_err());

        // Same index, new generation
        let fresh = pool.allocate().unwrap();
        assert_eq!(fresh.index(), slot.index());
        assert_ne!(fresh, slot);
        assert!(pool.get(slot).is_err());
    }

    #[test]
    fn test_save_survives_drain() {
        let mut pool = MatPool::with_capacity(4);
        let slot = translated(&mut pool, 4.0, 5.0, 6.0);
        let saved = pool.save(slot).unwrap();
        pool.drain();
        assert_eq!(saved.origin().coords, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut pool = MatPool::with_capacity(4);
        let original = translated(&mut pool, 1.0, 0.0, 0.0);
        let copy = pool.copy(original).unwrap();
        pool.get_mut(copy).unwrap().scale_uniform(2.0);

        assert_eq!(pool.get(original).unwrap().get(0, 0), 1.0);
        assert_eq!(pool.get(copy).unwrap().get(0, 0), 2.0);
    }

    #[test]
    fn test_inverse_and_product() {
        let mut pool = MatPool::with_capacity(4);
        let m = pool.allocate().unwrap();
        pool.get_mut(m)
            .unwrap()
            .translate(1.0, -2.0, 3.0)
            .rotate(0.6, 0.0, 1.0, 0.0)
            .scale(2.0, 2.0, 2.0);
        let inverse = pool.inverse(m).unwrap();
        let product = pool.product(m, inverse).unwrap();

        assert_abs_diff_eq!(
            pool.get(product).unwrap().as_matrix(),
            &nalgebra::Matrix4::identity(),
            epsilon = 1e-5
        );
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_singular_inverse_takes_no_slot() {
        let mut pool = MatPool::with_capacity(4);
        let zero = pool.allocate_with(Mat4::zeros()).unwrap();
        assert!(matches!(
            pool.inverse(zero),
            Err(PoolError::Math(MathError::Singular(_)))
        ));
        assert_eq!(pool.len(), 1);
        assert_eq!(*pool.get(zero).unwrap(), Mat4::zeros());
    }

    #[test]
    fn test_transpose() {
        let mut pool = MatPool::with_capacity(4);
        let m = translated(&mut pool, 7.0, 8.0, 9.0);
        let t = pool.transpose(m).unwrap();
        let transposed = pool.get(t).unwrap();
        assert_eq!(transposed.get(3, 0), 7.0);
        assert_eq!(transposed.get(3, 2), 9.0);
        assert_eq!(transposed.get(0, 3), 0.0);
    }
}
