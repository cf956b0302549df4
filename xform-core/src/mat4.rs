//! 4x4 homogeneous transform matrices
//!
//! Every mutating operation works in place and returns the same matrix so
//! calls can be chained:
//!
//! ```
//! use xform_core::Mat4;
//!
//! let mut model = Mat4::identity();
//! model.translate(1.0, 0.0, 0.0).rotate(0.5, 0.0, 1.0, 0.0).scale_uniform(2.0);
//! ```

use std::ops::Mul;

use nalgebra::{Matrix4, Point3, UnitQuaternion};

use crate::error::{MathError, Result};
use crate::geometry::{unit_axis, Quat, Vec3};

/// A 4x4 transform stored column-major.
///
/// Element `i` of [`Mat4::unpack`] is row `i % 4`, column `i / 4`, so the
/// translation of an affine transform sits in elements 12, 13 and 14.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    inner: Matrix4<f32>,
}

impl Mat4 {
    pub fn identity() -> Self {
        Self {
            inner: Matrix4::identity(),
        }
    }

    pub fn zeros() -> Self {
        Self {
            inner: Matrix4::zeros(),
        }
    }

    /// Build from 16 column-major values
    pub fn from_cols_array(values: &[f32; 16]) -> Self {
        Self {
            inner: Matrix4::from_column_slice(values),
        }
    }

    pub fn from_matrix(inner: Matrix4<f32>) -> Self {
        Self { inner }
    }

    pub fn as_matrix(&self) -> &Matrix4<f32> {
        &self.inner
    }

    pub fn into_matrix(self) -> Matrix4<f32> {
        self.inner
    }

    /// Column-major view of the 16 elements
    pub fn as_slice(&self) -> &[f32] {
        self.inner.as_slice()
    }

    /// Copy out the 16 column-major elements
    pub fn unpack(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.inner.as_slice());
        out
    }

    /// Element at `row`, `col`
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.inner[(row, col)]
    }

    /// Overwrite all 16 elements from column-major values
    pub fn set(&mut self, values: &[f32; 16]) -> &mut Self {
        self.inner.as_mut_slice().copy_from_slice(values);
        self
    }

    /// Copy `src` into `self`
    pub fn init(&mut self, src: &Mat4) -> &mut Self {
        self.inner.copy_from(&src.inner);
        self
    }

    pub fn set_identity(&mut self) -> &mut Self {
        self.inner.fill_with_identity();
        self
    }

    /// Invert in place.
    ///
    /// Fails with [`MathError::Singular`] when the determinant is zero or the
    /// inverse is not representable in `f32`; `self` is left unchanged then.
    pub fn invert(&mut self) -> Result<&mut Self> {
        let det = self.inner.determinant();
        if !det.is_finite() || det.abs() < f32::MIN_POSITIVE {
            return Err(MathError::Singular(det));
        }
        let inverse = self.inner.try_inverse().ok_or(MathError::Singular(det))?;
        if !inverse.iter().all(|v| v.is_finite()) {
            return Err(MathError::Singular(det));
        }
        self.inner = inverse;
        Ok(self)
    }

    /// Inverse as a new matrix, leaving `self` untouched
    pub fn inverse(&self) -> Result<Mat4> {
        let mut out = *self;
        out.invert()?;
        Ok(out)
    }

    pub fn transpose(&mut self) -> &mut Self {
        self.inner.transpose_mut();
        self
    }

    pub fn transposed(&self) -> Mat4 {
        Self {
            inner: self.inner.transpose(),
        }
    }

    /// `self = self * other`: `other` is applied first in object space
    pub fn multiply(&mut self, other: &Mat4) -> &mut Self {
        self.inner *= other.inner;
        self
    }

    /// `self = self * Translation(x, y, z)`
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.inner.prepend_translation_mut(&Vec3::new(x, y, z));
        self
    }

    pub fn translate_vec(&mut self, v: Vec3) -> &mut Self {
        self.translate(v.x, v.y, v.z)
    }

    /// `self = self * Scale(sx, sy, sz)`
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> &mut Self {
        self.inner
            .prepend_nonuniform_scaling_mut(&Vec3::new(sx, sy, sz));
        self
    }

    pub fn scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale(s, s, s)
    }

    pub fn scale_vec(&mut self, s: Vec3) -> &mut Self {
        self.scale(s.x, s.y, s.z)
    }

    /// `self = self * Rotation(angle about (ax, ay, az))`, angle in radians.
    ///
    /// The axis is normalized here and may have any finite length. An exactly
    /// zero or non-finite axis has no direction to rotate about, so the matrix
    /// is left unchanged.
    pub fn rotate(&mut self, angle: f32, ax: f32, ay: f32, az: f32) -> &mut Self {
        match unit_axis(Vec3::new(ax, ay, az)) {
            Some(axis) => {
                self.inner *= UnitQuaternion::from_axis_angle(&axis, angle).to_homogeneous();
            }
            None => {
                log::warn!(
                    "Ignoring rotation about degenerate axis ({}, {}, {})",
                    ax,
                    ay,
                    az
                );
            }
        }
        self
    }

    /// `self = self * Rotation(q)` for a caller-normalized quaternion.
    ///
    /// A zero or non-finite quaternion leaves the matrix unchanged.
    pub fn rotate_quat(&mut self, q: &Quat) -> &mut Self {
        match q.as_rotation() {
            Some(rotation) => self.inner *= rotation.to_homogeneous(),
            None => log::warn!("Ignoring rotation by degenerate quaternion {:?}", q.to_array()),
        }
        self
    }

    /// Apply to the point (x, y, z, 1), dividing by w when it is non-zero
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let h = self.inner * point.push(1.0);
        if h.w != 0.0 && h.w != 1.0 {
            Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w)
        } else {
            h.xyz()
        }
    }

    /// Apply to a direction, ignoring translation
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.inner.transform_vector(&v)
    }

    /// Translation part as a point
    pub fn origin(&self) -> Point3<f32> {
        Point3::new(self.inner[(0, 3)], self.inner[(1, 3)], self.inner[(2, 3)])
    }

    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|v| v.is_finite())
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4<f32>> for Mat4 {
    fn from(inner: Matrix4<f32>) -> Self {
        Self { inner }
    }
}

impl From<Mat4> for Matrix4<f32> {
    fn from(m: Mat4) -> Self {
        m.inner
    }
}

impl From<[f32; 16]> for Mat4 {
    fn from(values: [f32; 16]) -> Self {
        Self::from_cols_array(&values)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(mut self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs);
        self
    }
}

impl Mul<&Mat4> for &Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: &Mat4) -> Mat4 {
        Mat4 {
            inner: self.inner * rhs.inner,
        }
    }
}
