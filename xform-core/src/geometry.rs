/// Geometry primitives used as transform inputs and outputs
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

use crate::EPSILON;

/// A 3-component vector (translation, scale, axis or point)
pub type Vec3 = Vector3<f32>;

/// Default rotation axis reported when a rotation has no defined axis
pub const DEFAULT_AXIS: Vec3 = Vector3::new(0.0, 1.0, 0.0);

/// A rotation quaternion in (x, y, z, w) order.
///
/// The caller is responsible for keeping it normalized; operations that
/// consume a `Quat` do not renormalize it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat(pub Quaternion<f32>);

impl Quat {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        // nalgebra takes the scalar part first
        Self(Quaternion::new(w, x, y, z))
    }

    pub fn identity() -> Self {
        Self(Quaternion::identity())
    }

    /// Build a unit quaternion from an axis (normalized here) and an angle in radians.
    ///
    /// Returns `None` for a zero-length or non-finite axis.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Option<Self> {
        let axis = unit_axis(axis)?;
        Some(Self(UnitQuaternion::from_axis_angle(&axis, angle).into_inner()))
    }

    pub fn x(&self) -> f32 {
        self.0.i
    }

    pub fn y(&self) -> f32 {
        self.0.j
    }

    pub fn z(&self) -> f32 {
        self.0.k
    }

    pub fn w(&self) -> f32 {
        self.0.w
    }

    /// Components in (x, y, z, w) order
    pub fn to_array(&self) -> [f32; 4] {
        [self.x(), self.y(), self.z(), self.w()]
    }

    /// Wrap as a unit quaternion without renormalizing.
    ///
    /// Returns `None` when the quaternion is zero or not finite, since no
    /// rotation can be read from it.
    pub(crate) fn as_rotation(&self) -> Option<UnitQuaternion<f32>> {
        let norm = self.0.norm();
        if !norm.is_finite() || norm <= EPSILON {
            return None;
        }
        Some(UnitQuaternion::new_unchecked(self.0))
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<UnitQuaternion<f32>> for Quat {
    fn from(q: UnitQuaternion<f32>) -> Self {
        Self(q.into_inner())
    }
}

/// A transform decomposed into position, scale and axis-angle rotation.
///
/// Recomposed in TRS order by [`Mat4::set_transform`](crate::Mat4::set_transform).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParts {
    pub position: Vec3,
    pub scale: Vec3,
    /// Rotation angle in radians
    pub angle: f32,
    pub axis: Vec3,
}

impl TransformParts {
    pub fn new(position: Vec3, scale: Vec3, angle: f32, axis: Vec3) -> Self {
        Self {
            position,
            scale,
            angle,
            axis,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32, sz: f32) -> Self {
        self.scale = Vec3::new(sx, sy, sz);
        self
    }

    pub fn with_rotation(mut self, angle: f32, ax: f32, ay: f32, az: f32) -> Self {
        self.angle = angle;
        self.axis = Vec3::new(ax, ay, az);
        self
    }

    /// Rotation as a unit quaternion, identity when the axis is degenerate
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        match unit_axis(self.axis) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, self.angle),
            None => UnitQuaternion::identity(),
        }
    }
}

impl Default for TransformParts {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            angle: 0.0,
            axis: DEFAULT_AXIS,
        }
    }
}

/// Length of `v`, computed on a rescaled copy so large components cannot
/// overflow the sum of squares
pub(crate) fn stable_norm(v: &Vec3) -> f32 {
    let largest = v.amax();
    if largest == 0.0 || !largest.is_finite() {
        return largest;
    }
    (v / largest).norm() * largest
}

/// Normalize a direction of any finite magnitude.
///
/// Only an exactly zero or non-finite vector is rejected. Dividing by the
/// largest component first keeps the squared norm in `[1, 3]`.
pub(crate) fn unit_axis(axis: Vec3) -> Option<Unit<Vec3>> {
    if !axis.iter().all(|c| c.is_finite()) {
        return None;
    }
    let largest = axis.amax();
    if largest == 0.0 {
        return None;
    }
    Some(Unit::new_normalize(axis / largest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quat_component_order() {
        let q = Quat::new(0.1, 0.2, 0.3, 0.9);
        assert_eq!(q.to_array(), [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(q.w(), 0.9);
    }

    #[test]
    fn test_quat_from_axis_angle_normalizes_axis() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 10.0), std::f32::consts::PI).unwrap();
        assert_abs_diff_eq!(q.z(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(q.w(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unit_axis_handles_extreme_lengths() {
        let huge = unit_axis(Vec3::new(1e20, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(huge.into_inner(), Vec3::x(), epsilon = 1e-6);

        let diagonal = unit_axis(Vec3::new(3e38, 3e38, 0.0)).unwrap();
        assert_abs_diff_eq!(diagonal.norm(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(diagonal.x, diagonal.y, epsilon = 1e-6);

        let tiny = unit_axis(Vec3::new(0.0, 1e-7, 0.0)).unwrap();
        assert_abs_diff_eq!(tiny.into_inner(), Vec3::y(), epsilon = 1e-6);

        let subnormal = unit_axis(Vec3::new(0.0, 0.0, -1e-40)).unwrap();
        assert_abs_diff_eq!(subnormal.into_inner(), -Vec3::z(), epsilon = 1e-6);

        assert!(unit_axis(Vec3::new(f32::INFINITY, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_stable_norm() {
        assert_eq!(stable_norm(&Vec3::zeros()), 0.0);
        assert_abs_diff_eq!(stable_norm(&Vec3::new(3.0, 4.0, 0.0)), 5.0, epsilon = 1e-6);
        let large = stable_norm(&Vec3::new(3e19, 4e19, 0.0));
        assert!(large.is_finite());
        assert_abs_diff_eq!(large / 5e19, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_quat_rejects_zero_axis() {
        assert!(Quat::from_axis_angle(Vec3::zeros(), 1.0).is_none());
        assert!(Quat::new(0.0, 0.0, 0.0, 0.0).as_rotation().is_none());
    }

    #[test]
    fn test_default_parts() {
        let parts = TransformParts::default();
        assert_eq!(parts.position, Vec3::zeros());
        assert_eq!(parts.scale, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(parts.angle, 0.0);
        assert_eq!(parts.axis, DEFAULT_AXIS);
        assert_eq!(parts.rotation(), UnitQuaternion::identity());
    }

    #[test]
    fn test_parts_builder() {
        let parts = TransformParts::default()
            .with_position(1.0, 2.0, 3.0)
            .with_scale(2.0, 2.0, 2.0)
            .with_rotation(0.5, 1.0, 0.0, 0.0);
        assert_eq!(parts.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(parts.scale, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(parts.angle, 0.5);
        assert_eq!(parts.axis, Vec3::x());
    }
}
