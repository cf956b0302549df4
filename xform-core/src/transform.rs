/// Decomposing and recomposing affine transforms
use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion};

use crate::geometry::{stable_norm, unit_axis, TransformParts, Vec3, DEFAULT_AXIS};
use crate::mat4::Mat4;

impl Mat4 {
    /// Overwrite with `Translation * Rotation * Scale` built from `parts`.
    ///
    /// A zero-length axis contributes no rotation.
    pub fn set_transform(&mut self, parts: &TransformParts) -> &mut Self {
        let rotation = parts.rotation();
        let trs = Matrix4::new_translation(&parts.position)
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&parts.scale);
        *self = Mat4::from_matrix(trs);
        self
    }

    /// Decompose into translation, per-axis scale and axis-angle rotation.
    ///
    /// Scale is the length of each basis column, so a reflection shows up as a
    /// rotation rather than a negative scale. The angle is in `[0, π]`; when it
    /// is zero the axis is reported as `(0, 1, 0)`.
    pub fn get_transform(&self) -> TransformParts {
        let m = self.as_matrix();
        let position = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);

        let columns = [0usize, 1, 2].map(|c| Vec3::new(m[(0, c)], m[(1, c)], m[(2, c)]));
        let scale = Vec3::new(
            stable_norm(&columns[0]),
            stable_norm(&columns[1]),
            stable_norm(&columns[2]),
        );

        let (angle, axis) = match rotation_from_columns(&columns) {
            Some(rotation) => axis_angle(&rotation),
            None => {
                log::debug!("Zero scale column, reporting identity rotation");
                (0.0, DEFAULT_AXIS)
            }
        };

        TransformParts {
            position,
            scale,
            angle,
            axis,
        }
    }

    /// Rotation part as a unit quaternion, identity when a scale column is zero
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.get_transform().rotation()
    }
}

fn rotation_from_columns(columns: &[Vec3; 3]) -> Option<UnitQuaternion<f32>> {
    let basis = Matrix3::from_columns(&[
        unit_axis(columns[0])?.into_inner(),
        unit_axis(columns[1])?.into_inner(),
        unit_axis(columns[2])?.into_inner(),
    ]);
    let rotation = Rotation3::from_matrix_unchecked(basis);
    Some(UnitQuaternion::from_rotation_matrix(&rotation))
}

fn axis_angle(rotation: &UnitQuaternion<f32>) -> (f32, Vec3) {
    match rotation.axis_angle() {
        Some((axis, angle)) if angle.is_finite() => (angle, axis.into_inner()),
        _ => (0.0, DEFAULT_AXIS),
    }
}
