/// View and projection matrices
use std::f32::consts::PI;

use nalgebra::{Matrix4, Rotation3, Unit};

use crate::error::{MathError, Result};
use crate::geometry::{unit_axis, Vec3};
use crate::mat4::Mat4;
use crate::EPSILON;

/// Parameters of a projection, storable as a value and applied with
/// [`Mat4::projection`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// `fov` is the full vertical field of view in radians
    Perspective {
        near: f32,
        far: f32,
        fov: f32,
        aspect: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn matrix(&self) -> Result<Mat4> {
        let mut m = Mat4::identity();
        m.projection(self)?;
        Ok(m)
    }
}

impl Mat4 {
    /// Overwrite with an OpenGL perspective projection (clip z in `[-1, 1]`).
    ///
    /// `near` and `far` must be positive and distinct, `fov` is the full
    /// vertical field of view in `(0, π)` and `aspect` is width over height.
    pub fn perspective(&mut self, near: f32, far: f32, fov: f32, aspect: f32) -> Result<&mut Self> {
        check_finite("perspective", &[near, far, fov, aspect])?;
        if near <= 0.0 || far <= 0.0 {
            return Err(MathError::InvalidArgument(format!(
                "perspective clip planes must be positive (near {}, far {})",
                near, far
            )));
        }
        if fov <= 0.0 || fov >= PI {
            return Err(MathError::InvalidArgument(format!(
                "field of view {} is outside (0, pi)",
                fov
            )));
        }
        if aspect <= EPSILON {
            return Err(MathError::InvalidArgument(format!(
                "aspect ratio {} must be positive",
                aspect
            )));
        }
        if coincident(near, far) {
            return Err(MathError::Degenerate(format!(
                "near and far planes coincide at {}",
                near
            )));
        }

        *self = Mat4::from_matrix(Matrix4::new_perspective(aspect, fov, near, far));
        Ok(self)
    }

    /// Overwrite with an OpenGL orthographic projection.
    ///
    /// `left`/`right` map to x = -1/+1, `top`/`bottom` to y = +1/-1 and
    /// `near`/`far` to z = -1/+1. Screen-space callers with y growing down
    /// pass `top = 0` and `bottom = height`.
    pub fn orthographic(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self> {
        check_finite("orthographic", &[left, right, top, bottom, near, far])?;
        for (name, a, b) in [
            ("left and right", left, right),
            ("top and bottom", top, bottom),
            ("near and far", near, far),
        ] {
            if coincident(a, b) {
                return Err(MathError::Degenerate(format!(
                    "orthographic {} bounds coincide at {}",
                    name, a
                )));
            }
        }

        *self = Mat4::from_matrix(Matrix4::new_orthographic(left, right, bottom, top, near, far));
        Ok(self)
    }

    /// Overwrite with a right-handed view matrix at `eye` facing `target`.
    ///
    /// When `eye` and `target` coincide the view faces down -Z from `eye`.
    /// An `up` hint that is zero, non-finite or parallel to the view direction
    /// is replaced by the world axis least aligned with it. A non-finite `eye`
    /// or `target`, or an `eye` too far out for its view translation to fit in
    /// `f32`, yields the identity.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) -> &mut Self {
        if !eye.iter().chain(target.iter()).all(|c| c.is_finite()) {
            log::warn!(
                "look_at with non-finite eye {:?} or target {:?}, using identity",
                eye,
                target
            );
            self.set_identity();
            return self;
        }

        let mut forward = target - eye;
        if !forward.iter().all(|c| c.is_finite()) {
            // Same direction, half the magnitude
            forward = target * 0.5 - eye * 0.5;
        }
        let direction = match unit_axis(forward) {
            Some(direction) => direction,
            None => {
                log::warn!("look_at eye and target coincide at {:?}, facing -Z", eye);
                *self = Mat4::from_matrix(Matrix4::new_translation(&-eye));
                return self;
            }
        };

        let up = stable_up(&direction, up);
        let rotation = Rotation3::face_towards(&-direction.into_inner(), &up).inverse();
        let translation = -(rotation * eye);
        if !translation.iter().all(|c| c.is_finite()) {
            log::warn!("look_at eye {:?} is out of range, using identity", eye);
            self.set_identity();
            return self;
        }

        let mut view = rotation.to_homogeneous();
        view[(0, 3)] = translation.x;
        view[(1, 3)] = translation.y;
        view[(2, 3)] = translation.z;
        *self = Mat4::from_matrix(view);
        self
    }

    pub fn projection(&mut self, projection: &Projection) -> Result<&mut Self> {
        match *projection {
            Projection::Perspective {
                near,
                far,
                fov,
                aspect,
            } => self.perspective(near, far, fov, aspect),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => self.orthographic(left, right, top, bottom, near, far),
        }
    }
}

fn check_finite(operation: &str, values: &[f32]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MathError::InvalidArgument(format!(
            "{} arguments must be finite, got {:?}",
            operation, values
        )))
    }
}

/// Whether two bounds are too close to span a usable range
fn coincident(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0)
}

fn stable_up(direction: &Unit<Vec3>, up: Vec3) -> Vec3 {
    if let Some(up) = unit_axis(up) {
        if up.cross(&**direction).norm() > EPSILON {
            return up.into_inner();
        }
    }

    let d = direction.abs();
    let fallback = if d.x <= d.y && d.x <= d.z {
        Vec3::x()
    } else if d.y <= d.z {
        Vec3::y()
    } else {
        Vec3::z()
    };
    log::warn!(
        "look_at up hint {:?} is parallel to view direction, using {:?}",
        up,
        fallback
    );
    fallback
}
