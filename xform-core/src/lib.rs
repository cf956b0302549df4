//! xform Core Library - 3D affine transform math
//!
//! Column-major 4x4 matrices with in-place, chainable operations for
//! translation, rotation, scale, decomposition, view and projection matrices.
//! Nothing here allocates or holds global state.

pub mod error;
pub mod geometry;
pub mod mat4;
pub mod projection;
pub mod transform;

/// Tolerance below which lengths and spans count as zero
pub const EPSILON: f32 = 1e-6;

// Re-export commonly used types
pub use error::{MathError, Result};
pub use geometry::{Quat, TransformParts, Vec3, DEFAULT_AXIS};
pub use mat4::Mat4;
pub use projection::Projection;
