use nalgebra::Rotation3;

use super::{FloatType, WorldVector};

/// Rotation given by Euler angles in degrees.
///
/// Keeps both the forward rotation (used to orient the camera) and the inverse
/// rotation flattened to 9 floats in row major order, so that transforming a world
/// space point into the local frame of a shape is a single matrix-vector product.
#[derive(Clone, Debug, PartialEq)]
pub struct Rotation {
    euler_degrees: WorldVector,
    forward: Rotation3<FloatType>,
    inverse: [FloatType; 9],
}

impl Rotation {
    /// Angles are applied in x, y, z order (extrinsic), in degrees.
    pub fn from_euler_degrees(euler_degrees: WorldVector) -> Self {
        let radians = euler_degrees.map(FloatType::to_radians);
        let forward = Rotation3::from_euler_angles(radians.x, radians.y, radians.z);
        let m = forward.inverse().into_inner();

        Rotation {
            euler_degrees,
            forward,
            inverse: [
                m[(0, 0)],
                m[(0, 1)],
                m[(0, 2)],
                m[(1, 0)],
                m[(1, 1)],
                m[(1, 2)],
                m[(2, 0)],
                m[(2, 1)],
                m[(2, 2)],
            ],
        }
    }

    pub fn identity() -> Self {
        Self::from_euler_degrees(WorldVector::zeros())
    }

    pub fn euler_degrees(&self) -> &WorldVector {
        &self.euler_degrees
    }

    /// True if any of the angles is non-zero.
    /// Shapes that are not rotated skip the inverse rotation altogether.
    pub fn is_rotated(&self) -> bool {
        self.euler_degrees != WorldVector::zeros()
    }

    /// Inverse rotation matrix, row major.
    pub fn inverse_matrix(&self) -> &[FloatType; 9] {
        &self.inverse
    }

    pub fn rotate(&self, v: &WorldVector) -> WorldVector {
        self.forward * v
    }

    pub fn inverse_rotate(&self, v: &WorldVector) -> WorldVector {
        let m = &self.inverse;
        WorldVector::new(
            m[0].mul_add(v.x, m[1].mul_add(v.y, m[2] * v.z)),
            m[3].mul_add(v.x, m[4].mul_add(v.y, m[5] * v.z)),
            m[6].mul_add(v.x, m[7].mul_add(v.y, m[8] * v.z)),
        )
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}
