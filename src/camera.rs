use bon::bon;

use crate::geometry::{FloatType, PlaneVector, Ray, Rotation, WorldPoint, WorldVector};

/// Pinhole camera looking along its local +z axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees. The horizontal extent follows the image aspect ratio.
    fov: FloatType,
    position: WorldPoint,
    rotation: Rotation,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        fov: FloatType,
        #[builder(default = WorldPoint::origin())] position: WorldPoint,
        // Euler angles in degrees
        #[builder(default = WorldVector::zeros())]
        rotation: WorldVector,
    ) -> Self {
        Camera {
            fov,
            position,
            rotation: Rotation::from_euler_degrees(rotation),
        }
    }
}

impl Camera {
    pub fn fov(&self) -> FloatType {
        self.fov
    }

    pub fn position(&self) -> &WorldPoint {
        &self.position
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Primary ray through a point of the image plane at z = 1 in camera space.
    pub fn ray(&self, camera_coords: &PlaneVector) -> Ray {
        let direction = WorldVector::new(camera_coords.x, camera_coords.y, 1.0);
        let direction = if self.rotation.is_rotated() {
            self.rotation.rotate(&direction)
        } else {
            direction
        };
        Ray::new(self.position, direction)
    }
}
