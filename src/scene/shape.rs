use std::fmt::Display;

use bon::bon;

use crate::{
    geometry::{FloatType, Rotation, WorldPoint, WorldVector},
    scene::primitives::{Cone, Cuboid, Octahedron, Plane, Primitive, Sphere, Torus},
    util::{BLACK, Color},
};

index_vec::define_index_type! {
    /// Position of a shape in the scene, in scene description order.
    pub struct ShapeIdx = u32;
}

/// Closed set of the supported shape kinds, with their kind specific parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Plane(Plane),
    Box(Cuboid),
    Sphere(Sphere),
    Torus(Torus),
    Octahedron(Octahedron),
    Cone(Cone),
}

macro_rules! impl_from_primitive {
    ($($variant:ident($primitive:ty)),* $(,)?) => {
        $(
            impl From<$primitive> for ShapeKind {
                fn from(value: $primitive) -> Self {
                    ShapeKind::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive!(
    Plane(Plane),
    Box(Cuboid),
    Sphere(Sphere),
    Torus(Torus),
    Octahedron(Octahedron),
    Cone(Cone),
);

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Plane(_) => ShapeType::Plane,
            ShapeKind::Box(_) => ShapeType::Box,
            ShapeKind::Sphere(_) => ShapeType::Sphere,
            ShapeKind::Torus(_) => ShapeType::Torus,
            ShapeKind::Octahedron(_) => ShapeType::Octahedron,
            ShapeKind::Cone(_) => ShapeType::Cone,
        }
    }

    pub fn validate(&self) -> crate::error::SphereResult {
        match self {
            ShapeKind::Plane(p) => p.validate(),
            ShapeKind::Box(p) => p.validate(),
            ShapeKind::Sphere(p) => p.validate(),
            ShapeKind::Torus(p) => p.validate(),
            ShapeKind::Octahedron(p) => p.validate(),
            ShapeKind::Cone(p) => p.validate(),
        }
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        match self {
            ShapeKind::Plane(p) => p.distance(local),
            ShapeKind::Box(p) => p.distance(local),
            ShapeKind::Sphere(p) => p.distance(local),
            ShapeKind::Torus(p) => p.distance(local),
            ShapeKind::Octahedron(p) => p.distance(local),
            ShapeKind::Cone(p) => p.distance(local),
        }
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        match self {
            ShapeKind::Plane(p) => p.distance_squared(local),
            ShapeKind::Box(p) => p.distance_squared(local),
            ShapeKind::Sphere(p) => p.distance_squared(local),
            ShapeKind::Torus(p) => p.distance_squared(local),
            ShapeKind::Octahedron(p) => p.distance_squared(local),
            ShapeKind::Cone(p) => p.distance_squared(local),
        }
    }
}

/// Kind tag, with the names used in scene descriptions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Plane,
    Box,
    Sphere,
    Torus,
    Octahedron,
    Cone,
}

impl ShapeType {
    pub const ALL: [ShapeType; 6] = [
        ShapeType::Plane,
        ShapeType::Box,
        ShapeType::Sphere,
        ShapeType::Torus,
        ShapeType::Octahedron,
        ShapeType::Cone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Plane => "plane",
            ShapeType::Box => "box",
            ShapeType::Sphere => "sphere",
            ShapeType::Torus => "torus",
            ShapeType::Octahedron => "octahedron",
            ShapeType::Cone => "cone",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A shape placed in the scene.
/// Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    position: WorldPoint,
    rotation: Rotation,
    reflection: FloatType,
    shininess: FloatType,
    color: Color,
    kind: ShapeKind,
}

#[bon]
impl Shape {
    #[builder]
    pub fn new(
        #[builder(into)] kind: ShapeKind,
        #[builder(default = WorldPoint::origin())] position: WorldPoint,
        // Euler angles in degrees
        #[builder(default = WorldVector::zeros())]
        rotation: WorldVector,
        // Weight of the mirrored color, 0 to 1
        #[builder(default)]
        reflection: FloatType,
        // Specular exponent, values <= 0 disable the highlight
        #[builder(default)]
        shininess: FloatType,
        #[builder(default = BLACK)] color: Color,
    ) -> Self {
        Shape {
            position,
            rotation: Rotation::from_euler_degrees(rotation),
            reflection,
            shininess,
            color,
            kind,
        }
    }
}

impl Shape {
    pub fn position(&self) -> &WorldPoint {
        &self.position
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn reflection(&self) -> FloatType {
        self.reflection
    }

    pub fn shininess(&self) -> FloatType {
        self.shininess
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Transforms a world space point into the local frame of the shape.
    pub fn to_local(&self, point: &WorldPoint) -> WorldVector {
        let translated = point - self.position;
        if self.rotation.is_rotated() {
            self.rotation.inverse_rotate(&translated)
        } else {
            translated
        }
    }

    /// Signed distance from a world space point, negative inside.
    pub fn distance(&self, point: &WorldPoint) -> FloatType {
        self.kind.distance(&self.to_local(point))
    }

    pub fn distance_squared(&self, point: &WorldPoint) -> FloatType {
        self.kind.distance_squared(&self.to_local(point))
    }
}
