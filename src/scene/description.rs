//! Serde model of the JSON scene description.
//!
//! ```json
//! {
//!   "camera": {"fov": 30, "position": {"x": 0, "y": 0, "z": 0}, "rotation": {"x": 0, "y": 0, "z": 0}},
//!   "pointlight": {"position": {"x": 0, "y": 10, "z": 0}, "emission": {"x": 40, "y": 40, "z": 40}},
//!   "objects": [
//!     {"kind": "sphere", "position": {..}, "rotation": {..}, "reflection": 0.2, "shininess": 15,
//!      "color": {"x": 1, "y": 0, "z": 0}, "params": {"radius": 1}}
//!   ]
//! }
//! ```
//! Missing numbers default to zero, missing nested objects (position, color, params) are an error.
//! Objects with unknown or missing kind are skipped.

use serde::Deserialize;
use tracing::debug;

use crate::{
    camera::Camera,
    error::SphereResult,
    geometry::{FloatType, WorldPoint, WorldVector},
    scene::{
        PointLight, Scene,
        primitives::{Cone, Cuboid, Octahedron, Plane, Sphere, Torus},
        shape::{Shape, ShapeKind, ShapeType},
    },
    util::Color,
};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Triple {
    pub x: FloatType,
    pub y: FloatType,
    pub z: FloatType,
}

impl Triple {
    pub fn point(self) -> WorldPoint {
        WorldPoint::new(self.x, self.y, self.z)
    }

    pub fn vector(self) -> WorldVector {
        WorldVector::new(self.x, self.y, self.z)
    }

    /// x, y, z as r, g, b.
    pub fn color(self) -> Color {
        Color::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneDescription {
    pub camera: CameraDescription,
    pub pointlight: PointLightDescription,
    /// Kept as raw values, so that unknown kinds can be skipped one by one.
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CameraDescription {
    #[serde(default)]
    pub fov: FloatType,
    pub position: Triple,
    pub rotation: Triple,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PointLightDescription {
    pub position: Triple,
    pub emission: Triple,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ObjectDescription {
    Plane(ShapeDescription<PlaneParams>),
    Box(ShapeDescription<BoxParams>),
    Sphere(ShapeDescription<SphereParams>),
    Torus(ShapeDescription<TorusParams>),
    Octahedron(ShapeDescription<OctahedronParams>),
    Cone(ShapeDescription<ConeParams>),
}

#[derive(Clone, Debug, Deserialize)]
struct ShapeDescription<P> {
    position: Triple,
    rotation: Triple,
    #[serde(default)]
    reflection: FloatType,
    #[serde(default)]
    shininess: FloatType,
    color: Triple,
    params: P,
}

#[derive(Clone, Debug, Deserialize)]
struct PlaneParams {
    normal: Triple,
    #[serde(default)]
    displacement: FloatType,
}

#[derive(Clone, Debug, Deserialize)]
struct BoxParams {
    extents: Triple,
}

#[derive(Clone, Debug, Deserialize)]
struct SphereParams {
    #[serde(default)]
    radius: FloatType,
}

#[derive(Clone, Debug, Deserialize)]
struct TorusParams {
    #[serde(default)]
    r1: FloatType,
    #[serde(default)]
    r2: FloatType,
}

#[derive(Clone, Debug, Deserialize)]
struct OctahedronParams {
    #[serde(default)]
    s: FloatType,
}

/// `[r1, r2, h]`
#[derive(Clone, Debug, Deserialize)]
struct ConeParams(FloatType, FloatType, FloatType);

impl From<PlaneParams> for ShapeKind {
    fn from(params: PlaneParams) -> Self {
        Plane {
            normal: params.normal.vector(),
            displacement: params.displacement,
        }
        .into()
    }
}

impl From<BoxParams> for ShapeKind {
    fn from(params: BoxParams) -> Self {
        Cuboid {
            extents: params.extents.vector(),
        }
        .into()
    }
}

impl From<SphereParams> for ShapeKind {
    fn from(params: SphereParams) -> Self {
        Sphere {
            radius: params.radius,
        }
        .into()
    }
}

impl From<TorusParams> for ShapeKind {
    fn from(params: TorusParams) -> Self {
        Torus {
            r1: params.r1,
            r2: params.r2,
        }
        .into()
    }
}

impl From<OctahedronParams> for ShapeKind {
    fn from(params: OctahedronParams) -> Self {
        Octahedron { size: params.s }.into()
    }
}

impl From<ConeParams> for ShapeKind {
    fn from(ConeParams(r1, r2, h): ConeParams) -> Self {
        Cone::new(r1, r2, h).into()
    }
}

impl<P: Into<ShapeKind>> ShapeDescription<P> {
    fn into_shape(self) -> Shape {
        Shape::builder()
            .kind(self.params)
            .position(self.position.point())
            .rotation(self.rotation.vector())
            .reflection(self.reflection)
            .shininess(self.shininess)
            .color(self.color.color())
            .build()
    }
}

impl ObjectDescription {
    fn into_shape(self) -> Shape {
        match self {
            ObjectDescription::Plane(d) => d.into_shape(),
            ObjectDescription::Box(d) => d.into_shape(),
            ObjectDescription::Sphere(d) => d.into_shape(),
            ObjectDescription::Torus(d) => d.into_shape(),
            ObjectDescription::Octahedron(d) => d.into_shape(),
            ObjectDescription::Cone(d) => d.into_shape(),
        }
    }
}

/// Parses a single object, `None` if its kind is not known.
fn parse_object(value: serde_json::Value) -> SphereResult<Option<Shape>> {
    match value
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .map(ShapeType::from_name)
    {
        Some(Some(_)) => {}
        _ => {
            debug!(kind = ?value.get("kind"), "Skipping object of unknown kind");
            return Ok(None);
        }
    }

    let object: ObjectDescription = serde_json::from_value(value)?;
    Ok(Some(object.into_shape()))
}

impl SceneDescription {
    pub fn into_scene(self) -> SphereResult<Scene> {
        let camera = Camera::builder()
            .fov(self.camera.fov)
            .position(self.camera.position.point())
            .rotation(self.camera.rotation.vector())
            .build();
        let light = PointLight {
            position: self.pointlight.position.point(),
            emission: self.pointlight.emission.color(),
        };

        let mut scene = Scene::new(camera, light);
        let mut skipped = 0usize;
        for value in self.objects {
            match parse_object(value)? {
                Some(shape) => {
                    scene.add_shape(shape)?;
                }
                None => skipped += 1,
            }
        }

        let field = scene.distance_field();
        debug!(
            planes = field.count(ShapeType::Plane),
            boxes = field.count(ShapeType::Box),
            spheres = field.count(ShapeType::Sphere),
            tori = field.count(ShapeType::Torus),
            octahedra = field.count(ShapeType::Octahedron),
            cones = field.count(ShapeType::Cone),
            skipped,
            "Scene loaded"
        );

        Ok(scene)
    }
}
