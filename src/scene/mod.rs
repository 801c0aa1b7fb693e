pub mod batch;
pub mod description;
pub mod distance_field;
pub mod primitives;
pub mod shape;

use std::{fs::File, io::BufReader, path::Path};

use index_vec::{IndexSlice, IndexVec};

use crate::{
    camera::Camera,
    error::{SphereError, SphereResult},
    geometry::WorldPoint,
    util::Color,
};

pub use description::SceneDescription;
pub use distance_field::{DistanceBuffer, DistanceField, NearestShapes};
pub use shape::{Shape, ShapeIdx, ShapeKind, ShapeType};

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: WorldPoint,
    /// Emitted power per channel.
    pub emission: Color,
}

/// Everything that gets rendered: camera, light and shapes.
///
/// Shapes are only ever appended, every shape is also registered in the distance field.
#[derive(Clone, Debug)]
pub struct Scene {
    camera: Camera,
    light: PointLight,
    shapes: IndexVec<ShapeIdx, Shape>,
    distance_field: DistanceField,
}

impl Scene {
    pub fn new(camera: Camera, light: PointLight) -> Self {
        Scene {
            camera,
            light,
            shapes: IndexVec::new(),
            distance_field: DistanceField::new(),
        }
    }

    /// Loads a scene from a JSON description file.
    pub fn load(path: impl AsRef<Path>) -> SphereResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SphereError::SceneFileNotFound {
            path: path.to_owned(),
            source,
        })?;
        let description: SceneDescription = serde_json::from_reader(BufReader::new(file))?;
        description.into_scene()
    }

    pub fn from_json(json: &str) -> SphereResult<Self> {
        serde_json::from_str::<SceneDescription>(json)?.into_scene()
    }

    /// Appends a shape to the scene.
    /// Fails if the shape has invalid parameters or if there are too many shapes of its kind.
    pub fn add_shape(&mut self, shape: Shape) -> SphereResult<ShapeIdx> {
        shape.kind().validate()?;
        let idx = self.shapes.next_idx();
        self.distance_field.add(idx, &shape)?;
        self.shapes.push(shape);
        Ok(idx)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn shapes(&self) -> &IndexSlice<ShapeIdx, [Shape]> {
        &self.shapes
    }

    pub fn shape(&self, idx: ShapeIdx) -> &Shape {
        &self.shapes[idx]
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.distance_field
    }

    /// Full scan of all shapes, see [`DistanceField::nearest_two`].
    pub fn nearest_two(
        &self,
        point: &WorldPoint,
        buffer: &mut DistanceBuffer,
    ) -> Option<NearestShapes> {
        self.distance_field.nearest_two(point, buffer)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use assert2::{assert, let_assert};
    use test_case::test_case;

    use super::*;
    use crate::scene::{batch::MAX_SHAPES_PER_KIND, primitives::Sphere};

    fn empty_scene() -> Scene {
        Scene::new(
            Camera::builder().fov(30.0).build(),
            PointLight {
                position: WorldPoint::new(0.0, 10.0, 0.0),
                emission: Color::new(10.0, 10.0, 10.0),
            },
        )
    }

    fn scene_file(name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "scenes", name].iter().collect()
    }

    #[test]
    fn add_shape_returns_consecutive_indices() {
        let mut scene = empty_scene();
        for i in 0..3 {
            let shape = Shape::builder().kind(Sphere { radius: 1.0 }).build();
            let_assert!(Ok(idx) = scene.add_shape(shape));
            assert!(idx == ShapeIdx::new(i));
        }
        assert!(scene.shapes().len() == 3);
        assert!(scene.distance_field().count(ShapeType::Sphere) == 3);
    }

    #[test]
    fn failed_add_leaves_scene_unchanged() {
        let mut scene = empty_scene();
        let shape = Shape::builder().kind(Sphere { radius: 1.0 }).build();
        for _ in 0..MAX_SHAPES_PER_KIND {
            assert!(scene.add_shape(shape.clone()).is_ok());
        }

        let_assert!(Err(SphereError::InvalidParams(_)) = scene.add_shape(shape));
        assert!(scene.shapes().len() == MAX_SHAPES_PER_KIND);

        let invalid = Shape::builder().kind(Sphere { radius: -1.0 }).build();
        let_assert!(Err(SphereError::InvalidParams(_)) = empty_scene().add_shape(invalid));
    }

    #[test]
    fn missing_file() {
        let_assert!(
            Err(SphereError::SceneFileNotFound { path, .. }) =
                Scene::load(scene_file("does_not_exist.json"))
        );
        assert!(path.ends_with("does_not_exist.json"));
    }

    #[test_case("single_sphere.json", 1)]
    #[test_case("showcase.json", 9)]
    fn bundled_scenes_load(name: &str, shape_count: usize) {
        let_assert!(Ok(scene) = Scene::load(scene_file(name)));
        assert!(scene.shapes().len() == shape_count);
    }

    #[test]
    fn from_json_string() {
        let json = r#"{
            "camera": {"fov": 30, "position": {}, "rotation": {}},
            "pointlight": {"position": {"y": 10}, "emission": {"x": 10, "y": 10, "z": 10}},
            "objects": [{"kind": "sphere", "position": {"z": 5}, "rotation": {}, "color": {},
                         "params": {"radius": 1}}]
        }"#;
        let_assert!(Ok(scene) = Scene::from_json(json));
        let mut buffer = DistanceBuffer::for_field(scene.distance_field());
        let_assert!(Some(nearest) = scene.nearest_two(&WorldPoint::origin(), &mut buffer));
        assert!(nearest.nearest == ShapeIdx::new(0));
        assert!(nearest.nearest_distance == 4.0);
    }
}
