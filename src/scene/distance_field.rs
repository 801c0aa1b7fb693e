use crate::{
    error::SphereResult,
    geometry::{FloatType, WorldPoint},
    scene::{
        batch::{BatchDistances, ShapeBatch},
        primitives::{Cone, Cuboid, Octahedron, Plane, Sphere, Torus},
        shape::{Shape, ShapeIdx, ShapeKind, ShapeType},
    },
};

const KIND_COUNT: usize = 6;

/// All shapes of a scene as per-kind batches, answering "which shape is nearest".
///
/// Batches are always evaluated in the order box, cone, octahedron, plane, sphere, torus;
/// their distances are laid out in this order in a single flat buffer.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    boxes: ShapeBatch<Cuboid>,
    cones: ShapeBatch<Cone>,
    octahedra: ShapeBatch<Octahedron>,
    planes: ShapeBatch<Plane>,
    spheres: ShapeBatch<Sphere>,
    tori: ShapeBatch<Torus>,

    /// Exclusive end of each batch in the flat distance buffer.
    thresholds: [usize; KIND_COUNT],
}

/// Result of a full scan.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NearestShapes {
    pub nearest: ShapeIdx,
    pub nearest_distance: FloatType,
    /// Distance of the runner up, infinite if there is only a single shape.
    pub second_distance: FloatType,
}

/// Per worker scratch space for the flat distance array.
#[derive(Clone, Debug, Default)]
pub struct DistanceBuffer(Vec<FloatType>);

impl DistanceBuffer {
    pub fn for_field(field: &DistanceField) -> Self {
        DistanceBuffer(vec![FloatType::INFINITY; field.buffer_len()])
    }
}

impl DistanceField {
    pub fn new() -> Self {
        Self::default()
    }

    fn batches(&self) -> [&dyn BatchDistances; KIND_COUNT] {
        [
            &self.boxes,
            &self.cones,
            &self.octahedra,
            &self.planes,
            &self.spheres,
            &self.tori,
        ]
    }

    /// Registers the shape in the batch of its kind.
    pub fn add(&mut self, idx: ShapeIdx, shape: &Shape) -> SphereResult {
        match shape.kind() {
            ShapeKind::Box(p) => self.boxes.push(idx, shape, p)?,
            ShapeKind::Cone(p) => self.cones.push(idx, shape, p)?,
            ShapeKind::Octahedron(p) => self.octahedra.push(idx, shape, p)?,
            ShapeKind::Plane(p) => self.planes.push(idx, shape, p)?,
            ShapeKind::Sphere(p) => self.spheres.push(idx, shape, p)?,
            ShapeKind::Torus(p) => self.tori.push(idx, shape, p)?,
        }

        let mut end = 0;
        let lengths = self.batches().map(|batch| batch.padded_len());
        for (threshold, len) in self.thresholds.iter_mut().zip(lengths) {
            end += len;
            *threshold = end;
        }

        Ok(())
    }

    /// Number of shapes of the given kind.
    pub fn count(&self, shape_type: ShapeType) -> usize {
        match shape_type {
            ShapeType::Box => self.boxes.len(),
            ShapeType::Cone => self.cones.len(),
            ShapeType::Octahedron => self.octahedra.len(),
            ShapeType::Plane => self.planes.len(),
            ShapeType::Sphere => self.spheres.len(),
            ShapeType::Torus => self.tori.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer_len() == 0
    }

    /// Length of the flat distance buffer, sum of the padded batch lengths.
    pub fn buffer_len(&self) -> usize {
        self.thresholds[KIND_COUNT - 1]
    }

    /// Evaluates every shape at `point` and returns the nearest one together with
    /// the nearest and second nearest distances.
    /// Returns `None` for an empty field.
    pub fn nearest_two(
        &self,
        point: &WorldPoint,
        buffer: &mut DistanceBuffer,
    ) -> Option<NearestShapes> {
        let len = self.buffer_len();
        if buffer.0.len() < len {
            buffer.0.resize(len, FloatType::INFINITY);
        }
        let distances = &mut buffer.0[..len];

        let mut start = 0;
        for (batch, end) in self.batches().into_iter().zip(self.thresholds) {
            batch.distances(point, &mut distances[start..end]);
            start = end;
        }

        let (index, nearest_distance, second_distance) = two_smallest(distances)?;
        Some(NearestShapes {
            nearest: self.resolve(index)?,
            nearest_distance,
            second_distance,
        })
    }

    /// Maps an index into the flat buffer back to the shape.
    fn resolve(&self, index: usize) -> Option<ShapeIdx> {
        let kind = self.thresholds.iter().position(|end| index < *end)?;
        let start = if kind == 0 { 0 } else { self.thresholds[kind - 1] };
        self.batches()[kind].shape_at(index - start)
    }
}

/// Single pass over the values, returns index and value of the minimum and the second smallest value.
fn two_smallest(values: &[FloatType]) -> Option<(usize, FloatType, FloatType)> {
    let mut iter = values.iter().copied().enumerate();
    let (mut index, mut min) = iter.next()?;
    let mut second = FloatType::INFINITY;

    for (i, v) in iter {
        if v < min {
            second = min;
            min = v;
            index = i;
        } else if v < second {
            second = v;
        }
    }

    Some((index, min, second))
}
