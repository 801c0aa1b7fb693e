use arrayvec::ArrayVec;
use simba::simd::{SimdValue as _, WideF64x4};
use wide::f64x4;

use crate::{
    error::{SphereError, SphereResult},
    geometry::{FloatType, LANES, SimdFloatType, WorldPoint, WorldVector4},
    scene::{
        primitives::Primitive,
        shape::{Shape, ShapeIdx},
    },
    util::simba::{fma_dot, splat_point, store},
};

/// Maximum number of shapes of a single kind in a scene.
pub const MAX_SHAPES_PER_KIND: usize = 256;
const GROUPS_PER_KIND: usize = MAX_SHAPES_PER_KIND / LANES;

/// Coordinate of unused slots.
/// Large enough that no real distance can ever be farther.
pub const SENTINEL: FloatType = 1e10;

/// One attribute of all shapes in a batch, grouped by `LANES` so that a group
/// loads as a single SIMD value.
#[derive(Clone, Debug)]
pub struct Column(Box<[SimdFloatType]>);

impl Column {
    pub fn filled(value: FloatType) -> Self {
        Column(vec![SimdFloatType::splat(value); GROUPS_PER_KIND].into_boxed_slice())
    }

    pub fn set(&mut self, slot: usize, value: FloatType) {
        self.0[slot / LANES].replace(slot % LANES, value);
    }

    pub fn get(&self, slot: usize) -> FloatType {
        self.0[slot / LANES].extract(slot % LANES)
    }

    #[inline(always)]
    pub fn group(&self, group: usize) -> f64x4 {
        self.0[group].0
    }
}

impl Default for Column {
    fn default() -> Self {
        Column::filled(0.0)
    }
}

/// Struct of arrays copy of all shapes of one kind, evaluated `LANES` shapes at a time.
///
/// Slots past `len()` hold sentinel values so that padded groups can be evaluated
/// together with real shapes without ever being the nearest.
#[derive(Clone, Debug)]
pub struct ShapeBatch<P: Primitive> {
    position: [Column; 3],
    /// Inverse rotation matrix, row major.
    rotation: [Column; 9],
    params: P::Lanes,
    shapes: ArrayVec<ShapeIdx, MAX_SHAPES_PER_KIND>,
}

impl<P: Primitive> ShapeBatch<P> {
    pub fn new() -> Self {
        let mut batch = ShapeBatch {
            position: Default::default(),
            rotation: Default::default(),
            params: Default::default(),
            shapes: ArrayVec::new(),
        };
        for slot in 0..MAX_SHAPES_PER_KIND {
            batch.mark_unused(slot);
        }
        batch
    }

    /// Writes sentinel position, identity rotation and sentinel parameters to the slot.
    fn mark_unused(&mut self, slot: usize) {
        for column in &mut self.position {
            column.set(slot, SENTINEL);
        }
        for (i, column) in self.rotation.iter_mut().enumerate() {
            column.set(slot, if i % 4 == 0 { 1.0 } else { 0.0 });
        }
        P::sentinel().store(&mut self.params, slot);
    }

    /// Appends a shape, `params` must be the kind specific part of `shape`.
    pub fn push(&mut self, idx: ShapeIdx, shape: &Shape, params: &P) -> SphereResult {
        let slot = self.shapes.len();
        self.shapes.try_push(idx).map_err(|_| {
            SphereError::InvalidParams(format!(
                "Too many shapes of kind {}, at most {MAX_SHAPES_PER_KIND} are supported",
                P::SHAPE_TYPE
            ))
        })?;

        let position = shape.position();
        for (column, value) in self.position.iter_mut().zip(position.iter()) {
            column.set(slot, *value);
        }
        for (column, value) in self
            .rotation
            .iter_mut()
            .zip(shape.rotation().inverse_matrix())
        {
            column.set(slot, *value);
        }
        params.store(&mut self.params, slot);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of SIMD groups needed to cover all populated slots.
    pub fn group_count(&self) -> usize {
        self.len().div_ceil(LANES)
    }

    /// Shape stored in a slot, `None` for padding.
    pub fn shape_at(&self, slot: usize) -> Option<ShapeIdx> {
        self.shapes.get(slot).copied()
    }

    /// Distances from one group of four shapes.
    #[inline(always)]
    pub fn group_distances(&self, group: usize, point: &WorldVector4) -> SimdFloatType {
        let dx = point.x.0 - self.position[0].group(group);
        let dy = point.y.0 - self.position[1].group(group);
        let dz = point.z.0 - self.position[2].group(group);

        let delta = WorldVector4::new(WideF64x4(dx), WideF64x4(dy), WideF64x4(dz));

        let row = |i: usize| {
            WorldVector4::new(
                WideF64x4(self.rotation[3 * i].group(group)),
                WideF64x4(self.rotation[3 * i + 1].group(group)),
                WideF64x4(self.rotation[3 * i + 2].group(group)),
            )
        };
        let local = WorldVector4::new(
            fma_dot(&row(0), &delta),
            fma_dot(&row(1), &delta),
            fma_dot(&row(2), &delta),
        );

        P::batch_distance(&self.params, group, &local)
    }
}

impl<P: Primitive> Default for ShapeBatch<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind erased view of a batch, used by the distance field to walk all kinds in one loop.
pub trait BatchDistances {
    /// Populated slots rounded up to a multiple of `LANES`.
    fn padded_len(&self) -> usize;

    /// Writes distances of all groups into `out`, which must be exactly `padded_len()` long.
    fn distances(&self, point: &WorldPoint, out: &mut [FloatType]);

    fn shape_at(&self, slot: usize) -> Option<ShapeIdx>;
}

impl<P: Primitive> BatchDistances for ShapeBatch<P> {
    fn padded_len(&self) -> usize {
        self.group_count() * LANES
    }

    fn distances(&self, point: &WorldPoint, out: &mut [FloatType]) {
        debug_assert_eq!(out.len(), self.padded_len());
        let point = splat_point(point);
        for (group, chunk) in out.chunks_exact_mut(LANES).enumerate() {
            store(self.group_distances(group, &point), chunk);
        }
    }

    fn shape_at(&self, slot: usize) -> Option<ShapeIdx> {
        ShapeBatch::shape_at(self, slot)
    }
}
