use std::fmt::Display;

/// Counters collected while rendering.
///
/// Every worker owns its own instance, the instances are merged when the render finishes.
/// All hooks default to doing nothing, so that `NoInstrumentation` compiles away.
pub trait Instrumentation: Default + Send + 'static {
    /// A full scan evaluated `evaluated` distances (including padding).
    fn full_scan(&mut self, _evaluated: usize) {}

    /// A march step evaluated only the cached nearest shape.
    fn cached_step(&mut self) {}

    /// Surface normal estimated by central differences.
    fn normal_estimate(&mut self) {}

    fn shadow_ray(&mut self) {}

    fn reflection_ray(&mut self) {}

    fn merge(&mut self, other: Self);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoInstrumentation;

impl Instrumentation for NoInstrumentation {
    fn merge(&mut self, _other: Self) {}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarchCounters {
    pub distance_evaluations: u64,
    pub full_scans: u64,
    pub cached_steps: u64,
    pub shadow_rays: u64,
    pub reflection_rays: u64,
}

impl Instrumentation for MarchCounters {
    fn full_scan(&mut self, evaluated: usize) {
        self.full_scans += 1;
        self.distance_evaluations += evaluated as u64;
    }

    fn cached_step(&mut self) {
        self.cached_steps += 1;
        self.distance_evaluations += 1;
    }

    fn normal_estimate(&mut self) {
        self.distance_evaluations += 6;
    }

    fn shadow_ray(&mut self) {
        self.shadow_rays += 1;
    }

    fn reflection_ray(&mut self) {
        self.reflection_rays += 1;
    }

    fn merge(&mut self, other: Self) {
        self.distance_evaluations += other.distance_evaluations;
        self.full_scans += other.full_scans;
        self.cached_steps += other.cached_steps;
        self.shadow_rays += other.shadow_rays;
        self.reflection_rays += other.reflection_rays;
    }
}

impl Display for MarchCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} distance evaluations; {} full scans; {} cached steps; {} shadow rays; {} reflection rays",
            self.distance_evaluations,
            self.full_scans,
            self.cached_steps,
            self.shadow_rays,
            self.reflection_rays
        )
    }
}
