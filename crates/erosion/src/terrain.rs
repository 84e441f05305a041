//! Height-field terrain state.
//!
//! The grid is a set of dense per-cell `f32` layers in row-major order.
//! Surface height is split into slow-eroding bedrock and fast-moving
//! sediment, with `height[i] == bedrock[i] + sediment[i]` held as the
//! standing invariant; the discharge and momentum layers carry a temporally
//! smoothed picture of water flow, fed from raw per-step track accumulators
//! by the solver.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::math;
use crate::params::SimParams;

/// Exponent applied to the accumulated octave sum; sharpens peaks relative
/// to valley floors before normalization.
const HEIGHT_EXPONENT: f64 = 1.2;

/// Octave sample offsets are drawn from this range.
const OFFSET_RANGE: f64 = 100_000.0;

/// Scale applied to raw discharge before the saturating response.
const DISCHARGE_RESPONSE_SCALE: f64 = 0.4;

/// An N x N height-field grid with layered composition and flow state.
///
/// All layers are public for read access between solver steps; writers are
/// expected to go through the solver or to restore the invariant with
/// [`Terrain::update_total_height`] after touching the layers directly.
#[derive(Clone)]
pub struct Terrain {
    /// Grid side length.
    pub size: usize,
    /// Cell count, `size * size`.
    pub area: usize,

    /// Current surface elevation, the sum of bedrock and sediment.
    pub height: Vec<f32>,
    /// Elevation snapshot captured by the last `generate`; `reset` restores
    /// it and it is not touched otherwise.
    pub original_height: Vec<f32>,

    /// Slow-eroding base layer.
    pub bedrock: Vec<f32>,
    /// Fast-moving loose layer.
    pub sediment: Vec<f32>,

    /// Temporally smoothed flow intensity.
    pub discharge: Vec<f32>,
    /// Raw discharge accumulated during the current step.
    pub discharge_track: Vec<f32>,

    /// Temporally smoothed flow direction, x component.
    pub momentum_x: Vec<f32>,
    /// Temporally smoothed flow direction, y component.
    pub momentum_y: Vec<f32>,
    /// Raw momentum accumulated during the current step.
    pub momentum_x_track: Vec<f32>,
    /// Raw momentum accumulated during the current step.
    pub momentum_y_track: Vec<f32>,
}

impl Terrain {
    /// Allocate a zeroed grid of `size * size` cells.
    pub fn new(size: usize) -> Self {
        let area = size * size;
        Self {
            size,
            area,
            height: vec![0.0; area],
            original_height: vec![0.0; area],
            bedrock: vec![0.0; area],
            sediment: vec![0.0; area],
            discharge: vec![0.0; area],
            discharge_track: vec![0.0; area],
            momentum_x: vec![0.0; area],
            momentum_y: vec![0.0; area],
            momentum_x_track: vec![0.0; area],
            momentum_y_track: vec![0.0; area],
        }
    }

    /// Row-major cell index.
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    /// Bounds-checked height lookup. Out-of-range coordinates read as 0.0,
    /// the "no terrain" sentinel that also keeps droplets from spawning on
    /// them.
    #[inline]
    pub fn height_at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 {
            return 0.0;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.size || y >= self.size {
            return 0.0;
        }
        self.height[y * self.size + x]
    }

    /// Recompute the surface height of one cell from its layers. Must follow
    /// any direct bedrock or sediment write.
    #[inline]
    pub fn update_total_height(&mut self, i: usize) {
        self.height[i] = self.bedrock[i] + self.sediment[i];
    }

    /// Unit surface normal at a cell.
    ///
    /// Central differences along both axes, with border cells substituting
    /// themselves for the missing neighbour; `height_scale` is the
    /// renderer's vertical exaggeration, so droplets accelerate down the
    /// slope that is actually drawn. Returns an owned vector, y up.
    pub fn surface_normal(&self, x: usize, y: usize, height_scale: f32) -> Vec3 {
        let size = self.size;
        let row = y * size;

        let west = if x > 0 { row + x - 1 } else { row + x };
        let east = if x < size - 1 { row + x + 1 } else { row + x };
        let north = if y > 0 { row - size + x } else { row + x };
        let south = if y < size - 1 { row + size + x } else { row + x };

        let dx = (self.height[west] - self.height[east]) * height_scale;
        let dz = (self.height[north] - self.height[south]) * height_scale;

        Vec3::new(dx, 1.0, dz).normalize()
    }

    /// Saturating response of the smoothed discharge at a cell: an
    /// unbounded accumulated-flow quantity mapped into (-1, 1).
    pub fn discharge_at(&self, i: usize) -> f32 {
        math::erf(DISCHARGE_RESPONSE_SCALE * f64::from(self.discharge[i])) as f32
    }

    /// Fill the height layers from multi-octave noise.
    ///
    /// Each octave samples the noise at an independent random offset, with
    /// frequency doubling and amplitude decaying by `amplitude_falloff` per
    /// octave. The per-cell sum is raised to a fixed exponent to sharpen
    /// peaks, then the whole grid is min-max normalized to [0, 1] and
    /// written to `height`, `bedrock` and `original_height`; every dynamic
    /// layer is zeroed. The same seed reproduces the same terrain; `None`
    /// seeds from entropy.
    pub fn generate(&mut self, params: &SimParams, seed: Option<u64>) {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let perlin = Perlin::new(rng.gen());

        for map in [
            &mut self.height,
            &mut self.original_height,
            &mut self.bedrock,
            &mut self.sediment,
            &mut self.discharge,
            &mut self.discharge_track,
            &mut self.momentum_x,
            &mut self.momentum_y,
            &mut self.momentum_x_track,
            &mut self.momentum_y_track,
        ] {
            map.fill(0.0);
        }

        let mut offsets = Vec::with_capacity(params.noise_octaves as usize);
        for _ in 0..params.noise_octaves {
            offsets.push((
                rng.gen_range(0.0..OFFSET_RANGE),
                rng.gen_range(0.0..OFFSET_RANGE),
            ));
        }

        let base_frequency = f64::from(params.noise_scale) / 100.0;
        let falloff = f64::from(params.amplitude_falloff);

        for i in 0..self.area {
            let x = (i % self.size) as f64;
            let y = (i / self.size) as f64;

            let mut amplitude = 1.0;
            let mut frequency = base_frequency;
            let mut accumulated = 0.0;

            for &(offset_x, offset_y) in &offsets {
                let sample = perlin.get([x * frequency + offset_x, y * frequency + offset_y]);
                // Perlin sits in [-1, 1]; remap to [0, 1] and clamp so the
                // octave sum never goes negative under the exponent below.
                accumulated += (0.5 * (sample + 1.0)).clamp(0.0, 1.0) * amplitude;
                frequency *= 2.0;
                amplitude *= falloff;
            }

            self.height[i] = accumulated.powf(HEIGHT_EXPONENT) as f32;
        }

        let (min_height, max_height) = map_bounds(&self.height);
        let range = if max_height > min_height {
            max_height - min_height
        } else {
            1.0
        };

        for i in 0..self.area {
            let normalized = (self.height[i] - min_height) / range;
            self.height[i] = normalized;
            self.bedrock[i] = normalized;
            self.original_height[i] = normalized;
        }
    }

    /// Restore the last generated terrain: height and bedrock come back
    /// from the snapshot, sediment and the flow layers are cleared.
    pub fn reset(&mut self) {
        self.height.copy_from_slice(&self.original_height);
        self.bedrock.copy_from_slice(&self.original_height);

        for map in [
            &mut self.sediment,
            &mut self.discharge,
            &mut self.discharge_track,
            &mut self.momentum_x,
            &mut self.momentum_y,
            &mut self.momentum_x_track,
            &mut self.momentum_y_track,
        ] {
            map.fill(0.0);
        }
    }
}

/// Minimum and maximum over a per-cell map in a single pass. An empty slice
/// yields the `(inf, -inf)` identity.
pub fn map_bounds(map: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in map {
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}
