//! Simulation parameters shared by terrain generation and the solver.

use serde::{Deserialize, Serialize};

/// Tunable parameters for terrain generation and erosion.
///
/// One record drives both [`Terrain::generate`](crate::Terrain::generate)
/// and [`Solver::step`](crate::Solver::step); passing it by reference into
/// each call keeps a whole step on a single consistent set of values. The
/// ranges quoted per field are what the tuning panel exposes; nothing here
/// is validated by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Grid side length N; the map is N x N cells. Typical: 128, 256, 512.
    pub terrain_size: usize,

    /// Droplets simulated per solver step. 0 to 512.
    pub droplets_per_step: u32,
    /// Iteration cap per droplet. 128 to 512.
    pub max_age: u32,
    /// Droplets retire once their volume evaporates below this. 0.001 to 0.1.
    pub min_volume: f32,
    /// Initial droplet volume. 0 to 5.
    pub precipitation_rate: f32,

    /// Downslope acceleration per unit volume. 0.1 to 5.
    pub gravity: f32,
    /// How strongly droplets are pulled toward the ambient flow direction.
    /// 0 to 4.
    pub momentum_transfer: f32,
    /// Transport-capacity boost from accumulated discharge. 0 to 32.
    pub entrainment: f32,

    /// Fraction of a capacity deficit taken from loose sediment. 0 to 1.
    pub sediment_erosion_rate: f32,
    /// Fraction of the remaining deficit cut from bedrock. 0 to 1.
    pub bedrock_erosion_rate: f32,
    /// Fraction of a capacity surplus returned to the bed. 0 to 1.
    pub deposition_rate: f32,
    /// Per-iteration volume and load decay. 0.001 to 1.
    pub evaporation_rate: f32,

    /// Blend factor folding per-step flow accumulators into the persistent
    /// discharge/momentum fields. 0 to 0.5.
    pub learning_rate: f32,

    /// Height difference per unit distance that neighbouring cells tolerate
    /// before material settles. 0.01 to 1.
    pub max_height_diff: f32,
    /// Fraction of excess height moved per settling transfer. 0 to 1.
    pub settling_rate: f32,

    /// Vertical exaggeration applied when sampling surface normals, matching
    /// the renderer's height scale so droplets feel the drawn slope. 0 to 256.
    pub height_scale: f32,

    /// Base noise frequency, in cells per hundred. 0.1 to 5.
    pub noise_scale: f32,
    /// Octave count for terrain generation. 1 to 12.
    pub noise_octaves: u32,
    /// Per-octave amplitude decay. 0 to 1.
    pub amplitude_falloff: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            terrain_size: 512,
            droplets_per_step: 512,
            max_age: 500,
            min_volume: 0.01,
            precipitation_rate: 1.0,
            gravity: 1.0,
            momentum_transfer: 1.0,
            entrainment: 2.0,
            sediment_erosion_rate: 0.1,
            bedrock_erosion_rate: 0.1,
            deposition_rate: 0.1,
            evaporation_rate: 0.001,
            learning_rate: 0.1,
            max_height_diff: 0.01,
            settling_rate: 0.8,
            height_scale: 100.0,
            noise_scale: 0.1,
            noise_octaves: 8,
            amplitude_falloff: 0.6,
        }
    }
}
