//! Droplet-based hydraulic and thermal erosion over a square height-field.
//!
//! The terrain is a bedrock layer plus a sediment layer; their sum is the
//! surface height. Each simulation step rains a batch of droplets onto the
//! grid. A droplet slides downhill under gravity and the remembered flow
//! field, picks up or drops material against a slope-and-discharge carrying
//! capacity, and relaxes over-steep slopes around itself as it goes. Water
//! flow is remembered between steps through exponentially smoothed
//! discharge and momentum fields, so channels reinforce themselves into
//! branching valley networks over time.
//!
//! ```
//! use erosion::{SimParams, Simulation};
//!
//! let params = SimParams {
//!     terrain_size: 64,
//!     droplets_per_step: 64,
//!     ..SimParams::default()
//! };
//! let mut sim = Simulation::new(params);
//! sim.generate(Some(7));
//!
//! let stats = sim.step();
//! assert_eq!(stats.droplets + stats.discarded, 64);
//! ```

pub mod math;
pub mod params;
pub mod solver;
pub mod terrain;

pub use glam::Vec3;
pub use params::SimParams;
pub use solver::{Solver, StepStats};
pub use terrain::{map_bounds, Terrain};

/// Owns a terrain, a solver and the parameter record, wired together for
/// callers that do not need the pieces separately.
pub struct Simulation {
    pub terrain: Terrain,
    pub solver: Solver,
    pub params: SimParams,
}

impl Simulation {
    /// Simulation over a fresh zeroed terrain of `params.terrain_size`.
    pub fn new(params: SimParams) -> Self {
        Self {
            terrain: Terrain::new(params.terrain_size),
            solver: Solver::new(),
            params,
        }
    }

    /// Generate fractal starting terrain; see [`Terrain::generate`].
    pub fn generate(&mut self, seed: Option<u64>) {
        self.terrain.generate(&self.params, seed);
    }

    /// Restore the generated terrain and clear all flow state.
    pub fn reset(&mut self) {
        self.terrain.reset();
    }

    /// Run one erosion step with the current parameters.
    pub fn step(&mut self) -> StepStats {
        self.solver.step(&mut self.terrain, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_wires_the_pieces_together() {
        let params = SimParams {
            terrain_size: 32,
            droplets_per_step: 16,
            max_age: 32,
            ..SimParams::default()
        };
        let mut sim = Simulation::new(params);
        sim.solver = Solver::seeded(11);
        sim.generate(Some(4));

        let (min, max) = map_bounds(&sim.terrain.height);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);

        let stats = sim.step();
        assert_eq!(stats.droplets + stats.discarded, 16);

        sim.reset();
        let (min, max) = map_bounds(&sim.terrain.height);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
        assert!(sim.terrain.discharge.iter().all(|&d| d == 0.0));
    }
}
