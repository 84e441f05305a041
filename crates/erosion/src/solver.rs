//! Per-step erosion solver.
//!
//! One step spawns a batch of independent Lagrangian droplets that carve
//! the terrain, each droplet relaxing over-steep slopes around itself as it
//! moves, and finishes by folding the step's raw flow accumulators into the
//! persistent discharge/momentum fields. Capacity and momentum formulas
//! always read the persistent fields from previous steps, never the
//! accumulators being written this step.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::params::SimParams;
use crate::terrain::Terrain;

/// Cells with less terrain than this never erode; droplets spawning on them
/// are discarded before touching any array.
const MIN_SPAWN_HEIGHT: f32 = 0.1;

/// Synthetic height drop credited to a droplet that steps off the grid, so
/// boundary cells keep eroding outward.
const BOUNDARY_DROP: f32 = 0.002;

/// Advection speed every moving droplet is rescaled to per iteration.
const ADVECTION_SPEED: f32 = std::f32::consts::SQRT_2;

/// Neighbour offsets with their grid distances. The settling pass applies
/// transfers immediately while scanning, so this order is part of the
/// simulation's observable behavior; keep it fixed.
const NEIGHBOURS: [(i32, i32, f32); 8] = [
    (-1, -1, std::f32::consts::SQRT_2),
    (-1, 0, 1.0),
    (-1, 1, std::f32::consts::SQRT_2),
    (0, -1, 1.0),
    (0, 1, 1.0),
    (1, -1, std::f32::consts::SQRT_2),
    (1, 0, 1.0),
    (1, 1, std::f32::consts::SQRT_2),
];

/// A single simulated water particle. Droplets live inside one solver step
/// and never carry state across steps.
#[derive(Clone, Copy, Debug)]
struct Droplet {
    /// Continuous grid position.
    x: f32,
    y: f32,
    /// Velocity in cells per iteration.
    vx: f32,
    vy: f32,
    /// Sediment load being carried.
    sediment: f32,
    /// Remaining water volume; the droplet retires below `min_volume`.
    volume: f32,
    /// Iterations lived so far.
    age: u32,
}

impl Droplet {
    fn new(x: f32, y: f32, volume: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            sediment: 0.0,
            volume,
            age: 0,
        }
    }
}

/// Aggregate diagnostics for one completed solver step.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepStats {
    /// Droplets that ran their full lifecycle this step.
    pub droplets: u32,
    /// Droplets discarded at spawn because the terrain was too low.
    pub discarded: u32,
    /// Total material picked up from the bed by droplets.
    pub eroded: f32,
    /// Total sediment returned to the bed by droplets.
    pub deposited: f32,
    /// Total material moved between cells by settling.
    pub settled: f32,
}

/// Runs the erosion algorithm against a [`Terrain`].
///
/// The solver owns only its droplet RNG; all simulation state lives in the
/// terrain and all tuning in the [`SimParams`] passed to each call. Holding
/// the parameter borrow across [`Solver::step`] means one consistent record
/// serves the whole step.
pub struct Solver {
    rng: StdRng,
}

impl Solver {
    /// Solver with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Solver with a fixed RNG seed. The same seed, parameters and terrain
    /// replay the same droplet sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance the simulation one step: hydraulic droplets, each running
    /// settling at its feet, then the discharge/momentum blend.
    pub fn step(&mut self, terrain: &mut Terrain, params: &SimParams) -> StepStats {
        let mut stats = StepStats::default();

        terrain.discharge_track.fill(0.0);
        terrain.momentum_x_track.fill(0.0);
        terrain.momentum_y_track.fill(0.0);

        let size = terrain.size as f32;
        for _ in 0..params.droplets_per_step {
            let x = self.rng.gen_range(0.0..size);
            let y = self.rng.gen_range(0.0..size);

            if terrain.height_at(x as i32, y as i32) < MIN_SPAWN_HEIGHT {
                stats.discarded += 1;
                continue;
            }

            let droplet = Droplet::new(x, y, params.precipitation_rate);
            self.simulate_droplet(terrain, params, droplet, &mut stats);
            stats.droplets += 1;
        }

        self.blend_flow_tracks(terrain, params);

        stats
    }

    /// Integrate one droplet to retirement, mutating the bed and the track
    /// accumulators along its path.
    fn simulate_droplet(
        &self,
        terrain: &mut Terrain,
        params: &SimParams,
        mut droplet: Droplet,
        stats: &mut StepStats,
    ) {
        let size = terrain.size as f32;

        while droplet.age < params.max_age && droplet.volume >= params.min_volume {
            let floor_x = droplet.x as i32;
            let floor_y = droplet.y as i32;

            if floor_x < 0
                || floor_x >= terrain.size as i32
                || floor_y < 0
                || floor_y >= terrain.size as i32
            {
                break;
            }

            let cell = terrain.idx(floor_x as usize, floor_y as usize);
            let height_start = terrain.height[cell];

            let normal =
                terrain.surface_normal(floor_x as usize, floor_y as usize, params.height_scale);
            droplet.vx += params.gravity * normal.x / droplet.volume;
            droplet.vy += params.gravity * normal.z / droplet.volume;

            // Nudge the droplet toward the ambient flow recorded in previous
            // steps. Thin droplets over quiet cells feel it most; both
            // magnitudes are checked before dividing.
            let flow_x = terrain.momentum_x[cell];
            let flow_y = terrain.momentum_y[cell];
            let flow_speed = (flow_x * flow_x + flow_y * flow_y).sqrt();
            if flow_speed > 0.0 {
                let speed = (droplet.vx * droplet.vx + droplet.vy * droplet.vy).sqrt();
                if speed > 0.0 {
                    let alignment =
                        (flow_x * droplet.vx + flow_y * droplet.vy) / (flow_speed * speed);
                    let transfer = params.momentum_transfer * alignment
                        / (droplet.volume + terrain.discharge[cell]);
                    droplet.vx += transfer * flow_x;
                    droplet.vy += transfer * flow_y;
                }
            }

            // Constant advection speed regardless of slope steepness.
            let final_speed = (droplet.vx * droplet.vx + droplet.vy * droplet.vy).sqrt();
            if final_speed > 0.0 {
                let rescale = ADVECTION_SPEED / final_speed;
                droplet.vx *= rescale;
                droplet.vy *= rescale;
            }

            droplet.x += droplet.vx;
            droplet.y += droplet.vy;

            terrain.discharge_track[cell] += droplet.volume;
            terrain.momentum_x_track[cell] += droplet.volume * droplet.vx;
            terrain.momentum_y_track[cell] += droplet.volume * droplet.vy;

            let off_grid =
                droplet.x < 0.0 || droplet.x >= size || droplet.y < 0.0 || droplet.y >= size;
            let height_end = if off_grid {
                height_start - BOUNDARY_DROP
            } else {
                terrain.height_at(droplet.x as i32, droplet.y as i32)
            };

            let capacity = ((1.0 + params.entrainment * terrain.discharge_at(cell))
                * (height_start - height_end))
                .max(0.0);
            let deficit = capacity - droplet.sediment;

            if deficit > 0.0 {
                // Undersaturated: erode, loose sediment first.
                let from_sediment =
                    (deficit * params.sediment_erosion_rate).min(terrain.sediment[cell]);
                terrain.sediment[cell] -= from_sediment;

                let mut removed = from_sediment;
                let remaining = deficit - from_sediment / params.sediment_erosion_rate;
                if remaining > 0.0 {
                    let from_bedrock = remaining * params.bedrock_erosion_rate;
                    terrain.bedrock[cell] -= from_bedrock;
                    removed += from_bedrock;
                }

                droplet.sediment += removed;
                stats.eroded += removed;
            } else {
                // Oversaturated: drop part of the surplus load.
                let deposited = -deficit * params.deposition_rate;
                terrain.sediment[cell] += deposited;
                droplet.sediment -= deposited;
                stats.deposited += deposited;
            }

            terrain.update_total_height(cell);

            droplet.volume *= 1.0 - params.evaporation_rate;
            droplet.sediment *= 1.0 - params.evaporation_rate;

            if off_grid {
                break;
            }

            stats.settled += self.thermal_erosion(terrain, params, droplet.x, droplet.y);
            droplet.age += 1;
        }
    }

    /// Settle over-steep slopes around the cell under `(x, y)`.
    ///
    /// For each of the 8 neighbours, height difference beyond the repose
    /// threshold (distance times `max_height_diff`) moves half the excess,
    /// scaled by `settling_rate`, from the higher cell to the lower one.
    /// The donor pays from sediment first and bedrock for the shortfall;
    /// the receiver always gains sediment. Heights are written directly
    /// together with the layers, and every transfer lands before the next
    /// neighbour is examined, against a centre height read once up front.
    /// Order dependence is deliberate. Returns the total material moved.
    pub fn thermal_erosion(
        &self,
        terrain: &mut Terrain,
        params: &SimParams,
        x: f32,
        y: f32,
    ) -> f32 {
        let centre_x = x as i32;
        let centre_y = y as i32;
        let size = terrain.size as i32;

        if centre_x < 0 || centre_x >= size || centre_y < 0 || centre_y >= size {
            return 0.0;
        }

        let centre = terrain.idx(centre_x as usize, centre_y as usize);
        let centre_height = terrain.height[centre];
        let mut moved = 0.0;

        for (dx, dy, dist) in NEIGHBOURS {
            let nx = centre_x + dx;
            let ny = centre_y + dy;
            if nx < 0 || nx >= size || ny < 0 || ny >= size {
                continue;
            }

            let neighbour = terrain.idx(nx as usize, ny as usize);
            let diff = centre_height - terrain.height[neighbour];
            if diff == 0.0 {
                continue;
            }

            let excess = diff.abs() - dist * params.max_height_diff;
            if excess <= 0.0 {
                continue;
            }

            let transfer = params.settling_rate * excess / 2.0;
            let (donor, receiver) = if diff > 0.0 {
                (centre, neighbour)
            } else {
                (neighbour, centre)
            };

            terrain.height[donor] -= transfer;
            terrain.height[receiver] += transfer;

            let from_sediment = transfer.min(terrain.sediment[donor]);
            terrain.sediment[donor] -= from_sediment;
            if transfer > from_sediment {
                terrain.bedrock[donor] -= transfer - from_sediment;
            }
            terrain.sediment[receiver] += transfer;

            moved += transfer;
        }

        moved
    }

    /// Fold this step's raw track accumulators into the persistent
    /// discharge/momentum fields. The blend factor trades responsiveness
    /// against the randomness of per-step droplet placement.
    fn blend_flow_tracks(&self, terrain: &mut Terrain, params: &SimParams) {
        let keep = 1.0 - params.learning_rate;
        let learn = params.learning_rate;

        for i in 0..terrain.area {
            terrain.discharge[i] = keep * terrain.discharge[i] + learn * terrain.discharge_track[i];
            terrain.momentum_x[i] =
                keep * terrain.momentum_x[i] + learn * terrain.momentum_x_track[i];
            terrain.momentum_y[i] =
                keep * terrain.momentum_y[i] + learn * terrain.momentum_y_track[i];
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
