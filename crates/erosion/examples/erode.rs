//! Batch erosion run over freshly generated fractal terrain.
//!
//! Generates a seeded height-field, runs a fixed number of erosion steps
//! and prints per-interval droplet and material statistics, so parameter
//! changes can be compared run to run.
//!
//! Run with: cargo run --example erode -p erosion --release
//! Set RUST_LOG=info for generation details.

use erosion::{map_bounds, SimParams, Simulation, Solver};
use std::time::Instant;

fn main() {
    env_logger::init();

    let params = SimParams {
        terrain_size: 256,
        ..SimParams::default()
    };
    let total_steps = 200;

    let mut sim = Simulation::new(params);
    sim.solver = Solver::seeded(2077);
    sim.generate(Some(383_342_929));

    let (min_h, max_h) = map_bounds(&sim.terrain.height);
    log::info!(
        "generated {0}x{0} terrain, {1} octaves, height range [{min_h:.3}, {max_h:.3}]",
        sim.params.terrain_size,
        sim.params.noise_octaves
    );

    println!(
        "Eroding {0}x{0} terrain: {1} steps x {2} droplets\n",
        sim.params.terrain_size, total_steps, sim.params.droplets_per_step
    );
    println!(
        "{:>6} {:>9} {:>6} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "Step", "Droplets", "Skip", "Eroded", "Deposited", "Settled", "MinH", "MaxH"
    );
    println!("{}", "-".repeat(74));

    let started = Instant::now();
    let mut total_eroded = 0.0f32;
    let mut total_deposited = 0.0f32;
    let mut total_settled = 0.0f32;

    for step in 0..total_steps {
        let stats = sim.step();
        total_eroded += stats.eroded;
        total_deposited += stats.deposited;
        total_settled += stats.settled;

        if step % 20 == 0 || step == total_steps - 1 {
            let (min_h, max_h) = map_bounds(&sim.terrain.height);
            println!(
                "{:>6} {:>9} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>8.4} {:>8.4}",
                step,
                stats.droplets,
                stats.discarded,
                stats.eroded,
                stats.deposited,
                stats.settled,
                min_h,
                max_h
            );
        }
    }

    let elapsed = started.elapsed().as_secs_f32();
    let sediment_total: f32 = sim.terrain.sediment.iter().sum();
    let peak_discharge = sim
        .terrain
        .discharge
        .iter()
        .fold(0.0f32, |best, &d| best.max(d));

    println!("\nDone in {elapsed:.2}s ({:.1} steps/s)", total_steps as f32 / elapsed);
    println!("Total eroded:    {total_eroded:.4}");
    println!("Total deposited: {total_deposited:.4}");
    println!("Total settled:   {total_settled:.4}");
    println!("Sediment on map: {sediment_total:.4}");
    println!("Peak discharge:  {peak_discharge:.4}");
}
