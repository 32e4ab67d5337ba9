//! Fleet seeding: random origin/destination pairs with a shortest path.

use tracing::{debug, trace};

use ps_core::{SimConfig, SimRng};
use ps_graph::{Graph, GraphError, Router};

use crate::{Vehicle, VehicleError, VehicleResult, VehicleSpec};

/// Seed one vehicle on `graph`.
///
/// Two distinct vertices are drawn uniformly from the graph's referenced
/// vertices; if `router` finds no path between them a new pair is drawn, up
/// to `config.max_seed_attempts` draws.  Speed is uniform in
/// `[config.min_speed, config.max_speed]`.
///
/// # Errors
///
/// - [`VehicleError::TooFewVertices`] if fewer than two vertices are routable.
/// - [`VehicleError::NoRoutablePair`] if every attempt failed.
pub fn seed_vehicle<R: Router + ?Sized>(
    graph:  &Graph,
    router: &R,
    config: &SimConfig,
    rng:    &mut SimRng,
) -> VehicleResult<Vehicle> {
    let candidates = graph.vertices();
    if candidates.len() < 2 {
        return Err(VehicleError::TooFewVertices);
    }

    for _ in 0..config.max_seed_attempts {
        let origin = candidates[rng.gen_range(0..candidates.len())];
        let dest   = candidates[rng.gen_range(0..candidates.len())];
        if origin == dest {
            continue;
        }
        let path = match router.shortest_path(graph, origin, dest) {
            Ok(path) => path,
            Err(GraphError::NoRoute { .. }) => {
                trace!(from = origin.0, to = dest.0, "no route, redrawing");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let speed = rng.speed(config.min_speed, config.max_speed);
        let spec = VehicleSpec { path, speed, delta: 0.0, prev_id: origin };
        return Vehicle::new(spec, rng);
    }

    Err(VehicleError::NoRoutablePair { attempts: config.max_seed_attempts })
}

/// Seed `config.vehicles` vehicles.
pub fn seed_fleet<R: Router + ?Sized>(
    graph:  &Graph,
    router: &R,
    config: &SimConfig,
    rng:    &mut SimRng,
) -> VehicleResult<Vec<Vehicle>> {
    let fleet = (0..config.vehicles)
        .map(|_| seed_vehicle(graph, router, config, rng))
        .collect::<VehicleResult<Vec<_>>>()?;
    debug!(vehicles = fleet.len(), "fleet seeded");
    Ok(fleet)
}
