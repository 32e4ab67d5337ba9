//! Run modes.
//!
//! | Mode          | Graph                 | Driving                                  |
//! |---------------|-----------------------|------------------------------------------|
//! | `Sequential`  | full graph            | one `drive()` to completion, then the next |
//! | `Concurrent`  | full graph            | one `rayon` task per vehicle             |
//! | `Distributed` | root + one leaf/strip | one thread per rank over [`LocalWorld`]  |

use std::thread;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, error, info};

use ps_core::{ExecutionMode, SimConfig, SimRng};
use ps_graph::{build_all, build_partition, DijkstraRouter, GraphDocument, PartitionConfig, Selection};
use ps_vehicle::{seed_fleet, VehicleResult};

use crate::{coordinator_for, DistError, DistResult, LocalWorld, RoleReport, RunReport};

/// Validate `config` and run in the mode it names.
pub fn run(config: &SimConfig, doc: &GraphDocument) -> DistResult<RunReport> {
    match config.mode {
        ExecutionMode::Sequential | ExecutionMode::Concurrent => run_local(config, doc),
        ExecutionMode::Distributed => run_distributed(config, doc),
    }
}

/// Drive every vehicle on the unpartitioned graph.
///
/// Vehicles share only the read-only graph, so the concurrent variant needs
/// no locking.  A vehicle whose drive fails is logged and counted as
/// abandoned.
pub fn run_local(config: &SimConfig, doc: &GraphDocument) -> DistResult<RunReport> {
    config.validate()?;
    let root = build_partition(doc, &PartitionConfig { strips: 1, selection: Selection::Root })?;
    let graph = root.graph().as_ref();

    let mut rng = SimRng::new(config.seed);
    let mut fleet = seed_fleet(graph, &DijkstraRouter, config, &mut rng)?;
    info!(vehicles = fleet.len(), mode = %config.mode, "driving fleet");

    let outcomes: Vec<VehicleResult<usize>> = match config.mode {
        ExecutionMode::Concurrent => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.num_threads.unwrap_or(0))
                .build()?;
            pool.install(|| fleet.par_iter_mut().map(|v| v.drive(graph)).collect())
        }
        _ => fleet.iter_mut().map(|v| v.drive(graph)).collect(),
    };

    let mut report = RunReport::local(config.mode, fleet.len());
    for (vehicle, outcome) in fleet.iter().zip(outcomes) {
        match outcome {
            Ok(steps) => {
                report.parked += 1;
                debug!(vehicle = %vehicle.id(), steps, delta = vehicle.delta(), "parked");
            }
            Err(e) => {
                report.abandoned += 1;
                error!(vehicle = %vehicle.id(), error = %e, "vehicle abandoned");
            }
        }
    }
    info!(parked = report.parked, abandoned = report.abandoned, "run complete");
    Ok(report)
}

/// Partition the graph into `config.partitions` strips and run the root/leaf
/// protocol with one in-process rank per partition plus the root.
pub fn run_distributed(config: &SimConfig, doc: &GraphDocument) -> DistResult<RunReport> {
    config.validate()?;
    let (root, leaves) = build_all(doc, config.partitions)?;
    let world = LocalWorld::new(config.world_size());

    let coordinators = world
        .into_transports()
        .into_iter()
        .map(|t| coordinator_for(t, &root, &leaves, config))
        .collect::<DistResult<Vec<_>>>()?;
    info!(ranks = coordinators.len(), "starting distributed run");

    let reports = thread::scope(|s| -> DistResult<Vec<RoleReport>> {
        let mut handles = Vec::with_capacity(coordinators.len());
        for c in coordinators {
            let name = format!("rank-{}", c.rank().0);
            let handle = thread::Builder::new().name(name.clone()).spawn_scoped(s, move || c.run())?;
            handles.push((name, handle));
        }
        handles
            .into_iter()
            .map(|(name, h)| h.join().map_err(|_| DistError::Panicked(name))?)
            .collect()
    })?;

    let mut root_report = None;
    let mut leaf_reports = Vec::with_capacity(leaves.len());
    for r in reports {
        match r {
            RoleReport::Root(r) => root_report = Some(r),
            RoleReport::Leaf(l) => leaf_reports.push(l),
        }
    }
    let root_report = root_report.ok_or(DistError::RoleMismatch {
        rank:     ps_core::Rank::ROOT,
        expected: "root",
    })?;
    let report = RunReport::distributed(root_report, leaf_reports);
    info!(
        parked = report.parked,
        abandoned = report.abandoned,
        rerouted = report.rerouted,
        "run complete"
    );
    Ok(report)
}
