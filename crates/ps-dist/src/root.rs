//! Root coordinator: seeding, edge-length oracle, re-routing, termination.
//!
//! ```text
//! main thread ──► emit fleet ──► wait(aggregator) ──► barrier ──► broadcast done
//!                                     ▲
//!   root-edge-oracle   EdgeRequest  ──┼──► EdgeResponse to asking leaf
//!   root-reroute       VehicleOut   ──┼──► VehicleIn to owning leaf
//!   root-done          DoneReport   ──┘
//! ```
//!
//! The three listener loops run on scoped threads and exit when the main
//! thread drops the shared stop channel.

use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use crossbeam::channel::{bounded, select, Receiver, Sender};
use tracing::{debug, error, info, warn};

use ps_core::{SimConfig, SimRng};
use ps_graph::{DijkstraRouter, Graph, Partition};
use ps_vehicle::{seed_fleet, Vehicle};

use crate::protocol::{decode_json, encode_int, encode_json, DONE_FLAG};
use crate::{
    Completion, DistError, DistResult, EdgeLengthRequest, EdgeLengthResponse, RootReport,
    RoutingTable, Tag, TerminationAggregator, Transport,
};

pub struct RootCoordinator<T: Transport> {
    transport: T,
    graph:     Arc<Graph>,
    routes:    RoutingTable,
    fleet:     Vec<Vehicle>,
}

impl<T: Transport> RootCoordinator<T> {
    /// Seed `config.vehicles` vehicles on the full graph and prepare to run.
    pub fn new(
        transport: T,
        root:      &Partition,
        leaves:    &[Partition],
        config:    &SimConfig,
    ) -> DistResult<Self> {
        let mut rng = SimRng::new(config.seed);
        let fleet = seed_fleet(root.graph(), &DijkstraRouter, config, &mut rng)?;
        Self::with_vehicles(transport, root, leaves, fleet)
    }

    /// Prepare to run with a caller-supplied fleet.
    ///
    /// # Errors
    ///
    /// [`DistError::RoleMismatch`] unless `transport` is rank 0 and `root` is
    /// the root partition; [`DistError::WorldSize`] unless the world has
    /// exactly one rank per leaf plus the root.
    pub fn with_vehicles(
        transport: T,
        root:      &Partition,
        leaves:    &[Partition],
        fleet:     Vec<Vehicle>,
    ) -> DistResult<Self> {
        let rank = transport.rank();
        let Partition::Root { graph } = root else {
            return Err(DistError::RoleMismatch { rank, expected: "root" });
        };
        if !rank.is_root() {
            return Err(DistError::RoleMismatch { rank, expected: "leaf" });
        }
        let needed = leaves.len() + 1;
        if transport.size() != needed {
            return Err(DistError::WorldSize { size: transport.size(), leaves: leaves.len(), needed });
        }

        let routes = RoutingTable::build(graph, leaves);
        info!(
            routed_vertices = routes.len(),
            leaves = leaves.len(),
            vehicles = fleet.len(),
            "root ready"
        );
        Ok(RootCoordinator { transport, graph: Arc::clone(graph), routes, fleet })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fleet(&self) -> &[Vehicle] {
        &self.fleet
    }

    /// Drive the protocol until every vehicle is accounted for, then release
    /// the leaves.
    ///
    /// The leaves are released (barrier plus done broadcast) even when
    /// emission or counting fails, so they never wait on a root that gave up.
    pub fn run(self) -> DistResult<RootReport> {
        let this = &self;
        let expected = self.fleet.len();
        let (aggregator, reporter) = TerminationAggregator::spawn(expected)?;

        thread::scope(|s| -> DistResult<RootReport> {
            let (stop_tx, stop_rx) = bounded::<()>(0);

            let oracle = {
                let stop = stop_rx.clone();
                thread::Builder::new()
                    .name("root-edge-oracle".into())
                    .spawn_scoped(s, move || this.serve_edge_lengths(stop))?
            };
            let rerouter = {
                let (stop, reporter) = (stop_rx.clone(), reporter.clone());
                thread::Builder::new()
                    .name("root-reroute".into())
                    .spawn_scoped(s, move || this.reroute(stop, reporter))?
            };
            let forwarder = {
                let (stop, reporter) = (stop_rx.clone(), reporter.clone());
                thread::Builder::new()
                    .name("root-done".into())
                    .spawn_scoped(s, move || this.forward_done(stop, reporter))?
            };
            drop(stop_rx);

            let counted = this.emit_fleet(&reporter).and_then(|emitted| {
                drop(reporter);
                aggregator.wait().map(|tally| (emitted, tally))
            });
            match &counted {
                Ok((_, tally)) => info!(
                    parked = tally.parked,
                    abandoned = tally.abandoned,
                    "all vehicles accounted for; releasing leaves"
                ),
                Err(e) => error!(error = %e, "root failed; releasing leaves"),
            }

            this.transport.barrier();
            let released = this.transport.broadcast(Tag::DoneBroadcast, &encode_int(DONE_FLAG));
            drop(stop_tx);

            let edge_queries = join(oracle, "root-edge-oracle")?;
            let rerouted = join(rerouter, "root-reroute")?;
            join(forwarder, "root-done")?;
            released?;
            let (emitted, tally) = counted?;

            Ok(RootReport {
                vehicles: expected,
                parked: tally.parked,
                abandoned: tally.abandoned,
                emitted,
                rerouted,
                edge_queries,
            })
        })
    }

    fn emit_fleet(&self, reporter: &Sender<Completion>) -> DistResult<usize> {
        let mut emitted = 0;
        for vehicle in &self.fleet {
            if vehicle.is_parked() {
                report(reporter, Completion::Parked)?;
                continue;
            }
            let Some(dest) = self.routes.owner(vehicle.next_id()) else {
                error!(
                    vehicle = %vehicle.id(),
                    next = vehicle.next_id().0,
                    "no leaf owns first hop; vehicle abandoned"
                );
                report(reporter, Completion::Abandoned)?;
                continue;
            };
            self.transport.send(dest, Tag::VehicleIn, vehicle.encode()?)?;
            info!(vehicle = %vehicle.id(), leaf = %dest, hops = vehicle.path().len(), "emitted");
            emitted += 1;
        }
        Ok(emitted)
    }

    fn serve_edge_lengths(&self, stop: Receiver<()>) -> DistResult<usize> {
        let requests = self.transport.inbox(Tag::EdgeRequest);
        let mut served = 0;
        loop {
            select! {
                recv(requests) -> msg => {
                    let env = msg.map_err(|_| DistError::Disconnected(Tag::EdgeRequest.to_string()))?;
                    let req: EdgeLengthRequest = match decode_json(Tag::EdgeRequest, &env.payload) {
                        Ok(req) => req,
                        Err(e) => {
                            error!(source = %env.source, error = %e, "dropping edge request");
                            continue;
                        }
                    };
                    let (from, to) = (req.src_vertex_id, req.dest_vertex_id);
                    let length = self
                        .graph
                        .edge(from, to)
                        .ok()
                        .map(|e| e.length)
                        .filter(|l| l.is_finite() && *l > 0.0);
                    if length.is_none() {
                        warn!(source = %env.source, from = from.0, to = to.0, "edge length unavailable");
                    }
                    let resp = EdgeLengthResponse { seq: req.seq, length };
                    self.transport.send(env.source, Tag::EdgeResponse, encode_json(Tag::EdgeResponse, &resp)?)?;
                    served += 1;
                }
                recv(stop) -> _ => break,
            }
        }
        debug!(served, "edge oracle stopped");
        Ok(served)
    }

    fn reroute(&self, stop: Receiver<()>, reporter: Sender<Completion>) -> DistResult<usize> {
        let inbound = self.transport.inbox(Tag::VehicleOut);
        let mut rerouted = 0;
        loop {
            select! {
                recv(inbound) -> msg => {
                    let env = msg.map_err(|_| DistError::Disconnected(Tag::VehicleOut.to_string()))?;
                    let vehicle = match Vehicle::decode(&env.payload) {
                        Ok(v) => v,
                        Err(e) => {
                            error!(source = %env.source, error = %e, "undecodable vehicle abandoned");
                            report(&reporter, Completion::Abandoned)?;
                            continue;
                        }
                    };
                    match self.routes.owner(vehicle.next_id()) {
                        Some(dest) => {
                            info!(
                                vehicle = %vehicle.id(),
                                from = %env.source,
                                to = %dest,
                                next = vehicle.next_id().0,
                                "migrating"
                            );
                            self.transport.send(dest, Tag::VehicleIn, env.payload)?;
                            rerouted += 1;
                        }
                        None => {
                            error!(
                                vehicle = %vehicle.id(),
                                next = vehicle.next_id().0,
                                "no leaf owns next hop; vehicle abandoned"
                            );
                            report(&reporter, Completion::Abandoned)?;
                        }
                    }
                }
                recv(stop) -> _ => break,
            }
        }
        debug!(rerouted, "re-router stopped");
        Ok(rerouted)
    }

    fn forward_done(&self, stop: Receiver<()>, reporter: Sender<Completion>) -> DistResult<usize> {
        let reports = self.transport.inbox(Tag::DoneReport);
        let mut forwarded = 0;
        loop {
            select! {
                recv(reports) -> msg => {
                    let env = msg.map_err(|_| DistError::Disconnected(Tag::DoneReport.to_string()))?;
                    match Completion::decode(&env.payload) {
                        Ok(c) => {
                            report(&reporter, c)?;
                            forwarded += 1;
                        }
                        Err(e) => error!(source = %env.source, error = %e, "ignoring done report"),
                    }
                }
                recv(stop) -> _ => break,
            }
        }
        Ok(forwarded)
    }
}

fn report(reporter: &Sender<Completion>, c: Completion) -> DistResult<()> {
    reporter
        .send(c)
        .map_err(|_| DistError::Disconnected("termination".into()))
}

fn join<R>(handle: ScopedJoinHandle<'_, DistResult<R>>, name: &str) -> DistResult<R> {
    handle.join().map_err(|_| DistError::Panicked(name.into()))?
}
