//! Leaf coordinator: receive, drive, report.
//!
//! The receive loop hands each inbound vehicle to a drive unit on the leaf's
//! `rayon` pool.  A drive unit asks the root for the length of the vehicle's
//! current edge, absorbs it, then steps on the local graph until the vehicle
//! parks (done report) or reaches a boundary (forwarded to the root).  A
//! watcher thread waits in the world barrier and for the done broadcast, then
//! stops the receive loop; outstanding drive units are joined before the
//! leaf returns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam::channel::{bounded, select, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, warn};

use ps_core::{PartitionId, Rank, VertexId};
use ps_graph::{Graph, Partition};
use ps_vehicle::{Handoff, Vehicle};

use crate::protocol::{decode_int, decode_json, encode_json, DONE_FLAG};
use crate::{
    Completion, DistError, DistResult, EdgeLengthRequest, EdgeLengthResponse, Envelope,
    LeafReport, Tag, Transport,
};

pub struct LeafCoordinator<T: Transport + 'static> {
    shared: Arc<LeafShared<T>>,
    pool:   ThreadPool,
}

/// State reachable from every drive unit.
struct LeafShared<T> {
    transport: T,
    id:        PartitionId,
    graph:     Arc<Graph>,
    responses: Receiver<Envelope>,
    /// Serialises edge-length round trips; holds the last sequence number.
    oracle:    Mutex<u64>,
    received:  AtomicUsize,
    parked:    AtomicUsize,
    forwarded: AtomicUsize,
    failed:    AtomicUsize,
}

impl<T: Transport + 'static> LeafCoordinator<T> {
    /// Bind `partition` to `transport`.
    ///
    /// `threads` sizes the drive pool; `None` lets `rayon` choose.
    pub fn new(transport: T, partition: Partition, threads: Option<usize>) -> DistResult<Self> {
        let rank = transport.rank();
        let Partition::Leaf { id, graph, .. } = partition else {
            return Err(DistError::RoleMismatch { rank, expected: "leaf" });
        };
        if Rank::from(id) != rank {
            return Err(DistError::RoleMismatch { rank, expected: "matching leaf" });
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(move |i| format!("leaf-{}-drive-{i}", id.0))
            .build()?;
        let responses = transport.inbox(Tag::EdgeResponse);

        debug!(leaf = %id, vertices = graph.vertex_count(), "leaf ready");
        Ok(LeafCoordinator {
            shared: Arc::new(LeafShared {
                transport,
                id,
                graph,
                responses,
                oracle:    Mutex::new(0),
                received:  AtomicUsize::new(0),
                parked:    AtomicUsize::new(0),
                forwarded: AtomicUsize::new(0),
                failed:    AtomicUsize::new(0),
            }),
            pool,
        })
    }

    pub fn id(&self) -> PartitionId {
        self.shared.id
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Receive and drive vehicles until the root broadcasts termination.
    pub fn run(self) -> DistResult<LeafReport> {
        let id = self.shared.id;
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let watcher = {
            let shared = Arc::clone(&self.shared);
            thread::Builder::new()
                .name(format!("leaf-{}-watch", id.0))
                .spawn(move || shared.await_termination(stop_tx))?
        };

        let inbound = self.shared.transport.inbox(Tag::VehicleIn);
        let units = WaitGroup::new();
        loop {
            select! {
                recv(inbound) -> msg => {
                    let env = msg.map_err(|_| DistError::Disconnected(Tag::VehicleIn.to_string()))?;
                    self.shared.received.fetch_add(1, Ordering::Relaxed);
                    let unit = units.clone();
                    let shared = Arc::clone(&self.shared);
                    self.pool.spawn(move || {
                        shared.drive(&env.payload);
                        drop(unit);
                    });
                }
                recv(stop_rx) -> _ => break,
            }
        }

        units.wait();
        watcher
            .join()
            .map_err(|_| DistError::Panicked(format!("leaf-{}-watch", id.0)))??;

        let report = self.shared.report();
        info!(
            leaf = %id,
            received = report.received,
            parked = report.parked,
            forwarded = report.forwarded,
            failed = report.failed,
            "leaf finished"
        );
        Ok(report)
    }
}

impl<T: Transport> LeafShared<T> {
    fn await_termination(&self, stop: Sender<()>) -> DistResult<()> {
        let broadcasts = self.transport.inbox(Tag::DoneBroadcast);
        self.transport.barrier();
        let env = broadcasts
            .recv()
            .map_err(|_| DistError::Disconnected(Tag::DoneBroadcast.to_string()))?;
        let flag = decode_int(Tag::DoneBroadcast, &env.payload)?;
        if flag != DONE_FLAG {
            warn!(leaf = %self.id, flag, "unexpected termination flag");
        }
        debug!(leaf = %self.id, "termination broadcast received");
        let _ = stop.send(());
        Ok(())
    }

    fn drive(&self, payload: &[u8]) {
        let mut vehicle = match Vehicle::decode(payload) {
            Ok(v) => v,
            Err(e) => {
                error!(leaf = %self.id, error = %e, "undecodable vehicle abandoned");
                self.finish(Completion::Abandoned);
                return;
            }
        };
        match self.advance(&mut vehicle) {
            Ok(Handoff::Parked) => {
                info!(vehicle = %vehicle.id(), leaf = %self.id, delta = vehicle.delta(), "parked");
                self.finish(Completion::Parked);
            }
            Ok(Handoff::Boundary) => self.forward(&vehicle),
            Err(e) => {
                error!(vehicle = %vehicle.id(), leaf = %self.id, error = %e, "vehicle abandoned");
                self.finish(Completion::Abandoned);
            }
        }
    }

    /// Re-establish the distance state of the current edge, then step locally.
    fn advance(&self, vehicle: &mut Vehicle) -> DistResult<Handoff> {
        if vehicle.is_parked() {
            return Ok(Handoff::Parked);
        }
        let (from, to) = vehicle.edge();
        let length = self.edge_length(from, to)?;
        vehicle.absorb(length, &self.graph)?;
        Ok(vehicle.drive_until_handoff(&self.graph)?)
    }

    fn forward(&self, vehicle: &Vehicle) {
        let sent = vehicle
            .encode()
            .map_err(DistError::from)
            .and_then(|payload| self.transport.send(Rank::ROOT, Tag::VehicleOut, payload));
        match sent {
            Ok(()) => {
                self.forwarded.fetch_add(1, Ordering::Relaxed);
                debug!(
                    vehicle = %vehicle.id(),
                    leaf = %self.id,
                    next = vehicle.next_id().0,
                    "at boundary, forwarded to root"
                );
            }
            Err(e) => {
                error!(vehicle = %vehicle.id(), leaf = %self.id, error = %e, "vehicle lost at boundary");
                self.finish(Completion::Abandoned);
            }
        }
    }

    fn finish(&self, c: Completion) {
        let counter = match c {
            Completion::Parked    => &self.parked,
            Completion::Abandoned => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.transport.send(Rank::ROOT, Tag::DoneReport, c.encode()) {
            error!(leaf = %self.id, error = %e, "done report not delivered");
        }
    }

    /// Ask the root for the length of `from → to`.
    fn edge_length(&self, from: VertexId, to: VertexId) -> DistResult<f64> {
        let mut seq = self.oracle.lock().map_err(|_| DistError::Poisoned("edge oracle"))?;
        *seq += 1;
        let req = EdgeLengthRequest { src_vertex_id: from, dest_vertex_id: to, seq: *seq };
        self.transport
            .send(Rank::ROOT, Tag::EdgeRequest, encode_json(Tag::EdgeRequest, &req)?)?;

        let env = self
            .responses
            .recv()
            .map_err(|_| DistError::Disconnected(Tag::EdgeResponse.to_string()))?;
        let resp: EdgeLengthResponse = decode_json(Tag::EdgeResponse, &env.payload)?;
        if resp.seq != *seq {
            return Err(DistError::OutOfSequence { expected: *seq, got: resp.seq });
        }
        resp.length.ok_or(DistError::EdgeUnavailable { from, to })
    }

    fn report(&self) -> LeafReport {
        LeafReport {
            leaf:      self.id,
            received:  self.received.load(Ordering::Relaxed),
            parked:    self.parked.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            failed:    self.failed.load(Ordering::Relaxed),
        }
    }
}
