//! Unit tests for ps-dist.

use std::thread;

use ps_core::{ExecutionMode, Rank, SimConfig, VehicleId, VertexId};
use ps_graph::{build_all, Edge, GraphDocument, Partition, Vertex};
use ps_vehicle::{Vehicle, VehicleSpec};

use crate::{
    LeafCoordinator, LeafReport, LocalWorld, RootCoordinator, RootReport, Tag, Transport,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 1(0,0) → 2(1,0) → 3(3,0) → 4(4,0).  Two strips split it between 2 and 3.
fn crossing_doc() -> GraphDocument {
    GraphDocument::new(
        vec![
            Vertex::new(1, 0.0, 0.0),
            Vertex::new(2, 1.0, 0.0),
            Vertex::new(3, 3.0, 0.0),
            Vertex::new(4, 4.0, 0.0),
        ],
        vec![Edge::new(1, 2, 1.0), Edge::new(2, 3, 2.0), Edge::new(3, 4, 1.0)],
    )
}

/// `n × n` grid with two-way streets, 10 units apart.
fn grid_doc(n: i64) -> GraphDocument {
    let id = |r: i64, c: i64| r * n + c + 1;
    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    for r in 0..n {
        for c in 0..n {
            vertices.push(Vertex::new(id(r, c), c as f64 * 10.0, r as f64 * 10.0));
            if c + 1 < n {
                edges.push(Edge::new(id(r, c), id(r, c + 1), 10.0));
                edges.push(Edge::new(id(r, c + 1), id(r, c), 10.0));
            }
            if r + 1 < n {
                edges.push(Edge::new(id(r, c), id(r + 1, c), 7.0));
                edges.push(Edge::new(id(r + 1, c), id(r, c), 7.0));
            }
        }
    }
    GraphDocument::new(vertices, edges)
}

fn vehicle(name: &str, path: &[i64], speed: f64) -> Vehicle {
    let path: Vec<VertexId> = path.iter().copied().map(VertexId).collect();
    let prev_id = path[0];
    Vehicle::with_id(VehicleId(name.into()), VehicleSpec { path, speed, delta: 0.0, prev_id })
        .unwrap()
}

/// Run one root (on the calling thread) and one thread per leaf over a
/// fresh in-process world.
fn run_world(
    root:   &Partition,
    leaves: &[Partition],
    fleet:  Vec<Vehicle>,
) -> (RootReport, Vec<LeafReport>) {
    let mut transports = LocalWorld::new(leaves.len() + 1).into_transports().into_iter();
    let root_c = RootCoordinator::with_vehicles(transports.next().unwrap(), root, leaves, fleet).unwrap();
    let leaf_cs: Vec<_> = transports
        .zip(leaves)
        .map(|(t, p)| LeafCoordinator::new(t, p.clone(), Some(2)).unwrap())
        .collect();

    thread::scope(|s| {
        let handles: Vec<_> = leaf_cs.into_iter().map(|c| s.spawn(move || c.run())).collect();
        let root_report = root_c.run().unwrap();
        let leaf_reports = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        (root_report, leaf_reports)
    })
}

fn distributed(vehicles: usize, partitions: usize) -> SimConfig {
    SimConfig {
        vehicles,
        partitions,
        mode: ExecutionMode::Distributed,
        min_speed: 2.0,
        max_speed: 6.0,
        num_threads: Some(2),
        ..SimConfig::default()
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod transport {
    use super::*;

    #[test]
    fn send_reaches_the_tagged_inbox_only() {
        let t = LocalWorld::new(2).into_transports();
        t[0].send(Rank(1), Tag::VehicleIn, b"v".to_vec()).unwrap();

        let env = t[1].inbox(Tag::VehicleIn).try_recv().unwrap();
        assert_eq!(env.source, Rank(0));
        assert_eq!(env.tag, Tag::VehicleIn);
        assert_eq!(env.payload, b"v");
        assert!(t[1].inbox(Tag::EdgeRequest).try_recv().is_err());
        assert!(t[0].inbox(Tag::VehicleIn).try_recv().is_err());
    }

    #[test]
    fn same_sender_same_tag_is_fifo() {
        let t = LocalWorld::new(2).into_transports();
        for i in 0..5u8 {
            t[1].send(Rank(0), Tag::DoneReport, vec![i]).unwrap();
        }
        let inbox = t[0].inbox(Tag::DoneReport);
        let got: Vec<u8> = (0..5).map(|_| inbox.try_recv().unwrap().payload[0]).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unknown_rank_is_rejected() {
        let t = LocalWorld::new(2).into_transports();
        let r = t[0].send(Rank(5), Tag::VehicleIn, vec![]);
        assert!(matches!(r, Err(crate::DistError::NoSuchRank { size: 2, .. })));
    }

    #[test]
    fn broadcast_skips_sender() {
        let t = LocalWorld::new(3).into_transports();
        t[0].broadcast(Tag::DoneBroadcast, &[1]).unwrap();
        assert!(t[0].inbox(Tag::DoneBroadcast).try_recv().is_err());
        assert!(t[1].inbox(Tag::DoneBroadcast).try_recv().is_ok());
        assert!(t[2].inbox(Tag::DoneBroadcast).try_recv().is_ok());
    }

    #[test]
    fn barrier_releases_all_ranks() {
        let world = LocalWorld::new(4);
        assert_eq!(world.size(), 4);
        thread::scope(|s| {
            for t in world.into_transports() {
                s.spawn(move || t.barrier());
            }
        });
    }
}

// ── Protocol payloads ─────────────────────────────────────────────────────────

#[cfg(test)]
mod protocol {
    use super::*;
    use crate::protocol::{decode_int, decode_json, encode_json};
    use crate::{Completion, DistError, EdgeLengthResponse};

    #[test]
    fn completion_codes() {
        assert_eq!(Completion::Parked.code(), 1);
        assert_eq!(Completion::Abandoned.code(), -1);
        assert_eq!(Completion::decode(&Completion::Abandoned.encode()).unwrap(), Completion::Abandoned);
    }

    #[test]
    fn unknown_completion_code_is_rejected() {
        let r = Completion::decode(&7i32.to_le_bytes());
        assert!(matches!(r, Err(DistError::Payload { tag: Tag::DoneReport, .. })));
    }

    #[test]
    fn short_int_payload_is_rejected() {
        assert!(decode_int(Tag::DoneBroadcast, &[1, 0]).is_err());
    }

    #[test]
    fn unavailable_edge_encodes_as_null() {
        let resp = EdgeLengthResponse { seq: 4, length: None };
        let bytes = encode_json(Tag::EdgeResponse, &resp).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["length"].is_null());
        let back: EdgeLengthResponse = decode_json(Tag::EdgeResponse, &bytes).unwrap();
        assert_eq!(back, resp);
    }
}

// ── Routing table ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use super::*;
    use crate::RoutingTable;

    #[test]
    fn every_vertex_maps_to_its_strip_leaf() {
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let table = RoutingTable::build(root.graph(), &leaves);
        assert_eq!(table.len(), 4);
        assert_eq!(table.owner(VertexId(1)), Some(Rank(1)));
        assert_eq!(table.owner(VertexId(2)), Some(Rank(1)));
        assert_eq!(table.owner(VertexId(3)), Some(Rank(2)));
        assert_eq!(table.owner(VertexId(4)), Some(Rank(2)));
        assert_eq!(table.owner(VertexId(99)), None);
    }

    #[test]
    fn grid_table_covers_all_vertices() {
        let doc = grid_doc(5);
        let (root, leaves) = build_all(&doc, 3).unwrap();
        let table = RoutingTable::build(root.graph(), &leaves);
        assert_eq!(table.len(), 25);
        for v in &doc.vertices {
            let rank = table.owner(v.id).unwrap();
            assert!(leaves[rank.index() - 1].graph().vertex_exists(v.id));
        }
    }
}

// ── Termination aggregator ────────────────────────────────────────────────────

#[cfg(test)]
mod termination {
    use super::*;
    use crate::{Completion, DistError, Tally, TerminationAggregator};

    #[test]
    fn finishes_at_expected_count() {
        let (agg, tx) = TerminationAggregator::spawn(3).unwrap();
        assert_eq!(agg.expected(), 3);
        tx.send(Completion::Parked).unwrap();
        tx.send(Completion::Abandoned).unwrap();
        tx.send(Completion::Parked).unwrap();
        assert_eq!(agg.wait().unwrap(), Tally { parked: 2, abandoned: 1 });
    }

    #[test]
    fn zero_expected_finishes_immediately() {
        let (agg, _tx) = TerminationAggregator::spawn(0).unwrap();
        assert_eq!(agg.wait().unwrap().done(), 0);
    }

    #[test]
    fn extra_reports_are_not_counted() {
        let (agg, tx) = TerminationAggregator::spawn(1).unwrap();
        tx.send(Completion::Parked).unwrap();
        tx.send(Completion::Abandoned).unwrap();
        assert_eq!(agg.wait().unwrap(), Tally { parked: 1, abandoned: 0 });
    }

    #[test]
    fn dropped_reporters_leave_it_incomplete() {
        let (agg, tx) = TerminationAggregator::spawn(2).unwrap();
        tx.send(Completion::Parked).unwrap();
        drop(tx);
        assert!(matches!(agg.wait(), Err(DistError::Incomplete { done: 1, expected: 2 })));
    }
}

// ── Root / leaf protocol ──────────────────────────────────────────────────────

#[cfg(test)]
mod protocol_run {
    use super::*;

    #[test]
    fn crossing_vehicle_is_rerouted_once() {
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let fleet = vec![vehicle("CROSSER001", &[1, 2, 3, 4], 1.0)];

        let (root_report, leaf_reports) = run_world(&root, &leaves, fleet);

        assert_eq!(root_report.emitted, 1);
        assert_eq!(root_report.rerouted, 1);
        assert_eq!(root_report.parked, 1);
        assert_eq!(root_report.abandoned, 0);
        assert_eq!(root_report.edge_queries, 2);

        let (left, right) = (&leaf_reports[0], &leaf_reports[1]);
        assert_eq!((left.received, left.forwarded, left.parked), (1, 1, 0));
        assert_eq!((right.received, right.forwarded, right.parked), (1, 0, 1));
    }

    #[test]
    fn local_vehicle_never_visits_the_router() {
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let fleet = vec![vehicle("STAYLEFT01", &[1, 2], 0.5)];

        let (root_report, leaf_reports) = run_world(&root, &leaves, fleet);

        assert_eq!(root_report.rerouted, 0);
        assert_eq!(root_report.parked, 1);
        assert_eq!(leaf_reports[0].parked, 1);
        assert_eq!(leaf_reports[1].received, 0);
    }

    #[test]
    fn unknown_edge_abandons_vehicle() {
        // 2 → 1 is not an edge of the full graph.
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let fleet = vec![vehicle("WRONGWAY01", &[2, 1], 1.0)];

        let (root_report, leaf_reports) = run_world(&root, &leaves, fleet);

        assert_eq!(root_report.abandoned, 1);
        assert_eq!(root_report.parked, 0);
        assert_eq!(leaf_reports[0].failed, 1);
    }

    #[test]
    fn unroutable_first_hop_is_abandoned_at_emission() {
        // Only the left leaf takes part, so vertex 4 has no owner.
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let fleet = vec![vehicle("NOWHERE001", &[3, 4], 1.0)];

        let (root_report, _) = run_world(&root, &leaves[..1], fleet);

        assert_eq!(root_report.emitted, 0);
        assert_eq!(root_report.abandoned, 1);
    }

    #[test]
    fn empty_fleet_terminates() {
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let (root_report, leaf_reports) = run_world(&root, &leaves, Vec::new());
        assert_eq!(root_report, RootReport::default());
        assert!(leaf_reports.iter().all(|l| l.received == 0));
    }
}

// ── Role selection and run modes ──────────────────────────────────────────────

#[cfg(test)]
mod run_modes {
    use super::*;
    use crate::{coordinator_for, run, run_distributed, run_local, Coordinator, DistError};

    #[test]
    fn roles_follow_rank() {
        let doc = grid_doc(3);
        let (root, leaves) = build_all(&doc, 2).unwrap();
        let config = distributed(4, 2);
        for t in LocalWorld::new(3).into_transports() {
            let rank = t.rank();
            let c = coordinator_for(t, &root, &leaves, &config).unwrap();
            assert_eq!(c.rank(), rank);
        }
    }

    #[test]
    fn leaf_role_rejects_root_partition() {
        let (root, _) = build_all(&crossing_doc(), 2).unwrap();
        let t = LocalWorld::new(3).into_transports().remove(1);
        let r = LeafCoordinator::new(t, root, None);
        assert!(matches!(r, Err(DistError::RoleMismatch { .. })));
    }

    #[test]
    fn root_rejects_wrong_world_size() {
        let (root, leaves) = build_all(&crossing_doc(), 2).unwrap();
        let t = LocalWorld::new(2).into_transports().remove(0);
        let r = RootCoordinator::with_vehicles(t, &root, &leaves, Vec::new());
        assert!(matches!(r, Err(DistError::WorldSize { size: 2, needed: 3, .. })));
    }

    #[test]
    fn distributed_run_accounts_for_every_vehicle() {
        let config = distributed(40, 3);
        let report = run_distributed(&config, &grid_doc(6)).unwrap();

        assert_eq!(report.vehicles, 40);
        assert_eq!(report.parked, 40);
        assert!(report.accounted());
        assert_eq!(report.leaves.len(), 3);

        let parked: usize = report.leaves.iter().map(|l| l.parked).sum();
        let received: usize = report.leaves.iter().map(|l| l.received).sum();
        let forwarded: usize = report.leaves.iter().map(|l| l.forwarded).sum();
        assert_eq!(parked, 40);
        assert_eq!(received, report.emitted + report.rerouted);
        assert_eq!(forwarded, report.rerouted);
    }

    #[test]
    fn single_partition_run_needs_no_rerouting() {
        let report = run_distributed(&distributed(10, 1), &grid_doc(4)).unwrap();
        assert_eq!(report.parked, 10);
        assert_eq!(report.rerouted, 0);
    }

    #[test]
    fn local_modes_agree() {
        let doc = grid_doc(5);
        let seq = SimConfig { vehicles: 25, mode: ExecutionMode::Sequential, ..SimConfig::default() };
        let par = SimConfig { mode: ExecutionMode::Concurrent, num_threads: Some(3), ..seq.clone() };

        let a = run_local(&seq, &doc).unwrap();
        let b = run_local(&par, &doc).unwrap();
        assert_eq!((a.parked, a.abandoned), (25, 0));
        assert_eq!((b.parked, b.abandoned), (25, 0));
        assert!(a.leaves.is_empty());
    }

    #[test]
    fn run_dispatches_on_mode() {
        let doc = grid_doc(4);
        let report = run(&distributed(5, 2), &doc).unwrap();
        assert_eq!(report.mode, ExecutionMode::Distributed);
        let report = run(&SimConfig { vehicles: 5, ..SimConfig::default() }, &doc).unwrap();
        assert_eq!(report.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig { min_speed: 0.0, ..SimConfig::default() };
        assert!(matches!(run_local(&config, &grid_doc(3)), Err(DistError::Core(_))));
    }
}
