//! Unit tests for ps-vehicle.

use ps_core::{SimConfig, SimRng, VehicleId, VertexId};
use ps_graph::{DijkstraRouter, Edge, Graph, Vertex};

use crate::{Handoff, Vehicle, VehicleError, VehicleSpec, VehicleState};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ids(raw: &[i64]) -> Vec<VertexId> {
    raw.iter().copied().map(VertexId).collect()
}

/// Two vertices, one 10-unit edge 1 → 2.
fn single_edge() -> Graph {
    Graph::new(
        vec![Vertex::new(1, 0.0, 0.0), Vertex::new(2, 10.0, 0.0)],
        vec![Edge::new(1, 2, 10.0)],
    )
    .unwrap()
}

/// Line 1 → 2 → 3 → 4 with lengths 10, 3, 6.
fn line() -> Graph {
    Graph::new(
        vec![
            Vertex::new(1, 0.0, 0.0),
            Vertex::new(2, 1.0, 0.0),
            Vertex::new(3, 2.0, 0.0),
            Vertex::new(4, 3.0, 0.0),
        ],
        vec![Edge::new(1, 2, 10.0), Edge::new(2, 3, 3.0), Edge::new(3, 4, 6.0)],
    )
    .unwrap()
}

/// The left half of `line()`: vertices 1 and 2 only.
fn left_half() -> Graph {
    Graph::new(
        vec![Vertex::new(1, 0.0, 0.0), Vertex::new(2, 1.0, 0.0)],
        vec![Edge::new(1, 2, 10.0)],
    )
    .unwrap()
}

fn vehicle(path: &[i64], speed: f64) -> Vehicle {
    let path = ids(path);
    let prev_id = path[0];
    Vehicle::with_id(
        VehicleId("TESTVEH001".into()),
        VehicleSpec { path, speed, delta: 0.0, prev_id },
    )
    .unwrap()
}

// ── Step ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod step {
    use super::*;

    #[test]
    fn single_edge_parks_with_remainder() {
        let g = single_edge();
        let mut v = vehicle(&[1, 2], 4.0);
        for _ in 0..3 {
            v.step(&g).unwrap();
        }
        assert!(v.is_parked());
        assert_eq!(v.delta(), 2.0);
        assert_eq!(v.distance_remaining(), 0.0);
    }

    #[test]
    fn parked_vehicle_is_unchanged_by_step() {
        let g = single_edge();
        let mut v = vehicle(&[1, 2], 4.0);
        assert_eq!(v.step(&g).unwrap(), VehicleState::Parked);
        let before = v.clone();
        assert_eq!(v.step(&g).unwrap(), VehicleState::Parked);
        assert_eq!(v, before);
    }

    #[test]
    fn delta_carries_across_edges() {
        let g = line();
        let mut v = vehicle(&[1, 2, 3], 4.0);

        assert_eq!(v.step(&g).unwrap(), VehicleState::Traveling);
        assert_eq!(v.edge(), (VertexId(2), VertexId(3)));
        assert_eq!(v.delta(), 2.0);

        // 3 + 2 = 5, one whole step of 4, remainder 1.
        assert_eq!(v.step(&g).unwrap(), VehicleState::Parked);
        assert_eq!(v.delta(), 1.0);
    }

    #[test]
    fn edge_shorter_than_speed_is_kept_as_delta() {
        let g = line();
        let mut v = Vehicle::with_id(
            VehicleId("SHORTEDGE1".into()),
            VehicleSpec { path: ids(&[2, 3, 4]), speed: 8.0, delta: 0.0, prev_id: VertexId(2) },
        )
        .unwrap();
        v.step(&g).unwrap();
        assert_eq!(v.delta(), 3.0);
    }

    #[test]
    fn step_is_deterministic() {
        let g = line();
        let mut a = vehicle(&[1, 2, 3, 4], 2.5);
        let mut b = a.clone();
        for _ in 0..3 {
            assert_eq!(a.step(&g).unwrap(), b.step(&g).unwrap());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn drive_terminates_within_path_length() {
        let g = line();
        let mut v = vehicle(&[1, 2, 3, 4], 1.5);
        let steps = v.drive(&g).unwrap();
        assert!(v.is_parked());
        assert!(steps <= v.path().len(), "took {steps} steps");
    }

    #[test]
    fn revisited_vertex_resolves_from_last_occurrence() {
        // 1 → 2 → 1 → 2 → 3: the second visit to 1 must not loop back.
        let g = Graph::new(
            vec![Vertex::new(1, 0.0, 0.0), Vertex::new(2, 1.0, 0.0), Vertex::new(3, 2.0, 0.0)],
            vec![Edge::new(1, 2, 1.0), Edge::new(2, 1, 1.0), Edge::new(2, 3, 1.0)],
        )
        .unwrap();
        let mut v = vehicle(&[1, 2, 1, 2, 3], 1.0);
        let steps = v.drive(&g).unwrap();
        assert!(v.is_parked());
        assert_eq!(v.next_id(), VertexId(3));
        assert!(steps <= 5);
    }

    #[test]
    fn missing_edge_is_an_error() {
        let g = single_edge();
        let mut v = vehicle(&[2, 1], 1.0);
        assert!(matches!(v.step(&g), Err(VehicleError::OffGraph { .. })));
    }
}

// ── Boundary handling ─────────────────────────────────────────────────────────

#[cfg(test)]
mod boundary {
    use super::*;

    #[test]
    fn off_graph_successor_marks_for_deletion() {
        let g = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        assert_eq!(v.step(&g).unwrap(), VehicleState::AtBoundary);
        assert!(v.is_marked_for_deletion());
        assert_eq!(v.edge(), (VertexId(2), VertexId(3)));
        assert_eq!(v.delta(), 2.0);
    }

    #[test]
    fn boundary_vehicle_does_not_advance_further() {
        let g = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        v.step(&g).unwrap();
        let before = v.clone();
        assert_eq!(v.step(&g).unwrap(), VehicleState::AtBoundary);
        assert_eq!(v, before);
    }

    #[test]
    fn drive_rejects_boundary() {
        let g = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        assert!(matches!(v.drive(&g), Err(VehicleError::UnexpectedBoundary { .. })));
    }

    #[test]
    fn drive_until_handoff_reports_boundary() {
        let g = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        assert_eq!(v.drive_until_handoff(&g).unwrap(), Handoff::Boundary);
    }

    #[test]
    fn drive_until_handoff_reports_parked() {
        let g = line();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        assert_eq!(v.drive_until_handoff(&g).unwrap(), Handoff::Parked);
        assert!(v.is_parked());
    }

    #[test]
    fn absorb_uses_supplied_length_and_clears_flag() {
        let left = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        v.step(&left).unwrap();

        // The receiver only knows vertices 3 and 4; edge 2 → 3 has length 3.
        let right = Graph::new(
            vec![Vertex::new(3, 2.0, 0.0), Vertex::new(4, 3.0, 0.0)],
            vec![Edge::new(3, 4, 6.0)],
        )
        .unwrap();
        assert_eq!(v.absorb(3.0, &right).unwrap(), VehicleState::Traveling);
        assert!(!v.is_marked_for_deletion());
        assert_eq!(v.edge(), (VertexId(3), VertexId(4)));
        assert_eq!(v.delta(), 1.0);

        assert_eq!(v.drive_until_handoff(&right).unwrap(), Handoff::Parked);
        // 6 + 1 = 7, remainder 3.
        assert_eq!(v.delta(), 3.0);
    }

    #[test]
    fn absorb_rejects_non_positive_length() {
        let g = line();
        let mut v = vehicle(&[1, 2], 4.0);
        assert!(matches!(v.absorb(0.0, &g), Err(VehicleError::Invalid(_))));
        assert!(matches!(v.absorb(f64::NAN, &g), Err(VehicleError::Invalid(_))));
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use super::*;

    fn spec(path: &[i64], speed: f64, delta: f64, prev: i64) -> VehicleSpec {
        VehicleSpec { path: ids(path), speed, delta, prev_id: VertexId(prev) }
    }

    #[test]
    fn new_draws_a_ten_char_id() {
        let mut rng = SimRng::new(7);
        let v = Vehicle::new(spec(&[1, 2], 1.0, 0.0, 1), &mut rng).unwrap();
        assert_eq!(v.id().as_str().len(), VehicleId::LEN);
        assert!(v.id().as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn next_follows_prev() {
        let v = Vehicle::with_id(VehicleId("A".into()), spec(&[5, 6, 7], 1.0, 0.0, 6)).unwrap();
        assert_eq!(v.edge(), (VertexId(6), VertexId(7)));
        assert_eq!(v.state(), VehicleState::Traveling);
    }

    #[test]
    fn prev_at_end_starts_parked() {
        let v = Vehicle::with_id(VehicleId("A".into()), spec(&[5, 6], 1.0, 0.0, 6)).unwrap();
        assert!(v.is_parked());
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let bad = [
            spec(&[1, 2], 0.0, 0.0, 1),
            spec(&[1, 2], -1.0, 0.0, 1),
            spec(&[1, 2], f64::INFINITY, 0.0, 1),
            spec(&[1, 2], 1.0, -0.5, 1),
            spec(&[1], 1.0, 0.0, 1),
            spec(&[1, 2], 1.0, 0.0, 9),
        ];
        for s in bad {
            let r = Vehicle::with_id(VehicleId("A".into()), s.clone());
            assert!(matches!(r, Err(VehicleError::Invalid(_))), "accepted {s:?}");
        }
    }
}

// ── Wire message ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod message {
    use super::*;
    use crate::VehicleMessage;

    #[test]
    fn decode_restores_fields_and_clears_mark() {
        let g = left_half();
        let mut v = vehicle(&[1, 2, 3, 4], 4.0);
        v.step(&g).unwrap();
        assert!(v.is_marked_for_deletion());

        let back = Vehicle::decode(&v.encode().unwrap()).unwrap();
        assert!(!back.is_marked_for_deletion());
        assert_eq!(back.id(), v.id());
        assert_eq!(back.path(), v.path());
        assert_eq!(back.speed(), v.speed());
        assert_eq!(back.delta(), v.delta());
        assert_eq!(back.edge(), v.edge());
        assert_eq!(back.is_parked(), v.is_parked());
        assert_eq!(back.distance_remaining(), v.distance_remaining());
    }

    #[test]
    fn field_names_match_wire_format() {
        let v = vehicle(&[1, 2], 4.0);
        let json: serde_json::Value = serde_json::from_slice(&v.encode().unwrap()).unwrap();
        for key in ["id", "path_ids", "speed", "delta", "next_id", "prev_id", "is_parked", "distance_remaining"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("marked_for_deletion").is_none());
        assert_eq!(json["path_ids"], serde_json::json!([1, 2]));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(Vehicle::decode(b"{not json"), Err(VehicleError::Wire(_))));
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let mut m = VehicleMessage::from(&vehicle(&[1, 2], 4.0));
        m.speed = 0.0;
        assert!(matches!(Vehicle::try_from(m), Err(VehicleError::Invalid(_))));

        let mut m = VehicleMessage::from(&vehicle(&[1, 2], 4.0));
        m.next_id = VertexId(99);
        assert!(matches!(Vehicle::try_from(m), Err(VehicleError::Invalid(_))));
    }
}

// ── Seeding ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod seeding {
    use super::*;
    use crate::{seed_fleet, seed_vehicle};

    fn config(vehicles: usize) -> SimConfig {
        SimConfig { vehicles, min_speed: 2.0, max_speed: 5.0, ..SimConfig::default() }
    }

    #[test]
    fn seeded_vehicles_follow_graph_paths() {
        let g = line();
        let mut rng = SimRng::new(1);
        let fleet = seed_fleet(&g, &DijkstraRouter, &config(20), &mut rng).unwrap();
        assert_eq!(fleet.len(), 20);
        for v in &fleet {
            assert!(v.path().len() >= 2);
            assert_eq!(v.prev_id(), v.path()[0]);
            assert_eq!(v.next_id(), v.path()[1]);
            assert!((2.0..=5.0).contains(&v.speed()));
            for hop in v.path().windows(2) {
                assert!(g.edge(hop[0], hop[1]).is_ok());
            }
        }
    }

    #[test]
    fn same_seed_same_fleet() {
        let g = line();
        let a = seed_fleet(&g, &DijkstraRouter, &config(10), &mut SimRng::new(9)).unwrap();
        let b = seed_fleet(&g, &DijkstraRouter, &config(10), &mut SimRng::new(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_fleet_drives_to_completion() {
        let g = line();
        let mut fleet = seed_fleet(&g, &DijkstraRouter, &config(15), &mut SimRng::new(3)).unwrap();
        for v in &mut fleet {
            v.drive(&g).unwrap();
            assert!(v.is_parked());
        }
    }

    #[test]
    fn single_vertex_graph_cannot_seed() {
        let g = Graph::new(vec![Vertex::new(1, 0.0, 0.0)], vec![Edge::new(1, 1, 1.0)]).unwrap();
        let r = seed_vehicle(&g, &DijkstraRouter, &config(1), &mut SimRng::new(0));
        assert!(matches!(r, Err(VehicleError::TooFewVertices)));
    }

    #[test]
    fn exhausted_attempts_report_no_pair() {
        let g = line();
        let cfg = SimConfig { max_seed_attempts: 0, ..config(1) };
        let r = seed_vehicle(&g, &DijkstraRouter, &cfg, &mut SimRng::new(0));
        assert!(matches!(r, Err(VehicleError::NoRoutablePair { attempts: 0 })));
    }
}
